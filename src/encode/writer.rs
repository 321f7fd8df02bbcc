use std::io;

use crate::encode::ToJson;
use crate::text::{escape_into, reescape_into};
use crate::WriteConfig;

/// Destination for writer output.
pub trait Sink {
    fn push_str(&mut self, s: &str);
}

impl Sink for String {
    fn push_str(&mut self, s: &str) {
        String::push_str(self, s);
    }
}

impl Sink for Vec<u8> {
    fn push_str(&mut self, s: &str) {
        self.extend_from_slice(s.as_bytes());
    }
}

/// Adapts an `io::Write` into a [`Sink`]. The first I/O error is kept and
/// every write after it is dropped.
pub struct IoSink<W: io::Write> {
    inner: W,
    error: Option<io::Error>,
}

impl<W: io::Write> IoSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, error: None }
    }

    pub fn into_result(mut self) -> io::Result<W> {
        match self.error.take() {
            Some(err) => Err(err),
            None => {
                self.inner.flush()?;
                Ok(self.inner)
            }
        }
    }
}

impl<W: io::Write> Sink for IoSink<W> {
    fn push_str(&mut self, s: &str) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.inner.write_all(s.as_bytes()) {
            self.error = Some(err);
        }
    }
}

/// Open array or object. Tracks whether anything was written into it yet.
#[must_use = "a scope has to be closed with end_array/end_object"]
#[derive(Debug)]
pub struct Scope {
    empty: bool,
}

impl Scope {
    pub fn is_empty(&self) -> bool {
        self.empty
    }
}

/// Leading whitespace for the current nesting level, grown on entering a
/// composite and shrunk on leaving it.
struct Indent {
    width: usize,
    current: String,
}

impl Indent {
    fn new(width: usize) -> Self {
        Self {
            width,
            current: String::new(),
        }
    }

    fn push(&mut self) {
        self.current.extend(std::iter::repeat(' ').take(self.width));
    }

    fn pop(&mut self) {
        let len = self.current.len().saturating_sub(self.width);
        self.current.truncate(len);
    }
}

/// Streams JSON text into a [`Sink`].
///
/// Compact mode writes no whitespace at all. Pretty mode puts a newline
/// after every opening bracket and before every element, indenting one level
/// per nesting depth, and closes with a newline at the outer indentation.
pub struct Writer<'s> {
    sink: &'s mut dyn Sink,
    indent: Option<Indent>,
    scratch: String,
}

impl<'s> Writer<'s> {
    pub fn new(sink: &'s mut dyn Sink, config: &WriteConfig) -> Self {
        Self {
            sink,
            indent: config.indent.map(Indent::new),
            scratch: String::new(),
        }
    }

    pub fn is_pretty(&self) -> bool {
        self.indent.is_some()
    }

    /// Writes `text` unchanged. The caller guarantees it is valid JSON.
    pub fn write_raw(&mut self, text: &str) {
        self.sink.push_str(text);
    }

    pub fn write_null(&mut self) {
        self.write_raw("null");
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_raw(if value { "true" } else { "false" });
    }

    pub fn write_integer<I: itoa::Integer>(&mut self, value: I) {
        let mut buffer = itoa::Buffer::new();
        self.sink.push_str(buffer.format(value));
    }

    /// Shortest round-trip form. Non-finite values have no JSON spelling and
    /// are written as `null`.
    pub fn write_f64(&mut self, value: f64) {
        if !value.is_finite() {
            self.write_null();
            return;
        }
        let mut buffer = ryu::Buffer::new();
        self.sink.push_str(buffer.format_finite(value));
    }

    pub fn write_f32(&mut self, value: f32) {
        if !value.is_finite() {
            self.write_null();
            return;
        }
        let mut buffer = ryu::Buffer::new();
        self.sink.push_str(buffer.format_finite(value));
    }

    /// Writes `value` quoted and escaped.
    pub fn write_string(&mut self, value: &str) {
        self.scratch.clear();
        self.scratch.push('"');
        escape_into(&mut self.scratch, value);
        self.scratch.push('"');
        self.sink.push_str(&self.scratch);
    }

    /// Writes a string token taken from JSON source. Its escapes are kept
    /// where JSON allows them and repaired where it does not.
    pub fn write_string_token(&mut self, token: &str) {
        let content = token.strip_prefix('"').unwrap_or(token);
        let content = content.strip_suffix('"').unwrap_or(content);
        self.scratch.clear();
        self.scratch.push('"');
        reescape_into(&mut self.scratch, content);
        self.scratch.push('"');
        self.sink.push_str(&self.scratch);
    }

    pub fn begin_array(&mut self) -> Scope {
        self.open('[')
    }

    /// Separator and indentation before the next array element.
    pub fn element(&mut self, scope: &mut Scope) {
        self.separate(scope);
    }

    pub fn end_array(&mut self, scope: Scope) {
        self.close(scope, ']');
    }

    pub fn begin_object(&mut self) -> Scope {
        self.open('{')
    }

    /// Separator, indentation and the quoted `key` with its colon.
    pub fn key(&mut self, scope: &mut Scope, key: &str) {
        self.separate(scope);
        self.write_string(key);
        self.colon();
    }

    /// Like [`Writer::key`] for a key taken from JSON source, written through
    /// [`Writer::write_string_token`].
    pub fn key_token(&mut self, scope: &mut Scope, token: &str) {
        self.separate(scope);
        self.write_string_token(token);
        self.colon();
    }

    pub fn end_object(&mut self, scope: Scope) {
        self.close(scope, '}');
    }

    /// `key` then `value`.
    pub fn field(&mut self, scope: &mut Scope, key: &str, value: &dyn ToJson) {
        self.key(scope, key);
        value.write_json(self);
    }

    /// A two-element `[key, value]` array kept on one line in pretty mode.
    pub fn write_pair(&mut self, key: &dyn ToJson, value: &dyn ToJson) {
        self.write_raw("[");
        key.write_json(self);
        self.write_raw(if self.is_pretty() { ", " } else { "," });
        value.write_json(self);
        self.write_raw("]");
    }

    pub fn write_array<'v, I, T>(&mut self, items: I)
    where
        I: IntoIterator<Item = &'v T>,
        T: ToJson + ?Sized + 'v,
    {
        let mut scope = self.begin_array();
        for item in items {
            self.element(&mut scope);
            item.write_json(self);
        }
        self.end_array(scope);
    }

    fn open(&mut self, bracket: char) -> Scope {
        let mut buf = [0u8; 4];
        self.sink.push_str(bracket.encode_utf8(&mut buf));
        if let Some(indent) = self.indent.as_mut() {
            indent.push();
            self.sink.push_str("\n");
        }
        Scope { empty: true }
    }

    fn separate(&mut self, scope: &mut Scope) {
        match self.indent.as_mut() {
            Some(indent) => {
                if !scope.empty {
                    self.sink.push_str(",\n");
                }
                self.sink.push_str(&indent.current);
            }
            None => {
                if !scope.empty {
                    self.sink.push_str(",");
                }
            }
        }
        scope.empty = false;
    }

    fn colon(&mut self) {
        self.write_raw(if self.is_pretty() { ": " } else { ":" });
    }

    fn close(&mut self, scope: Scope, bracket: char) {
        if let Some(indent) = self.indent.as_mut() {
            indent.pop();
            if !scope.empty {
                self.sink.push_str("\n");
            }
            self.sink.push_str(&indent.current);
        }
        let mut buf = [0u8; 4];
        self.sink.push_str(bracket.encode_utf8(&mut buf));
    }
}
