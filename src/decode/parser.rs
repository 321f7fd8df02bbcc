use memchr::memchr2;

use crate::arena::{Document, Node, NodeKind, Span, NO_SIBLING};
use crate::constants::{is_json_whitespace, is_number_byte};
use crate::error::{CountingHandler, ErrorHandler, Severity};
use crate::ReadConfig;

/// Parses `source` into a flat document, reporting every problem to
/// `handler`. Always returns whatever was built before the first structural
/// error.
pub fn parse<'a>(
    source: &'a str,
    config: &ReadConfig,
    handler: &mut dyn ErrorHandler,
) -> Document<'a> {
    let mut parser = Parser::new(source, config, handler);
    parser.parse_document();
    parser.finish()
}

struct Parser<'a, 'h> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    nodes: Vec<Node<'a>>,
    handler: CountingHandler<'h>,
    max_depth: usize,
    depth: usize,
}

impl<'a, 'h> Parser<'a, 'h> {
    fn new(source: &'a str, config: &ReadConfig, handler: &'h mut dyn ErrorHandler) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            // rough guess, most documents have a node every few bytes
            nodes: Vec::with_capacity(source.len() / 8 + 1),
            handler: CountingHandler::new(handler),
            max_depth: config.max_depth,
            depth: 0,
        }
    }

    fn finish(self) -> Document<'a> {
        log::debug!(
            "parsed {} json nodes from {} bytes ({} errors)",
            self.nodes.len(),
            self.source.len(),
            self.handler.errors()
        );
        Document::from_parts(self.source, self.nodes, self.handler.errors())
    }

    fn parse_document(&mut self) {
        if self.source.is_empty() {
            self.error(Span::new(0, 0), "empty string is not valid json");
            return;
        }
        if self.parse_value().is_none() {
            return;
        }
        self.skip_whitespace();
        if self.pos < self.bytes.len() {
            self.report(
                Span::new(self.pos, self.bytes.len()),
                "extra data after json",
                Severity::Warning,
            );
        }
    }

    fn report(&mut self, span: Span, message: &str, severity: Severity) {
        self.handler.report(self.source, span, message, severity);
    }

    fn error(&mut self, span: Span, message: &str) {
        self.report(span, message, Severity::Error);
    }

    /// The byte under the cursor, or an empty span at the end of input.
    fn current_span(&self) -> Span {
        let end = (self.pos + 1).min(self.bytes.len());
        Span::new(self.pos.min(self.bytes.len()), end)
    }

    /// Source text in `start..end`, shrunk to the nearest char boundary.
    fn slice(&self, start: usize, end: usize) -> &'a str {
        let mut end = end.min(self.source.len());
        while !self.source.is_char_boundary(end) {
            end -= 1;
        }
        self.source.get(start..end).unwrap_or("")
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() && is_json_whitespace(self.bytes[self.pos]) {
            self.pos += 1;
        }
    }

    /// Reports and returns true when the input is exhausted.
    fn err_on_end(&mut self) -> bool {
        if self.pos < self.bytes.len() {
            return false;
        }
        self.error(self.current_span(), "unexpected end of data");
        true
    }

    fn push(&mut self, kind: NodeKind, start: usize, end: usize) -> usize {
        let index = self.nodes.len();
        let token = self.slice(start, end);
        self.nodes.push(Node::new(kind, token, start));
        index
    }

    fn parse_value(&mut self) -> Option<usize> {
        self.skip_whitespace();
        if self.err_on_end() {
            return None;
        }
        match self.bytes[self.pos] {
            b'[' => self.parse_composite(NodeKind::Array),
            b'{' => self.parse_composite(NodeKind::Object),
            b'"' => {
                let span = self.scan_string()?;
                Some(self.push(NodeKind::String, span.start, span.end))
            }
            b't' => self.parse_literal("true", NodeKind::Boolean),
            b'f' => self.parse_literal("false", NodeKind::Boolean),
            b'n' => self.parse_literal("null", NodeKind::Null),
            b'-' | b'+' | b'0'..=b'9' => Some(self.parse_number()),
            _ => {
                self.error(
                    self.current_span(),
                    "unknown json token, expected list, object, string, boolean, null, or number.",
                );
                None
            }
        }
    }

    fn parse_literal(&mut self, literal: &'static str, kind: NodeKind) -> Option<usize> {
        let start = self.pos;
        let end = (start + literal.len()).min(self.bytes.len());
        if &self.bytes[start..end] != literal.as_bytes() {
            self.error(Span::new(start, end), &format!("expected '{literal}'"));
            // skip the expected width so callers never spin on the same byte
            self.pos = end;
            return None;
        }
        self.pos = end;
        Some(self.push(kind, start, end))
    }

    fn parse_number(&mut self) -> usize {
        let start = self.pos;
        self.pos += 1;
        while self.pos < self.bytes.len() && is_number_byte(self.bytes[self.pos]) {
            self.pos += 1;
        }
        self.push(NodeKind::Number, start, self.pos)
    }

    /// Scans a quoted string starting at the opening quote. Escapes are
    /// skipped, not decoded.
    fn scan_string(&mut self) -> Option<Span> {
        let start = self.pos;
        self.pos += 1;
        loop {
            let rest = self.bytes.get(self.pos..).unwrap_or(&[]);
            let Some(found) = memchr2(b'"', b'\\', rest) else {
                self.pos = self.bytes.len();
                self.error(
                    Span::new(start, self.pos),
                    "unterminated string, expected '\"'",
                );
                return None;
            };
            let at = self.pos + found;
            if self.bytes[at] == b'"' {
                self.pos = at + 1;
                return Some(Span::new(start, self.pos));
            }
            self.pos = (at + 2).min(self.bytes.len());
        }
    }

    fn parse_composite(&mut self, kind: NodeKind) -> Option<usize> {
        let start = self.pos;
        if self.depth >= self.max_depth {
            let message = format!("maximum nesting depth of {} exceeded", self.max_depth);
            self.error(self.current_span(), &message);
            return None;
        }
        self.depth += 1;

        // the placeholder fixes the composite's index before any child is pushed
        let index = self.push(kind, start, start + 1);
        self.nodes[index].first_child = index + 1;
        self.pos += 1;

        let complete = match kind {
            NodeKind::Array => self.parse_elements(index),
            _ => self.parse_members(index),
        };

        self.depth -= 1;
        self.nodes[index].token = self.slice(start, self.pos);
        complete.map(|_| index)
    }

    fn parse_elements(&mut self, index: usize) -> Option<()> {
        self.skip_whitespace();
        if self.err_on_end() {
            return None;
        }
        if self.bytes[self.pos] == b']' {
            self.pos += 1;
            return Some(());
        }

        let mut prev = NO_SIBLING;
        loop {
            let child = self.parse_value()?;
            if prev != NO_SIBLING {
                self.nodes[prev].next_sibling = child;
            }
            prev = child;
            self.nodes[index].child_count += 1;

            self.skip_whitespace();
            if self.err_on_end() {
                return None;
            }
            match self.bytes[self.pos] {
                b']' => {
                    self.pos += 1;
                    return Some(());
                }
                b',' => self.pos += 1,
                _ => {
                    self.error(self.current_span(), "expected ',' or ']'");
                    return None;
                }
            }
        }
    }

    fn parse_members(&mut self, index: usize) -> Option<()> {
        self.skip_whitespace();
        if self.err_on_end() {
            return None;
        }
        if self.bytes[self.pos] == b'}' {
            self.pos += 1;
            return Some(());
        }

        let mut prev = NO_SIBLING;
        loop {
            self.skip_whitespace();
            if self.err_on_end() {
                return None;
            }
            if self.bytes[self.pos] != b'"' {
                self.error(
                    self.current_span(),
                    "expected '\"' (object keys must be strings)",
                );
                return None;
            }
            let key_span = self.scan_string()?;
            let key = self.push(NodeKind::String, key_span.start, key_span.end);

            self.skip_whitespace();
            if self.err_on_end() {
                return None;
            }
            if self.bytes[self.pos] != b':' {
                self.error(self.current_span(), "expected ':'");
                return None;
            }
            self.pos += 1;

            let value = self.parse_value()?;
            if prev != NO_SIBLING {
                self.nodes[prev].next_sibling = key;
            }
            self.nodes[key].next_sibling = value;
            prev = value;
            self.nodes[index].child_count += 1;

            self.skip_whitespace();
            if self.err_on_end() {
                return None;
            }
            match self.bytes[self.pos] {
                b'}' => {
                    self.pos += 1;
                    return Some(());
                }
                b',' => self.pos += 1,
                _ => {
                    self.error(self.current_span(), "expected ',' or '}'");
                    return None;
                }
            }
        }
    }
}
