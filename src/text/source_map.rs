//! Line/column lookup over a borrowed source buffer, used to put diagnostics
//! in context.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::arena::Span;
use crate::error::Location;

const HEX_ROW: usize = 16;

/// Where each line of a source text starts. Owned, so a handler can keep
/// it between reports instead of rescanning the text each time.
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    starts: Vec<usize>,
    binary: bool,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let bytes = source.as_bytes();
        let binary = bytes
            .iter()
            .any(|&b| b < 0x20 && !matches!(b, b'\n' | b'\t' | b'\r'));
        let mut starts = Vec::new();
        if !bytes.is_empty() {
            starts.push(0);
            starts.extend(
                memchr::memchr_iter(b'\n', bytes)
                    .map(|idx| idx + 1)
                    .filter(|&start| start < bytes.len()),
            );
        }
        Self { starts, binary }
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// 0-based line holding the byte at `offset`. A line break belongs to the
    /// line it terminates.
    pub fn line_of(&self, offset: usize) -> usize {
        self.starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1)
    }

    /// Cheap check that this index was built from `source`.
    fn fits(&self, source: &str) -> bool {
        let bytes = source.as_bytes();
        match self.starts.last() {
            None => bytes.is_empty(),
            Some(&last) => last < bytes.len() && (last == 0 || bytes[last - 1] == b'\n'),
        }
    }

    /// 1-based line and column (in chars) of `offset`. With `hint`, an
    /// earlier location on the same line, only the chars after it are
    /// counted.
    fn locate(&self, source: &str, offset: usize, hint: Option<Location>) -> Location {
        let offset = offset.min(source.len());
        let line = self.line_of(offset);
        let start = self.starts.get(line).copied().unwrap_or(0);
        let (from, skipped) = match hint {
            Some(hint)
                if hint.line == line + 1
                    && (start..=offset).contains(&hint.offset)
                    && source.is_char_boundary(hint.offset)
                    && source.is_char_boundary(offset) =>
            {
                (hint.offset, hint.column - 1)
            }
            _ => (start, 0),
        };
        let column = source
            .get(from..offset)
            .map(|prefix| skipped + prefix.chars().count())
            .unwrap_or(offset - start);
        Location {
            offset,
            line: line + 1,
            column: column + 1,
        }
    }
}

/// Line index for the last source a handler saw, keyed by the text's address
/// and length.
#[derive(Debug, Clone, Default)]
pub(crate) struct SourceCache {
    key: Option<(usize, usize)>,
    index: LineIndex,
    last: Option<Location>,
}

impl SourceCache {
    fn refresh(&mut self, source: &str) {
        let key = (source.as_ptr() as usize, source.len());
        if self.key == Some(key) && self.index.fits(source) {
            return;
        }
        self.key = Some(key);
        self.index = LineIndex::new(source);
        self.last = None;
    }

    pub(crate) fn location(&mut self, source: &str, offset: usize) -> Location {
        self.refresh(source);
        let location = self.index.locate(source, offset, self.last);
        self.last = Some(location);
        location
    }

    pub(crate) fn map<'s>(&'s mut self, source: &'s str) -> SourceMap<'s> {
        self.refresh(source);
        SourceMap {
            source,
            index: Cow::Borrowed(&self.index),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceMap<'a> {
    source: &'a str,
    index: Cow<'a, LineIndex>,
}

impl<'a> SourceMap<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            index: Cow::Owned(LineIndex::new(source)),
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// True if the source holds control bytes other than tab, CR and LF.
    pub fn is_binary(&self) -> bool {
        self.index.binary
    }

    pub fn line_count(&self) -> usize {
        self.index.line_count()
    }

    /// Text of line `index` (0-based), without the line break.
    pub fn line(&self, index: usize) -> Option<&'a str> {
        let starts = &self.index.starts;
        let start = *starts.get(index)?;
        let end = starts
            .get(index + 1)
            .map(|next| next - 1)
            .unwrap_or(self.source.len());
        let line = self.source.get(start..end)?;
        Some(line.strip_suffix('\r').unwrap_or(line))
    }

    pub fn lines(&self) -> impl Iterator<Item = &'a str> + '_ {
        (0..self.line_count()).filter_map(move |index| self.line(index))
    }

    pub fn line_of(&self, offset: usize) -> usize {
        self.index.line_of(offset)
    }

    /// 1-based line and column (in chars) of `offset`.
    pub fn location(&self, offset: usize) -> Location {
        self.index.locate(self.source, offset, None)
    }

    /// Renders the lines around `span`, marking the ones it touches with `>`.
    /// Falls back to a hex dump for binary input.
    pub fn context(&self, span: Span, padding: usize) -> Vec<String> {
        if self.index.binary {
            return self.hex_context(span, padding);
        }
        if self.index.starts.is_empty() {
            return Vec::new();
        }
        let first = self.line_of(span.start);
        let last = self.line_of(span.end.saturating_sub(1).max(span.start));
        let from = first.saturating_sub(padding);
        let to = (last + padding).min(self.line_count() - 1);
        (from..=to)
            .map(|index| {
                let marker = if (first..=last).contains(&index) { '>' } else { '|' };
                format!("{:>4} {} {}", index + 1, marker, self.line(index).unwrap_or(""))
            })
            .collect()
    }

    fn hex_context(&self, span: Span, padding: usize) -> Vec<String> {
        let bytes = self.source.as_bytes();
        if bytes.is_empty() {
            return Vec::new();
        }
        let first = span.start.min(bytes.len() - 1) / HEX_ROW;
        let last = span.end.saturating_sub(1).max(span.start).min(bytes.len() - 1) / HEX_ROW;
        let from = first.saturating_sub(padding);
        let to = (last + padding).min((bytes.len() - 1) / HEX_ROW);
        (from..=to)
            .map(|row| {
                let start = row * HEX_ROW;
                let chunk = &bytes[start..(start + HEX_ROW).min(bytes.len())];
                let marker = if (first..=last).contains(&row) { '>' } else { '|' };
                let mut out = format!("{start:08x} {marker} ");
                for byte in chunk {
                    let _ = write!(out, "{byte:02x} ");
                }
                for _ in chunk.len()..HEX_ROW {
                    out.push_str("   ");
                }
                out.push(' ');
                out.extend(chunk.iter().map(|&b| {
                    if b.is_ascii_graphic() || b == b' ' {
                        b as char
                    } else {
                        '.'
                    }
                }));
                out
            })
            .collect()
    }
}
