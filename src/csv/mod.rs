//! Flat view over a CSV buffer.
//!
//! [`read`] splits the text into one [`Entry`] per cell, stored row-major in
//! a single vector. Entries borrow their text from the buffer. Problems go
//! to the same [`ErrorHandler`] the JSON reader uses.

use std::str::FromStr;

use crate::arena::Span;
use crate::error::{ErrorHandler, Severity};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvConfig {
    /// Cell separator. Must be an ASCII byte.
    pub separator: u8,
    /// Treat the first line as column names.
    pub has_header: bool,
}

impl CsvConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            separator: b',',
            has_header: true,
        }
    }
}

/// One cell. `raw` is trimmed but still quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Entry<'a> {
    raw: &'a str,
    offset: usize,
}

impl<'a> Entry<'a> {
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn span(&self) -> Span {
        Span::new(self.offset, self.offset + self.raw.len())
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Cell text with surrounding quotes removed and `""` collapsed to `"`.
    pub fn get_string(&self) -> String {
        unquote(self.raw)
    }

    pub fn get_number<T: FromStr>(&self) -> Result<T> {
        self.raw.parse::<T>().map_err(|_| Error::InvalidNumber {
            token: self.raw.to_string(),
            target: std::any::type_name::<T>(),
        })
    }

    pub fn get_int(&self) -> Result<i32> {
        self.get_number()
    }

    pub fn get_uint(&self) -> Result<u32> {
        self.get_number()
    }

    pub fn get_float(&self) -> Result<f32> {
        self.get_number()
    }

    pub fn get_double(&self) -> Result<f64> {
        self.get_number()
    }

    pub fn get_int64(&self) -> Result<i64> {
        self.get_number()
    }

    pub fn get_uint64(&self) -> Result<u64> {
        self.get_number()
    }
}

fn unquote(raw: &str) -> String {
    let inner = if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        &raw[1..raw.len() - 1]
    } else {
        raw
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(ch) = chars.next() {
        out.push(ch);
        if ch == '"' && chars.peek() == Some(&'"') {
            chars.next();
        }
    }
    out
}

/// Parsed CSV, entries stored row by row.
#[derive(Debug, Clone, Default)]
pub struct CsvRef<'a> {
    source: &'a str,
    entries: Vec<Entry<'a>>,
    header: Vec<String>,
    has_header: bool,
    column_count: usize,
}

impl<'a> CsvRef<'a> {
    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn entries(&self) -> &[Entry<'a>] {
        &self.entries
    }

    pub fn has_header(&self) -> bool {
        self.has_header
    }

    /// Column names, empty when read without a header.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn row_count(&self) -> usize {
        if self.column_count == 0 {
            0
        } else {
            self.entries.len() / self.column_count
        }
    }

    pub fn row(&self, row: usize) -> Option<&[Entry<'a>]> {
        let start = row.checked_mul(self.column_count)?;
        let end = start.checked_add(self.column_count)?;
        self.entries.get(start..end)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Entry<'a>]> + '_ {
        (0..self.row_count()).filter_map(move |row| self.row(row))
    }

    pub fn column(&self, column: usize) -> Option<Column<'_, 'a>> {
        if column >= self.column_count {
            return None;
        }
        Some(Column {
            entries: &self.entries,
            column,
            stride: self.column_count,
        })
    }

    pub fn column_by_name(&self, name: &str) -> Option<Column<'_, 'a>> {
        let column = self.header.iter().position(|header| header == name)?;
        self.column(column)
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&Entry<'a>> {
        if column >= self.column_count {
            return None;
        }
        let index = row.checked_mul(self.column_count)?.checked_add(column)?;
        self.entries.get(index)
    }
}

/// Strided view of one column.
#[derive(Debug, Clone, Copy)]
pub struct Column<'c, 'a> {
    entries: &'c [Entry<'a>],
    column: usize,
    stride: usize,
}

impl<'c, 'a> Column<'c, 'a> {
    pub fn len(&self) -> usize {
        self.entries.len() / self.stride
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, row: usize) -> Option<&'c Entry<'a>> {
        if row >= self.len() {
            return None;
        }
        self.entries.get(row * self.stride + self.column)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'c Entry<'a>> {
        self.entries.iter().skip(self.column).step_by(self.stride)
    }
}

/// Splits `source` into entries.
///
/// Blank lines are skipped and short lines padded with empty entries. With a
/// header, a longer line is an error and its surplus cells are dropped.
/// Without one, a longer line restarts the scan with the wider column count.
pub fn read<'a>(source: &'a str, config: &CsvConfig, handler: &mut dyn ErrorHandler) -> CsvRef<'a> {
    let mut reader = CsvReader {
        source,
        bytes: source.as_bytes(),
        pos: 0,
        separator: config.separator,
        handler,
    };
    let mut csv = CsvRef {
        source,
        has_header: config.has_header,
        ..CsvRef::default()
    };

    if config.has_header {
        while !reader.at_line_end() {
            let token = reader.token();
            let name = unquote(token.raw);
            if name.is_empty() {
                reader.report(token.span(), "header has empty token", Severity::Warning);
            }
            csv.header.push(name);
            reader.skip_separator();
        }
        reader.skip_newline();
        csv.column_count = csv.header.len();
    }

    let data_start = reader.pos;
    while reader.pos < reader.bytes.len() {
        let line_start = reader.pos;
        let first = csv.entries.len();
        while !reader.at_line_end() {
            let token = reader.token();
            csv.entries.push(token);
            reader.skip_separator();
        }
        let line_end = reader.pos;
        reader.skip_newline();

        let count = csv.entries.len() - first;
        if count == 0 || (count == 1 && csv.entries[first].is_empty()) {
            csv.entries.truncate(first);
            continue;
        }
        if csv.column_count == 0 {
            csv.column_count = count;
        }
        if count > csv.column_count {
            if config.has_header {
                reader.report(
                    Span::new(line_start, line_end),
                    "line and header have mismatching number of tokens",
                    Severity::Error,
                );
                csv.entries.truncate(first + csv.column_count);
            } else {
                log::debug!("csv line has {count} columns, restarting scan");
                csv.entries.clear();
                csv.column_count = count;
                reader.pos = data_start;
                continue;
            }
        }
        for _ in count..csv.column_count {
            csv.entries.push(Entry {
                raw: "",
                offset: line_end,
            });
        }
    }

    log::debug!(
        "parsed csv with {} rows and {} columns",
        csv.row_count(),
        csv.column_count
    );
    csv
}

struct CsvReader<'a, 'h> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    separator: u8,
    handler: &'h mut dyn ErrorHandler,
}

impl<'a> CsvReader<'a, '_> {
    fn report(&mut self, span: Span, message: &str, severity: Severity) {
        self.handler.report(self.source, span, message, severity);
    }

    fn at_line_end(&self) -> bool {
        self.pos >= self.bytes.len() || self.bytes[self.pos] == b'\n'
    }

    fn skip_separator(&mut self) {
        if self.pos < self.bytes.len() && self.bytes[self.pos] == self.separator {
            self.pos += 1;
        }
    }

    fn skip_newline(&mut self) {
        if self.pos < self.bytes.len() {
            self.pos += 1;
        }
    }

    /// Scans one cell. Inside quotes the separator and line breaks do not
    /// end the cell.
    fn token(&mut self) -> Entry<'a> {
        let start = self.pos;
        let mut quoted = false;
        while self.pos < self.bytes.len() {
            let byte = self.bytes[self.pos];
            if byte == b'"' {
                quoted = !quoted;
            } else if !quoted && (byte == self.separator || byte == b'\n') {
                break;
            }
            self.pos += 1;
        }
        if quoted {
            self.report(
                Span::new(start, self.pos),
                "unmatched escape character <\">",
                Severity::Error,
            );
        }

        let mut begin = start;
        let mut end = self.pos;
        while begin < end && self.bytes[begin].is_ascii_whitespace() {
            begin += 1;
        }
        while end > begin && self.bytes[end - 1].is_ascii_whitespace() {
            end -= 1;
        }
        Entry {
            raw: self.source.get(begin..end).unwrap_or(""),
            offset: begin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::DiagnosticCollector;

    fn read_csv(text: &str, has_header: bool) -> (CsvRef<'_>, DiagnosticCollector) {
        let mut collector = DiagnosticCollector::new();
        let config = CsvConfig::default().with_header(has_header);
        let csv = read(text, &config, &mut collector);
        (csv, collector)
    }

    #[rstest::rstest]
    fn test_header_only() {
        let (csv, collector) = read_csv("foo, bla, \"ah ha\"", true);
        assert!(collector.is_empty());
        assert_eq!(csv.header(), ["foo", "bla", "ah ha"]);
        assert_eq!(csv.column_count(), 3);
        assert_eq!(csv.row_count(), 0);
    }

    #[rstest::rstest]
    fn test_header_with_data() {
        let (csv, _) = read_csv("foo, bla, \"ah ha\"\n1,2,foobar", true);
        assert_eq!(csv.row_count(), 1);
        let first = |name: &str| csv.column_by_name(name).and_then(|column| column.get(0)).copied();
        assert_eq!(first("foo").map(|e| e.get_int().ok()), Some(Some(1)));
        assert_eq!(first("bla").map(|e| e.get_int().ok()), Some(Some(2)));
        assert_eq!(first("ah ha").map(|e| e.get_string()), Some("foobar".to_string()));
        assert!(csv.column_by_name("nope").is_none());
    }

    #[rstest::rstest]
    fn test_short_rows_are_padded() {
        let (csv, collector) = read_csv("1,2,3,4\n5,6", false);
        assert!(collector.is_empty());
        assert!(csv.header().is_empty());
        assert_eq!(csv.column_count(), 4);
        assert_eq!(csv.row_count(), 2);
        let row = csv.row(1).expect("row");
        assert_eq!(row[0].get_int().ok(), Some(5));
        assert_eq!(row[1].get_int().ok(), Some(6));
        assert!(row[2].is_empty());
        assert!(row[3].is_empty());
    }

    #[rstest::rstest]
    fn test_wider_line_restarts() {
        let (csv, _) = read_csv("1,2\n3,4,5,6", false);
        assert_eq!(csv.column_count(), 4);
        assert_eq!(csv.row_count(), 2);
        assert!(csv.get(0, 2).is_some_and(Entry::is_empty));
        assert_eq!(csv.get(1, 3).and_then(|e| e.get_int().ok()), Some(6));
        let column: Vec<_> = csv
            .column(1)
            .expect("column")
            .iter()
            .map(|entry| entry.raw())
            .collect();
        assert_eq!(column, vec!["2", "4"]);
    }

    #[rstest::rstest]
    fn test_header_mismatch_is_an_error() {
        let (csv, collector) = read_csv("a,b\n1,2,3\n4,5", true);
        assert_eq!(collector.errors().count(), 1);
        assert_eq!(csv.row_count(), 2);
        assert_eq!(csv.get(1, 0).map(Entry::raw), Some("4"));
    }

    #[rstest::rstest]
    fn test_quoted_cells() {
        let (csv, collector) = read_csv("\"a,b\",\"say \"\"hi\"\"\"\n\"multi\nline\",x", false);
        assert!(collector.is_empty());
        assert_eq!(csv.row_count(), 2);
        assert_eq!(csv.get(0, 0).map(Entry::get_string), Some("a,b".to_string()));
        assert_eq!(
            csv.get(0, 1).map(Entry::get_string),
            Some("say \"hi\"".to_string())
        );
        assert_eq!(
            csv.get(1, 0).map(Entry::get_string),
            Some("multi\nline".to_string())
        );
    }

    #[rstest::rstest]
    fn test_unterminated_quote() {
        let (_, collector) = read_csv("a,\"b", false);
        assert_eq!(
            collector.diagnostics()[0].message,
            "unmatched escape character <\">"
        );
    }

    #[rstest::rstest]
    fn test_blank_lines_and_crlf() {
        let (csv, _) = read_csv("h1;h2\r\n\r\n1;2\r\n\n", true);
        assert_eq!(csv.header(), ["h1;h2"]);

        let mut collector = DiagnosticCollector::new();
        let config = CsvConfig::default().with_separator(b';');
        let csv = read("h1;h2\r\n\r\n1;2\r\n\n", &config, &mut collector);
        assert_eq!(csv.header(), ["h1", "h2"]);
        assert_eq!(csv.row_count(), 1);
        assert_eq!(csv.get(0, 1).map(Entry::raw), Some("2"));
    }

    #[rstest::rstest]
    fn test_empty_header_token_warns() {
        let (_, collector) = read_csv("a,,c\n1,2,3", true);
        assert_eq!(collector.warnings().count(), 1);
    }

    #[rstest::rstest]
    #[case(usize::MAX, 0)]
    #[case(usize::MAX / 2, 1)]
    #[case(usize::MAX / 3 + 1, 0)]
    fn test_out_of_range_lookups(#[case] row: usize, #[case] column: usize) {
        let (csv, _) = read_csv("1,2,3\n4,5,6", false);
        assert!(csv.get(row, column).is_none());
        assert!(csv.row(row).is_none());
        assert!(csv.column(column).and_then(|c| c.get(row)).is_none());
        assert_eq!(csv.get(1, 2).map(Entry::raw), Some("6"));
    }

    #[rstest::rstest]
    fn test_number_errors() {
        let (csv, _) = read_csv("x,1.5", false);
        assert!(csv.get(0, 0).map(Entry::get_double).is_some_and(|r| r.is_err()));
        assert_eq!(csv.get(0, 1).and_then(|e| e.get_float().ok()), Some(1.5));
    }
}
