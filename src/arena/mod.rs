//! Flat document model.
//!
//! A parsed JSON text is stored as one append-only `Vec<Node>`. Node 0 is the
//! root; every other "pointer" is an index into the same vector. Children of a
//! composite are reached through `first_child` and then by following
//! `next_sibling` until it is 0. Objects store their members as alternating
//! key/value nodes, so an object with `child_count == n` has `2 * n` nodes in
//! its sibling chain.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::constants::is_json_number;
use crate::error::{ErrorHandler, Severity};
use crate::text::escape::{check_json_str, unescape_json_str, unescape_json_string};
use crate::{Error, Result};

mod cursor;

pub use cursor::{Children, Cursor, Entries};
pub(crate) use cursor::key_matches;

/// Sentinel for "no next sibling". Node 0 is always the root and is never a
/// sibling of anything.
pub const NO_SIBLING: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Null,
    Number,
    String,
    Boolean,
    Array,
    Object,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Null => "null",
            NodeKind::Number => "number",
            NodeKind::String => "string",
            NodeKind::Boolean => "bool",
            NodeKind::Array => "array",
            NodeKind::Object => "object",
        }
    }

    pub fn is_composite(self) -> bool {
        matches!(self, NodeKind::Array | NodeKind::Object)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// One entry of the flat tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node<'a> {
    pub kind: NodeKind,
    /// Exact source text of this node, quotes and brackets included.
    pub token: &'a str,
    /// Byte offset of `token` in the source.
    pub offset: usize,
    pub next_sibling: usize,
    pub first_child: usize,
    /// Elements for arrays, key/value pairs for objects.
    pub child_count: usize,
}

impl<'a> Node<'a> {
    pub(crate) fn new(kind: NodeKind, token: &'a str, offset: usize) -> Self {
        Self {
            kind,
            token,
            offset,
            next_sibling: NO_SIBLING,
            first_child: 0,
            child_count: 0,
        }
    }

    pub fn span(&self) -> Span {
        Span::new(self.offset, self.offset + self.token.len())
    }

    pub fn is_null(&self) -> bool {
        self.kind == NodeKind::Null
    }

    pub fn is_number(&self) -> bool {
        self.kind == NodeKind::Number
    }

    pub fn is_string(&self) -> bool {
        self.kind == NodeKind::String
    }

    pub fn is_boolean(&self) -> bool {
        self.kind == NodeKind::Boolean
    }

    pub fn is_array(&self) -> bool {
        self.kind == NodeKind::Array
    }

    pub fn is_object(&self) -> bool {
        self.kind == NodeKind::Object
    }

    pub fn is_composite(&self) -> bool {
        self.kind.is_composite()
    }

    pub fn is_leaf(&self) -> bool {
        !self.kind.is_composite()
    }

    fn expect_kind(&self, expected: NodeKind) -> Result<()> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(Error::KindMismatch {
                expected,
                found: self.kind,
            })
        }
    }

    pub fn get_boolean(&self) -> Result<bool> {
        self.expect_kind(NodeKind::Boolean)?;
        Ok(self.token.as_bytes().first() == Some(&b't'))
    }

    /// Unescaped string content, always allocated.
    pub fn get_string(&self) -> Result<String> {
        self.expect_kind(NodeKind::String)?;
        unescape_json_string(self.token)
    }

    /// Unescaped string content, borrowed from the source when the token
    /// contains no escapes.
    pub fn get_str(&self) -> Result<Cow<'a, str>> {
        self.expect_kind(NodeKind::String)?;
        unescape_json_str(self.token)
    }

    pub fn get_number<T: FromStr>(&self) -> Result<T> {
        self.expect_kind(NodeKind::Number)?;
        self.token.parse::<T>().map_err(|_| Error::InvalidNumber {
            token: self.token.to_string(),
            target: std::any::type_name::<T>(),
        })
    }

    pub fn get_int(&self) -> Result<i32> {
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

/// Read-only view of a parsed JSON text. Borrows the source, so it can never
/// outlive it.
#[derive(Debug, Clone, Default)]
pub struct Document<'a> {
    source: &'a str,
    nodes: Vec<Node<'a>>,
    error_count: usize,
}

impl<'a> Document<'a> {
    pub(crate) fn from_parts(source: &'a str, nodes: Vec<Node<'a>>, error_count: usize) -> Self {
        Self {
            source,
            nodes,
            error_count,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn nodes(&self) -> &[Node<'a>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when parsing did not produce even a root node.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of error-severity diagnostics reported while parsing.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn node(&self, index: usize) -> Option<&Node<'a>> {
        self.nodes.get(index)
    }

    pub fn root(&self) -> Option<Cursor<'_, 'a>> {
        self.cursor(0)
    }

    pub fn cursor(&self, index: usize) -> Option<Cursor<'_, 'a>> {
        if index < self.nodes.len() {
            Some(Cursor::new(self, index))
        } else {
            None
        }
    }

    /// Reports every number token that is not valid JSON and every string or
    /// key with a bad escape. The parser lets both through, so a document
    /// that is about to be written back out should pass this first.
    ///
    /// Returns the number of errors reported.
    pub fn check_leaves(&self, handler: &mut dyn ErrorHandler) -> usize {
        let mut errors = 0;
        for node in &self.nodes {
            let problem = match node.kind {
                NodeKind::Number if !is_json_number(node.token) => Some(Error::MalformedNumber {
                    token: node.token.to_string(),
                }),
                NodeKind::String => check_json_str(node.token).err(),
                _ => None,
            };
            if let Some(err) = problem {
                handler.report(self.source, node.span(), &err.to_string(), Severity::Error);
                errors += 1;
            }
        }
        errors
    }
}

impl<'a> std::ops::Index<usize> for Document<'a> {
    type Output = Node<'a>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.nodes[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(kind: NodeKind, token: &str) -> Node<'_> {
        Node::new(kind, token, 0)
    }

    #[rstest::rstest]
    fn test_check_leaves_reports_bad_tokens() {
        let mut collector = crate::DiagnosticCollector::new();
        let doc = crate::read_ref_with(
            r#"{"ok": [1, -0.5e3, "a\nb"], "a\qkey": [+4, 1x, 0x1F, "a\qb", 01]}"#,
            &crate::ReadConfig::default(),
            &mut collector,
        );
        assert!(collector.is_empty());

        assert_eq!(doc.check_leaves(&mut collector), 6);
        let messages: Vec<&str> = collector
            .diagnostics()
            .iter()
            .map(|diagnostic| diagnostic.message.as_str())
            .collect();
        assert_eq!(
            messages,
            vec![
                "unknown escape sequence `\\q` at byte 2 of the string token",
                "`+4` is not a valid JSON number",
                "`1x` is not a valid JSON number",
                "`0x1F` is not a valid JSON number",
                "unknown escape sequence `\\q` at byte 2 of the string token",
                "`01` is not a valid JSON number",
            ]
        );
        assert!(collector.errors().all(|d| d.location.line == 1));
    }

    #[rstest::rstest]
    fn test_check_leaves_clean_document() {
        let doc = crate::read_ref(r#"[0, -1.5E+2, "x\u0041\t", {"k": null}, true]"#);
        let mut collector = crate::DiagnosticCollector::new();
        assert_eq!(doc.check_leaves(&mut collector), 0);
        assert!(collector.is_empty());
    }

    #[rstest::rstest]
    fn test_boolean_extraction() {
        assert!(leaf(NodeKind::Boolean, "true").get_boolean().unwrap());
        assert!(!leaf(NodeKind::Boolean, "false").get_boolean().unwrap());
        assert!(leaf(NodeKind::String, "\"true\"").get_boolean().is_err());
    }

    #[rstest::rstest]
    fn test_number_extraction() {
        assert_eq!(leaf(NodeKind::Number, "123").get_int().unwrap(), 123);
        assert_eq!(leaf(NodeKind::Number, "-123e8").get_double().unwrap(), -123e8);
        assert_eq!(leaf(NodeKind::Number, "1.25").get_float().unwrap(), 1.25f32);
        assert_eq!(
            leaf(NodeKind::Number, "18446744073709551615").get_uint64().unwrap(),
            u64::MAX
        );
        assert_eq!(
            leaf(NodeKind::Number, "-9000000000").get_int64().unwrap(),
            -9_000_000_000
        );
    }

    #[rstest::rstest]
    fn test_invalid_number_is_an_error() {
        let err = leaf(NodeKind::Number, "12abc").get_int().unwrap_err();
        assert!(matches!(err, Error::InvalidNumber { ref token, .. } if token == "12abc"));
        assert!(leaf(NodeKind::Number, "1.5").get_int().is_err());
    }

    #[rstest::rstest]
    fn test_kind_mismatch() {
        let err = leaf(NodeKind::Null, "null").get_string().unwrap_err();
        assert!(matches!(
            err,
            Error::KindMismatch {
                expected: NodeKind::String,
                found: NodeKind::Null
            }
        ));
    }

    #[rstest::rstest]
    fn test_string_extraction_borrows_without_escapes() {
        let node = leaf(NodeKind::String, "\"abc\"");
        assert!(matches!(node.get_str().unwrap(), Cow::Borrowed("abc")));
        let node = leaf(NodeKind::String, "\"a\\n\\\\bc\"");
        assert_eq!(node.get_string().unwrap(), "a\n\\bc");
    }

    #[rstest::rstest]
    fn test_span() {
        let node = Node::new(NodeKind::Array, "[1]", 4);
        assert_eq!(node.span(), Span::new(4, 7));
        assert_eq!(node.span().len(), 3);
    }
}
