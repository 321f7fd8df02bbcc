//! Flat, sibling-linked JSON documents.
//!
//! [`read_ref`] parses JSON text into a [`Document`]: one `Vec` of nodes in
//! pre-order, each node borrowing its token from the source. Typed values are
//! read from a document through [`FromJson`] and written back out through
//! [`ToJson`]. Problems never abort a read; they are passed to an
//! [`ErrorHandler`] and the reader carries on with what it has.
//!
//! # Examples
//! ```
//! use flatdoc::{read_ref, to_string, WriteConfig};
//!
//! let doc = read_ref(r#"{"a": [1, 2], "b": true}"#);
//! let root = doc.root().expect("document has a root");
//! assert_eq!(root.get("a").map(|a| a.child_count), Some(2));
//! assert_eq!(to_string(&root, &WriteConfig::compact()), r#"{"a":[1,2],"b":true}"#);
//! ```

pub mod arena;
pub mod constants;
pub mod csv;
pub mod decode;
pub mod encode;
pub mod error;
pub mod key;
mod macros;
pub mod options;
pub mod parallel;
pub mod text;
pub mod value;

use std::io;

pub use crate::arena::{Cursor, Document, Node, NodeKind, Span};
pub use crate::decode::{Deserializer, FromJson, RecordReader};
pub use crate::encode::{to_vec, ToJson, Writer};
pub use crate::error::{
    Diagnostic, DiagnosticCollector, Error, ErrorHandler, Location, LogErrorHandler, Severity,
};
pub use crate::key::MapKey;
pub use crate::options::{ReadConfig, WriteConfig};
pub use crate::text::{escape_json_string, unescape_json_string, SourceMap};

pub type Result<T> = std::result::Result<T, Error>;

/// Parses `text` with the default configuration, logging any problems.
pub fn read_ref(text: &str) -> Document<'_> {
    read_ref_with(text, &ReadConfig::default(), &mut LogErrorHandler::new())
}

pub fn read_ref_with<'a>(
    text: &'a str,
    config: &ReadConfig,
    handler: &mut dyn ErrorHandler,
) -> Document<'a> {
    decode::parse(text, config, handler)
}

/// Parses `text`, failing with [`Error::Rejected`] if anything was reported
/// at error severity. Warnings are logged.
pub fn try_read_ref<'a>(text: &'a str, config: &ReadConfig) -> Result<Document<'a>> {
    let mut collector = DiagnosticCollector::new();
    let document = read_ref_with(text, config, &mut collector);
    settle(collector)?;
    Ok(document)
}

/// Reads `text` into an existing value. Members the text does not mention
/// keep their current value.
pub fn read_to<T: FromJson + ?Sized>(target: &mut T, text: &str) {
    read_to_with(target, text, &ReadConfig::default(), &mut LogErrorHandler::new());
}

pub fn read_to_with<T: FromJson + ?Sized>(
    target: &mut T,
    text: &str,
    config: &ReadConfig,
    handler: &mut dyn ErrorHandler,
) {
    let document = read_ref_with(text, config, handler);
    let Some(root) = document.root() else {
        return;
    };
    let mut de = Deserializer::new(config, handler);
    de.read(root, target);
}

/// Reads a fresh `T` from `text`, starting from `T::default()`.
///
/// # Examples
/// ```
/// use std::collections::BTreeMap;
///
/// let map: BTreeMap<i32, i32> = flatdoc::read("[[1,3],[2,8]]");
/// assert_eq!(map.get(&2), Some(&8));
/// ```
pub fn read<T: FromJson + Default>(text: &str) -> T {
    read_with(text, &ReadConfig::default(), &mut LogErrorHandler::new())
}

pub fn read_with<T: FromJson + Default>(
    text: &str,
    config: &ReadConfig,
    handler: &mut dyn ErrorHandler,
) -> T {
    let mut value = T::default();
    read_to_with(&mut value, text, config, handler);
    value
}

/// Like [`read`] but returns [`Error::Rejected`] instead of a partially
/// filled value when parsing or deserialization reported an error.
///
/// # Examples
/// ```
/// use flatdoc::{try_read, ReadConfig};
///
/// let config = ReadConfig::default();
/// assert_eq!(try_read::<Vec<u8>>("[1, 2]", &config).ok(), Some(vec![1, 2]));
/// assert!(try_read::<Vec<u8>>("[1, 2", &config).is_err());
/// ```
pub fn try_read<T: FromJson + Default>(text: &str, config: &ReadConfig) -> Result<T> {
    let mut collector = DiagnosticCollector::new();
    let value = read_with(text, config, &mut collector);
    settle(collector)?;
    Ok(value)
}

fn settle(collector: DiagnosticCollector) -> Result<()> {
    if collector.has_errors() {
        return Err(Error::Rejected(collector.into_diagnostics()));
    }
    for warning in collector.warnings() {
        log::warn!("{warning}");
    }
    Ok(())
}

/// Writes `value` as JSON into `sink`.
pub fn write<W, T>(sink: W, value: &T, config: &WriteConfig) -> Result<()>
where
    W: io::Write,
    T: ToJson + ?Sized,
{
    encode::write(sink, value, config)
}

pub fn to_string<T: ToJson + ?Sized>(value: &T, config: &WriteConfig) -> String {
    encode::to_string(value, config)
}
