//! Batch reading of many independent buffers.
//!
//! With the `parallel` feature the buffers are spread over the rayon pool,
//! otherwise they are read one after another. Each buffer gets its own
//! [`DiagnosticCollector`].

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::arena::Document;
use crate::decode::FromJson;
use crate::error::{Diagnostic, DiagnosticCollector};
use crate::{read_ref_with, try_read, ReadConfig, Result};

fn read_one<'a>(source: &'a str, config: &ReadConfig) -> (Document<'a>, Vec<Diagnostic>) {
    let mut collector = DiagnosticCollector::new();
    let document = read_ref_with(source, config, &mut collector);
    (document, collector.into_diagnostics())
}

/// Parses every buffer, returning each document with its diagnostics in
/// input order.
#[cfg(feature = "parallel")]
pub fn read_ref_all<'a>(
    sources: &[&'a str],
    config: &ReadConfig,
) -> Vec<(Document<'a>, Vec<Diagnostic>)> {
    sources
        .par_iter()
        .map(|&source| read_one(source, config))
        .collect()
}

#[cfg(not(feature = "parallel"))]
pub fn read_ref_all<'a>(
    sources: &[&'a str],
    config: &ReadConfig,
) -> Vec<(Document<'a>, Vec<Diagnostic>)> {
    sources
        .iter()
        .map(|&source| read_one(source, config))
        .collect()
}

/// [`try_read`] over every buffer, results in input order.
#[cfg(feature = "parallel")]
pub fn try_read_all<T>(sources: &[&str], config: &ReadConfig) -> Vec<Result<T>>
where
    T: FromJson + Default + Send,
{
    sources
        .par_iter()
        .map(|source| try_read(source, config))
        .collect()
}

#[cfg(not(feature = "parallel"))]
pub fn try_read_all<T>(sources: &[&str], config: &ReadConfig) -> Vec<Result<T>>
where
    T: FromJson + Default,
{
    sources
        .iter()
        .map(|source| try_read(source, config))
        .collect()
}
