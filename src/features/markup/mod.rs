//! HTML table markup boundary
//!
//! Reads and writes the table tag grammar:
//!
//! ```text
//! <table>
//!   <caption>..</caption>        omitted when empty
//!   <colgroup>..</colgroup>      kept verbatim
//!   <thead><tr><th>..</th></tr></thead>
//!   <tbody><tr><td rowspan colspan data-align scope id headers class>..</td></tr></tbody>
//! </table>
//! ```
//!
//! # Example
//!
//! ```rust
//! use richtable::features::markup::{deserialize, serialize};
//! use richtable::NormalizeOptions;
//!
//! let doc = deserialize("<table><tr><td>42</td></tr></table>", &NormalizeOptions::default()).unwrap();
//! assert!(serialize(&doc).starts_with("<table><thead>"));
//! ```

mod parse;
mod write;

pub use parse::parse_html;
pub use write::{serialize, serialize_table};

use crate::core::document::Document;
use crate::core::table::{normalize_document, NormalizeOptions};
use crate::utils::error::{TableError, TableResult};

/// Parse markup that must hold at least one table
pub fn parse_tables(input: &str) -> TableResult<Document> {
    let doc = parse_html(input)?;
    if doc.tables().is_empty() {
        return Err(TableError::invalid("input contains no table"));
    }
    Ok(doc)
}

/// Parse markup and normalize every table in it
pub fn deserialize(input: &str, opts: &NormalizeOptions) -> TableResult<Document> {
    let mut doc = parse_html(input)?;
    let reports = normalize_document(&mut doc, opts);
    let repairs: usize = reports.iter().map(|report| report.repairs.len()).sum();
    log::debug!(
        "deserialized {} table(s), {} repair(s)",
        reports.len(),
        repairs
    );
    Ok(doc)
}
