//! Feature modules
//!
//! - HTML table markup reader and writer

pub mod markup;

pub use markup::{deserialize, parse_html, parse_tables, serialize, serialize_table};
