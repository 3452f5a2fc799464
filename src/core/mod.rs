//! Core modules
//!
//! - `document`: node arena, paths and the edit primitives
//! - `table`: grid model, normalization, header assignment and commands

pub mod document;
pub mod table;

pub use document::{Document, Edit, Node, NodeId, NodeKind, Path};
pub use table::{normalize_document, normalize_table, NormalizeOptions, NormalizeReport};
