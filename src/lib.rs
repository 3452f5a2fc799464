//! # richtable
//!
//! Table structure model and grid-based normalization engine for rich-text
//! documents.
//!
//! ## Features
//!
//! - **Grid Model**: row/cell trees with row and column spans projected onto a
//!   rectangular matrix
//! - **Self-Healing**: repair-until-stable normalization that fixes shape,
//!   span collisions and ragged rows with ordinary tree edits
//! - **Accessibility**: header cells, `scope`, and `id`/`headers` linking for
//!   complex tables
//! - **Commands**: row/column insertion and removal that keep spans consistent
//! - **Markup**: HTML table reader and writer
//!
//! ## Usage Examples
//!
//! ### Normalizing Markup
//!
//! ```rust
//! use richtable::{deserialize, serialize, NormalizeOptions};
//!
//! let doc = deserialize(
//!     "<table><tr><td>a</td><td>b</td></tr><tr><td>c</td></tr></table>",
//!     &NormalizeOptions::default(),
//! )
//! .unwrap();
//! let html = serialize(&doc);
//! assert!(html.contains("<tr><td>c</td><td></td></tr></tbody>"));
//! ```
//!
//! ### Editing a Table
//!
//! ```rust
//! use richtable::{create_table, insert_row, Document, NormalizeOptions, Placement};
//!
//! let opts = NormalizeOptions::default();
//! let mut doc = Document::new();
//! let table = create_table(&mut doc, 0, 2, 2, &opts).unwrap();
//! let path = doc.path_of(table).unwrap();
//! let cell = [path[0], 2, 0, 0];
//! assert!(insert_row(&mut doc, &cell, Placement::After, &opts));
//! ```

/// Document tree and table engine
pub mod core;

/// Data layer - static tables and constants
pub mod data;

/// Feature modules - markup boundary
pub mod features;

/// Utility modules
pub mod utils;

// Re-export the document model
pub use core::document::{
    Align, CellAttrs, CellKind, Document, Edit, Element, Mark, Node, NodeId, NodeKind, Path,
    Scope, SectionKind, TableAttrs, TextLeaf,
};

// Re-export the table engine
pub use core::table::{
    align_column, cell_at, create_table, insert_column, insert_head_section, insert_row,
    normalize_document, normalize_table, remove_column, remove_row, set_colgroup_markup,
    toggle_row_headers, NormalizeOptions, NormalizeReport, Placement,
};

// Re-export the markup boundary
pub use features::markup::{deserialize, parse_html, parse_tables, serialize, serialize_table};

// Re-export utilities
pub use utils::diagnostics;
pub use utils::error::{TableError, TableResult};
