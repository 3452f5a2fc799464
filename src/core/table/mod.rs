//! Table Structure Engine
//!
//! Keeps the tree shape of a table (caption, sections, rows, cells with
//! spans) consistent with a rectangular logical grid.
//!
//! # Architecture
//!
//! The grid is never stored. Every normalization cycle derives it from the
//! tree, and any repair throws it away again:
//!
//! ```text
//! Tree -> Matrix Builder -> Repairers -> Edit -> Tree -> ... -> Stable -> Header Pass
//!              |                                  ^
//!              +--------- Collision -------------+
//! ```
//!
//! # Example
//!
//! ```rust
//! use richtable::core::document::Document;
//! use richtable::core::table::{create_table, NormalizeOptions};
//!
//! let mut doc = Document::new();
//! let opts = NormalizeOptions::default();
//! let table = create_table(&mut doc, 0, 2, 3, &opts).unwrap();
//! assert_eq!(doc.children(table).len(), 3);
//! ```

mod commands;
mod context;
mod grid;
mod headers;
mod matrix;
mod normalize;
mod repair;

#[cfg(test)]
mod tests;

// Re-export public API
pub use commands::{
    align_column, cell_at, create_table, insert_column, insert_head_section, insert_row,
    remove_column, remove_row, set_colgroup_markup, toggle_row_headers, Placement,
};
pub use context::NormalizeOptions;
pub use grid::{CellRef, Grid};
pub use headers::{assign_headers, header_id, needs_headers};
pub use matrix::{build_section, build_table, Anchor, Collision, SectionBand, SectionGrid, TableMatrix};
pub use normalize::{next_repair, normalize_document, normalize_table, NormalizeReport};
pub use repair::{
    default_head, repair_caption, repair_cell, repair_collision, repair_row, repair_section,
    repair_table, repair_widths, Repair, RepairKind, RepairOutcome,
};
