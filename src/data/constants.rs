//! Constants and patterns shared by the normalization engine

use lazy_static::lazy_static;
use regex::Regex;

/// Default prefix for generated header ids
pub const DEFAULT_ID_PREFIX: &str = "table";

/// Floor of the normalization cycle guard
pub const MIN_CYCLE_BUDGET: usize = 64;

/// Cycles allowed per node of the table subtree
pub const CYCLES_PER_NODE: usize = 8;

/// Largest accepted `colspan`, as in HTML
pub const MAX_COLSPAN: usize = 1000;

/// Largest accepted `rowspan`, as in HTML
pub const MAX_ROWSPAN: usize = 65534;

lazy_static! {
    /// Signed decimal number, optional fraction and exponent.
    /// No locale-specific separators.
    static ref NUMERIC: Regex =
        Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?$").unwrap();
}

/// Whether trimmed text reads as a finite number
pub fn is_numeric(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && NUMERIC.is_match(trimmed)
}
