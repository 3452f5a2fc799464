//! Data layer - Static tables and constants
//!
//! - Markup tag classification, void tags and named entities
//! - Numeric detection and normalization constants

pub mod constants;
pub mod markup_tags;

// Re-export commonly used items
pub use constants::{
    is_numeric, CYCLES_PER_NODE, DEFAULT_ID_PREFIX, MAX_COLSPAN, MAX_ROWSPAN, MIN_CYCLE_BUDGET,
};
pub use markup_tags::{classify, html_entity, is_void, TagClass};
