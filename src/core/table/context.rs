//! Normalization options

use crate::data::constants::{CYCLES_PER_NODE, DEFAULT_ID_PREFIX, MIN_CYCLE_BUDGET};

/// Options for table normalization and the commands that trigger it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Right-align cells whose text is a number and that have no alignment
    /// Default: true
    pub numeric_align: bool,

    /// Prefix of generated header ids
    /// Default: "table"
    pub id_prefix: String,

    /// Upper bound on repair cycles per table
    /// Default: None (derived from the table size)
    pub max_cycles: Option<usize>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            numeric_align: true,
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            max_cycles: None,
        }
    }
}

impl NormalizeOptions {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_numeric_align(mut self, enabled: bool) -> Self {
        self.numeric_align = enabled;
        self
    }

    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self
    }

    pub fn with_max_cycles(mut self, max: usize) -> Self {
        self.max_cycles = Some(max);
        self
    }

    /// Cycle budget for a table subtree of `nodes` nodes
    pub fn cycle_budget(&self, nodes: usize) -> usize {
        self.max_cycles
            .unwrap_or_else(|| nodes.saturating_mul(CYCLES_PER_NODE) + MIN_CYCLE_BUDGET)
    }
}
