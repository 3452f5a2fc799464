//! Grid coordinate model
//!
//! A rectangular matrix of cell references. A cell spanning `width` columns
//! and `height` rows occupies every position of that rectangle, and each of
//! those positions holds the same reference.

use indexmap::IndexSet;

use crate::core::document::NodeId;

/// Reference to the cell occupying a grid position
pub type CellRef = NodeId;

/// Logical grid of cell references, growing downward and rightward on demand
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<Option<CellRef>>>,
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a `width` x `height` region anchored at (`row`, `col`)
    pub fn place(&mut self, row: usize, col: usize, width: usize, height: usize, cell: CellRef) {
        let end_col = col.saturating_add(width.max(1));
        let end_row = row.saturating_add(height.max(1));
        for r in row..end_row {
            self.ensure_row(r);
            let line = &mut self.rows[r];
            if line.len() < end_col {
                line.resize(end_col, None);
            }
            for slot in &mut line[col..end_col] {
                *slot = Some(cell);
            }
        }
    }

    /// Make sure row `row` exists (possibly empty)
    pub fn ensure_row(&mut self, row: usize) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
    }

    /// Cell occupying a position, if any
    pub fn at(&self, row: usize, col: usize) -> Option<CellRef> {
        self.rows.get(row)?.get(col).copied().flatten()
    }

    pub fn is_free(&self, row: usize, col: usize) -> bool {
        self.at(row, col).is_none()
    }

    /// Number of rows, including rows that only exist through rowspans
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Widest row, counting holes
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Number of occupied positions in a row
    pub fn row_cardinality(&self, row: usize) -> usize {
        self.rows
            .get(row)
            .map(|line| line.iter().filter(|slot| slot.is_some()).count())
            .unwrap_or(0)
    }

    /// First free column in a row at or after `from`
    pub fn first_free(&self, row: usize, from: usize) -> usize {
        let mut col = from;
        while !self.is_free(row, col) {
            col += 1;
        }
        col
    }

    /// Distinct cells in a column, top to bottom
    pub fn column_projection(&self, col: usize) -> IndexSet<CellRef> {
        (0..self.height())
            .filter_map(|row| self.at(row, col))
            .collect()
    }

    /// Distinct cells in a row, left to right
    pub fn row_projection(&self, row: usize) -> IndexSet<CellRef> {
        self.rows
            .get(row)
            .map(|line| line.iter().flatten().copied().collect())
            .unwrap_or_default()
    }

    /// Whether a rectangle is entirely free
    pub fn region_is_free(&self, row: usize, col: usize, width: usize, height: usize) -> bool {
        let end_col = col.saturating_add(width.max(1));
        (row..row.saturating_add(height.max(1)))
            .all(|r| (col..end_col).all(|c| self.is_free(r, c)))
    }

    /// Append the rows of another grid below this one
    pub fn stack(&mut self, other: Grid) {
        self.rows.extend(other.rows);
    }
}
