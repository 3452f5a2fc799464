//! Matrix builder
//!
//! Projects the row/cell tree of a table section onto a [`Grid`]. The builder
//! never mutates the document: when a cell cannot be placed without
//! overlapping an occupied position it stops and reports a [`Collision`]
//! describing the empty cells that have to be inserted before the blocking
//! cell. The caller applies that repair and builds again from scratch.

use fxhash::FxHashMap;

use super::grid::{CellRef, Grid};
use crate::core::document::{Document, NodeId, NodeKind, Path, SectionKind};

/// Anchor position and spans of a placed cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub row: usize,
    pub col: usize,
    pub rowspan: usize,
    pub colspan: usize,
}

impl Anchor {
    /// Whether the cell covers the given position
    pub fn covers(&self, row: usize, col: usize) -> bool {
        row >= self.row
            && row < self.row + self.rowspan
            && col >= self.col
            && col < self.col + self.colspan
    }

    pub fn last_row(&self) -> usize {
        self.row + self.rowspan - 1
    }

    pub fn last_col(&self) -> usize {
        self.col + self.colspan - 1
    }
}

/// Span overlap found mid-build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    /// Grid row of the blocking cell (table coordinates)
    pub row: usize,
    /// Column the blocking cell would have been anchored at
    pub col: usize,
    /// The cell that does not fit
    pub cell: NodeId,
    /// Its path at build time
    pub cell_path: Path,
    /// Empty cells to insert before it
    pub insert: usize,
}

/// Grid of a single section
#[derive(Debug, Clone, Default)]
pub struct SectionGrid {
    pub grid: Grid,
    /// Tree rows in order; the grid may be taller when rowspans overflow
    pub rows: Vec<NodeId>,
    pub anchors: FxHashMap<CellRef, Anchor>,
}

/// Rows of one section inside the table grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionBand {
    pub section: NodeId,
    pub kind: SectionKind,
    /// First grid row of the band
    pub first_row: usize,
    /// Rows present in the tree
    pub tree_rows: usize,
    /// Rows in the grid (at least `tree_rows`)
    pub grid_rows: usize,
}

impl SectionBand {
    pub fn contains_row(&self, row: usize) -> bool {
        row >= self.first_row && row < self.first_row + self.grid_rows
    }
}

/// Whole-table grid: head rows stacked above body rows
#[derive(Debug, Clone, Default)]
pub struct TableMatrix {
    pub grid: Grid,
    /// Tree row backing each grid row, `None` for rowspan-only rows
    pub rows: Vec<Option<NodeId>>,
    pub sections: Vec<SectionBand>,
    anchors: FxHashMap<CellRef, Anchor>,
}

impl TableMatrix {
    pub fn anchor(&self, cell: CellRef) -> Option<Anchor> {
        self.anchors.get(&cell).copied()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn band_of_row(&self, row: usize) -> Option<&SectionBand> {
        self.sections.iter().find(|band| band.contains_row(row))
    }

    /// Number of head rows in the grid
    pub fn head_rows(&self) -> usize {
        self.sections
            .iter()
            .filter(|band| band.kind == SectionKind::Head)
            .map(|band| band.grid_rows)
            .sum()
    }

    /// Grid row of a tree row
    pub fn row_of(&self, row: NodeId) -> Option<usize> {
        self.rows.iter().position(|&r| r == Some(row))
    }

    /// Distinct cells in row-major anchor order
    pub fn cells(&self) -> Vec<CellRef> {
        let mut cells: Vec<(Anchor, CellRef)> =
            self.anchors.iter().map(|(&cell, &anchor)| (anchor, cell)).collect();
        cells.sort_by_key(|(anchor, _)| (anchor.row, anchor.col));
        cells.into_iter().map(|(_, cell)| cell).collect()
    }

    /// Child index in tree row `row` at which a cell anchored at `col` belongs
    pub fn insertion_index(&self, row: usize, col: usize) -> usize {
        self.grid
            .row_projection(row)
            .into_iter()
            .filter_map(|cell| self.anchor(cell))
            .filter(|anchor| anchor.row == row && anchor.col < col)
            .count()
    }

    /// Whether any cell spans more than one row or column
    pub fn has_spans(&self) -> bool {
        self.anchors
            .values()
            .any(|anchor| anchor.rowspan > 1 || anchor.colspan > 1)
    }
}

fn cell_spans(kind: &NodeKind) -> (usize, usize) {
    match kind {
        NodeKind::Cell(attrs) => (attrs.rows(), attrs.cols()),
        _ => (1, 1),
    }
}

/// Build the grid of one section
pub fn build_section(doc: &Document, section: NodeId) -> Result<SectionGrid, Collision> {
    let mut out = SectionGrid::default();
    let rows: Vec<NodeId> = doc
        .children(section)
        .iter()
        .copied()
        .filter(|&id| doc.kind(id).is_some_and(NodeKind::is_row))
        .collect();

    for (r, &row) in rows.iter().enumerate() {
        out.grid.ensure_row(r);
        let mut col = 0;
        for &cell in doc.children(row) {
            let Some(kind) = doc.kind(cell).filter(|kind| kind.is_cell()) else {
                continue;
            };
            let (rowspan, colspan) = cell_spans(kind);
            col = out.grid.first_free(r, col);

            if !out.grid.region_is_free(r, col, colspan, rowspan) {
                let mut insert = 0;
                let mut candidate = col;
                while !out.grid.region_is_free(r, candidate, colspan, rowspan) {
                    insert += 1;
                    candidate = out.grid.first_free(r, candidate + 1);
                }
                return Err(Collision {
                    row: r,
                    col,
                    cell,
                    cell_path: doc.path_of(cell).unwrap_or_default(),
                    insert,
                });
            }

            out.grid.place(r, col, colspan, rowspan, cell);
            out.anchors.insert(
                cell,
                Anchor {
                    row: r,
                    col,
                    rowspan,
                    colspan,
                },
            );
            col += colspan;
        }
    }

    out.rows = rows;
    Ok(out)
}

/// Build the stacked grid of every section of a table
pub fn build_table(doc: &Document, table: NodeId) -> Result<TableMatrix, Collision> {
    let mut matrix = TableMatrix::default();

    for &section in doc.children(table) {
        let Some(kind) = doc.kind(section).and_then(NodeKind::section_kind) else {
            continue;
        };
        let offset = matrix.grid.height();
        let built = build_section(doc, section).map_err(|mut collision| {
            collision.row += offset;
            collision
        })?;

        let grid_rows = built.grid.height().max(built.rows.len());
        matrix.sections.push(SectionBand {
            section,
            kind,
            first_row: offset,
            tree_rows: built.rows.len(),
            grid_rows,
        });
        for r in 0..grid_rows {
            matrix.rows.push(built.rows.get(r).copied());
        }
        for (cell, mut anchor) in built.anchors {
            anchor.row += offset;
            matrix.anchors.insert(cell, anchor);
        }
        if grid_rows > 0 {
            let mut grid = built.grid;
            grid.ensure_row(grid_rows - 1);
            matrix.grid.stack(grid);
        }
    }

    log::trace!(
        "built grid for table {:?}: {}x{} over {} section(s)",
        table,
        matrix.height(),
        matrix.width(),
        matrix.sections.len()
    );
    Ok(matrix)
}
