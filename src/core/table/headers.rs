//! Header and accessibility pass
//!
//! Runs on a stable table. Cells are retyped from where they sit (head
//! section, or the first body column when the table has row headers), and
//! when the layout is ambiguous enough to need them, header cells get ids and
//! every cell gets a `headers` list pointing at the header cells that label it.

use fxhash::FxHashMap;
use indexmap::IndexSet;

use super::context::NormalizeOptions;
use super::grid::CellRef;
use super::matrix::{build_table, Anchor, TableMatrix};
use crate::core::document::{CellAttrs, CellKind, Document, NodeId, NodeKind, Scope, SectionKind};

/// Kind and scope a cell takes from its position
fn placement(section: SectionKind, col: usize, row_headers: bool) -> (CellKind, Option<Scope>) {
    match section {
        SectionKind::Head => (CellKind::Header, Some(Scope::Col)),
        SectionKind::Body if row_headers && col == 0 => (CellKind::Header, Some(Scope::Row)),
        SectionKind::Body => (CellKind::Data, None),
    }
}

/// Whether the table needs explicit `id`/`headers` linkage
pub fn needs_headers(matrix: &TableMatrix, row_headers: bool) -> bool {
    let head_rows = matrix.head_rows();
    matrix.has_spans() || head_rows >= 2 || (head_rows == 1 && row_headers)
}

/// Id of the header cell anchored at (`row`, `col`)
pub fn header_id(prefix: &str, ordinal: usize, row: usize, col: usize) -> String {
    format!("{}{}-r{}c{}", prefix, ordinal, row, col)
}

struct Layout<'a> {
    matrix: &'a TableMatrix,
    kinds: FxHashMap<CellRef, (CellKind, Option<Scope>)>,
    row_headers: bool,
}

impl Layout<'_> {
    fn is_header(&self, cell: CellRef) -> bool {
        matches!(self.kinds.get(&cell), Some((CellKind::Header, _)))
    }

    /// Header cells labelling a cell, column headers first
    fn labels(&self, cell: CellRef, anchor: &Anchor, in_body: bool) -> IndexSet<CellRef> {
        let grid = &self.matrix.grid;
        let head_rows = self.matrix.head_rows().min(anchor.row);
        let mut out = IndexSet::new();

        for col in anchor.col..=anchor.last_col() {
            for row in 0..head_rows {
                if let Some(label) = grid.at(row, col) {
                    if label != cell && self.is_header(label) {
                        out.insert(label);
                    }
                }
            }
        }

        if self.row_headers && in_body && anchor.col > 0 {
            for row in anchor.row..=anchor.last_row() {
                if let Some(label) = grid.at(row, 0) {
                    if label != cell && self.is_header(label) {
                        out.insert(label);
                    }
                }
            }
        }
        out
    }
}

/// Retype cells and rewrite their `scope`/`id`/`headers`; returns cells changed
pub fn assign_headers(
    doc: &mut Document,
    table: NodeId,
    ordinal: usize,
    opts: &NormalizeOptions,
) -> usize {
    let row_headers = match doc.kind(table) {
        Some(NodeKind::Table(attrs)) => attrs.row_headers,
        _ => return 0,
    };
    let matrix = match build_table(doc, table) {
        Ok(matrix) => matrix,
        Err(collision) => {
            log::warn!(
                "header pass skipped: table {:?} still collides at ({}, {})",
                table,
                collision.row,
                collision.col
            );
            return 0;
        }
    };

    let cells = matrix.cells();
    let mut kinds = FxHashMap::default();
    for &cell in &cells {
        let Some(anchor) = matrix.anchor(cell) else {
            continue;
        };
        let Some(band) = matrix.band_of_row(anchor.row) else {
            continue;
        };
        kinds.insert(cell, placement(band.kind, anchor.col, row_headers));
    }

    let linked = needs_headers(&matrix, row_headers);
    let layout = Layout {
        matrix: &matrix,
        kinds,
        row_headers,
    };

    let mut wanted: Vec<(NodeId, CellAttrs)> = Vec::with_capacity(cells.len());
    for &cell in &cells {
        let (Some(NodeKind::Cell(current)), Some(anchor)) = (doc.kind(cell), matrix.anchor(cell))
        else {
            continue;
        };
        let Some(&(kind, scope)) = layout.kinds.get(&cell) else {
            continue;
        };
        let in_body = matrix
            .band_of_row(anchor.row)
            .is_some_and(|band| band.kind == SectionKind::Body);

        let (id, headers) = if linked {
            let id = (kind == CellKind::Header)
                .then(|| header_id(&opts.id_prefix, ordinal, anchor.row, anchor.col));
            let labels: Vec<String> = layout
                .labels(cell, &anchor, in_body)
                .into_iter()
                .filter_map(|label| matrix.anchor(label))
                .map(|at| header_id(&opts.id_prefix, ordinal, at.row, at.col))
                .collect();
            (id, (!labels.is_empty()).then(|| labels.join(" ")))
        } else {
            (None, None)
        };

        let next = CellAttrs {
            kind,
            scope,
            id,
            headers,
            ..current.clone()
        };
        if &next != current {
            wanted.push((cell, next));
        }
    }

    let mut changed = 0;
    for (cell, attrs) in wanted {
        let Some(path) = doc.path_of(cell) else {
            continue;
        };
        if doc.set_node_properties(&path, NodeKind::Cell(attrs)) {
            changed += 1;
        }
    }
    if changed > 0 {
        log::debug!("header pass updated {} cell(s) in table {:?}", changed, table);
    }
    changed
}
