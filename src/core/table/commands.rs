//! Table editing commands
//!
//! Commands resolve the selection to a cell, work out grid coordinates on a
//! normalized table, apply a handful of edits and normalize again. They only
//! keep spans crossing the edited line in step; everything else (padding
//! rows, retyping cells, header ids) is left to the normalizer.

use fxhash::FxHashSet;

use super::context::NormalizeOptions;
use super::matrix::{build_table, Anchor, TableMatrix};
use super::normalize::normalize_table;
use crate::core::document::{
    child_path, Align, CellAttrs, Document, Edit, Node, NodeId, NodeKind, Path, SectionKind,
    TableAttrs,
};

/// Side of the selection a new row or column goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    Before,
    #[default]
    After,
}

/// Selected cell inside a normalized table
struct Target {
    table: NodeId,
    anchor: Anchor,
    matrix: TableMatrix,
}

fn table_of(doc: &Document, selection: &[usize]) -> Option<NodeId> {
    let node = doc.resolve(selection)?;
    doc.ancestor_where(node, |kind| matches!(kind, NodeKind::Table(_)))
}

fn locate(doc: &mut Document, selection: &[usize], opts: &NormalizeOptions) -> Option<Target> {
    let node = doc.resolve(selection)?;
    let cell = doc.ancestor_where(node, NodeKind::is_cell)?;
    let table = doc.ancestor_where(cell, |kind| matches!(kind, NodeKind::Table(_)))?;
    normalize_table(doc, table, opts);

    // Normalization may have re-homed the selection; the cell id survives.
    let matrix = build_table(doc, table).ok()?;
    let Some(anchor) = matrix.anchor(cell) else {
        log::warn!("selected cell {:?} is not on the grid", cell);
        return None;
    };
    Some(Target {
        table,
        anchor,
        matrix,
    })
}

fn cell_attrs(doc: &Document, cell: NodeId) -> Option<CellAttrs> {
    doc.kind(cell).and_then(NodeKind::cell_attrs).cloned()
}

/// Edit that rewrites a cell's spans
fn respan(doc: &Document, cell: NodeId, rowspan: usize, colspan: usize) -> Option<Edit> {
    let attrs = cell_attrs(doc, cell)?;
    let path = doc.path_of(cell)?;
    Some(Edit::set(
        path,
        NodeKind::Cell(CellAttrs {
            rowspan,
            colspan,
            ..attrs
        }),
    ))
}

fn apply_all(doc: &mut Document, edits: Vec<Edit>) -> usize {
    edits
        .into_iter()
        .map(|edit| doc.apply(edit))
        .filter(|&ok| ok)
        .count()
}

fn finish(doc: &mut Document, table: NodeId, opts: &NormalizeOptions) -> bool {
    normalize_table(doc, table, opts);
    true
}

/// Insert an empty row above or below the selected cell
pub fn insert_row(
    doc: &mut Document,
    selection: &[usize],
    placement: Placement,
    opts: &NormalizeOptions,
) -> bool {
    let Some(Target {
        table,
        anchor,
        matrix,
    }) = locate(doc, selection, opts)
    else {
        return false;
    };
    let edge = match placement {
        Placement::Before => anchor.row,
        Placement::After => anchor.last_row() + 1,
    };
    let Some(band) = matrix.band_of_row(anchor.row).cloned() else {
        return false;
    };
    let Some(section_path) = doc.path_of(band.section) else {
        return false;
    };

    let mut edits = Vec::new();
    let mut grown = FxHashSet::default();
    let mut width = 0;
    for col in 0..matrix.width() {
        let crossing = matrix
            .grid
            .at(edge, col)
            .filter(|&cell| edge > 0 && matrix.grid.at(edge - 1, col) == Some(cell));
        match crossing {
            Some(cell) => {
                if grown.insert(cell) {
                    if let Some(at) = matrix.anchor(cell) {
                        edits.extend(respan(doc, cell, at.rowspan + 1, at.colspan));
                    }
                }
            }
            None => width += 1,
        }
    }

    let attrs = match band.kind {
        SectionKind::Head => CellAttrs::header(),
        SectionKind::Body => CellAttrs::default(),
    };
    let row = Node::row((0..width).map(|_| Node::cell(attrs.clone(), "")).collect());
    edits.push(Edit::insert(
        child_path(&section_path, edge - band.first_row),
        row,
    ));

    log::debug!("insert_row at grid row {} of table {:?}", edge, table);
    apply_all(doc, edits);
    finish(doc, table, opts)
}

/// Remove the row holding the selected cell's anchor
pub fn remove_row(doc: &mut Document, selection: &[usize], opts: &NormalizeOptions) -> bool {
    let Some(Target {
        table,
        anchor,
        matrix,
    }) = locate(doc, selection, opts)
    else {
        return false;
    };
    if matrix.height() <= 1 {
        return false;
    }
    let row = anchor.row;
    let Some(band) = matrix.band_of_row(row).cloned() else {
        return false;
    };
    let (Some(Some(row_id)), Some(section_path)) =
        (matrix.rows.get(row).copied(), doc.path_of(band.section))
    else {
        return false;
    };

    if band.grid_rows == 1 {
        log::debug!("remove_row: dropping single-row section of table {:?}", table);
        apply_all(doc, vec![Edit::remove(section_path)]);
        return finish(doc, table, opts);
    }

    let mut edits = Vec::new();
    let mut rehomed: Vec<(Anchor, Node)> = Vec::new();
    for cell in matrix.grid.row_projection(row) {
        let Some(at) = matrix.anchor(cell) else {
            continue;
        };
        if at.row < row {
            edits.extend(respan(doc, cell, at.rowspan - 1, at.colspan));
        } else if at.rowspan > 1 {
            let Some(mut node) = doc.snapshot(cell) else {
                continue;
            };
            if let NodeKind::Cell(attrs) = &mut node.kind {
                attrs.rowspan = at.rowspan - 1;
            }
            rehomed.push((at, node));
        }
    }

    if !rehomed.is_empty() {
        let Some(next_path) = matrix
            .rows
            .get(row + 1)
            .copied()
            .flatten()
            .and_then(|next| doc.path_of(next))
        else {
            return false;
        };
        rehomed.sort_by_key(|(at, _)| at.col);
        for (k, (at, node)) in rehomed.into_iter().enumerate() {
            let index = matrix.insertion_index(row + 1, at.col) + k;
            edits.push(Edit::insert(child_path(&next_path, index), node));
        }
    }

    let Some(row_path) = doc.path_of(row_id) else {
        return false;
    };
    edits.push(Edit::remove(row_path));

    log::debug!("remove_row: grid row {} of table {:?}", row, table);
    apply_all(doc, edits);
    finish(doc, table, opts)
}

/// Insert an empty column left or right of the selected cell
pub fn insert_column(
    doc: &mut Document,
    selection: &[usize],
    placement: Placement,
    opts: &NormalizeOptions,
) -> bool {
    let Some(Target {
        table,
        anchor,
        matrix,
    }) = locate(doc, selection, opts)
    else {
        return false;
    };
    let edge = match placement {
        Placement::Before => anchor.col,
        Placement::After => anchor.last_col() + 1,
    };

    let mut grows = Vec::new();
    let mut inserts = Vec::new();
    let mut grown = FxHashSet::default();
    for row in 0..matrix.height() {
        let crossing = matrix
            .grid
            .at(row, edge)
            .filter(|&cell| edge > 0 && matrix.grid.at(row, edge - 1) == Some(cell));
        if let Some(cell) = crossing {
            if grown.insert(cell) {
                if let Some(at) = matrix.anchor(cell) {
                    grows.extend(respan(doc, cell, at.rowspan, at.colspan + 1));
                }
            }
            continue;
        }
        let Some(row_path) = matrix
            .rows
            .get(row)
            .copied()
            .flatten()
            .and_then(|id| doc.path_of(id))
        else {
            continue;
        };
        let index = matrix.insertion_index(row, edge);
        inserts.push(Edit::insert(child_path(&row_path, index), Node::empty_cell()));
    }

    log::debug!("insert_column at grid column {} of table {:?}", edge, table);
    grows.extend(inserts);
    apply_all(doc, grows);
    finish(doc, table, opts)
}

/// Remove the column holding the selected cell's anchor
pub fn remove_column(doc: &mut Document, selection: &[usize], opts: &NormalizeOptions) -> bool {
    let Some(Target {
        table,
        anchor,
        matrix,
    }) = locate(doc, selection, opts)
    else {
        return false;
    };
    if matrix.width() <= 1 {
        return false;
    }

    let mut edits = Vec::new();
    let mut removals: Vec<Path> = Vec::new();
    for cell in matrix.grid.column_projection(anchor.col) {
        let Some(at) = matrix.anchor(cell) else {
            continue;
        };
        if at.colspan > 1 {
            edits.extend(respan(doc, cell, at.rowspan, at.colspan - 1));
        } else if let Some(path) = doc.path_of(cell) {
            removals.push(path);
        }
    }
    // Later siblings first so earlier paths stay valid.
    removals.sort_by(|a, b| b.cmp(a));
    edits.extend(removals.into_iter().map(Edit::remove));

    log::debug!("remove_column: grid column {} of table {:?}", anchor.col, table);
    apply_all(doc, edits);
    finish(doc, table, opts)
}

/// Add a head section with one empty row when the table has none
pub fn insert_head_section(doc: &mut Document, selection: &[usize], opts: &NormalizeOptions) -> bool {
    let Some(table) = table_of(doc, selection) else {
        return false;
    };
    normalize_table(doc, table, opts);
    let has_head = doc
        .children(table)
        .iter()
        .any(|&id| doc.kind(id).and_then(NodeKind::section_kind) == Some(SectionKind::Head));
    if has_head {
        return false;
    }
    let Ok(matrix) = build_table(doc, table) else {
        return false;
    };
    let Some(path) = doc.path_of(table) else {
        return false;
    };
    let width = matrix.width().max(1);
    let head = Node::section(
        SectionKind::Head,
        vec![Node::row(
            (0..width).map(|_| Node::cell(CellAttrs::header(), "")).collect(),
        )],
    );
    apply_all(doc, vec![Edit::insert(child_path(&path, 1), head)]);
    finish(doc, table, opts)
}

fn update_table_attrs<F>(doc: &mut Document, table: NodeId, update: F) -> bool
where
    F: FnOnce(&mut TableAttrs),
{
    let Some(mut attrs) = doc.kind(table).and_then(NodeKind::table_attrs).cloned() else {
        return false;
    };
    update(&mut attrs);
    let Some(path) = doc.path_of(table) else {
        return false;
    };
    doc.set_node_properties(&path, NodeKind::Table(attrs))
}

/// Flip whether the first body column holds row headers
pub fn toggle_row_headers(doc: &mut Document, selection: &[usize], opts: &NormalizeOptions) -> bool {
    let Some(table) = table_of(doc, selection) else {
        return false;
    };
    if !update_table_attrs(doc, table, |attrs| attrs.row_headers = !attrs.row_headers) {
        return false;
    }
    finish(doc, table, opts)
}

/// Align every cell of the selected cell's column
pub fn align_column(
    doc: &mut Document,
    selection: &[usize],
    align: Align,
    opts: &NormalizeOptions,
) -> bool {
    let Some(Target {
        table,
        anchor,
        matrix,
    }) = locate(doc, selection, opts)
    else {
        return false;
    };
    let edits: Vec<Edit> = matrix
        .grid
        .column_projection(anchor.col)
        .into_iter()
        .filter_map(|cell| {
            let attrs = cell_attrs(doc, cell)?;
            let path = doc.path_of(cell)?;
            Some(Edit::set(
                path,
                NodeKind::Cell(CellAttrs {
                    align: Some(align),
                    ..attrs
                }),
            ))
        })
        .collect();
    apply_all(doc, edits);
    finish(doc, table, opts)
}

/// Replace the verbatim colgroup markup
pub fn set_colgroup_markup(
    doc: &mut Document,
    selection: &[usize],
    raw: impl Into<String>,
    opts: &NormalizeOptions,
) -> bool {
    let Some(table) = table_of(doc, selection) else {
        return false;
    };
    let raw = raw.into();
    if !update_table_attrs(doc, table, |attrs| attrs.colgroup_markup = raw) {
        return false;
    }
    finish(doc, table, opts)
}

/// Insert a new table at a top-level index: one head row plus `rows` body rows
pub fn create_table(
    doc: &mut Document,
    index: usize,
    rows: usize,
    cols: usize,
    opts: &NormalizeOptions,
) -> Option<NodeId> {
    let cols = cols.max(1);
    let mut children = vec![
        Node::empty_caption(),
        Node::section(
            SectionKind::Head,
            vec![Node::row(
                (0..cols).map(|_| Node::cell(CellAttrs::header(), "")).collect(),
            )],
        ),
    ];
    if rows > 0 {
        children.push(Node::section(
            SectionKind::Body,
            (0..rows).map(|_| Node::empty_row(cols)).collect(),
        ));
    }

    let index = index.min(doc.children(doc.root()).len());
    let table = doc.insert_node(&[index], Node::table(TableAttrs::default(), children))?;
    normalize_table(doc, table, opts);
    log::debug!("created {}x{} table {:?}", rows + 1, cols, table);
    Some(table)
}

/// Cell anchored at a grid position of a table, if any
pub fn cell_at(doc: &Document, table: NodeId, row: usize, col: usize) -> Option<NodeId> {
    let matrix = build_table(doc, table).ok()?;
    let cell = matrix.grid.at(row, col)?;
    let anchor = matrix.anchor(cell)?;
    (anchor.row == row && anchor.col == col).then_some(cell)
}
