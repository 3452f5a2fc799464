//! Structural repairers
//!
//! One pure function per node kind. Each inspects a node (and, for the width
//! repairer, the freshly built grid) and either reports the table locally
//! valid or returns a single [`Repair`]: a batch of edits at one location
//! that the driver applies before rebuilding everything from scratch.

use std::fmt;
use std::ops::Range;

use super::context::NormalizeOptions;
use super::matrix::{Collision, TableMatrix};
use crate::core::document::{
    child_path, Align, CellAttrs, Document, Edit, Node, NodeId, NodeKind, Path, SectionKind,
    TextLeaf,
};
use crate::data::constants::is_numeric;

/// Which repairer produced a repair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepairKind {
    Table,
    Section,
    Row,
    Cell,
    Caption,
    Collision,
    Width,
}

impl fmt::Display for RepairKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RepairKind::Table => "table",
            RepairKind::Section => "section",
            RepairKind::Row => "row",
            RepairKind::Cell => "cell",
            RepairKind::Caption => "caption",
            RepairKind::Collision => "collision",
            RepairKind::Width => "width",
        };
        f.write_str(name)
    }
}

/// A corrective edit batch
#[derive(Debug, Clone, PartialEq)]
pub struct Repair {
    pub kind: RepairKind,
    pub reason: String,
    pub edits: Vec<Edit>,
}

impl Repair {
    fn new(kind: RepairKind, reason: impl Into<String>, edits: Vec<Edit>) -> Self {
        Self {
            kind,
            reason: reason.into(),
            edits,
        }
    }
}

impl fmt::Display for Repair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.reason)
    }
}

/// Result of running one repairer
#[derive(Debug, Clone, PartialEq)]
pub enum RepairOutcome {
    Repaired(Repair),
    Stable,
}

impl RepairOutcome {
    fn repaired(kind: RepairKind, reason: impl Into<String>, edits: Vec<Edit>) -> Self {
        RepairOutcome::Repaired(Repair::new(kind, reason, edits))
    }

    pub fn is_stable(&self) -> bool {
        matches!(self, RepairOutcome::Stable)
    }
}

/// Maximal run of children, starting at the first match, that satisfy `pred`
fn first_run<F>(doc: &Document, parent: NodeId, pred: F) -> Option<Range<usize>>
where
    F: Fn(&NodeKind) -> bool,
{
    let children = doc.children(parent);
    let matches = |id: NodeId| doc.kind(id).is_some_and(&pred);
    let start = children.iter().position(|&id| matches(id))?;
    let len = children[start..]
        .iter()
        .take_while(|&&id| matches(id))
        .count();
    Some(start..start + len)
}

fn path_or_stable(doc: &Document, id: NodeId) -> Option<Path> {
    let path = doc.path_of(id);
    if path.is_none() {
        log::debug!("repair skipped: node {:?} is detached", id);
    }
    path
}

// ============================================================================
// Table
// ============================================================================

/// Default head section of a fresh table: one row with one header cell
pub fn default_head() -> Node {
    Node::section(
        SectionKind::Head,
        vec![Node::row(vec![Node::cell(CellAttrs::header(), "")])],
    )
}

/// Caption first, then at most one head, then at most one body
pub fn repair_table(doc: &Document, table: NodeId) -> RepairOutcome {
    let Some(path) = path_or_stable(doc, table) else {
        return RepairOutcome::Stable;
    };
    let children = doc.children(table);
    let kinds: Vec<&NodeKind> = children.iter().filter_map(|&id| doc.kind(id)).collect();

    if let Some(i) = kinds
        .iter()
        .skip(1)
        .position(|kind| matches!(kind, NodeKind::Caption))
    {
        return RepairOutcome::repaired(
            RepairKind::Table,
            "caption is not the first child",
            vec![Edit::remove(child_path(&path, i + 1))],
        );
    }

    if !matches!(kinds.first(), Some(NodeKind::Caption)) {
        return RepairOutcome::repaired(
            RepairKind::Table,
            "missing caption",
            vec![Edit::insert(child_path(&path, 0), Node::empty_caption())],
        );
    }

    for (i, kind) in kinds.iter().enumerate().skip(1) {
        match kind {
            NodeKind::Section(_) => {}
            NodeKind::Row => {
                if let NodeKind::Section(SectionKind::Body) = kinds[i - 1] {
                    let body = child_path(&path, i - 1);
                    let edit = Edit::Move {
                        from: child_path(&path, i),
                        to: child_path(&body, doc.children(children[i - 1]).len()),
                    };
                    return RepairOutcome::repaired(RepairKind::Table, "row after body", vec![edit]);
                }
                let len = kinds[i..].iter().take_while(|kind| kind.is_row()).count();
                // A lone row is a fresh table's header row
                let section = if i == 1 && len == 1 && kinds.len() == 2 {
                    SectionKind::Head
                } else {
                    SectionKind::Body
                };
                return RepairOutcome::repaired(
                    RepairKind::Table,
                    "row outside a section",
                    vec![Edit::WrapRange {
                        parent: path,
                        range: i..i + len,
                        wrapper: NodeKind::Section(section),
                    }],
                );
            }
            _ => {
                let run = first_run(doc, table, |k| {
                    !matches!(k, NodeKind::Section(_) | NodeKind::Row | NodeKind::Caption)
                })
                .filter(|run| run.start == i)
                .unwrap_or(i..i + 1);
                return RepairOutcome::repaired(
                    RepairKind::Table,
                    format!("{} directly inside table", kind.name()),
                    vec![Edit::WrapRange {
                        parent: path,
                        range: run,
                        wrapper: NodeKind::Row,
                    }],
                );
            }
        }
    }

    if kinds.len() == 1 {
        return RepairOutcome::repaired(
            RepairKind::Table,
            "table has no section",
            vec![Edit::insert(child_path(&path, 1), default_head())],
        );
    }

    if let Some(i) = kinds
        .iter()
        .enumerate()
        .skip(2)
        .find(|(_, kind)| matches!(kind, NodeKind::Section(SectionKind::Head)))
        .map(|(i, _)| i)
    {
        return RepairOutcome::repaired(
            RepairKind::Table,
            "head section after the first section",
            vec![Edit::set(
                child_path(&path, i),
                NodeKind::Section(SectionKind::Body),
            )],
        );
    }

    let bodies: Vec<usize> = kinds
        .iter()
        .enumerate()
        .filter(|(_, kind)| matches!(kind, NodeKind::Section(SectionKind::Body)))
        .map(|(i, _)| i)
        .collect();
    if let [first, second, ..] = bodies[..] {
        let keep_len = doc.children(children[first]).len();
        let moved = doc.children(children[second]).len();
        let mut edits: Vec<Edit> = (0..moved)
            .map(|k| Edit::Move {
                from: child_path(&child_path(&path, second), 0),
                to: child_path(&child_path(&path, first), keep_len + k),
            })
            .collect();
        edits.push(Edit::remove(child_path(&path, second)));
        return RepairOutcome::repaired(RepairKind::Table, "more than one body section", edits);
    }

    let sections = kinds.len() - 1;
    for (i, &section) in children.iter().enumerate().skip(1) {
        if !doc.children(section).is_empty() {
            continue;
        }
        let section_path = child_path(&path, i);
        if sections > 1 {
            return RepairOutcome::repaired(
                RepairKind::Table,
                "empty section",
                vec![Edit::remove(section_path)],
            );
        }
        let cell = match kinds[i] {
            NodeKind::Section(SectionKind::Head) => Node::cell(CellAttrs::header(), ""),
            _ => Node::empty_cell(),
        };
        return RepairOutcome::repaired(
            RepairKind::Table,
            "only section is empty",
            vec![Edit::insert(child_path(&section_path, 0), Node::row(vec![cell]))],
        );
    }

    RepairOutcome::Stable
}

// ============================================================================
// Section and row
// ============================================================================

/// Every child of a section is a row
pub fn repair_section(doc: &Document, section: NodeId) -> RepairOutcome {
    let Some(run) = first_run(doc, section, |kind| !kind.is_row()) else {
        return RepairOutcome::Stable;
    };
    let Some(path) = path_or_stable(doc, section) else {
        return RepairOutcome::Stable;
    };
    RepairOutcome::repaired(
        RepairKind::Section,
        format!("non-row children {}..{} in section", run.start, run.end),
        vec![Edit::WrapRange {
            parent: path,
            range: run,
            wrapper: NodeKind::Row,
        }],
    )
}

/// Every child of a row is a cell
pub fn repair_row(doc: &Document, row: NodeId) -> RepairOutcome {
    let Some(run) = first_run(doc, row, |kind| !kind.is_cell()) else {
        return RepairOutcome::Stable;
    };
    let Some(path) = path_or_stable(doc, row) else {
        return RepairOutcome::Stable;
    };
    RepairOutcome::repaired(
        RepairKind::Row,
        format!("non-cell children {}..{} in row", run.start, run.end),
        vec![Edit::WrapRange {
            parent: path,
            range: run,
            wrapper: NodeKind::Cell(CellAttrs::default()),
        }],
    )
}

// ============================================================================
// Cell
// ============================================================================

/// Block content, sane spans, numeric alignment
pub fn repair_cell(doc: &Document, cell: NodeId, opts: &NormalizeOptions) -> RepairOutcome {
    let Some(NodeKind::Cell(attrs)) = doc.kind(cell) else {
        return RepairOutcome::Stable;
    };
    let Some(path) = path_or_stable(doc, cell) else {
        return RepairOutcome::Stable;
    };
    let children = doc.children(cell);

    if !attrs.spans_in_range() {
        let fixed = CellAttrs {
            rowspan: attrs.rows(),
            colspan: attrs.cols(),
            ..attrs.clone()
        };
        return RepairOutcome::repaired(
            RepairKind::Cell,
            format!("span {}x{} out of range", attrs.rowspan, attrs.colspan),
            vec![Edit::set(path, NodeKind::Cell(fixed))],
        );
    }

    if children.is_empty() {
        return RepairOutcome::repaired(
            RepairKind::Cell,
            "empty cell",
            vec![Edit::insert(
                child_path(&path, 0),
                Node::paragraph(vec![Node::text("")]),
            )],
        );
    }

    if let Some(run) = first_run(doc, cell, NodeKind::is_inline) {
        return RepairOutcome::repaired(
            RepairKind::Cell,
            "inline content directly inside cell",
            vec![Edit::WrapRange {
                parent: path,
                range: run,
                wrapper: NodeKind::Paragraph,
            }],
        );
    }

    if let Some(i) = children
        .iter()
        .position(|&id| doc.kind(id).is_some_and(|kind| !kind.is_block()))
    {
        let text = doc.text_content(children[i]);
        let at = child_path(&path, i);
        return RepairOutcome::repaired(
            RepairKind::Cell,
            "structural node inside cell",
            vec![
                Edit::remove(at.clone()),
                Edit::insert(at, Node::paragraph(vec![Node::text(text)])),
            ],
        );
    }

    // A lone paragraph is written inline, where blank text does not survive a reread.
    if let [only] = children {
        if is_blank_text_run(doc, *only) {
            let at = child_path(&path, 0);
            return RepairOutcome::repaired(
                RepairKind::Cell,
                "blank cell text",
                vec![
                    Edit::remove(at.clone()),
                    Edit::insert(at, Node::paragraph(vec![Node::text("")])),
                ],
            );
        }
    }

    if opts.numeric_align && attrs.align.is_none() && is_numeric(&doc.text_content(cell)) {
        let aligned = CellAttrs {
            align: Some(Align::Right),
            ..attrs.clone()
        };
        return RepairOutcome::repaired(
            RepairKind::Cell,
            "numeric cell without alignment",
            vec![Edit::set(path, NodeKind::Cell(aligned))],
        );
    }

    RepairOutcome::Stable
}

/// Paragraph of blank text leaves, other than a single empty plain leaf
fn is_blank_text_run(doc: &Document, paragraph: NodeId) -> bool {
    if !matches!(doc.kind(paragraph), Some(NodeKind::Paragraph)) {
        return false;
    }
    let leaves = doc.children(paragraph);
    if let [only] = leaves {
        if doc.kind(*only) == Some(&NodeKind::Text(TextLeaf::plain(""))) {
            return false;
        }
    }
    leaves
        .iter()
        .all(|&id| matches!(doc.kind(id), Some(NodeKind::Text(_))))
        && doc.text_content(paragraph).trim().is_empty()
}

// ============================================================================
// Caption
// ============================================================================

/// Plain text only: no elements, no marks, adjacent leaves merged, no blank text
pub fn repair_caption(doc: &Document, caption: NodeId) -> RepairOutcome {
    let Some(path) = path_or_stable(doc, caption) else {
        return RepairOutcome::Stable;
    };
    let children = doc.children(caption);

    if children.is_empty() {
        return RepairOutcome::repaired(
            RepairKind::Caption,
            "empty caption",
            vec![Edit::insert(child_path(&path, 0), Node::text(""))],
        );
    }

    let mut previous_text: Option<(usize, &TextLeaf)> = None;
    for (i, &child) in children.iter().enumerate() {
        let at = child_path(&path, i);
        match doc.kind(child) {
            Some(NodeKind::Text(leaf)) => {
                if !leaf.marks.is_empty() {
                    return RepairOutcome::repaired(
                        RepairKind::Caption,
                        "formatted text in caption",
                        vec![Edit::set(at, NodeKind::Text(TextLeaf::plain(leaf.text.clone())))],
                    );
                }
                if let Some((prev, prev_leaf)) = previous_text {
                    let merged = format!("{}{}", prev_leaf.text, leaf.text);
                    return RepairOutcome::repaired(
                        RepairKind::Caption,
                        "adjacent caption text",
                        vec![
                            Edit::set(
                                child_path(&path, prev),
                                NodeKind::Text(TextLeaf::plain(merged)),
                            ),
                            Edit::remove(at),
                        ],
                    );
                }
                previous_text = Some((i, leaf));
            }
            Some(kind) => {
                let text = doc.text_content(child);
                let mut edits = vec![Edit::remove(at.clone())];
                if !text.is_empty() {
                    edits.push(Edit::insert(at, Node::text(text)));
                }
                return RepairOutcome::repaired(
                    RepairKind::Caption,
                    format!("{} inside caption", kind.name()),
                    edits,
                );
            }
            None => {}
        }
    }

    if let Some((i, leaf)) = previous_text {
        if !leaf.text.is_empty() && leaf.text.trim().is_empty() {
            return RepairOutcome::repaired(
                RepairKind::Caption,
                "whitespace-only caption",
                vec![Edit::set(
                    child_path(&path, i),
                    NodeKind::Text(TextLeaf::plain("")),
                )],
            );
        }
    }

    RepairOutcome::Stable
}

// ============================================================================
// Grid-level repairs
// ============================================================================

/// Insert empty cells before the cell that does not fit
pub fn repair_collision(collision: &Collision) -> Repair {
    let edits = (0..collision.insert)
        .map(|_| Edit::insert(collision.cell_path.clone(), Node::empty_cell()))
        .collect();
    Repair::new(
        RepairKind::Collision,
        format!(
            "span overlap at ({}, {}); inserting {} cell(s)",
            collision.row, collision.col, collision.insert
        ),
        edits,
    )
}

fn append_cells(doc: &Document, row: NodeId, count: usize) -> Option<Vec<Edit>> {
    let path = doc.path_of(row)?;
    let len = doc.children(row).len();
    Some(
        (0..count)
            .map(|k| Edit::insert(child_path(&path, len + k), Node::empty_cell()))
            .collect(),
    )
}

/// Keep every grid row equally wide
pub fn repair_widths(doc: &Document, matrix: &TableMatrix) -> RepairOutcome {
    let grid = &matrix.grid;
    let widest = (0..grid.height())
        .map(|r| grid.row_cardinality(r))
        .max()
        .unwrap_or(0);

    // Rows that exist only through rowspans get a tree row, all in one batch.
    for band in &matrix.sections {
        if band.grid_rows > band.tree_rows {
            let Some(section_path) = doc.path_of(band.section) else {
                continue;
            };
            let edits = (band.tree_rows..band.grid_rows)
                .map(|local| {
                    let missing = widest.saturating_sub(grid.row_cardinality(band.first_row + local));
                    Edit::insert(child_path(&section_path, local), Node::empty_row(missing))
                })
                .collect();
            return RepairOutcome::repaired(
                RepairKind::Width,
                format!(
                    "{} grid row(s) from {} exist only through rowspans",
                    band.grid_rows - band.tree_rows,
                    band.first_row + band.tree_rows
                ),
                edits,
            );
        }
    }

    if widest == 0 {
        if let Some(&Some(row)) = matrix.rows.first() {
            if let Some(edits) = append_cells(doc, row, 1) {
                return RepairOutcome::repaired(RepairKind::Width, "table has no columns", edits);
            }
        }
        return RepairOutcome::Stable;
    }

    for r in 1..grid.height() {
        let above = grid.row_cardinality(r - 1);
        let here = grid.row_cardinality(r);
        if above == here {
            continue;
        }
        let (short, diff) = if here < above {
            (r, above - here)
        } else {
            (r - 1, here - above)
        };
        let Some(Some(row)) = matrix.rows.get(short).copied() else {
            log::warn!("width repair: grid row {} has no tree row", short);
            return RepairOutcome::Stable;
        };
        if let Some(edits) = append_cells(doc, row, diff) {
            return RepairOutcome::repaired(
                RepairKind::Width,
                format!("grid row {} is {} cell(s) short", short, diff),
                edits,
            );
        }
    }

    RepairOutcome::Stable
}
