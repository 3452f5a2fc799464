//! Fixpoint normalization driver
//!
//! Each cycle walks the table in a fixed priority order (table, sections,
//! rows, cells, caption, then the grid) and stops at the first repairer that
//! reports a problem. The repair is applied and the cycle starts over, so no
//! repairer ever looks at coordinates computed before the last mutation. A
//! full cycle without repairs reaches the stable state, after which the
//! header pass runs once.

use super::context::NormalizeOptions;
use super::headers::assign_headers;
use super::matrix::build_table;
use super::repair::{
    repair_caption, repair_cell, repair_collision, repair_row, repair_section, repair_table,
    repair_widths, Repair, RepairOutcome,
};
use crate::core::document::{Document, NodeId, NodeKind};

/// What a normalization run did to one table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeReport {
    pub table: Option<NodeId>,
    /// Applied repairs in order
    pub repairs: Vec<Repair>,
    /// Cycles run, including the final clean one
    pub cycles: usize,
    /// Whether a clean cycle was reached before the budget ran out
    pub stable: bool,
    /// Cells rewritten by the header pass
    pub header_updates: usize,
}

impl NormalizeReport {
    /// Whether the run changed nothing
    pub fn is_clean(&self) -> bool {
        self.stable && self.repairs.is_empty() && self.header_updates == 0
    }
}

fn first_repair<I, F>(ids: I, mut repair: F) -> Option<Repair>
where
    I: IntoIterator<Item = NodeId>,
    F: FnMut(NodeId) -> RepairOutcome,
{
    ids.into_iter().find_map(|id| match repair(id) {
        RepairOutcome::Repaired(found) => Some(found),
        RepairOutcome::Stable => None,
    })
}

fn children_where<F>(doc: &Document, parents: &[NodeId], pred: F) -> Vec<NodeId>
where
    F: Fn(&NodeKind) -> bool,
{
    parents
        .iter()
        .flat_map(|&parent| doc.children(parent).iter().copied())
        .filter(|&id| doc.kind(id).is_some_and(&pred))
        .collect()
}

/// One scan of the table; the first repair found, if any
pub fn next_repair(doc: &Document, table: NodeId, opts: &NormalizeOptions) -> Option<Repair> {
    if let RepairOutcome::Repaired(found) = repair_table(doc, table) {
        return Some(found);
    }

    let sections = children_where(doc, &[table], |kind| kind.section_kind().is_some());
    if let Some(found) = first_repair(sections.iter().copied(), |id| repair_section(doc, id)) {
        return Some(found);
    }

    let rows = children_where(doc, &sections, NodeKind::is_row);
    if let Some(found) = first_repair(rows.iter().copied(), |id| repair_row(doc, id)) {
        return Some(found);
    }

    let cells = children_where(doc, &rows, NodeKind::is_cell);
    if let Some(found) = first_repair(cells, |id| repair_cell(doc, id, opts)) {
        return Some(found);
    }

    let captions = children_where(doc, &[table], |kind| matches!(kind, NodeKind::Caption));
    if let Some(found) = first_repair(captions, |id| repair_caption(doc, id)) {
        return Some(found);
    }

    match build_table(doc, table) {
        Err(collision) => Some(repair_collision(&collision)),
        Ok(matrix) => match repair_widths(doc, &matrix) {
            RepairOutcome::Repaired(found) => Some(found),
            RepairOutcome::Stable => None,
        },
    }
}

/// Normalize one table in place
pub fn normalize_table(doc: &mut Document, table: NodeId, opts: &NormalizeOptions) -> NormalizeReport {
    let mut report = NormalizeReport {
        table: Some(table),
        ..NormalizeReport::default()
    };
    if !matches!(doc.kind(table), Some(NodeKind::Table(_))) {
        log::debug!("normalize_table: {:?} is not a table", table);
        return report;
    }

    // Repairs may grow the table, so the budget follows its current size.
    while report.cycles < opts.cycle_budget(doc.subtree_size(table)) {
        report.cycles += 1;
        let Some(repair) = next_repair(doc, table, opts) else {
            report.stable = true;
            break;
        };

        log::debug!("table {:?}: {}", table, repair);
        let attempted = repair.edits.len();
        let applied = repair
            .edits
            .iter()
            .map(|edit| doc.apply(edit.clone()))
            .filter(|&ok| ok)
            .count();
        if applied == 0 && attempted > 0 {
            // Nothing moved; running again would propose the same repair.
            log::warn!("table {:?}: repair had no effect: {}", table, repair);
            report.repairs.push(repair);
            return report;
        }
        report.repairs.push(repair);
    }

    if !report.stable {
        log::warn!(
            "table {:?}: not stable after {} cycles",
            table,
            report.cycles
        );
        return report;
    }

    let ordinal = doc
        .tables()
        .iter()
        .position(|&id| id == table)
        .unwrap_or_default();
    report.header_updates = assign_headers(doc, table, ordinal, opts);
    report
}

/// Normalize every table of the document, outer tables first
pub fn normalize_document(doc: &mut Document, opts: &NormalizeOptions) -> Vec<NormalizeReport> {
    doc.tables()
        .into_iter()
        .map(|table| normalize_table(doc, table, opts))
        .collect()
}
