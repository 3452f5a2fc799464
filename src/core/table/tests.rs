//! Regression tests for table normalization and commands

use super::*;
use crate::core::document::{
    Align, CellAttrs, CellKind, Document, Element, Mark, Node, NodeId, NodeKind, Scope,
    SectionKind, TableAttrs, TextLeaf,
};
use crate::data::constants::MAX_COLSPAN;
use pretty_assertions::assert_eq;

fn single_table(children: Vec<Node>) -> (Document, NodeId) {
    let doc = Document::from_nodes(vec![Node::table(TableAttrs::default(), children)]);
    let table = doc.resolve(&[0]).unwrap();
    (doc, table)
}

fn normalized(children: Vec<Node>) -> (Document, NodeId, NormalizeReport) {
    let (mut doc, table) = single_table(children);
    let report = normalize_table(&mut doc, table, &NormalizeOptions::default());
    (doc, table, report)
}

fn text_cell(text: &str) -> Node {
    Node::cell(CellAttrs::default(), text)
}

fn attrs_at(doc: &Document, path: &[usize]) -> CellAttrs {
    doc.kind(doc.resolve(path).unwrap())
        .and_then(NodeKind::cell_attrs)
        .cloned()
        .unwrap()
}

fn child_count(doc: &Document, path: &[usize]) -> usize {
    doc.children(doc.resolve(path).unwrap()).len()
}

/// Every row equally wide and every span fully owned by its cell
fn assert_well_formed(doc: &Document, table: NodeId) {
    let matrix = build_table(doc, table).expect("no collisions");
    let width = matrix.width();
    for row in 0..matrix.height() {
        assert_eq!(matrix.grid.row_cardinality(row), width, "row {} width", row);
        assert!(matrix.rows[row].is_some(), "row {} has no tree row", row);
    }
    for cell in matrix.cells() {
        let anchor = matrix.anchor(cell).unwrap();
        for row in anchor.row..=anchor.last_row() {
            for col in anchor.col..=anchor.last_col() {
                assert_eq!(matrix.grid.at(row, col), Some(cell));
            }
        }
    }
}

// ============================================================================
// Normalization scenarios
// ============================================================================

#[test]
fn test_empty_table_gets_caption_and_head() {
    let (doc, table, report) = normalized(vec![]);
    assert!(report.stable);
    assert_eq!(report.repairs.len(), 2);

    let header = CellAttrs {
        scope: Some(Scope::Col),
        ..CellAttrs::header()
    };
    let expected = Node::table(
        TableAttrs::default(),
        vec![
            Node::empty_caption(),
            Node::section(SectionKind::Head, vec![Node::row(vec![Node::cell(header, "")])]),
        ],
    );
    assert_eq!(doc.snapshot(table).unwrap(), expected);
}

#[test]
fn test_lone_row_becomes_header_row() {
    let (doc, _, _) = normalized(vec![Node::row(vec![text_cell("x")])]);
    let section = doc.resolve(&[0, 1]).unwrap();
    assert_eq!(doc.kind(section), Some(&NodeKind::Section(SectionKind::Head)));
    let cell = attrs_at(&doc, &[0, 1, 0, 0]);
    assert_eq!(cell.kind, CellKind::Header);
    assert_eq!(cell.scope, Some(Scope::Col));
}

#[test]
fn test_short_row_is_padded() {
    let (doc, table, _) = normalized(vec![
        Node::empty_caption(),
        Node::section(
            SectionKind::Body,
            vec![
                Node::row(vec![text_cell("a"), text_cell("b")]),
                Node::row(vec![text_cell("c")]),
            ],
        ),
    ]);
    assert_eq!(child_count(&doc, &[0, 1, 1]), 2);
    let padded = doc.resolve(&[0, 1, 1, 1]).unwrap();
    assert_eq!(doc.text_content(padded), "");
    assert_eq!(attrs_at(&doc, &[0, 1, 1, 1]).kind, CellKind::Data);
    assert_well_formed(&doc, table);
}

#[test]
fn test_misplaced_caption_is_replaced() {
    let (doc, table, _) = normalized(vec![
        Node::section(SectionKind::Head, vec![Node::row(vec![text_cell("h")])]),
        Node::new(NodeKind::Caption, vec![Node::text("late")]),
        Node::section(SectionKind::Body, vec![Node::row(vec![text_cell("b")])]),
    ]);
    let kinds: Vec<&str> = doc
        .children(table)
        .iter()
        .map(|&id| doc.kind(id).unwrap().name())
        .collect();
    assert_eq!(kinds, vec!["caption", "head", "body"]);
    assert_eq!(doc.text_content(doc.resolve(&[0, 0]).unwrap()), "");
}

#[test]
fn test_numeric_cell_is_right_aligned() {
    let (doc, _, _) = normalized(vec![
        Node::empty_caption(),
        Node::section(
            SectionKind::Body,
            vec![Node::row(vec![text_cell("42"), text_cell("n/a")])],
        ),
    ]);
    assert_eq!(attrs_at(&doc, &[0, 1, 0, 0]).align, Some(Align::Right));
    assert_eq!(attrs_at(&doc, &[0, 1, 0, 1]).align, None);
}

#[test]
fn test_numeric_align_can_be_disabled() {
    let (mut doc, table) = single_table(vec![
        Node::empty_caption(),
        Node::section(SectionKind::Body, vec![Node::row(vec![text_cell("42")])]),
    ]);
    let opts = NormalizeOptions::default().with_numeric_align(false);
    normalize_table(&mut doc, table, &opts);
    assert_eq!(attrs_at(&doc, &[0, 1, 0, 0]).align, None);
}

#[test]
fn test_explicit_alignment_is_kept() {
    let left = CellAttrs {
        align: Some(Align::Left),
        ..CellAttrs::default()
    };
    let (doc, _, _) = normalized(vec![
        Node::empty_caption(),
        Node::section(SectionKind::Body, vec![Node::row(vec![Node::cell(left, "7")])]),
    ]);
    assert_eq!(attrs_at(&doc, &[0, 1, 0, 0]).align, Some(Align::Left));
}

#[test]
fn test_adjacent_tables_stay_separate() {
    let mut doc = Document::from_nodes(vec![
        Node::table(TableAttrs::default(), vec![Node::row(vec![text_cell("a")])]),
        Node::table(TableAttrs::default(), vec![Node::row(vec![text_cell("b")])]),
    ]);
    let reports = normalize_document(&mut doc, &NormalizeOptions::default());
    assert_eq!(reports.len(), 2);
    assert_eq!(child_count(&doc, &[]), 2);
    for (i, expected) in ["a", "b"].iter().enumerate() {
        let table = doc.resolve(&[i]).unwrap();
        assert_eq!(doc.text_content(table), *expected);
        assert_well_formed(&doc, table);
    }
}

#[test]
fn test_collision_inserts_cells() {
    let (doc, table, report) = normalized(vec![
        Node::empty_caption(),
        Node::section(
            SectionKind::Body,
            vec![
                Node::row(vec![text_cell("A"), Node::cell(CellAttrs::spanning(2, 1), "B")]),
                Node::row(vec![Node::cell(CellAttrs::spanning(1, 2), "C")]),
            ],
        ),
    ]);
    assert!(report
        .repairs
        .iter()
        .any(|repair| repair.kind == RepairKind::Collision));
    assert_eq!(child_count(&doc, &[0, 1, 0]), 4);
    assert_eq!(child_count(&doc, &[0, 1, 1]), 2);
    assert_eq!(doc.text_content(doc.resolve(&[0, 1, 1, 1]).unwrap()), "C");
    assert_well_formed(&doc, table);
}

#[test]
fn test_rowspan_overflow_materializes_rows() {
    let (doc, table, _) = normalized(vec![
        Node::empty_caption(),
        Node::section(
            SectionKind::Body,
            vec![Node::row(vec![
                Node::cell(CellAttrs::spanning(3, 1), "A"),
                text_cell("B"),
            ])],
        ),
    ]);
    assert_eq!(child_count(&doc, &[0, 1]), 3);
    assert_eq!(child_count(&doc, &[0, 1, 1]), 1);
    assert_well_formed(&doc, table);
}

#[test]
fn test_zero_span_is_clamped() {
    let (doc, _, _) = normalized(vec![
        Node::empty_caption(),
        Node::section(
            SectionKind::Body,
            vec![Node::row(vec![Node::cell(CellAttrs::spanning(0, 0), "z")])],
        ),
    ]);
    let cell = attrs_at(&doc, &[0, 1, 0, 0]);
    assert_eq!((cell.rowspan, cell.colspan), (1, 1));
}

#[test]
fn test_oversized_spans_are_capped() {
    let (doc, table, report) = normalized(vec![
        Node::empty_caption(),
        Node::section(
            SectionKind::Body,
            vec![Node::row(vec![Node::cell(CellAttrs::spanning(3, usize::MAX), "wide")])],
        ),
    ]);
    assert!(report.stable);
    let cell = attrs_at(&doc, &[0, 1, 0, 0]);
    assert_eq!((cell.rowspan, cell.colspan), (3, MAX_COLSPAN));
    assert_eq!(child_count(&doc, &[0, 1]), 3);
    assert_eq!(build_table(&doc, table).unwrap().width(), MAX_COLSPAN);
    assert_well_formed(&doc, table);
}

#[test]
fn test_tall_rowspan_materializes_in_one_repair() {
    let (doc, table, report) = normalized(vec![
        Node::empty_caption(),
        Node::section(
            SectionKind::Body,
            vec![Node::row(vec![
                Node::cell(CellAttrs::spanning(200, 1), "x"),
                text_cell("y"),
            ])],
        ),
    ]);
    assert!(report.stable, "{} cycles", report.cycles);
    let widths = report
        .repairs
        .iter()
        .filter(|repair| repair.kind == RepairKind::Width)
        .count();
    assert_eq!(widths, 1);
    assert_eq!(child_count(&doc, &[0, 1]), 200);
    assert_eq!(child_count(&doc, &[0, 1, 199]), 1);
    assert_well_formed(&doc, table);
}

#[test]
fn test_blank_cell_text_is_emptied() {
    let (doc, _, report) = normalized(vec![
        Node::empty_caption(),
        Node::section(
            SectionKind::Body,
            vec![Node::row(vec![
                text_cell(" \t "),
                Node::new(
                    NodeKind::Cell(CellAttrs::default()),
                    vec![Node::paragraph(vec![])],
                ),
                Node::new(
                    NodeKind::Cell(CellAttrs::default()),
                    vec![Node::paragraph(vec![
                        Node::text(" "),
                        Node::leaf(NodeKind::Text(TextLeaf::marked("x", &[Mark::Bold]))),
                    ])],
                ),
            ])],
        ),
    ]);
    assert!(report.stable);
    let cell = |col: usize| doc.snapshot(doc.resolve(&[0, 1, 0, col]).unwrap()).unwrap();
    assert_eq!(cell(0), Node::empty_cell());
    assert_eq!(cell(1), Node::empty_cell());
    assert_eq!(doc.text_content(doc.resolve(&[0, 1, 0, 2]).unwrap()), " x");
}

#[test]
fn test_blank_caption_is_emptied() {
    let (doc, _, _) = normalized(vec![
        Node::new(NodeKind::Caption, vec![Node::text("  "), Node::text(" ")]),
        Node::section(SectionKind::Body, vec![Node::row(vec![text_cell("1")])]),
    ]);
    let caption = doc.snapshot(doc.resolve(&[0, 0]).unwrap()).unwrap();
    assert_eq!(caption, Node::empty_caption());
}

#[test]
fn test_bodies_are_merged() {
    let (doc, table, _) = normalized(vec![
        Node::empty_caption(),
        Node::section(SectionKind::Body, vec![Node::row(vec![text_cell("1")])]),
        Node::section(SectionKind::Body, vec![Node::row(vec![text_cell("2")])]),
    ]);
    assert_eq!(doc.children(table).len(), 2);
    assert_eq!(child_count(&doc, &[0, 1]), 2);
    assert_eq!(doc.text_content(doc.resolve(&[0, 1, 1]).unwrap()), "2");
}

#[test]
fn test_second_head_becomes_body() {
    let (doc, _, _) = normalized(vec![
        Node::empty_caption(),
        Node::section(SectionKind::Head, vec![Node::row(vec![text_cell("h")])]),
        Node::section(SectionKind::Head, vec![Node::row(vec![text_cell("b")])]),
    ]);
    let second = doc.resolve(&[0, 2]).unwrap();
    assert_eq!(doc.kind(second), Some(&NodeKind::Section(SectionKind::Body)));
    assert_eq!(attrs_at(&doc, &[0, 2, 0, 0]).kind, CellKind::Data);
}

#[test]
fn test_row_after_body_joins_it() {
    let (doc, table, _) = normalized(vec![
        Node::empty_caption(),
        Node::section(SectionKind::Body, vec![Node::row(vec![text_cell("1")])]),
        Node::row(vec![text_cell("2")]),
    ]);
    assert_eq!(doc.children(table).len(), 2);
    assert_eq!(child_count(&doc, &[0, 1]), 2);
}

#[test]
fn test_empty_extra_section_is_removed() {
    let (doc, table, _) = normalized(vec![
        Node::empty_caption(),
        Node::section(SectionKind::Head, vec![]),
        Node::section(SectionKind::Body, vec![Node::row(vec![text_cell("1")])]),
    ]);
    assert_eq!(doc.children(table).len(), 2);
    let only = doc.resolve(&[0, 1]).unwrap();
    assert_eq!(doc.kind(only), Some(&NodeKind::Section(SectionKind::Body)));
}

#[test]
fn test_loose_content_is_wrapped() {
    let (doc, table, _) = normalized(vec![
        Node::empty_caption(),
        Node::section(SectionKind::Body, vec![Node::text("x")]),
    ]);
    let expected = Node::section(SectionKind::Body, vec![Node::row(vec![text_cell("x")])]);
    assert_eq!(doc.snapshot(doc.resolve(&[0, 1]).unwrap()).unwrap(), expected);
    assert_well_formed(&doc, table);
}

#[test]
fn test_caption_is_flattened() {
    let link = Element::new("a", false);
    let (doc, _, _) = normalized(vec![
        Node::new(
            NodeKind::Caption,
            vec![
                Node::leaf(NodeKind::Text(TextLeaf::marked("A", &[Mark::Bold]))),
                Node::new(NodeKind::Element(link), vec![Node::text("B")]),
                Node::text("C"),
            ],
        ),
        Node::section(SectionKind::Body, vec![Node::row(vec![text_cell("1")])]),
    ]);
    let caption = doc.snapshot(doc.resolve(&[0, 0]).unwrap()).unwrap();
    assert_eq!(caption, Node::new(NodeKind::Caption, vec![Node::text("ABC")]));
}

#[test]
fn test_normalize_is_idempotent() {
    let (mut doc, table, first) = normalized(vec![
        Node::section(
            SectionKind::Head,
            vec![Node::row(vec![Node::cell(CellAttrs::spanning(1, 2), "H")])],
        ),
        Node::row(vec![text_cell("1"), text_cell("2"), text_cell("3")]),
    ]);
    assert!(!first.repairs.is_empty());
    let before = doc.snapshot(table).unwrap();
    let second = normalize_table(&mut doc, table, &NormalizeOptions::default());
    assert!(second.is_clean(), "{:?}", second.repairs);
    assert_eq!(doc.snapshot(table).unwrap(), before);
    assert_well_formed(&doc, table);
}

#[test]
fn test_cycle_guard_stops_early() {
    let (mut doc, table) = single_table(vec![]);
    let opts = NormalizeOptions::default().with_max_cycles(1);
    let report = normalize_table(&mut doc, table, &opts);
    assert!(!report.stable);
    assert_eq!(report.cycles, 1);
    assert_eq!(report.repairs.len(), 1);
}

// ============================================================================
// Individual repairers
// ============================================================================

#[test]
fn test_cell_repair_wraps_inline_run() {
    let doc = Document::from_nodes(vec![Node::new(
        NodeKind::Cell(CellAttrs::default()),
        vec![
            Node::text("a"),
            Node::text("b"),
            Node::paragraph(vec![Node::text("c")]),
        ],
    )]);
    let cell = doc.resolve(&[0]).unwrap();
    let RepairOutcome::Repaired(repair) = repair_cell(&doc, cell, &NormalizeOptions::default())
    else {
        panic!("expected a repair");
    };
    assert_eq!(repair.kind, RepairKind::Cell);
    assert_eq!(
        repair.edits,
        vec![crate::core::document::Edit::WrapRange {
            parent: vec![0],
            range: 0..2,
            wrapper: NodeKind::Paragraph,
        }]
    );
}

#[test]
fn test_row_repair_is_stable_for_cells() {
    let doc = Document::from_nodes(vec![Node::empty_row(3)]);
    let row = doc.resolve(&[0]).unwrap();
    assert!(repair_row(&doc, row).is_stable());
}

// ============================================================================
// Commands
// ============================================================================

fn fresh(rows: usize, cols: usize) -> (Document, NodeId, NormalizeOptions) {
    let mut doc = Document::new();
    let opts = NormalizeOptions::default();
    let table = create_table(&mut doc, 0, rows, cols, &opts).unwrap();
    (doc, table, opts)
}

#[test]
fn test_create_table() {
    let (doc, table, _) = fresh(2, 3);
    assert_eq!(doc.children(table).len(), 3);
    assert_eq!(child_count(&doc, &[0, 1, 0]), 3);
    assert_eq!(child_count(&doc, &[0, 2]), 2);
    assert_eq!(attrs_at(&doc, &[0, 1, 0, 2]).scope, Some(Scope::Col));
    assert_well_formed(&doc, table);
    assert!(cell_at(&doc, table, 2, 2).is_some());
    assert!(cell_at(&doc, table, 3, 0).is_none());
}

#[test]
fn test_insert_row_after() {
    let (mut doc, table, opts) = fresh(1, 2);
    assert!(insert_row(&mut doc, &[0, 2, 0, 1], Placement::After, &opts));
    assert_eq!(child_count(&doc, &[0, 2]), 2);
    assert_eq!(child_count(&doc, &[0, 2, 1]), 2);
    assert_well_formed(&doc, table);
}

#[test]
fn test_insert_row_in_head_adds_header_cells() {
    let (mut doc, table, opts) = fresh(1, 2);
    assert!(insert_row(&mut doc, &[0, 1, 0, 0], Placement::Before, &opts));
    assert_eq!(child_count(&doc, &[0, 1]), 2);
    assert_eq!(attrs_at(&doc, &[0, 1, 0, 1]).kind, CellKind::Header);
    assert_well_formed(&doc, table);
}

#[test]
fn test_insert_row_grows_crossing_rowspan() {
    let (mut doc, table) = single_table(vec![
        Node::empty_caption(),
        Node::section(
            SectionKind::Body,
            vec![
                Node::row(vec![Node::cell(CellAttrs::spanning(2, 1), "A"), text_cell("B")]),
                Node::row(vec![text_cell("C")]),
            ],
        ),
    ]);
    let opts = NormalizeOptions::default();
    assert!(insert_row(&mut doc, &[0, 1, 0, 1], Placement::After, &opts));
    assert_eq!(attrs_at(&doc, &[0, 1, 0, 0]).rowspan, 3);
    assert_eq!(child_count(&doc, &[0, 1]), 3);
    assert_eq!(child_count(&doc, &[0, 1, 1]), 1);
    assert_well_formed(&doc, table);
}

#[test]
fn test_remove_row_rehomes_spanning_cell() {
    let (mut doc, table) = single_table(vec![
        Node::empty_caption(),
        Node::section(
            SectionKind::Body,
            vec![
                Node::row(vec![Node::cell(CellAttrs::spanning(2, 1), "A"), text_cell("B")]),
                Node::row(vec![text_cell("C")]),
            ],
        ),
    ]);
    let opts = NormalizeOptions::default();
    assert!(remove_row(&mut doc, &[0, 1, 0, 1], &opts));
    assert_eq!(child_count(&doc, &[0, 1]), 1);
    let moved = doc.resolve(&[0, 1, 0, 0]).unwrap();
    assert_eq!(doc.text_content(moved), "A");
    assert_eq!(attrs_at(&doc, &[0, 1, 0, 0]).rowspan, 1);
    assert_eq!(doc.text_content(doc.resolve(&[0, 1, 0, 1]).unwrap()), "C");
    assert_well_formed(&doc, table);
}

#[test]
fn test_remove_only_body_row_drops_section() {
    let (mut doc, table, opts) = fresh(1, 2);
    assert!(remove_row(&mut doc, &[0, 2, 0, 0], &opts));
    assert_eq!(doc.children(table).len(), 2);
}

#[test]
fn test_remove_last_row_is_noop() {
    let (mut doc, table, opts) = fresh(0, 2);
    let before = doc.snapshot(table).unwrap();
    assert!(!remove_row(&mut doc, &[0, 1, 0, 0], &opts));
    assert_eq!(doc.snapshot(table).unwrap(), before);
}

#[test]
fn test_insert_column_grows_crossing_colspan() {
    let (mut doc, table) = single_table(vec![
        Node::empty_caption(),
        Node::section(
            SectionKind::Body,
            vec![
                Node::row(vec![Node::cell(CellAttrs::spanning(1, 2), "A")]),
                Node::row(vec![text_cell("B"), text_cell("C")]),
            ],
        ),
    ]);
    let opts = NormalizeOptions::default();
    assert!(insert_column(&mut doc, &[0, 1, 1, 0], Placement::After, &opts));
    assert_eq!(attrs_at(&doc, &[0, 1, 0, 0]).colspan, 3);
    assert_eq!(child_count(&doc, &[0, 1, 1]), 3);
    assert_eq!(doc.text_content(doc.resolve(&[0, 1, 1, 2]).unwrap()), "C");
    assert_well_formed(&doc, table);
}

#[test]
fn test_remove_column() {
    let (mut doc, table, opts) = fresh(1, 2);
    assert!(remove_column(&mut doc, &[0, 2, 0, 0], &opts));
    assert_eq!(child_count(&doc, &[0, 1, 0]), 1);
    assert_eq!(child_count(&doc, &[0, 2, 0]), 1);
    assert!(!remove_column(&mut doc, &[0, 2, 0, 0], &opts));
    assert_well_formed(&doc, table);
}

#[test]
fn test_insert_head_section() {
    let (mut doc, table) = single_table(vec![
        Node::empty_caption(),
        Node::section(
            SectionKind::Body,
            vec![Node::row(vec![text_cell("1"), text_cell("2")])],
        ),
    ]);
    let opts = NormalizeOptions::default();
    assert!(insert_head_section(&mut doc, &[0], &opts));
    let head = doc.resolve(&[0, 1]).unwrap();
    assert_eq!(doc.kind(head), Some(&NodeKind::Section(SectionKind::Head)));
    assert_eq!(child_count(&doc, &[0, 1, 0]), 2);
    assert!(!insert_head_section(&mut doc, &[0], &opts));
    assert_well_formed(&doc, table);
}

#[test]
fn test_toggle_row_headers() {
    let (mut doc, _, opts) = fresh(2, 2);
    assert!(toggle_row_headers(&mut doc, &[0], &opts));
    let row_head = attrs_at(&doc, &[0, 2, 0, 0]);
    assert_eq!(row_head.kind, CellKind::Header);
    assert_eq!(row_head.scope, Some(Scope::Row));
    assert_eq!(row_head.id.as_deref(), Some("table0-r1c0"));

    assert!(toggle_row_headers(&mut doc, &[0], &opts));
    let plain = attrs_at(&doc, &[0, 2, 0, 0]);
    assert_eq!(plain.kind, CellKind::Data);
    assert_eq!(plain.id, None);
}

#[test]
fn test_align_column() {
    let (mut doc, _, opts) = fresh(2, 2);
    assert!(align_column(&mut doc, &[0, 2, 1, 1], Align::Center, &opts));
    for path in [[0, 1, 0, 1], [0, 2, 0, 1], [0, 2, 1, 1]] {
        assert_eq!(attrs_at(&doc, &path).align, Some(Align::Center));
    }
    assert_eq!(attrs_at(&doc, &[0, 2, 0, 0]).align, None);
}

#[test]
fn test_set_colgroup_markup() {
    let (mut doc, table, opts) = fresh(1, 1);
    assert!(set_colgroup_markup(&mut doc, &[0, 0], "<col span=\"1\">", &opts));
    let attrs = doc.kind(table).and_then(NodeKind::table_attrs).unwrap();
    assert_eq!(attrs.colgroup_markup, "<col span=\"1\">");
}

#[test]
fn test_commands_outside_table_are_noops() {
    let mut doc = Document::from_nodes(vec![Node::paragraph(vec![Node::text("p")])]);
    let opts = NormalizeOptions::default();
    assert!(!insert_row(&mut doc, &[0, 0], Placement::After, &opts));
    assert!(!remove_column(&mut doc, &[0], &opts));
    assert!(!toggle_row_headers(&mut doc, &[0], &opts));
    assert!(!insert_row(&mut doc, &[7], Placement::After, &opts));
}
