//! Integration tests for Richtable markup normalization and commands

use pretty_assertions::assert_eq;
use richtable::core::table::build_table;
use richtable::data::MAX_COLSPAN;
use richtable::diagnostics::check_document;
use richtable::{
    deserialize, insert_column, insert_row, normalize_document, parse_html, remove_column,
    remove_row, serialize, CellKind, Document, NodeId, NodeKind, NormalizeOptions, Placement,
    Scope,
};

fn normalize(input: &str) -> Document {
    deserialize(input, &NormalizeOptions::default()).unwrap()
}

fn cell_attrs(doc: &Document, path: &[usize]) -> richtable::CellAttrs {
    doc.kind(doc.resolve(path).unwrap())
        .and_then(NodeKind::cell_attrs)
        .cloned()
        .unwrap()
}

/// Equal row widths and every span position owned by its cell
fn assert_well_formed(doc: &Document, table: NodeId) {
    let matrix = build_table(doc, table).expect("span collision after normalization");
    let width = matrix.width();
    for row in 0..matrix.height() {
        assert_eq!(matrix.grid.row_cardinality(row), width, "row {}", row);
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

const MESSY: &[&str] = &[
    "<table></table>",
    "<table><tr><td></td></tr></table>",
    r#"<table><tr><td rowspan="3">a</td><td>b</td></tr></table>"#,
    r#"<table><tr><td>a</td><td colspan="2">b</td></tr><tr><td>c</td></tr></table>"#,
    r#"<table><tbody><tr><td>A</td><td rowspan="2">B</td></tr><tr><td colspan="2">C</td></tr></tbody></table>"#,
    "<table><thead><tr><th>x</th></tr></thead><thead><tr><th>y</th></tr></thead>\
     <tbody></tbody><tbody><tr><td>1</td></tr></tbody></table>",
    "<table>loose text<tr><td><p>p1</p><p>p2</p></td></tr></table>",
    "<table><caption><b>Bold</b> caption</caption><tr><th>r</th><td>1</td></tr>\
     <tr><th>s</th><td>2</td></tr></table>",
    r#"<table><tr><td rowspan="0" colspan="0">z</td></tr></table>"#,
    r#"<table><colgroup><col span="2"></colgroup><thead><tr><th colspan="2">Region</th></tr>
       <tr><th>North</th><th>South</th></tr></thead>
       <tbody><tr><td>12</td><td>7.5</td></tr></tbody></table>"#,
    "<table><caption> </caption><tbody><tr><td> </td><td> <b>x</b></td>\
     <td><p> <i>y</i></p></td><td><p>\t</p></td></tr></tbody></table>",
];

// ============================================================================
// Scenarios
// ============================================================================

mod scenarios {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_one_by_one_table_without_section() {
        let doc = normalize("<table><tr><td></td></tr></table>");
        assert_eq!(
            serialize(&doc),
            "<table><thead><tr><th scope=\"col\"></th></tr></thead></table>"
        );
        let caption = doc.resolve(&[0, 0]).unwrap();
        assert_eq!(doc.kind(caption), Some(&NodeKind::Caption));
    }

    #[test]
    fn test_short_body_row_is_padded() {
        let doc = normalize(
            "<table><tbody><tr><td>a</td><td>b</td></tr><tr><td>c</td></tr></tbody></table>",
        );
        assert_eq!(
            serialize(&doc),
            "<table><tbody><tr><td>a</td><td>b</td></tr><tr><td>c</td><td></td></tr></tbody></table>"
        );
        assert_eq!(cell_attrs(&doc, &[0, 1, 1, 1]).kind, CellKind::Data);
    }

    #[test]
    fn test_second_position_caption_is_replaced() {
        let doc = normalize(
            "<table><thead><tr><th>h</th></tr></thead><caption>late</caption>\
             <tbody><tr><td>b</td></tr></tbody></table>",
        );
        assert_eq!(
            serialize(&doc),
            "<table><thead><tr><th scope=\"col\">h</th></tr></thead><tbody><tr><td>b</td></tr></tbody></table>"
        );
        assert_eq!(doc.text_content(doc.resolve(&[0, 0]).unwrap()), "");
    }

    #[test]
    fn test_numeric_cell_is_right_aligned() {
        let doc = normalize("<table><tbody><tr><td>42</td><td>x</td></tr></tbody></table>");
        assert_eq!(
            serialize(&doc),
            "<table><tbody><tr><td data-align=\"right\">42</td><td>x</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_blank_cells_serialize_empty() {
        let doc = normalize("<table><caption> </caption><tbody><tr><td> </td><td> <b>x</b></td></tr></tbody></table>");
        assert_eq!(
            serialize(&doc),
            "<table><tbody><tr><td></td><td> <strong>x</strong></td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_huge_spans_are_capped() {
        let doc = normalize(r#"<table><tr><td colspan="5000000">x</td></tr><tr><td>y</td></tr></table>"#);
        let table = doc.tables()[0];
        assert_eq!(build_table(&doc, table).unwrap().width(), MAX_COLSPAN);
        assert_eq!(cell_attrs(&doc, &[0, 1, 0, 0]).colspan, MAX_COLSPAN);
        assert_well_formed(&doc, table);
    }

    #[test]
    fn test_tall_rowspan_is_materialized() {
        let mut doc =
            parse_html(r#"<table><tbody><tr><td rowspan="200">x</td><td>y</td></tr></tbody></table>"#)
                .unwrap();
        let reports = normalize_document(&mut doc, &NormalizeOptions::default());
        assert!(reports[0].stable, "{} cycles", reports[0].cycles);
        assert_eq!(serialize(&doc).matches("<tr>").count(), 200);
        assert_well_formed(&doc, doc.tables()[0]);
    }

    #[test]
    fn test_adjacent_tables_are_not_merged() {
        let doc = normalize("<table><tr><td>a</td></tr></table><table><tr><td>b</td></tr></table>");
        assert_eq!(doc.tables().len(), 2);
        assert_eq!(doc.children(doc.root()).len(), 2);
    }
}

// ============================================================================
// Properties
// ============================================================================

mod properties {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rectangular_with_closed_spans() {
        for input in MESSY {
            let doc = normalize(input);
            for table in doc.tables() {
                assert_well_formed(&doc, table);
            }
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let opts = NormalizeOptions::default();
        for input in MESSY {
            let mut doc = normalize(input);
            let before = doc.snapshot(doc.root());
            for report in normalize_document(&mut doc, &opts) {
                assert!(report.is_clean(), "{}: {:?}", input, report.repairs);
            }
            assert_eq!(doc.snapshot(doc.root()), before, "{}", input);
        }
    }

    #[test]
    fn test_round_trip() {
        let opts = NormalizeOptions::default();
        for input in MESSY {
            let doc = normalize(input);
            let markup = serialize(&doc);
            let again = deserialize(&markup, &opts).unwrap();
            assert_eq!(again.snapshot(again.root()), doc.snapshot(doc.root()), "{}", input);
            assert_eq!(serialize(&again), markup);
        }
    }

    #[test]
    fn test_normalized_tables_pass_check() {
        for input in MESSY {
            let doc = normalize(input);
            assert!(!check_document(&doc).has_errors(), "{}", input);
        }
    }

    #[test]
    fn test_raw_input_check_finds_problems() {
        let doc = parse_html(r#"<table><tr><td>a</td><td colspan="2">b</td></tr><tr><td>c</td></tr></table>"#)
            .unwrap();
        let result = check_document(&doc);
        assert!(result.has_errors());
    }
}

// ============================================================================
// Header assignment
// ============================================================================

mod headers {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_head_row_has_no_ids() {
        let doc = normalize(
            "<table><thead><tr><th>A</th><th>B</th></tr></thead>\
             <tbody><tr><td>1</td><td>2</td></tr></tbody></table>",
        );
        let html = serialize(&doc);
        assert!(!html.contains("id="), "{}", html);
        assert!(!html.contains("headers="), "{}", html);
    }

    #[test]
    fn test_two_head_rows_link_body_cells() {
        let doc = normalize(
            r#"<table><thead><tr><th colspan="2">Region</th></tr><tr><th>N</th><th>S</th></tr></thead>
               <tbody><tr><td>1</td><td>2</td></tr></tbody></table>"#,
        );
        let region = cell_attrs(&doc, &[0, 1, 0, 0]);
        assert_eq!(region.id.as_deref(), Some("table0-r0c0"));
        assert_eq!(region.scope, Some(Scope::Col));
        assert_eq!(region.headers, None);

        let body = cell_attrs(&doc, &[0, 2, 0, 1]);
        let headers: Vec<&str> = body.headers.as_deref().unwrap().split(' ').collect();
        assert!(headers.contains(&"table0-r0c0"));
        assert!(headers.contains(&"table0-r1c1"));
        assert!(!headers.contains(&"table0-r1c0"));
        assert_eq!(body.id, None);
    }

    #[test]
    fn test_id_prefix_and_ordinal() {
        let opts = NormalizeOptions::default().with_id_prefix("grid");
        let doc = deserialize(
            r#"<table><tr><td>x</td></tr></table>
               <table><thead><tr><th rowspan="2">H</th></tr><tr></tr></thead><tbody><tr><td>1</td></tr></tbody></table>"#,
            &opts,
        )
        .unwrap();
        let second = doc.tables()[1];
        let path = doc.path_of(second).unwrap();
        let head_cell = cell_attrs(&doc, &[path[0], 1, 0, 0]);
        assert_eq!(head_cell.id.as_deref(), Some("grid1-r0c0"));
    }
}

// ============================================================================
// Commands
// ============================================================================

mod commands {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_insert_then_remove_restores_markup() {
        let opts = NormalizeOptions::default();
        let mut doc = normalize(
            r#"<table><thead><tr><th>A</th><th>B</th></tr></thead>
               <tbody><tr><td rowspan="2">x</td><td>1</td></tr><tr><td>2</td></tr></tbody></table>"#,
        );
        let original = serialize(&doc);

        assert!(insert_row(&mut doc, &[0, 2, 0, 1], Placement::After, &opts));
        assert_eq!(cell_attrs(&doc, &[0, 2, 0, 0]).rowspan, 3);
        assert!(remove_row(&mut doc, &[0, 2, 1, 0], &opts));
        assert_eq!(serialize(&doc), original);

        assert!(insert_column(&mut doc, &[0, 1, 0, 0], Placement::Before, &opts));
        assert_eq!(cell_attrs(&doc, &[0, 1, 0, 0]).kind, CellKind::Header);
        assert!(remove_column(&mut doc, &[0, 1, 0, 0], &opts));
        assert_eq!(serialize(&doc), original);
    }
}
