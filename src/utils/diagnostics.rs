//! Table diagnostics
//!
//! Read-only audit of a table tree. Where normalization repairs, this module
//! only reports: every shape violation found by the repairers is turned into a
//! [`Diagnostic`] carrying the path of the offending node.
//!
//! ## Example
//!
//! ```rust
//! use richtable::features::markup::parse_html;
//! use richtable::diagnostics::check_table;
//!
//! let doc = parse_html("<table><tr><td>1</td><td>2</td></tr><tr><td>3</td></tr></table>").unwrap();
//! let result = check_table(&doc, doc.tables()[0]);
//! assert!(result.has_errors());
//! ```

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};

use crate::core::document::{Document, NodeId, NodeKind, Path};
use crate::core::table::{
    build_table, repair_caption, repair_cell, repair_row, repair_section, repair_table,
    NormalizeOptions, Repair, RepairKind, RepairOutcome, TableMatrix,
};
use crate::data::constants::is_numeric;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagnosticLevel {
    /// Informational note
    Info,
    /// Warning - normalization will adjust content
    Warning,
    /// Error - the table structure is invalid
    Error,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLevel::Info => write!(f, "info"),
            DiagnosticLevel::Warning => write!(f, "warning"),
            DiagnosticLevel::Error => write!(f, "error"),
        }
    }
}

/// A single diagnostic message
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    /// Path of the offending node
    pub path: Option<Path>,
    /// Grid position (row, column), 0-indexed
    pub position: Option<(usize, usize)>,
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn new(level: DiagnosticLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            path: None,
            position: None,
            suggestion: None,
        }
    }

    pub fn with_path(mut self, path: Option<Path>) -> Self {
        self.path = path;
        self
    }

    pub fn with_position(mut self, row: usize, col: usize) -> Self {
        self.position = Some((row, col));
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.message)?;

        if let Some(ref path) = self.path {
            let joined: Vec<String> = path.iter().map(|i| i.to_string()).collect();
            write!(f, "\n  --> node /{}", joined.join("/"))?;
        }

        if let Some((row, col)) = self.position {
            write!(f, "\n  --> row {}, column {}", row, col)?;
        }

        if let Some(ref suggestion) = self.suggestion {
            write!(f, "\n  = help: {}", suggestion)?;
        }

        Ok(())
    }
}

/// Check result with summary
#[derive(Debug, Default)]
pub struct CheckResult {
    pub diagnostics: Vec<Diagnostic>,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl CheckResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diag: Diagnostic) {
        match diag.level {
            DiagnosticLevel::Error => self.errors += 1,
            DiagnosticLevel::Warning => self.warnings += 1,
            DiagnosticLevel::Info => self.infos += 1,
        }
        self.diagnostics.push(diag);
    }

    /// Append every diagnostic of another result
    pub fn merge(&mut self, other: CheckResult) {
        for diag in other.diagnostics {
            self.add(diag);
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn summary(&self) -> String {
        let plural = |n: usize| if n == 1 { "" } else { "s" };
        let mut parts = Vec::new();
        if self.errors > 0 {
            parts.push(format!("{} error{}", self.errors, plural(self.errors)));
        }
        if self.warnings > 0 {
            parts.push(format!("{} warning{}", self.warnings, plural(self.warnings)));
        }
        if self.infos > 0 {
            parts.push(format!("{} note{}", self.infos, plural(self.infos)));
        }
        if parts.is_empty() {
            "no issues found".to_string()
        } else {
            parts.join(", ")
        }
    }
}

fn level_of(kind: RepairKind) -> DiagnosticLevel {
    match kind {
        RepairKind::Caption | RepairKind::Cell => DiagnosticLevel::Warning,
        _ => DiagnosticLevel::Error,
    }
}

fn report(result: &mut CheckResult, doc: &Document, node: NodeId, outcome: RepairOutcome) {
    if let RepairOutcome::Repaired(Repair { kind, reason, .. }) = outcome {
        result.add(Diagnostic::new(level_of(kind), reason).with_path(doc.path_of(node)));
    }
}

fn check_grid(doc: &Document, matrix: &TableMatrix, result: &mut CheckResult) {
    let width = matrix.width();
    for band in &matrix.sections {
        if band.grid_rows > band.tree_rows {
            let missing = band.grid_rows - band.tree_rows;
            result.add(
                Diagnostic::new(
                    DiagnosticLevel::Warning,
                    format!(
                        "rowspan extends {} row{} past the end of its section",
                        missing,
                        if missing == 1 { "" } else { "s" }
                    ),
                )
                .with_path(doc.path_of(band.section))
                .with_suggestion("Empty rows will be added"),
            );
        }
    }
    for row in 0..matrix.height() {
        let cardinality = matrix.grid.row_cardinality(row);
        if cardinality != width {
            result.add(
                Diagnostic::new(
                    DiagnosticLevel::Error,
                    format!("row covers {} of {} columns", cardinality, width),
                )
                .with_path(matrix.rows[row].and_then(|id| doc.path_of(id)))
                .with_position(row, cardinality),
            );
        }
    }
}

/// Audit one table without modifying it
pub fn check_table(doc: &Document, table: NodeId) -> CheckResult {
    let mut result = CheckResult::new();
    if !matches!(doc.kind(table), Some(NodeKind::Table(_))) {
        result.add(
            Diagnostic::new(DiagnosticLevel::Error, "node is not a table")
                .with_path(doc.path_of(table)),
        );
        return result;
    }

    report(&mut result, doc, table, repair_table(doc, table));

    let shape_only = NormalizeOptions::default().with_numeric_align(false);
    for node in doc.descendants(table) {
        let outcome = match doc.kind(node) {
            Some(NodeKind::Caption) => repair_caption(doc, node),
            Some(NodeKind::Section(_)) => repair_section(doc, node),
            Some(NodeKind::Row) => repair_row(doc, node),
            Some(NodeKind::Cell(attrs)) => {
                if attrs.align.is_none() && is_numeric(&doc.text_content(node)) {
                    result.add(
                        Diagnostic::new(DiagnosticLevel::Info, "numeric cell without alignment")
                            .with_path(doc.path_of(node))
                            .with_suggestion("It will be right-aligned"),
                    );
                }
                repair_cell(doc, node, &shape_only)
            }
            _ => continue,
        };
        report(&mut result, doc, node, outcome);
    }

    match build_table(doc, table) {
        Ok(matrix) => check_grid(doc, &matrix, &mut result),
        Err(collision) => result.add(
            Diagnostic::new(DiagnosticLevel::Error, "cell overlaps a spanning cell")
                .with_path(Some(collision.cell_path.clone()))
                .with_position(collision.row, collision.col)
                .with_suggestion(format!(
                    "{} empty cell{} will be inserted before it",
                    collision.insert,
                    if collision.insert == 1 { "" } else { "s" }
                )),
        ),
    }

    result
}

/// Audit every table of a document
pub fn check_document(doc: &Document) -> CheckResult {
    let mut result = CheckResult::new();
    for table in doc.tables() {
        result.merge(check_table(doc, table));
    }
    result
}

/// Render a check result grouped by table, most severe first within each table
///
/// ```text
/// table /0
///   error /0/1/1 (row 1, col 1): row covers 1 of 2 columns
///     = help: ...
///
/// Summary: 1 error
/// ```
pub fn format_diagnostics(result: &CheckResult, use_color: bool) -> String {
    let paint = |level: DiagnosticLevel, text: String| {
        if !use_color {
            return text;
        }
        let color = match level {
            DiagnosticLevel::Error => "\x1b[31m",
            DiagnosticLevel::Warning => "\x1b[33m",
            DiagnosticLevel::Info => "\x1b[34m",
        };
        format!("{}{}\x1b[0m", color, text)
    };

    let mut tables: BTreeMap<Option<usize>, Vec<&Diagnostic>> = BTreeMap::new();
    for diag in &result.diagnostics {
        let table = diag.path.as_ref().and_then(|path| path.first().copied());
        tables.entry(table).or_default().push(diag);
    }

    let mut output = String::new();
    for (table, mut diags) in tables {
        diags.sort_by(|a, b| b.level.cmp(&a.level).then_with(|| a.path.cmp(&b.path)));
        match table {
            Some(index) => {
                let _ = writeln!(output, "table /{}", index);
            }
            None => output.push_str("document\n"),
        }
        for diag in diags {
            let _ = writeln!(
                output,
                "  {}{}: {}",
                paint(diag.level, diag.level.to_string()),
                location(diag),
                diag.message
            );
            if let Some(ref suggestion) = diag.suggestion {
                let _ = writeln!(output, "    = help: {}", suggestion);
            }
        }
        output.push('\n');
    }

    let summary = format!("Summary: {}", result.summary());
    if use_color && result.has_errors() {
        output.push_str(&paint(DiagnosticLevel::Error, summary));
    } else if use_color && result.warnings > 0 {
        output.push_str(&paint(DiagnosticLevel::Warning, summary));
    } else if use_color {
        let _ = write!(output, "\x1b[32m{}\x1b[0m", summary);
    } else {
        output.push_str(&summary);
    }
    output
}

/// ` /0/1/2 (row r, col c)`, either half omitted when unknown
fn location(diag: &Diagnostic) -> String {
    let mut out = String::new();
    if let Some(ref path) = diag.path {
        out.push_str(" /");
        let joined: Vec<String> = path.iter().map(|i| i.to_string()).collect();
        out.push_str(&joined.join("/"));
    }
    if let Some((row, col)) = diag.position {
        let _ = write!(out, " (row {}, col {})", row, col);
    }
    out
}
