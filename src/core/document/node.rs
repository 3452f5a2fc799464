//! Node kinds and owned subtrees for the document arena

use indexmap::IndexMap;

use crate::data::constants::{MAX_COLSPAN, MAX_ROWSPAN};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stable index of a node inside a [`Document`](super::Document) arena.
///
/// Ids are never reused while the document lives, so an id taken before an
/// edit either still names the same node or resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw arena index
    pub fn index(self) -> usize {
        self.0
    }
}

/// Child-index path from the document root.
pub type Path = Vec<usize>;

/// Horizontal cell alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    /// Markup value used by `data-align`
    pub fn as_str(&self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        }
    }

    /// Parse a markup alignment value
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Align::Left),
            "center" | "middle" => Some(Align::Center),
            "right" | "end" => Some(Align::Right),
            _ => None,
        }
    }
}

/// Header cell scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Scope {
    Row,
    Col,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Row => "row",
            Scope::Col => "col",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "row" | "rowgroup" => Some(Scope::Row),
            "col" | "colgroup" => Some(Scope::Col),
            _ => None,
        }
    }
}

/// Head or body grouping of rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SectionKind {
    Head,
    Body,
}

/// `<td>` versus `<th>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CellKind {
    #[default]
    Data,
    Header,
}

/// Character-level formatting carried by a text leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Mark {
    Bold,
    Italic,
    Code,
    Subscript,
    Superscript,
    Underline,
    Strike,
}

impl Mark {
    /// Tag emitted when serializing this mark
    pub fn tag(&self) -> &'static str {
        match self {
            Mark::Bold => "strong",
            Mark::Italic => "em",
            Mark::Code => "code",
            Mark::Subscript => "sub",
            Mark::Superscript => "sup",
            Mark::Underline => "u",
            Mark::Strike => "s",
        }
    }
}

/// Table-level attributes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TableAttrs {
    /// First body column holds row headers
    pub row_headers: bool,
    /// `<colgroup>`/`<col>` markup, kept verbatim
    pub colgroup_markup: String,
}

/// Cell attributes
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellAttrs {
    pub kind: CellKind,
    pub rowspan: usize,
    pub colspan: usize,
    pub align: Option<Align>,
    pub scope: Option<Scope>,
    pub id: Option<String>,
    /// Space-joined list of header ids
    pub headers: Option<String>,
    pub class: Option<String>,
}

impl Default for CellAttrs {
    fn default() -> Self {
        Self {
            kind: CellKind::Data,
            rowspan: 1,
            colspan: 1,
            align: None,
            scope: None,
            id: None,
            headers: None,
            class: None,
        }
    }
}

impl CellAttrs {
    /// Plain header cell attributes
    pub fn header() -> Self {
        Self {
            kind: CellKind::Header,
            ..Self::default()
        }
    }

    /// Data cell with the given spans
    pub fn spanning(rowspan: usize, colspan: usize) -> Self {
        Self {
            rowspan,
            colspan,
            ..Self::default()
        }
    }

    /// Row span clamped to `1..=MAX_ROWSPAN`
    pub fn rows(&self) -> usize {
        self.rowspan.clamp(1, MAX_ROWSPAN)
    }

    /// Column span clamped to `1..=MAX_COLSPAN`
    pub fn cols(&self) -> usize {
        self.colspan.clamp(1, MAX_COLSPAN)
    }

    /// Whether both spans are already inside their accepted range
    pub fn spans_in_range(&self) -> bool {
        self.rowspan == self.rows() && self.colspan == self.cols()
    }
}

/// Foreign element the table engine does not model (lists, links, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Element {
    pub tag: String,
    pub block: bool,
    pub attrs: IndexMap<String, String>,
}

impl Element {
    pub fn new(tag: impl Into<String>, block: bool) -> Self {
        Self {
            tag: tag.into(),
            block,
            attrs: IndexMap::new(),
        }
    }
}

/// Text leaf
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TextLeaf {
    pub text: String,
    /// Sorted, deduplicated
    pub marks: Vec<Mark>,
}

impl TextLeaf {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Vec::new(),
        }
    }

    pub fn marked(text: impl Into<String>, marks: &[Mark]) -> Self {
        let mut marks = marks.to_vec();
        marks.sort();
        marks.dedup();
        Self {
            text: text.into(),
            marks,
        }
    }
}

/// Tagged node payload
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NodeKind {
    Root,
    Table(TableAttrs),
    Caption,
    Section(SectionKind),
    Row,
    Cell(CellAttrs),
    Paragraph,
    Element(Element),
    Text(TextLeaf),
}

impl NodeKind {
    /// Short name for logs and diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Table(_) => "table",
            NodeKind::Caption => "caption",
            NodeKind::Section(SectionKind::Head) => "head",
            NodeKind::Section(SectionKind::Body) => "body",
            NodeKind::Row => "row",
            NodeKind::Cell(_) => "cell",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Element(_) => "element",
            NodeKind::Text(_) => "text",
        }
    }

    /// Whether this node may sit directly inside a cell
    pub fn is_block(&self) -> bool {
        match self {
            NodeKind::Paragraph | NodeKind::Table(_) => true,
            NodeKind::Element(el) => el.block,
            _ => false,
        }
    }

    /// Text leaves and inline foreign elements
    pub fn is_inline(&self) -> bool {
        match self {
            NodeKind::Text(_) => true,
            NodeKind::Element(el) => !el.block,
            _ => false,
        }
    }

    pub fn is_cell(&self) -> bool {
        matches!(self, NodeKind::Cell(_))
    }

    pub fn is_row(&self) -> bool {
        matches!(self, NodeKind::Row)
    }

    pub fn section_kind(&self) -> Option<SectionKind> {
        match self {
            NodeKind::Section(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn cell_attrs(&self) -> Option<&CellAttrs> {
        match self {
            NodeKind::Cell(attrs) => Some(attrs),
            _ => None,
        }
    }

    pub fn table_attrs(&self) -> Option<&TableAttrs> {
        match self {
            NodeKind::Table(attrs) => Some(attrs),
            _ => None,
        }
    }
}

/// Owned subtree used for insertion and structural snapshots
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Node {
    pub kind: NodeKind,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(kind: NodeKind, children: Vec<Node>) -> Self {
        Self { kind, children }
    }

    pub fn leaf(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::leaf(NodeKind::Text(TextLeaf::plain(text)))
    }

    pub fn paragraph(children: Vec<Node>) -> Self {
        Self::new(NodeKind::Paragraph, children)
    }

    /// `Caption[Text("")]`
    pub fn empty_caption() -> Self {
        Self::new(NodeKind::Caption, vec![Self::text("")])
    }

    /// `Cell(Data)[Paragraph[Text("")]]`
    pub fn empty_cell() -> Self {
        Self::cell(CellAttrs::default(), "")
    }

    /// Cell holding a single paragraph of plain text
    pub fn cell(attrs: CellAttrs, text: &str) -> Self {
        Self::new(
            NodeKind::Cell(attrs),
            vec![Self::paragraph(vec![Self::text(text)])],
        )
    }

    pub fn row(cells: Vec<Node>) -> Self {
        Self::new(NodeKind::Row, cells)
    }

    /// Row of `width` empty data cells
    pub fn empty_row(width: usize) -> Self {
        Self::row((0..width).map(|_| Self::empty_cell()).collect())
    }

    pub fn section(kind: SectionKind, rows: Vec<Node>) -> Self {
        Self::new(NodeKind::Section(kind), rows)
    }

    pub fn table(attrs: TableAttrs, children: Vec<Node>) -> Self {
        Self::new(NodeKind::Table(attrs), children)
    }

    /// Concatenated text of all descendant leaves
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let NodeKind::Text(leaf) = &self.kind {
            out.push_str(&leaf.text);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    /// Number of nodes in this subtree, including itself
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Node::size).sum::<usize>()
    }
}
