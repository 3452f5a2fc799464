//! Table markup reader
//!
//! Event-driven reader built on quick-xml with HTML leniency: unmatched end
//! tags are ignored, void tags need no end tag, and a new row, cell or
//! section implicitly closes the previous one. The result is a raw tree that
//! may violate every table invariant; normalization fixes it up.

use std::borrow::Cow;

use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::core::document::{
    Align, CellAttrs, CellKind, Document, Element, Mark, Node, NodeKind, Scope, SectionKind,
    TableAttrs, TextLeaf,
};
use crate::data::constants::{MAX_COLSPAN, MAX_ROWSPAN};
use crate::data::markup_tags::{classify, html_entity, is_void, TagClass};
use crate::utils::error::{TableError, TableResult};

struct Frame {
    tag: String,
    node: Node,
    /// Mark stack depth when the frame opened
    marks: usize,
}

struct TreeBuilder {
    stack: Vec<Frame>,
    marks: Vec<(String, Mark)>,
    /// Blank text at the start of a cell or caption, kept only if inline content follows
    pending: Vec<TextLeaf>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Frame {
                tag: String::new(),
                node: Node::leaf(NodeKind::Root),
                marks: 0,
            }],
            marks: Vec::new(),
            pending: Vec::new(),
        }
    }

    fn top(&self) -> &Node {
        // The root frame is never popped.
        &self.stack[self.stack.len() - 1].node
    }

    fn top_mut(&mut self) -> &mut Node {
        let last = self.stack.len() - 1;
        &mut self.stack[last].node
    }

    fn open(&mut self, tag: &str, node: Node) {
        self.pending.clear();
        self.stack.push(Frame {
            tag: tag.to_string(),
            node,
            marks: self.marks.len(),
        });
    }

    fn append(&mut self, node: Node) {
        self.top_mut().children.push(node);
    }

    /// Pop frames until only `depth` remain
    fn close_to(&mut self, depth: usize) {
        self.pending.clear();
        while self.stack.len() > depth.max(1) {
            let Some(frame) = self.stack.pop() else {
                break;
            };
            self.marks.truncate(frame.marks);
            self.append(frame.node);
        }
    }

    /// Depth of the innermost open frame matching `pred`, not looking past `boundary`
    fn find_open<P, B>(&self, pred: P, boundary: B) -> Option<usize>
    where
        P: Fn(&NodeKind) -> bool,
        B: Fn(&NodeKind) -> bool,
    {
        for (depth, frame) in self.stack.iter().enumerate().skip(1).rev() {
            if pred(&frame.node.kind) {
                return Some(depth);
            }
            if boundary(&frame.node.kind) {
                return None;
            }
        }
        None
    }

    fn close_open<P, B>(&mut self, pred: P, boundary: B)
    where
        P: Fn(&NodeKind) -> bool,
        B: Fn(&NodeKind) -> bool,
    {
        if let Some(depth) = self.find_open(pred, boundary) {
            self.close_to(depth);
        }
    }

    fn close_tag(&mut self, tag: &str) {
        if let Some(depth) = self.stack.iter().skip(1).rposition(|frame| frame.tag == tag) {
            self.close_to(depth + 1);
        }
    }

    fn nearest_table(&mut self) -> Option<&mut TableAttrs> {
        self.stack
            .iter_mut()
            .rev()
            .find_map(|frame| match &mut frame.node.kind {
                NodeKind::Table(attrs) => Some(attrs),
                _ => None,
            })
    }

    fn push_colgroup(&mut self, raw: Option<&str>) {
        match (raw, self.nearest_table()) {
            (Some(raw), Some(attrs)) => attrs.colgroup_markup.push_str(raw),
            _ => log::debug!("column markup outside a table dropped"),
        }
    }

    fn keeps_whitespace(&self) -> bool {
        let top = self.top();
        match top.kind {
            NodeKind::Paragraph | NodeKind::Element(_) => true,
            NodeKind::Cell(_) | NodeKind::Caption => top
                .children
                .last()
                .is_some_and(|child| child.kind.is_inline()),
            _ => false,
        }
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let marks: Vec<Mark> = self.marks.iter().map(|(_, mark)| *mark).collect();
        let leaf = TextLeaf::marked(text, &marks);

        if text.trim().is_empty() && !self.keeps_whitespace() {
            if matches!(self.top().kind, NodeKind::Cell(_) | NodeKind::Caption) {
                self.pending.push(leaf);
            }
            return;
        }
        self.flush_pending();
        self.push_leaf(leaf);
    }

    fn flush_pending(&mut self) {
        for held in std::mem::take(&mut self.pending) {
            self.push_leaf(held);
        }
    }

    fn push_leaf(&mut self, leaf: TextLeaf) {
        if matches!(self.top().kind, NodeKind::Root) {
            self.append(Node::paragraph(vec![Node::leaf(NodeKind::Text(leaf))]));
            return;
        }
        if let Some(Node {
            kind: NodeKind::Text(last),
            ..
        }) = self.top_mut().children.last_mut()
        {
            if last.marks == leaf.marks {
                last.text.push_str(&leaf.text);
                return;
            }
        }
        self.append(Node::leaf(NodeKind::Text(leaf)));
    }

    fn start(&mut self, tag: &str, attrs: IndexMap<String, String>, empty: bool) {
        let is_table = |kind: &NodeKind| matches!(kind, NodeKind::Table(_));
        let node = match classify(tag) {
            Some(TagClass::Mark(mark)) => {
                if !empty {
                    self.marks.push((tag.to_string(), mark));
                }
                return;
            }
            // Handled by the reader loop, which needs the raw input
            Some(TagClass::ColGroup) => return,
            Some(TagClass::Table) => Node::leaf(NodeKind::Table(TableAttrs::default())),
            Some(TagClass::Caption) => Node::leaf(NodeKind::Caption),
            Some(TagClass::Head) | Some(TagClass::Body) => {
                self.close_open(|kind| kind.section_kind().is_some(), is_table);
                let kind = if tag == "thead" {
                    SectionKind::Head
                } else {
                    SectionKind::Body
                };
                Node::leaf(NodeKind::Section(kind))
            }
            Some(TagClass::Row) => {
                self.close_open(NodeKind::is_row, is_table);
                Node::leaf(NodeKind::Row)
            }
            Some(class @ (TagClass::DataCell | TagClass::HeaderCell)) => {
                self.close_open(NodeKind::is_cell, |kind| kind.is_row() || is_table(kind));
                let kind = if class == TagClass::HeaderCell {
                    CellKind::Header
                } else {
                    CellKind::Data
                };
                Node::leaf(NodeKind::Cell(cell_attrs(kind, &attrs)))
            }
            Some(TagClass::Paragraph) => Node::leaf(NodeKind::Paragraph),
            Some(TagClass::Block) => Node::leaf(NodeKind::Element(Element {
                tag: tag.to_string(),
                block: true,
                attrs,
            })),
            None => Node::leaf(NodeKind::Element(Element {
                tag: tag.to_string(),
                block: false,
                attrs,
            })),
        };

        if node.kind.is_inline() {
            self.flush_pending();
        }
        if empty || is_void(tag) {
            self.append(node);
        } else {
            self.open(tag, node);
        }
    }

    fn end(&mut self, tag: &str) {
        if let Some(TagClass::Mark(_)) = classify(tag) {
            if let Some(at) = self.marks.iter().rposition(|(open, _)| open == tag) {
                self.marks.remove(at);
            }
            return;
        }
        if is_void(tag) {
            return;
        }
        self.close_tag(tag);
    }

    fn finish(mut self) -> Document {
        self.close_to(1);
        let mut blocks = self
            .stack
            .pop()
            .map(|frame| frame.node.children)
            .unwrap_or_default();
        for block in &mut blocks {
            infer_row_headers(block);
        }
        Document::from_nodes(blocks)
    }
}

/// Span attribute clamped to `max`; digits too long for `usize` count as `max`
fn parse_span(value: Option<&String>, max: usize) -> usize {
    let Some(digits) = value.map(|v| v.trim()) else {
        return 1;
    };
    match digits.parse::<usize>() {
        Ok(span) => span.min(max),
        Err(_) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => max,
        Err(_) => 1,
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn cell_attrs(kind: CellKind, attrs: &IndexMap<String, String>) -> CellAttrs {
    let align = attrs
        .get("data-align")
        .or_else(|| attrs.get("align"))
        .and_then(|v| Align::parse(v));
    CellAttrs {
        kind,
        rowspan: parse_span(attrs.get("rowspan"), MAX_ROWSPAN),
        colspan: parse_span(attrs.get("colspan"), MAX_COLSPAN),
        align,
        scope: attrs.get("scope").and_then(|v| Scope::parse(v)),
        id: non_empty(attrs.get("id")),
        headers: non_empty(attrs.get("headers")),
        class: non_empty(attrs.get("class")),
    }
}

fn starts_with_header(row: &Node) -> bool {
    matches!(
        row.children.first().map(|cell| &cell.kind),
        Some(NodeKind::Cell(CellAttrs {
            kind: CellKind::Header,
            ..
        }))
    )
}

/// A table has row headers when a body row opens with `<th>`
fn infer_row_headers(node: &mut Node) {
    for child in &mut node.children {
        infer_row_headers(child);
    }
    let lone_row = node
        .children
        .iter()
        .filter(|child| !matches!(child.kind, NodeKind::Caption))
        .count()
        == 1;
    let found = node.children.iter().any(|child| match child.kind {
        NodeKind::Section(SectionKind::Body) => child.children.iter().any(starts_with_header),
        NodeKind::Row => !lone_row && starts_with_header(child),
        _ => false,
    });
    if let NodeKind::Table(attrs) = &mut node.kind {
        attrs.row_headers |= found;
    }
}

fn decode_tag(reader: &Reader<&[u8]>, raw: &[u8]) -> String {
    let decoded = reader
        .decoder()
        .decode(raw)
        .unwrap_or_else(|_| String::from_utf8_lossy(raw));
    let local = decoded.rsplit(':').next().unwrap_or(decoded.as_ref());
    local.to_ascii_lowercase()
}

fn decode_attrs(reader: &Reader<&[u8]>, e: &BytesStart<'_>) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    for attr in e.attributes().flatten() {
        let key = match reader.decoder().decode(attr.key.as_ref()) {
            Ok(v) => v.to_ascii_lowercase(),
            Err(_) => continue,
        };
        let raw = match reader.decoder().decode(&attr.value) {
            Ok(v) => v.into_owned(),
            Err(_) => continue,
        };
        let value = match quick_xml::escape::unescape(&raw) {
            Ok(v) => v.into_owned(),
            Err(_) => raw,
        };
        out.insert(key, value);
    }
    out
}

/// Resolve `&name;`; unknown names are kept literally
fn resolve_entity(name: &str) -> Cow<'static, str> {
    if let Some(c) = html_entity(name) {
        return Cow::Owned(c.to_string());
    }
    let escaped = format!("&{};", name);
    match quick_xml::escape::unescape(&escaped) {
        Ok(text) => Cow::Owned(text.into_owned()),
        Err(_) => Cow::Owned(escaped),
    }
}

fn position(reader: &Reader<&[u8]>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}

/// Parse table markup into a raw document tree
pub fn parse_html(input: &str) -> TableResult<Document> {
    let mut reader = Reader::from_reader(input.as_bytes());
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut builder = TreeBuilder::new();
    let mut buf = Vec::new();
    // Byte offset where an open <colgroup> began
    let mut colgroup: Option<(usize, usize)> = None;

    loop {
        let before = position(&reader);
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|err| TableError::parse_at(err.to_string(), before))?;
        let after = position(&reader);

        if let Some((start, depth)) = colgroup {
            match &event {
                Event::Start(e) if decode_tag(&reader, e.name().as_ref()) == "colgroup" => {
                    colgroup = Some((start, depth + 1));
                }
                Event::End(e) if decode_tag(&reader, e.name().as_ref()) == "colgroup" => {
                    if depth <= 1 {
                        colgroup = None;
                        builder.push_colgroup(input.get(start..after));
                    } else {
                        colgroup = Some((start, depth - 1));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
            continue;
        }

        match event {
            Event::Start(e) => {
                let tag = decode_tag(&reader, e.name().as_ref());
                if tag == "colgroup" {
                    colgroup = Some((before, 1));
                } else if tag == "col" {
                    builder.push_colgroup(input.get(before..after));
                } else {
                    let attrs = decode_attrs(&reader, &e);
                    builder.start(&tag, attrs, false);
                }
            }
            Event::Empty(e) => {
                let tag = decode_tag(&reader, e.name().as_ref());
                if matches!(classify(&tag), Some(TagClass::ColGroup)) {
                    builder.push_colgroup(input.get(before..after));
                } else {
                    let attrs = decode_attrs(&reader, &e);
                    builder.start(&tag, attrs, true);
                }
            }
            Event::End(e) => {
                let tag = decode_tag(&reader, e.name().as_ref());
                builder.end(&tag);
            }
            Event::Text(e) => {
                let text = e
                    .decode()
                    .map_err(|err| TableError::parse_at(err.to_string(), before))?;
                builder.text(&text);
            }
            Event::CData(e) => {
                let text = reader
                    .decoder()
                    .decode(&e)
                    .map_err(|err| TableError::parse_at(err.to_string(), before))?;
                builder.text(&text);
            }
            Event::GeneralRef(e) => {
                let name = e
                    .decode()
                    .map_err(|err| TableError::parse_at(err.to_string(), before))?;
                builder.text(&resolve_entity(&name));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if colgroup.is_some() {
        log::debug!("unterminated <colgroup> dropped");
    }
    Ok(builder.finish())
}
