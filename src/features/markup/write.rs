//! Table markup writer

use std::fmt::Write;

use quick_xml::escape::escape;

use crate::core::document::{
    CellAttrs, CellKind, Document, Element, Mark, Node, NodeId, NodeKind, SectionKind,
};
use crate::data::markup_tags::is_void;

/// Serialize every top-level node of the document
pub fn serialize(doc: &Document) -> String {
    let mut out = String::new();
    for &child in doc.children(doc.root()) {
        if let Some(node) = doc.snapshot(child) {
            write_node(&mut out, &node);
        }
    }
    out
}

/// Serialize one table
pub fn serialize_table(doc: &Document, table: NodeId) -> String {
    let mut out = String::new();
    if let Some(node) = doc.snapshot(table) {
        write_node(&mut out, &node);
    }
    out
}

fn write_attr(out: &mut String, name: &str, value: &str) {
    let _ = write!(out, " {}=\"{}\"", name, escape(value));
}

fn write_cell_attrs(out: &mut String, attrs: &CellAttrs) {
    if attrs.rowspan != 1 {
        let _ = write!(out, " rowspan=\"{}\"", attrs.rowspan);
    }
    if attrs.colspan != 1 {
        let _ = write!(out, " colspan=\"{}\"", attrs.colspan);
    }
    if let Some(align) = attrs.align {
        write_attr(out, "data-align", align.as_str());
    }
    if let Some(scope) = attrs.scope {
        write_attr(out, "scope", scope.as_str());
    }
    let optional = [
        ("id", &attrs.id),
        ("headers", &attrs.headers),
        ("class", &attrs.class),
    ];
    for (name, value) in optional {
        if let Some(value) = value {
            write_attr(out, name, value);
        }
    }
}

fn write_element(out: &mut String, el: &Element, children: &[Node]) {
    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in &el.attrs {
        write_attr(out, name, value);
    }
    if children.is_empty() && is_void(&el.tag) {
        out.push_str("/>");
        return;
    }
    out.push('>');
    write_children(out, children);
    let _ = write!(out, "</{}>", el.tag);
}

fn write_text(out: &mut String, text: &str, marks: &[Mark]) {
    for mark in marks {
        let _ = write!(out, "<{}>", mark.tag());
    }
    out.push_str(&escape(text));
    for mark in marks.iter().rev() {
        let _ = write!(out, "</{}>", mark.tag());
    }
}

fn write_children(out: &mut String, children: &[Node]) {
    for child in children {
        write_node(out, child);
    }
}

fn write_wrapped(out: &mut String, tag: &str, children: &[Node]) {
    let _ = write!(out, "<{}>", tag);
    write_children(out, children);
    let _ = write!(out, "</{}>", tag);
}

fn write_node(out: &mut String, node: &Node) {
    match &node.kind {
        NodeKind::Root => write_children(out, &node.children),
        NodeKind::Table(attrs) => {
            out.push_str("<table>");
            let mut rest = node.children.as_slice();
            if let Some((first, tail)) = rest.split_first() {
                if matches!(first.kind, NodeKind::Caption) {
                    if !first.text_content().is_empty() {
                        write_node(out, first);
                    }
                    rest = tail;
                }
            }
            out.push_str(&attrs.colgroup_markup);
            write_children(out, rest);
            out.push_str("</table>");
        }
        NodeKind::Caption => write_wrapped(out, "caption", &node.children),
        NodeKind::Section(kind) => {
            let tag = match kind {
                SectionKind::Head => "thead",
                SectionKind::Body => "tbody",
            };
            write_wrapped(out, tag, &node.children);
        }
        NodeKind::Row => write_wrapped(out, "tr", &node.children),
        NodeKind::Cell(attrs) => {
            let tag = match attrs.kind {
                CellKind::Header => "th",
                CellKind::Data => "td",
            };
            out.push('<');
            out.push_str(tag);
            write_cell_attrs(out, attrs);
            out.push('>');
            match node.children.as_slice() {
                [only] if matches!(only.kind, NodeKind::Paragraph) => {
                    write_children(out, &only.children)
                }
                children => write_children(out, children),
            }
            let _ = write!(out, "</{}>", tag);
        }
        NodeKind::Paragraph => write_wrapped(out, "p", &node.children),
        NodeKind::Element(el) => write_element(out, el, &node.children),
        NodeKind::Text(leaf) => write_text(out, &leaf.text, &leaf.marks),
    }
}
