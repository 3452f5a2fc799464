//! Markup tag classification
//!
//! Maps HTML tag names to the node the reader builds for them.

use phf::{phf_map, phf_set};

use crate::core::document::Mark;

/// What a tag turns into when read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass {
    Table,
    Caption,
    Head,
    Body,
    Row,
    DataCell,
    HeaderCell,
    /// `<colgroup>`/`<col>`, captured verbatim
    ColGroup,
    Paragraph,
    /// Character formatting, folded into text marks
    Mark(Mark),
    /// Foreign block element
    Block,
}

/// Known tags; anything missing is a foreign inline element
pub static TAG_CLASSES: phf::Map<&'static str, TagClass> = phf_map! {
    "table" => TagClass::Table,
    "caption" => TagClass::Caption,
    "thead" => TagClass::Head,
    "tbody" => TagClass::Body,
    // Footers are folded into the body
    "tfoot" => TagClass::Body,
    "tr" => TagClass::Row,
    "td" => TagClass::DataCell,
    "th" => TagClass::HeaderCell,
    "colgroup" => TagClass::ColGroup,
    "col" => TagClass::ColGroup,
    "p" => TagClass::Paragraph,

    "b" => TagClass::Mark(Mark::Bold),
    "strong" => TagClass::Mark(Mark::Bold),
    "i" => TagClass::Mark(Mark::Italic),
    "em" => TagClass::Mark(Mark::Italic),
    "code" => TagClass::Mark(Mark::Code),
    "sub" => TagClass::Mark(Mark::Subscript),
    "sup" => TagClass::Mark(Mark::Superscript),
    "u" => TagClass::Mark(Mark::Underline),
    "s" => TagClass::Mark(Mark::Strike),
    "del" => TagClass::Mark(Mark::Strike),
    "strike" => TagClass::Mark(Mark::Strike),

    "ul" => TagClass::Block,
    "ol" => TagClass::Block,
    "li" => TagClass::Block,
    "div" => TagClass::Block,
    "blockquote" => TagClass::Block,
    "pre" => TagClass::Block,
    "h1" => TagClass::Block,
    "h2" => TagClass::Block,
    "h3" => TagClass::Block,
    "h4" => TagClass::Block,
    "h5" => TagClass::Block,
    "h6" => TagClass::Block,
    "hr" => TagClass::Block,
    "figure" => TagClass::Block,
    "figcaption" => TagClass::Block,
};

/// Elements that never have an end tag in HTML
pub static VOID_TAGS: phf::Set<&'static str> = phf_set! {
    "br",
    "col",
    "hr",
    "img",
    "input",
    "wbr",
    "source",
};

/// Named HTML entities beyond the five XML ones
pub static HTML_ENTITIES: phf::Map<&'static str, char> = phf_map! {
    "nbsp" => '\u{a0}',
    "ndash" => '\u{2013}',
    "mdash" => '\u{2014}',
    "hellip" => '\u{2026}',
    "lsquo" => '\u{2018}',
    "rsquo" => '\u{2019}',
    "ldquo" => '\u{201c}',
    "rdquo" => '\u{201d}',
    "laquo" => '\u{ab}',
    "raquo" => '\u{bb}',
    "times" => '\u{d7}',
    "minus" => '\u{2212}',
    "plusmn" => '\u{b1}',
    "deg" => '\u{b0}',
    "middot" => '\u{b7}',
    "bull" => '\u{2022}',
    "copy" => '\u{a9}',
    "reg" => '\u{ae}',
    "trade" => '\u{2122}',
    "euro" => '\u{20ac}',
};

/// Classify a lowercase tag name
pub fn classify(tag: &str) -> Option<TagClass> {
    TAG_CLASSES.get(tag).copied()
}

pub fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(tag)
}

pub fn html_entity(name: &str) -> Option<char> {
    HTML_ENTITIES.get(name).copied()
}
