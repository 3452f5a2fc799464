//! Reified tree edits

use std::fmt;
use std::ops::Range;

use super::node::{Node, NodeKind, Path};

/// One tree edit, expressed against paths that are valid when it is applied.
///
/// Repairers return these instead of mutating, so every mutation of a table
/// goes through [`Document::apply`](super::Document::apply).
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    Insert { path: Path, node: Node },
    Remove { path: Path },
    SetProperties { path: Path, kind: NodeKind },
    Wrap { path: Path, wrapper: NodeKind },
    WrapRange {
        parent: Path,
        range: Range<usize>,
        wrapper: NodeKind,
    },
    Move { from: Path, to: Path },
}

impl Edit {
    pub fn insert(path: Path, node: Node) -> Self {
        Edit::Insert { path, node }
    }

    pub fn remove(path: Path) -> Self {
        Edit::Remove { path }
    }

    pub fn set(path: Path, kind: NodeKind) -> Self {
        Edit::SetProperties { path, kind }
    }

    pub fn wrap(path: Path, wrapper: NodeKind) -> Self {
        Edit::Wrap { path, wrapper }
    }
}

impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edit::Insert { path, node } => write!(f, "insert {} at {:?}", node.kind.name(), path),
            Edit::Remove { path } => write!(f, "remove {:?}", path),
            Edit::SetProperties { path, kind } => write!(f, "set {} at {:?}", kind.name(), path),
            Edit::Wrap { path, wrapper } => write!(f, "wrap {:?} in {}", path, wrapper.name()),
            Edit::WrapRange {
                parent,
                range,
                wrapper,
            } => write!(
                f,
                "wrap {:?}[{}..{}] in {}",
                parent,
                range.start,
                range.end,
                wrapper.name()
            ),
            Edit::Move { from, to } => write!(f, "move {:?} -> {:?}", from, to),
        }
    }
}
