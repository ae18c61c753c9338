//! Tree mutation error types.

use thiserror::Error;

use crate::{NodeId, NodeType};

/// Errors returned by tree mutations and typed setters.
///
/// A failed operation never leaves the tree partially modified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The handle refers to a node that has been freed.
    #[error("Stale node handle: {0}")]
    StaleNode(NodeId),

    /// The child type is not in the parent's allowed set.
    #[error("A {child} node cannot be a child of a {parent} node")]
    NotAllowed {
        /// Type of the would-be parent.
        parent: NodeType,
        /// Type of the rejected child.
        child: NodeType,
    },

    /// The mutation would make a node its own ancestor.
    #[error("Inserting {0} here would create a cycle")]
    Cycle(NodeId),

    /// A positional operation targeted a node without a parent.
    #[error("Node {0} has no parent")]
    NoParent(NodeId),

    /// A typed accessor was used on a node of another type.
    #[error("{accessor} is not supported on {node_type} nodes")]
    WrongType {
        /// Name of the accessor.
        accessor: &'static str,
        /// Type of the node it was called on.
        node_type: NodeType,
    },

    /// A numeric setter was given a value outside its domain.
    #[error("{value} is out of range for {accessor}")]
    OutOfRange {
        /// Name of the accessor.
        accessor: &'static str,
        /// The rejected value.
        value: i64,
    },
}

impl TreeError {
    /// Creates a new wrong-type error.
    pub fn wrong_type(accessor: &'static str, node_type: NodeType) -> Self {
        Self::WrongType {
            accessor,
            node_type,
        }
    }

    /// Creates a new out-of-range error.
    pub fn out_of_range(accessor: &'static str, value: impl Into<i64>) -> Self {
        Self::OutOfRange {
            accessor,
            value: value.into(),
        }
    }
}
