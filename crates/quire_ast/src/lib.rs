//! # quire_ast
//!
//! Node tree for the quire markup engine.
//!
//! This crate provides the mutable tree that the parser builds and the
//! renderer walks.
//!
//! ## Architecture
//!
//! - All nodes live in an [`AstArena`] and are addressed by [`NodeId`] handles
//! - Each node owns its children; parent and sibling links are back-references
//! - Every mutation checks the allowed-child table and rejects cycles before
//!   touching the tree
//! - Freed handles go stale rather than dangling
//!
//! ## Example
//!
//! ```rust
//! use quire_ast::{AstArena, NodeType};
//!
//! let mut arena = AstArena::new();
//! let doc = arena.new_node(NodeType::Document);
//! let para = arena.new_node(NodeType::Paragraph);
//! let text = arena.new_node(NodeType::Text);
//! arena.set_literal(text, "Hello").unwrap();
//!
//! arena.append_child(doc, para).unwrap();
//! arena.append_child(para, text).unwrap();
//!
//! // Text cannot hold children, and a node cannot contain its ancestor.
//! assert!(arena.append_child(text, para).is_err());
//! assert_eq!(arena.check(doc), 0);
//! ```

mod accessors;
mod arena;
mod check;
mod error;
mod iter;
mod node;
mod node_type;
mod serialize;
mod sourcepos;

pub use arena::{AstArena, Children, NodeId};
pub use error::TreeError;
pub use iter::{EventType, Traverse, TreeIter};
pub use node::{
    Links, ListDelimType, ListType, Node, NodeCodeBlock, NodeCustom, NodeHeading, NodeLink,
    NodeList, NodeSpoiler, NodeValue,
};
pub use node_type::{ALL_INLINES, NodeType, TOP_LEVEL_BLOCKS};
pub use serialize::SerializeTree;
pub use sourcepos::{Position, Sourcepos};
