//! Serialization of subtrees.
//!
//! Trees are serialized as nested objects:
//! `{ "type": ..., "data": ..., "sourcepos": ..., "children": [...] }`.

use serde::ser::{SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::{AstArena, NodeId, NodeValue};

/// Serializable view of the subtree under a node.
///
/// # Example
///
/// ```rust
/// use quire_ast::{AstArena, NodeType, SerializeTree};
///
/// let mut arena = AstArena::new();
/// let doc = arena.new_node(NodeType::Document);
/// let json = serde_json::to_string(&SerializeTree::new(&arena, doc)).unwrap();
/// assert_eq!(json, r#"{"type":"document","children":[]}"#);
/// ```
#[derive(Clone, Copy)]
pub struct SerializeTree<'a> {
    arena: &'a AstArena,
    node: NodeId,
    sourcepos: bool,
}

impl<'a> SerializeTree<'a> {
    /// Creates a view of the subtree under `node`, without source positions.
    pub fn new(arena: &'a AstArena, node: NodeId) -> Self {
        Self {
            arena,
            node,
            sourcepos: false,
        }
    }

    /// Includes source positions in the output.
    pub fn with_sourcepos(mut self) -> Self {
        self.sourcepos = true;
        self
    }
}

struct Children<'a>(SerializeTree<'a>);

impl Serialize for Children<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let tree = self.0;
        let mut seq = serializer.serialize_seq(None)?;
        for child in tree.arena.children(tree.node) {
            seq.serialize_element(&SerializeTree { node: child, ..tree })?;
        }
        seq.end()
    }
}

impl Serialize for SerializeTree<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let Some(node) = self.arena.get(self.node) else {
            return serializer.serialize_none();
        };

        let has_payload = !matches!(
            node.value,
            NodeValue::Document
                | NodeValue::BlockQuote
                | NodeValue::Paragraph
                | NodeValue::ThematicBreak
                | NodeValue::SoftBreak
                | NodeValue::LineBreak
                | NodeValue::Emph
                | NodeValue::Strong
                | NodeValue::Superscript
                | NodeValue::Subscript
                | NodeValue::Strikethrough
        );

        let mut len = 2;
        if has_payload {
            len += 1;
        }
        if self.sourcepos {
            len += 1;
        }
        let mut state = serializer.serialize_struct("Node", len)?;
        state.serialize_field("type", &node.node_type())?;
        if has_payload {
            state.serialize_field("data", &Payload(&node.value))?;
        }
        if self.sourcepos {
            state.serialize_field("sourcepos", &node.sourcepos)?;
        }
        state.serialize_field("children", &Children(*self))?;
        state.end()
    }
}

/// The inner payload of a value, without its tag.
struct Payload<'a>(&'a NodeValue);

impl Serialize for Payload<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            NodeValue::CodeBlock(code) => code.serialize(serializer),
            NodeValue::SpoilerBlock(spoiler) => spoiler.serialize(serializer),
            NodeValue::Heading(heading) => heading.serialize(serializer),
            NodeValue::CustomBlock(custom) | NodeValue::CustomInline(custom) => {
                custom.serialize(serializer)
            }
            NodeValue::Text(text) | NodeValue::Code(text) => text.serialize(serializer),
            NodeValue::Link(link) | NodeValue::Image(link) => link.serialize(serializer),
            NodeValue::List(list) | NodeValue::Item(list) => list.serialize(serializer),
            _ => serializer.serialize_unit(),
        }
    }
}
