//! Node payloads and structural links.

use serde::{Deserialize, Serialize};

use crate::{NodeId, NodeType, Sourcepos};

/// Kind of list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListType {
    /// Bullet list (`-`, `+` or `*`).
    #[default]
    Bullet,
    /// Ordered list (`1.` or `1)`).
    Ordered,
}

/// Delimiter following an ordered list number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListDelimType {
    /// `1.`
    #[default]
    Period,
    /// `1)`
    Paren,
}

/// Payload shared by lists and the items they contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeList {
    /// Bullet or ordered.
    pub list_type: ListType,
    /// Delimiter for ordered lists.
    pub delimiter: ListDelimType,
    /// First number of an ordered list.
    pub start: usize,
    /// Whether the list has no blank lines between or inside its items.
    pub tight: bool,
    /// Bullet character for bullet lists.
    pub bullet_char: u8,
    /// Columns between the container edge and the marker.
    pub marker_offset: usize,
    /// Width of the marker plus the spaces after it.
    pub padding: usize,
}

impl Default for NodeList {
    fn default() -> Self {
        Self {
            list_type: ListType::Bullet,
            delimiter: ListDelimType::Period,
            start: 1,
            tight: false,
            bullet_char: b'-',
            marker_offset: 0,
            padding: 2,
        }
    }
}

/// Payload of a heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeHeading {
    /// Level from 1 to 6.
    pub level: u8,
    /// Whether the heading was underlined rather than `#`-prefixed.
    pub setext: bool,
}

impl Default for NodeHeading {
    fn default() -> Self {
        Self {
            level: 1,
            setext: false,
        }
    }
}

/// Payload of a code block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCodeBlock {
    /// Whether the block is fenced.
    pub fenced: bool,
    /// Fence character (`` ` `` or `~`).
    pub fence_char: u8,
    /// Length of the opening fence.
    pub fence_length: usize,
    /// Indentation of the opening fence.
    pub fence_offset: usize,
    /// Info string after the opening fence.
    pub info: String,
    /// Code content.
    pub literal: String,
}

/// Payload of a link or image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeLink {
    /// Destination.
    pub url: String,
    /// Title, empty when absent.
    pub title: String,
}

/// Payload of a custom block or inline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCustom {
    /// Text emitted before the children.
    pub on_enter: String,
    /// Text emitted after the children.
    pub on_exit: String,
}

/// Payload of a spoiler block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpoiler {
    /// Title from the opening line, empty when absent.
    pub title: String,
}

/// The type tag of a node together with its type-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum NodeValue {
    /// Root document.
    Document,
    /// Block quote.
    BlockQuote,
    /// List.
    List(NodeList),
    /// List item, carrying the marker it was opened with.
    Item(NodeList),
    /// Code block.
    CodeBlock(NodeCodeBlock),
    /// Spoiler block.
    SpoilerBlock(NodeSpoiler),
    /// Paragraph.
    Paragraph,
    /// Heading.
    Heading(NodeHeading),
    /// Thematic break.
    ThematicBreak,
    /// Custom block.
    CustomBlock(NodeCustom),
    /// Text.
    Text(String),
    /// Soft line break.
    SoftBreak,
    /// Hard line break.
    LineBreak,
    /// Code span.
    Code(String),
    /// Emphasis.
    Emph,
    /// Strong emphasis.
    Strong,
    /// Superscript.
    Superscript,
    /// Subscript.
    Subscript,
    /// Strikethrough.
    Strikethrough,
    /// Link.
    Link(NodeLink),
    /// Image.
    Image(NodeLink),
    /// Custom inline.
    CustomInline(NodeCustom),
}

impl NodeValue {
    /// Creates the default payload for a node type.
    pub fn new(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Document => NodeValue::Document,
            NodeType::BlockQuote => NodeValue::BlockQuote,
            NodeType::List => NodeValue::List(NodeList::default()),
            NodeType::Item => NodeValue::Item(NodeList::default()),
            NodeType::CodeBlock => NodeValue::CodeBlock(NodeCodeBlock::default()),
            NodeType::SpoilerBlock => NodeValue::SpoilerBlock(NodeSpoiler::default()),
            NodeType::Paragraph => NodeValue::Paragraph,
            NodeType::Heading => NodeValue::Heading(NodeHeading::default()),
            NodeType::ThematicBreak => NodeValue::ThematicBreak,
            NodeType::CustomBlock => NodeValue::CustomBlock(NodeCustom::default()),
            NodeType::Text => NodeValue::Text(String::new()),
            NodeType::SoftBreak => NodeValue::SoftBreak,
            NodeType::LineBreak => NodeValue::LineBreak,
            NodeType::Code => NodeValue::Code(String::new()),
            NodeType::Emph => NodeValue::Emph,
            NodeType::Strong => NodeValue::Strong,
            NodeType::Superscript => NodeValue::Superscript,
            NodeType::Subscript => NodeValue::Subscript,
            NodeType::Strikethrough => NodeValue::Strikethrough,
            NodeType::Link => NodeValue::Link(NodeLink::default()),
            NodeType::Image => NodeValue::Image(NodeLink::default()),
            NodeType::CustomInline => NodeValue::CustomInline(NodeCustom::default()),
        }
    }

    /// Returns the type tag of this value.
    pub const fn node_type(&self) -> NodeType {
        match self {
            NodeValue::Document => NodeType::Document,
            NodeValue::BlockQuote => NodeType::BlockQuote,
            NodeValue::List(_) => NodeType::List,
            NodeValue::Item(_) => NodeType::Item,
            NodeValue::CodeBlock(_) => NodeType::CodeBlock,
            NodeValue::SpoilerBlock(_) => NodeType::SpoilerBlock,
            NodeValue::Paragraph => NodeType::Paragraph,
            NodeValue::Heading(_) => NodeType::Heading,
            NodeValue::ThematicBreak => NodeType::ThematicBreak,
            NodeValue::CustomBlock(_) => NodeType::CustomBlock,
            NodeValue::Text(_) => NodeType::Text,
            NodeValue::SoftBreak => NodeType::SoftBreak,
            NodeValue::LineBreak => NodeType::LineBreak,
            NodeValue::Code(_) => NodeType::Code,
            NodeValue::Emph => NodeType::Emph,
            NodeValue::Strong => NodeType::Strong,
            NodeValue::Superscript => NodeType::Superscript,
            NodeValue::Subscript => NodeType::Subscript,
            NodeValue::Strikethrough => NodeType::Strikethrough,
            NodeValue::Link(_) => NodeType::Link,
            NodeValue::Image(_) => NodeType::Image,
            NodeValue::CustomInline(_) => NodeType::CustomInline,
        }
    }

    /// Returns the text of a text, code span or code block value.
    pub fn literal(&self) -> Option<&str> {
        match self {
            NodeValue::Text(text) | NodeValue::Code(text) => Some(text),
            NodeValue::CodeBlock(code) => Some(&code.literal),
            _ => None,
        }
    }

    /// Returns a mutable reference to the text of a literal-carrying value.
    pub fn literal_mut(&mut self) -> Option<&mut String> {
        match self {
            NodeValue::Text(text) | NodeValue::Code(text) => Some(text),
            NodeValue::CodeBlock(code) => Some(&mut code.literal),
            _ => None,
        }
    }
}

/// Structural links of a node.
///
/// A node owns its children; the parent and sibling links are back-references
/// used for navigation only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Links {
    /// Containing node.
    pub parent: Option<NodeId>,
    /// Previous sibling.
    pub prev: Option<NodeId>,
    /// Next sibling.
    pub next: Option<NodeId>,
    /// First child.
    pub first_child: Option<NodeId>,
    /// Last child.
    pub last_child: Option<NodeId>,
}

/// A node stored in an [`AstArena`](crate::AstArena).
#[derive(Debug, Clone)]
pub struct Node {
    /// Type tag and payload.
    pub value: NodeValue,
    /// Where the node came from in the source.
    pub sourcepos: Sourcepos,
    pub(crate) links: Links,
}

impl Node {
    pub(crate) fn new(value: NodeValue, sourcepos: Sourcepos) -> Self {
        Self {
            value,
            sourcepos,
            links: Links::default(),
        }
    }

    /// Returns the type tag of this node.
    #[inline]
    pub fn node_type(&self) -> NodeType {
        self.value.node_type()
    }

    /// Returns the structural links of this node.
    #[inline]
    pub fn links(&self) -> &Links {
        &self.links
    }
}
