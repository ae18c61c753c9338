//! Node type tags and the allowed-child table.

use serde::{Deserialize, Serialize};

/// The type tag of a node.
///
/// Block kinds come first, followed by inline kinds. The discriminant of each
/// variant is its bit position in a [`NodeType::allowed_children`] mask, so the
/// enumeration must stay below 32 variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum NodeType {
    // Block elements
    /// Root document node.
    Document = 0,
    /// Block quote (`> `).
    BlockQuote,
    /// Bullet or ordered list.
    List,
    /// Item in a list.
    Item,
    /// Fenced or indented code block.
    CodeBlock,
    /// Spoiler block delimited by `:::` lines.
    SpoilerBlock,
    /// Paragraph containing inline content.
    Paragraph,
    /// ATX or setext heading.
    Heading,
    /// Thematic break (`---`).
    ThematicBreak,
    /// Block with caller-supplied render strings.
    CustomBlock,

    // Inline elements
    /// Plain text.
    Text,
    /// Soft line break.
    SoftBreak,
    /// Hard line break.
    LineBreak,
    /// Code span.
    Code,
    /// Emphasis.
    Emph,
    /// Strong emphasis.
    Strong,
    /// Superscript (`^..^`).
    Superscript,
    /// Subscript (`~..~`).
    Subscript,
    /// Strikethrough (`~~..~~`).
    Strikethrough,
    /// Hyperlink.
    Link,
    /// Image.
    Image,
    /// Inline with caller-supplied render strings.
    CustomInline,
}

const fn bit(ty: NodeType) -> u32 {
    1 << ty as u32
}

/// Blocks that may appear directly under a document, block quote or item.
pub const TOP_LEVEL_BLOCKS: u32 = bit(NodeType::BlockQuote)
    | bit(NodeType::List)
    | bit(NodeType::CodeBlock)
    | bit(NodeType::SpoilerBlock)
    | bit(NodeType::Paragraph)
    | bit(NodeType::Heading)
    | bit(NodeType::ThematicBreak)
    | bit(NodeType::CustomBlock);

/// Every inline kind.
pub const ALL_INLINES: u32 = bit(NodeType::Text)
    | bit(NodeType::SoftBreak)
    | bit(NodeType::LineBreak)
    | bit(NodeType::Code)
    | bit(NodeType::Emph)
    | bit(NodeType::Strong)
    | bit(NodeType::Superscript)
    | bit(NodeType::Subscript)
    | bit(NodeType::Strikethrough)
    | bit(NodeType::Link)
    | bit(NodeType::Image)
    | bit(NodeType::CustomInline);

impl NodeType {
    /// Every node type, in discriminant order.
    pub const ALL: [NodeType; 22] = [
        NodeType::Document,
        NodeType::BlockQuote,
        NodeType::List,
        NodeType::Item,
        NodeType::CodeBlock,
        NodeType::SpoilerBlock,
        NodeType::Paragraph,
        NodeType::Heading,
        NodeType::ThematicBreak,
        NodeType::CustomBlock,
        NodeType::Text,
        NodeType::SoftBreak,
        NodeType::LineBreak,
        NodeType::Code,
        NodeType::Emph,
        NodeType::Strong,
        NodeType::Superscript,
        NodeType::Subscript,
        NodeType::Strikethrough,
        NodeType::Link,
        NodeType::Image,
        NodeType::CustomInline,
    ];

    /// Returns the bit for this type in an allowed-children mask.
    #[inline]
    pub const fn mask(self) -> u32 {
        bit(self)
    }

    /// Returns true if this node type is a block element.
    #[inline]
    pub const fn is_block(self) -> bool {
        (self as u8) <= NodeType::CustomBlock as u8
    }

    /// Returns true if this node type is an inline element.
    #[inline]
    pub const fn is_inline(self) -> bool {
        !self.is_block()
    }

    /// Returns the mask of node types that may be children of this type.
    pub const fn allowed_children(self) -> u32 {
        match self {
            NodeType::Document | NodeType::BlockQuote | NodeType::Item => TOP_LEVEL_BLOCKS,
            NodeType::List => bit(NodeType::Item),
            NodeType::CustomBlock => !bit(NodeType::Document),
            NodeType::Paragraph
            | NodeType::Heading
            | NodeType::SpoilerBlock
            | NodeType::Emph
            | NodeType::Strong
            | NodeType::Superscript
            | NodeType::Subscript
            | NodeType::Strikethrough
            | NodeType::Link
            | NodeType::Image
            | NodeType::CustomInline => ALL_INLINES,
            NodeType::CodeBlock
            | NodeType::ThematicBreak
            | NodeType::Text
            | NodeType::SoftBreak
            | NodeType::LineBreak
            | NodeType::Code => 0,
        }
    }

    /// Returns true if a node of type `child` may be appended to this type.
    #[inline]
    pub const fn can_contain(self, child: NodeType) -> bool {
        self.allowed_children() & child.mask() != 0
    }

    /// Returns the lowercase name of this type.
    pub const fn as_str(self) -> &'static str {
        match self {
            NodeType::Document => "document",
            NodeType::BlockQuote => "block_quote",
            NodeType::List => "list",
            NodeType::Item => "item",
            NodeType::CodeBlock => "code_block",
            NodeType::SpoilerBlock => "spoiler_block",
            NodeType::Paragraph => "paragraph",
            NodeType::Heading => "heading",
            NodeType::ThematicBreak => "thematic_break",
            NodeType::CustomBlock => "custom_block",
            NodeType::Text => "text",
            NodeType::SoftBreak => "softbreak",
            NodeType::LineBreak => "linebreak",
            NodeType::Code => "code",
            NodeType::Emph => "emph",
            NodeType::Strong => "strong",
            NodeType::Superscript => "superscript",
            NodeType::Subscript => "subscript",
            NodeType::Strikethrough => "strikethrough",
            NodeType::Link => "link",
            NodeType::Image => "image",
            NodeType::CustomInline => "custom_inline",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
