//! Type-checked payload accessors.
//!
//! Getters return `None` when the node is stale or of the wrong type. Setters
//! return an error in those cases and leave the node untouched.

use crate::node::{ListDelimType, ListType, NodeValue};
use crate::{AstArena, NodeId, TreeError};

impl AstArena {
    fn with_value<T>(
        &mut self,
        id: NodeId,
        accessor: &'static str,
        f: impl FnOnce(&mut NodeValue) -> Option<T>,
    ) -> Result<T, TreeError> {
        let node = self.node_mut_or_err(id)?;
        let node_type = node.node_type();
        f(&mut node.value).ok_or(TreeError::wrong_type(accessor, node_type))
    }

    // Headings

    /// Returns the level of a heading.
    pub fn heading_level(&self, id: NodeId) -> Option<u8> {
        match self.value(id)? {
            NodeValue::Heading(heading) => Some(heading.level),
            _ => None,
        }
    }

    /// Sets the level of a heading; only 1 through 6 are accepted.
    pub fn set_heading_level(&mut self, id: NodeId, level: u8) -> Result<(), TreeError> {
        self.with_value(id, "heading_level", |value| match value {
            NodeValue::Heading(heading) if (1..=6).contains(&level) => {
                heading.level = level;
                Some(Ok(()))
            }
            NodeValue::Heading(_) => Some(Err(TreeError::out_of_range("heading_level", level))),
            _ => None,
        })?
    }

    // Lists

    /// Returns the kind of a list.
    pub fn list_type(&self, id: NodeId) -> Option<ListType> {
        match self.value(id)? {
            NodeValue::List(list) => Some(list.list_type),
            _ => None,
        }
    }

    /// Sets the kind of a list.
    pub fn set_list_type(&mut self, id: NodeId, list_type: ListType) -> Result<(), TreeError> {
        self.with_value(id, "list_type", |value| match value {
            NodeValue::List(list) => {
                list.list_type = list_type;
                Some(())
            }
            _ => None,
        })
    }

    /// Returns the delimiter of a list.
    pub fn list_delim(&self, id: NodeId) -> Option<ListDelimType> {
        match self.value(id)? {
            NodeValue::List(list) => Some(list.delimiter),
            _ => None,
        }
    }

    /// Sets the delimiter of a list.
    pub fn set_list_delim(
        &mut self,
        id: NodeId,
        delimiter: ListDelimType,
    ) -> Result<(), TreeError> {
        self.with_value(id, "list_delim", |value| match value {
            NodeValue::List(list) => {
                list.delimiter = delimiter;
                Some(())
            }
            _ => None,
        })
    }

    /// Returns the start number of a list.
    pub fn list_start(&self, id: NodeId) -> Option<usize> {
        match self.value(id)? {
            NodeValue::List(list) => Some(list.start),
            _ => None,
        }
    }

    /// Sets the start number of a list; negative numbers are rejected.
    pub fn set_list_start(&mut self, id: NodeId, start: i64) -> Result<(), TreeError> {
        self.with_value(id, "list_start", |value| match value {
            NodeValue::List(list) => Some(match usize::try_from(start) {
                Ok(start) => {
                    list.start = start;
                    Ok(())
                }
                Err(_) => Err(TreeError::out_of_range("list_start", start)),
            }),
            _ => None,
        })?
    }

    /// Returns whether a list is tight.
    pub fn list_tight(&self, id: NodeId) -> Option<bool> {
        match self.value(id)? {
            NodeValue::List(list) => Some(list.tight),
            _ => None,
        }
    }

    /// Sets whether a list is tight.
    pub fn set_list_tight(&mut self, id: NodeId, tight: bool) -> Result<(), TreeError> {
        self.with_value(id, "list_tight", |value| match value {
            NodeValue::List(list) => {
                list.tight = tight;
                Some(())
            }
            _ => None,
        })
    }

    // Literals

    /// Returns the literal of a text, code span or code block.
    pub fn literal(&self, id: NodeId) -> Option<&str> {
        self.value(id)?.literal()
    }

    /// Replaces the literal of a text, code span or code block.
    pub fn set_literal(&mut self, id: NodeId, literal: impl Into<String>) -> Result<(), TreeError> {
        let literal = literal.into();
        self.with_value(id, "literal", |value| {
            value.literal_mut().map(|slot| *slot = literal)
        })
    }

    /// Returns the info string of a code block.
    pub fn fence_info(&self, id: NodeId) -> Option<&str> {
        match self.value(id)? {
            NodeValue::CodeBlock(code) => Some(&code.info),
            _ => None,
        }
    }

    /// Sets the info string of a code block.
    pub fn set_fence_info(&mut self, id: NodeId, info: impl Into<String>) -> Result<(), TreeError> {
        let info = info.into();
        self.with_value(id, "fence_info", |value| match value {
            NodeValue::CodeBlock(code) => {
                code.info = info;
                Some(())
            }
            _ => None,
        })
    }

    // Links, images and spoilers

    /// Returns the destination of a link or image.
    pub fn url(&self, id: NodeId) -> Option<&str> {
        match self.value(id)? {
            NodeValue::Link(link) | NodeValue::Image(link) => Some(&link.url),
            _ => None,
        }
    }

    /// Sets the destination of a link or image.
    pub fn set_url(&mut self, id: NodeId, url: impl Into<String>) -> Result<(), TreeError> {
        let url = url.into();
        self.with_value(id, "url", |value| match value {
            NodeValue::Link(link) | NodeValue::Image(link) => {
                link.url = url;
                Some(())
            }
            _ => None,
        })
    }

    /// Returns the title of a link, image or spoiler block.
    pub fn title(&self, id: NodeId) -> Option<&str> {
        match self.value(id)? {
            NodeValue::Link(link) | NodeValue::Image(link) => Some(&link.title),
            NodeValue::SpoilerBlock(spoiler) => Some(&spoiler.title),
            _ => None,
        }
    }

    /// Sets the title of a link, image or spoiler block.
    pub fn set_title(&mut self, id: NodeId, title: impl Into<String>) -> Result<(), TreeError> {
        let title = title.into();
        self.with_value(id, "title", |value| match value {
            NodeValue::Link(link) | NodeValue::Image(link) => {
                link.title = title;
                Some(())
            }
            NodeValue::SpoilerBlock(spoiler) => {
                spoiler.title = title;
                Some(())
            }
            _ => None,
        })
    }

    // Custom nodes

    /// Returns the text a custom node renders before its children.
    pub fn on_enter(&self, id: NodeId) -> Option<&str> {
        match self.value(id)? {
            NodeValue::CustomBlock(custom) | NodeValue::CustomInline(custom) => {
                Some(&custom.on_enter)
            }
            _ => None,
        }
    }

    /// Sets the text a custom node renders before its children.
    pub fn set_on_enter(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), TreeError> {
        let text = text.into();
        self.with_value(id, "on_enter", |value| match value {
            NodeValue::CustomBlock(custom) | NodeValue::CustomInline(custom) => {
                custom.on_enter = text;
                Some(())
            }
            _ => None,
        })
    }

    /// Returns the text a custom node renders after its children.
    pub fn on_exit(&self, id: NodeId) -> Option<&str> {
        match self.value(id)? {
            NodeValue::CustomBlock(custom) | NodeValue::CustomInline(custom) => {
                Some(&custom.on_exit)
            }
            _ => None,
        }
    }

    /// Sets the text a custom node renders after its children.
    pub fn set_on_exit(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), TreeError> {
        let text = text.into();
        self.with_value(id, "on_exit", |value| match value {
            NodeValue::CustomBlock(custom) | NodeValue::CustomInline(custom) => {
                custom.on_exit = text;
                Some(())
            }
            _ => None,
        })
    }

    // Source positions

    /// Returns the line a node starts on.
    pub fn start_line(&self, id: NodeId) -> Option<usize> {
        self.get(id).map(|node| node.sourcepos.start.line)
    }

    /// Returns the column a node starts at.
    pub fn start_column(&self, id: NodeId) -> Option<usize> {
        self.get(id).map(|node| node.sourcepos.start.column)
    }

    /// Returns the line a node ends on.
    pub fn end_line(&self, id: NodeId) -> Option<usize> {
        self.get(id).map(|node| node.sourcepos.end.line)
    }

    /// Returns the column a node ends at.
    pub fn end_column(&self, id: NodeId) -> Option<usize> {
        self.get(id).map(|node| node.sourcepos.end.column)
    }
}
