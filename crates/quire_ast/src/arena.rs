//! Arena storage for nodes.
//!
//! Nodes live in slots of a single `AstArena` and are addressed by [`NodeId`]
//! handles. Freeing a node recycles its slot and bumps the slot's generation,
//! so an old handle to it becomes stale instead of aliasing a new node.

use crate::node::{Links, Node, NodeValue};
use crate::{NodeType, Sourcepos, TreeError};

/// Handle to a node in an [`AstArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Owner of every node of one or more trees.
///
/// All structural operations go through the arena. Detached nodes stay
/// allocated until [`AstArena::free`] is called or the arena is dropped.
///
/// # Example
///
/// ```rust
/// use quire_ast::{AstArena, NodeType};
///
/// let mut arena = AstArena::new();
/// let doc = arena.new_node(NodeType::Document);
/// let para = arena.new_node(NodeType::Paragraph);
/// arena.append_child(doc, para).unwrap();
/// assert_eq!(arena.parent(para), Some(doc));
/// ```
#[derive(Debug, Default)]
pub struct AstArena {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
}

impl AstArena {
    /// Creates a new empty arena.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new arena with room for `capacity` nodes.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
        }
    }

    /// Returns the number of live nodes.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Returns true if the arena holds no live nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creates an unattached node with the default payload for `node_type`.
    pub fn new_node(&mut self, node_type: NodeType) -> NodeId {
        self.alloc(NodeValue::new(node_type), Sourcepos::default())
    }

    /// Creates an unattached node with the given payload and position.
    pub fn alloc(&mut self, value: NodeValue, sourcepos: Sourcepos) -> NodeId {
        let node = Node::new(value, sourcepos);
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    /// Returns true if `id` refers to a live node.
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Returns the node behind `id`, or `None` if it has been freed.
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    /// Returns the node behind `id` mutably, or `None` if it has been freed.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub(crate) fn node_or_err(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.get(id).ok_or(TreeError::StaleNode(id))
    }

    pub(crate) fn node_mut_or_err(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.get_mut(id).ok_or(TreeError::StaleNode(id))
    }

    /// Returns the payload of a node.
    #[inline]
    pub fn value(&self, id: NodeId) -> Option<&NodeValue> {
        self.get(id).map(|node| &node.value)
    }

    /// Returns the payload of a node mutably.
    #[inline]
    pub fn value_mut(&mut self, id: NodeId) -> Option<&mut NodeValue> {
        self.get_mut(id).map(|node| &mut node.value)
    }

    /// Returns the type tag of a node.
    #[inline]
    pub fn node_type(&self, id: NodeId) -> Option<NodeType> {
        self.get(id).map(Node::node_type)
    }

    /// Returns the structural links of a node for direct rewiring.
    ///
    /// Changes made here bypass every tree invariant. Callers are expected to
    /// repair the tree with [`AstArena::check`] afterwards.
    pub fn links_mut(&mut self, id: NodeId) -> Option<&mut Links> {
        self.get_mut(id).map(|node| &mut node.links)
    }

    fn links(&self, id: NodeId) -> Option<&Links> {
        self.get(id).map(|node| &node.links)
    }

    // Navigation

    /// Returns the parent of a node.
    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.links(id).and_then(|l| l.parent)
    }

    /// Returns the first child of a node.
    #[inline]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.links(id).and_then(|l| l.first_child)
    }

    /// Returns the last child of a node.
    #[inline]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.links(id).and_then(|l| l.last_child)
    }

    /// Returns the next sibling of a node.
    #[inline]
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.links(id).and_then(|l| l.next)
    }

    /// Returns the previous sibling of a node.
    #[inline]
    pub fn previous(&self, id: NodeId) -> Option<NodeId> {
        self.links(id).and_then(|l| l.prev)
    }

    /// Returns an iterator over the children of a node.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            arena: self,
            next: self.first_child(id),
        }
    }

    /// Returns true if `ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(node) = cur {
            if node == ancestor {
                return true;
            }
            cur = self.parent(node);
        }
        false
    }

    // Mutation

    fn check_insertion(&self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let parent_type = self.node_or_err(parent)?.node_type();
        let child_type = self.node_or_err(child)?.node_type();
        if self.is_ancestor_or_self(child, parent) {
            return Err(TreeError::Cycle(child));
        }
        if !parent_type.can_contain(child_type) {
            return Err(TreeError::NotAllowed {
                parent: parent_type,
                child: child_type,
            });
        }
        Ok(())
    }

    /// Detaches a node from its parent and siblings.
    ///
    /// The node keeps its own subtree and becomes owned by the caller.
    pub fn unlink(&mut self, id: NodeId) {
        let Some(links) = self.links(id).copied() else {
            return;
        };
        if let Some(prev) = links.prev {
            if let Some(prev_links) = self.links_mut(prev) {
                prev_links.next = links.next;
            }
        }
        if let Some(next) = links.next {
            if let Some(next_links) = self.links_mut(next) {
                next_links.prev = links.prev;
            }
        }
        if let Some(parent) = links.parent {
            if let Some(parent_links) = self.links_mut(parent) {
                if parent_links.first_child == Some(id) {
                    parent_links.first_child = links.next;
                }
                if parent_links.last_child == Some(id) {
                    parent_links.last_child = links.prev;
                }
            }
        }
        if let Some(own) = self.links_mut(id) {
            own.parent = None;
            own.prev = None;
            own.next = None;
        }
    }

    /// Appends `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.check_insertion(parent, child)?;
        self.unlink(child);
        let old_last = self.last_child(parent);
        if let Some(links) = self.links_mut(child) {
            links.parent = Some(parent);
            links.prev = old_last;
        }
        match old_last {
            Some(last) => {
                if let Some(links) = self.links_mut(last) {
                    links.next = Some(child);
                }
            }
            None => {
                if let Some(links) = self.links_mut(parent) {
                    links.first_child = Some(child);
                }
            }
        }
        if let Some(links) = self.links_mut(parent) {
            links.last_child = Some(child);
        }
        Ok(())
    }

    /// Prepends `child` as the first child of `parent`.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.check_insertion(parent, child)?;
        self.unlink(child);
        let old_first = self.first_child(parent);
        if let Some(links) = self.links_mut(child) {
            links.parent = Some(parent);
            links.next = old_first;
        }
        match old_first {
            Some(first) => {
                if let Some(links) = self.links_mut(first) {
                    links.prev = Some(child);
                }
            }
            None => {
                if let Some(links) = self.links_mut(parent) {
                    links.last_child = Some(child);
                }
            }
        }
        if let Some(links) = self.links_mut(parent) {
            links.first_child = Some(child);
        }
        Ok(())
    }

    /// Inserts `node` immediately before `sibling`.
    pub fn insert_before(&mut self, sibling: NodeId, node: NodeId) -> Result<(), TreeError> {
        let parent = self
            .node_or_err(sibling)?
            .links
            .parent
            .ok_or(TreeError::NoParent(sibling))?;
        self.check_insertion(parent, node)?;
        if node == sibling {
            return Ok(());
        }
        self.unlink(node);
        let prev = self.previous(sibling);
        if let Some(links) = self.links_mut(node) {
            links.parent = Some(parent);
            links.prev = prev;
            links.next = Some(sibling);
        }
        if let Some(links) = self.links_mut(sibling) {
            links.prev = Some(node);
        }
        match prev {
            Some(prev) => {
                if let Some(links) = self.links_mut(prev) {
                    links.next = Some(node);
                }
            }
            None => {
                if let Some(links) = self.links_mut(parent) {
                    links.first_child = Some(node);
                }
            }
        }
        Ok(())
    }

    /// Inserts `node` immediately after `sibling`.
    pub fn insert_after(&mut self, sibling: NodeId, node: NodeId) -> Result<(), TreeError> {
        let parent = self
            .node_or_err(sibling)?
            .links
            .parent
            .ok_or(TreeError::NoParent(sibling))?;
        self.check_insertion(parent, node)?;
        if node == sibling {
            return Ok(());
        }
        self.unlink(node);
        let next = self.next(sibling);
        if let Some(links) = self.links_mut(node) {
            links.parent = Some(parent);
            links.prev = Some(sibling);
            links.next = next;
        }
        if let Some(links) = self.links_mut(sibling) {
            links.next = Some(node);
        }
        match next {
            Some(next) => {
                if let Some(links) = self.links_mut(next) {
                    links.prev = Some(node);
                }
            }
            None => {
                if let Some(links) = self.links_mut(parent) {
                    links.last_child = Some(node);
                }
            }
        }
        Ok(())
    }

    /// Puts `new` in the position of `old` and detaches `old`.
    ///
    /// `old` is not freed; it remains owned by the caller.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<(), TreeError> {
        self.insert_before(old, new)?;
        if old != new {
            self.unlink(old);
        }
        Ok(())
    }

    /// Frees a node and its whole subtree.
    ///
    /// The node is unlinked first, so freeing an attached node leaves its
    /// former parent consistent. Stale handles are ignored.
    pub fn free(&mut self, id: NodeId) {
        if !self.contains(id) {
            return;
        }
        self.unlink(id);
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            let slot = &mut self.slots[cur.index as usize];
            let Some(node) = slot.node.take() else {
                continue;
            };
            slot.generation = slot.generation.wrapping_add(1);
            self.free_list.push(cur.index);

            let mut child = node.links.first_child;
            while let Some(c) = child {
                let Some(child_node) = self.get(c) else {
                    break;
                };
                // Only release children that still point back at this node.
                if child_node.links.parent != Some(cur) {
                    break;
                }
                child = child_node.links.next;
                stack.push(c);
            }
        }
    }

    /// Moves `first` and every sibling after it to the end of `to`.
    ///
    /// Stops at the first node `to` does not accept.
    pub fn reparent_from(&mut self, first: NodeId, to: NodeId) -> Result<(), TreeError> {
        let mut cur = Some(first);
        while let Some(node) = cur {
            cur = self.next(node);
            self.append_child(to, node)?;
        }
        Ok(())
    }
}

/// Iterator over the children of a node.
pub struct Children<'a> {
    arena: &'a AstArena,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let cur = self.next?;
        self.next = self.arena.next(cur);
        Some(cur)
    }
}
