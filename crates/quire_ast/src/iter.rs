//! Enter/exit traversal of a subtree.
//!
//! [`TreeIter`] does not borrow the arena between steps, so the consumer may
//! mutate the tree while walking it. In particular the node most recently
//! returned may be freed: the iterator has already moved its cursor past it.

use serde::Serialize;

use crate::{AstArena, NodeId};

/// Whether a node is being entered or exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Before the node's children.
    Enter,
    /// After the node's children.
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    /// The children have not been looked at yet.
    Start,
    /// The next child to enter, if any.
    At(Option<NodeId>),
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    node: NodeId,
    cursor: Cursor,
}

/// Preorder walker yielding an [`EventType::Enter`] and an [`EventType::Exit`]
/// event for every node under (and including) a root.
///
/// # Example
///
/// ```rust
/// use quire_ast::{AstArena, EventType, NodeType, TreeIter};
///
/// let mut arena = AstArena::new();
/// let doc = arena.new_node(NodeType::Document);
/// let para = arena.new_node(NodeType::Paragraph);
/// arena.append_child(doc, para).unwrap();
///
/// let mut iter = TreeIter::new(doc);
/// let mut events = Vec::new();
/// while let Some(event) = iter.next(&arena) {
///     events.push(event);
/// }
/// assert_eq!(
///     events,
///     vec![
///         (EventType::Enter, doc),
///         (EventType::Enter, para),
///         (EventType::Exit, para),
///         (EventType::Exit, doc),
///     ]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct TreeIter {
    root: NodeId,
    started: bool,
    stack: Vec<Frame>,
}

impl TreeIter {
    /// Creates an iterator positioned before `root`.
    pub fn new(root: NodeId) -> Self {
        Self {
            root,
            started: false,
            stack: Vec::new(),
        }
    }

    /// Returns the root this iterator walks.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the next event, or `None` once the walk is complete.
    pub fn next(&mut self, arena: &AstArena) -> Option<(EventType, NodeId)> {
        if !self.started {
            self.started = true;
            if !arena.contains(self.root) {
                return None;
            }
            self.stack.push(Frame {
                node: self.root,
                cursor: Cursor::Start,
            });
            return Some((EventType::Enter, self.root));
        }

        loop {
            let frame = self.stack.last_mut()?;
            // A frame whose node was freed at Enter is dropped with its subtree.
            if !arena.contains(frame.node) {
                self.stack.pop();
                continue;
            }
            let pending = match frame.cursor {
                Cursor::Start => arena.first_child(frame.node),
                Cursor::At(next) => next,
            }
            .filter(|child| arena.parent(*child) == Some(frame.node));

            match pending {
                Some(child) => {
                    frame.cursor = Cursor::At(arena.next(child));
                    self.stack.push(Frame {
                        node: child,
                        cursor: Cursor::Start,
                    });
                    return Some((EventType::Enter, child));
                }
                None => {
                    let node = frame.node;
                    self.stack.pop();
                    if let Some(parent) = self.stack.last_mut() {
                        parent.cursor = Cursor::At(arena.next(node));
                    }
                    return Some((EventType::Exit, node));
                }
            }
        }
    }

    /// Repositions the iterator so that the last event seen was `event` on
    /// `node`.
    ///
    /// Resetting to [`EventType::Exit`] skips the children of `node`. The node
    /// must be `root` or one of its descendants; otherwise the walk ends.
    pub fn reset(&mut self, arena: &AstArena, node: NodeId, event: EventType) {
        self.started = true;
        self.stack.clear();
        if !arena.is_ancestor_or_self(self.root, node) {
            return;
        }

        let mut path = Vec::new();
        let mut cur = Some(node);
        while let Some(n) = cur {
            path.push(n);
            if n == self.root {
                break;
            }
            cur = arena.parent(n);
        }
        path.reverse();

        let last = path.len() - 1;
        for (depth, &n) in path.iter().enumerate() {
            let cursor = if depth < last {
                Cursor::At(arena.next(path[depth + 1]))
            } else {
                Cursor::Start
            };
            if depth == last && event == EventType::Exit {
                break;
            }
            self.stack.push(Frame { node: n, cursor });
        }
    }
}

/// Borrowing traversal returned by [`AstArena::traverse`].
pub struct Traverse<'a> {
    arena: &'a AstArena,
    iter: TreeIter,
}

impl Iterator for Traverse<'_> {
    type Item = (EventType, NodeId);

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next(self.arena)
    }
}

impl AstArena {
    /// Returns a read-only enter/exit traversal of the subtree under `root`.
    pub fn traverse(&self, root: NodeId) -> Traverse<'_> {
        Traverse {
            arena: self,
            iter: TreeIter::new(root),
        }
    }

    /// Returns every node under (and including) `root` in preorder.
    pub fn descendants(&self, root: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.traverse(root)
            .filter(|(event, _)| *event == EventType::Enter)
            .map(|(_, node)| node)
    }
}
