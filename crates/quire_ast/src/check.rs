//! Structural consistency checking.

use tracing::debug;

use crate::{AstArena, NodeId};

impl AstArena {
    /// Walks the subtree under `root` and repairs inconsistent links.
    ///
    /// Checks, for every node, that its first child has no previous sibling and
    /// points back to it, that sibling links are symmetric and share a parent,
    /// and that the parent's last-child link names the final sibling. Returns
    /// the number of links that had to be rewritten, so a second call on the
    /// same tree returns 0.
    pub fn check(&mut self, root: NodeId) -> usize {
        if !self.contains(root) {
            return 0;
        }
        let mut errors = 0;
        let mut cur = root;
        'descend: loop {
            if let Some(child) = self.first_child(cur).filter(|c| self.contains(*c)) {
                if let Some(links) = self.links_mut(child) {
                    if links.prev.is_some() {
                        report(child, "prev");
                        links.prev = None;
                        errors += 1;
                    }
                    if links.parent != Some(cur) {
                        report(child, "parent");
                        links.parent = Some(cur);
                        errors += 1;
                    }
                }
                cur = child;
                continue;
            }

            loop {
                if cur == root {
                    break 'descend;
                }
                let parent = self.parent(cur);
                if let Some(next) = self.next(cur).filter(|n| self.contains(*n)) {
                    if let Some(links) = self.links_mut(next) {
                        if links.prev != Some(cur) {
                            report(next, "prev");
                            links.prev = Some(cur);
                            errors += 1;
                        }
                        if links.parent != parent {
                            report(next, "parent");
                            links.parent = parent;
                            errors += 1;
                        }
                    }
                    cur = next;
                    continue 'descend;
                }
                let Some(parent) = parent else {
                    break 'descend;
                };
                if let Some(links) = self.links_mut(parent) {
                    if links.last_child != Some(cur) {
                        report(parent, "last_child");
                        links.last_child = Some(cur);
                        errors += 1;
                    }
                }
                cur = parent;
            }
        }
        errors
    }
}

fn report(node: NodeId, field: &str) {
    debug!(%node, field, "repaired invalid link");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeType;

    #[test]
    fn test_check_repairs_hand_wired_tree() {
        let mut arena = AstArena::new();
        let doc = arena.new_node(NodeType::Document);
        let p1 = arena.new_node(NodeType::Paragraph);
        let p2 = arena.new_node(NodeType::Paragraph);
        arena.links_mut(doc).unwrap().first_child = Some(p1);
        arena.links_mut(p1).unwrap().next = Some(p2);

        assert_eq!(arena.check(doc), 4);
        assert_eq!(arena.check(doc), 0);
        assert_eq!(arena.parent(p2), Some(doc));
        assert_eq!(arena.previous(p2), Some(p1));
        assert_eq!(arena.last_child(doc), Some(p2));
    }

    #[test]
    fn test_check_accepts_api_built_tree() {
        let mut arena = AstArena::new();
        let doc = arena.new_node(NodeType::Document);
        let quote = arena.new_node(NodeType::BlockQuote);
        let para = arena.new_node(NodeType::Paragraph);
        let emph = arena.new_node(NodeType::Emph);
        let text = arena.new_node(NodeType::Text);
        arena.append_child(doc, quote).unwrap();
        arena.append_child(quote, para).unwrap();
        arena.append_child(para, emph).unwrap();
        arena.append_child(emph, text).unwrap();

        assert_eq!(arena.check(doc), 0);
    }

    #[test]
    fn test_check_stale_root() {
        let mut arena = AstArena::new();
        let doc = arena.new_node(NodeType::Document);
        arena.free(doc);
        assert_eq!(arena.check(doc), 0);
    }
}
