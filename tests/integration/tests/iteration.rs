//! Integration tests for enter/exit traversal.

mod common;

use common::{child, parse};
use pretty_assertions::assert_eq;
use quire::{EventType, NodeType, Options, TreeIter, render_commonmark};

#[test]
fn counts_paragraph_entries() {
    let (arena, doc) = parse("> a *b*\n\nc");
    let paragraphs = arena
        .traverse(doc)
        .filter(|&(event, node)| {
            event == EventType::Enter && arena.node_type(node) == Some(NodeType::Paragraph)
        })
        .count();
    assert_eq!(paragraphs, 2);
}

#[test]
fn events_are_balanced() {
    let (arena, doc) = parse("# a\n\n- b *c*\n- d\n\n> e\n");
    let mut depth = 0usize;
    let mut max_depth = 0;
    for (event, _) in arena.traverse(doc) {
        match event {
            EventType::Enter => {
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            EventType::Exit => depth -= 1,
        }
    }
    assert_eq!(depth, 0);
    // document > list > item > paragraph > emph > text
    assert_eq!(max_depth, 6);
}

#[test]
fn freeing_nodes_during_traversal() {
    let (mut arena, doc) = parse(
        "a *b* c\n\
         \n\
         * item1\n\
         * item2\n\
         \n\
         a `b` c\n\
         \n\
         * item1\n\
         * item2\n",
    );

    let mut iter = TreeIter::new(doc);
    while let Some((event, node)) = iter.next(&arena) {
        let node_type = arena.node_type(node);
        let delete = matches!(
            (event, node_type),
            (EventType::Exit, Some(NodeType::List))
                | (EventType::Exit, Some(NodeType::Emph))
                | (EventType::Enter, Some(NodeType::Code))
        );
        if delete {
            arena.free(node);
        }
    }

    assert_eq!(arena.check(doc), 0);
    assert_eq!(arena.children(doc).count(), 2);
    assert_eq!(
        render_commonmark(&arena, doc, Options::DEFAULT, 0),
        "a  c\n\na  c\n"
    );
}

#[test]
fn reset_to_exit_skips_children() {
    let (arena, doc) = parse("*a* b\n");
    let para = child(&arena, doc, 0);
    let emph = child(&arena, para, 0);

    let mut iter = TreeIter::new(doc);
    let mut seen = Vec::new();
    while let Some((event, node)) = iter.next(&arena) {
        seen.push((event, arena.node_type(node)));
        if node == emph && event == EventType::Enter {
            iter.reset(&arena, emph, EventType::Exit);
        }
    }

    assert_eq!(
        seen,
        vec![
            (EventType::Enter, Some(NodeType::Document)),
            (EventType::Enter, Some(NodeType::Paragraph)),
            (EventType::Enter, Some(NodeType::Emph)),
            (EventType::Enter, Some(NodeType::Text)),
            (EventType::Exit, Some(NodeType::Text)),
            (EventType::Exit, Some(NodeType::Paragraph)),
            (EventType::Exit, Some(NodeType::Document)),
        ]
    );
}

#[test]
fn iterating_a_subtree_stays_inside_it() {
    let (arena, doc) = parse("a\n\nb\n");
    let first = child(&arena, doc, 0);
    let nodes: Vec<_> = arena.descendants(first).collect();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0], first);
    assert_eq!(arena.literal(nodes[1]), Some("a"));
}
