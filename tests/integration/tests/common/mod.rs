//! Helpers shared by the integration tests.

#![allow(dead_code)]

use quire::{AstArena, NodeId, NodeType, Options, parse_document};
use tracing_subscriber::EnvFilter;

/// Routes engine logs to the test output. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Parses `text` with default options into a fresh arena.
pub fn parse(text: &str) -> (AstArena, NodeId) {
    init_tracing();
    let mut arena = AstArena::new();
    let doc = parse_document(&mut arena, text, Options::DEFAULT);
    (arena, doc)
}

/// Creates a text node holding `literal`.
pub fn text(arena: &mut AstArena, literal: &str) -> NodeId {
    let node = arena.new_node(NodeType::Text);
    arena
        .set_literal(node, literal)
        .expect("text nodes carry a literal");
    node
}

/// Returns the `n`th child of `node`.
pub fn child(arena: &AstArena, node: NodeId, n: usize) -> NodeId {
    arena
        .children(node)
        .nth(n)
        .unwrap_or_else(|| panic!("{node} has no child {n}"))
}
