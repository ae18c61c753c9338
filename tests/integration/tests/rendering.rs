//! Integration tests for the canonical markup renderer.

mod common;

use common::{child, init_tracing, parse};
use pretty_assertions::assert_eq;
use quire::{
    AstArena, ListType, NodeType, Options, SerializeTree, parse_document, render_commonmark,
};
use rstest::rstest;
use serde_json::{Value, json};

fn render(text: &str, width: usize) -> String {
    let (arena, doc) = parse(text);
    render_commonmark(&arena, doc, Options::DEFAULT, width)
}

/// Payload fields that record how a block was written, not what it holds.
const PRESENTATION_FIELDS: [&str; 8] = [
    "bullet_char",
    "marker_offset",
    "padding",
    "setext",
    "fenced",
    "fence_char",
    "fence_length",
    "fence_offset",
];

/// The parsed tree of `text` as JSON, without presentation fields.
///
/// With `fold_breaks`, soft breaks become spaces and adjacent text merges,
/// since wrapping moves line breaks around.
fn tree_shape(text: &str, fold_breaks: bool) -> Value {
    let (arena, doc) = parse(text);
    let mut value = serde_json::to_value(SerializeTree::new(&arena, doc)).unwrap();
    normalize(&mut value, fold_breaks);
    value
}

fn normalize(node: &mut Value, fold_breaks: bool) {
    if let Some(data) = node.get_mut("data").and_then(Value::as_object_mut) {
        for field in PRESENTATION_FIELDS {
            data.remove(field);
        }
    }
    let Some(children) = node.get_mut("children").and_then(Value::as_array_mut) else {
        return;
    };
    let mut merged: Vec<Value> = Vec::with_capacity(children.len());
    for mut child in children.drain(..) {
        normalize(&mut child, fold_breaks);
        if fold_breaks && child["type"] == "softbreak" {
            child = json!({ "type": "text", "data": " ", "children": [] });
        }
        match merged.last_mut() {
            Some(last) if fold_breaks && last["type"] == "text" && child["type"] == "text" => {
                let joined = format!(
                    "{}{}",
                    last["data"].as_str().unwrap_or_default(),
                    child["data"].as_str().unwrap_or_default()
                );
                last["data"] = Value::String(joined);
            }
            _ => merged.push(child),
        }
    }
    *children = merged;
}

#[rstest]
#[case::link_text_starting_with_url("[http://a.com*x*](http://a.com)\n")]
#[case::space_only_code_span("` `\n")]
#[case::padded_code_spans("`a` `` b`c `` ``  y ``\n")]
#[case::trailing_nbsp("a&nbsp;\n")]
#[case::entities("AT&amp;T &copy; &#35; &lt;x&gt; caf\u{e9}\n")]
#[case::spoiler("::: spoiler Title\nhidden *text* here\n:::\n")]
#[case::nested_lists("- a\n  - b\n    1. c\n    2. d\n- e\n")]
#[case::quoted_list("> - a\n> - b\n>\n> para\n")]
#[case::headings("Title\n=====\n\n## Sub *em*\n")]
#[case::code_after_list("- a\n\n```\ncode\n```\n")]
#[case::indented_code("    fn main() {}\n")]
#[case::autolinks("<http://x.y> <me@x.y>\n")]
#[case::links("[a *b*](/u \"t\") ![i](/p)\n")]
#[case::mlem_inlines("~~s~~ ^p^ ~b~ **strong**\n")]
#[case::hard_breaks("a  \nb\\\nc\n")]
#[case::block_starters("Lorem ipsum dolor sit amet 1984 - done + more = all: 2. x\n")]
#[case::thematic_break("a\n\n***\n\nb\n")]
fn round_trip_preserves_tree(#[values(0, 20)] width: usize, #[case] input: &str) {
    init_tracing();
    let rendered = render(input, width);
    let fold_breaks = width > 0;
    assert_eq!(
        tree_shape(&rendered, fold_breaks),
        tree_shape(input, fold_breaks),
        "rendered as {rendered:?}"
    );
}

#[rstest]
#[case::headings("# Title\n\nSome *emph* and **strong** text.\n\nSub\n---\n")]
#[case::quote("> quote\n> more\n>\n> > nested\n")]
#[case::loose_ordered("1. one\n2. two\n\n   nested para\n")]
#[case::nested_bullets("- a\n  - b\n    - c\n")]
#[case::adjacent_lists("- a\n- b\n\n* c\n\n+ d\n")]
#[case::fenced("```js\nlet x = 1;\n```\n")]
#[case::item_continuation("- a\n\n    more\n")]
#[case::spoiler("::: spoiler Title\nhidden *words*\n:::\n")]
#[case::links("[link](http://x.com \"t\") ![img](a.png) <http://auto.link>\n")]
#[case::mlem_inlines("~~s~~ ^p^ ~b~ `code`\n")]
#[case::escapes("a\\*b\\_c \\# 1\\. x\n")]
#[case::breaks("hard  \nsoft\nend\n\n---\n")]
fn rendering_is_stable(#[case] input: &str) {
    init_tracing();
    let first = render(input, 0);
    let second = render(&first, 0);
    assert_eq!(first, second);
}

#[rstest]
#[case(20)]
#[case(30)]
#[case(72)]
fn wrapped_output_is_stable(#[case] width: usize) {
    let input = "- Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do \
                 eiusmod tempor incididunt ut labore et dolore magna aliqua.\n\n\
                 > Ut enim ad minim veniam, quis nostrud exercitation ullamco \
                 laboris nisi ut aliquip ex ea commodo consequat. 1984 was a year.\n";
    let first = render(input, width);
    assert!(first.lines().count() > 4);
    assert_eq!(render(&first, width), first);
}

#[test]
fn wrapping_under_block_prefixes() {
    let input = "> \\- foo *bar* \\*bar\\*\n\n\
                 - Lorem ipsum dolor sit amet,\n  consectetur adipiscing elit,\n\
                 - sed do eiusmod tempor incididunt\n  ut labore et dolore magna aliqua.\n";
    assert_eq!(
        render(input, 26),
        "> \\- foo *bar* \\*bar\\*\n\
         \n  - Lorem ipsum dolor sit\n    amet, consectetur\n    adipiscing elit,\n\
         \x20 - sed do eiusmod tempor\n    incididunt ut labore\n    et dolore magna\n\
         \x20   aliqua.\n"
    );
}

#[test]
fn rendering_a_subtree() {
    let (arena, doc) = parse("> a *b*\n\nc\n");
    let quote = child(&arena, doc, 0);
    let para = child(&arena, quote, 0);
    assert_eq!(render_commonmark(&arena, para, Options::DEFAULT, 0), "a *b*\n");
    assert_eq!(render_commonmark(&arena, quote, Options::DEFAULT, 0), "> a *b*\n");
}

#[test]
fn rendering_after_edits() {
    init_tracing();
    let mut arena = AstArena::new();
    let doc = parse_document(&mut arena, "# Title\n\n* a\n* b\n", Options::DEFAULT);
    let heading = child(&arena, doc, 0);
    let list = child(&arena, doc, 1);

    arena.set_heading_level(heading, 3).unwrap();
    arena.set_list_type(list, ListType::Ordered).unwrap();
    arena.set_list_start(list, 7).unwrap();

    assert_eq!(
        render_commonmark(&arena, doc, Options::DEFAULT, 0),
        "### Title\n\n7.  a\n8.  b\n"
    );
}

#[test]
fn rendering_a_built_tree() {
    let mut arena = AstArena::new();
    let doc = arena.new_node(NodeType::Document);
    let para = arena.new_node(NodeType::Paragraph);
    let strike = arena.new_node(NodeType::Strikethrough);
    let text = arena.new_node(NodeType::Text);
    arena.set_literal(text, "Hello").unwrap();
    arena.append_child(doc, para).unwrap();
    arena.append_child(para, strike).unwrap();
    arena.append_child(strike, text).unwrap();

    assert_eq!(arena.check(doc), 0);
    assert_eq!(render_commonmark(&arena, doc, Options::DEFAULT, 0), "~~Hello~~\n");
}

#[test]
fn rendering_a_lone_inline() {
    let mut arena = AstArena::new();
    let text = arena.new_node(NodeType::Text);
    arena.set_literal(text, "Hi").unwrap();
    assert_eq!(render_commonmark(&arena, text, Options::DEFAULT, 0), "Hi\n");
}

#[test]
fn items_parsed_into_a_built_list() {
    init_tracing();
    let mut arena = AstArena::new();
    let doc = arena.new_node(NodeType::Document);
    let list = arena.new_node(NodeType::List);
    arena.append_child(doc, list).unwrap();

    for input in [
        "Hello &ldquo; <http://www.google.com>\n",
        "Bye &ldquo; <http://www.geocities.com>\n",
    ] {
        let item = arena.new_node(NodeType::Item);
        arena.append_child(list, item).unwrap();
        let mut parser = quire::Parser::with_root(&mut arena, item, Options::DEFAULT);
        parser.feed(input);
        parser.finish();
    }

    assert_eq!(arena.check(doc), 0);
    assert_eq!(
        render_commonmark(&arena, doc, Options::DEFAULT, 0),
        "  - Hello \u{201c} <http://www.google.com>\n\n\
         \x20 - Bye \u{201c} <http://www.geocities.com>\n"
    );
}
