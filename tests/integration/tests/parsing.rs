//! Integration tests for the block and inline parser.

mod common;

use common::{child, init_tracing, parse};
use pretty_assertions::assert_eq;
use quire::{AstArena, NodeType, Options, ParseError, Parser, parse_reader};
use rstest::rstest;

#[test]
fn feed_across_line_ending() {
    init_tracing();
    let mut arena = AstArena::new();
    let mut parser = Parser::new(&mut arena, Options::DEFAULT);
    parser.feed("line1\r");
    parser.feed("\nline2\r\n");
    let doc = parser.finish();

    assert_eq!(arena.children(doc).count(), 1);
    let para = child(&arena, doc, 0);
    let kinds: Vec<_> = arena
        .children(para)
        .map(|n| arena.node_type(n))
        .collect();
    assert_eq!(
        kinds,
        vec![
            Some(NodeType::Text),
            Some(NodeType::SoftBreak),
            Some(NodeType::Text)
        ]
    );
}

#[rstest]
#[case::inlines("Hello *world*\n\n> quote\n")]
#[case::crlf("- a\r\n- b\r\n\r\n```\r\ncode\r\n```\r\n")]
#[case::multibyte("caf\u{e9} \u{1f600}\n")]
fn feeding_bytes_one_at_a_time_matches_whole_parse(#[case] input: &str) {
    init_tracing();
    let (whole_arena, whole_doc) = parse(input);

    let mut arena = AstArena::new();
    let mut parser = Parser::new(&mut arena, Options::DEFAULT);
    for byte in input.as_bytes() {
        parser.feed([*byte]);
    }
    let doc = parser.finish();

    assert_eq!(
        quire::render_commonmark(&arena, doc, Options::DEFAULT, 0),
        quire::render_commonmark(&whole_arena, whole_doc, Options::DEFAULT, 0)
    );
}

#[test]
fn strike_super_and_sub() {
    let (arena, doc) = parse("~~one~~^two^~three~\n");
    let paragraph = child(&arena, doc, 0);

    let strike = child(&arena, paragraph, 0);
    let sup = child(&arena, paragraph, 1);
    let sub = child(&arena, paragraph, 2);
    assert_eq!(arena.node_type(strike), Some(NodeType::Strikethrough));
    assert_eq!(arena.node_type(sup), Some(NodeType::Superscript));
    assert_eq!(arena.node_type(sub), Some(NodeType::Subscript));

    assert_eq!(arena.literal(child(&arena, strike, 0)), Some("one"));
    assert_eq!(arena.literal(child(&arena, sup, 0)), Some("two"));
    assert_eq!(arena.literal(child(&arena, sub, 0)), Some("three"));
}

#[test]
fn sub_nested_in_strike() {
    let (arena, doc) = parse("~~one ~two~ three~~\n");
    let paragraph = child(&arena, doc, 0);
    let strike = child(&arena, paragraph, 0);
    assert_eq!(arena.node_type(strike), Some(NodeType::Strikethrough));

    let sub = child(&arena, strike, 1);
    assert_eq!(arena.node_type(sub), Some(NodeType::Subscript));
    assert_eq!(arena.literal(child(&arena, sub, 0)), Some("two"));
}

#[test]
fn spoiler_block() {
    let (arena, doc) = parse(
        "## Header\n\
         \n\
         :::   spoiler   spoiler_title\n\
         *fenced*\n\
         :::\n\
         \n\
         Bottom text\n",
    );

    let heading = child(&arena, doc, 0);
    let spoiler = child(&arena, doc, 1);
    assert_eq!(arena.node_type(heading), Some(NodeType::Heading));
    assert_eq!(arena.node_type(spoiler), Some(NodeType::SpoilerBlock));
    assert_eq!(arena.title(spoiler), Some("spoiler_title"));
    assert_eq!(arena.end_line(spoiler), Some(5));

    let emph = child(&arena, spoiler, 0);
    assert_eq!(arena.node_type(emph), Some(NodeType::Emph));
    assert_eq!(arena.literal(child(&arena, emph, 0)), Some("fenced"));

    let bottom = child(&arena, doc, 2);
    assert_eq!(arena.node_type(bottom), Some(NodeType::Paragraph));
}

#[rstest]
#[case::two_byte(b"\xC2\x80")]
#[case::three_byte(b"\xE0\xA0\x80")]
#[case::four_byte(b"\xF0\x90\x80\x80")]
fn broken_continuation_bytes_are_replaced(#[case] sequence: &[u8]) {
    init_tracing();
    for pos in 1..sequence.len() {
        let mut input = b"((((".to_vec();
        input.extend_from_slice(sequence);
        input.extend_from_slice(b"))))");
        input[4 + pos] = b' ';

        let mut arena = AstArena::new();
        let mut parser = Parser::new(&mut arena, Options::DEFAULT);
        parser.feed(&input);
        let doc = parser.finish();

        let expected = format!(
            "((((\u{fffd} {}))))",
            "\u{fffd}".repeat(sequence.len() - pos - 1)
        );
        let para = child(&arena, doc, 0);
        assert_eq!(arena.literal(child(&arena, para, 0)), Some(expected.as_str()));
    }
}

#[test]
fn parse_into_existing_item() {
    init_tracing();
    let mut arena = AstArena::new();
    let doc = arena.new_node(NodeType::Document);
    let list = arena.new_node(NodeType::List);
    let item = arena.new_node(NodeType::Item);
    arena.append_child(doc, list).unwrap();
    arena.append_child(list, item).unwrap();

    let mut parser = Parser::with_root(&mut arena, item, Options::DEFAULT);
    parser.feed("Hello &ldquo; <http://www.google.com>\n");
    let root = parser.finish();
    assert_eq!(root, item);

    let para = child(&arena, item, 0);
    let text = child(&arena, para, 0);
    let link = child(&arena, para, 1);
    assert_eq!(arena.literal(text), Some("Hello \u{201c} "));
    assert_eq!(arena.url(link), Some("http://www.google.com"));
    assert_eq!(arena.check(doc), 0);
}

#[test]
fn parse_reader_reads_everything() {
    init_tracing();
    let mut arena = AstArena::new();
    let input: &[u8] = b"# Title\n\nbody\n";
    let doc = parse_reader(&mut arena, input, Options::DEFAULT).unwrap();
    assert_eq!(arena.children(doc).count(), 2);
}

#[test]
fn parse_reader_reports_io_errors() {
    struct Failing;

    impl std::io::Read for Failing {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk on fire"))
        }
    }

    let mut arena = AstArena::new();
    let err = parse_reader(&mut arena, Failing, Options::DEFAULT).unwrap_err();
    assert!(matches!(err, ParseError::Io(_)));
}

#[test]
fn smart_punctuation() {
    init_tracing();
    let mut arena = AstArena::new();
    let doc = quire::parse_document(&mut arena, "\"Hi\" -- it's...\n", Options::SMART);
    let para = child(&arena, doc, 0);
    assert_eq!(
        arena.literal(child(&arena, para, 0)),
        Some("\u{201c}Hi\u{201d} \u{2013} it\u{2019}s\u{2026}")
    );
}
