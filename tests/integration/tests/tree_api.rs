//! Integration tests for building, inspecting and mutating trees.

mod common;

use common::{child, parse, text};
use pretty_assertions::assert_eq;
use quire::{
    ALL_INLINES, AstArena, ListDelimType, ListType, NodeType, TOP_LEVEL_BLOCKS, TreeError,
};

const ACCESSORS_DOC: &str = "## Header\n\
                             \n\
                             * Item 1\n\
                             * Item 2\n\
                             \n\
                             2. Item 1\n\
                             \n\
                             3. Item 2\n\
                             \n\
                             ``` lang\n\
                             fenced\n\
                             ```\n    code\n\
                             \n\
                             [link](url 'title')\n";

mod accessors {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn getters_read_parsed_values() {
        let (arena, doc) = parse(ACCESSORS_DOC);

        let heading = child(&arena, doc, 0);
        assert_eq!(arena.heading_level(heading), Some(2));

        let bullet_list = child(&arena, doc, 1);
        assert_eq!(arena.list_type(bullet_list), Some(ListType::Bullet));
        assert_eq!(arena.list_tight(bullet_list), Some(true));

        let ordered_list = child(&arena, doc, 2);
        assert_eq!(arena.list_type(ordered_list), Some(ListType::Ordered));
        assert_eq!(arena.list_delim(ordered_list), Some(ListDelimType::Period));
        assert_eq!(arena.list_start(ordered_list), Some(2));
        assert_eq!(arena.list_tight(ordered_list), Some(false));

        let fenced = child(&arena, doc, 3);
        assert_eq!(arena.literal(fenced), Some("fenced\n"));
        assert_eq!(arena.fence_info(fenced), Some("lang"));

        let code = child(&arena, doc, 4);
        assert_eq!(arena.literal(code), Some("code\n"));

        let paragraph = child(&arena, doc, 5);
        assert_eq!(arena.start_line(paragraph), Some(15));
        assert_eq!(arena.start_column(paragraph), Some(1));
        assert_eq!(arena.end_line(paragraph), Some(15));

        let link = child(&arena, paragraph, 0);
        assert_eq!(arena.url(link), Some("url"));
        assert_eq!(arena.title(link), Some("title"));

        let string = child(&arena, link, 0);
        assert_eq!(arena.literal(string), Some("link"));
    }

    #[test]
    fn setters_update_values() {
        let (mut arena, doc) = parse(ACCESSORS_DOC);
        let heading = child(&arena, doc, 0);
        let bullet_list = child(&arena, doc, 1);
        let ordered_list = child(&arena, doc, 2);
        let fenced = child(&arena, doc, 3);
        let code = child(&arena, doc, 4);
        let link = child(&arena, child(&arena, doc, 5), 0);
        let string = child(&arena, link, 0);

        arena.set_heading_level(heading, 3).unwrap();
        arena.set_list_type(bullet_list, ListType::Ordered).unwrap();
        arena.set_list_delim(bullet_list, ListDelimType::Paren).unwrap();
        arena.set_list_start(bullet_list, 3).unwrap();
        arena.set_list_tight(bullet_list, false).unwrap();
        arena.set_list_type(ordered_list, ListType::Bullet).unwrap();
        arena.set_list_tight(ordered_list, true).unwrap();
        arena.set_literal(code, "CODE\n").unwrap();
        arena.set_literal(fenced, "FENCED\n").unwrap();
        arena.set_fence_info(fenced, "LANG").unwrap();
        arena.set_url(link, "URL").unwrap();
        arena.set_title(link, "TITLE").unwrap();
        arena.set_literal(string, "prefix-LINK").unwrap();

        assert_eq!(arena.heading_level(heading), Some(3));
        assert_eq!(arena.list_type(bullet_list), Some(ListType::Ordered));
        assert_eq!(arena.list_delim(bullet_list), Some(ListDelimType::Paren));
        assert_eq!(arena.list_start(bullet_list), Some(3));
        assert_eq!(arena.list_tight(bullet_list), Some(false));
        assert_eq!(arena.list_type(ordered_list), Some(ListType::Bullet));
        assert_eq!(arena.list_tight(ordered_list), Some(true));
        assert_eq!(arena.literal(code), Some("CODE\n"));
        assert_eq!(arena.literal(fenced), Some("FENCED\n"));
        assert_eq!(arena.fence_info(fenced), Some("LANG"));
        assert_eq!(arena.url(link), Some("URL"));
        assert_eq!(arena.title(link), Some("TITLE"));

        // A literal can be replaced by a slice of itself.
        let suffix = arena.literal(string).unwrap()["prefix-".len()..].to_string();
        arena.set_literal(string, suffix).unwrap();
        assert_eq!(arena.literal(string), Some("LINK"));
    }

    #[test]
    fn getters_on_wrong_type_return_none() {
        let (arena, doc) = parse(ACCESSORS_DOC);
        let heading = child(&arena, doc, 0);
        let bullet_list = child(&arena, doc, 1);
        let ordered_list = child(&arena, doc, 2);
        let fenced = child(&arena, doc, 3);
        let code = child(&arena, doc, 4);
        let paragraph = child(&arena, doc, 5);

        assert_eq!(arena.heading_level(bullet_list), None);
        assert_eq!(arena.list_type(heading), None);
        assert_eq!(arena.list_start(code), None);
        assert_eq!(arena.list_tight(fenced), None);
        assert_eq!(arena.literal(ordered_list), None);
        assert_eq!(arena.fence_info(paragraph), None);
        assert_eq!(arena.title(heading), None);
    }

    #[test]
    fn setters_reject_wrong_type_and_range() {
        let (mut arena, doc) = parse(ACCESSORS_DOC);
        let heading = child(&arena, doc, 0);
        let bullet_list = child(&arena, doc, 1);
        let ordered_list = child(&arena, doc, 2);
        let fenced = child(&arena, doc, 3);
        let code = child(&arena, doc, 4);
        let paragraph = child(&arena, doc, 5);

        let wrong_type = |result: Result<(), TreeError>| {
            assert!(matches!(result, Err(TreeError::WrongType { .. })), "{result:?}");
        };
        wrong_type(arena.set_heading_level(bullet_list, 3));
        wrong_type(arena.set_list_type(heading, ListType::Ordered));
        wrong_type(arena.set_list_start(code, 3));
        wrong_type(arena.set_list_tight(fenced, false));
        wrong_type(arena.set_literal(ordered_list, "content\n"));
        wrong_type(arena.set_fence_info(paragraph, "lang"));
        wrong_type(arena.set_title(heading, "title"));

        let out_of_range = |result: Result<(), TreeError>| {
            assert!(matches!(result, Err(TreeError::OutOfRange { .. })), "{result:?}");
        };
        out_of_range(arena.set_heading_level(heading, 0));
        out_of_range(arena.set_heading_level(heading, 7));
        out_of_range(arena.set_list_start(bullet_list, -1));

        // Rejected setters leave the values alone.
        assert_eq!(arena.heading_level(heading), Some(2));
        assert_eq!(arena.list_start(bullet_list), Some(1));
    }
}

#[test]
fn inline_survives_freeing_its_former_parent() {
    let (mut arena, doc) = parse("text\n");
    let para = child(&arena, doc, 0);
    let string = child(&arena, para, 0);

    arena.unlink(string);
    arena.free(doc);

    assert!(!arena.contains(doc));
    assert!(!arena.contains(para));
    assert_eq!(arena.literal(string), Some("text"));
    arena.free(string);
    assert!(arena.is_empty());
}

#[test]
fn check_repairs_then_accepts() {
    let mut arena = AstArena::new();
    let doc = arena.new_node(NodeType::Document);
    let p1 = arena.new_node(NodeType::Paragraph);
    let p2 = arena.new_node(NodeType::Paragraph);
    arena.links_mut(doc).unwrap().first_child = Some(p1);
    arena.links_mut(p1).unwrap().next = Some(p2);

    assert_eq!(arena.check(doc), 4);
    assert_eq!(arena.check(doc), 0);
}

#[test]
fn create_tree() {
    let mut arena = AstArena::new();
    let doc = arena.new_node(NodeType::Document);
    let p = arena.new_node(NodeType::Paragraph);

    assert_eq!(arena.insert_before(doc, p), Err(TreeError::NoParent(doc)));
    assert_eq!(arena.insert_after(doc, p), Err(TreeError::NoParent(doc)));

    arena.append_child(doc, p).unwrap();
    assert_eq!(arena.check(doc), 0);
    assert_eq!(arena.parent(p), Some(doc));

    let emph = arena.new_node(NodeType::Emph);
    arena.prepend_child(p, emph).unwrap();
    assert_eq!(arena.check(doc), 0);

    let str1 = text(&mut arena, "Hello, ");
    arena.prepend_child(p, str1).unwrap();
    assert_eq!(arena.check(doc), 0);

    let str3 = text(&mut arena, "!");
    arena.append_child(p, str3).unwrap();
    assert_eq!(arena.check(doc), 0);

    let str2 = text(&mut arena, "world");
    arena.append_child(emph, str2).unwrap();
    assert_eq!(arena.check(doc), 0);

    arena.insert_before(str1, str3).unwrap();
    assert_eq!(arena.check(doc), 0);
    assert_eq!(arena.first_child(p), Some(str3));

    arena.insert_before(str1, emph).unwrap();
    assert_eq!(arena.check(doc), 0);
    assert_eq!(arena.last_child(p), Some(str1));

    arena.insert_after(str1, str3).unwrap();
    assert_eq!(arena.check(doc), 0);
    assert_eq!(arena.next(str1), Some(str3));

    arena.insert_after(str1, emph).unwrap();
    assert_eq!(arena.check(doc), 0);
    assert_eq!(arena.previous(emph), Some(str1));

    let str4 = text(&mut arena, "brzz");
    arena.replace(str1, str4).unwrap();
    // The replaced node is detached, not freed.
    assert!(arena.contains(str1));
    assert_eq!(arena.parent(str1), None);
    arena.free(str1);

    assert_eq!(arena.check(doc), 0);
    assert_eq!(arena.previous(emph), Some(str4));
    assert!(arena.replace(p, str4).is_err());
    assert_eq!(arena.parent(str4), Some(p));

    arena.unlink(emph);
    arena.free(doc);
    assert!(arena.contains(emph));
    assert!(arena.contains(str2));
    arena.free(emph);
    assert!(arena.is_empty());
}

#[test]
fn custom_nodes() {
    let mut arena = AstArena::new();
    let doc = arena.new_node(NodeType::Document);
    let p = arena.new_node(NodeType::Paragraph);
    arena.append_child(doc, p).unwrap();

    let ci = arena.new_node(NodeType::CustomInline);
    let str1 = text(&mut arena, "Hello");
    arena.append_child(ci, str1).unwrap();
    arena.set_on_enter(ci, "<ON ENTER|").unwrap();
    arena.set_on_exit(ci, "|ON EXIT>").unwrap();
    assert_eq!(arena.on_enter(ci), Some("<ON ENTER|"));
    assert_eq!(arena.on_exit(ci), Some("|ON EXIT>"));
    arena.append_child(p, ci).unwrap();

    let cb = arena.new_node(NodeType::CustomBlock);
    arena.set_on_enter(cb, "<on enter|").unwrap();
    assert_eq!(arena.on_exit(cb), Some(""));
    arena.append_child(doc, cb).unwrap();

    assert_eq!(arena.check(doc), 0);
    assert!(arena.set_on_enter(p, "nope").is_err());
}

mod hierarchy {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cycles_are_rejected() {
        let mut arena = AstArena::new();
        let bquote1 = arena.new_node(NodeType::BlockQuote);
        let bquote2 = arena.new_node(NodeType::BlockQuote);
        let bquote3 = arena.new_node(NodeType::BlockQuote);

        arena.append_child(bquote1, bquote2).unwrap();
        arena.append_child(bquote2, bquote3).unwrap();
        assert_eq!(
            arena.append_child(bquote3, bquote3),
            Err(TreeError::Cycle(bquote3))
        );
        assert_eq!(
            arena.append_child(bquote3, bquote1),
            Err(TreeError::Cycle(bquote1))
        );
        assert_eq!(arena.check(bquote1), 0);

        arena.free(bquote1);
        assert!(arena.is_empty());
    }

    #[test]
    fn allowed_children_matrix() {
        let every_type = NodeType::ALL.iter().fold(0, |mask, t| mask | t.mask());
        let expectations: [(NodeType, u32); 22] = [
            (NodeType::Document, TOP_LEVEL_BLOCKS),
            (NodeType::BlockQuote, TOP_LEVEL_BLOCKS),
            (NodeType::List, NodeType::Item.mask()),
            (NodeType::Item, TOP_LEVEL_BLOCKS),
            (NodeType::CodeBlock, 0),
            (NodeType::SpoilerBlock, ALL_INLINES),
            (NodeType::Paragraph, ALL_INLINES),
            (NodeType::Heading, ALL_INLINES),
            (NodeType::ThematicBreak, 0),
            (NodeType::CustomBlock, every_type & !NodeType::Document.mask()),
            (NodeType::Text, 0),
            (NodeType::SoftBreak, 0),
            (NodeType::LineBreak, 0),
            (NodeType::Code, 0),
            (NodeType::Emph, ALL_INLINES),
            (NodeType::Strong, ALL_INLINES),
            (NodeType::Superscript, ALL_INLINES),
            (NodeType::Subscript, ALL_INLINES),
            (NodeType::Strikethrough, ALL_INLINES),
            (NodeType::Link, ALL_INLINES),
            (NodeType::Image, ALL_INLINES),
            (NodeType::CustomInline, ALL_INLINES),
        ];

        let mut arena = AstArena::new();
        for (parent_type, allowed) in expectations {
            let parent = arena.new_node(parent_type);
            for child_type in NodeType::ALL {
                let node = arena.new_node(child_type);
                let got = arena.append_child(parent, node).is_ok();
                assert_eq!(
                    got,
                    allowed & child_type.mask() != 0,
                    "{child_type} as child of {parent_type}"
                );
                arena.free(node);
            }
            arena.free(parent);
        }
        assert!(arena.is_empty());
    }
}
