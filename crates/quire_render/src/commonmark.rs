//! Canonical markup output.

use quire_ast::{
    AstArena, EventType, ListDelimType, ListType, NodeId, NodeType, NodeValue, TreeIter,
};
use quire_parser::{Options, has_scheme};
use tracing::debug;

use crate::writer::{Escaping, Writer};

/// Renders the subtree under `root` as canonical markup.
///
/// `width` is the wrap column; `0` keeps lines as they are in the tree. Any
/// node can be rendered, so a lone inline produces a single line. The output
/// always ends with a newline.
///
/// # Example
///
/// ```rust
/// use quire_ast::AstArena;
/// use quire_parser::{Options, parse_document};
/// use quire_render::render_commonmark;
///
/// let mut arena = AstArena::new();
/// let doc = parse_document(&mut arena, "* one\n* two\n", Options::DEFAULT);
/// assert_eq!(
///     render_commonmark(&arena, doc, Options::DEFAULT, 0),
///     "  - one\n  - two\n"
/// );
/// ```
pub fn render_commonmark(
    arena: &AstArena,
    root: NodeId,
    options: Options,
    width: usize,
) -> String {
    let mut renderer = CommonMark {
        arena,
        options,
        width,
        writer: Writer::new(width),
    };

    let mut iter = TreeIter::new(root);
    while let Some((event, node)) = iter.next(arena) {
        if !renderer.render_node(node, event) {
            iter.reset(arena, node, EventType::Exit);
        }
    }

    let output = renderer.writer.finish();
    debug!(width, bytes = output.len(), "rendered commonmark");
    output
}

struct CommonMark<'a> {
    arena: &'a AstArena,
    options: Options,
    width: usize,
    writer: Writer,
}

impl CommonMark<'_> {
    /// Emits the markup for one event. Returns `false` to skip the children
    /// of an entered node.
    fn render_node(&mut self, node: NodeId, event: EventType) -> bool {
        let arena = self.arena;
        let Some(value) = arena.value(node) else {
            return true;
        };
        let entering = event == EventType::Enter;
        let allow_wrap = self.width > 0
            && !self.options.contains(Options::NOBREAKS)
            && !self.options.contains(Options::HARDBREAKS);

        // The first item keeps the state of the list's surroundings so that
        // a paragraph before a tight list stays separated by a blank line.
        let first_item_entered =
            value.node_type() == NodeType::Item && entering && arena.previous(node).is_none();
        if !first_item_entered {
            self.writer.in_tight_list_item = in_tight_list_item(arena, node);
        }

        let w = &mut self.writer;
        match value {
            NodeValue::Document | NodeValue::List(_) => {}

            NodeValue::BlockQuote => {
                if entering {
                    w.lit("> ");
                    w.begin_content = true;
                    w.prefix.push_str("> ");
                } else {
                    w.dedent(2);
                    w.blankline();
                }
            }

            NodeValue::Item(_) => {
                let marker = item_marker(arena, node);
                if entering {
                    w.lit(&marker);
                    w.begin_content = true;
                    w.indent(marker.len());
                } else {
                    w.dedent(marker.len());
                    w.cr();
                }
            }

            NodeValue::Heading(heading) => {
                if entering {
                    w.lit(&"#".repeat(usize::from(heading.level)));
                    w.lit(" ");
                    w.begin_content = true;
                    w.no_linebreaks = true;
                } else {
                    w.no_linebreaks = false;
                    w.blankline();
                }
            }

            NodeValue::CodeBlock(code) if entering => {
                let leads_item = first_in_item(arena, node);
                let after_list = arena.previous(node).and_then(|prev| arena.node_type(prev))
                    == Some(NodeType::List);
                if !leads_item {
                    w.blankline();
                }

                let literal = code.literal.as_str();
                let indented = code.info.is_empty()
                    && literal.len() > 2
                    && !literal.starts_with(|c: char| c.is_ascii_whitespace())
                    && !ends_with_two_spaces(literal)
                    && !leads_item
                    && !after_list;
                if indented {
                    w.lit("    ");
                    w.indent(4);
                    w.out(literal, false, Escaping::Literal);
                    w.dedent(4);
                } else {
                    let fence_char = if code.info.contains('`') { '~' } else { '`' };
                    let fence = fence_char
                        .to_string()
                        .repeat((longest_run(literal, fence_char) + 1).max(3));
                    w.lit(&fence);
                    if !code.info.is_empty() {
                        w.lit(" ");
                        w.out(&code.info, false, Escaping::Literal);
                    }
                    w.cr();
                    w.out(literal, false, Escaping::Literal);
                    w.cr();
                    w.lit(&fence);
                }
                w.blankline();
            }

            NodeValue::SpoilerBlock(spoiler) => {
                if entering {
                    if !first_in_item(arena, node) {
                        w.blankline();
                    }
                    w.lit("::: spoiler");
                    if !spoiler.title.is_empty() {
                        w.lit(" ");
                        w.out(&spoiler.title, false, Escaping::Literal);
                    }
                    w.cr();
                } else {
                    w.cr();
                    w.lit(":::");
                    w.blankline();
                }
            }

            NodeValue::Paragraph => {
                if !entering {
                    w.blankline();
                }
            }

            NodeValue::ThematicBreak if entering => {
                w.blankline();
                w.lit("-----");
                w.blankline();
            }

            NodeValue::CustomBlock(custom) => {
                let text = if entering { &custom.on_enter } else { &custom.on_exit };
                w.blankline();
                w.out(text, false, Escaping::Literal);
                w.blankline();
            }

            NodeValue::Text(text) if entering => {
                w.out(text, allow_wrap, Escaping::Normal);
            }

            NodeValue::LineBreak if entering => {
                if !self.options.contains(Options::HARDBREAKS) {
                    w.lit("  ");
                }
                w.cr();
            }

            NodeValue::SoftBreak if entering => {
                if self.options.contains(Options::HARDBREAKS) {
                    w.lit("  ");
                    w.cr();
                } else if !w.no_linebreaks
                    && self.width == 0
                    && !self.options.contains(Options::NOBREAKS)
                {
                    w.cr();
                } else {
                    w.out(" ", allow_wrap, Escaping::Literal);
                }
            }

            NodeValue::Code(code) if entering => {
                let ticks = "`".repeat(shortest_unused_run(code));
                let all_spaces = !code.is_empty() && code.bytes().all(|b| b == b' ');
                let pad = code.is_empty()
                    || code.starts_with('`')
                    || code.ends_with('`')
                    || (!all_spaces && (code.starts_with(' ') || code.ends_with(' ')));
                w.lit(&ticks);
                if pad {
                    w.lit(" ");
                }
                w.out(code, allow_wrap, Escaping::Literal);
                if pad {
                    w.lit(" ");
                }
                w.lit(&ticks);
            }

            NodeValue::Emph => {
                let nested = arena.parent(node).and_then(|p| arena.node_type(p))
                    == Some(NodeType::Emph)
                    && arena.previous(node).is_none()
                    && arena.next(node).is_none();
                w.lit(if nested { "_" } else { "*" });
            }
            NodeValue::Strong => w.lit("**"),
            NodeValue::Strikethrough => w.lit("~~"),
            NodeValue::Superscript => w.lit("^"),
            NodeValue::Subscript => w.lit("~"),

            NodeValue::Link(link) => {
                if is_autolink(arena, node) {
                    if entering {
                        w.lit("<");
                        w.lit(link.url.strip_prefix("mailto:").unwrap_or(&link.url));
                        w.lit(">");
                        return false;
                    }
                } else if entering {
                    w.lit("[");
                } else {
                    w.lit("](");
                    w.out(&link.url, false, Escaping::Url);
                    if !link.title.is_empty() {
                        w.lit(" \"");
                        w.out(&link.title, false, Escaping::Title);
                        w.lit("\"");
                    }
                    w.lit(")");
                }
            }

            NodeValue::Image(link) => {
                if entering {
                    w.lit("![");
                } else {
                    w.lit("](");
                    w.out(&link.url, false, Escaping::Url);
                    if !link.title.is_empty() {
                        w.out(" \"", allow_wrap, Escaping::Literal);
                        w.out(&link.title, false, Escaping::Title);
                        w.lit("\"");
                    }
                    w.lit(")");
                }
            }

            NodeValue::CustomInline(custom) => {
                let text = if entering { &custom.on_enter } else { &custom.on_exit };
                w.out(text, false, Escaping::Literal);
            }

            // Leaves only act on enter.
            NodeValue::CodeBlock(_)
            | NodeValue::ThematicBreak
            | NodeValue::Text(_)
            | NodeValue::LineBreak
            | NodeValue::SoftBreak
            | NodeValue::Code(_) => {}
        }
        true
    }
}

/// Whether the nearest enclosing block sits in a tight list item.
fn in_tight_list_item(arena: &AstArena, node: NodeId) -> bool {
    let mut block = Some(node);
    while let Some(b) = block {
        if arena.node_type(b).is_some_and(|t| t.is_block()) {
            break;
        }
        block = arena.parent(b);
    }
    let Some(block) = block else {
        return false;
    };

    let tight_item = |item: NodeId| {
        arena.node_type(item) == Some(NodeType::Item)
            && arena
                .parent(item)
                .and_then(|list| arena.list_tight(list))
                .unwrap_or(false)
    };
    tight_item(block) || arena.parent(block).is_some_and(tight_item)
}

fn first_in_item(arena: &AstArena, node: NodeId) -> bool {
    arena.previous(node).is_none()
        && arena.parent(node).and_then(|p| arena.node_type(p)) == Some(NodeType::Item)
}

/// Returns the marker of a list item, padded to its content column.
fn item_marker(arena: &AstArena, item: NodeId) -> String {
    let Some(list) = arena.parent(item) else {
        return "  - ".to_string();
    };
    let Some(NodeValue::List(data)) = arena.value(list) else {
        return "  - ".to_string();
    };

    let marker = list_marker(arena, list);
    match data.list_type {
        ListType::Bullet => format!("  {marker} "),
        ListType::Ordered => {
            let index = std::iter::successors(arena.previous(item), |&n| arena.previous(n)).count();
            let number = data.start + index;
            let padding = if number < 10 { "  " } else { " " };
            format!("{number}{marker}{padding}")
        }
    }
}

/// Picks the bullet or delimiter for a list.
///
/// A list directly after a list of the same type would merge with it when
/// read back, so consecutive lists alternate their marker.
fn list_marker(arena: &AstArena, list: NodeId) -> char {
    let list_type = arena.list_type(list);
    let mut first = list;
    let mut preceding = 0;
    while let Some(prev) = arena.previous(first) {
        if arena.node_type(prev) != Some(NodeType::List) || arena.list_type(prev) != list_type {
            break;
        }
        first = prev;
        preceding += 1;
    }

    let (base, other) = match list_type {
        Some(ListType::Ordered) => match arena.list_delim(first) {
            Some(ListDelimType::Paren) => (')', '.'),
            _ => ('.', ')'),
        },
        _ => ('-', '*'),
    };
    if preceding % 2 == 0 { base } else { other }
}

/// A link whose only text is its own URL, written back as `<url>`.
fn is_autolink(arena: &AstArena, link: NodeId) -> bool {
    let (Some(url), Some(title)) = (arena.url(link), arena.title(link)) else {
        return false;
    };
    if url.is_empty() || !has_scheme(url) || !title.is_empty() {
        return false;
    }
    let Some(first) = arena.first_child(link) else {
        return false;
    };
    if arena.next(first).is_some() {
        return false;
    }
    let Some(NodeValue::Text(text)) = arena.value(first) else {
        return false;
    };
    url.strip_prefix("mailto:").unwrap_or(url) == text
}

fn ends_with_two_spaces(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 2
        && bytes[bytes.len() - 1].is_ascii_whitespace()
        && bytes[bytes.len() - 2].is_ascii_whitespace()
}

fn longest_run(s: &str, c: char) -> usize {
    s.split(|x| x != c)
        .map(|run| run.chars().count())
        .max()
        .unwrap_or(0)
}

/// Length of the shortest backtick string that does not occur in `code`.
fn shortest_unused_run(code: &str) -> usize {
    let used: Vec<usize> = code
        .split(|c| c != '`')
        .map(str::len)
        .filter(|&n| n > 0)
        .collect();
    (1..).find(|n| !used.contains(n)).unwrap_or(1)
}
