//! Block structure parsing.
//!
//! Input is consumed one line at a time. Each line first walks down the
//! chain of open blocks to see which of them it continues, then may open new
//! container or leaf blocks, and finally adds its remaining text to the
//! innermost open block. Inline content is parsed once the whole document has
//! been seen, so reference definitions anywhere in the input resolve.

use std::collections::HashMap;
use std::io::{ErrorKind, Read};
use std::mem;

use quire_ast::{
    AstArena, ListDelimType, ListType, NodeCodeBlock, NodeHeading, NodeId, NodeList, NodeSpoiler,
    NodeType, NodeValue, Position, Sourcepos,
};
use tracing::{debug, trace, warn};

use crate::entity::unescape;
use crate::error::ParseError;
use crate::inlines::Subject;
use crate::options::Options;
use crate::references::RefMap;
use crate::scanners::{self, SetextChar};

const TAB_STOP: usize = 4;
const CODE_INDENT: usize = 4;
const MAX_LIST_DEPTH: usize = 100;
const READ_CHUNK_SIZE: usize = 4096;

/// Parser bookkeeping for a block that is not part of the public tree.
#[derive(Debug, Default)]
struct BlockState {
    open: bool,
    /// Raw text collected for leaf blocks.
    content: String,
    last_line_blank: bool,
}

/// What a line must look like to continue an open block.
#[derive(Debug, Clone, Copy)]
enum Continuation {
    BlockQuote,
    Item(NodeList),
    Code {
        fenced: bool,
        fence_char: u8,
        fence_length: usize,
        fence_offset: usize,
    },
    Spoiler,
    Paragraph,
    Never,
    Always,
}

/// Incremental block parser.
///
/// Text may be supplied in arbitrary pieces with [`Parser::feed`]; a line
/// ending split between two pieces is handled. [`Parser::finish`] closes all
/// open blocks, parses inline content and returns the root.
///
/// # Example
///
/// ```rust
/// use quire_ast::{AstArena, NodeType};
/// use quire_parser::{Options, Parser};
///
/// let mut arena = AstArena::new();
/// let mut parser = Parser::new(&mut arena, Options::DEFAULT);
/// parser.feed("line1\r");
/// parser.feed("\nline2\r\n");
/// let doc = parser.finish();
///
/// let para = arena.first_child(doc).unwrap();
/// assert_eq!(arena.node_type(para), Some(NodeType::Paragraph));
/// assert_eq!(arena.next(para), None);
/// ```
pub struct Parser<'a> {
    arena: &'a mut AstArena,
    options: Options,
    root: NodeId,
    /// False when parsing into a caller's node, whose span is left alone.
    owns_root: bool,
    current: NodeId,
    blocks: HashMap<NodeId, BlockState>,
    refmap: RefMap,
    /// Blocks the root refused to hold; released when parsing finishes.
    orphans: Vec<NodeId>,
    linebuf: Vec<u8>,
    last_buffer_ended_with_cr: bool,

    line_number: usize,
    offset: usize,
    column: usize,
    first_nonspace: usize,
    first_nonspace_column: usize,
    thematic_break_kill_pos: usize,
    indent: usize,
    blank: bool,
    partially_consumed_tab: bool,
    curline_len: usize,
    curline_end_col: usize,
    last_line_length: usize,
}

impl<'a> Parser<'a> {
    /// Creates a parser that builds a new document in `arena`.
    pub fn new(arena: &'a mut AstArena, options: Options) -> Self {
        let root = arena.alloc(NodeValue::Document, Sourcepos::at(1, 1));
        let mut parser = Self::with_root(arena, root, options);
        parser.owns_root = true;
        parser
    }

    /// Creates a parser that appends the blocks it parses to `root`.
    ///
    /// `root` may already have children; they are left untouched. Blocks that
    /// `root` cannot hold are discarded with a warning.
    pub fn with_root(arena: &'a mut AstArena, root: NodeId, options: Options) -> Self {
        let mut blocks = HashMap::new();
        blocks.insert(
            root,
            BlockState {
                open: true,
                ..BlockState::default()
            },
        );
        Self {
            arena,
            options,
            root,
            owns_root: false,
            current: root,
            blocks,
            refmap: RefMap::default(),
            orphans: Vec::new(),
            linebuf: Vec::new(),
            last_buffer_ended_with_cr: false,
            line_number: 0,
            offset: 0,
            column: 0,
            first_nonspace: 0,
            first_nonspace_column: 0,
            thematic_break_kill_pos: 0,
            indent: 0,
            blank: false,
            partially_consumed_tab: false,
            curline_len: 0,
            curline_end_col: 0,
            last_line_length: 0,
        }
    }

    /// Returns the node the parser is building into.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Feeds the next piece of input.
    ///
    /// Complete lines are processed immediately; a trailing partial line is
    /// buffered until more input arrives or [`Parser::finish`] is called.
    /// Invalid UTF-8 is replaced with U+FFFD once a line is complete, so
    /// multi-byte sequences may be split between calls.
    pub fn feed(&mut self, input: impl AsRef<[u8]>) {
        let mut bytes = input.as_ref();
        if bytes.is_empty() {
            return;
        }
        if self.last_buffer_ended_with_cr && bytes[0] == b'\n' {
            bytes = &bytes[1..];
        }
        self.last_buffer_ended_with_cr = false;

        while let Some(eol) = bytes.iter().position(|&b| scanners::is_line_end_char(b)) {
            let line = &bytes[..eol];
            let mut rest = &bytes[eol + 1..];
            if bytes[eol] == b'\r' {
                match rest.first() {
                    Some(b'\n') => rest = &rest[1..],
                    None => self.last_buffer_ended_with_cr = true,
                    Some(_) => {}
                }
            }

            if self.linebuf.is_empty() {
                self.process_line(line);
            } else {
                self.linebuf.extend_from_slice(line);
                let buffered = mem::take(&mut self.linebuf);
                self.process_line(&buffered);
            }
            bytes = rest;
        }
        self.linebuf.extend_from_slice(bytes);
    }

    /// Processes any buffered partial line, closes every open block, parses
    /// inline content and returns the root.
    pub fn finish(mut self) -> NodeId {
        if !self.linebuf.is_empty() {
            let remaining = mem::take(&mut self.linebuf);
            self.process_line(&remaining);
        }
        self.finalize_document();
        self.root
    }

    fn kind(&self, id: NodeId) -> Option<NodeType> {
        self.arena.node_type(id)
    }

    fn is_open(&self, id: NodeId) -> bool {
        self.blocks.get(&id).is_some_and(|state| state.open)
    }

    fn last_line_blank(&self, id: NodeId) -> bool {
        self.blocks.get(&id).is_some_and(|state| state.last_line_blank)
    }

    fn state_mut(&mut self, id: NodeId) -> &mut BlockState {
        self.blocks.entry(id).or_default()
    }

    fn process_line(&mut self, bytes: &[u8]) {
        let mut line = String::from_utf8_lossy(bytes).replace('\0', "\u{fffd}");
        line.push('\n');

        self.curline_len = line.len();
        self.curline_end_col = line.len() - 1;
        self.offset = 0;
        self.column = 0;
        self.first_nonspace = 0;
        self.first_nonspace_column = 0;
        self.indent = 0;
        self.thematic_break_kill_pos = 0;
        self.blank = false;
        self.partially_consumed_tab = false;

        if self.line_number == 0 && line.starts_with('\u{feff}') {
            self.offset += '\u{feff}'.len_utf8();
        }
        self.line_number += 1;
        trace!(line = self.line_number, "Processing line");

        if let Some((last_matched_container, all_matched)) = self.check_open_blocks(&line) {
            let mut container = last_matched_container;
            self.open_new_blocks(&mut container, &line, all_matched);
            self.add_text_to_container(container, last_matched_container, &line);
        }

        self.last_line_length = self.curline_end_col;
        self.curline_len = 0;
        self.curline_end_col = 0;
    }

    // Open block continuation

    /// Returns the last open block the line continues, and whether every open
    /// block was continued. Returns `None` when the line closed a fenced block
    /// and has nothing more to contribute.
    fn check_open_blocks(&mut self, line: &str) -> Option<(NodeId, bool)> {
        let mut container = self.root;
        let mut all_matched = true;

        while let Some(child) = self
            .arena
            .last_child(container)
            .filter(|&child| self.is_open(child))
        {
            container = child;
            self.find_first_nonspace(line);

            let continuation = match self.arena.value(container) {
                Some(NodeValue::BlockQuote) => Continuation::BlockQuote,
                Some(NodeValue::Item(nl)) => Continuation::Item(*nl),
                Some(NodeValue::CodeBlock(ncb)) => Continuation::Code {
                    fenced: ncb.fenced,
                    fence_char: ncb.fence_char,
                    fence_length: ncb.fence_length,
                    fence_offset: ncb.fence_offset,
                },
                Some(NodeValue::SpoilerBlock(_)) => Continuation::Spoiler,
                Some(NodeValue::Paragraph) => Continuation::Paragraph,
                Some(NodeValue::Heading(_) | NodeValue::ThematicBreak) => Continuation::Never,
                _ => Continuation::Always,
            };

            let matched = match continuation {
                Continuation::BlockQuote => self.parse_block_quote_prefix(line),
                Continuation::Item(nl) => self.parse_item_prefix(line, container, &nl),
                Continuation::Code {
                    fenced,
                    fence_char,
                    fence_length,
                    fence_offset,
                } => {
                    if fenced {
                        self.parse_code_fence_prefix(
                            line,
                            container,
                            fence_char,
                            fence_length,
                            fence_offset,
                        )?
                    } else {
                        self.parse_indented_code_prefix(line)
                    }
                }
                Continuation::Spoiler => self.parse_spoiler_prefix(line, container)?,
                Continuation::Paragraph => !self.blank,
                Continuation::Never => false,
                Continuation::Always => true,
            };

            if !matched {
                all_matched = false;
                break;
            }
        }

        if !all_matched {
            container = self.arena.parent(container).unwrap_or(self.root);
        }
        Some((container, all_matched))
    }

    fn find_first_nonspace(&mut self, line: &str) {
        let bytes = line.as_bytes();
        let mut chars_to_tab = TAB_STOP - (self.column % TAB_STOP);

        if self.first_nonspace <= self.offset {
            self.first_nonspace = self.offset;
            self.first_nonspace_column = self.column;

            while let Some(&b) = bytes.get(self.first_nonspace) {
                match b {
                    b' ' => {
                        self.first_nonspace += 1;
                        self.first_nonspace_column += 1;
                        chars_to_tab -= 1;
                        if chars_to_tab == 0 {
                            chars_to_tab = TAB_STOP;
                        }
                    }
                    b'\t' => {
                        self.first_nonspace += 1;
                        self.first_nonspace_column += chars_to_tab;
                        chars_to_tab = TAB_STOP;
                    }
                    _ => break,
                }
            }
        }

        self.indent = self.first_nonspace_column - self.column;
        self.blank = bytes
            .get(self.first_nonspace)
            .is_some_and(|&b| scanners::is_line_end_char(b));
    }

    fn advance_offset(&mut self, line: &str, mut count: usize, columns: bool) {
        let bytes = line.as_bytes();
        while count > 0 {
            let Some(&b) = bytes.get(self.offset) else {
                break;
            };
            if b == b'\t' {
                let chars_to_tab = TAB_STOP - (self.column % TAB_STOP);
                if columns {
                    self.partially_consumed_tab = chars_to_tab > count;
                    let chars_to_advance = count.min(chars_to_tab);
                    self.column += chars_to_advance;
                    if !self.partially_consumed_tab {
                        self.offset += 1;
                    }
                    count -= chars_to_advance;
                } else {
                    self.partially_consumed_tab = false;
                    self.column += chars_to_tab;
                    self.offset += 1;
                    count -= 1;
                }
            } else {
                self.partially_consumed_tab = false;
                self.offset += 1;
                self.column += 1;
                count -= 1;
            }
        }
    }

    /// Advances to the line ending.
    fn advance_to_line_end(&mut self, line: &str) {
        let count = line.len().saturating_sub(1 + self.offset);
        self.advance_offset(line, count, false);
    }

    fn byte_at(line: &str, pos: usize) -> u8 {
        line.as_bytes().get(pos).copied().unwrap_or(b'\n')
    }

    fn parse_block_quote_prefix(&mut self, line: &str) -> bool {
        let indent = self.indent;
        if indent > 3 || Self::byte_at(line, self.first_nonspace) != b'>' {
            return false;
        }
        self.advance_offset(line, indent + 1, true);
        if scanners::is_space_or_tab(Self::byte_at(line, self.offset)) {
            self.advance_offset(line, 1, true);
        }
        true
    }

    fn parse_item_prefix(&mut self, line: &str, container: NodeId, nl: &NodeList) -> bool {
        if self.indent >= nl.marker_offset + nl.padding {
            self.advance_offset(line, nl.marker_offset + nl.padding, true);
            true
        } else if self.blank && self.arena.first_child(container).is_some() {
            let offset = self.first_nonspace - self.offset;
            self.advance_offset(line, offset, false);
            true
        } else {
            false
        }
    }

    fn parse_indented_code_prefix(&mut self, line: &str) -> bool {
        if self.indent >= CODE_INDENT {
            self.advance_offset(line, CODE_INDENT, true);
            true
        } else if self.blank {
            let offset = self.first_nonspace - self.offset;
            self.advance_offset(line, offset, false);
            true
        } else {
            false
        }
    }

    fn parse_code_fence_prefix(
        &mut self,
        line: &str,
        container: NodeId,
        fence_char: u8,
        fence_length: usize,
        fence_offset: usize,
    ) -> Option<bool> {
        let matched = if self.indent <= 3 && Self::byte_at(line, self.first_nonspace) == fence_char
        {
            scanners::close_code_fence(&line[self.first_nonspace..], fence_char).unwrap_or(0)
        } else {
            0
        };

        if matched >= fence_length {
            self.advance_offset(line, matched, false);
            self.current = self.finalize(container);
            return None;
        }

        let mut i = fence_offset;
        while i > 0 && scanners::is_space_or_tab(Self::byte_at(line, self.offset)) {
            self.advance_offset(line, 1, true);
            i -= 1;
        }
        Some(true)
    }

    fn parse_spoiler_prefix(&mut self, line: &str, container: NodeId) -> Option<bool> {
        if self.indent <= 3 && scanners::spoiler_end(&line[self.first_nonspace..]) {
            self.advance_to_line_end(line);
            self.current = self.finalize(container);
            return None;
        }
        Some(true)
    }

    // Block starts

    fn open_new_blocks(&mut self, container: &mut NodeId, line: &str, all_matched: bool) {
        let mut maybe_lazy = self.kind(self.current) == Some(NodeType::Paragraph);
        let mut depth = 0;

        while !matches!(
            self.kind(*container),
            Some(NodeType::CodeBlock | NodeType::SpoilerBlock)
        ) {
            depth += 1;
            self.find_first_nonspace(line);
            let indented = self.indent >= CODE_INDENT;

            let opened = (!indented
                && (self.handle_blockquote(container, line)
                    || self.handle_atx_heading(container, line)
                    || self.handle_code_fence(container, line)
                    || self.handle_spoiler(container, line)
                    || self.handle_setext_heading(container, line)
                    || self.handle_thematic_break(container, line, all_matched)))
                || self.handle_list(container, line, indented, depth)
                || self.handle_indented_code(container, line, indented, maybe_lazy);

            if !opened || accepts_lines(self.kind(*container)) {
                break;
            }
            maybe_lazy = false;
        }
    }

    fn handle_blockquote(&mut self, container: &mut NodeId, line: &str) -> bool {
        if Self::byte_at(line, self.first_nonspace) != b'>' {
            return false;
        }
        let start = self.first_nonspace;
        let offset = self.first_nonspace + 1 - self.offset;
        self.advance_offset(line, offset, false);
        if scanners::is_space_or_tab(Self::byte_at(line, self.offset)) {
            self.advance_offset(line, 1, true);
        }
        *container = self.add_child(*container, NodeValue::BlockQuote, start + 1);
        true
    }

    fn handle_atx_heading(&mut self, container: &mut NodeId, line: &str) -> bool {
        let rest = &line[self.first_nonspace..];
        let Some(matched) = scanners::atx_heading_start(rest) else {
            return false;
        };
        let level = rest.bytes().take_while(|&b| b == b'#').count();

        let start = self.first_nonspace;
        let offset = start + matched - self.offset;
        self.advance_offset(line, offset, false);
        *container = self.add_child(
            *container,
            NodeValue::Heading(NodeHeading {
                level: level as u8,
                setext: false,
            }),
            start + 1,
        );
        true
    }

    fn handle_code_fence(&mut self, container: &mut NodeId, line: &str) -> bool {
        let Some(matched) = scanners::open_code_fence(&line[self.first_nonspace..]) else {
            return false;
        };

        let first_nonspace = self.first_nonspace;
        let offset = self.offset;
        let ncb = NodeCodeBlock {
            fenced: true,
            fence_char: Self::byte_at(line, first_nonspace),
            fence_length: matched,
            fence_offset: first_nonspace - offset,
            info: String::new(),
            literal: String::new(),
        };
        *container = self.add_child(*container, NodeValue::CodeBlock(ncb), first_nonspace + 1);
        self.advance_offset(line, first_nonspace + matched - offset, false);
        true
    }

    fn handle_spoiler(&mut self, container: &mut NodeId, line: &str) -> bool {
        let Some(title) = scanners::spoiler_start(&line[self.first_nonspace..]) else {
            return false;
        };
        let value = NodeValue::SpoilerBlock(NodeSpoiler {
            title: title.to_string(),
        });
        *container = self.add_child(*container, value, self.first_nonspace + 1);
        self.advance_to_line_end(line);
        true
    }

    fn handle_setext_heading(&mut self, container: &mut NodeId, line: &str) -> bool {
        if self.kind(*container) != Some(NodeType::Paragraph) {
            return false;
        }
        let Some(setext) = scanners::setext_heading_line(&line[self.first_nonspace..]) else {
            return false;
        };

        if self.resolve_reference_definitions(*container) {
            let level = match setext {
                SetextChar::Equals => 1,
                SetextChar::Hyphen => 2,
            };
            if let Some(value) = self.arena.value_mut(*container) {
                *value = NodeValue::Heading(NodeHeading {
                    level,
                    setext: true,
                });
            }
            self.advance_to_line_end(line);
        }
        true
    }

    fn handle_thematic_break(
        &mut self,
        container: &mut NodeId,
        line: &str,
        all_matched: bool,
    ) -> bool {
        if (self.kind(*container) == Some(NodeType::Paragraph) && !all_matched)
            || self.thematic_break_kill_pos > self.first_nonspace
        {
            return false;
        }
        let (pos, found) = self.scan_thematic_break(line);
        if !found {
            self.thematic_break_kill_pos = pos;
            return false;
        }

        *container = self.add_child(*container, NodeValue::ThematicBreak, self.first_nonspace + 1);
        let end = Position::new(self.line_number, self.curline_end_col);
        if let Some(node) = self.arena.get_mut(*container) {
            node.sourcepos.end = end;
        }
        self.advance_to_line_end(line);
        true
    }

    /// Three or more of the same `*`, `_` or `-`, with only spaces or tabs
    /// between them. Returns the position scanned to and whether it matched.
    fn scan_thematic_break(&self, line: &str) -> (usize, bool) {
        let bytes = line.as_bytes();
        let mut i = self.first_nonspace;
        let c = Self::byte_at(line, i);
        if !matches!(c, b'*' | b'_' | b'-') {
            return (i, false);
        }

        let mut count = 1;
        loop {
            i += 1;
            let Some(&next) = bytes.get(i) else {
                return (i, false);
            };
            if next == c {
                count += 1;
            } else if !scanners::is_space_or_tab(next) {
                return (i, count >= 3 && scanners::is_line_end_char(next));
            }
        }
    }

    fn handle_list(
        &mut self,
        container: &mut NodeId,
        line: &str,
        indented: bool,
        depth: usize,
    ) -> bool {
        let in_list = self.kind(*container) == Some(NodeType::List);
        if (indented && !in_list) || self.indent >= 4 || depth >= MAX_LIST_DEPTH {
            return false;
        }
        let interrupts_paragraph = self.kind(*container) == Some(NodeType::Paragraph);
        let Some((matched, mut nl)) =
            parse_list_marker(line, self.first_nonspace, interrupts_paragraph)
        else {
            return false;
        };

        let offset = self.first_nonspace + matched - self.offset;
        self.advance_offset(line, offset, false);
        let (saved_tab, saved_offset, saved_column) =
            (self.partially_consumed_tab, self.offset, self.column);

        while self.column - saved_column <= 5
            && scanners::is_space_or_tab(Self::byte_at(line, self.offset))
        {
            self.advance_offset(line, 1, true);
        }

        let spaces = self.column - saved_column;
        if !(1..5).contains(&spaces)
            || scanners::is_line_end_char(Self::byte_at(line, self.offset))
        {
            nl.padding = matched + 1;
            self.offset = saved_offset;
            self.column = saved_column;
            self.partially_consumed_tab = saved_tab;
            if spaces > 0 {
                self.advance_offset(line, 1, true);
            }
        } else {
            nl.padding = matched + spaces;
        }
        nl.marker_offset = self.indent;

        let continues_list = matches!(
            self.arena.value(*container),
            Some(NodeValue::List(existing)) if lists_match(existing, &nl)
        );
        if !continues_list {
            *container = self.add_child(*container, NodeValue::List(nl), self.first_nonspace + 1);
        }
        *container = self.add_child(*container, NodeValue::Item(nl), self.first_nonspace + 1);
        true
    }

    fn handle_indented_code(
        &mut self,
        container: &mut NodeId,
        line: &str,
        indented: bool,
        maybe_lazy: bool,
    ) -> bool {
        if !indented || maybe_lazy || self.blank {
            return false;
        }
        self.advance_offset(line, CODE_INDENT, true);
        *container = self.add_child(
            *container,
            NodeValue::CodeBlock(NodeCodeBlock::default()),
            self.offset + 1,
        );
        true
    }

    // Tree building

    fn add_child(&mut self, mut parent: NodeId, value: NodeValue, start_column: usize) -> NodeId {
        let child_type = value.node_type();
        while parent != self.root
            && !self
                .kind(parent)
                .is_some_and(|parent_type| parent_type.can_contain(child_type))
        {
            parent = self.finalize(parent);
        }

        let node = self
            .arena
            .alloc(value, Sourcepos::at(self.line_number, start_column));
        if let Err(err) = self.arena.append_child(parent, node) {
            warn!(line = self.line_number, "Discarding block: {}", err);
            self.orphans.push(node);
        }
        self.blocks.insert(
            node,
            BlockState {
                open: true,
                ..BlockState::default()
            },
        );
        node
    }

    fn add_text_to_container(&mut self, mut container: NodeId, last_matched: NodeId, line: &str) {
        self.find_first_nonspace(line);

        if self.blank {
            if let Some(last_child) = self.arena.last_child(container) {
                self.state_mut(last_child).last_line_blank = true;
            }
        }

        let last_line_blank = self.blank
            && match self.arena.value(container) {
                Some(
                    NodeValue::BlockQuote
                    | NodeValue::Heading(_)
                    | NodeValue::ThematicBreak
                    | NodeValue::SpoilerBlock(_),
                ) => false,
                Some(NodeValue::CodeBlock(ncb)) => !ncb.fenced,
                Some(NodeValue::Item(_)) => {
                    self.arena.first_child(container).is_some()
                        || self.arena.start_line(container) != Some(self.line_number)
                }
                _ => true,
            };
        self.state_mut(container).last_line_blank = last_line_blank;

        let mut tmp = container;
        while tmp != self.root {
            let Some(parent) = self.arena.parent(tmp) else {
                break;
            };
            self.state_mut(parent).last_line_blank = false;
            tmp = parent;
        }

        // Lazy paragraph continuation.
        if self.current != last_matched
            && container == last_matched
            && !self.blank
            && self.kind(self.current) == Some(NodeType::Paragraph)
        {
            self.add_line(self.current, line);
            return;
        }

        while self.current != last_matched && self.current != self.root {
            self.current = self.finalize(self.current);
        }

        match self.arena.value(container) {
            Some(NodeValue::CodeBlock(_)) => self.add_line(container, line),
            Some(NodeValue::SpoilerBlock(_)) => {
                // The opening line only carries the title.
                if self.arena.start_line(container) != Some(self.line_number) {
                    let count = self.first_nonspace - self.offset;
                    self.advance_offset(line, count, false);
                    self.add_line(container, line);
                }
            }
            _ if self.blank => {}
            Some(NodeValue::Paragraph | NodeValue::Heading(_)) => {
                let atx = matches!(
                    self.arena.value(container),
                    Some(NodeValue::Heading(heading)) if !heading.setext
                );
                let text = if atx { chop_trailing_hashes(line) } else { line };
                // Chopping can leave nothing after the opening hashes.
                if self.first_nonspace <= text.len() {
                    let count = self.first_nonspace - self.offset;
                    self.advance_offset(text, count, false);
                    self.add_line(container, text);
                }
            }
            _ => {
                container =
                    self.add_child(container, NodeValue::Paragraph, self.first_nonspace + 1);
                let count = self.first_nonspace - self.offset;
                self.advance_offset(line, count, false);
                self.add_line(container, line);
            }
        }

        self.current = container;
    }

    fn add_line(&mut self, node: NodeId, line: &str) {
        let mut text = String::new();
        if self.partially_consumed_tab {
            self.offset += 1;
            let chars_to_tab = TAB_STOP - (self.column % TAB_STOP);
            text.extend(std::iter::repeat_n(' ', chars_to_tab));
        }
        if let Some(rest) = line.get(self.offset..) {
            text.push_str(rest);
        }
        self.state_mut(node).content.push_str(&text);
    }

    /// Strips leading reference definitions from a paragraph's content.
    /// Returns true if any other content remains.
    fn resolve_reference_definitions(&mut self, node: NodeId) -> bool {
        let mut content = mem::take(&mut self.state_mut(node).content);
        let consumed = self.refmap.parse_definitions(&content);
        content.drain(..consumed);
        let has_content = !is_blank(&content);
        self.state_mut(node).content = content;
        has_content
    }

    /// Closes `node` and returns its parent.
    fn finalize(&mut self, node: NodeId) -> NodeId {
        let parent = self.arena.parent(node).unwrap_or(self.root);
        let Some(state) = self.blocks.get_mut(&node).filter(|state| state.open) else {
            return parent;
        };
        state.open = false;

        let (node_type, fenced) = match self.arena.value(node) {
            Some(NodeValue::CodeBlock(ncb)) => (NodeType::CodeBlock, ncb.fenced),
            Some(value) => (value.node_type(), false),
            None => return parent,
        };

        let end = if self.curline_len == 0 {
            Some(Position::new(self.line_number, self.last_line_length))
        } else if node_type == NodeType::Document || node_type == NodeType::SpoilerBlock || fenced {
            Some(Position::new(self.line_number, self.curline_end_col))
        } else if node_type == NodeType::ThematicBreak {
            None
        } else {
            Some(Position::new(
                self.line_number.saturating_sub(1),
                self.last_line_length,
            ))
        };
        let keep_span = node == self.root && !self.owns_root;
        if let (Some(end), Some(ast), false) = (end, self.arena.get_mut(node), keep_span) {
            ast.sourcepos.end = end;
        }

        match node_type {
            NodeType::Paragraph => {
                if !self.resolve_reference_definitions(node) && node != self.root {
                    self.blocks.remove(&node);
                    self.arena.free(node);
                }
            }
            NodeType::CodeBlock => {
                let mut content = mem::take(&mut self.state_mut(node).content);
                let mut info = String::new();
                if fenced {
                    let first_line_end = content.find('\n').map_or(content.len(), |i| i + 1);
                    info = unescape(scanners::trim_markup_space(&content[..first_line_end]));
                    content.drain(..first_line_end);
                } else {
                    remove_trailing_blank_lines(&mut content);
                    content.push('\n');
                }
                if let Some(NodeValue::CodeBlock(ncb)) = self.arena.value_mut(node) {
                    ncb.info = info;
                    ncb.literal = content;
                }
            }
            NodeType::List => {
                let tight = self.determine_list_tight(node);
                if let Some(NodeValue::List(nl)) = self.arena.value_mut(node) {
                    nl.tight = tight;
                }
            }
            _ => {}
        }

        parent
    }

    fn ends_with_blank_line(&self, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(id) = cur {
            if self.last_line_blank(id) {
                return true;
            }
            cur = match self.kind(id) {
                Some(NodeType::List | NodeType::Item) => self.arena.last_child(id),
                _ => None,
            };
        }
        false
    }

    fn determine_list_tight(&self, list: NodeId) -> bool {
        for item in self.arena.children(list) {
            let has_next_item = self.arena.next(item).is_some();
            if self.last_line_blank(item) && has_next_item {
                return false;
            }
            for sub in self.arena.children(item) {
                if (has_next_item || self.arena.next(sub).is_some())
                    && self.ends_with_blank_line(sub)
                {
                    return false;
                }
            }
        }
        true
    }

    fn finalize_document(&mut self) {
        while self.current != self.root {
            self.current = self.finalize(self.current);
        }

        // Blocks left open off the current chain, innermost first.
        let still_open: Vec<NodeId> = self
            .arena
            .descendants(self.root)
            .filter(|&id| id != self.root && self.is_open(id))
            .collect();
        for id in still_open.into_iter().rev() {
            self.finalize(id);
        }
        self.finalize(self.root);

        self.process_inlines();

        for orphan in mem::take(&mut self.orphans) {
            self.arena.free(orphan);
        }
        debug!(
            lines = self.line_number,
            references = self.refmap.len(),
            "Finished parsing"
        );
    }

    fn process_inlines(&mut self) {
        let targets: Vec<NodeId> = self
            .arena
            .descendants(self.root)
            .filter(|id| self.blocks.contains_key(id))
            .filter(|&id| {
                matches!(
                    self.kind(id),
                    Some(NodeType::Paragraph | NodeType::Heading | NodeType::SpoilerBlock)
                )
            })
            .collect();

        for id in targets {
            let content = self
                .blocks
                .get_mut(&id)
                .map(|state| mem::take(&mut state.content))
                .unwrap_or_default();
            let content = content.trim_end_matches([' ', '\t', '\n', '\r']).to_string();
            let start = self
                .arena
                .get(id)
                .map_or(Position::default(), |node| node.sourcepos.start);
            Subject::new(&mut *self.arena, &self.refmap, self.options, content, start)
                .parse_into(id);
        }
    }
}

fn accepts_lines(node_type: Option<NodeType>) -> bool {
    matches!(
        node_type,
        Some(
            NodeType::Paragraph
                | NodeType::Heading
                | NodeType::CodeBlock
                | NodeType::SpoilerBlock
        )
    )
}

fn is_blank(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
}

fn is_list_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

/// Drops a closing sequence of `#`s from an ATX heading line, along with
/// trailing whitespace.
fn chop_trailing_hashes(line: &str) -> &str {
    let line = line.trim_end_matches([' ', '\t', '\n', '\r']);
    let without = line.trim_end_matches('#');
    if without.len() == line.len() || without.is_empty() {
        return without;
    }
    if without.ends_with([' ', '\t']) {
        without.trim_end_matches([' ', '\t'])
    } else {
        line
    }
}

/// Removes trailing lines that hold only whitespace, and the final line
/// ending.
fn remove_trailing_blank_lines(s: &mut String) {
    let Some(last) = s.rfind(|c: char| !matches!(c, ' ' | '\t' | '\n' | '\r')) else {
        s.clear();
        return;
    };
    if let Some(eol) = s[last..].find(['\n', '\r']) {
        s.truncate(last + eol);
    }
}

/// Scans a bullet or ordered list marker at `pos`.
///
/// Returns the marker width and the list data it implies. Markers that would
/// interrupt a paragraph must not start an empty item, and ordered ones must
/// start at 1.
fn parse_list_marker(
    line: &str,
    mut pos: usize,
    interrupts_paragraph: bool,
) -> Option<(usize, NodeList)> {
    let bytes = line.as_bytes();
    let at = |i: usize| bytes.get(i).copied().unwrap_or(b'\n');
    let start_pos = pos;
    let c = at(pos);

    let opens_empty_item = |mut i: usize| {
        while scanners::is_space_or_tab(at(i)) {
            i += 1;
        }
        scanners::is_line_end_char(at(i))
    };

    if matches!(c, b'*' | b'-' | b'+') {
        pos += 1;
        if !is_list_space(at(pos)) || (interrupts_paragraph && opens_empty_item(pos)) {
            return None;
        }
        return Some((
            pos - start_pos,
            NodeList {
                list_type: ListType::Bullet,
                delimiter: ListDelimType::Period,
                start: 1,
                tight: false,
                bullet_char: c,
                marker_offset: 0,
                padding: 0,
            },
        ));
    }

    if !c.is_ascii_digit() {
        return None;
    }
    let mut start = 0usize;
    let mut digits = 0;
    while digits < 9 && at(pos).is_ascii_digit() {
        start = start * 10 + usize::from(at(pos) - b'0');
        pos += 1;
        digits += 1;
    }
    if interrupts_paragraph && start != 1 {
        return None;
    }

    let delimiter = match at(pos) {
        b'.' => ListDelimType::Period,
        b')' => ListDelimType::Paren,
        _ => return None,
    };
    pos += 1;
    if !is_list_space(at(pos)) || (interrupts_paragraph && opens_empty_item(pos)) {
        return None;
    }

    Some((
        pos - start_pos,
        NodeList {
            list_type: ListType::Ordered,
            delimiter,
            start,
            tight: false,
            bullet_char: 0,
            marker_offset: 0,
            padding: 0,
        },
    ))
}

fn lists_match(list: &NodeList, item: &NodeList) -> bool {
    list.list_type == item.list_type
        && list.delimiter == item.delimiter
        && list.bullet_char == item.bullet_char
}

/// Parses a complete document.
pub fn parse_document(arena: &mut AstArena, text: &str, options: Options) -> NodeId {
    let mut parser = Parser::new(arena, options);
    parser.feed(text);
    parser.finish()
}

/// Parses a document from a reader, feeding it to the parser in chunks.
///
/// # Errors
///
/// Returns [`ParseError::Io`] if reading fails.
pub fn parse_reader<R: Read>(
    arena: &mut AstArena,
    mut reader: R,
    options: Options,
) -> Result<NodeId, ParseError> {
    let mut parser = Parser::new(arena, options);
    let mut buf = [0u8; READ_CHUNK_SIZE];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => parser.feed(&buf[..n]),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(parser.finish())
}
