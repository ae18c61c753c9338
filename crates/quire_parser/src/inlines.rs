//! Inline parsing.
//!
//! A [`Subject`] scans the text of one block left to right and appends
//! inline nodes to it. Delimiter runs (`*`, `_`, `~`, `^` and, with smart
//! punctuation, quotes) and brackets are kept on stacks and resolved once
//! their closers are seen.

use quire_ast::{AstArena, NodeId, NodeLink, NodeValue, Position, Sourcepos};
use tracing::warn;

use crate::Options;
use crate::entity::{decode_entities, decode_entity};
use crate::references::{RefMap, clean_title, clean_url};
use crate::scanners;

const LEFT_DOUBLE_QUOTE: &str = "\u{201c}";
const RIGHT_DOUBLE_QUOTE: &str = "\u{201d}";
const LEFT_SINGLE_QUOTE: &str = "\u{2018}";
const RIGHT_SINGLE_QUOTE: &str = "\u{2019}";
const EM_DASH: &str = "\u{2014}";
const EN_DASH: &str = "\u{2013}";
const ELLIPSIS: &str = "\u{2026}";

/// Slots of the per-kind lower bounds used while searching for openers.
const OPENERS_BOTTOM_SLOTS: usize = 12;

#[derive(Debug, Clone, Copy)]
struct Delimiter {
    inl: NodeId,
    /// Byte offset just past the run.
    position: usize,
    delim_char: u8,
    /// Length of the run as scanned.
    length: usize,
    can_open: bool,
    can_close: bool,
}

impl Delimiter {
    fn bottom_slot(&self) -> usize {
        match self.delim_char {
            b'"' => 0,
            b'\'' => 1,
            b'_' => 2,
            b'*' => 3 + if self.can_open { 3 } else { 0 } + self.length % 3,
            b'~' => 8 + self.length,
            _ => 11,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Bracket {
    inl: NodeId,
    /// Byte offset just past `[` or `![`.
    position: usize,
    image: bool,
    active: bool,
    bracket_after: bool,
}

/// Inline parsing state for the text of one block.
pub(crate) struct Subject<'a> {
    arena: &'a mut AstArena,
    refmap: &'a RefMap,
    options: Options,
    input: String,
    pos: usize,
    line: usize,
    line_start: usize,
    column: usize,
    delimiters: Vec<Delimiter>,
    brackets: Vec<Bracket>,
}

impl<'a> Subject<'a> {
    /// Creates a subject for `input`, which starts at `start` in the source.
    pub fn new(
        arena: &'a mut AstArena,
        refmap: &'a RefMap,
        options: Options,
        input: String,
        start: Position,
    ) -> Self {
        Self {
            arena,
            refmap,
            options,
            input,
            pos: 0,
            line: start.line,
            line_start: 0,
            column: start.column.max(1),
            delimiters: Vec::new(),
            brackets: Vec::new(),
        }
    }

    /// Parses the whole input into children of `parent`.
    pub fn parse_into(mut self, parent: NodeId) {
        while self.pos < self.input.len() {
            if let Some(node) = self.parse_inline(parent) {
                self.append(parent, node);
            }
        }
        self.process_emphasis(0);
        self.brackets.clear();
        merge_text_nodes(self.arena, parent);
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn peek_at(&self, pos: usize) -> Option<u8> {
        self.input.as_bytes().get(pos).copied()
    }

    fn smart(&self) -> bool {
        self.options.contains(Options::SMART)
    }

    fn sourcepos(&self, start: usize, end: usize) -> Sourcepos {
        let column = |offset: usize| self.column + offset.saturating_sub(self.line_start);
        Sourcepos {
            start: Position {
                line: self.line,
                column: column(start),
            },
            end: Position {
                line: self.line,
                column: column(end.max(start + 1) - 1),
            },
        }
    }

    fn make(&mut self, value: NodeValue, start: usize, end: usize) -> NodeId {
        let sourcepos = self.sourcepos(start, end);
        self.arena.alloc(value, sourcepos)
    }

    fn make_text(&mut self, text: impl Into<String>, start: usize) -> NodeId {
        let end = self.pos;
        self.make(NodeValue::Text(text.into()), start, end)
    }

    fn append(&mut self, parent: NodeId, node: NodeId) {
        if let Err(err) = self.arena.append_child(parent, node) {
            warn!("Dropping inline that cannot be attached: {}", err);
            self.arena.free(node);
        }
    }

    fn parse_inline(&mut self, parent: NodeId) -> Option<NodeId> {
        let c = self.peek()?;
        let start = self.pos;
        let smart = self.smart();
        let node = match c {
            b'\n' | b'\r' => self.handle_newline(),
            b'`' => self.handle_backticks(),
            b'\\' => self.handle_backslash(),
            b'&' => self.handle_entity(),
            b'<' => self.handle_pointy_brace(),
            b'*' | b'_' | b'~' | b'^' => self.handle_delim(c),
            b'\'' | b'"' if smart => self.handle_delim(c),
            b'-' if smart => self.handle_hyphen(),
            b'.' if smart => self.handle_period(),
            b'[' => {
                self.pos += 1;
                let inl = self.make_text("[", start);
                self.push_bracket(false, inl);
                inl
            }
            b']' => return self.handle_close_bracket(parent),
            b'!' => {
                self.pos += 1;
                if self.peek() == Some(b'[') {
                    self.pos += 1;
                    let inl = self.make_text("![", start);
                    self.push_bracket(true, inl);
                    inl
                } else {
                    self.make_text("!", start)
                }
            }
            _ => {
                let end = self.find_special_char();
                let mut text = &self.input[start..end];
                self.pos = end;
                if self.peek().is_some_and(scanners::is_line_end_char) {
                    text = text.trim_end_matches(' ');
                }
                let text = text.to_string();
                self.make_text(text, start)
            }
        };
        Some(node)
    }

    fn is_special(&self, b: u8) -> bool {
        match b {
            b'\n' | b'\r' | b'`' | b'\\' | b'&' | b'<' | b'[' | b']' | b'!' | b'*' | b'_'
            | b'~' | b'^' => true,
            b'\'' | b'"' | b'-' | b'.' => self.smart(),
            _ => false,
        }
    }

    fn find_special_char(&self) -> usize {
        let bytes = self.input.as_bytes();
        (self.pos + 1..bytes.len())
            .find(|&i| self.is_special(bytes[i]))
            .unwrap_or(bytes.len())
    }

    fn handle_newline(&mut self) -> NodeId {
        let nlpos = self.pos;
        if self.peek() == Some(b'\r') {
            self.pos += 1;
        }
        if self.peek() == Some(b'\n') {
            self.pos += 1;
        }
        self.line += 1;
        self.line_start = self.pos;
        self.column = 1;
        while self.peek().is_some_and(scanners::is_space_or_tab) {
            self.pos += 1;
        }

        let bytes = self.input.as_bytes();
        let hard = nlpos > 1 && bytes[nlpos - 1] == b' ' && bytes[nlpos - 2] == b' ';
        let value = if hard || self.options.contains(Options::HARDBREAKS) {
            NodeValue::LineBreak
        } else {
            NodeValue::SoftBreak
        };
        self.make(value, nlpos, nlpos + 1)
    }

    fn handle_backslash(&mut self) -> NodeId {
        let start = self.pos;
        self.pos += 1;
        match self.peek() {
            Some(c) if c.is_ascii_punctuation() => {
                self.pos += 1;
                self.make_text((c as char).to_string(), start)
            }
            Some(b'\n' | b'\r') => {
                if self.peek() == Some(b'\r') {
                    self.pos += 1;
                }
                if self.peek() == Some(b'\n') {
                    self.pos += 1;
                }
                let node = self.make(NodeValue::LineBreak, start, start + 1);
                self.line += 1;
                self.line_start = self.pos;
                self.column = 1;
                node
            }
            _ => self.make_text("\\", start),
        }
    }

    fn handle_entity(&mut self) -> NodeId {
        let start = self.pos;
        match decode_entity(&self.input[start..]) {
            Some((text, len)) => {
                self.pos += len;
                self.make_text(text, start)
            }
            None => {
                self.pos += 1;
                self.make_text("&", start)
            }
        }
    }

    fn handle_backticks(&mut self) -> NodeId {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        let ticks = bytes[start..].iter().take_while(|&&b| b == b'`').count();
        let after_open = start + ticks;

        match self.scan_to_closing_backticks(after_open, ticks) {
            Some(close) => {
                let code = normalize_code(&self.input[after_open..close]);
                self.pos = close + ticks;
                self.make(NodeValue::Code(code), start, self.pos)
            }
            None => {
                self.pos = after_open;
                self.make_text("`".repeat(ticks), start)
            }
        }
    }

    /// Finds the start of the next backtick run of exactly `ticks`.
    fn scan_to_closing_backticks(&self, from: usize, ticks: usize) -> Option<usize> {
        let bytes = self.input.as_bytes();
        let mut i = from;
        while i < bytes.len() {
            if bytes[i] != b'`' {
                i += 1;
                continue;
            }
            let run = bytes[i..].iter().take_while(|&&b| b == b'`').count();
            if run == ticks {
                return Some(i);
            }
            i += run;
        }
        None
    }

    fn handle_pointy_brace(&mut self) -> NodeId {
        let start = self.pos;
        let rest = &self.input[start..];
        let autolink = scanners::autolink_uri(rest)
            .map(|(len, uri)| (len, decode_entities(uri), String::new()))
            .or_else(|| {
                scanners::autolink_email(rest)
                    .map(|(len, email)| (len, decode_entities(email), "mailto:".to_string()))
            });

        let Some((len, text, prefix)) = autolink else {
            self.pos += 1;
            return self.make_text("<", start);
        };

        self.pos += len;
        let link = self.make(
            NodeValue::Link(NodeLink {
                url: format!("{prefix}{text}"),
                title: String::new(),
            }),
            start,
            self.pos,
        );
        let label = self.make(NodeValue::Text(text), start + 1, self.pos - 1);
        self.append(link, label);
        link
    }

    /// Measures the delimiter run at the cursor and works out whether it can
    /// open or close.
    fn scan_delims(&self, c: u8) -> (usize, bool, bool) {
        let before = self.input[..self.pos].chars().next_back().unwrap_or('\n');
        let count = if c == b'\'' || c == b'"' {
            1
        } else {
            self.input.as_bytes()[self.pos..]
                .iter()
                .take_while(|&&b| b == c)
                .count()
        };
        let after = self.input[self.pos + count..].chars().next().unwrap_or('\n');

        let left_flanking = !after.is_whitespace()
            && (!is_punctuation(after) || before.is_whitespace() || is_punctuation(before));
        let right_flanking = !before.is_whitespace()
            && (!is_punctuation(before) || after.is_whitespace() || is_punctuation(after));

        let (can_open, can_close) = match c {
            b'_' => (
                left_flanking && (!right_flanking || is_punctuation(before)),
                right_flanking && (!left_flanking || is_punctuation(after)),
            ),
            b'\'' | b'"' => (
                left_flanking && !right_flanking && before != ']' && before != ')',
                right_flanking,
            ),
            _ => (left_flanking, right_flanking),
        };
        (count, can_open, can_close)
    }

    fn handle_delim(&mut self, c: u8) -> NodeId {
        let start = self.pos;
        let (count, can_open, can_close) = self.scan_delims(c);
        self.pos += count;

        let text = match c {
            b'\'' => RIGHT_SINGLE_QUOTE.to_string(),
            b'"' if can_close => RIGHT_DOUBLE_QUOTE.to_string(),
            b'"' => LEFT_DOUBLE_QUOTE.to_string(),
            _ => self.input[start..self.pos].to_string(),
        };
        let inl = self.make_text(text, start);

        let matchable = match c {
            b'~' => count <= 2,
            b'^' => count == 1,
            _ => true,
        };
        if (can_open || can_close) && matchable {
            self.delimiters.push(Delimiter {
                inl,
                position: self.pos,
                delim_char: c,
                length: count,
                can_open,
                can_close,
            });
        }
        inl
    }

    fn handle_hyphen(&mut self) -> NodeId {
        let start = self.pos;
        let count = self.input.as_bytes()[start..]
            .iter()
            .take_while(|&&b| b == b'-')
            .count();
        self.pos += count;
        if count == 1 {
            return self.make_text("-", start);
        }

        let (em, en) = if count % 3 == 0 {
            (count / 3, 0)
        } else if count % 2 == 0 {
            (0, count / 2)
        } else if count % 3 == 2 {
            ((count - 2) / 3, 1)
        } else {
            ((count - 4) / 3, 2)
        };
        let text = EM_DASH.repeat(em) + &EN_DASH.repeat(en);
        self.make_text(text, start)
    }

    fn handle_period(&mut self) -> NodeId {
        let start = self.pos;
        self.pos += 1;
        if self.peek() != Some(b'.') {
            return self.make_text(".", start);
        }
        self.pos += 1;
        if self.peek() == Some(b'.') {
            self.pos += 1;
            self.make_text(ELLIPSIS, start)
        } else {
            self.make_text("..", start)
        }
    }

    fn push_bracket(&mut self, image: bool, inl: NodeId) {
        if let Some(last) = self.brackets.last_mut() {
            last.bracket_after = true;
        }
        self.brackets.push(Bracket {
            inl,
            position: self.pos,
            image,
            active: true,
            bracket_after: false,
        });
    }

    /// Handles `]`. Returns the literal `]` when no link is formed.
    fn handle_close_bracket(&mut self, parent: NodeId) -> Option<NodeId> {
        let start = self.pos;
        self.pos += 1;
        let initial_pos = self.pos;

        let Some(opener) = self.brackets.last().copied() else {
            return Some(self.make_text("]", start));
        };
        if !opener.active {
            self.brackets.pop();
            return Some(self.make_text("]", start));
        }

        let target = self
            .inline_link_target()
            .or_else(|| self.reference_target(&opener, initial_pos));

        let Some((url, title)) = target else {
            self.brackets.pop();
            self.pos = initial_pos;
            return Some(self.make_text("]", start));
        };

        let value = if opener.image {
            NodeValue::Image(NodeLink { url, title })
        } else {
            NodeValue::Link(NodeLink { url, title })
        };
        let opener_start = self
            .arena
            .get(opener.inl)
            .map_or(Position::default(), |n| n.sourcepos.start);
        let mut sourcepos = self.sourcepos(start, self.pos);
        sourcepos.start = opener_start;
        let link = self.arena.alloc(value, sourcepos);

        if let Err(err) = self.arena.insert_before(opener.inl, link) {
            warn!("Cannot place link in {}: {}", parent, err);
            self.arena.free(link);
            self.brackets.pop();
            self.pos = initial_pos;
            return Some(self.make_text("]", start));
        }
        let mut next = self.arena.next(opener.inl);
        while let Some(node) = next {
            next = self.arena.next(node);
            self.append(link, node);
        }
        self.arena.free(opener.inl);

        self.process_emphasis(opener.position);
        self.brackets.pop();

        // Links may not contain other links.
        if !opener.image {
            for bracket in self.brackets.iter_mut().rev().filter(|b| !b.image) {
                if !bracket.active {
                    break;
                }
                bracket.active = false;
            }
        }
        None
    }

    /// Parses `(destination "title")` after `]`, advancing past it.
    fn inline_link_target(&mut self) -> Option<(String, String)> {
        if self.peek() != Some(b'(') {
            return None;
        }
        let input = self.input.as_str();
        let dest_start = self.pos + 1 + scanners::spacechars(&input[self.pos + 1..]);
        let (dest_len, raw_url) = scanners::link_destination(&input[dest_start..])?;
        let end_url = dest_start + dest_len;
        let start_title = end_url + scanners::spacechars(&input[end_url..]);
        let (end_title, raw_title) = if start_title == end_url {
            (start_title, "")
        } else {
            scanners::link_title(&input[start_title..])
                .map_or((start_title, ""), |(len, title)| (start_title + len, title))
        };
        let end_all = end_title + scanners::spacechars(&input[end_title..]);
        if self.peek_at(end_all) != Some(b')') {
            return None;
        }
        let target = (clean_url(raw_url), clean_title(raw_title));
        self.pos = end_all + 1;
        Some(target)
    }

    /// Resolves a full, collapsed or shortcut reference after `]`.
    fn reference_target(
        &mut self,
        opener: &Bracket,
        initial_pos: usize,
    ) -> Option<(String, String)> {
        let found = scanners::link_label(&self.input[self.pos..])
            .map(|(len, label)| (len, label.to_string()));
        let label = match found {
            Some((len, label)) if !label.is_empty() => {
                self.pos += len;
                Some(label)
            }
            found => {
                match found {
                    Some((len, _)) => self.pos += len,
                    None => self.pos = initial_pos,
                }
                (!opener.bracket_after)
                    .then(|| self.input[opener.position..initial_pos - 1].to_string())
            }
        };
        let reference = self.refmap.lookup(&label?)?;
        Some((reference.url.clone(), reference.title.clone()))
    }

    fn literal_len(&self, id: NodeId) -> usize {
        self.arena.literal(id).map_or(0, str::len)
    }

    fn set_text(&mut self, id: NodeId, text: &str) {
        if let Err(err) = self.arena.set_literal(id, text) {
            warn!("Cannot rewrite delimiter text: {}", err);
        }
    }

    fn openers_match(opener: &Delimiter, closer: &Delimiter) -> bool {
        if !opener.can_open || opener.delim_char != closer.delim_char {
            return false;
        }
        match closer.delim_char {
            b'*' | b'_' => {
                !(closer.can_open || opener.can_close)
                    || closer.length % 3 == 0
                    || (opener.length + closer.length) % 3 != 0
            }
            b'~' => opener.length == closer.length,
            _ => true,
        }
    }

    /// Resolves delimiters whose position is at or after `stack_bottom`.
    fn process_emphasis(&mut self, stack_bottom: usize) {
        let mut openers_bottom = [stack_bottom; OPENERS_BOTTOM_SLOTS];
        let Some(mut ci) = self
            .delimiters
            .iter()
            .position(|d| d.position >= stack_bottom)
        else {
            return;
        };

        while ci < self.delimiters.len() {
            let closer = self.delimiters[ci];
            if !closer.can_close {
                ci += 1;
                continue;
            }
            let slot = closer.bottom_slot();

            let opener = self.delimiters[..ci]
                .iter()
                .rposition(|d| d.position < openers_bottom[slot] || Self::openers_match(d, &closer))
                .filter(|&oi| {
                    let d = &self.delimiters[oi];
                    d.position >= stack_bottom
                        && d.position >= openers_bottom[slot]
                        && Self::openers_match(d, &closer)
                });

            if matches!(closer.delim_char, b'\'' | b'"') {
                let right = if closer.delim_char == b'\'' {
                    RIGHT_SINGLE_QUOTE
                } else {
                    RIGHT_DOUBLE_QUOTE
                };
                self.set_text(closer.inl, right);
                if let Some(oi) = opener {
                    let left = if closer.delim_char == b'\'' {
                        LEFT_SINGLE_QUOTE
                    } else {
                        LEFT_DOUBLE_QUOTE
                    };
                    let opener_inl = self.delimiters[oi].inl;
                    self.set_text(opener_inl, left);
                    self.delimiters.remove(ci);
                    self.delimiters.remove(oi);
                    ci -= 1;
                    continue;
                }
            } else if let Some(oi) = opener {
                ci = self.insert_emph(oi, ci);
                continue;
            }

            openers_bottom[slot] = closer.position;
            if closer.can_open {
                ci += 1;
            } else {
                self.delimiters.remove(ci);
            }
        }

        self.delimiters.retain(|d| d.position < stack_bottom);
    }

    /// Wraps the inlines between a matched opener and closer in a new node.
    /// Returns the index of the next closer to consider.
    fn insert_emph(&mut self, oi: usize, ci: usize) -> usize {
        let opener = self.delimiters[oi];
        let closer = self.delimiters[ci];
        let opener_chars = self.literal_len(opener.inl);
        let closer_chars = self.literal_len(closer.inl);

        let used = match closer.delim_char {
            b'~' => closer_chars.min(opener_chars),
            b'^' => 1,
            _ if opener_chars >= 2 && closer_chars >= 2 => 2,
            _ => 1,
        };
        let value = match (closer.delim_char, used) {
            (b'~', 2) => NodeValue::Strikethrough,
            (b'~', _) => NodeValue::Subscript,
            (b'^', _) => NodeValue::Superscript,
            (_, 2) => NodeValue::Strong,
            _ => NodeValue::Emph,
        };

        let opener_left = opener_chars - used;
        let closer_left = closer_chars - used;
        let opener_text = self.input[opener.position - opener.length..][..opener_left].to_string();
        let closer_text = self.input[closer.position - closer.length..][..closer_left].to_string();
        self.set_text(opener.inl, &opener_text);
        self.set_text(closer.inl, &closer_text);

        // Delimiters strictly between the pair can no longer match.
        self.delimiters.drain(oi + 1..ci);
        let mut ci = oi + 1;

        let start = self
            .arena
            .get(opener.inl)
            .map_or(Position::default(), |n| n.sourcepos.start);
        let end = self
            .arena
            .get(closer.inl)
            .map_or(Position::default(), |n| n.sourcepos.end);
        let emph = self.arena.alloc(value, Sourcepos { start, end });

        let mut next = self.arena.next(opener.inl);
        while let Some(node) = next.filter(|&n| n != closer.inl) {
            next = self.arena.next(node);
            self.append(emph, node);
        }
        if let Err(err) = self.arena.insert_after(opener.inl, emph) {
            warn!("Cannot place emphasis: {}", err);
            self.arena.free(emph);
        }

        if opener_left == 0 {
            self.arena.free(opener.inl);
            self.delimiters.remove(oi);
            ci -= 1;
        }
        if closer_left == 0 {
            self.arena.free(closer.inl);
            self.delimiters.remove(ci);
        }
        ci
    }
}

/// Unicode punctuation and symbols, as far as flanking rules care.
fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation()
        || (!c.is_ascii() && !c.is_alphanumeric() && !c.is_whitespace() && !c.is_control())
}

/// Line endings become spaces; one space is stripped from each end when
/// both ends have one and the span is not all spaces.
fn normalize_code(raw: &str) -> String {
    let code = raw.replace("\r\n", " ").replace(['\r', '\n'], " ");
    if code.len() >= 2
        && code.starts_with(' ')
        && code.ends_with(' ')
        && code.bytes().any(|b| b != b' ')
    {
        code[1..code.len() - 1].to_string()
    } else {
        code
    }
}

/// Joins adjacent text nodes and drops empty ones everywhere under `root`.
pub(crate) fn merge_text_nodes(arena: &mut AstArena, root: NodeId) {
    let containers: Vec<NodeId> = arena
        .descendants(root)
        .filter(|&id| arena.first_child(id).is_some())
        .collect();

    for container in containers {
        let mut cur = arena.first_child(container);
        while let Some(node) = cur {
            let Some(NodeValue::Text(text)) = arena.value(node) else {
                cur = arena.next(node);
                continue;
            };
            let mut merged = text.clone();
            let mut next = arena.next(node);
            while let Some(sibling) = next {
                let Some(NodeValue::Text(more)) = arena.value(sibling) else {
                    break;
                };
                merged.push_str(more);
                next = arena.next(sibling);
                if let (Some(end), Some(first)) = (
                    arena.get(sibling).map(|n| n.sourcepos.end),
                    arena.get_mut(node),
                ) {
                    first.sourcepos.end = end;
                }
                arena.free(sibling);
            }
            if merged.is_empty() {
                arena.free(node);
            } else if let Some(NodeValue::Text(text)) = arena.value_mut(node) {
                *text = merged;
            }
            cur = next;
        }
    }
}
