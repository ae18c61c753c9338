//! Line-oriented output buffer with prefixes, wrapping and escaping.
//!
//! The writer tracks the prefix every new line starts with (block quote
//! markers and list indentation), defers line breaks until the next output so
//! that trailing breaks collapse, and breaks long lines at the last space once
//! the column passes the configured width.

use unicode_segmentation::UnicodeSegmentation;

/// How the characters passed to [`Writer::out`] are escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Escaping {
    /// Written as is. Newlines start a new prefixed line.
    Literal,
    /// Inline text: markup characters get a backslash.
    Normal,
    /// Link destination.
    Url,
    /// Link title inside double quotes.
    Title,
}

#[derive(Debug)]
pub(crate) struct Writer {
    buffer: String,
    /// Written at the start of every line.
    pub prefix: String,
    width: usize,
    column: usize,
    need_cr: u8,
    /// Byte offset of the last space a line may be broken at.
    last_breakable: Option<usize>,
    begin_line: bool,
    /// True until the first non-digit character of a line's content.
    pub begin_content: bool,
    /// Set inside headings, which must stay on one line.
    pub no_linebreaks: bool,
    /// Collapses blank lines to single breaks.
    pub in_tight_list_item: bool,
}

impl Writer {
    pub fn new(width: usize) -> Self {
        Self {
            buffer: String::new(),
            prefix: String::new(),
            width,
            column: 0,
            need_cr: 0,
            last_breakable: None,
            begin_line: true,
            begin_content: true,
            no_linebreaks: false,
            in_tight_list_item: false,
        }
    }

    /// Requests a line break before the next output.
    pub fn cr(&mut self) {
        self.need_cr = self.need_cr.max(1);
    }

    /// Requests a blank line before the next output.
    pub fn blankline(&mut self) {
        self.need_cr = self.need_cr.max(2);
    }

    /// Writes `s` without escaping or wrapping.
    pub fn lit(&mut self, s: &str) {
        self.out(s, false, Escaping::Literal);
    }

    /// Pushes `width` spaces onto the prefix.
    pub fn indent(&mut self, width: usize) {
        self.prefix.extend(std::iter::repeat_n(' ', width));
    }

    /// Pops `width` bytes off the prefix.
    pub fn dedent(&mut self, width: usize) {
        let len = self.prefix.len().saturating_sub(width);
        self.prefix.truncate(len);
    }

    /// Returns the output, terminated by a newline.
    pub fn finish(mut self) -> String {
        if !self.buffer.ends_with('\n') {
            self.buffer.push('\n');
        }
        self.buffer
    }

    /// Writes `source`, flushing pending line breaks first.
    ///
    /// With `wrap`, spaces become break opportunities and runs of spaces
    /// collapse to one.
    pub fn out(&mut self, source: &str, wrap: bool, escape: Escaping) {
        let wrap = wrap && !self.no_linebreaks;
        self.flush_breaks();

        let bytes = source.as_bytes();
        let mut graphemes = source.grapheme_indices(true).peekable();
        while let Some((i, g)) = graphemes.next() {
            let next = bytes.get(i + g.len()).copied();

            if g == " " && wrap {
                // Leading spaces of a line are dropped.
                if !self.begin_line {
                    let at = self.buffer.len();
                    self.buffer.push(' ');
                    self.column += 1;
                    self.begin_content = false;
                    while graphemes.next_if(|&(_, g)| g == " ").is_some() {}
                    let following = graphemes.peek().and_then(|(_, g)| g.bytes().next());
                    if !following.is_some_and(starts_block_at_line_start) {
                        self.last_breakable = Some(at);
                    }
                }
            } else {
                if self.begin_line {
                    self.buffer.push_str(&self.prefix);
                    self.column = self.prefix.len();
                }

                let first = g.chars().next().unwrap_or_default();
                if escape == Escaping::Literal {
                    self.buffer.push_str(g);
                    if g.ends_with('\n') {
                        self.column = 0;
                        self.begin_line = true;
                        self.begin_content = true;
                        self.last_breakable = None;
                    } else {
                        self.column += 1;
                        self.begin_line = false;
                        self.begin_content = self.begin_content && first.is_ascii_digit();
                    }
                } else {
                    self.outc(g, first, escape, next);
                    self.begin_line = false;
                    self.begin_content = self.begin_content && first.is_ascii_digit();
                }
            }

            if self.width > 0 && self.column > self.width && !self.begin_line {
                self.break_at_last_space();
            }
        }
    }

    fn flush_breaks(&mut self) {
        if self.in_tight_list_item && self.need_cr > 1 {
            self.need_cr = 1;
        }
        // Newlines already at the end of the buffer count towards the request.
        let mut unseen = self.buffer.len();
        while self.need_cr > 0 {
            if unseen == 0 || self.buffer.as_bytes()[unseen - 1] == b'\n' {
                unseen = unseen.saturating_sub(1);
            } else {
                self.buffer.push('\n');
                if self.need_cr > 1 {
                    self.buffer.push_str(self.prefix.trim_end());
                }
            }
            self.column = 0;
            self.last_breakable = None;
            self.begin_line = true;
            self.begin_content = true;
            self.need_cr -= 1;
        }
    }

    fn break_at_last_space(&mut self) {
        let Some(at) = self.last_breakable.take() else {
            return;
        };
        let remainder = self.buffer.split_off(at + 1);
        self.buffer.truncate(at);
        self.buffer.push('\n');
        self.buffer.push_str(&self.prefix);
        self.buffer.push_str(&remainder);
        self.column = self.prefix.len() + remainder.graphemes(true).count();
        self.begin_line = false;
        self.begin_content = false;
    }

    fn outc(&mut self, g: &str, c: char, escape: Escaping, next: Option<u8>) {
        let follows_digit = self.buffer.as_bytes().last().is_some_and(u8::is_ascii_digit);
        let needs_escaping = c.is_ascii()
            && match escape {
                Escaping::Literal => false,
                Escaping::Normal => {
                    c.is_ascii_control()
                        || matches!(
                            c,
                            '*' | '_' | '[' | ']' | '#' | '<' | '>' | '\\' | '`' | '~' | '^' | '!'
                        )
                        || (c == '&' && next.is_some_and(|b| b.is_ascii_alphabetic()))
                        || (self.begin_content && matches!(c, '-' | '+' | '=') && !follows_digit)
                        || (self.begin_content
                            && matches!(c, '.' | ')')
                            && follows_digit
                            && next.is_none_or(|b| b.is_ascii_whitespace()))
                        || (self.begin_content && c == ':' && next == Some(b':'))
                }
                Escaping::Url => {
                    matches!(c, '`' | '<' | '>' | '\\' | '(' | ')') || c.is_ascii_whitespace()
                }
                Escaping::Title => matches!(c, '`' | '<' | '>' | '"' | '\\'),
            };

        if !needs_escaping {
            self.buffer.push_str(g);
            self.column += 1;
        } else if escape == Escaping::Url && c.is_ascii_whitespace() {
            let encoded = format!("%{:02X}", u32::from(c));
            self.column += encoded.len();
            self.buffer.push_str(&encoded);
        } else if c.is_ascii_punctuation() {
            self.buffer.push('\\');
            self.buffer.push_str(g);
            self.column += 2;
        } else {
            let encoded = format!("&#{};", u32::from(c));
            self.column += encoded.len();
            self.buffer.push_str(&encoded);
            self.buffer.push_str(&g[c.len_utf8()..]);
        }
    }
}

/// Characters that must not begin a wrapped line, since the line would then
/// parse as a list item, a setext underline or a spoiler fence.
fn starts_block_at_line_start(b: u8) -> bool {
    b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'=' | b':')
}
