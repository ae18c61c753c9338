//! Byte-level scanners for block starts, link parts and autolinks.
//!
//! Every scanner takes the input from the position to scan at and returns the
//! number of bytes matched, so callers can advance by that amount.

use std::sync::LazyLock;

use regex::Regex;

static SCHEME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9.+-]{1,31}:").expect("Invalid scheme regex")
});

static AUTOLINK_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<([A-Za-z][A-Za-z0-9.+-]{1,31}:[^<>\x00-\x20]*)>")
        .expect("Invalid autolink regex")
});

static AUTOLINK_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^<([a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@",
        r"[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?",
        r"(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*)>",
    ))
    .expect("Invalid e-mail autolink regex")
});

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^&(?:#[xX][0-9a-fA-F]{1,6}|#[0-9]{1,7}|[A-Za-z][A-Za-z0-9]{1,31});")
        .expect("Invalid entity regex")
});

const MAX_LABEL_LENGTH: usize = 999;
const MAX_LINK_PAREN_DEPTH: usize = 32;

/// Which character underlines a setext heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SetextChar {
    Equals,
    Hyphen,
}

#[inline]
pub(crate) fn is_line_end_char(b: u8) -> bool {
    matches!(b, b'\n' | b'\r')
}

#[inline]
pub(crate) fn is_space_or_tab(b: u8) -> bool {
    matches!(b, b' ' | b'\t')
}

/// Markup whitespace. Unlike `char::is_whitespace` this leaves U+00A0 and
/// other Unicode spaces as content.
pub(crate) const SPACE_TAB: [char; 2] = [' ', '\t'];

/// Trims spaces, tabs and line endings from both ends.
pub(crate) fn trim_markup_space(s: &str) -> &str {
    s.trim_matches([' ', '\t', '\n', '\r'])
}

/// Returns `true` if `url` starts with a URI scheme such as `https:`.
pub fn has_scheme(url: &str) -> bool {
    SCHEME.is_match(url)
}

/// `#{1,6}` followed by whitespace or the end of the line. The match covers
/// the hashes and any spaces after them.
pub(crate) fn atx_heading_start(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let hashes = bytes.iter().take_while(|&&b| b == b'#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    match bytes.get(hashes) {
        None => Some(hashes),
        Some(&b) if is_line_end_char(b) => Some(hashes),
        Some(&b) if is_space_or_tab(b) => {
            let spaces = bytes[hashes..]
                .iter()
                .take_while(|&&b| is_space_or_tab(b))
                .count();
            Some(hashes + spaces)
        }
        Some(_) => None,
    }
}

/// Three or more backticks or tildes. A backtick fence may not be followed
/// by another backtick on the same line. The match covers the fence only.
pub(crate) fn open_code_fence(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let fence_char = *bytes.first()?;
    if fence_char != b'`' && fence_char != b'~' {
        return None;
    }
    let len = bytes.iter().take_while(|&&b| b == fence_char).count();
    if len < 3 {
        return None;
    }
    if fence_char == b'`'
        && bytes[len..]
            .iter()
            .take_while(|&&b| !is_line_end_char(b))
            .any(|&b| b == b'`')
    {
        return None;
    }
    Some(len)
}

/// A closing fence of at least three `fence_char`, followed only by spaces.
pub(crate) fn close_code_fence(s: &str, fence_char: u8) -> Option<usize> {
    let bytes = s.as_bytes();
    let len = bytes.iter().take_while(|&&b| b == fence_char).count();
    if len < 3 {
        return None;
    }
    bytes[len..]
        .iter()
        .find(|&&b| !is_space_or_tab(b))
        .is_none_or(|&b| is_line_end_char(b))
        .then_some(len)
}

/// A line of `=` or `-` characters, optionally followed by spaces.
pub(crate) fn setext_heading_line(s: &str) -> Option<SetextChar> {
    let bytes = s.as_bytes();
    let kind = match bytes.first()? {
        b'=' => SetextChar::Equals,
        b'-' => SetextChar::Hyphen,
        _ => return None,
    };
    let c = bytes[0];
    let rest = s.trim_start_matches(c as char);
    rest.trim_end_matches(['\n', '\r'])
        .bytes()
        .all(is_space_or_tab)
        .then_some(kind)
}

/// The opening line of a spoiler block: `:::`, an optional `spoiler`
/// keyword, then the title. Returns the trimmed title.
pub(crate) fn spoiler_start(s: &str) -> Option<&str> {
    let rest = s.strip_prefix(":::")?;
    if rest.starts_with(':') {
        return None;
    }
    let rest = trim_markup_space(rest);
    let title = match rest.strip_prefix("spoiler") {
        Some(after) if after.is_empty() || after.starts_with(SPACE_TAB) => {
            trim_markup_space(after)
        }
        _ => rest,
    };
    Some(title)
}

/// A line holding only `:::`.
pub(crate) fn spoiler_end(s: &str) -> bool {
    s.trim_end_matches([' ', '\t', '\n', '\r']) == ":::"
}

/// Number of leading whitespace bytes, line endings included.
pub(crate) fn spacechars(s: &str) -> usize {
    s.bytes()
        .take_while(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c))
        .count()
}

/// A bracketed link label. Returns the matched length (brackets included)
/// and the raw label between them.
pub(crate) fn link_label(s: &str) -> Option<(usize, &str)> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'[') {
        return None;
    }
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if bytes.get(i + 1).is_some_and(u8::is_ascii_punctuation) => i += 2,
            b'[' => return None,
            b']' => {
                let label = &s[1..i];
                return (label.len() <= MAX_LABEL_LENGTH).then_some((i + 1, label));
            }
            _ => i += 1,
        }
        if i > MAX_LABEL_LENGTH + 1 {
            return None;
        }
    }
    None
}

/// A link destination: either `<...>` or a run with balanced parentheses.
/// Returns the matched length and the raw destination.
pub(crate) fn link_destination(s: &str) -> Option<(usize, &str)> {
    let bytes = s.as_bytes();
    if bytes.first() == Some(&b'<') {
        let mut i = 1;
        while i < bytes.len() {
            match bytes[i] {
                b'>' => return Some((i + 1, &s[1..i])),
                b'\\' if bytes.get(i + 1).is_some_and(u8::is_ascii_punctuation) => i += 2,
                b'<' | b'\n' | b'\r' => return None,
                _ => i += 1,
            }
        }
        return None;
    }

    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if bytes.get(i + 1).is_some_and(u8::is_ascii_punctuation) => i += 2,
            b'(' => {
                depth += 1;
                if depth > MAX_LINK_PAREN_DEPTH {
                    return None;
                }
                i += 1;
            }
            b')' if depth == 0 => break,
            b')' => {
                depth -= 1;
                i += 1;
            }
            b if b == b' ' || b.is_ascii_control() => break,
            _ => i += 1,
        }
    }
    if i >= bytes.len() || depth != 0 {
        return None;
    }
    Some((i, &s[..i]))
}

/// A link title in double quotes, single quotes or parentheses. Returns the
/// matched length (delimiters included) and the raw title between them.
pub(crate) fn link_title(s: &str) -> Option<(usize, &str)> {
    let bytes = s.as_bytes();
    let close = match bytes.first()? {
        b'"' => b'"',
        b'\'' => b'\'',
        b'(' => b')',
        _ => return None,
    };
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if bytes.get(i + 1).is_some_and(u8::is_ascii_punctuation) => i += 2,
            b if b == close => return Some((i + 1, &s[1..i])),
            b'(' if close == b')' => return None,
            _ => i += 1,
        }
    }
    None
}

/// `<scheme:...>`. Returns the matched length and the URI.
pub(crate) fn autolink_uri(s: &str) -> Option<(usize, &str)> {
    let caps = AUTOLINK_URI.captures(s)?;
    Some((caps.get(0)?.end(), caps.get(1)?.as_str()))
}

/// `<user@host>`. Returns the matched length and the address.
pub(crate) fn autolink_email(s: &str) -> Option<(usize, &str)> {
    let caps = AUTOLINK_EMAIL.captures(s)?;
    Some((caps.get(0)?.end(), caps.get(1)?.as_str()))
}

/// `&name;`, `&#123;` or `&#x7b;`. Returns the matched text.
pub(crate) fn entity(s: &str) -> Option<&str> {
    ENTITY.find(s).map(|m| m.as_str())
}
