//! Link reference definitions.

use std::collections::HashMap;

use crate::entity::unescape;
use crate::scanners;

/// The resolved target of a reference link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Reference {
    pub url: String,
    pub title: String,
}

/// Definitions collected while parsing one document, keyed by normalized
/// label. The first definition of a label wins.
#[derive(Debug, Default)]
pub(crate) struct RefMap {
    map: HashMap<String, Reference>,
}

impl RefMap {
    pub fn lookup(&self, raw_label: &str) -> Option<&Reference> {
        let label = normalize_label(raw_label);
        if label.is_empty() {
            return None;
        }
        self.map.get(&label)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    fn insert(&mut self, label: String, reference: Reference) {
        self.map.entry(label).or_insert(reference);
    }

    /// Consumes definitions from the start of a paragraph's content.
    ///
    /// Returns the number of bytes consumed.
    pub fn parse_definitions(&mut self, content: &str) -> usize {
        let mut consumed = 0;
        while content[consumed..].starts_with('[') {
            match parse_definition(&content[consumed..]) {
                Some((len, label, reference)) => {
                    self.insert(label, reference);
                    consumed += len;
                }
                None => break,
            }
        }
        consumed
    }
}

/// Case-folds a label and collapses internal whitespace.
pub(crate) fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Strips angle brackets and resolves escapes in a link destination.
pub(crate) fn clean_url(raw: &str) -> String {
    let trimmed = scanners::trim_markup_space(raw);
    unescape(trimmed)
}

/// Resolves escapes in a link title. `raw` excludes the delimiters.
pub(crate) fn clean_title(raw: &str) -> String {
    unescape(raw)
}

/// Parses one `[label]: destination "title"` definition.
fn parse_definition(content: &str) -> Option<(usize, String, Reference)> {
    let (label_len, raw_label) = scanners::link_label(content)?;
    let label = normalize_label(raw_label);
    if label.is_empty() {
        return None;
    }

    let mut pos = label_len;
    if content[pos..].as_bytes().first() != Some(&b':') {
        return None;
    }
    pos += 1;
    pos += spnl(&content[pos..]);

    let (dest_len, raw_url) = scanners::link_destination(&content[pos..])?;
    let angled = content[pos..].starts_with('<');
    if dest_len == 0 && !angled {
        return None;
    }
    pos += dest_len;

    let before_title = pos;
    pos += spnl(&content[pos..]);
    let mut title = "";
    if pos != before_title {
        if let Some((title_len, raw_title)) = scanners::link_title(&content[pos..]) {
            title = raw_title;
            pos += title_len;
        } else {
            pos = before_title;
        }
    } else {
        pos = before_title;
    }

    let mut end = skip_to_line_end(&content[pos..]).map(|n| pos + n);
    if end.is_none() && !title.is_empty() {
        // The title must end its line; otherwise try again without it.
        title = "";
        end = skip_to_line_end(&content[before_title..]).map(|n| before_title + n);
    }
    let end = end?;

    Some((
        end,
        label,
        Reference {
            url: clean_url(raw_url),
            title: clean_title(title),
        },
    ))
}

/// Skips spaces and at most one line ending.
fn spnl(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = bytes.iter().take_while(|&&b| scanners::is_space_or_tab(b)).count();
    if bytes.get(i) == Some(&b'\r') {
        i += 1;
    }
    if bytes.get(i) == Some(&b'\n') {
        i += 1;
    }
    i + bytes[i..]
        .iter()
        .take_while(|&&b| scanners::is_space_or_tab(b))
        .count()
}

/// Skips trailing spaces up to and including the line end, or to the end of
/// the input.
fn skip_to_line_end(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let i = bytes.iter().take_while(|&&b| scanners::is_space_or_tab(b)).count();
    match bytes.get(i) {
        None => Some(i),
        Some(b'\n') => Some(i + 1),
        Some(b'\r') if bytes.get(i + 1) == Some(&b'\n') => Some(i + 2),
        Some(b'\r') => Some(i + 1),
        Some(_) => None,
    }
}
