//! Entity decoding and backslash unescaping.

use crate::scanners;

/// Decodes the entity reference at the start of `s`.
///
/// Returns the decoded text and the number of bytes consumed, or `None` if
/// `s` does not start with a known entity. Numeric references to code point
/// zero, surrogates or values past U+10FFFF decode to U+FFFD.
pub(crate) fn decode_entity(s: &str) -> Option<(String, usize)> {
    let raw = scanners::entity(s)?;
    let body = &raw[1..raw.len() - 1];

    if let Some(number) = body.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => number.parse::<u32>(),
        }
        .ok()?;
        let c = match code {
            0 => char::REPLACEMENT_CHARACTER,
            code => char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER),
        };
        return Some((c.to_string(), raw.len()));
    }

    let decoded = html_escape::decode_html_entities(raw);
    (decoded != raw).then(|| (decoded.into_owned(), raw.len()))
}

/// Resolves backslash escapes of ASCII punctuation and entity references.
pub(crate) fn unescape(s: &str) -> String {
    resolve(s, true)
}

/// Resolves entity references only.
pub(crate) fn decode_entities(s: &str) -> String {
    resolve(s, false)
}

fn resolve(s: &str, backslashes: bool) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if backslashes && bytes.get(i + 1).is_some_and(u8::is_ascii_punctuation) => {
                out.push_str(&s[start..i]);
                out.push(bytes[i + 1] as char);
                i += 2;
                start = i;
            }
            b'&' => match decode_entity(&s[i..]) {
                Some((text, len)) => {
                    out.push_str(&s[start..i]);
                    out.push_str(&text);
                    i += len;
                    start = i;
                }
                None => i += 1,
            },
            _ => i += 1,
        }
    }
    out.push_str(&s[start..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case::named("&amp;", "&")]
    #[case::named_quote("&ldquo; tail", "\u{201c}")]
    #[case::decimal("&#35;", "#")]
    #[case::hex("&#X22;", "\"")]
    #[case::zero("&#0;", "\u{fffd}")]
    #[case::surrogate("&#xD800;", "\u{fffd}")]
    fn test_decode_entity(#[case] input: &str, #[case] expected: &str) {
        let (text, _) = decode_entity(input).unwrap();
        assert_eq!(text, expected);
    }

    #[test]
    fn test_decode_entity_rejects_unknown_names() {
        assert_eq!(decode_entity("&notanentity;"), None);
        assert_eq!(decode_entity("&amp"), None);
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"a\*b\c &amp; d"), r"a*b\c & d");
        assert_eq!(unescape("x &bogus; y"), "x &bogus; y");
        assert_eq!(decode_entities(r"a\*b &lt;"), r"a\*b <");
    }
}
