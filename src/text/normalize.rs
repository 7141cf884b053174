//! Literal text normalization for reconstructed words.
//!
//! Every literal token goes through [`normalize_token`]: runs of whitespace
//! collapse to a single space and presentation-form ligatures (U+FB00..U+FB06)
//! expand to their ASCII letters.

use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;

lazy_static! {
    static ref RE_WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Expand a ligature character to its ASCII equivalent.
///
/// ```
/// # use pdfnlt_postprocess::text::expand_ligature_char;
/// assert_eq!(expand_ligature_char('ﬁ'), Some("fi"));
/// assert_eq!(expand_ligature_char('ﬆ'), Some("st"));
/// assert_eq!(expand_ligature_char('A'), None);
/// ```
pub fn expand_ligature_char(c: char) -> Option<&'static str> {
    match c {
        'ﬀ' => Some("ff"),  // U+FB00
        'ﬁ' => Some("fi"),  // U+FB01
        'ﬂ' => Some("fl"),  // U+FB02
        'ﬃ' => Some("ffi"), // U+FB03
        'ﬄ' => Some("ffl"), // U+FB04
        'ﬅ' => Some("st"),  // U+FB05
        'ﬆ' => Some("st"),  // U+FB06
        _ => None,
    }
}

/// Replace every ligature in `text` with its expansion.
pub fn expand_ligatures(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|c| expand_ligature_char(c).is_some()) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 4);
    for c in text.chars() {
        match expand_ligature_char(c) {
            Some(expanded) => out.push_str(expanded),
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Collapse each run of whitespace into one space.
pub fn collapse_whitespace(text: &str) -> Cow<'_, str> {
    RE_WHITESPACE.replace_all(text, " ")
}

/// Normalize a literal token: whitespace first, then ligatures.
pub fn normalize_token(text: &str) -> String {
    expand_ligatures(&collapse_whitespace(text)).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_ligatures_expand() {
        assert_eq!(normalize_token("\u{FB00}\u{FB01}\u{FB02}\u{FB03}\u{FB04}\u{FB05}\u{FB06}"), "fffiflffifflstst");
    }

    #[test]
    fn test_ligature_inside_word() {
        assert_eq!(normalize_token("ef\u{FB01}cient"), "efficient");
        assert_eq!(normalize_token("e\u{FB03}cient"), "efficient");
    }

    #[test]
    fn test_whitespace_collapse() {
        assert_eq!(normalize_token("a \t\n b"), "a b");
        assert_eq!(normalize_token("  "), " ");
        assert_eq!(normalize_token(""), "");
    }

    #[test]
    fn test_plain_text_is_borrowed() {
        assert!(matches!(expand_ligatures("plain"), Cow::Borrowed(_)));
    }
}
