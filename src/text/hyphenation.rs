//! Line-wrap hyphen detection.
//!
//! When a word is broken across lines the analyzer emits the first half ending
//! in a hyphen and marks the next token as beginning a line (`data-space="bol"`).
//! Reconstruction must not put a space between the two halves, so the spacing
//! policy asks [`ends_with_wrap_hyphen`] about the previous word.
//!
//! Both the hard hyphen (U+002D) and the soft hyphen (U+00AD) count. A hyphen
//! preceded by whitespace (`"a -"`) is a dash, not a wrap.

const HARD_HYPHEN: char = '-';
const SOFT_HYPHEN: char = '\u{00AD}';

/// Check if a word ends with a hyphen that wraps onto the next line.
///
/// ```
/// # use pdfnlt_postprocess::text::ends_with_wrap_hyphen;
/// assert!(ends_with_wrap_hyphen("recon-"));
/// assert!(ends_with_wrap_hyphen("-"));
/// assert!(!ends_with_wrap_hyphen("a -"));
/// assert!(!ends_with_wrap_hyphen("word"));
/// ```
pub fn ends_with_wrap_hyphen(text: &str) -> bool {
    let mut chars = text.chars().rev();
    match chars.next() {
        Some(HARD_HYPHEN) | Some(SOFT_HYPHEN) => {},
        _ => return false,
    }
    match chars.next() {
        Some(prev) => !prev.is_whitespace(),
        None => true,
    }
}
