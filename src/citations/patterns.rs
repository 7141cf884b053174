//! Compiled patterns shared by the citation resolver.

use lazy_static::lazy_static;
use regex::Regex;

/// A publication year: 4-digit 19xx/20xx, 2-digit 60-99, optional a-g suffix.
pub(crate) const YEAR: &str = r"(?:(?:19\d\d|20\d\d|[6789]\d)[a-g]?|forthcoming)";

/// An author name token.
const PERSON: &str = r"(?:van |de |\p{Lu}\p{Latin}+|Ciaramita)";

/// Lead-in phrase inside a parenthetical.
const HEAD: &str = r"(?:eg\.|e\.g\.,?|see, e\.g\.,|cf\.|see|See) ";

/// Trailing filler inside a parenthetical.
const FOOT: &str = r"(?:inter alia| |,|\.)+";

lazy_static! {
    /// Family 1: `(Smith, 2001; Jones 2002)` / `[cf. Smith 2001]`
    pub(crate) static ref RE_PARENTHETICAL: Regex = Regex::new(&format!(
        r"(?:\((?:{HEAD})?({PERSON}[^()]*{YEAR})(?:{FOOT})?\))|(?:\[(?:{HEAD})?({PERSON}[^\[\]]*{YEAR})(?:{FOOT})?\])"
    ))
    .unwrap();

    /// Family 2: `Smith (2001)`, `Smith and Jones [2001, 2002]`, `Smith et al.'s (2001)`
    pub(crate) static ref RE_INLINE_YEAR: Regex = Regex::new(&format!(
        r"({PERSON}(?:\sand\s{PERSON}|[, ]+et[. ]al)?)[., ]*(?:['’]s )?[(\[]((?:{YEAR}|[;, ])+)[)\]]"
    ))
    .unwrap();

    /// Family 3: `[Smith, 12]`
    pub(crate) static ref RE_AUTHOR_NUMBER: Regex =
        Regex::new(&format!(r"\[({PERSON})[, ]+(\d\d?)\]")).unwrap();

    /// Family 4: `[3, 4]`
    pub(crate) static ref RE_BRACKET_KEYS: Regex = Regex::new(r"\[([^\[]+?)\]").unwrap();

    /// Leading `[key]` of a bibliography entry
    pub(crate) static ref RE_KEY_BRACKET: Regex = Regex::new(r"^\[([^\[]+?)\]").unwrap();

    /// Leading `12. Smith` of a bibliography entry
    pub(crate) static ref RE_KEY_NUMBERED: Regex = Regex::new(r"^(\d\d?)\.\s?\p{Lu}").unwrap();

    pub(crate) static ref RE_YEAR: Regex = Regex::new(YEAR).unwrap();

    /// The character separating a year from the next entry
    pub(crate) static ref RE_YEAR_SEPARATOR: Regex = Regex::new(&format!(r"{YEAR}(\W)\D")).unwrap();

    /// Two years in a row (`2001, 2002`)
    pub(crate) static ref RE_YEAR_LIST: Regex = Regex::new(&format!(r"{YEAR}[,; ]+{YEAR}")).unwrap();

    /// A name followed by a year list
    pub(crate) static ref RE_NAMES_YEARS: Regex =
        Regex::new(&format!(r"^(\D+?)({YEAR}(?:[,; ]+{YEAR})+)$")).unwrap();

    pub(crate) static ref RE_YEAR_LIST_SEP: Regex = Regex::new(r"[,; ]+").unwrap();

    /// Separators between the tokens of a mention
    pub(crate) static ref RE_TOKEN_SEP: Regex = Regex::new(r"[,. ]+").unwrap();

    /// Tokens ignored when building a search pattern
    pub(crate) static ref RE_FILLER: Regex = Regex::new(r"^(?:and|et|al|others)$").unwrap();

    /// Multi-author mentions prefer the longest bibliography match
    pub(crate) static ref RE_ET_AL: Regex = Regex::new(r"et[,. ]+al|others").unwrap();

    /// Inline mark placeholder
    pub(crate) static ref RE_PLACEHOLDER: Regex = Regex::new(r#"<refer cite="(\d+)">"#).unwrap();
}

/// Inline placeholder for mark `id`.
pub(crate) fn placeholder(id: usize) -> String {
    format!("<refer cite=\"{}\">", id)
}

/// Split `whole` at `separator` wherever it directly follows a year
/// (two digits, or a digit and a letter suffix).
pub(crate) fn split_after_year(whole: &str, separator: &str) -> Vec<String> {
    let re = match Regex::new(&format!(r"\s?{}\s*", regex::escape(separator))) {
        Ok(re) => re,
        Err(_) => return vec![whole.to_string()],
    };
    let mut parts = Vec::new();
    let mut last = 0;
    for m in re.find_iter(whole) {
        let mut before = whole[..m.start()].chars().rev();
        let ends_year = match (before.next(), before.next()) {
            (Some(b), Some(a)) => a.is_ascii_digit() && (b.is_ascii_digit() || ('a'..='e').contains(&b)),
            _ => false,
        };
        if ends_year {
            parts.push(whole[last..m.start()].to_string());
            last = m.end();
        }
    }
    parts.push(whole[last..].to_string());
    parts
}

/// Expand `Smith 2001, 2002` into `Smith 2001` and `Smith 2002`.
pub(crate) fn split_year_lists(cites: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(cites.len());
    for cite in cites {
        match RE_NAMES_YEARS.captures(&cite) {
            Some(caps) => {
                let names = &caps[1];
                for year in RE_YEAR_LIST_SEP.split(&caps[2]).filter(|y| !y.is_empty()) {
                    out.push(format!("{} {}", names, year));
                }
            },
            None => out.push(cite),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year() {
        assert!(RE_YEAR.is_match("2001"));
        assert!(RE_YEAR.is_match("1999b"));
        assert!(RE_YEAR.is_match("forthcoming"));
        assert!(!RE_YEAR.is_match("12 and 34"));
    }

    #[test]
    fn test_parenthetical() {
        let caps = RE_PARENTHETICAL.captures("as shown (e.g., Smith, 2001; Jones 2002) here").unwrap();
        assert_eq!(&caps[1], "Smith, 2001; Jones 2002");
        let caps = RE_PARENTHETICAL.captures("shown [cf. Smith 2001]").unwrap();
        assert_eq!(&caps[2], "Smith 2001");
        assert!(RE_PARENTHETICAL.captures("in (2001) we").is_none());
    }

    #[test]
    fn test_inline_year() {
        let caps = RE_INLINE_YEAR.captures("Smith (2001) showed").unwrap();
        assert_eq!(&caps[0], "Smith (2001)");
        assert_eq!(&caps[1], "Smith");
        assert_eq!(&caps[2], "2001");
        let caps = RE_INLINE_YEAR.captures("Smith et al. (2001, 2002)").unwrap();
        assert_eq!(&caps[1], "Smith et al");
        assert_eq!(&caps[2], "2001, 2002");
        let caps = RE_INLINE_YEAR.captures("Brown and Green [1999]").unwrap();
        assert_eq!(&caps[1], "Brown and Green");
    }

    #[test]
    fn test_author_number_and_keys() {
        let caps = RE_AUTHOR_NUMBER.captures("see [Smith, 12].").unwrap();
        assert_eq!((&caps[1], &caps[2]), ("Smith", "12"));
        assert_eq!(&RE_BRACKET_KEYS.captures("in [3, 4].").unwrap()[1], "3, 4");
        assert_eq!(&RE_KEY_BRACKET.captures("[A1] Smith").unwrap()[1], "A1");
        assert_eq!(&RE_KEY_NUMBERED.captures("12. Smith, J.").unwrap()[1], "12");
        assert!(RE_KEY_NUMBERED.captures("12. smith").is_none());
    }

    #[test]
    fn test_split_after_year() {
        assert_eq!(split_after_year("Smith, 2001; Jones, 2002", ";"), vec!["Smith, 2001", "Jones, 2002"]);
        assert_eq!(split_after_year("Smith, 2001a, Jones 2002", ","), vec!["Smith, 2001a", "Jones 2002"]);
        assert_eq!(split_after_year("Smith; Jones 2002", ";"), vec!["Smith; Jones 2002"]);
    }

    #[test]
    fn test_split_year_lists() {
        let out = split_year_lists(vec!["Smith 2001, 2002".into(), "Jones 1999".into()]);
        assert_eq!(out, vec!["Smith  2001", "Smith  2002", "Jones 1999"]);
    }

    #[test]
    fn test_placeholder() {
        let p = placeholder(7);
        assert_eq!(&RE_PLACEHOLDER.captures(&p).unwrap()[1], "7");
    }
}
