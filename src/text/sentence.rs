//! Abbreviation-aware sentence boundary detection.
//!
//! A token ending in `.`, `?` or `!` (optionally followed by closing quotes or
//! brackets) ends a sentence when another token follows it, unless the period
//! belongs to an abbreviation:
//! - a configured abbreviation (`dr`, `vs`, `i.e`, ...), compared case-insensitively
//! - a dotted letter sequence (`e.g.`, `U.S.`)
//! - an ellipsis (`...`)
//!
//! Initials (`J.`) and numbers (`3.`) are ambiguous. An initial followed by a
//! word is not a boundary; a number followed by a lowercase word is not one either.
//!
//! Unlike a tokenizer that drops inter-sentence whitespace, the spans returned
//! here are contiguous: each sentence owns the whitespace that follows it and
//! the last sentence runs to the end of the text. Concatenating the sentences
//! therefore reproduces the input exactly.

use std::collections::HashSet;

/// Abbreviations known by default.
pub const DEFAULT_ABBREVIATIONS: &[&str] = &["dr", "vs", "mr", "mrs", "prof", "inc", "i.e"];

/// Characters that may trail sentence-final punctuation.
const CLOSERS: &[char] = &[')', ']', '}', '"', '\'', '\u{2019}', '\u{201D}'];

/// Characters that may open a token before an abbreviation.
const OPENERS: &[char] = &['(', '[', '{', '"', '\'', '\u{2018}', '\u{201C}'];

/// Sentence splitter.
#[derive(Debug, Clone)]
pub struct SentenceSplitter {
    abbreviations: HashSet<String>,
}

impl Default for SentenceSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_ABBREVIATIONS.iter().copied())
    }
}

impl SentenceSplitter {
    /// Create a splitter with the given abbreviations (without trailing period).
    pub fn new<I, S>(abbreviations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            abbreviations: abbreviations
                .into_iter()
                .map(|a| a.as_ref().trim_end_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Add abbreviations to the splitter.
    pub fn with_abbreviations<I, S>(mut self, abbreviations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.abbreviations.extend(
            abbreviations
                .into_iter()
                .map(|a| a.as_ref().trim_end_matches('.').to_lowercase()),
        );
        self
    }

    /// Split `text` into contiguous sentence spans (byte offsets, end exclusive).
    ///
    /// Text made only of whitespace yields no sentences.
    pub fn span_tokenize(&self, text: &str) -> Vec<(usize, usize)> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let tokens = token_spans(text);
        let mut spans = Vec::new();
        let mut start = 0;
        for pair in tokens.windows(2) {
            let (s, e) = pair[0];
            let (ns, ne) = pair[1];
            if self.is_boundary(&text[s..e], &text[ns..ne]) {
                spans.push((start, ns));
                start = ns;
            }
        }
        spans.push((start, text.len()));
        spans
    }

    /// Split `text` into sentence strings.
    pub fn sentences<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.span_tokenize(text)
            .into_iter()
            .map(|(s, e)| &text[s..e])
            .collect()
    }

    fn is_boundary(&self, token: &str, next: &str) -> bool {
        let core = token.trim_end_matches(CLOSERS);
        match core.chars().last() {
            Some('?') | Some('!') => return true,
            Some('.') => {},
            _ => return false,
        }
        if core.ends_with("..") || self.is_abbreviation(core) {
            return false;
        }

        let word = core.trim_end_matches('.').trim_start_matches(OPENERS);
        let next_first = next.trim_start_matches(OPENERS).chars().next();
        let mut chars = word.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_alphabetic() {
                return !next_first.is_some_and(char::is_alphabetic);
            }
        }
        if !word.is_empty() && word.chars().all(|c| c.is_ascii_digit()) {
            return !next_first.is_some_and(char::is_lowercase);
        }
        true
    }

    fn is_abbreviation(&self, core: &str) -> bool {
        let word = core.trim_end_matches('.').trim_start_matches(OPENERS);
        if word.is_empty() {
            return false;
        }
        if self.abbreviations.contains(&word.to_lowercase()) {
            return true;
        }
        word.contains('.')
            && word.split('.').all(|part| {
                let mut cs = part.chars();
                matches!((cs.next(), cs.next()), (Some(c), None) if c.is_alphabetic())
            })
    }
}

fn token_spans(text: &str) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                out.push((s, i));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        out.push((s, text.len()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_sentences() {
        let s = SentenceSplitter::default();
        let text = "Smith showed this. However, we argue that.\n\n";
        assert_eq!(s.sentences(text), vec!["Smith showed this. ", "However, we argue that.\n\n"]);
    }

    #[test]
    fn test_spans_are_contiguous() {
        let s = SentenceSplitter::default();
        let text = " Ab cd. Ef gh? Ij kl! Mn";
        let spans = s.span_tokenize(text);
        assert_eq!(spans.first().unwrap().0, 0);
        assert_eq!(spans.last().unwrap().1, text.len());
        for w in spans.windows(2) {
            assert_eq!(w[0].1, w[1].0);
        }
        assert_eq!(spans.len(), 4);
    }

    #[test]
    fn test_abbreviations_do_not_split() {
        let s = SentenceSplitter::default();
        assert_eq!(s.sentences("Ask Dr. Smith about it.").len(), 1);
        assert_eq!(s.sentences("Cats vs. dogs.").len(), 1);
        assert_eq!(s.sentences("Some, i.e. many, are.").len(), 1);
        assert_eq!(s.sentences("Use tools, e.g. hammers.").len(), 1);
        assert_eq!(s.sentences("By J. Smith and others.").len(), 1);
    }

    #[test]
    fn test_initial_and_number_heuristics() {
        let s = SentenceSplitter::default();
        assert_eq!(s.sentences("Smith showed X. However, we disagree.").len(), 1);
        assert_eq!(s.sentences("It is in Section 3. the rest follows.").len(), 1);
        assert_eq!(s.sentences("The total was 3. Then it grew.").len(), 2);
        assert_eq!(s.sentences("Wait... then go.").len(), 1);
    }

    #[test]
    fn test_custom_abbreviation() {
        let s = SentenceSplitter::default().with_abbreviations(["Fig."]);
        assert_eq!(s.sentences("See Fig. 3 for details.").len(), 1);
    }

    #[test]
    fn test_closing_quote_after_period() {
        let s = SentenceSplitter::default();
        assert_eq!(s.sentences("He said \"stop.\" Then left.").len(), 2);
    }

    #[test]
    fn test_whitespace_only() {
        let s = SentenceSplitter::default();
        assert!(s.span_tokenize("").is_empty());
        assert!(s.span_tokenize(" \n\n").is_empty());
    }

    #[test]
    fn test_trailing_period_without_following_token() {
        let s = SentenceSplitter::default();
        assert_eq!(s.span_tokenize("Done."), vec![(0, 5)]);
    }
}
