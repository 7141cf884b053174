//! Locating token phrases inside a paragraph's spans.
//!
//! Citation and figure mentions are found in the paragraph's flat text, but the
//! annotation has to land on the token spans. The matcher walks the spans
//! looking for the earliest position where the phrase's first token and last
//! token line up, skipping spans without text (zero-width glyphs, removed
//! ligature halves). Accepted matches become [`SpanRange`]s: the first span is
//! labelled [`RangeLabel::Begin`], the rest up to the terminator
//! [`RangeLabel::Inside`].
//!
//! Two policies exist:
//! - [`MatchPolicy::Exclusive`]: a span belongs to at most one range.
//! - [`MatchPolicy::Coalesce`]: a phrase starting on the first span of an
//!   existing range joins that range, extending its terminator when the new
//!   match reaches further ("Figures 1, 2" after "Figure 1").

use crate::xhtml::Span;
use std::collections::BTreeMap;

/// A text-bearing unit the matcher walks over.
pub trait TextSpan {
    /// Stable identifier of the span.
    fn span_id(&self) -> &str;
    /// Span text; `None` or empty means the span is skipped.
    fn span_text(&self) -> Option<&str>;
}

impl TextSpan for Span {
    fn span_id(&self) -> &str {
        &self.id
    }

    fn span_text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

/// How new matches interact with ranges already installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Matches never share spans
    Exclusive,
    /// Matches starting on an existing range's first span merge into it
    Coalesce,
}

/// Per-span range membership label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeLabel {
    /// First span of a range
    Begin,
    /// Later span of a range
    Inside,
}

/// Span indices covered by a phrase (both inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhraseMatch {
    /// Index of the first span
    pub start: usize,
    /// Index of the terminating span
    pub end: usize,
}

/// An installed range.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanRange {
    /// Index of the first span
    pub start: usize,
    /// Index of the terminating span
    pub end: usize,
    /// Identifier of the first span
    pub start_id: String,
    /// Identifier of the terminating span
    pub end_id: String,
    /// Tags attached to the range, in the order they were added
    pub tags: Vec<String>,
}

/// Result of tagging a phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// A new range was installed starting at this index
    Installed(usize),
    /// An existing range was joined and its terminator moved forward
    Extended(usize),
    /// An existing range was joined; its terminator already covered the match
    Merged(usize),
}

impl MatchOutcome {
    /// Index of the range's first span.
    pub fn start(&self) -> usize {
        match *self {
            Self::Installed(i) | Self::Extended(i) | Self::Merged(i) => i,
        }
    }
}

/// Split a mention into phrase tokens, isolating the given punctuation.
///
/// ```
/// # use pdfnlt_postprocess::matcher::phrase_tokens;
/// assert_eq!(phrase_tokens("Figures 1, 2", &[',', '.', ':']), vec!["Figures", "1", ",", "2"]);
/// ```
pub fn phrase_tokens(text: &str, punctuation: &[char]) -> Vec<String> {
    let mut spaced = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if punctuation.contains(&c) {
            spaced.push(' ');
            spaced.push(c);
            spaced.push(' ');
        } else {
            spaced.push(c);
        }
    }
    spaced.split_whitespace().map(str::to_string).collect()
}

/// Phrase matcher over one paragraph's spans.
#[derive(Debug)]
pub struct SpanPhraseMatcher<'a, S: TextSpan> {
    spans: &'a [S],
    policy: MatchPolicy,
    labels: Vec<Option<RangeLabel>>,
    ranges: BTreeMap<usize, SpanRange>,
}

impl<'a, S: TextSpan> SpanPhraseMatcher<'a, S> {
    /// Create a matcher with no ranges installed.
    pub fn new(spans: &'a [S], policy: MatchPolicy) -> Self {
        Self {
            spans,
            policy,
            labels: vec![None; spans.len()],
            ranges: BTreeMap::new(),
        }
    }

    fn text(&self, i: usize) -> Option<&str> {
        self.spans[i].span_text().filter(|t| !t.is_empty())
    }

    /// Where the phrase would end if it started at `start`.
    fn phrase_end(&self, start: usize, len: usize) -> Option<usize> {
        let mut seen = 0;
        for j in start..self.spans.len() {
            if self.text(j).is_some() {
                seen += 1;
                if seen == len {
                    return Some(j);
                }
            }
        }
        None
    }

    fn is_free(&self, m: &PhraseMatch) -> bool {
        self.labels[m.start..=m.end].iter().all(Option::is_none)
    }

    fn accepts(&self, m: &PhraseMatch) -> bool {
        match (self.policy, self.labels[m.start]) {
            (MatchPolicy::Coalesce, Some(RangeLabel::Begin)) => match self.ranges.get(&m.start) {
                // An extension may only cover spans no other range owns
                Some(range) if m.end > range.end => self.labels[range.end + 1..=m.end].iter().all(Option::is_none),
                Some(_) => true,
                None => false,
            },
            _ => self.is_free(m),
        }
    }

    /// Find the earliest acceptable match for `phrase`.
    pub fn find<T: AsRef<str>>(&self, phrase: &[T]) -> Option<PhraseMatch> {
        let first = phrase.first()?.as_ref();
        let last = phrase.last()?.as_ref();
        for i in 0..self.spans.len() {
            if self.text(i) != Some(first) {
                continue;
            }
            let end = match self.phrase_end(i, phrase.len()) {
                Some(end) => end,
                None => break,
            };
            if self.text(end) != Some(last) {
                continue;
            }
            let m = PhraseMatch { start: i, end };
            if self.accepts(&m) {
                return Some(m);
            }
        }
        None
    }

    /// Find `phrase` and install (or join) a range carrying `tag`.
    pub fn tag<T: AsRef<str>>(&mut self, phrase: &[T], tag: impl Into<String>) -> Option<MatchOutcome> {
        let m = self.find(phrase)?;
        let tag = tag.into();
        let end_id = self.spans[m.end].span_id().to_string();

        if let Some(range) = self.ranges.get_mut(&m.start) {
            if !range.tags.contains(&tag) {
                range.tags.push(tag);
            }
            if m.end <= range.end {
                return Some(MatchOutcome::Merged(m.start));
            }
            let old_end = range.end;
            range.end = m.end;
            range.end_id = end_id;
            for label in &mut self.labels[old_end + 1..=m.end] {
                *label = Some(RangeLabel::Inside);
            }
            return Some(MatchOutcome::Extended(m.start));
        }

        self.labels[m.start] = Some(RangeLabel::Begin);
        for label in &mut self.labels[m.start + 1..=m.end] {
            *label = Some(RangeLabel::Inside);
        }
        self.ranges.insert(
            m.start,
            SpanRange {
                start: m.start,
                end: m.end,
                start_id: self.spans[m.start].span_id().to_string(),
                end_id,
                tags: vec![tag],
            },
        );
        Some(MatchOutcome::Installed(m.start))
    }

    /// Label of the span at `index`.
    pub fn label(&self, index: usize) -> Option<RangeLabel> {
        self.labels.get(index).copied().flatten()
    }

    /// Installed ranges in span order.
    pub fn ranges(&self) -> impl Iterator<Item = &SpanRange> {
        self.ranges.values()
    }

    /// Consume the matcher, returning its ranges in span order.
    pub fn into_ranges(self) -> Vec<SpanRange> {
        self.ranges.into_values().collect()
    }
}
