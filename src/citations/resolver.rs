//! The citation resolver.

use super::patterns::{
    placeholder, split_after_year, split_year_lists, RE_AUTHOR_NUMBER, RE_BRACKET_KEYS, RE_ET_AL, RE_FILLER,
    RE_INLINE_YEAR, RE_KEY_BRACKET, RE_KEY_NUMBERED, RE_PARENTHETICAL, RE_TOKEN_SEP, RE_YEAR,
    RE_YEAR_LIST, RE_YEAR_LIST_SEP, RE_YEAR_SEPARATOR,
};
use super::rhetoric::{CueClassifier, RhetoricalCategory};
use super::{CitationAnnotations, CitationMark, CitationStyle, CiteRange};
use crate::matcher::{phrase_tokens, MatchPolicy, SpanPhraseMatcher};
use crate::xhtml::{BoxKind, Document, ParagraphNode};
use indexmap::IndexMap;
use regex::{Captures, RegexBuilder};
use std::cmp::Reverse;
use std::collections::HashMap;

const PHRASE_PUNCTUATION: &[char] = &[' ', ',', '.', '(', ')', '[', ']', ';', ':'];

/// A bibliography entry matched by a mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceHit {
    /// Reference paragraph id
    pub reference_id: String,
    /// Character offset of the match in the entry text
    pub start: usize,
    /// Character length of the match
    pub len: usize,
}

#[derive(Debug, Clone)]
struct Entry {
    id: String,
    text: String,
}

/// Detects, resolves and classifies citation mentions for one document.
///
/// A resolver carries per-document state (mark counter, hit counts); use one
/// instance per document being processed.
#[derive(Debug, Clone, Default)]
pub struct CitationResolver {
    classifier: CueClassifier,
    references: Vec<Entry>,
    body: Vec<Entry>,
    keys: HashMap<String, String>,
    marks: Vec<CitationMark>,
    counts: IndexMap<String, usize>,
}

impl CitationResolver {
    /// Create a resolver with the built-in cue table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different cue classifier.
    pub fn with_classifier(mut self, classifier: CueClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Open a document: split bibliography from body and build the key index.
    ///
    /// Opening again discards all previous state.
    pub fn open(&mut self, doc: &Document) {
        self.references.clear();
        self.body.clear();
        self.keys.clear();
        self.marks.clear();
        self.counts.clear();

        for (_, bx, p) in doc.paragraphs() {
            let text = match &p.text {
                Some(text) => text.clone(),
                None => {
                    log::debug!("Paragraph {} has no data-text; not scanned for citations", p.id);
                    continue;
                },
            };
            let entry = Entry { id: p.id.clone(), text };
            if bx.kind == BoxKind::Reference {
                self.references.push(entry);
            } else {
                self.body.push(entry);
            }
        }

        for r in &self.references {
            let key = match RE_KEY_BRACKET.captures(&r.text) {
                Some(caps) => caps[1].chars().filter(|c| !c.is_whitespace()).collect(),
                None => match RE_KEY_NUMBERED.captures(&r.text) {
                    Some(caps) => caps[1].to_string(),
                    None => continue,
                },
            };
            if let Some(previous) = self.keys.insert(key.clone(), r.id.clone()) {
                log::debug!("Reference key '{}' of {} replaces {}", key, r.id, previous);
            }
        }
        log::debug!(
            "Opened {} references ({} keyed) and {} body paragraphs",
            self.references.len(),
            self.keys.len(),
            self.body.len()
        );
    }

    /// Reference-key index: printed key to reference paragraph id.
    pub fn reference_keys(&self) -> &HashMap<String, String> {
        &self.keys
    }

    /// Marks created so far.
    pub fn marks(&self) -> &[CitationMark] {
        &self.marks
    }

    /// Rewritten text of a body paragraph.
    pub fn paragraph_text(&self, id: &str) -> Option<&str> {
        self.body.iter().find(|e| e.id == id).map(|e| e.text.as_str())
    }

    /// Rank the bibliography entries matching a mention.
    ///
    /// The mention's tokens are searched in order, case-insensitively, with
    /// anything in between. Hits are ordered by start, then by length
    /// (longest first when the mention names several authors).
    pub fn search_reference(&self, mention: &str) -> Vec<ReferenceHit> {
        let spaced = RE_YEAR.replace_all(mention, " ${0}");
        let tokens: Vec<String> = RE_TOKEN_SEP
            .split(&spaced)
            .filter(|t| !t.is_empty() && !RE_FILLER.is_match(t))
            .map(regex::escape)
            .collect();
        if tokens.is_empty() {
            return Vec::new();
        }
        let re = match RegexBuilder::new(&tokens.join(r"\W.*?")).case_insensitive(true).build() {
            Ok(re) => re,
            Err(e) => {
                log::debug!("Cannot search for '{}': {}", mention, e);
                return Vec::new();
            },
        };

        let mut hits: Vec<ReferenceHit> = self
            .references
            .iter()
            .filter_map(|r| {
                re.find(&r.text).map(|m| ReferenceHit {
                    reference_id: r.id.clone(),
                    start: r.text[..m.start()].chars().count(),
                    len: m.as_str().chars().count(),
                })
            })
            .collect();
        if hits.len() > 1 {
            if RE_ET_AL.is_match(&spaced) {
                hits.sort_by_key(|h| (h.start, Reverse(h.len)));
            } else {
                hits.sort_by_key(|h| (h.start, h.len));
            }
        }
        hits
    }

    fn best_reference(&mut self, mention: &str) -> Option<String> {
        let id = self.search_reference(mention).into_iter().next()?.reference_id;
        *self.counts.entry(id.clone()).or_insert(0) += 1;
        Some(id)
    }

    fn install(&mut self, reference_ids: Vec<String>, context: &str, style: CitationStyle, paragraph_id: &str) -> Option<String> {
        if reference_ids.is_empty() {
            log::debug!("Unresolved citation: {}", context);
            return None;
        }
        let id = self.marks.len() + 1;
        log::info!("match_id: {}, whole: {}", id, context);
        self.marks.push(CitationMark {
            id,
            paragraph_id: paragraph_id.to_string(),
            reference_ids,
            context: context.to_string(),
            style,
            category: RhetoricalCategory::Neutral,
            cue: String::new(),
        });
        Some(placeholder(id))
    }

    fn replace_parenthetical(&mut self, caps: &Captures<'_>, paragraph_id: &str) -> String {
        let whole = match caps.get(1).or_else(|| caps.get(2)) {
            Some(m) => m.as_str(),
            None => return caps[0].to_string(),
        };
        let compact: String = whole.chars().filter(|c| !c.is_whitespace()).collect();
        let separator = RE_YEAR_SEPARATOR
            .captures(&compact)
            .map(|c| c[1].to_string())
            .unwrap_or_else(|| ";".to_string());
        let mut cites = split_after_year(whole, &separator);
        if RE_YEAR_LIST.is_match(&compact) {
            cites = split_year_lists(cites);
        }

        let mut ids = Vec::new();
        for cite in &cites {
            if cite.starts_with(|c: char| c.is_ascii_digit()) {
                continue;
            }
            if let Some(id) = self.best_reference(cite) {
                ids.push(id);
            }
        }
        self.install(ids, whole, CitationStyle::Parenthetical, paragraph_id)
            .unwrap_or_else(|| caps[0].to_string())
    }

    fn replace_inline_year(&mut self, caps: &Captures<'_>, paragraph_id: &str) -> String {
        let (whole, names) = (&caps[0], &caps[1]);
        let mut ids = Vec::new();
        for year in RE_YEAR_LIST_SEP.split(&caps[2]).filter(|y| !y.is_empty()) {
            if let Some(id) = self.best_reference(&format!("{} {}", names, year)) {
                ids.push(id);
            }
        }
        self.install(ids, whole, CitationStyle::InlineYear, paragraph_id)
            .unwrap_or_else(|| whole.to_string())
    }

    fn replace_author_number(&mut self, caps: &Captures<'_>, paragraph_id: &str) -> String {
        let whole = &caps[0];
        let ids = self
            .best_reference(&format!("{} {}", &caps[1], &caps[2]))
            .into_iter()
            .collect();
        self.install(ids, whole, CitationStyle::AuthorNumber, paragraph_id)
            .unwrap_or_else(|| whole.to_string())
    }

    fn replace_bracket_keys(&mut self, caps: &Captures<'_>, paragraph_id: &str) -> String {
        let whole = &caps[0];
        let compact: String = caps[1].chars().filter(|c| !c.is_whitespace()).collect();
        let mut ids = Vec::new();
        for key in compact.split(',') {
            if let Some(id) = self.keys.get(key).cloned() {
                *self.counts.entry(id.clone()).or_insert(0) += 1;
                ids.push(id);
            }
        }
        self.install(ids, whole, CitationStyle::BracketKey, paragraph_id)
            .unwrap_or_else(|| whole.to_string())
    }

    /// Substitute every resolvable mention in the body paragraphs with a placeholder.
    ///
    /// Returns the number of marks created.
    pub fn detect_mentions(&mut self) -> usize {
        let use_keys = !self.keys.is_empty();
        for i in 0..self.body.len() {
            let pid = self.body[i].id.clone();
            let mut text = std::mem::take(&mut self.body[i].text);
            text = RE_PARENTHETICAL
                .replace_all(&text, |c: &Captures<'_>| self.replace_parenthetical(c, &pid))
                .into_owned();
            text = RE_INLINE_YEAR
                .replace_all(&text, |c: &Captures<'_>| self.replace_inline_year(c, &pid))
                .into_owned();
            text = RE_AUTHOR_NUMBER
                .replace_all(&text, |c: &Captures<'_>| self.replace_author_number(c, &pid))
                .into_owned();
            if use_keys {
                text = RE_BRACKET_KEYS
                    .replace_all(&text, |c: &Captures<'_>| self.replace_bracket_keys(c, &pid))
                    .into_owned();
            }
            self.body[i].text = text;
        }
        self.marks.len()
    }

    /// Classify the marks and locate them on the paragraphs' spans.
    pub fn annotate(&mut self, doc: &Document) -> CitationAnnotations {
        let paragraphs: HashMap<&str, &ParagraphNode> =
            doc.paragraphs().map(|(_, _, p)| (p.id.as_str(), p)).collect();
        let mut ranges = IndexMap::new();

        for entry in &self.body {
            let classified = self.classifier.classify_marks(&entry.text);
            if classified.is_empty() {
                continue;
            }
            let spans = match paragraphs.get(entry.id.as_str()) {
                Some(p) => &p.spans,
                None => continue,
            };
            let mut matcher = SpanPhraseMatcher::new(spans, MatchPolicy::Exclusive);

            for (mark_id, category, cue) in classified {
                let mark = match self.marks.get_mut(mark_id.wrapping_sub(1)) {
                    Some(mark) => mark,
                    None => continue,
                };
                log::info!("match_id: {}, rType: {}, cue: {}", mark_id, category, cue);
                mark.category = category;
                mark.cue = cue;

                let mut phrase = phrase_tokens(&mark.context, PHRASE_PUNCTUATION);
                if mark.style.drops_leading_bracket() && !phrase.is_empty() {
                    phrase.remove(0);
                }
                let start = match matcher.tag(&phrase, mark_id.to_string()) {
                    Some(outcome) => outcome.start(),
                    None => {
                        log::debug!("Mark {} is not aligned with the spans of {}", mark_id, entry.id);
                        continue;
                    },
                };
                let start_id = spans[start].id.clone();
                let end_id = matcher
                    .ranges()
                    .find(|r| r.start == start)
                    .map(|r| r.end_id.clone())
                    .unwrap_or_else(|| start_id.clone());
                ranges.insert(
                    start_id.clone(),
                    CiteRange {
                        mark_id,
                        reference_ids: mark.reference_ids.clone(),
                        start_id,
                        end_id,
                        category: mark.category,
                        cue: mark.cue.clone(),
                    },
                );
            }
        }

        CitationAnnotations {
            marks: self.marks.clone(),
            ranges,
            counts: self.counts.clone(),
        }
    }

    /// Open, detect and annotate in one call.
    pub fn resolve(&mut self, doc: &Document) -> CitationAnnotations {
        self.open(doc);
        let found = self.detect_mentions();
        let annotations = self.annotate(doc);
        log::info!("Resolved {} citation marks, {} located on spans", found, annotations.ranges.len());
        annotations
    }
}
