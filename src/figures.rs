//! Figure and table reference tagging.
//!
//! Paragraphs that define a figure or table carry `data-fig="<Type>_<number>"`
//! (`Figure_1`, `Table_2`). Every prose paragraph is searched for mentions of
//! each defined figure ("Figure 1", "Figures 1, 2 and 3") and the mention is
//! located on the paragraph's spans with the coalescing phrase matcher, so a
//! list mention covers all the figures it names with one range.

use crate::matcher::{phrase_tokens, MatchPolicy, SpanPhraseMatcher, SpanRange};
use crate::xhtml::{AttributePatch, BoxKind, Document};
use indexmap::IndexMap;
use regex::Regex;

/// Label written on the first span of a figure reference.
pub const FIGREF_BEGIN: &str = "B-FIG";
/// Label written on the following spans of a figure reference.
pub const FIGREF_INSIDE: &str = "I-FIG";

const PHRASE_PUNCTUATION: &[char] = &[',', '.', ':'];

/// One tagged figure mention.
#[derive(Debug, Clone, PartialEq)]
pub struct FigureReference {
    /// Paragraph the mention was found in
    pub paragraph_id: String,
    /// Span range covering the mention; tags are the figure ids
    pub range: SpanRange,
    /// Ids of the spans from the range start to its terminator
    pub span_ids: Vec<String>,
}

/// Result of tagging a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FigureReferences {
    /// Figure ids defined by the document with their number of defining paragraphs
    pub figures: IndexMap<String, usize>,
    /// Tagged mentions in document order
    pub references: Vec<FigureReference>,
}

impl FigureReferences {
    /// Number of tagged mentions.
    pub fn len(&self) -> usize {
        self.references.len()
    }

    /// Whether nothing was tagged.
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// Attribute edits for `data-figref`, `data-figref-id` and `data-figref-end`.
    pub fn to_patch(&self) -> AttributePatch {
        let mut patch = AttributePatch::new();
        for r in &self.references {
            for id in r.span_ids.iter().skip(1) {
                patch.set(id, "data-figref", FIGREF_INSIDE);
            }
            patch.set(&r.range.start_id, "data-figref", FIGREF_BEGIN);
            patch.set(&r.range.start_id, "data-figref-id", r.range.tags.join(","));
            patch.set(&r.range.start_id, "data-figref-end", r.range.end_id.as_str());
        }
        patch
    }
}

/// Mention patterns for one figure id.
fn mention_patterns(figure: &str) -> Option<Vec<Regex>> {
    let (typ, num) = figure.split_once('_')?;
    let (typ, num) = (regex::escape(typ), regex::escape(num));
    let tail = r"(?:\s|\)|\.\D|\.$|,|:)";
    let patterns = [
        format!(r"({typ}s?\s*{num}){tail}"),
        format!(r"({typ}s?(?:\s*\d+(?:and|,|\s)+)+{num}){tail}"),
    ];
    patterns.iter().map(|p| Regex::new(p).ok()).collect()
}

/// Tags figure and table mentions in prose paragraphs.
#[derive(Debug, Clone, Copy, Default)]
pub struct FigureTagger;

impl FigureTagger {
    /// Create a tagger.
    pub fn new() -> Self {
        log::info!("FigureTagger initialized.");
        Self
    }

    /// Find and locate every figure mention in `doc`.
    ///
    /// Ranges are scoped to one paragraph: the same figure mentioned in two
    /// paragraphs yields two ranges, never one range spanning both.
    pub fn tag(&self, doc: &Document) -> FigureReferences {
        let mut figures: IndexMap<String, usize> = IndexMap::new();
        for (_, bx, p) in doc.paragraphs() {
            if bx.kind == BoxKind::Unnamed {
                continue;
            }
            if let Some(fig) = &p.figure {
                log::debug!("{} {}", fig, p.id);
                *figures.entry(fig.clone()).or_insert(0) += 1;
            }
        }

        let mut patterns = Vec::with_capacity(figures.len());
        for fig in figures.keys() {
            match mention_patterns(fig) {
                Some(res) => patterns.push((fig.as_str(), res)),
                None => log::debug!("Figure id '{}' has no type/number separator", fig),
            }
        }

        let mut references = Vec::new();
        for (_, bx, p) in doc.paragraphs() {
            if bx.kind == BoxKind::Unnamed || bx.kind.is_float() {
                continue;
            }
            let text = match &p.text {
                Some(text) => text,
                None => {
                    log::debug!("Paragraph {} has no data-text; no figure search", p.id);
                    continue;
                },
            };

            let mut matcher = SpanPhraseMatcher::new(&p.spans, MatchPolicy::Coalesce);
            for (fig, res) in &patterns {
                let phrase = res
                    .iter()
                    .find_map(|re| re.captures(text))
                    .and_then(|caps| caps.get(1))
                    .map(|m| phrase_tokens(m.as_str(), PHRASE_PUNCTUATION));
                if let Some(phrase) = phrase {
                    if matcher.tag(&phrase, *fig).is_none() {
                        log::debug!("Mention of {} in {} is not aligned with its spans", fig, p.id);
                    }
                }
            }

            for range in matcher.into_ranges() {
                let span_ids = p.spans[range.start..=range.end].iter().map(|s| s.id.clone()).collect();
                references.push(FigureReference {
                    paragraph_id: p.id.clone(),
                    range,
                    span_ids,
                });
            }
        }

        log::debug!("Tagged {} figure references", references.len());
        FigureReferences { figures, references }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> Document {
        let xml = format!(
            r#"<html><head><meta docid="d"/></head><body><div id="s-1" data-name="Intro">
<div data-name="Caption"><p id="p-9" data-page="1" data-fig="Figure_1" data-text="Figure 1: A plot."><span id="c-1">Figure</span></p>
<p id="p-10" data-page="1" data-fig="Figure_2" data-text="Figure 2: More."><span id="c-2">Figure</span></p></div>
<div data-name="Body">{body}</div>
</div></body></html>"#
        );
        Document::from_str(&xml).unwrap()
    }

    #[test]
    fn test_mention_patterns() {
        let res = mention_patterns("Figure_1").unwrap();
        assert_eq!(&res[0].captures("see Figure 1.").unwrap()[1], "Figure 1");
        assert!(res[0].captures("see Figure 10").is_none());
        assert_eq!(&res[1].captures("Figures 2, 3 and 1 show").unwrap()[1], "Figures 2, 3 and 1");
        assert!(mention_patterns("Figure1").is_none());
    }

    #[test]
    fn test_single_mention() {
        let d = doc(
            r#"<p id="p-1" data-page="1" data-text="Figure 1 shows it."><span id="w-1">Figure</span><span id="w-2">1</span><span id="w-3">shows</span><span id="w-4">it.</span></p>"#,
        );
        let refs = FigureTagger::new().tag(&d);
        assert_eq!(refs.figures.len(), 2);
        assert_eq!(refs.len(), 1);
        let r = &refs.references[0];
        assert_eq!(r.range.tags, vec!["Figure_1"]);
        assert_eq!(r.range.end_id, "w-2");

        let patch = refs.to_patch();
        assert_eq!(patch.get("w-1", "data-figref"), Some("B-FIG"));
        assert_eq!(patch.get("w-1", "data-figref-id"), Some("Figure_1"));
        assert_eq!(patch.get("w-1", "data-figref-end"), Some("w-2"));
        assert_eq!(patch.get("w-2", "data-figref"), Some("I-FIG"));
        assert_eq!(patch.get("w-3", "data-figref"), None);
    }

    #[test]
    fn test_list_mention_extends_range() {
        let d = doc(
            r#"<p id="p-1" data-page="1" data-text="Figures 1 and 2 show it."><span id="w-1">Figures</span><span id="w-2">1</span><span id="w-3">and</span><span id="w-4">2</span><span id="w-5">show</span></p>"#,
        );
        let refs = FigureTagger::new().tag(&d);
        assert_eq!(refs.len(), 1);
        let r = &refs.references[0].range;
        assert_eq!(r.tags, vec!["Figure_1", "Figure_2"]);
        assert_eq!(r.end_id, "w-4");
        assert_eq!(refs.references[0].span_ids, vec!["w-1", "w-2", "w-3", "w-4"]);
    }

    #[test]
    fn test_captions_are_not_searched() {
        let d = doc(r#"<p id="p-1" data-page="1" data-text="Nothing here."><span id="w-1">Nothing</span></p>"#);
        let refs = FigureTagger::new().tag(&d);
        assert!(refs.is_empty());
    }
}
