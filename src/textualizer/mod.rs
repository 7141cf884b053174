//! Text reconstruction and sentence segmentation.
//!
//! [`Textualizer::textualize`] walks sections, boxes, paragraph nodes and
//! their canonical token spans once, building a word stream per logical
//! paragraph:
//!
//! - A token inside a citation range contributes an empty word.
//! - A token starting a citation range becomes `CITE-<ref>, CITE-<ref>, ...`.
//! - A token starting inline math becomes `MATH-<id>`; the tokens it covers
//!   become empty words and their boxes are merged into the region.
//! - Anything else contributes its normalized literal text.
//!
//! A citation starting while a math region is open abandons the region: the
//! words are restored from the checkpoint taken when the region opened.
//!
//! A second pass appends a `"\n\n"` word to every paragraph and assigns
//! document-relative character offsets. Sentences are found per paragraph and
//! mapped back to the ids of the words they contain.

pub mod structures;

pub use structures::{CitationRecord, MathRegion, Paragraph, Sentence, Word, WordBuffer, WordPosition};

use crate::citations::CitationAnnotations;
use crate::error::{Error, Result};
use crate::math::{MathLabel, MathLabels};
use crate::text::{ends_with_wrap_hyphen, normalize_token, SentenceSplitter};
use crate::xhtml::{AttributePatch, BoxKind, Document, ParagraphNode, SpaceHint};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Text written after every paragraph.
pub const PARAGRAPH_BREAK: &str = "\n\n";

/// Everything reconstruction produced for one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextualizedDocument {
    /// Logical paragraphs in document order
    pub paragraphs: Vec<Paragraph>,
    /// Full reconstructed text
    pub text: String,
    /// Every span with its offsets, sorted by (from, to)
    pub words: Vec<WordPosition>,
    /// Sentences in document order
    pub sentences: Vec<Sentence>,
    /// Inline math regions
    pub maths: Vec<MathRegion>,
    /// One record per bibliography entry
    pub cites: Vec<CitationRecord>,
    positions: IndexMap<String, (usize, usize)>,
    sentence_ids: IndexMap<String, String>,
}

impl TextualizedDocument {
    /// Offsets of a positioned span.
    pub fn position(&self, id: &str) -> Option<(usize, usize)> {
        self.positions.get(id).copied()
    }

    /// Sentence containing a token.
    pub fn sentence_of(&self, id: &str) -> Option<&str> {
        self.sentence_ids.get(id).map(String::as_str)
    }

    /// Attribute edits for `data-from`, `data-to` and `data-sent-id`.
    ///
    /// With `remove_positions`, spans of class `word` get no offsets and lose
    /// any they already had.
    pub fn to_patch(&self, doc: &Document, remove_positions: bool) -> AttributePatch {
        let mut patch = AttributePatch::new();
        for (id, (from, to)) in &self.positions {
            patch.set(id, "data-from", from.to_string());
            patch.set(id, "data-to", to.to_string());
        }
        for (id, sid) in &self.sentence_ids {
            patch.set(id, "data-sent-id", sid.as_str());
        }
        if remove_positions {
            let mut scrubbed = AttributePatch::new();
            for (_, _, p) in doc.paragraphs() {
                for span in p.spans.iter().filter(|s| s.class.as_deref() == Some("word")) {
                    scrubbed.remove(&span.id, "data-from");
                    scrubbed.remove(&span.id, "data-to");
                }
            }
            patch.merge(scrubbed);
        }
        patch
    }
}

#[derive(Debug, Default)]
struct NodeScan {
    maths: Vec<MathRegion>,
    citing: Vec<(String, String)>,
}

/// Scan one paragraph node's tokens onto `words`.
///
/// Math and citation state does not carry over between paragraph nodes.
fn scan_node(
    node: &ParagraphNode,
    words: &mut WordBuffer,
    math_par: bool,
    labels: &MathLabels,
    cites: &CitationAnnotations,
) -> Result<NodeScan> {
    let mut scan = NodeScan::default();
    let mut cite_end: Option<&str> = None;
    let mut math: Option<usize> = None;
    let mut ignore_math = false;

    for span in node.spans.iter().filter(|s| s.is_canonical()) {
        let id = span.id.as_str();
        let mut space = match span.space {
            SpaceHint::NoSpace => false,
            SpaceHint::LineStart => words.last().map_or(false, |w| !ends_with_wrap_hyphen(&w.text)),
            SpaceHint::Default => true,
        };
        let text = normalize_token(span.literal());
        let label = labels.get(id);
        let begins_math = !ignore_math
            && (label == Some(MathLabel::Begin)
                || (math.is_none() && (label == Some(MathLabel::Inside) || math_par)));
        let continues_math = !ignore_math && (label == Some(MathLabel::Inside) || math_par);
        let bbox = || {
            span.bbox.ok_or_else(|| Error::MissingAttribute {
                element: span.id.clone(),
                attribute: "data-bdr",
            })
        };

        let word = if let Some(end) = cite_end {
            math = None;
            space = false;
            if end == id {
                cite_end = None;
            }
            Word::placeholder(id, "")
        } else if let Some(range) = cites.range_at(id) {
            if let Some(open) = math.take() {
                words.rollback();
                scan.maths.truncate(open);
                ignore_math = true;
            }
            for r in &range.reference_ids {
                scan.citing.push((r.clone(), id.to_string()));
            }
            if range.end_id != id {
                cite_end = Some(range.end_id.as_str());
            }
            let text: Vec<String> = range.reference_ids.iter().map(|r| format!("CITE-{}", r)).collect();
            Word::placeholder(id, text.join(", "))
        } else if begins_math {
            let bbox = bbox()?;
            words.checkpoint();
            if space {
                words.shadow_push(Word::space());
            }
            words.shadow_push(Word::token(id, text));
            let mid = if math_par {
                format!("MATH-{}", node.id)
            } else {
                format!("MATH-{}", id)
            };
            scan.maths.push(MathRegion {
                id: mid.clone(),
                start_id: id.to_string(),
                end_id: id.to_string(),
                page: node.page,
                bbox,
            });
            math = Some(scan.maths.len() - 1);
            Word::placeholder(id, mid)
        } else if let Some(open) = math.filter(|_| continues_math) {
            let bbox = bbox()?;
            if space {
                words.shadow_push(Word::space());
            }
            words.shadow_push(Word::token(id, text));
            space = false;
            let region = &mut scan.maths[open];
            region.end_id = id.to_string();
            region.bbox.extend(&bbox);
            Word::placeholder(id, "")
        } else {
            math = None;
            ignore_math = false;
            words.commit();
            Word::token(id, text)
        };

        if space {
            words.push(Word::space());
        }
        words.push(word);
    }
    words.commit();
    Ok(scan)
}

/// Reconstructs text, sentences and derived tables.
#[derive(Debug, Clone, Default)]
pub struct Textualizer {
    splitter: SentenceSplitter,
}

impl Textualizer {
    /// Create a textualizer with the given sentence-splitter abbreviations.
    pub fn new<I, S>(abbreviations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            splitter: SentenceSplitter::new(abbreviations),
        }
    }

    /// Split a paragraph into sentences.
    ///
    /// Offsets must already be assigned; word starts are compared against the
    /// sentence spans relative to the paragraph offset.
    pub fn find_sentences(&self, par: &Paragraph) -> Vec<Sentence> {
        let text = par.text();
        let number = par.id.get(2..).unwrap_or("");
        let words = par.words.words();
        let mut cursor = 0;
        let mut out = Vec::new();

        for (i, (b, e)) in self.splitter.span_tokenize(&text).into_iter().enumerate() {
            let from = par.offset + text[..b].chars().count();
            let to = from + text[b..e].chars().count();
            let mut sentence = Sentence {
                id: format!("s-{}-{}", number, i),
                section_name: par.section_name.clone(),
                box_name: par.box_kind.as_str().to_string(),
                text: text[b..e].to_string(),
                words: Vec::new(),
            };
            while cursor < words.len() && words[cursor].start < from {
                cursor += 1;
            }
            while cursor < words.len() && words[cursor].start < to {
                if let Some(id) = &words[cursor].id {
                    sentence.words.push(id.clone());
                }
                cursor += 1;
            }
            out.push(sentence);
        }
        out
    }

    /// Reconstruct `doc`.
    pub fn textualize(&self, doc: &Document, labels: &MathLabels, cites: &CitationAnnotations) -> TextualizedDocument {
        let mut paragraphs: Vec<Paragraph> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut maths = Vec::new();
        let mut citing: IndexMap<String, Vec<String>> = IndexMap::new();
        let mut ref_pars: Vec<String> = Vec::new();
        let mut last_par: Option<String> = None;

        for sec in &doc.sections {
            for bx in &sec.boxes {
                for node in &bx.paragraphs {
                    let absorbing = match (&bx.kind, &last_par) {
                        (BoxKind::Equation, Some(last)) => index
                            .get(last)
                            .copied()
                            .filter(|&i| paragraphs[i].is_open())
                            .map(|i| (i, last.clone())),
                        _ => None,
                    };
                    let math_par = absorbing.is_some();
                    let target = match absorbing {
                        Some(t) => Some(t),
                        None => match &node.continued_from {
                            Some(from) => match index.get(from) {
                                Some(&i) => Some((i, from.clone())),
                                None => {
                                    log::warn!("Paragraph {} continues unknown paragraph {}", node.id, from);
                                    None
                                },
                            },
                            None => None,
                        },
                    };

                    let scanned = match &target {
                        Some((i, _)) => {
                            let saved = paragraphs[*i].words.clone();
                            let result = scan_node(node, &mut paragraphs[*i].words, math_par, labels, cites);
                            if result.is_err() {
                                paragraphs[*i].words = saved;
                            }
                            index.insert(node.id.clone(), *i);
                            result
                        },
                        None => {
                            let mut par = Paragraph::new(sec.id.clone(), node.id.clone(), sec.name.clone(), bx.kind.clone());
                            let result = scan_node(node, &mut par.words, false, labels, cites);
                            if result.is_ok() {
                                index.insert(node.id.clone(), paragraphs.len());
                                paragraphs.push(par);
                                if bx.kind == BoxKind::Reference {
                                    ref_pars.push(node.id.clone());
                                }
                            }
                            result
                        },
                    };

                    let registered = match scanned {
                        Ok(scan) => {
                            maths.extend(scan.maths);
                            for (r, token) in scan.citing {
                                let ids = citing.entry(r).or_default();
                                if !ids.contains(&token) {
                                    ids.push(token);
                                }
                            }
                            true
                        },
                        Err(e) => {
                            log::warn!("Discarding paragraph {}: {}", node.id, e);
                            target.is_some()
                        },
                    };

                    last_par = if bx.kind != BoxKind::Body {
                        None
                    } else if let Some((_, continued)) = target {
                        Some(continued)
                    } else if registered {
                        Some(node.id.clone())
                    } else {
                        None
                    };
                }
            }
        }

        let mut positions = IndexMap::new();
        let mut cursor = 0;
        for par in &mut paragraphs {
            par.words.push(Word::synthetic(PARAGRAPH_BREAK));
            par.offset = cursor;
            for w in par.words.words_mut() {
                w.start = cursor;
                cursor = w.end();
                if let Some(node) = &w.node {
                    positions.insert(node.clone(), (w.start, cursor));
                }
            }
        }

        let sentences: Vec<Sentence> = paragraphs.iter().flat_map(|p| self.find_sentences(p)).collect();
        let mut sentence_ids = IndexMap::new();
        for s in &sentences {
            for w in &s.words {
                sentence_ids.insert(w.clone(), s.id.clone());
            }
        }

        let mut words: Vec<WordPosition> = doc
            .span_ids()
            .iter()
            .map(|id| {
                let (from, to) = positions.get(id).copied().unwrap_or((0, 0));
                WordPosition { id: id.clone(), from, to }
            })
            .collect();
        words.sort_by_key(|w| (w.from, w.to));

        let text: String = paragraphs.iter().map(Paragraph::text).collect();

        let cites = ref_pars
            .iter()
            .filter_map(|p| index.get(p).map(|&i| (p, i)))
            .map(|(p, i)| CitationRecord {
                id: format!("CITE-{}", p),
                text: paragraphs[i].text().trim().to_string(),
                citing_ids: citing.get(p).cloned().unwrap_or_default(),
            })
            .collect();

        log::debug!(
            "Textualized {} paragraphs into {} sentences ({} math regions)",
            paragraphs.len(),
            sentences.len(),
            maths.len()
        );

        TextualizedDocument {
            paragraphs,
            text,
            words,
            sentences,
            maths,
            cites,
            positions,
            sentence_ids,
        }
    }
}
