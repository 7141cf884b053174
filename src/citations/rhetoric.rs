//! Rhetorical classification of citing sentences.
//!
//! The cue vocabulary is an ordered table of [`CueRule`]s. Each rule names the
//! sentence window it looks at (offsets from the citing sentence, joined with a
//! space) and the patterns to search for. The first rule with a matching
//! pattern decides the category; its matched text, trimmed, is the cue.

use super::patterns::RE_PLACEHOLDER;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

/// Stance of a citing sentence towards the cited work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RhetoricalCategory {
    /// Contrasts with or criticizes the cited work (`C`)
    Contrastive,
    /// Adopts or builds on the cited work (`B`)
    Adoptive,
    /// No cue found (`O`)
    #[default]
    Neutral,
}

impl RhetoricalCategory {
    /// One-letter tag written to `data-cite-type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contrastive => "C",
            Self::Adoptive => "B",
            Self::Neutral => "O",
        }
    }
}

impl fmt::Display for RhetoricalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the cue table.
#[derive(Debug, Clone, Copy)]
pub struct CueRule {
    /// Category assigned when a pattern matches
    pub category: RhetoricalCategory,
    /// Sentence offsets (from the citing sentence) searched together
    pub window: &'static [usize],
    /// Patterns tried in order
    pub patterns: &'static [&'static str],
}

/// The built-in cue table: contrastive cues with shrinking windows, then adoptive cues.
pub const CUE_RULES: &[CueRule] = &[
    CueRule {
        category: RhetoricalCategory::Contrastive,
        window: &[0, 1, 2, 3, 4, 5],
        patterns: &["however,[^<]*? not "],
    },
    CueRule {
        category: RhetoricalCategory::Contrastive,
        window: &[0, 1, 2, 3, 4],
        patterns: &["however,[^<]*? our ", "However,?", "however, *the", "But "],
    },
    CueRule {
        category: RhetoricalCategory::Contrastive,
        window: &[0, 1, 2, 3],
        patterns: &["however,[^<]*? they "],
    },
    CueRule {
        category: RhetoricalCategory::Contrastive,
        window: &[0, 1, 2],
        patterns: &[
            "[Aa]lthough the ",
            ", ?although ",
            "Though[ ,]",
            "but (?:a|an|the|it|is|are|rather|no) ",
            "[Bb]ut (?:they|their|he|his|she|her|it|instead) ",
            "Instead ?,",
            "In spite of ",
            " did not ",
            " not be ",
            " (?:that|this|it) is not ",
            " (?:was|were) not ",
            " it does not ",
            " (?:may|might|will|would|could|should|need|have|has) not ",
            " (?:would|could|have|has)n't ",
            " can ?not be",
            " not always ",
            " not have ",
            "that do not ",
            "[Tt]hey do ?n[o']t ",
            "[Hh]e does ?n[o']t ",
            "[Ss]he does ?n[o']t ",
            " not (?:require|provide|cover) ",
            " not in effect ",
            " more efficient than [^<]*?cite",
            "[Ll]ittle influence",
            " is too ",
            " (?:a|more) difficult ",
            " differences? between ",
            " the only ",
        ],
    },
    CueRule {
        category: RhetoricalCategory::Contrastive,
        window: &[1, 2],
        patterns: &[" does not ", " less studied"],
    },
    CueRule {
        category: RhetoricalCategory::Contrastive,
        window: &[0],
        patterns: &[" not[^<]*?enough "],
    },
    CueRule {
        category: RhetoricalCategory::Adoptive,
        window: &[0, 1],
        patterns: &[
            "[Ww]e adopt",
            "[Ww]e appl(y|ied)",
            "[Ww]e use",
            "[Ww]e follow",
            "[Ww]e select",
            "[Ww]e opt",
            "[Ww]e make use of",
            "[Ww]e utilize",
            "[Oo]ur .{0,10} adopt",
            "[Oo]ur .{0,10} apply",
            "[Oo]ur .{0,10} use",
            "[Oo]ur .{0,10} ma(k|d)e use of",
            "[Oo]ur .{0,10} utilize",
        ],
    },
];

#[derive(Debug, Clone)]
struct CompiledRule {
    category: RhetoricalCategory,
    window: &'static [usize],
    patterns: Vec<Regex>,
}

lazy_static! {
    static ref DEFAULT_CLASSIFIER: CueClassifier = CueClassifier::from_rules(CUE_RULES).unwrap();
}

/// Split a paragraph at `. ` followed by an uppercase letter.
///
/// Joining the pieces with single spaces gives the paragraph back.
pub fn split_sentences(paragraph: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;
    let mut iter = paragraph.char_indices().peekable();
    while let Some((i, c)) = iter.next() {
        if c == ' ' && prev == Some('.') {
            if let Some(&(_, next)) = iter.peek() {
                if next.is_uppercase() {
                    out.push(&paragraph[start..i]);
                    start = i + 1;
                }
            }
        }
        prev = Some(c);
    }
    out.push(&paragraph[start..]);
    out
}

fn trim_cue(cue: &str) -> String {
    cue.trim_matches(|c| matches!(c, ',' | '.' | ' ' | ']')).to_string()
}

/// Rule engine over a cue table.
#[derive(Debug, Clone)]
pub struct CueClassifier {
    rules: Vec<CompiledRule>,
}

impl Default for CueClassifier {
    fn default() -> Self {
        DEFAULT_CLASSIFIER.clone()
    }
}

impl CueClassifier {
    /// Compile a cue table.
    pub fn from_rules(rules: &[CueRule]) -> std::result::Result<Self, regex::Error> {
        let rules = rules
            .iter()
            .map(|r| {
                Ok(CompiledRule {
                    category: r.category,
                    window: r.window,
                    patterns: r.patterns.iter().map(|p| Regex::new(p)).collect::<std::result::Result<_, _>>()?,
                })
            })
            .collect::<std::result::Result<_, regex::Error>>()?;
        Ok(Self { rules })
    }

    /// Classify sentence `i` of `sentences`.
    pub fn classify(&self, sentences: &[&str], i: usize) -> (RhetoricalCategory, String) {
        for rule in &self.rules {
            let context = rule
                .window
                .iter()
                .filter_map(|j| sentences.get(i + j).copied())
                .collect::<Vec<_>>()
                .join(" ");
            for re in &rule.patterns {
                if let Some(m) = re.find(&context) {
                    return (rule.category, trim_cue(m.as_str()));
                }
            }
        }
        (RhetoricalCategory::Neutral, String::new())
    }

    /// Classify every mark placeholder in a rewritten paragraph.
    ///
    /// Returns `(mark id, category, cue)` in placeholder order.
    pub fn classify_marks(&self, paragraph: &str) -> Vec<(usize, RhetoricalCategory, String)> {
        let sentences = split_sentences(paragraph);
        let mut out = Vec::new();
        for (i, sentence) in sentences.iter().enumerate() {
            if !sentence.contains("<refer") {
                continue;
            }
            let (category, cue) = self.classify(&sentences, i);
            for caps in RE_PLACEHOLDER.captures_iter(sentence) {
                if let Ok(id) = caps[1].parse::<usize>() {
                    out.push((id, category, cue.clone()));
                }
            }
        }
        out
    }
}
