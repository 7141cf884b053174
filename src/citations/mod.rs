//! Citation mention detection, resolution and rhetorical classification.
//!
//! The resolver works on each paragraph's flat text (`data-text`):
//!
//! 1. Bibliography entries are the paragraphs of `Reference` boxes; their
//!    leading `[key]` or `N.` forms the reference-key index.
//! 2. Four mention families are substituted in order, each resolved mention
//!    becoming an inline `<refer cite="N">` placeholder and a [`CitationMark`].
//! 3. The rewritten paragraph is split into sentences and every sentence
//!    holding a placeholder is classified with the cue tables in [`rhetoric`].
//! 4. Each mark's context is located on the paragraph's spans, producing a
//!    [`CiteRange`] keyed by the first span's id.

mod patterns;
pub mod resolver;
pub mod rhetoric;

pub use resolver::{CitationResolver, ReferenceHit};
pub use rhetoric::RhetoricalCategory;

use crate::xhtml::AttributePatch;
use indexmap::IndexMap;
use std::fmt;

/// Orthographic family a mention was recognized by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CitationStyle {
    /// `(Smith, 2001; Jones 2002)` or `[see Smith 2001]`
    Parenthetical,
    /// `Smith (2001)`, `Smith and Jones (2001, 2002)`, `Smith et al. [2001]`
    InlineYear,
    /// `[Smith, 12]`
    AuthorNumber,
    /// `[3, 4]` resolved through the reference-key index
    BracketKey,
}

impl CitationStyle {
    /// Short name of the family.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parenthetical => "parenthetical",
            Self::InlineYear => "inline-year",
            Self::AuthorNumber => "author-number",
            Self::BracketKey => "bracket-key",
        }
    }

    /// Whether the located phrase drops its opening bracket.
    fn drops_leading_bracket(&self) -> bool {
        matches!(self, Self::AuthorNumber | Self::BracketKey)
    }
}

impl fmt::Display for CitationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved citation occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct CitationMark {
    /// Sequential id, starting at 1 per document
    pub id: usize,
    /// Paragraph the mention occurs in
    pub paragraph_id: String,
    /// Resolved bibliography entry ids, in mention order
    pub reference_ids: Vec<String>,
    /// Matched mention text
    pub context: String,
    /// Family the mention was recognized by
    pub style: CitationStyle,
    /// Rhetorical stance of the citing sentence
    pub category: RhetoricalCategory,
    /// Cue text that decided the category (empty for neutral)
    pub cue: String,
}

/// A citation mark located on token spans.
#[derive(Debug, Clone, PartialEq)]
pub struct CiteRange {
    /// Mark id
    pub mark_id: usize,
    /// Resolved bibliography entry ids
    pub reference_ids: Vec<String>,
    /// First span of the mention
    pub start_id: String,
    /// Last span of the mention
    pub end_id: String,
    /// Rhetorical stance
    pub category: RhetoricalCategory,
    /// Cue text
    pub cue: String,
}

/// Everything the resolver produced for one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CitationAnnotations {
    /// Marks in creation order
    pub marks: Vec<CitationMark>,
    /// Located ranges keyed by their first span id
    pub ranges: IndexMap<String, CiteRange>,
    /// Number of resolved mentions per bibliography entry
    pub counts: IndexMap<String, usize>,
}

impl CitationAnnotations {
    /// Range starting at span `id`.
    pub fn range_at(&self, id: &str) -> Option<&CiteRange> {
        self.ranges.get(id)
    }

    /// Mark with the given id.
    pub fn mark(&self, id: usize) -> Option<&CitationMark> {
        self.marks.iter().find(|m| m.id == id)
    }

    /// Attribute edits for the `data-cite-*` attributes.
    pub fn to_patch(&self) -> AttributePatch {
        let mut patch = AttributePatch::new();
        for (start, r) in &self.ranges {
            patch.set(start, "data-cite-id", r.reference_ids.join(","));
            patch.set(start, "data-cite-end", r.end_id.as_str());
            patch.set(start, "data-cite-type", r.category.as_str());
            patch.set(start, "data-cite-type-cue", r.cue.as_str());
        }
        patch
    }
}
