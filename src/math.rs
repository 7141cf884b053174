//! Inline math labels and the math tagger seam.
//!
//! Inline math detection is performed by a sequence labelling model that lives
//! outside this crate. The reconstruction stage only needs its output: one
//! optional begin/inside label per token. [`MathTagger`] is the contract such a
//! model implements; [`PretaggedMath`] is the implementation used when the
//! labels are already embedded in the document (`data-math`).

use crate::error::{Error, Result};
use crate::xhtml::Document;
use std::collections::HashMap;

/// Per-token math label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MathLabel {
    /// First token of an inline math region (`B-Math`)
    Begin,
    /// Continuation token of an inline math region (`I-Math`)
    Inside,
}

impl MathLabel {
    /// Parse the `data-math` attribute form.
    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "B-Math" => Some(Self::Begin),
            "I-Math" => Some(Self::Inside),
            _ => None,
        }
    }

    /// The `data-math` attribute form.
    pub fn as_attr(&self) -> &'static str {
        match self {
            Self::Begin => "B-Math",
            Self::Inside => "I-Math",
        }
    }
}

/// Math labels keyed by token id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MathLabels {
    labels: HashMap<String, MathLabel>,
    /// Whether these labels came from a tagger run (and must be written back)
    generated: bool,
}

impl MathLabels {
    /// Create an empty label set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels already embedded in the document.
    pub fn from_document(doc: &Document) -> Self {
        let labels = doc
            .paragraphs()
            .flat_map(|(_, _, p)| p.spans.iter())
            .filter_map(|s| s.math.map(|m| (s.id.clone(), m)))
            .collect();
        Self {
            labels,
            generated: false,
        }
    }

    /// Labels produced by a tagger run.
    pub fn generated(labels: HashMap<String, MathLabel>) -> Self {
        Self {
            labels,
            generated: true,
        }
    }

    /// Label for a token, if any.
    pub fn get(&self, id: &str) -> Option<MathLabel> {
        self.labels.get(id).copied()
    }

    /// Set the label for a token.
    pub fn insert(&mut self, id: impl Into<String>, label: MathLabel) {
        self.labels.insert(id.into(), label);
    }

    /// Number of labelled tokens.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether no token is labelled.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Whether the labels should be written onto the document.
    pub fn is_generated(&self) -> bool {
        self.generated
    }

    /// Iterate over `(token id, label)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, MathLabel)> {
        self.labels.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// A component that labels inline math tokens.
pub trait MathTagger {
    /// Label the tokens of `doc`.
    ///
    /// Implementations return [`Error::AlreadyTagged`] when the document already
    /// carries position attributes; callers treat that as "skip this stage".
    fn tag(&self, doc: &Document) -> Result<MathLabels>;
}

/// Tagger that trusts the labels already present in the document.
#[derive(Debug, Clone, Copy, Default)]
pub struct PretaggedMath;

impl MathTagger for PretaggedMath {
    fn tag(&self, doc: &Document) -> Result<MathLabels> {
        if doc.has_positions() {
            return Err(Error::AlreadyTagged(doc.display_name()));
        }
        Ok(MathLabels::from_document(doc))
    }
}

/// Run a tagger, falling back to the document's own labels when it reports
/// that the document is already tagged.
pub fn tag_or_existing(tagger: &dyn MathTagger, doc: &Document) -> Result<MathLabels> {
    match tagger.tag(doc) {
        Ok(labels) => Ok(labels),
        Err(Error::AlreadyTagged(name)) => {
            log::warn!("mathtagger: File \"{}\" is already math-tagged. Skipping", name);
            Ok(MathLabels::from_document(doc))
        },
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(extra: &str) -> Document {
        let xml = format!(
            r#"<html><body><div><div data-name="Body"><p id="p-1" data-page="1">
<span id="w-1" data-math="B-Math" {extra}>x</span><span id="w-2" data-math="I-Math">y</span><span id="w-3">z</span>
</p></div></div></body></html>"#
        );
        Document::from_str(&xml).unwrap()
    }

    #[test]
    fn test_label_attr_round_trip() {
        assert_eq!(MathLabel::from_attr("B-Math"), Some(MathLabel::Begin));
        assert_eq!(MathLabel::from_attr("I-Math"), Some(MathLabel::Inside));
        assert_eq!(MathLabel::from_attr("O"), None);
        assert_eq!(MathLabel::Inside.as_attr(), "I-Math");
    }

    #[test]
    fn test_pretagged_reads_labels() {
        let labels = PretaggedMath.tag(&doc("")).unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels.get("w-1"), Some(MathLabel::Begin));
        assert_eq!(labels.get("w-2"), Some(MathLabel::Inside));
        assert_eq!(labels.get("w-3"), None);
        assert!(!labels.is_generated());
    }

    #[test]
    fn test_already_tagged_falls_back() {
        let d = doc(r#"data-from="0""#);
        assert!(matches!(PretaggedMath.tag(&d), Err(Error::AlreadyTagged(_))));
        let labels = tag_or_existing(&PretaggedMath, &d).unwrap();
        assert_eq!(labels.get("w-1"), Some(MathLabel::Begin));
    }

    #[test]
    fn test_generated_labels() {
        let mut map = HashMap::new();
        map.insert("w-9".to_string(), MathLabel::Begin);
        let labels = MathLabels::generated(map);
        assert!(labels.is_generated());
        assert_eq!(labels.iter().count(), 1);
    }
}
