//! Text structures built during reconstruction.

use crate::xhtml::{BoundingBox, BoxKind};

/// A unit of reconstructed text.
///
/// Words without an id are synthetic (spaces, paragraph breaks). Words with
/// a `node` are written back as positions on that span; placeholders and the
/// empty words standing for swallowed tokens carry an id but no node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    /// Id of the token this word stands for
    pub id: Option<String>,
    /// Text contributed to the document
    pub text: String,
    /// Span receiving `data-from`/`data-to`
    pub node: Option<String>,
    /// Document-relative character offset, assigned after the walk
    pub start: usize,
}

impl Word {
    /// A single space between tokens.
    pub fn space() -> Self {
        Self::synthetic(" ")
    }

    /// Text with no token behind it.
    pub fn synthetic(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            node: None,
            start: 0,
        }
    }

    /// Literal token text, positioned on its span.
    pub fn token(id: &str, text: impl Into<String>) -> Self {
        Self {
            id: Some(id.to_string()),
            text: text.into(),
            node: Some(id.to_string()),
            start: 0,
        }
    }

    /// Text standing in for a token (a placeholder, or nothing) without a position.
    pub fn placeholder(id: &str, text: impl Into<String>) -> Self {
        Self {
            id: Some(id.to_string()),
            text: text.into(),
            node: None,
            start: 0,
        }
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether the word contributes no text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Offset just past the word.
    pub fn end(&self) -> usize {
        self.start + self.len()
    }
}

/// A paragraph's word list with a single checkpoint.
///
/// While an inline math region is open, the literal words it replaces are
/// recorded on a shadow copy taken at the checkpoint. If the region is
/// abandoned, [`WordBuffer::rollback`] swaps the shadow in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordBuffer {
    words: Vec<Word>,
    shadow: Option<Vec<Word>>,
}

impl WordBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a word to the live list.
    pub fn push(&mut self, word: Word) {
        self.words.push(word);
    }

    /// Snapshot the live list as the shadow copy.
    pub fn checkpoint(&mut self) {
        self.shadow = Some(self.words.clone());
    }

    /// Append a word to the shadow copy only. No-op without a checkpoint.
    pub fn shadow_push(&mut self, word: Word) {
        if let Some(shadow) = &mut self.shadow {
            shadow.push(word);
        }
    }

    /// Replace the live list with the shadow copy.
    ///
    /// Returns false when there is no checkpoint.
    pub fn rollback(&mut self) -> bool {
        match self.shadow.take() {
            Some(shadow) => {
                self.words = shadow;
                true
            },
            None => false,
        }
    }

    /// Drop the checkpoint.
    pub fn commit(&mut self) {
        self.shadow = None;
    }

    /// Live words.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Live words, mutably.
    pub fn words_mut(&mut self) -> &mut [Word] {
        &mut self.words
    }

    /// Last live word.
    pub fn last(&self) -> Option<&Word> {
        self.words.last()
    }

    /// Last live word that has text.
    pub fn last_non_empty(&self) -> Option<&Word> {
        self.words.iter().rev().find(|w| !w.is_empty())
    }

    /// Number of live words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether there are no live words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Concatenated text of the live words.
    pub fn text(&self) -> String {
        self.words.iter().map(|w| w.text.as_str()).collect()
    }
}

/// A logical paragraph: one paragraph node plus everything that continues it.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    /// Section id
    pub section_id: Option<String>,
    /// Id of the paragraph node that opened this paragraph
    pub id: String,
    /// Section name
    pub section_name: Option<String>,
    /// Kind of the box that opened this paragraph
    pub box_kind: BoxKind,
    /// Reconstructed words
    pub words: WordBuffer,
    /// Document-relative offset of the first word
    pub offset: usize,
}

impl Paragraph {
    /// Create an empty paragraph.
    pub fn new(section_id: Option<String>, id: impl Into<String>, section_name: Option<String>, box_kind: BoxKind) -> Self {
        Self {
            section_id,
            id: id.into(),
            section_name,
            box_kind,
            words: WordBuffer::new(),
            offset: 0,
        }
    }

    /// Whether the paragraph's last text does not end a sentence.
    ///
    /// A paragraph without text never continues.
    pub fn is_open(&self) -> bool {
        match self.words.last_non_empty() {
            Some(w) => !w.text.ends_with(&['.', '?', '!'][..]),
            None => false,
        }
    }

    /// Concatenated paragraph text.
    pub fn text(&self) -> String {
        self.words.text()
    }
}

/// A sentence of one paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// `s-<paragraph number>-<index>`
    pub id: String,
    /// Section name
    pub section_name: Option<String>,
    /// Box name
    pub box_name: String,
    /// Sentence text, including trailing whitespace
    pub text: String,
    /// Ids of the tokens whose words start inside the sentence
    pub words: Vec<String>,
}

/// An inline math region.
#[derive(Debug, Clone, PartialEq)]
pub struct MathRegion {
    /// `MATH-<id>`
    pub id: String,
    /// First token
    pub start_id: String,
    /// Last token
    pub end_id: String,
    /// Page of the paragraph the region starts in
    pub page: Option<u32>,
    /// Union of the tokens' boxes
    pub bbox: BoundingBox,
}

/// A bibliography entry with the tokens citing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationRecord {
    /// `CITE-<reference paragraph id>`
    pub id: String,
    /// Entry text
    pub text: String,
    /// Ids of the tokens starting a citation of this entry
    pub citing_ids: Vec<String>,
}

/// A row of the word table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordPosition {
    /// Span id
    pub id: String,
    /// Start offset (0 for spans without a position)
    pub from: usize,
    /// End offset (0 for spans without a position)
    pub to: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_kinds() {
        let w = Word::token("w-1", "ab");
        assert_eq!(w.node.as_deref(), Some("w-1"));
        let p = Word::placeholder("w-2", "MATH-w-2");
        assert!(p.node.is_none());
        assert_eq!(Word::space().id, None);
        let mut l = Word::token("w-3", "ﬁx");
        l.start = 4;
        assert_eq!(l.len(), 2);
        assert_eq!(l.end(), 6);
    }

    #[test]
    fn test_checkpoint_and_rollback() {
        let mut buf = WordBuffer::new();
        buf.push(Word::token("w-1", "a"));
        buf.checkpoint();
        buf.shadow_push(Word::space());
        buf.shadow_push(Word::token("w-2", "x"));
        buf.push(Word::space());
        buf.push(Word::placeholder("w-2", "MATH-w-2"));
        assert_eq!(buf.text(), "a MATH-w-2");
        assert!(buf.rollback());
        assert_eq!(buf.text(), "a x");
        assert!(!buf.rollback());
    }

    #[test]
    fn test_commit_discards_shadow() {
        let mut buf = WordBuffer::new();
        buf.checkpoint();
        buf.commit();
        buf.shadow_push(Word::space());
        buf.push(Word::token("w-1", "a"));
        assert!(!buf.rollback());
        assert_eq!(buf.text(), "a");
    }

    #[test]
    fn test_paragraph_open() {
        let mut p = Paragraph::new(None, "p-1", None, BoxKind::Body);
        assert!(!p.is_open());
        p.words.push(Word::token("w-1", "where"));
        p.words.push(Word::placeholder("w-2", ""));
        assert!(p.is_open());
        p.words.push(Word::token("w-3", "end."));
        assert!(!p.is_open());
    }
}
