//! Writing stage results back onto token spans.
//!
//! Each stage produces a typed result (figure ranges, citation ranges, offsets,
//! sentence ids). Those are converted into an [`AttributePatch`], a list of
//! attribute edits keyed by span id, and applied in one walk over the tree.

use crate::xhtml::Document;
use indexmap::IndexMap;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
struct SpanEdit {
    set: IndexMap<String, String>,
    remove: Vec<String>,
}

/// Attribute edits keyed by span id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributePatch {
    edits: HashMap<String, SpanEdit>,
}

impl AttributePatch {
    /// Create an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value` on span `id`.
    pub fn set(&mut self, id: &str, name: &str, value: impl Into<String>) {
        let edit = self.edits.entry(id.to_string()).or_default();
        edit.remove.retain(|r| r != name);
        edit.set.insert(name.to_string(), value.into());
    }

    /// Remove `name` from span `id`.
    ///
    /// Removals run before sets, so a value set on the same span wins.
    pub fn remove(&mut self, id: &str, name: &str) {
        let edit = self.edits.entry(id.to_string()).or_default();
        if !edit.set.contains_key(name) && !edit.remove.iter().any(|r| r == name) {
            edit.remove.push(name.to_string());
        }
    }

    /// Pending value for `name` on span `id`.
    pub fn get(&self, id: &str, name: &str) -> Option<&str> {
        self.edits.get(id)?.set.get(name).map(String::as_str)
    }

    /// Fold another patch into this one; its edits take precedence.
    pub fn merge(&mut self, other: AttributePatch) {
        for (id, edit) in other.edits {
            for name in edit.remove {
                self.edits.entry(id.clone()).or_default().set.shift_remove(&name);
                self.remove(&id, &name);
            }
            for (name, value) in edit.set {
                self.set(&id, &name, value);
            }
        }
    }

    /// Number of spans with pending edits.
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Whether the patch has no edits.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Apply the patch to the document tree, returning the number of spans touched.
    pub fn apply(&self, doc: &mut Document) -> usize {
        if self.edits.is_empty() {
            return 0;
        }
        let mut touched = 0;
        doc.tree.root.walk_mut(&mut |e| {
            if e.local_name() != "span" {
                return;
            }
            let edit = match e.attr("id").and_then(|id| self.edits.get(id)) {
                Some(edit) => edit,
                None => return,
            };
            for name in &edit.remove {
                e.remove_attr(name);
            }
            for (name, value) in &edit.set {
                e.set_attr(name.as_str(), value.as_str());
            }
            touched += 1;
        });
        log::debug!("Applied attribute edits to {} spans", touched);
        touched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<html><body><div><div data-name="Body"><p id="p-1">
<span id="w-1" class="word" data-from="0">A</span><span id="w-2" class="word">B</span>
</p></div></div></body></html>"#;

    fn span_attr(doc: &Document, id: &str, name: &str) -> Option<String> {
        let mut found = None;
        doc.tree().root.walk(&mut |e| {
            if e.attr("id") == Some(id) {
                found = e.attr(name).map(str::to_string);
            }
        });
        found
    }

    #[test]
    fn test_apply_sets_and_removes() {
        let mut doc = Document::from_str(XML).unwrap();
        let mut patch = AttributePatch::new();
        patch.set("w-2", "data-figref", "B-FIG");
        patch.remove("w-1", "data-from");
        assert_eq!(patch.len(), 2);
        assert_eq!(patch.apply(&mut doc), 2);
        assert_eq!(span_attr(&doc, "w-2", "data-figref").as_deref(), Some("B-FIG"));
        assert_eq!(span_attr(&doc, "w-1", "data-from"), None);
        assert_eq!(span_attr(&doc, "w-1", "class").as_deref(), Some("word"));
    }

    #[test]
    fn test_set_after_remove_wins() {
        let mut patch = AttributePatch::new();
        patch.remove("w-1", "data-from");
        patch.set("w-1", "data-from", "3");
        assert_eq!(patch.get("w-1", "data-from"), Some("3"));

        let mut doc = Document::from_str(XML).unwrap();
        patch.apply(&mut doc);
        assert_eq!(span_attr(&doc, "w-1", "data-from").as_deref(), Some("3"));
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut a = AttributePatch::new();
        a.set("w-1", "data-from", "1");
        let mut b = AttributePatch::new();
        b.remove("w-1", "data-from");
        b.set("w-2", "data-to", "2");
        a.merge(b);
        assert_eq!(a.get("w-1", "data-from"), None);
        assert_eq!(a.get("w-2", "data-to"), Some("2"));
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let mut doc = Document::from_str(XML).unwrap();
        let mut patch = AttributePatch::new();
        patch.set("w-99", "data-to", "1");
        assert_eq!(patch.apply(&mut doc), 0);
    }
}
