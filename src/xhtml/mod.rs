//! XHTML input and output.
//!
//! - [`tree`]: owned XML tree built with `quick-xml`
//! - [`document`]: typed section/box/paragraph/span view over the tree
//! - [`annotate`]: attribute edits written back onto spans

pub mod annotate;
pub mod document;
pub mod tree;

pub use annotate::AttributePatch;
pub use document::{BoundingBox, BoxKind, Document, LayoutBox, ParagraphNode, Section, Span, SpaceHint};
pub use tree::{Element, Node, XmlTree};
