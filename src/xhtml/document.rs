//! Typed view of the layout analyzer's XHTML output.
//!
//! The analyzer emits one `div` per section, one nested `div` per layout box
//! (named by `data-name`), one `p` per paragraph and one `span` per token:
//!
//! ```text
//! html
//!  ├─ head/meta[@docid]
//!  └─ body
//!      └─ div (section: id, data-name)
//!          └─ div (box: data-name = Body | Reference | Equation | Caption | ...)
//!              └─ p (id, data-page, data-text, data-continued-from, data-fig)
//!                  └─ span (id, class, data-space, data-fullform, data-bdr, data-math, data-refid)
//! ```
//!
//! [`Document`] keeps the parsed [`XmlTree`] for serialization and exposes the
//! hierarchy above as plain structs. The stages never mutate the tree directly;
//! their results are written back through [`crate::xhtml::AttributePatch`].

use crate::error::{Error, Result};
use crate::math::MathLabel;
use crate::xhtml::tree::{Element, XmlTree};
use std::fmt;
use std::path::{Path, PathBuf};

/// Layout box kind, from the box `div`'s `data-name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BoxKind {
    /// Running text
    Body,
    /// Bibliography entries
    Reference,
    /// Display equation
    Equation,
    /// Figure or table caption
    Caption,
    /// Figure content
    Figure,
    /// Table content
    Table,
    /// Any other named box (title, abstract, footnote, ...)
    Other(String),
    /// Box without a `data-name`
    Unnamed,
}

impl BoxKind {
    /// Classify a box by its `data-name` value.
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("Body") => Self::Body,
            Some("Reference") => Self::Reference,
            Some("Equation") => Self::Equation,
            Some("Caption") => Self::Caption,
            Some("Figure") => Self::Figure,
            Some("Table") => Self::Table,
            Some(other) => Self::Other(other.to_string()),
            None => Self::Unnamed,
        }
    }

    /// The `data-name` value this kind was read from (empty for unnamed boxes).
    pub fn as_str(&self) -> &str {
        match self {
            Self::Body => "Body",
            Self::Reference => "Reference",
            Self::Equation => "Equation",
            Self::Caption => "Caption",
            Self::Figure => "Figure",
            Self::Table => "Table",
            Self::Other(name) => name,
            Self::Unnamed => "",
        }
    }

    /// Whether the box holds figure or table material rather than prose.
    pub fn is_float(&self) -> bool {
        matches!(self, Self::Caption | Self::Figure | Self::Table)
    }
}

impl fmt::Display for BoxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spacing hint carried by a token's `data-space` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpaceHint {
    /// A space precedes the token
    #[default]
    Default,
    /// The token is glued to the previous one (`nospace`)
    NoSpace,
    /// The token begins a new line (`bol`)
    LineStart,
}

impl SpaceHint {
    fn from_attr(value: Option<&str>) -> Self {
        match value {
            Some("nospace") => Self::NoSpace,
            Some("bol") => Self::LineStart,
            _ => Self::Default,
        }
    }
}

/// Axis-aligned bounding box in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum x
    pub x1: f64,
    /// Minimum y
    pub y1: f64,
    /// Maximum x
    pub x2: f64,
    /// Maximum y
    pub y2: f64,
}

impl BoundingBox {
    /// Create a bounding box from its corners.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Parse the analyzer's `x1,y1,x2,y2` form.
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.split(',').map(|p| p.trim().parse::<f64>());
        let bbox = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(Ok(x1)), Some(Ok(y1)), Some(Ok(x2)), Some(Ok(y2))) => Self::new(x1, y1, x2, y2),
            _ => return None,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(bbox)
    }

    /// Grow this box to cover `other`.
    pub fn extend(&mut self, other: &BoundingBox) {
        self.x1 = self.x1.min(other.x1);
        self.y1 = self.y1.min(other.y1);
        self.x2 = self.x2.max(other.x2);
        self.y2 = self.y2.max(other.y2);
    }
}

/// A token node: one glyph cluster or word fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    /// Unique, stable identifier
    pub id: String,
    /// Raw text content
    pub text: Option<String>,
    /// `class` attribute (`word` for ordinary tokens)
    pub class: Option<String>,
    /// Literal full-form override (`data-fullform`)
    pub fullform: Option<String>,
    /// Spacing hint (`data-space`)
    pub space: SpaceHint,
    /// Bounding box (`data-bdr`)
    pub bbox: Option<BoundingBox>,
    /// Math label already present in the source (`data-math`)
    pub math: Option<MathLabel>,
    /// Reference to the canonical rendering of this token (`data-refid`)
    pub refid: Option<String>,
    /// Whether the span already carries a `data-from` position
    pub has_position: bool,
}

impl Span {
    /// Text with empty content treated as absent.
    pub fn non_empty_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }

    /// Whether this span is the canonical rendering of its token.
    ///
    /// Spans pointing (via `data-refid`) at a different span are duplicates.
    pub fn is_canonical(&self) -> bool {
        self.refid.as_deref().map_or(true, |r| r == self.id)
    }

    /// Literal text used for reconstruction: the full form if present.
    pub fn literal(&self) -> &str {
        self.fullform
            .as_deref()
            .filter(|f| !f.is_empty())
            .or(self.text.as_deref())
            .unwrap_or("")
    }

    fn from_element(e: &Element) -> Option<Self> {
        let id = e.attr("id")?.to_string();
        let bbox = e.attr("data-bdr").and_then(|v| {
            let parsed = BoundingBox::parse(v);
            if parsed.is_none() {
                log::warn!("Span {} has a malformed data-bdr '{}'", id, v);
            }
            parsed
        });
        Some(Self {
            text: e.leading_text(),
            class: e.attr("class").map(str::to_string),
            fullform: e.attr("data-fullform").map(str::to_string),
            space: SpaceHint::from_attr(e.attr("data-space")),
            bbox,
            math: e.attr("data-math").and_then(MathLabel::from_attr),
            refid: e.attr("data-refid").map(str::to_string),
            has_position: e.attr("data-from").is_some(),
            id,
        })
    }
}

/// A paragraph element with its token spans.
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphNode {
    /// Paragraph identifier
    pub id: String,
    /// Page number (`data-page`)
    pub page: Option<u32>,
    /// Flat paragraph text (`data-text`)
    pub text: Option<String>,
    /// Paragraph this one continues (`data-continued-from`)
    pub continued_from: Option<String>,
    /// Figure/table identifier defined by this paragraph (`data-fig`)
    pub figure: Option<String>,
    /// Token spans in order
    pub spans: Vec<Span>,
}

impl ParagraphNode {
    fn from_element(e: &Element) -> Result<Option<Self>> {
        let id = match e.attr("id") {
            Some(id) => id.to_string(),
            None => {
                log::warn!("Skipping paragraph without id");
                return Ok(None);
            },
        };
        let page = match e.attr("data-page") {
            Some(v) => Some(v.trim().parse::<u32>().map_err(|_| Error::InvalidAttribute {
                element: id.clone(),
                attribute: "data-page",
                value: v.to_string(),
            })?),
            None => None,
        };
        let spans = e
            .children_named("span")
            .filter_map(|s| {
                let span = Span::from_element(s);
                if span.is_none() {
                    log::debug!("Paragraph {} has a span without id", id);
                }
                span
            })
            .collect();
        Ok(Some(Self {
            page,
            text: e.attr("data-text").map(str::to_string),
            continued_from: e
                .attr("data-continued-from")
                .filter(|v| !v.is_empty())
                .map(str::to_string),
            figure: e.attr("data-fig").map(str::to_string),
            spans,
            id,
        }))
    }
}

/// A layout box within a section.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBox {
    /// Box kind
    pub kind: BoxKind,
    /// Paragraphs in order
    pub paragraphs: Vec<ParagraphNode>,
}

/// A document section.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// Section identifier
    pub id: Option<String>,
    /// Section name (`data-name`)
    pub name: Option<String>,
    /// Layout boxes in order
    pub boxes: Vec<LayoutBox>,
}

/// An analyzed document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Source path, if loaded from disk
    pub filename: Option<PathBuf>,
    /// Document identifier from `head/meta/@docid`
    pub docid: Option<String>,
    /// Sections in document order
    pub sections: Vec<Section>,
    span_ids: Vec<String>,
    pub(crate) tree: XmlTree,
}

impl Document {
    /// Load a document from a file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path)?;
        let mut doc = Self::from_str(&xml)?;
        doc.filename = Some(path.to_path_buf());
        Ok(doc)
    }

    /// Parse a document from XHTML text.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(xml: &str) -> Result<Self> {
        Self::from_tree(XmlTree::parse(xml)?)
    }

    /// Build the typed view over a parsed tree.
    pub fn from_tree(tree: XmlTree) -> Result<Self> {
        let root = &tree.root;
        let docid = root
            .child_named("head")
            .and_then(|head| head.children_named("meta").find_map(|m| m.attr("docid")))
            .map(str::to_string);
        match &docid {
            Some(id) => log::info!("Now docid = {}", id),
            None => log::warn!("This docid is not defined."),
        }

        let body = root
            .child_named("body")
            .ok_or_else(|| Error::MissingElement("body".to_string()))?;

        let mut sections = Vec::new();
        for sec in body.children_named("div") {
            let mut boxes = Vec::new();
            for bx in sec.children_named("div") {
                let mut paragraphs = Vec::new();
                for p in bx.children_named("p") {
                    if let Some(par) = ParagraphNode::from_element(p)? {
                        paragraphs.push(par);
                    }
                }
                boxes.push(LayoutBox {
                    kind: BoxKind::from_name(bx.attr("data-name")),
                    paragraphs,
                });
            }
            sections.push(Section {
                id: sec.attr("id").map(str::to_string),
                name: sec.attr("data-name").map(str::to_string),
                boxes,
            });
        }

        let mut span_ids = Vec::new();
        root.walk(&mut |e| {
            if e.local_name() == "span" {
                if let Some(id) = e.attr("id") {
                    span_ids.push(id.to_string());
                }
            }
        });

        Ok(Self {
            filename: None,
            docid,
            sections,
            span_ids,
            tree,
        })
    }

    /// Iterate over every paragraph with its section and box.
    pub fn paragraphs(&self) -> impl Iterator<Item = (&Section, &LayoutBox, &ParagraphNode)> {
        self.sections.iter().flat_map(|sec| {
            sec.boxes
                .iter()
                .flat_map(move |bx| bx.paragraphs.iter().map(move |p| (sec, bx, p)))
        })
    }

    /// Identifiers of every span in the document, in document order.
    pub fn span_ids(&self) -> &[String] {
        &self.span_ids
    }

    /// Whether any span already carries position attributes.
    pub fn has_positions(&self) -> bool {
        self.paragraphs()
            .any(|(_, _, p)| p.spans.iter().any(|s| s.has_position))
    }

    /// Display name used in log messages.
    pub fn display_name(&self) -> String {
        match (&self.filename, &self.docid) {
            (Some(path), _) => path.display().to_string(),
            (None, Some(docid)) => docid.clone(),
            (None, None) => "<document>".to_string(),
        }
    }

    /// Serialize the (possibly annotated) document.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.tree.to_bytes()
    }

    /// Access the underlying tree.
    pub fn tree(&self) -> &XmlTree {
        &self.tree
    }
}
