//! Per-document orchestration.
//!
//! ```text
//! XHTML file
//!     ↓
//! [Document] (typed view over the parsed tree)
//!     ↓
//! [FigureTagger] ──────────────→ FigureReferences
//! [MathTagger] ────────────────→ MathLabels
//! [CitationResolver] ──────────→ CitationAnnotations
//!     ↓
//! [Textualizer] (labels + annotations) → TextualizedDocument
//!     ↓
//! AttributePatch (all stages) → annotated tree
//!     ↓
//! [export] (.word.tsv, .sent.tsv, .math.tsv, .cite.tsv, .txt, .xhtml)
//! ```
//!
//! Stages exchange typed results only. The tree is written once, after every
//! stage has run.

pub mod config;

pub use config::{LogLevel, PipelineConfig, DEFAULT_OUT_DIR};

use crate::citations::CitationResolver;
use crate::error::Result;
use crate::export::{write_outputs, OutputFiles};
use crate::figures::FigureTagger;
use crate::math::{tag_or_existing, MathLabels, MathTagger, PretaggedMath};
use crate::textualizer::{TextualizedDocument, Textualizer};
use crate::xhtml::{AttributePatch, Document};
use std::path::{Path, PathBuf};

/// Outcome of a multi-document run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Documents processed successfully
    pub processed: Vec<OutputFiles>,
    /// Documents that failed, with the error message
    pub failed: Vec<(PathBuf, String)>,
}

fn math_patch(labels: &MathLabels) -> AttributePatch {
    let mut patch = AttributePatch::new();
    if labels.is_generated() {
        for (id, label) in labels.iter() {
            patch.set(id, "data-math", label.as_attr());
        }
    }
    patch
}

/// The postprocessing pipeline.
///
/// Each call works on its own stage instances, so one pipeline can process
/// any number of documents.
pub struct Pipeline {
    config: PipelineConfig,
    math_tagger: Box<dyn MathTagger>,
}

impl Pipeline {
    /// Create a pipeline with default configuration.
    pub fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    /// Create a pipeline with custom configuration.
    pub fn with_config(config: PipelineConfig) -> Self {
        Self {
            config,
            math_tagger: Box::new(PretaggedMath),
        }
    }

    /// Use a different inline math tagger.
    pub fn with_math_tagger(mut self, tagger: Box<dyn MathTagger>) -> Self {
        self.math_tagger = tagger;
        self
    }

    /// Get the current configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage on `doc` and write the results onto its tree.
    pub fn annotate(&self, doc: &mut Document) -> Result<TextualizedDocument> {
        let figures = FigureTagger::new().tag(doc);
        let labels = tag_or_existing(self.math_tagger.as_ref(), doc)?;
        let cites = CitationResolver::new().resolve(doc);
        let textualizer = Textualizer::new(&self.config.abbreviations);
        let result = textualizer.textualize(doc, &labels, &cites);

        let mut patch = figures.to_patch();
        patch.merge(cites.to_patch());
        patch.merge(math_patch(&labels));
        patch.merge(result.to_patch(doc, self.config.remove_positions));
        patch.apply(doc);

        log::debug!(
            "{}: {} figure references, {} citation marks, {} sentences",
            doc.display_name(),
            figures.len(),
            cites.marks.len(),
            result.sentences.len()
        );
        Ok(result)
    }

    /// Process one file and write its outputs.
    pub fn process_file(&self, path: impl AsRef<Path>) -> Result<OutputFiles> {
        let path = path.as_ref();
        log::info!("Begin to process: {}", path.display());
        let mut doc = Document::open(path)?;
        let result = self.annotate(&mut doc)?;
        write_outputs(&doc, &result, &self.config.out_dir)
    }

    /// Process several files.
    ///
    /// In batch mode a failing document is logged and skipped; otherwise the
    /// first error is returned.
    pub fn run<P: AsRef<Path>>(&self, paths: &[P]) -> Result<BatchReport> {
        if self.config.batch {
            log::debug!("Selected mode: batch");
        } else {
            log::debug!("Selected mode: normal");
        }

        let mut report = BatchReport::default();
        for path in paths {
            let path = path.as_ref();
            match self.process_file(path) {
                Ok(files) => report.processed.push(files),
                Err(e) => {
                    log::error!("Failed to process \"{}\": {}", path.display(), e);
                    if !self.config.batch {
                        return Err(e);
                    }
                    log::warn!("We got an error, but continuing the process (batch mode)");
                    report.failed.push((path.to_path_buf(), e.to_string()));
                },
            }
        }
        Ok(report)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
