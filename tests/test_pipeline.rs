//! End-to-end tests: analyzer XHTML in, annotated XHTML and tables out.

use pdfnlt_postprocess::citations::CitationStyle;
use pdfnlt_postprocess::pipeline::{Pipeline, PipelineConfig};
use pdfnlt_postprocess::{CitationResolver, Document, FigureTagger, RhetoricalCategory};
use std::fs;

const NO_SPACE_BEFORE: &[&str] = &[".", ",", ")", "]", ":", ";"];
const NO_SPACE_AFTER: &[&str] = &["(", "["];

/// Paragraph `id` made of `tokens`, with `data-text` spelled the way the
/// tokens are spaced.
fn para(id: &str, extra: &str, tokens: &[&str]) -> String {
    let mut text = String::new();
    let mut spans = String::new();
    for (i, t) in tokens.iter().enumerate() {
        let glued = i > 0 && (NO_SPACE_BEFORE.contains(t) || NO_SPACE_AFTER.contains(&tokens[i - 1]));
        let space = if i == 0 {
            r#" data-space="bol""#
        } else if glued {
            r#" data-space="nospace""#
        } else {
            ""
        };
        if i > 0 && !glued {
            text.push(' ');
        }
        text.push_str(t);
        spans.push_str(&format!(r#"<span id="{id}-{n}" class="word"{space}>{t}</span>"#, n = i + 1));
    }
    format!(r#"<p id="{id}" data-page="1" data-text="{text}"{extra}>{spans}</p>"#)
}

fn xhtml(boxes: &[(&str, String)]) -> String {
    let boxes: String = boxes
        .iter()
        .map(|(name, body)| format!(r#"<div data-name="{name}">{body}</div>"#))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><meta docid="TEST-1"/></head><body><div id="s-1" data-name="Introduction">{boxes}</div></body></html>"#
    )
}

fn attr(doc: &Document, id: &str, name: &str) -> Option<String> {
    let mut found = None;
    doc.tree().root.walk(&mut |e| {
        if e.attr("id") == Some(id) {
            found = e.attr(name).map(str::to_string);
        }
    });
    found
}

fn citing_doc() -> Document {
    let xml = xhtml(&[
        (
            "Body",
            para(
                "p-1",
                "",
                &["Smith", "(", "2001", ")", "showed", "parsing", ".", "However", ",", "we", "argue", "otherwise", "."],
            ),
        ),
        ("Reference", para("p-9", "", &["Smith", ",", "J.", "2001", ".", "A", "parser", "."])),
    ]);
    Document::from_str(&xml).unwrap()
}

mod citations {
    use super::*;

    #[test]
    fn test_inline_year_mark_is_contrastive() {
        let doc = citing_doc();
        let ann = CitationResolver::new().resolve(&doc);
        assert_eq!(ann.marks.len(), 1);
        let mark = &ann.marks[0];
        assert_eq!(mark.style, CitationStyle::InlineYear);
        assert_eq!(mark.category, RhetoricalCategory::Contrastive);
        assert_eq!(mark.cue, "However");
        assert_eq!(mark.reference_ids, vec!["p-9"]);
        let range = ann.range_at("p-1-1").unwrap();
        assert_eq!(range.end_id, "p-1-4");
    }

    #[test]
    fn test_citation_written_and_reconstructed() {
        let mut doc = citing_doc();
        let result = Pipeline::new().annotate(&mut doc).unwrap();

        assert_eq!(attr(&doc, "p-1-1", "data-cite-id").as_deref(), Some("p-9"));
        assert_eq!(attr(&doc, "p-1-1", "data-cite-end").as_deref(), Some("p-1-4"));
        assert_eq!(attr(&doc, "p-1-1", "data-cite-type").as_deref(), Some("C"));
        assert_eq!(attr(&doc, "p-1-1", "data-cite-type-cue").as_deref(), Some("However"));

        assert_eq!(
            result.text,
            "CITE-p-9 showed parsing. However, we argue otherwise.\n\nSmith, J. 2001. A parser.\n\n"
        );
        assert_eq!(result.sentences[0].text, "CITE-p-9 showed parsing. ");
        assert_eq!(result.sentences[0].words[..4], ["p-1-1", "p-1-2", "p-1-3", "p-1-4"]);
        assert_eq!(result.sentences[1].id, "s-1-1");
        assert_eq!(result.cites.len(), 1);
        assert_eq!(result.cites[0].citing_ids, vec!["p-1-1"]);
    }

    #[test]
    fn test_bracket_key_resolution() {
        let xml = xhtml(&[
            ("Body", para("p-1", "", &["as", "shown", "in", "[", "A1", "]", "."])),
            (
                "Reference",
                para("p-9", "", &["[", "A1", "]", "Smith", ",", "J.", "(", "2001", ")", "."]),
            ),
        ]);
        let mut doc = Document::from_str(&xml).unwrap();
        let ann = CitationResolver::new().resolve(&doc);
        assert_eq!(ann.marks.len(), 1);
        assert_eq!(ann.marks[0].style, CitationStyle::BracketKey);
        assert_eq!(ann.range_at("p-1-5").map(|r| r.end_id.as_str()), Some("p-1-6"));

        let result = Pipeline::new().annotate(&mut doc).unwrap();
        assert!(result.text.starts_with("as shown in [CITE-p-9.\n\n"));
    }

    #[test]
    fn test_resolution_is_repeatable() {
        let doc = citing_doc();
        let first = CitationResolver::new().resolve(&doc);
        let second = CitationResolver::new().resolve(&Document::from_str(&String::from_utf8(doc.to_bytes()).unwrap()).unwrap());
        assert_eq!(first.marks, second.marks);
        assert_eq!(first.ranges, second.ranges);
    }
}

mod figures {
    use super::*;

    fn figure_doc() -> Document {
        let xml = xhtml(&[
            (
                "Caption",
                para("p-8", r#" data-fig="Figure_1""#, &["Figure", "1", ":", "A", "plot", "."]),
            ),
            (
                "Body",
                para("p-1", "", &["Figure", "1", "shows", "results", "."])
                    + &para("p-2", "", &["As", "Figure", "1", "suggests", ",", "it", "works", "."]),
            ),
        ]);
        Document::from_str(&xml).unwrap()
    }

    #[test]
    fn test_figure_mentions_tagged_per_paragraph() {
        let doc = figure_doc();
        let refs = FigureTagger::new().tag(&doc);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs.references[0].range.start_id, "p-1-1");
        assert_eq!(refs.references[0].range.end_id, "p-1-2");
        assert_eq!(refs.references[1].range.start_id, "p-2-2");
        assert!(refs.references.iter().all(|r| r.range.tags == ["Figure_1"]));
    }

    #[test]
    fn test_figure_attributes_written() {
        let mut doc = figure_doc();
        Pipeline::new().annotate(&mut doc).unwrap();
        assert_eq!(attr(&doc, "p-1-1", "data-figref").as_deref(), Some("B-FIG"));
        assert_eq!(attr(&doc, "p-1-1", "data-figref-id").as_deref(), Some("Figure_1"));
        assert_eq!(attr(&doc, "p-1-1", "data-figref-end").as_deref(), Some("p-1-2"));
        assert_eq!(attr(&doc, "p-1-2", "data-figref").as_deref(), Some("I-FIG"));
        assert_eq!(attr(&doc, "p-8-1", "data-figref"), None);
    }
}

mod reconstruction {
    use super::*;

    #[test]
    fn test_equation_box_joins_open_paragraph() {
        let equation = r#"<p id="p-2" data-page="1"><span id="p-2-1" data-bdr="10,20,30,40">x</span><span id="p-2-2" data-space="nospace" data-bdr="30,18,50,40">=y</span></p>"#;
        let xml = xhtml(&[
            ("Body", para("p-1", "", &["the", "score", "is"])),
            ("Equation", equation.to_string()),
            ("Body", para("p-3", "", &["Next", "part", "."])),
        ]);
        let mut doc = Document::from_str(&xml).unwrap();
        let result = Pipeline::new().annotate(&mut doc).unwrap();

        assert_eq!(result.paragraphs.len(), 2);
        assert_eq!(result.paragraphs[0].text(), "the score is MATH-p-2\n\n");
        assert_eq!(result.maths.len(), 1);
        let m = &result.maths[0];
        assert_eq!(m.id, "MATH-p-2");
        assert_eq!((m.start_id.as_str(), m.end_id.as_str()), ("p-2-1", "p-2-2"));
        assert_eq!((m.bbox.x1, m.bbox.y1, m.bbox.x2, m.bbox.y2), (10.0, 18.0, 50.0, 40.0));
    }

    #[test]
    fn test_ligatures_expanded() {
        let xml = xhtml(&[("Body", para("p-1", "", &["e\u{FB03}cient", "\u{FB02}ow", "."]))]);
        let doc = Document::from_str(&xml).unwrap();
        let result = pdfnlt_postprocess::Textualizer::default().textualize(
            &doc,
            &pdfnlt_postprocess::MathLabels::new(),
            &Default::default(),
        );
        assert_eq!(result.text, "efficient flow.\n\n");
        assert_eq!(result.position("p-1-2"), Some((10, 14)));
    }
}

mod export {
    use super::*;

    #[test]
    fn test_process_file_writes_all_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("paper.xhtml");
        let xml = xhtml(&[
            (
                "Body",
                para(
                    "p-1",
                    "",
                    &["Smith", "(", "2001", ")", "showed", "parsing", ".", "However", ",", "we", "argue", "otherwise", "."],
                ),
            ),
            ("Reference", para("p-9", "", &["Smith", ",", "J.", "2001", ".", "A", "parser", "."])),
        ]);
        fs::write(&src, xml).unwrap();

        let out = dir.path().join("out");
        let pipeline = Pipeline::with_config(PipelineConfig::default().with_out_dir(&out));
        let files = pipeline.process_file(&src).unwrap();

        assert_eq!(files.words, out.join("paper.word.tsv"));
        let words = fs::read_to_string(&files.words).unwrap();
        let header = format!("ID\tFrom\tTo\t{}\n", src.display());
        assert!(words.starts_with(&header));
        assert!(words.contains("p-1-5\t9\t15\n"));

        let text = fs::read_to_string(&files.text).unwrap();
        assert!(text.starts_with("CITE-p-9 showed parsing."));

        let sentences = fs::read_to_string(&files.sentences).unwrap();
        let mut lines = sentences.lines();
        assert_eq!(lines.next(), Some("id\tsect_name\tbox_name\ttext\twords"));
        assert_eq!(
            lines.next(),
            Some("s-1-0\tIntroduction\tBody\tCITE-p-9 showed parsing.\tp-1-1,p-1-2,p-1-3,p-1-4,p-1-5,p-1-6,p-1-7")
        );

        let cites = fs::read_to_string(&files.cites).unwrap();
        assert_eq!(cites, "CiteID\tText\tFrom\nCITE-p-9\tSmith, J. 2001. A parser.\tp-1-1\n");

        let maths = fs::read_to_string(&files.maths).unwrap();
        assert_eq!(maths, "MathID\tStartID\tEndId\tPage\tX1\tY1\tX2\tY2\n");

        let annotated = Document::open(&files.xhtml).unwrap();
        assert_eq!(attr(&annotated, "p-1-5", "data-sent-id").as_deref(), Some("s-1-0"));
        assert_eq!(attr(&annotated, "p-1-5", "data-from"), None);
        assert_eq!(attr(&annotated, "p-1-1", "data-cite-type").as_deref(), Some("C"));
    }

    #[test]
    fn test_batch_mode_continues_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.xhtml");
        fs::write(&good, xhtml(&[("Body", para("p-1", "", &["Fine", "."]))])).unwrap();
        let bad = dir.path().join("bad.xhtml");
        fs::write(&bad, "<html><head/></html>").unwrap();

        let config = PipelineConfig::default().with_out_dir(dir.path().join("out")).with_batch(true);
        let report = Pipeline::with_config(config).run(&[&bad, &good]).unwrap();
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, bad);
        assert_eq!(report.processed.len(), 1);
        assert!(report.processed[0].text.exists());
    }
}
