//! Writers for the derived tables and the annotated document.
//!
//! For a source `paper.xhtml` the output directory receives:
//!
//! | File | Columns |
//! |---|---|
//! | `paper.word.tsv` | `ID, From, To` (header carries the source path) |
//! | `paper.sent.tsv` | `id, sect_name, box_name, text, words` |
//! | `paper.math.tsv` | `MathID, StartID, EndId, Page, X1, Y1, X2, Y2` |
//! | `paper.cite.tsv` | `CiteID, Text, From` |
//! | `paper.txt` | reconstructed text |
//! | `paper.xhtml` | annotated document |
//!
//! Tables are tab-separated with `\n` line endings and quoting only where needed.

use crate::error::Result;
use crate::textualizer::TextualizedDocument;
use crate::xhtml::Document;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct WordRow<'a> {
    id: &'a str,
    from: usize,
    to: usize,
}

#[derive(Serialize)]
struct SentenceRow<'a> {
    id: &'a str,
    sect_name: &'a str,
    box_name: &'a str,
    text: &'a str,
    words: String,
}

#[derive(Serialize)]
struct MathRow<'a> {
    id: &'a str,
    start_id: &'a str,
    end_id: &'a str,
    page: Option<u32>,
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

#[derive(Serialize)]
struct CiteRow<'a> {
    id: &'a str,
    text: &'a str,
    from: String,
}

fn tsv_writer<W: Write>(inner: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .has_headers(false)
        .flexible(true)
        .from_writer(inner)
}

/// Files written by [`write_outputs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFiles {
    /// `<stem>.word.tsv`
    pub words: PathBuf,
    /// `<stem>.sent.tsv`
    pub sentences: PathBuf,
    /// `<stem>.math.tsv`
    pub maths: PathBuf,
    /// `<stem>.cite.tsv`
    pub cites: PathBuf,
    /// `<stem>.txt`
    pub text: PathBuf,
    /// Annotated document, under the source's own name
    pub xhtml: PathBuf,
}

impl OutputFiles {
    /// Output paths for a source file name inside `out_dir`.
    pub fn new(out_dir: &Path, source: &Path) -> Self {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let name = source
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.xhtml", stem));
        Self {
            words: out_dir.join(format!("{}.word.tsv", stem)),
            sentences: out_dir.join(format!("{}.sent.tsv", stem)),
            maths: out_dir.join(format!("{}.math.tsv", stem)),
            cites: out_dir.join(format!("{}.cite.tsv", stem)),
            text: out_dir.join(format!("{}.txt", stem)),
            xhtml: out_dir.join(name),
        }
    }
}

/// Write the word table.
pub fn write_words<W: Write>(out: W, source: &str, result: &TextualizedDocument) -> Result<()> {
    let mut wtr = tsv_writer(out);
    wtr.write_record(["ID", "From", "To", source])?;
    for w in &result.words {
        wtr.serialize(WordRow {
            id: &w.id,
            from: w.from,
            to: w.to,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the sentence table. Sentence text is trimmed.
pub fn write_sentences<W: Write>(out: W, result: &TextualizedDocument) -> Result<()> {
    let mut wtr = tsv_writer(out);
    wtr.write_record(["id", "sect_name", "box_name", "text", "words"])?;
    for s in &result.sentences {
        wtr.serialize(SentenceRow {
            id: &s.id,
            sect_name: s.section_name.as_deref().unwrap_or(""),
            box_name: &s.box_name,
            text: s.text.trim(),
            words: s.words.join(","),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the math region table.
pub fn write_maths<W: Write>(out: W, result: &TextualizedDocument) -> Result<()> {
    let mut wtr = tsv_writer(out);
    wtr.write_record(["MathID", "StartID", "EndId", "Page", "X1", "Y1", "X2", "Y2"])?;
    for m in &result.maths {
        wtr.serialize(MathRow {
            id: &m.id,
            start_id: &m.start_id,
            end_id: &m.end_id,
            page: m.page,
            x1: m.bbox.x1,
            y1: m.bbox.y1,
            x2: m.bbox.x2,
            y2: m.bbox.y2,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the citation table.
pub fn write_cites<W: Write>(out: W, result: &TextualizedDocument) -> Result<()> {
    let mut wtr = tsv_writer(out);
    wtr.write_record(["CiteID", "Text", "From"])?;
    for c in &result.cites {
        wtr.serialize(CiteRow {
            id: &c.id,
            text: &c.text,
            from: c.citing_ids.join(","),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write every output for `doc` into `out_dir`, creating it if needed.
pub fn write_outputs(doc: &Document, result: &TextualizedDocument, out_dir: &Path) -> Result<OutputFiles> {
    log::debug!("Outputting the results into {}", out_dir.display());
    fs::create_dir_all(out_dir)?;

    let source = match &doc.filename {
        Some(path) => path.clone(),
        None => PathBuf::from(format!("{}.xhtml", doc.docid.as_deref().unwrap_or("document"))),
    };
    let files = OutputFiles::new(out_dir, &source);

    log::debug!("Writing {}", files.words.display());
    write_words(fs::File::create(&files.words)?, &source.display().to_string(), result)?;

    log::debug!("Writing {}", files.xhtml.display());
    fs::write(&files.xhtml, doc.to_bytes())?;

    log::debug!("Writing {}", files.text.display());
    fs::write(&files.text, &result.text)?;

    log::debug!("Writing {}", files.sentences.display());
    write_sentences(fs::File::create(&files.sentences)?, result)?;

    log::debug!("Writing {}", files.maths.display());
    write_maths(fs::File::create(&files.maths)?, result)?;

    log::debug!("Writing {}", files.cites.display());
    write_cites(fs::File::create(&files.cites)?, result)?;

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::textualizer::{CitationRecord, MathRegion, Sentence, WordPosition};
    use crate::xhtml::BoundingBox;

    fn sample() -> TextualizedDocument {
        let mut t = TextualizedDocument::default();
        t.words = vec![
            WordPosition { id: "w-2".into(), from: 0, to: 0 },
            WordPosition { id: "w-1".into(), from: 0, to: 5 },
        ];
        t.sentences = vec![Sentence {
            id: "s-1-0".into(),
            section_name: Some("Intro".into()),
            box_name: "Body".into(),
            text: "Hello \"world\".\n\n".into(),
            words: vec!["w-1".into(), "w-2".into()],
        }];
        t.maths = vec![MathRegion {
            id: "MATH-w-3".into(),
            start_id: "w-3".into(),
            end_id: "w-4".into(),
            page: Some(2),
            bbox: BoundingBox::new(1.5, 2.0, 3.0, 4.25),
        }];
        t.cites = vec![CitationRecord {
            id: "CITE-r-1".into(),
            text: "Smith, 2001.".into(),
            citing_ids: vec!["w-7".into(), "w-9".into()],
        }];
        t
    }

    fn written(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_word_table() {
        let t = sample();
        let out = written(|b| write_words(b, "in/paper.xhtml", &t));
        assert_eq!(out, "ID\tFrom\tTo\tin/paper.xhtml\nw-2\t0\t0\nw-1\t0\t5\n");
    }

    #[test]
    fn test_sentence_table_quotes_when_needed() {
        let t = sample();
        let out = written(|b| write_sentences(b, &t));
        assert_eq!(
            out,
            "id\tsect_name\tbox_name\ttext\twords\ns-1-0\tIntro\tBody\t\"Hello \"\"world\"\".\"\tw-1,w-2\n"
        );
    }

    #[test]
    fn test_math_and_cite_tables() {
        let t = sample();
        let out = written(|b| write_maths(b, &t));
        assert_eq!(out, "MathID\tStartID\tEndId\tPage\tX1\tY1\tX2\tY2\nMATH-w-3\tw-3\tw-4\t2\t1.5\t2.0\t3.0\t4.25\n");
        let out = written(|b| write_cites(b, &t));
        assert_eq!(out, "CiteID\tText\tFrom\nCITE-r-1\tSmith, 2001.\tw-7,w-9\n");
    }

    #[test]
    fn test_math_table_keeps_page_precision() {
        let mut t = sample();
        t.maths[0].bbox = BoundingBox::parse("72.123456,100.5,300.987654,412.0001").unwrap();
        let out = written(|b| write_maths(b, &t));
        assert!(out.ends_with("\t2\t72.123456\t100.5\t300.987654\t412.0001\n"), "{}", out);
    }

    #[test]
    fn test_output_file_names() {
        let files = OutputFiles::new(Path::new("out"), Path::new("data/P01-1001.xhtml"));
        assert_eq!(files.words, Path::new("out/P01-1001.word.tsv"));
        assert_eq!(files.text, Path::new("out/P01-1001.txt"));
        assert_eq!(files.xhtml, Path::new("out/P01-1001.xhtml"));
    }
}
