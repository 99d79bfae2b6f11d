//! Slide building.
//!
//! Turns source paragraphs into slides, one text box per slide, copying the
//! run-level formatting of every source run onto an equivalent slide run.

use crate::backend::DeckWriter;
use crate::color::RgbColor;
use crate::error::{Error, Result};
use crate::extension::highlight_markup;
use crate::types::{Deck, OutputParagraph, OutputRun, SourceDocument, SourceParagraph, SourceRun};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Smallest font size a slide run can carry, in hundredths of a point.
const MIN_FONT_SIZE: u32 = 100;

/// Largest font size a slide run can carry, in hundredths of a point.
const MAX_FONT_SIZE: u32 = 400_000;

/// How source paragraphs are distributed over slides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlidePolicy {
    /// Open a new slide only when the current slide already shows text.
    ///
    /// Empty paragraphs never get a slide of their own: they land on the
    /// current slide while it is still blank, so any number of consecutive
    /// empty paragraphs collapse onto one slide.
    #[default]
    AbsorbEmpty,

    /// Every paragraph, empty or not, gets its own slide.
    OneToOne,
}

/// Options for a conversion.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub policy: SlidePolicy,
}

/// Builds a [`Deck`] from source paragraphs.
///
/// The builder owns the deck it builds; the last slide is always the current
/// one, and its single paragraph is where copied runs are appended.
#[derive(Debug, Default)]
pub struct SlideBuilder {
    deck: Deck,
    options: ConvertOptions,
}

impl SlideBuilder {
    /// Create a builder with default options and an empty deck.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with the given options.
    pub fn with_options(options: ConvertOptions) -> Self {
        Self {
            deck: Deck::new(),
            options,
        }
    }

    /// The deck built so far.
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Consume the builder and return the deck.
    pub fn into_deck(self) -> Deck {
        self.deck
    }

    /// Append a blank slide and make it current.
    pub fn start_new_slide(&mut self) {
        let slide = self.deck.add_slide();
        log::debug!("Started slide {}", slide.number);
    }

    /// Visible text of the current slide; empty if there is no slide yet.
    pub fn current_text(&self) -> String {
        self.deck.slides.last().map(|s| s.text()).unwrap_or_default()
    }

    /// Copy every run of `paragraph` onto the current slide.
    ///
    /// Either all runs are copied or, on error, none are.
    pub fn copy_paragraph(&mut self, paragraph: &SourceParagraph) -> Result<()> {
        let runs = paragraph
            .runs
            .iter()
            .map(convert_run)
            .collect::<Result<Vec<_>>>()?;

        self.current_paragraph().runs.extend(runs);
        Ok(())
    }

    /// Run the paragraph-to-slide policy over a whole document.
    ///
    /// A first slide is always created, even for a document with no text.
    pub fn convert(&mut self, document: &SourceDocument) -> Result<()> {
        self.start_new_slide();

        for (index, paragraph) in document.paragraphs.iter().enumerate() {
            if self.needs_new_slide(index) {
                self.start_new_slide();
            }
            self.copy_paragraph(paragraph)?;
        }

        log::debug!(
            "Converted {} paragraphs into {} slides",
            document.paragraphs.len(),
            self.deck.slides.len()
        );
        Ok(())
    }

    /// Write the deck through `writer`.
    pub fn save<W: DeckWriter + ?Sized>(&self, writer: &W, path: &Path) -> Result<()> {
        writer.write_deck(&self.deck, path)
    }

    fn needs_new_slide(&self, index: usize) -> bool {
        match self.options.policy {
            SlidePolicy::AbsorbEmpty => !self.current_text().is_empty(),
            SlidePolicy::OneToOne => index > 0,
        }
    }

    fn current_paragraph(&mut self) -> &mut OutputParagraph {
        if self.deck.slides.is_empty() {
            self.start_new_slide();
        }
        let last = self.deck.slides.len() - 1;
        &mut self.deck.slides[last].frame.paragraph
    }
}

/// Convert a whole document into a deck in one call.
pub fn convert_document(document: &SourceDocument, options: ConvertOptions) -> Result<Deck> {
    let mut builder = SlideBuilder::with_options(options);
    builder.convert(document)?;
    Ok(builder.into_deck())
}

/// Map one source run onto the slide styling model.
fn convert_run(source: &SourceRun) -> Result<OutputRun> {
    let mut run = OutputRun {
        text: source.text.clone(),
        bold: source.bold,
        italic: source.italic,
        underline: source.underline,
        font_name: source.font_name.clone(),
        size: source.size.map(font_size_to_centipoints).transpose()?,
        color: None,
        extensions: Vec::new(),
    };

    if let Some(hex) = source.color.as_deref() {
        run.color = Some(RgbColor::from_hex(hex)?);
    }

    if let Some(highlight) = &source.highlight {
        run.attach_raw_extension(highlight_markup(highlight.to_hex()?));
    }

    Ok(run)
}

/// Convert a size in points to hundredths of a point.
fn font_size_to_centipoints(points: f64) -> Result<u32> {
    let centipoints = (points * 100.0).round();
    if !centipoints.is_finite()
        || centipoints < f64::from(MIN_FONT_SIZE)
        || centipoints > f64::from(MAX_FONT_SIZE)
    {
        return Err(Error::unsupported("font size", format!("{}pt", points)));
    }
    Ok(centipoints as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::HighlightColor;

    fn document(texts: &[&str]) -> SourceDocument {
        SourceDocument {
            paragraphs: texts
                .iter()
                .map(|t| {
                    if t.is_empty() {
                        SourceParagraph::new()
                    } else {
                        SourceParagraph::from_texts([*t])
                    }
                })
                .collect(),
        }
    }

    fn convert_texts(texts: &[&str], policy: SlidePolicy) -> Vec<String> {
        convert_document(&document(texts), ConvertOptions { policy })
            .unwrap()
            .slide_texts()
    }

    #[test]
    fn test_one_slide_per_non_empty_paragraph() {
        let texts = convert_texts(&["One", "Two", "Three"], SlidePolicy::AbsorbEmpty);
        assert_eq!(texts, vec!["One", "Two", "Three"]);
    }

    #[test]
    fn test_runs_kept_in_order() {
        let doc = SourceDocument {
            paragraphs: vec![SourceParagraph::from_texts(["a", "b", "c"])],
        };
        let deck = convert_document(&doc, ConvertOptions::default()).unwrap();
        let runs: Vec<_> = deck.slides[0]
            .frame
            .paragraph
            .runs
            .iter()
            .map(|r| r.text.as_str())
            .collect();
        assert_eq!(runs, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_leading_empty_paragraph_absorbed() {
        let texts = convert_texts(&["", "Hello"], SlidePolicy::AbsorbEmpty);
        assert_eq!(texts, vec!["Hello"]);
    }

    #[test]
    fn test_interleaved_empty_paragraph() {
        let texts = convert_texts(&["Hello", "", "World"], SlidePolicy::AbsorbEmpty);
        assert_eq!(texts, vec!["Hello", "World"]);
    }

    #[test]
    fn test_consecutive_empty_paragraphs_collapse() {
        let texts = convert_texts(&["Hello", "", "", "", "World", ""], SlidePolicy::AbsorbEmpty);
        assert_eq!(texts, vec!["Hello", "World", ""]);
    }

    #[test]
    fn test_empty_document_has_one_blank_slide() {
        let texts = convert_texts(&[], SlidePolicy::AbsorbEmpty);
        assert_eq!(texts, vec![""]);
    }

    #[test]
    fn test_one_to_one_policy() {
        let texts = convert_texts(&["Hello", "", "World"], SlidePolicy::OneToOne);
        assert_eq!(texts, vec!["Hello", "", "World"]);
    }

    #[test]
    fn test_whitespace_counts_as_text() {
        let texts = convert_texts(&[" ", "Next"], SlidePolicy::AbsorbEmpty);
        assert_eq!(texts, vec![" ", "Next"]);
    }

    #[test]
    fn test_formatting_copied() {
        let source = SourceRun {
            text: "styled".into(),
            bold: Some(true),
            italic: Some(false),
            underline: None,
            font_name: Some("Georgia".into()),
            size: Some(10.5),
            color: Some("1A2B3C".into()),
            highlight: None,
        };

        let run = convert_run(&source).unwrap();
        assert_eq!(run.text, "styled");
        assert_eq!(run.bold, Some(true));
        assert_eq!(run.italic, Some(false));
        assert_eq!(run.underline, None);
        assert_eq!(run.font_name.as_deref(), Some("Georgia"));
        assert_eq!(run.size, Some(1050));
        assert_eq!(run.color, Some(RgbColor::new(0x1A, 0x2B, 0x3C)));
        assert!(run.extensions.is_empty());
    }

    #[test]
    fn test_inherited_color_left_unset() {
        let run = convert_run(&SourceRun::new("plain")).unwrap();
        assert_eq!(run.color, None);
    }

    #[test]
    fn test_highlight_attached() {
        let source = SourceRun {
            highlight: Some(HighlightColor::Yellow),
            ..SourceRun::new("marked")
        };
        let run = convert_run(&source).unwrap();
        assert_eq!(run.highlight_hex(), Some("FFFF00"));
    }

    #[test]
    fn test_unsupported_highlight_fails() {
        let doc = SourceDocument {
            paragraphs: vec![SourceParagraph {
                runs: vec![SourceRun {
                    highlight: Some(HighlightColor::Unsupported("sparkly".into())),
                    ..SourceRun::new("x")
                }],
            }],
        };
        let err = convert_document(&doc, ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedAttribute { attribute: "highlight", .. }));
    }

    #[test]
    fn test_malformed_color_fails() {
        let source = SourceRun {
            color: Some("12345".into()),
            ..SourceRun::new("x")
        };
        assert!(matches!(convert_run(&source), Err(Error::FormatError(_))));
    }

    #[test]
    fn test_failed_copy_appends_nothing() {
        let mut builder = SlideBuilder::new();
        builder.start_new_slide();
        let paragraph = SourceParagraph {
            runs: vec![
                SourceRun::new("good"),
                SourceRun {
                    color: Some("nope".into()),
                    ..SourceRun::new("bad")
                },
            ],
        };
        assert!(builder.copy_paragraph(&paragraph).is_err());
        assert_eq!(builder.current_text(), "");
    }

    #[test]
    fn test_font_size_bounds() {
        assert_eq!(font_size_to_centipoints(12.0).unwrap(), 1200);
        assert_eq!(font_size_to_centipoints(1.0).unwrap(), 100);
        assert!(font_size_to_centipoints(0.5).is_err());
        assert!(font_size_to_centipoints(4001.0).is_err());
        assert!(font_size_to_centipoints(f64::NAN).is_err());
    }

    #[test]
    fn test_copy_without_slide_starts_one() {
        let mut builder = SlideBuilder::new();
        builder
            .copy_paragraph(&SourceParagraph::from_texts(["orphan"]))
            .unwrap();
        assert_eq!(builder.deck().slides.len(), 1);
        assert_eq!(builder.current_text(), "orphan");
    }
}
