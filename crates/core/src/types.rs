//! Domain types for source documents and output decks.

use crate::color::{HighlightColor, RgbColor};
use serde::{Deserialize, Serialize};

/// English Metric Units per inch.
pub const EMU_PER_INCH: i64 = 914_400;

/// A word-processing document reduced to its body paragraphs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Body paragraphs in document order.
    pub paragraphs: Vec<SourceParagraph>,
}

impl SourceDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a paragraph to the end of the document.
    pub fn add_paragraph(&mut self, paragraph: SourceParagraph) {
        self.paragraphs.push(paragraph);
    }
}

/// A paragraph of the source document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceParagraph {
    /// Styled runs in reading order.
    pub runs: Vec<SourceRun>,
}

impl SourceParagraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a paragraph of unstyled runs, one per text fragment.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            runs: texts.into_iter().map(SourceRun::new).collect(),
        }
    }

    /// Concatenated text of all runs.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// A run of text sharing one set of formatting attributes.
///
/// Tri-state flags use `None` for "inherited from the style hierarchy".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceRun {
    pub text: String,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub font_name: Option<String>,
    /// Font size in points.
    pub size: Option<f64>,
    /// Explicit font color as six hex digits. `None` means inherited.
    pub color: Option<String>,
    pub highlight: Option<HighlightColor>,
}

impl SourceRun {
    /// Create an unstyled run.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Position and size of a shape, in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeBounds {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl ShapeBounds {
    /// Bounds of the text box placed on every slide: half an inch from the
    /// top-left corner, 9in wide and 2.5in tall.
    pub const fn text_box() -> Self {
        Self {
            x: EMU_PER_INCH / 2,
            y: EMU_PER_INCH / 2,
            width: EMU_PER_INCH * 9,
            height: EMU_PER_INCH * 5 / 2,
        }
    }
}

/// The slide deck being built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    /// Slides in presentation order.
    pub slides: Vec<Slide>,

    /// Slide width in EMU.
    pub slide_width: i64,

    /// Slide height in EMU.
    pub slide_height: i64,
}

impl Default for Deck {
    /// An empty 10" x 7.5" (4:3) deck.
    fn default() -> Self {
        Self {
            slides: Vec::new(),
            slide_width: EMU_PER_INCH * 10,
            slide_height: EMU_PER_INCH * 15 / 2,
        }
    }
}

impl Deck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a blank slide and return it.
    pub fn add_slide(&mut self) -> &mut Slide {
        self.slides.push(Slide::new(self.slides.len() + 1));
        let last = self.slides.len() - 1;
        &mut self.slides[last]
    }

    /// Visible text of every slide, in order.
    pub fn slide_texts(&self) -> Vec<String> {
        self.slides.iter().map(|s| s.text()).collect()
    }
}

/// A slide holding a single text box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slide {
    /// 1-based slide number.
    pub number: usize,

    /// Where the text box sits on the slide.
    pub bounds: ShapeBounds,

    /// The text box contents.
    pub frame: TextFrame,
}

impl Slide {
    pub fn new(number: usize) -> Self {
        Self {
            number,
            bounds: ShapeBounds::text_box(),
            frame: TextFrame::default(),
        }
    }

    /// Visible text of the slide.
    pub fn text(&self) -> String {
        self.frame.paragraph.text()
    }
}

/// Text frame of a text box. Holds exactly one paragraph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextFrame {
    pub word_wrap: bool,
    pub paragraph: OutputParagraph,
}

impl Default for TextFrame {
    fn default() -> Self {
        Self {
            word_wrap: true,
            paragraph: OutputParagraph::default(),
        }
    }
}

/// A paragraph inside a slide text frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputParagraph {
    pub runs: Vec<OutputRun>,
}

impl OutputParagraph {
    /// Append an empty run and return it for styling.
    pub fn add_run(&mut self) -> &mut OutputRun {
        self.runs.push(OutputRun::default());
        let last = self.runs.len() - 1;
        &mut self.runs[last]
    }

    /// Concatenated text of all runs.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// A styled run in the slide styling model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputRun {
    pub text: String,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub font_name: Option<String>,
    /// Font size in hundredths of a point.
    pub size: Option<u32>,
    /// Explicit font color. `None` leaves the color inherited.
    pub color: Option<RgbColor>,
    /// Raw run-property markup with no first-class attribute.
    /// See [`crate::extension`].
    pub extensions: Vec<String>,
}
