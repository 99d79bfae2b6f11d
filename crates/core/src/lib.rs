//! Core domain types, color mapping, and slide building for turning
//! word-processing documents into slide decks.

pub mod backend;
pub mod builder;
pub mod color;
pub mod error;
pub mod extension;
pub mod types;

pub use backend::{DeckWriter, DocumentReader};
pub use builder::{convert_document, ConvertOptions, SlideBuilder, SlidePolicy};
pub use color::{HighlightColor, RgbColor};
pub use error::{Error, Result};
pub use extension::highlight_markup;
pub use types::{
    Deck, OutputParagraph, OutputRun, ShapeBounds, Slide, SourceDocument, SourceParagraph,
    SourceRun, TextFrame, EMU_PER_INCH,
};
