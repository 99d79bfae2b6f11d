//! PPTX (Office Open XML) backend for DOCX to PPTX conversion.
//!
//! Writes decks as .pptx files, which are ZIP archives containing XML
//! documents, and reads them back for inspection.

pub mod parser;
pub mod template;
pub mod writer;

pub use parser::{InspectedSlide, PptxParser};
pub use writer::PptxWriter;
