//! DOCX (WordprocessingML) reader backend.
//!
//! Reads .docx files, which are ZIP archives containing XML documents, into
//! paragraphs of styled runs.

pub mod parser;

pub use parser::DocxParser;
