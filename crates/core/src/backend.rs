//! Seams between the slide builder and concrete file formats.

use crate::error::Result;
use crate::types::{Deck, SourceDocument};
use std::path::Path;

/// Something that can load a word-processing document.
pub trait DocumentReader {
    /// Read the document at `path` fully into memory.
    ///
    /// Fails with a format error if the file is not a valid document and with
    /// an I/O error if it cannot be opened.
    fn read_document(&self, path: &Path) -> Result<SourceDocument>;
}

/// Something that can persist a deck.
pub trait DeckWriter {
    /// Serialize `deck` to `path`, replacing any existing file.
    fn write_deck(&self, deck: &Deck, path: &Path) -> Result<()>;
}
