//! PPTX file parser, used to read decks back for inspection.

use docx2pptx_core::{Error, HighlightColor, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// What a slide of an existing deck shows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InspectedSlide {
    /// 1-based slide number.
    pub number: usize,

    /// Text of every paragraph on the slide, in document order.
    pub paragraphs: Vec<String>,

    /// Highlight colors (six hex digits) of highlighted runs, in order.
    pub highlights: Vec<String>,
}

impl InspectedSlide {
    /// All paragraph texts joined by newlines.
    pub fn text(&self) -> String {
        self.paragraphs.join("\n")
    }

    /// Map each highlight back to its Word palette entry. Colors outside the
    /// palette come back as `None`.
    pub fn highlight_palette(&self) -> Vec<Option<HighlightColor>> {
        self.highlights
            .iter()
            .map(|hex| HighlightColor::from_hex(hex))
            .collect()
    }
}

/// Parser for PPTX (Office Open XML) files.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a PPTX file from a reader.
    pub fn parse<R: Read + Seek>(&self, reader: R) -> Result<Vec<InspectedSlide>> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::format(format!("Failed to open ZIP: {}", e)))?;

        let slide_order = self.get_slide_order(&mut archive)?;

        let mut slides = Vec::with_capacity(slide_order.len());
        for (idx, slide_path) in slide_order.iter().enumerate() {
            let content = self.read_file_from_archive(&mut archive, slide_path)?;
            let mut slide = self.extract_slide_from_xml(&content)?;
            slide.number = idx + 1;
            slides.push(slide);
        }

        Ok(slides)
    }

    /// Parse a PPTX file from disk.
    pub fn parse_file(&self, path: &Path) -> Result<Vec<InspectedSlide>> {
        let file = File::open(path)?;
        self.parse(BufReader::new(file))
    }

    /// Get the ordered list of slide paths from the presentation relationships.
    fn get_slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_content = self.read_file_from_archive(archive, "ppt/_rels/presentation.xml.rels")?;
        let mut slides: Vec<(String, Option<usize>)> = Vec::new();

        let mut reader = Reader::from_str(&rels_content);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let rel_type = attribute(e, b"Type").unwrap_or_default();
                    let target = attribute(e, b"Target").unwrap_or_default();

                    // Slide layouts and masters share the "/slide" prefix
                    if rel_type.ends_with("/slide") {
                        let order_num = extract_slide_number(&target);
                        let full_path = match target.strip_prefix('/') {
                            Some(absolute) => absolute.to_string(),
                            None => format!("ppt/{}", target),
                        };
                        slides.push((full_path, order_num));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::format(format!(
                        "Error parsing relationships: {}",
                        e
                    )));
                }
                _ => {}
            }
        }

        // Sort slides by their number
        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Collect paragraph texts and highlight colors from slide XML.
    fn extract_slide_from_xml(&self, xml_content: &str) -> Result<InspectedSlide> {
        let mut slide = InspectedSlide::default();
        let mut reader = Reader::from_str(xml_content);

        let mut in_paragraph = false;
        let mut in_text = false;
        let mut in_highlight = false;
        let mut current_text = String::new();
        let mut open_elements = 0usize;

        loop {
            let event = reader.read_event();
            match &event {
                Ok(Event::Start(_)) => open_elements += 1,
                Ok(Event::End(_)) => open_elements = open_elements.saturating_sub(1),
                _ => {}
            }

            match event {
                Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                    b"p" => {
                        in_paragraph = true;
                        current_text.clear();
                    }
                    b"t" if in_paragraph => in_text = true,
                    b"highlight" => in_highlight = true,
                    b"srgbClr" if in_highlight => push_highlight(&mut slide, e),
                    _ => {}
                },
                Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                    b"p" => slide.paragraphs.push(String::new()),
                    b"srgbClr" if in_highlight => push_highlight(&mut slide, e),
                    _ => {}
                },
                Ok(Event::Text(ref e)) if in_text => {
                    let text = e
                        .unescape()
                        .map_err(|err| Error::format(format!("Invalid slide text: {}", err)))?;
                    current_text.push_str(&text);
                }
                Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                    b"p" if in_paragraph => {
                        slide.paragraphs.push(std::mem::take(&mut current_text));
                        in_paragraph = false;
                    }
                    b"t" => in_text = false,
                    b"highlight" => in_highlight = false,
                    _ => {}
                },
                Ok(Event::Eof) if open_elements > 0 => {
                    return Err(Error::format(format!(
                        "Slide XML ends with {} unclosed elements",
                        open_elements
                    )));
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::format(format!(
                        "Error parsing slide at position {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
                _ => {}
            }
        }

        Ok(slide)
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::format(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::format(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

fn push_highlight(slide: &mut InspectedSlide, e: &BytesStart) {
    if let Some(val) = attribute(e, b"val") {
        slide.highlights.push(val);
    }
}

fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a target like "slides/slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
