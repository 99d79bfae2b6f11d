//! DOCX file parser implementation.

use docx2pptx_core::{
    DocumentReader, Error, HighlightColor, Result, SourceDocument, SourceParagraph, SourceRun,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// Main document part used when the package relationships do not name one.
const DEFAULT_DOCUMENT_PATH: &str = "word/document.xml";

/// Parser for DOCX (Office Open XML) files.
pub struct DocxParser;

impl DocxParser {
    /// Create a new DOCX parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a DOCX file from a reader.
    pub fn parse<R: Read + Seek>(&self, reader: R) -> Result<SourceDocument> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::format(format!("Not a valid DOCX package: {}", e)))?;

        let document_path = self.get_document_path(&mut archive)?;
        log::debug!("Main document part: {}", document_path);

        let content = self.read_file_from_archive(&mut archive, &document_path)?;
        let document = self.parse_document_xml(&content)?;

        log::debug!("Read {} paragraphs", document.paragraphs.len());
        Ok(document)
    }

    /// Parse a DOCX file from disk.
    pub fn parse_file(&self, path: &Path) -> Result<SourceDocument> {
        let file = File::open(path)?;
        self.parse(BufReader::new(file))
    }

    /// Find the main document part through the package relationships.
    fn get_document_path<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<String> {
        let rels_content = match self.read_file_from_archive(archive, "_rels/.rels") {
            Ok(content) => content,
            Err(_) => {
                log::warn!("Package has no _rels/.rels, assuming {}", DEFAULT_DOCUMENT_PATH);
                return Ok(DEFAULT_DOCUMENT_PATH.to_string());
            }
        };

        let mut reader = Reader::from_str(&rels_content);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let rel_type = attribute(e, b"Type").unwrap_or_default();
                    if rel_type.ends_with("/officeDocument") {
                        if let Some(target) = attribute(e, b"Target") {
                            return Ok(target.trim_start_matches('/').to_string());
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::format(format!(
                        "Error parsing package relationships: {}",
                        e
                    )));
                }
                _ => {}
            }
        }

        Ok(DEFAULT_DOCUMENT_PATH.to_string())
    }

    /// Extract body paragraphs and their runs from `document.xml`.
    ///
    /// Only paragraphs directly under `w:body` count; runs are the direct
    /// children of such a paragraph or of a hyperlink inside it. Text is kept
    /// verbatim, whitespace included.
    fn parse_document_xml(&self, xml_content: &str) -> Result<SourceDocument> {
        let mut document = SourceDocument::new();
        let mut reader = Reader::from_str(xml_content);

        // Local names of the currently open elements.
        let mut stack: Vec<Vec<u8>> = Vec::new();

        // Stack depth of the open body paragraph / run, including itself.
        let mut paragraph: Option<(SourceParagraph, usize)> = None;
        let mut run: Option<(SourceRun, usize)> = None;
        let mut in_text = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    let name = e.local_name().as_ref().to_vec();
                    let depth = stack.len();
                    let parent = stack.last().map(Vec::as_slice);

                    if paragraph.is_none() {
                        if name == b"p" && parent == Some(b"body".as_slice()) {
                            paragraph = Some((SourceParagraph::new(), depth + 1));
                        }
                    } else if let Some((current, r_depth)) = run.as_mut() {
                        if name == b"t" && depth == *r_depth {
                            in_text = true;
                        } else {
                            apply_run_child(current, e, &stack, *r_depth)?;
                        }
                    } else if let Some((_, p_depth)) = paragraph.as_ref() {
                        if name == b"r" && is_run_container(parent, depth, *p_depth) {
                            run = Some((SourceRun::default(), depth + 1));
                        } else if name == b"del" {
                            log::debug!("Skipping deleted revision inside paragraph");
                        }
                    }

                    stack.push(name);
                }
                Ok(Event::Empty(ref e)) => {
                    let name = e.local_name();
                    let depth = stack.len();
                    let parent = stack.last().map(Vec::as_slice);

                    if paragraph.is_none() {
                        if name.as_ref() == b"p" && parent == Some(b"body".as_slice()) {
                            document.add_paragraph(SourceParagraph::new());
                        }
                    } else if let Some((current, r_depth)) = run.as_mut() {
                        apply_run_child(current, e, &stack, *r_depth)?;
                    } else if let Some((current, p_depth)) = paragraph.as_mut() {
                        if name.as_ref() == b"r" && is_run_container(parent, depth, *p_depth) {
                            current.runs.push(SourceRun::default());
                        }
                    }
                }
                Ok(Event::Text(ref e)) if in_text => {
                    if let Some((current, _)) = run.as_mut() {
                        let text = e
                            .unescape()
                            .map_err(|err| Error::format(format!("Invalid run text: {}", err)))?;
                        current.text.push_str(&text);
                    }
                }
                Ok(Event::CData(ref e)) if in_text => {
                    if let Some((current, _)) = run.as_mut() {
                        current.text.push_str(&String::from_utf8_lossy(e));
                    }
                }
                Ok(Event::End(_)) => {
                    let depth = stack.len();
                    let name = stack.pop().unwrap_or_default();

                    match name.as_slice() {
                        b"t" => in_text = false,
                        b"r" if run.as_ref().is_some_and(|(_, d)| *d == depth) => {
                            if let (Some((finished, _)), Some((current, _))) =
                                (run.take(), &mut paragraph)
                            {
                                current.runs.push(finished);
                            }
                        }
                        b"p" if paragraph.as_ref().is_some_and(|(_, d)| *d == depth) => {
                            if let Some((finished, _)) = paragraph.take() {
                                document.add_paragraph(finished);
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::format(format!(
                        "Error parsing document at position {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
                _ => {}
            }
        }

        Ok(document)
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::format(format!("Part not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::format(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for DocxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentReader for DocxParser {
    fn read_document(&self, path: &Path) -> Result<SourceDocument> {
        self.parse_file(path)
    }
}

/// Whether an element at `depth` under `parent` is a direct run slot of the
/// body paragraph that sits at `paragraph_depth`.
fn is_run_container(parent: Option<&[u8]>, depth: usize, paragraph_depth: usize) -> bool {
    match parent {
        Some(b"p") => depth == paragraph_depth,
        Some(b"hyperlink") => depth == paragraph_depth + 1,
        _ => false,
    }
}

/// Apply an element found somewhere inside the current run.
///
/// Handles the run's own `w:rPr` children (not those of a tracked property
/// change) and the text-producing siblings of `w:t`.
fn apply_run_child(
    run: &mut SourceRun,
    e: &BytesStart,
    stack: &[Vec<u8>],
    run_depth: usize,
) -> Result<()> {
    let depth = stack.len();
    let parent = stack.last().map(Vec::as_slice);
    let name = e.local_name();

    if depth == run_depth {
        match name.as_ref() {
            b"tab" => run.text.push('\t'),
            b"br" | b"cr" => run.text.push('\n'),
            _ => {}
        }
        return Ok(());
    }

    if depth == run_depth + 1 && parent == Some(b"rPr") {
        apply_run_property(run, e)?;
    }

    Ok(())
}

/// Apply one `w:rPr` child element to a run.
fn apply_run_property(run: &mut SourceRun, e: &BytesStart) -> Result<()> {
    let val = attribute(e, b"val");

    match e.local_name().as_ref() {
        b"b" => run.bold = Some(parse_toggle(val.as_deref())),
        b"i" => run.italic = Some(parse_toggle(val.as_deref())),
        b"u" => run.underline = Some(val.as_deref() != Some("none")),
        b"rFonts" => {
            if let Some(font) = attribute(e, b"ascii") {
                run.font_name = Some(font);
            }
        }
        b"sz" => {
            if let Some(val) = val {
                let half_points: f64 = val
                    .trim()
                    .parse()
                    .map_err(|_| Error::format(format!("malformed font size '{}'", val)))?;
                run.size = Some(half_points / 2.0);
            }
        }
        b"color" => {
            run.color = val.filter(|v| !v.eq_ignore_ascii_case("auto"));
        }
        b"highlight" => {
            run.highlight = val.as_deref().and_then(HighlightColor::from_token);
        }
        _ => {}
    }

    Ok(())
}

/// Interpret an `ST_OnOff` toggle value; a missing value means on.
fn parse_toggle(val: Option<&str>) -> bool {
    !matches!(val, Some("0") | Some("false") | Some("off"))
}

/// Unescaped value of the attribute with the given local name.
fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

    fn document_xml(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        )
    }

    fn build_docx(body: &str) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();
        zip.start_file("_rels/.rels", options).unwrap();
        zip.write_all(PACKAGE_RELS.as_bytes()).unwrap();
        zip.start_file("word/document.xml", options).unwrap();
        zip.write_all(document_xml(body).as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    fn parse_body(body: &str) -> SourceDocument {
        DocxParser::new()
            .parse(Cursor::new(build_docx(body)))
            .unwrap()
    }

    fn texts(document: &SourceDocument) -> Vec<String> {
        document.paragraphs.iter().map(|p| p.text()).collect()
    }

    #[test]
    fn test_paragraphs_and_runs() {
        let doc = parse_body(
            r#"<w:p><w:r><w:t>Hello</w:t></w:r><w:r><w:t xml:space="preserve"> world</w:t></w:r></w:p>
<w:p/>
<w:p><w:pPr><w:rPr><w:b/></w:rPr></w:pPr></w:p>
<w:p><w:r><w:t>Again</w:t></w:r></w:p>"#,
        );

        assert_eq!(texts(&doc), vec!["Hello world", "", "", "Again"]);
        assert_eq!(doc.paragraphs[0].runs.len(), 2);
        assert_eq!(doc.paragraphs[0].runs[1].text, " world");
        // Paragraph mark properties are not run properties
        assert!(doc.paragraphs[2].runs.is_empty());
    }

    #[test]
    fn test_run_properties() {
        let doc = parse_body(
            r#"<w:p><w:r><w:rPr>
<w:rFonts w:ascii="Georgia" w:hAnsi="Georgia"/>
<w:b/><w:i w:val="0"/><w:u w:val="single"/>
<w:color w:val="1A2B3C"/><w:sz w:val="21"/><w:highlight w:val="yellow"/>
</w:rPr><w:t>styled</w:t></w:r></w:p>"#,
        );

        let run = &doc.paragraphs[0].runs[0];
        assert_eq!(run.text, "styled");
        assert_eq!(run.bold, Some(true));
        assert_eq!(run.italic, Some(false));
        assert_eq!(run.underline, Some(true));
        assert_eq!(run.font_name.as_deref(), Some("Georgia"));
        assert_eq!(run.size, Some(10.5));
        assert_eq!(run.color.as_deref(), Some("1A2B3C"));
        assert_eq!(run.highlight, Some(HighlightColor::Yellow));
    }

    #[test]
    fn test_inherited_properties() {
        let doc = parse_body(
            r#"<w:p><w:r><w:rPr><w:color w:val="auto"/><w:u w:val="none"/><w:highlight w:val="none"/></w:rPr><w:t>plain</w:t></w:r></w:p>"#,
        );

        let run = &doc.paragraphs[0].runs[0];
        assert_eq!(run.bold, None);
        assert_eq!(run.italic, None);
        assert_eq!(run.underline, Some(false));
        assert_eq!(run.color, None);
        assert_eq!(run.highlight, None);
        assert_eq!(run.size, None);
    }

    #[test]
    fn test_unknown_highlight_is_kept() {
        let doc = parse_body(
            r#"<w:p><w:r><w:rPr><w:highlight w:val="chartreuse"/></w:rPr><w:t>x</w:t></w:r></w:p>"#,
        );
        assert_eq!(
            doc.paragraphs[0].runs[0].highlight,
            Some(HighlightColor::Unsupported("chartreuse".into()))
        );
    }

    #[test]
    fn test_property_change_ignored() {
        let doc = parse_body(
            r#"<w:p><w:r><w:rPr><w:b w:val="false"/><w:rPrChange w:id="1"><w:rPr><w:b/></w:rPr></w:rPrChange></w:rPr><w:t>x</w:t></w:r></w:p>"#,
        );
        assert_eq!(doc.paragraphs[0].runs[0].bold, Some(false));
    }

    #[test]
    fn test_tabs_breaks_and_hyperlinks() {
        let doc = parse_body(
            r#"<w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>c</w:t></w:r><w:hyperlink r:id="rId5" xmlns:r="urn:r"><w:r><w:t>link</w:t></w:r></w:hyperlink><w:del w:id="2"><w:r><w:delText>gone</w:delText></w:r></w:del></w:p>"#,
        );
        assert_eq!(texts(&doc), vec!["a\tb\nclink"]);
        assert_eq!(doc.paragraphs[0].runs.len(), 2);
    }

    #[test]
    fn test_table_paragraphs_skipped() {
        let doc = parse_body(
            r#"<w:p><w:r><w:t>before</w:t></w:r></w:p><w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl><w:p><w:r><w:t>after</w:t></w:r></w:p>"#,
        );
        assert_eq!(texts(&doc), vec!["before", "after"]);
    }

    #[test]
    fn test_escaped_text() {
        let doc = parse_body(r#"<w:p><w:r><w:t>a &amp; b &lt;c&gt;</w:t></w:r></w:p>"#);
        assert_eq!(texts(&doc), vec!["a & b <c>"]);
    }

    #[test]
    fn test_malformed_size_is_format_error() {
        let bytes = build_docx(r#"<w:p><w:r><w:rPr><w:sz w:val="big"/></w:rPr></w:r></w:p>"#);
        let err = DocxParser::new().parse(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, Error::FormatError(_)));
    }

    #[test]
    fn test_not_a_zip_is_format_error() {
        let err = DocxParser::new()
            .parse(Cursor::new(b"plain text, not a document".to_vec()))
            .unwrap_err();
        assert!(matches!(err, Error::FormatError(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = DocxParser::new()
            .read_document(Path::new("/nonexistent/input.docx"))
            .unwrap_err();
        assert!(matches!(err, Error::IoError(_)));
    }

    #[test]
    fn test_parse_toggle() {
        assert!(parse_toggle(None));
        assert!(parse_toggle(Some("1")));
        assert!(parse_toggle(Some("true")));
        assert!(!parse_toggle(Some("0")));
        assert!(!parse_toggle(Some("off")));
    }
}
