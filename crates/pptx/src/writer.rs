//! PPTX package writer.

use crate::template::{self, PML_NAMESPACES, SP_TREE_HEADER, XML_DECLARATION};
use docx2pptx_core::{DeckWriter, Deck, Error, OutputParagraph, OutputRun, Result, Slide};
use quick_xml::escape::escape;
use std::fmt::Write as FmtWrite;
use std::io::{self, Cursor, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// First slide ID; PresentationML reserves everything below 256.
const FIRST_SLIDE_ID: usize = 256;

/// Relationship IDs in `presentation.xml.rels` taken before the slides.
const RESERVED_PRESENTATION_RELS: usize = 2;

/// Writer for PPTX (Office Open XML) files.
pub struct PptxWriter;

impl PptxWriter {
    /// Create a new PPTX writer.
    pub fn new() -> Self {
        Self
    }

    /// Serialize a deck into an in-memory .pptx package.
    pub fn to_bytes(&self, deck: &Deck) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut add_part = |name: &str, content: &str| -> Result<()> {
            zip.start_file(name, options).map_err(zip_error)?;
            zip.write_all(content.as_bytes())?;
            Ok(())
        };

        add_part("[Content_Types].xml", &self.content_types_xml(deck))?;
        add_part("_rels/.rels", &package_rels_xml())?;
        add_part("docProps/core.xml", &template::core_properties_xml())?;
        add_part("docProps/app.xml", &template::app_properties_xml(deck.slides.len()))?;
        add_part("ppt/presentation.xml", &self.presentation_xml(deck)?)?;
        add_part("ppt/_rels/presentation.xml.rels", &self.presentation_rels_xml(deck))?;
        add_part("ppt/slideMasters/slideMaster1.xml", &template::slide_master_xml())?;
        add_part(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            &relationships_xml(&[
                ("rId1", template::REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml"),
                ("rId2", template::REL_THEME, "../theme/theme1.xml"),
            ]),
        )?;
        add_part("ppt/slideLayouts/slideLayout1.xml", &template::slide_layout_xml())?;
        add_part(
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            &relationships_xml(&[(
                "rId1",
                template::REL_SLIDE_MASTER,
                "../slideMasters/slideMaster1.xml",
            )]),
        )?;
        add_part("ppt/theme/theme1.xml", &template::theme_xml())?;

        let slide_rels = relationships_xml(&[(
            "rId1",
            template::REL_SLIDE_LAYOUT,
            "../slideLayouts/slideLayout1.xml",
        )]);
        for slide in &deck.slides {
            log::debug!("Writing slide {}", slide.number);
            add_part(
                &format!("ppt/slides/slide{}.xml", slide.number),
                &self.slide_xml(slide)?,
            )?;
            add_part(
                &format!("ppt/slides/_rels/slide{}.xml.rels", slide.number),
                &slide_rels,
            )?;
        }

        let cursor = zip.finish().map_err(zip_error)?;
        Ok(cursor.into_inner())
    }

    /// Serialize a deck and write it to `path` in one call.
    ///
    /// Nothing touches the destination until the whole package has been
    /// built in memory.
    pub fn save(&self, deck: &Deck, path: &Path) -> Result<()> {
        let bytes = self.to_bytes(deck)?;
        std::fs::write(path, bytes)?;
        log::debug!("Saved {} slides to {}", deck.slides.len(), path.display());
        Ok(())
    }

    /// Generate `[Content_Types].xml`.
    fn content_types_xml(&self, deck: &Deck) -> String {
        let mut xml = String::with_capacity(2048);
        xml.push_str(XML_DECLARATION);
        xml.push_str(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        );
        xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
        xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);

        let mut push_override = |part: &str, content_type: &str| {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                part, content_type
            ));
        };
        push_override("/ppt/presentation.xml", template::CT_PRESENTATION);
        push_override("/ppt/slideMasters/slideMaster1.xml", template::CT_SLIDE_MASTER);
        push_override("/ppt/slideLayouts/slideLayout1.xml", template::CT_SLIDE_LAYOUT);
        push_override("/ppt/theme/theme1.xml", template::CT_THEME);
        push_override("/docProps/core.xml", template::CT_CORE_PROPERTIES);
        push_override("/docProps/app.xml", template::CT_EXTENDED_PROPERTIES);
        for slide in &deck.slides {
            push_override(
                &format!("/ppt/slides/slide{}.xml", slide.number),
                template::CT_SLIDE,
            );
        }

        xml.push_str("</Types>");
        xml
    }

    /// Generate `ppt/presentation.xml`.
    fn presentation_xml(&self, deck: &Deck) -> Result<String> {
        let mut xml = String::with_capacity(1024);
        xml.push_str(XML_DECLARATION);
        write!(xml, "<p:presentation {}>", PML_NAMESPACES).map_err(fmt_error)?;
        xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);

        if !deck.slides.is_empty() {
            xml.push_str("<p:sldIdLst>");
            for (index, _) in deck.slides.iter().enumerate() {
                write!(
                    xml,
                    r#"<p:sldId id="{}" r:id="{}"/>"#,
                    FIRST_SLIDE_ID + index,
                    slide_rel_id(index)
                )
                .map_err(fmt_error)?;
            }
            xml.push_str("</p:sldIdLst>");
        }

        write!(
            xml,
            r#"<p:sldSz cx="{}" cy="{}"/>"#,
            deck.slide_width, deck.slide_height
        )
        .map_err(fmt_error)?;
        xml.push_str(r#"<p:notesSz cx="6858000" cy="9144000"/>"#);
        xml.push_str("</p:presentation>");

        Ok(xml)
    }

    /// Generate `ppt/_rels/presentation.xml.rels`.
    fn presentation_rels_xml(&self, deck: &Deck) -> String {
        let targets: Vec<(String, String)> = deck
            .slides
            .iter()
            .enumerate()
            .map(|(index, slide)| {
                (
                    slide_rel_id(index),
                    format!("slides/slide{}.xml", slide.number),
                )
            })
            .collect();

        let mut rels = vec![
            ("rId1", template::REL_SLIDE_MASTER, "slideMasters/slideMaster1.xml"),
            ("rId2", template::REL_THEME, "theme/theme1.xml"),
        ];
        rels.extend(
            targets
                .iter()
                .map(|(id, target)| (id.as_str(), template::REL_SLIDE, target.as_str())),
        );

        relationships_xml(&rels)
    }

    /// Generate the XML of one slide: a single word-wrapped text box.
    fn slide_xml(&self, slide: &Slide) -> Result<String> {
        let bounds = slide.bounds;
        let mut xml = String::with_capacity(1024);

        xml.push_str(XML_DECLARATION);
        write!(xml, "<p:sld {}><p:cSld><p:spTree>", PML_NAMESPACES).map_err(fmt_error)?;
        xml.push_str(SP_TREE_HEADER);

        xml.push_str("<p:sp><p:nvSpPr>");
        xml.push_str(r#"<p:cNvPr id="2" name="TextBox 1"/><p:cNvSpPr txBox="1"/><p:nvPr/>"#);
        xml.push_str("</p:nvSpPr><p:spPr>");
        write!(
            xml,
            r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
            bounds.x, bounds.y, bounds.width, bounds.height
        )
        .map_err(fmt_error)?;
        xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/>"#);
        xml.push_str("</p:spPr><p:txBody>");
        write!(
            xml,
            r#"<a:bodyPr wrap="{}" rtlCol="0"><a:spAutoFit/></a:bodyPr><a:lstStyle/>"#,
            if slide.frame.word_wrap { "square" } else { "none" }
        )
        .map_err(fmt_error)?;
        write_paragraph(&mut xml, &slide.frame.paragraph)?;
        xml.push_str("</p:txBody></p:sp>");

        xml.push_str("</p:spTree></p:cSld>");
        xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>");

        Ok(xml)
    }
}

impl Default for PptxWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl DeckWriter for PptxWriter {
    fn write_deck(&self, deck: &Deck, path: &Path) -> Result<()> {
        self.save(deck, path)
    }
}

/// Write an `a:p` element with its runs.
fn write_paragraph(xml: &mut String, paragraph: &OutputParagraph) -> Result<()> {
    if paragraph.runs.is_empty() {
        xml.push_str("<a:p/>");
        return Ok(());
    }

    xml.push_str("<a:p>");
    for run in &paragraph.runs {
        write_run(xml, run)?;
    }
    xml.push_str("</a:p>");
    Ok(())
}

/// Write an `a:r` element.
///
/// `a:rPr` children follow the schema order: fill, then raw extension
/// fragments (highlight sits between fill and typefaces), then the latin
/// typeface.
fn write_run(xml: &mut String, run: &OutputRun) -> Result<()> {
    xml.push_str("<a:r><a:rPr");
    if let Some(size) = run.size {
        write!(xml, r#" sz="{}""#, size).map_err(fmt_error)?;
    }
    if let Some(bold) = run.bold {
        write!(xml, r#" b="{}""#, u8::from(bold)).map_err(fmt_error)?;
    }
    if let Some(italic) = run.italic {
        write!(xml, r#" i="{}""#, u8::from(italic)).map_err(fmt_error)?;
    }
    if let Some(underline) = run.underline {
        write!(xml, r#" u="{}""#, if underline { "sng" } else { "none" }).map_err(fmt_error)?;
    }

    let has_children = run.color.is_some() || !run.extensions.is_empty() || run.font_name.is_some();
    if has_children {
        xml.push('>');
        if let Some(color) = run.color {
            write!(
                xml,
                r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#,
                color
            )
            .map_err(fmt_error)?;
        }
        for fragment in &run.extensions {
            xml.push_str(fragment);
        }
        if let Some(font) = &run.font_name {
            write!(xml, r#"<a:latin typeface="{}"/>"#, escape(font.as_str())).map_err(fmt_error)?;
        }
        xml.push_str("</a:rPr>");
    } else {
        xml.push_str("/>");
    }

    write!(xml, "<a:t>{}</a:t></a:r>", escape(run.text.as_str())).map_err(fmt_error)?;
    Ok(())
}

/// Generate a relationships part from `(id, type, target)` triples.
fn relationships_xml(rels: &[(&str, &str, &str)]) -> String {
    let mut xml = String::with_capacity(256 + rels.len() * 160);
    xml.push_str(XML_DECLARATION);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (id, rel_type, target) in rels {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            id, rel_type, target
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

/// Generate `_rels/.rels`.
fn package_rels_xml() -> String {
    relationships_xml(&[
        ("rId1", template::REL_OFFICE_DOCUMENT, "ppt/presentation.xml"),
        ("rId2", template::REL_CORE_PROPERTIES, "docProps/core.xml"),
        ("rId3", template::REL_EXTENDED_PROPERTIES, "docProps/app.xml"),
    ])
}

/// Relationship ID of the slide at `index` in `presentation.xml.rels`.
fn slide_rel_id(index: usize) -> String {
    format!("rId{}", RESERVED_PRESENTATION_RELS + index + 1)
}

fn zip_error(e: zip::result::ZipError) -> Error {
    match e {
        zip::result::ZipError::Io(err) => Error::IoError(err),
        other => Error::IoError(io::Error::new(io::ErrorKind::Other, other)),
    }
}

fn fmt_error(e: std::fmt::Error) -> Error {
    Error::IoError(io::Error::new(io::ErrorKind::Other, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx2pptx_core::{
        convert_document, ConvertOptions, HighlightColor, RgbColor, SourceDocument,
        SourceParagraph, SourceRun,
    };
    use std::io::Read;
    use zip::ZipArchive;

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    fn styled_deck() -> Deck {
        let doc = SourceDocument {
            paragraphs: vec![
                SourceParagraph {
                    runs: vec![
                        SourceRun {
                            bold: Some(true),
                            size: Some(24.0),
                            color: Some("1A2B3C".into()),
                            highlight: Some(HighlightColor::Yellow),
                            font_name: Some("Georgia".into()),
                            ..SourceRun::new("Fish & Chips")
                        },
                        SourceRun {
                            italic: Some(false),
                            underline: Some(true),
                            ..SourceRun::new(" <plain>")
                        },
                    ],
                },
                SourceParagraph::from_texts(["Second"]),
            ],
        };
        convert_document(&doc, ConvertOptions::default()).unwrap()
    }

    #[test]
    fn test_package_parts() {
        let deck = styled_deck();
        let bytes = PptxWriter::new().to_bytes(&deck).unwrap();
        let archive = ZipArchive::new(Cursor::new(&bytes[..])).unwrap();

        let names: Vec<&str> = archive.file_names().collect();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "ppt/presentation.xml",
            "ppt/_rels/presentation.xml.rels",
            "ppt/slideMasters/slideMaster1.xml",
            "ppt/slideLayouts/slideLayout1.xml",
            "ppt/theme/theme1.xml",
            "ppt/slides/slide1.xml",
            "ppt/slides/slide2.xml",
            "ppt/slides/_rels/slide2.xml.rels",
        ] {
            assert!(names.contains(&part), "missing part {}", part);
        }

        let content_types = read_part(&bytes, "[Content_Types].xml");
        assert!(content_types.contains(r#"PartName="/ppt/slides/slide2.xml""#));
    }

    #[test]
    fn test_presentation_lists_slides() {
        let bytes = PptxWriter::new().to_bytes(&styled_deck()).unwrap();

        let presentation = read_part(&bytes, "ppt/presentation.xml");
        assert!(presentation.contains(r#"<p:sldId id="256" r:id="rId3"/>"#));
        assert!(presentation.contains(r#"<p:sldId id="257" r:id="rId4"/>"#));
        assert!(presentation.contains(r#"<p:sldSz cx="9144000" cy="6858000"/>"#));

        let rels = read_part(&bytes, "ppt/_rels/presentation.xml.rels");
        assert!(rels.contains(r#"Id="rId4""#));
        assert!(rels.contains(r#"Target="slides/slide2.xml""#));
    }

    #[test]
    fn test_run_properties_markup() {
        let bytes = PptxWriter::new().to_bytes(&styled_deck()).unwrap();
        let slide = read_part(&bytes, "ppt/slides/slide1.xml");

        assert!(slide.contains(concat!(
            r#"<a:rPr sz="2400" b="1"><a:solidFill><a:srgbClr val="1A2B3C"/></a:solidFill>"#,
            r#"<a:highlight><a:srgbClr val="FFFF00"/></a:highlight>"#,
            r#"<a:latin typeface="Georgia"/></a:rPr><a:t>Fish &amp; Chips</a:t>"#,
        )));
        assert!(slide.contains(r#"<a:rPr i="0" u="sng"/><a:t> &lt;plain&gt;</a:t>"#));
        assert!(slide.contains(r#"<a:bodyPr wrap="square""#));
        assert!(slide.contains(r#"<a:off x="457200" y="457200"/><a:ext cx="8229600" cy="2286000"/>"#));
    }

    #[test]
    fn test_inherited_color_writes_no_fill() {
        let mut deck = Deck::new();
        deck.add_slide().frame.paragraph.add_run().text = "plain".into();

        let bytes = PptxWriter::new().to_bytes(&deck).unwrap();
        let slide = read_part(&bytes, "ppt/slides/slide1.xml");
        assert!(!slide.contains("solidFill"));
        assert!(slide.contains("<a:rPr/><a:t>plain</a:t>"));
    }

    #[test]
    fn test_blank_slide_paragraph() {
        let mut deck = Deck::new();
        deck.add_slide();
        let bytes = PptxWriter::new().to_bytes(&deck).unwrap();
        assert!(read_part(&bytes, "ppt/slides/slide1.xml").contains("<a:p/>"));
    }

    #[test]
    fn test_run_color_written_upper_case() {
        let mut deck = Deck::new();
        let run = deck.add_slide().frame.paragraph.add_run();
        run.text = "x".into();
        run.color = Some(RgbColor::new(0xab, 0xcd, 0xef));

        let bytes = PptxWriter::new().to_bytes(&deck).unwrap();
        assert!(read_part(&bytes, "ppt/slides/slide1.xml").contains(r#"val="ABCDEF""#));
    }

    #[test]
    fn test_save_to_unwritable_path_is_io_error() {
        let err = PptxWriter::new()
            .save(&styled_deck(), Path::new("/nonexistent/dir/out.pptx"))
            .unwrap_err();
        assert!(matches!(err, Error::IoError(_)));
    }
}
