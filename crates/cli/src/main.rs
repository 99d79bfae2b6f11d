//! CLI tool for turning DOCX paragraphs into PPTX slides.

use anyhow::{Context, Result};
use clap::Parser;
use docx2pptx_core::{ConvertOptions, DocumentReader, SlideBuilder, SlidePolicy};
use docx2pptx_docx::DocxParser;
use docx2pptx_pptx::{PptxParser, PptxWriter};
use std::path::{Path, PathBuf};

/// Convert every paragraph of a Word document into its own slide, keeping
/// bold, italic, underline, font, size, color and highlight.
#[derive(Parser, Debug)]
#[command(name = "docx2pptx")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input Word document (.docx)
    #[arg(required_unless_present = "inspect")]
    input: Option<PathBuf>,

    /// Output directory (default: same as input file)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Give every paragraph its own slide, empty ones included
    #[arg(long)]
    one_slide_per_paragraph: bool,

    /// Print the converted deck as JSON instead of writing a file
    #[arg(long)]
    json: bool,

    /// Print the slide texts of an existing deck and exit
    #[arg(long, value_name = "PPTX", conflicts_with = "input")]
    inspect: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn convert_options(&self) -> ConvertOptions {
        let policy = if self.one_slide_per_paragraph {
            SlidePolicy::OneToOne
        } else {
            SlidePolicy::AbsorbEmpty
        };
        ConvertOptions { policy }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    if let Some(deck_path) = &args.inspect {
        return inspect_deck(deck_path);
    }

    let input_path = args
        .input
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("No input document given"))?;

    if let Some(output_path) = run(input_path, &args)? {
        println!("{}", output_path.display());
    }

    Ok(())
}

/// Convert one document. Returns the path written, or `None` when the deck
/// was printed as JSON instead.
fn run(input_path: &Path, args: &Args) -> Result<Option<PathBuf>> {
    let builder = process_file(input_path, args.convert_options())?;

    if args.json {
        let json = serde_json::to_string_pretty(builder.deck())
            .context("Failed to serialize deck")?;
        println!("{}", json);
        return Ok(None);
    }

    let output_path = get_output_path(input_path, args.output_dir.as_ref())?;
    builder
        .save(&PptxWriter::new(), &output_path)
        .with_context(|| format!("Failed to save {}", output_path.display()))?;

    Ok(Some(output_path))
}

/// Read a document and build its slides.
fn process_file(input_path: &Path, options: ConvertOptions) -> Result<SlideBuilder> {
    log::debug!("Reading {}", input_path.display());
    let document = DocxParser::new()
        .read_document(input_path)
        .with_context(|| format!("Failed to read {}", input_path.display()))?;

    let mut builder = SlideBuilder::with_options(options);
    builder
        .convert(&document)
        .with_context(|| format!("Failed to convert {}", input_path.display()))?;

    log::info!(
        "{}: {} paragraphs, {} slides",
        input_path.display(),
        document.paragraphs.len(),
        builder.deck().slides.len()
    );

    Ok(builder)
}

/// Print what each slide of an existing deck shows.
fn inspect_deck(deck_path: &Path) -> Result<()> {
    let slides = PptxParser::new()
        .parse_file(deck_path)
        .with_context(|| format!("Failed to read {}", deck_path.display()))?;

    for slide in &slides {
        println!("--- slide {} ---", slide.number);
        println!("{}", slide.text());
        if !slide.highlights.is_empty() {
            let names: Vec<String> = slide
                .highlights
                .iter()
                .zip(slide.highlight_palette())
                .map(|(hex, entry)| match entry {
                    Some(color) => format!("{:?}", color),
                    None => format!("#{}", hex),
                })
                .collect();
            println!("(highlights: {})", names.join(", "));
        }
    }

    Ok(())
}

/// Determine the output path for a converted document.
fn get_output_path(input_path: &Path, output_dir: Option<&PathBuf>) -> Result<PathBuf> {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    let output_filename = format!("{}.pptx", stem);

    let output_path = match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.join(output_filename)
        }
        None => {
            if let Some(parent) = input_path.parent() {
                parent.join(output_filename)
            } else {
                PathBuf::from(output_filename)
            }
        }
    };

    Ok(output_path)
}
