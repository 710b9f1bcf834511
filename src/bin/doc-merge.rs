//! Document Merge CLI tool
//!
//! A command-line tool for merging images, PDFs and Office documents into one PDF.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use glob::glob;
use tracing_subscriber::EnvFilter;

use doc_merge::layout::PageDimensions;
use doc_merge::pdf::arrange::{parse_page_order, parse_page_rotation};
use doc_merge::pdf::{
    arrange_pages, count_pages, extract_metadata, DocumentMerger, MergeOptions, PageArrangement,
};
use doc_merge::render::CommandRasterizer;

/// Document Merge - Combine images, PDFs and Office documents into one PDF
#[derive(Parser)]
#[command(name = "doc-merge")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Merge a cover image, a PDF and a Word document
    doc-merge merge -o packet.pdf cover.png report.pdf notes.docx

    # Merge numbered files in order on letter paper
    doc-merge merge -o packet.pdf --page-size letter \"[0-9]*.*\"

    # Put page 3 first, drop page 2 and rotate page 1
    doc-merge arrange packet.pdf -o fixed.pdf --order 3,1 --rotate 1:90")]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace). RUST_LOG overrides this
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

fn parse_page_size(name: &str) -> Result<PageDimensions, String> {
    PageDimensions::from_name(name)
        .ok_or_else(|| format!("Unknown page size '{}'. Use a4 or letter", name))
}

#[derive(Subcommand)]
enum Commands {
    /// Merge files into one PDF, in the order given
    Merge {
        /// Input files (in order). Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        /// Size of generated pages (images, rendered documents, placeholders): a4 or letter
        #[arg(long, value_parser = parse_page_size, default_value = "a4")]
        page_size: PageDimensions,

        /// Headless HTML renderer used for Word and Excel files
        #[arg(long, env = "DOC_MERGE_RENDERER", default_value = "wkhtmltoimage")]
        renderer: String,

        /// Open the output file after creation
        #[arg(long)]
        open: bool,
    },

    /// Reorder, drop or rotate the pages of a PDF
    Arrange {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        /// Pages to keep, in output order (e.g. "3,1,2" or "4-6,1"). Default: all
        #[arg(long)]
        order: Option<String>,

        /// Rotate a page clockwise, as PAGE:DEGREES (e.g. "2:90"). Repeatable
        #[arg(long)]
        rotate: Vec<String>,

        /// Open the output file after creation
        #[arg(long)]
        open: bool,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Merge {
            inputs,
            output,
            page_size,
            renderer,
            open,
        } => cmd_merge(inputs, output, page_size, renderer, open),
        Commands::Arrange {
            input,
            output,
            order,
            rotate,
            open,
        } => cmd_arrange(input, output, order, rotate, open),
        Commands::Info { input } => cmd_info(input),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Log to stderr; placeholder warnings show by default
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Expand glob patterns in input paths
///
/// Matches of one pattern are sorted; the patterns themselves keep the order given.
fn expand_globs(patterns: Vec<String>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        // Check if pattern contains glob characters
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matched = Vec::new();
            for entry in glob(&pattern).with_context(|| format!("Invalid pattern: {}", pattern))? {
                match entry {
                    Ok(path) => matched.push(path),
                    Err(e) => eprintln!("Warning: glob error for {}: {}", pattern, e),
                }
            }
            if matched.is_empty() {
                bail!("No files matched pattern: {}", pattern);
            }
            matched.sort();
            paths.extend(matched);
        } else {
            // No glob characters, treat as literal path
            paths.push(PathBuf::from(pattern));
        }
    }

    Ok(paths)
}

/// Open a file with the system default application
fn open_file(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(path).spawn()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(path).spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", &path.display().to_string()])
            .spawn()?;
    }
    Ok(())
}

/// Merge files into one PDF
fn cmd_merge(
    inputs: Vec<String>,
    output: PathBuf,
    page_size: PageDimensions,
    renderer: String,
    open: bool,
) -> Result<()> {
    // Expand glob patterns
    let inputs = expand_globs(inputs)?;

    eprintln!("Merging {} files...", inputs.len());

    let options = MergeOptions {
        page: page_size,
        ..MergeOptions::default()
    };
    let merger = DocumentMerger::new(options).with_rasterizer(CommandRasterizer::new(renderer));

    let total = inputs.len();
    let mut index = 0;
    let result = merger.merge_paths(&inputs, &output, |name| {
        index += 1;
        eprintln!("  [{}/{}] {}", index, total, name);
    })?;

    let placeholders = result.placeholders().count();
    if placeholders > 0 {
        eprintln!("{} of {} files replaced by placeholder pages", placeholders, total);
    }

    eprintln!(
        "Merged {} pages to: {}",
        result.page_count(),
        output.display()
    );

    if open {
        open_file(&output)?;
    }

    Ok(())
}

/// Reorder, drop and rotate pages
fn cmd_arrange(
    input: PathBuf,
    output: PathBuf,
    order: Option<String>,
    rotate: Vec<String>,
    open: bool,
) -> Result<()> {
    let page_count = count_pages(&input)?;

    let order = order.as_deref().map(parse_page_order).transpose()?;
    let rotations = rotate
        .iter()
        .map(|spec| parse_page_rotation(spec))
        .collect::<doc_merge::Result<Vec<_>>>()?;
    let arrangement = PageArrangement::plan(page_count, order.as_deref(), &rotations)?;

    let bytes = std::fs::read(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let arranged = arrange_pages(&bytes, &arrangement)?;
    std::fs::write(&output, arranged)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    eprintln!(
        "Arranged {} of {} pages to: {}",
        arrangement.len(),
        page_count,
        output.display()
    );

    if open {
        open_file(&output)?;
    }

    Ok(())
}

/// Show information about a PDF
fn cmd_info(input: PathBuf) -> Result<()> {
    let metadata = extract_metadata(&input)?;

    println!("File: {}", input.display());
    println!("Pages: {}", metadata.page_count);

    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(author) = metadata.author {
        println!("Author: {}", author);
    }
    if let Some(producer) = metadata.producer {
        println!("Producer: {}", producer);
    }

    Ok(())
}
