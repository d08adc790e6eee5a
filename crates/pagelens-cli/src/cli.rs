//! CLI command definitions and argument parsing.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// pagelens - Index PDFs (text and images) into a vector store and query them.
#[derive(Debug, Parser)]
#[command(name = "pagelens")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract, enrich and index a directory of PDFs
    Ingest(IngestArgs),

    /// Search the store and optionally answer a question
    Query(QueryArgs),

    /// Show the entry count and a few stored entries
    Inspect(InspectArgs),
}

/// Arguments for the ingest command.
#[derive(Debug, Parser)]
pub struct IngestArgs {
    /// Directory containing PDFs
    #[arg(long)]
    pub pdfs: PathBuf,

    /// Store directory; page images are written under <store>/images
    #[arg(long)]
    pub store: PathBuf,

    /// Only process the first N pages of each PDF
    #[arg(long = "max_pages", alias = "max-pages")]
    pub max_pages: Option<usize>,

    /// Collection name
    #[arg(long)]
    pub collection: Option<String>,

    /// Page raster resolution
    #[arg(long, default_value_t = pagelens_extractor::DEFAULT_DPI)]
    pub dpi: u32,

    /// Only extract embedded images from the last page
    #[arg(long)]
    pub last_page_images: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Use the local hashing embedder and skip vision (no API key needed)
    #[arg(long)]
    pub offline: bool,
}

/// Arguments for the query command.
#[derive(Debug, Parser)]
pub struct QueryArgs {
    /// Store directory
    #[arg(long)]
    pub store: PathBuf,

    /// Query text
    #[arg(short, long)]
    pub query: String,

    /// Number of results
    #[arg(long = "top_k", alias = "top-k", default_value_t = 10)]
    pub top_k: usize,

    /// Also synthesize an answer from the results
    #[arg(long)]
    pub answer: bool,

    /// Collection name
    #[arg(long)]
    pub collection: Option<String>,

    /// Use the local hashing embedder (no API key needed; no answers)
    #[arg(long)]
    pub offline: bool,
}

/// Arguments for the inspect command.
#[derive(Debug, Parser)]
pub struct InspectArgs {
    /// Store directory
    #[arg(long)]
    pub store: PathBuf,

    /// Number of entries to show
    #[arg(short, long, default_value_t = 3)]
    pub limit: usize,

    /// Collection name
    #[arg(long)]
    pub collection: Option<String>,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}
