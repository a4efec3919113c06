use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// A tool to curate image/caption datasets with a filter expression language
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Filter expression, e.g. "tag:cat AND (tag:orange OR stars:>=3)"
    #[arg(short, long, global = true)]
    pub filter: Option<String>,

    /// Path to a TOML config profile
    #[arg(long, global = true, env = "DATASET_CURATOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    /// Path to write the output to, in addition to stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Color behavior for text output
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Increase diagnostic output (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress bars and diagnostics
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the images matching the filter
    List {
        /// Dataset directory
        dir: PathBuf,

        /// Print each image's caption under its path
        #[arg(long)]
        captions: bool,
    },
    /// Summarize the dataset: counts, ratings, dimensions, markings
    Stats {
        /// Dataset directory
        dir: PathBuf,
    },
    /// Show tag frequencies across the dataset
    Tags {
        /// Dataset directory
        dir: PathBuf,

        /// How many tags to show; 0 shows all of them
        #[arg(long, default_value_t = 30)]
        top: usize,
    },
    /// Validate a filter expression and report diagnostics
    Check {
        /// The filter expression to validate
        expression: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}

impl Cli {
    pub fn effective_format(&self) -> OutputFormat {
        self.format.unwrap_or(OutputFormat::Text)
    }
}
