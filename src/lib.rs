pub mod cli;
pub mod collection;
pub mod config;
pub mod filter;
pub mod listing;
pub mod record;
pub mod stats;

pub use cli::{Cli, ColorMode, Commands, OutputFormat, cli_parse};
pub use collection::{apply_filter, scan_dataset, split_tags};
pub use filter::{CompiledFilter, Compiler, FilterError, compile};
pub use record::{ApproxTokenCounter, ImageRecord, Marking, MarkingKind, TokenCounter};

use anyhow::{Context, anyhow};
use colored::Colorize;
use std::fmt::Write as _;
use std::path::Path;

/// Renders a compile error with a caret under the offending position.
fn render_filter_diagnostic(expression: &str, error: &FilterError) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  {expression}");
    let caret_column = expression
        .get(..error.position().min(expression.len()))
        .map(|head| head.chars().count())
        .unwrap_or(0);
    let _ = writeln!(out, "  {}{}", " ".repeat(caret_column), "^".red().bold());
    let _ = writeln!(out, "{}", error.to_string().red());
    out
}

/// Build the compiled filter from the global --filter expression. A broken
/// expression aborts the command before any dataset output is produced.
fn build_filter(
    filter_expr: &Option<String>,
    config: &config::CuratorConfig,
) -> anyhow::Result<Option<CompiledFilter>> {
    let Some(expression) = filter_expr else {
        return Ok(None);
    };
    match Compiler::new()
        .case_sensitive_tags(config.filter.case_sensitive_tags)
        .compile(expression)
    {
        Ok(filter) => Ok(Some(filter)),
        Err(error) => {
            eprintln!("Invalid filter expression:");
            eprint!("{}", render_filter_diagnostic(expression, &error));
            Err(anyhow!("invalid filter expression"))
        }
    }
}

fn write_output_file(path: &Path, content: &str) -> anyhow::Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write output file '{}'", path.display()))
}

pub fn run() -> anyhow::Result<()> {
    let cli = cli_parse();
    let config = config::load_config(cli.config.as_deref())
        .map_err(|e| anyhow!("Failed to load config: {e}"))?;
    let format = cli.effective_format();
    let output = &cli.output;
    let verbose = cli.verbose;
    let quiet = cli.quiet;

    // Set up color handling based on user preference
    match cli.color {
        ColorMode::Always => unsafe {
            std::env::set_var("CLICOLOR_FORCE", "1");
        },
        ColorMode::Never => unsafe {
            std::env::set_var("NO_COLOR", "1");
        },
        ColorMode::Auto => {}
    }

    if verbose > 0 && !quiet {
        eprintln!("Config profile: {}", config.profile_name);
        if let Some(ref expression) = cli.filter {
            eprintln!("Filter: {expression}");
        }
        if let Some(path) = output {
            eprintln!("Output will be written to: {}", path.display());
        }
    }

    match &cli.command {
        Commands::List { dir, captions } => {
            let filter = build_filter(&cli.filter, &config)?;
            let records = collection::scan_dataset(dir, &config, !quiet)?;
            let matched = collection::apply_filter(&records, filter.as_ref());
            let text = match format {
                OutputFormat::Text => listing::format_list_text(&matched, *captions),
                OutputFormat::Json => listing::format_list_json(
                    dir,
                    filter.as_ref().map(|f| f.source()),
                    &matched,
                ),
            };
            print!("{text}");
            if let Some(path) = output {
                write_output_file(path, &text)?;
            }
        }
        Commands::Stats { dir } => {
            let filter = build_filter(&cli.filter, &config)?;
            let records = collection::scan_dataset(dir, &config, !quiet)?;
            let matched = collection::apply_filter(&records, filter.as_ref());
            let text = match format {
                OutputFormat::Text => stats::format_stats_text(&matched),
                OutputFormat::Json => stats::format_stats_json(
                    dir,
                    filter.as_ref().map(|f| f.source()),
                    &matched,
                ),
            };
            print!("{text}");
            if let Some(path) = output {
                write_output_file(path, &text)?;
            }
        }
        Commands::Tags { dir, top } => {
            let filter = build_filter(&cli.filter, &config)?;
            let records = collection::scan_dataset(dir, &config, !quiet)?;
            let matched = collection::apply_filter(&records, filter.as_ref());
            let text = match format {
                OutputFormat::Text => stats::format_tags_text(&matched, *top),
                OutputFormat::Json => stats::format_tags_json(dir, &matched, *top),
            };
            print!("{text}");
            if let Some(path) = output {
                write_output_file(path, &text)?;
            }
        }
        Commands::Check { expression } => {
            let result = Compiler::new()
                .case_sensitive_tags(config.filter.case_sensitive_tags)
                .compile(expression);
            match result {
                Ok(filter) => {
                    println!("OK: {}", filter.source());
                    if verbose > 0 {
                        println!("{:#?}", filter.expression());
                    }
                }
                Err(error) => {
                    eprintln!("Invalid filter expression:");
                    eprint!("{}", render_filter_diagnostic(expression, &error));
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
