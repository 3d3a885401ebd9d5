// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Falzwerk — local document toolkit.
//
// Entry point. Initialises logging, loads settings, and runs one tool session
// per invocation.

mod services;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use falzwerk_core::error::FalzwerkError;
use falzwerk_core::human_errors::humanize_error;
use falzwerk_core::{AppConfig, PageRangeParser, StagedFile, ToolKind, ToolRegistry, format_file_size};
use falzwerk_document::TransformationEngine;
use falzwerk_session::SessionController;

use services::data_dir;
use services::options::OptionArgs;

#[derive(Parser)]
#[command(
    name = "falzwerk",
    about = "Merge, split, compress, rotate, watermark, and convert documents locally",
    version,
    author
)]
struct Cli {
    /// Settings file (defaults to the data directory's config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available tools
    Tools,

    /// Run a tool over one or more files and save the result
    Run {
        /// Tool identifier, e.g. merge, split, pdf-to-jpg
        tool: String,

        /// Input files, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        options: OptionArgs,

        /// Directory for the result (overrides the settings file)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Show which zero-based pages a range expression selects
    Pages {
        /// Range expression, e.g. "1-3,5,7-9"
        expression: String,

        /// Number of pages in the document
        #[arg(short, long)]
        total: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Tools => {
            list_tools();
            Ok(())
        }
        Commands::Pages { expression, total } => {
            let selection = PageRangeParser::parse(&expression, total).map_err(explain)?;
            println!("{selection:?}");
            Ok(())
        }
        Commands::Run {
            tool,
            files,
            options,
            output_dir,
        } => {
            let config_path = cli.config.unwrap_or_else(data_dir::config_path);
            let config = AppConfig::load(&config_path)
                .with_context(|| format!("reading settings from {}", config_path.display()))?;
            tracing::debug!(path = %config_path.display(), "Settings loaded");

            let output_dir = output_dir.unwrap_or_else(|| config.output_dir());
            run_tool(&config, &tool, &files, &options, output_dir).await
        }
    }
}

fn list_tools() {
    for descriptor in ToolRegistry::all() {
        println!(
            "{:<12} {:<14} {:<16} {}",
            descriptor.kind.id(),
            descriptor.title,
            descriptor.accept_filter(),
            if descriptor.allows_multiple_files {
                "multiple files"
            } else {
                "one file"
            }
        );
    }
}

async fn run_tool(
    config: &AppConfig,
    tool: &str,
    files: &[PathBuf],
    args: &OptionArgs,
    output_dir: PathBuf,
) -> Result<()> {
    let tool: ToolKind = tool.parse().map_err(explain)?;
    let mut session = SessionController::new(TransformationEngine::new(config), config);
    session.open_tool(tool);

    let staged = files
        .iter()
        .map(StagedFile::from_path)
        .collect::<Result<Vec<_>, _>>()
        .map_err(explain)?;
    session.stage(staged).map_err(explain)?;
    for file in session.state().staged_files() {
        println!("  {} ({})", file.name(), format_file_size(file.size() as u64));
    }

    let base = session
        .state()
        .options()
        .cloned()
        .unwrap_or_else(|| falzwerk_core::ToolOptions::defaults_for(tool));
    let (options, ignored) = args.apply(base);
    for flag in ignored {
        tracing::warn!(flag, tool = %tool, "Option does not apply to this tool; ignored");
    }
    session.set_options(options).map_err(explain)?;

    session.submit().await.map_err(explain)?;

    if let Some(report) = session.result_artifact().and_then(|artifact| artifact.report) {
        println!(
            "Compressed {} to {} ({:.1}% smaller)",
            format_file_size(report.original_size as u64),
            format_file_size(report.compressed_size as u64),
            report.reduction_percent
        );
    }

    let path = session.download(&output_dir).map_err(explain)?;
    println!("Saved {}", path.display());
    Ok(())
}

/// Attach the plain-English explanation to a library error.
fn explain(err: FalzwerkError) -> anyhow::Error {
    let human = humanize_error(&err);
    anyhow::Error::new(err).context(human.to_string())
}
