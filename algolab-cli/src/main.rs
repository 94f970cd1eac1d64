//! Algolab CLI — thin driver mapping subcommands onto the execution,
//! evaluation, and content engines. Results are printed as JSON on stdout;
//! logs go to stderr.

use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use algolab_core::config::PlatformConfig;
use algolab_core::content::{ContentStore, FileContentStore};
use algolab_eval::{EvaluationRequest, TaskKind, chart_descriptor_for, evaluate};
use algolab_sandbox::{ExecutionRequest, SandboxLimits, SnippetExecutor};

/// Algolab: interactive ML algorithm learning platform
#[derive(Parser, Debug)]
#[command(name = "algolab", version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute a lesson snippet and print the result payload
    Run {
        /// Snippet file, or `-` for stdin
        file: PathBuf,

        /// Wall-clock limit in seconds
        #[arg(short, long)]
        time_limit: Option<u64>,
    },
    /// Compute metrics for ground truth vs predictions
    Evaluate {
        /// Comma-separated ground-truth values
        #[arg(long)]
        truth: String,

        /// Comma-separated predicted values
        #[arg(long)]
        pred: String,

        /// Task kind: regression or classification
        #[arg(long, default_value = "regression")]
        task: String,
    },
    /// Build a chart descriptor from a JSON payload
    Chart {
        /// Chart kind: scatter, line, or heatmap
        kind: String,

        /// JSON payload file, or `-` for stdin (defaults to an empty payload)
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
    /// Inspect the content library
    Content {
        #[command(subcommand)]
        command: ContentCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ContentCommands {
    /// List available algorithms
    List,
    /// Show one algorithm document, or a single section of it
    Show {
        id: String,

        #[arg(long)]
        section: Option<String>,
    },
    /// Group algorithms by category
    Categories,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = PlatformConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { file, time_limit } => {
            let source = read_input(&file)?;
            let limits = SandboxLimits::new()
                .with_fuel_limit(config.execution.max_fuel)
                .with_output_limit(config.execution.max_output_bytes)
                .with_array_limit(config.execution.max_array_len)
                .with_time_limit(Duration::from_secs(config.execution.time_limit_secs));
            let executor = SnippetExecutor::new(limits);

            let mut request = ExecutionRequest::new(source);
            if let Some(secs) = time_limit {
                request = request.with_time_limit_secs(secs);
            }
            let result = executor.execute(&request).await;
            print_json(&result)?;
            if !result.succeeded {
                std::process::exit(1);
            }
        }
        Commands::Evaluate { truth, pred, task } => {
            let request = EvaluationRequest {
                ground_truth: parse_series(&truth).context("parsing --truth")?,
                predictions: parse_series(&pred).context("parsing --pred")?,
                task_kind: task.parse::<TaskKind>()?,
            };
            let report = evaluate(&request)?;
            print_json(&report)?;
        }
        Commands::Chart { kind, data } => {
            let payload = match data {
                Some(path) => serde_json::from_str(&read_input(&path)?)
                    .context("parsing chart payload")?,
                None => serde_json::Value::Object(serde_json::Map::new()),
            };
            let descriptor = chart_descriptor_for(&kind, &payload)?;
            print_json(&descriptor)?;
        }
        Commands::Content { command } => {
            let store = FileContentStore::new(&config.content.dir);
            match command {
                ContentCommands::List => print_json(&store.list()?)?,
                ContentCommands::Show { id, section } => match section {
                    Some(name) => print_json(&store.section(&id, &name)?)?,
                    None => print_json(&store.get(&id)?)?,
                },
                ContentCommands::Categories => print_json(&store.categories()?)?,
            }
        }
    }

    Ok(())
}

/// Read a file, or stdin when the path is `-`.
fn read_input(path: &PathBuf) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("reading stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    }
}

/// Parse a comma-separated list of numbers.
fn parse_series(text: &str) -> anyhow::Result<Vec<f64>> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .with_context(|| format!("invalid number {s:?}"))
        })
        .collect()
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
