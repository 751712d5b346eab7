mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::catalogue::{MetricsArgs, ParametersArgs};
use commands::evaluate::EvaluateArgs;

/// Tiered diagnostics for financial ratios
#[derive(Parser)]
#[command(
    name = "rdx",
    version,
    about = "Tiered diagnostics for financial ratios",
    long_about = "A CLI that computes a financial ratio with decimal precision, runs its \
                  stress scenario, classifies the result into a risk or quality tier and \
                  explains it through its drivers. Covers EVA, ROCE, ROI/RI, current, quick \
                  and cash ratios, interest coverage, inventory turnover and PE safety margin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// JSON or YAML file overriding bundled parameter constants
    #[arg(long, global = true)]
    parameters: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one metric
    Evaluate(EvaluateArgs),
    /// List supported metrics, or describe one
    Metrics(MetricsArgs),
    /// Show the effective parameter table
    Parameters(ParametersArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let engine = match commands::build_engine(cli.parameters.as_deref()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Evaluate(args) => commands::evaluate::run_evaluate(&engine, args),
        Commands::Metrics(args) => commands::catalogue::run_metrics(&engine, args),
        Commands::Parameters(args) => commands::catalogue::run_parameters(&engine, args),
        Commands::Version => {
            println!("rdx {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
