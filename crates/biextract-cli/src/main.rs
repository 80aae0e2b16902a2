mod commands;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "biextract",
    version,
    about = "Extract binary input tables from protection panel wiring diagrams"
)]
struct Cli {
    /// Log progress (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract up to three PDFs into one workbook, one sheet per PDF
    Extract {
        /// PDF files (or pdftotext -layout dumps)
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        /// Workbook to write
        #[arg(short = 'O', long = "out", value_name = "FILE", default_value = "binary_inputs.xlsx")]
        out: PathBuf,

        /// JSON config file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Summary format
        #[arg(short, long, value_enum, default_value = "table")]
        output: OutputFormat,
    },
    /// Show the records extracted from one PDF without writing a workbook
    Inspect {
        input_file: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value = "table")]
        output: OutputFormat,

        /// List skipped lines as well
        #[arg(long)]
        show_skipped: bool,
    },
    /// Inspect and validate configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective config, built-in layouts included
    Show {
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Validate a config file
    Validate { file: PathBuf },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let result = match cli.command {
        Commands::Extract {
            inputs,
            out,
            config,
            output,
        } => commands::extract::run(inputs, out, config, output),
        Commands::Inspect {
            input_file,
            config,
            output,
            show_skipped,
        } => commands::inspect::run(input_file, config, output, show_skipped),
        Commands::Config { action } => match action {
            ConfigAction::Show { config } => commands::config::show(config),
            ConfigAction::Validate { file } => commands::config::validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("{}: {e}", "Error".red().bold());
        std::process::exit(1);
    }
}
