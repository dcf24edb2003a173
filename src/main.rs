//! smaps-filter CLI
//!
//! Cleans, analyzes and diffs smaps captures.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use smaps_filter::commands::{execute, validate_args, FilterArgs, Mode};
use smaps_filter::diff::DiffLevel;

/// smaps-filter - offline analysis of smaps captures
#[derive(Parser, Debug)]
#[command(name = "smaps-filter")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true, conflicts_with_all = ["quiet", "silent"])]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "silent")]
    quiet: bool,

    /// Disable logging
    #[arg(short, long, global = true)]
    silent: bool,
}

/// Inputs and output shared by every mode
#[derive(Args, Debug)]
struct Files {
    /// Capture files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output path (default: input with the mode's extension)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Re-render captures with threads folded into their process
    Flatten {
        #[command(flatten)]
        files: Files,
    },

    /// Write one CSV row per region
    Normalize {
        #[command(flatten)]
        files: Files,
    },

    /// Account memory per application, library and class (JSON)
    Analyze {
        #[command(flatten)]
        files: Files,

        /// Print the system table to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Write the per-application value table
    Appvals {
        #[command(flatten)]
        files: Files,
    },

    /// Compare captures; .html and .json outputs pick the format, CSV otherwise
    Diff {
        #[command(flatten)]
        files: Files,

        /// Diff level: sys|app|pid|sec|obj or 0-4 (default: from the output path)
        #[arg(short, long, value_parser = parse_level)]
        level: Option<DiffLevel>,

        /// Trim level: repeated leading key cells up to this level are blanked
        #[arg(short, long, value_parser = parse_level, default_value = "0")]
        trim: DiffLevel,
    },
}

/// Level names and integers never fail; unknown text means the default
fn parse_level(text: &str) -> Result<DiffLevel, String> {
    Ok(DiffLevel::parse(text))
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.silent {
        "off"
    } else if cli.quiet {
        "warn"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let args = match cli.command {
        Commands::Flatten { files } => filter_args(Mode::Flatten, files),
        Commands::Normalize { files } => filter_args(Mode::Normalize, files),
        Commands::Analyze { files, summary } => FilterArgs {
            print_summary: summary,
            ..filter_args(Mode::Analyze, files)
        },
        Commands::Appvals { files } => filter_args(Mode::Appvals, files),
        Commands::Diff { files, level, trim } => FilterArgs {
            level,
            trim,
            ..filter_args(Mode::Diff, files)
        },
    };

    // Validate args first
    validate_args(&args)?;

    execute(&args)
}

fn filter_args(mode: Mode, files: Files) -> FilterArgs {
    FilterArgs {
        mode,
        inputs: files.inputs,
        output: files.output,
        ..Default::default()
    }
}
