//
// cli.rs
// Dcm2Png-rs
//
// Defines the CLI surface with Clap, runs the batch conversion, and reports the outcome.
//
// Thales Matheus Mendonça Santos - November 2025

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use crate::batch::{self, BatchOptions};
use crate::models::ConversionSummary;
use crate::source::DicomSource;

/// Command-line interface glue code: the flags of a single conversion run.
#[derive(Parser, Debug)]
#[command(name = "dcm2png")]
#[command(about = "Convert DICOM files to PNG", long_about = None)]
pub struct Cli {
    /// Input directory containing DICOM files
    #[arg(short = 'i', long = "input_dir")]
    pub input_dir: PathBuf,
    /// Output directory to save PNG files
    #[arg(short = 'o', long = "output_dir")]
    pub output_dir: PathBuf,
    /// Print verbose information
    #[arg(short, long)]
    pub verbose: bool,
    /// Apply contrast enhancement (modality LUT then VOI LUT)
    #[arg(short, long)]
    pub contrast: bool,
    /// Skip files that fail to convert instead of aborting
    #[arg(short, long)]
    pub skip_errors: bool,
    /// Frame to export from multi-frame files
    #[arg(long, default_value_t = 0)]
    pub frame: u32,
    /// Fail on constant-valued images instead of writing them black
    #[arg(long)]
    pub strict_degenerate: bool,
    /// Wait for Enter before exiting
    #[arg(long)]
    pub pause: bool,
}

impl From<&Cli> for BatchOptions {
    fn from(cli: &Cli) -> Self {
        BatchOptions {
            input_dir: cli.input_dir.clone(),
            output_dir: cli.output_dir.clone(),
            verbose: cli.verbose,
            contrast: cli.contrast,
            skip_errors: cli.skip_errors,
            frame: cli.frame,
            strict_degenerate: cli.strict_degenerate,
        }
    }
}

pub fn execute(cli: &Cli) -> anyhow::Result<ConversionSummary> {
    let options = BatchOptions::from(cli);
    let summary = batch::convert_directory(&DicomSource, &options)?;
    Ok(summary)
}

pub fn run() -> ExitCode {
    // Parse the raw CLI arguments once; every outcome is reported on stdout.
    let cli = Cli::parse();

    let code = match execute(&cli) {
        Ok(summary) => {
            println!("{}", batch::summary_line(&summary));
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("Error: {}", e);
            ExitCode::FAILURE
        }
    };

    if cli.pause {
        pause();
    }
    code
}

fn pause() {
    print!("Press Enter to exit...");
    let _ = io::stdout().flush();
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}
