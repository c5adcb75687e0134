//
// main.rs
// Dcm2Png-rs
//
// Binary entry point: sets up logging and hands off to the CLI layer.
//
// Thales Matheus Mendonça Santos - November 2025

use std::process::ExitCode;

use dcm2png::{cli, logger};

fn main() -> ExitCode {
    logger::init();
    // Argument parsing, the batch run, and reporting all live in the CLI module.
    cli::run()
}
