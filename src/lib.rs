//
// lib.rs
// Dcm2Png-rs
//
// Exposes the crate's modules and re-exports the batch entry points for both binary and library consumers.
//
// Thales Matheus Mendonça Santos - November 2025

// Public surface of the library: one module per pipeline stage plus shared utilities.
pub mod batch;
pub mod cli;
pub mod dicom_access;
pub mod error;
pub mod image;
pub mod logger;
pub mod models;
pub mod normalize;
pub mod source;
pub mod transform;

pub use batch::{convert_directory, convert_directory_with, BatchOptions};
pub use cli::{run as run_cli, Cli};
pub use error::{ConvertError, LutError};
pub use source::{DicomSource, PixelSource};
