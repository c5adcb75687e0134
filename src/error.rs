//
// error.rs
// Dcm2Png-rs
//
// Error types for every stage of a conversion run, from directory validation down to PNG encoding.
//
// Thales Matheus Mendonça Santos - November 2025

use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading or applying lookup-table metadata.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LutError {
    #[error("malformed LUT descriptor: expected 3 values, found {0}")]
    MalformedDescriptor(usize),

    #[error("LUT descriptor announces {expected} entries but LUT data has {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("invalid window width {width} for {function} VOI LUT function")]
    InvalidWindowWidth { width: f64, function: &'static str },

    #[error("invalid value for {tag}: {value:?}")]
    InvalidValue { tag: &'static str, value: String },
}

/// Every way a conversion run can fail. Variants are ordered by pipeline stage.
#[derive(Error, Debug)]
pub enum ConvertError {
    // Directory level
    #[error("Input directory {} does not exist", .path.display())]
    InputMissing { path: PathBuf },

    #[error("Input directory {} is a file", .path.display())]
    InputIsFile { path: PathBuf },

    #[error("Failed to create output directory {}: {source}", .path.display())]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to scan {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("No DICOM files found in {}", .path.display())]
    NoFilesFound { path: PathBuf },

    // Per file
    #[error("Failed to open DICOM file {}: {reason}", .path.display())]
    Open { path: PathBuf, reason: String },

    #[error("Failed to decode pixel data of {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("Invalid LUT metadata in {}: {source}", .path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: LutError,
    },

    #[error("Contrast transform failed for {}: {source}", .path.display())]
    Transform {
        path: PathBuf,
        #[source]
        source: LutError,
    },

    #[error("Image {} has a constant value of {value}, cannot normalize", .path.display())]
    DegenerateImage { path: PathBuf, value: f64 },

    #[error("Unsupported pixel layout in {}: {shape:?}", .path.display())]
    UnsupportedShape { path: PathBuf, shape: Vec<usize> },

    #[error("Requested frame {frame} but {} has {frames} frame(s)", .path.display())]
    FrameOutOfRange {
        path: PathBuf,
        frame: u32,
        frames: usize,
    },

    #[error("Failed to save image to {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    // Batch level
    #[error("All {count} DICOM files failed to convert")]
    AllFailed { count: usize },
}

impl ConvertError {
    /// Whether `--skip-errors` may step over this failure and keep going.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            ConvertError::Open { .. }
                | ConvertError::Decode { .. }
                | ConvertError::Metadata { .. }
                | ConvertError::Transform { .. }
                | ConvertError::DegenerateImage { .. }
                | ConvertError::UnsupportedShape { .. }
                | ConvertError::FrameOutOfRange { .. }
                | ConvertError::Encode { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
