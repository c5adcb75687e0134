//
// models.rs
// Dcm2Png-rs
//
// Defines the in-memory image, LUT metadata, and run summary structures shared across the pipeline.
//
// Thales Matheus Mendonça Santos - November 2025

use std::path::PathBuf;

use ndarray::ArrayD;

// Rescale and windowing come straight from the pixel data crate.
pub use dicom_pixeldata::{Rescale, VoiLutFunction, WindowLevel};

/// Axis positions of a decoded sample array: `[frames, rows, columns, samples]`.
pub const FRAME_AXIS: usize = 0;
pub const SAMPLE_AXIS: usize = 3;

/// Decoded pixel samples plus the metadata needed to run the contrast transforms.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub samples: ArrayD<f64>,
    pub metadata: LutMetadata,
}

impl SourceImage {
    pub fn number_of_frames(&self) -> usize {
        self.samples.shape().get(FRAME_AXIS).copied().unwrap_or(0)
    }

    pub fn samples_per_pixel(&self) -> usize {
        self.samples.shape().get(SAMPLE_AXIS).copied().unwrap_or(0)
    }
}

/// A tabulated LUT taken from a Modality or VOI LUT Sequence item.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupTable {
    /// First stored value mapped by the table (second LUT Descriptor value).
    pub first_mapped: i64,
    pub data: Vec<f64>,
}

impl LookupTable {
    /// Inputs below or above the table clamp to its first or last entry.
    pub fn lookup(&self, value: f64) -> f64 {
        let Some(last) = self.data.len().checked_sub(1) else {
            return value;
        };
        let index = (value.floor() as i64).saturating_sub(self.first_mapped);
        let index = index.clamp(0, last as i64) as usize;
        self.data[index]
    }
}

/// Everything the contrast transforms read from a dataset.
#[derive(Debug, Clone)]
pub struct LutMetadata {
    pub rescale: Option<Rescale>,
    pub modality_lut: Option<LookupTable>,
    pub windows: Vec<WindowLevel>,
    pub voi_lut_function: VoiLutFunction,
    pub voi_lut: Option<LookupTable>,
    pub bits_stored: u16,
}

impl Default for LutMetadata {
    fn default() -> Self {
        Self {
            rescale: None,
            modality_lut: None,
            windows: Vec::new(),
            voi_lut_function: VoiLutFunction::default(),
            voi_lut: None,
            bits_stored: 8,
        }
    }
}

/// Outcome of a successful batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    pub converted: usize,
    pub skipped: usize,
    pub output_dir: PathBuf,
}
