//
// transform.rs
// Dcm2Png-rs
//
// Modality LUT and VOI LUT (windowing) transforms applied to decoded samples for contrast enhancement.
//
// Thales Matheus Mendonça Santos - November 2025

use dicom_pixeldata::WindowLevelTransform;
use ndarray::ArrayD;
use tracing::debug;

use crate::error::LutError;
use crate::models::{LutMetadata, VoiLutFunction, WindowLevel};

/// Apply the modality LUT and then the VOI LUT, the same order a viewer uses.
/// Color data (more than one sample per pixel) passes through untouched.
pub fn apply_contrast(
    samples: ArrayD<f64>,
    metadata: &LutMetadata,
    samples_per_pixel: usize,
) -> Result<ArrayD<f64>, LutError> {
    if samples_per_pixel > 1 {
        debug!("Skipping LUTs for {}-sample color data", samples_per_pixel);
        return Ok(samples);
    }
    let rescaled = apply_modality_lut(samples, metadata);
    apply_voi_lut(rescaled, metadata)
}

/// Stored values to output units: the Modality LUT Sequence wins over Rescale Slope/Intercept.
pub fn apply_modality_lut(samples: ArrayD<f64>, metadata: &LutMetadata) -> ArrayD<f64> {
    if let Some(table) = &metadata.modality_lut {
        samples.mapv_into(|x| table.lookup(x))
    } else if let Some(rescale) = metadata.rescale {
        samples.mapv_into(|x| rescale.apply(x))
    } else {
        samples
    }
}

/// Output units to display values: the VOI LUT Sequence wins over the first window.
pub fn apply_voi_lut(samples: ArrayD<f64>, metadata: &LutMetadata) -> Result<ArrayD<f64>, LutError> {
    if let Some(table) = &metadata.voi_lut {
        return Ok(samples.mapv_into(|x| table.lookup(x)));
    }

    let Some(window) = metadata.windows.first().copied() else {
        return Ok(samples);
    };

    let function = metadata.voi_lut_function;
    validate_width(&window, function)?;
    let y_max = output_max(metadata.bits_stored);

    debug!(
        "Windowing with center {} width {} ({})",
        window.center,
        window.width,
        function_name(function)
    );

    let transform = WindowLevelTransform::new(function, window);
    Ok(samples.mapv_into(|x| transform.apply(x, y_max)))
}

/// Top of the VOI output range `[0, 2^bits - 1]`.
pub fn output_max(bits_stored: u16) -> f64 {
    2f64.powi(i32::from(bits_stored.clamp(1, 32))) - 1.0
}

pub fn function_name(function: VoiLutFunction) -> &'static str {
    match function {
        VoiLutFunction::Linear => "LINEAR",
        VoiLutFunction::LinearExact => "LINEAR_EXACT",
        VoiLutFunction::Sigmoid => "SIGMOID",
    }
}

// The transform itself clamps bad widths; reject them so bad files surface.
fn validate_width(window: &WindowLevel, function: VoiLutFunction) -> Result<(), LutError> {
    let valid = match function {
        VoiLutFunction::Linear => window.width >= 1.0,
        VoiLutFunction::LinearExact | VoiLutFunction::Sigmoid => window.width > 0.0,
    };
    if valid {
        Ok(())
    } else {
        Err(LutError::InvalidWindowWidth {
            width: window.width,
            function: function_name(function),
        })
    }
}
