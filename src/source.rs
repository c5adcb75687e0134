//
// source.rs
// Dcm2Png-rs
//
// Decodes DICOM files into raw sample arrays and collects the LUT metadata the contrast transforms need.
//
// Thales Matheus Mendonça Santos - November 2025

use std::path::Path;

use dicom::core::Tag;
use dicom::object::open_file;
use dicom::pixeldata::PixelDecoder;
use dicom_pixeldata::{ConvertOptions, ModalityLutOption, VoiLutOption};
use tracing::debug;

use crate::dicom_access::ElementAccess;
use crate::error::{ConvertError, LutError, Result};
use crate::models::{LookupTable, LutMetadata, Rescale, SourceImage, VoiLutFunction, WindowLevel};

const BITS_STORED: Tag = Tag(0x0028, 0x0101);
const WINDOW_CENTER: Tag = Tag(0x0028, 0x1050);
const WINDOW_WIDTH: Tag = Tag(0x0028, 0x1051);
const RESCALE_INTERCEPT: Tag = Tag(0x0028, 0x1052);
const RESCALE_SLOPE: Tag = Tag(0x0028, 0x1053);
const VOI_LUT_FUNCTION: Tag = Tag(0x0028, 0x1056);
const LUT_DESCRIPTOR: Tag = Tag(0x0028, 0x3002);
const LUT_DATA: Tag = Tag(0x0028, 0x3006);
const MODALITY_LUT_SEQUENCE: Tag = Tag(0x0028, 0x3000);
const VOI_LUT_SEQUENCE: Tag = Tag(0x0028, 0x3010);

/// Anything able to turn a file on disk into samples plus LUT metadata.
/// The batch loop only talks to this trait, so decoders can be swapped freely.
pub trait PixelSource {
    fn decode(&self, path: &Path) -> Result<SourceImage>;
}

/// `dicom-rs` backed decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct DicomSource;

impl PixelSource for DicomSource {
    fn decode(&self, path: &Path) -> Result<SourceImage> {
        let obj = open_file(path).map_err(|e| ConvertError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let decoded = obj.decode_pixel_data().map_err(|e| ConvertError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        // Stored values only: the contrast step applies the LUTs itself.
        let options = ConvertOptions::new()
            .with_modality_lut(ModalityLutOption::None)
            .with_voi_lut(VoiLutOption::Identity);
        let samples = decoded
            .to_ndarray_with_options::<f64>(&options)
            .map_err(|e| ConvertError::Decode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
            .into_dyn();

        let metadata =
            read_lut_metadata(&obj, decoded.bits_stored()).map_err(|source| {
                ConvertError::Metadata {
                    path: path.to_path_buf(),
                    source,
                }
            })?;

        debug!(
            "Decoded {:?}: shape {:?}, {} window(s)",
            path,
            samples.shape(),
            metadata.windows.len()
        );

        Ok(SourceImage { samples, metadata })
    }
}

/// Collect the modality and VOI attributes of a dataset.
/// `fallback_bits` is used when Bits Stored is missing.
pub fn read_lut_metadata<T: ElementAccess>(
    obj: &T,
    fallback_bits: u16,
) -> std::result::Result<LutMetadata, LutError> {
    let rescale = read_rescale(obj)?;

    let modality_lut = obj
        .sequence_items(MODALITY_LUT_SEQUENCE)
        .first()
        .map(read_lookup_table)
        .transpose()?;

    let voi_lut = obj
        .sequence_items(VOI_LUT_SEQUENCE)
        .first()
        .map(read_lookup_table)
        .transpose()?;

    let voi_lut_function = obj
        .element_str(VOI_LUT_FUNCTION)
        .and_then(|code| VoiLutFunction::try_from(code.as_str()).ok())
        .unwrap_or_default();

    Ok(LutMetadata {
        rescale,
        modality_lut,
        windows: read_windows(obj)?,
        voi_lut_function,
        voi_lut,
        bits_stored: obj.element_u16(BITS_STORED).unwrap_or(fallback_bits),
    })
}

fn first_decimal<T: ElementAccess>(
    obj: &T,
    tag: Tag,
    name: &'static str,
) -> std::result::Result<Option<f64>, LutError> {
    match obj.element_decimals(tag) {
        None => Ok(None),
        Some(Ok(values)) => Ok(values.first().copied()),
        Some(Err(value)) => Err(LutError::InvalidValue { tag: name, value }),
    }
}

fn read_rescale<T: ElementAccess>(obj: &T) -> std::result::Result<Option<Rescale>, LutError> {
    let slope = first_decimal(obj, RESCALE_SLOPE, "Rescale Slope")?;
    let intercept = first_decimal(obj, RESCALE_INTERCEPT, "Rescale Intercept")?;

    // A lone slope or intercept is not a rescale; values pass through as stored.
    Ok(match (slope, intercept) {
        (Some(slope), Some(intercept)) => Some(Rescale::new(slope, intercept)),
        _ => None,
    })
}

fn read_windows<T: ElementAccess>(obj: &T) -> std::result::Result<Vec<WindowLevel>, LutError> {
    let decimals = |tag: Tag, name: &'static str| match obj.element_decimals(tag) {
        None => Ok(Vec::new()),
        Some(Ok(values)) => Ok(values),
        Some(Err(value)) => Err(LutError::InvalidValue { tag: name, value }),
    };
    let centers = decimals(WINDOW_CENTER, "Window Center")?;
    let widths = decimals(WINDOW_WIDTH, "Window Width")?;

    // Unpaired trailing values are ignored.
    Ok(centers
        .into_iter()
        .zip(widths)
        .map(|(center, width)| WindowLevel { center, width })
        .collect())
}

fn read_lookup_table<T: ElementAccess>(item: &T) -> std::result::Result<LookupTable, LutError> {
    let descriptor = item.element_ints(LUT_DESCRIPTOR).unwrap_or_default();
    let &[entries, first_mapped, _bits_per_entry] = descriptor.as_slice() else {
        return Err(LutError::MalformedDescriptor(descriptor.len()));
    };

    // An entry count of zero stands for 2^16 entries.
    let expected = if entries == 0 { 65536 } else { entries as usize };
    let data: Vec<f64> = item
        .element_ints(LUT_DATA)
        .unwrap_or_default()
        .into_iter()
        .map(|v| v as f64)
        .collect();

    if data.len() < expected {
        return Err(LutError::LengthMismatch {
            expected,
            found: data.len(),
        });
    }

    Ok(LookupTable {
        first_mapped,
        data: data.into_iter().take(expected).collect(),
    })
}
