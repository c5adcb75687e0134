//
// dicom_access.rs
// Dcm2Png-rs
//
// Typed accessors over DICOM elements so LUT metadata can be read from files and sequence items alike.
//
// Thales Matheus Mendonça Santos - November 2025

use dicom::core::Tag;
use dicom::dictionary_std::StandardDataDictionary;
use dicom::object::mem::InMemElement;
use dicom::object::{DefaultDicomObject, InMemDicomObject};

/// Small helper trait to pull typed values from different DICOM object shapes.
pub trait ElementAccess {
    fn lookup(&self, tag: Tag) -> Option<&InMemElement<StandardDataDictionary>>;

    fn element_str(&self, tag: Tag) -> Option<String> {
        self.lookup(tag)
            .and_then(|e| e.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Decimal or integer strings, split on the DICOM value separator.
    /// `None` when the element is absent; `Some(Err(raw))` when a value fails to parse.
    fn element_decimals(&self, tag: Tag) -> Option<Result<Vec<f64>, String>> {
        let raw = self.element_str(tag)?;
        Some(parse_decimals(&raw).ok_or(raw))
    }

    fn element_ints(&self, tag: Tag) -> Option<Vec<i64>> {
        self.lookup(tag).and_then(|e| e.to_multi_int::<i64>().ok())
    }

    fn element_u16(&self, tag: Tag) -> Option<u16> {
        self.element_ints(tag)
            .and_then(|values| values.first().copied())
            .and_then(|v| u16::try_from(v).ok())
    }

    fn sequence_items(&self, tag: Tag) -> &[InMemDicomObject<StandardDataDictionary>] {
        self.lookup(tag).and_then(|e| e.items()).unwrap_or(&[])
    }
}

impl ElementAccess for DefaultDicomObject {
    fn lookup(&self, tag: Tag) -> Option<&InMemElement<StandardDataDictionary>> {
        self.element(tag).ok()
    }
}

impl ElementAccess for InMemDicomObject<StandardDataDictionary> {
    fn lookup(&self, tag: Tag) -> Option<&InMemElement<StandardDataDictionary>> {
        self.element(tag).ok()
    }
}

fn parse_decimals(raw: &str) -> Option<Vec<f64>> {
    raw.split('\\')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.parse::<f64>().ok())
        .collect()
}
