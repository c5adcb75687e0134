//
// normalize.rs
// Dcm2Png-rs
//
// Min-max normalization of sample arrays onto the 8-bit display range.
//
// Thales Matheus Mendonça Santos - November 2025

use ndarray::{ArrayBase, ArrayD, Data, Dimension};

/// Smallest and largest finite samples, or `None` if there are none.
pub fn sample_range<S, D>(samples: &ArrayBase<S, D>) -> Option<(f64, f64)>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    samples
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |range, v| match range {
            None => Some((v, v)),
            Some((min, max)) => Some((min.min(v), max.max(v))),
        })
}

/// `(x - min) / (max - min) * 255`, truncated into `u8`.
/// A flat range (`max == min`) produces an all-zero image.
pub fn normalize_to_u8<S, D>(samples: &ArrayBase<S, D>, (min, max): (f64, f64)) -> ArrayD<u8>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let span = max - min;
    if span.is_nan() || span <= 0.0 {
        return ArrayD::zeros(samples.shape());
    }
    samples
        .mapv(|x| ((x - min) / span * 255.0) as u8)
        .into_dyn()
}
