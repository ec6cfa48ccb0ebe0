use itertools::{Itertools, MinMaxResult};
use ndarray::Array2;

use crate::errors::{GeoRasterError, Result};

/// Summary of the valid samples of one band.
///
/// All fields are `None` when the band holds no valid sample, i.e. every
/// value is the no-data sentinel or NaN.
#[derive(serde::Serialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct BandStats {
    pub max: Option<f64>,
    pub min: Option<f64>,
    pub range: Option<f64>,
}

impl BandStats {
    pub fn compute(band: &Array2<f64>, no_data: Option<f64>) -> Self {
        let valid = band
            .iter()
            .copied()
            .filter(|value| !value.is_nan() && Some(*value) != no_data);
        match valid.minmax_by(f64::total_cmp) {
            MinMaxResult::NoElements => Self::default(),
            MinMaxResult::OneElement(value) => Self::from_min_max(value, value),
            MinMaxResult::MinMax(min, max) => Self::from_min_max(min, max),
        }
    }

    fn from_min_max(min: f64, max: f64) -> Self {
        Self {
            max: Some(max),
            min: Some(min),
            range: Some(max - min),
        }
    }
}

/// Computes [BandStats] for every band, checking each has the declared shape.
pub fn band_stats(
    bands: &[Array2<f64>],
    height: usize,
    width: usize,
    no_data: Option<f64>,
) -> Result<Vec<BandStats>> {
    bands
        .iter()
        .enumerate()
        .map(|(band, values)| {
            if values.dim() != (height, width) {
                return Err(GeoRasterError::StatsCompute {
                    band,
                    expected: (height, width),
                    actual: values.dim(),
                });
            }
            Ok(BandStats::compute(values, no_data))
        })
        .collect()
}
