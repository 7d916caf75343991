// src/clustering/scaling.rs

use anyhow::{Context, Result};
use linfa::traits::{Fit, Transformer};
use linfa::DatasetBase;
use linfa_preprocessing::linear_scaling::LinearScaler;
use ndarray::Array2;

pub const FEATURE_RANGE: (f64, f64) = (-1.0, 1.0);

/// Rescales every column independently to `[lo, hi]` using the column's min and max over all
/// rows.
pub fn min_max_scale(data: &Array2<f64>, (lo, hi): (f64, f64)) -> Result<Array2<f64>> {
    let dataset = DatasetBase::from(data.clone());
    let scaler = LinearScaler::min_max_range(lo, hi)
        .fit(&dataset)
        .context("Failed to fit min-max scaler")?;
    Ok(scaler.transform(dataset.records))
}
