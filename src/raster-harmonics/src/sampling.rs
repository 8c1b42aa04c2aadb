//! Training samples drawn from a feature image.

use linfa::DatasetBase;
use ndarray::{Array1, Array2};
use tracing::debug;

use crate::error::{HarmonicError, Result};
use crate::image::Image;

/// A labelled pixel location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplePoint {
    pub row: usize,
    pub col: usize,
    pub label: usize,
}

/// Read every band of `image` at each point.
///
/// The returned dataset has one record per kept point, one feature per band
/// (named after the band) and the point labels as targets. Points where any
/// band is masked are dropped.
pub fn sample_points(
    image: &Image,
    points: &[SamplePoint],
) -> Result<DatasetBase<Array2<f64>, Array1<usize>>> {
    let (rows, cols) = image.shape();
    let mut records = Vec::with_capacity(points.len() * image.len());
    let mut targets = Vec::with_capacity(points.len());

    for point in points {
        if point.row >= rows || point.col >= cols {
            return Err(HarmonicError::PointOutOfBounds {
                row: point.row,
                col: point.col,
                rows,
                cols,
            });
        }
        let values: Vec<f64> = image
            .bands()
            .iter()
            .map(|band| band.data[[point.row, point.col]])
            .collect();
        if values.iter().any(|v| v.is_nan()) {
            continue;
        }
        records.extend(values);
        targets.push(point.label);
    }

    let dropped = points.len() - targets.len();
    if dropped > 0 {
        debug!(dropped, kept = targets.len(), "dropped masked sample points");
    }

    let records = Array2::from_shape_vec((targets.len(), image.len()), records)?;
    Ok(DatasetBase::new(records, Array1::from(targets)).with_feature_names(image.band_names()))
}
