//! Per-sensor feature recipes built from the band calculators.

use ndarray::{s, Array2};
use rayon::prelude::*;

use crate::calculators::{BandCalculator, TasseledCapBands};
use crate::error::Result;
use crate::image::Image;

/// Square-window mean filter of half-width `radius` applied to every band.
///
/// Windows are truncated at the raster edges and masked pixels are left out
/// of the mean.
pub fn boxcar(image: &Image, radius: usize) -> Result<Image> {
    let smoothed: Vec<Array2<f64>> = image
        .bands()
        .par_iter()
        .map(|band| local_mean(&band.data, radius))
        .collect();
    let names = image.band_names();
    let mut result = Image::from_bands(names, smoothed)?;
    if let Some(timestamp) = image.timestamp() {
        result = result.with_timestamp(timestamp);
    }
    Ok(result)
}

fn local_mean(band: &Array2<f64>, radius: usize) -> Array2<f64> {
    let (h, w) = band.dim();
    Array2::from_shape_fn((h, w), |(y, x)| {
        let window = band.slice(s![
            y.saturating_sub(radius)..(y + radius + 1).min(h),
            x.saturating_sub(radius)..(x + radius + 1).min(w)
        ]);
        let (sum, count) = window
            .iter()
            .filter(|v| !v.is_nan())
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
        if count == 0 {
            f64::NAN
        } else {
            sum / count as f64
        }
    })
}

/// Dual-pol Sentinel-1: boxcar, `VV/VH` ratio, keep the `V*` bands.
pub fn sentinel1(image: &Image) -> Result<Image> {
    let filtered = boxcar(image, 1)?;
    BandCalculator::ratio("VV", "VH", "VV/VH")
        .apply(filtered)?
        .select("V.*")
}

/// Dual-pol ALOS PALSAR: boxcar, `HH/HV` ratio, keep the `H*` bands.
pub fn alos(image: &Image) -> Result<Image> {
    let filtered = boxcar(image, 1)?;
    BandCalculator::ratio("HH", "HV", "HH/HV")
        .apply(filtered)?
        .select("H.*")
}

/// Optical reflectance: NDVI, SAVI and tasseled cap components.
pub fn optical(image: &Image, bands: &TasseledCapBands) -> Result<Image> {
    [
        BandCalculator::ndvi(bands.nir.clone(), bands.red.clone()),
        BandCalculator::savi(bands.nir.clone(), bands.red.clone()),
        BandCalculator::TasseledCap(bands.clone()),
    ]
    .iter()
    .try_fold(image.clone(), |image, calculator| calculator.apply(image))
}
