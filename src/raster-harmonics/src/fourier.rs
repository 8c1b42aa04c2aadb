//! Fourier feature composite from an image time series.
//!
//! The pipeline runs in a fixed order:
//!
//! 1. build the harmonic basis ([`TimeSeries::build`])
//! 2. fit the per-pixel trend ([`LinearRegression::fit`])
//! 3. attach the `_coef` bands to every image
//! 4. attach `phase_k` and `amp_k` for `k = 1..=modes`
//! 5. reduce the series with a per-pixel median
//! 6. keep the dependent band, the `_coef` bands and `phase_k`/`amp_k`, then
//!    rescale each band to `[-1, 1]`
//!
//! Any missing band aborts the whole pipeline; there is no partial output.

use std::fmt;

use tracing::{debug, info};

use crate::calculators::BandCalculator;
use crate::collection::ImageCollection;
use crate::error::Result;
use crate::harmonics::TimeSeries;
use crate::image::Image;
use crate::names;
use crate::regression::LinearRegression;

pub const SCALE_MIN: f64 = -1.0;
pub const SCALE_MAX: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    BasisBuilt,
    TrendFitted,
    CoefficientsAttached,
    PhaseAmplitudeAttached(usize),
    Reduced,
    Scaled,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::BasisBuilt => write!(f, "basis built"),
            Stage::TrendFitted => write!(f, "trend fitted"),
            Stage::CoefficientsAttached => write!(f, "coefficients attached"),
            Stage::PhaseAmplitudeAttached(mode) => write!(f, "phase/amplitude attached for mode {}", mode),
            Stage::Reduced => write!(f, "reduced"),
            Stage::Scaled => write!(f, "scaled"),
        }
    }
}

pub struct FourierTransform {
    time_series: TimeSeries,
    trend: LinearRegression,
}

impl FourierTransform {
    pub fn new(time_series: TimeSeries, trend: LinearRegression) -> Self {
        FourierTransform { time_series, trend }
    }

    /// Bands kept in the composite, in output order.
    pub fn selectors(&self) -> Vec<String> {
        composite_bands(
            self.time_series.dependent(),
            self.trend.independent(),
            self.time_series.modes(),
        )
    }

    fn add_calculator(collection: &ImageCollection, calculator: &BandCalculator) -> Result<ImageCollection> {
        collection.map(|image| calculator.apply(image.clone()))
    }

    /// Reduce the series to the scaled composite image.
    pub fn compute(self) -> Result<Image> {
        let selectors = self.selectors();
        let modes = self.time_series.modes();

        let coefficients = self.trend.get_coefficients()?;
        let mut collection = self
            .time_series
            .collection()
            .map(|image| image.clone().add_bands(&coefficients))?;
        debug!(stage = %Stage::CoefficientsAttached);

        for mode in 1..=modes {
            collection = Self::add_calculator(&collection, &BandCalculator::phase(mode))?;
            collection = Self::add_calculator(&collection, &BandCalculator::amplitude(mode))?;
            debug!(stage = %Stage::PhaseAmplitudeAttached(mode));
        }

        let reduced = collection.median()?;
        debug!(stage = %Stage::Reduced);

        let composite = reduced.select_names(&selectors)?.unit_scale(SCALE_MIN, SCALE_MAX)?;
        debug!(stage = %Stage::Scaled, bands = composite.len());
        Ok(composite)
    }
}

/// The dependent band, one `_coef` band per regressor, then `phase_k` and
/// `amp_k` for every mode. Only generated names are listed, so input bands
/// that merely look like outputs never reach the composite.
pub fn composite_bands<S: AsRef<str>>(dependent: &str, independent: &[S], modes: usize) -> Vec<String> {
    let mut bands = vec![dependent.to_string()];
    bands.extend(independent.iter().map(|name| names::coefficient(name.as_ref())));
    for mode in 1..=modes {
        bands.push(names::phase(mode));
        bands.push(names::amplitude(mode));
    }
    bands
}

/// Build the basis, fit the trend and reduce `collection` to one image of
/// Fourier features for `dependent`.
pub fn compute_fourier_transform(
    collection: ImageCollection,
    dependent: &str,
    modes: usize,
) -> Result<Image> {
    info!(
        images = collection.len(),
        dependent, modes, "computing fourier transform"
    );
    let time_series = TimeSeries::new(collection, dependent, modes)?.build()?;
    debug!(stage = %Stage::BasisBuilt);
    let trend = LinearRegression::fit(&time_series)?;
    debug!(stage = %Stage::TrendFitted);
    FourierTransform::new(time_series, trend).compute()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarmonicError;
    use chrono::{TimeZone, Utc};
    use ndarray::Array2;

    fn series(dependent: &str) -> ImageCollection {
        let images = (1..=8)
            .map(|month| {
                let v = month as f64;
                Image::from_bands(
                    vec![dependent],
                    vec![Array2::from_shape_fn((2, 2), |(r, c)| v.sin() * (1 + r + c) as f64)],
                )
                .unwrap()
                .with_timestamp(Utc.with_ymd_and_hms(2022, month, 10, 0, 0, 0).unwrap())
            })
            .collect();
        ImageCollection::new(images).unwrap()
    }

    #[test]
    fn test_composite_bands_follow_regressors() {
        assert_eq!(
            composite_bands("VV/VH", &["constant", "t", "cos_1", "sin_1"], 1),
            vec!["VV/VH", "constant_coef", "t_coef", "cos_1_coef", "sin_1_coef", "phase_1", "amp_1"]
        );
    }

    #[test]
    fn test_lookalike_input_bands_stay_out_of_composite() {
        let collection = series("NDVI")
            .map(|image| {
                let qa = image.band("NDVI")?.mapv(|v| v * 2.0);
                image.clone().with_band("qa_coef", qa.clone())?.with_band("amp_9", qa)
            })
            .unwrap();
        let composite = compute_fourier_transform(collection, "NDVI", 1).unwrap();
        assert_eq!(
            composite.band_names(),
            vec!["NDVI", "constant_coef", "t_coef", "cos_1_coef", "sin_1_coef", "phase_1", "amp_1"]
        );
    }

    #[test]
    fn test_single_mode_band_layout() {
        let composite = compute_fourier_transform(series("NDVI"), "NDVI", 1).unwrap();
        assert_eq!(
            composite.band_names(),
            vec!["NDVI", "constant_coef", "t_coef", "cos_1_coef", "sin_1_coef", "phase_1", "amp_1"]
        );
    }

    #[test]
    fn test_missing_dependent_is_fatal() {
        let err = compute_fourier_transform(series("NDVI"), "EVI", 1).unwrap_err();
        assert!(matches!(err, HarmonicError::MissingBand { pattern } if pattern == "EVI"));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(
            Stage::PhaseAmplitudeAttached(2).to_string(),
            "phase/amplitude attached for mode 2"
        );
    }
}
