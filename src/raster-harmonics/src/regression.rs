//! Per-pixel least-squares trend over a built harmonic basis.

use nalgebra::{DMatrix, DVector, SVD};
use ndarray::Array2;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{HarmonicError, Result};
use crate::harmonics::TimeSeries;
use crate::image::Image;
use crate::names;

/// Singular values below this fraction of the largest are treated as zero.
const RELATIVE_RANK_TOL: f64 = 1e-10;

/// Coefficients of the dependent band regressed on the independent bands,
/// fitted independently for every pixel across the whole time series.
#[derive(Debug, Clone)]
pub struct LinearRegression {
    trend: Image,
    independent: Vec<String>,
    dependent: String,
}

impl LinearRegression {
    /// Fit the regression once; the result is immutable.
    ///
    /// Per pixel, a time step with any masked value among the selected bands
    /// is dropped. A pixel left with fewer samples than regressors gets
    /// masked coefficients. Rank-deficient pixels get the minimum-norm
    /// solution.
    pub fn fit(series: &TimeSeries) -> Result<Self> {
        let independent = series.independent().to_vec();
        let dependent = series.dependent().to_string();
        let regressors = independent.len();
        if regressors == 0 {
            return Err(HarmonicError::InvalidArgument(
                "no independent variables registered".to_string(),
            ));
        }
        let collection = series.collection();
        if collection.len() < regressors {
            return Err(HarmonicError::UnderdeterminedRegression {
                samples: collection.len(),
                regressors,
            });
        }

        let mut selectors = independent.clone();
        selectors.push(dependent.clone());
        let stacked = collection.select_names(&selectors)?;
        let shape = stacked.shape().ok_or(HarmonicError::EmptyCollection)?;
        let layers: Vec<Vec<&Array2<f64>>> = stacked
            .iter()
            .map(|image| image.bands().iter().map(|band| &band.data).collect())
            .collect();

        let (rows, cols) = shape;
        let solutions: Vec<Option<Vec<f64>>> = (0..rows * cols)
            .into_par_iter()
            .map(|idx| solve_pixel(&layers, idx / cols, idx % cols, regressors))
            .collect();

        let degenerate = solutions.iter().filter(|s| s.is_none()).count();
        if degenerate > 0 {
            warn!(
                pixels = degenerate,
                "too few unmasked samples for the regression; coefficients masked"
            );
        }

        let mut trend = Image::new(shape);
        for (j, name) in independent.iter().enumerate() {
            let data = Array2::from_shape_fn(shape, |(r, c)| match &solutions[r * cols + c] {
                Some(beta) => beta[j],
                None => f64::NAN,
            });
            trend = trend.with_band(names::coefficient(name), data)?;
        }
        debug!(
            dependent = %dependent,
            regressors,
            samples = collection.len(),
            "fitted linear regression"
        );

        Ok(LinearRegression {
            trend,
            independent,
            dependent,
        })
    }

    /// The full regression output, one `<var>_coef` band per regressor.
    pub fn trend(&self) -> &Image {
        &self.trend
    }

    pub fn independent(&self) -> &[String] {
        &self.independent
    }

    pub fn dependent(&self) -> &str {
        &self.dependent
    }

    /// Only the `_coef` bands of the trend.
    pub fn get_coefficients(&self) -> Result<Image> {
        self.trend.select(&format!(".*{}", names::COEF_SUFFIX))
    }
}

/// Least-squares coefficients for one pixel, `None` when under-determined.
fn solve_pixel(layers: &[Vec<&Array2<f64>>], r: usize, c: usize, regressors: usize) -> Option<Vec<f64>> {
    let samples: Vec<Vec<f64>> = layers
        .iter()
        .map(|bands| bands.iter().map(|band| band[[r, c]]).collect::<Vec<f64>>())
        .filter(|row| row.iter().all(|v| !v.is_nan()))
        .collect();
    if samples.len() < regressors {
        return None;
    }

    let x = DMatrix::from_fn(samples.len(), regressors, |i, j| samples[i][j]);
    let y = DVector::from_fn(samples.len(), |i, _| samples[i][regressors]);
    let svd = SVD::new(x, true, true);
    let max_sv = svd.singular_values.iter().cloned().fold(0.0_f64, f64::max);
    let beta = svd.solve(&y, RELATIVE_RANK_TOL * max_sv).ok()?;
    Some(beta.iter().cloned().collect())
}
