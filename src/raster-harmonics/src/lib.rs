//! # raster-harmonics
//!
//! Harmonic (Fourier) features from satellite image time series, for
//! land-cover classification.
//!
//! A temporal stack of images is augmented with a harmonic regressor basis,
//! a linear trend is fitted per pixel across time, and the per-mode sine and
//! cosine coefficients are turned into phase and amplitude bands. The
//! sequence is then reduced to a single composite whose bands are rescaled
//! to `[-1, 1]` and ready to be sampled for classifier training.
//!
//! ```no_run
//! use raster_harmonics::{compute_fourier_transform, io, DEFAULT_MODES};
//!
//! let collection = io::read_collection("manifest.csv", &["B2", "B3", "B4", "B8"])?;
//! let composite = compute_fourier_transform(collection, "B8", DEFAULT_MODES)?;
//! println!("{:?}", composite.band_names());
//! # Ok::<(), raster_harmonics::HarmonicError>(())
//! ```
//!
//! ## Masking
//!
//! `NaN` is the mask value throughout: masked pixels are skipped by the
//! regression, the temporal median, min/max scaling and point sampling.

pub mod calculators;
pub mod collection;
pub mod error;
pub mod fourier;
pub mod harmonics;
pub mod image;
pub mod io;
pub mod names;
pub mod recipes;
pub mod regression;
pub mod sampling;

pub use calculators::{BandCalculator, TasseledCapBands};
pub use collection::ImageCollection;
pub use error::{HarmonicError, Result};
pub use fourier::{compute_fourier_transform, FourierTransform, Stage};
pub use harmonics::{Regressors, TimeSeries, DEFAULT_MODES};
pub use image::{Band, Image};
pub use regression::LinearRegression;
pub use sampling::{sample_points, SamplePoint};
