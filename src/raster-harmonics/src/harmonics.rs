//! Harmonic regressor basis over an image time series.
//!
//! Building a [`TimeSeries`] writes the regressor bands onto every image
//! (`constant`, `t`, `cos_1..cos_n`, `sin_1..sin_n`) and records their names,
//! in that order, as the independent variables of the trend fit.

use std::f64::consts::PI;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use ndarray::Array2;
use tracing::debug;

use crate::collection::ImageCollection;
use crate::error::{HarmonicError, Result};
use crate::names;

/// Number of harmonic modes used when none is given.
pub const DEFAULT_MODES: usize = 3;

/// Names to register as independent variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Regressors {
    Name(String),
    Names(Vec<String>),
}

impl From<&str> for Regressors {
    fn from(name: &str) -> Self {
        Regressors::Name(name.to_string())
    }
}

impl From<String> for Regressors {
    fn from(name: String) -> Self {
        Regressors::Name(name)
    }
}

impl From<Vec<String>> for Regressors {
    fn from(names: Vec<String>) -> Self {
        Regressors::Names(names)
    }
}

impl From<&[&str]> for Regressors {
    fn from(names: &[&str]) -> Self {
        Regressors::Names(names.iter().map(|n| n.to_string()).collect())
    }
}

#[derive(Debug, Clone)]
pub struct TimeSeries {
    collection: ImageCollection,
    dependent: String,
    independent: Vec<String>,
    modes: usize,
    built: bool,
}

impl TimeSeries {
    /// Wrap a collection whose images all carry a timestamp and the
    /// `dependent` band. The dependent must not share a name with any band
    /// the pipeline generates.
    pub fn new(collection: ImageCollection, dependent: impl Into<String>, modes: usize) -> Result<Self> {
        let dependent = dependent.into();
        if modes == 0 {
            return Err(HarmonicError::InvalidArgument(
                "at least one harmonic mode is required".to_string(),
            ));
        }
        if names::generated(modes).contains(&dependent) {
            return Err(HarmonicError::InvalidArgument(format!(
                "dependent band '{}' clashes with a generated band name",
                dependent
            )));
        }
        if collection.is_empty() {
            return Err(HarmonicError::EmptyCollection);
        }
        for (index, image) in collection.iter().enumerate() {
            if image.timestamp().is_none() {
                return Err(HarmonicError::MissingTimestamp { index });
            }
            image.band(&dependent)?;
        }

        Ok(TimeSeries {
            collection,
            dependent,
            independent: Vec::new(),
            modes,
            built: false,
        })
    }

    pub fn collection(&self) -> &ImageCollection {
        &self.collection
    }

    pub fn dependent(&self) -> &str {
        &self.dependent
    }

    pub fn independent(&self) -> &[String] {
        &self.independent
    }

    pub fn modes(&self) -> usize {
        self.modes
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Record regressor names, skipping any already registered.
    pub fn register_independent(&mut self, regressors: impl Into<Regressors>) -> Result<()> {
        let names = match regressors.into() {
            Regressors::Name(name) => vec![name],
            Regressors::Names(names) if names.is_empty() => {
                return Err(HarmonicError::InvalidArgument(
                    "independent variable list is empty".to_string(),
                ))
            }
            Regressors::Names(names) => names,
        };
        if names.iter().any(|name| name.trim().is_empty()) {
            return Err(HarmonicError::InvalidArgument(
                "independent variable names must not be blank".to_string(),
            ));
        }
        for name in names {
            if !self.independent.contains(&name) {
                self.independent.push(name);
            }
        }
        Ok(())
    }

    /// Add a band of ones named `constant`.
    pub fn add_constant(mut self) -> Result<Self> {
        self.collection = self.collection.map(|image| {
            image
                .clone()
                .with_band(names::CONSTANT, Array2::from_elem(image.shape(), 1.0))
        })?;
        self.register_independent(names::CONSTANT)?;
        Ok(self)
    }

    /// Add `t = 2π · (fractional years since 1970-01-01)` from each image's
    /// own timestamp.
    pub fn add_time(mut self) -> Result<Self> {
        let images = self
            .collection
            .iter()
            .enumerate()
            .map(|(index, image)| {
                let timestamp = image
                    .timestamp()
                    .ok_or(HarmonicError::MissingTimestamp { index })?;
                let t = 2.0 * PI * fractional_years_since_epoch(timestamp)?;
                image
                    .clone()
                    .with_band(names::TIME, Array2::from_elem(image.shape(), t))
            })
            .collect::<Result<Vec<_>>>()?;
        self.collection = ImageCollection::new(images)?;
        self.register_independent(names::TIME)?;
        Ok(self)
    }

    /// Add `cos_k = cos(k·t)` and `sin_k = sin(k·t)` for every mode.
    /// Requires the `t` band.
    pub fn add_harmonics(mut self) -> Result<Self> {
        let cos = names::per_mode("cos", self.modes);
        let sin = names::per_mode("sin", self.modes);
        let modes = self.modes;

        self.collection = self.collection.map(|image| {
            let t = image.band(names::TIME)?;
            let mut image = image.clone();
            for k in 1..=modes {
                let freq = k as f64;
                image = image.with_band(names::cos(k), t.mapv(|t| (t * freq).cos()))?;
            }
            for k in 1..=modes {
                let freq = k as f64;
                image = image.with_band(names::sin(k), t.mapv(|t| (t * freq).sin()))?;
            }
            Ok(image)
        })?;
        self.register_independent(cos)?;
        self.register_independent(sin)?;
        Ok(self)
    }

    /// Constant, then time, then harmonics. A series builds once.
    pub fn build(self) -> Result<Self> {
        if self.built {
            return Err(HarmonicError::AlreadyBuilt);
        }
        let mut series = self.add_constant()?.add_time()?.add_harmonics()?;
        series.built = true;
        debug!(
            images = series.collection.len(),
            modes = series.modes,
            regressors = ?series.independent,
            "built harmonic basis"
        );
        Ok(series)
    }

    pub(crate) fn with_collection(mut self, collection: ImageCollection) -> Self {
        self.collection = collection;
        self
    }
}

/// Whole calendar years since 1970 plus the elapsed fraction of the
/// current year.
pub fn fractional_years_since_epoch(timestamp: DateTime<Utc>) -> Result<f64> {
    let year = timestamp.year();
    let start = year_start(year)?;
    let next = year_start(year + 1)?;
    let elapsed = (timestamp - start).num_milliseconds() as f64;
    let length = (next - start).num_milliseconds() as f64;
    Ok((year - 1970) as f64 + elapsed / length)
}

fn year_start(year: i32) -> Result<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| HarmonicError::InvalidArgument(format!("year {} is out of range", year)))
}
