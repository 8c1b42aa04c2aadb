//! In-memory raster images with named bands.
//!
//! An [`Image`] is an ordered list of named `Array2<f64>` layers sharing one
//! `(rows, cols)` shape. `NaN` marks a masked pixel; every reducer in the
//! crate skips it. Operations return new images rather than mutating pixels
//! that another stage may still hold.

use chrono::{DateTime, Utc};
use ndarray::Array2;
use regex::Regex;

use crate::error::{HarmonicError, Result};

/// One named raster layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub name: String,
    pub data: Array2<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    shape: (usize, usize),
    timestamp: Option<DateTime<Utc>>,
    bands: Vec<Band>,
}

impl Image {
    /// Empty image of the given `(rows, cols)` shape.
    pub fn new(shape: (usize, usize)) -> Self {
        Image {
            shape,
            timestamp: None,
            bands: Vec::new(),
        }
    }

    /// Build an image from parallel lists of names and rasters.
    pub fn from_bands<S: Into<String>>(names: Vec<S>, arrays: Vec<Array2<f64>>) -> Result<Self> {
        if names.len() != arrays.len() {
            return Err(HarmonicError::InvalidArgument(format!(
                "{} band names for {} rasters",
                names.len(),
                arrays.len()
            )));
        }
        let shape = arrays.first().map(|a| a.dim()).ok_or_else(|| {
            HarmonicError::InvalidArgument("an image needs at least one band".to_string())
        })?;

        let mut image = Image::new(shape);
        for (name, data) in names.into_iter().zip(arrays) {
            image = image.with_band(name, data)?;
        }
        Ok(image)
    }

    /// Single-band image filled with `value`.
    pub fn constant(shape: (usize, usize), name: impl Into<String>, value: f64) -> Self {
        Image {
            shape,
            timestamp: None,
            bands: vec![Band {
                name: name.into(),
                data: Array2::from_elem(shape, value),
            }],
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|b| b.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bands.iter().any(|b| b.name == name)
    }

    /// Raster of the band called exactly `name`.
    pub fn band(&self, name: &str) -> Result<&Array2<f64>> {
        self.bands
            .iter()
            .find(|b| b.name == name)
            .map(|b| &b.data)
            .ok_or_else(|| HarmonicError::missing_band(name))
    }

    /// Add a band. A band with the same name is overwritten in place.
    pub fn with_band(mut self, name: impl Into<String>, data: Array2<f64>) -> Result<Self> {
        if data.dim() != self.shape {
            return Err(HarmonicError::ShapeMismatch {
                expected: self.shape,
                found: data.dim(),
            });
        }
        let name = name.into();
        match self.bands.iter_mut().find(|b| b.name == name) {
            Some(existing) => existing.data = data,
            None => self.bands.push(Band { name, data }),
        }
        Ok(self)
    }

    /// Add every band of `other`, keeping this image's timestamp.
    pub fn add_bands(self, other: &Image) -> Result<Self> {
        other
            .bands
            .iter()
            .try_fold(self, |image, band| image.with_band(band.name.clone(), band.data.clone()))
    }

    /// Concatenate images into one; the first image's timestamp is kept.
    pub fn cat(images: &[Image]) -> Result<Self> {
        let (first, rest) = images.split_first().ok_or(HarmonicError::EmptyCollection)?;
        rest.iter()
            .try_fold(first.clone(), |image, other| image.add_bands(other))
    }

    /// Bands whose whole name matches the regular expression `pattern`,
    /// in this image's band order.
    pub fn select(&self, pattern: &str) -> Result<Image> {
        let re = Regex::new(&format!("^(?:{})$", pattern))?;
        let bands: Vec<Band> = self
            .bands
            .iter()
            .filter(|b| re.is_match(&b.name))
            .cloned()
            .collect();
        if bands.is_empty() {
            return Err(HarmonicError::missing_band(pattern));
        }
        Ok(Image {
            shape: self.shape,
            timestamp: self.timestamp,
            bands,
        })
    }

    /// Bands by exact name, in the order given.
    pub fn select_names<S: AsRef<str>>(&self, names: &[S]) -> Result<Image> {
        let bands = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.band(name).map(|data| Band {
                    name: name.to_string(),
                    data: data.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Image {
            shape: self.shape,
            timestamp: self.timestamp,
            bands,
        })
    }

    pub fn rename<S: Into<String>>(mut self, names: Vec<S>) -> Result<Self> {
        if names.len() != self.bands.len() {
            return Err(HarmonicError::InvalidArgument(format!(
                "cannot rename {} bands with {} names",
                self.bands.len(),
                names.len()
            )));
        }
        for (band, name) in self.bands.iter_mut().zip(names) {
            band.name = name.into();
        }
        Ok(self)
    }

    /// Minimum and maximum of the unmasked pixels, `None` if all are masked.
    pub fn band_min_max(&self, name: &str) -> Result<Option<(f64, f64)>> {
        Ok(nan_min_max(self.band(name)?))
    }

    /// Linearly map each band's own min/max onto `[low, high]`.
    ///
    /// A band with a single distinct value maps to the midpoint of the range.
    /// Masked pixels stay masked.
    pub fn unit_scale(&self, low: f64, high: f64) -> Result<Image> {
        if !(low < high) {
            return Err(HarmonicError::InvalidArgument(format!(
                "unit scale range [{}, {}] is empty",
                low, high
            )));
        }
        let bands = self
            .bands
            .iter()
            .map(|band| {
                let data = match nan_min_max(&band.data) {
                    Some((min, max)) if max > min => band
                        .data
                        .mapv(|v| (low + (v - min) / (max - min) * (high - low)).clamp(low, high)),
                    Some(_) => band
                        .data
                        .mapv(|v| if v.is_nan() { v } else { (low + high) / 2.0 }),
                    None => band.data.clone(),
                };
                Band {
                    name: band.name.clone(),
                    data,
                }
            })
            .collect();
        Ok(Image {
            shape: self.shape,
            timestamp: self.timestamp,
            bands,
        })
    }
}

fn nan_min_max(data: &Array2<f64>) -> Option<(f64, f64)> {
    data.iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
