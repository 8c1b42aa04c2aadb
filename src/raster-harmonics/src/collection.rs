//! Time-ordered sequences of images.

use ndarray::Array2;

use crate::error::{HarmonicError, Result};
use crate::image::Image;

#[derive(Debug, Clone, PartialEq)]
pub struct ImageCollection {
    images: Vec<Image>,
}

impl ImageCollection {
    /// Collect images, ordered by acquisition time. All images must share
    /// one raster shape.
    pub fn new(mut images: Vec<Image>) -> Result<Self> {
        if let Some(first) = images.first() {
            let expected = first.shape();
            if let Some(other) = images.iter().find(|image| image.shape() != expected) {
                return Err(HarmonicError::ShapeMismatch {
                    expected,
                    found: other.shape(),
                });
            }
        }
        images.sort_by_key(|image| image.timestamp());
        Ok(ImageCollection { images })
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Image> {
        self.images.iter()
    }

    pub fn shape(&self) -> Option<(usize, usize)> {
        self.images.first().map(|image| image.shape())
    }

    /// Apply `f` to every image, producing a new collection.
    pub fn map<F>(&self, f: F) -> Result<Self>
    where
        F: Fn(&Image) -> Result<Image>,
    {
        let images = self.images.iter().map(f).collect::<Result<Vec<_>>>()?;
        ImageCollection::new(images)
    }

    pub fn select(&self, pattern: &str) -> Result<Self> {
        self.map(|image| image.select(pattern))
    }

    pub fn select_names<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        self.map(|image| image.select_names(names))
    }

    /// Per-pixel, per-band median across time.
    ///
    /// Masked pixels are skipped; an even number of samples averages the two
    /// middle values and a pixel masked in every image stays masked.
    pub fn median(&self) -> Result<Image> {
        let first = self.images.first().ok_or(HarmonicError::EmptyCollection)?;
        let names: Vec<String> = first.band_names().iter().map(|n| n.to_string()).collect();
        for image in &self.images[1..] {
            if image.band_names() != first.band_names() {
                return Err(HarmonicError::BandMismatch {
                    expected: names,
                    found: image.band_names().iter().map(|n| n.to_string()).collect(),
                });
            }
        }

        let shape = first.shape();
        let mut reduced = Image::new(shape);
        for (b, name) in names.iter().enumerate() {
            let stack: Vec<&Array2<f64>> = self.images.iter().map(|image| &image.bands()[b].data).collect();
            let data = Array2::from_shape_fn(shape, |(r, c)| {
                let mut values: Vec<f64> = stack
                    .iter()
                    .map(|band| band[[r, c]])
                    .filter(|v| !v.is_nan())
                    .collect();
                median_of(&mut values)
            });
            reduced = reduced.with_band(name.clone(), data)?;
        }
        Ok(reduced)
    }
}

impl<'a> IntoIterator for &'a ImageCollection {
    type Item = &'a Image;
    type IntoIter = std::slice::Iter<'a, Image>;

    fn into_iter(self) -> Self::IntoIter {
        self.images.iter()
    }
}

fn median_of(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ndarray::array;

    fn stamped(value: f64, month: u32) -> Image {
        Image::constant((1, 2), "v", value)
            .with_timestamp(Utc.with_ymd_and_hms(2020, month, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_new_sorts_by_timestamp() {
        let collection = ImageCollection::new(vec![stamped(3.0, 3), stamped(1.0, 1), stamped(2.0, 2)]).unwrap();
        let firsts: Vec<f64> = collection.iter().map(|i| i.band("v").unwrap()[[0, 0]]).collect();
        assert_eq!(firsts, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_new_rejects_mixed_shapes() {
        let err = ImageCollection::new(vec![
            Image::constant((1, 2), "v", 0.0),
            Image::constant((2, 2), "v", 0.0),
        ])
        .unwrap_err();
        assert!(matches!(err, HarmonicError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_median_skips_masked_pixels() {
        let a = Image::from_bands(vec!["v"], vec![array![[1.0, f64::NAN, f64::NAN]]]).unwrap();
        let b = Image::from_bands(vec!["v"], vec![array![[5.0, 4.0, f64::NAN]]]).unwrap();
        let c = Image::from_bands(vec!["v"], vec![array![[3.0, 8.0, f64::NAN]]]).unwrap();
        let median = ImageCollection::new(vec![a, b, c]).unwrap().median().unwrap();
        let v = median.band("v").unwrap();
        assert_eq!(v[[0, 0]], 3.0);
        assert_eq!(v[[0, 1]], 6.0);
        assert!(v[[0, 2]].is_nan());
    }

    #[test]
    fn test_median_requires_matching_bands() {
        let collection = ImageCollection::new(vec![
            Image::constant((1, 1), "a", 0.0),
            Image::constant((1, 1), "b", 0.0),
        ])
        .unwrap();
        assert!(matches!(collection.median(), Err(HarmonicError::BandMismatch { .. })));
        assert!(matches!(
            ImageCollection::new(vec![]).unwrap().median(),
            Err(HarmonicError::EmptyCollection)
        ));
    }
}
