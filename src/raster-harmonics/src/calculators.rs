//! Per-pixel band calculators.
//!
//! Every calculator reads a fixed set of named input bands and writes one or
//! more named output bands. [`BandCalculator::compute`] returns only the
//! outputs, [`BandCalculator::apply`] returns the input image with the
//! outputs added.

use ndarray::{Array2, Zip};

use crate::error::{HarmonicError, Result};
use crate::image::Image;
use crate::names;

/// Landsat-8 tasseled cap transform, rows for brightness, greenness and
/// wetness over (blue, green, red, nir, swir1, swir2).
const TASSELED_CAP: [[f64; 6]; 3] = [
    [0.3029, 0.2786, 0.4733, 0.5599, 0.508, 0.1872],
    [-0.2941, -0.243, -0.5424, 0.7276, 0.0713, -0.1608],
    [0.1511, 0.1973, 0.3283, 0.3407, -0.7117, -0.4559],
];

const TASSELED_CAP_NAMES: [&str; 3] = ["brightness", "greenness", "wetness"];

const SAVI_SOIL_FACTOR: f64 = 0.5;

/// The six reflectance bands the tasseled cap transform needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TasseledCapBands {
    pub blue: String,
    pub green: String,
    pub red: String,
    pub nir: String,
    pub swir1: String,
    pub swir2: String,
}

impl TasseledCapBands {
    pub fn new(
        blue: impl Into<String>,
        green: impl Into<String>,
        red: impl Into<String>,
        nir: impl Into<String>,
        swir1: impl Into<String>,
        swir2: impl Into<String>,
    ) -> Result<Self> {
        let bands = TasseledCapBands {
            blue: blue.into(),
            green: green.into(),
            red: red.into(),
            nir: nir.into(),
            swir1: swir1.into(),
            swir2: swir2.into(),
        };
        if let Some(blank) = bands.ordered().iter().position(|name| name.trim().is_empty()) {
            return Err(HarmonicError::InvalidArgument(format!(
                "tasseled cap input {} has an empty band name",
                ["blue", "green", "red", "nir", "swir1", "swir2"][blank]
            )));
        }
        Ok(bands)
    }

    fn ordered(&self) -> [&str; 6] {
        [
            &self.blue,
            &self.green,
            &self.red,
            &self.nir,
            &self.swir1,
            &self.swir2,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BandCalculator {
    /// `(nir - red) / (nir + red)`
    Ndvi { nir: String, red: String, name: String },
    /// Soil-adjusted vegetation index with L = 0.5.
    Savi { nir: String, red: String, name: String },
    Ratio {
        numerator: String,
        denominator: String,
        name: String,
    },
    TasseledCap(TasseledCapBands),
    /// `atan2(sin_k_coef, cos_k_coef)` for harmonic mode `k`.
    Phase { mode: usize },
    /// `hypot(cos_k_coef, sin_k_coef)` for harmonic mode `k`.
    Amplitude { mode: usize },
}

impl BandCalculator {
    pub fn ndvi(nir: impl Into<String>, red: impl Into<String>) -> Self {
        BandCalculator::Ndvi {
            nir: nir.into(),
            red: red.into(),
            name: "NDVI".to_string(),
        }
    }

    pub fn savi(nir: impl Into<String>, red: impl Into<String>) -> Self {
        BandCalculator::Savi {
            nir: nir.into(),
            red: red.into(),
            name: "SAVI".to_string(),
        }
    }

    pub fn ratio(
        numerator: impl Into<String>,
        denominator: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        BandCalculator::Ratio {
            numerator: numerator.into(),
            denominator: denominator.into(),
            name: name.into(),
        }
    }

    pub fn phase(mode: usize) -> Self {
        BandCalculator::Phase { mode }
    }

    pub fn amplitude(mode: usize) -> Self {
        BandCalculator::Amplitude { mode }
    }

    /// Bands read from the input image, in evaluation order.
    pub fn inputs(&self) -> Vec<String> {
        match self {
            BandCalculator::Ndvi { nir, red, .. } | BandCalculator::Savi { nir, red, .. } => {
                vec![nir.clone(), red.clone()]
            }
            BandCalculator::Ratio {
                numerator,
                denominator,
                ..
            } => vec![numerator.clone(), denominator.clone()],
            BandCalculator::TasseledCap(bands) => {
                bands.ordered().iter().map(|b| b.to_string()).collect()
            }
            BandCalculator::Phase { mode } | BandCalculator::Amplitude { mode } => vec![
                names::coefficient(&names::cos(*mode)),
                names::coefficient(&names::sin(*mode)),
            ],
        }
    }

    pub fn output_names(&self) -> Vec<String> {
        match self {
            BandCalculator::Ndvi { name, .. }
            | BandCalculator::Savi { name, .. }
            | BandCalculator::Ratio { name, .. } => vec![name.clone()],
            BandCalculator::TasseledCap(_) => {
                TASSELED_CAP_NAMES.iter().map(|n| n.to_string()).collect()
            }
            BandCalculator::Phase { mode } => vec![names::phase(*mode)],
            BandCalculator::Amplitude { mode } => vec![names::amplitude(*mode)],
        }
    }

    /// Image holding only the calculated bands.
    pub fn compute(&self, image: &Image) -> Result<Image> {
        let inputs = self.inputs();
        let rasters = inputs
            .iter()
            .map(|name| image.band(name))
            .collect::<Result<Vec<_>>>()?;

        let outputs: Vec<Array2<f64>> = match self {
            BandCalculator::Ndvi { .. } => {
                vec![binary(rasters[0], rasters[1], |nir, red| (nir - red) / (nir + red))]
            }
            BandCalculator::Savi { .. } => vec![binary(rasters[0], rasters[1], |nir, red| {
                (nir - red) / (nir + red + SAVI_SOIL_FACTOR) * (1.0 + SAVI_SOIL_FACTOR)
            })],
            BandCalculator::Ratio { .. } => vec![binary(rasters[0], rasters[1], |num, den| num / den)],
            BandCalculator::TasseledCap(_) => TASSELED_CAP
                .iter()
                .map(|row| {
                    let mut out = Array2::zeros(image.shape());
                    for (coef, band) in row.iter().zip(&rasters) {
                        out.scaled_add(*coef, *band);
                    }
                    out
                })
                .collect(),
            BandCalculator::Phase { .. } => vec![binary(rasters[0], rasters[1], |cos, sin| sin.atan2(cos))],
            BandCalculator::Amplitude { .. } => {
                vec![binary(rasters[0], rasters[1], |cos, sin| cos.hypot(sin))]
            }
        };

        let mut result = Image::from_bands(self.output_names(), outputs)?;
        if let Some(timestamp) = image.timestamp() {
            result = result.with_timestamp(timestamp);
        }
        Ok(result)
    }

    /// `image` with the calculated bands added.
    pub fn apply(&self, image: Image) -> Result<Image> {
        let computed = self.compute(&image)?;
        image.add_bands(&computed)
    }
}

fn binary(a: &Array2<f64>, b: &Array2<f64>, f: impl Fn(f64, f64) -> f64) -> Array2<f64> {
    Zip::from(a).and(b).map_collect(|&x, &y| f(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn coefficients(mode: usize, cos: f64, sin: f64) -> Image {
        Image::from_bands(
            vec![
                names::coefficient(&names::cos(mode)),
                names::coefficient(&names::sin(mode)),
            ],
            vec![Array2::from_elem((2, 2), cos), Array2::from_elem((2, 2), sin)],
        )
        .unwrap()
    }

    #[test]
    fn test_amplitude_three_four_five() {
        for mode in 1..=3 {
            let out = BandCalculator::amplitude(mode)
                .compute(&coefficients(mode, 3.0, 4.0))
                .unwrap();
            let name = format!("amp_{}", mode);
            assert_eq!(out.band_names(), vec![name.as_str()]);
            assert_relative_eq!(out.band(&name).unwrap()[[1, 1]], 5.0);
        }
    }

    #[test]
    fn test_phase_uses_two_argument_arctangent() {
        let up = BandCalculator::phase(2).compute(&coefficients(2, 0.0, 1.0)).unwrap();
        assert_eq!(up.band_names(), vec!["phase_2"]);
        assert_relative_eq!(up.band("phase_2").unwrap()[[0, 0]], FRAC_PI_2);

        let back = BandCalculator::phase(2).compute(&coefficients(2, -1.0, 0.0)).unwrap();
        assert_relative_eq!(back.band("phase_2").unwrap()[[0, 0]], PI);
    }

    #[test]
    fn test_phase_reads_coefficient_bands_only() {
        let raw = Image::from_bands(
            vec!["cos_1", "sin_1"],
            vec![Array2::zeros((1, 1)), Array2::zeros((1, 1))],
        )
        .unwrap();
        let err = BandCalculator::phase(1).compute(&raw).unwrap_err();
        assert!(matches!(err, HarmonicError::MissingBand { pattern } if pattern == "cos_1_coef"));
    }

    #[test]
    fn test_vegetation_indices() {
        let image = Image::from_bands(
            vec!["B8", "B4"],
            vec![Array2::from_elem((1, 1), 0.5), Array2::from_elem((1, 1), 0.1)],
        )
        .unwrap();
        let ndvi = BandCalculator::ndvi("B8", "B4").compute(&image).unwrap();
        assert_relative_eq!(ndvi.band("NDVI").unwrap()[[0, 0]], 0.4 / 0.6, epsilon = 1e-12);

        let savi = BandCalculator::savi("B8", "B4").compute(&image).unwrap();
        assert_relative_eq!(savi.band("SAVI").unwrap()[[0, 0]], 0.4 / 1.1 * 1.5, epsilon = 1e-12);

        let with_ratio = BandCalculator::ratio("B8", "B4", "B8/B4").apply(image).unwrap();
        assert_eq!(with_ratio.band_names(), vec!["B8", "B4", "B8/B4"]);
        assert_relative_eq!(with_ratio.band("B8/B4").unwrap()[[0, 0]], 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tasseled_cap_components() {
        let bands = TasseledCapBands::new("b", "g", "r", "n", "s1", "s2").unwrap();
        let image = Image::from_bands(
            vec!["b", "g", "r", "n", "s1", "s2"],
            (0..6).map(|_| Array2::from_elem((1, 1), 1.0)).collect(),
        )
        .unwrap();
        let out = BandCalculator::TasseledCap(bands).compute(&image).unwrap();
        assert_eq!(out.band_names(), vec!["brightness", "greenness", "wetness"]);
        let expected: f64 = TASSELED_CAP[0].iter().sum();
        assert_relative_eq!(out.band("brightness").unwrap()[[0, 0]], expected, epsilon = 1e-12);
    }

    #[test]
    fn test_tasseled_cap_rejects_blank_band() {
        let err = TasseledCapBands::new("b", "g", "r", " ", "s1", "s2").unwrap_err();
        assert!(matches!(err, HarmonicError::InvalidArgument(msg) if msg.contains("nir")));
    }
}
