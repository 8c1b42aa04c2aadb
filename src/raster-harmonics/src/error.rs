use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarmonicError>;

#[derive(Error, Debug)]
pub enum HarmonicError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No band matches '{pattern}'")]
    MissingBand { pattern: String },

    #[error("Raster shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Band lists differ across the collection: {expected:?} vs {found:?}")]
    BandMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Image collection is empty")]
    EmptyCollection,

    #[error("Image {index} has no acquisition timestamp")]
    MissingTimestamp { index: usize },

    #[error("Harmonic basis has already been built")]
    AlreadyBuilt,

    #[error("Regression is under-determined: {samples} images for {regressors} regressors")]
    UnderdeterminedRegression { samples: usize, regressors: usize },

    #[error("Sample point ({row}, {col}) lies outside a {rows}x{cols} raster")]
    PointOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Unsupported pixel format in TIFF")]
    UnsupportedPixelFormat,

    #[error("TIFF decoding error: {0}")]
    DecodeError(#[from] tiff::TiffError),

    #[error("Shape mismatch or conversion error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),

    #[error("Invalid band pattern: {0}")]
    PatternError(#[from] regex::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl HarmonicError {
    pub(crate) fn missing_band(pattern: impl Into<String>) -> Self {
        HarmonicError::MissingBand {
            pattern: pattern.into(),
        }
    }
}
