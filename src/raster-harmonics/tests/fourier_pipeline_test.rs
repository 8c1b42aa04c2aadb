//! End-to-end checks of the Fourier composite pipeline on synthetic series.

use std::collections::BTreeSet;
use std::f64::consts::PI;

use chrono::{TimeZone, Utc};
use ndarray::Array2;
use raster_harmonics::{
    compute_fourier_transform, sample_points, FourierTransform, HarmonicError, Image,
    ImageCollection, LinearRegression, SamplePoint, TimeSeries,
};

const SHAPE: (usize, usize) = (4, 5);

/// Twelve monthly images with B1..B3; B3 carries a seasonal signal whose
/// level, amplitude and phase vary across the raster.
fn monthly_series() -> ImageCollection {
    let images = (0..12u32)
        .map(|m| {
            let season = 2.0 * PI * m as f64 / 12.0;
            let b1 = Array2::from_shape_fn(SHAPE, |(r, c)| 0.05 + 0.01 * (r + c) as f64);
            let b2 = Array2::from_elem(SHAPE, 0.1 + 0.001 * m as f64);
            let b3 = Array2::from_shape_fn(SHAPE, |(r, c)| {
                let amp = 0.1 + 0.05 * r as f64;
                let shift = 0.3 * c as f64;
                let baseline = 0.4 + 0.01 * (r * SHAPE.1 + c) as f64;
                baseline + amp * (season + shift).cos() + 0.02 * (2.0 * season).sin()
            });
            Image::from_bands(vec!["B1", "B2", "B3"], vec![b1, b2, b3])
                .unwrap()
                .with_timestamp(Utc.with_ymd_and_hms(2021, m + 1, 1, 0, 0, 0).unwrap())
        })
        .collect();
    ImageCollection::new(images).unwrap()
}

#[test]
fn test_composite_band_set() {
    let composite = compute_fourier_transform(monthly_series(), "B3", 3).unwrap();

    let expected: BTreeSet<&str> = [
        "B3",
        "constant_coef",
        "t_coef",
        "cos_1_coef",
        "sin_1_coef",
        "cos_2_coef",
        "sin_2_coef",
        "cos_3_coef",
        "sin_3_coef",
        "phase_1",
        "amp_1",
        "phase_2",
        "amp_2",
        "phase_3",
        "amp_3",
    ]
    .into_iter()
    .collect();
    let actual: BTreeSet<&str> = composite.band_names().into_iter().collect();
    assert_eq!(composite.len(), 15);
    assert_eq!(actual, expected);
}

#[test]
fn test_composite_values_are_unit_scaled() {
    let composite = compute_fourier_transform(monthly_series(), "B3", 3).unwrap();
    assert_eq!(composite.shape(), SHAPE);

    for name in composite.band_names() {
        let (min, max) = composite
            .band_min_max(name)
            .unwrap()
            .expect("every band has unmasked pixels");
        assert!(min >= -1.0 && max <= 1.0, "{} spans [{}, {}]", name, min, max);
    }

    // bands that vary across the raster hit both ends of the range
    for name in ["B3", "amp_1", "phase_1"] {
        assert_eq!(composite.band_min_max(name).unwrap(), Some((-1.0, 1.0)), "{}", name);
    }
}

#[test]
fn test_amplitude_tracks_signal_strength() {
    let composite = compute_fourier_transform(monthly_series(), "B3", 3).unwrap();
    let amp = composite.band("amp_1").unwrap();
    // the seasonal amplitude grows with the row index
    for c in 0..SHAPE.1 {
        for r in 1..SHAPE.0 {
            assert!(amp[[r, c]] > amp[[r - 1, c]]);
        }
    }
}

#[test]
fn test_stepwise_pipeline_matches_entry_point() {
    let series = TimeSeries::new(monthly_series(), "B3", 2).unwrap().build().unwrap();
    let trend = LinearRegression::fit(&series).unwrap();
    assert_eq!(trend.get_coefficients().unwrap().len(), 2 + 2 * 2);

    let stepwise = FourierTransform::new(series, trend).compute().unwrap();
    let direct = compute_fourier_transform(monthly_series(), "B3", 2).unwrap();
    assert_eq!(stepwise, direct);
}

#[test]
fn test_missing_dependent_fails_before_fitting() {
    let err = compute_fourier_transform(monthly_series(), "B8", 3).unwrap_err();
    assert!(matches!(err, HarmonicError::MissingBand { pattern } if pattern == "B8"));
}

#[test]
fn test_too_few_images_is_underdetermined() {
    let short = ImageCollection::new(monthly_series().images()[..5].to_vec()).unwrap();
    let err = compute_fourier_transform(short, "B3", 3).unwrap_err();
    assert!(matches!(
        err,
        HarmonicError::UnderdeterminedRegression {
            samples: 5,
            regressors: 8
        }
    ));
}

#[test]
fn test_composite_feeds_point_sampling() {
    let composite = compute_fourier_transform(monthly_series(), "B3", 1).unwrap();
    let points = [
        SamplePoint { row: 0, col: 0, label: 1 },
        SamplePoint { row: 3, col: 4, label: 2 },
    ];
    let dataset = sample_points(&composite, &points).unwrap();
    assert_eq!(dataset.records().dim(), (2, composite.len()));
    assert_eq!(dataset.targets().to_vec(), vec![1, 2]);
}
