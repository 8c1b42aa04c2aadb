//! GeoTIFF input, CSV manifests and tabular export.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use csv::{StringRecord, Writer};
use ndarray::Array2;
use tiff::decoder::{Decoder, DecodingResult};
use tracing::{debug, info};

use crate::collection::ImageCollection;
use crate::error::{HarmonicError, Result};
use crate::image::Image;
use crate::sampling::SamplePoint;

/// One acquisition listed in a manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    pub path: PathBuf,
    pub timestamp: DateTime<Utc>,
}

/// Decode every page of a TIFF as one band.
pub fn read_bands<P: AsRef<Path>>(path: P) -> Result<Vec<Array2<f64>>> {
    let file = File::open(path)?;
    let mut decoder = Decoder::new(file)?;
    let mut bands = Vec::new();

    loop {
        let (width, height) = decoder.dimensions()?;
        let shape = (height as usize, width as usize);
        let band = match decoder.read_image()? {
            DecodingResult::U8(buf) => to_band(shape, buf)?,
            DecodingResult::U16(buf) => to_band(shape, buf)?,
            DecodingResult::I16(buf) => to_band(shape, buf)?,
            DecodingResult::F32(buf) => to_band(shape, buf)?,
            DecodingResult::F64(buf) => to_band(shape, buf)?,
            _ => return Err(HarmonicError::UnsupportedPixelFormat),
        };
        bands.push(band);

        if decoder.more_images() {
            decoder.next_image()?;
        } else {
            break;
        }
    }

    Ok(bands)
}

fn to_band<T: Into<f64>>(shape: (usize, usize), buf: Vec<T>) -> Result<Array2<f64>> {
    Ok(Array2::from_shape_vec(
        shape,
        buf.into_iter().map(Into::into).collect(),
    )?)
}

/// Read a TIFF as an image with the given band names and acquisition time.
pub fn read_image<P: AsRef<Path>, S: AsRef<str>>(
    path: P,
    names: &[S],
    timestamp: DateTime<Utc>,
) -> Result<Image> {
    let bands = read_bands(&path)?;
    if bands.len() != names.len() {
        return Err(HarmonicError::InvalidArgument(format!(
            "{} has {} bands but {} names were given",
            path.as_ref().display(),
            bands.len(),
            names.len()
        )));
    }
    let names: Vec<&str> = names.iter().map(|n| n.as_ref()).collect();
    Ok(Image::from_bands(names, bands)?.with_timestamp(timestamp))
}

/// Read a `path,date` manifest. Relative paths resolve against the
/// manifest's directory.
pub fn read_manifest<P: AsRef<Path>>(path: P) -> Result<Vec<ManifestEntry>> {
    let path = path.as_ref();
    let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let path_col = column(&headers, "path")?;
    let date_col = column(&headers, "date")?;

    reader
        .records()
        .map(|record| -> Result<ManifestEntry> {
            let record = record?;
            let file = PathBuf::from(field(&record, path_col)?);
            Ok(ManifestEntry {
                path: if file.is_absolute() { file } else { base.join(file) },
                timestamp: parse_timestamp(field(&record, date_col)?)?,
            })
        })
        .collect()
}

/// Load every image listed in a manifest into one collection.
pub fn read_collection<P: AsRef<Path>, S: AsRef<str>>(manifest: P, names: &[S]) -> Result<ImageCollection> {
    let entries = read_manifest(manifest)?;
    let images = entries
        .iter()
        .map(|entry| {
            debug!(path = %entry.path.display(), timestamp = %entry.timestamp, "reading image");
            read_image(&entry.path, names, entry.timestamp)
        })
        .collect::<Result<Vec<_>>>()?;
    info!(images = images.len(), "loaded image collection");
    ImageCollection::new(images)
}

/// Read labelled `row,col,label` sample points.
pub fn read_sample_points<P: AsRef<Path>>(path: P) -> Result<Vec<SamplePoint>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let cols = [
        column(&headers, "row")?,
        column(&headers, "col")?,
        column(&headers, "label")?,
    ];

    reader
        .records()
        .map(|record| -> Result<SamplePoint> {
            let record = record?;
            let mut values = [0usize; 3];
            for (value, &col) in values.iter_mut().zip(&cols) {
                let raw = field(&record, col)?;
                *value = raw.trim().parse().map_err(|_| {
                    HarmonicError::InvalidArgument(format!("'{}' is not a pixel index or label", raw))
                })?;
            }
            Ok(SamplePoint {
                row: values[0],
                col: values[1],
                label: values[2],
            })
        })
        .collect()
}

/// RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| Utc.from_utc_datetime(&datetime))
        .ok_or_else(|| HarmonicError::InvalidArgument(format!("'{}' is not a date", raw)))
}

fn column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| HarmonicError::InvalidArgument(format!("CSV has no '{}' column", name)))
}

fn field(record: &StringRecord, index: usize) -> Result<&str> {
    record.get(index).ok_or_else(|| {
        HarmonicError::InvalidArgument(format!("CSV row is missing column {}", index))
    })
}

/// Pixels as rows (row-major), one column per band.
pub fn stack_bands(image: &Image) -> Array2<f64> {
    let (h, w) = image.shape();
    let mut out = Array2::<f64>::zeros((h * w, image.len()));
    for (i, band) in image.bands().iter().enumerate() {
        out.column_mut(i)
            .iter_mut()
            .zip(band.data.iter())
            .for_each(|(o, v)| *o = *v);
    }
    out
}

pub fn write_csv<P: AsRef<Path>, S: AsRef<str>>(data: &Array2<f64>, headers: &[S], path: P) -> Result<()> {
    if headers.len() != data.ncols() {
        return Err(HarmonicError::InvalidArgument(format!(
            "{} headers for {} columns",
            headers.len(),
            data.ncols()
        )));
    }
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record(headers.iter().map(|h| h.as_ref()))?;
    for row in data.rows() {
        wtr.write_record(row.iter().map(|v| v.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}
