//! Table I/O at the collaborator boundary: CSV metadata tables in, sky-cell
//! tables out. FITS header access lives in the `fits` submodule behind the
//! `fits` feature so the core builds without the native cfitsio library.

#[cfg(feature = "fits")]
pub mod fits;

use std::io::Write;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::catalog::{ImageMetadata, MetadataSource};
use crate::error::MetadataError;
use crate::grid::SkyCell;

/// Julian Date of the Unix epoch.
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Convert a FITS `DATE-OBS` value to an observation time in hours
/// (Julian Date × 24). Accepts `YYYY-MM-DDThh:mm:ss[.sss]` and a bare
/// `YYYY-MM-DD` (midnight).
pub fn date_obs_to_hours(value: &str) -> Option<f64> {
    let datetime = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN))
        })
        .ok()?;
    let jd = datetime.and_utc().timestamp_micros() as f64 / 86_400e6 + UNIX_EPOCH_JD;
    Some(jd * 24.0)
}

/// One row of the image metadata table. Either `date_obs` or `jd` must be
/// present; `date_obs` wins when both are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRow {
    /// Image filename.
    pub filename: String,
    /// Telescope name.
    pub telescope: String,
    /// Instrument name.
    pub instrument: String,
    /// Filter name.
    pub filter: String,
    /// Pointing right ascension, degrees.
    pub ra: f64,
    /// Pointing declination, degrees.
    pub dec: f64,
    /// Observation date string, ISO format.
    #[serde(default)]
    pub date_obs: Option<String>,
    /// Observation Julian Date.
    #[serde(default)]
    pub jd: Option<f64>,
}

impl TableRow {
    fn into_metadata(self) -> Result<ImageMetadata, MetadataError> {
        let from_date = self
            .date_obs
            .as_deref()
            .filter(|s| !s.is_empty())
            .and_then(date_obs_to_hours);
        let time_hours = from_date
            .or_else(|| self.jd.map(|jd| jd * 24.0))
            .ok_or(MetadataError::MissingTimestamp {
                filename: self.filename.clone(),
            })?;

        Ok(ImageMetadata {
            filename: self.filename,
            telescope: self.telescope,
            instrument: self.instrument,
            filter: self.filter,
            ra: self.ra,
            dec: self.dec,
            time_hours,
        })
    }
}

/// CSV-backed metadata source, one row per image.
pub struct TableSource {
    path: PathBuf,
}

impl TableSource {
    /// Source reading from the given table path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MetadataSource for TableSource {
    fn load(&self) -> Result<Vec<ImageMetadata>, MetadataError> {
        let table_error = |source| MetadataError::Table {
            path: self.path.clone(),
            source,
        };

        let mut reader = csv::Reader::from_path(&self.path).map_err(table_error)?;
        let mut out = Vec::new();
        for row in reader.deserialize::<TableRow>() {
            let row = row.map_err(table_error)?;
            match row.into_metadata() {
                Ok(meta) => out.push(meta),
                Err(e) => warn!("skipping row: {e}"),
            }
        }
        Ok(out)
    }
}

/// Write image metadata back out as a table readable by [`TableSource`].
pub fn write_metadata_table<W: Write>(
    records: &[ImageMetadata],
    writer: W,
) -> Result<(), csv::Error> {
    let mut table = csv::Writer::from_writer(writer);
    for meta in records {
        table.serialize(TableRow {
            filename: meta.filename.clone(),
            telescope: meta.telescope.clone(),
            instrument: meta.instrument.clone(),
            filter: meta.filter.clone(),
            ra: meta.ra,
            dec: meta.dec,
            date_obs: None,
            jd: Some(meta.time_hours / 24.0),
        })?;
    }
    table.flush()?;
    Ok(())
}

/// Sky-cell table row in the layout the tile-fetch pipeline consumes.
#[derive(Debug, Serialize)]
struct SkyCellRow {
    projcell_id: String,
    cell_id: String,
    #[serde(rename = "RA_min")]
    ra_min: f64,
    #[serde(rename = "RA_max")]
    ra_max: f64,
    dec_min: f64,
    dec_max: f64,
}

/// Write resolved sky cells as a CSV table.
pub fn write_skycell_table<W: Write>(cells: &[SkyCell], writer: W) -> Result<(), csv::Error> {
    let mut table = csv::Writer::from_writer(writer);
    for cell in cells {
        table.serialize(SkyCellRow {
            projcell_id: cell.cell_id(),
            cell_id: cell.sub_id(),
            ra_min: cell.ra_min,
            ra_max: cell.ra_max,
            dec_min: cell.dec_min,
            dec_max: cell.dec_max,
        })?;
    }
    table.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn date_obs_to_julian_hours_reference_epoch() {
        // J2000.0: 2000-01-01T12:00:00 UTC is JD 2451545.0 exactly.
        let hours = date_obs_to_hours("2000-01-01T12:00:00").unwrap();
        assert_relative_eq!(hours / 24.0, 2_451_545.0, epsilon = 1e-9);
    }

    #[test]
    fn date_obs_accepts_fractional_seconds_and_bare_dates() {
        let a = date_obs_to_hours("2021-08-21T05:28:11.5").unwrap();
        let b = date_obs_to_hours("2021-08-21T05:28:11").unwrap();
        assert_relative_eq!(a - b, 0.5 / 3600.0, epsilon = 1e-9);

        let midnight = date_obs_to_hours("2021-08-21").unwrap();
        assert_relative_eq!((midnight / 24.0).fract(), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn date_obs_rejects_garbage() {
        assert!(date_obs_to_hours("not a date").is_none());
    }

    #[test]
    fn table_rows_prefer_date_obs_over_jd() {
        let row = TableRow {
            filename: "a.fits".to_string(),
            telescope: "TCA".to_string(),
            instrument: "CCD".to_string(),
            filter: "R".to_string(),
            ra: 150.0,
            dec: 20.0,
            date_obs: Some("2000-01-01T12:00:00".to_string()),
            jd: Some(1.0),
        };
        let meta = row.into_metadata().unwrap();
        assert_relative_eq!(meta.time_hours / 24.0, 2_451_545.0, epsilon = 1e-9);
    }

    #[test]
    fn table_rows_without_any_timestamp_are_errors() {
        let row = TableRow {
            filename: "a.fits".to_string(),
            telescope: "TCA".to_string(),
            instrument: "CCD".to_string(),
            filter: "R".to_string(),
            ra: 150.0,
            dec: 20.0,
            date_obs: None,
            jd: None,
        };
        assert!(matches!(
            row.into_metadata(),
            Err(MetadataError::MissingTimestamp { .. })
        ));
    }

    #[test]
    fn metadata_table_round_trips_through_csv() {
        let records = vec![ImageMetadata {
            filename: "a.fits".to_string(),
            telescope: "TCA".to_string(),
            instrument: "CCD".to_string(),
            filter: "R".to_string(),
            ra: 150.0,
            dec: 20.0,
            time_hours: 2_451_545.0 * 24.0,
        }];

        let mut buffer = Vec::new();
        write_metadata_table(&records, &mut buffer).unwrap();

        let mut reader = csv::Reader::from_reader(buffer.as_slice());
        let row: TableRow = reader.deserialize().next().unwrap().unwrap();
        let meta = row.into_metadata().unwrap();
        assert_eq!(meta.filename, "a.fits");
        assert_relative_eq!(meta.time_hours, records[0].time_hours, epsilon = 1e-6);
    }
}
