//! FITS-header metadata source.
//!
//! Header-only reads: the grouping core never touches pixel data. The
//! timestamp is taken from `DATE-OBS` first and falls back to a raw `JD`
//! keyword; the pointing comes from the WCS reference value keywords
//! `CRVAL1`/`CRVAL2`. A file missing any of these is skipped with a
//! warning: fatal for that record only, never defaulted.

use std::fs;
use std::path::{Path, PathBuf};

use fitsio::FitsFile;
use log::warn;

use crate::catalog::{ImageMetadata, MetadataSource};
use crate::error::MetadataError;
use crate::io::date_obs_to_hours;

/// Metadata source scanning a directory of FITS images.
pub struct FitsDirSource {
    dir: PathBuf,
}

impl FitsDirSource {
    /// Source scanning the given directory (non-recursively).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl MetadataSource for FitsDirSource {
    fn load(&self) -> Result<Vec<ImageMetadata>, MetadataError> {
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("fits") | Some("fit") | Some("fts")
                )
            })
            .collect();
        // Directory order is filesystem-dependent; sort for determinism.
        paths.sort();

        let mut out = Vec::new();
        for path in paths {
            match read_header(&path) {
                Ok(meta) => out.push(meta),
                Err(e) => warn!("skipping {}: {e}", path.display()),
            }
        }
        Ok(out)
    }
}

/// Read the grouping metadata from one FITS primary header.
fn read_header(path: &Path) -> Result<ImageMetadata, MetadataError> {
    let filename = path.display().to_string();

    let mut fptr = FitsFile::open(path)?;
    let hdu = fptr.hdu(0)?;

    let telescope: String = hdu.read_key(&mut fptr, "TELESCOP")?;
    let instrument: String = hdu.read_key(&mut fptr, "INSTRUME")?;
    let filter: String = hdu.read_key(&mut fptr, "FILTER")?;

    let ra: f64 = hdu
        .read_key(&mut fptr, "CRVAL1")
        .map_err(|_| MetadataError::MissingCoordinate {
            filename: filename.clone(),
        })?;
    let dec: f64 = hdu
        .read_key(&mut fptr, "CRVAL2")
        .map_err(|_| MetadataError::MissingCoordinate {
            filename: filename.clone(),
        })?;

    let time_hours = match hdu.read_key::<String>(&mut fptr, "DATE-OBS") {
        Ok(date_obs) => date_obs_to_hours(&date_obs),
        Err(_) => None,
    };
    let time_hours = match time_hours {
        Some(hours) => hours,
        None => hdu
            .read_key::<f64>(&mut fptr, "JD")
            .map(|jd| jd * 24.0)
            .map_err(|_| MetadataError::MissingTimestamp {
                filename: filename.clone(),
            })?,
    };

    Ok(ImageMetadata {
        filename,
        telescope,
        instrument,
        filter,
        ra,
        dec,
        time_hours,
    })
}
