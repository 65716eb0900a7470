//! Image metadata catalog: an arena of per-image records keyed by id,
//! partitioned by (telescope, instrument, filter).
//!
//! Records are immutable after creation apart from the grouping results
//! (field, epoch, group name), each of which is written exactly once by the
//! grouping pass. Records are never removed. All filtered views of the
//! catalog are expressed as id lists over the arena, not copies.

use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::coords::Equatorial;
use crate::error::MetadataError;

/// Arena index of a record within its [`ImageCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ImageId(pub u32);

/// Identifier of a sky field within one partition, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldId(pub u32);

/// Identifier of an observing epoch within one field, 1-based and
/// contiguous in time order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EpochId(pub u32);

/// The (telescope, instrument, filter) scope that clustering and epoch
/// partitioning operate within. Grouping never crosses partitions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionKey {
    /// Telescope name as read from the metadata source.
    pub telescope: String,
    /// Instrument name.
    pub instrument: String,
    /// Photometric filter name.
    pub filter: String,
}

/// Raw per-image metadata supplied by a collaborator source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// Image filename (kept verbatim; manifests echo it).
    pub filename: String,
    /// Telescope name.
    pub telescope: String,
    /// Instrument name.
    pub instrument: String,
    /// Filter name.
    pub filter: String,
    /// Pointing right ascension in degrees (ICRS).
    pub ra: f64,
    /// Pointing declination in degrees (ICRS).
    pub dec: f64,
    /// Observation time in hours (Julian Date × 24).
    pub time_hours: f64,
}

/// Source of image metadata. This is the narrow collaborator boundary for
/// header readers and table files; implementations skip records they cannot
/// produce usable metadata for (with a warning) rather than defaulting
/// values.
pub trait MetadataSource {
    /// Load all available image metadata.
    fn load(&self) -> Result<Vec<ImageMetadata>, MetadataError>;
}

/// One catalog row. Metadata is fixed at insertion; the grouping pass fills
/// in field, epoch, and group name exactly once each.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    id: ImageId,
    filename: String,
    telescope: String,
    instrument: String,
    filter: String,
    coord: Equatorial,
    time_hours: f64,
    field: Option<FieldId>,
    field_reference: Option<Equatorial>,
    epoch: Option<EpochId>,
    group: Option<String>,
}

impl ImageRecord {
    /// Arena id of this record.
    pub fn id(&self) -> ImageId {
        self.id
    }

    /// Image filename.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Telescope name.
    pub fn telescope(&self) -> &str {
        &self.telescope
    }

    /// Instrument name.
    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    /// Filter name.
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Pointing coordinate.
    pub fn coord(&self) -> Equatorial {
        self.coord
    }

    /// Observation time in hours (Julian Date × 24).
    pub fn time_hours(&self) -> f64 {
        self.time_hours
    }

    /// Assigned field, if grouping has run.
    pub fn field(&self) -> Option<FieldId> {
        self.field
    }

    /// Reference coordinate of the assigned field, fixed at field creation.
    pub fn field_reference(&self) -> Option<Equatorial> {
        self.field_reference
    }

    /// Assigned epoch, if grouping has run.
    pub fn epoch(&self) -> Option<EpochId> {
        self.epoch
    }

    /// Derived group name, if grouping has run.
    pub fn group_name(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// The partition this record clusters within.
    pub fn partition_key(&self) -> PartitionKey {
        PartitionKey {
            telescope: self.telescope.clone(),
            instrument: self.instrument.clone(),
            filter: self.filter.clone(),
        }
    }
}

/// In-memory table of all discovered images.
#[derive(Debug, Default)]
pub struct ImageCatalog {
    records: Vec<ImageRecord>,
}

impl ImageCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a metadata source. Records with non-finite
    /// metadata are skipped with a warning; a source-level failure aborts.
    pub fn from_source(source: &dyn MetadataSource) -> Result<Self, MetadataError> {
        let mut catalog = Self::new();
        for meta in source.load()? {
            if let Err(e) = catalog.insert(meta) {
                warn!("skipping record: {e}");
            }
        }
        Ok(catalog)
    }

    /// Insert one image. Rejects non-finite coordinates or timestamps so
    /// they can never propagate into clustering as valid values.
    pub fn insert(&mut self, meta: ImageMetadata) -> Result<ImageId, MetadataError> {
        if !meta.ra.is_finite() || !meta.dec.is_finite() {
            return Err(MetadataError::NonFinite {
                filename: meta.filename,
                quantity: "sky coordinate",
            });
        }
        if !meta.time_hours.is_finite() {
            return Err(MetadataError::NonFinite {
                filename: meta.filename,
                quantity: "observation time",
            });
        }

        let id = ImageId(self.records.len() as u32);
        self.records.push(ImageRecord {
            id,
            filename: meta.filename,
            telescope: meta.telescope,
            instrument: meta.instrument,
            filter: meta.filter,
            coord: Equatorial::from_degrees(meta.ra, meta.dec),
            time_hours: meta.time_hours,
            field: None,
            field_reference: None,
            epoch: None,
            group: None,
        });
        Ok(id)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the catalog holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    /// Look up a record by id.
    ///
    /// # Panics
    /// If `id` did not come from this catalog.
    pub fn record(&self, id: ImageId) -> &ImageRecord {
        &self.records[id.0 as usize]
    }

    /// Partition the catalog by (telescope, instrument, filter).
    ///
    /// Within each partition, ids are ordered by ascending observation time
    /// (ties broken by insertion order). This ordering is what makes the
    /// greedy clustering deterministic, so it is established here rather
    /// than left to callers.
    pub fn partitions(&self) -> BTreeMap<PartitionKey, Vec<ImageId>> {
        let mut map: BTreeMap<PartitionKey, Vec<ImageId>> = BTreeMap::new();
        for rec in &self.records {
            map.entry(rec.partition_key()).or_default().push(rec.id);
        }
        for ids in map.values_mut() {
            ids.sort_by(|a, b| {
                let ra = &self.records[a.0 as usize];
                let rb = &self.records[b.0 as usize];
                ra.time_hours
                    .total_cmp(&rb.time_hours)
                    .then(a.cmp(b))
            });
        }
        map
    }

    pub(crate) fn assign_field(&mut self, id: ImageId, field: FieldId, reference: Equatorial) {
        let rec = &mut self.records[id.0 as usize];
        debug_assert!(rec.field.is_none(), "field assigned twice for {id:?}");
        rec.field = Some(field);
        rec.field_reference = Some(reference);
    }

    pub(crate) fn assign_epoch(&mut self, id: ImageId, epoch: EpochId) {
        let rec = &mut self.records[id.0 as usize];
        debug_assert!(rec.epoch.is_none(), "epoch assigned twice for {id:?}");
        rec.epoch = Some(epoch);
    }

    pub(crate) fn assign_group(&mut self, id: ImageId, name: String) {
        let rec = &mut self.records[id.0 as usize];
        debug_assert!(rec.group.is_none(), "group assigned twice for {id:?}");
        rec.group = Some(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(filename: &str, filter: &str, ra: f64, dec: f64, time_hours: f64) -> ImageMetadata {
        ImageMetadata {
            filename: filename.to_string(),
            telescope: "TCA".to_string(),
            instrument: "CCD".to_string(),
            filter: filter.to_string(),
            ra,
            dec,
            time_hours,
        }
    }

    #[test]
    fn insert_rejects_non_finite_coordinate() {
        let mut catalog = ImageCatalog::new();
        let err = catalog
            .insert(meta("a.fits", "R", f64::NAN, 0.0, 1.0))
            .unwrap_err();
        assert!(matches!(err, MetadataError::NonFinite { .. }));
        assert!(catalog.is_empty());
    }

    #[test]
    fn insert_rejects_non_finite_time() {
        let mut catalog = ImageCatalog::new();
        let err = catalog
            .insert(meta("a.fits", "R", 10.0, 0.0, f64::INFINITY))
            .unwrap_err();
        assert!(matches!(err, MetadataError::NonFinite { .. }));
    }

    #[test]
    fn partitions_split_by_key_and_sort_by_time() {
        let mut catalog = ImageCatalog::new();
        catalog.insert(meta("b.fits", "R", 10.0, 0.0, 5.0)).unwrap();
        catalog.insert(meta("a.fits", "R", 10.0, 0.0, 3.0)).unwrap();
        catalog.insert(meta("c.fits", "V", 10.0, 0.0, 4.0)).unwrap();

        let parts = catalog.partitions();
        assert_eq!(parts.len(), 2);

        let r_key = PartitionKey {
            telescope: "TCA".to_string(),
            instrument: "CCD".to_string(),
            filter: "R".to_string(),
        };
        let ids = &parts[&r_key];
        let names: Vec<&str> = ids
            .iter()
            .map(|id| catalog.record(*id).filename())
            .collect();
        assert_eq!(names, ["a.fits", "b.fits"]);
    }
}
