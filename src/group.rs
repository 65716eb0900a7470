//! Catalog-level grouping driver: cluster each partition into fields,
//! split each field into epochs, and derive group names.
//!
//! Partitions are fully independent and are processed in parallel; results
//! are applied to the catalog sequentially in deterministic key order, and
//! all grouping state is committed to the catalog before any collaborator
//! (manifest writer, stacker) sees it.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::{EpochId, FieldId, ImageCatalog, ImageId, ImageRecord};
use crate::cluster::FieldAssigner;
use crate::coords::Equatorial;
use crate::epoch::partition_epochs;
use crate::manifest::group_name;

/// Grouping thresholds.
///
/// The field radius is taken in arcminutes, as operators supply it, and
/// converted to degrees at the clustering boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Field association radius in arcminutes.
    pub radius_arcmin: f64,
    /// Maximum epoch duration in hours.
    pub delta_t_hours: f64,
}

impl GroupingConfig {
    /// Field association radius in degrees.
    pub fn radius_deg(&self) -> f64 {
        self.radius_arcmin / 60.0
    }
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            radius_arcmin: 10.0,
            delta_t_hours: 1.0,
        }
    }
}

/// Run the full grouping pass over a catalog: fields, epochs, group names.
///
/// Every record ends up with exactly one field, one epoch, and one group
/// name within its partition. Calling this twice on the same catalog is a
/// logic error (assignments are write-once).
pub fn group_catalog(
    catalog: &mut ImageCatalog,
    config: &GroupingConfig,
    assigner: &(dyn FieldAssigner + Sync),
) {
    let partitions: Vec<Vec<ImageId>> = catalog.partitions().into_values().collect();

    let assignments: Vec<Vec<(ImageId, FieldId, Equatorial, EpochId)>> = {
        let catalog = &*catalog;
        partitions
            .par_iter()
            .map(|ids| group_partition(catalog, ids, config, assigner))
            .collect()
    };

    for partition in assignments {
        for (id, field, reference, epoch) in partition {
            catalog.assign_field(id, field, reference);
            catalog.assign_epoch(id, epoch);
        }
    }

    let names: Vec<(ImageId, String)> = catalog
        .records()
        .iter()
        .filter_map(|rec| {
            let field = rec.field()?;
            let epoch = rec.epoch()?;
            let reference = rec.field_reference()?;
            Some((
                rec.id(),
                group_name(rec.telescope(), rec.filter(), reference, field, epoch),
            ))
        })
        .collect();
    for (id, name) in names {
        catalog.assign_group(id, name);
    }
}

/// Cluster and epoch-partition the time-sorted records of one partition.
fn group_partition(
    catalog: &ImageCatalog,
    ids: &[ImageId],
    config: &GroupingConfig,
    assigner: &(dyn FieldAssigner + Sync),
) -> Vec<(ImageId, FieldId, Equatorial, EpochId)> {
    let records: Vec<&ImageRecord> = ids.iter().map(|id| catalog.record(*id)).collect();
    let fields = assigner.assign(&records, config.radius_deg());
    debug_assert_eq!(fields.len(), records.len());

    // Collect each field's members, preserving time order within the field.
    let mut members: BTreeMap<FieldId, Vec<usize>> = BTreeMap::new();
    for (idx, assignment) in fields.iter().enumerate() {
        members.entry(assignment.field).or_default().push(idx);
    }

    let mut out = Vec::with_capacity(records.len());
    for (field, idxs) in &members {
        let times: Vec<f64> = idxs.iter().map(|&i| records[i].time_hours()).collect();
        let epochs = partition_epochs(&times, config.delta_t_hours);
        for (&i, epoch) in idxs.iter().zip(epochs) {
            out.push((records[i].id(), *field, fields[i].reference, epoch));
        }
    }
    out
}
