//! Deterministic group naming and manifest output for the stacking stage.
//!
//! The stacking collaborator discovers its inputs and names its outputs
//! from these files, so the naming convention here is load-bearing: one
//! `<group>.list` per (field, epoch) group with member filenames in time
//! order, plus a `fields.slist` index of all group names.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::catalog::{EpochId, FieldId, ImageCatalog, ImageRecord};
use crate::coords::Equatorial;

/// Derive the deterministic group name for one (field, epoch) group.
///
/// Telescope and filter have blanks stripped; the field's reference
/// coordinate is rendered at a fixed three decimals with the decimal point
/// removed. Uniqueness follows from the (partition, field, epoch) key; the
/// coordinate fragment is redundancy for human readers sorting hundreds of
/// lists.
pub fn group_name(
    telescope: &str,
    filter: &str,
    reference: Equatorial,
    field: FieldId,
    epoch: EpochId,
) -> String {
    let tel = telescope.replace(' ', "");
    let band = filter.replace(' ', "");
    let ra = format!("{:.3}", reference.ra).replace('.', "");
    let dec = format!("{:.3}", reference.dec).replace('.', "");
    format!(
        "{tel}_{band}_{ra}_{dec}_field_{field:03}_{epoch:03}",
        field = field.0,
        epoch = epoch.0
    )
}

/// Writes stacking manifests for a grouped catalog.
pub struct GroupManifestWriter {
    dir: PathBuf,
}

impl GroupManifestWriter {
    /// Create the writer, making the output directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Write one list file per group plus the `fields.slist` index.
    ///
    /// Records that have not been grouped yet are ignored. Returns the
    /// paths of the written list files in group-name order.
    pub fn write(&self, catalog: &ImageCatalog) -> std::io::Result<Vec<PathBuf>> {
        let mut groups: BTreeMap<&str, Vec<&ImageRecord>> = BTreeMap::new();
        for rec in catalog.records() {
            if let Some(name) = rec.group_name() {
                groups.entry(name).or_default().push(rec);
            }
        }
        for members in groups.values_mut() {
            members.sort_by(|a, b| {
                a.time_hours()
                    .total_cmp(&b.time_hours())
                    .then(a.id().cmp(&b.id()))
            });
        }

        let mut index = BufWriter::new(File::create(self.dir.join("fields.slist"))?);
        let mut paths = Vec::with_capacity(groups.len());
        for (name, members) in &groups {
            let path = self.dir.join(format!("{name}.list"));
            let mut list = BufWriter::new(File::create(&path)?);
            for rec in members {
                writeln!(list, "{}", rec.filename())?;
            }
            list.flush()?;
            write!(index, "{name} ")?;
            info!("group {name}: {} member(s)", members.len());
            paths.push(path);
        }
        index.flush()?;
        Ok(paths)
    }
}
