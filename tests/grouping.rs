//! End-to-end grouping scenarios over the public API.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use fieldstack::{
    group_catalog, GreedyFieldAssigner, GroupManifestWriter, GroupingConfig, ImageCatalog,
    ImageMetadata,
};

/// An arbitrary observation night, in hours (Julian Date x 24).
const T0: f64 = 2_459_447.0 * 24.0;

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

fn grouped(records: Vec<ImageMetadata>, radius_arcmin: f64, delta_t_hours: f64) -> ImageCatalog {
    let mut catalog = ImageCatalog::new();
    for record in records {
        catalog.insert(record).unwrap();
    }
    let config = GroupingConfig {
        radius_arcmin,
        delta_t_hours,
    };
    group_catalog(&mut catalog, &config, &GreedyFieldAssigner);
    catalog
}

#[test]
fn three_close_images_form_one_field_and_one_epoch() {
    // Three images within 0.1 degrees, ten minutes apart, grouped with a
    // 10 arcmin radius and a one hour epoch window.
    let catalog = grouped(
        vec![
            meta("a.fits", "R", 150.0, 20.0, T0),
            meta("b.fits", "R", 150.05, 20.02, T0 + 1.0 / 6.0),
            meta("c.fits", "R", 149.95, 19.98, T0 + 2.0 / 6.0),
        ],
        10.0,
        1.0,
    );

    for rec in catalog.records() {
        assert_eq!(rec.field().map(|f| f.0), Some(1));
        assert_eq!(rec.epoch().map(|e| e.0), Some(1));
        assert_eq!(
            rec.group_name(),
            Some("TCA_R_150000_20000_field_001_001")
        );
    }
}

#[test]
fn images_five_degrees_apart_form_two_fields() {
    let catalog = grouped(
        vec![
            meta("a.fits", "R", 150.0, 20.0, T0),
            meta("b.fits", "R", 155.0, 20.0, T0 + 0.1),
        ],
        60.0,
        1.0,
    );

    let fields: Vec<u32> = catalog
        .records()
        .iter()
        .map(|r| r.field().unwrap().0)
        .collect();
    assert_eq!(fields, [1, 2]);
}

#[test]
fn zero_thresholds_give_singleton_groups() {
    let catalog = grouped(
        vec![
            meta("a.fits", "R", 10.0, 0.0, T0),
            meta("b.fits", "R", 10.001, 0.0, T0 + 0.001),
            meta("c.fits", "R", 10.002, 0.0, T0 + 0.002),
        ],
        0.0,
        0.0,
    );

    let names: BTreeSet<&str> = catalog
        .records()
        .iter()
        .map(|r| r.group_name().unwrap())
        .collect();
    assert_eq!(names.len(), 3);
}

#[test]
fn grouping_is_deterministic() {
    let build = || {
        let mut rng = StdRng::seed_from_u64(7);
        let mut records = Vec::new();
        for i in 0..60 {
            records.push(meta(
                &format!("img{i:03}.fits"),
                if i % 2 == 0 { "R" } else { "V" },
                150.0 + rng.gen_range(-1.0..1.0),
                20.0 + rng.gen_range(-1.0..1.0),
                T0 + rng.gen_range(0.0..48.0),
            ));
        }
        grouped(records, 30.0, 2.0)
    };

    let a = build();
    let b = build();
    for (ra, rb) in a.records().iter().zip(b.records()) {
        assert_eq!(ra.field(), rb.field());
        assert_eq!(ra.epoch(), rb.epoch());
        assert_eq!(ra.group_name(), rb.group_name());
    }
}

#[test]
fn every_record_is_assigned_and_fields_partition_each_partition() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut records = Vec::new();
    for i in 0..80 {
        records.push(meta(
            &format!("img{i:03}.fits"),
            if i % 3 == 0 { "V" } else { "R" },
            200.0 + rng.gen_range(-3.0..3.0),
            -10.0 + rng.gen_range(-3.0..3.0),
            T0 + rng.gen_range(0.0..24.0),
        ));
    }
    let catalog = grouped(records, 30.0, 1.0);

    // Coverage: every record carries a full assignment.
    for rec in catalog.records() {
        assert!(rec.field().is_some(), "{} unassigned", rec.filename());
        assert!(rec.epoch().is_some());
        assert!(rec.field_reference().is_some());
        assert!(rec.group_name().is_some());
    }

    // Disjointness: within a partition, each record sits in exactly one
    // field, so the field member sets are pairwise disjoint and their
    // union is the partition.
    for (_, ids) in catalog.partitions() {
        let mut seen = BTreeSet::new();
        let mut by_field: BTreeMap<u32, usize> = BTreeMap::new();
        for id in &ids {
            assert!(seen.insert(*id));
            let field = catalog.record(*id).field().unwrap().0;
            *by_field.entry(field).or_default() += 1;
        }
        let total: usize = by_field.values().sum();
        assert_eq!(total, ids.len());
        // Field ids are contiguous from 1.
        let max = *by_field.keys().max().unwrap();
        assert_eq!(by_field.len() as u32, max);
    }
}

#[test]
fn members_stay_within_radius_of_their_field_reference() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut records = Vec::new();
    for i in 0..50 {
        records.push(meta(
            &format!("img{i:03}.fits"),
            "R",
            120.0 + rng.gen_range(-2.0..2.0),
            35.0 + rng.gen_range(-2.0..2.0),
            T0 + rng.gen_range(0.0..10.0),
        ));
    }
    let radius_arcmin = 45.0;
    let catalog = grouped(records, radius_arcmin, 1.0);

    for rec in catalog.records() {
        let reference = rec.field_reference().unwrap();
        let sep = rec.coord().separation_deg(&reference);
        assert!(
            sep < radius_arcmin / 60.0,
            "{}: {sep} deg from reference",
            rec.filename()
        );
    }
}

#[test]
fn epochs_are_contiguous_and_their_references_increase() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut records = Vec::new();
    for i in 0..40 {
        records.push(meta(
            &format!("img{i:03}.fits"),
            "R",
            10.0,
            5.0,
            T0 + rng.gen_range(0.0..30.0),
        ));
    }
    let delta_t = 1.5;
    let catalog = grouped(records, 10.0, delta_t);

    // Single pointing: one field, epochs split purely on time.
    let mut by_epoch: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for rec in catalog.records() {
        assert_eq!(rec.field().unwrap().0, 1);
        by_epoch
            .entry(rec.epoch().unwrap().0)
            .or_default()
            .push(rec.time_hours());
    }

    let max_epoch = *by_epoch.keys().max().unwrap();
    assert_eq!(by_epoch.len() as u32, max_epoch, "epoch ids must be gapless");

    let mut previous_reference = f64::NEG_INFINITY;
    for (_, times) in by_epoch {
        let reference = times.iter().cloned().fold(f64::INFINITY, f64::min);
        let last = times.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(last <= reference + delta_t);
        assert!(reference > previous_reference);
        previous_reference = reference;
    }
}

#[test]
fn manifests_list_members_in_time_order() {
    let catalog = grouped(
        vec![
            meta("late.fits", "R", 150.0, 20.0, T0 + 0.2),
            meta("early.fits", "R", 150.01, 20.0, T0),
            meta("middle.fits", "R", 150.02, 20.0, T0 + 0.1),
        ],
        10.0,
        1.0,
    );

    let dir = tempfile::tempdir().unwrap();
    let writer = GroupManifestWriter::new(dir.path()).unwrap();
    let lists = writer.write(&catalog).unwrap();
    assert_eq!(lists.len(), 1);

    let list = fs::read_to_string(&lists[0]).unwrap();
    let lines: Vec<&str> = list.lines().collect();
    assert_eq!(lines, ["early.fits", "middle.fits", "late.fits"]);

    let index = fs::read_to_string(dir.path().join("fields.slist")).unwrap();
    assert!(index.contains("TCA_R_150000_20000_field_001_001"));
}

#[test]
fn separate_epochs_get_separate_manifests() {
    let catalog = grouped(
        vec![
            meta("n1a.fits", "R", 150.0, 20.0, T0),
            meta("n1b.fits", "R", 150.0, 20.0, T0 + 0.5),
            meta("n2a.fits", "R", 150.0, 20.0, T0 + 24.0),
        ],
        10.0,
        1.0,
    );

    let dir = tempfile::tempdir().unwrap();
    let writer = GroupManifestWriter::new(dir.path()).unwrap();
    let lists = writer.write(&catalog).unwrap();
    assert_eq!(lists.len(), 2);

    let first = fs::read_to_string(&lists[0]).unwrap();
    let second = fs::read_to_string(&lists[1]).unwrap();
    assert_eq!(first.lines().count(), 2);
    assert_eq!(second.lines().count(), 1);
}
