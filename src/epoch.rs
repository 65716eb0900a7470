//! Temporal partitioning of a field's exposures into observing epochs.

use crate::catalog::EpochId;

/// Assign contiguous 1-based epoch ids to a time-sorted series.
///
/// Single forward sweep: the first entry opens epoch 1 and becomes its
/// reference time; each later entry joins the current epoch while its time
/// is at most `delta_t_hours` past the reference, and otherwise starts the
/// next epoch and becomes the new reference. Earlier epochs are never
/// revisited or merged, so epochs are temporally non-overlapping and their
/// references strictly increase.
///
/// With `delta_t_hours = 0` every distinct timestamp gets its own epoch
/// (exactly equal timestamps still share one).
pub fn partition_epochs(times_hours: &[f64], delta_t_hours: f64) -> Vec<EpochId> {
    debug_assert!(
        times_hours.windows(2).all(|w| w[0] <= w[1]),
        "epoch partitioning requires ascending times"
    );

    let mut out = Vec::with_capacity(times_hours.len());
    let mut current = 0u32;
    let mut reference = 0.0f64;

    for &t in times_hours {
        if current == 0 || t > reference + delta_t_hours {
            current += 1;
            reference = t;
        }
        out.push(EpochId(current));
    }

    out
}
