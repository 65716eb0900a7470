//! Greedy spatial clustering of exposures into sky fields.

use crate::catalog::{FieldId, ImageId, ImageRecord};
use crate::coords::Equatorial;

/// One record's field assignment, as produced by a [`FieldAssigner`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldAssignment {
    /// Record being assigned.
    pub image: ImageId,
    /// Field the record joins.
    pub field: FieldId,
    /// Reference coordinate of that field, fixed when the field was created.
    pub reference: Equatorial,
}

/// Strategy interface for grouping the records of one partition into
/// fields. The greedy threshold algorithm is the default; a globally
/// optimal clustering could be substituted here without touching callers.
pub trait FieldAssigner {
    /// Assign a field to every record. `records` must all belong to a
    /// single partition and be sorted by ascending observation time. The
    /// ordering is a determinism requirement, not a correctness one, and
    /// the catalog's partition listing already provides it.
    ///
    /// Every record receives an assignment; there is no rejection path.
    fn assign(&self, records: &[&ImageRecord], radius_deg: f64) -> Vec<FieldAssignment>;
}

/// Nearest-reference threshold clustering.
///
/// Fields are created on first use: each record joins the existing field
/// whose reference coordinate is nearest, provided that separation is
/// strictly below `radius_deg`; otherwise the record opens a new field with
/// its own coordinate as the reference. References never move once set.
///
/// The result is greedy and order-sensitive, not globally optimal: a record
/// may end up in an earlier field even though a field created later sits
/// closer. That is the intended behavior, kept for compatibility with the
/// survey grouping this reimplements. Complexity is O(n·f) with f bounded
/// by n.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedyFieldAssigner;

impl FieldAssigner for GreedyFieldAssigner {
    fn assign(&self, records: &[&ImageRecord], radius_deg: f64) -> Vec<FieldAssignment> {
        // Field references, index order = creation order; FieldId is index + 1.
        let mut references: Vec<Equatorial> = Vec::new();
        let mut out = Vec::with_capacity(records.len());

        for rec in records {
            let coord = rec.coord();
            let mut best: Option<(usize, f64)> = None;
            for (idx, reference) in references.iter().enumerate() {
                let sep = coord.separation_deg(reference);
                if sep < radius_deg && best.map_or(true, |(_, s)| sep < s) {
                    best = Some((idx, sep));
                }
            }

            let idx = match best {
                Some((idx, _)) => idx,
                None => {
                    references.push(coord);
                    references.len() - 1
                }
            };

            out.push(FieldAssignment {
                image: rec.id(),
                field: FieldId(idx as u32 + 1),
                reference: references[idx],
            });
        }

        out
    }
}
