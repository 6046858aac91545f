//! Nearest-neighbour pairing of reference points with comparison points.

use rstar::primitives::GeomWithData;
use rstar::RTree;
use tracing::{debug, info};

use crate::config::PairingConfig;
use crate::model::{PairMatch, PairResult, RawRecord};
use crate::numeric::height_diff;

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// R-tree over one dataset's planar `(x, y)`, carrying the row index.
///
/// Rows with non-finite coordinates are left out of the tree.
pub struct PointIndex {
    tree: RTree<IndexedPoint>,
}

impl PointIndex {
    pub fn new(records: &[RawRecord]) -> Self {
        let items: Vec<IndexedPoint> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.x.is_finite() && r.y.is_finite())
            .map(|(i, r)| GeomWithData::new([r.x, r.y], i))
            .collect();
        Self {
            tree: RTree::bulk_load(items),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Nearest indexed row and its euclidean distance.
    ///
    /// With duplicate coordinates any of the coincident rows may be returned.
    pub fn nearest(&self, x: f64, y: f64) -> Option<(usize, f64)> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let query = [x, y];
        self.tree.nearest_neighbor(&query).map(|hit| {
            let [hx, hy] = *hit.geom();
            (hit.data, (hx - x).hypot(hy - y))
        })
    }
}

/// Pair one reference row against the comparison index.
///
/// `reverse` is the index over all reference rows; when given, the match
/// is only kept if no reference row lies strictly closer to the matched
/// comparison point than `reference` does.
pub fn pair_point(
    reference_index: usize,
    reference: &RawRecord,
    comparison: &[RawRecord],
    index: &PointIndex,
    reverse: Option<&PointIndex>,
    max_distance: f64,
    decimals: u32,
) -> PairResult {
    let unmatched = PairResult {
        reference_index,
        matched: None,
    };

    let Some((cmp_idx, distance)) = index.nearest(reference.x, reference.y) else {
        return unmatched;
    };
    if max_distance != 0.0 && distance > max_distance {
        return unmatched;
    }

    let candidate = &comparison[cmp_idx];
    if let Some(reverse) = reverse {
        match reverse.nearest(candidate.x, candidate.y) {
            Some((back_idx, back_distance)) if back_idx != reference_index && back_distance < distance => {
                debug!(
                    reference = %reference.id,
                    comparison = %candidate.id,
                    "pair rejected: comparison point is nearer another reference point"
                );
                return unmatched;
            }
            _ => {}
        }
    }

    PairResult {
        reference_index,
        matched: Some(PairMatch {
            id: candidate.id.clone(),
            x: candidate.x,
            y: candidate.y,
            h: candidate.h,
            distance,
            diff_h: height_diff(reference.h, candidate.h, decimals),
        }),
    }
}

/// Pair every reference row; the result is position-aligned with `reference`.
pub fn pair_all(
    reference: &[RawRecord],
    comparison: &[RawRecord],
    config: &PairingConfig,
    decimals: u32,
) -> Vec<PairResult> {
    let index = PointIndex::new(comparison);
    let reverse = config.reciprocal.then(|| PointIndex::new(reference));

    let results: Vec<PairResult> = reference
        .iter()
        .enumerate()
        .map(|(i, r)| {
            pair_point(
                i,
                r,
                comparison,
                &index,
                reverse.as_ref(),
                config.max_distance,
                decimals,
            )
        })
        .collect();

    let paired = results.iter().filter(|r| r.matched.is_some()).count();
    info!(
        reference = reference.len(),
        comparison = comparison.len(),
        paired,
        reciprocal = config.reciprocal,
        "pairing complete"
    );
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, x: f64, y: f64, h: Option<f64>) -> RawRecord {
        RawRecord {
            id: id.into(),
            x,
            y,
            h,
        }
    }

    fn cfg(max_distance: f64, reciprocal: bool) -> PairingConfig {
        PairingConfig {
            max_distance,
            reciprocal,
        }
    }

    #[test]
    fn pairs_within_bound() {
        let reference = vec![rec("r1", 100.0, 100.0, Some(10.0))];
        let comparison = vec![rec("c1", 100.3, 100.0, Some(10.5))];
        let out = pair_all(&reference, &comparison, &cfg(0.5, false), 1);

        let m = out[0].matched.as_ref().unwrap();
        assert_eq!(m.id, "c1");
        assert!((m.distance - 0.3).abs() < 1e-9);
        assert_eq!(m.diff_h, Some(-0.5));
    }

    #[test]
    fn rejects_beyond_bound() {
        let reference = vec![rec("r1", 100.0, 100.0, Some(10.0))];
        let comparison = vec![rec("c1", 101.0, 100.0, Some(10.5))];
        let out = pair_all(&reference, &comparison, &cfg(0.5, false), 1);
        assert_eq!(out[0].reference_index, 0);
        assert!(out[0].matched.is_none());
    }

    #[test]
    fn distance_equal_to_bound_is_accepted() {
        let reference = vec![rec("r1", 0.0, 0.0, Some(1.0))];
        let comparison = vec![rec("c1", 0.5, 0.0, Some(1.0))];
        let out = pair_all(&reference, &comparison, &cfg(0.5, false), 2);
        assert!(out[0].matched.is_some());
    }

    #[test]
    fn zero_bound_is_unbounded() {
        let reference = vec![rec("r1", 0.0, 0.0, Some(1.0))];
        let comparison = vec![rec("c1", 5_000.0, 5_000.0, Some(2.0))];
        let out = pair_all(&reference, &comparison, &cfg(0.0, false), 1);
        assert_eq!(out[0].matched.as_ref().unwrap().diff_h, Some(-1.0));
    }

    #[test]
    fn missing_height_pairs_without_diff() {
        let reference = vec![rec("r1", 0.0, 0.0, None)];
        let comparison = vec![rec("c1", 0.1, 0.0, Some(2.0))];
        let out = pair_all(&reference, &comparison, &cfg(1.0, false), 1);
        let m = out[0].matched.as_ref().unwrap();
        assert_eq!(m.diff_h, None);
    }

    #[test]
    fn equal_heights_give_positive_zero() {
        let reference = vec![rec("r1", 0.0, 0.0, Some(5.04))];
        let comparison = vec![rec("c1", 0.1, 0.0, Some(5.08))];
        let out = pair_all(&reference, &comparison, &cfg(1.0, false), 1);
        let diff = out[0].matched.as_ref().unwrap().diff_h.unwrap();
        assert_eq!(diff, 0.0);
        assert!(diff.is_sign_positive());
    }

    #[test]
    fn empty_comparison_pairs_nothing() {
        let reference = vec![rec("r1", 0.0, 0.0, Some(1.0))];
        let out = pair_all(&reference, &[], &cfg(0.0, false), 1);
        assert!(out[0].matched.is_none());
    }

    #[test]
    fn non_reciprocal_allows_shared_partner() {
        let reference = vec![
            rec("r1", 0.0, 0.0, Some(1.0)),
            rec("r2", 1.0, 0.0, Some(1.0)),
        ];
        let comparison = vec![rec("c1", 0.9, 0.0, Some(1.0))];
        let out = pair_all(&reference, &comparison, &cfg(0.0, false), 1);
        assert_eq!(out[0].matched.as_ref().unwrap().id, "c1");
        assert_eq!(out[1].matched.as_ref().unwrap().id, "c1");
    }

    #[test]
    fn reciprocal_keeps_only_mutual_nearest() {
        let reference = vec![
            rec("r1", 0.0, 0.0, Some(1.0)),
            rec("r2", 1.0, 0.0, Some(1.0)),
        ];
        let comparison = vec![rec("c1", 0.9, 0.0, Some(1.0))];
        let out = pair_all(&reference, &comparison, &cfg(0.0, true), 1);
        assert!(out[0].matched.is_none());
        assert_eq!(out[1].matched.as_ref().unwrap().id, "c1");
    }

    #[test]
    fn nearest_skips_non_finite_rows() {
        let records = vec![
            rec("bad", f64::NAN, 0.0, None),
            rec("good", 10.0, 10.0, None),
        ];
        let index = PointIndex::new(&records);
        assert!(!index.is_empty());
        let (i, d) = index.nearest(0.0, 0.0).unwrap();
        assert_eq!(i, 1);
        assert!((d - 200f64.sqrt()).abs() < 1e-9);
        assert_eq!(index.nearest(f64::NAN, 1.0), None);
    }
}
