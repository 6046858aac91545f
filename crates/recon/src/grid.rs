//! Hexagonal coverage of a scope polygon.
//!
//! Lattice centers are laid out with column spacing `d` and row spacing
//! `d·√3/2`, odd rows shifted by `-d/2`. Each center claims at most one
//! candidate within `d/2`; a claimed candidate never wins again.

use std::cmp::Ordering;

use geo::{Contains, Coord, LineString, Point, Polygon};
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use rstar::primitives::GeomWithData;
use rstar::RTree;
use tracing::info;

use crate::model::{GridAssignment, GridCandidate, GridOutput, HexCenter};

type IndexedCandidate = GeomWithData<[f64; 2], usize>;

fn scope_polygon(vertices: &[(f64, f64)]) -> Option<Polygon<f64>> {
    if vertices.len() < 3 {
        return None;
    }
    let ring: Vec<Coord<f64>> = vertices.iter().map(|&(x, y)| Coord { x, y }).collect();
    Some(Polygon::new(LineString::new(ring), vec![]))
}

fn bounds(vertices: &[(f64, f64)]) -> (f64, f64, f64, f64) {
    vertices.iter().fold(
        (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        |(min_x, min_y, max_x, max_y), &(x, y)| {
            (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
        },
    )
}

/// One family of rows (even or odd) of the lattice over the bounding box.
fn lattice_rows(
    (min_x, min_y, max_x, max_y): (f64, f64, f64, f64),
    dx: f64,
    dy: f64,
    odd: bool,
) -> Vec<HexCenter> {
    let mut out = Vec::new();
    let x_start = if odd { min_x - dx / 2.0 } else { min_x };
    let mut row: usize = if odd { 1 } else { 0 };
    loop {
        let y = min_y + row as f64 * dy;
        if y >= max_y + dy {
            break;
        }
        let mut col: usize = 0;
        loop {
            let x = x_start + col as f64 * dx;
            if x >= max_x + dx {
                break;
            }
            out.push(HexCenter { x, y });
            col += 1;
        }
        row += 2;
    }
    out
}

/// Lattice centers strictly inside the polygon, sorted by `(y, x)`.
///
/// Fewer than three vertices or a non-positive spacing yields no centers.
pub fn hex_centers(vertices: &[(f64, f64)], spacing: f64) -> Vec<HexCenter> {
    if !(spacing.is_finite() && spacing > 0.0) {
        return Vec::new();
    }
    let Some(polygon) = scope_polygon(vertices) else {
        return Vec::new();
    };
    let bbox = bounds(vertices);
    if !(bbox.0.is_finite() && bbox.1.is_finite() && bbox.2.is_finite() && bbox.3.is_finite()) {
        return Vec::new();
    }

    let dx = spacing;
    let dy = spacing * 3f64.sqrt() / 2.0;

    let mut candidates = lattice_rows(bbox, dx, dy, false);
    candidates.extend(lattice_rows(bbox, dx, dy, true));

    let mut centers: Vec<HexCenter> = candidates
        .into_par_iter()
        .filter(|c| polygon.contains(&Point::new(c.x, c.y)))
        .collect();
    centers.sort_by(|a, b| match a.y.total_cmp(&b.y) {
        Ordering::Equal => a.x.total_cmp(&b.x),
        other => other,
    });
    centers
}

/// Pick one winner per lattice center from `candidates`.
///
/// The winner minimises `(|height_a - height_b|, distance_to_center)`,
/// with the lower candidate index breaking exact ties.
pub fn select_grid_points(
    candidates: &[GridCandidate],
    vertices: &[(f64, f64)],
    spacing: f64,
) -> GridOutput {
    let centers = hex_centers(vertices, spacing);

    let items: Vec<IndexedCandidate> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.x.is_finite() && c.y.is_finite())
        .map(|(i, c)| GeomWithData::new([c.x, c.y], i))
        .collect();
    let tree = RTree::bulk_load(items);

    let radius = spacing / 2.0;
    let radius_sq = radius * radius;
    let mut claimed = vec![false; candidates.len()];
    let mut assignments = Vec::new();

    for center in &centers {
        let query = [center.x, center.y];
        let winner = tree
            .locate_within_distance(query, radius_sq)
            .filter(|hit| !claimed[hit.data])
            .map(|hit| {
                let [x, y] = *hit.geom();
                let distance = (x - center.x).hypot(y - center.y);
                let discrepancy = candidates[hit.data].discrepancy();
                (OrderedFloat(discrepancy), OrderedFloat(distance), hit.data)
            })
            .min();

        if let Some((discrepancy, distance, idx)) = winner {
            claimed[idx] = true;
            assignments.push(GridAssignment {
                center: *center,
                candidate: idx,
                id: candidates[idx].id.clone(),
                distance_to_center: distance.0,
                discrepancy: discrepancy.0,
            });
        }
    }

    info!(
        centers = centers.len(),
        candidates = candidates.len(),
        winners = assignments.len(),
        spacing,
        "grid coverage selected"
    );

    GridOutput {
        spacing,
        centers: centers.len(),
        assignments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn square(side: f64) -> Vec<(f64, f64)> {
        vec![(0.0, 0.0), (side, 0.0), (side, side), (0.0, side)]
    }

    fn cand(id: &str, x: f64, y: f64, a: f64, b: f64) -> GridCandidate {
        GridCandidate {
            id: id.into(),
            x,
            y,
            height_a: a,
            height_b: b,
        }
    }

    fn row_height(spacing: f64) -> f64 {
        spacing * 3f64.sqrt() / 2.0
    }

    #[test]
    fn unit_square_has_single_center() {
        let centers = hex_centers(&square(10.0), 10.0);
        assert_eq!(centers.len(), 1);
        assert_eq!(centers[0].x, 5.0);
        assert!((centers[0].y - 8.660_254).abs() < 1e-5);
    }

    #[test]
    fn boundary_centers_are_excluded() {
        let centers = hex_centers(&square(30.0), 10.0);
        assert!(centers
            .iter()
            .all(|c| c.x > 0.0 && c.x < 30.0 && c.y > 0.0 && c.y < 30.0));
        // rows at y = dy, 2dy, 3dy; odd rows 5/15/25, even row 10/20
        assert_eq!(centers.len(), 8);
    }

    #[test]
    fn centers_are_sorted_by_row_then_column() {
        let centers = hex_centers(&square(50.0), 7.0);
        for pair in centers.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            assert!(a.y < b.y || (a.y == b.y && a.x < b.x));
        }
    }

    #[test]
    fn degenerate_inputs_give_no_centers() {
        assert!(hex_centers(&[(0.0, 0.0), (1.0, 1.0)], 1.0).is_empty());
        assert!(hex_centers(&square(10.0), 0.0).is_empty());
        assert!(hex_centers(&square(10.0), -3.0).is_empty());
    }

    #[test]
    fn lowest_discrepancy_wins_even_if_farther() {
        let dy = row_height(10.0);
        let candidates = vec![
            cand("near", 5.0, dy, 10.0, 10.3),
            cand("far", 8.0, dy, 10.0, 10.05),
        ];
        let out = select_grid_points(&candidates, &square(10.0), 10.0);
        assert_eq!(out.centers, 1);
        assert_eq!(out.assignments.len(), 1);
        assert_eq!(out.assignments[0].id, "far");
        assert!((out.assignments[0].distance_to_center - 3.0).abs() < 1e-9);
    }

    #[test]
    fn equal_discrepancy_prefers_nearer() {
        let dy = row_height(10.0);
        let candidates = vec![
            cand("far", 8.0, dy, 1.0, 1.1),
            cand("near", 6.0, dy, 2.0, 2.1),
        ];
        let out = select_grid_points(&candidates, &square(10.0), 10.0);
        assert_eq!(out.assignments[0].id, "near");
    }

    #[test]
    fn winner_is_claimed_once() {
        let dy = row_height(10.0);
        // "shared" sits exactly d/2 from both (5, dy) and (15, dy)
        let candidates = vec![
            cand("shared", 10.0, dy, 1.0, 1.0),
            cand("other", 14.0, dy, 1.0, 3.0),
        ];
        let out = select_grid_points(&candidates, &square(30.0), 10.0);
        let ids: Vec<&str> = out.assignments.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["shared", "other"]);
        assert_eq!(out.assignments[0].center.x, 5.0);
        assert_eq!(out.assignments[1].center.x, 15.0);

        let mut winners: Vec<usize> = out.assignments.iter().map(|a| a.candidate).collect();
        winners.sort_unstable();
        winners.dedup();
        assert_eq!(winners.len(), out.assignments.len());
    }

    #[test]
    fn candidates_outside_radius_are_ignored() {
        let candidates = vec![cand("corner", 0.5, 0.5, 1.0, 1.0)];
        let out = select_grid_points(&candidates, &square(10.0), 10.0);
        assert_eq!(out.centers, 1);
        assert!(out.assignments.is_empty());
    }

    proptest! {
        #[test]
        fn every_candidate_wins_at_most_once(
            points in proptest::collection::vec((0.0f64..100.0, 0.0f64..100.0, -2.0f64..2.0), 0..80),
            spacing in 2.0f64..40.0,
        ) {
            let candidates: Vec<GridCandidate> = points
                .iter()
                .enumerate()
                .map(|(i, &(x, y, dh))| cand(&i.to_string(), x, y, 100.0 + dh, 100.0))
                .collect();
            let out = select_grid_points(&candidates, &square(100.0), spacing);

            prop_assert!(out.assignments.len() <= out.centers);
            let mut seen = vec![false; candidates.len()];
            for a in &out.assignments {
                prop_assert!(!seen[a.candidate], "candidate {} won twice", a.candidate);
                seen[a.candidate] = true;
                prop_assert!(a.distance_to_center <= spacing / 2.0 + 1e-9);
            }
        }
    }
}
