use std::cmp::Ordering;

use tracing::debug;

use crate::config::ReconConfig;
use crate::lookup::{key_for, ElevationMap};
use crate::model::{GridOutput, PairResult, PointReport, RunSummary, SurveyPoint, TransformedPoint};
use crate::numeric::height_diff;

/// Assemble one report per reference point.
///
/// `transformed` and `elevations` are present only when the elevation
/// path ran; `pairs` only when a comparison dataset was paired. Both
/// slices are position-aligned with `points`.
pub fn build_reports(
    points: &[SurveyPoint],
    transformed: Option<&[TransformedPoint]>,
    elevations: Option<&ElevationMap>,
    pairs: Option<&[PairResult]>,
    config: &ReconConfig,
) -> Vec<PointReport> {
    let decimals = config.round_decimals;
    let tolerance = config.elevation.tolerance;

    let mut reports: Vec<PointReport> = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let projected = transformed.and_then(|t| t.get(i).copied().flatten());

            let elevation_h = match (elevations, key_for(&projected)) {
                (Some(map), Some(key)) => {
                    let h = map.get(&key).copied();
                    if h.is_none() {
                        debug!(id = %p.id, %key, "no elevation data");
                    }
                    h
                }
                (Some(_), None) => {
                    debug!(id = %p.id, "no transformed position, elevation skipped");
                    None
                }
                (None, _) => None,
            };

            let diff_h_elevation = height_diff(p.h, elevation_h, decimals);
            let accurate = match (tolerance, diff_h_elevation) {
                (Some(tol), Some(diff)) => Some(diff.abs() <= tol),
                _ => None,
            };

            let pair = pairs
                .and_then(|pairs| pairs.get(i))
                .and_then(|r| r.matched.clone());

            PointReport {
                id: p.id.clone(),
                x: p.x,
                y: p.y,
                h: p.h,
                zone: p.zone,
                transformed: projected,
                elevation_h,
                diff_h_elevation,
                accurate,
                pair,
            }
        })
        .collect();

    if elevations.is_some() {
        sort_by_discrepancy(&mut reports);
    }
    reports
}

/// Largest `|diff_h_elevation|` first, rows without a difference last.
/// Stable, so equal rows keep input order.
pub fn sort_by_discrepancy(reports: &mut [PointReport]) {
    reports.sort_by(|a, b| match (a.diff_h_elevation, b.diff_h_elevation) {
        (Some(x), Some(y)) => y.abs().total_cmp(&x.abs()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

pub fn compute_summary(reports: &[PointReport], grid: Option<&GridOutput>) -> RunSummary {
    let mut s = RunSummary {
        total_points: reports.len(),
        ..RunSummary::default()
    };
    for r in reports {
        if r.zone.is_none() {
            s.zone_indeterminate += 1;
        }
        if r.transformed.is_some() {
            s.transformed += 1;
        }
        if r.elevation_h.is_some() {
            s.elevation_resolved += 1;
        } else if r.transformed.is_some() {
            s.elevation_missing += 1;
        }
        if r.pair.is_some() {
            s.paired += 1;
        }
        match r.accurate {
            Some(true) => s.accurate += 1,
            Some(false) => s.inaccurate += 1,
            None => {}
        }
    }
    if let Some(grid) = grid {
        s.grid_centers = grid.centers;
        s.grid_winners = grid.assignments.len();
    }
    s
}
