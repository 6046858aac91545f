use tracing::{info, warn};

use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::grid::select_grid_points;
use crate::input::polygon_records;
use crate::lookup::ElevationLookup;
use crate::model::{GridCandidate, RawRecord, RunMeta, RunResult};
use crate::numeric::round_to;
use crate::pairing::pair_all;
use crate::report::{build_reports, compute_summary};
use crate::transform::{dispatch, Reprojection};
use crate::zone::{ensure_same_zone, resolve_dataset};

/// Pre-loaded datasets for one run.
#[derive(Debug, Clone, Default)]
pub struct RunInput {
    pub reference: Vec<RawRecord>,
    pub comparison: Option<Vec<RawRecord>>,
    /// Scope polygon vertices, in the same axis order as `reference`.
    pub scope: Option<Vec<(f64, f64)>>,
}

fn rounded(records: &[RawRecord], decimals: u32) -> Vec<RawRecord> {
    records
        .iter()
        .map(|r| RawRecord {
            id: r.id.clone(),
            x: round_to(r.x, decimals),
            y: round_to(r.y, decimals),
            h: r.h.map(|h| round_to(h, decimals)),
        })
        .collect()
}

/// Round heights only; comparison coordinates feed the distance bound as-is.
fn rounded_heights(records: &[RawRecord], decimals: u32) -> Vec<RawRecord> {
    records
        .iter()
        .map(|r| RawRecord {
            h: r.h.map(|h| round_to(h, decimals)),
            ..r.clone()
        })
        .collect()
}

/// Run reconciliation per config. Returns per-point reports, summary and
/// the optional grid selection.
///
/// Per-point problems (unknown zone, failed reprojection, missing
/// elevation, no partner) degrade to absent values. Only configuration
/// and dataset boundary problems are errors.
pub fn run<R: Reprojection>(
    config: &ReconConfig,
    input: &RunInput,
    elevation: Option<&dyn ElevationLookup>,
    reprojection: &R,
) -> Result<RunResult, ReconError> {
    config.validate()?;
    let decimals = config.round_decimals;

    let reference = rounded(&input.reference, decimals);
    let points = resolve_dataset(&reference);
    info!(points = points.len(), mode = %config.mode, "reference resolved");

    let scope = match config.grid {
        Some(_) => {
            let vertices = input.scope.as_ref().ok_or_else(|| {
                ReconError::ConfigValidation("grid coverage requested but no scope polygon loaded".into())
            })?;
            let scope_points = resolve_dataset(&polygon_records(vertices));
            ensure_same_zone(&points, &scope_points)?;
            Some(vertices)
        }
        None => None,
    };

    // Elevation path
    let (transformed, elevations) = if config.mode.uses_elevation() {
        let lookup = elevation.ok_or_else(|| {
            ReconError::ConfigValidation(format!("mode '{}' requires an elevation lookup", config.mode))
        })?;
        let transformed = dispatch(&points, reprojection, &config.transform);
        let elevations = lookup.lookup(&transformed);
        info!(
            transformed = transformed.iter().filter(|t| t.is_some()).count(),
            resolved = elevations.len(),
            "elevation lookup complete"
        );
        (Some(transformed), Some(elevations))
    } else {
        (None, None)
    };

    // Second-file path
    let pairs = if config.mode.uses_comparison_file() {
        let comparison = input.comparison.as_ref().ok_or_else(|| {
            ReconError::ConfigValidation(format!("mode '{}' requires a comparison dataset", config.mode))
        })?;
        if comparison.is_empty() {
            warn!("comparison dataset is empty, no pairs possible");
        }
        let comparison = rounded_heights(comparison, decimals);
        Some(pair_all(&reference, &comparison, &config.pairing, decimals))
    } else {
        None
    };

    let reports = build_reports(
        &points,
        transformed.as_deref(),
        elevations.as_ref(),
        pairs.as_deref(),
        config,
    );

    let grid = match (&config.grid, scope) {
        (Some(grid_config), Some(vertices)) => {
            let candidates: Vec<GridCandidate> = reports
                .iter()
                .filter(|r| r.accurate == Some(true))
                .filter_map(|r| {
                    Some(GridCandidate {
                        id: r.id.clone(),
                        x: r.x,
                        y: r.y,
                        height_a: r.h?,
                        height_b: r.elevation_h?,
                    })
                })
                .collect();
            Some(select_grid_points(&candidates, vertices, grid_config.spacing))
        }
        _ => None,
    };

    let summary = compute_summary(&reports, grid.as_ref());
    info!(
        total = summary.total_points,
        paired = summary.paired,
        accurate = summary.accurate,
        inaccurate = summary.inaccurate,
        "run complete"
    );

    Ok(RunResult {
        meta: RunMeta {
            config_name: config.name.clone(),
            mode: config.mode,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        reports,
        grid,
    })
}
