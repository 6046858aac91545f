use serde::Serialize;

use crate::config::ComparisonMode;
use crate::zone::ZoneId;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A single parsed row `(id, x, y, h)` from a survey file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawRecord {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub h: Option<f64>,
}

/// A record with its axis roles and source zone resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyPoint {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub h: Option<f64>,
    pub northing: f64,
    pub easting: f64,
    pub zone: Option<ZoneId>,
}

/// `(easting, northing)` in the target system, `None` when the zone or
/// the reprojection failed. Always position-aligned with its input.
pub type TransformedPoint = Option<(f64, f64)>;

// ---------------------------------------------------------------------------
// Pairing
// ---------------------------------------------------------------------------

/// The comparison side of an accepted pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairMatch {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub h: Option<f64>,
    pub distance: f64,
    /// `h(reference) - h(comparison)`, rounded; `None` if either height is missing.
    pub diff_h: Option<f64>,
}

/// Outcome of pairing one reference point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairResult {
    pub reference_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<PairMatch>,
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HexCenter {
    pub x: f64,
    pub y: f64,
}

/// A candidate for grid coverage: position plus the two heights compared.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCandidate {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub height_a: f64,
    pub height_b: f64,
}

impl GridCandidate {
    pub fn discrepancy(&self) -> f64 {
        (self.height_a - self.height_b).abs()
    }
}

/// A lattice center with its winning candidate (index into the candidate slice).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridAssignment {
    pub center: HexCenter,
    pub candidate: usize,
    pub id: String,
    pub distance_to_center: f64,
    pub discrepancy: f64,
}

// ---------------------------------------------------------------------------
// Reports + Output
// ---------------------------------------------------------------------------

/// One output row per reference point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointReport {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub h: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<ZoneId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformed: TransformedPoint,
    pub elevation_h: Option<f64>,
    pub diff_h_elevation: Option<f64>,
    /// Set only when a tolerance is configured and a difference exists.
    pub accurate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pair: Option<PairMatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub total_points: usize,
    pub zone_indeterminate: usize,
    pub transformed: usize,
    pub elevation_resolved: usize,
    pub elevation_missing: usize,
    pub paired: usize,
    pub accurate: usize,
    pub inaccurate: usize,
    pub grid_centers: usize,
    pub grid_winners: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GridOutput {
    pub spacing: f64,
    pub centers: usize,
    pub assignments: Vec<GridAssignment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub meta: RunMeta,
    pub summary: RunSummary,
    pub reports: Vec<PointReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridOutput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub config_name: String,
    pub mode: ComparisonMode,
    pub engine_version: String,
    pub run_at: String,
}
