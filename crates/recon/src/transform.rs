//! Zone-partitioned reprojection into PL-1992.
//!
//! Points are grouped by source zone, each partition is reprojected with
//! a transformer built once for that zone, and results are scattered
//! back so output index `i` always belongs to input index `i`.

use std::collections::BTreeMap;

use proj4rs::proj::Proj;
use rayon::prelude::*;
use tracing::{debug, error, info};

use crate::config::TransformConfig;
use crate::error::ReconError;
use crate::model::{SurveyPoint, TransformedPoint};
use crate::zone::{ZoneId, TARGET_EPSG};

// ---------------------------------------------------------------------------
// Backend seam
// ---------------------------------------------------------------------------

/// A reprojection backend from a PL-2000 zone into the target system.
///
/// `prepare` runs once per zone partition on the worker that owns it;
/// the prepared transformer never leaves that worker.
pub trait Reprojection: Sync {
    type Transformer;

    fn prepare(&self, zone: ZoneId) -> Result<Self::Transformer, ReconError>;

    /// Project one `(easting, northing)` pair. `None` on per-point failure.
    fn project(&self, transformer: &Self::Transformer, easting: f64, northing: f64)
        -> Option<(f64, f64)>;

    /// Project a whole partition with one prepared transformer.
    fn project_all(
        &self,
        transformer: &Self::Transformer,
        coords: &[(f64, f64)],
    ) -> Vec<Option<(f64, f64)>> {
        coords
            .iter()
            .map(|&(easting, northing)| self.project(transformer, easting, northing))
            .collect()
    }
}

/// proj4rs backend with CRS definitions taken from `crs-definitions`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Proj4Reprojection;

pub struct ZoneTransformer {
    source: Proj,
    target: Proj,
}

fn proj_for(epsg: u16, zone: ZoneId) -> Result<Proj, ReconError> {
    let def = crs_definitions::from_code(epsg).ok_or_else(|| ReconError::Reprojection {
        zone,
        message: format!("EPSG:{epsg} is not in the crs-definitions database"),
    })?;
    Proj::from_proj_string(def.proj4).map_err(|e| ReconError::Reprojection {
        zone,
        message: format!("invalid projection EPSG:{epsg}: {e:?}"),
    })
}

impl Reprojection for Proj4Reprojection {
    type Transformer = ZoneTransformer;

    fn prepare(&self, zone: ZoneId) -> Result<ZoneTransformer, ReconError> {
        Ok(ZoneTransformer {
            source: proj_for(zone.epsg(), zone)?,
            target: proj_for(TARGET_EPSG, zone)?,
        })
    }

    fn project(&self, t: &ZoneTransformer, easting: f64, northing: f64) -> Option<(f64, f64)> {
        if !easting.is_finite() || !northing.is_finite() {
            return None;
        }
        let mut point = (easting, northing, 0.0);
        proj4rs::transform::transform(&t.source, &t.target, &mut point).ok()?;
        if point.0.is_finite() && point.1.is_finite() {
            Some((point.0, point.1))
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

struct Partition {
    zone: ZoneId,
    indices: Vec<usize>,
    coords: Vec<(f64, f64)>,
}

fn partition_by_zone(points: &[SurveyPoint]) -> Vec<Partition> {
    let mut by_zone: BTreeMap<ZoneId, Partition> = BTreeMap::new();
    for (i, p) in points.iter().enumerate() {
        let Some(zone) = p.zone else { continue };
        let part = by_zone.entry(zone).or_insert_with(|| Partition {
            zone,
            indices: Vec::new(),
            coords: Vec::new(),
        });
        part.indices.push(i);
        part.coords.push((p.easting, p.northing));
    }
    by_zone.into_values().collect()
}

/// Reproject one zone's coordinates. A transformer that cannot be built
/// leaves the whole partition absent.
fn transform_partition<R: Reprojection>(
    backend: &R,
    zone: ZoneId,
    coords: &[(f64, f64)],
) -> Vec<TransformedPoint> {
    let transformer = match backend.prepare(zone) {
        Ok(t) => t,
        Err(e) => {
            error!(%zone, points = coords.len(), error = %e, "transformer construction failed");
            return vec![None; coords.len()];
        }
    };

    let out = backend.project_all(&transformer, coords);
    let failed = out.iter().filter(|p| p.is_none()).count();
    if failed > 0 {
        debug!(%zone, failed, "points failed reprojection");
    }
    out
}

/// Reproject every point into the target system, position-aligned with `points`.
pub fn dispatch<R: Reprojection>(
    points: &[SurveyPoint],
    backend: &R,
    config: &TransformConfig,
) -> Vec<TransformedPoint> {
    let mut out: Vec<TransformedPoint> = vec![None; points.len()];
    let partitions = partition_by_zone(points);
    info!(
        points = points.len(),
        zones = partitions.len(),
        parallel = config.parallel,
        "dispatching reprojection"
    );

    let work = |part: Partition| -> (Vec<usize>, Vec<TransformedPoint>) {
        let results = transform_partition(backend, part.zone, &part.coords);
        (part.indices, results)
    };

    let finished: Vec<(Vec<usize>, Vec<TransformedPoint>)> = if config.parallel {
        partitions.into_par_iter().map(work).collect()
    } else {
        partitions.into_iter().map(work).collect()
    };

    for (indices, results) in finished {
        for (i, r) in indices.into_iter().zip(results) {
            out[i] = r;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
