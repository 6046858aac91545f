//! Axis-role and projection-zone resolution for PL-2000 coordinates.
//!
//! A PL-2000 easting carries its zone in the leading digit of a 7-digit
//! integer part (`5xxxxxx` … `8xxxxxx`). The check is structural only:
//! a northing that happens to look like `7xxxxxx` is misclassified.

use serde::Serialize;
use tracing::debug;

use crate::error::ReconError;
use crate::model::{RawRecord, SurveyPoint};

/// Target system every zone is reprojected into (PL-1992).
pub const TARGET_EPSG: u16 = 2180;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneId {
    Zone5,
    Zone6,
    Zone7,
    Zone8,
}

impl ZoneId {
    pub const ALL: [ZoneId; 4] = [Self::Zone5, Self::Zone6, Self::Zone7, Self::Zone8];

    /// EPSG code of the zone's source CRS.
    pub fn epsg(&self) -> u16 {
        match self {
            Self::Zone5 => 2176,
            Self::Zone6 => 2177,
            Self::Zone7 => 2178,
            Self::Zone8 => 2179,
        }
    }

    fn from_leading_digit(digit: char) -> Option<Self> {
        match digit {
            '5' => Some(Self::Zone5),
            '6' => Some(Self::Zone6),
            '7' => Some(Self::Zone7),
            '8' => Some(Self::Zone8),
            _ => None,
        }
    }
}

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Zone5 => write!(f, "zone 5"),
            Self::Zone6 => write!(f, "zone 6"),
            Self::Zone7 => write!(f, "zone 7"),
            Self::Zone8 => write!(f, "zone 8"),
        }
    }
}

/// Which raw column carries the northing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisConvention {
    /// `x` → northing, `y` → easting.
    Surveying,
    /// `x` → easting, `y` → northing.
    Gis,
}

impl AxisConvention {
    /// Split a raw `(x, y)` pair into `(northing, easting)`.
    pub fn roles(&self, x: f64, y: f64) -> (f64, f64) {
        match self {
            Self::Surveying => (x, y),
            Self::Gis => (y, x),
        }
    }
}

/// Integer digit string of a coordinate, truncated toward zero.
fn integer_digits(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    Some((value.trunc() as i64).to_string())
}

/// True when the integer part has exactly 7 characters and starts with 5–8.
pub fn has_easting_shape(value: f64) -> bool {
    zone_for_easting(value).is_some()
}

/// Zone encoded in an easting's leading digit, if it has the 7-digit shape.
pub fn zone_for_easting(easting: f64) -> Option<ZoneId> {
    let digits = integer_digits(easting)?;
    if digits.len() != 7 {
        return None;
    }
    digits.chars().next().and_then(ZoneId::from_leading_digit)
}

/// Sniff the axis convention from a single (first) row.
pub fn detect_convention(first: &RawRecord) -> AxisConvention {
    if has_easting_shape(first.y) {
        AxisConvention::Surveying
    } else if has_easting_shape(first.x) {
        AxisConvention::Gis
    } else {
        debug!(
            id = %first.id,
            x = first.x,
            y = first.y,
            "no easting-shaped column in first row, assuming surveying convention"
        );
        AxisConvention::Surveying
    }
}

/// Resolve northing / easting / zone for a whole dataset.
///
/// The convention is detected from the first row only and applied to
/// every row; callers must not mix conventions inside one dataset.
pub fn resolve_dataset(records: &[RawRecord]) -> Vec<SurveyPoint> {
    let Some(first) = records.first() else {
        return Vec::new();
    };
    let convention = detect_convention(first);

    records
        .iter()
        .map(|record| {
            let (northing, easting) = convention.roles(record.x, record.y);
            let zone = zone_for_easting(easting);
            if zone.is_none() {
                debug!(id = %record.id, easting, "indeterminate zone");
            }
            SurveyPoint {
                id: record.id.clone(),
                x: record.x,
                y: record.y,
                h: record.h,
                northing,
                easting,
                zone,
            }
        })
        .collect()
}

/// Zone of a dataset, taken from its first row.
pub fn dataset_zone(points: &[SurveyPoint]) -> Option<ZoneId> {
    points.first().and_then(|p| p.zone)
}

/// Refuse to combine a survey and a scope polygon from different zones.
///
/// Datasets whose zone cannot be determined are accepted.
pub fn ensure_same_zone(survey: &[SurveyPoint], scope: &[SurveyPoint]) -> Result<(), ReconError> {
    match (dataset_zone(survey), dataset_zone(scope)) {
        (Some(survey), Some(scope)) if survey != scope => {
            Err(ReconError::ZoneMismatch { survey, scope })
        }
        _ => Ok(()),
    }
}
