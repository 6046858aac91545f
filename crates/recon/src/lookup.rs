//! Elevation lookup contract shared by the engine and the HTTP client.

use std::collections::HashMap;

use crate::model::TransformedPoint;

/// Heights keyed by [`elevation_key`].
pub type ElevationMap = HashMap<String, f64>;

/// Canonical key for a transformed point: `"{northing:.2} {easting:.2}"`.
///
/// Keys are matched as strings. Two points that format to the same
/// 2-decimal string share a key; there is no numeric tolerance.
pub fn elevation_key(easting: f64, northing: f64) -> String {
    format!("{northing:.2} {easting:.2}")
}

/// Key for a dispatcher output slot, if it holds a point.
pub fn key_for(point: &TransformedPoint) -> Option<String> {
    point.map(|(easting, northing)| elevation_key(easting, northing))
}

/// Source of reference heights for transformed points.
///
/// Implementations must not fail as a whole: points they cannot resolve
/// are simply absent from the returned map.
pub trait ElevationLookup {
    fn lookup(&self, points: &[TransformedPoint]) -> ElevationMap;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_northing_first() {
        assert_eq!(elevation_key(482_123.456, 571_001.004), "571001.00 482123.46");
    }

    #[test]
    fn nearby_floats_share_a_key() {
        let a = elevation_key(100.001, 200.004);
        let b = elevation_key(100.004, 200.001);
        assert_eq!(a, b);
        assert_eq!(a, "200.00 100.00");
    }

    #[test]
    fn key_for_absent_point() {
        assert_eq!(key_for(&None), None);
        assert_eq!(key_for(&Some((1.0, 2.0))).as_deref(), Some("2.00 1.00"));
    }
}
