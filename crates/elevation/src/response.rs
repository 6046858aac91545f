//! Wire format of `GetHByPointList`.
//!
//! Request: `list=N E,N E,...` with each point as `"{northing:.2} {easting:.2}"`.
//! Response: comma-separated `N E H` triples.

use std::collections::HashSet;

use diffh_recon::{elevation_key, ElevationMap};

/// Request list for a batch of `(easting, northing)` points, duplicates removed.
pub fn point_list(batch: &[(f64, f64)]) -> String {
    let mut seen = HashSet::new();
    batch
        .iter()
        .map(|&(easting, northing)| elevation_key(easting, northing))
        .filter(|key| seen.insert(key.clone()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Full request URL; spaces in the list are percent-encoded.
pub fn request_url(base_url: &str, list: &str) -> String {
    format!(
        "{base_url}?request=GetHByPointList&list={}",
        list.replace(' ', "%20")
    )
}

/// Parse `N E H` triples. The key is `"N E"` exactly as the service wrote
/// it; an unparseable height is recorded as `0.0`. Entries that are not
/// triples are skipped.
pub fn parse_response(body: &str) -> ElevationMap {
    let mut heights = ElevationMap::new();
    for entry in body.trim().split(',') {
        let parts: Vec<&str> = entry.split_whitespace().collect();
        if let [northing, easting, h] = parts[..] {
            let h = h.parse::<f64>().unwrap_or(0.0);
            heights.insert(format!("{northing} {easting}"), h);
        }
    }
    heights
}

/// All heights zero, or nothing parsed. Such a batch is asked again
/// unless the attempt was the last one.
pub fn is_suspicious_all_zero(heights: &ElevationMap) -> bool {
    heights.values().all(|&h| h == 0.0)
}
