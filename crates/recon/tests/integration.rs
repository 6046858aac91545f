use std::path::PathBuf;

use diffh_recon::input::{load_points, load_polygon};
use diffh_recon::lookup::key_for;
use diffh_recon::{
    run, ElevationLookup, ElevationMap, Proj4Reprojection, ReconConfig, ReconError, RunInput,
    RunResult, TransformedPoint,
};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn read_fixture(name: &str) -> String {
    let path = fixtures_dir().join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

/// Returns the same height for every transformed point.
struct FlatTerrain(f64);

impl ElevationLookup for FlatTerrain {
    fn lookup(&self, points: &[TransformedPoint]) -> ElevationMap {
        points.iter().filter_map(key_for).map(|k| (k, self.0)).collect()
    }
}

fn load_input(config: &ReconConfig) -> RunInput {
    let reference = load_points("reference", &read_fixture(&config.reference.file), &config.reference).unwrap();
    let comparison = config
        .comparison
        .as_ref()
        .map(|c| load_points("comparison", &read_fixture(&c.file), c).unwrap());
    let scope = config
        .grid
        .as_ref()
        .map(|g| load_polygon("scope", &read_fixture(&g.scope.file), &g.scope).unwrap());
    RunInput {
        reference,
        comparison,
        scope,
    }
}

fn load_and_run(config_toml: &str) -> Result<RunResult, ReconError> {
    let config = ReconConfig::from_toml(config_toml).unwrap();
    let input = load_input(&config);
    run(&config, &input, Some(&FlatTerrain(100.0)), &Proj4Reprojection)
}

// -------------------------------------------------------------------------
// Second-file comparison
// -------------------------------------------------------------------------

#[test]
fn file_mode_pairs_nearby_points() {
    let result = load_and_run(
        r#"
name = "File Pairing"
mode = "file"

[reference]
file = "reference.csv"

[comparison]
file = "compare.csv"
delimiter = ","
has_headers = true

[pairing]
max_distance = 0.5
"#,
    )
    .unwrap();

    assert_eq!(result.summary.total_points, 6);
    assert_eq!(result.summary.paired, 2);
    assert_eq!(result.summary.transformed, 0);
    assert!(result.grid.is_none());

    // no elevation path, input order kept
    let first = &result.reports[0];
    assert_eq!(first.id, "1");
    let pair = first.pair.as_ref().unwrap();
    assert_eq!(pair.id, "c1");
    assert_eq!(pair.diff_h, Some(-0.1));

    let second = result.reports[1].pair.as_ref().unwrap();
    assert_eq!(second.id, "c2");
    assert_eq!(second.diff_h, Some(-0.5));
    assert!((second.distance - 0.1).abs() < 1e-6);
}

#[test]
fn unbounded_pairing_pairs_everything() {
    let result = load_and_run(
        r#"
mode = "file"
[reference]
file = "reference.csv"
[comparison]
file = "compare.csv"
delimiter = ","
has_headers = true
"#,
    )
    .unwrap();
    assert_eq!(result.summary.paired, 6);
}

// -------------------------------------------------------------------------
// Elevation comparison
// -------------------------------------------------------------------------

#[test]
fn elevation_mode_classifies_and_sorts() {
    let result = load_and_run(
        r#"
mode = "elevation"
[reference]
file = "reference.csv"
[elevation]
tolerance = 0.1
"#,
    )
    .unwrap();

    assert_eq!(result.summary.total_points, 6);
    assert_eq!(result.summary.zone_indeterminate, 1);
    assert_eq!(result.summary.transformed, 5);
    assert_eq!(result.summary.elevation_resolved, 5);
    assert_eq!(result.summary.accurate, 3);
    assert_eq!(result.summary.inaccurate, 1);

    assert_eq!(result.reports[0].id, "2");
    assert_eq!(result.reports[0].diff_h_elevation, Some(0.3));
    assert_eq!(result.reports[0].accurate, Some(false));

    // rows without a difference are last
    let tail: Vec<&str> = result.reports[4..].iter().map(|r| r.id.as_str()).collect();
    assert_eq!(tail, vec!["4", "6"]);

    for r in &result.reports {
        if let Some((easting, northing)) = r.transformed {
            assert!((100_000.0..900_000.0).contains(&easting));
            assert!((100_000.0..900_000.0).contains(&northing));
        }
    }
}

// -------------------------------------------------------------------------
// Grid coverage
// -------------------------------------------------------------------------

#[test]
fn grid_picks_one_winner_per_center() {
    let result = load_and_run(
        r#"
mode = "both"
[reference]
file = "reference.csv"
[comparison]
file = "compare.csv"
delimiter = ","
has_headers = true
[pairing]
max_distance = 0.5
[elevation]
tolerance = 0.1
[grid]
spacing = 25.0
[grid.scope]
file = "scope.csv"
"#,
    )
    .unwrap();

    let grid = result.grid.as_ref().unwrap();
    assert_eq!(grid.centers, 2);
    let ids: Vec<&str> = grid.assignments.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "5"]);
    assert_eq!(result.summary.grid_winners, 2);
    assert_eq!(result.summary.paired, 2);
}

#[test]
fn grid_scope_in_other_zone_is_rejected() {
    let err = load_and_run(
        r#"
mode = "elevation"
[reference]
file = "reference.csv"
[elevation]
tolerance = 0.1
[grid.scope]
file = "scope-zone7.csv"
"#,
    )
    .unwrap_err();
    assert!(matches!(err, ReconError::ZoneMismatch { .. }));
    assert!(err.to_string().contains("EPSG:2178"));
}
