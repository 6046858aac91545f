//! `diffh run` / `diffh validate`: config-driven height comparison.

use std::path::{Path, PathBuf};

use diffh_elevation::ElevationClient;
use diffh_recon::config::DatasetConfig;
use diffh_recon::input::{load_points, load_polygon};
use diffh_recon::{ElevationLookup, Proj4Reprojection, RawRecord, ReconConfig, RunInput, RunResult};

use crate::exit_codes::{recon_exit_code, EXIT_INVALID_CONFIG, EXIT_RUNTIME};
use crate::CliError;

fn recon_err(err: diffh_recon::ReconError) -> CliError {
    CliError::new(recon_exit_code(&err), err.to_string())
}

fn load_config(config_path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        CliError::new(EXIT_RUNTIME, format!("cannot read config {}: {e}", config_path.display()))
    })?;
    ReconConfig::from_toml(&config_str).map_err(|e| {
        CliError::new(EXIT_INVALID_CONFIG, e.to_string())
            .with_hint(format!("check {}", config_path.display()))
    })
}

fn read_dataset(base_dir: &Path, dataset: &DatasetConfig) -> Result<String, CliError> {
    let path = base_dir.join(&dataset.file);
    std::fs::read_to_string(&path)
        .map_err(|e| CliError::new(EXIT_RUNTIME, format!("cannot read {}: {e}", path.display())))
}

fn load_dataset(name: &str, base_dir: &Path, dataset: &DatasetConfig) -> Result<Vec<RawRecord>, CliError> {
    let text = read_dataset(base_dir, dataset)?;
    load_points(name, &text, dataset).map_err(recon_err)
}

/// Load every dataset the config names. Paths resolve relative to the
/// config file's directory.
fn load_input(config: &ReconConfig, config_path: &Path) -> Result<RunInput, CliError> {
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let reference = load_dataset("reference", base_dir, &config.reference)?;

    let comparison = match config.comparison {
        Some(ref dataset) if config.mode.uses_comparison_file() => {
            Some(load_dataset("comparison", base_dir, dataset)?)
        }
        _ => None,
    };

    let scope = match config.grid {
        Some(ref grid) => {
            let text = read_dataset(base_dir, &grid.scope)?;
            Some(load_polygon("scope", &text, &grid.scope).map_err(recon_err)?)
        }
        None => None,
    };

    Ok(RunInput {
        reference,
        comparison,
        scope,
    })
}

pub fn cmd_run(config_path: PathBuf, json_output: bool, output_file: Option<PathBuf>) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let input = load_input(&config, &config_path)?;

    let client = if config.mode.uses_elevation() {
        Some(
            ElevationClient::new(&config.elevation)
                .map_err(|e| CliError::new(EXIT_RUNTIME, e.to_string()))?,
        )
    } else {
        None
    };
    let lookup = client.as_ref().map(|c| c as &dyn ElevationLookup);

    let result = diffh_recon::run(&config, &input, lookup, &Proj4Reprojection).map_err(recon_err)?;

    // Output
    let json_str = serde_json::to_string_pretty(&result)
        .map_err(|e| CliError::new(EXIT_RUNTIME, format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::new(EXIT_RUNTIME, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    print_summary(&result, &config);
    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    eprintln!(
        "config '{}' is valid (mode: {}, grid: {})",
        config.name,
        config.mode,
        if config.grid.is_some() { "yes" } else { "no" },
    );
    Ok(())
}

/// Human summary to stderr.
fn print_summary(result: &RunResult, config: &ReconConfig) {
    let s = &result.summary;
    eprintln!(
        "{} run '{}': {} points, {} without zone",
        result.meta.mode, result.meta.config_name, s.total_points, s.zone_indeterminate,
    );

    if config.mode.uses_elevation() {
        eprintln!(
            "elevation: {} transformed, {} resolved, {} no data",
            s.transformed, s.elevation_resolved, s.elevation_missing,
        );
        if let Some(tolerance) = config.elevation.tolerance {
            eprintln!(
                "accuracy (±{tolerance}): {} within, {} outside",
                s.accurate, s.inaccurate,
            );
        }
    }

    if config.mode.uses_comparison_file() {
        eprintln!("pairing: {} of {} points paired", s.paired, s.total_points);
    }

    if let Some(ref grid) = result.grid {
        eprintln!(
            "grid ({} m): {} of {} cells covered",
            grid.spacing, s.grid_winners, s.grid_centers,
        );
    }
}
