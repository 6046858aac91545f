use serde::{Deserialize, Serialize};

use crate::error::ReconError;

pub const DEFAULT_ELEVATION_URL: &str = "https://services.gugik.gov.pl/nmt/";
pub const DEFAULT_GRID_SPACING: f64 = 25.0;
pub const MAX_ROUND_DECIMALS: u32 = 6;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub mode: ComparisonMode,
    /// Decimal places for input heights, coordinates and height differences.
    #[serde(default = "default_round_decimals")]
    pub round_decimals: u32,
    pub reference: DatasetConfig,
    #[serde(default)]
    pub comparison: Option<DatasetConfig>,
    #[serde(default)]
    pub pairing: PairingConfig,
    #[serde(default)]
    pub elevation: ElevationConfig,
    #[serde(default)]
    pub transform: TransformConfig,
    #[serde(default)]
    pub grid: Option<GridConfig>,
}

fn default_name() -> String {
    "diffh".into()
}

fn default_round_decimals() -> u32 {
    1
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// What the reference survey is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMode {
    /// Second survey file only.
    File,
    /// Elevation service only.
    Elevation,
    /// Second survey file and elevation service.
    Both,
}

impl ComparisonMode {
    pub fn uses_comparison_file(&self) -> bool {
        matches!(self, Self::File | Self::Both)
    }

    pub fn uses_elevation(&self) -> bool {
        matches!(self, Self::Elevation | Self::Both)
    }
}

impl std::fmt::Display for ComparisonMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Elevation => write!(f, "elevation"),
            Self::Both => write!(f, "both"),
        }
    }
}

// ---------------------------------------------------------------------------
// Datasets
// ---------------------------------------------------------------------------

/// Where a dataset lives and how its delimited text is laid out.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    pub file: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default)]
    pub has_headers: bool,
    /// Swap the x / y columns at load time.
    #[serde(default)]
    pub swap_xy: bool,
    #[serde(default)]
    pub columns: ColumnLayout,
    /// Prefix for generated ids when the file has no id column; the
    /// dataset name when unset.
    #[serde(default)]
    pub id_prefix: Option<String>,
}

fn default_delimiter() -> char {
    ';'
}

/// Column order of a point file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnLayout {
    /// `id, x, y[, h]`
    #[default]
    IdXyh,
    /// `x, y, h`; ids are generated as `{prefix}_{n}`.
    Xyh,
}

// ---------------------------------------------------------------------------
// Stage settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PairingConfig {
    /// Maximum pairing distance in metres; `0` disables the bound.
    #[serde(default)]
    pub max_distance: f64,
    /// Also require the comparison point's nearest reference to be the
    /// original reference point.
    #[serde(default)]
    pub reciprocal: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElevationConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Accuracy threshold for `|h - elevation_h|`; no classification when absent.
    #[serde(default)]
    pub tolerance: Option<f64>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_ELEVATION_URL.into()
}

fn default_batch_size() -> usize {
    300
}

fn default_concurrency() -> usize {
    10
}

fn default_max_attempts() -> u32 {
    5
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_backoff_ms() -> u64 {
    250
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            tolerance: None,
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
            max_attempts: default_max_attempts(),
            timeout_secs: default_timeout_secs(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransformConfig {
    /// Fan zone partitions out over worker threads.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_parallel() -> bool {
    true
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridConfig {
    /// Polygon vertices, `x,y` or `id,x,y` per row.
    pub scope: DatasetConfig,
    #[serde(default = "default_spacing")]
    pub spacing: f64,
}

fn default_spacing() -> f64 {
    DEFAULT_GRID_SPACING
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.round_decimals > MAX_ROUND_DECIMALS {
            return Err(ReconError::ConfigValidation(format!(
                "round_decimals must be between 0 and {MAX_ROUND_DECIMALS}, got {}",
                self.round_decimals
            )));
        }

        if self.mode.uses_comparison_file() && self.comparison.is_none() {
            return Err(ReconError::ConfigValidation(format!(
                "mode '{}' requires a [comparison] dataset",
                self.mode
            )));
        }

        let max_distance = self.pairing.max_distance;
        if !max_distance.is_finite() || max_distance < 0.0 {
            return Err(ReconError::ConfigValidation(format!(
                "pairing.max_distance must be >= 0, got {max_distance}"
            )));
        }

        self.validate_elevation()?;

        if let Some(ref grid) = self.grid {
            if !grid.spacing.is_finite() || grid.spacing <= 0.0 {
                return Err(ReconError::ConfigValidation(format!(
                    "grid.spacing must be > 0, got {}",
                    grid.spacing
                )));
            }
            if !self.mode.uses_elevation() {
                return Err(ReconError::ConfigValidation(
                    "grid coverage requires an elevation mode ('elevation' or 'both')".into(),
                ));
            }
            if self.elevation.tolerance.is_none() {
                return Err(ReconError::ConfigValidation(
                    "grid coverage requires elevation.tolerance".into(),
                ));
            }
        }

        Ok(())
    }

    fn validate_elevation(&self) -> Result<(), ReconError> {
        let e = &self.elevation;
        if let Some(tolerance) = e.tolerance {
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err(ReconError::ConfigValidation(format!(
                    "elevation.tolerance must be >= 0, got {tolerance}"
                )));
            }
        }
        if e.batch_size == 0 {
            return Err(ReconError::ConfigValidation(
                "elevation.batch_size must be at least 1".into(),
            ));
        }
        if e.concurrency == 0 {
            return Err(ReconError::ConfigValidation(
                "elevation.concurrency must be at least 1".into(),
            ));
        }
        if e.max_attempts == 0 {
            return Err(ReconError::ConfigValidation(
                "elevation.max_attempts must be at least 1".into(),
            ));
        }
        if e.timeout_secs == 0 {
            return Err(ReconError::ConfigValidation(
                "elevation.timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
