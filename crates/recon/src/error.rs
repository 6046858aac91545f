use thiserror::Error;

use crate::zone::ZoneId;

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (bad spacing, missing section, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// Non-numeric or malformed value in an input dataset.
    #[error("dataset '{dataset}', row {row}: {message}")]
    Parse {
        dataset: String,
        row: usize,
        message: String,
    },
    /// Survey and scope polygon lie in different projection zones.
    #[error("zone mismatch: survey is in {survey} (EPSG:{}), scope polygon is in {scope} (EPSG:{})", survey.epsg(), scope.epsg())]
    ZoneMismatch { survey: ZoneId, scope: ZoneId },
    /// Transformer could not be built or applied for a zone.
    #[error("reprojection failed for {zone}: {message}")]
    Reprojection { zone: ZoneId, message: String },
    /// IO error (file read, etc.).
    #[error("IO error: {0}")]
    Io(String),
}
