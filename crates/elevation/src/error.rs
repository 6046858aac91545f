use thiserror::Error;

/// Failure of a single elevation request attempt, or of client setup.
#[derive(Debug, Error)]
pub enum ElevationError {
    /// HTTP client or worker pool could not be built.
    #[error("elevation client setup failed: {0}")]
    Setup(String),
    /// Connection, timeout or body read failure.
    #[error("network error: {0}")]
    Network(String),
    /// Non-2xx response.
    #[error("HTTP {0}")]
    Http(u16),
    /// 2xx response with a blank body.
    #[error("empty response body")]
    EmptyBody,
}
