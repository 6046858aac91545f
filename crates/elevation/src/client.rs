use std::thread;
use std::time::Duration;

use diffh_recon::config::ElevationConfig;
use diffh_recon::{elevation_key, ElevationLookup, ElevationMap, TransformedPoint};
use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::error::ElevationError;
use crate::response::{is_suspicious_all_zero, parse_response, point_list, request_url};

// ── Constants ───────────────────────────────────────────────────────

/// The service rejects non-browser agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

// ── ElevationClient ─────────────────────────────────────────────────

/// Batched, retrying elevation client (blocking).
///
/// Batches run on a dedicated rayon pool of `concurrency` threads so at
/// most that many requests are in flight.
pub struct ElevationClient {
    http: reqwest::blocking::Client,
    pool: rayon::ThreadPool,
    base_url: String,
    batch_size: usize,
    max_attempts: u32,
    retry_backoff_ms: u64,
}

impl ElevationClient {
    pub fn new(config: &ElevationConfig) -> Result<Self, ElevationError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .map_err(|e| ElevationError::Setup(e.to_string()))?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.concurrency.max(1))
            .thread_name(|i| format!("diffh-elevation-{i}"))
            .build()
            .map_err(|e| ElevationError::Setup(e.to_string()))?;

        Ok(Self {
            http,
            pool,
            base_url: config.base_url.clone(),
            batch_size: config.batch_size.max(1),
            max_attempts: config.max_attempts.max(1),
            retry_backoff_ms: config.retry_backoff_ms,
        })
    }

    /// One GET, no retry.
    fn fetch_once(&self, url: &str) -> Result<ElevationMap, ElevationError> {
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|e| ElevationError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ElevationError::Http(status.as_u16()));
        }

        let body = response
            .text()
            .map_err(|e| ElevationError::Network(e.to_string()))?;
        if body.trim().is_empty() {
            return Err(ElevationError::EmptyBody);
        }
        Ok(parse_response(&body))
    }

    /// Fetch one batch with retry + exponential backoff.
    ///
    /// Network errors, non-2xx, blank bodies and all-zero answers are
    /// retried; an all-zero answer on the last attempt is accepted.
    /// Exhausted retries yield an empty map.
    pub fn fetch_batch(&self, batch: &[(f64, f64)]) -> ElevationMap {
        let list = point_list(batch);
        if list.is_empty() {
            return ElevationMap::new();
        }
        let url = request_url(&self.base_url, &list);
        let mut backoff_ms = self.retry_backoff_ms;

        for attempt in 1..=self.max_attempts {
            let last = attempt == self.max_attempts;
            debug!(attempt, points = batch.len(), "requesting elevation batch");

            match self.fetch_once(&url) {
                Ok(heights) if last || !is_suspicious_all_zero(&heights) => return heights,
                Ok(_) => {
                    warn!(attempt, max = self.max_attempts, "all heights are zero, retrying");
                }
                Err(e) if last => {
                    error!(attempt, error = %e, "elevation request failed");
                }
                Err(e) => {
                    warn!(attempt, max = self.max_attempts, error = %e, "elevation request failed, retrying");
                }
            }

            if !last && backoff_ms > 0 {
                thread::sleep(Duration::from_millis(backoff_ms));
                backoff_ms = backoff_ms.saturating_mul(2);
            }
        }

        error!(
            attempts = self.max_attempts,
            points = batch.len(),
            "no usable elevation data for batch"
        );
        ElevationMap::new()
    }
}

impl ElevationLookup for ElevationClient {
    fn lookup(&self, points: &[TransformedPoint]) -> ElevationMap {
        let valid: Vec<(f64, f64)> = points.iter().flatten().copied().collect();
        if valid.is_empty() {
            info!("no transformed points to send to the elevation service");
            return ElevationMap::new();
        }

        let batches: Vec<&[(f64, f64)]> = valid.chunks(self.batch_size).collect();
        info!(points = valid.len(), batches = batches.len(), "fetching elevations");

        let results: Vec<ElevationMap> = self
            .pool
            .install(|| batches.par_iter().map(|b| self.fetch_batch(b)).collect());

        let mut heights = ElevationMap::new();
        for batch in results {
            heights.extend(batch);
        }

        // Straggler sweep
        let missing: Vec<(f64, f64)> = valid
            .iter()
            .filter(|&&(easting, northing)| !heights.contains_key(&elevation_key(easting, northing)))
            .copied()
            .collect();
        if !missing.is_empty() {
            info!(missing = missing.len(), "re-requesting points without elevation");
            let before = heights.len();
            for chunk in missing.chunks(self.batch_size) {
                heights.extend(self.fetch_batch(chunk));
            }
            debug!(recovered = heights.len() - before, "straggler sweep done");
        }

        info!(resolved = heights.len(), "elevation lookup finished");
        heights
    }
}
