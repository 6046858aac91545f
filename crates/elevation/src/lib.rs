//! Elevation client for the GUGiK NMT `GetHByPointList` service.
//!
//! Blocking reqwest client (no Tokio runtime required) driven by a
//! bounded rayon pool. Implements [`diffh_recon::ElevationLookup`], so
//! the engine never sees HTTP.

mod client;
mod error;
pub mod response;

pub use client::{ElevationClient, BROWSER_USER_AGENT};
pub use error::ElevationError;
