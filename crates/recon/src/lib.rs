//! `diffh-recon`: spatial reconciliation engine for surveyed heights.
//!
//! Pure engine crate: receives pre-loaded survey records, returns
//! per-point comparison reports and an optional grid selection.
//! No CLI or network dependencies; the elevation service is reached
//! through the [`ElevationLookup`] seam.

pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod input;
pub mod lookup;
pub mod model;
pub mod numeric;
pub mod pairing;
pub mod report;
pub mod transform;
pub mod zone;

pub use config::ReconConfig;
pub use engine::{run, RunInput};
pub use error::ReconError;
pub use lookup::{elevation_key, ElevationLookup, ElevationMap};
pub use model::{RawRecord, RunResult, SurveyPoint, TransformedPoint};
pub use transform::{Proj4Reprojection, Reprojection};
pub use zone::ZoneId;
