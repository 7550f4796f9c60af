pub mod aggregate;
pub mod cli;
pub mod database;
pub mod error;
pub mod gpx;
pub mod ingest;
pub mod metrics;
pub mod types;
pub mod uploads;
pub mod utils;

pub use error::{Error, MeasurementError, Result};
