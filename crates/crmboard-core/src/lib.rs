//! crmboard-core - Core library for crmboard
//!
//! Provides the synthetic metric series, the date-ordered store, the
//! rule-based insight engine, and the controller that ties them together.

pub mod analytics;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod generator;
pub mod models;
pub mod snapshot;
pub mod store;

pub use analytics::Timeframe;
pub use config::{DashboardConfig, GeneratorConfig};
pub use controller::DashboardController;
pub use error::{CoreError, InitReport, SeriesOrigin};
pub use export::{export_insights_to_json, export_series_to_csv, export_series_to_json};
pub use generator::SeriesGenerator;
pub use snapshot::{Snapshot, SNAPSHOT_SCHEMA_VERSION};
pub use store::MetricsStore;
