//! sdxmon - health monitor for a federated geospatial catalog network
//!
//! Probes a fixed list of GeoNetwork/CSW catalog nodes for liveness,
//! record counts, and record freshness, validates the individual metadata
//! records the authoritative sitemap enumerates, and renders the result
//! as a Markdown report or terminal status table.
//!
//! # Architecture
//!
//! - [`config`] - layered configuration (defaults, TOML file, environment)
//! - [`decode`] - CSW envelope and sitemap decoding
//! - [`probe`] - HTTP fetching, URL derivation, per-node health probes
//! - [`validator`] - per-record well-formedness and schema validation
//! - [`runner`] - bounded concurrent fan-out over nodes and records
//! - [`report`] - Markdown report and status-table rendering

pub mod config;
pub mod decode;
pub mod error;
pub mod models;
pub mod probe;
pub mod report;
pub mod runner;
pub mod validator;

pub use config::Config;
pub use error::{Error, FailureKind, Result};
pub use models::{NodeHealth, ProbeCycle, RecordValidationOutcome};
pub use runner::Coordinator;
