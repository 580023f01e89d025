//! Node probing: HTTP fetching, URL derivation, and the per-node
//! health state machine

pub mod fetcher;
pub mod node;
pub mod url;

pub use fetcher::{Fetched, HttpFetcher};
pub use node::NodeProber;
