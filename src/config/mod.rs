//! Configuration for the sdxmon monitor
//!
//! Loading order: compiled-in defaults (the reference network), then a
//! TOML file, then environment overrides. The resulting value is immutable
//! and injected into the coordinator at startup; nothing here is global
//! state.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::models::NodeEndpoint;

/// Base URLs of the reference exchange network, in dashboard order
///
/// Stray trailing whitespace is kept as deployed; [`NodeEndpoint`] trims
/// on construction.
const DEFAULT_NODES: [&str; 8] = [
    "http://geonetwork.maynoothuniversity.ie:8080/geonetwork",
    "https://gis.epa.ie/geonetwork/srv/eng/catalog.search",
    "http://spatial.dcenr.gov.ie/GeologicalSurvey/geonetwork ",
    "http://pips.ucc.ie/geonetwork ",
    "http://data.marine.ie/geonetwork/srv/eng/catalog.search",
    "http://www.isde.ie/geonetwork/srv/eng/catalog.search",
    "http://metadata.biodiversityireland.ie/geonetwork",
    "http://data.ahg.gov.ie/geonetwork",
];

/// Sitemap of the authoritative node, enumerating all network-wide records
const DEFAULT_AUTHORITATIVE_SITEMAP: &str =
    "https://www.isde.ie/geonetwork/srv/api/portal.sitemap";

/// ISO 19139 schema the records are validated against
const DEFAULT_SCHEMA_URL: &str =
    "http://schemas.opengis.net/iso/19139/20060504/gmd/gmd.xsd";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The monitored network
    pub network: NetworkConfig,

    /// Probe behavior
    pub probe: ProbeConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// The set of nodes under watch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Ordered node base URLs; output rows follow this order
    pub nodes: Vec<String>,

    /// Sitemap URL of the authoritative node
    pub authoritative_sitemap: String,

    /// URL of the XML Schema document used for record validation
    pub schema_url: String,
}

/// Probe-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Maximum number of concurrent probe/validation tasks
    pub concurrency: usize,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Rate limit (requests per second)
    pub requests_per_second: u32,

    /// User agent string
    pub user_agent: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables over the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(nodes) = std::env::var("SDXMON_NODES") {
            config.network.nodes = nodes
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(sitemap) = std::env::var("SDXMON_AUTHORITATIVE_SITEMAP") {
            config.network.authoritative_sitemap = sitemap;
        }
        if let Ok(schema_url) = std::env::var("SDXMON_SCHEMA_URL") {
            config.network.schema_url = schema_url;
        }
        if let Some(concurrency) = std::env::var("SDXMON_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
        {
            config.probe.concurrency = concurrency;
        }
        if let Some(timeout) = std::env::var("SDXMON_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.probe.request_timeout_secs = timeout;
        }
        if let Some(rate) = std::env::var("SDXMON_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
        {
            config.probe.requests_per_second = rate;
        }
        if let Ok(level) = std::env::var("SDXMON_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("SDXMON_LOG_FORMAT") {
            config.logging.format = format;
        }

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.network.nodes.is_empty() {
            anyhow::bail!("node list must not be empty");
        }

        for node in &self.network.nodes {
            url::Url::parse(node.trim())
                .with_context(|| format!("invalid node URL: {node:?}"))?;
        }

        url::Url::parse(&self.network.authoritative_sitemap)
            .context("invalid authoritative sitemap URL")?;

        url::Url::parse(&self.network.schema_url).context("invalid schema URL")?;

        if self.probe.concurrency == 0 {
            anyhow::bail!("concurrency must be greater than 0");
        }

        if self.probe.requests_per_second == 0 {
            anyhow::bail!("requests_per_second must be greater than 0");
        }

        Ok(())
    }

    /// The configured nodes as endpoints, in dashboard order
    pub fn endpoints(&self) -> Vec<NodeEndpoint> {
        self.network.nodes.iter().map(NodeEndpoint::new).collect()
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.probe.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig {
                nodes: DEFAULT_NODES.iter().map(|s| s.to_string()).collect(),
                authoritative_sitemap: DEFAULT_AUTHORITATIVE_SITEMAP.to_string(),
                schema_url: DEFAULT_SCHEMA_URL.to_string(),
            },
            probe: ProbeConfig {
                concurrency: 16,
                request_timeout_secs: 30,
                requests_per_second: 10,
                user_agent: format!("sdxmon/{}", env!("CARGO_PKG_VERSION")),
            },
            logging: LoggingConfig {
                level: String::from("info"),
                format: String::from("text"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.network.nodes.len(), 8);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = Config::default();
        config.probe.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_node_list_rejected() {
        let mut config = Config::default();
        config.network.nodes.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_node_url_rejected() {
        let mut config = Config::default();
        config.network.nodes.push("not a url".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_endpoints_preserve_order_and_trim() {
        let config = Config::default();
        let endpoints = config.endpoints();
        assert_eq!(endpoints.len(), config.network.nodes.len());
        assert_eq!(endpoints[3].url(), "http://pips.ucc.ie/geonetwork");
    }

    #[test]
    fn test_request_timeout_conversion() {
        let config = Config::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }
}
