//! Per-node health prober
//!
//! A probe walks a small state machine: liveness check, discovery-path
//! selection (sitemap vs. CSW by URL shape), and a fallback chain that
//! tolerates nodes advertising one discovery mechanism while actually
//! serving another. The terminal outcome is always a [`NodeHealth`];
//! recoverable failures become absent fields, never errors.

use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::decode::{count_csw_records, extract_csw_date_range, parse_sitemap, DateStamp};
use crate::error::{Error, FailureKind, FetchError};
use crate::models::{NodeEndpoint, NodeHealth};
use crate::probe::fetcher::HttpFetcher;
use crate::probe::url;

/// Record count and date range obtained from a discovery path
#[derive(Debug, Default)]
struct Discovery {
    record_count: Option<u64>,
    last_created: Option<DateStamp>,
    last_modified: Option<DateStamp>,
}

/// Probes a single node and assembles its health record
pub struct NodeProber {
    fetcher: Arc<HttpFetcher>,
}

impl NodeProber {
    pub fn new(fetcher: Arc<HttpFetcher>) -> Self {
        Self { fetcher }
    }

    /// Probe one node; never fails, the failure mode is in the result
    pub async fn probe(&self, endpoint: &NodeEndpoint) -> NodeHealth {
        let node_url = endpoint.url();

        // Liveness check against the bare base URL.
        let status = match self.fetcher.get(node_url).await {
            Ok(fetched) => fetched.status,
            Err(FetchError::Status(code)) => {
                debug!(node = node_url, status = code, "Node answered with HTTP error");
                return NodeHealth::reachable(endpoint.clone(), code);
            }
            Err(err) if err.kind() == FailureKind::Network => {
                debug!(node = node_url, error = %err, "Node unreachable");
                return NodeHealth::unreachable(endpoint.clone());
            }
            Err(err) => {
                error!(node = node_url, error = %err, "Unclassified probe failure");
                return NodeHealth::unreachable(endpoint.clone());
            }
        };

        let mut health = NodeHealth::reachable(endpoint.clone(), status);

        let discovery = if url::is_portal_url(node_url) {
            self.discover_via_sitemap(node_url).await
        } else {
            self.discover_via_csw(url::csw_base_candidates(node_url), node_url)
                .await
        };

        health.record_count = discovery.record_count;
        health.last_created = discovery.last_created;
        health.last_modified = discovery.last_modified;
        health
    }

    /// Sitemap discovery for portal-style nodes
    ///
    /// Network failure falls back to the CSW flow on the portal-derived
    /// base; parse failure gives up and leaves the fields absent.
    async fn discover_via_sitemap(&self, node_url: &str) -> Discovery {
        let sitemap_url = match url::sitemap_url(node_url) {
            Ok(derived) => derived,
            Err(err) => {
                debug!(node = node_url, error = %err, "Sitemap URL derivation failed");
                return Discovery::default();
            }
        };

        match self.fetch_sitemap(&sitemap_url).await {
            Ok(discovery) => discovery,
            Err(err) => match err.kind() {
                FailureKind::Network | FailureKind::Http => {
                    debug!(
                        node = node_url,
                        sitemap = sitemap_url,
                        error = %err,
                        "Sitemap unreachable, falling back to CSW"
                    );
                    let fallback: Vec<String> =
                        url::csw_base_from_portal(node_url).into_iter().collect();
                    self.discover_via_csw(fallback, node_url).await
                }
                FailureKind::Parse => {
                    debug!(node = node_url, error = %err, "Sitemap did not parse");
                    Discovery::default()
                }
                _ => {
                    error!(node = node_url, error = %err, "Unclassified sitemap failure");
                    Discovery::default()
                }
            },
        }
    }

    async fn fetch_sitemap(&self, sitemap_url: &str) -> Result<Discovery, Error> {
        let fetched = self.fetcher.get(sitemap_url).await?;
        let summary = parse_sitemap(&fetched.body)?;
        Ok(Discovery {
            record_count: Some(summary.record_count),
            last_created: None,
            last_modified: summary.last_modified,
        })
    }

    /// CSW discovery, trying each candidate base in sequence
    ///
    /// Network failure moves on to the next candidate; an endpoint that
    /// answers but does not speak CSW yields absent fields.
    async fn discover_via_csw(&self, bases: Vec<String>, node_url: &str) -> Discovery {
        for base in &bases {
            match self.query_csw(base).await {
                Ok(discovery) => return discovery,
                Err(err) if err.kind().is_recoverable() => {
                    debug!(node = node_url, csw_base = %base, error = %err, "CSW base unreachable");
                    continue;
                }
                Err(err) => {
                    error!(node = node_url, csw_base = %base, error = %err, "Unclassified CSW failure");
                    return Discovery::default();
                }
            }
        }
        Discovery::default()
    }

    /// Count query, then best-effort date-range query against one CSW base
    ///
    /// A count response that does not decode leaves the count absent but
    /// still samples dates with the bounded default ceiling; conversely a
    /// failed date sampling keeps the count.
    async fn query_csw(&self, csw_base: &str) -> Result<Discovery, Error> {
        let count_url = url::get_records_url(csw_base, None);
        let fetched = self.fetcher.get(&count_url).await?;
        let record_count = match count_csw_records(&fetched.body) {
            Ok(count) => Some(count),
            Err(err) => {
                debug!(csw_base, error = %err, "Record count unavailable");
                None
            }
        };

        let ceiling = url::sample_ceiling(record_count);
        let (last_created, last_modified) = match self.query_dates(csw_base, ceiling).await {
            Ok(range) => range,
            Err(err) => {
                warn!(csw_base, error = %err, "Date-range sampling failed");
                (None, None)
            }
        };

        Ok(Discovery {
            record_count,
            last_created,
            last_modified,
        })
    }

    async fn query_dates(
        &self,
        csw_base: &str,
        ceiling: u64,
    ) -> Result<(Option<DateStamp>, Option<DateStamp>), Error> {
        let dates_url = url::get_records_url(csw_base, Some(ceiling));
        let fetched = self.fetcher.get(&dates_url).await?;
        Ok(extract_csw_date_range(&fetched.body)?)
    }
}
