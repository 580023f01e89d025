//! Probe cycle orchestration
//!
//! Fans node probes and record validations out over a bounded pool of
//! concurrent tasks. Results come back in submission order, so the report
//! is identical whatever the concurrency limit.

use futures::stream::{self, StreamExt};
use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::decode::record_locations;
use crate::error::Error;
use crate::models::{NodeHealth, ProbeCycle, RecordValidationOutcome};
use crate::probe::{url, HttpFetcher, NodeProber};
use crate::validator::{schema_locations, RecordValidator, Schema};

/// Ceiling on documents fetched while resolving a schema include chain
const SCHEMA_DOCUMENT_LIMIT: usize = 64;

/// Run `f` over `items` with at most `concurrency` tasks in flight
///
/// Output order always matches input order.
pub async fn fan_out<I, T, F, Fut, O>(items: I, concurrency: usize, f: F) -> Vec<O>
where
    I: IntoIterator<Item = T>,
    F: Fn(T) -> Fut,
    Fut: Future<Output = O>,
{
    stream::iter(items.into_iter().map(f))
        .buffered(concurrency.max(1))
        .collect()
        .await
}

/// Drives a full monitoring cycle over the configured network
pub struct Coordinator {
    config: Config,
    fetcher: Arc<HttpFetcher>,
}

impl Coordinator {
    /// Build a coordinator from validated configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: Config) -> Result<Self, Error> {
        let fetcher = HttpFetcher::new(
            config.request_timeout(),
            config.probe.requests_per_second,
            &config.probe.user_agent,
        )?;
        Ok(Self {
            config,
            fetcher: Arc::new(fetcher),
        })
    }

    /// Probe every configured node concurrently
    ///
    /// Results are in configuration order regardless of completion order.
    pub async fn probe_nodes(&self) -> Vec<NodeHealth> {
        let endpoints = self.config.endpoints();
        info!(nodes = endpoints.len(), "Probing catalog nodes");

        let prober = Arc::new(NodeProber::new(Arc::clone(&self.fetcher)));
        fan_out(endpoints, self.config.probe.concurrency, |endpoint| {
            let prober = Arc::clone(&prober);
            async move { prober.probe(&endpoint).await }
        })
        .await
    }

    /// Validate every record the authoritative sitemap names
    ///
    /// A failure to obtain the sitemap or the schema degrades the cycle to
    /// node health only; it never aborts the run.
    pub async fn validate_records(&self) -> Vec<RecordValidationOutcome> {
        let record_urls = match self.record_urls().await {
            Ok(urls) => urls,
            Err(err) => {
                warn!(error = %err, "Record enumeration failed, skipping record checks");
                return Vec::new();
            }
        };

        let schema = match self.load_schema().await {
            Ok(schema) if schema.is_vacuous() => {
                warn!("Schema resolved to no declarations, skipping record checks");
                return Vec::new();
            }
            Ok(schema) => Arc::new(schema),
            Err(err) => {
                warn!(error = %err, "Schema unavailable, skipping record checks");
                return Vec::new();
            }
        };

        info!(records = record_urls.len(), "Validating catalog records");

        let validator = Arc::new(RecordValidator::new(Arc::clone(&self.fetcher), schema));
        fan_out(record_urls, self.config.probe.concurrency, |record_url| {
            let validator = Arc::clone(&validator);
            async move { validator.validate(&record_url).await }
        })
        .await
    }

    /// One full monitoring cycle: node health plus record validation
    pub async fn run_cycle(&self) -> ProbeCycle {
        let nodes = self.probe_nodes().await;
        let records = self.validate_records().await;
        ProbeCycle::new(nodes, records)
    }

    /// Enumerate record XML URLs from the authoritative sitemap
    async fn record_urls(&self) -> Result<Vec<String>, Error> {
        let fetched = self
            .fetcher
            .get(&self.config.network.authoritative_sitemap)
            .await?;
        let locations = record_locations(&fetched.body)?;
        Ok(locations.iter().map(|loc| url::record_xml_url(loc)).collect())
    }

    /// Fetch the configured schema and resolve its include/import chain
    ///
    /// The deployed metadata schema is an aggregation document whose
    /// declarations live behind `xs:include`/`xs:import` references. Each
    /// referenced document is fetched once, relative locations resolved
    /// against the referring document's URL, and its declarations folded
    /// into the compiled schema. A referenced document that cannot be
    /// fetched or parsed is skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the root schema document itself cannot be
    /// fetched or is not well-formed XML.
    pub async fn load_schema(&self) -> Result<Schema, Error> {
        let root_url = self.config.network.schema_url.clone();
        let fetched = self.fetcher.get(&root_url).await?;
        let mut schema = Schema::compile(&fetched.body)?;

        let mut visited: HashSet<String> = HashSet::from([root_url.clone()]);
        let mut queue: VecDeque<(String, String)> = schema_locations(&fetched.body)?
            .into_iter()
            .map(|location| (root_url.clone(), location))
            .collect();

        while let Some((referrer, location)) = queue.pop_front() {
            if visited.len() >= SCHEMA_DOCUMENT_LIMIT {
                warn!(
                    limit = SCHEMA_DOCUMENT_LIMIT,
                    "Schema include chain truncated"
                );
                break;
            }
            let resolved = match resolve_location(&referrer, &location) {
                Some(resolved) => resolved,
                None => {
                    debug!(referrer, location, "Unresolvable schema location");
                    continue;
                }
            };
            if !visited.insert(resolved.clone()) {
                continue;
            }
            let body = match self.fetcher.get(&resolved).await {
                Ok(fetched) => fetched.body,
                Err(err) => {
                    warn!(url = %resolved, error = %err, "Referenced schema document unavailable");
                    continue;
                }
            };
            match Schema::compile(&body) {
                Ok(part) => {
                    if let Ok(nested) = schema_locations(&body) {
                        queue.extend(
                            nested
                                .into_iter()
                                .map(|location| (resolved.clone(), location)),
                        );
                    }
                    schema.merge(part);
                }
                Err(err) => {
                    warn!(url = %resolved, error = %err, "Referenced schema document did not parse")
                }
            }
        }

        Ok(schema)
    }
}

/// Resolve a schemaLocation against the URL of the document that names it
fn resolve_location(referrer: &str, location: &str) -> Option<String> {
    let base = ::url::Url::parse(referrer).ok()?;
    base.join(location).ok().map(String::from)
}
