//! Core data structures for a monitoring cycle
//!
//! Everything here is built once per probe cycle, immutable afterwards,
//! and consumed directly by the presentation layer. No history is kept
//! across cycles.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::decode::DateStamp;

/// One catalog node in the exchange network
///
/// Identity is the URL string. The reference node list carries stray
/// whitespace, so construction trims it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NodeEndpoint(String);

impl NodeEndpoint {
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self(base_url.as_ref().trim().to_string())
    }

    /// Base URL of the node
    pub fn url(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Health of one node as observed during a single probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeHealth {
    /// The probed node
    pub endpoint: NodeEndpoint,

    /// HTTP status of the liveness check; `None` means unreachable
    pub http_status: Option<u16>,

    /// Number of metadata records the node publishes
    pub record_count: Option<u64>,

    /// Most recent record creation date
    pub last_created: Option<DateStamp>,

    /// Most recent record modification date
    pub last_modified: Option<DateStamp>,
}

impl NodeHealth {
    /// Node that never answered (network, timeout, or OS-level failure)
    pub fn unreachable(endpoint: NodeEndpoint) -> Self {
        Self {
            endpoint,
            http_status: None,
            record_count: None,
            last_created: None,
            last_modified: None,
        }
    }

    /// Node that answered with the given status; record fields start absent
    /// and are filled by discovery when it succeeds
    pub fn reachable(endpoint: NodeEndpoint, http_status: u16) -> Self {
        Self {
            endpoint,
            http_status: Some(http_status),
            record_count: None,
            last_created: None,
            last_modified: None,
        }
    }

    /// A node is up iff the liveness check answered 200
    pub fn is_up(&self) -> bool {
        self.http_status == Some(200)
    }
}

/// Validation result for one metadata record
///
/// `is_schema_valid` is only meaningful when `is_well_formed_xml` is true;
/// `invalid_reason` is set iff the record was fetchable and well-formed
/// but failed schema validation. The constructors enforce this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordValidationOutcome {
    /// URL of the record's XML representation
    pub record_url: String,

    /// Whether the record body could be fetched at all
    pub was_fetchable: bool,

    /// Whether the body parsed as well-formed XML
    pub is_well_formed_xml: bool,

    /// Whether the record conforms to the metadata schema
    pub is_schema_valid: bool,

    /// Human-readable validator message, newlines stripped
    pub invalid_reason: Option<String>,

    /// Dataset title, when the record carries one
    pub title: Option<String>,
}

impl RecordValidationOutcome {
    /// Record that could not be fetched; all other fields absent
    pub fn unfetchable(record_url: impl Into<String>) -> Self {
        Self {
            record_url: record_url.into(),
            was_fetchable: false,
            is_well_formed_xml: false,
            is_schema_valid: false,
            invalid_reason: None,
            title: None,
        }
    }

    /// Record that fetched but is not well-formed XML
    pub fn malformed(record_url: impl Into<String>) -> Self {
        Self {
            record_url: record_url.into(),
            was_fetchable: true,
            is_well_formed_xml: false,
            is_schema_valid: false,
            invalid_reason: None,
            title: None,
        }
    }

    /// Well-formed record that failed schema validation
    pub fn invalid(
        record_url: impl Into<String>,
        title: Option<String>,
        reason: impl AsRef<str>,
    ) -> Self {
        Self {
            record_url: record_url.into(),
            was_fetchable: true,
            is_well_formed_xml: true,
            is_schema_valid: false,
            invalid_reason: Some(reason.as_ref().replace('\n', " ").trim().to_string()),
            title,
        }
    }

    /// Well-formed, schema-valid record
    pub fn valid(record_url: impl Into<String>, title: Option<String>) -> Self {
        Self {
            record_url: record_url.into(),
            was_fetchable: true,
            is_well_formed_xml: true,
            is_schema_valid: true,
            invalid_reason: None,
            title,
        }
    }
}

/// Everything one monitoring run produced
///
/// Node results follow configuration order; record results follow sitemap
/// enumeration order. Assembled once, then handed to presentation.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeCycle {
    /// Per-node health, in configuration order
    pub nodes: Vec<NodeHealth>,

    /// Per-record validation, in sitemap enumeration order
    pub records: Vec<RecordValidationOutcome>,

    /// When the cycle started
    pub generated_at: DateTime<Utc>,
}

impl ProbeCycle {
    pub fn new(nodes: Vec<NodeHealth>, records: Vec<RecordValidationOutcome>) -> Self {
        Self {
            nodes,
            records,
            generated_at: Utc::now(),
        }
    }

    /// Aggregate counters for the report header
    pub fn summary(&self) -> NetworkSummary {
        let nodes_up = self.nodes.iter().filter(|n| n.is_up()).count();
        let records_checked = self.records.iter().filter(|r| r.was_fetchable).count();
        let malformed = self
            .records
            .iter()
            .filter(|r| r.was_fetchable && !r.is_well_formed_xml)
            .count();
        let invalid = self
            .records
            .iter()
            .filter(|r| r.is_well_formed_xml && !r.is_schema_valid)
            .count();

        NetworkSummary {
            node_count: self.nodes.len(),
            nodes_up,
            nodes_down: self.nodes.len() - nodes_up,
            records_checked,
            records_not_checked: self.records.len() - records_checked,
            malformed_records: malformed,
            invalid_records: invalid,
        }
    }

    /// Partition record outcomes for the report sections
    pub fn partition_records(&self) -> RecordPartition<'_> {
        let mut partition = RecordPartition::default();
        for record in &self.records {
            if !record.was_fetchable {
                partition.not_fetchable.push(record);
            } else if !record.is_well_formed_xml {
                partition.malformed.push(record);
            } else if !record.is_schema_valid {
                partition.invalid.push(record);
            } else {
                partition.valid.push(record);
            }
        }
        partition
    }
}

/// Aggregate counters over one probe cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkSummary {
    pub node_count: usize,
    pub nodes_up: usize,
    pub nodes_down: usize,
    pub records_checked: usize,
    pub records_not_checked: usize,
    pub malformed_records: usize,
    pub invalid_records: usize,
}

/// Record outcomes split by the section of the report they belong to
#[derive(Debug, Default)]
pub struct RecordPartition<'a> {
    /// Could not be fetched at all
    pub not_fetchable: Vec<&'a RecordValidationOutcome>,
    /// Fetched but not well-formed XML
    pub malformed: Vec<&'a RecordValidationOutcome>,
    /// Well-formed but schema-invalid
    pub invalid: Vec<&'a RecordValidationOutcome>,
    /// Well-formed and schema-valid
    pub valid: Vec<&'a RecordValidationOutcome>,
}
