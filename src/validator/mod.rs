//! Per-record validation
//!
//! Each catalog record named by the authoritative sitemap is fetched as
//! XML, checked for well-formedness, and validated against the compiled
//! schema. The record's dataset title is extracted along the way so the
//! report can name what failed, not just where.

pub mod schema;

use std::sync::Arc;
use tracing::{debug, error};

use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

use crate::decode::is_well_formed;
use crate::error::FailureKind;
use crate::models::RecordValidationOutcome;
use crate::probe::HttpFetcher;

pub use schema::{schema_locations, Schema, SchemaViolation};

/// ISO 19115/19139 metadata namespace
const GMD_NS: &[u8] = b"http://www.isotc211.org/2005/gmd";

/// ISO geographic common objects namespace
const GCO_NS: &[u8] = b"http://www.isotc211.org/2005/gco";

/// Element path identifying the dataset title inside a metadata record
///
/// Matched as a suffix of the open-element stack, so the absolute position
/// of `identificationInfo` within the record does not matter.
const TITLE_PATH: &[(&[u8], &[u8])] = &[
    (GMD_NS, b"identificationInfo"),
    (GMD_NS, b"MD_DataIdentification"),
    (GMD_NS, b"citation"),
    (GMD_NS, b"CI_Citation"),
    (GMD_NS, b"title"),
    (GCO_NS, b"CharacterString"),
];

/// Validates individual catalog records
pub struct RecordValidator {
    fetcher: Arc<HttpFetcher>,
    schema: Arc<Schema>,
}

impl RecordValidator {
    pub fn new(fetcher: Arc<HttpFetcher>, schema: Arc<Schema>) -> Self {
        Self { fetcher, schema }
    }

    /// Validate one record; never fails, the failure mode is in the result
    pub async fn validate(&self, record_url: &str) -> RecordValidationOutcome {
        let body = match self.fetcher.get(record_url).await {
            Ok(fetched) => fetched.body,
            Err(err) => {
                match err.kind() {
                    FailureKind::Network | FailureKind::Http => {
                        debug!(record = record_url, error = %err, "Record not fetchable")
                    }
                    _ => error!(record = record_url, error = %err, "Unclassified record failure"),
                }
                return RecordValidationOutcome::unfetchable(record_url);
            }
        };

        if !is_well_formed(&body) {
            debug!(record = record_url, "Record is not well-formed XML");
            return RecordValidationOutcome::malformed(record_url);
        }

        let title = extract_title(&body);

        match self.schema.validate(&body) {
            Ok(()) => RecordValidationOutcome::valid(record_url, title),
            Err(violation) => {
                debug!(record = record_url, violation = %violation, "Record failed schema validation");
                RecordValidationOutcome::invalid(record_url, title, violation.message())
            }
        }
    }
}

/// Extract the dataset title from a well-formed metadata record
///
/// Walks the document with a namespace-aware element stack and returns the
/// text of the last element whose open path ends in [`TITLE_PATH`]. Absent
/// or empty titles yield `None`.
pub fn extract_title(body: &str) -> Option<String> {
    let mut reader = NsReader::from_str(body);
    let mut stack: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();
    let mut title: Option<String> = None;

    loop {
        match reader.read_resolved_event() {
            Ok((ns, Event::Start(e))) => {
                let namespace = match ns {
                    ResolveResult::Bound(n) => n.as_ref().to_vec(),
                    _ => Vec::new(),
                };
                stack.push((namespace, e.local_name().as_ref().to_vec()));
            }
            Ok((_, Event::End(_))) => {
                stack.pop();
            }
            Ok((_, Event::Text(text))) => {
                if stack_matches_title(&stack) {
                    let value = String::from_utf8_lossy(text.as_ref()).trim().to_string();
                    if !value.is_empty() {
                        title = Some(value);
                    }
                }
            }
            Ok((_, Event::Eof)) => break,
            Ok(_) => {}
            Err(_) => break,
        }
    }

    title
}

fn stack_matches_title(stack: &[(Vec<u8>, Vec<u8>)]) -> bool {
    if stack.len() < TITLE_PATH.len() {
        return false;
    }
    stack[stack.len() - TITLE_PATH.len()..]
        .iter()
        .zip(TITLE_PATH)
        .all(|((ns, local), (want_ns, want_local))| {
            ns.as_slice() == *want_ns && local.as_slice() == *want_local
        })
}
