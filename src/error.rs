//! Error types for the sdxmon monitor
//!
//! Every failure a probe or validation task can hit is collapsed into the
//! closed [`FailureKind`] set, so call sites classify once instead of
//! matching a different error shape per layer.

use thiserror::Error;

/// Closed classification of task failures
///
/// Recoverable kinds (`Network`, `Http`, `Parse`) become absent fields in
/// the task's result; `SchemaInvalid` is surfaced as data, never as a
/// fault; `Unclassified` is logged once and the task reported down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Connection refused, DNS, TLS, or timeout
    Network,
    /// The server answered with a non-success HTTP status
    Http,
    /// Malformed XML or missing expected structure
    Parse,
    /// Well-formed record that does not conform to the schema
    SchemaInvalid,
    /// Anything not covered by the closed set
    Unclassified,
}

impl FailureKind {
    /// Recoverable failures turn into absent fields rather than aborting
    /// the per-node / per-record task.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Unclassified)
    }
}

/// Errors that can occur during HTTP fetching operations
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status code
    #[error("HTTP status {0}")]
    Status(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Http(e) if e.is_builder() => FailureKind::Unclassified,
            Self::Http(_) | Self::Timeout => FailureKind::Network,
            Self::Status(_) => FailureKind::Http,
        }
    }

    /// HTTP status code, when the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status(code) => Some(*code),
            _ => None,
        }
    }
}

/// Errors that can occur while decoding CSW responses and sitemaps
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The document is not well-formed XML
    #[error("Malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// An element the envelope format requires is absent
    #[error("Missing expected element: {0}")]
    MissingElement(&'static str),

    /// An attribute the envelope format requires is absent
    #[error("Missing expected attribute: {0}")]
    MissingAttribute(&'static str),

    /// A record count attribute that does not parse as an integer
    #[error("Invalid record count: {0:?}")]
    InvalidCount(String),

    /// A date value outside the fixed-width YYYY-MM-DD shape
    #[error("Invalid date value: {0:?}")]
    InvalidDate(String),

    /// Input ended with elements still open
    #[error("Truncated XML document")]
    Truncated,
}

impl DecodeError {
    pub fn kind(&self) -> FailureKind {
        FailureKind::Parse
    }
}

/// A URL that lacks the marker substring a derivation depends on
///
/// Raised instead of slicing blindly; the prober treats it as a
/// recoverable discovery failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("URL {url:?} lacks expected marker {marker:?}")]
pub struct DerivationError {
    pub url: String,
    pub marker: &'static str,
}

impl DerivationError {
    pub fn new(url: impl Into<String>, marker: &'static str) -> Self {
        Self {
            url: url.into(),
            marker,
        }
    }

    pub fn kind(&self) -> FailureKind {
        FailureKind::Parse
    }
}

/// Errors raised while compiling an XML Schema document
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The schema document itself is not well-formed XML
    #[error("Malformed schema document: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Unified error type for the sdxmon crate
#[derive(Error, Debug)]
pub enum Error {
    /// Fetch-specific errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Decoder errors
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// URL derivation errors
    #[error("Derivation error: {0}")]
    Derivation(#[from] DerivationError),

    /// Schema compilation errors
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify into the closed [`FailureKind`] set
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Fetch(e) => e.kind(),
            Self::Decode(e) => e.kind(),
            Self::Derivation(e) => e.kind(),
            Self::Schema(_) => FailureKind::Parse,
            Self::Config(_) | Self::Io(_) => FailureKind::Unclassified,
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_status_kind() {
        let err = FetchError::Status(503);
        assert_eq!(err.kind(), FailureKind::Http);
        assert_eq!(err.status(), Some(503));
        assert!(err.kind().is_recoverable());
    }

    #[test]
    fn test_timeout_is_network() {
        let err = FetchError::Timeout;
        assert_eq!(err.kind(), FailureKind::Network);
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_decode_kind_is_parse() {
        let err = DecodeError::MissingAttribute("numberOfRecordsMatched");
        assert_eq!(err.kind(), FailureKind::Parse);
    }

    #[test]
    fn test_derivation_error_display() {
        let err = DerivationError::new("http://example.org/geonetwork", "catalog.search");
        assert!(err.to_string().contains("catalog.search"));
        assert_eq!(err.kind(), FailureKind::Parse);
    }

    #[test]
    fn test_unified_classification() {
        let err: Error = FetchError::Timeout.into();
        assert_eq!(err.kind(), FailureKind::Network);

        let err: Error = DecodeError::MissingElement("second top-level child").into();
        assert_eq!(err.kind(), FailureKind::Parse);

        let err = Error::config("empty node list");
        assert_eq!(err.kind(), FailureKind::Unclassified);
        assert!(!err.kind().is_recoverable());
    }
}
