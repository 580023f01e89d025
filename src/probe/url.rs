//! URL derivations for discovery endpoints
//!
//! The network's nodes advertise one base URL each; the sitemap, CSW, and
//! record-XML endpoints are derived from it by marker-substring surgery.
//! Every derivation is a named function with its precondition in the
//! signature: a URL without the expected marker yields a recoverable
//! [`DerivationError`], never a slice panic.

use crate::error::DerivationError;

/// Marker identifying a sitemap-capable portal path
pub const PORTAL_MARKER: &str = "srv";

/// Catalog-search suffix of portal-style node URLs
pub const CATALOG_SUFFIX: &str = "catalog.search";

/// Fixed CSW GetRecords query string
const GET_RECORDS_QUERY: &str = "?SERVICE=CSW\
&VERSION=2.0.2\
&REQUEST=GetRecords\
&RESULTTYPE=results\
&OUTPUTFORMAT=application/xml\
&CONSTRAINTLANGUAGE=FILTER\
&TYPENAMES=gmd:MD_Metadata";

/// Sampling ceiling used when the record count is unknown
pub const DEFAULT_SAMPLE_CEILING: u64 = 1;

/// Whether a node URL points at a sitemap-capable portal
///
/// Heuristic from the deployed network: portal URLs carry the `srv` path
/// segment past the scheme.
pub fn is_portal_url(node_url: &str) -> bool {
    node_url.find(PORTAL_MARKER).is_some_and(|idx| idx > 0)
}

/// Derive the sitemap endpoint of a portal node
///
/// Precondition: the URL contains the catalog-search suffix. The suffix is
/// replaced with `portal.sitemap` and the language segment swapped for the
/// API segment.
pub fn sitemap_url(node_url: &str) -> Result<String, DerivationError> {
    let (prefix, _) = node_url
        .split_once(CATALOG_SUFFIX)
        .ok_or_else(|| DerivationError::new(node_url, CATALOG_SUFFIX))?;
    Ok(format!("{prefix}portal.sitemap").replace("/srv/eng/", "/srv/api/"))
}

/// Derive a CSW base URL from a node's root URL
///
/// Precondition: the URL contains the `geonetwork` segment. Everything
/// after it is dropped and the standard CSW path appended.
pub fn csw_base_from_root(node_url: &str) -> Result<String, DerivationError> {
    let (prefix, _) = node_url
        .split_once("geonetwork")
        .ok_or_else(|| DerivationError::new(node_url, "geonetwork"))?;
    Ok(format!("{prefix}geonetwork/srv/eng/csw"))
}

/// Derive a CSW base URL by stripping only the catalog-search suffix
///
/// Precondition: the URL contains the catalog-search suffix. This keeps
/// the `/geonetwork/srv/eng` middle segment the root derivation drops.
pub fn csw_base_from_portal(node_url: &str) -> Result<String, DerivationError> {
    let (prefix, _) = node_url
        .split_once(CATALOG_SUFFIX)
        .ok_or_else(|| DerivationError::new(node_url, CATALOG_SUFFIX))?;
    Ok(format!("{prefix}csw"))
}

/// CSW base URLs worth trying for a node, in recovery order
///
/// Deployed nodes differ in which derivation actually serves CSW, so both
/// are tried in sequence; neither is authoritative.
pub fn csw_base_candidates(node_url: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    for derived in [csw_base_from_root(node_url), csw_base_from_portal(node_url)]
        .into_iter()
        .flatten()
    {
        if !candidates.contains(&derived) {
            candidates.push(derived);
        }
    }
    candidates
}

/// Build a GetRecords query URL against a CSW base
///
/// With a sampling ceiling the query asks for full element sets capped at
/// `MAXRECORDS`; without one it is the bare count query.
pub fn get_records_url(csw_base: &str, sample_ceiling: Option<u64>) -> String {
    match sample_ceiling {
        Some(max_records) => format!(
            "{csw_base}{GET_RECORDS_QUERY}&ELEMENTSETNAME=full&MAXRECORDS={max_records}"
        ),
        None => format!("{csw_base}{GET_RECORDS_QUERY}"),
    }
}

/// Sampling ceiling for the date-range query
///
/// One past the reported count, so every record is sampled; when the
/// count is unknown the bounded [`DEFAULT_SAMPLE_CEILING`] applies.
pub fn sample_ceiling(record_count: Option<u64>) -> u64 {
    record_count
        .map(|count| count.saturating_add(1))
        .unwrap_or(DEFAULT_SAMPLE_CEILING)
}

/// Normalise a sitemap `loc` entry to the record's XML representation
///
/// Repairs the `:`-after-host artefact the authoritative sitemap emits,
/// forces the canonical `https://www.` host form, and appends the
/// GeoNetwork XML formatter path.
pub fn record_xml_url(location: &str) -> String {
    let repaired = location
        .replace(".ie:/", ".ie/")
        .replace("http://", "https://www.");
    format!("{repaired}/formatters/xml")
}
