//! Decoder for sitemap XML documents
//!
//! GeoNetwork portals repurpose a sitemap as a record index: one top-level
//! entry per metadata record, each carrying the record URL in its first
//! child (`loc`) and an optional `lastmod` timestamp.

use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

use super::date::{keep_max, DateStamp};
use crate::error::DecodeError;

/// Sitemap protocol namespace
const SITEMAP_NS: &[u8] = b"http://www.sitemaps.org/schemas/sitemap/0.9";

/// Aggregate view of a sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapSummary {
    /// Number of top-level entries (= published records)
    pub record_count: u64,
    /// Most recent `lastmod` value across entries, date-only
    pub last_modified: Option<DateStamp>,
}

/// Parse a sitemap into a record count and last-modified maximum
///
/// # Errors
///
/// Returns a [`DecodeError`] if the body is not well-formed XML or a
/// `lastmod` value is outside the `YYYY-MM-DD` shape.
pub fn parse_sitemap(body: &str) -> Result<SitemapSummary, DecodeError> {
    let mut reader = NsReader::from_str(body);
    let mut depth = 0usize;
    let mut record_count = 0u64;
    let mut last_modified: Option<DateStamp> = None;
    let mut in_lastmod = false;

    loop {
        match reader.read_resolved_event()? {
            (ns, Event::Start(e)) => {
                if depth == 1 {
                    record_count += 1;
                }
                if depth == 2 && is_sitemap_element(&ns, e.local_name().as_ref(), b"lastmod") {
                    in_lastmod = true;
                }
                depth += 1;
            }
            (_, Event::Empty(_)) => {
                if depth == 1 {
                    record_count += 1;
                }
            }
            (_, Event::Text(t)) => {
                if in_lastmod {
                    let text = String::from_utf8_lossy(&t);
                    keep_max(&mut last_modified, DateStamp::parse(&text)?);
                }
            }
            (_, Event::End(_)) => {
                depth = depth.saturating_sub(1);
                in_lastmod = false;
            }
            (_, Event::Eof) => {
                if depth != 0 {
                    return Err(DecodeError::Truncated);
                }
                break;
            }
            _ => {}
        }
    }

    Ok(SitemapSummary {
        record_count,
        last_modified,
    })
}

/// Enumerate record URLs from a sitemap, in document order
///
/// Takes the text of the first child element (`loc`) of each top-level
/// entry, raw as published. Callers normalise the URLs to the record-XML
/// form they need.
///
/// # Errors
///
/// Returns a [`DecodeError`] if the body is not well-formed XML.
pub fn record_locations(body: &str) -> Result<Vec<String>, DecodeError> {
    let mut reader = NsReader::from_str(body);
    let mut depth = 0usize;
    let mut child_index = 0usize;
    let mut in_first_child = false;
    let mut locations = Vec::new();

    loop {
        match reader.read_resolved_event()? {
            (_, Event::Start(_)) => {
                if depth == 1 {
                    child_index = 0;
                }
                if depth == 2 {
                    child_index += 1;
                    in_first_child = child_index == 1;
                }
                depth += 1;
            }
            (_, Event::Empty(_)) => {
                if depth == 2 {
                    child_index += 1;
                }
            }
            (_, Event::Text(t)) => {
                if in_first_child {
                    let text = String::from_utf8_lossy(&t);
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        locations.push(trimmed.to_string());
                    }
                }
            }
            (_, Event::End(_)) => {
                depth = depth.saturating_sub(1);
                in_first_child = false;
            }
            (_, Event::Eof) => {
                if depth != 0 {
                    return Err(DecodeError::Truncated);
                }
                break;
            }
            _ => {}
        }
    }

    Ok(locations)
}

/// Match a sitemap-namespace element by local name
fn is_sitemap_element(ns: &ResolveResult<'_>, local: &[u8], expected: &[u8]) -> bool {
    matches!(ns, ResolveResult::Bound(namespace) if namespace.as_ref() == SITEMAP_NS)
        && local == expected
}
