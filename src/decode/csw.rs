//! Decoder for OGC CSW `GetRecords` response envelopes
//!
//! A `GetRecords` response carries two top-level children: a search status
//! element and a search results element. The record count lives on the
//! second child's `numberOfRecordsMatched` attribute; record summaries are
//! that child's children, each holding Dublin-Core date properties.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::{NsReader, Reader};

use super::date::{keep_max, DateStamp};
use crate::error::DecodeError;

/// Dublin Core elements namespace (`dc:date`)
const DC_ELEMENTS_NS: &[u8] = b"http://purl.org/dc/elements/1.1/";

/// Dublin Core terms namespace (`dct:modified`, `dct:created`)
const DC_TERMS_NS: &[u8] = b"http://purl.org/dc/terms/";

/// Count the `MD_Metadata` records a CSW reports as matched
///
/// The count is the `numberOfRecordsMatched` attribute on the second
/// top-level child of the response document.
///
/// # Errors
///
/// Returns a [`DecodeError`] if the body is not well-formed XML, the
/// second top-level child is absent, or the attribute is missing or not
/// an integer.
pub fn count_csw_records(body: &str) -> Result<u64, DecodeError> {
    let mut reader = Reader::from_str(body);
    let mut depth = 0usize;
    let mut top_children = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if depth == 1 {
                    top_children += 1;
                    if top_children == 2 {
                        return records_matched(&e);
                    }
                }
                depth += 1;
            }
            Event::Empty(e) => {
                if depth == 1 {
                    top_children += 1;
                    if top_children == 2 {
                        return records_matched(&e);
                    }
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => {
                if depth != 0 {
                    return Err(DecodeError::Truncated);
                }
                break;
            }
            _ => {}
        }
    }

    Err(DecodeError::MissingElement(
        "second top-level child of the GetRecords response",
    ))
}

/// Read the `numberOfRecordsMatched` attribute off a results element
fn records_matched(element: &BytesStart<'_>) -> Result<u64, DecodeError> {
    for attr in element.attributes().flatten() {
        if attr.key.as_ref() == b"numberOfRecordsMatched" {
            let raw = String::from_utf8_lossy(&attr.value);
            return raw
                .parse()
                .map_err(|_| DecodeError::InvalidCount(raw.into_owned()));
        }
    }
    Err(DecodeError::MissingAttribute("numberOfRecordsMatched"))
}

/// Which date maximum a Dublin-Core property feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateBucket {
    Created,
    Modified,
}

/// Extract the most recent created and modified dates from a full
/// `GetRecords` response
///
/// Walks every record summary inside the second top-level child. `dc:date`
/// and `dct:modified` values feed the modified maximum, `dct:created`
/// values the created maximum. A summary set without date properties
/// yields `None` for that field; that is data, not an error.
///
/// # Errors
///
/// Returns a [`DecodeError`] if the body is not well-formed XML or a date
/// property carries a value outside the `YYYY-MM-DD` shape.
pub fn extract_csw_date_range(
    body: &str,
) -> Result<(Option<DateStamp>, Option<DateStamp>), DecodeError> {
    let mut reader = NsReader::from_str(body);
    let mut depth = 0usize;
    let mut top_children = 0usize;
    let mut created: Option<DateStamp> = None;
    let mut modified: Option<DateStamp> = None;
    let mut bucket: Option<DateBucket> = None;

    loop {
        match reader.read_resolved_event()? {
            (ns, Event::Start(e)) => {
                if depth == 1 {
                    top_children += 1;
                }
                // Record summaries sit at depth 2, their properties at depth 3,
                // all inside the second top-level child.
                if depth == 3 && top_children == 2 {
                    bucket = bucket_for(&ns, e.local_name().as_ref());
                }
                depth += 1;
            }
            (_, Event::Empty(_)) => {
                if depth == 1 {
                    top_children += 1;
                }
            }
            (_, Event::Text(t)) => {
                if let Some(which) = bucket {
                    let text = String::from_utf8_lossy(&t);
                    let stamp = DateStamp::parse(&text)?;
                    match which {
                        DateBucket::Created => keep_max(&mut created, stamp),
                        DateBucket::Modified => keep_max(&mut modified, stamp),
                    }
                }
            }
            (_, Event::End(_)) => {
                depth = depth.saturating_sub(1);
                bucket = None;
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

    Ok((created, modified))
}

/// Classify a record property element by namespace and local name
fn bucket_for(ns: &ResolveResult<'_>, local: &[u8]) -> Option<DateBucket> {
    let bound = match ns {
        ResolveResult::Bound(namespace) => namespace.as_ref(),
        _ => return None,
    };
    match (bound, local) {
        (DC_ELEMENTS_NS, b"date") => Some(DateBucket::Modified),
        (DC_TERMS_NS, b"modified") => Some(DateBucket::Modified),
        (DC_TERMS_NS, b"created") => Some(DateBucket::Created),
        _ => None,
    }
}
