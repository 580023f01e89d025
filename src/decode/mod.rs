//! XML and protocol decoding
//!
//! Pure functions turning CSW `GetRecords` responses and sitemap documents
//! into structured counts, dates, and record URL lists. No I/O and no
//! hidden state: the same bytes always decode to the same values.

pub mod csw;
pub mod date;
pub mod sitemap;

pub use csw::{count_csw_records, extract_csw_date_range};
pub use date::DateStamp;
pub use sitemap::{parse_sitemap, record_locations, SitemapSummary};

use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// Check whether a document parses as well-formed XML with a root element
pub fn is_well_formed(body: &str) -> bool {
    let mut reader = Reader::from_str(body);
    let mut saw_element = false;
    let mut depth = 0usize;
    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => {
                saw_element = true;
                depth += 1;
            }
            Ok(Event::Empty(_)) => saw_element = true,
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) => return saw_element && depth == 0,
            Ok(_) => {}
            Err(_) => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_document() {
        assert!(is_well_formed("<a><b>text</b></a>"));
    }

    #[test]
    fn test_unclosed_element_is_malformed() {
        assert!(!is_well_formed("<a><b>text</a>"));
    }

    #[test]
    fn test_plain_text_is_not_a_document() {
        assert!(!is_well_formed("just some text"));
    }
}
