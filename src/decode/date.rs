//! Calendar-date handling for catalog timestamps
//!
//! CSW summaries and sitemaps carry timestamps as `YYYY-MM-DD` optionally
//! followed by a `T` and a time-of-day part the monitor never looks at.
//! [`DateStamp`] keeps the date-only prefix; because the format is
//! fixed-width, ordering is plain lexicographic string comparison.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::error::DecodeError;

/// A validated `YYYY-MM-DD` calendar date
///
/// No timezone handling: the sources mix zones freely and the dashboard
/// only needs day granularity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DateStamp(String);

impl DateStamp {
    /// Parse a timestamp, truncating at the first `T` separator
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidDate`] if the date-only prefix is not
    /// a valid `YYYY-MM-DD` calendar date.
    pub fn parse(text: &str) -> Result<Self, DecodeError> {
        let date_part = text.split('T').next().unwrap_or("").trim();
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .map_err(|_| DecodeError::InvalidDate(text.to_string()))?;
        Ok(Self(date_part.to_string()))
    }

    /// Date as a `YYYY-MM-DD` string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DateStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keep the later of the current maximum and a candidate
pub(crate) fn keep_max(current: &mut Option<DateStamp>, candidate: DateStamp) {
    match current {
        Some(existing) if *existing >= candidate => {}
        _ => *current = Some(candidate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_date() {
        let stamp = DateStamp::parse("2022-05-05").unwrap();
        assert_eq!(stamp.as_str(), "2022-05-05");
    }

    #[test]
    fn test_parse_truncates_time_part() {
        let stamp = DateStamp::parse("2021-06-15T09:30:00Z").unwrap();
        assert_eq!(stamp.as_str(), "2021-06-15");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(DateStamp::parse("not-a-date").is_err());
        assert!(DateStamp::parse("2021-13-01").is_err());
        assert!(DateStamp::parse("").is_err());
    }

    #[test]
    fn test_ordering_is_chronological() {
        let older = DateStamp::parse("2019-12-31").unwrap();
        let newer = DateStamp::parse("2021-06-15").unwrap();
        assert!(newer > older);
    }

    #[test]
    fn test_keep_max() {
        let mut max = None;
        keep_max(&mut max, DateStamp::parse("2020-01-01").unwrap());
        keep_max(&mut max, DateStamp::parse("2021-06-15").unwrap());
        keep_max(&mut max, DateStamp::parse("2019-12-31").unwrap());
        assert_eq!(max.unwrap().as_str(), "2021-06-15");
    }
}
