use crate::error::ConfigError;
use chrono::NaiveDate;
use std::fmt;

/// Inclusive range of calendar days requested from the API.
///
/// AEMET expects both bounds as `YYYY-MM-DDTHH:MM:SSUTC` inside the URL path,
/// with the colons percent-encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Creates a new range. Fails if `start` lies after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ConfigError> {
        if start > end {
            return Err(ConfigError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub(crate) fn encoded_start(&self) -> String {
        encode_bound(self.start)
    }

    pub(crate) fn encoded_end(&self) -> String {
        encode_bound(self.end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

fn encode_bound(date: NaiveDate) -> String {
    format!("{}T00:00:00UTC", date.format("%Y-%m-%d")).replace(':', "%3A")
}
