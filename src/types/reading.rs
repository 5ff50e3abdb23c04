//! Defines [`Reading`], a single meteorological field value as reported by AEMET.
//!
//! AEMET ships every measurement as a string with a comma decimal separator
//! (`"12,3"`), occasionally replaced by a provider code such as `"Ip"` (trace
//! precipitation) or `"Acum"` (accumulated over several days). A field the
//! provider omits entirely is kept as [`Reading::Missing`], which serializes as
//! the [`MISSING_SENTINEL`] string so it can never be confused with a zero.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Placeholder written for fields that are absent in the source record.
pub const MISSING_SENTINEL: &str = "no_data";

/// One field of a daily observation.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Reading {
    /// A numeric measurement.
    Value(f64),
    /// A non-numeric provider code that still carries meaning (e.g. `"Ip"`).
    Flag(String),
    /// The field was not present in the source record.
    #[default]
    Missing,
}

impl Reading {
    /// Builds a reading from the raw JSON value of a provider field.
    ///
    /// `None` and JSON `null` map to [`Reading::Missing`].
    pub fn from_raw(raw: Option<&Value>) -> Self {
        match raw {
            None | Some(Value::Null) => Reading::Missing,
            Some(Value::Number(n)) => n.as_f64().map_or(Reading::Missing, Reading::Value),
            Some(Value::String(s)) => Self::parse(s),
            Some(other) => Reading::Flag(other.to_string()),
        }
    }

    /// Parses a provider string, accepting both `,` and `.` as decimal separator.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == MISSING_SENTINEL {
            return Reading::Missing;
        }
        match trimmed.replace(',', ".").parse::<f64>() {
            Ok(value) if value.is_finite() => Reading::Value(value),
            _ => Reading::Flag(trimmed.to_string()),
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Reading::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Reading::Missing)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Value(v) => write!(f, "{v}"),
            Reading::Flag(flag) => f.write_str(flag),
            Reading::Missing => f.write_str(MISSING_SENTINEL),
        }
    }
}

impl Serialize for Reading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Reading::Value(v) => serializer.serialize_f64(*v),
            Reading::Flag(flag) => serializer.serialize_str(flag),
            Reading::Missing => serializer.serialize_str(MISSING_SENTINEL),
        }
    }
}

struct ReadingVisitor;

impl<'de> Visitor<'de> for ReadingVisitor {
    type Value = Reading;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a number, a provider code or the missing-value sentinel")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Reading, E> {
        Ok(Reading::Value(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Reading, E> {
        Ok(Reading::Value(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Reading, E> {
        Ok(Reading::Value(v as f64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Reading, E> {
        Ok(Reading::parse(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Reading, E> {
        Ok(Reading::Missing)
    }

    fn visit_none<E: de::Error>(self) -> Result<Reading, E> {
        Ok(Reading::Missing)
    }
}

impl<'de> Deserialize<'de> for Reading {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ReadingVisitor)
    }
}
