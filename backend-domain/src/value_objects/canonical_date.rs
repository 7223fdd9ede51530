// Canonical date value object
// Fixed `YYYY-MM-DD` text used for storage and for idempotence comparisons

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";
const CANONICAL_DATE_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalDate(NaiveDate);

impl CanonicalDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Parses only the strict canonical form; anything else is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        if !has_canonical_shape(value) {
            return None;
        }
        NaiveDate::parse_from_str(value, CANONICAL_DATE_FORMAT)
            .ok()
            .map(Self)
    }
}

impl fmt::Display for CanonicalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CANONICAL_DATE_FORMAT))
    }
}

impl From<NaiveDate> for CanonicalDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl Serialize for CanonicalDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CanonicalDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        CanonicalDate::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("'{}' is not a YYYY-MM-DD date", raw)))
    }
}

/// True when `value` is exactly `YYYY-MM-DD` and names a real calendar day.
pub fn is_canonical_date(value: &str) -> bool {
    CanonicalDate::parse(value).is_some()
}

fn has_canonical_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != CANONICAL_DATE_LEN {
        return false;
    }
    bytes.iter().enumerate().all(|(idx, byte)| match idx {
        4 | 7 => *byte == b'-',
        _ => byte.is_ascii_digit(),
    })
}
