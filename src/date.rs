//! The `<date>` value kind.
//!
//! ```rust
//! use serde::Deserialize;
//! use serde_xmlplist::Date;
//!
//! #[derive(Debug, Deserialize)]
//! struct Person {
//!     born: Date,
//! }
//!
//! let plist = r#"<plist version="1.0"><dict>
//!     <key>born</key><date>1809-02-12T09:18:00Z</date>
//! </dict></plist>"#;
//!
//! let person: Person = serde_xmlplist::from_str(plist).unwrap();
//! assert_eq!(person.born.to_string(), "1809-02-12T09:18:00Z");
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::{Serialize, Serializer};

use crate::error::Error;
use crate::parse_scalars::parse_date;

/// Newtype name the deserializer recognises as "a `<date>` is wanted here".
pub(crate) const DATE_NEWTYPE: &str = "__plist_date";

/// A timestamp decoded from `<date>`, kept with its original UTC offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Date(DateTime<FixedOffset>);

impl Date {
    /// Parse strict RFC3339 text (`YYYY-MM-DDTHH:MM:SS[.frac](Z|±HH:MM)`).
    pub fn parse(text: &str) -> Result<Self, Error> {
        parse_date(text).map(Date)
    }

    pub fn as_datetime(&self) -> &DateTime<FixedOffset> {
        &self.0
    }

    pub fn into_datetime(self) -> DateTime<FixedOffset> {
        self.0
    }
}

impl From<DateTime<FixedOffset>> for Date {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Date(value)
    }
}

impl From<Date> for DateTime<FixedOffset> {
    fn from(value: Date) -> Self {
        value.0
    }
}

impl FromStr for Date {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Date::parse(s)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

impl Serialize for Date {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_newtype_struct(DATE_NEWTYPE, DateVisitor)
    }
}

/// Accepts a `<date>` (handed over as a newtype around its text), or any RFC3339
/// string from other formats.
pub(crate) struct DateVisitor;

impl<'de> Visitor<'de> for DateVisitor {
    type Value = Date;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an RFC3339 date")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Date, E> {
        Date::parse(v).map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(self, deserializer: D) -> Result<Date, D::Error> {
        deserializer.deserialize_str(self)
    }
}
