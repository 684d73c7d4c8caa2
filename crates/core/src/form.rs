//! Date/time handling for form-shaped input.
//!
//! Browsers submit `<input type="datetime-local">` values as `YYYY-MM-DDTHH:MM` (seconds
//! optional, no offset), while API clients usually send RFC 3339. Both are accepted here;
//! naive values are taken to be UTC. Output is always RFC 3339.

use crate::{EhrError, EhrResult};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

const DATETIME_LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M";

const NAIVE_INPUT_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Format a timestamp for a `datetime-local` input (minute precision, UTC).
pub fn format_datetime_local(dt: &DateTime<Utc>) -> String {
    dt.format(DATETIME_LOCAL_FORMAT).to_string()
}

/// Render a timestamp the way records are emitted on the wire.
pub fn format_rfc3339(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse a datetime from RFC 3339 or `datetime-local` form.
///
/// # Errors
///
/// Returns `EhrError::InvalidInput` if the input matches neither shape.
pub fn parse_datetime_input(input: &str) -> EhrResult<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    NAIVE_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| EhrError::InvalidInput(format!("unrecognised date/time '{input}'")))
}

/// Serde adapter for `DateTime<Utc>` fields that accept form input.
///
/// Use with `#[serde(with = "crate::form::datetime_input")]`.
pub mod datetime_input {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_rfc3339(dt))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_datetime_input(&s).map_err(serde::de::Error::custom)
    }
}

/// Like [`datetime_input`] for optional fields.
pub mod optional_datetime_input {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(dt: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match dt {
            Some(dt) => serializer.serialize_some(&super::format_rfc3339(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|s| super::parse_datetime_input(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
