//! Date normalization: raw wall-clock strings in a source timezone to UTC.
//!
//! Candidate formats are tried in order and matched strictly. A value must
//! have exactly the digit/separator shape of a format before chrono is asked
//! to parse it, so `2/1/2024 10:00` or `2024-01-02T10:00:00` never match.

use std::{fmt, str::FromStr};

use chrono::{FixedOffset, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use db::query::CANONICAL_TIMESTAMP_FORMAT;
use thiserror::Error;

/// `(shape, chrono format)`; `d` in a shape is any ASCII digit.
const CANDIDATE_FORMATS: [(&str, &str); 4] = [
    ("dddd-dd-dd dd:dd:dd", "%Y-%m-%d %H:%M:%S"),
    ("dddd-dd-dd dd:dd", "%Y-%m-%d %H:%M"),
    ("dd/dd/dddd dd:dd:dd", "%d/%m/%Y %H:%M:%S"),
    ("dd/dd/dddd dd:dd", "%d/%m/%Y %H:%M"),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateFormatError {
    #[error("Date '{input}' matches none of the accepted formats")]
    Unrecognized { input: String },
    #[error("Date '{input}' does not exist in timezone {timezone}")]
    NonexistentLocalTime { input: String, timezone: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown source timezone '{0}'")]
pub struct TimezoneError(pub String);

/// Timezone the raw values were recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTimezone {
    Utc,
    Fixed(FixedOffset),
    Named(Tz),
}

impl SourceTimezone {
    /// Accepts `UTC`, fixed offsets (`UTC+5`, `GMT-03:30`, `+05:30`) and IANA
    /// names (`Asia/Kolkata`).
    pub fn parse(raw: &str) -> Result<Self, TimezoneError> {
        let trimmed = raw.trim();
        let upper = trimmed.to_ascii_uppercase();
        if matches!(upper.as_str(), "UTC" | "GMT" | "Z") {
            return Ok(SourceTimezone::Utc);
        }

        let offset_part = upper
            .strip_prefix("UTC")
            .or_else(|| upper.strip_prefix("GMT"))
            .unwrap_or(upper.as_str());
        if offset_part.starts_with(['+', '-']) {
            return parse_fixed_offset(offset_part)
                .map(SourceTimezone::Fixed)
                .ok_or_else(|| TimezoneError(raw.to_string()));
        }

        Tz::from_str(trimmed)
            .map(SourceTimezone::Named)
            .map_err(|_| TimezoneError(raw.to_string()))
    }

    fn to_utc(&self, local: &NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            SourceTimezone::Utc => Some(*local),
            SourceTimezone::Fixed(offset) => earliest_utc(offset, local),
            SourceTimezone::Named(tz) => earliest_utc(tz, local),
        }
    }
}

impl fmt::Display for SourceTimezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceTimezone::Utc => f.write_str("UTC"),
            SourceTimezone::Fixed(offset) => write!(f, "UTC{offset}"),
            SourceTimezone::Named(tz) => f.write_str(tz.name()),
        }
    }
}

/// Ambiguous local times resolve to the earlier instant; times inside a
/// spring-forward gap have no instant at all.
fn earliest_utc<T: TimeZone>(tz: &T, local: &NaiveDateTime) -> Option<NaiveDateTime> {
    tz.from_local_datetime(local)
        .earliest()
        .map(|instant| instant.naive_utc())
}

/// `+5`, `-3`, `+05:30`, `+0530`.
fn parse_fixed_offset(raw: &str) -> Option<FixedOffset> {
    let (sign, rest) = match raw.split_at_checked(1)? {
        ("+", rest) => (1, rest),
        ("-", rest) => (-1, rest),
        _ => return None,
    };
    if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit() || c == ':') {
        return None;
    }

    let (hours, minutes) = match rest.split_once(':') {
        Some((hours, minutes)) if minutes.len() == 2 => (hours, minutes),
        Some(_) => return None,
        None if rest.len() == 4 => rest.split_at(2),
        None if rest.len() <= 2 => (rest, "0"),
        None => return None,
    };
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn matches_shape(input: &str, shape: &str) -> bool {
    input.len() == shape.len()
        && input
            .bytes()
            .zip(shape.bytes())
            .all(|(c, s)| if s == b'd' { c.is_ascii_digit() } else { c == s })
}

#[derive(Debug, Clone, Copy)]
pub struct DateNormalizer {
    timezone: SourceTimezone,
}

impl DateNormalizer {
    pub fn new(timezone: SourceTimezone) -> Self {
        Self { timezone }
    }

    /// Parses `raw` with the first matching format and converts it to UTC.
    pub fn normalize(&self, raw: &str) -> Result<NaiveDateTime, DateFormatError> {
        let input = raw.trim();
        let local = CANDIDATE_FORMATS
            .iter()
            .filter(|(shape, _)| matches_shape(input, shape))
            .find_map(|(_, format)| NaiveDateTime::parse_from_str(input, format).ok())
            .ok_or_else(|| DateFormatError::Unrecognized {
                input: raw.to_string(),
            })?;

        self.timezone
            .to_utc(&local)
            .ok_or_else(|| DateFormatError::NonexistentLocalTime {
                input: raw.to_string(),
                timezone: self.timezone.to_string(),
            })
    }

    /// [`DateNormalizer::normalize`] rendered as `YYYY-MM-DD HH:mm:ss`.
    pub fn normalize_to_string(&self, raw: &str) -> Result<String, DateFormatError> {
        self.normalize(raw)
            .map(|utc| utc.format(CANONICAL_TIMESTAMP_FORMAT).to_string())
    }
}
