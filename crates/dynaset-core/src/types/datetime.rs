use crate::{
    model::DatetimeSpec,
    types::{TypeError, text_input},
    value::{Input, Value},
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use dynaset_primitives::Kind;

/// Layout used when a descriptor does not configure one.
pub const DEFAULT_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

// Timestamp text of the form `2024-11-18 17:37:43.527 +0000 UTC`.
const EXTENDED_LAYOUT: &str = "%Y-%m-%d %H:%M:%S%.f %z";
const DEFAULT_FRACTIONAL_LAYOUT: &str = "%Y-%m-%d %H:%M:%S%.f";

const NANOS_PER_SEC: i64 = 1_000_000_000;

///
/// Precision
///
/// Unit of an integer timestamp.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Precision {
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
}

impl Precision {
    pub const ALL: [Self; 4] = [
        Self::Second,
        Self::Millisecond,
        Self::Microsecond,
        Self::Nanosecond,
    ];

    #[must_use]
    pub const fn units_per_second(self) -> i64 {
        match self {
            Self::Second => 1,
            Self::Millisecond => 1_000,
            Self::Microsecond => 1_000_000,
            Self::Nanosecond => NANOS_PER_SEC,
        }
    }

    const fn nanos_per_unit(self) -> i64 {
        NANOS_PER_SEC / self.units_per_second()
    }

    /// Unit implied by the magnitude of a raw timestamp.
    #[must_use]
    pub const fn of_magnitude(abs: u64) -> Self {
        if abs > 1_000_000_000_000_000_000 {
            Self::Nanosecond
        } else if abs > 1_000_000_000_000_000 {
            Self::Microsecond
        } else if abs > 1_000_000_000_000 {
            Self::Millisecond
        } else {
            Self::Second
        }
    }
}

/// Instant `n` units after the unix epoch, or `None` outside the supported range.
#[must_use]
pub fn cast_from_number(n: i64, precision: Precision) -> Option<DateTime<Utc>> {
    let per = precision.units_per_second();
    let secs = n.div_euclid(per);
    let nanos = u32::try_from(n.rem_euclid(per) * precision.nanos_per_unit()).ok()?;

    DateTime::from_timestamp(secs, nanos)
}

/// Whole units since the unix epoch, truncated toward the past.
#[must_use]
pub fn cast_to_number(t: DateTime<Utc>, precision: Precision) -> i64 {
    let sub = i64::from(t.timestamp_subsec_nanos().min(999_999_999));

    t.timestamp()
        .saturating_mul(precision.units_per_second())
        .saturating_add(sub / precision.nanos_per_unit())
}

/// Interpret an integer timestamp by magnitude.
#[must_use]
pub fn from_timestamp(n: i64) -> Option<DateTime<Utc>> {
    cast_from_number(n, Precision::of_magnitude(n.unsigned_abs()))
}

/// Interpret a float timestamp by magnitude; seconds keep microsecond resolution.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn from_float_timestamp(v: f64) -> Option<DateTime<Utc>> {
    if !v.is_finite() || v.abs() >= 9.2e18 {
        return None;
    }

    match Precision::of_magnitude(v.abs() as u64) {
        Precision::Second => {
            let mut secs = v.floor();
            let mut micros = ((v - secs) * 1e6).round();
            if micros >= 1e6 {
                secs += 1.0;
                micros = 0.0;
            }

            DateTime::from_timestamp(secs as i64, (micros as u32) * 1_000)
        }
        precision => cast_from_number(v as i64, precision),
    }
}

///
/// DateTimeType
///
/// UTC instant with a configurable text layout.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DateTimeType {
    layout: Option<String>,
}

impl DateTimeType {
    #[must_use]
    pub fn new(spec: Option<&DatetimeSpec>) -> Self {
        Self {
            layout: spec.and_then(|s| s.format.clone()).filter(|l| !l.is_empty()),
        }
    }

    #[must_use]
    pub fn layout(&self) -> &str {
        self.layout.as_deref().unwrap_or(DEFAULT_LAYOUT)
    }

    /// Render an instant with the configured layout.
    #[must_use]
    pub fn format(&self, t: DateTime<Utc>) -> String {
        t.format(self.layout()).to_string()
    }

    pub(crate) fn decode(&self, input: Input) -> Result<Value, TypeError> {
        let parsed = match input {
            Input::Null => return Ok(Value::Null),
            Input::Value(Value::DateTime(t)) => Some(t),
            Input::Value(Value::Int(n)) => from_timestamp(n),
            Input::Value(Value::Uint(n)) => i64::try_from(n).ok().and_then(from_timestamp),
            Input::Value(Value::Float(v)) => from_float_timestamp(v),
            Input::Value(Value::Text(s)) => match text_input(&s) {
                None => return Ok(Value::Null),
                Some(text) => {
                    return self
                        .parse(text)
                        .map(Value::DateTime)
                        .ok_or_else(|| TypeError::parse(text, Kind::Datetime));
                }
            },
            Input::Value(v) => return Err(TypeError::convert(v.label(), Kind::Datetime)),
            other @ (Input::Struct(_) | Input::List(_)) => {
                return Err(TypeError::UnsupportedTag {
                    tag: other.label(),
                    kind: Kind::Datetime,
                });
            }
        };

        parsed.map(Value::DateTime).ok_or_else(|| TypeError::Inexact {
            value: "timestamp".to_string(),
            kind: Kind::Datetime,
        })
    }

    /// Try each accepted text form in turn, ending with a numeric timestamp.
    fn parse(&self, text: &str) -> Option<DateTime<Utc>> {
        parse_extended(text)
            .or_else(|| self.layout.as_deref().and_then(|l| parse_layout(text, l)))
            .or_else(|| DateTime::parse_from_rfc2822(text).ok().map(|t| t.to_utc()))
            .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|t| t.to_utc()))
            .or_else(|| parse_layout(text, DEFAULT_FRACTIONAL_LAYOUT))
            .or_else(|| parse_numeric(text))
    }

    pub(crate) fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match value {
            Value::Null | Value::DateTime(_) => Ok(()),
            other => Err(TypeError::convert(other.label(), Kind::Datetime)),
        }
    }
}

fn parse_extended(text: &str) -> Option<DateTime<Utc>> {
    // A trailing zone abbreviation is informational; the offset is authoritative.
    let trimmed = match text.rsplit_once(' ') {
        Some((head, zone))
            if head.matches(' ').count() >= 2
                && !zone.is_empty()
                && zone.chars().all(|c| c.is_ascii_alphabetic()) =>
        {
            head
        }
        _ => text,
    };

    DateTime::parse_from_str(trimmed, EXTENDED_LAYOUT)
        .ok()
        .map(|t| t.to_utc())
}

fn parse_layout(text: &str, layout: &str) -> Option<DateTime<Utc>> {
    if layout.contains("%z") || layout.contains("%:z") || layout.contains("%#z") {
        return DateTime::parse_from_str(text, layout)
            .ok()
            .map(|t| t.to_utc());
    }

    NaiveDateTime::parse_from_str(text, layout)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, layout)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|t| t.and_utc())
}

fn parse_numeric(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(n) = text.parse::<i64>() {
        return from_timestamp(n);
    }

    text.parse::<f64>().ok().and_then(from_float_timestamp)
}

///
/// TESTS
///
