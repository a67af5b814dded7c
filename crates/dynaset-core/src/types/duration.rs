use crate::{
    model::DurationSpec,
    types::{TypeError, text_input},
    value::{Input, Value},
};
use chrono::TimeDelta;
use dynaset_primitives::Kind;
use std::fmt::Write as _;

const NANO: i128 = 1;
const MICRO: i128 = 1_000 * NANO;
const MILLI: i128 = 1_000 * MICRO;
const SECOND: i128 = 1_000 * MILLI;
const MINUTE: i128 = 60 * SECOND;
const HOUR: i128 = 60 * MINUTE;
const DAY: i128 = 24 * HOUR;
const WEEK: i128 = 7 * DAY;
const MONTH: i128 = 30 * DAY;
const YEAR: i128 = 12 * MONTH;

///
/// DurationType
///
/// Signed time span, bounded in whole seconds.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DurationType {
    min: Option<i64>,
    max: Option<i64>,
}

impl DurationType {
    #[must_use]
    pub fn new(spec: Option<&DurationSpec>) -> Self {
        let spec = spec.copied().unwrap_or_default();

        Self {
            min: spec.min,
            max: spec.max,
        }
    }

    #[must_use]
    pub const fn min(&self) -> Option<i64> {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> Option<i64> {
        self.max
    }

    pub(crate) fn validate_descriptor(self) -> Result<(), TypeError> {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min > max => Err(TypeError::descriptor(
                Kind::Duration,
                format!("invalid range [{min}s, {max}s]"),
            )),
            _ => Ok(()),
        }
    }

    pub(crate) fn decode(self, input: Input) -> Result<Value, TypeError> {
        let span = match input {
            Input::Null => None,
            Input::Value(Value::Duration(d)) => Some(d),
            Input::Value(Value::Int(n)) => Some(seconds(n)?),
            Input::Value(Value::Uint(n)) => Some(seconds(i64::try_from(n).map_err(|_| {
                TypeError::Inexact {
                    value: n.to_string(),
                    kind: Kind::Duration,
                }
            })?)?),
            Input::Value(Value::Float(v)) => Some(float_seconds(v)?),
            Input::Value(Value::Text(s)) => match text_input(&s) {
                None => None,
                Some(text) => Some(
                    parse_duration(text).ok_or_else(|| TypeError::parse(text, Kind::Duration))?,
                ),
            },
            Input::Value(v) => return Err(TypeError::convert(v.label(), Kind::Duration)),
            other @ (Input::Struct(_) | Input::List(_)) => {
                return Err(TypeError::UnsupportedTag {
                    tag: other.label(),
                    kind: Kind::Duration,
                });
            }
        };

        let value = span.map_or(Value::Null, Value::Duration);
        self.validate(&value)?;

        Ok(value)
    }

    pub(crate) fn validate(self, value: &Value) -> Result<(), TypeError> {
        let span = match value {
            Value::Null => {
                return match self.min {
                    Some(min) => Err(below("null", min)),
                    None => Ok(()),
                };
            }
            Value::Duration(d) => *d,
            other => return Err(TypeError::convert(other.label(), Kind::Duration)),
        };

        let secs = span.num_seconds();
        if let Some(min) = self.min
            && secs < min
        {
            return Err(below(&format_duration(span), min));
        }
        if let Some(max) = self.max
            && secs > max
        {
            return Err(TypeError::violation(
                "type.duration.max.violation",
                format!(
                    "duration value {} violates max boundary of {}",
                    format_duration(span),
                    format_duration(TimeDelta::seconds(max.clamp(-MAX_SECS, MAX_SECS)))
                ),
            ));
        }

        Ok(())
    }
}

// Largest whole-second span `TimeDelta::seconds` accepts.
const MAX_SECS: i64 = i64::MAX / 1_000;

fn below(value: &str, min: i64) -> TypeError {
    TypeError::violation(
        "type.duration.min.violation",
        format!(
            "duration value {value} violates min boundary of {}",
            format_duration(TimeDelta::seconds(min.clamp(-MAX_SECS, MAX_SECS)))
        ),
    )
}

fn seconds(n: i64) -> Result<TimeDelta, TypeError> {
    TimeDelta::try_seconds(n).ok_or_else(|| TypeError::Inexact {
        value: n.to_string(),
        kind: Kind::Duration,
    })
}

#[allow(clippy::cast_possible_truncation)]
fn float_seconds(v: f64) -> Result<TimeDelta, TypeError> {
    let inexact = || TypeError::Inexact {
        value: v.to_string(),
        kind: Kind::Duration,
    };
    if !v.is_finite() || v.abs() >= 9.2e15 {
        return Err(inexact());
    }

    let whole = v.trunc();
    let micros = ((v - whole) * 1e6).round() as i64;

    TimeDelta::try_seconds(whole as i64)
        .and_then(|d| d.checked_add(&TimeDelta::microseconds(micros)))
        .ok_or_else(inexact)
}

/// Parse duration text: a zero literal, an interval literal
/// (`1 day 02:00:00`, `3 mons`, `2 hours ago`), or a compact literal (`1h30m`).
#[must_use]
pub fn parse_duration(text: &str) -> Option<TimeDelta> {
    let text = text.trim();
    if text == "0" || text == "0s" {
        return Some(TimeDelta::zero());
    }

    let nanos = parse_interval(text).or_else(|| parse_compact(text))?;

    i64::try_from(nanos).ok().map(TimeDelta::nanoseconds)
}

fn interval_unit(unit: &str) -> Option<i128> {
    let unit = unit.to_ascii_lowercase();
    let nanos = match unit.as_str() {
        "microsecond" | "microseconds" | "usec" | "usecs" => MICRO,
        "millisecond" | "milliseconds" | "msec" | "msecs" => MILLI,
        "second" | "seconds" | "sec" | "secs" => SECOND,
        "minute" | "minutes" | "min" | "mins" => MINUTE,
        "hour" | "hours" | "hr" | "hrs" => HOUR,
        "day" | "days" => DAY,
        "week" | "weeks" => WEEK,
        "mon" | "mons" | "month" | "months" => MONTH,
        "year" | "years" | "yr" | "yrs" => YEAR,
        _ => return None,
    };

    Some(nanos)
}

fn parse_interval(text: &str) -> Option<i128> {
    let mut tokens = text.split_whitespace().peekable();
    let mut total: i128 = 0;
    let mut parts = 0;
    let mut ago = false;

    while let Some(token) = tokens.next() {
        if token.eq_ignore_ascii_case("ago") && tokens.peek().is_none() && parts > 0 {
            ago = true;
        } else if token.contains(':') {
            total = total.checked_add(parse_clock(token)?)?;
        } else {
            let amount = parse_decimal(token)?;
            let unit = match tokens.peek() {
                Some(next) if interval_unit(next).is_some() => {
                    let unit = interval_unit(next)?;
                    tokens.next();
                    unit
                }
                // A bare trailing number counts seconds.
                None => SECOND,
                Some(_) => return None,
            };
            total = total.checked_add(scale(amount, unit)?)?;
        }
        parts += 1;
    }

    if parts == 0 {
        return None;
    }

    Some(if ago { -total } else { total })
}

// `[-]HH:MM[:SS[.ffffff]]`
fn parse_clock(token: &str) -> Option<i128> {
    let (negative, body) = split_sign(token);
    let mut pieces = body.split(':');

    let hours: i128 = pieces.next()?.parse().ok()?;
    let minutes: i128 = pieces.next()?.parse().ok()?;
    let seconds = match pieces.next() {
        Some(s) => scale(parse_decimal(s)?, SECOND)?,
        None => 0,
    };
    if pieces.next().is_some() || minutes >= 60 || seconds >= MINUTE {
        return None;
    }

    let nanos = hours
        .checked_mul(HOUR)?
        .checked_add(minutes.checked_mul(MINUTE)?)?
        .checked_add(seconds)?;

    Some(if negative { -nanos } else { nanos })
}

/// Decimal amount as `(whole, fraction digits)`.
#[derive(Clone, Copy)]
struct Decimal {
    negative: bool,
    whole: i128,
    frac: i128,
    frac_digits: u32,
}

fn parse_decimal(token: &str) -> Option<Decimal> {
    let (negative, body) = split_sign(token);
    let (whole, frac) = body.split_once('.').unwrap_or((body, ""));
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    // Digits beyond nanosecond resolution carry no weight.
    let frac = &frac[..frac.len().min(18)];

    Some(Decimal {
        negative,
        whole: if whole.is_empty() { 0 } else { whole.parse().ok()? },
        frac: if frac.is_empty() { 0 } else { frac.parse().ok()? },
        frac_digits: u32::try_from(frac.len()).ok()?,
    })
}

fn scale(amount: Decimal, unit: i128) -> Option<i128> {
    let whole = amount.whole.checked_mul(unit)?;
    let frac = amount.frac.checked_mul(unit)? / 10_i128.pow(amount.frac_digits);
    let nanos = whole.checked_add(frac)?;

    Some(if amount.negative { -nanos } else { nanos })
}

fn split_sign(token: &str) -> (bool, &str) {
    if let Some(rest) = token.strip_prefix('-') {
        (true, rest)
    } else {
        (false, token.strip_prefix('+').unwrap_or(token))
    }
}

fn compact_unit(unit: &str) -> Option<i128> {
    match unit {
        "ns" => Some(NANO),
        "us" | "µs" | "μs" => Some(MICRO),
        "ms" => Some(MILLI),
        "s" => Some(SECOND),
        "m" => Some(MINUTE),
        "h" => Some(HOUR),
        _ => None,
    }
}

// `[-+]?(<decimal><unit>)+`
fn parse_compact(text: &str) -> Option<i128> {
    let (negative, mut rest) = split_sign(text);
    if rest.is_empty() {
        return None;
    }

    let mut total: i128 = 0;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let unit_end = rest[number_end..]
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .map_or(rest.len(), |i| number_end + i);

        let amount = parse_decimal(&rest[..number_end])?;
        let unit = compact_unit(&rest[number_end..unit_end])?;
        total = total.checked_add(scale(amount, unit)?)?;
        rest = &rest[unit_end..];
    }

    Some(if negative { -total } else { total })
}

/// Render a span in compact form: `1h30m0s`, `1.5s`, `250ms`, `0s`.
#[must_use]
pub fn format_duration(d: TimeDelta) -> String {
    let nanos = i128::from(d.num_seconds()) * SECOND + i128::from(d.subsec_nanos());
    if nanos == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    if nanos < 0 {
        out.push('-');
    }
    let abs = nanos.unsigned_abs();

    let second = SECOND.unsigned_abs();
    if abs < second {
        let (unit, label) = if abs < 1_000 {
            (1, "ns")
        } else if abs < 1_000_000 {
            (1_000, "µs")
        } else {
            (1_000_000, "ms")
        };
        push_decimal(&mut out, abs / unit, abs % unit, unit);
        out.push_str(label);
        return out;
    }

    let secs = abs / second;
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        let _ = write!(out, "{hours}h");
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{minutes}m");
    }
    push_decimal(&mut out, seconds, abs % second, second);
    out.push('s');

    out
}

fn push_decimal(out: &mut String, whole: u128, frac: u128, unit: u128) {
    let _ = write!(out, "{whole}");
    if frac == 0 {
        return;
    }

    let width = unit.ilog10() as usize;
    let digits = format!("{frac:0width$}");
    let _ = write!(out, ".{}", digits.trim_end_matches('0'));
}

///
/// TESTS
///
