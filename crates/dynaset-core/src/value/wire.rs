use crate::value::{Lookup, Value};
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Number;

/// Generic tagged value exchanged with the transport boundary.
pub type WireValue = serde_json::Value;

/// String-keyed map of wire values.
pub type WireMap = serde_json::Map<String, WireValue>;

const MICROS_PER_SEC: f64 = 1_000_000.0;

impl Value {
    /// Lower this value into its generic wire form.
    ///
    /// Temporal values become seconds, lookups become `{id,name,type}` maps
    /// without empty members, and binary data becomes base64 text.
    #[must_use]
    pub fn to_wire(&self) -> WireValue {
        match self {
            Self::Null => WireValue::Null,
            Self::Bool(v) => WireValue::Bool(*v),
            Self::Int(v) => WireValue::from(*v),
            Self::Uint(v) => WireValue::from(*v),
            Self::Float(v) => float_to_wire(*v),
            Self::Binary(v) => WireValue::String(STANDARD.encode(v)),
            Self::Text(v) => WireValue::String(v.clone()),
            Self::DateTime(v) => datetime_to_wire(*v),
            Self::Duration(v) => duration_to_wire(*v),
            Self::Lookup(v) => lookup_to_wire(v),
            Self::List(items) => WireValue::Array(items.iter().map(Self::to_wire).collect()),
        }
    }
}

fn float_to_wire(v: f64) -> WireValue {
    Number::from_f64(v).map_or(WireValue::Null, WireValue::Number)
}

// Whole seconds stay integral; fractions keep microsecond resolution.
fn datetime_to_wire(v: DateTime<Utc>) -> WireValue {
    let secs = v.timestamp();
    let nanos = v.timestamp_subsec_nanos();
    if nanos == 0 {
        return WireValue::from(secs);
    }

    #[allow(clippy::cast_precision_loss)]
    let seconds = secs as f64 + f64::from(nanos / 1_000) / MICROS_PER_SEC;

    float_to_wire(seconds)
}

fn duration_to_wire(v: TimeDelta) -> WireValue {
    let secs = v.num_seconds();
    let nanos = v.subsec_nanos();
    if nanos == 0 {
        return WireValue::from(secs);
    }

    #[allow(clippy::cast_precision_loss)]
    let seconds = secs as f64 + f64::from(nanos / 1_000) / MICROS_PER_SEC;

    float_to_wire(seconds)
}

fn lookup_to_wire(v: &Lookup) -> WireValue {
    if v.is_empty() {
        return WireValue::Null;
    }

    let mut map = WireMap::new();
    for (key, member) in [("id", &v.id), ("name", &v.name), ("type", &v.type_path)] {
        if !member.is_empty() {
            map.insert(key.to_string(), WireValue::String(member.clone()));
        }
    }

    WireValue::Object(map)
}
