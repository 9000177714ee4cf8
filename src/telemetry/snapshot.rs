//! Telemetry snapshots and payload coercion.
//!
//! A payload from the device is a loosely-typed JSON mapping. Fields are
//! coerced individually: anything missing or of the wrong type becomes
//! unset (`None`), never a default such as `0`.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical unit of the producer-supplied `timestamp` field.
///
/// The raw number is converted to a UTC instant exactly once, when the
/// snapshot is built. Display and age computations both read the
/// converted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TimestampUnit {
    /// Milliseconds since the Unix epoch.
    #[default]
    Millis,
    /// Seconds since the Unix epoch.
    Seconds,
}

impl TimestampUnit {
    /// Convert a raw epoch number in this unit to a UTC instant.
    ///
    /// Returns `None` for non-finite or out-of-range values.
    pub fn to_datetime(self, raw: f64) -> Option<DateTime<Utc>> {
        let millis = match self {
            TimestampUnit::Millis => raw,
            TimestampUnit::Seconds => raw * 1_000.0,
        };
        if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
            return None;
        }
        DateTime::from_timestamp_millis(millis.round() as i64)
    }
}

/// State of the flame sensor.
///
/// Most flame modules pull their digital output low when a flame is seen,
/// so `0` means detected and `1` means clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Flame {
    Detected,
    Clear,
    Unknown,
}

impl Flame {
    fn from_field(value: Option<&Value>) -> Self {
        match value.and_then(integer) {
            Some(0) => Flame::Detected,
            Some(1) => Flame::Clear,
            _ => Flame::Unknown,
        }
    }

    /// The raw sensor value this state was decoded from, if known.
    pub fn raw(&self) -> Option<u8> {
        match self {
            Flame::Detected => Some(0),
            Flame::Clear => Some(1),
            Flame::Unknown => None,
        }
    }
}

/// One immutable telemetry sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Temperature in °C.
    pub temperature: Option<f64>,
    /// Relative humidity in %.
    pub humidity: Option<f64>,
    /// Raw gas sensor ADC reading (nominally 0-4095).
    pub gas: Option<i64>,
    pub flame: Flame,
    pub alarm: bool,
    /// Producer-supplied time of the reading.
    pub timestamp: Option<DateTime<Utc>>,
    /// Local wall-clock time the sample was received.
    pub arrival: DateTime<Utc>,
}

impl Snapshot {
    /// Build a snapshot from a present payload.
    ///
    /// Non-object payloads yield a snapshot with every field unset.
    pub fn from_value(value: &Value, arrival: DateTime<Utc>, unit: TimestampUnit) -> Self {
        let field = |name: &str| value.as_object().and_then(|map| map.get(name));

        Self {
            temperature: field("temperature").and_then(Value::as_f64),
            humidity: field("humidity").and_then(Value::as_f64),
            gas: field("gas").and_then(integer),
            flame: Flame::from_field(field("flame")),
            alarm: field("alarm").is_some_and(truthy),
            timestamp: field("timestamp")
                .and_then(Value::as_f64)
                .and_then(|raw| unit.to_datetime(raw)),
            arrival,
        }
    }

    /// Time between the producer's reading and local arrival.
    ///
    /// Negative when the producer's clock runs ahead of ours.
    pub fn age(&self) -> Option<TimeDelta> {
        self.timestamp.map(|ts| self.arrival - ts)
    }
}

/// Integers, or floats without a fractional part.
fn integer(value: &Value) -> Option<i64> {
    if let Some(i) = value.as_i64() {
        return Some(i);
    }
    let f = value.as_f64()?;
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn arrival() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_full_payload() {
        let value = json!({
            "temperature": 24.5,
            "humidity": 41.0,
            "gas": 812,
            "flame": 1,
            "alarm": false,
            "timestamp": 1_699_999_998_000i64
        });

        let snapshot = Snapshot::from_value(&value, arrival(), TimestampUnit::Millis);
        assert_eq!(snapshot.temperature, Some(24.5));
        assert_eq!(snapshot.humidity, Some(41.0));
        assert_eq!(snapshot.gas, Some(812));
        assert_eq!(snapshot.flame, Flame::Clear);
        assert!(!snapshot.alarm);
        assert_eq!(snapshot.age(), Some(TimeDelta::seconds(2)));
    }

    #[test]
    fn test_missing_fields_are_unset_not_zero() {
        let snapshot = Snapshot::from_value(&json!({}), arrival(), TimestampUnit::Millis);
        assert_eq!(snapshot.temperature, None);
        assert_eq!(snapshot.humidity, None);
        assert_eq!(snapshot.gas, None);
        assert_eq!(snapshot.flame, Flame::Unknown);
        assert!(!snapshot.alarm);
        assert_eq!(snapshot.timestamp, None);
    }

    #[test]
    fn test_malformed_fields_are_unset() {
        let value = json!({
            "temperature": "hot",
            "humidity": null,
            "gas": 12.5,
            "flame": 7,
            "alarm": "yes",
            "timestamp": "yesterday"
        });

        let snapshot = Snapshot::from_value(&value, arrival(), TimestampUnit::Millis);
        assert_eq!(snapshot.temperature, None);
        assert_eq!(snapshot.humidity, None);
        assert_eq!(snapshot.gas, None);
        assert_eq!(snapshot.flame, Flame::Unknown);
        assert!(!snapshot.alarm);
        assert_eq!(snapshot.timestamp, None);
    }

    #[test]
    fn test_flame_zero_is_detected() {
        let snapshot = Snapshot::from_value(&json!({"flame": 0}), arrival(), TimestampUnit::Millis);
        assert_eq!(snapshot.flame, Flame::Detected);
        assert_eq!(snapshot.flame.raw(), Some(0));
    }

    #[test]
    fn test_numeric_alarm_is_truthy() {
        let on = Snapshot::from_value(&json!({"alarm": 1}), arrival(), TimestampUnit::Millis);
        let off = Snapshot::from_value(&json!({"alarm": 0}), arrival(), TimestampUnit::Millis);
        assert!(on.alarm);
        assert!(!off.alarm);
    }

    #[test]
    fn test_non_object_payload() {
        let snapshot = Snapshot::from_value(&json!(42), arrival(), TimestampUnit::Millis);
        assert_eq!(snapshot.temperature, None);
        assert!(!snapshot.alarm);
    }

    #[test]
    fn test_timestamp_units_agree() {
        let millis = Snapshot::from_value(
            &json!({"timestamp": 1_700_000_000_000i64}),
            arrival(),
            TimestampUnit::Millis,
        );
        let seconds = Snapshot::from_value(
            &json!({"timestamp": 1_700_000_000}),
            arrival(),
            TimestampUnit::Seconds,
        );
        assert_eq!(millis.timestamp, seconds.timestamp);
        assert_eq!(millis.age(), Some(TimeDelta::zero()));
    }

    #[test]
    fn test_timestamp_out_of_range() {
        assert_eq!(TimestampUnit::Seconds.to_datetime(1e300), None);
        assert_eq!(TimestampUnit::Millis.to_datetime(f64::NAN), None);
    }
}
