//! Display formatting for readings.
//!
//! Unset readings always render as `--`, never as a zero value.

use chrono::{DateTime, Local, Utc};

use super::snapshot::Flame;

const UNSET: &str = "--";

pub fn format_temperature(temperature: Option<f64>) -> String {
    match temperature {
        Some(t) => format!("{:.1} °C", t),
        None => format!("{} °C", UNSET),
    }
}

pub fn format_humidity(humidity: Option<f64>) -> String {
    match humidity {
        Some(h) => format!("{:.1} %", h),
        None => format!("{} %", UNSET),
    }
}

pub fn format_gas(gas: Option<i64>) -> String {
    gas.map(|g| g.to_string()).unwrap_or_else(|| UNSET.to_string())
}

pub fn format_flame(flame: Flame) -> String {
    flame.raw().map(|f| f.to_string()).unwrap_or_else(|| UNSET.to_string())
}

pub fn format_alarm(alarm: bool) -> &'static str {
    if alarm {
        "YES"
    } else {
        "NO"
    }
}

/// Render a timestamp in local time.
pub fn format_timestamp(timestamp: Option<DateTime<Utc>>) -> String {
    match timestamp {
        Some(ts) => ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => UNSET.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_values_never_render_as_zero() {
        assert_eq!(format_temperature(None), "-- °C");
        assert_eq!(format_humidity(None), "-- %");
        assert_eq!(format_gas(None), "--");
        assert_eq!(format_flame(Flame::Unknown), "--");
        assert_eq!(format_timestamp(None), "--");
    }

    #[test]
    fn test_present_values() {
        assert_eq!(format_temperature(Some(0.0)), "0.0 °C");
        assert_eq!(format_temperature(Some(23.456)), "23.5 °C");
        assert_eq!(format_humidity(Some(55.0)), "55.0 %");
        assert_eq!(format_gas(Some(0)), "0");
        assert_eq!(format_flame(Flame::Detected), "0");
        assert_eq!(format_alarm(true), "YES");
    }

    #[test]
    fn test_timestamp_formats() {
        let ts = DateTime::from_timestamp(1_700_000_000, 0);
        assert_eq!(format_timestamp(ts).len(), "2023-11-14 22:13:20".len());
    }
}
