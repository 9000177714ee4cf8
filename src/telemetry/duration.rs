use std::time::Duration;

use anyhow::{bail, Result};

/// Suffix to milliseconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, f64)] = &[
    ("ms", 1.0),
    ("min", 60_000.0),
    ("s", 1_000.0),
    ("m", 60_000.0),
];

/// Parse duration strings like "10s", "500ms", "1.5s", "2m".
///
/// A bare number is read as seconds.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            return to_duration(val_str.trim().parse()?, *multiplier, s);
        }
    }

    match s.parse::<f64>() {
        Ok(secs) => to_duration(secs, 1_000.0, s),
        Err(_) => bail!("Unknown duration format: {}", s),
    }
}

fn to_duration(val: f64, multiplier: f64, original: &str) -> Result<Duration> {
    if !val.is_finite() || val < 0.0 {
        bail!("Duration out of range: {}", original);
    }
    match Duration::try_from_secs_f64(val * multiplier / 1_000.0) {
        Ok(d) => Ok(d),
        Err(_) => bail!("Duration out of range: {}", original),
    }
}

/// Format a duration for display
pub fn format_duration(d: Duration) -> String {
    let millis = d.as_millis();
    if millis < 1_000 {
        format!("{}ms", millis)
    } else if millis < 60_000 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m{:02}s", d.as_secs() / 60, d.as_secs() % 60)
    }
}
