//! Classification of readings against configurable thresholds.

use serde::{Deserialize, Serialize};

use super::snapshot::{Flame, Snapshot};

/// Thresholds for reading classification.
///
/// Temperature bounds are inclusive (`>=`); gas bounds are exclusive (`>`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Temperature (°C) at which a reading is considered warm.
    pub temperature_warm: f64,
    /// Temperature (°C) indicating a possible fire risk.
    pub temperature_high: f64,
    /// Temperature (°C) considered dangerous.
    pub temperature_danger: f64,
    /// Gas ADC value above which a reading is elevated.
    pub gas_elevated: i64,
    /// Gas ADC value above which a leak is likely.
    pub gas_high: i64,
    /// Gas ADC value above which the reading needs immediate attention.
    pub gas_very_high: i64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temperature_warm: 35.0,
            temperature_high: 45.0,
            temperature_danger: 60.0,
            gas_elevated: 1000,
            gas_high: 2000,
            gas_very_high: 3000,
        }
    }
}

/// Severity of a single reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Normal,
    Elevated,
    High,
    Critical,
}

impl Level {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            Level::Normal => "OK",
            Level::Elevated => "WARM",
            Level::High => "HIGH",
            Level::Critical => "CRIT",
        }
    }
}

impl Thresholds {
    pub fn temperature_level(&self, temperature: Option<f64>) -> Option<Level> {
        let t = temperature?;
        Some(if t >= self.temperature_danger {
            Level::Critical
        } else if t >= self.temperature_high {
            Level::High
        } else if t >= self.temperature_warm {
            Level::Elevated
        } else {
            Level::Normal
        })
    }

    pub fn gas_level(&self, gas: Option<i64>) -> Option<Level> {
        let g = gas?;
        Some(if g > self.gas_very_high {
            Level::Critical
        } else if g > self.gas_high {
            Level::High
        } else if g > self.gas_elevated {
            Level::Elevated
        } else {
            Level::Normal
        })
    }

    pub fn flame_level(&self, flame: Flame) -> Option<Level> {
        match flame {
            Flame::Detected => Some(Level::Critical),
            Flame::Clear => Some(Level::Normal),
            Flame::Unknown => None,
        }
    }

    /// Worst level across every known reading of a snapshot.
    pub fn overall(&self, snapshot: &Snapshot) -> Level {
        let alarm = snapshot.alarm.then_some(Level::Critical);
        [
            self.temperature_level(snapshot.temperature),
            self.gas_level(snapshot.gas),
            self.flame_level(snapshot.flame),
            alarm,
        ]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(Level::Normal)
    }

    pub fn temperature_note(&self, temperature: Option<f64>) -> &'static str {
        match self.temperature_level(temperature) {
            None => "Waiting for data...",
            Some(Level::Critical) => "Dangerously high temperature!",
            Some(Level::High) => "High temperature, possible fire risk.",
            Some(Level::Elevated) => "Warm but within acceptable range.",
            Some(Level::Normal) => "Temperature in safe range.",
        }
    }

    pub fn gas_note(&self, gas: Option<i64>) -> &'static str {
        match self.gas_level(gas) {
            None => "Analog ADC value (0-4095)",
            Some(Level::Critical) => "Very high gas reading! Check immediately.",
            Some(Level::High) => "High gas reading, potential leak.",
            Some(Level::Elevated) => "Slightly elevated gas reading.",
            Some(Level::Normal) => "Gas level normal.",
        }
    }
}

pub fn flame_note(flame: Flame) -> &'static str {
    match flame {
        Flame::Detected => "Flame detected.",
        Flame::Clear => "No flame detected.",
        Flame::Unknown => "Unknown sensor state.",
    }
}
