use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::classification::{categorize_pressure, PressureCategory};

/// Subjective state reported together with a measurement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Feeling {
    Great,
    Good,
    #[default]
    Normal,
    Bad,
    Terrible,
}

impl Feeling {
    /// All feelings in display order
    pub const ALL: [Feeling; 5] = [
        Feeling::Great,
        Feeling::Good,
        Feeling::Normal,
        Feeling::Bad,
        Feeling::Terrible,
    ];

    /// Human-readable label used in exports
    pub fn label(self) -> &'static str {
        match self {
            Feeling::Great => "Great",
            Feeling::Good => "Good",
            Feeling::Normal => "Normal",
            Feeling::Bad => "Bad",
            Feeling::Terrible => "Terrible",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Feeling::Great => "😊",
            Feeling::Good => "🙂",
            Feeling::Normal => "😐",
            Feeling::Bad => "😞",
            Feeling::Terrible => "😫",
        }
    }

    /// Token used when the feeling is persisted
    pub fn as_token(self) -> &'static str {
        match self {
            Feeling::Great => "GREAT",
            Feeling::Good => "GOOD",
            Feeling::Normal => "NORMAL",
            Feeling::Bad => "BAD",
            Feeling::Terrible => "TERRIBLE",
        }
    }

    /// Decode a persisted token, falling back to `Normal` for anything unknown
    pub fn from_token_lenient(token: &str) -> Self {
        token.parse().unwrap_or_default()
    }
}

impl FromStr for Feeling {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GREAT" => Ok(Feeling::Great),
            "GOOD" => Ok(Feeling::Good),
            "NORMAL" => Ok(Feeling::Normal),
            "BAD" => Ok(Feeling::Bad),
            "TERRIBLE" => Ok(Feeling::Terrible),
            other => Err(format!("Unknown feeling token: {}", other)),
        }
    }
}

impl fmt::Display for Feeling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Storage model for a blood pressure and pulse measurement
///
/// Numeric fields are not range-checked here. Callers are expected to keep
/// systolic in 50..=300, diastolic in 30..=200 and pulse in 30..=250, but any
/// integers are stored and classified without failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    /// Identifier assigned by storage, 0 until the measurement is persisted
    pub id: i64,

    /// Systolic blood pressure (the higher number), mmHg
    pub systolic: i32,

    /// Diastolic blood pressure (the lower number), mmHg
    pub diastolic: i32,

    /// Pulse rate in beats per minute
    pub pulse: i32,

    /// When the measurement was taken, milliseconds since the Unix epoch
    pub timestamp: i64,

    /// Free-form notes
    #[serde(default)]
    pub notes: String,

    /// How the user felt at the time
    #[serde(default)]
    pub feeling: Feeling,
}

impl Measurement {
    /// Create an unsaved measurement taken right now
    pub fn new(systolic: i32, diastolic: i32, pulse: i32) -> Self {
        Self::recorded_at(systolic, diastolic, pulse, Utc::now().timestamp_millis())
    }

    /// Create an unsaved measurement taken at `timestamp` (ms since epoch)
    pub fn recorded_at(systolic: i32, diastolic: i32, pulse: i32, timestamp: i64) -> Self {
        Self {
            id: 0,
            systolic,
            diastolic,
            pulse,
            timestamp,
            notes: String::new(),
            feeling: Feeling::default(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_feeling(mut self, feeling: Feeling) -> Self {
        self.feeling = feeling;
        self
    }

    /// Whether storage has assigned an id yet
    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }

    /// Difference between systolic and diastolic pressure, never clamped
    pub fn pulse_pressure(&self) -> i64 {
        i64::from(self.systolic) - i64::from(self.diastolic)
    }

    /// Risk category of this measurement
    pub fn pressure_category(&self) -> PressureCategory {
        categorize_pressure(self.systolic, self.diastolic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let measurement = Measurement::recorded_at(120, 80, 70, 1_700_000_000_000);
        assert_eq!(measurement.id, 0);
        assert!(!measurement.is_persisted());
        assert_eq!(measurement.notes, "");
        assert_eq!(measurement.feeling, Feeling::Normal);
        assert_eq!(measurement.timestamp, 1_700_000_000_000);
    }

    #[test]
    fn test_new_uses_current_time() {
        let before = Utc::now().timestamp_millis();
        let measurement = Measurement::new(120, 80, 70);
        let after = Utc::now().timestamp_millis();
        assert!(measurement.timestamp >= before && measurement.timestamp <= after);
    }

    #[test]
    fn test_pulse_pressure() {
        assert_eq!(Measurement::recorded_at(120, 80, 70, 0).pulse_pressure(), 40);
        // Not clamped when diastolic exceeds systolic
        assert_eq!(Measurement::recorded_at(70, 90, 70, 0).pulse_pressure(), -20);
        // Wide arithmetic at the extremes
        assert_eq!(
            Measurement::recorded_at(i32::MAX, i32::MIN, 0, 0).pulse_pressure(),
            i64::from(i32::MAX) - i64::from(i32::MIN)
        );
    }

    #[test]
    fn test_pressure_category_follows_values() {
        let measurement = Measurement::recorded_at(125, 85, 70, 0);
        assert_eq!(measurement.pressure_category(), PressureCategory::HypertensionStage1);
    }

    #[test]
    fn test_feeling_tokens() {
        for feeling in Feeling::ALL {
            assert_eq!(feeling.as_token().parse::<Feeling>().unwrap(), feeling);
        }
        assert_eq!(Feeling::from_token_lenient("SLEEPY"), Feeling::Normal);
        assert!("great".parse::<Feeling>().is_err());
        assert_eq!(Feeling::Terrible.to_string(), "Terrible");
    }

    #[test]
    fn test_serde_uses_tokens() {
        let measurement = Measurement::recorded_at(120, 80, 70, 5)
            .with_id(3)
            .with_feeling(Feeling::Great)
            .with_notes("after coffee");
        let json = serde_json::to_value(&measurement).unwrap();
        assert_eq!(json["feeling"], "GREAT");
        assert_eq!(json["notes"], "after coffee");

        let decoded: Measurement =
            serde_json::from_str(r#"{"id":0,"systolic":110,"diastolic":70,"pulse":60,"timestamp":1}"#).unwrap();
        assert_eq!(decoded.feeling, Feeling::Normal);
        assert_eq!(decoded.notes, "");
    }
}
