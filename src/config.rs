//! Analysis configuration
//!
//! Every field has a fixed default, so an empty JSON object is a valid
//! configuration. Callers override only what they need.

use crate::error::AnalysisError;
use crate::patterns::{
    PatternThresholds, DEFAULT_ACUTE_DISTRESS_THRESHOLD, DEFAULT_SENSORY_OVERLOAD_THRESHOLD,
    DEFAULT_WEEKLY_RECURRENCE_THRESHOLD,
};
use crate::reporters::DEFAULT_TREND_DAYS;
use crate::window::DEFAULT_WINDOW_MS;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Longest daily trend accepted, in days
pub const MAX_TREND_DAYS: u32 = 3660;

/// Tunable parameters for an analysis pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Correlation and alert window length in milliseconds
    pub window_ms: i64,
    /// Distress moods in the trailing window needed for a warning
    pub acute_distress_threshold: usize,
    /// High-intensity stimuli in the trailing window needed for an alert
    pub sensory_overload_threshold: usize,
    /// Same-weekday occurrences of one mood needed for an alert
    pub weekly_recurrence_threshold: usize,
    /// IANA timezone for calendar grouping and naive timestamps
    pub timezone: String,
    /// Days covered by the daily trend report
    pub trend_days: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_ms: DEFAULT_WINDOW_MS,
            acute_distress_threshold: DEFAULT_ACUTE_DISTRESS_THRESHOLD,
            sensory_overload_threshold: DEFAULT_SENSORY_OVERLOAD_THRESHOLD,
            weekly_recurrence_threshold: DEFAULT_WEEKLY_RECURRENCE_THRESHOLD,
            timezone: "UTC".to_string(),
            trend_days: DEFAULT_TREND_DAYS,
        }
    }
}

impl AnalysisConfig {
    /// Parse and validate a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check value ranges and the timezone name
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.window_ms <= 0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "window_ms must be positive, got {}",
                self.window_ms
            )));
        }
        for (name, value) in [
            ("acute_distress_threshold", self.acute_distress_threshold),
            ("sensory_overload_threshold", self.sensory_overload_threshold),
            ("weekly_recurrence_threshold", self.weekly_recurrence_threshold),
        ] {
            if value == 0 {
                return Err(AnalysisError::InvalidConfig(format!(
                    "{} must be at least 1",
                    name
                )));
            }
        }
        if self.trend_days == 0 || self.trend_days > MAX_TREND_DAYS {
            return Err(AnalysisError::InvalidConfig(format!(
                "trend_days must be between 1 and {}, got {}",
                MAX_TREND_DAYS, self.trend_days
            )));
        }
        self.tz()?;
        Ok(())
    }

    /// Parsed timezone
    pub fn tz(&self) -> Result<Tz, AnalysisError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| AnalysisError::InvalidTimezone(self.timezone.clone()))
    }

    pub fn thresholds(&self) -> PatternThresholds {
        PatternThresholds {
            acute_distress: self.acute_distress_threshold,
            sensory_overload: self.sensory_overload_threshold,
            weekly_recurrence: self.weekly_recurrence_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.window_ms, 7_200_000);
        assert_eq!(config.acute_distress_threshold, 3);
        assert_eq!(config.sensory_overload_threshold, 2);
        assert_eq!(config.weekly_recurrence_threshold, 3);
        assert_eq!(config.tz().unwrap(), Tz::UTC);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            AnalysisConfig::from_json(r#"{"window_ms": 3600000, "timezone": "Europe/Berlin"}"#)
                .unwrap();
        assert_eq!(config.window_ms, 3_600_000);
        assert_eq!(config.acute_distress_threshold, 3);
        assert_eq!(config.tz().unwrap(), chrono_tz::Europe::Berlin);
    }

    #[test]
    fn test_empty_object_is_default() {
        let config = AnalysisConfig::from_json("{}").unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            AnalysisConfig::from_json(r#"{"window_ms": 0}"#),
            Err(AnalysisError::InvalidConfig(_))
        ));
        assert!(matches!(
            AnalysisConfig::from_json(r#"{"sensory_overload_threshold": 0}"#),
            Err(AnalysisError::InvalidConfig(_))
        ));
        assert!(matches!(
            AnalysisConfig::from_json(r#"{"timezone": "Mars/Olympus"}"#),
            Err(AnalysisError::InvalidTimezone(_))
        ));
        assert!(matches!(
            AnalysisConfig::from_json("not json"),
            Err(AnalysisError::JsonError(_))
        ));
    }

    #[test]
    fn test_trend_days_bounds() {
        assert!(matches!(
            AnalysisConfig::from_json(r#"{"trend_days": 0}"#),
            Err(AnalysisError::InvalidConfig(_))
        ));
        assert!(matches!(
            AnalysisConfig::from_json(r#"{"trend_days": 50000000}"#),
            Err(AnalysisError::InvalidConfig(_))
        ));
        let longest = AnalysisConfig::from_json(r#"{"trend_days": 3660}"#).unwrap();
        assert_eq!(longest.trend_days, MAX_TREND_DAYS);
    }

    #[test]
    fn test_round_trip_through_json() {
        let config = AnalysisConfig {
            trend_days: 14,
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(AnalysisConfig::from_json(&json).unwrap(), config);
    }
}
