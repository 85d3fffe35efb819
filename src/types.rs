//! Core types for the Moodtrace engine
//!
//! This module defines the observation events that flow into an analysis pass
//! and the derived values (correlation pairs, alerts) that come out of it.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest epoch-millisecond magnitude accepted as a valid instant
/// (±100,000,000 days around the epoch).
pub const MAX_EPOCH_MILLIS: i64 = 8_640_000_000_000_000;

/// Error returned when a label string does not name a known variant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub value: String,
}

/// Emotional-state label carried by a mood observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoodLabel {
    Happy,
    Sad,
    Angry,
    Anxious,
}

impl MoodLabel {
    /// Every mood label, in display order
    pub const ALL: [MoodLabel; 4] = [
        MoodLabel::Happy,
        MoodLabel::Sad,
        MoodLabel::Angry,
        MoodLabel::Anxious,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MoodLabel::Happy => "Happy",
            MoodLabel::Sad => "Sad",
            MoodLabel::Angry => "Angry",
            MoodLabel::Anxious => "Anxious",
        }
    }
}

impl fmt::Display for MoodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoodLabel {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        MoodLabel::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownLabel {
                kind: "mood",
                value: s.to_string(),
            })
    }
}

/// Sensory channel of a stimulus observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StimulusCategory {
    Visual,
    Auditory,
    Tactile,
    Olfactory,
    Gustatory,
    Vestibular,
    Proprioception,
}

impl StimulusCategory {
    /// The three categories every logging surface offers
    pub const CORE: [StimulusCategory; 3] = [
        StimulusCategory::Visual,
        StimulusCategory::Auditory,
        StimulusCategory::Tactile,
    ];

    /// Every stimulus category, core categories first
    pub const ALL: [StimulusCategory; 7] = [
        StimulusCategory::Visual,
        StimulusCategory::Auditory,
        StimulusCategory::Tactile,
        StimulusCategory::Olfactory,
        StimulusCategory::Gustatory,
        StimulusCategory::Vestibular,
        StimulusCategory::Proprioception,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StimulusCategory::Visual => "Visual",
            StimulusCategory::Auditory => "Auditory",
            StimulusCategory::Tactile => "Tactile",
            StimulusCategory::Olfactory => "Olfactory",
            StimulusCategory::Gustatory => "Gustatory",
            StimulusCategory::Vestibular => "Vestibular",
            StimulusCategory::Proprioception => "Proprioception",
        }
    }
}

impl fmt::Display for StimulusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StimulusCategory {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        StimulusCategory::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownLabel {
                kind: "stimulus category",
                value: s.to_string(),
            })
    }
}

/// Reported intensity of a stimulus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Intensity {
    Low,
    Medium,
    High,
}

impl Intensity {
    pub const ALL: [Intensity; 3] = [Intensity::Low, Intensity::Medium, Intensity::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Low => "Low",
            Intensity::Medium => "Medium",
            Intensity::High => "High",
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intensity {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Intensity::ALL
            .into_iter()
            .find(|intensity| intensity.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownLabel {
                kind: "intensity",
                value: s.to_string(),
            })
    }
}

/// A resolved point in time, in epoch milliseconds.
///
/// An event whose time could not be derived carries [`Instant::INVALID`]. The
/// invalid instant never opens a forward window, never lands inside one, and is
/// never part of a trailing window, so comparisons against it are always false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instant(Option<i64>);

impl Instant {
    /// Sentinel for an unresolvable instant
    pub const INVALID: Instant = Instant(None);

    /// Build an instant from epoch milliseconds; out-of-range values are invalid
    pub fn from_millis(millis: i64) -> Self {
        if (-MAX_EPOCH_MILLIS..=MAX_EPOCH_MILLIS).contains(&millis) {
            Instant(Some(millis))
        } else {
            Instant::INVALID
        }
    }

    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self::from_millis(datetime.timestamp_millis())
    }

    pub fn millis(self) -> Option<i64> {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self.0.is_some()
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        self.0.and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }

    /// Upper bound (inclusive) of a forward window opened at this instant
    pub fn window_deadline(self, window_ms: i64) -> Instant {
        match self.0 {
            Some(ms) => Instant(Some(ms.saturating_add(window_ms))),
            None => Instant::INVALID,
        }
    }

    /// Lower bound (inclusive) of a trailing window ending at this instant
    pub fn window_cutoff(self, window_ms: i64) -> Instant {
        match self.0 {
            Some(ms) => Instant(Some(ms.saturating_sub(window_ms))),
            None => Instant::INVALID,
        }
    }

    /// True when both instants are valid and `self <= deadline`
    pub fn is_at_or_before(self, deadline: Instant) -> bool {
        matches!((self.0, deadline.0), (Some(a), Some(b)) if a <= b)
    }

    /// True when both instants are valid and `self > deadline`
    pub fn is_after(self, deadline: Instant) -> bool {
        matches!((self.0, deadline.0), (Some(a), Some(b)) if a > b)
    }

    /// True when both instants are valid and `self >= cutoff`
    pub fn is_at_or_after(self, cutoff: Instant) -> bool {
        matches!((self.0, cutoff.0), (Some(a), Some(b)) if a >= b)
    }
}

impl From<DateTime<Utc>> for Instant {
    fn from(datetime: DateTime<Utc>) -> Self {
        Instant::from_datetime(datetime)
    }
}

/// Event identifier as persisted: legacy records use epoch-millisecond numbers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventId {
    Numeric(i64),
    Text(String),
}

impl EventId {
    /// Fresh random identifier for events created in-process
    pub fn generate() -> Self {
        EventId::Text(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventId::Numeric(n) => write!(f, "{}", n),
            EventId::Text(s) => f.write_str(s),
        }
    }
}

/// Event kind discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Mood,
    Stimulus,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Mood => "mood",
            EventKind::Stimulus => "stimulus",
        }
    }
}

/// What was observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Observation {
    Mood {
        label: MoodLabel,
    },
    Stimulus {
        category: StimulusCategory,
        intensity: Intensity,
    },
}

/// A single immutable observation in a student's log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationEvent {
    /// Record identifier
    pub id: EventId,
    /// Resolved instant (may be [`Instant::INVALID`] for malformed records)
    pub instant: Instant,
    /// Mood or stimulus payload
    #[serde(flatten)]
    pub observation: Observation,
    /// Optional free-text note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ObservationEvent {
    /// Create a mood observation with a generated identifier
    pub fn mood(label: MoodLabel, instant: impl Into<Instant>) -> Self {
        Self {
            id: EventId::generate(),
            instant: instant.into(),
            observation: Observation::Mood { label },
            note: None,
        }
    }

    /// Create a stimulus observation with a generated identifier
    pub fn stimulus(
        category: StimulusCategory,
        intensity: Intensity,
        instant: impl Into<Instant>,
    ) -> Self {
        Self {
            id: EventId::generate(),
            instant: instant.into(),
            observation: Observation::Stimulus {
                category,
                intensity,
            },
            note: None,
        }
    }

    pub fn with_id(mut self, id: EventId) -> Self {
        self.id = id;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Co-occurrence count of a stimulus category followed by a mood label.
///
/// Only pairs with a non-zero count are ever returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationPair {
    pub stimulus_category: StimulusCategory,
    pub mood_label: MoodLabel,
    pub occurrence_count: u32,
}

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Info,
}

/// Pattern rule that produced an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertRule {
    AcuteDistress,
    SensoryOverload,
    WeeklyRecurrence,
    CausalTrigger,
}

/// Advisory notice regenerated on every analysis pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub severity: AlertSeverity,
    pub rule: AlertRule,
    pub message: String,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parsing_is_case_insensitive() {
        assert_eq!("anxious".parse::<MoodLabel>().unwrap(), MoodLabel::Anxious);
        assert_eq!(" HAPPY ".parse::<MoodLabel>().unwrap(), MoodLabel::Happy);
        assert_eq!(
            "auditory".parse::<StimulusCategory>().unwrap(),
            StimulusCategory::Auditory
        );
        assert_eq!("high".parse::<Intensity>().unwrap(), Intensity::High);
        assert!("bored".parse::<MoodLabel>().is_err());
    }

    #[test]
    fn test_invalid_instant_comparisons_are_false() {
        let valid = Instant::from_millis(1_000);
        assert!(!Instant::INVALID.is_at_or_before(valid));
        assert!(!Instant::INVALID.is_after(valid));
        assert!(!valid.is_at_or_before(Instant::INVALID));
        assert!(!valid.is_after(Instant::INVALID));
        assert!(!Instant::INVALID.is_at_or_after(valid));
        assert_eq!(Instant::INVALID.window_deadline(10), Instant::INVALID);
    }

    #[test]
    fn test_out_of_range_millis_are_invalid() {
        assert!(Instant::from_millis(MAX_EPOCH_MILLIS).is_valid());
        assert!(!Instant::from_millis(MAX_EPOCH_MILLIS + 1).is_valid());
        assert!(!Instant::from_millis(i64::MIN).is_valid());
    }

    #[test]
    fn test_event_serialization_shape() {
        let event = ObservationEvent::stimulus(
            StimulusCategory::Auditory,
            Intensity::High,
            Instant::from_millis(0),
        )
        .with_id(EventId::Numeric(42))
        .with_note("fire drill");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["id"], 42);
        assert_eq!(json["instant"], 0);
        assert_eq!(json["kind"], "stimulus");
        assert_eq!(json["category"], "Auditory");
        assert_eq!(json["intensity"], "High");
        assert_eq!(json["note"], "fire drill");

        let back: ObservationEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_alert_severity_serializes_lowercase() {
        let json = serde_json::to_string(&AlertSeverity::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
    }
}
