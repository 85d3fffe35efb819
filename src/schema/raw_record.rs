//! Raw observation record definition
//!
//! Records arrive from storage written by several generations of the logging
//! surface, so field names and timestamp encodings vary:
//! - the instant may be epoch milliseconds, a date string, or missing
//! - legacy records only carry an identifier that doubles as the creation time
//! - the kind field may be spelled `kind` or `type`, stimuli may say `sensory`

use crate::types::{EventKind, Intensity, MoodLabel, StimulusCategory};
use serde::{Deserialize, Serialize};

/// Current record schema identifier
pub const SCHEMA_VERSION: &str = "moodtrace.record.v1";

/// Explicit timestamp field as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// Epoch milliseconds
    Millis(f64),
    /// Date/time string (RFC 3339, RFC 2822, or naive ISO)
    Text(String),
    /// Any other JSON shape; treated as absent
    Other(serde_json::Value),
}

/// Record identifier as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Numeric(f64),
    Text(String),
}

/// A single persisted observation record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Record identifier (legacy records derive their instant from it)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RawId>,
    /// "mood", "stimulus" or "sensory"
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Mood label for mood records
    #[serde(default, alias = "label", skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    /// Stimulus category for stimulus records
    #[serde(
        default,
        alias = "sensoryType",
        alias = "sensory_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<String>,
    /// Stimulus intensity for stimulus records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<String>,
    /// Explicit timestamp
    #[serde(default, alias = "instant", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<RawTimestamp>,
    /// Free-text note
    #[serde(default, alias = "notes", skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl RawRecord {
    /// Create a mood record stamped with epoch milliseconds
    pub fn mood(label: MoodLabel, timestamp_ms: i64) -> Self {
        RawRecord {
            kind: Some(EventKind::Mood.as_str().to_string()),
            mood: Some(label.as_str().to_string()),
            timestamp: Some(RawTimestamp::Millis(timestamp_ms as f64)),
            ..Default::default()
        }
    }

    /// Create a stimulus record stamped with epoch milliseconds
    pub fn stimulus(category: StimulusCategory, intensity: Intensity, timestamp_ms: i64) -> Self {
        RawRecord {
            kind: Some(EventKind::Stimulus.as_str().to_string()),
            category: Some(category.as_str().to_string()),
            intensity: Some(intensity.as_str().to_string()),
            timestamp: Some(RawTimestamp::Millis(timestamp_ms as f64)),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: RawId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_timestamp(mut self, timestamp: Option<RawTimestamp>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Determine the record kind, inferring it from the payload fields when
    /// the kind field is missing
    pub fn event_kind(&self) -> Result<EventKind, ValidationError> {
        match self.kind.as_deref().map(str::trim) {
            Some(kind) if kind.eq_ignore_ascii_case("mood") => Ok(EventKind::Mood),
            Some(kind)
                if kind.eq_ignore_ascii_case("stimulus") || kind.eq_ignore_ascii_case("sensory") =>
            {
                Ok(EventKind::Stimulus)
            }
            Some(other) => Err(ValidationError::UnknownKind(other.to_string())),
            None if self.mood.is_some() => Ok(EventKind::Mood),
            None if self.category.is_some() => Ok(EventKind::Stimulus),
            None => Err(ValidationError::MissingKind),
        }
    }

    /// Parsed mood label
    pub fn mood_label(&self) -> Result<MoodLabel, ValidationError> {
        let raw = self
            .mood
            .as_deref()
            .ok_or_else(|| ValidationError::MissingField("mood".to_string()))?;
        raw.parse()
            .map_err(|_| ValidationError::UnknownMood(raw.to_string()))
    }

    /// Parsed stimulus category
    pub fn stimulus_category(&self) -> Result<StimulusCategory, ValidationError> {
        let raw = self
            .category
            .as_deref()
            .ok_or_else(|| ValidationError::MissingField("category".to_string()))?;
        raw.parse()
            .map_err(|_| ValidationError::UnknownCategory(raw.to_string()))
    }

    /// Parsed stimulus intensity
    pub fn stimulus_intensity(&self) -> Result<Intensity, ValidationError> {
        let raw = self
            .intensity
            .as_deref()
            .ok_or_else(|| ValidationError::MissingField("intensity".to_string()))?;
        raw.parse()
            .map_err(|_| ValidationError::UnknownIntensity(raw.to_string()))
    }

    /// Validate the record shape (kind and labels). Timestamp resolution is
    /// checked separately by the adapter because it depends on the timezone.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.event_kind()? {
            EventKind::Mood => self.mood_label().map(|_| ()),
            EventKind::Stimulus => {
                self.stimulus_category()?;
                self.stimulus_intensity().map(|_| ())
            }
        }
    }
}

/// Validation errors for raw records
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Record has no kind and no mood or category field")]
    MissingKind,

    #[error("Unknown record kind: {0}")]
    UnknownKind(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Unknown mood label: {0}")]
    UnknownMood(String),

    #[error("Unknown stimulus category: {0}")]
    UnknownCategory(String),

    #[error("Unknown intensity: {0}")]
    UnknownIntensity(String),

    #[error("Timestamp cannot be derived from timestamp or id fields")]
    UnresolvableInstant,
}
