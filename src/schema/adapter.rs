//! Adapter for converting persisted records into observation events
//!
//! This is the ingestion boundary: timestamp normalization happens here so the
//! analysis engine only ever sees resolved [`Instant`] values.

use crate::error::AnalysisError;
use crate::normalizer::TimestampNormalizer;
use crate::schema::raw_record::{RawId, RawRecord, ValidationError};
use crate::sequence::EventSequence;
use crate::types::{EventId, EventKind, Instant, Observation, ObservationEvent};

/// Adapter for converting raw records to observation events
pub struct RawRecordAdapter;

impl RawRecordAdapter {
    /// Parse a JSON string containing an array of records.
    ///
    /// Only a document that is not a JSON array fails. Elements whose shape
    /// does not fit a record are skipped with a warning.
    pub fn parse_array(json: &str) -> Result<Vec<RawRecord>, AnalysisError> {
        let values: Vec<serde_json::Value> = serde_json::from_str(json)?;
        Ok(values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| record_from_value(index, value))
            .collect())
    }

    /// Parse NDJSON (newline-delimited JSON) containing one record per line.
    ///
    /// A line that is not JSON fails the parse; a JSON line whose shape does
    /// not fit a record is skipped with a warning.
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RawRecord>, AnalysisError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let value = serde_json::from_str::<serde_json::Value>(trimmed).map_err(|e| {
                AnalysisError::ParseError(format!("Failed to parse line {}: {}", line_num + 1, e))
            })?;
            records.extend(record_from_value(line_num, value));
        }
        Ok(records)
    }

    /// Convert a single record. Fails only on an unrecognizable kind or label;
    /// an unresolvable timestamp yields [`Instant::INVALID`].
    pub fn to_event(
        record: &RawRecord,
        normalizer: &TimestampNormalizer,
    ) -> Result<ObservationEvent, ValidationError> {
        let observation = match record.event_kind()? {
            EventKind::Mood => Observation::Mood {
                label: record.mood_label()?,
            },
            EventKind::Stimulus => Observation::Stimulus {
                category: record.stimulus_category()?,
                intensity: record.stimulus_intensity()?,
            },
        };

        Ok(ObservationEvent {
            id: record.id.as_ref().map(event_id).unwrap_or_else(EventId::generate),
            instant: normalizer.resolve_instant(record),
            observation,
            note: record.note.clone(),
        })
    }

    /// Convert records into events, skipping records whose kind or labels are
    /// not recognized. Input order is preserved.
    pub fn to_events(
        records: &[RawRecord],
        normalizer: &TimestampNormalizer,
    ) -> Vec<ObservationEvent> {
        let mut events = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            match Self::to_event(record, normalizer) {
                Ok(event) => {
                    if !event.instant.is_valid() {
                        tracing::warn!(
                            index,
                            id = %event.id,
                            "record timestamp could not be resolved; excluded from time windows"
                        );
                    }
                    events.push(event);
                }
                Err(e) => {
                    tracing::warn!(index, error = %e, "skipping unrecognized record");
                }
            }
        }
        events
    }

    /// Convert records and sort them into an [`EventSequence`]
    pub fn to_sequence(records: &[RawRecord], normalizer: &TimestampNormalizer) -> EventSequence {
        EventSequence::from_events(Self::to_events(records, normalizer))
    }

    /// Validate a batch of records, returning only the failures
    pub fn validate_records(
        records: &[RawRecord],
        normalizer: &TimestampNormalizer,
    ) -> Vec<ValidationResult> {
        records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                let error = match record.validate() {
                    Err(e) => Some(e),
                    Ok(()) if !normalizer.resolve_instant(record).is_valid() => {
                        Some(ValidationError::UnresolvableInstant)
                    }
                    Ok(()) => None,
                }?;
                Some(ValidationResult {
                    index,
                    record_id: record.id.as_ref().map(|id| event_id(id).to_string()),
                    error,
                })
            })
            .collect()
    }
}

/// A record that failed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub index: usize,
    pub record_id: Option<String>,
    pub error: ValidationError,
}

fn record_from_value(index: usize, value: serde_json::Value) -> Option<RawRecord> {
    match serde_json::from_value::<RawRecord>(value) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(index, error = %e, "skipping malformed record");
            None
        }
    }
}

fn event_id(id: &RawId) -> EventId {
    match id {
        RawId::Numeric(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
            EventId::Numeric(*n as i64)
        }
        RawId::Numeric(n) => EventId::Text(n.to_string()),
        RawId::Text(s) => EventId::Text(s.clone()),
    }
}
