//! Chronologically ordered event sequences
//!
//! The forward-window scans stop as soon as an event lies past the window
//! deadline, which is only correct when events are non-decreasing in time.
//! [`EventSequence`] makes that ordering a construction-time guarantee: either
//! sort once ([`EventSequence::from_events`]) or check the caller's order
//! ([`EventSequence::from_sorted`]).
//!
//! Events with an invalid instant are exempt from the ordering check. They can
//! never open or satisfy a window, so their position does not affect results.

use crate::error::AnalysisError;
use crate::types::{Instant, ObservationEvent};
use serde::Serialize;
use std::ops::Deref;

/// An immutable, chronologically ordered list of observation events
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EventSequence {
    events: Vec<ObservationEvent>,
}

impl EventSequence {
    /// Empty sequence
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort events by instant (stable, O(n log n)). Events with an invalid
    /// instant are moved to the end, keeping their relative order.
    pub fn from_events(mut events: Vec<ObservationEvent>) -> Self {
        events.sort_by_key(|event| sort_key(event.instant));
        Self { events }
    }

    /// Accept events the caller already ordered, rejecting any valid instant
    /// that is earlier than the previous valid instant.
    pub fn from_sorted(events: Vec<ObservationEvent>) -> Result<Self, AnalysisError> {
        if let Some(index) = first_out_of_order(&events) {
            return Err(AnalysisError::UnsortedSequence { index });
        }
        Ok(Self { events })
    }

    pub fn events(&self) -> &[ObservationEvent] {
        &self.events
    }

    /// Number of events whose instant could not be resolved
    pub fn invalid_instant_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| !event.instant.is_valid())
            .count()
    }

    pub fn into_events(self) -> Vec<ObservationEvent> {
        self.events
    }
}

impl Deref for EventSequence {
    type Target = [ObservationEvent];

    fn deref(&self) -> &Self::Target {
        &self.events
    }
}

impl From<Vec<ObservationEvent>> for EventSequence {
    fn from(events: Vec<ObservationEvent>) -> Self {
        Self::from_events(events)
    }
}

impl FromIterator<ObservationEvent> for EventSequence {
    fn from_iter<I: IntoIterator<Item = ObservationEvent>>(iter: I) -> Self {
        Self::from_events(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a EventSequence {
    type Item = &'a ObservationEvent;
    type IntoIter = std::slice::Iter<'a, ObservationEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

fn sort_key(instant: Instant) -> (bool, i64) {
    match instant.millis() {
        Some(ms) => (false, ms),
        None => (true, 0),
    }
}

/// Index of the first valid-instant event that is earlier than a preceding one
fn first_out_of_order(events: &[ObservationEvent]) -> Option<usize> {
    let mut latest: Option<i64> = None;
    for (index, event) in events.iter().enumerate() {
        let Some(ms) = event.instant.millis() else {
            continue;
        };
        if latest.is_some_and(|previous| ms < previous) {
            return Some(index);
        }
        latest = Some(ms);
    }
    None
}
