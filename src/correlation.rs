//! Stimulus → mood correlation counting
//!
//! For each (stimulus category, mood label) pair, counts how many stimulus
//! occurrences are followed by at least one mood of that label within the
//! window. Each stimulus occurrence contributes at most one count per mood, so
//! repeated mood logs inside one window are not double-counted.
//!
//! Results are ordered categories-outer, moods-inner, following the order of
//! the label slices passed in. Pairs with a zero count are dropped.

use crate::sequence::EventSequence;
use crate::types::{CorrelationPair, MoodLabel, ObservationEvent, StimulusCategory};
use crate::window::DEFAULT_WINDOW_MS;
use std::collections::HashMap;

/// Positions of stimulus and mood events, bucketed once per analysis pass.
///
/// Only events with a valid instant are indexed: an invalid instant can
/// neither open a window nor satisfy one.
pub struct CorrelationIndex<'a> {
    events: &'a [ObservationEvent],
    stimuli: HashMap<StimulusCategory, Vec<usize>>,
    moods: HashMap<MoodLabel, Vec<usize>>,
}

impl<'a> CorrelationIndex<'a> {
    pub fn build(sequence: &'a EventSequence) -> Self {
        let events = sequence.events();
        let mut stimuli: HashMap<StimulusCategory, Vec<usize>> = HashMap::new();
        let mut moods: HashMap<MoodLabel, Vec<usize>> = HashMap::new();

        for (position, event) in events.iter().enumerate() {
            if !event.instant.is_valid() {
                continue;
            }
            if let Some(category) = event.stimulus_category() {
                stimuli.entry(category).or_default().push(position);
            } else if let Some(label) = event.mood_label() {
                moods.entry(label).or_default().push(position);
            }
        }

        Self {
            events,
            stimuli,
            moods,
        }
    }

    /// Number of `category` occurrences followed by a `mood` within the window.
    ///
    /// The first later mood of the label is found by binary search. Because
    /// valid instants are non-decreasing, that mood is inside the window
    /// exactly when a linear forward scan would have matched it.
    pub fn count(&self, category: StimulusCategory, mood: MoodLabel, window_ms: i64) -> u32 {
        let (Some(stimuli), Some(moods)) = (self.stimuli.get(&category), self.moods.get(&mood))
        else {
            return 0;
        };

        stimuli
            .iter()
            .filter(|&&position| {
                let deadline = self.events[position].instant.window_deadline(window_ms);
                let next = moods.partition_point(|&candidate| candidate <= position);
                moods
                    .get(next)
                    .is_some_and(|&candidate| self.events[candidate].instant.is_at_or_before(deadline))
            })
            .count() as u32
    }
}

/// Correlation engine with a fixed window length
#[derive(Debug, Clone, Copy)]
pub struct CorrelationEngine {
    window_ms: i64,
}

impl Default for CorrelationEngine {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_MS)
    }
}

impl CorrelationEngine {
    pub fn new(window_ms: i64) -> Self {
        Self { window_ms }
    }

    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }

    /// Count co-occurrences for every pair in `categories × moods`
    pub fn compute(
        &self,
        sequence: &EventSequence,
        categories: &[StimulusCategory],
        moods: &[MoodLabel],
    ) -> Vec<CorrelationPair> {
        if sequence.is_empty() {
            return Vec::new();
        }

        let index = CorrelationIndex::build(sequence);
        let mut pairs = Vec::new();

        for &category in categories {
            for &mood in moods {
                let occurrence_count = index.count(category, mood, self.window_ms);
                if occurrence_count > 0 {
                    pairs.push(CorrelationPair {
                        stimulus_category: category,
                        mood_label: mood,
                        occurrence_count,
                    });
                }
            }
        }

        tracing::debug!(
            events = sequence.len(),
            pairs = pairs.len(),
            window_ms = self.window_ms,
            "computed stimulus/mood correlations"
        );

        pairs
    }

    /// Count co-occurrences over every known category and mood label
    pub fn compute_all(&self, sequence: &EventSequence) -> Vec<CorrelationPair> {
        self.compute(sequence, &StimulusCategory::ALL, &MoodLabel::ALL)
    }
}

/// Convenience wrapper around [`CorrelationEngine::compute`]
pub fn compute_correlations(
    sequence: &EventSequence,
    categories: &[StimulusCategory],
    moods: &[MoodLabel],
    window_ms: i64,
) -> Vec<CorrelationPair> {
    CorrelationEngine::new(window_ms).compute(sequence, categories, moods)
}
