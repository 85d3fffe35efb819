//! Forward time-window scanning
//!
//! Both the correlation engine and the causal-trigger rule ask the same
//! question: starting at an event, is there a later event matching some
//! predicate no more than `window_ms` after it? The scan walks strictly forward
//! and stops at the first event whose instant lies past the deadline, which
//! relies on the ordering guaranteed by [`crate::sequence::EventSequence`].

use crate::types::ObservationEvent;

/// Default window length: 2 hours in milliseconds
pub const DEFAULT_WINDOW_MS: i64 = 7_200_000;

const HOUR_MS: i64 = 3_600_000;
const MINUTE_MS: i64 = 60_000;
const SECOND_MS: i64 = 1_000;

/// Find the first event after `start` that satisfies `predicate` and lies
/// within `window_ms` of the event at `start` (upper bound inclusive).
///
/// An origin with an invalid instant opens no window. Candidates with an
/// invalid instant are skipped without ending the scan.
pub fn first_match_within<F>(
    events: &[ObservationEvent],
    start: usize,
    window_ms: i64,
    mut predicate: F,
) -> Option<usize>
where
    F: FnMut(&ObservationEvent) -> bool,
{
    let origin = events.get(start)?;
    let deadline = origin.instant.window_deadline(window_ms);
    if !deadline.is_valid() {
        return None;
    }

    for (offset, candidate) in events[start + 1..].iter().enumerate() {
        if candidate.instant.is_after(deadline) {
            break;
        }
        if candidate.instant.is_at_or_before(deadline) && predicate(candidate) {
            return Some(start + 1 + offset);
        }
    }
    None
}

/// Human wording for a window length ("2 hours", "90 minutes")
pub fn describe_window(window_ms: i64) -> String {
    let (amount, unit) = if window_ms % HOUR_MS == 0 {
        (window_ms / HOUR_MS, "hour")
    } else if window_ms % MINUTE_MS == 0 {
        (window_ms / MINUTE_MS, "minute")
    } else if window_ms % SECOND_MS == 0 {
        (window_ms / SECOND_MS, "second")
    } else {
        (window_ms, "millisecond")
    };

    if amount == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", amount, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Instant, Intensity, MoodLabel, StimulusCategory};

    fn stimulus_at(ms: i64) -> ObservationEvent {
        ObservationEvent::stimulus(
            StimulusCategory::Auditory,
            Intensity::High,
            Instant::from_millis(ms),
        )
    }

    fn mood_at(label: MoodLabel, ms: i64) -> ObservationEvent {
        ObservationEvent::mood(label, Instant::from_millis(ms))
    }

    #[test]
    fn test_deadline_is_inclusive() {
        let events = vec![
            stimulus_at(0),
            mood_at(MoodLabel::Anxious, DEFAULT_WINDOW_MS),
        ];
        let found = first_match_within(&events, 0, DEFAULT_WINDOW_MS, |e| e.is_mood());
        assert_eq!(found, Some(1));
    }

    #[test]
    fn test_one_millisecond_past_deadline_is_excluded() {
        let events = vec![
            stimulus_at(0),
            mood_at(MoodLabel::Anxious, DEFAULT_WINDOW_MS + 1),
        ];
        let found = first_match_within(&events, 0, DEFAULT_WINDOW_MS, |e| e.is_mood());
        assert_eq!(found, None);
    }

    #[test]
    fn test_returns_first_match_only() {
        let events = vec![
            stimulus_at(0),
            mood_at(MoodLabel::Happy, 10),
            mood_at(MoodLabel::Angry, 20),
            mood_at(MoodLabel::Angry, 30),
        ];
        let found = first_match_within(&events, 0, DEFAULT_WINDOW_MS, |e| {
            e.is_mood_of(MoodLabel::Angry)
        });
        assert_eq!(found, Some(2));
    }

    #[test]
    fn test_invalid_instants_are_skipped() {
        let events = vec![
            stimulus_at(0),
            ObservationEvent::mood(MoodLabel::Angry, Instant::INVALID),
            mood_at(MoodLabel::Angry, 50),
        ];
        let found = first_match_within(&events, 0, DEFAULT_WINDOW_MS, |e| e.is_mood());
        assert_eq!(found, Some(2));

        let invalid_origin = vec![
            ObservationEvent::stimulus(StimulusCategory::Visual, Intensity::High, Instant::INVALID),
            mood_at(MoodLabel::Angry, 50),
        ];
        assert_eq!(
            first_match_within(&invalid_origin, 0, DEFAULT_WINDOW_MS, |e| e.is_mood()),
            None
        );
    }

    #[test]
    fn test_last_event_has_no_window() {
        let events = vec![mood_at(MoodLabel::Sad, 0), stimulus_at(10)];
        assert_eq!(
            first_match_within(&events, 1, DEFAULT_WINDOW_MS, |_| true),
            None
        );
        assert_eq!(first_match_within(&events, 5, DEFAULT_WINDOW_MS, |_| true), None);
    }

    #[test]
    fn test_describe_window() {
        assert_eq!(describe_window(DEFAULT_WINDOW_MS), "2 hours");
        assert_eq!(describe_window(3_600_000), "1 hour");
        assert_eq!(describe_window(5_400_000), "90 minutes");
        assert_eq!(describe_window(1_500), "1500 milliseconds");
    }
}
