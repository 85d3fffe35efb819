//! Advisory pattern detection
//!
//! Four independent rules run over the same event sequence and their alerts are
//! concatenated in rule order, without deduplication across rules:
//!
//! 1. acute distress: Angry/Anxious moods inside the trailing window
//! 2. sensory overload: High-intensity stimuli inside the trailing window
//! 3. weekly recurrence: the same mood logged repeatedly on one weekday
//! 4. causal trigger: a High-intensity stimulus followed by Angry/Anxious
//!
//! The trailing-window cutoff is computed once per pass from the `now` passed
//! in, so rules 1 and 2 always agree on the window.

use crate::sequence::EventSequence;
use crate::types::{Alert, AlertRule, AlertSeverity, Instant, MoodLabel};
use crate::window::{describe_window, first_match_within, DEFAULT_WINDOW_MS};
use chrono::{DateTime, Datelike, Utc, Weekday};
use chrono_tz::Tz;

/// Default minimum distress moods in the trailing window for a warning
pub const DEFAULT_ACUTE_DISTRESS_THRESHOLD: usize = 3;

/// Default minimum high-intensity stimuli in the trailing window
pub const DEFAULT_SENSORY_OVERLOAD_THRESHOLD: usize = 2;

/// Default minimum same-weekday occurrences of one mood
pub const DEFAULT_WEEKLY_RECURRENCE_THRESHOLD: usize = 3;

/// Count thresholds for the counting rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternThresholds {
    pub acute_distress: usize,
    pub sensory_overload: usize,
    pub weekly_recurrence: usize,
}

impl Default for PatternThresholds {
    fn default() -> Self {
        Self {
            acute_distress: DEFAULT_ACUTE_DISTRESS_THRESHOLD,
            sensory_overload: DEFAULT_SENSORY_OVERLOAD_THRESHOLD,
            weekly_recurrence: DEFAULT_WEEKLY_RECURRENCE_THRESHOLD,
        }
    }
}

/// Rule-based alert generator
#[derive(Debug, Clone, Copy)]
pub struct PatternDetector {
    window_ms: i64,
    thresholds: PatternThresholds,
    /// Zone in which weekdays are determined
    timezone: Tz,
}

impl Default for PatternDetector {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_MS, PatternThresholds::default(), Tz::UTC)
    }
}

impl PatternDetector {
    pub fn new(window_ms: i64, thresholds: PatternThresholds, timezone: Tz) -> Self {
        Self {
            window_ms,
            thresholds,
            timezone,
        }
    }

    /// Run all four rules against `sequence` as of `now`
    pub fn detect(&self, sequence: &EventSequence, now: DateTime<Utc>) -> Vec<Alert> {
        if sequence.is_empty() {
            return Vec::new();
        }

        let cutoff = Instant::from_datetime(now).window_cutoff(self.window_ms);

        let mut alerts = Vec::new();
        alerts.extend(self.acute_distress(sequence, cutoff, now));
        alerts.extend(self.sensory_overload(sequence, cutoff, now));
        alerts.extend(self.weekly_recurrence(sequence, now));
        alerts.extend(self.causal_triggers(sequence, now));

        tracing::debug!(
            events = sequence.len(),
            alerts = alerts.len(),
            now = %now,
            "pattern detection pass complete"
        );

        alerts
    }

    /// Rule 1: distress moods logged at or after the cutoff
    fn acute_distress(
        &self,
        sequence: &EventSequence,
        cutoff: Instant,
        now: DateTime<Utc>,
    ) -> Option<Alert> {
        let count = sequence
            .iter()
            .filter(|event| event.is_distress_mood() && event.instant.is_at_or_after(cutoff))
            .count();

        (count >= self.thresholds.acute_distress).then(|| Alert {
            severity: AlertSeverity::Warning,
            rule: AlertRule::AcuteDistress,
            message: format!(
                "{} anxious/angry logs in the past {}",
                count,
                describe_window(self.window_ms)
            ),
            generated_at: now,
        })
    }

    /// Rule 2: high-intensity stimuli logged at or after the cutoff
    fn sensory_overload(
        &self,
        sequence: &EventSequence,
        cutoff: Instant,
        now: DateTime<Utc>,
    ) -> Option<Alert> {
        let count = sequence
            .iter()
            .filter(|event| event.is_high_intensity() && event.instant.is_at_or_after(cutoff))
            .count();

        (count >= self.thresholds.sensory_overload).then(|| Alert {
            severity: AlertSeverity::Info,
            rule: AlertRule::SensoryOverload,
            message: "Multiple high sensory intensity logs detected".to_string(),
            generated_at: now,
        })
    }

    /// Rule 3: moods grouped by (weekday, label) over the whole history.
    ///
    /// No time cap: a pattern seen months ago still counts. Groups are reported
    /// in order of first appearance.
    fn weekly_recurrence(&self, sequence: &EventSequence, now: DateTime<Utc>) -> Vec<Alert> {
        let mut groups: Vec<(Weekday, Vec<(MoodLabel, usize)>)> = Vec::new();

        for event in sequence.iter() {
            let Some(label) = event.mood_label() else {
                continue;
            };
            let Some(datetime) = event.instant.to_datetime() else {
                continue;
            };
            let weekday = datetime.with_timezone(&self.timezone).weekday();

            let day_index = match groups.iter().position(|(day, _)| *day == weekday) {
                Some(index) => index,
                None => {
                    groups.push((weekday, Vec::new()));
                    groups.len() - 1
                }
            };
            let moods = &mut groups[day_index].1;
            match moods.iter_mut().find(|(mood, _)| *mood == label) {
                Some((_, count)) => *count += 1,
                None => moods.push((label, 1)),
            }
        }

        groups
            .into_iter()
            .flat_map(|(weekday, moods)| {
                moods
                    .into_iter()
                    .filter(|(_, count)| *count >= self.thresholds.weekly_recurrence)
                    .map(move |(mood, _)| Alert {
                        severity: AlertSeverity::Info,
                        rule: AlertRule::WeeklyRecurrence,
                        message: format!(
                            "Student typically feels {} on {}s",
                            mood,
                            weekday_name(weekday)
                        ),
                        generated_at: now,
                    })
            })
            .collect()
    }

    /// Rule 4: each high-intensity stimulus followed by a distress mood
    fn causal_triggers(&self, sequence: &EventSequence, now: DateTime<Utc>) -> Vec<Alert> {
        let events = sequence.events();
        let mut alerts = Vec::new();

        for (position, event) in events.iter().enumerate() {
            if !event.is_high_intensity() {
                continue;
            }
            let Some(category) = event.stimulus_category() else {
                continue;
            };
            let found = first_match_within(events, position, self.window_ms, |candidate| {
                candidate.is_distress_mood()
            });
            if let Some(mood) = found.and_then(|index| events[index].mood_label()) {
                alerts.push(Alert {
                    severity: AlertSeverity::Warning,
                    rule: AlertRule::CausalTrigger,
                    message: format!("High {} input was followed by feeling {}", category, mood),
                    generated_at: now,
                });
            }
        }

        alerts
    }
}

/// Run the detector with default window, thresholds and UTC weekdays
pub fn detect_patterns(sequence: &EventSequence, now: DateTime<Utc>) -> Vec<Alert> {
    PatternDetector::default().detect(sequence, now)
}

/// English weekday name ("Monday")
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Intensity, ObservationEvent, StimulusCategory};
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    fn mood(label: MoodLabel, ms: i64) -> ObservationEvent {
        ObservationEvent::mood(label, Instant::from_millis(ms))
    }

    fn stimulus(category: StimulusCategory, intensity: Intensity, ms: i64) -> ObservationEvent {
        ObservationEvent::stimulus(category, intensity, Instant::from_millis(ms))
    }

    fn messages(alerts: &[Alert]) -> Vec<&str> {
        alerts.iter().map(|a| a.message.as_str()).collect()
    }

    fn rules(alerts: &[Alert]) -> Vec<AlertRule> {
        alerts.iter().map(|a| a.rule).collect()
    }

    #[test]
    fn test_scenario_causal_trigger() {
        let sequence = EventSequence::from_events(vec![
            stimulus(StimulusCategory::Auditory, Intensity::High, 0),
            mood(MoodLabel::Anxious, 3_600_000),
        ]);
        let alerts = detect_patterns(&sequence, at(3_600_000));
        assert!(alerts.iter().any(|a| a.rule == AlertRule::CausalTrigger
            && a.severity == AlertSeverity::Warning
            && a.message == "High Auditory input was followed by feeling Anxious"));
    }

    #[test]
    fn test_scenario_causal_trigger_past_window() {
        let sequence = EventSequence::from_events(vec![
            stimulus(StimulusCategory::Auditory, Intensity::High, 0),
            mood(MoodLabel::Anxious, 7_200_001),
        ]);
        let alerts = detect_patterns(&sequence, at(7_200_001));
        assert!(!rules(&alerts).contains(&AlertRule::CausalTrigger));
    }

    #[test]
    fn test_scenario_acute_distress() {
        let sequence = EventSequence::from_events(vec![
            mood(MoodLabel::Angry, 0),
            mood(MoodLabel::Angry, 1_000_000),
            mood(MoodLabel::Angry, 2_000_000),
        ]);
        let alerts = detect_patterns(&sequence, at(2_000_000));
        assert_eq!(alerts[0].rule, AlertRule::AcuteDistress);
        assert_eq!(alerts[0].severity, AlertSeverity::Warning);
        assert_eq!(alerts[0].message, "3 anxious/angry logs in the past 2 hours");
        assert_eq!(alerts[0].generated_at, at(2_000_000));
    }

    #[test]
    fn test_acute_distress_threshold() {
        let two = EventSequence::from_events(vec![
            mood(MoodLabel::Angry, 0),
            mood(MoodLabel::Anxious, 1_000),
        ]);
        assert!(!rules(&detect_patterns(&two, at(1_000))).contains(&AlertRule::AcuteDistress));

        let three = EventSequence::from_events(vec![
            mood(MoodLabel::Angry, 0),
            mood(MoodLabel::Anxious, 1_000),
            mood(MoodLabel::Anxious, 2_000),
        ]);
        assert!(rules(&detect_patterns(&three, at(2_000))).contains(&AlertRule::AcuteDistress));
    }

    #[test]
    fn test_acute_distress_cutoff_is_inclusive() {
        let now = 10 * DEFAULT_WINDOW_MS;
        let cutoff = now - DEFAULT_WINDOW_MS;
        let sequence = EventSequence::from_events(vec![
            mood(MoodLabel::Angry, cutoff - 1),
            mood(MoodLabel::Angry, cutoff),
            mood(MoodLabel::Anxious, cutoff + 1),
            mood(MoodLabel::Sad, cutoff + 2),
        ]);
        let alerts = detect_patterns(&sequence, at(now));
        assert!(!rules(&alerts).contains(&AlertRule::AcuteDistress));

        let sequence = EventSequence::from_events(vec![
            mood(MoodLabel::Angry, cutoff),
            mood(MoodLabel::Angry, cutoff + 1),
            mood(MoodLabel::Anxious, cutoff + 2),
        ]);
        let alerts = detect_patterns(&sequence, at(now));
        assert_eq!(
            messages(&alerts),
            vec!["3 anxious/angry logs in the past 2 hours"]
        );
    }

    #[test]
    fn test_sensory_overload() {
        let now = 100_000_000;
        let sequence = EventSequence::from_events(vec![
            stimulus(StimulusCategory::Visual, Intensity::High, now - 1_000),
            stimulus(StimulusCategory::Tactile, Intensity::High, now - 500),
            stimulus(StimulusCategory::Tactile, Intensity::Medium, now - 100),
        ]);
        let alerts = detect_patterns(&sequence, at(now));
        assert_eq!(rules(&alerts), vec![AlertRule::SensoryOverload]);
        assert_eq!(alerts[0].severity, AlertSeverity::Info);
        assert_eq!(
            alerts[0].message,
            "Multiple high sensory intensity logs detected"
        );

        let single = EventSequence::from_events(vec![stimulus(
            StimulusCategory::Visual,
            Intensity::High,
            now,
        )]);
        assert!(detect_patterns(&single, at(now)).is_empty());
    }

    #[test]
    fn test_scenario_weekly_recurrence() {
        // 2024-01-01 was a Monday
        let first_monday = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let events = (0..6)
            .map(|week| {
                let when = first_monday + Duration::weeks(week);
                mood(MoodLabel::Happy, when.timestamp_millis())
            })
            .collect::<Vec<_>>();
        let sequence = EventSequence::from_events(events);

        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let alerts = detect_patterns(&sequence, now);
        assert_eq!(
            messages(&alerts),
            vec!["Student typically feels Happy on Mondays"]
        );
        assert_eq!(alerts[0].severity, AlertSeverity::Info);
    }

    #[test]
    fn test_weekly_recurrence_discovery_order() {
        // 2024-01-03 Wednesday, 2024-01-01 Monday
        let wednesday = Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap();
        let monday = Utc.with_ymd_and_hms(2024, 1, 8, 12, 0, 0).unwrap();
        let mut events = Vec::new();
        for week in 0..3 {
            let offset = Duration::weeks(week * 2);
            events.push(mood(MoodLabel::Sad, (wednesday + offset).timestamp_millis()));
            events.push(mood(
                MoodLabel::Anxious,
                (wednesday + offset + Duration::hours(1)).timestamp_millis(),
            ));
            events.push(mood(MoodLabel::Happy, (monday + offset).timestamp_millis()));
        }
        let sequence = EventSequence::from_events(events);

        let far_future = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let alerts = detect_patterns(&sequence, far_future);
        assert_eq!(
            messages(&alerts),
            vec![
                "Student typically feels Sad on Wednesdays",
                "Student typically feels Anxious on Wednesdays",
                "Student typically feels Happy on Mondays",
            ]
        );
    }

    #[test]
    fn test_weekly_recurrence_uses_configured_timezone() {
        // 2024-01-02 03:00 UTC is still Monday evening in New York
        let events = (0..3)
            .map(|week| {
                let when = Utc.with_ymd_and_hms(2024, 1, 2, 3, 0, 0).unwrap() + Duration::weeks(week);
                mood(MoodLabel::Sad, when.timestamp_millis())
            })
            .collect::<Vec<_>>();
        let sequence = EventSequence::from_events(events);
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();

        let utc = detect_patterns(&sequence, now);
        assert_eq!(
            messages(&utc),
            vec!["Student typically feels Sad on Tuesdays"]
        );

        let detector = PatternDetector::new(
            DEFAULT_WINDOW_MS,
            PatternThresholds::default(),
            chrono_tz::America::New_York,
        );
        assert_eq!(
            messages(&detector.detect(&sequence, now)),
            vec!["Student typically feels Sad on Mondays"]
        );
    }

    #[test]
    fn test_causal_trigger_first_match_and_medium_ignored() {
        let sequence = EventSequence::from_events(vec![
            stimulus(StimulusCategory::Visual, Intensity::High, 0),
            stimulus(StimulusCategory::Tactile, Intensity::Medium, 10),
            mood(MoodLabel::Sad, 20),
            mood(MoodLabel::Angry, 30),
            mood(MoodLabel::Anxious, 40),
        ]);
        let far_future = 1_000 * DEFAULT_WINDOW_MS;
        let alerts = detect_patterns(&sequence, at(far_future));
        assert_eq!(
            messages(&alerts),
            vec!["High Visual input was followed by feeling Angry"]
        );
    }

    #[test]
    fn test_rules_concatenate_in_order() {
        let now = 50_000_000;
        let sequence = EventSequence::from_events(vec![
            stimulus(StimulusCategory::Auditory, Intensity::High, now - 5_000),
            stimulus(StimulusCategory::Visual, Intensity::High, now - 4_000),
            mood(MoodLabel::Angry, now - 3_000),
            mood(MoodLabel::Anxious, now - 2_000),
            mood(MoodLabel::Angry, now - 1_000),
        ]);
        let alerts = detect_patterns(&sequence, at(now));
        assert_eq!(
            rules(&alerts),
            vec![
                AlertRule::AcuteDistress,
                AlertRule::SensoryOverload,
                AlertRule::CausalTrigger,
                AlertRule::CausalTrigger,
            ]
        );
        assert_eq!(
            messages(&alerts)[2..],
            [
                "High Auditory input was followed by feeling Angry",
                "High Visual input was followed by feeling Angry",
            ]
        );
    }

    #[test]
    fn test_custom_window_changes_message() {
        let detector = PatternDetector::new(3_600_000, PatternThresholds::default(), Tz::UTC);
        let now = 10_000_000;
        let sequence = EventSequence::from_events(vec![
            mood(MoodLabel::Angry, now - 3),
            mood(MoodLabel::Angry, now - 2),
            mood(MoodLabel::Angry, now - 1),
        ]);
        let alerts = detector.detect(&sequence, at(now));
        assert_eq!(alerts[0].message, "3 anxious/angry logs in the past 1 hour");
    }

    #[test]
    fn test_invalid_instants_never_alert() {
        let sequence = EventSequence::from_events(vec![
            ObservationEvent::mood(MoodLabel::Angry, Instant::INVALID),
            ObservationEvent::mood(MoodLabel::Angry, Instant::INVALID),
            ObservationEvent::mood(MoodLabel::Angry, Instant::INVALID),
            ObservationEvent::stimulus(StimulusCategory::Visual, Intensity::High, Instant::INVALID),
            ObservationEvent::stimulus(StimulusCategory::Visual, Intensity::High, Instant::INVALID),
        ]);
        assert!(detect_patterns(&sequence, at(0)).is_empty());
    }

    #[test]
    fn test_scenario_empty_sequence() {
        assert!(detect_patterns(&EventSequence::new(), Utc::now()).is_empty());
    }
}
