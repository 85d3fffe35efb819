//! Aggregate reporters for the display layer
//!
//! Simple groupings and counts over an event sequence: label distributions,
//! per-day and per-hour trends, and a quick-stats summary. Calendar days and
//! hours are taken in the configured timezone.
//!
//! Events with an invalid instant still count in distributions and totals, but
//! never land in a day or hour bucket.

use crate::sequence::EventSequence;
use crate::types::{Instant, MoodLabel, ObservationEvent, StimulusCategory};
use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Default number of days covered by the daily trend
pub const DEFAULT_TREND_DAYS: u32 = 7;

/// Per-mood counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodCounts {
    pub happy: u32,
    pub sad: u32,
    pub angry: u32,
    pub anxious: u32,
}

impl MoodCounts {
    pub fn add(&mut self, label: MoodLabel) {
        match label {
            MoodLabel::Happy => self.happy += 1,
            MoodLabel::Sad => self.sad += 1,
            MoodLabel::Angry => self.angry += 1,
            MoodLabel::Anxious => self.anxious += 1,
        }
    }

    pub fn get(&self, label: MoodLabel) -> u32 {
        match label {
            MoodLabel::Happy => self.happy,
            MoodLabel::Sad => self.sad,
            MoodLabel::Angry => self.angry,
            MoodLabel::Anxious => self.anxious,
        }
    }

    pub fn total(&self) -> u32 {
        self.happy + self.sad + self.angry + self.anxious
    }
}

/// Occurrence count of a single label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCount<L> {
    pub label: L,
    pub count: u32,
}

/// Mood and stimulus counts for one local calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTrend {
    pub date: NaiveDate,
    pub moods: MoodCounts,
    pub stimuli: u32,
}

/// Mood and stimulus counts for one local hour of the day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyTrend {
    pub hour: u32,
    pub moods: MoodCounts,
    pub stimuli: u32,
}

/// Headline numbers for a student's log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickStats {
    pub total_events: usize,
    pub mood_events: usize,
    pub stimulus_events: usize,
    pub high_intensity_events: usize,
    /// Events whose instant could not be resolved
    pub invalid_instant_events: usize,
    /// Events on `now`'s local calendar day
    pub events_today: usize,
    pub most_frequent_mood: Option<MoodLabel>,
    pub most_frequent_stimulus: Option<StimulusCategory>,
    /// Percentage (0-100) of mood logs that are Angry or Anxious
    pub distress_share_pct: f64,
}

/// Aggregate reporter bound to a display timezone
#[derive(Debug, Clone, Copy)]
pub struct AggregateReporter {
    timezone: Tz,
}

impl Default for AggregateReporter {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl AggregateReporter {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// Count of each mood label, in [`MoodLabel::ALL`] order, zeros included
    pub fn mood_distribution(&self, sequence: &EventSequence) -> Vec<LabelCount<MoodLabel>> {
        if sequence.is_empty() {
            return Vec::new();
        }
        MoodLabel::ALL
            .into_iter()
            .map(|label| LabelCount {
                label,
                count: sequence.iter().filter(|e| e.is_mood_of(label)).count() as u32,
            })
            .collect()
    }

    /// Count of each stimulus category, in [`StimulusCategory::ALL`] order
    pub fn stimulus_distribution(
        &self,
        sequence: &EventSequence,
    ) -> Vec<LabelCount<StimulusCategory>> {
        if sequence.is_empty() {
            return Vec::new();
        }
        StimulusCategory::ALL
            .into_iter()
            .map(|category| LabelCount {
                label: category,
                count: sequence.iter().filter(|e| e.is_stimulus_of(category)).count() as u32,
            })
            .collect()
    }

    /// One entry per local day for the `days` days ending on `now`'s local
    /// date, oldest first, zero-filled
    pub fn daily_trend(
        &self,
        sequence: &EventSequence,
        now: DateTime<Utc>,
        days: u32,
    ) -> Vec<DailyTrend> {
        if sequence.is_empty() || days == 0 {
            return Vec::new();
        }

        let today = now.with_timezone(&self.timezone).date_naive();
        let Some(first_day) = today.checked_sub_signed(Duration::days(i64::from(days) - 1)) else {
            return Vec::new();
        };
        let mut trend: Vec<DailyTrend> = first_day
            .iter_days()
            .take(days as usize)
            .map(|date| DailyTrend {
                date,
                moods: MoodCounts::default(),
                stimuli: 0,
            })
            .collect();

        for event in sequence.iter() {
            let Some(date) = self.local_date(event.instant) else {
                continue;
            };
            if date < first_day || date > today {
                continue;
            }
            let slot = &mut trend[(date - first_day).num_days() as usize];
            record(event, &mut slot.moods, &mut slot.stimuli);
        }

        trend
    }

    /// 24 entries (hours 0-23) over the whole history
    pub fn hourly_trend(&self, sequence: &EventSequence) -> Vec<HourlyTrend> {
        if sequence.is_empty() {
            return Vec::new();
        }

        let mut trend: Vec<HourlyTrend> = (0..24)
            .map(|hour| HourlyTrend {
                hour,
                moods: MoodCounts::default(),
                stimuli: 0,
            })
            .collect();

        for event in sequence.iter() {
            let Some(datetime) = event.instant.to_datetime() else {
                continue;
            };
            let hour = datetime.with_timezone(&self.timezone).hour() as usize;
            let slot = &mut trend[hour];
            record(event, &mut slot.moods, &mut slot.stimuli);
        }

        trend
    }

    /// Summary counts as of `now`
    pub fn quick_stats(&self, sequence: &EventSequence, now: DateTime<Utc>) -> QuickStats {
        let today = now.with_timezone(&self.timezone).date_naive();

        let mood_events = sequence.iter().filter(|e| e.is_mood()).count();
        let distress_events = sequence.iter().filter(|e| e.is_distress_mood()).count();
        let distress_share_pct = if mood_events > 0 {
            distress_events as f64 * 100.0 / mood_events as f64
        } else {
            0.0
        };

        QuickStats {
            total_events: sequence.len(),
            mood_events,
            stimulus_events: sequence.iter().filter(|e| e.is_stimulus()).count(),
            high_intensity_events: sequence.iter().filter(|e| e.is_high_intensity()).count(),
            invalid_instant_events: sequence.invalid_instant_count(),
            events_today: sequence
                .iter()
                .filter(|e| self.local_date(e.instant) == Some(today))
                .count(),
            most_frequent_mood: most_frequent(self.mood_distribution(sequence)),
            most_frequent_stimulus: most_frequent(self.stimulus_distribution(sequence)),
            distress_share_pct,
        }
    }

    fn local_date(&self, instant: Instant) -> Option<NaiveDate> {
        instant
            .to_datetime()
            .map(|dt| dt.with_timezone(&self.timezone).date_naive())
    }
}

fn record(event: &ObservationEvent, moods: &mut MoodCounts, stimuli: &mut u32) {
    if let Some(label) = event.mood_label() {
        moods.add(label);
    } else if event.is_stimulus() {
        *stimuli += 1;
    }
}

/// Label with the highest non-zero count; ties go to the earlier label
fn most_frequent<L: Copy>(distribution: Vec<LabelCount<L>>) -> Option<L> {
    let mut best: Option<LabelCount<L>> = None;
    for entry in distribution {
        if entry.count > best.map_or(0, |b| b.count) {
            best = Some(entry);
        }
    }
    best.map(|b| b.label)
}
