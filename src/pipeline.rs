//! Analysis pipeline orchestration
//!
//! This module provides the public API for a full analysis pass. It wires the
//! stages together: records JSON → adapter (timestamp normalization) → ordered
//! sequence → correlations, alerts and aggregates → report.

use crate::config::AnalysisConfig;
use crate::correlation::CorrelationEngine;
use crate::error::AnalysisError;
use crate::normalizer::TimestampNormalizer;
use crate::patterns::PatternDetector;
use crate::reporters::{AggregateReporter, DailyTrend, HourlyTrend, LabelCount, QuickStats};
use crate::schema::{RawRecord, RawRecordAdapter};
use crate::sequence::EventSequence;
use crate::types::{Alert, CorrelationPair, MoodLabel, StimulusCategory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything one analysis pass produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub window_ms: i64,
    pub total_events: usize,
    pub correlations: Vec<CorrelationPair>,
    pub alerts: Vec<Alert>,
    pub mood_distribution: Vec<LabelCount<MoodLabel>>,
    pub stimulus_distribution: Vec<LabelCount<StimulusCategory>>,
    pub daily_trend: Vec<DailyTrend>,
    pub hourly_trend: Vec<HourlyTrend>,
    pub stats: QuickStats,
}

/// Analyze a JSON array of records and return the report as JSON (stateless, one-shot).
///
/// # Arguments
/// * `records_json` - JSON array of persisted observation records
/// * `config` - Analysis configuration
/// * `now` - Reference instant for trailing windows and "today"
///
/// # Example
/// ```ignore
/// let report_json = analyze_json(records_json, &AnalysisConfig::default(), Utc::now())?;
/// ```
pub fn analyze_json(
    records_json: &str,
    config: &AnalysisConfig,
    now: DateTime<Utc>,
) -> Result<String, AnalysisError> {
    // Stage 1: Parse records
    let records = RawRecordAdapter::parse_array(records_json)?;

    // Stage 2-4: Normalize, order and analyze
    let analyzer = Analyzer::new(config.clone())?;
    let report = analyzer.analyze(&records, now);

    // Stage 5: Encode
    Ok(serde_json::to_string(&report)?)
}

/// Configured analyzer.
///
/// Holds no per-student state: every call is an independent pass over the
/// sequence it is given, and nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: AnalysisConfig,
    normalizer: TimestampNormalizer,
    correlations: CorrelationEngine,
    detector: PatternDetector,
    reporter: AggregateReporter,
}

impl Default for Analyzer {
    fn default() -> Self {
        let config = AnalysisConfig::default();
        Self {
            normalizer: TimestampNormalizer::default(),
            correlations: CorrelationEngine::new(config.window_ms),
            detector: PatternDetector::default(),
            reporter: AggregateReporter::default(),
            config,
        }
    }
}

impl Analyzer {
    /// Create an analyzer from a validated configuration
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        let timezone = config.tz()?;
        Ok(Self {
            normalizer: TimestampNormalizer::new(timezone),
            correlations: CorrelationEngine::new(config.window_ms),
            detector: PatternDetector::new(config.window_ms, config.thresholds(), timezone),
            reporter: AggregateReporter::new(timezone),
            config,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &TimestampNormalizer {
        &self.normalizer
    }

    /// Normalize and order persisted records
    pub fn sequence(&self, records: &[RawRecord]) -> EventSequence {
        RawRecordAdapter::to_sequence(records, &self.normalizer)
    }

    /// Full pass over persisted records
    pub fn analyze(&self, records: &[RawRecord], now: DateTime<Utc>) -> AnalysisReport {
        let sequence = self.sequence(records);
        self.analyze_events(&sequence, now)
    }

    /// Full pass over an already ordered sequence
    pub fn analyze_events(&self, sequence: &EventSequence, now: DateTime<Utc>) -> AnalysisReport {
        let invalid = sequence.invalid_instant_count();
        if invalid > 0 {
            tracing::warn!(invalid, "events without a resolvable instant are excluded from windows");
        }

        let report = AnalysisReport {
            generated_at: now,
            window_ms: self.config.window_ms,
            total_events: sequence.len(),
            correlations: self.correlations(sequence),
            alerts: self.alerts(sequence, now),
            mood_distribution: self.reporter.mood_distribution(sequence),
            stimulus_distribution: self.reporter.stimulus_distribution(sequence),
            daily_trend: self
                .reporter
                .daily_trend(sequence, now, self.config.trend_days),
            hourly_trend: self.reporter.hourly_trend(sequence),
            stats: self.reporter.quick_stats(sequence, now),
        };

        tracing::debug!(
            events = report.total_events,
            correlations = report.correlations.len(),
            alerts = report.alerts.len(),
            "analysis pass complete"
        );

        report
    }

    /// Correlations over every known category and mood
    pub fn correlations(&self, sequence: &EventSequence) -> Vec<CorrelationPair> {
        self.correlations.compute_all(sequence)
    }

    /// Pattern alerts as of `now`
    pub fn alerts(&self, sequence: &EventSequence, now: DateTime<Utc>) -> Vec<Alert> {
        self.detector.detect(sequence, now)
    }

    pub fn reporter(&self) -> &AggregateReporter {
        &self.reporter
    }
}
