//! Insight prompt formatting
//!
//! The narrative insight is produced by an external text-generation service.
//! This module only builds the prompt from an [`AnalysisReport`] and defines
//! the [`InsightGenerator`] seam the host application implements. Generation is
//! a single attempt: a failure is surfaced to the caller as-is.

use crate::error::AnalysisError;
use crate::pipeline::AnalysisReport;
use crate::types::AlertSeverity;
use crate::window::describe_window;

/// External text-generation service
pub trait InsightGenerator {
    /// Generate text for `prompt`
    fn generate(&self, prompt: &str) -> Result<String, AnalysisError>;
}

/// Build the prompt sent to the insight service
pub fn build_insight_prompt(student_name: &str, report: &AnalysisReport) -> String {
    let stats = &report.stats;
    let mut lines = vec![
        format!(
            "You are supporting an educator who works with {}. Review the observation log \
             summary below and describe the behavioral patterns you see.",
            student_name
        ),
        String::new(),
        format!(
            "Logged observations: {} ({} mood, {} sensory, {} high intensity).",
            stats.total_events,
            stats.mood_events,
            stats.stimulus_events,
            stats.high_intensity_events
        ),
    ];

    let moods = report
        .mood_distribution
        .iter()
        .map(|c| format!("{} {}", c.label, c.count))
        .collect::<Vec<_>>();
    if !moods.is_empty() {
        lines.push(format!("Mood distribution: {}.", moods.join(", ")));
    }

    let stimuli = report
        .stimulus_distribution
        .iter()
        .filter(|c| c.count > 0)
        .map(|c| format!("{} {}", c.label, c.count))
        .collect::<Vec<_>>();
    if !stimuli.is_empty() {
        lines.push(format!("Sensory inputs: {}.", stimuli.join(", ")));
    }

    lines.push(String::new());
    lines.push(format!(
        "Sensory inputs followed by a mood within {}:",
        describe_window(report.window_ms)
    ));
    if report.correlations.is_empty() {
        lines.push("- none observed".to_string());
    }
    lines.extend(report.correlations.iter().map(|pair| {
        format!(
            "- {} -> {}: {} time{}",
            pair.stimulus_category,
            pair.mood_label,
            pair.occurrence_count,
            if pair.occurrence_count == 1 { "" } else { "s" }
        )
    }));

    lines.push(String::new());
    lines.push("Current alerts:".to_string());
    if report.alerts.is_empty() {
        lines.push("- none".to_string());
    }
    lines.extend(report.alerts.iter().map(|alert| {
        let level = match alert.severity {
            AlertSeverity::Warning => "warning",
            AlertSeverity::Info => "info",
        };
        format!("- [{}] {}", level, alert.message)
    }));

    lines.push(String::new());
    lines.push(
        "Suggest three to five practical, supportive strategies for the classroom. \
         Keep the answer short and avoid clinical diagnoses."
            .to_string(),
    );

    lines.join("\n")
}

/// Build the prompt and call the generator once
pub fn generate_insight<G: InsightGenerator + ?Sized>(
    generator: &G,
    student_name: &str,
    report: &AnalysisReport,
) -> Result<String, AnalysisError> {
    let prompt = build_insight_prompt(student_name, report);
    tracing::debug!(chars = prompt.len(), "requesting insight");

    let text = generator.generate(&prompt)?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AnalysisError::InsightError(
            "generator returned an empty response".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Analyzer;
    use crate::schema::RawRecord;
    use crate::types::{Intensity, MoodLabel, StimulusCategory};
    use chrono::{TimeZone, Utc};
    use std::cell::RefCell;

    struct RecordingGenerator {
        response: Result<String, String>,
        prompts: RefCell<Vec<String>>,
    }

    impl InsightGenerator for RecordingGenerator {
        fn generate(&self, prompt: &str) -> Result<String, AnalysisError> {
            self.prompts.borrow_mut().push(prompt.to_string());
            self.response
                .clone()
                .map_err(AnalysisError::InsightError)
        }
    }

    fn report() -> AnalysisReport {
        let base = Utc
            .with_ymd_and_hms(2024, 1, 15, 9, 0, 0)
            .unwrap()
            .timestamp_millis();
        let records = vec![
            RawRecord::stimulus(StimulusCategory::Auditory, Intensity::High, base),
            RawRecord::mood(MoodLabel::Anxious, base + 600_000),
        ];
        Analyzer::default().analyze(&records, Utc.timestamp_millis_opt(base + 700_000).unwrap())
    }

    #[test]
    fn test_prompt_contents() {
        let prompt = build_insight_prompt("Sam", &report());
        assert!(prompt.contains("works with Sam"));
        assert!(prompt.contains("Logged observations: 2 (1 mood, 1 sensory, 1 high intensity)."));
        assert!(prompt.contains("Mood distribution: Happy 0, Sad 0, Angry 0, Anxious 1."));
        assert!(prompt.contains("Sensory inputs: Auditory 1."));
        assert!(prompt.contains("within 2 hours:"));
        assert!(prompt.contains("- Auditory -> Anxious: 1 time\n"));
        assert!(prompt.contains(
            "- [warning] High Auditory input was followed by feeling Anxious"
        ));
    }

    #[test]
    fn test_prompt_for_empty_report() {
        let empty = Analyzer::default().analyze(&[], Utc::now());
        let prompt = build_insight_prompt("Sam", &empty);
        assert!(prompt.contains("- none observed"));
        assert!(prompt.contains("Current alerts:\n- none"));
    }

    #[test]
    fn test_prompt_section_layout() {
        let prompt = build_insight_prompt("Sam", &report());
        assert!(prompt.contains("behavioral patterns you see.\n\nLogged observations:"));
        assert!(prompt.contains("Auditory 1.\n\nSensory inputs followed by a mood"));
        assert!(prompt.contains("\n\nCurrent alerts:\n- [warning]"));
        assert!(prompt.ends_with("avoid clinical diagnoses."));
        assert!(!prompt.contains("\n\n\n"));
    }

    #[test]
    fn test_generate_insight_single_attempt() {
        let generator = RecordingGenerator {
            response: Ok("  Offer headphones during assemblies.  ".to_string()),
            prompts: RefCell::new(Vec::new()),
        };
        let text = generate_insight(&generator, "Sam", &report()).unwrap();
        assert_eq!(text, "Offer headphones during assemblies.");
        assert_eq!(generator.prompts.borrow().len(), 1);
    }

    #[test]
    fn test_generate_insight_surfaces_errors() {
        let failing = RecordingGenerator {
            response: Err("service unavailable".to_string()),
            prompts: RefCell::new(Vec::new()),
        };
        let err = generate_insight(&failing, "Sam", &report()).unwrap_err();
        assert!(matches!(err, AnalysisError::InsightError(_)));
        assert_eq!(failing.prompts.borrow().len(), 1);

        let blank = RecordingGenerator {
            response: Ok("   ".to_string()),
            prompts: RefCell::new(Vec::new()),
        };
        assert!(generate_insight(&blank, "Sam", &report()).is_err());
    }
}
