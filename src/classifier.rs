//! Event classification predicates
//!
//! Thin accessors over an observation's shape. Every rule in the engine asks its
//! questions through these so the matching logic stays in one place.

use crate::types::{
    EventKind, Intensity, MoodLabel, Observation, ObservationEvent, StimulusCategory,
};

impl MoodLabel {
    /// Angry and Anxious count toward distress rules
    pub fn is_distress(&self) -> bool {
        matches!(self, MoodLabel::Angry | MoodLabel::Anxious)
    }
}

impl ObservationEvent {
    pub fn kind(&self) -> EventKind {
        match self.observation {
            Observation::Mood { .. } => EventKind::Mood,
            Observation::Stimulus { .. } => EventKind::Stimulus,
        }
    }

    pub fn is_mood(&self) -> bool {
        self.kind() == EventKind::Mood
    }

    pub fn is_stimulus(&self) -> bool {
        self.kind() == EventKind::Stimulus
    }

    /// Mood label, if this is a mood observation
    pub fn mood_label(&self) -> Option<MoodLabel> {
        match self.observation {
            Observation::Mood { label } => Some(label),
            Observation::Stimulus { .. } => None,
        }
    }

    /// Stimulus category, if this is a stimulus observation
    pub fn stimulus_category(&self) -> Option<StimulusCategory> {
        match self.observation {
            Observation::Stimulus { category, .. } => Some(category),
            Observation::Mood { .. } => None,
        }
    }

    /// Stimulus intensity, if this is a stimulus observation
    pub fn intensity(&self) -> Option<Intensity> {
        match self.observation {
            Observation::Stimulus { intensity, .. } => Some(intensity),
            Observation::Mood { .. } => None,
        }
    }

    pub fn is_mood_of(&self, label: MoodLabel) -> bool {
        self.mood_label() == Some(label)
    }

    pub fn is_stimulus_of(&self, category: StimulusCategory) -> bool {
        self.stimulus_category() == Some(category)
    }

    /// Mood observation labelled Angry or Anxious
    pub fn is_distress_mood(&self) -> bool {
        self.mood_label().is_some_and(|label| label.is_distress())
    }

    /// Stimulus observation reported at High intensity
    pub fn is_high_intensity(&self) -> bool {
        self.intensity() == Some(Intensity::High)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Instant;

    #[test]
    fn test_mood_predicates() {
        let event = ObservationEvent::mood(MoodLabel::Anxious, Instant::from_millis(0));
        assert!(event.is_mood());
        assert!(!event.is_stimulus());
        assert_eq!(event.kind(), EventKind::Mood);
        assert!(event.is_mood_of(MoodLabel::Anxious));
        assert!(!event.is_mood_of(MoodLabel::Angry));
        assert!(event.is_distress_mood());
        assert_eq!(event.stimulus_category(), None);
        assert!(!event.is_high_intensity());
    }

    #[test]
    fn test_stimulus_predicates() {
        let event = ObservationEvent::stimulus(
            StimulusCategory::Tactile,
            Intensity::High,
            Instant::from_millis(0),
        );
        assert!(event.is_stimulus());
        assert!(event.is_stimulus_of(StimulusCategory::Tactile));
        assert!(event.is_high_intensity());
        assert!(!event.is_distress_mood());
        assert_eq!(event.mood_label(), None);
    }

    #[test]
    fn test_distress_labels() {
        let distress: Vec<MoodLabel> = MoodLabel::ALL
            .into_iter()
            .filter(|l| l.is_distress())
            .collect();
        assert_eq!(distress, vec![MoodLabel::Angry, MoodLabel::Anxious]);
    }
}
