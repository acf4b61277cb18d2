// Priority Order - Tie-break oracle for equal fusion scores
//
// Fixed ranking over a subset of the emotion vocabulary. Consulted only when the
// two weighted scores tie exactly; the first label in the order that matches
// either observation wins.

use moodify_common::EmotionLabel;

/// Ordered tie-break list, highest priority first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityOrder {
    labels: Vec<EmotionLabel>,
}

impl PriorityOrder {
    pub fn new(labels: Vec<EmotionLabel>) -> Self {
        Self { labels }
    }

    /// First label in priority order equal to `a` or `b`
    ///
    /// Linear scan; the list is short. Returns `None` when neither label is
    /// ranked.
    pub fn first_match(&self, a: &EmotionLabel, b: &EmotionLabel) -> Option<&EmotionLabel> {
        self.labels.iter().find(|label| *label == a || *label == b)
    }
}

impl Default for PriorityOrder {
    /// happy > excited > calm > neutral > sad > angry
    fn default() -> Self {
        Self::new(vec![
            EmotionLabel::Happy,
            EmotionLabel::Excited,
            EmotionLabel::Calm,
            EmotionLabel::Neutral,
            EmotionLabel::Sad,
            EmotionLabel::Angry,
        ])
    }
}
