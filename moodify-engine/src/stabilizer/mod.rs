//! Streaming stabilizer for the voice path
//!
//! Post-processes one raw voice classification per request:
//!
//! 1. Base decision: `neutral` if the probability vector's entropy exceeds the
//!    threshold, otherwise the arg-max label
//! 2. Acoustic override rules (sad, happy, angry, fearful), strictly ordered
//! 3. Stickiness control: a label repeated often enough across consecutive
//!    requests is forced to `neutral` and the streak restarts
//!
//! The reported confidence is always the raw classifier's maximum probability,
//! independent of which rule decided the label.
//!
//! State persists across requests. One [`Stabilizer`] serves one voice stream;
//! each call performs its whole read-modify-write under a single lock, so
//! concurrent callers on the same stream cannot lose updates.

pub mod entropy;
pub mod rules;

pub use entropy::{argmax, base_decision, shannon_entropy};
pub use rules::{apply_rules, AcousticFeatures, AcousticRule};

use moodify_common::config::StabilizerConfig;
use moodify_common::{EmotionLabel, Observation};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info};

/// Classifier output the stabilizer cannot use
#[derive(Debug, Error, PartialEq)]
pub enum StabilizerError {
    #[error("Empty probability vector")]
    EmptyProbabilities,

    #[error("Probability vector has {probabilities} entries but {labels} labels are configured")]
    LabelMismatch { probabilities: usize, labels: usize },

    #[error("Probability vector contains a non-finite value")]
    NonFiniteProbability,

    #[error("Probability {0} out of range [0.0, 1.0]")]
    ProbabilityOutOfRange(f64),

    #[error("Acoustic features contain a non-finite value")]
    NonFiniteFeatures,
}

/// Cross-request memory of the stickiness control
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StabilizerState {
    /// Final emotion of the previous successful classification
    pub last_emotion: Option<EmotionLabel>,
    /// Consecutive repeats of `last_emotion` (0 after every change or reset)
    pub streak: u32,
}

/// Outcome of one stickiness transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StickinessOutcome {
    pub emotion: EmotionLabel,
    /// True when the streak hit the threshold and the label was forced to neutral
    pub forced: bool,
}

impl StabilizerState {
    /// Advance the state machine with a newly resolved emotion
    pub fn advance(&mut self, emotion: EmotionLabel, threshold: u32) -> StickinessOutcome {
        let mut emotion = emotion;
        let mut forced = false;

        if self.last_emotion.as_ref() == Some(&emotion) {
            self.streak += 1;
            if self.streak >= threshold {
                emotion = EmotionLabel::Neutral;
                self.streak = 0;
                forced = true;
            }
        } else {
            self.streak = 0;
        }

        self.last_emotion = Some(emotion.clone());
        StickinessOutcome { emotion, forced }
    }
}

/// Per-stream stabilizer: configuration plus guarded state
#[derive(Debug)]
pub struct Stabilizer {
    config: StabilizerConfig,
    state: Mutex<StabilizerState>,
}

impl Stabilizer {
    pub fn new(config: StabilizerConfig) -> Self {
        Self::with_state(config, StabilizerState::default())
    }

    /// Start from an injected state
    pub fn with_state(config: StabilizerConfig, state: StabilizerState) -> Self {
        Self {
            config,
            state: Mutex::new(state),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> StabilizerState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Forget the previous decision and streak
    pub fn reset(&self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = StabilizerState::default();
    }

    /// Stabilize one raw classification
    ///
    /// Inputs are validated before the state is touched; an error leaves the
    /// state exactly as it was.
    pub fn stabilize(
        &self,
        labels: &[EmotionLabel],
        probabilities: &[f64],
        features: &AcousticFeatures,
    ) -> Result<Observation, StabilizerError> {
        validate(labels, probabilities, features)?;

        debug!(
            loudness_mean = features.loudness_mean,
            loudness_std = features.loudness_std,
            pitch_mean = features.pitch_mean,
            pitch_std = features.pitch_std,
            centroid_mean = features.centroid_mean,
            "Voice signal statistics"
        );

        let (base, entropy) = base_decision(labels, probabilities, self.config.entropy_threshold);
        if entropy > self.config.entropy_threshold {
            debug!(entropy, "High uncertainty, base decision neutral");
        }

        let (resolved, fired) = apply_rules(
            base.clone(),
            features,
            &self.config.rules,
            self.config.rule_resolution,
        );
        if let Some(rule) = fired {
            debug!(%rule, from = %base, to = %resolved, "Acoustic rule override");
        }

        let outcome = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.advance(resolved, self.config.stickiness_threshold)
        };
        if outcome.forced {
            info!("Voice emotion stuck, reset to neutral");
        }

        // Label comes from the rules, confidence from the raw classifier
        let confidence = probabilities.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Ok(Observation {
            success: true,
            emotion: outcome.emotion,
            confidence,
            face_detected: None,
        })
    }
}

fn validate(
    labels: &[EmotionLabel],
    probabilities: &[f64],
    features: &AcousticFeatures,
) -> Result<(), StabilizerError> {
    if probabilities.is_empty() {
        return Err(StabilizerError::EmptyProbabilities);
    }
    if probabilities.len() != labels.len() {
        return Err(StabilizerError::LabelMismatch {
            probabilities: probabilities.len(),
            labels: labels.len(),
        });
    }
    if probabilities.iter().any(|p| !p.is_finite()) {
        return Err(StabilizerError::NonFiniteProbability);
    }
    if let Some(&p) = probabilities.iter().find(|p| !(0.0..=1.0).contains(*p)) {
        return Err(StabilizerError::ProbabilityOutOfRange(p));
    }
    if !features.is_finite() {
        return Err(StabilizerError::NonFiniteFeatures);
    }
    Ok(())
}
