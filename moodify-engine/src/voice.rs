//! Voice path: duration gate in front of the stabilizer
//!
//! Clips shorter than the minimum duration short-circuit to a failed
//! observation without calling the stabilizer, so they never advance the
//! stream's stickiness state. Classifier output the stabilizer rejects is
//! also reported as a failed observation; the voice path never errors.

use crate::stabilizer::{AcousticFeatures, Stabilizer};
use moodify_common::config::VoiceConfig;
use moodify_common::{EmotionLabel, Observation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Classifier output and signal statistics for one audio clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceClip {
    /// Clip length after resampling (seconds)
    pub duration_secs: f64,
    /// Raw class probabilities, in classifier label order
    pub probabilities: Vec<f64>,
    pub features: AcousticFeatures,
}

impl VoiceClip {
    /// Duration of `sample_count` mono samples at `sample_rate` Hz
    pub fn duration_from_samples(sample_count: usize, sample_rate: u32) -> f64 {
        if sample_rate == 0 {
            return 0.0;
        }
        sample_count as f64 / f64::from(sample_rate)
    }
}

/// Voice emotion analyzer
#[derive(Debug, Clone)]
pub struct VoiceAnalyzer {
    min_duration_secs: f64,
    labels: Vec<EmotionLabel>,
}

impl VoiceAnalyzer {
    pub fn new(min_duration_secs: f64, labels: Vec<EmotionLabel>) -> Self {
        Self {
            min_duration_secs,
            labels,
        }
    }

    pub fn from_config(config: &VoiceConfig) -> Self {
        Self::new(config.min_duration_secs, config.labels.clone())
    }

    /// Analyze one clip against a stream's stabilizer
    pub fn analyze(&self, clip: &VoiceClip, stabilizer: &Stabilizer) -> Observation {
        debug!(duration_secs = clip.duration_secs, "Voice clip received");

        if clip.duration_secs.is_nan() || clip.duration_secs < self.min_duration_secs {
            debug!(
                duration_secs = clip.duration_secs,
                min_duration_secs = self.min_duration_secs,
                "Voice clip too short"
            );
            return Observation::failed();
        }

        match stabilizer.stabilize(&self.labels, &clip.probabilities, &clip.features) {
            Ok(observation) => {
                debug!(
                    emotion = %observation.emotion,
                    confidence = observation.confidence,
                    "Final voice emotion"
                );
                observation
            }
            Err(e) => {
                warn!("Voice emotion error: {}", e);
                Observation::failed()
            }
        }
    }
}

impl Default for VoiceAnalyzer {
    fn default() -> Self {
        Self::from_config(&VoiceConfig::default())
    }
}
