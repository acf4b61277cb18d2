//! Acoustic override rules
//!
//! Four signal heuristics that can replace the classifier's decision. They are
//! evaluated strictly in declaration order; with [`RuleResolution::LastMatch`]
//! every matching rule overrides the decision so far, with
//! [`RuleResolution::FirstMatch`] evaluation stops at the first match.

use moodify_common::config::{RuleResolution, RuleThresholds};
use moodify_common::EmotionLabel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Summary statistics of the current clip
///
/// Produced upstream; pitch statistics already count unvoiced frames as 0 Hz.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AcousticFeatures {
    /// Mean of the loudness (RMS) envelope
    pub loudness_mean: f64,
    /// Standard deviation of the loudness envelope
    pub loudness_std: f64,
    /// Mean fundamental frequency (Hz)
    pub pitch_mean: f64,
    /// Standard deviation of the fundamental frequency (Hz)
    pub pitch_std: f64,
    /// Mean spectral centroid (Hz)
    pub centroid_mean: f64,
}

impl AcousticFeatures {
    pub fn is_finite(&self) -> bool {
        [
            self.loudness_mean,
            self.loudness_std,
            self.pitch_mean,
            self.pitch_std,
            self.centroid_mean,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Acoustic override rule, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AcousticRule {
    /// Quiet and low-pitched
    LowEnergySad,
    /// High-pitched with bright timbre
    BrightHappy,
    /// Large pitch swings with loud, variable energy
    AgitatedAngry,
    /// High-pitched but quiet
    TenseFearful,
}

impl AcousticRule {
    pub const ORDER: [AcousticRule; 4] = [
        AcousticRule::LowEnergySad,
        AcousticRule::BrightHappy,
        AcousticRule::AgitatedAngry,
        AcousticRule::TenseFearful,
    ];

    pub fn emotion(&self) -> EmotionLabel {
        match self {
            AcousticRule::LowEnergySad => EmotionLabel::Sad,
            AcousticRule::BrightHappy => EmotionLabel::Happy,
            AcousticRule::AgitatedAngry => EmotionLabel::Angry,
            AcousticRule::TenseFearful => EmotionLabel::Fearful,
        }
    }

    pub fn matches(&self, f: &AcousticFeatures, t: &RuleThresholds) -> bool {
        match self {
            AcousticRule::LowEnergySad => {
                f.loudness_mean < t.sad_max_loudness && f.pitch_mean < t.sad_max_pitch_hz
            }
            AcousticRule::BrightHappy => {
                f.pitch_mean > t.happy_min_pitch_hz && f.centroid_mean > t.happy_min_centroid_hz
            }
            AcousticRule::AgitatedAngry => {
                f.pitch_std > t.angry_min_pitch_std_hz
                    && f.loudness_std > t.angry_min_loudness_std
                    && f.loudness_mean > t.angry_min_loudness
            }
            AcousticRule::TenseFearful => {
                f.pitch_mean > t.fearful_min_pitch_hz && f.loudness_mean < t.fearful_max_loudness
            }
        }
    }
}

impl fmt::Display for AcousticRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AcousticRule::LowEnergySad => "low-energy-sad",
            AcousticRule::BrightHappy => "bright-happy",
            AcousticRule::AgitatedAngry => "agitated-angry",
            AcousticRule::TenseFearful => "tense-fearful",
        };
        f.write_str(name)
    }
}

/// Apply the rule cascade to a base decision
///
/// Returns the resolved emotion and the rule that produced it, if any.
pub fn apply_rules(
    base: EmotionLabel,
    features: &AcousticFeatures,
    thresholds: &RuleThresholds,
    resolution: RuleResolution,
) -> (EmotionLabel, Option<AcousticRule>) {
    let mut emotion = base;
    let mut fired = None;

    for rule in AcousticRule::ORDER {
        if rule.matches(features, thresholds) {
            emotion = rule.emotion();
            fired = Some(rule);
            if resolution == RuleResolution::FirstMatch {
                break;
            }
        }
    }

    (emotion, fired)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Mid-range voice that triggers no rule
    fn plain() -> AcousticFeatures {
        AcousticFeatures {
            loudness_mean: 0.045,
            loudness_std: 0.01,
            pitch_mean: 150.0,
            pitch_std: 20.0,
            centroid_mean: 1500.0,
        }
    }

    fn resolve(features: AcousticFeatures, resolution: RuleResolution) -> (EmotionLabel, Option<AcousticRule>) {
        apply_rules(EmotionLabel::Calm, &features, &RuleThresholds::default(), resolution)
    }

    #[test]
    fn test_no_rule_keeps_base_decision() {
        let (emotion, fired) = resolve(plain(), RuleResolution::LastMatch);
        assert_eq!(emotion, EmotionLabel::Calm);
        assert_eq!(fired, None);
    }

    #[test]
    fn test_low_energy_low_pitch_is_sad() {
        let features = AcousticFeatures { loudness_mean: 0.02, pitch_mean: 110.0, ..plain() };
        assert_eq!(
            resolve(features, RuleResolution::LastMatch),
            (EmotionLabel::Sad, Some(AcousticRule::LowEnergySad))
        );
    }

    #[test]
    fn test_bright_high_pitch_is_happy() {
        let features = AcousticFeatures { pitch_mean: 190.0, centroid_mean: 2600.0, ..plain() };
        assert_eq!(resolve(features, RuleResolution::LastMatch).0, EmotionLabel::Happy);
    }

    #[test]
    fn test_variable_loud_voice_is_angry() {
        let features = AcousticFeatures {
            pitch_std: 90.0,
            loudness_std: 0.06,
            loudness_mean: 0.08,
            ..plain()
        };
        assert_eq!(resolve(features, RuleResolution::LastMatch).0, EmotionLabel::Angry);
    }

    #[test]
    fn test_high_pitch_quiet_voice_is_fearful() {
        let features = AcousticFeatures { pitch_mean: 220.0, loudness_mean: 0.035, ..plain() };
        assert_eq!(resolve(features, RuleResolution::LastMatch).0, EmotionLabel::Fearful);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let features = AcousticFeatures { loudness_mean: 0.03, pitch_mean: 110.0, ..plain() };
        assert_eq!(resolve(features, RuleResolution::LastMatch).1, None);
    }

    #[test]
    fn test_later_rule_overrides_with_last_match() {
        // Bright, high-pitched and quiet: happy and fearful both hold
        let features = AcousticFeatures {
            pitch_mean: 230.0,
            centroid_mean: 2800.0,
            loudness_mean: 0.035,
            ..plain()
        };
        assert_eq!(
            resolve(features, RuleResolution::LastMatch),
            (EmotionLabel::Fearful, Some(AcousticRule::TenseFearful))
        );
    }

    #[test]
    fn test_earlier_rule_kept_with_first_match() {
        let features = AcousticFeatures {
            pitch_mean: 230.0,
            centroid_mean: 2800.0,
            loudness_mean: 0.035,
            ..plain()
        };
        assert_eq!(
            resolve(features, RuleResolution::FirstMatch),
            (EmotionLabel::Happy, Some(AcousticRule::BrightHappy))
        );
    }

    #[test]
    fn test_happy_and_angry_overlap_resolves_to_angry() {
        let features = AcousticFeatures {
            pitch_mean: 200.0,
            centroid_mean: 3000.0,
            pitch_std: 95.0,
            loudness_std: 0.07,
            loudness_mean: 0.09,
        };
        assert_eq!(resolve(features, RuleResolution::LastMatch).0, EmotionLabel::Angry);
        assert_eq!(resolve(features, RuleResolution::FirstMatch).0, EmotionLabel::Happy);
    }
}
