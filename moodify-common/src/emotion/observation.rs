//! Per-modality observations and fused results

use super::EmotionLabel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One modality's emotion classification for a single request
///
/// Failures travel through `success`, never through errors: an upstream
/// detector that could not decode its input or found no face reports
/// `success = false` and the fusion layer decides what to do with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub success: bool,
    pub emotion: EmotionLabel,
    /// Classifier confidence (0.0-1.0)
    pub confidence: f64,
    /// Set by the face detector only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_detected: Option<bool>,
}

impl Observation {
    /// Successful observation with confidence clamped to 0.0-1.0
    pub fn detected(emotion: impl Into<EmotionLabel>, confidence: f64) -> Self {
        Self {
            success: true,
            emotion: emotion.into(),
            confidence: confidence.clamp(0.0, 1.0),
            face_detected: None,
        }
    }

    /// Failed observation: `{success: false, emotion: neutral, confidence: 0.0}`
    pub fn failed() -> Self {
        Self {
            success: false,
            emotion: EmotionLabel::Neutral,
            confidence: 0.0,
            face_detected: None,
        }
    }

    pub fn with_face_detected(mut self, face_detected: bool) -> Self {
        self.face_detected = Some(face_detected);
        self
    }
}

/// Provenance of a fused decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FusionSource {
    /// Both modalities agreed on the label
    #[serde(rename = "face+voice")]
    FaceVoice,
    /// Labels differed and the face score was strictly higher
    #[serde(rename = "face-dominant")]
    FaceDominant,
    /// Labels differed and the voice score was strictly higher
    #[serde(rename = "voice-dominant")]
    VoiceDominant,
    /// Scores tied and the priority order picked the label
    #[serde(rename = "priority")]
    Priority,
    /// Scores tied and neither label is in the priority order
    #[serde(rename = "fallback")]
    Fallback,
    /// Voice failed; the face observation passed through unchanged
    #[serde(rename = "face-only")]
    FaceOnly,
    /// Face failed; the voice observation passed through unchanged
    #[serde(rename = "voice-only")]
    VoiceOnly,
}

impl FusionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            FusionSource::FaceVoice => "face+voice",
            FusionSource::FaceDominant => "face-dominant",
            FusionSource::VoiceDominant => "voice-dominant",
            FusionSource::Priority => "priority",
            FusionSource::Fallback => "fallback",
            FusionSource::FaceOnly => "face-only",
            FusionSource::VoiceOnly => "voice-only",
        }
    }

    /// True for the two single-modality pass-through tags
    pub fn is_single_modality(&self) -> bool {
        matches!(self, FusionSource::FaceOnly | FusionSource::VoiceOnly)
    }
}

impl fmt::Display for FusionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of fusing a face and a voice observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedResult {
    pub success: bool,
    pub emotion: EmotionLabel,
    pub confidence: f64,
    pub source: FusionSource,
}

impl FusedResult {
    /// Carry a single-modality observation through verbatim
    ///
    /// `success`, `emotion` and `confidence` are copied as-is; only the
    /// provenance tag is added.
    pub fn single(observation: Observation, source: FusionSource) -> Self {
        Self {
            success: observation.success,
            emotion: observation.emotion,
            confidence: observation.confidence,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detected_clamps_confidence() {
        assert_eq!(Observation::detected("happy", 1.7).confidence, 1.0);
        assert_eq!(Observation::detected("happy", -0.2).confidence, 0.0);
        assert_eq!(Observation::detected("happy", 0.42).confidence, 0.42);
    }

    #[test]
    fn test_failed_observation_shape() {
        let obs = Observation::failed();
        assert!(!obs.success);
        assert_eq!(obs.emotion, EmotionLabel::Neutral);
        assert_eq!(obs.confidence, 0.0);
        assert_eq!(obs.face_detected, None);
    }

    #[test]
    fn test_face_detected_flag_serialization() {
        let voice = serde_json::to_value(Observation::detected("sad", 0.5)).unwrap();
        assert!(voice.get("face_detected").is_none());

        let face = serde_json::to_value(Observation::detected("sad", 0.5).with_face_detected(true)).unwrap();
        assert_eq!(face["face_detected"], serde_json::json!(true));
    }

    #[test]
    fn test_observation_deserializes_without_face_flag() {
        let obs: Observation =
            serde_json::from_str(r#"{"success":true,"emotion":"angry","confidence":0.9}"#).unwrap();
        assert!(obs.success);
        assert_eq!(obs.emotion, EmotionLabel::Angry);
        assert_eq!(obs.face_detected, None);
    }

    #[test]
    fn test_fusion_source_wire_names() {
        let cases = [
            (FusionSource::FaceVoice, "face+voice"),
            (FusionSource::FaceDominant, "face-dominant"),
            (FusionSource::VoiceDominant, "voice-dominant"),
            (FusionSource::Priority, "priority"),
            (FusionSource::Fallback, "fallback"),
            (FusionSource::FaceOnly, "face-only"),
            (FusionSource::VoiceOnly, "voice-only"),
        ];

        for (source, name) in cases {
            assert_eq!(serde_json::to_string(&source).unwrap(), format!("\"{}\"", name));
            assert_eq!(source.as_str(), name);
        }
    }

    #[test]
    fn test_single_keeps_observation_verbatim() {
        let obs = Observation::detected("sad", 0.5).with_face_detected(true);
        let fused = FusedResult::single(obs, FusionSource::FaceOnly);
        assert!(fused.success);
        assert_eq!(fused.emotion, EmotionLabel::Sad);
        assert_eq!(fused.confidence, 0.5);
        assert!(fused.source.is_single_modality());
    }
}
