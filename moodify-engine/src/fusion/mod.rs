// Fusion Module - Face + Voice emotion fusion
//
// Combines two independently-failing modality observations into one labelled
// result with a provenance tag. Stateless; safe to call concurrently.
//
// Decision order:
//   1. Face failed  -> voice observation passes through (voice-only)
//   2. Voice failed -> face observation passes through (face-only)
//   3. Same label   -> summed weighted scores + agreement bonus, capped at 1.0
//   4. Strict winner on weighted score (face-dominant / voice-dominant)
//   5. Tie          -> priority order, else fixed neutral fallback

pub mod priority;
pub mod tie;

pub use priority::PriorityOrder;
pub use tie::{ExactTie, TiePolicy};

use moodify_common::config::FusionConfig;
use moodify_common::{EmotionLabel, FusedResult, FusionSource, Observation};
use tracing::debug;

/// Fusion engine with weights, tie-break order and tie policy
#[derive(Debug, Clone)]
pub struct FusionEngine<P: TiePolicy = ExactTie> {
    face_weight: f64,
    voice_weight: f64,
    agreement_bonus: f64,
    fallback_confidence: f64,
    priority: PriorityOrder,
    policy: P,
}

impl FusionEngine<ExactTie> {
    /// Engine with explicit weights and default bonus, fallback and priority order
    pub fn new(face_weight: f64, voice_weight: f64) -> Self {
        let defaults = FusionConfig::default();
        Self {
            face_weight,
            voice_weight,
            agreement_bonus: defaults.agreement_bonus,
            fallback_confidence: defaults.fallback_confidence,
            priority: PriorityOrder::default(),
            policy: ExactTie,
        }
    }

    pub fn from_config(config: &FusionConfig) -> Self {
        Self {
            face_weight: config.face_weight,
            voice_weight: config.voice_weight,
            agreement_bonus: config.agreement_bonus,
            fallback_confidence: config.fallback_confidence,
            priority: PriorityOrder::new(config.priority_order.clone()),
            policy: ExactTie,
        }
    }
}

impl Default for FusionEngine<ExactTie> {
    fn default() -> Self {
        Self::from_config(&FusionConfig::default())
    }
}

impl<P: TiePolicy> FusionEngine<P> {
    /// Swap the tie comparison, keeping every other parameter
    pub fn with_tie_policy<Q: TiePolicy>(self, policy: Q) -> FusionEngine<Q> {
        FusionEngine {
            face_weight: self.face_weight,
            voice_weight: self.voice_weight,
            agreement_bonus: self.agreement_bonus,
            fallback_confidence: self.fallback_confidence,
            priority: self.priority,
            policy,
        }
    }

    /// Fuse a face and a voice observation
    ///
    /// Always returns a structurally valid result. Single-modality results
    /// carry the surviving observation's `success`, `emotion` and `confidence`
    /// unchanged and are tagged `face-only` / `voice-only`.
    pub fn fuse(&self, face: &Observation, voice: &Observation) -> FusedResult {
        if !face.success {
            debug!(emotion = %voice.emotion, "Face unavailable, passing voice through");
            return FusedResult::single(voice.clone(), FusionSource::VoiceOnly);
        }

        if !voice.success {
            debug!(emotion = %face.emotion, "Voice unavailable, passing face through");
            return FusedResult::single(face.clone(), FusionSource::FaceOnly);
        }

        let face_score = face.confidence * self.face_weight;
        let voice_score = voice.confidence * self.voice_weight;

        let result = self.decide(face, voice, face_score, voice_score);

        debug!(
            face_emotion = %face.emotion,
            voice_emotion = %voice.emotion,
            face_score,
            voice_score,
            source = %result.source,
            emotion = %result.emotion,
            "Fusion decision"
        );

        result
    }

    fn decide(
        &self,
        face: &Observation,
        voice: &Observation,
        face_score: f64,
        voice_score: f64,
    ) -> FusedResult {
        if face.emotion == voice.emotion {
            return FusedResult {
                success: true,
                emotion: face.emotion.clone(),
                confidence: (face_score + voice_score + self.agreement_bonus).min(1.0),
                source: FusionSource::FaceVoice,
            };
        }

        let tied = self.policy.is_tie(face_score, voice_score);

        if !tied && face_score > voice_score {
            return FusedResult {
                success: true,
                emotion: face.emotion.clone(),
                confidence: face_score,
                source: FusionSource::FaceDominant,
            };
        }

        if !tied && voice_score > face_score {
            return FusedResult {
                success: true,
                emotion: voice.emotion.clone(),
                confidence: voice_score,
                source: FusionSource::VoiceDominant,
            };
        }

        // Tie (or incomparable scores): priority order decides
        if let Some(label) = self.priority.first_match(&face.emotion, &voice.emotion) {
            return FusedResult {
                success: true,
                emotion: label.clone(),
                confidence: face_score.max(voice_score),
                source: FusionSource::Priority,
            };
        }

        FusedResult {
            success: true,
            emotion: EmotionLabel::Neutral,
            confidence: self.fallback_confidence,
            source: FusionSource::Fallback,
        }
    }
}

/// Fuse with explicit weights and the default priority order and agreement bonus
pub fn fuse_emotions(
    face: &Observation,
    voice: &Observation,
    face_weight: f64,
    voice_weight: f64,
) -> FusedResult {
    FusionEngine::new(face_weight, voice_weight).fuse(face, voice)
}
