//! Request-level operations
//!
//! Four entry points, one per kind of request:
//! - face only: a face observation decides the emotion
//! - voice only: a clip goes through the duration gate and the stream's stabilizer
//! - fused: both of the above, then the fusion engine
//! - recommend: a caller-chosen emotion, no detection at all
//!
//! Every decided response carries the search parameters for its emotion. A
//! fifth request kind, `reset`, drops a voice stream's stickiness state.

use crate::error::{EngineError, EngineResult};
use crate::fusion::FusionEngine;
use crate::recommend::Recommendation;
use crate::registry::{StabilizerRegistry, DEFAULT_STREAM};
use crate::voice::{VoiceAnalyzer, VoiceClip};
use chrono::{DateTime, Utc};
use moodify_common::config::{RecommendConfig, TomlConfig};
use moodify_common::{EmotionLabel, FusionSource, Observation};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use tracing::{info, warn};
use uuid::Uuid;

/// One request, tagged by `kind`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoodRequest {
    Face {
        face: Observation,
    },
    Voice {
        #[serde(default)]
        stream: Option<String>,
        clip: VoiceClip,
    },
    Fused {
        #[serde(default)]
        stream: Option<String>,
        face: Observation,
        clip: VoiceClip,
    },
    Recommend {
        emotion: EmotionLabel,
    },
    Reset {
        #[serde(default)]
        stream: Option<String>,
    },
}

/// Where a response's emotion came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoodSource {
    Face,
    Voice,
    /// Caller-chosen emotion
    Manual,
    Fused(FusionSource),
}

impl MoodSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoodSource::Face => "face",
            MoodSource::Voice => "voice",
            MoodSource::Manual => "manual",
            MoodSource::Fused(source) => source.as_str(),
        }
    }
}

impl fmt::Display for MoodSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MoodSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Response to one request
#[derive(Debug, Clone, Serialize)]
pub struct MoodResponse {
    pub request_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<MoodSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion: Option<EmotionLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl MoodResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            success: false,
            source: None,
            emotion: None,
            confidence: None,
            recommendation: None,
            message: Some(message.into()),
        }
    }

    /// Successful response that decides no emotion
    fn acknowledged(message: impl Into<String>) -> Self {
        Self {
            success: true,
            ..Self::failure(message)
        }
    }

    fn decided(
        source: MoodSource,
        emotion: EmotionLabel,
        confidence: Option<f64>,
        recommendation: Recommendation,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            success: true,
            source: Some(source),
            emotion: Some(emotion),
            confidence,
            recommendation: Some(recommendation),
            message: None,
        }
    }
}

/// Fusion engine, voice path and per-stream stabilizers behind one facade
#[derive(Debug, Clone)]
pub struct MoodService {
    fusion: FusionEngine,
    voice: VoiceAnalyzer,
    registry: StabilizerRegistry,
    recommend: RecommendConfig,
}

impl MoodService {
    pub fn from_config(config: &TomlConfig) -> Self {
        Self {
            fusion: FusionEngine::from_config(&config.fusion),
            voice: VoiceAnalyzer::from_config(&config.voice),
            registry: StabilizerRegistry::new(config.stabilizer.clone()),
            recommend: config.recommend.clone(),
        }
    }

    pub fn registry(&self) -> &StabilizerRegistry {
        &self.registry
    }

    /// Face-only request
    pub fn analyze_face(&self, face: &Observation) -> MoodResponse {
        if !face.success {
            return MoodResponse::failure("Face not detected");
        }

        info!(
            "FACE emotion: {} (confidence={:.2})",
            face.emotion, face.confidence
        );

        MoodResponse::decided(
            MoodSource::Face,
            face.emotion.clone(),
            Some(face.confidence),
            self.recommendation(&face.emotion),
        )
    }

    /// Voice-only request against `stream`'s stabilizer
    pub async fn analyze_voice(&self, stream: &str, clip: &VoiceClip) -> MoodResponse {
        let stabilizer = self.registry.stream(stream).await;
        let voice = self.voice.analyze(clip, &stabilizer);

        if !voice.success {
            return MoodResponse::failure("Voice emotion detection failed");
        }

        info!(
            stream,
            "VOICE emotion: {} (confidence={:.2})", voice.emotion, voice.confidence
        );

        let recommendation = self.recommendation(&voice.emotion);
        MoodResponse::decided(
            MoodSource::Voice,
            voice.emotion,
            Some(voice.confidence),
            recommendation,
        )
    }

    /// Face + voice request
    ///
    /// Always answers `success: true` with the fused provenance tag, even when
    /// both modalities failed and the result is the failed voice observation.
    pub async fn analyze_fused(
        &self,
        stream: &str,
        face: &Observation,
        clip: &VoiceClip,
    ) -> MoodResponse {
        let stabilizer = self.registry.stream(stream).await;
        let voice = self.voice.analyze(clip, &stabilizer);

        let fused = self.fusion.fuse(face, &voice);
        if !fused.success {
            warn!(stream, "Neither face nor voice produced an emotion");
        }

        info!(
            stream,
            "FUSED emotion: {} (confidence={:.2}, source={})",
            fused.emotion,
            fused.confidence,
            fused.source
        );

        let recommendation = self.recommendation(&fused.emotion);
        MoodResponse::decided(
            MoodSource::Fused(fused.source),
            fused.emotion,
            Some(fused.confidence),
            recommendation,
        )
    }

    /// Manual request for a caller-chosen emotion
    pub fn recommend(&self, emotion: &EmotionLabel) -> MoodResponse {
        MoodResponse::decided(
            MoodSource::Manual,
            emotion.clone(),
            None,
            self.recommendation(emotion),
        )
    }

    /// Forget a voice stream's stabilizer state
    pub async fn reset_stream(&self, stream: &str) -> MoodResponse {
        if !self.registry.reset(stream).await {
            return MoodResponse::failure(format!("Unknown voice stream: {}", stream));
        }

        info!(stream, "Voice stream reset");
        MoodResponse::acknowledged(format!("Voice stream {} reset", stream))
    }

    pub async fn handle(&self, request: MoodRequest) -> MoodResponse {
        match request {
            MoodRequest::Face { face } => self.analyze_face(&face),
            MoodRequest::Voice { stream, clip } => {
                let stream = stream.as_deref().unwrap_or(DEFAULT_STREAM);
                self.analyze_voice(stream, &clip).await
            }
            MoodRequest::Fused { stream, face, clip } => {
                let stream = stream.as_deref().unwrap_or(DEFAULT_STREAM);
                self.analyze_fused(stream, &face, &clip).await
            }
            MoodRequest::Recommend { emotion } => self.recommend(&emotion),
            MoodRequest::Reset { stream } => {
                let stream = stream.as_deref().unwrap_or(DEFAULT_STREAM);
                self.reset_stream(stream).await
            }
        }
    }

    /// Decode and handle one JSON request line
    ///
    /// Requests without a `stream` use `default_stream`. Undecodable lines
    /// produce a failure response.
    pub async fn handle_line(&self, line: &str, default_stream: &str) -> MoodResponse {
        match parse_request(line) {
            Ok(request) => self.handle(with_default_stream(request, default_stream)).await,
            Err(e) => {
                warn!("Rejected request: {}", e);
                MoodResponse::failure(e.to_string())
            }
        }
    }

    fn recommendation(&self, emotion: &EmotionLabel) -> Recommendation {
        Recommendation::for_emotion(emotion, &self.recommend)
    }
}

impl Default for MoodService {
    fn default() -> Self {
        Self::from_config(&TomlConfig::default())
    }
}

fn parse_request(line: &str) -> EngineResult<MoodRequest> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput("empty request".to_string()));
    }
    Ok(serde_json::from_str(trimmed)?)
}

fn with_default_stream(request: MoodRequest, default_stream: &str) -> MoodRequest {
    match request {
        MoodRequest::Voice { stream: None, clip } => MoodRequest::Voice {
            stream: Some(default_stream.to_string()),
            clip,
        },
        MoodRequest::Fused {
            stream: None,
            face,
            clip,
        } => MoodRequest::Fused {
            stream: Some(default_stream.to_string()),
            face,
            clip,
        },
        MoodRequest::Reset { stream: None } => MoodRequest::Reset {
            stream: Some(default_stream.to_string()),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stabilizer::AcousticFeatures;

    fn happy_clip() -> VoiceClip {
        VoiceClip {
            duration_secs: 3.0,
            // neutral, calm, happy, sad, angry, fearful, disgust, surprise
            probabilities: vec![0.02, 0.02, 0.86, 0.02, 0.02, 0.02, 0.02, 0.02],
            features: AcousticFeatures {
                loudness_mean: 0.045,
                loudness_std: 0.01,
                pitch_mean: 150.0,
                pitch_std: 20.0,
                centroid_mean: 1500.0,
            },
        }
    }

    #[test]
    fn test_face_failure_message() {
        let service = MoodService::default();
        let response = service.analyze_face(&Observation::failed().with_face_detected(false));
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("Face not detected"));
        assert!(response.recommendation.is_none());
    }

    #[test]
    fn test_face_success_includes_recommendation() {
        let service = MoodService::default();
        let response = service.analyze_face(&Observation::detected("sad", 0.7));
        assert!(response.success);
        assert_eq!(response.source, Some(MoodSource::Face));
        assert_eq!(response.confidence, Some(0.7));
        assert_eq!(
            response.recommendation.map(|r| r.query),
            Some("sad acoustic emotional".to_string())
        );
    }

    #[tokio::test]
    async fn test_short_voice_clip_fails() {
        let service = MoodService::default();
        let mut clip = happy_clip();
        clip.duration_secs = 1.0;

        let response = service.analyze_voice("mic", &clip).await;
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("Voice emotion detection failed"));
    }

    #[tokio::test]
    async fn test_fused_agreement() {
        let service = MoodService::default();
        let response = service
            .analyze_fused("mic", &Observation::detected("happy", 0.9), &happy_clip())
            .await;

        assert!(response.success);
        assert_eq!(response.source, Some(MoodSource::Fused(FusionSource::FaceVoice)));
        assert_eq!(response.emotion, Some(EmotionLabel::Happy));
        // 0.9 * 0.6 + 0.86 * 0.4 + 0.1
        let confidence = response.confidence.unwrap();
        assert!((confidence - 0.984).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_fused_with_both_failed_still_succeeds() {
        let service = MoodService::default();
        let mut clip = happy_clip();
        clip.duration_secs = 0.5;

        let response = service.analyze_fused("mic", &Observation::failed(), &clip).await;
        assert!(response.success);
        assert_eq!(response.source, Some(MoodSource::Fused(FusionSource::VoiceOnly)));
        assert_eq!(response.emotion, Some(EmotionLabel::Neutral));
        assert_eq!(response.confidence, Some(0.0));
    }

    #[tokio::test]
    async fn test_handle_line_dispatches_by_kind() {
        let service = MoodService::default();
        let response = service
            .handle_line(r#"{"kind":"recommend","emotion":"angry"}"#, "cli")
            .await;
        assert!(response.success);
        assert_eq!(response.source, Some(MoodSource::Manual));
        assert_eq!(response.confidence, None);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["source"], "manual");
        assert_eq!(json["recommendation"]["query"], "angry rock metal");
    }

    #[tokio::test]
    async fn test_handle_line_rejects_garbage() {
        let service = MoodService::default();
        let response = service.handle_line("{not json", "cli").await;
        assert!(!response.success);
        assert!(response.message.unwrap().starts_with("Invalid request"));

        let response = service.handle_line("   ", "cli").await;
        assert!(!response.success);
        assert!(response.message.unwrap().starts_with("Invalid input"));
    }

    #[tokio::test]
    async fn test_reset_request_drops_stream() {
        let service = MoodService::default();
        let voice = serde_json::to_string(&MoodRequest::Voice {
            stream: Some("kitchen".to_string()),
            clip: happy_clip(),
        })
        .unwrap();
        service.handle_line(&voice, "cli").await;
        assert_eq!(service.registry().len().await, 1);

        let response = service
            .handle_line(r#"{"kind":"reset","stream":"kitchen"}"#, "cli")
            .await;
        assert!(response.success);
        assert!(response.source.is_none());
        assert!(service.registry().is_empty().await);

        let response = service
            .handle_line(r#"{"kind":"reset","stream":"kitchen"}"#, "cli")
            .await;
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("Unknown voice stream: kitchen"));
    }

    #[tokio::test]
    async fn test_reset_without_stream_uses_default() {
        let service = MoodService::default();
        service.analyze_voice("cli", &happy_clip()).await;

        let response = service.handle_line(r#"{"kind":"reset"}"#, "cli").await;
        assert!(response.success);
        assert!(service.registry().is_empty().await);
    }

    #[tokio::test]
    async fn test_handle_line_uses_default_stream() {
        let service = MoodService::default();
        let line = serde_json::to_string(&MoodRequest::Voice {
            stream: None,
            clip: happy_clip(),
        })
        .unwrap();

        service.handle_line(&line, "cli").await;
        assert_eq!(service.registry().stream_ids().await, vec!["cli"]);
    }
}
