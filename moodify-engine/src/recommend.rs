//! Emotion to music-search mapping
//!
//! Turns a decided emotion into the parameters a catalog search needs: a
//! free-text query and a target audio profile. The catalog call itself lives
//! outside this crate.

use moodify_common::config::RecommendConfig;
use moodify_common::EmotionLabel;
use serde::{Deserialize, Serialize};

/// Query used for labels without a dedicated mapping
pub const DEFAULT_QUERY: &str = "chill pop";

/// Target audio characteristics for an emotion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MusicProfile {
    /// Musical positiveness (0.0-1.0)
    pub valence: f64,
    /// Perceived intensity (0.0-1.0)
    pub energy: f64,
    /// Suitability for dancing (0.0-1.0)
    pub danceability: f64,
    /// Beats per minute
    pub tempo: f64,
}

impl MusicProfile {
    const NEUTRAL: MusicProfile = MusicProfile {
        valence: 0.5,
        energy: 0.5,
        danceability: 0.5,
        tempo: 100.0,
    };

    /// Profile for an emotion; unmapped labels get the neutral profile
    pub fn for_emotion(emotion: &EmotionLabel) -> Self {
        match emotion.as_str() {
            "happy" => MusicProfile {
                valence: 0.9,
                energy: 0.8,
                danceability: 0.8,
                tempo: 120.0,
            },
            "sad" => MusicProfile {
                valence: 0.2,
                energy: 0.3,
                danceability: 0.4,
                tempo: 70.0,
            },
            "angry" => MusicProfile {
                valence: 0.3,
                energy: 0.9,
                danceability: 0.6,
                tempo: 140.0,
            },
            "surprise" => MusicProfile {
                valence: 0.7,
                energy: 0.7,
                danceability: 0.7,
                tempo: 130.0,
            },
            _ => Self::NEUTRAL,
        }
    }
}

/// Free-text catalog query for an emotion
pub fn search_query(emotion: &EmotionLabel) -> &'static str {
    match emotion.as_str() {
        "happy" => "happy upbeat pop",
        "sad" => "sad acoustic emotional",
        "angry" => "angry rock metal",
        "neutral" => "chill indie",
        "surprise" => "energetic dance",
        _ => DEFAULT_QUERY,
    }
}

/// Everything a catalog track search needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub emotion: EmotionLabel,
    pub query: String,
    pub limit: u32,
    pub market: String,
    pub profile: MusicProfile,
}

impl Recommendation {
    pub fn for_emotion(emotion: &EmotionLabel, config: &RecommendConfig) -> Self {
        Self {
            emotion: emotion.clone(),
            query: search_query(emotion).to_string(),
            limit: config.limit,
            market: config.market.clone(),
            profile: MusicProfile::for_emotion(emotion),
        }
    }
}
