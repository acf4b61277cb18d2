//! Emotion vocabulary shared by the face and voice modalities
//!
//! Both detectors draw from the same semantic vocabulary, but their exact label
//! sets differ. Labels outside the known vocabulary are carried verbatim in
//! [`EmotionLabel::Other`] and are never interpreted.

mod observation;

pub use observation::{FusedResult, FusionSource, Observation};

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Emotion label emitted by a modality detector
///
/// Serialized as the plain lowercase label string. Equality and hashing go
/// through [`EmotionLabel::as_str`], so `Other("sad".into())` equals `Sad`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EmotionLabel {
    Happy,
    Excited,
    Calm,
    #[default]
    Neutral,
    Sad,
    Angry,
    Fearful,
    Surprise,
    Disgust,
    /// Label outside the shared vocabulary
    Other(String),
}

impl EmotionLabel {
    /// Every label of the shared vocabulary, in declaration order
    pub const KNOWN: [EmotionLabel; 9] = [
        EmotionLabel::Happy,
        EmotionLabel::Excited,
        EmotionLabel::Calm,
        EmotionLabel::Neutral,
        EmotionLabel::Sad,
        EmotionLabel::Angry,
        EmotionLabel::Fearful,
        EmotionLabel::Surprise,
        EmotionLabel::Disgust,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            EmotionLabel::Happy => "happy",
            EmotionLabel::Excited => "excited",
            EmotionLabel::Calm => "calm",
            EmotionLabel::Neutral => "neutral",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Angry => "angry",
            EmotionLabel::Fearful => "fearful",
            EmotionLabel::Surprise => "surprise",
            EmotionLabel::Disgust => "disgust",
            EmotionLabel::Other(label) => label,
        }
    }

    /// Whether the label belongs to the shared vocabulary
    pub fn is_known(&self) -> bool {
        Self::KNOWN.iter().any(|known| known.as_str() == self.as_str())
    }
}

impl From<&str> for EmotionLabel {
    fn from(label: &str) -> Self {
        match label {
            "happy" => EmotionLabel::Happy,
            "excited" => EmotionLabel::Excited,
            "calm" => EmotionLabel::Calm,
            "neutral" => EmotionLabel::Neutral,
            "sad" => EmotionLabel::Sad,
            "angry" => EmotionLabel::Angry,
            "fearful" => EmotionLabel::Fearful,
            "surprise" => EmotionLabel::Surprise,
            "disgust" => EmotionLabel::Disgust,
            other => EmotionLabel::Other(other.to_string()),
        }
    }
}

impl From<String> for EmotionLabel {
    fn from(label: String) -> Self {
        match EmotionLabel::from(label.as_str()) {
            EmotionLabel::Other(_) => EmotionLabel::Other(label),
            known => known,
        }
    }
}

impl From<EmotionLabel> for String {
    fn from(label: EmotionLabel) -> Self {
        match label {
            EmotionLabel::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for EmotionLabel {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(EmotionLabel::from(s))
    }
}

impl PartialEq for EmotionLabel {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for EmotionLabel {}

impl Hash for EmotionLabel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
