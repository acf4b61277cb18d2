//! Configuration loading, resolution and persistence
//!
//! Every tunable of the decision core lives here: fusion weights, the tie-break
//! priority order, stabilizer thresholds, the minimum clip duration and the
//! recommendation query parameters. Each field has a compiled default, so a
//! missing or partial TOML file still yields a complete configuration.
//!
//! # Resolution priority
//!
//! 1. Command-line argument (highest priority)
//! 2. `MOODIFY_CONFIG` environment variable
//! 3. User config file (`~/.config/moodify/config.toml`)
//! 4. System config file (`/etc/moodify/config.toml`, Linux only)
//! 5. Compiled defaults (fallback)

use crate::emotion::EmotionLabel;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "MOODIFY_CONFIG";

/// Root of the TOML configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub logging: LoggingConfig,
    pub fusion: FusionConfig,
    pub stabilizer: StabilizerConfig,
    pub voice: VoiceConfig,
    pub recommend: RecommendConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Face/voice fusion parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Multiplier applied to the face confidence
    pub face_weight: f64,
    /// Multiplier applied to the voice confidence
    pub voice_weight: f64,
    /// Added to the summed scores when both modalities agree (result capped at 1.0)
    pub agreement_bonus: f64,
    /// Confidence reported when a tie cannot be broken by the priority order
    pub fallback_confidence: f64,
    /// Tie-break order, highest priority first
    pub priority_order: Vec<EmotionLabel>,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            face_weight: 0.6,
            voice_weight: 0.4,
            agreement_bonus: 0.1,
            fallback_confidence: 0.5,
            priority_order: vec![
                EmotionLabel::Happy,
                EmotionLabel::Excited,
                EmotionLabel::Calm,
                EmotionLabel::Neutral,
                EmotionLabel::Sad,
                EmotionLabel::Angry,
            ],
        }
    }
}

/// How the acoustic override rules combine when several conditions hold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleResolution {
    /// Rules are evaluated in order and every matching rule overrides the
    /// previous decision, so the last matching rule wins
    #[default]
    LastMatch,
    /// Evaluation stops at the first matching rule
    FirstMatch,
}

/// Thresholds for the acoustic override rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleThresholds {
    /// Sad: loudness mean strictly below
    pub sad_max_loudness: f64,
    /// Sad: pitch mean (Hz) strictly below
    pub sad_max_pitch_hz: f64,
    /// Happy: pitch mean (Hz) strictly above
    pub happy_min_pitch_hz: f64,
    /// Happy: spectral centroid mean (Hz) strictly above
    pub happy_min_centroid_hz: f64,
    /// Angry: pitch standard deviation (Hz) strictly above
    pub angry_min_pitch_std_hz: f64,
    /// Angry: loudness standard deviation strictly above
    pub angry_min_loudness_std: f64,
    /// Angry: loudness mean strictly above
    pub angry_min_loudness: f64,
    /// Fearful: pitch mean (Hz) strictly above
    pub fearful_min_pitch_hz: f64,
    /// Fearful: loudness mean strictly below
    pub fearful_max_loudness: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            sad_max_loudness: 0.03,
            sad_max_pitch_hz: 130.0,
            happy_min_pitch_hz: 180.0,
            happy_min_centroid_hz: 2500.0,
            angry_min_pitch_std_hz: 80.0,
            angry_min_loudness_std: 0.05,
            angry_min_loudness: 0.05,
            fearful_min_pitch_hz: 200.0,
            fearful_max_loudness: 0.04,
        }
    }
}

impl RuleThresholds {
    fn values(&self) -> [(&'static str, f64); 9] {
        [
            ("sad_max_loudness", self.sad_max_loudness),
            ("sad_max_pitch_hz", self.sad_max_pitch_hz),
            ("happy_min_pitch_hz", self.happy_min_pitch_hz),
            ("happy_min_centroid_hz", self.happy_min_centroid_hz),
            ("angry_min_pitch_std_hz", self.angry_min_pitch_std_hz),
            ("angry_min_loudness_std", self.angry_min_loudness_std),
            ("angry_min_loudness", self.angry_min_loudness),
            ("fearful_min_pitch_hz", self.fearful_min_pitch_hz),
            ("fearful_max_loudness", self.fearful_max_loudness),
        ]
    }
}

/// Voice stabilizer parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    /// Probability vectors with entropy (nats) above this decide `neutral`
    pub entropy_threshold: f64,
    /// Consecutive repeats of the same label before it is forced to `neutral`
    pub stickiness_threshold: u32,
    pub rule_resolution: RuleResolution,
    pub rules: RuleThresholds,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            entropy_threshold: 1.5,
            stickiness_threshold: 3,
            rule_resolution: RuleResolution::default(),
            rules: RuleThresholds::default(),
        }
    }
}

/// Voice path parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Clips shorter than this never reach the stabilizer
    pub min_duration_secs: f64,
    /// Class labels of the voice classifier, in output order
    pub labels: Vec<EmotionLabel>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: 2.5,
            labels: vec![
                EmotionLabel::Neutral,
                EmotionLabel::Calm,
                EmotionLabel::Happy,
                EmotionLabel::Sad,
                EmotionLabel::Angry,
                EmotionLabel::Fearful,
                EmotionLabel::Disgust,
                EmotionLabel::Surprise,
            ],
        }
    }
}

/// Music search parameters derived from a decided emotion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    /// Number of tracks to request
    pub limit: u32,
    /// Catalog market code
    pub market: String,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            limit: 10,
            market: "US".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TomlConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every numeric parameter against its valid range
    pub fn validate(&self) -> Result<()> {
        let fusion = &self.fusion;
        for (name, weight) in [
            ("fusion.face_weight", fusion.face_weight),
            ("fusion.voice_weight", fusion.voice_weight),
        ] {
            if !(0.0..=1.0).contains(&weight) {
                return Err(Error::Config(format!(
                    "{}: value {} out of range [0.0, 1.0]",
                    name, weight
                )));
            }
        }
        if !fusion.agreement_bonus.is_finite() || fusion.agreement_bonus < 0.0 {
            return Err(Error::Config(format!(
                "fusion.agreement_bonus: value {} must be finite and non-negative",
                fusion.agreement_bonus
            )));
        }
        if !(0.0..=1.0).contains(&fusion.fallback_confidence) {
            return Err(Error::Config(format!(
                "fusion.fallback_confidence: value {} out of range [0.0, 1.0]",
                fusion.fallback_confidence
            )));
        }

        let stabilizer = &self.stabilizer;
        if !stabilizer.entropy_threshold.is_finite() || stabilizer.entropy_threshold < 0.0 {
            return Err(Error::Config(format!(
                "stabilizer.entropy_threshold: value {} must be finite and non-negative",
                stabilizer.entropy_threshold
            )));
        }
        if stabilizer.stickiness_threshold < 1 {
            return Err(Error::Config(
                "stabilizer.stickiness_threshold: must be at least 1".to_string(),
            ));
        }
        for (name, value) in stabilizer.rules.values() {
            if !value.is_finite() {
                return Err(Error::Config(format!(
                    "stabilizer.rules.{}: value {} must be finite",
                    name, value
                )));
            }
        }

        if !self.voice.min_duration_secs.is_finite() || self.voice.min_duration_secs < 0.0 {
            return Err(Error::Config(format!(
                "voice.min_duration_secs: value {} must be finite and non-negative",
                self.voice.min_duration_secs
            )));
        }
        if self.voice.labels.is_empty() {
            return Err(Error::Config("voice.labels: at least one label required".to_string()));
        }

        if self.recommend.limit < 1 {
            return Err(Error::Config("recommend.limit: must be at least 1".to_string()));
        }

        Ok(())
    }
}

/// Locate the config file following the resolution priority order
///
/// Returns `None` when no candidate exists; the caller falls back to defaults.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: User config directory
    if let Some(path) = dirs::config_dir().map(|d| d.join("moodify").join("config.toml")) {
        if path.exists() {
            return Some(path);
        }
    }

    // Priority 4: System-wide config
    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/moodify/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Resolve and load the configuration, degrading to defaults when no file exists
///
/// A missing file is not fatal. A file that exists but cannot be read, parsed
/// or validated is.
pub fn load_config(cli_arg: Option<&Path>) -> Result<(TomlConfig, Option<PathBuf>)> {
    let Some(path) = resolve_config_path(cli_arg) else {
        info!("No config file found, using compiled defaults");
        return Ok((TomlConfig::default(), None));
    };

    if !path.exists() {
        warn!(
            "Config file {} does not exist, using compiled defaults",
            path.display()
        );
        return Ok((TomlConfig::default(), None));
    }

    let config = TomlConfig::load(&path)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    info!("Configuration loaded from {}", path.display());
    Ok((config, Some(path)))
}

/// Write configuration atomically (temp file + rename)
///
/// On Unix the file is created with permissions 0600.
pub fn write_toml_config(config: &TomlConfig, target: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;

    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut temp_name = target.as_os_str().to_os_string();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    std::fs::write(&temp_path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    if let Err(e) = std::fs::rename(&temp_path, target) {
        // Best-effort cleanup; the rename error is what matters
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(TomlConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_priority_order() {
        let fusion = FusionConfig::default();
        let order: Vec<&str> = fusion
            .priority_order
            .iter()
            .map(|label| label.as_str())
            .collect();
        assert_eq!(order, vec!["happy", "excited", "calm", "neutral", "sad", "angry"]);
    }

    #[test]
    fn test_rejects_negative_weight() {
        let mut config = TomlConfig::default();
        config.fusion.voice_weight = -0.1;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_weight_above_one() {
        let mut config = TomlConfig::default();
        config.fusion.face_weight = 2.0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.fusion.face_weight = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_negative_agreement_bonus() {
        let mut config = TomlConfig::default();
        config.fusion.agreement_bonus = -0.5;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.fusion.agreement_bonus = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_nan_threshold() {
        let mut config = TomlConfig::default();
        config.stabilizer.rules.happy_min_centroid_hz = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_stickiness() {
        let mut config = TomlConfig::default();
        config.stabilizer.stickiness_threshold = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            [fusion]
            face_weight = 0.7

            [stabilizer]
            rule_resolution = "first_match"
            "#,
        )
        .unwrap();

        assert_eq!(config.fusion.face_weight, 0.7);
        assert_eq!(config.fusion.voice_weight, 0.4);
        assert_eq!(config.stabilizer.rule_resolution, RuleResolution::FirstMatch);
        assert_eq!(config.stabilizer.stickiness_threshold, 3);
        assert_eq!(config.voice.min_duration_secs, 2.5);
    }
}
