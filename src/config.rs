//! Configuration types for the facial-animation engine.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration for one avatar session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceConfig {
    /// Text-to-viseme timeline generation settings.
    pub timeline: TimelineConfig,
    /// Per-word viseme expansion settings (realtime mode).
    pub word: WordConfig,
    /// Lip-sync mode arbitration settings.
    pub lipsync: LipSyncConfig,
    /// Emotion blending settings.
    pub emotion: EmotionConfig,
    /// Idle micro-expression settings (blink, gaze drift, micro-smile).
    pub idle: IdleConfig,
    /// Facial-tracking mirror settings.
    pub tracking: TrackingConfig,
    /// Blend-shape smoothing settings.
    pub actuator: ActuatorConfig,
}

/// Text-to-viseme timeline generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Base duration per character unit in seconds, before the vowel,
    /// consonant, and stress multipliers are applied.
    pub base_duration: f32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            base_duration: 0.09,
        }
    }
}

/// Per-word viseme expansion configuration.
///
/// Independently tunable from [`TimelineConfig`]: realtime word-boundary
/// signals carry no duration information, so the expander cadence is its
/// own knob.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WordConfig {
    /// Base duration per character unit in seconds.
    pub base_duration: f32,
}

impl Default for WordConfig {
    fn default() -> Self {
        Self {
            base_duration: 0.08,
        }
    }
}

/// Lip-sync mode arbitration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LipSyncConfig {
    /// Grace period in seconds after playback start. If no word-boundary
    /// signal arrives within this window, realtime mode gives up and the
    /// controller falls back to a locally synthesized timeline.
    ///
    /// Word-boundary support varies by platform and voice; 0.4–0.5 s is
    /// enough to tell "slow to start" from "never coming".
    pub grace_period: f32,
    /// Extra seconds past `total_duration` before a timeline releases to
    /// idle. Prevents the mouth holding a stale final shape while still
    /// letting the last event finish its envelope.
    pub release_padding: f32,
}

impl Default for LipSyncConfig {
    fn default() -> Self {
        Self {
            grace_period: 0.45,
            release_padding: 0.15,
        }
    }
}

/// Emotion blending configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionConfig {
    /// Interpolation rate toward the emotion target, per second.
    pub blend_rate: f32,
    /// Seconds after an utterance ends before the emotion auto-resets
    /// to neutral.
    pub reset_delay: f32,
}

impl Default for EmotionConfig {
    fn default() -> Self {
        Self {
            blend_rate: 5.0,
            reset_delay: 3.0,
        }
    }
}

/// Idle micro-expression configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    /// Minimum seconds between blinks.
    pub blink_interval_min: f32,
    /// Maximum seconds between blinks.
    pub blink_interval_max: f32,
    /// Duration of one blink (close + open) in seconds.
    pub blink_duration: f32,
    /// Minimum seconds between gaze re-targets.
    pub gaze_interval_min: f32,
    /// Maximum seconds between gaze re-targets.
    pub gaze_interval_max: f32,
    /// Maximum gaze deflection from centre, in [0, 1].
    pub gaze_range: f32,
    /// Gaze drift rate toward the current target, per second.
    pub gaze_rate: f32,
    /// Peak weight of the idle micro-smile.
    pub micro_smile: f32,
    /// RNG seed (None = entropy). Fixed seeds make idle motion
    /// deterministic for tests.
    pub seed: Option<u64>,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            blink_interval_min: 2.0,
            blink_interval_max: 6.0,
            blink_duration: 0.15,
            gaze_interval_min: 1.0,
            gaze_interval_max: 4.0,
            gaze_range: 0.35,
            gaze_rate: 3.0,
            micro_smile: 0.08,
            seed: None,
        }
    }
}

/// Facial-tracking mirror configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Seconds after which the latest tracking frame counts as absent.
    pub staleness: f32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self { staleness: 0.5 }
    }
}

/// Blend-shape smoothing configuration.
///
/// Attack (weight rising) is faster than release (weight falling): muscle
/// contraction reads faster than relaxation. Mouth channels move faster
/// than ambient expression channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    /// Attack rate for mouth/viseme channels, per second.
    pub mouth_attack: f32,
    /// Release rate for mouth/viseme channels, per second.
    pub mouth_release: f32,
    /// Attack rate for ambient expression channels, per second.
    pub ambient_attack: f32,
    /// Release rate for ambient expression channels, per second.
    pub ambient_release: f32,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            mouth_attack: 45.0,
            mouth_release: 18.0,
            ambient_attack: 12.0,
            ambient_release: 5.0,
        }
    }
}

impl FaceConfig {
    /// Load configuration from a TOML file, falling back to defaults for
    /// missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::FaceError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot
    /// be serialized.
    pub fn save_to_file(&self, path: &Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::FaceError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
