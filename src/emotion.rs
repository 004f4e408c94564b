//! Emotion expression state.
//!
//! Each named emotion is bound to a fixed record of expression-channel
//! targets. The current state is a continuous blend toward the latest
//! request: switching emotions cross-fades rather than snapping, and
//! channels that the new emotion no longer uses decay to zero at the same
//! rate, so there is never a visible pop. Emotion persists across
//! utterances and auto-resets to neutral a fixed delay after speech ends.

use crate::config::EmotionConfig;
use crate::rig::{
    BROW_DOWN_L, BROW_DOWN_R, BROW_INNER_UP, CHEEK_SQUINT_L, CHEEK_SQUINT_R, EYE_LOOK_DOWN,
    EYE_WIDE_L, EYE_WIDE_R, JAW_OPEN, MOUTH_FROWN_L, MOUTH_FROWN_R, MOUTH_PRESS_L, MOUTH_PRESS_R,
    MOUTH_SMILE_L, MOUTH_SMILE_R, NOSE_SNEER_L, NOSE_SNEER_R, TargetMap,
};
use std::collections::HashMap;

/// Channel weights below this are dropped from the blend state.
const SETTLE_EPSILON: f32 = 1e-3;

/// The discrete emotions an avatar can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Emotion {
    Happy,
    Sad,
    Surprised,
    Angry,
    #[default]
    Neutral,
}

impl Emotion {
    /// Parse an emotion name. Unknown names map to `Neutral` — a bad
    /// label from upstream should relax the face, not error.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "happy" => Emotion::Happy,
            "sad" => Emotion::Sad,
            "surprised" => Emotion::Surprised,
            "angry" => Emotion::Angry,
            _ => Emotion::Neutral,
        }
    }

    /// The fixed expression-channel target record for this emotion.
    fn targets(self) -> &'static [(&'static str, f32)] {
        match self {
            Emotion::Happy => &[
                (MOUTH_SMILE_L, 0.55),
                (MOUTH_SMILE_R, 0.55),
                (CHEEK_SQUINT_L, 0.25),
                (CHEEK_SQUINT_R, 0.25),
                (BROW_INNER_UP, 0.1),
            ],
            Emotion::Sad => &[
                (MOUTH_FROWN_L, 0.5),
                (MOUTH_FROWN_R, 0.5),
                (BROW_INNER_UP, 0.45),
                (EYE_LOOK_DOWN, 0.2),
            ],
            Emotion::Surprised => &[
                (BROW_INNER_UP, 0.7),
                (EYE_WIDE_L, 0.6),
                (EYE_WIDE_R, 0.6),
                (JAW_OPEN, 0.25),
            ],
            Emotion::Angry => &[
                (BROW_DOWN_L, 0.6),
                (BROW_DOWN_R, 0.6),
                (NOSE_SNEER_L, 0.3),
                (NOSE_SNEER_R, 0.3),
                (MOUTH_PRESS_L, 0.35),
                (MOUTH_PRESS_R, 0.35),
            ],
            Emotion::Neutral => &[],
        }
    }
}

/// Continuously interpolated emotion contribution.
pub struct EmotionState {
    config: EmotionConfig,
    /// Current per-channel blend values.
    current: HashMap<&'static str, f32>,
    /// The emotion whose record is the active target.
    target: Emotion,
    /// Countdown to the automatic neutral reset, armed when speech ends.
    reset_countdown: Option<f32>,
}

impl EmotionState {
    pub fn new(config: EmotionConfig) -> Self {
        Self {
            config,
            current: HashMap::new(),
            target: Emotion::Neutral,
            reset_countdown: None,
        }
    }

    /// The emotion currently being blended toward.
    pub fn target(&self) -> Emotion {
        self.target
    }

    /// Request an emotion. Replaces the current target and cancels any
    /// pending auto-reset.
    pub fn set(&mut self, emotion: Emotion) {
        self.target = emotion;
        self.reset_countdown = None;
    }

    /// Request an emotion by name; unknown names relax to neutral.
    pub fn set_by_name(&mut self, name: &str) {
        self.set(Emotion::from_name(name));
    }

    /// An utterance started: a pending neutral reset no longer applies.
    pub fn speech_started(&mut self) {
        self.reset_countdown = None;
    }

    /// An utterance ended: arm the delayed reset to neutral.
    pub fn speech_ended(&mut self) {
        self.reset_countdown = Some(self.config.reset_delay);
    }

    /// Advance the blend by one frame.
    pub fn update(&mut self, dt: f32) {
        if !(dt > 0.0) {
            return;
        }

        if let Some(remaining) = self.reset_countdown.as_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 {
                self.reset_countdown = None;
                self.target = Emotion::Neutral;
            }
        }

        let record = self.target.targets();
        let step = (self.config.blend_rate * dt).min(1.0);

        // Blend toward the active record.
        for &(channel, weight) in record {
            let value = self.current.entry(channel).or_insert(0.0);
            *value += (weight - *value) * step;
        }

        // Channels from a previous record decay at the same rate rather
        // than snapping off.
        self.current.retain(|channel, value| {
            if record.iter().any(|(c, _)| c == channel) {
                return true;
            }
            *value += (0.0 - *value) * step;
            *value > SETTLE_EPSILON
        });
    }

    /// Max-combine the current emotion contribution into the frame's
    /// target map.
    pub fn accumulate(&self, targets: &mut TargetMap) {
        for (&channel, &weight) in &self.current {
            targets.raise(channel, weight);
        }
    }
}
