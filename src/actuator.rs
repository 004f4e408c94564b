//! Blend-shape actuation with direction-dependent smoothing.
//!
//! The compositor's target map says where every channel should be; this
//! actuator says how fast it gets there. Each channel approaches its
//! target exponentially with an "attack" rate when rising and a slower
//! "release" rate when falling — muscle contraction reads faster than
//! relaxation. Mouth channels use faster constants than ambient
//! expression channels. After the update every channel is clamped to
//! [0, 1] and the sparse result is written to the rig; channel names the
//! rig does not expose are a silent no-op there.

use crate::config::ActuatorConfig;
use crate::rig::{RigSurface, TargetMap, is_mouth_channel};
use std::collections::HashMap;

/// Values below this with a zero target are snapped to zero and stop
/// being written.
const SETTLE_EPSILON: f32 = 1e-4;

/// Per-channel smoothing state between the compositor and the rig.
pub struct BlendShapeActuator {
    config: ActuatorConfig,
    /// Current smoothed value per channel.
    current: HashMap<&'static str, f32>,
}

impl BlendShapeActuator {
    pub fn new(config: ActuatorConfig) -> Self {
        Self {
            config,
            current: HashMap::new(),
        }
    }

    /// The current smoothed value of a channel.
    pub fn value(&self, channel: &str) -> f32 {
        self.current.get(channel).copied().unwrap_or(0.0)
    }

    /// Smooth every channel toward its target and write the results to
    /// the rig. Channels with a zero target decay through the release
    /// path rather than snapping off, which is what makes `stop()` safe
    /// at any time.
    pub fn apply(&mut self, targets: &TargetMap, dt: f32, rig: &mut dyn RigSurface) {
        if !(dt > 0.0) {
            return;
        }

        for (channel, target) in targets.iter() {
            let value = self.current.entry(channel).or_insert(0.0);
            let before = *value;

            let (attack, release) = if is_mouth_channel(channel) {
                (self.config.mouth_attack, self.config.mouth_release)
            } else {
                (self.config.ambient_attack, self.config.ambient_release)
            };
            let rate = if target > *value { attack } else { release };

            *value += (target - *value) * (rate * dt).min(1.0);
            *value = value.clamp(0.0, 1.0);
            if target <= 0.0 && *value < SETTLE_EPSILON {
                *value = 0.0;
            }

            // Sparse write: only channels that are moving or held open.
            if *value > 0.0 || before > 0.0 {
                rig.set_weight(channel, *value);
            }
        }
    }
}
