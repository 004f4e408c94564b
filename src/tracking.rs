//! Facial-tracking mirror.
//!
//! An optional collaborator (e.g. a webcam landmark tracker) can submit
//! per-frame estimates of the user's face, which the avatar mirrors while
//! it is not speaking. Every field is optional: a tracker that cannot see
//! the mouth reports it absent, and absence drops the corresponding
//! channels from the contribution — it never defaults to an extreme
//! value. Out-of-range or non-finite values are clamped at ingestion and
//! never reach the blend state.

use crate::config::TrackingConfig;
use crate::rig::{
    BROW_INNER_UP, EYE_BLINK_L, EYE_BLINK_R, EYE_LOOK_DOWN, EYE_LOOK_LEFT, EYE_LOOK_RIGHT,
    EYE_LOOK_UP, JAW_OPEN, MOUTH_SMILE_L, MOUTH_SMILE_R, TargetMap,
};

/// One frame of tracking estimates. `None` is the explicit "absent"
/// sentinel for a quantity the tracker could not measure.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrackingFrame {
    /// Eyelid closure in [0, 1].
    pub blink: Option<f32>,
    /// Horizontal gaze in [-1, 1], positive to the avatar's right.
    pub gaze_horizontal: Option<f32>,
    /// Vertical gaze in [-1, 1], positive up.
    pub gaze_vertical: Option<f32>,
    /// Mouth-open amount in [0, 1].
    pub mouth_open: Option<f32>,
    /// Smile amount in [0, 1].
    pub smile: Option<f32>,
    /// Brow-raise amount in [0, 1].
    pub brow_raise: Option<f32>,
}

impl TrackingFrame {
    /// Clamp every present value to its valid range; non-finite values
    /// become absent.
    fn sanitized(self) -> Self {
        fn unit(value: Option<f32>) -> Option<f32> {
            value.filter(|v| v.is_finite()).map(|v| v.clamp(0.0, 1.0))
        }
        fn signed(value: Option<f32>) -> Option<f32> {
            value.filter(|v| v.is_finite()).map(|v| v.clamp(-1.0, 1.0))
        }
        Self {
            blink: unit(self.blink),
            gaze_horizontal: signed(self.gaze_horizontal),
            gaze_vertical: signed(self.gaze_vertical),
            mouth_open: unit(self.mouth_open),
            smile: unit(self.smile),
            brow_raise: unit(self.brow_raise),
        }
    }
}

/// Holds the latest tracking frame and ages it out.
pub struct TrackingMirror {
    config: TrackingConfig,
    latest: Option<TrackingFrame>,
    /// Seconds since the latest frame arrived.
    age: f32,
}

impl TrackingMirror {
    pub fn new(config: TrackingConfig) -> Self {
        Self {
            config,
            latest: None,
            age: 0.0,
        }
    }

    /// Submit a new tracking frame, replacing the previous one.
    pub fn submit(&mut self, frame: TrackingFrame) {
        self.latest = Some(frame.sanitized());
        self.age = 0.0;
    }

    /// Drop any held frame (tracker disabled or lost the face).
    pub fn clear(&mut self) {
        self.latest = None;
    }

    /// Advance the staleness clock by one frame.
    pub fn update(&mut self, dt: f32) {
        if dt > 0.0 {
            self.age += dt;
        }
    }

    /// Whether a usable (fresh) frame is held.
    pub fn is_active(&self) -> bool {
        self.latest.is_some() && self.age <= self.config.staleness
    }

    /// Max-combine the mirrored contribution into the frame's target map.
    /// Absent fields and stale frames contribute nothing. The compositor
    /// only calls this while not speaking.
    pub fn accumulate(&self, targets: &mut TargetMap) {
        if !self.is_active() {
            return;
        }
        let Some(frame) = self.latest else {
            return;
        };

        if let Some(blink) = frame.blink {
            targets.raise(EYE_BLINK_L, blink);
            targets.raise(EYE_BLINK_R, blink);
        }
        if let Some(horizontal) = frame.gaze_horizontal {
            if horizontal >= 0.0 {
                targets.raise(EYE_LOOK_RIGHT, horizontal);
            } else {
                targets.raise(EYE_LOOK_LEFT, -horizontal);
            }
        }
        if let Some(vertical) = frame.gaze_vertical {
            if vertical >= 0.0 {
                targets.raise(EYE_LOOK_UP, vertical);
            } else {
                targets.raise(EYE_LOOK_DOWN, -vertical);
            }
        }
        if let Some(mouth_open) = frame.mouth_open {
            targets.raise(JAW_OPEN, mouth_open);
        }
        if let Some(smile) = frame.smile {
            targets.raise(MOUTH_SMILE_L, smile);
            targets.raise(MOUTH_SMILE_R, smile);
        }
        if let Some(brow_raise) = frame.brow_raise {
            targets.raise(BROW_INNER_UP, brow_raise);
        }
    }
}
