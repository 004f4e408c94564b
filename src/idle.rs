//! Idle micro-expression generator.
//!
//! A perfectly still face reads as dead. While the avatar is not speaking,
//! this generator produces small ambient motion: randomized blinks, slow
//! gaze drift, and a faint micro-smile oscillation. The compositor
//! suppresses all of it during speech so ambient motion never fights the
//! lip-sync and emotion signals for the same muscles.

use crate::config::IdleConfig;
use crate::rig::{
    EYE_BLINK_L, EYE_BLINK_R, EYE_LOOK_DOWN, EYE_LOOK_LEFT, EYE_LOOK_RIGHT, EYE_LOOK_UP,
    MOUTH_SMILE_L, MOUTH_SMILE_R, TargetMap,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;

/// Period of the micro-smile oscillation in seconds.
const SMILE_PERIOD: f32 = 11.0;

/// Sample a half-open range, tolerating degenerate configs where
/// `min >= max` (a fixed interval, or a disabled axis).
fn sample_range(rng: &mut StdRng, min: f32, max: f32) -> f32 {
    if max > min { rng.gen_range(min..max) } else { min }
}

/// Ambient micro-motion generator with a seedable RNG for deterministic
/// tests.
pub struct IdleMotion {
    config: IdleConfig,
    rng: StdRng,
    /// Seconds until the next blink starts.
    next_blink: f32,
    /// Elapsed seconds within the active blink, if one is running.
    blink_elapsed: Option<f32>,
    /// Seconds until the next gaze re-target.
    next_gaze: f32,
    /// Gaze target, horizontal/vertical in [-range, range].
    gaze_target: (f32, f32),
    /// Smoothed gaze position drifting toward the target.
    gaze: (f32, f32),
    /// Phase of the micro-smile oscillation.
    smile_phase: f32,
}

impl IdleMotion {
    pub fn new(config: IdleConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let next_blink = sample_range(&mut rng, config.blink_interval_min, config.blink_interval_max);
        let next_gaze = sample_range(&mut rng, config.gaze_interval_min, config.gaze_interval_max);
        Self {
            config,
            rng,
            next_blink,
            blink_elapsed: None,
            next_gaze,
            gaze_target: (0.0, 0.0),
            gaze: (0.0, 0.0),
            smile_phase: 0.0,
        }
    }

    /// Advance the generator by one frame. Runs even while speaking so
    /// blink scheduling stays natural; only the contribution is
    /// suppressed.
    pub fn update(&mut self, dt: f32) {
        if !(dt > 0.0) {
            return;
        }

        // Blink scheduling.
        match self.blink_elapsed.as_mut() {
            Some(elapsed) => {
                *elapsed += dt;
                if *elapsed >= self.config.blink_duration {
                    self.blink_elapsed = None;
                    self.next_blink = sample_range(
                        &mut self.rng,
                        self.config.blink_interval_min,
                        self.config.blink_interval_max,
                    );
                }
            }
            None => {
                self.next_blink -= dt;
                if self.next_blink <= 0.0 {
                    self.blink_elapsed = Some(0.0);
                }
            }
        }

        // Gaze drift: bounded random walk, re-targeted at random
        // intervals, approached smoothly.
        self.next_gaze -= dt;
        if self.next_gaze <= 0.0 {
            let range = self.config.gaze_range;
            self.gaze_target = (
                sample_range(&mut self.rng, -range, range),
                sample_range(&mut self.rng, -range, range),
            );
            self.next_gaze = sample_range(
                &mut self.rng,
                self.config.gaze_interval_min,
                self.config.gaze_interval_max,
            );
        }
        let step = (self.config.gaze_rate * dt).min(1.0);
        self.gaze.0 += (self.gaze_target.0 - self.gaze.0) * step;
        self.gaze.1 += (self.gaze_target.1 - self.gaze.1) * step;

        self.smile_phase = (self.smile_phase + dt) % SMILE_PERIOD;
    }

    /// Max-combine the idle contribution into the frame's target map.
    /// The compositor only calls this while not speaking.
    pub fn accumulate(&self, targets: &mut TargetMap) {
        if let Some(elapsed) = self.blink_elapsed {
            let progress = (elapsed / self.config.blink_duration).clamp(0.0, 1.0);
            let closure = (progress * PI).sin();
            targets.raise(EYE_BLINK_L, closure);
            targets.raise(EYE_BLINK_R, closure);
        }

        let (horizontal, vertical) = self.gaze;
        if horizontal >= 0.0 {
            targets.raise(EYE_LOOK_RIGHT, horizontal);
        } else {
            targets.raise(EYE_LOOK_LEFT, -horizontal);
        }
        if vertical >= 0.0 {
            targets.raise(EYE_LOOK_UP, vertical);
        } else {
            targets.raise(EYE_LOOK_DOWN, -vertical);
        }

        let smile = self.config.micro_smile
            * (0.5 + 0.5 * (self.smile_phase / SMILE_PERIOD * 2.0 * PI).sin());
        targets.raise(MOUTH_SMILE_L, smile);
        targets.raise(MOUTH_SMILE_R, smile);
    }
}
