//! Per-frame multi-source signal composition.
//!
//! Once per rendered frame the compositor rebuilds the target map from
//! zero and merges every contribution source in a fixed order: lip sync,
//! then emotion, then (only while not speaking) idle micro-expressions
//! and the tracking mirror. Merging is always per-channel `max()`, never
//! addition: unrelated sources may legitimately target the same channel
//! (emotion "happy" and the idle micro-smile both drive the smile), and
//! summing would overshoot and need extra clamping, while max preserves
//! the dominant intent and stays naturally bounded. Combined with the
//! fixed order, a later source can only raise a channel within a frame,
//! never lower it.

use crate::emotion::EmotionState;
use crate::idle::IdleMotion;
use crate::lipsync::LipSyncController;
use crate::rig::{RigBinding, TargetMap};
use crate::tracking::TrackingMirror;

/// Owns the per-frame target accumulator. The accumulator is transient:
/// rebuilt from zero every frame and never persisted.
pub struct SignalCompositor {
    targets: TargetMap,
}

impl SignalCompositor {
    pub fn new() -> Self {
        Self {
            targets: TargetMap::new(),
        }
    }

    /// Merge all sources for this frame and return the finished target
    /// map, ready for the actuator.
    pub fn compose(
        &mut self,
        binding: &RigBinding,
        lipsync: &LipSyncController,
        emotion: &EmotionState,
        idle: &IdleMotion,
        tracking: &TrackingMirror,
    ) -> &TargetMap {
        self.targets.reset();

        for (viseme, weight) in lipsync.sample() {
            binding.accumulate_viseme(viseme, weight, &mut self.targets);
        }

        emotion.accumulate(&mut self.targets);

        // Ambient sources would fight the mouth for the same muscles;
        // they are suppressed entirely while speaking, not blended down.
        if !lipsync.is_speaking() {
            idle.accumulate(&mut self.targets);
            tracking.accumulate(&mut self.targets);
        }

        &self.targets
    }
}

impl Default for SignalCompositor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::config::FaceConfig;
    use crate::emotion::Emotion;
    use crate::idle::IdleMotion;
    use crate::rig::{JAW_OPEN, MOUTH_SMILE_L, RigBinding};
    use crate::test_utils::MockRig;
    use crate::tracking::{TrackingFrame, TrackingMirror};
    use crate::viseme::{Viseme, VisemeEvent, VisemeSequence};

    const FRAME: f32 = 1.0 / 60.0;

    struct Fixture {
        binding: RigBinding,
        lipsync: LipSyncController,
        emotion: EmotionState,
        idle: IdleMotion,
        tracking: TrackingMirror,
        compositor: SignalCompositor,
    }

    fn fixture() -> Fixture {
        let config = FaceConfig::default();
        let rig = MockRig::action_unit();
        Fixture {
            binding: RigBinding::detect(&rig).unwrap(),
            lipsync: LipSyncController::new(
                config.lipsync,
                config.timeline.clone(),
                config.word.clone(),
            ),
            emotion: EmotionState::new(config.emotion),
            idle: IdleMotion::new(crate::config::IdleConfig {
                seed: Some(1),
                ..config.idle
            }),
            tracking: TrackingMirror::new(config.tracking),
            compositor: SignalCompositor::new(),
        }
    }

    /// One event holding `viseme` long enough that mid-event sampling
    /// sits at the envelope peak.
    fn held(viseme: Viseme, intensity: f32) -> VisemeSequence {
        VisemeSequence {
            events: vec![VisemeEvent {
                viseme,
                time: 0.0,
                duration: 2.0,
                intensity,
            }],
            total_duration: 2.0,
        }
    }

    #[test]
    fn max_combine_never_sums() {
        let mut fx = fixture();
        // Surprised targets jawOpen at 0.25; a held AA drives jawOpen at
        // 0.8 × envelope. At the envelope peak both are present.
        fx.emotion.set(Emotion::Surprised);
        for _ in 0..600 {
            fx.emotion.update(FRAME);
        }
        fx.lipsync.start("ah", Some(held(Viseme::AA, 1.0)));
        let mut t = 0.0;
        while t < 1.0 {
            fx.lipsync.tick(FRAME);
            t += FRAME;
        }

        let targets = fx.compositor.compose(
            &fx.binding,
            &fx.lipsync,
            &fx.emotion,
            &fx.idle,
            &fx.tracking,
        );
        // Envelope peak: AA expands to jawOpen 0.8. Emotion also wants
        // 0.25 there. The result is the max, never 1.05.
        let jaw = targets.get(JAW_OPEN);
        assert!((jaw - 0.8).abs() < 0.02, "expected max 0.8, got {jaw}");
    }

    #[test]
    fn lower_emotion_cannot_pull_lipsync_down() {
        let mut fx = fixture();
        fx.emotion.set(Emotion::Happy);
        for _ in 0..600 {
            fx.emotion.update(FRAME);
        }
        // I expands to mouthSmile at 0.4 × weight; happy wants 0.55.
        fx.lipsync.start("ee", Some(held(Viseme::I, 1.0)));
        let mut t = 0.0;
        while t < 1.0 {
            fx.lipsync.tick(FRAME);
            t += FRAME;
        }
        let targets = fx.compositor.compose(
            &fx.binding,
            &fx.lipsync,
            &fx.emotion,
            &fx.idle,
            &fx.tracking,
        );
        let smile = targets.get(MOUTH_SMILE_L);
        assert!((smile - 0.55).abs() < 0.02, "expected max 0.55, got {smile}");
    }

    #[test]
    fn ambient_sources_are_suppressed_while_speaking() {
        let mut fx = fixture();
        fx.tracking.submit(TrackingFrame {
            brow_raise: Some(0.9),
            ..TrackingFrame::default()
        });
        fx.lipsync.start("hello", Some(held(Viseme::AA, 1.0)));
        fx.lipsync.tick(FRAME);

        let targets = fx.compositor.compose(
            &fx.binding,
            &fx.lipsync,
            &fx.emotion,
            &fx.idle,
            &fx.tracking,
        );
        assert_eq!(targets.get(crate::rig::BROW_INNER_UP), 0.0);
    }

    #[test]
    fn ambient_sources_return_when_speech_ends() {
        let mut fx = fixture();
        fx.tracking.submit(TrackingFrame {
            brow_raise: Some(0.9),
            ..TrackingFrame::default()
        });
        // Not speaking: tracking mirrors through.
        let targets = fx.compositor.compose(
            &fx.binding,
            &fx.lipsync,
            &fx.emotion,
            &fx.idle,
            &fx.tracking,
        );
        assert_eq!(targets.get(crate::rig::BROW_INNER_UP), 0.9);
    }

    #[test]
    fn accumulator_is_rebuilt_from_zero_each_frame() {
        let mut fx = fixture();
        fx.tracking.submit(TrackingFrame {
            mouth_open: Some(0.7),
            ..TrackingFrame::default()
        });
        let first = fx
            .compositor
            .compose(
                &fx.binding,
                &fx.lipsync,
                &fx.emotion,
                &fx.idle,
                &fx.tracking,
            )
            .get(JAW_OPEN);
        assert_eq!(first, 0.7);

        // Source disappears; the next frame must not inherit the value.
        fx.tracking.clear();
        let second = fx
            .compositor
            .compose(
                &fx.binding,
                &fx.lipsync,
                &fx.emotion,
                &fx.idle,
                &fx.tracking,
            )
            .get(JAW_OPEN);
        assert_eq!(second, 0.0);
    }
}
