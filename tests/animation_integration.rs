#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end tests for the facial-animation engine: full utterances
//! driven frame by frame through a mock rig, covering mode arbitration,
//! composition, and actuation together.

use selkie::config::FaceConfig;
use selkie::rig::{EXPRESSION_CHANNELS, MOUTH_AU_CHANNELS, VISEME_CHANNELS};
use selkie::viseme::timeline;
use selkie::{
    AvatarSession, Emotion, LipSyncMode, RigSurface, RigTaxonomy, TrackingFrame, Viseme,
};
use std::collections::HashMap;

const FRAME: f32 = 1.0 / 60.0;

/// A rig that records the weights applied to it.
struct RecordingRig {
    channels: HashMap<String, f32>,
    /// Highest weight ever applied to each channel.
    peaks: HashMap<String, f32>,
}

impl RecordingRig {
    fn with_channels(names: &[&str]) -> Self {
        Self {
            channels: names.iter().map(|n| ((*n).to_owned(), 0.0)).collect(),
            peaks: HashMap::new(),
        }
    }

    fn action_unit() -> Self {
        let names: Vec<&str> = MOUTH_AU_CHANNELS
            .into_iter()
            .chain(EXPRESSION_CHANNELS)
            .collect();
        Self::with_channels(&names)
    }

    fn viseme_direct() -> Self {
        let names: Vec<&str> = VISEME_CHANNELS
            .into_iter()
            .chain(EXPRESSION_CHANNELS)
            .collect();
        Self::with_channels(&names)
    }

    fn weight(&self, name: &str) -> f32 {
        self.channels.get(name).copied().unwrap_or(0.0)
    }

    fn peak(&self, name: &str) -> f32 {
        self.peaks.get(name).copied().unwrap_or(0.0)
    }

    fn max_weight(&self) -> f32 {
        self.channels.values().copied().fold(0.0, f32::max)
    }
}

impl RigSurface for RecordingRig {
    fn has_channel(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    fn set_weight(&mut self, name: &str, weight: f32) {
        if let Some(slot) = self.channels.get_mut(name) {
            *slot = weight;
            let peak = self.peaks.entry(name.to_owned()).or_insert(0.0);
            *peak = peak.max(weight);
        }
    }
}

fn quiet_config() -> FaceConfig {
    let mut config = FaceConfig::default();
    config.idle.seed = Some(11);
    config.idle.blink_interval_min = 1_000.0;
    config.idle.blink_interval_max = 1_001.0;
    config.idle.gaze_range = 0.0;
    config.idle.micro_smile = 0.0;
    config
}

fn run_for(avatar: &mut AvatarSession, rig: &mut RecordingRig, seconds: f32) {
    let mut t = 0.0;
    while t < seconds {
        avatar.tick(FRAME, rig);
        t += FRAME;
    }
}

#[test]
fn generated_timelines_are_contiguous_and_deterministic() {
    let config = FaceConfig::default();
    for text in [
        "Hello, world!",
        "The quick brown fox.",
        "One two three, four five six!",
    ] {
        let a = timeline::generate(text, &config.timeline);
        let b = timeline::generate(text, &config.timeline);
        assert_eq!(a, b, "generation must be deterministic for {text:?}");
        assert!(a.is_valid(), "invariants must hold for {text:?}");

        let sum: f32 = a.events.iter().map(|e| e.duration).sum();
        assert!((a.total_duration - sum).abs() < 1e-3);
    }
}

#[test]
fn full_utterance_through_an_action_unit_rig() {
    let mut rig = RecordingRig::action_unit();
    let mut avatar = AvatarSession::new(quiet_config(), &rig).unwrap();
    assert_eq!(avatar.taxonomy(), RigTaxonomy::ActionUnit);

    let text = "Hello, world!";
    let sequence = avatar.generate_timeline(text);
    let duration = sequence.total_duration;
    avatar.speak(text, Some(sequence));
    avatar.on_playback_started();
    assert_eq!(avatar.lipsync_mode(), LipSyncMode::Timeline);

    run_for(&mut avatar, &mut rig, duration + 0.2);
    assert!(
        rig.peak("jawOpen") > 0.2,
        "vowels should have opened the jaw (peak {})",
        rig.peak("jawOpen")
    );
    assert_eq!(avatar.lipsync_mode(), LipSyncMode::Idle);

    // The face settles back to rest through smoothing.
    run_for(&mut avatar, &mut rig, 2.0);
    assert_eq!(rig.max_weight(), 0.0);
}

#[test]
fn full_utterance_through_a_viseme_direct_rig() {
    let mut rig = RecordingRig::viseme_direct();
    let mut avatar = AvatarSession::new(quiet_config(), &rig).unwrap();
    assert_eq!(avatar.taxonomy(), RigTaxonomy::VisemeDirect);

    let text = "mama";
    let sequence = avatar.generate_timeline(text);
    let duration = sequence.total_duration;
    avatar.speak(text, Some(sequence));
    avatar.on_playback_started();
    run_for(&mut avatar, &mut rig, duration);

    // 'm' and 'a' map 1:1 onto their viseme channels.
    assert!(rig.peak("viseme_PP") > 0.2);
    assert!(rig.peak("viseme_aa") > 0.3);
    assert_eq!(rig.peak("viseme_U"), 0.0);
}

#[test]
fn realtime_mode_with_word_boundaries() {
    let mut rig = RecordingRig::action_unit();
    let mut avatar = AvatarSession::new(quiet_config(), &rig).unwrap();

    let text = "open wide";
    avatar.speak(text, None);
    avatar.on_playback_started();
    assert_eq!(avatar.lipsync_mode(), LipSyncMode::Realtime);

    avatar.on_word_boundary(0, 4); // "open"
    run_for(&mut avatar, &mut rig, 0.2);
    avatar.on_word_boundary(5, 4); // "wide"
    run_for(&mut avatar, &mut rig, 0.2);

    assert_eq!(avatar.lipsync_mode(), LipSyncMode::Realtime);
    assert!(rig.peak("jawOpen") > 0.1);

    avatar.on_playback_ended();
    run_for(&mut avatar, &mut rig, 2.0);
    assert_eq!(rig.max_weight(), 0.0);
}

#[test]
fn silent_playback_falls_back_and_still_animates() {
    let mut rig = RecordingRig::action_unit();
    let mut avatar = AvatarSession::new(quiet_config(), &rig).unwrap();

    avatar.speak("hello out there", None);
    avatar.on_playback_started();
    // No word boundaries ever arrive.
    run_for(&mut avatar, &mut rig, 1.0);
    assert_eq!(avatar.lipsync_mode(), LipSyncMode::Fallback);
    assert!(rig.peak("jawOpen") > 0.1, "fallback must still move the mouth");
}

#[test]
fn emotion_layers_under_speech_and_resets_after() {
    let mut rig = RecordingRig::action_unit();
    let mut avatar = AvatarSession::new(quiet_config(), &rig).unwrap();

    avatar.set_emotion(Emotion::Happy);
    run_for(&mut avatar, &mut rig, 1.0);
    let smile_resting = rig.weight("mouthSmileLeft");
    assert!(smile_resting > 0.5);

    // Speaking does not kill the emotion layer.
    let text = "Hi.";
    let sequence = avatar.generate_timeline(text);
    let duration = sequence.total_duration;
    avatar.speak(text, Some(sequence));
    avatar.on_playback_started();
    run_for(&mut avatar, &mut rig, duration / 2.0);
    assert!(rig.weight("mouthSmileLeft") > 0.3);

    // After the utterance and the reset delay, the face relaxes.
    let reset_delay = FaceConfig::default().emotion.reset_delay;
    run_for(&mut avatar, &mut rig, duration / 2.0 + reset_delay + 3.0);
    assert_eq!(rig.weight("mouthSmileLeft"), 0.0);
}

#[test]
fn tracking_mirror_pauses_during_speech() {
    let mut rig = RecordingRig::action_unit();
    let mut avatar = AvatarSession::new(quiet_config(), &rig).unwrap();

    avatar.submit_tracking(TrackingFrame {
        brow_raise: Some(0.8),
        ..TrackingFrame::default()
    });
    avatar.tick(FRAME, &mut rig);
    assert!(rig.weight("browInnerUp") > 0.0);

    // While speaking the mirror is suppressed and the brow decays.
    let text = "Talking and talking and talking for a while";
    let sequence = avatar.generate_timeline(text);
    avatar.speak(text, Some(sequence));
    avatar.on_playback_started();
    for _ in 0..60 {
        avatar.submit_tracking(TrackingFrame {
            brow_raise: Some(0.8),
            ..TrackingFrame::default()
        });
        avatar.tick(FRAME, &mut rig);
    }
    assert!(avatar.is_speaking());
    assert!(rig.weight("browInnerUp") < 0.05);
}

#[test]
fn partial_rig_missing_channels_is_harmless() {
    // Only a jaw — everything else the engine drives is absent.
    let mut rig = RecordingRig::with_channels(&["jawOpen"]);
    let mut avatar = AvatarSession::new(quiet_config(), &rig).unwrap();
    assert_eq!(avatar.taxonomy(), RigTaxonomy::ActionUnit);

    let text = "Hello, world!";
    let sequence = avatar.generate_timeline(text);
    let duration = sequence.total_duration;
    avatar.speak(text, Some(sequence));
    avatar.on_playback_started();
    avatar.set_emotion(Emotion::Surprised);
    run_for(&mut avatar, &mut rig, duration + 0.5);

    assert!(rig.peak("jawOpen") > 0.0);
}

#[test]
fn stop_mid_word_is_clean() {
    let mut rig = RecordingRig::action_unit();
    let mut avatar = AvatarSession::new(quiet_config(), &rig).unwrap();

    let text = "a very long sentence that keeps going and going";
    let sequence = avatar.generate_timeline(text);
    avatar.speak(text, Some(sequence));
    avatar.on_playback_started();
    run_for(&mut avatar, &mut rig, 0.3);
    assert!(avatar.is_speaking());

    avatar.stop();
    avatar.stop();
    assert!(!avatar.is_speaking());

    // One frame later nothing snapped: weights are still decaying.
    avatar.tick(FRAME, &mut rig);
    // And after a couple of seconds everything is at rest.
    run_for(&mut avatar, &mut rig, 2.0);
    assert_eq!(rig.max_weight(), 0.0);
}

#[test]
fn all_vowel_word_durations_use_the_vowel_multiplier() {
    let config = FaceConfig::default();
    let sequence = timeline::generate("eye", &config.timeline);
    let spoken: Vec<_> = sequence
        .events
        .iter()
        .filter(|e| e.viseme != Viseme::Sil)
        .collect();
    assert_eq!(spoken.len(), 3);
    for event in spoken {
        assert!(
            (event.duration - config.timeline.base_duration * 1.2).abs() < 1e-6,
            "expected vowel duration, got {}",
            event.duration
        );
    }
}
