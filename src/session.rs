//! Per-avatar animation session.
//!
//! One [`AvatarSession`] owns one instance of every engine component —
//! nothing lives in globals, so multiple concurrent sessions coexist and
//! tests are deterministic. The embedding application drives the session
//! with exactly one [`tick`](AvatarSession::tick) per rendered frame and
//! forwards its playback collaborator's callbacks; everything else is
//! handled internally.

use crate::actuator::BlendShapeActuator;
use crate::compositor::SignalCompositor;
use crate::config::FaceConfig;
use crate::emotion::{Emotion, EmotionState};
use crate::error::Result;
use crate::idle::IdleMotion;
use crate::lipsync::{LipSyncController, LipSyncMode};
use crate::rig::{RigBinding, RigSurface};
use crate::tracking::{TrackingFrame, TrackingMirror};
use crate::viseme::{VisemeSequence, timeline};
use tracing::debug;

/// A pending utterance waiting for the playback collaborator to start.
struct PendingUtterance {
    text: String,
    sequence: Option<VisemeSequence>,
}

/// One avatar's complete animation state.
pub struct AvatarSession {
    config: FaceConfig,
    binding: RigBinding,
    lipsync: LipSyncController,
    emotion: EmotionState,
    idle: IdleMotion,
    tracking: TrackingMirror,
    compositor: SignalCompositor,
    actuator: BlendShapeActuator,
    pending: Option<PendingUtterance>,
    /// Speaking state last frame, for the falling-edge emotion reset.
    was_speaking: bool,
}

impl AvatarSession {
    /// Bind a session to a loaded rig, detecting its channel taxonomy.
    ///
    /// # Errors
    ///
    /// Returns an error if the rig exposes no usable mouth channels.
    pub fn new(config: FaceConfig, rig: &dyn RigSurface) -> Result<Self> {
        let binding = RigBinding::detect(rig)?;
        Ok(Self {
            lipsync: LipSyncController::new(
                config.lipsync.clone(),
                config.timeline.clone(),
                config.word.clone(),
            ),
            emotion: EmotionState::new(config.emotion.clone()),
            idle: IdleMotion::new(config.idle.clone()),
            tracking: TrackingMirror::new(config.tracking.clone()),
            compositor: SignalCompositor::new(),
            actuator: BlendShapeActuator::new(config.actuator.clone()),
            binding,
            config,
            pending: None,
            was_speaking: false,
        })
    }

    /// The detected rig taxonomy.
    pub fn taxonomy(&self) -> crate::rig::RigTaxonomy {
        self.binding.taxonomy()
    }

    /// Current lip-sync mode.
    pub fn lipsync_mode(&self) -> LipSyncMode {
        self.lipsync.mode()
    }

    /// Whether an utterance is in flight.
    pub fn is_speaking(&self) -> bool {
        self.lipsync.is_speaking()
    }

    /// Generate the viseme timeline for an utterance with this session's
    /// tuning. Pure and deterministic.
    pub fn generate_timeline(&self, text: &str) -> VisemeSequence {
        timeline::generate(text, &self.config.timeline)
    }

    /// Queue an utterance. Lip sync begins when the playback collaborator
    /// reports [`on_playback_started`](AvatarSession::on_playback_started);
    /// a precomputed sequence, if supplied and valid, is always preferred
    /// over per-word boundary signals.
    pub fn speak(&mut self, text: &str, sequence: Option<VisemeSequence>) {
        debug!(chars = text.chars().count(), has_sequence = sequence.is_some(), "utterance queued");
        self.pending = Some(PendingUtterance {
            text: text.to_owned(),
            sequence,
        });
    }

    /// Playback collaborator: audio started.
    pub fn on_playback_started(&mut self) {
        self.emotion.speech_started();
        if let Some(pending) = self.pending.take() {
            self.lipsync.start(&pending.text, pending.sequence);
        }
    }

    /// Playback collaborator: a word boundary at `char_index` with
    /// `char_length` characters.
    pub fn on_word_boundary(&mut self, char_index: usize, char_length: usize) {
        self.lipsync.on_word_boundary(char_index, char_length);
    }

    /// A precomputed sequence arrived after playback started.
    pub fn provide_sequence(&mut self, sequence: VisemeSequence) {
        self.lipsync.provide_sequence(sequence);
    }

    /// Playback collaborator: audio finished normally.
    pub fn on_playback_ended(&mut self) {
        self.lipsync.stop();
    }

    /// Playback collaborator: audio failed. Treated as a cancellation;
    /// the face decays to rest through normal smoothing.
    pub fn on_playback_error(&mut self) {
        debug!("playback error; cancelling utterance");
        self.stop();
    }

    /// Cancel everything in flight. Idempotent and safe at any time.
    pub fn stop(&mut self) {
        self.pending = None;
        self.lipsync.stop();
    }

    /// Request an emotion.
    pub fn set_emotion(&mut self, emotion: Emotion) {
        self.emotion.set(emotion);
    }

    /// Request an emotion by name; unknown names relax to neutral.
    pub fn set_emotion_by_name(&mut self, name: &str) {
        self.emotion.set_by_name(name);
    }

    /// Submit a facial-tracking frame.
    pub fn submit_tracking(&mut self, frame: TrackingFrame) {
        self.tracking.submit(frame);
    }

    /// Drop the held tracking frame.
    pub fn clear_tracking(&mut self) {
        self.tracking.clear();
    }

    /// Advance the whole session by one frame and write the smoothed
    /// weights to the rig. The order within the frame is fixed: lip sync,
    /// emotion, idle/tracking, then actuation.
    pub fn tick(&mut self, dt: f32, rig: &mut dyn RigSurface) {
        self.lipsync.tick(dt);
        self.emotion.update(dt);
        self.idle.update(dt);
        self.tracking.update(dt);

        // Utterance ended (either path: release or stop): arm the delayed
        // emotion reset.
        let speaking = self.lipsync.is_speaking();
        if self.was_speaking && !speaking {
            self.emotion.speech_ended();
        }
        self.was_speaking = speaking;

        let targets = self.compositor.compose(
            &self.binding,
            &self.lipsync,
            &self.emotion,
            &self.idle,
            &self.tracking,
        );
        self.actuator.apply(targets, dt, rig);
    }
}
