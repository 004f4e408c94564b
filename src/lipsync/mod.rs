//! Lip-sync mode arbitration.
//!
//! Three timing sources of differing reliability can drive the mouth:
//!
//! 1. **Timeline** — a precomputed [`VisemeSequence`] aligned to playback.
//!    Always preferred: word-boundary signals are unreliable across
//!    platforms and voices.
//! 2. **Realtime** — external per-word boundary signals, each replacing
//!    the active word's viseme queue (expanded locally per word).
//! 3. **Fallback** — a locally synthesized timeline, used when realtime
//!    mode was promised boundary signals that never arrived.
//!
//! The controller is an explicit state machine polled once per animation
//! frame. It never blocks: the grace-period wait is a stored deadline
//! checked on tick, and frame time is the only clock, which makes the race
//! between "boundary signal arrives" and "grace deadline fires"
//! deterministic in tests.

use crate::config::{LipSyncConfig, TimelineConfig, WordConfig};
use crate::viseme::word::{self, RelativeViseme};
use crate::viseme::{Viseme, VisemeSequence, timeline};
use std::f32::consts::PI;
use tracing::{debug, warn};

/// Fraction of an event's duration over which the next event's viseme is
/// pre-activated (coarticulation).
const BLEND_WINDOW: f32 = 0.3;
/// Peak fraction of the next event's intensity during pre-activation.
const BLEND_GAIN: f32 = 0.4;

/// Which timing source currently drives the mouth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LipSyncMode {
    /// Not speaking.
    #[default]
    Idle,
    /// Driven by external per-word boundary signals.
    Realtime,
    /// Driven by a precomputed viseme timeline.
    Timeline,
    /// Driven by a locally synthesized timeline after realtime timed out.
    Fallback,
}

/// Finite-state controller arbitrating the lip-sync timing sources.
pub struct LipSyncController {
    config: LipSyncConfig,
    timeline_config: TimelineConfig,
    word_config: WordConfig,
    mode: LipSyncMode,
    /// Utterance text, kept for word-boundary slicing and fallback
    /// synthesis.
    text: String,
    /// Active sequence in Timeline/Fallback mode.
    sequence: Option<VisemeSequence>,
    /// Seconds since `start`.
    elapsed: f32,
    /// Seconds into the active sequence.
    seq_clock: f32,
    /// Elapsed-time deadline for the realtime grace period. `None` means
    /// cancelled (a signal arrived) or not armed.
    grace_deadline: Option<f32>,
    /// Relative viseme queue for the active word (realtime mode).
    word_queue: Vec<RelativeViseme>,
    /// Seconds into the active word queue.
    word_clock: f32,
}

impl LipSyncController {
    /// Create a controller with the given tuning.
    pub fn new(
        config: LipSyncConfig,
        timeline_config: TimelineConfig,
        word_config: WordConfig,
    ) -> Self {
        Self {
            config,
            timeline_config,
            word_config,
            mode: LipSyncMode::Idle,
            text: String::new(),
            sequence: None,
            elapsed: 0.0,
            seq_clock: 0.0,
            grace_deadline: None,
            word_queue: Vec::new(),
            word_clock: 0.0,
        }
    }

    /// Current mode.
    pub fn mode(&self) -> LipSyncMode {
        self.mode
    }

    /// Whether an utterance is in flight. Idle micro-expressions and the
    /// tracking mirror are suppressed while this is true.
    pub fn is_speaking(&self) -> bool {
        self.mode != LipSyncMode::Idle
    }

    /// Begin an utterance. A non-empty valid precomputed sequence routes
    /// straight to Timeline mode; otherwise the controller enters Realtime
    /// and arms the grace deadline. A malformed sequence is treated as
    /// unavailable, not as an error.
    ///
    /// Restarting while already speaking cancels the previous utterance.
    pub fn start(&mut self, text: &str, precomputed: Option<VisemeSequence>) {
        self.reset_playback();
        self.text = text.to_owned();

        match precomputed {
            Some(seq) if seq.is_valid() => {
                self.sequence = Some(seq);
                self.transition(LipSyncMode::Timeline);
            }
            other => {
                if other.is_some() {
                    warn!("precomputed viseme sequence is malformed; using realtime mode");
                }
                self.grace_deadline = Some(self.config.grace_period);
                self.transition(LipSyncMode::Realtime);
            }
        }
    }

    /// A word-boundary signal from the playback collaborator:
    /// `char_index`/`char_length` locate the word within the utterance
    /// text. Replaces the active word's viseme queue and resets its local
    /// clock. Ignored outside Realtime mode (a timeline already knows
    /// better).
    pub fn on_word_boundary(&mut self, char_index: usize, char_length: usize) {
        if self.mode != LipSyncMode::Realtime {
            return;
        }
        // First signal proves the source is alive.
        self.grace_deadline = None;

        let current_word: String = self
            .text
            .chars()
            .skip(char_index)
            .take(char_length)
            .collect();
        self.word_queue = word::expand(&current_word, &self.word_config);
        self.word_clock = 0.0;
    }

    /// A precomputed sequence arrived after playback already started.
    /// Upgrades Realtime to Timeline; the sequence is assumed aligned to
    /// utterance start, so the timeline clock picks up at the elapsed
    /// playback time.
    pub fn provide_sequence(&mut self, sequence: VisemeSequence) {
        if self.mode != LipSyncMode::Realtime || !sequence.is_valid() {
            return;
        }
        self.grace_deadline = None;
        self.seq_clock = self.elapsed;
        self.sequence = Some(sequence);
        self.transition(LipSyncMode::Timeline);
    }

    /// Cancel the utterance. Idempotent: safe to call at any time and
    /// repeatedly; cancels the grace deadline and discards all playback
    /// state. Channels decay through normal smoothing, not a forced snap.
    pub fn stop(&mut self) {
        if self.mode != LipSyncMode::Idle {
            self.transition(LipSyncMode::Idle);
        }
        self.reset_playback();
    }

    /// Advance the controller by one frame. Handles the grace-deadline
    /// expiry and automatic timeline release; never blocks.
    pub fn tick(&mut self, dt: f32) {
        if self.mode == LipSyncMode::Idle || !(dt > 0.0) {
            return;
        }
        self.elapsed += dt;

        match self.mode {
            LipSyncMode::Realtime => {
                self.word_clock += dt;
                if let Some(deadline) = self.grace_deadline
                    && self.elapsed >= deadline
                {
                    self.grace_deadline = None;
                    self.enter_fallback();
                }
            }
            LipSyncMode::Timeline | LipSyncMode::Fallback => {
                self.seq_clock += dt;
                let finished = self
                    .sequence
                    .as_ref()
                    .is_none_or(|seq| {
                        self.seq_clock > seq.total_duration + self.config.release_padding
                    });
                if finished {
                    self.transition(LipSyncMode::Idle);
                    self.reset_playback();
                }
            }
            LipSyncMode::Idle => {}
        }
    }

    /// The instantaneous lip-sync contribution: sparse viseme activations
    /// with the coarticulation envelope applied. Empty when idle or
    /// between events.
    pub fn sample(&self) -> Vec<(Viseme, f32)> {
        match self.mode {
            LipSyncMode::Idle => Vec::new(),
            LipSyncMode::Timeline | LipSyncMode::Fallback => self
                .sequence
                .as_ref()
                .map(|seq| sample_sequence(seq, self.seq_clock))
                .unwrap_or_default(),
            LipSyncMode::Realtime => sample_queue(&self.word_queue, self.word_clock),
        }
    }

    /// No boundary signal arrived in time: synthesize a timeline from the
    /// utterance text and play it like a precomputed one.
    fn enter_fallback(&mut self) {
        let synthesized = timeline::generate(&self.text, &self.timeline_config);
        if synthesized.is_valid() {
            self.sequence = Some(synthesized);
            self.seq_clock = 0.0;
            self.transition(LipSyncMode::Fallback);
        } else {
            // Nothing to say (empty or unspeakable text).
            self.transition(LipSyncMode::Idle);
            self.reset_playback();
        }
    }

    fn transition(&mut self, to: LipSyncMode) {
        debug!(from = ?self.mode, ?to, "lip-sync mode transition");
        self.mode = to;
    }

    fn reset_playback(&mut self) {
        self.text.clear();
        self.sequence = None;
        self.elapsed = 0.0;
        self.seq_clock = 0.0;
        self.grace_deadline = None;
        self.word_queue.clear();
        self.word_clock = 0.0;
    }
}

// ── Coarticulation sampling ─────────────────────────────────────────────

/// Envelope for the active event: a smooth rise and fall instead of a
/// square pulse.
fn envelope(progress: f32) -> f32 {
    (progress * PI).sin()
}

/// Pre-activation weight for the next event during the final
/// `BLEND_WINDOW` of the active one. `blend` ramps 0→1 across the window.
fn preactivation(progress: f32, next_intensity: f32) -> Option<f32> {
    let window_start = 1.0 - BLEND_WINDOW;
    if progress < window_start {
        return None;
    }
    let blend = (progress - window_start) / BLEND_WINDOW;
    Some(next_intensity * blend * BLEND_GAIN)
}

/// Sample an absolute-time sequence at `t` seconds.
fn sample_sequence(sequence: &VisemeSequence, t: f32) -> Vec<(Viseme, f32)> {
    let Some(index) = sequence.event_at(t) else {
        return Vec::new();
    };
    let event = &sequence.events[index];
    let progress = ((t - event.time) / event.duration).clamp(0.0, 1.0);

    let mut out = Vec::with_capacity(2);
    out.push((event.viseme, event.intensity * envelope(progress)));
    if let Some(next) = sequence.events.get(index + 1)
        && let Some(weight) = preactivation(progress, next.intensity)
    {
        out.push((next.viseme, weight));
    }
    out
}

/// Sample a relative-time word queue at `t` seconds from its start.
fn sample_queue(queue: &[RelativeViseme], t: f32) -> Vec<(Viseme, f32)> {
    if t < 0.0 {
        return Vec::new();
    }
    let mut clock = 0.0f32;
    for (index, item) in queue.iter().enumerate() {
        if t < clock + item.duration {
            let progress = ((t - clock) / item.duration).clamp(0.0, 1.0);
            let mut out = Vec::with_capacity(2);
            out.push((item.viseme, item.intensity * envelope(progress)));
            if let Some(next) = queue.get(index + 1)
                && let Some(weight) = preactivation(progress, next.intensity)
            {
                out.push((next.viseme, weight));
            }
            return out;
        }
        clock += item.duration;
    }
    Vec::new()
}
