//! Rig channel taxonomies and the per-frame target map.
//!
//! A loaded face rig exposes a set of named scalar control channels
//! (blend shapes). Two taxonomies are supported, detected once at load by
//! probing which channel names exist:
//!
//! - **Viseme-direct** — one channel per viseme (`viseme_aa`, `viseme_PP`,
//!   …, the Oculus naming convention), mapped 1:1.
//! - **Action-unit** — ARKit-style action units (`jawOpen`, `mouthPucker`,
//!   …); each viseme expands to a fixed weighted set of AU channels.
//!
//! Expression channels (brows, eyes, smile) are shared by both taxonomies;
//! only mouth-shape routing differs. Channels the rig does not expose are
//! reported once at load as a diagnostic and are silent no-ops per frame.

use crate::error::{FaceError, Result};
use crate::viseme::Viseme;
use std::collections::HashMap;
use tracing::{info, warn};

/// A loaded rig's control surface.
///
/// Implementations must silently ignore unknown channel names in
/// [`set_weight`](RigSurface::set_weight) — partial rigs are expected.
pub trait RigSurface {
    /// Whether the rig exposes a channel with this name.
    fn has_channel(&self, name: &str) -> bool;
    /// Set a channel's weight for the current frame. Weights are in [0, 1].
    fn set_weight(&mut self, name: &str, weight: f32);
}

/// Which channel taxonomy the loaded rig uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigTaxonomy {
    /// One channel per viseme, direct 1:1 (Taxonomy A).
    VisemeDirect,
    /// Viseme → weighted action-unit expansion (Taxonomy B).
    ActionUnit,
}

// ── Channel names ───────────────────────────────────────────────────────

/// Oculus-convention viseme channels, indexed by viseme ID.
pub const VISEME_CHANNELS: [&str; 15] = [
    "viseme_sil",
    "viseme_PP",
    "viseme_FF",
    "viseme_TH",
    "viseme_DD",
    "viseme_kk",
    "viseme_CH",
    "viseme_SS",
    "viseme_nn",
    "viseme_RR",
    "viseme_aa",
    "viseme_E",
    "viseme_I",
    "viseme_O",
    "viseme_U",
];

pub const JAW_OPEN: &str = "jawOpen";
pub const MOUTH_CLOSE: &str = "mouthClose";
pub const MOUTH_FUNNEL: &str = "mouthFunnel";
pub const MOUTH_PUCKER: &str = "mouthPucker";
pub const MOUTH_SMILE_L: &str = "mouthSmileLeft";
pub const MOUTH_SMILE_R: &str = "mouthSmileRight";
pub const MOUTH_FROWN_L: &str = "mouthFrownLeft";
pub const MOUTH_FROWN_R: &str = "mouthFrownRight";
pub const MOUTH_PRESS_L: &str = "mouthPressLeft";
pub const MOUTH_PRESS_R: &str = "mouthPressRight";
pub const MOUTH_STRETCH_L: &str = "mouthStretchLeft";
pub const MOUTH_STRETCH_R: &str = "mouthStretchRight";
pub const MOUTH_SHRUG_UPPER: &str = "mouthShrugUpper";
pub const TONGUE_OUT: &str = "tongueOut";

pub const BROW_INNER_UP: &str = "browInnerUp";
pub const BROW_DOWN_L: &str = "browDownLeft";
pub const BROW_DOWN_R: &str = "browDownRight";
pub const EYE_BLINK_L: &str = "eyeBlinkLeft";
pub const EYE_BLINK_R: &str = "eyeBlinkRight";
pub const EYE_WIDE_L: &str = "eyeWideLeft";
pub const EYE_WIDE_R: &str = "eyeWideRight";
pub const EYE_LOOK_LEFT: &str = "eyeLookLeft";
pub const EYE_LOOK_RIGHT: &str = "eyeLookRight";
pub const EYE_LOOK_UP: &str = "eyeLookUp";
pub const EYE_LOOK_DOWN: &str = "eyeLookDown";
pub const CHEEK_SQUINT_L: &str = "cheekSquintLeft";
pub const CHEEK_SQUINT_R: &str = "cheekSquintRight";
pub const NOSE_SNEER_L: &str = "noseSneerLeft";
pub const NOSE_SNEER_R: &str = "noseSneerRight";

/// Mouth action-unit channels (Taxonomy B lip-sync output).
pub const MOUTH_AU_CHANNELS: [&str; 14] = [
    JAW_OPEN,
    MOUTH_CLOSE,
    MOUTH_FUNNEL,
    MOUTH_PUCKER,
    MOUTH_SMILE_L,
    MOUTH_SMILE_R,
    MOUTH_FROWN_L,
    MOUTH_FROWN_R,
    MOUTH_PRESS_L,
    MOUTH_PRESS_R,
    MOUTH_STRETCH_L,
    MOUTH_STRETCH_R,
    MOUTH_SHRUG_UPPER,
    TONGUE_OUT,
];

/// Expression channels shared by emotion, idle, and tracking sources.
pub const EXPRESSION_CHANNELS: [&str; 15] = [
    BROW_INNER_UP,
    BROW_DOWN_L,
    BROW_DOWN_R,
    EYE_BLINK_L,
    EYE_BLINK_R,
    EYE_WIDE_L,
    EYE_WIDE_R,
    EYE_LOOK_LEFT,
    EYE_LOOK_RIGHT,
    EYE_LOOK_UP,
    EYE_LOOK_DOWN,
    CHEEK_SQUINT_L,
    CHEEK_SQUINT_R,
    NOSE_SNEER_L,
    NOSE_SNEER_R,
];

/// Every channel the engine can drive, across both taxonomies.
pub fn all_known_channels() -> impl Iterator<Item = &'static str> {
    VISEME_CHANNELS
        .into_iter()
        .chain(MOUTH_AU_CHANNELS)
        .chain(EXPRESSION_CHANNELS)
}

/// Whether a channel is lip-sync territory (fast smoothing constants)
/// rather than ambient expression (slow ones).
pub fn is_mouth_channel(name: &str) -> bool {
    name.starts_with("viseme_") || MOUTH_AU_CHANNELS.contains(&name)
}

// ── Viseme → action-unit expansion ──────────────────────────────────────

/// Fixed expansion from each viseme to weighted action units. Weights are
/// scaled by the viseme's activation at the point the contribution is
/// produced, so no further mapping happens in the actuator.
fn viseme_action_units(viseme: Viseme) -> &'static [(&'static str, f32)] {
    match viseme {
        Viseme::Sil => &[],
        Viseme::PP => &[(MOUTH_CLOSE, 0.9), (MOUTH_PRESS_L, 0.6), (MOUTH_PRESS_R, 0.6)],
        Viseme::FF => &[(MOUTH_SHRUG_UPPER, 0.5), (MOUTH_FUNNEL, 0.35), (JAW_OPEN, 0.1)],
        Viseme::TH => &[(TONGUE_OUT, 0.5), (JAW_OPEN, 0.2)],
        Viseme::DD => &[(JAW_OPEN, 0.25), (MOUTH_STRETCH_L, 0.2), (MOUTH_STRETCH_R, 0.2)],
        Viseme::KK => &[(JAW_OPEN, 0.35)],
        Viseme::CH => &[(MOUTH_FUNNEL, 0.55), (MOUTH_PUCKER, 0.3), (JAW_OPEN, 0.2)],
        Viseme::SS => &[(MOUTH_STRETCH_L, 0.35), (MOUTH_STRETCH_R, 0.35), (JAW_OPEN, 0.15)],
        Viseme::NN => &[(JAW_OPEN, 0.2)],
        Viseme::RR => &[(MOUTH_PUCKER, 0.4), (JAW_OPEN, 0.2)],
        Viseme::AA => &[(JAW_OPEN, 0.8)],
        Viseme::E => &[(JAW_OPEN, 0.45), (MOUTH_STRETCH_L, 0.25), (MOUTH_STRETCH_R, 0.25)],
        Viseme::I => &[(JAW_OPEN, 0.3), (MOUTH_SMILE_L, 0.4), (MOUTH_SMILE_R, 0.4)],
        Viseme::O => &[(MOUTH_FUNNEL, 0.6), (JAW_OPEN, 0.55)],
        Viseme::U => &[(MOUTH_PUCKER, 0.75), (JAW_OPEN, 0.3)],
    }
}

// ── Target map ──────────────────────────────────────────────────────────

/// The per-frame target accumulator: channel name → weight in [0, 1].
///
/// Rebuilt from zero every frame by the compositor and never persisted.
/// Merging is always max-combine — a later source in the frame can raise a
/// channel but never lower it.
#[derive(Debug, Clone)]
pub struct TargetMap {
    values: HashMap<&'static str, f32>,
}

impl TargetMap {
    /// A map with every known channel present at zero.
    pub fn new() -> Self {
        Self {
            values: all_known_channels().map(|name| (name, 0.0)).collect(),
        }
    }

    /// Zero every channel (start of frame).
    pub fn reset(&mut self) {
        for weight in self.values.values_mut() {
            *weight = 0.0;
        }
    }

    /// Max-combine a contribution into a channel. Unknown channel names
    /// and non-finite weights are ignored; weights are clamped to [0, 1].
    pub fn raise(&mut self, name: &str, weight: f32) {
        if !weight.is_finite() {
            return;
        }
        if let Some(current) = self.values.get_mut(name) {
            *current = current.max(weight.clamp(0.0, 1.0));
        }
    }

    /// Current target for a channel (0.0 if unknown).
    pub fn get(&self, name: &str) -> f32 {
        self.values.get(name).copied().unwrap_or(0.0)
    }

    /// Iterate all channels and their targets.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f32)> + '_ {
        self.values.iter().map(|(&name, &weight)| (name, weight))
    }
}

impl Default for TargetMap {
    fn default() -> Self {
        Self::new()
    }
}

// ── Rig binding ─────────────────────────────────────────────────────────

/// The engine's view of a loaded rig: its taxonomy, fixed at load.
#[derive(Debug, Clone, Copy)]
pub struct RigBinding {
    taxonomy: RigTaxonomy,
}

impl RigBinding {
    /// Detect the rig's taxonomy by probing which channel names exist, and
    /// validate the channel-mapping table against the rig's actual channel
    /// set. Channels the engine can drive but the rig lacks are surfaced
    /// once here as a warning, then silently skipped per frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the rig exposes neither viseme channels nor
    /// mouth action units — there is nothing to lip-sync against.
    pub fn detect(rig: &dyn RigSurface) -> Result<Self> {
        let has_visemes = VISEME_CHANNELS.iter().any(|name| rig.has_channel(name));
        let has_action_units = MOUTH_AU_CHANNELS.iter().any(|name| rig.has_channel(name));

        let taxonomy = if has_visemes {
            RigTaxonomy::VisemeDirect
        } else if has_action_units {
            RigTaxonomy::ActionUnit
        } else {
            return Err(FaceError::Rig(
                "rig exposes no viseme or mouth action-unit channels".to_owned(),
            ));
        };

        let mapped: Vec<&str> = match taxonomy {
            RigTaxonomy::VisemeDirect => VISEME_CHANNELS
                .into_iter()
                .chain(EXPRESSION_CHANNELS)
                .collect(),
            RigTaxonomy::ActionUnit => MOUTH_AU_CHANNELS
                .into_iter()
                .chain(EXPRESSION_CHANNELS)
                .collect(),
        };
        let unmapped: Vec<&str> = mapped
            .into_iter()
            .filter(|name| !rig.has_channel(name))
            .collect();

        info!(?taxonomy, "rig taxonomy detected");
        if !unmapped.is_empty() {
            warn!(
                missing = unmapped.len(),
                channels = ?unmapped,
                "rig is missing mapped channels; they will be ignored"
            );
        }

        Ok(Self { taxonomy })
    }

    /// The taxonomy fixed at load time.
    pub fn taxonomy(&self) -> RigTaxonomy {
        self.taxonomy
    }

    /// Max-combine one viseme activation into the target map, routed
    /// through the taxonomy. Silence contributes nothing — mouth at rest
    /// is all channels at zero.
    pub fn accumulate_viseme(&self, viseme: Viseme, weight: f32, targets: &mut TargetMap) {
        if viseme == Viseme::Sil || weight <= 0.0 {
            return;
        }
        match self.taxonomy {
            RigTaxonomy::VisemeDirect => {
                targets.raise(VISEME_CHANNELS[viseme as usize], weight);
            }
            RigTaxonomy::ActionUnit => {
                for &(channel, base) in viseme_action_units(viseme) {
                    targets.raise(channel, base * weight);
                }
            }
        }
    }
}
