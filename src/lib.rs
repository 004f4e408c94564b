//! Selkie: Real-time avatar facial-animation blending engine.
//!
//! Drives a synthetic face so its mouth tracks spoken text in real time
//! while expressing emotion, idle micro-movement, eye gaze/blink, and an
//! optional facial-tracking mirror — without the competing signals
//! visibly fighting for the same muscles.
//!
//! # Architecture
//!
//! Everything is driven by a single per-frame tick over independent
//! components owned by one [`AvatarSession`]:
//! - **Timeline generation**: Deterministic text → timed viseme events
//!   with coarticulation and prosodic pauses ([`viseme::timeline`])
//! - **Mode arbitration**: A state machine choosing per utterance among
//!   timeline, realtime word-boundary, and fallback timing ([`lipsync`])
//! - **Composition**: Per-frame max-combine of lip-sync, emotion, idle,
//!   and tracking contributions ([`compositor`])
//! - **Actuation**: Smoothing with direction-dependent time constants,
//!   written to a viseme-direct or action-unit rig ([`actuator`], [`rig`])
//!
//! Rendering, audio synthesis, and speech recognition are external
//! collaborators; the engine only consumes their callbacks.

pub mod actuator;
pub mod compositor;
pub mod config;
pub mod emotion;
pub mod error;
pub mod idle;
pub mod lipsync;
pub mod rig;
pub mod session;
pub mod tracking;
pub mod viseme;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::FaceConfig;
pub use emotion::Emotion;
pub use error::{FaceError, Result};
pub use lipsync::LipSyncMode;
pub use rig::{RigSurface, RigTaxonomy};
pub use session::AvatarSession;
pub use tracking::TrackingFrame;
pub use viseme::{Viseme, VisemeEvent, VisemeSequence};
