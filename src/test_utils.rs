//! Shared test utilities used across multiple test modules.

use crate::rig::RigSurface;
use std::collections::HashMap;

/// Minimal rig for tests: a fixed channel set with recorded weights.
pub(crate) struct MockRig {
    channels: HashMap<String, f32>,
}

impl MockRig {
    /// A rig exposing exactly the given channel names, all at zero.
    pub(crate) fn with_channels(names: &[&str]) -> Self {
        Self {
            channels: names.iter().map(|n| ((*n).to_owned(), 0.0)).collect(),
        }
    }

    /// A viseme-direct (Taxonomy A) rig with the full expression set.
    pub(crate) fn viseme_direct() -> Self {
        let names: Vec<&str> = crate::rig::VISEME_CHANNELS
            .into_iter()
            .chain(crate::rig::EXPRESSION_CHANNELS)
            .collect();
        Self::with_channels(&names)
    }

    /// An action-unit (Taxonomy B) rig with the full expression set.
    pub(crate) fn action_unit() -> Self {
        let names: Vec<&str> = crate::rig::MOUTH_AU_CHANNELS
            .into_iter()
            .chain(crate::rig::EXPRESSION_CHANNELS)
            .collect();
        Self::with_channels(&names)
    }

    /// The last weight written to a channel (0.0 if never written).
    pub(crate) fn weight(&self, name: &str) -> f32 {
        self.channels.get(name).copied().unwrap_or(0.0)
    }

    /// Maximum weight currently applied across all channels.
    pub(crate) fn max_weight(&self) -> f32 {
        self.channels.values().copied().fold(0.0, f32::max)
    }
}

impl RigSurface for MockRig {
    fn has_channel(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    fn set_weight(&mut self, name: &str, weight: f32) {
        if let Some(slot) = self.channels.get_mut(name) {
            *slot = weight;
        }
    }
}
