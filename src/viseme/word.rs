//! Per-word viseme expansion for realtime lip-sync.
//!
//! When no precomputed timeline exists, the mouth is driven word-by-word
//! from external word-boundary signals. Each signal carries no duration
//! information, so this expander produces a short relative-time viseme
//! sequence as a cheap local approximation, with its own base cadence
//! tuned independently of the full timeline generator.

use crate::config::WordConfig;
use crate::viseme::{Viseme, match_unit};

/// Vowel duration multiplier (wider than the timeline's: with no real
/// timing to follow, exaggerated vowels read better).
const VOWEL_DURATION: f32 = 1.5;
/// Consonant duration multiplier.
const CONSONANT_DURATION: f32 = 0.9;
/// Vowel peak intensity.
const VOWEL_INTENSITY: f32 = 1.0;
/// Consonant peak intensity.
const CONSONANT_INTENSITY: f32 = 0.75;

/// One viseme in a word expansion, at a relative offset (no absolute
/// clock — the controller supplies one when the word starts playing).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativeViseme {
    /// Mouth shape.
    pub viseme: Viseme,
    /// Duration in seconds.
    pub duration: f32,
    /// Peak activation weight in [0, 1].
    pub intensity: f32,
}

/// Expand a single word into a relative-time viseme sequence.
///
/// Same digraph/character lookup as the timeline generator; characters
/// outside the permitted alphabet are dropped silently.
pub fn expand(word: &str, config: &WordConfig) -> Vec<RelativeViseme> {
    let chars: Vec<char> = word
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .collect();

    let mut out = Vec::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        let Some(unit) = match_unit(&chars, i) else {
            i += 1;
            continue;
        };
        let (duration_mult, intensity) = if unit.vowel {
            (VOWEL_DURATION, VOWEL_INTENSITY)
        } else {
            (CONSONANT_DURATION, CONSONANT_INTENSITY)
        };
        out.push(RelativeViseme {
            viseme: unit.viseme,
            duration: config.base_duration * duration_mult,
            intensity,
        });
        i += unit.advance;
    }
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn cfg() -> WordConfig {
        WordConfig::default()
    }

    #[test]
    fn expands_word_to_visemes() {
        let out = expand("hello", &cfg());
        let visemes: Vec<Viseme> = out.iter().map(|v| v.viseme).collect();
        assert_eq!(
            visemes,
            vec![Viseme::KK, Viseme::E, Viseme::DD, Viseme::DD, Viseme::O]
        );
    }

    #[test]
    fn vowels_are_longer_and_stronger() {
        let config = cfg();
        let out = expand("go", &config);
        let g = out[0];
        let o = out[1];
        assert!((g.duration - config.base_duration * 0.9).abs() < 1e-6);
        assert!((o.duration - config.base_duration * 1.5).abs() < 1e-6);
        assert_eq!(g.intensity, 0.75);
        assert_eq!(o.intensity, 1.0);
    }

    #[test]
    fn digraph_lookup_applies() {
        let out = expand("thing", &cfg());
        let visemes: Vec<Viseme> = out.iter().map(|v| v.viseme).collect();
        // th-i-ng
        assert_eq!(visemes, vec![Viseme::TH, Viseme::I, Viseme::KK]);
    }

    #[test]
    fn punctuation_and_digits_are_dropped() {
        let out = expand("don't!", &cfg());
        let visemes: Vec<Viseme> = out.iter().map(|v| v.viseme).collect();
        // d-o-n-t
        assert_eq!(
            visemes,
            vec![Viseme::DD, Viseme::O, Viseme::NN, Viseme::DD]
        );
        assert!(expand("42", &cfg()).is_empty());
    }

    #[test]
    fn empty_word_expands_to_nothing() {
        assert!(expand("", &cfg()).is_empty());
    }
}
