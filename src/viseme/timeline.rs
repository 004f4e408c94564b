//! Text-to-viseme timeline generation.
//!
//! Converts an utterance's text into an ordered, contiguous sequence of
//! timed viseme events with prosodic pauses. Pure and deterministic: the
//! same text and config always produce an identical sequence, which is what
//! makes utterance playback reproducible and testable.

use crate::config::TimelineConfig;
use crate::viseme::{Viseme, VisemeEvent, VisemeSequence, is_vowel_letter, match_unit};

/// Vowel duration multiplier.
const VOWEL_DURATION: f32 = 1.2;
/// Consonant duration multiplier.
const CONSONANT_DURATION: f32 = 0.9;
/// Extra lengthening when a vowel is followed by a consonant.
///
/// Deliberately naive "stressed syllable" heuristic: it has no real
/// linguistic basis and mis-lengthens some multi-syllable words, but it is
/// preserved exactly rather than replaced with a prosody model.
const STRESS_MULTIPLIER: f32 = 1.15;
/// Vowel peak intensity.
const VOWEL_INTENSITY: f32 = 0.75;
/// Consonant peak intensity.
const CONSONANT_INTENSITY: f32 = 0.5;
/// Emphasis applied to the first word of an utterance.
const FIRST_WORD_EMPHASIS: f32 = 1.1;

/// Pause classes keyed by a word's trailing punctuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PauseClass {
    /// Sentence-final period.
    Period,
    /// Exclamation or question mark.
    Exclaim,
    /// Comma.
    Comma,
    /// Plain word gap.
    WordGap,
}

impl PauseClass {
    fn duration(self) -> f32 {
        match self {
            PauseClass::Period => 0.35,
            PauseClass::Exclaim => 0.30,
            PauseClass::Comma => 0.20,
            PauseClass::WordGap => 0.07,
        }
    }

    /// Classify the trailing non-letter run of a raw whitespace token.
    /// Exclamation/question outranks period outranks comma, so `?!` and
    /// `...` still classify sensibly.
    fn of_token(token: &str) -> Self {
        let trailing: Vec<char> = token
            .chars()
            .rev()
            .take_while(|c| !c.is_alphabetic())
            .collect();
        if trailing.iter().any(|&c| c == '!' || c == '?') {
            PauseClass::Exclaim
        } else if trailing.contains(&'.') {
            PauseClass::Period
        } else if trailing.contains(&',') {
            PauseClass::Comma
        } else {
            PauseClass::WordGap
        }
    }
}

/// Generate the viseme timeline for one utterance.
///
/// Splits on whitespace, case-folds, drops characters outside `a..=z`
/// (silently — they are not errors), and scans each word left to right
/// with two-character digraph lookup before single characters. Each word
/// is followed by a silence event whose duration is fixed by the word's
/// trailing punctuation class.
pub fn generate(text: &str, config: &TimelineConfig) -> VisemeSequence {
    let mut events = Vec::new();
    let mut clock = 0.0f32;

    for (word_index, token) in text.split_whitespace().enumerate() {
        let emphasis = if word_index == 0 {
            FIRST_WORD_EMPHASIS
        } else {
            1.0
        };

        let chars: Vec<char> = token
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_lowercase())
            .collect();

        let mut i = 0;
        while i < chars.len() {
            let Some(unit) = match_unit(&chars, i) else {
                i += 1;
                continue;
            };

            let mut duration = config.base_duration
                * if unit.vowel {
                    VOWEL_DURATION
                } else {
                    CONSONANT_DURATION
                };
            let next = chars.get(i + unit.advance);
            if unit.vowel && matches!(next, Some(&c) if !is_vowel_letter(c)) {
                duration *= STRESS_MULTIPLIER;
            }

            let base_intensity = if unit.vowel {
                VOWEL_INTENSITY
            } else {
                CONSONANT_INTENSITY
            };
            let intensity = (base_intensity * emphasis).min(1.0);

            events.push(VisemeEvent {
                viseme: unit.viseme,
                time: clock,
                duration,
                intensity,
            });
            clock += duration;
            i += unit.advance;
        }

        let pause = PauseClass::of_token(token).duration();
        events.push(VisemeEvent {
            viseme: Viseme::Sil,
            time: clock,
            duration: pause,
            intensity: 0.0,
        });
        clock += pause;
    }

    VisemeSequence {
        events,
        total_duration: clock,
    }
}
