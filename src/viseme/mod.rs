//! Viseme data model for lip-sync animation.
//!
//! A viseme is a visually distinct mouth shape corresponding to one or more
//! phonemes. The closed 15-symbol set (silence plus the 14 Oculus
//! articulatory classes) is the shared contract across every producer and
//! consumer in the engine: the timeline generator, the per-word expander,
//! the mode controller, and the rig binding all agree on exactly this set.

pub mod timeline;
pub mod word;

/// Oculus viseme IDs (standard for lip-sync).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Viseme {
    /// Silence (default mouth closed)
    Sil = 0,
    /// /p/, /b/, /m/ (lips pressed together)
    PP = 1,
    /// /f/, /v/ (teeth on lip)
    FF = 2,
    /// /θ/, /ð/ (tongue between teeth)
    TH = 3,
    /// /t/, /d/, /l/ (tongue at roof)
    DD = 4,
    /// /k/, /g/, /ŋ/ (back of tongue up)
    KK = 5,
    /// /tʃ/, /dʒ/, /ʃ/, /ʒ/ (tongue curved)
    CH = 6,
    /// /s/, /z/ (teeth together, tongue forward)
    SS = 7,
    /// /n/, /nj/ (tongue at roof)
    NN = 8,
    /// /r/ (tongue curled)
    RR = 9,
    /// /a/ (mouth open wide)
    AA = 10,
    /// /e/ (mouth medium)
    E = 11,
    /// /i/ (mouth wide, teeth apart)
    I = 12,
    /// /o/ (rounded, medium)
    O = 13,
    /// /u/ (rounded, small)
    U = 14,
}

/// All 15 visemes, in ID order.
pub const ALL_VISEMES: [Viseme; 15] = [
    Viseme::Sil,
    Viseme::PP,
    Viseme::FF,
    Viseme::TH,
    Viseme::DD,
    Viseme::KK,
    Viseme::CH,
    Viseme::SS,
    Viseme::NN,
    Viseme::RR,
    Viseme::AA,
    Viseme::E,
    Viseme::I,
    Viseme::O,
    Viseme::U,
];

/// One timed mouth-shape event on an utterance timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisemeEvent {
    /// Mouth shape for this event.
    pub viseme: Viseme,
    /// Start time in seconds from utterance start.
    pub time: f32,
    /// Duration in seconds.
    pub duration: f32,
    /// Peak activation weight in [0, 1].
    pub intensity: f32,
}

/// An ordered, contiguous sequence of viseme events for one utterance.
///
/// Created once per utterance and never mutated; discarded at utterance end
/// or cancellation. Invariants: events are contiguous and non-overlapping
/// (`events[i+1].time == events[i].time + events[i].duration`) and
/// `total_duration` equals the sum of event durations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VisemeSequence {
    /// Events in timeline order.
    pub events: Vec<VisemeEvent>,
    /// Running clock after the last event, in seconds.
    pub total_duration: f32,
}

/// Tolerance for contiguity/duration checks on externally supplied
/// sequences. f32 accumulation over a long utterance drifts slightly.
const SEQUENCE_EPSILON: f32 = 1e-3;

impl VisemeSequence {
    /// Whether this sequence satisfies the timeline invariants and is
    /// usable for playback.
    ///
    /// Externally supplied sequences that fail this check are treated as
    /// unavailable (the controller routes to realtime/fallback instead of
    /// failing the utterance).
    pub fn is_valid(&self) -> bool {
        if self.events.is_empty() {
            return false;
        }
        let mut clock = 0.0f32;
        for event in &self.events {
            if !event.time.is_finite() || !event.duration.is_finite() {
                return false;
            }
            if event.duration <= 0.0 {
                return false;
            }
            if !(0.0..=1.0).contains(&event.intensity) {
                return false;
            }
            if (event.time - clock).abs() > SEQUENCE_EPSILON {
                return false;
            }
            clock += event.duration;
        }
        (self.total_duration - clock).abs() <= SEQUENCE_EPSILON
    }

    /// Index of the event active at `t` seconds, if any.
    pub fn event_at(&self, t: f32) -> Option<usize> {
        if t < 0.0 {
            return None;
        }
        self.events
            .iter()
            .position(|e| t >= e.time && t < e.time + e.duration)
    }
}

// ── Letter classification ───────────────────────────────────────────────

/// Digraphs checked before single characters (longest match wins).
///
/// Consonant clusters that form one mouth shape, plus the two long-vowel
/// pairs that read as a single rounded/spread shape.
const DIGRAPHS: &[(&str, Viseme)] = &[
    ("th", Viseme::TH),
    ("ch", Viseme::CH),
    ("sh", Viseme::CH),
    ("ph", Viseme::FF),
    ("ng", Viseme::KK),
    ("oo", Viseme::U),
    ("ee", Viseme::I),
];

/// Single-letter viseme lookup over the permitted alphabet `a..=z`.
///
/// Characters outside the table are dropped silently, not treated as
/// errors.
pub(crate) fn letter_viseme(c: char) -> Option<Viseme> {
    let viseme = match c {
        'a' => Viseme::AA,
        'e' => Viseme::E,
        'i' | 'y' => Viseme::I,
        'o' => Viseme::O,
        'u' | 'w' => Viseme::U,
        'b' | 'p' | 'm' => Viseme::PP,
        'f' | 'v' => Viseme::FF,
        't' | 'd' | 'l' => Viseme::DD,
        'n' => Viseme::NN,
        'k' | 'g' | 'c' | 'q' | 'h' => Viseme::KK,
        's' | 'z' | 'x' => Viseme::SS,
        'j' => Viseme::CH,
        'r' => Viseme::RR,
        _ => return None,
    };
    Some(viseme)
}

/// Vowel letters for the duration/intensity multipliers. `y` counts as a
/// vowel here: it reads as /i/ in the mouth even when linguists disagree.
pub(crate) fn is_vowel_letter(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

/// One matched scan unit: a digraph or a single letter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ScanUnit {
    pub viseme: Viseme,
    /// Whether the unit reads as a vowel (drives the duration and
    /// intensity multipliers).
    pub vowel: bool,
    /// Characters consumed (2 for a digraph, 1 otherwise).
    pub advance: usize,
}

/// Match the unit at position `i` of `chars`: two-character digraph first
/// (longest match wins), then single character. Returns `None` for a
/// character outside the permitted alphabet (caller advances by one).
pub(crate) fn match_unit(chars: &[char], i: usize) -> Option<ScanUnit> {
    if i + 1 < chars.len() {
        let pair = [chars[i], chars[i + 1]];
        for &(digraph, viseme) in DIGRAPHS {
            let mut d = digraph.chars();
            if d.next() == Some(pair[0]) && d.next() == Some(pair[1]) {
                return Some(ScanUnit {
                    viseme,
                    vowel: is_vowel_letter(chars[i]),
                    advance: 2,
                });
            }
        }
    }
    letter_viseme(chars[i]).map(|viseme| ScanUnit {
        viseme,
        vowel: is_vowel_letter(chars[i]),
        advance: 1,
    })
}
