//! Note numbers, pitch classes and their names.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Error, Result};

/// Highest valid MIDI note number.
pub const MAX_NOTE: u8 = 127;

const NOTE_NAMES_SHARP: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const NOTE_NAMES_FLAT: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// How black-key pitch classes are spelled in labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Spelling {
    #[default]
    Sharps,
    Flats,
}

impl std::str::FromStr for Spelling {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sharps" | "sharp" => Ok(Spelling::Sharps),
            "flats" | "flat" => Ok(Spelling::Flats),
            other => Err(format!("unknown spelling {:?} (expected sharps or flats)", other)),
        }
    }
}

impl std::fmt::Display for Spelling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Spelling::Sharps => write!(f, "sharps"),
            Spelling::Flats => write!(f, "flats"),
        }
    }
}

pub fn pitch_class(note: u8) -> u8 {
    note % 12
}

pub fn note_name(pitch_class: u8, spelling: Spelling) -> &'static str {
    let idx = (pitch_class % 12) as usize;
    match spelling {
        Spelling::Sharps => NOTE_NAMES_SHARP[idx],
        Spelling::Flats => NOTE_NAMES_FLAT[idx],
    }
}

/// Parse a MIDI note number ("60") or a scientific pitch name ("C4", "Eb3", "F#-1").
///
/// C4 is middle C (60). A name without an octave is taken to be in octave 4.
pub fn parse_note(input: &str) -> Result<u8> {
    let s = input.trim();
    if s.is_empty() {
        return Err(Error::InvalidNoteName(input.to_string()));
    }

    if s.chars().all(|c| c.is_ascii_digit() || c == '-') {
        let n: i32 = s
            .parse()
            .map_err(|_| Error::InvalidNoteName(input.to_string()))?;
        return to_note_number(n);
    }

    let mut chars = s.chars().peekable();
    let letter = chars
        .next()
        .ok_or_else(|| Error::InvalidNoteName(input.to_string()))?;
    let base: i32 = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return Err(Error::InvalidNoteName(input.to_string())),
    };

    let mut accidental = 0i32;
    while let Some(&c) = chars.peek() {
        match c {
            '#' | '♯' => accidental += 1,
            'b' | '♭' => accidental -= 1,
            _ => break,
        }
        chars.next();
    }

    let rest: String = chars.collect();
    let octave: i32 = if rest.is_empty() {
        4
    } else {
        rest.parse()
            .map_err(|_| Error::InvalidNoteName(input.to_string()))?
    };

    let n = octave
        .checked_add(1)
        .and_then(|o| o.checked_mul(12))
        .and_then(|n| n.checked_add(base + accidental))
        .ok_or_else(|| Error::InvalidNoteName(input.to_string()))?;
    to_note_number(n)
}

fn to_note_number(n: i32) -> Result<u8> {
    if (0..=MAX_NOTE as i32).contains(&n) {
        Ok(n as u8)
    } else {
        Err(Error::NoteOutOfRange(n))
    }
}

/// A validated, non-empty set of simultaneously sounding notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteSet {
    /// Ascending, deduplicated note numbers.
    notes: Vec<u8>,
}

impl NoteSet {
    /// Strict constructor: rejects empty input and notes above 127.
    pub fn new(notes: &[u8]) -> Result<Self> {
        if let Some(&bad) = notes.iter().find(|&&n| n > MAX_NOTE) {
            return Err(Error::NoteOutOfRange(bad as i32));
        }
        Self::from_valid(notes.to_vec()).ok_or(Error::EmptyNoteSet)
    }

    /// Lenient constructor: drops notes above 127, returns `None` if nothing is left.
    pub fn lenient(notes: &[u8]) -> Option<Self> {
        let valid: Vec<u8> = notes
            .iter()
            .copied()
            .filter(|&n| {
                if n > MAX_NOTE {
                    warn!(note = n, "dropping out-of-range note number");
                    false
                } else {
                    true
                }
            })
            .collect();
        Self::from_valid(valid)
    }

    fn from_valid(mut notes: Vec<u8>) -> Option<Self> {
        if notes.is_empty() {
            return None;
        }
        notes.sort_unstable();
        notes.dedup();
        Some(Self { notes })
    }

    pub fn notes(&self) -> &[u8] {
        &self.notes
    }

    /// The lowest sounding note.
    pub fn bass(&self) -> u8 {
        self.notes[0]
    }

    pub fn bass_pitch_class(&self) -> u8 {
        pitch_class(self.bass())
    }

    /// Distinct pitch classes, ascending.
    pub fn pitch_classes(&self) -> Vec<u8> {
        let mut pcs = [false; 12];
        for &n in &self.notes {
            pcs[pitch_class(n) as usize] = true;
        }
        (0..12u8).filter(|&i| pcs[i as usize]).collect()
    }
}
