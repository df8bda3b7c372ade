//! Chord identification from sets of sounding notes.
//!
//! Given the MIDI note numbers currently sounding, the engine picks a root
//! and a chord quality from an ordered template catalog and returns a
//! human-readable label with a confidence score.
//!
//! # Example
//!
//! ```
//! use chord_engine::classify;
//!
//! let chord = classify(&[60, 64, 67]).unwrap();
//! assert_eq!(chord.name, "C Major");
//! assert_eq!(chord.root, "C");
//!
//! // G in the bass: the triad is read as C over G
//! let chord = classify(&[55, 60, 64]).unwrap();
//! assert_eq!(chord.name, "C Major/G");
//!
//! // Two notes a third apart are not a chord
//! assert!(classify(&[60, 64]).is_none());
//! ```
//!
//! Classification is a pure function of its input; a [`ChordDetector`] holds
//! only immutable settings and can be shared freely between threads.

pub mod chord_templates;
pub mod chords;
pub mod detect;
pub mod held;
pub mod notes;
pub mod types;

pub use chord_templates::{score_template, template_for, templates, ChordTemplate, IntervalSet, QualityFamily};
pub use chords::{extract_chords, TimedNote};
pub use detect::{classify, ChordDetector, Thresholds};
pub use held::HeldNotes;
pub use notes::{note_name, parse_note, NoteSet, Spelling};
pub use types::{ChordEvent, ChordQuality, DetectionResult};

/// Errors from note parsing and detector configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("note number {0} is outside the MIDI range 0-127")]
    NoteOutOfRange(i32),

    #[error("invalid note name: {0:?}")]
    InvalidNoteName(String),

    #[error("note set is empty")]
    EmptyNoteSet,

    #[error("invalid threshold {name}: {message}")]
    InvalidThreshold { name: &'static str, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
