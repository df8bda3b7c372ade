//! Tracks which notes are currently held from a stream of note-on/off events.

use std::collections::BTreeMap;

use tracing::trace;

use crate::detect::ChordDetector;
use crate::notes::MAX_NOTE;
use crate::types::DetectionResult;

/// Currently sounding notes.
///
/// Repeated note-ons of the same key stack, so each needs its own note-off
/// before the key is released.
#[derive(Debug, Clone, Default)]
pub struct HeldNotes {
    /// note number -> outstanding note-on count
    held: BTreeMap<u8, u32>,
}

impl HeldNotes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a note-on. Velocity 0 is treated as a note-off.
    pub fn note_on(&mut self, note: u8, velocity: u8) {
        if note > MAX_NOTE {
            return;
        }
        if velocity == 0 {
            self.note_off(note);
            return;
        }
        *self.held.entry(note).or_insert(0) += 1;
        trace!(note, velocity, "note on");
    }

    pub fn note_off(&mut self, note: u8) {
        if let Some(count) = self.held.get_mut(&note) {
            *count -= 1;
            if *count == 0 {
                self.held.remove(&note);
            }
            trace!(note, "note off");
        }
    }

    /// Release everything (e.g. on All Notes Off).
    pub fn clear(&mut self) {
        self.held.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Held note numbers, ascending.
    pub fn sounding(&self) -> Vec<u8> {
        self.held.keys().copied().collect()
    }

    pub fn classify(&self, detector: &ChordDetector) -> Option<DetectionResult> {
        detector.classify(&self.sounding())
    }
}
