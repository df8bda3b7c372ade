use serde::{Deserialize, Serialize};

use crate::detect::ChordDetector;
use crate::types::ChordEvent;

/// A single note with absolute tick timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedNote {
    pub onset_tick: u64,
    pub offset_tick: u64,
    pub pitch: u8,
    pub velocity: u8,
    pub channel: u8,
    pub track_index: usize,
}

impl TimedNote {
    pub fn duration_ticks(&self) -> u64 {
        self.offset_tick.saturating_sub(self.onset_tick)
    }

    fn sounding_at(&self, tick: u64) -> bool {
        self.onset_tick <= tick && tick < self.offset_tick
    }
}

/// Extract chord changes at each beat position.
///
/// Walks beat-by-beat through the timeline, collects every note sounding at
/// each beat boundary, and classifies it. Consecutive identical chords are
/// deduplicated; beats without a chord are skipped.
pub fn extract_chords(
    notes: &[TimedNote],
    ppq: u16,
    total_ticks: u64,
    detector: &ChordDetector,
) -> Vec<ChordEvent> {
    if notes.is_empty() || ppq == 0 {
        return Vec::new();
    }

    let ppq = ppq as u64;
    let mut chords = Vec::new();
    let mut prev_name: Option<String> = None;

    let mut beat: u64 = 0;
    while beat * ppq < total_ticks {
        let beat_tick = beat * ppq;

        let sounding: Vec<u8> = notes
            .iter()
            .filter(|n| n.sounding_at(beat_tick))
            .map(|n| n.pitch)
            .collect();

        if let Some(chord) = detector.classify(&sounding) {
            if prev_name.as_ref() != Some(&chord.name) {
                prev_name = Some(chord.name.clone());
                chords.push(ChordEvent {
                    beat: beat as f64,
                    chord,
                });
            }
        }

        beat += 1;
    }

    chords
}
