//! Standard MIDI File loading.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use chord_engine::TimedNote;
use midly::{MidiMessage, Smf, TrackEventKind};
use tracing::debug;

/// General MIDI percussion channel (channel 10, zero-based 9).
const DRUM_CHANNEL: u8 = 9;

/// Pitched notes from every track plus the file's timing.
#[derive(Debug, Clone)]
pub struct MidiNotes {
    pub notes: Vec<TimedNote>,
    pub ppq: u16,
    pub total_ticks: u64,
}

/// Parse SMF bytes and collect every pitched note with absolute tick timing.
pub fn read_notes(bytes: &[u8]) -> Result<MidiNotes> {
    let smf = Smf::parse(bytes).map_err(|e| anyhow!("MIDI parse error: {}", e))?;

    let ppq = match smf.header.timing {
        midly::Timing::Metrical(ticks) => ticks.as_int(),
        midly::Timing::Timecode(_, _) => 480,
    };

    let mut notes = Vec::new();
    let mut total_ticks: u64 = 0;

    for (track_index, track) in smf.tracks.iter().enumerate() {
        let mut current_tick: u64 = 0;
        // (channel, pitch) -> stack of (onset_tick, velocity)
        let mut pending: HashMap<(u8, u8), Vec<(u64, u8)>> = HashMap::new();

        for event in track {
            current_tick += event.delta.as_int() as u64;
            total_ticks = total_ticks.max(current_tick);

            let TrackEventKind::Midi { channel, message } = event.kind else {
                continue;
            };
            let ch = channel.as_int();
            if ch == DRUM_CHANNEL {
                continue;
            }

            match message {
                MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                    pending
                        .entry((ch, key.as_int()))
                        .or_default()
                        .push((current_tick, vel.as_int()));
                }
                // vel=0 NoteOn is NoteOff
                MidiMessage::NoteOff { key, .. } | MidiMessage::NoteOn { key, .. } => {
                    let key = (ch, key.as_int());
                    if let Some((onset, velocity)) = pending.get_mut(&key).and_then(|s| s.pop()) {
                        notes.push(TimedNote {
                            onset_tick: onset,
                            offset_tick: current_tick,
                            pitch: key.1,
                            velocity,
                            channel: ch,
                            track_index,
                        });
                    }
                }
                _ => {}
            }
        }

        // Close any unterminated notes at the track's final tick
        for ((ch, pitch), stack) in pending {
            for (onset, velocity) in stack {
                notes.push(TimedNote {
                    onset_tick: onset,
                    offset_tick: current_tick,
                    pitch,
                    velocity,
                    channel: ch,
                    track_index,
                });
            }
        }
    }

    notes.sort_by_key(|n| (n.onset_tick, n.pitch));
    debug!(notes = notes.len(), ppq, total_ticks, "read MIDI file");

    Ok(MidiNotes {
        notes,
        ppq,
        total_ticks,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Build a format-0 SMF at 480 PPQ from raw track event bytes.
    pub(crate) fn smf_bytes(track: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"MThd");
        bytes.extend_from_slice(&6u32.to_be_bytes());
        bytes.extend_from_slice(&[0, 0, 0, 1, 0x01, 0xE0]);
        bytes.extend_from_slice(b"MTrk");
        bytes.extend_from_slice(&(track.len() as u32 + 4).to_be_bytes());
        bytes.extend_from_slice(track);
        bytes.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
        bytes
    }

    #[test]
    fn reads_notes_and_timing() {
        let bytes = smf_bytes(&[
            0x00, 0x90, 60, 80, // C on
            0x00, 0x90, 64, 80, // E on
            0x83, 0x60, 0x80, 60, 64, // C off at 480
            0x00, 0x90, 64, 0, // E off (vel 0)
        ]);
        let midi = read_notes(&bytes).unwrap();

        assert_eq!(midi.ppq, 480);
        assert_eq!(midi.total_ticks, 480);
        let spans: Vec<_> = midi
            .notes
            .iter()
            .map(|n| (n.pitch, n.onset_tick, n.offset_tick))
            .collect();
        assert_eq!(spans, vec![(60, 0, 480), (64, 0, 480)]);
    }

    #[test]
    fn drums_are_skipped() {
        let bytes = smf_bytes(&[
            0x00, 0x99, 36, 100, // kick on channel 10
            0x00, 0x90, 60, 80,
            0x83, 0x60, 0x89, 36, 0, 0x00, 0x80, 60, 0,
        ]);
        let midi = read_notes(&bytes).unwrap();
        assert_eq!(midi.notes.len(), 1);
        assert_eq!(midi.notes[0].pitch, 60);
    }

    #[test]
    fn unterminated_notes_close_at_track_end() {
        let bytes = smf_bytes(&[0x00, 0x90, 60, 80, 0x83, 0x60, 0x90, 64, 80]);
        let midi = read_notes(&bytes).unwrap();
        let offsets: Vec<_> = midi.notes.iter().map(|n| n.offset_tick).collect();
        assert_eq!(offsets, vec![480, 480]);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(read_notes(b"not a midi file").is_err());
    }
}
