//! CLI command implementations

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use chord_engine::{
    extract_chords, parse_note, templates, ChordDetector, DetectionResult, HeldNotes, NoteSet,
    QualityFamily,
};
use chordconf::{ChordConfig, ConfigSources};
use serde::Serialize;
use tracing::{info, warn};

use crate::midi_file;

/// Velocity used for `on <note>` lines that omit one.
const DEFAULT_VELOCITY: u8 = 100;

/// Classify one note set given as numbers or names.
pub fn notes(
    out: &mut impl Write,
    detector: &ChordDetector,
    inputs: &[String],
    json: bool,
) -> Result<()> {
    let numbers = inputs
        .iter()
        .map(|s| parse_note(s).with_context(|| format!("Invalid note '{}'", s)))
        .collect::<Result<Vec<u8>>>()?;
    let set = NoteSet::new(&numbers)?;
    let result = detector.classify_set(&set);

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?;
        return Ok(());
    }

    match result {
        Some(chord) => {
            writeln!(out, "{}", summary(&chord))?;
            writeln!(out, "  root:  {}", chord.root)?;
            writeln!(out, "  bass:  {}", chord.bass)?;
            writeln!(out, "  notes: {}", chord.notes.join(" "))?;
        }
        None => writeln!(out, "no chord")?,
    }
    Ok(())
}

/// Print the chord timeline of a Standard MIDI File.
pub fn file(out: &mut impl Write, detector: &ChordDetector, path: &Path, json: bool) -> Result<()> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let midi = midi_file::read_notes(&bytes)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    info!(path = %path.display(), notes = midi.notes.len(), "analyzing file");

    let events = extract_chords(&midi.notes, midi.ppq, midi.total_ticks, detector);

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&events)?)?;
        return Ok(());
    }

    if events.is_empty() {
        writeln!(out, "no chords")?;
    }
    for event in &events {
        writeln!(out, "beat {:>4}: {}", event.beat, summary(&event.chord))?;
    }
    Ok(())
}

/// One line of live input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveCommand {
    On { note: u8, velocity: u8 },
    Off { note: u8 },
    Clear,
}

impl std::str::FromStr for LiveCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default().to_ascii_lowercase();

        let parsed = match command.as_str() {
            "on" => {
                let note = parse_note(words.next().context("'on' needs a note")?)?;
                let velocity = match words.next() {
                    Some(v) => v
                        .parse::<u8>()
                        .ok()
                        .filter(|v| *v <= 127)
                        .with_context(|| format!("Invalid velocity '{}'", v))?,
                    None => DEFAULT_VELOCITY,
                };
                LiveCommand::On { note, velocity }
            }
            "off" => LiveCommand::Off {
                note: parse_note(words.next().context("'off' needs a note")?)?,
            },
            "clear" => LiveCommand::Clear,
            other => bail!("Unknown command '{}' (expected on, off or clear)", other),
        };

        if let Some(extra) = words.next() {
            bail!("Unexpected '{}' after {}", extra, command);
        }
        Ok(parsed)
    }
}

/// Follow note events from `input` and print the chord whenever it changes.
pub fn live(
    input: impl BufRead,
    out: &mut impl Write,
    detector: &ChordDetector,
    json: bool,
) -> Result<()> {
    let mut held = HeldNotes::new();
    let mut current: Option<String> = None;

    for (line_no, line) in input.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match line.parse::<LiveCommand>() {
            Ok(LiveCommand::On { note, velocity }) => held.note_on(note, velocity),
            Ok(LiveCommand::Off { note }) => held.note_off(note),
            Ok(LiveCommand::Clear) => held.clear(),
            Err(e) => {
                warn!(line = line_no + 1, "skipping input: {:#}", e);
                continue;
            }
        }

        let chord = held.classify(detector);
        let name = chord.as_ref().map(|c| c.name.clone());
        if name == current {
            continue;
        }
        current = name;

        if json {
            writeln!(out, "{}", serde_json::to_string(&chord)?)?;
        } else {
            match &chord {
                Some(chord) => writeln!(out, "{}", summary(chord))?,
                None => writeln!(out, "no chord")?,
            }
        }
        out.flush()?;
    }
    Ok(())
}

#[derive(Serialize)]
struct CatalogEntry {
    quality: chord_engine::ChordQuality,
    name: &'static str,
    family: QualityFamily,
    required: Vec<u8>,
    optional: Vec<u8>,
    base_confidence: f64,
}

/// List chord templates in precedence order.
pub fn catalog(out: &mut impl Write, json: bool) -> Result<()> {
    let entries: Vec<CatalogEntry> = templates()
        .iter()
        .map(|t| CatalogEntry {
            quality: t.quality,
            name: t.quality.name(),
            family: t.family,
            required: t.required.iter().collect(),
            optional: t.optional.iter().collect(),
            base_confidence: t.base_confidence,
        })
        .collect();

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?;
        return Ok(());
    }

    for e in &entries {
        let optional = if e.optional.is_empty() {
            String::new()
        } else {
            format!(" optional {:?}", e.optional)
        };
        writeln!(
            out,
            "{:<11} {:<16} {:.2}  required {:?}{}",
            e.name,
            format!("{:?}", e.family),
            e.base_confidence,
            e.required,
            optional
        )?;
    }
    Ok(())
}

/// Print the effective configuration and where it came from.
pub fn config(
    out: &mut impl Write,
    config: &ChordConfig,
    sources: &ConfigSources,
    json: bool,
) -> Result<()> {
    if json {
        let value = serde_json::json!({
            "config": config,
            "files": sources.files,
            "env_overrides": sources.env_overrides,
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
        return Ok(());
    }

    write!(out, "{}", config.to_toml())?;
    writeln!(out)?;
    if sources.files.is_empty() {
        writeln!(out, "# no config files loaded")?;
    }
    for path in &sources.files {
        writeln!(out, "# file: {}", path.display())?;
    }
    for var in &sources.env_overrides {
        writeln!(out, "# env: {}", var)?;
    }
    Ok(())
}

fn summary(chord: &DetectionResult) -> String {
    format!("{} ({:.2})", chord.name, chord.confidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chord_engine::Spelling;
    use pretty_assertions::assert_eq;

    fn run_notes(inputs: &[&str], json: bool) -> String {
        let inputs: Vec<String> = inputs.iter().map(|s| s.to_string()).collect();
        let mut out = Vec::new();
        notes(&mut out, &ChordDetector::default(), &inputs, json).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn notes_text_output() {
        let out = run_notes(&["60", "64", "67"], false);
        assert_eq!(
            out,
            "C Major (0.85)\n  root:  C\n  bass:  C\n  notes: C E G\n"
        );
    }

    #[test]
    fn notes_accepts_names() {
        let out = run_notes(&["G3", "C4", "E4"], false);
        assert!(out.starts_with("C Major/G"), "{}", out);
    }

    #[test]
    fn notes_without_chord() {
        assert_eq!(run_notes(&["60", "64"], false), "no chord\n");
        assert_eq!(run_notes(&["60", "64"], true), "null\n");
    }

    #[test]
    fn notes_json_is_a_detection_result() {
        let out = run_notes(&["57", "60", "64"], true);
        let parsed: DetectionResult = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.name, "A Minor");
    }

    #[test]
    fn notes_rejects_bad_input() {
        let mut out = Vec::new();
        let detector = ChordDetector::default();
        assert!(notes(&mut out, &detector, &["H4".to_string()], false).is_err());
        assert!(notes(&mut out, &detector, &["200".to_string()], false).is_err());
    }

    #[test]
    fn parses_live_commands() {
        assert_eq!(
            "on 60".parse::<LiveCommand>().unwrap(),
            LiveCommand::On { note: 60, velocity: DEFAULT_VELOCITY }
        );
        assert_eq!(
            "ON E4 64".parse::<LiveCommand>().unwrap(),
            LiveCommand::On { note: 64, velocity: 64 }
        );
        assert_eq!("off 60".parse::<LiveCommand>().unwrap(), LiveCommand::Off { note: 60 });
        assert_eq!("clear".parse::<LiveCommand>().unwrap(), LiveCommand::Clear);

        assert!("on".parse::<LiveCommand>().is_err());
        assert!("on 60 200".parse::<LiveCommand>().is_err());
        assert!("on 60 90 extra".parse::<LiveCommand>().is_err());
        assert!("play 60".parse::<LiveCommand>().is_err());
    }

    #[test]
    fn live_prints_on_change() {
        let input = "on 60\non 64\non 67\non 72\noff 64\nbogus\nclear\n";
        let mut out = Vec::new();
        live(input.as_bytes(), &mut out, &ChordDetector::default(), false).unwrap();

        // C+E gives no chord, same as the empty start, so nothing prints until G.
        // Doubling C and the bogus line change nothing.
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "C Major (0.85)\nC5 (0.80)\nno chord\n"
        );
    }

    #[test]
    fn live_velocity_zero_releases() {
        let input = "on 55\non 62\non 62 0\n";
        let mut out = Vec::new();
        live(input.as_bytes(), &mut out, &ChordDetector::default(), true).unwrap();
        let lines: Vec<&str> = std::str::from_utf8(&out).unwrap().lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"G5\""));
        assert_eq!(lines[1], "null");
    }

    #[test]
    fn live_uses_spelling() {
        let detector = ChordDetector::default().with_spelling(Spelling::Flats);
        let mut out = Vec::new();
        live("on 61\non 65\non 68\n".as_bytes(), &mut out, &detector, false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Db Major (0.85)\n");
    }

    #[test]
    fn catalog_lists_every_template() {
        let mut out = Vec::new();
        catalog(&mut out, false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), templates().len());
        assert!(text.lines().next().unwrap().starts_with("7sus4"));

        let mut out = Vec::new();
        catalog(&mut out, true).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let major = value
            .as_array()
            .unwrap()
            .iter()
            .find(|e| e["name"] == "Major")
            .unwrap();
        assert_eq!(major["required"], serde_json::json!([4, 7]));
        assert_eq!(major["family"], "triad");
    }

    #[test]
    fn file_timeline() {
        let bytes = midi_file::tests::smf_bytes(&[
            0x00, 0x90, 48, 80, 0x00, 0x90, 52, 80, 0x00, 0x90, 55, 80,
            0x87, 0x40, 0x80, 48, 0, 0x00, 0x80, 52, 0, 0x00, 0x80, 55, 0,
        ]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.mid");
        std::fs::write(&path, bytes).unwrap();

        let mut out = Vec::new();
        file(&mut out, &ChordDetector::default(), &path, false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "beat    0: C Major (0.85)\n");
    }

    #[test]
    fn config_lists_sources() {
        let sources = ConfigSources {
            files: vec!["/tmp/chordid.toml".into()],
            env_overrides: vec!["CHORDID_SPELLING".to_string()],
        };
        let mut out = Vec::new();
        config(&mut out, &ChordConfig::default(), &sources, false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[detection]"));
        assert!(text.contains("# file: /tmp/chordid.toml"));
        assert!(text.contains("# env: CHORDID_SPELLING"));
    }
}
