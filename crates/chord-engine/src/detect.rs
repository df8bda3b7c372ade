//! Chord classification: picks a root and a template for a set of sounding notes.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::chord_templates::{score_template, ChordTemplate, IntervalSet, PERFECT_FIFTH, TEMPLATES};
use crate::notes::{note_name, NoteSet, Spelling};
use crate::types::{ChordQuality, DetectionResult};
use crate::{Error, Result};

/// Root-selection heuristics.
///
/// These are tuned by ear rather than derived; they bias detection toward
/// reading the bass note as the root.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Scores at or below this are not a chord.
    pub match_floor: f64,
    /// Multiplier applied to the bass-as-root score.
    pub root_position_bonus: f64,
    /// Other roots are only tried when the boosted bass score is below this.
    pub inversion_search_below: f64,
    /// An alternative root must beat the current best by this factor.
    pub inversion_ratio: f64,
    /// Two-note fifth with the bass as root.
    pub power_root_confidence: f64,
    /// Two-note fourth read as an inverted fifth.
    pub power_inverted_confidence: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            match_floor: 0.5,
            root_position_bonus: 1.1,
            inversion_search_below: 0.6,
            inversion_ratio: 1.5,
            power_root_confidence: 0.8,
            power_inverted_confidence: 0.75,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("match_floor", self.match_floor),
            ("root_position_bonus", self.root_position_bonus),
            ("inversion_search_below", self.inversion_search_below),
            ("inversion_ratio", self.inversion_ratio),
            ("power_root_confidence", self.power_root_confidence),
            ("power_inverted_confidence", self.power_inverted_confidence),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidThreshold {
                    name,
                    message: format!("must be a positive number, got {}", value),
                });
            }
        }
        if self.match_floor > 1.0 {
            return Err(Error::InvalidThreshold {
                name: "match_floor",
                message: format!("must be at most 1.0, got {}", self.match_floor),
            });
        }
        for (name, value) in [
            ("power_root_confidence", self.power_root_confidence),
            ("power_inverted_confidence", self.power_inverted_confidence),
        ] {
            if value > 1.0 {
                return Err(Error::InvalidThreshold {
                    name,
                    message: format!("confidence must be at most 1.0, got {}", value),
                });
            }
        }
        Ok(())
    }
}

/// Best template for one candidate root.
#[derive(Debug, Clone, Copy)]
struct RootMatch {
    root: u8,
    template: &'static ChordTemplate,
    /// Raw fit score of the winning template.
    score: f64,
}

/// Stateless chord classifier. Cheap to copy and safe to share between threads.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChordDetector {
    thresholds: Thresholds,
    spelling: Spelling,
}

impl ChordDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_spelling(mut self, spelling: Spelling) -> Self {
        self.spelling = spelling;
        self
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn spelling(&self) -> Spelling {
        self.spelling
    }

    /// Classify a set of sounding MIDI note numbers.
    ///
    /// Returns `None` when the notes do not support any chord reading with
    /// enough confidence. Note numbers above 127 are ignored.
    pub fn classify(&self, notes: &[u8]) -> Option<DetectionResult> {
        let set = NoteSet::lenient(notes)?;
        self.classify_set(&set)
    }

    pub fn classify_set(&self, set: &NoteSet) -> Option<DetectionResult> {
        let pitch_classes = set.pitch_classes();
        let bass = set.bass_pitch_class();

        match pitch_classes.len() {
            0 | 1 => None,
            2 => self.classify_dyad(&pitch_classes, bass),
            _ => self.classify_chord(&pitch_classes, bass),
        }
    }

    /// Two pitch classes can only be a power chord.
    fn classify_dyad(&self, pitch_classes: &[u8], bass: u8) -> Option<DetectionResult> {
        let upper = pitch_classes.iter().copied().find(|&pc| pc != bass)?;

        let candidates = [
            (bass, upper, self.thresholds.power_root_confidence),
            (upper, bass, self.thresholds.power_inverted_confidence),
        ];
        for (root, other, confidence) in candidates {
            if (other + 12 - root) % 12 == PERFECT_FIFTH {
                let root_name = note_name(root, self.spelling);
                debug!(root = root_name, confidence, "power chord");
                return Some(DetectionResult {
                    name: format!("{}{}", root_name, ChordQuality::Power.suffix()),
                    root: root_name.to_string(),
                    root_pitch_class: root,
                    bass: note_name(bass, self.spelling).to_string(),
                    bass_pitch_class: bass,
                    quality: ChordQuality::Power,
                    notes: self.note_names(pitch_classes),
                    confidence,
                });
            }
        }

        None
    }

    fn classify_chord(&self, pitch_classes: &[u8], bass: u8) -> Option<DetectionResult> {
        let t = &self.thresholds;
        let mut best: Option<RootMatch> = None;
        let mut best_score = 0.0;

        if let Some(m) = self.match_root(pitch_classes, bass) {
            if m.score > t.match_floor {
                best_score = m.score * t.root_position_bonus;
                best = Some(m);
            }
        }

        if best_score < t.inversion_search_below {
            for &root in pitch_classes.iter().filter(|&&pc| pc != bass) {
                if let Some(m) = self.match_root(pitch_classes, root) {
                    if m.score > best_score * t.inversion_ratio {
                        trace!(root, score = m.score, "alternative root accepted");
                        best_score = m.score;
                        best = Some(m);
                    }
                }
            }
        }

        let m = best?;
        debug!(
            root = m.root,
            bass,
            quality = %m.template.quality,
            score = m.score,
            "chord matched"
        );
        Some(self.build_result(m, bass, pitch_classes))
    }

    /// Score every template against one candidate root and keep the best.
    fn match_root(&self, pitch_classes: &[u8], root: u8) -> Option<RootMatch> {
        let intervals = IntervalSet::from_pitch_classes(pitch_classes, root);
        let mut best: Option<(&'static ChordTemplate, f64, f64)> = None;

        for template in TEMPLATES {
            let fit = score_template(intervals, template);
            if fit <= 0.0 {
                continue;
            }
            let adjusted = template.adjusted_score(fit, intervals);
            trace!(root, quality = %template.quality, fit, adjusted, "template scored");

            if best.map_or(true, |(_, _, best_adjusted)| adjusted > best_adjusted) {
                best = Some((template, fit, adjusted));
            }
            // Nothing later can beat a template that is exactly the chord.
            if fit >= 1.0 && template.required == intervals {
                break;
            }
        }

        match best {
            Some((template, score, adjusted)) if adjusted >= self.thresholds.match_floor => {
                Some(RootMatch {
                    root,
                    template,
                    score,
                })
            }
            _ => None,
        }
    }

    fn build_result(&self, m: RootMatch, bass: u8, pitch_classes: &[u8]) -> DetectionResult {
        let root_name = note_name(m.root, self.spelling);
        let bass_name = note_name(bass, self.spelling);

        let mut name = format!("{}{}", root_name, m.template.quality.suffix());
        if m.root != bass {
            name.push('/');
            name.push_str(bass_name);
        }

        DetectionResult {
            name,
            root: root_name.to_string(),
            root_pitch_class: m.root,
            bass: bass_name.to_string(),
            bass_pitch_class: bass,
            quality: m.template.quality,
            notes: self.note_names(pitch_classes),
            confidence: (m.template.base_confidence * m.score).clamp(0.0, 1.0),
        }
    }

    fn note_names(&self, pitch_classes: &[u8]) -> Vec<String> {
        pitch_classes
            .iter()
            .map(|&pc| note_name(pc, self.spelling).to_string())
            .collect()
    }
}

/// Classify with default thresholds and sharp spelling.
pub fn classify(notes: &[u8]) -> Option<DetectionResult> {
    ChordDetector::default().classify(notes)
}
