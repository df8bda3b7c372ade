use serde::{Deserialize, Serialize};

/// Every chord quality the catalog can recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordQuality {
    Power,
    Major,
    Minor,
    Augmented,
    Diminished,
    Suspended2,
    Suspended4,
    Suspended2Suspended4,
    Dominant7Suspended4,
    Dominant7Suspended2,
    Major6,
    Minor6,
    SixNine,
    MinorSixNine,
    Add9,
    MinorAdd9,
    Add11,
    Major7,
    Dominant7,
    Minor7,
    MinorMajor7,
    Diminished7,
    HalfDiminished7,
    Dominant7Flat5,
    Dominant7Sharp5,
    Dominant7Flat9,
    Dominant7Sharp9,
    Dominant7Sharp11,
    Dominant7Flat13,
    Dominant7Flat9Flat13,
    Dominant7Flat9Sharp11,
    Dominant7Sharp9Flat13,
    Dominant9,
    Minor9,
    Major9,
    Dominant11,
    Minor11,
    Major11,
    Dominant13,
    Minor13,
    Major13,
    Major13Sharp11,
}

impl ChordQuality {
    /// Quality name as it appears in a chord label: "Major", "m7", "7♯11".
    pub fn name(&self) -> &'static str {
        match self {
            ChordQuality::Power => "5",
            ChordQuality::Major => "Major",
            ChordQuality::Minor => "Minor",
            ChordQuality::Augmented => "Aug",
            ChordQuality::Diminished => "Dim",
            ChordQuality::Suspended2 => "sus2",
            ChordQuality::Suspended4 => "sus4",
            ChordQuality::Suspended2Suspended4 => "sus2sus4",
            ChordQuality::Dominant7Suspended4 => "7sus4",
            ChordQuality::Dominant7Suspended2 => "7sus2",
            ChordQuality::Major6 => "6",
            ChordQuality::Minor6 => "m6",
            ChordQuality::SixNine => "6/9",
            ChordQuality::MinorSixNine => "m6/9",
            ChordQuality::Add9 => "add9",
            ChordQuality::MinorAdd9 => "madd9",
            ChordQuality::Add11 => "add11",
            ChordQuality::Major7 => "maj7",
            ChordQuality::Dominant7 => "7",
            ChordQuality::Minor7 => "m7",
            ChordQuality::MinorMajor7 => "mMaj7",
            ChordQuality::Diminished7 => "dim7",
            ChordQuality::HalfDiminished7 => "m7♭5",
            ChordQuality::Dominant7Flat5 => "7♭5",
            ChordQuality::Dominant7Sharp5 => "7♯5",
            ChordQuality::Dominant7Flat9 => "7♭9",
            ChordQuality::Dominant7Sharp9 => "7♯9",
            ChordQuality::Dominant7Sharp11 => "7♯11",
            ChordQuality::Dominant7Flat13 => "7♭13",
            ChordQuality::Dominant7Flat9Flat13 => "7(♭9,♭13)",
            ChordQuality::Dominant7Flat9Sharp11 => "7(♭9,♯11)",
            ChordQuality::Dominant7Sharp9Flat13 => "7(♯9,♭13)",
            ChordQuality::Dominant9 => "9",
            ChordQuality::Minor9 => "m9",
            ChordQuality::Major9 => "maj9",
            ChordQuality::Dominant11 => "11",
            ChordQuality::Minor11 => "m11",
            ChordQuality::Major11 => "maj11",
            ChordQuality::Dominant13 => "13",
            ChordQuality::Minor13 => "m13",
            ChordQuality::Major13 => "maj13",
            ChordQuality::Major13Sharp11 => "maj13♯11",
        }
    }

    /// Suffix appended to the root name when building a chord label.
    ///
    /// The power chord attaches directly ("C5"); every other quality is
    /// separated from the root by a space ("C Major", "C m7").
    pub fn suffix(&self) -> String {
        match self {
            ChordQuality::Power => self.name().to_string(),
            _ => format!(" {}", self.name()),
        }
    }
}

impl std::fmt::Display for ChordQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of classifying one note set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Full chord label: "C Major", "G 7", "C Major/G", "D5"
    pub name: String,
    /// Root note name: "C", "F#", "Bb"
    pub root: String,
    pub root_pitch_class: u8,
    /// Name of the lowest sounding pitch class
    pub bass: String,
    pub bass_pitch_class: u8,
    pub quality: ChordQuality,
    /// Names of every pitch class present, ordered by pitch class
    pub notes: Vec<String>,
    /// 0.0–1.0
    pub confidence: f64,
}

impl DetectionResult {
    /// True when the chord was read with a root other than the bass note.
    pub fn is_inversion(&self) -> bool {
        self.root_pitch_class != self.bass_pitch_class
    }
}

/// A chord change on a beat timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordEvent {
    /// Beat position where this chord begins
    pub beat: f64,
    pub chord: DetectionResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triads_are_spaced() {
        assert_eq!(ChordQuality::Major.suffix(), " Major");
        assert_eq!(ChordQuality::Diminished.suffix(), " Dim");
        assert_eq!(ChordQuality::Augmented.suffix(), " Aug");
    }

    #[test]
    fn power_chord_is_not_spaced() {
        assert_eq!(ChordQuality::Power.suffix(), "5");
    }

    #[test]
    fn extensions_are_spaced() {
        assert_eq!(ChordQuality::Dominant7.suffix(), " 7");
        assert_eq!(ChordQuality::Dominant7Flat9Sharp11.suffix(), " 7(♭9,♯11)");
    }

    #[test]
    fn quality_serializes_snake_case() {
        let json = serde_json::to_string(&ChordQuality::HalfDiminished7).unwrap();
        assert_eq!(json, "\"half_diminished7\"");
    }
}
