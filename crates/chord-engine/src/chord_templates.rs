//! The chord template catalog and per-template fit scoring.
//!
//! Templates are tried in declaration order. When two templates score the
//! same, the earlier one wins, so fuller qualities (6/9, 7sus4) sit ahead of
//! the subsets they contain (6, sus4).

use serde::{Deserialize, Serialize};

use crate::types::ChordQuality;

pub const NINTH: u8 = 2;
pub const MINOR_THIRD: u8 = 3;
pub const MAJOR_THIRD: u8 = 4;
pub const PERFECT_FIFTH: u8 = 7;
pub const MINOR_SEVENTH: u8 = 10;
pub const MAJOR_SEVENTH: u8 = 11;

/// Score multiplier when a template's perfect fifth is absent.
const MISSING_FIFTH_PENALTY: f64 = 0.95;
/// Score lost per interval the template does not account for.
const UNEXPECTED_INTERVAL_PENALTY: f64 = 0.15;
/// Weight of the completeness term in the adjusted score.
const COMPLETENESS_WEIGHT: f64 = 0.1;

/// Set of intervals above a root, as a bitmask over 0..12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IntervalSet(u16);

impl IntervalSet {
    pub const fn new(intervals: &[u8]) -> Self {
        let mut mask = 0u16;
        let mut i = 0;
        while i < intervals.len() {
            mask |= 1 << (intervals[i] % 12);
            i += 1;
        }
        Self(mask)
    }

    /// Intervals of every pitch class other than `root`, measured from `root`.
    pub fn from_pitch_classes(pitch_classes: &[u8], root: u8) -> Self {
        let mut mask = 0u16;
        for &pc in pitch_classes {
            let interval = (pc % 12 + 12 - root % 12) % 12;
            if interval != 0 {
                mask |= 1 << interval;
            }
        }
        Self(mask)
    }

    pub fn contains(&self, interval: u8) -> bool {
        interval < 12 && self.0 & (1 << interval) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn union(self, other: IntervalSet) -> IntervalSet {
        IntervalSet(self.0 | other.0)
    }

    pub fn difference(self, other: IntervalSet) -> IntervalSet {
        IntervalSet(self.0 & !other.0)
    }

    pub fn has_third(&self) -> bool {
        self.contains(MINOR_THIRD) || self.contains(MAJOR_THIRD)
    }

    pub fn has_seventh(&self) -> bool {
        self.contains(MINOR_SEVENTH) || self.contains(MAJOR_SEVENTH)
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..12u8).filter(move |&i| self.contains(i))
    }
}

/// Quality families. Exclusion rules in [`score_template`] are keyed on these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFamily {
    Power,
    Triad,
    Suspended,
    /// Sixths and added tones without a seventh.
    AddedTone,
    Seventh,
    AlteredDominant,
    /// 9ths, 11ths and 13ths, which imply a seventh.
    Extension,
}

impl QualityFamily {
    /// Families whose perfect fifth may not be left out.
    fn requires_fifth(self) -> bool {
        matches!(self, QualityFamily::Power | QualityFamily::Suspended)
    }
}

/// A chord quality's interval signature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChordTemplate {
    pub quality: ChordQuality,
    pub family: QualityFamily,
    /// Must all be present; a missing fifth is tolerated outside power/sus.
    pub required: IntervalSet,
    /// Tolerated without penalty.
    pub optional: IntervalSet,
    pub base_confidence: f64,
}

impl ChordTemplate {
    const fn new(
        quality: ChordQuality,
        family: QualityFamily,
        required: &[u8],
        optional: &[u8],
        base_confidence: f64,
    ) -> Self {
        Self {
            quality,
            family,
            required: IntervalSet::new(required),
            optional: IntervalSet::new(optional),
            base_confidence,
        }
    }

    /// Every interval this template accounts for.
    pub fn allowed(&self) -> IntervalSet {
        self.required.union(self.optional)
    }

    /// Fraction of the sounding intervals this template's required set covers.
    pub fn completeness(&self, intervals: IntervalSet) -> f64 {
        self.required.len() as f64 / intervals.len().clamp(1, 10) as f64
    }

    /// Fit score weighted toward templates that explain more of the chord.
    pub fn adjusted_score(&self, fit: f64, intervals: IntervalSet) -> f64 {
        fit * (1.0 + self.completeness(intervals) * COMPLETENESS_WEIGHT)
    }
}

use ChordQuality as Q;
use QualityFamily as F;

/// All recognized chord templates, in precedence order.
pub static TEMPLATES: &[ChordTemplate] = &[
    // Suspended sevenths before plain sus, so the seventh is not an "extra" note
    ChordTemplate::new(Q::Dominant7Suspended4, F::Suspended, &[5, 7, 10], &[2], 0.88),
    ChordTemplate::new(Q::Dominant7Suspended2, F::Suspended, &[2, 7, 10], &[], 0.86),
    // Sixths and added tones, fuller forms first
    ChordTemplate::new(Q::SixNine, F::AddedTone, &[2, 4, 7, 9], &[], 0.9),
    ChordTemplate::new(Q::MinorSixNine, F::AddedTone, &[2, 3, 7, 9], &[], 0.9),
    ChordTemplate::new(Q::Major6, F::AddedTone, &[4, 7, 9], &[], 0.88),
    ChordTemplate::new(Q::Minor6, F::AddedTone, &[3, 7, 9], &[], 0.88),
    ChordTemplate::new(Q::Add9, F::AddedTone, &[2, 4, 7], &[], 0.88),
    ChordTemplate::new(Q::MinorAdd9, F::AddedTone, &[2, 3, 7], &[], 0.88),
    ChordTemplate::new(Q::Add11, F::AddedTone, &[4, 5, 7], &[], 0.85),
    // Upper extensions, widest first
    ChordTemplate::new(Q::Major13Sharp11, F::Extension, &[4, 6, 7, 9, 11], &[2], 0.9),
    ChordTemplate::new(Q::Major13, F::Extension, &[4, 7, 9, 11], &[2, 6], 0.9),
    ChordTemplate::new(Q::Dominant13, F::Extension, &[4, 7, 9, 10], &[2], 0.92),
    ChordTemplate::new(Q::Minor13, F::Extension, &[3, 7, 9, 10], &[2, 5], 0.9),
    ChordTemplate::new(Q::Major11, F::Extension, &[4, 5, 7, 11], &[2], 0.88),
    ChordTemplate::new(Q::Dominant11, F::Extension, &[5, 7, 10], &[2, 4], 0.88),
    ChordTemplate::new(Q::Minor11, F::Extension, &[3, 5, 7, 10], &[2], 0.9),
    ChordTemplate::new(Q::Major9, F::Extension, &[2, 4, 7, 11], &[], 0.92),
    ChordTemplate::new(Q::Dominant9, F::Extension, &[2, 4, 7, 10], &[], 0.93),
    ChordTemplate::new(Q::Minor9, F::Extension, &[2, 3, 7, 10], &[], 0.92),
    // Altered dominants, compound alterations first
    ChordTemplate::new(Q::Dominant7Flat9Flat13, F::AlteredDominant, &[1, 4, 7, 8, 10], &[], 0.88),
    ChordTemplate::new(Q::Dominant7Flat9Sharp11, F::AlteredDominant, &[1, 4, 6, 7, 10], &[], 0.88),
    ChordTemplate::new(Q::Dominant7Sharp9Flat13, F::AlteredDominant, &[3, 4, 7, 8, 10], &[], 0.88),
    ChordTemplate::new(Q::Dominant7Flat9, F::AlteredDominant, &[1, 4, 7, 10], &[], 0.9),
    ChordTemplate::new(Q::Dominant7Sharp9, F::AlteredDominant, &[3, 4, 7, 10], &[], 0.9),
    ChordTemplate::new(Q::Dominant7Sharp11, F::AlteredDominant, &[4, 6, 7, 10], &[], 0.88),
    ChordTemplate::new(Q::Dominant7Flat13, F::AlteredDominant, &[4, 7, 8, 10], &[], 0.88),
    ChordTemplate::new(Q::Dominant7Flat5, F::AlteredDominant, &[4, 6, 10], &[], 0.88),
    ChordTemplate::new(Q::Dominant7Sharp5, F::AlteredDominant, &[4, 8, 10], &[], 0.88),
    // Sevenths
    ChordTemplate::new(Q::Major7, F::Seventh, &[4, 7, 11], &[], 0.95),
    ChordTemplate::new(Q::Dominant7, F::Seventh, &[4, 7, 10], &[], 0.95),
    ChordTemplate::new(Q::Minor7, F::Seventh, &[3, 7, 10], &[], 0.95),
    ChordTemplate::new(Q::MinorMajor7, F::Seventh, &[3, 7, 11], &[], 0.9),
    ChordTemplate::new(Q::Diminished7, F::Seventh, &[3, 6, 9], &[], 0.92),
    ChordTemplate::new(Q::HalfDiminished7, F::Seventh, &[3, 6, 10], &[], 0.92),
    // Suspended triads
    ChordTemplate::new(Q::Suspended2Suspended4, F::Suspended, &[2, 5, 7], &[], 0.8),
    ChordTemplate::new(Q::Suspended4, F::Suspended, &[5, 7], &[], 0.82),
    ChordTemplate::new(Q::Suspended2, F::Suspended, &[2, 7], &[], 0.82),
    // Triads
    ChordTemplate::new(Q::Major, F::Triad, &[4, 7], &[], 0.85),
    ChordTemplate::new(Q::Minor, F::Triad, &[3, 7], &[], 0.85),
    ChordTemplate::new(Q::Augmented, F::Triad, &[4, 8], &[], 0.8),
    ChordTemplate::new(Q::Diminished, F::Triad, &[3, 6], &[], 0.8),
    // Dyad
    ChordTemplate::new(Q::Power, F::Power, &[7], &[], 0.8),
];

/// All templates in the order they are tried.
pub fn templates() -> &'static [ChordTemplate] {
    TEMPLATES
}

/// Look up the template for a quality.
pub fn template_for(quality: ChordQuality) -> Option<&'static ChordTemplate> {
    TEMPLATES.iter().find(|t| t.quality == quality)
}

/// Family exclusion rule. Returns false when the template cannot apply.
fn family_permits(family: QualityFamily, intervals: IntervalSet) -> bool {
    match family {
        // A seventh turns a sixth or added tone into a seventh chord.
        QualityFamily::AddedTone => !intervals.has_seventh(),
        // Extensions imply the seventh.
        QualityFamily::Extension => intervals.has_seventh(),
        // A sounding third cancels the suspension.
        QualityFamily::Suspended => !intervals.has_third(),
        QualityFamily::Power
        | QualityFamily::Triad
        | QualityFamily::Seventh
        | QualityFamily::AlteredDominant => true,
    }
}

/// How well `intervals` (measured from a candidate root) fit `template`, 0.0–1.0.
pub fn score_template(intervals: IntervalSet, template: &ChordTemplate) -> f64 {
    let missing = template.required.difference(intervals);
    let missing_fifth = missing.contains(PERFECT_FIFTH);

    if missing_fifth && template.family.requires_fifth() {
        return 0.0;
    }
    if !missing.difference(IntervalSet::new(&[PERFECT_FIFTH])).is_empty() {
        return 0.0;
    }
    if !family_permits(template.family, intervals) {
        return 0.0;
    }

    let unexpected = intervals.difference(template.allowed()).len();

    // A fully voiced ninth chord beats any partial reading.
    if template.required.contains(NINTH)
        && intervals.contains(NINTH)
        && intervals.has_third()
        && unexpected == 0
    {
        return 1.0;
    }

    let score = if unexpected == 0 && !missing_fifth {
        1.0
    } else {
        (1.0 - UNEXPECTED_INTERVAL_PENALTY * unexpected as f64).clamp(0.0, 1.0)
    };

    if missing_fifth {
        score * MISSING_FIFTH_PENALTY
    } else {
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn template(quality: ChordQuality) -> &'static ChordTemplate {
        template_for(quality).unwrap()
    }

    #[test]
    fn interval_set_from_pitch_classes() {
        // E G C measured from C
        let set = IntervalSet::from_pitch_classes(&[4, 7, 0], 0);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![4, 7]);
        // measured from E
        let set = IntervalSet::from_pitch_classes(&[4, 7, 0], 4);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![3, 8]);
    }

    #[test]
    fn every_quality_appears_once() {
        let mut seen = HashSet::new();
        for t in TEMPLATES {
            assert!(seen.insert(t.quality), "{:?} listed twice", t.quality);
            assert!(t.base_confidence > 0.0 && t.base_confidence <= 1.0);
            assert!(!t.required.contains(0));
            assert!(t.required.difference(t.optional) == t.required);
        }
        assert_eq!(seen.len(), 42);
    }

    #[test]
    fn fuller_forms_precede_their_subsets() {
        let position = |q| TEMPLATES.iter().position(|t| t.quality == q).unwrap();
        assert!(position(Q::SixNine) < position(Q::Major6));
        assert!(position(Q::MinorSixNine) < position(Q::Minor6));
        assert!(position(Q::Dominant7Suspended4) < position(Q::Suspended4));
        assert!(position(Q::Dominant7Suspended2) < position(Q::Suspended2));
        assert!(position(Q::Dominant7Suspended4) < position(Q::Dominant11));
    }

    #[test]
    fn exact_match_scores_one() {
        let intervals = IntervalSet::new(&[4, 7]);
        assert_eq!(score_template(intervals, template(Q::Major)), 1.0);
    }

    #[test]
    fn missing_required_interval_fails() {
        let intervals = IntervalSet::new(&[4, 7]);
        assert_eq!(score_template(intervals, template(Q::Dominant7)), 0.0);
    }

    #[test]
    fn missing_fifth_is_tolerated_with_penalty() {
        // C E Bb
        let intervals = IntervalSet::new(&[4, 10]);
        assert_eq!(score_template(intervals, template(Q::Dominant7)), 0.95);
    }

    #[test]
    fn missing_fifth_fails_sus_and_power() {
        let intervals = IntervalSet::new(&[5]);
        assert_eq!(score_template(intervals, template(Q::Suspended4)), 0.0);
        let intervals = IntervalSet::new(&[4]);
        assert_eq!(score_template(intervals, template(Q::Power)), 0.0);
    }

    #[test]
    fn unexpected_intervals_cost_fifteen_percent_each() {
        let intervals = IntervalSet::new(&[4, 7, 10]);
        let score = score_template(intervals, template(Q::Major));
        assert!((score - 0.85).abs() < 1e-9);

        let intervals = IntervalSet::new(&[1, 4, 7, 10]);
        let score = score_template(intervals, template(Q::Major));
        assert!((score - 0.7).abs() < 1e-9);
    }

    #[test]
    fn seventh_disqualifies_added_tones() {
        let intervals = IntervalSet::new(&[4, 7, 9, 10]);
        assert_eq!(score_template(intervals, template(Q::Major6)), 0.0);
        let intervals = IntervalSet::new(&[2, 4, 7, 11]);
        assert_eq!(score_template(intervals, template(Q::Add9)), 0.0);
    }

    #[test]
    fn extensions_require_a_seventh() {
        let intervals = IntervalSet::new(&[2, 4, 7]);
        assert_eq!(score_template(intervals, template(Q::Dominant9)), 0.0);
        let intervals = IntervalSet::new(&[2, 4, 7, 10]);
        assert_eq!(score_template(intervals, template(Q::Dominant9)), 1.0);
    }

    #[test]
    fn third_disqualifies_suspensions() {
        let intervals = IntervalSet::new(&[4, 5, 7]);
        assert_eq!(score_template(intervals, template(Q::Suspended4)), 0.0);
        let intervals = IntervalSet::new(&[3, 5, 7, 10]);
        assert_eq!(score_template(intervals, template(Q::Dominant7Suspended4)), 0.0);
    }

    #[test]
    fn voiced_ninth_without_fifth_is_complete() {
        // C E Bb D
        let intervals = IntervalSet::new(&[2, 4, 10]);
        assert_eq!(score_template(intervals, template(Q::Dominant9)), 1.0);
    }

    #[test]
    fn optional_intervals_are_free() {
        // C E G A Bb D: 13 with its optional ninth
        let intervals = IntervalSet::new(&[2, 4, 7, 9, 10]);
        assert_eq!(score_template(intervals, template(Q::Dominant13)), 1.0);
    }

    #[test]
    fn completeness_rewards_fuller_templates() {
        let intervals = IntervalSet::new(&[4, 7, 10]);
        let triad = template(Q::Major);
        let seventh = template(Q::Dominant7);
        let triad_adjusted = triad.adjusted_score(score_template(intervals, triad), intervals);
        let seventh_adjusted =
            seventh.adjusted_score(score_template(intervals, seventh), intervals);
        assert!(seventh_adjusted > triad_adjusted);
    }
}
