//! # Musical Tuning Module
//!
//! Equal-temperament reference notes and tuning targets.
//!
//! ## Features
//! - 108-note reference table (C0 to B8), A4 = 440 Hz
//! - Nearest and second-nearest note lookup
//! - Tuning identifiers such as `"E4"` or `"A#3"` resolved to target frequencies
//! - Cent deviation calculations

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::PitchError;

/// Reference pitch for the table.
pub const A4_FREQUENCY: f32 = 440.0;

/// The twelve pitch classes, C first.
pub const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Lowest and highest octave in the table.
pub const OCTAVES: std::ops::RangeInclusive<i32> = 0..=8;

/// Identifier that switches the classifier into general (chromatic) mode.
pub const GENERAL_MODE: &str = "None";

/// Standard six-string guitar tuning, high E first.
pub const STANDARD_GUITAR: [&str; 6] = ["E4", "B3", "G3", "D3", "A2", "E2"];

/// Tuning list selecting general mode.
pub const GENERAL: [&str; 1] = [GENERAL_MODE];

/// A single note of the reference table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NoteEntry {
    /// Pitch class name (e.g., "C", "F#")
    pub name: &'static str,
    pub octave: i32,
    /// Frequency in Hz
    pub frequency: f32,
}

/// A resolved tuning target (e.g. one guitar string).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningTarget {
    pub note: String,
    pub octave: i32,
    pub frequency: f32,
}

/// Equal-temperament frequency of a pitch class in an octave.
///
/// `pitch_class` indexes [`PITCH_CLASSES`] (C = 0, A = 9).
pub fn note_frequency(pitch_class: usize, octave: i32) -> f32 {
    let semitones = 12 * (octave - 4) + (pitch_class as i32 - 9);
    A4_FREQUENCY * 2.0_f32.powf(semitones as f32 / 12.0)
}

/// Calculates the deviation from a target frequency in cents.
///
/// Positive values are sharp, negative values flat. Returns `0.0` when either
/// frequency is not positive.
pub fn calculate_cents_deviation(freq: f32, target_freq: f32) -> f32 {
    if freq <= 0.0 || target_freq <= 0.0 {
        return 0.0;
    }
    1200.0 * (freq / target_freq).log2()
}

/// Frequency-sorted table of every note in octaves 0 to 8.
#[derive(Debug, Clone)]
pub struct NoteTable {
    entries: Vec<NoteEntry>,
}

/// Built on first use and shared for the life of the process.
static STANDARD_TABLE: Lazy<NoteTable> = Lazy::new(NoteTable::build);

impl NoteTable {
    /// Generates the table from the fixed constants.
    pub fn build() -> Self {
        let mut entries = Vec::with_capacity(PITCH_CLASSES.len() * 9);
        for octave in OCTAVES {
            for (pitch_class, &name) in PITCH_CLASSES.iter().enumerate() {
                entries.push(NoteEntry {
                    name,
                    octave,
                    frequency: note_frequency(pitch_class, octave),
                });
            }
        }
        // Already ascending by construction; sorting keeps that an invariant.
        entries.sort_by(|a, b| a.frequency.total_cmp(&b.frequency));
        Self { entries }
    }

    /// The shared, lazily built table.
    pub fn standard() -> &'static NoteTable {
        &STANDARD_TABLE
    }

    pub fn entries(&self) -> &[NoteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a note by exact (case-sensitive) name and octave.
    pub fn get(&self, name: &str, octave: i32) -> Option<&NoteEntry> {
        self.entries
            .iter()
            .find(|e| e.octave == octave && e.name == name)
    }

    /// Closest note to `freq`; the lower note wins an exact tie.
    pub fn nearest(&self, freq: f32) -> Option<&NoteEntry> {
        let mut best: Option<(&NoteEntry, f32)> = None;
        for entry in &self.entries {
            let distance = (freq - entry.frequency).abs();
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((entry, distance));
            }
        }
        best.map(|(entry, _)| entry)
    }

    /// Nearest and second-nearest notes to `freq`, found in a single pass.
    ///
    /// The second entry is the closest note other than the first one.
    pub fn nearest_two(&self, freq: f32) -> Option<(&NoteEntry, Option<&NoteEntry>)> {
        let mut first: Option<(&NoteEntry, f32)> = None;
        let mut second: Option<(&NoteEntry, f32)> = None;

        for entry in &self.entries {
            let distance = (freq - entry.frequency).abs();
            if first.is_none_or(|(_, d)| distance < d) {
                second = first;
                first = Some((entry, distance));
            } else if second.is_none_or(|(_, d)| distance < d) {
                second = Some((entry, distance));
            }
        }

        first.map(|(entry, _)| (entry, second.map(|(e, _)| e)))
    }
}

/// Resolves tuning identifiers like `"E4"` or `"C#3"` against `table`.
///
/// Identifiers shorter than two characters, without a trailing octave digit,
/// or naming a note absent from the table are skipped. A list starting with
/// `"None"` selects general mode and yields no targets.
pub fn parse_tuning<S: AsRef<str>>(identifiers: &[S], table: &NoteTable) -> Vec<TuningTarget> {
    if identifiers
        .first()
        .is_some_and(|first| first.as_ref() == GENERAL_MODE)
    {
        return Vec::new();
    }

    identifiers
        .iter()
        .filter_map(|id| {
            let id = id.as_ref();
            let target = parse_identifier(id, table);
            if target.is_none() {
                let err = PitchError::InvalidTuningIdentifier(id.to_string());
                warn!("skipping tuning entry: {err}");
            }
            target
        })
        .collect()
}

fn parse_identifier(id: &str, table: &NoteTable) -> Option<TuningTarget> {
    if id.chars().count() < 2 {
        return None;
    }
    let (split, last) = id.char_indices().next_back()?;
    let octave = last.to_digit(10)? as i32;
    let name = &id[..split];

    table.get(name, octave).map(|entry| TuningTarget {
        note: entry.name.to_string(),
        octave: entry.octave,
        frequency: entry.frequency,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_108_sorted_entries() {
        let table = NoteTable::standard();
        assert_eq!(table.len(), 108);
        assert!(
            table
                .entries()
                .windows(2)
                .all(|w| w[0].frequency < w[1].frequency)
        );
        assert_eq!(table.entries()[0].name, "C");
        assert_eq!(table.entries()[0].octave, 0);
        assert_eq!(table.entries()[107].name, "B");
        assert_eq!(table.entries()[107].octave, 8);
    }

    #[test]
    fn every_entry_follows_equal_temperament() {
        let table = NoteTable::standard();
        for octave in OCTAVES {
            for (pc, name) in PITCH_CLASSES.iter().enumerate() {
                let semitones = 12.0 * (octave as f64 - 4.0) + (pc as f64 - 9.0);
                let expected = 440.0_f64 * 2f64.powf(semitones / 12.0);
                let entry = table.get(name, octave).expect("every note is present");
                let rel = (entry.frequency as f64 - expected).abs() / expected;
                assert!(rel < 1e-5, "{name}{octave}: {} vs {expected}", entry.frequency);
            }
        }
    }

    #[test]
    fn a4_is_exactly_440() {
        assert_eq!(NoteTable::standard().get("A", 4).unwrap().frequency, 440.0);
    }

    #[test]
    fn parse_single_e4() {
        let targets = parse_tuning(&["E4"], NoteTable::standard());
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].note, "E");
        assert_eq!(targets[0].octave, 4);
        assert!((targets[0].frequency - 329.63).abs() < 0.01);
    }

    #[test]
    fn parse_sharp_note() {
        let targets = parse_tuning(&["A#3"], NoteTable::standard());
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].note, "A#");
        assert_eq!(targets[0].octave, 3);
    }

    #[test]
    fn none_sentinel_means_general_mode() {
        let targets = parse_tuning(&["None", "E4", "A2"], NoteTable::standard());
        assert!(targets.is_empty());
    }

    #[test]
    fn malformed_identifiers_are_dropped() {
        let ids = ["E", "", "Ex", "e4", "H2", "E9", "B3", "Db3", "A2"];
        let targets = parse_tuning(&ids, NoteTable::standard());
        let names: Vec<(String, i32)> = targets.into_iter().map(|t| (t.note, t.octave)).collect();
        assert_eq!(names, vec![("B".to_string(), 3), ("A".to_string(), 2)]);
    }

    #[test]
    fn non_ascii_identifier_does_not_panic() {
        assert!(parse_tuning(&["É4", "♯"], NoteTable::standard()).is_empty());
    }

    #[test]
    fn standard_guitar_resolves_all_strings() {
        let targets = parse_tuning(&STANDARD_GUITAR, NoteTable::standard());
        assert_eq!(targets.len(), 6);
        assert!((targets[5].frequency - 82.41).abs() < 0.01);
    }

    #[test]
    fn nearest_two_returns_neighbours() {
        let table = NoteTable::standard();
        let (first, second) = table.nearest_two(445.0).unwrap();
        assert_eq!((first.name, first.octave), ("A", 4));
        let second = second.unwrap();
        assert_eq!((second.name, second.octave), ("A#", 4));
    }

    #[test]
    fn exact_midpoint_resolves_to_lower_note() {
        let table = NoteTable::standard();
        let lower = table.get("D#", 0).unwrap();
        let upper = table.get("E", 0).unwrap();
        let midpoint = (lower.frequency + upper.frequency) / 2.0;
        assert_eq!(midpoint - lower.frequency, upper.frequency - midpoint);

        assert_eq!(table.nearest(midpoint), Some(lower));
        let (first, second) = table.nearest_two(midpoint).unwrap();
        assert_eq!(first, lower);
        assert_eq!(second, Some(upper));
    }

    #[test]
    fn every_exact_midpoint_prefers_lower_neighbour() {
        let table = NoteTable::standard();
        let mut ties = 0;
        for pair in table.entries().windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            let midpoint = (lower.frequency + upper.frequency) / 2.0;
            if midpoint - lower.frequency != upper.frequency - midpoint {
                continue;
            }
            ties += 1;
            assert_eq!(table.nearest(midpoint), Some(lower), "{}{}", lower.name, lower.octave);
            let (first, second) = table.nearest_two(midpoint).unwrap();
            assert_eq!((first, second), (lower, Some(upper)));
        }
        assert!(ties > 0);
    }

    #[test]
    fn nearest_handles_out_of_table_frequencies() {
        let table = NoteTable::standard();
        assert_eq!(table.nearest(1.0).unwrap().octave, 0);
        assert_eq!(table.nearest(20_000.0).unwrap().octave, 8);
    }

    #[test]
    fn cents_deviation() {
        assert!((calculate_cents_deviation(880.0, 440.0) - 1200.0).abs() < 1e-3);
        assert!(calculate_cents_deviation(440.0, 440.0).abs() < 1e-6);
        assert_eq!(calculate_cents_deviation(0.0, 440.0), 0.0);
    }
}
