//! # Pitch Classification Module
//!
//! Maps a detected frequency onto either a set of tuning targets (tuning mode)
//! or the full chromatic note table (general mode). Every call returns a fresh
//! [`Classification`]; nothing is carried over between calls.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::tuning::{NoteTable, TuningTarget, calculate_cents_deviation};

/// Which reference set a result was matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClassificationMode {
    /// Matched against user-supplied tuning targets.
    Tuning,
    /// Matched against the full note table.
    General,
}

/// Result of classifying one detected frequency.
///
/// In tuning mode the `nearest_*` fields describe the closest tuning target and
/// are only filled when the pitch is off; in general mode they describe the
/// second-closest note of the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub mode: ClassificationMode,
    pub tolerance: f32,
    /// Detected frequency in Hz
    pub frequency: f32,
    pub note: String,
    pub target_frequency: f32,
    /// Absolute distance in Hz from `target_frequency`
    pub distance: f32,
    pub octave: i32,
    pub nearest_note: String,
    pub nearest_target_frequency: f32,
    pub nearest_distance: f32,
    pub nearest_octave: i32,
    pub is_on_pitch: bool,
    /// Deviation from `target_frequency` in cents (positive = sharp)
    pub cents: f32,
}

impl Classification {
    /// Result for "nothing detected" in `mode`: no note, not on pitch.
    pub fn silent(mode: ClassificationMode, tolerance: f32) -> Self {
        Self {
            mode,
            tolerance,
            frequency: 0.0,
            note: String::new(),
            target_frequency: 0.0,
            distance: 0.0,
            octave: 0,
            nearest_note: String::new(),
            nearest_target_frequency: 0.0,
            nearest_distance: 0.0,
            nearest_octave: 0,
            is_on_pitch: false,
            cents: 0.0,
        }
    }

    /// True when no note was matched.
    pub fn is_silent(&self) -> bool {
        self.note.is_empty()
    }

    /// The eleven-value event payload, in its fixed wire order.
    pub fn to_values(&self) -> Vec<Value> {
        vec![
            json!(self.tolerance),
            json!(self.frequency),
            json!(self.note),
            json!(self.target_frequency),
            json!(self.distance),
            json!(self.octave),
            json!(self.nearest_note),
            json!(self.nearest_target_frequency),
            json!(self.nearest_distance),
            json!(self.nearest_octave),
            json!(self.is_on_pitch),
        ]
    }
}

/// Classifies `frequency` against `targets`, or against `table` when
/// `targets` is empty.
///
/// A pitch is on when its distance to the matched reference is strictly below
/// `tolerance`. Equal distances resolve to the reference seen first. A
/// frequency that is not a positive finite number yields
/// [`Classification::silent`].
pub fn classify(
    frequency: f32,
    tolerance: f32,
    targets: &[TuningTarget],
    table: &NoteTable,
) -> Classification {
    if !(frequency.is_finite() && frequency > 0.0) {
        let mode = if targets.is_empty() {
            ClassificationMode::General
        } else {
            ClassificationMode::Tuning
        };
        return Classification::silent(mode, tolerance);
    }

    let mut result = if targets.is_empty() {
        classify_general(frequency, tolerance, table)
    } else {
        classify_tuning(frequency, tolerance, targets, table)
    };
    result.cents = calculate_cents_deviation(frequency, result.target_frequency);
    result
}

fn classify_tuning(
    frequency: f32,
    tolerance: f32,
    targets: &[TuningTarget],
    table: &NoteTable,
) -> Classification {
    let mut closest = &targets[0];
    let mut smallest = (frequency - closest.frequency).abs();
    for target in &targets[1..] {
        let distance = (frequency - target.frequency).abs();
        if distance < smallest {
            smallest = distance;
            closest = target;
        }
    }

    let mut result = Classification::silent(ClassificationMode::Tuning, tolerance);
    result.frequency = frequency;
    result.target_frequency = closest.frequency;
    result.distance = smallest;

    if smallest < tolerance {
        result.note = closest.note.clone();
        result.octave = closest.octave;
        result.is_on_pitch = true;
    } else {
        // Report the note actually being played, and how far off the
        // intended string is.
        if let Some(playing) = table.nearest(frequency) {
            result.note = playing.name.to_string();
            result.octave = playing.octave;
        }
        result.nearest_note = closest.note.clone();
        result.nearest_octave = closest.octave;
        result.nearest_target_frequency = closest.frequency;
        result.nearest_distance = smallest;
    }
    result
}

fn classify_general(frequency: f32, tolerance: f32, table: &NoteTable) -> Classification {
    let mut result = Classification::silent(ClassificationMode::General, tolerance);
    result.frequency = frequency;

    let Some((first, second)) = table.nearest_two(frequency) else {
        return result;
    };

    result.note = first.name.to_string();
    result.octave = first.octave;
    result.target_frequency = first.frequency;
    result.distance = (frequency - first.frequency).abs();
    result.is_on_pitch = result.distance < tolerance;

    if let Some(second) = second {
        result.nearest_note = second.name.to_string();
        result.nearest_octave = second.octave;
        result.nearest_target_frequency = second.frequency;
        result.nearest_distance = (frequency - second.frequency).abs();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::{STANDARD_GUITAR, parse_tuning};

    fn target(note: &str, octave: i32, frequency: f32) -> TuningTarget {
        TuningTarget {
            note: note.to_string(),
            octave,
            frequency,
        }
    }

    #[test]
    fn general_mode_445_is_boundary_off_pitch() {
        let result = classify(445.0, 5.0, &[], NoteTable::standard());
        assert_eq!(result.mode, ClassificationMode::General);
        assert_eq!((result.note.as_str(), result.octave), ("A", 4));
        assert_eq!(result.target_frequency, 440.0);
        assert_eq!(result.distance, 5.0);
        assert!(!result.is_on_pitch);
        assert_eq!((result.nearest_note.as_str(), result.nearest_octave), ("A#", 4));
        assert!((result.nearest_target_frequency - 466.16).abs() < 0.01);
    }

    #[test]
    fn general_mode_on_pitch_within_tolerance() {
        let result = classify(441.0, 5.0, &[], NoteTable::standard());
        assert!(result.is_on_pitch);
        assert_eq!(result.note, "A");
        assert!(result.cents > 0.0);
    }

    #[test]
    fn tuning_mode_on_pitch() {
        let targets = parse_tuning(&STANDARD_GUITAR, NoteTable::standard());
        let result = classify(110.3, 1.0, &targets, NoteTable::standard());
        assert_eq!(result.mode, ClassificationMode::Tuning);
        assert!(result.is_on_pitch);
        assert_eq!((result.note.as_str(), result.octave), ("A", 2));
        assert_eq!(result.target_frequency, 110.0);
        assert!((result.distance - 0.3).abs() < 1e-4);
        assert!(result.nearest_note.is_empty());
        assert_eq!(result.nearest_target_frequency, 0.0);
    }

    #[test]
    fn tuning_mode_off_pitch_reports_played_note_and_string() {
        let targets = parse_tuning(&STANDARD_GUITAR, NoteTable::standard());
        // Between A2 (110) and D3 (146.83), closest played note is C#3 (138.59).
        let result = classify(138.0, 1.0, &targets, NoteTable::standard());
        assert!(!result.is_on_pitch);
        assert_eq!((result.note.as_str(), result.octave), ("C#", 3));
        assert_eq!((result.nearest_note.as_str(), result.nearest_octave), ("D", 3));
        assert!((result.nearest_target_frequency - 146.83).abs() < 0.01);
        assert_eq!(result.nearest_distance, result.distance);
        assert!(result.cents < 0.0);
    }

    #[test]
    fn tolerance_boundary_is_strict() {
        let targets = vec![target("A", 4, 440.0)];
        let table = NoteTable::standard();

        let exact = classify(441.0, 1.0, &targets, table);
        assert!(!exact.is_on_pitch);

        let inside = classify(440.5, 1.0, &targets, table);
        assert!(inside.is_on_pitch);
    }

    #[test]
    fn equidistant_targets_prefer_first_listed() {
        let table = NoteTable::standard();
        let targets = vec![target("A", 4, 440.0), target("B", 4, 460.0)];
        let result = classify(450.0, 1.0, &targets, table);
        assert_eq!(result.nearest_note, "A");
        assert_eq!(result.target_frequency, 440.0);

        let reversed = vec![target("B", 4, 460.0), target("A", 4, 440.0)];
        let result = classify(450.0, 1.0, &reversed, table);
        assert_eq!(result.nearest_note, "B");
    }

    #[test]
    fn zero_frequency_is_silent() {
        let result = classify(0.0, 1.0, &[], NoteTable::standard());
        assert!(result.is_silent());
        assert!(!result.is_on_pitch);
        assert_eq!(result, Classification::silent(ClassificationMode::General, 1.0));

        let nan = classify(f32::NAN, 1.0, &[], NoteTable::standard());
        assert!(nan.is_silent());
    }

    #[test]
    fn silence_keeps_tuning_mode() {
        let targets = parse_tuning(&STANDARD_GUITAR, NoteTable::standard());
        let result = classify(0.0, 1.0, &targets, NoteTable::standard());
        assert!(result.is_silent());
        assert_eq!(result.mode, ClassificationMode::Tuning);
        assert_eq!(result.target_frequency, 0.0);
    }

    #[test]
    fn general_mode_midpoint_prefers_lower_note() {
        let table = NoteTable::standard();
        let lower = table.get("D#", 0).unwrap();
        let upper = table.get("E", 0).unwrap();
        let midpoint = (lower.frequency + upper.frequency) / 2.0;
        assert_eq!(
            midpoint - lower.frequency,
            upper.frequency - midpoint,
            "midpoint must be exactly equidistant"
        );

        let result = classify(midpoint, 0.1, &[], table);
        assert_eq!((result.note.as_str(), result.octave), ("D#", 0));
        assert_eq!((result.nearest_note.as_str(), result.nearest_octave), ("E", 0));
        assert_eq!(result.distance, result.nearest_distance);
    }

    #[test]
    fn values_follow_event_order() {
        let result = classify(445.0, 5.0, &[], NoteTable::standard());
        let values = result.to_values();
        assert_eq!(values.len(), 11);
        assert_eq!(values[2], json!("A"));
        assert_eq!(values[5], json!(4));
        assert_eq!(values[6], json!("A#"));
        assert_eq!(values[10], json!(false));
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let result = classify(445.0, 5.0, &[], NoteTable::standard());
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["isOnPitch"], json!(false));
        assert_eq!(value["nearestNote"], json!("A#"));
        assert_eq!(value["mode"], json!("general"));
    }
}
