//! Scale and mode database.
//!
//! Every scale is a 12 character template, one character per semitone above the tonic: `x` marks
//! a note in the scale and `.` a note outside it. Modes are rotations of the template that start on
//! each in-scale note in turn.

use crate::error::{Error, Result};
use serde::Deserialize;

pub const IN_SCALE: char = 'x';
pub const OUT_OF_SCALE: char = '.';

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Scale {
    pub name: String,
    pub notes: String,
    #[serde(default)]
    pub modes: Vec<String>,
    /// All rotations of the template are the same scale (whole tone, chromatic...).
    #[serde(default)]
    pub duplicates: bool,
}

impl Scale {
    fn new(name: &str, notes: &str, modes: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            notes: notes.to_string(),
            modes: modes.iter().map(|m| m.to_string()).collect(),
            duplicates: false,
        }
    }

    fn symmetric(name: &str, notes: &str) -> Self {
        Self {
            duplicates: true,
            ..Self::new(name, notes, &[name])
        }
    }

    pub fn mode_count(&self) -> usize {
        if self.duplicates {
            1
        } else {
            self.notes.chars().filter(|&c| c == IN_SCALE).count()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidConfig("Scale name must not be empty".to_string()));
        }
        let len = self.notes.chars().count();
        if len != 12 {
            return Err(Error::InvalidConfig(format!(
                "Scale {:?} must have 12 notes (found {len})",
                self.name
            )));
        }
        if self.notes.chars().any(|c| c != IN_SCALE && c != OUT_OF_SCALE) {
            return Err(Error::InvalidConfig(format!(
                "Scale {:?} may only contain '{IN_SCALE}' and '{OUT_OF_SCALE}'",
                self.name
            )));
        }
        if !self.notes.starts_with(IN_SCALE) {
            return Err(Error::InvalidConfig(format!(
                "Scale {:?} must start on its tonic ('{IN_SCALE}')",
                self.name
            )));
        }
        Ok(())
    }
}

/// Rotate a scale template forward to its `mode`-th in-scale note.
pub fn rotate_mode(notes: &str, mode: usize) -> String {
    let mut notes: Vec<char> = notes.chars().collect();
    if !notes.contains(&IN_SCALE) {
        return notes.into_iter().collect();
    }
    for _ in 0..mode {
        if notes[0] == IN_SCALE {
            notes.rotate_left(1);
        }
        while notes[0] == OUT_OF_SCALE {
            notes.rotate_left(1);
        }
    }
    notes.into_iter().collect()
}

/// The active scale and mode, resolved into a per-degree mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleSelection {
    pub scale_index: usize,
    pub mode_index: usize,
    pub scale_name: String,
    pub mode_name: String,
    pub mask: [bool; 12],
}

impl ScaleSelection {
    /// Every note is in scale.
    pub fn chromatic() -> Self {
        Self {
            scale_index: 0,
            mode_index: 0,
            scale_name: "Chromatic".to_string(),
            mode_name: "Chromatic".to_string(),
            mask: [true; 12],
        }
    }

    pub fn in_scale(&self, degree: usize) -> bool {
        self.mask[degree % 12]
    }
}

#[derive(Debug, Clone)]
pub struct ScaleDb {
    scales: Vec<Scale>,
}

impl Default for ScaleDb {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ScaleDb {
    pub fn new(scales: Vec<Scale>) -> Result<Self> {
        if scales.is_empty() {
            return Err(Error::InvalidConfig("The scale list must not be empty".to_string()));
        }
        for scale in &scales {
            scale.validate()?;
        }
        Ok(Self { scales })
    }

    pub fn builtin() -> Self {
        Self {
            scales: vec![
                Scale::new(
                    "Diatonic",
                    "x.x.xx.x.x.x",
                    &["Ionian", "Dorian", "Phrygian", "Lydian", "Mixolydian", "Aeolian", "Locrian"],
                ),
                Scale::new(
                    "Melodic Minor",
                    "x.xx.x.x.x.x",
                    &[
                        "Melodic Minor",
                        "Dorian b2",
                        "Lydian Augmented",
                        "Lydian Dominant",
                        "Mixolydian b6",
                        "Locrian #2",
                        "Altered",
                    ],
                ),
                Scale::new(
                    "Harmonic Minor",
                    "x.xx.x.xx..x",
                    &[
                        "Harmonic Minor",
                        "Locrian #6",
                        "Ionian #5",
                        "Dorian #4",
                        "Phrygian Dominant",
                        "Lydian #2",
                        "Super Locrian bb7",
                    ],
                ),
                Scale::new(
                    "Harmonic Major",
                    "x.x.xx.xx..x",
                    &[
                        "Harmonic Major",
                        "Dorian b5",
                        "Phrygian b4",
                        "Lydian b3",
                        "Mixolydian b2",
                        "Lydian Augmented #2",
                        "Locrian bb7",
                    ],
                ),
                Scale::new(
                    "Pentatonic",
                    "x.x.x..x.x..",
                    &["Major", "Suspended", "Blues Minor", "Blues Major", "Minor"],
                ),
                Scale::symmetric("Whole Tone", "x.x.x.x.x.x."),
                Scale::symmetric("Chromatic", "xxxxxxxxxxxx"),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.scales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }

    pub fn mode_count(&self, scale: usize) -> usize {
        self.scales
            .get(scale)
            .map(Scale::mode_count)
            .unwrap_or(1)
            .max(1)
    }

    /// Resolve `(scale, mode)`; both indices wrap.
    pub fn select(&self, scale: usize, mode: usize) -> ScaleSelection {
        let scale_index = scale % self.scales.len();
        let entry = &self.scales[scale_index];
        let mode_index = mode % self.mode_count(scale_index);
        let notes = rotate_mode(&entry.notes, mode_index);

        let mut mask = [false; 12];
        for (i, c) in notes.chars().take(12).enumerate() {
            mask[i] = c == IN_SCALE;
        }

        let mode_name = entry
            .modes
            .get(mode_index)
            .cloned()
            .unwrap_or_else(|| format!("Mode {}", mode_index + 1));

        ScaleSelection {
            scale_index,
            mode_index,
            scale_name: entry.name.clone(),
            mode_name,
            mask,
        }
    }

    /// First mode of the scale `offset` places away.
    pub fn step_scale(&self, current: &ScaleSelection, offset: i32) -> ScaleSelection {
        let count = self.scales.len() as i32;
        let next = (current.scale_index as i32 + offset).rem_euclid(count);
        self.select(next as usize, 0)
    }

    pub fn step_mode(&self, current: &ScaleSelection, offset: i32) -> ScaleSelection {
        let count = self.mode_count(current.scale_index) as i32;
        let next = (current.mode_index as i32 + offset).rem_euclid(count);
        self.select(current.scale_index, next as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_mode_walks_in_scale_notes() {
        assert_eq!(rotate_mode("x.x.xx.x.x.x", 0), "x.x.xx.x.x.x");
        // dorian
        assert_eq!(rotate_mode("x.x.xx.x.x.x", 1), "x.xx.x.x.xx.");
        // aeolian
        assert_eq!(rotate_mode("x.x.xx.x.x.x", 5), "x.xx.x.xx.x.");
    }

    #[test]
    fn select_builds_mask_and_names() {
        let db = ScaleDb::builtin();
        let ionian = db.select(0, 0);
        assert_eq!(ionian.scale_name, "Diatonic");
        assert_eq!(ionian.mode_name, "Ionian");
        assert!(ionian.in_scale(0));
        assert!(!ionian.in_scale(1));
        assert!(ionian.in_scale(11));

        let dorian = db.select(0, 1);
        assert_eq!(dorian.mode_name, "Dorian");
        assert!(dorian.in_scale(3));
        assert!(!dorian.in_scale(4));
    }

    #[test]
    fn stepping_wraps() {
        let db = ScaleDb::builtin();
        let first = db.select(0, 0);
        let last = db.step_scale(&first, -1);
        assert_eq!(last.scale_name, "Chromatic");
        assert_eq!(last.mask, [true; 12]);
        assert_eq!(db.step_scale(&last, 1).scale_index, 0);

        let locrian = db.step_mode(&first, -1);
        assert_eq!(locrian.mode_name, "Locrian");
        assert_eq!(db.step_mode(&locrian, 1).mode_index, 0);
    }

    #[test]
    fn symmetric_scales_have_one_mode() {
        let db = ScaleDb::builtin();
        let whole = db.select(5, 3);
        assert_eq!(whole.scale_name, "Whole Tone");
        assert_eq!(whole.mode_index, 0);
    }

    #[test]
    fn missing_mode_names_fall_back_to_numbers() {
        let db = ScaleDb::new(vec![Scale {
            name: "Blues".to_string(),
            notes: "x..x.xxx..x.".to_string(),
            modes: vec!["Blues".to_string()],
            duplicates: false,
        }])
        .unwrap();
        assert_eq!(db.select(0, 2).mode_name, "Mode 3");
    }

    #[test]
    fn malformed_templates_are_rejected() {
        let bad = |notes: &str| Scale {
            name: "Bad".to_string(),
            notes: notes.to_string(),
            modes: vec![],
            duplicates: false,
        };
        assert!(ScaleDb::new(vec![bad("x.x.x")]).is_err());
        assert!(ScaleDb::new(vec![bad("x.x.xx.x.x.o")]).is_err());
        assert!(ScaleDb::new(vec![bad(".x.x.xx.x.x.")]).is_err());
        assert!(ScaleDb::new(vec![]).is_err());
    }
}
