//! Chord names for the held notes.

use crate::pitch::note_name;

pub trait ChordDetector {
    /// Name the chord formed by `pitches` (MIDI note numbers, any order), if it is one.
    fn detect(&self, pitches: &[u8]) -> Option<String>;
}

/// Interval sets above the root, with the suffix appended to the root name.
const TEMPLATES: &[(&str, &[u8])] = &[
    ("", &[0, 4, 7]),
    ("m", &[0, 3, 7]),
    ("dim", &[0, 3, 6]),
    ("aug", &[0, 4, 8]),
    ("sus2", &[0, 2, 7]),
    ("sus4", &[0, 5, 7]),
    ("5", &[0, 7]),
    ("6", &[0, 4, 7, 9]),
    ("m6", &[0, 3, 7, 9]),
    ("7", &[0, 4, 7, 10]),
    ("maj7", &[0, 4, 7, 11]),
    ("m7", &[0, 3, 7, 10]),
    ("mMaj7", &[0, 3, 7, 11]),
    ("m7b5", &[0, 3, 6, 10]),
    ("dim7", &[0, 3, 6, 9]),
    ("7sus4", &[0, 5, 7, 10]),
];

/// Matches the held pitch classes against a fixed chord table. The bass note is tried as the
/// root first; any other root is written as a slash chord over the bass.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateDetector;

impl TemplateDetector {
    fn classes(pitches: &[u8]) -> u16 {
        pitches.iter().fold(0, |set, p| set | 1 << (p % 12))
    }

    fn matches(classes: u16, root: u8) -> Option<&'static str> {
        TEMPLATES.iter().find_map(|(suffix, intervals)| {
            let shape = intervals
                .iter()
                .fold(0u16, |set, i| set | 1 << ((root + i) % 12));
            (shape == classes).then_some(*suffix)
        })
    }
}

impl ChordDetector for TemplateDetector {
    fn detect(&self, pitches: &[u8]) -> Option<String> {
        let bass = *pitches.iter().min()?;
        let classes = Self::classes(pitches);
        let bass_class = bass % 12;
        if classes.count_ones() == 1 {
            return Some(note_name(bass.into()).to_string());
        }

        if let Some(suffix) = Self::matches(classes, bass_class) {
            return Some(format!("{}{suffix}", note_name(bass.into())));
        }
        (0..12u8)
            .filter(|root| *root != bass_class && classes & (1 << root) != 0)
            .find_map(|root| {
                Self::matches(classes, root).map(|suffix| {
                    format!(
                        "{}{suffix}/{}",
                        note_name(root.into()),
                        note_name(bass.into())
                    )
                })
            })
    }
}
