//! Pad coordinate to pitch mapping.
//!
//! The grid is isomorphic: one pad right adds `column` semitones, one row up adds `row`
//! semitones, wherever the pad is. Pads are addressed the way the board is drawn, row 0 on top;
//! the formulas count rows from the bottom.

use crate::layout::LayoutState;

pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pad {
    pub col: usize,
    pub row: usize,
}

impl Pad {
    pub const fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }
}

/// Interval constants of the whole tone layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intervals {
    pub column: i32,
    pub row: i32,
    /// Added to every pitch while the layout is flipped.
    pub flip: i32,
    /// Column shift putting the tonic a few pads in from the left edge.
    pub base_column: i32,
    pub base_pitch: i32,
    pub octave_base: i32,
    /// Columns moved by the rotated preset.
    pub rotation: i32,
}

impl Default for Intervals {
    fn default() -> Self {
        Self {
            column: 2,
            row: 5,
            flip: 7,
            base_column: -4,
            base_pitch: 64,
            octave_base: -2,
            rotation: 3,
        }
    }
}

impl Intervals {
    /// Columns after which the column interval alone repeats the same pitch classes.
    pub fn column_cycle(&self) -> i32 {
        12 / gcd(self.column.rem_euclid(12), 12)
    }

    /// Board position and flip state that transpose the board by `tonic` semitones.
    pub fn placement(&self, tonic: i32) -> (i32, bool) {
        let cycle = self.column_cycle();
        for flipped in [false, true] {
            let shift = tonic - if flipped { self.flip } else { 0 };
            for position in 0..cycle {
                if (self.column * position - shift).rem_euclid(12) == 0 {
                    let position = if flipped { position - cycle } else { position };
                    return (position, flipped);
                }
            }
        }
        (0, false)
    }
}

fn gcd(a: i32, b: i32) -> i32 {
    if b == 0 { a.max(1) } else { gcd(b, a % b) }
}

pub fn effective_row(pad: Pad, layout: &LayoutState) -> i32 {
    layout.height() as i32 - pad.row as i32 - 1
}

pub fn effective_col(pad: Pad, layout: &LayoutState) -> i32 {
    pad.col as i32 + layout.position_x() + layout.intervals().base_column
}

/// Unbounded pitch of a pad; may fall outside the MIDI range.
pub fn absolute_pitch(pad: Pad, layout: &LayoutState) -> i32 {
    let iv = layout.intervals();
    let mut pitch = iv.row * effective_row(pad, layout)
        + iv.column * effective_col(pad, layout)
        + iv.base_pitch
        + 12 * (layout.octave() + iv.octave_base);
    if layout.flipped() {
        pitch += iv.flip;
    }
    pitch
}

pub fn note_class(pad: Pad, layout: &LayoutState) -> u8 {
    absolute_pitch(pad, layout).rem_euclid(12) as u8
}

pub fn octave_of(pad: Pad, layout: &LayoutState) -> i32 {
    absolute_pitch(pad, layout).div_euclid(12)
}

/// Scale degree of the pad above the tonic; indexes the scale mask and the palettes.
pub fn degree(pad: Pad, layout: &LayoutState) -> usize {
    (note_class(pad, layout) as i32 - layout.tonic() as i32).rem_euclid(12) as usize
}

pub fn midi_pitch(pad: Pad, layout: &LayoutState) -> Option<u8> {
    u8::try_from(absolute_pitch(pad, layout))
        .ok()
        .filter(|p| *p < 128)
}

/// Whether the pad sounds `pitch`: same note class and same octave.
pub fn matches(pad: Pad, pitch: i32, layout: &LayoutState) -> bool {
    pitch.rem_euclid(12) == note_class(pad, layout) as i32
        && pitch.div_euclid(12) == octave_of(pad, layout)
}

pub fn note_name(pitch: i32) -> &'static str {
    NOTE_NAMES[pitch.rem_euclid(12) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BoardSize;
    use crate::scales::ScaleSelection;

    fn layout() -> LayoutState {
        LayoutState::new(BoardSize::Small, false, ScaleSelection::chromatic())
    }

    #[test]
    fn bottom_left_pad() {
        let layout = layout();
        let pad = Pad::new(0, 7);
        assert_eq!(effective_row(pad, &layout), 0);
        assert_eq!(effective_col(pad, &layout), -4);
        assert_eq!(absolute_pitch(pad, &layout), 32);
        assert_eq!(note_name(32), "G#");
        assert_eq!(octave_of(pad, &layout), 2);
    }

    #[test]
    fn isomorphic_steps() {
        let layout = layout();
        let origin = absolute_pitch(Pad::new(5, 4), &layout);
        assert_eq!(absolute_pitch(Pad::new(6, 4), &layout), origin + 2);
        assert_eq!(absolute_pitch(Pad::new(5, 3), &layout), origin + 5);
        assert_eq!(absolute_pitch(Pad::new(6, 3), &layout), origin + 7);
    }

    #[test]
    fn octave_and_flip_offsets() {
        let mut layout = layout();
        let pad = Pad::new(3, 2);
        let base = absolute_pitch(pad, &layout);
        layout.shift_octave(1);
        assert_eq!(absolute_pitch(pad, &layout), base + 12);
        layout.toggle_flip();
        assert_eq!(absolute_pitch(pad, &layout), base + 19);
    }

    #[test]
    fn matches_requires_class_and_octave() {
        let layout = layout();
        let pad = Pad::new(2, 7);
        let pitch = absolute_pitch(pad, &layout);
        assert!(matches(pad, pitch, &layout));
        assert!(!matches(pad, pitch + 12, &layout));
        assert!(!matches(pad, pitch + 1, &layout));
    }

    #[test]
    fn degree_is_relative_to_tonic() {
        let mut layout = layout();
        let pad = Pad::new(2, 7);
        assert_eq!(note_class(pad, &layout), 0);
        assert_eq!(degree(pad, &layout), 0);
        // the board follows the tonic, so the pad keeps its degree
        layout.set_tonic(3);
        assert_eq!(note_class(pad, &layout), 3);
        assert_eq!(degree(pad, &layout), 0);
    }

    #[test]
    fn placement_transposes_by_tonic() {
        let iv = Intervals::default();
        for tonic in 0..12 {
            let (position, flipped) = iv.placement(tonic);
            let shift = iv.column * position + if flipped { iv.flip } else { 0 };
            assert_eq!(shift.rem_euclid(12), tonic, "tonic {tonic}");
            assert_eq!(flipped, tonic % 2 == 1);
        }
        assert_eq!(iv.placement(1), (-3, true));
        assert_eq!(iv.placement(4), (2, false));
    }

    #[test]
    fn out_of_range_pitches_have_no_midi_note() {
        let mut layout = layout();
        layout.shift_octave(-4);
        assert_eq!(midi_pitch(Pad::new(0, 7), &layout), None);
        layout.shift_octave(4);
        assert_eq!(midi_pitch(Pad::new(0, 7), &layout), Some(32));
    }
}
