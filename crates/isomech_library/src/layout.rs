//! Mutable layout configuration: board geometry, octave, position, tonic, flip/rotate, split and
//! scale. Changed only through the transition methods below.

use crate::error::{Error, Result};
use crate::pitch::{Intervals, Pad};
use crate::scales::ScaleSelection;

pub const BOARD_HEIGHT: usize = 8;

/// Hardware-split channels at or above this number come from the right half.
const RIGHT_HALF_FIRST_CHANNEL: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardSize {
    /// 128 pads, 16 columns.
    Small,
    /// 200 pads, 25 columns.
    Large,
}

impl BoardSize {
    pub fn from_pad_count(pads: u32) -> Result<Self> {
        match pads {
            128 => Ok(BoardSize::Small),
            200 => Ok(BoardSize::Large),
            other => Err(Error::InvalidConfig(format!(
                "size={other} (expected 128 or 200)"
            ))),
        }
    }

    pub fn pad_count(self) -> u32 {
        match self {
            BoardSize::Small => 128,
            BoardSize::Large => 200,
        }
    }

    pub fn width(self) -> usize {
        match self {
            BoardSize::Small => 16,
            BoardSize::Large => 25,
        }
    }

    /// Column counts reported by the left and right halves under a hardware split.
    pub fn hardware_widths(self) -> (usize, usize) {
        match self {
            BoardSize::Small => (8, 8),
            BoardSize::Large => (11, 14),
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            BoardSize::Small => BoardSize::Large,
            BoardSize::Large => BoardSize::Small,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutState {
    intervals: Intervals,
    size: BoardSize,
    /// Hardware split as configured; a large board always splits regardless.
    hardware_split: bool,
    octave: i32,
    position_x: i32,
    tonic: u8,
    flipped: bool,
    rotated: bool,
    split_enabled: bool,
    scale: ScaleSelection,
}

impl LayoutState {
    pub fn new(size: BoardSize, hardware_split: bool, scale: ScaleSelection) -> Self {
        Self {
            intervals: Intervals::default(),
            size,
            hardware_split,
            octave: 0,
            position_x: 0,
            tonic: 0,
            flipped: false,
            rotated: false,
            split_enabled: false,
            scale,
        }
    }

    pub fn intervals(&self) -> &Intervals {
        &self.intervals
    }

    pub fn size(&self) -> BoardSize {
        self.size
    }

    pub fn width(&self) -> usize {
        self.size.width()
    }

    pub fn height(&self) -> usize {
        BOARD_HEIGHT
    }

    pub fn hardware_split(&self) -> bool {
        self.hardware_split || self.size == BoardSize::Large
    }

    pub fn octave(&self) -> i32 {
        self.octave
    }

    pub fn position_x(&self) -> i32 {
        self.position_x
    }

    pub fn tonic(&self) -> u8 {
        self.tonic
    }

    pub fn flipped(&self) -> bool {
        self.flipped
    }

    pub fn rotated(&self) -> bool {
        self.rotated
    }

    pub fn split_enabled(&self) -> bool {
        self.split_enabled
    }

    pub fn scale(&self) -> &ScaleSelection {
        &self.scale
    }

    pub fn contains(&self, pad: Pad) -> bool {
        pad.col < self.width() && pad.row < self.height()
    }

    pub fn shift_octave(&mut self, delta: i32) {
        self.octave += delta;
    }

    pub fn shift_position(&mut self, delta: i32) {
        self.position_x += delta;
    }

    /// Set the tonic and move the board so that it sounds in the new key. Every pad keeps its
    /// scale degree.
    pub fn set_tonic(&mut self, tonic: i32) {
        let tonic = tonic.rem_euclid(12);
        let (position, flipped) = self.intervals.placement(tonic);
        self.tonic = tonic as u8;
        self.flipped = flipped;
        self.position_x = position - self.rotation_offset();
    }

    pub fn toggle_flip(&mut self) {
        self.flipped = !self.flipped;
    }

    pub fn toggle_rotate(&mut self) {
        if self.rotated {
            self.position_x += self.intervals.rotation;
        } else {
            self.position_x -= self.intervals.rotation;
        }
        self.rotated = !self.rotated;
    }

    pub fn set_split(&mut self, enabled: bool) {
        self.split_enabled = enabled;
    }

    pub fn set_size(&mut self, size: BoardSize) {
        self.size = size;
    }

    pub fn set_scale(&mut self, scale: ScaleSelection) {
        self.scale = scale;
    }

    fn rotation_offset(&self) -> i32 {
        if self.rotated { self.intervals.rotation } else { 0 }
    }

    /// Decode a device note number into a pad. Under a hardware split each half numbers its
    /// pads in its own width and the channel tells the halves apart.
    pub fn decode_pad(&self, channel: u8, key: u8) -> Result<Pad> {
        let (width, col_offset) = if self.hardware_split() {
            let (left, right) = self.size.hardware_widths();
            if channel >= RIGHT_HALF_FIRST_CHANNEL {
                (right, left)
            } else {
                (left, 0)
            }
        } else {
            (self.width(), 0)
        };

        let key = key as usize;
        let device_row = key / width;
        let col = key % width + col_offset;
        if device_row >= self.height() || col >= self.width() {
            return Err(Error::OutOfRange {
                col,
                row: device_row,
                width: self.width(),
                height: self.height(),
            });
        }
        Ok(Pad::new(col, self.height() - 1 - device_row))
    }
}
