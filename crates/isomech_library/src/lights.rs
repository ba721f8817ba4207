//! Pad light colors and the steady (not pressed) color of every pad.

use crate::error::{Error, Result};
use crate::layout::LayoutState;
use crate::pitch::{degree, Pad};
use crate::split::{region, Region};
use num_derive::FromPrimitive;

/// Indexed colors understood by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
pub enum LightColor {
    /// Whatever the device shows on its own.
    Default = 0,
    Red = 1,
    Yellow = 2,
    Green = 3,
    Cyan = 4,
    Blue = 5,
    Magenta = 6,
    Off = 7,
    White = 8,
    Orange = 9,
    Lime = 10,
    Pink = 11,
}

/// Color of a pad while it is pressed.
pub const MARK_COLOR: LightColor = LightColor::Red;

impl LightColor {
    pub fn from_index(index: u8) -> Result<Self> {
        num::FromPrimitive::from_u8(index).ok_or_else(|| {
            Error::InvalidConfig(format!("light color {index} is not a color index (0-11)"))
        })
    }

    pub fn index(self) -> u8 {
        self as u8
    }
}

/// Per scale degree colors for both split regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub main: [LightColor; 12],
    pub split: [LightColor; 12],
}

impl Default for Palette {
    fn default() -> Self {
        use LightColor::*;
        Self {
            main: [
                Cyan, Green, Green, Green, Green, Green, Green, Green, Green, Green, Green, Green,
            ],
            split: [
                Cyan, Blue, Blue, Blue, Blue, Blue, Blue, Blue, Blue, Blue, Blue, Blue,
            ],
        }
    }
}

impl Palette {
    pub fn from_indices(main: &[u8], split: &[u8]) -> Result<Self> {
        Ok(Self {
            main: Self::parse("lights", main)?,
            split: Self::parse("split_lights", split)?,
        })
    }

    fn parse(name: &str, indices: &[u8]) -> Result<[LightColor; 12]> {
        if indices.len() != 12 {
            return Err(Error::InvalidConfig(format!(
                "{name} should have 12 colors exactly (found {})",
                indices.len()
            )));
        }
        let mut colors = [LightColor::Default; 12];
        for (color, index) in colors.iter_mut().zip(indices) {
            *color = LightColor::from_index(*index)?;
        }
        Ok(colors)
    }

    pub fn color(&self, region: Region, degree: usize) -> LightColor {
        match region {
            Region::Main => self.main[degree % 12],
            Region::Split => self.split[degree % 12],
        }
    }
}

/// What a pad shows when nobody is pressing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteadyColor {
    InScale(LightColor),
    OutOfScale,
}

impl SteadyColor {
    pub fn light(self) -> LightColor {
        match self {
            SteadyColor::InScale(color) => color,
            SteadyColor::OutOfScale => LightColor::Off,
        }
    }
}

pub fn steady_color(pad: Pad, layout: &LayoutState, palette: &Palette) -> SteadyColor {
    let degree = degree(pad, layout);
    if layout.scale().in_scale(degree) {
        SteadyColor::InScale(palette.color(region(pad, layout), degree))
    } else {
        SteadyColor::OutOfScale
    }
}
