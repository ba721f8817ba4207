//! Validated engine options. The driver builds these from its settings file.

use crate::error::{Error, Result};
use crate::layout::BoardSize;
use crate::lights::Palette;
use crate::split::Region;
use std::str::FromStr;

/// How outgoing channel messages are addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    /// One channel per sounding note; the device channel passes through.
    PerNote,
    /// Everything goes out on this channel (0-15).
    Single(u8),
}

impl ChannelMode {
    /// `0` selects per-note channels, `1..=16` a single channel.
    pub fn from_one_channel(one_channel: u8) -> Result<Self> {
        match one_channel {
            0 => Ok(ChannelMode::PerNote),
            n @ 1..=16 => Ok(ChannelMode::Single(n - 1)),
            n => Err(Error::InvalidConfig(format!(
                "one_channel={n} (expected 0 for per-note channels, or 1-16)"
            ))),
        }
    }

    pub fn is_per_note(self) -> bool {
        self == ChannelMode::PerNote
    }

    pub fn channel(self, incoming: u8) -> u8 {
        match self {
            ChannelMode::PerNote => incoming,
            ChannelMode::Single(channel) => channel,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ChannelMode::PerNote => ChannelMode::Single(0),
            ChannelMode::Single(_) => ChannelMode::PerNote,
        }
    }
}

/// Outputs receiving the sustain pedal while the split is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SustainSplit {
    Left,
    Right,
    Both,
}

impl SustainSplit {
    pub fn regions(self) -> &'static [Region] {
        match self {
            SustainSplit::Left => &[Region::Main],
            SustainSplit::Right => &[Region::Split],
            SustainSplit::Both => &[Region::Main, Region::Split],
        }
    }
}

impl FromStr for SustainSplit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(SustainSplit::Left),
            "right" => Ok(SustainSplit::Right),
            "both" => Ok(SustainSplit::Both),
            other => Err(Error::InvalidConfig(format!(
                "sustain_split={other:?} (expected: \"left\", \"right\", \"both\")"
            ))),
        }
    }
}

const CURVE_EPSILON: f32 = 0.0001;

/// Note-on velocity shaping: `(v/127)^curve`, then clamped to `min..=max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityCurve {
    pub curve: f32,
    /// Curve at full right expression pedal (loudest).
    pub low: f32,
    /// Curve with the right expression pedal released (quietest).
    pub high: f32,
    pub min: u8,
    pub max: u8,
}

impl Default for VelocityCurve {
    fn default() -> Self {
        Self {
            curve: 1.0,
            low: 0.5,
            high: 3.0,
            min: 0,
            max: 127,
        }
    }
}

impl VelocityCurve {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("velocity_curve", self.curve),
            ("velocity_curve_low", self.low),
            ("velocity_curve_high", self.high),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "{name}={value} (expected a positive number)"
                )));
            }
        }
        if self.min > self.max || self.max > 127 {
            return Err(Error::InvalidConfig(format!(
                "min_velocity={} max_velocity={} (expected 0 <= min <= max <= 127)",
                self.min, self.max
            )));
        }
        Ok(())
    }

    fn bends(&self) -> bool {
        (self.curve - 1.0).abs() > CURVE_EPSILON
    }

    pub fn is_identity(&self) -> bool {
        !self.bends() && self.min == 0 && self.max >= 127
    }

    pub fn apply(&self, velocity: u8) -> u8 {
        if self.is_identity() {
            return velocity;
        }
        let mut v = f32::from(velocity.min(127)) / 127.0;
        if self.bends() {
            v = v.powf(self.curve);
        }
        let shaped = (v * 127.0 + 0.5) as i32;
        shaped.clamp(i32::from(self.min), i32::from(self.max)) as u8
    }

    /// Right expression pedal: released is the quietest curve, fully down the loudest.
    pub fn follow_pedal(&mut self, value: u8) {
        let released = 1.0 - f32::from(value.min(127)) / 127.0;
        self.curve = self.low + released * (self.high - self.low);
    }
}

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub size: BoardSize,
    pub hardware_split: bool,
    pub channel_mode: ChannelMode,
    pub velocity: VelocityCurve,
    pub palette: Palette,
    /// Start with the split on.
    pub split: bool,
    pub sustain_split: SustainSplit,
    /// Track a second chord for the left side of the board.
    pub jazz: bool,
    pub chord_analyzer: bool,
    /// Hold pitch bend at center for notes on the main side while split.
    pub stable_left: bool,
    pub stable_right: bool,
    pub octave: i32,
    /// Octaves added to pitches arriving on the visualizer input.
    pub visualizer_octave: i32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            size: BoardSize::Small,
            hardware_split: false,
            channel_mode: ChannelMode::PerNote,
            velocity: VelocityCurve::default(),
            palette: Palette::default(),
            split: false,
            sustain_split: SustainSplit::Both,
            jazz: false,
            chord_analyzer: false,
            stable_left: false,
            stable_right: false,
            octave: 0,
            visualizer_octave: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_channel_values() {
        assert_eq!(ChannelMode::from_one_channel(0).unwrap(), ChannelMode::PerNote);
        assert_eq!(ChannelMode::from_one_channel(1).unwrap(), ChannelMode::Single(0));
        assert_eq!(ChannelMode::from_one_channel(16).unwrap(), ChannelMode::Single(15));
        assert!(ChannelMode::from_one_channel(17).is_err());
        assert_eq!(ChannelMode::Single(4).channel(9), 4);
        assert_eq!(ChannelMode::PerNote.channel(9), 9);
    }

    #[test]
    fn sustain_split_parsing() {
        assert_eq!("Right".parse::<SustainSplit>().unwrap(), SustainSplit::Right);
        assert_eq!(" both ".parse::<SustainSplit>().unwrap(), SustainSplit::Both);
        assert!("middle".parse::<SustainSplit>().is_err());
    }

    #[test]
    fn identity_curve_passes_velocity_through() {
        let curve = VelocityCurve::default();
        assert!(curve.is_identity());
        assert_eq!(curve.apply(0), 0);
        assert_eq!(curve.apply(93), 93);
    }

    #[test]
    fn curve_and_clamp() {
        let squared = VelocityCurve {
            curve: 2.0,
            ..Default::default()
        };
        assert_eq!(squared.apply(127), 127);
        // (64/127)^2 * 127 = 32.25
        assert_eq!(squared.apply(64), 32);

        let clamped = VelocityCurve {
            min: 20,
            max: 100,
            ..Default::default()
        };
        assert_eq!(clamped.apply(5), 20);
        assert_eq!(clamped.apply(64), 64);
        assert_eq!(clamped.apply(127), 100);
    }

    #[test]
    fn pedal_moves_between_low_and_high() {
        let mut curve = VelocityCurve::default();
        curve.follow_pedal(127);
        assert!((curve.curve - curve.low).abs() < 1e-6);
        curve.follow_pedal(0);
        assert!((curve.curve - curve.high).abs() < 1e-6);
    }

    #[test]
    fn invalid_curves_are_rejected() {
        let zero = VelocityCurve {
            curve: 0.0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());
        let inverted = VelocityCurve {
            min: 90,
            max: 10,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
        assert!(VelocityCurve::default().validate().is_ok());
    }
}
