//! Controller protocol: pad lights and numbered parameter writes, all as control changes on
//! channel 1 of the device output.

use crate::board::LightUpdate;
use crate::lights::LightColor;
use crate::message::control;
use crate::options::ChannelMode;
use crate::outbox::{Outgoing, Port};
use std::time::Duration;

pub const CC_COLUMN: u8 = 20;
pub const CC_ROW: u8 = 21;
pub const CC_COLOR: u8 = 22;

const CC_PARAM_MSB: u8 = 99;
const CC_PARAM_LSB: u8 = 98;
const CC_VALUE_MSB: u8 = 6;
const CC_VALUE_LSB: u8 = 38;
const CC_COMMIT_MSB: u8 = 101;
const CC_COMMIT_LSB: u8 = 100;
const COMMIT: u8 = 127;

/// Pause after every parameter write.
pub const SETTLE: Duration = Duration::from_millis(50);

/// Parameter numbers.
pub mod param {
    pub const MIDI_MODE_LEFT: u16 = 0;
    pub const MAIN_CHANNEL_LEFT: u16 = 1;
    /// Per-note channel 1 of the left half; channels 2-16 follow.
    pub const PER_NOTE_CHANNEL_LEFT: u16 = 2;
    pub const BEND_RANGE_LEFT: u16 = 19;
    pub const OCTAVE_LEFT: u16 = 36;
    pub const SEMITONE_LEFT: u16 = 37;
    pub const MIDI_MODE_RIGHT: u16 = 100;
    pub const MAIN_CHANNEL_RIGHT: u16 = 101;
    pub const PER_NOTE_CHANNEL_RIGHT: u16 = 102;
    pub const BEND_RANGE_RIGHT: u16 = 119;
    pub const OCTAVE_RIGHT: u16 = 136;
    pub const SEMITONE_RIGHT: u16 = 137;
    pub const SPLIT_ACTIVE: u16 = 200;
    pub const ROW_OFFSET: u16 = 227;
}

/// Raw light address, column 0 being the control column left of the pads.
pub fn raw_light(column: u8, row: u8, color: LightColor) -> Vec<Outgoing> {
    [
        control(0, CC_COLUMN, column),
        control(0, CC_ROW, row),
        control(0, CC_COLOR, color.index()),
    ]
    .into_iter()
    .map(|bytes| Outgoing::midi(Port::Device, bytes))
    .collect()
}

/// Light messages for a pad of a board `height` rows tall. The device counts rows from the
/// bottom and its pad columns start at 1.
pub fn light(update: LightUpdate, height: usize) -> Vec<Outgoing> {
    let row = height.saturating_sub(update.pad.row + 1);
    raw_light((update.pad.col + 1) as u8, row as u8, update.color)
}

/// Every pad back to the device's own color.
pub fn reset_lights(width: usize, height: usize) -> Vec<Outgoing> {
    let mut out = Vec::with_capacity(width * height * 3);
    for row in 0..height {
        for col in 0..width {
            out.extend(raw_light((col + 1) as u8, row as u8, LightColor::Default));
        }
    }
    out
}

/// One parameter write followed by the settle pause.
pub fn nrpn(number: u16, value: u16) -> Vec<Outgoing> {
    let split = |v: u16| (((v >> 7) & 0x7f) as u8, (v & 0x7f) as u8);
    let (number_msb, number_lsb) = split(number);
    let (value_msb, value_lsb) = split(value);
    let mut out: Vec<Outgoing> = [
        control(0, CC_PARAM_MSB, number_msb),
        control(0, CC_PARAM_LSB, number_lsb),
        control(0, CC_VALUE_MSB, value_msb),
        control(0, CC_VALUE_LSB, value_lsb),
        control(0, CC_COMMIT_MSB, COMMIT),
        control(0, CC_COMMIT_LSB, COMMIT),
    ]
    .into_iter()
    .map(|bytes| Outgoing::midi(Port::Device, bytes))
    .collect();
    out.push(Outgoing::Settle(SETTLE));
    out
}

fn nrpns(writes: &[(u16, u16)]) -> Vec<Outgoing> {
    writes.iter().flat_map(|&(n, v)| nrpn(n, v)).collect()
}

/// MIDI mode of both halves: per-note channels (1) or one channel (0). Switching off always
/// restores per-note channels.
pub fn midi_mode(on: bool, mode: ChannelMode) -> Vec<Outgoing> {
    let value = if !on || mode.is_per_note() { 1 } else { 0 };
    nrpns(&[(param::MIDI_MODE_LEFT, value), (param::MIDI_MODE_RIGHT, value)])
}

fn channels(on: bool, hardware_split: bool) -> Vec<Outgoing> {
    use param::*;
    if !on {
        return nrpn(ROW_OFFSET, 5);
    }
    // rows do not overlap
    let mut writes = vec![(ROW_OFFSET, 0), (MAIN_CHANNEL_LEFT, 1), (PER_NOTE_CHANNEL_LEFT, 0)];
    if hardware_split {
        // left half plays channels 2-8, right half 9-15 with 16 as its main channel
        writes.extend((3..10).map(|n| (n, 1)));
        writes.extend((10..18).map(|n| (n, 0)));
        writes.push((MAIN_CHANNEL_RIGHT, 16));
        writes.extend((PER_NOTE_CHANNEL_RIGHT + 8..PER_NOTE_CHANNEL_RIGHT + 15).map(|n| (n, 1)));
        writes.push((PER_NOTE_CHANNEL_RIGHT + 15, 0));
    } else {
        writes.extend((3..18).map(|n| (n, 1)));
    }
    nrpns(&writes)
}

fn transpose(on: bool) -> Vec<Outgoing> {
    use param::*;
    let (octave, semitone) = if on { (2, 13) } else { (5, 7) };
    let mut out = nrpns(&[
        (OCTAVE_LEFT, octave),
        (SEMITONE_LEFT, semitone),
        (OCTAVE_RIGHT, octave),
        (SEMITONE_RIGHT, semitone),
    ]);
    if on {
        // transpose button light off
        out.extend(raw_light(0, 4, LightColor::Off));
    }
    out
}

fn bend_range(on: bool) -> Vec<Outgoing> {
    let range = if on { 24 } else { 48 };
    nrpns(&[(param::BEND_RANGE_LEFT, range), (param::BEND_RANGE_RIGHT, range)])
}

fn split(on: bool, hardware_split: bool) -> Vec<Outgoing> {
    if !hardware_split {
        return nrpn(param::SPLIT_ACTIVE, 7);
    }
    let mut out = nrpn(param::SPLIT_ACTIVE, u16::from(on));
    out.extend(raw_light(
        0,
        1,
        if on { LightColor::Off } else { LightColor::Default },
    ));
    out
}

/// Full configuration session: `on` prepares the device for the engine, `!on` restores its
/// defaults.
pub fn configure(on: bool, mode: ChannelMode, hardware_split: bool) -> Vec<Outgoing> {
    let mut out = midi_mode(on, mode);
    if on {
        out.extend(channels(true, hardware_split));
        out.extend(transpose(true));
    } else {
        out.extend(transpose(false));
        out.extend(channels(false, hardware_split));
    }
    out.extend(bend_range(on));
    out.extend(split(on, hardware_split));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::Pad;

    fn midi(out: &[Outgoing]) -> Vec<Vec<u8>> {
        out.iter()
            .filter_map(|o| o.bytes().map(<[u8]>::to_vec))
            .collect()
    }

    #[test]
    fn light_uses_device_coordinates() {
        let update = LightUpdate {
            pad: Pad::new(0, 7),
            color: LightColor::Cyan,
        };
        assert_eq!(
            midi(&light(update, 8)),
            vec![vec![0xb0, 20, 1], vec![0xb0, 21, 0], vec![0xb0, 22, 4]]
        );
        assert!(light(update, 8).iter().all(|o| o.port() == Some(Port::Device)));
    }

    #[test]
    fn parameter_write_is_six_controls_and_a_pause() {
        let out = nrpn(param::ROW_OFFSET, 5);
        assert_eq!(out.len(), 7);
        assert_eq!(
            midi(&out),
            vec![
                vec![0xb0, 99, 1],
                vec![0xb0, 98, 227 - 128],
                vec![0xb0, 6, 0],
                vec![0xb0, 38, 5],
                vec![0xb0, 101, 127],
                vec![0xb0, 100, 127],
            ]
        );
        assert_eq!(out[6], Outgoing::Settle(SETTLE));
    }

    #[test]
    fn midi_mode_values() {
        let values = |out: Vec<Outgoing>| -> Vec<u8> {
            midi(&out)
                .into_iter()
                .filter(|m| m[1] == CC_VALUE_LSB)
                .map(|m| m[2])
                .collect()
        };
        assert_eq!(values(midi_mode(true, ChannelMode::PerNote)), vec![1, 1]);
        assert_eq!(values(midi_mode(true, ChannelMode::Single(0))), vec![0, 0]);
        assert_eq!(values(midi_mode(false, ChannelMode::Single(0))), vec![1, 1]);
    }

    #[test]
    fn session_write_counts() {
        let settles = |out: &[Outgoing]| {
            out.iter()
                .filter(|o| matches!(o, Outgoing::Settle(_)))
                .count()
        };
        // mode 2, channels 18, transpose 4, bend 2, split 1
        assert_eq!(settles(&configure(true, ChannelMode::PerNote, false)), 27);
        // mode 2, channels 3 + 7 + 8 + 1 + 7 + 1, transpose 4, bend 2, split 1
        assert_eq!(settles(&configure(true, ChannelMode::PerNote, true)), 36);
        // mode 2, transpose 4, row offset 1, bend 2, split 1
        assert_eq!(settles(&configure(false, ChannelMode::PerNote, true)), 10);
    }

    #[test]
    fn reset_covers_the_board() {
        let out = reset_lights(16, 8);
        assert_eq!(out.len(), 16 * 8 * 3);
        assert!(midi(&out).iter().skip(2).step_by(3).all(|m| m[2] == 0));
    }
}
