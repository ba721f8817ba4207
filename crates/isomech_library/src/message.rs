//! Raw MIDI bytes in, typed channel messages out (and back).

use crate::error::{Error, Result};
use midly::live::LiveEvent;
use midly::MidiMessage;

pub const CC_MOD_WHEEL: u8 = 1;
pub const CC_VOLUME: u8 = 7;
pub const CC_LEFT_EXPRESSION: u8 = 27;
pub const CC_SUSTAIN: u8 = 64;
pub const CC_SOFT_PEDAL: u8 = 67;
pub const CC_ALL_NOTES_OFF: u8 = 123;

/// Pitch bend wheel at rest.
pub const BEND_CENTER: (u8, u8) = (0, 64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMessage {
    NoteOff { key: u8, velocity: u8 },
    NoteOn { key: u8, velocity: u8 },
    PolyPressure { key: u8, pressure: u8 },
    Control { controller: u8, value: u8 },
    Program { program: u8 },
    ChannelPressure { pressure: u8 },
    PitchBend { lsb: u8, msb: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Channel { channel: u8, message: ChannelMessage },
    /// System common, sysex or realtime; passed through untouched.
    System(Vec<u8>),
}

/// Parse one raw message. A note-on with velocity 0 comes back as a note-off.
pub fn decode(bytes: &[u8]) -> Result<Incoming> {
    if bytes.is_empty() {
        return Err(Error::Decode("empty message".to_string()));
    }
    let event = LiveEvent::parse(bytes)?;
    let LiveEvent::Midi { channel, message } = event else {
        return Ok(Incoming::System(bytes.to_vec()));
    };
    let message = match message {
        MidiMessage::NoteOff { key, vel } => ChannelMessage::NoteOff {
            key: key.as_int(),
            velocity: vel.as_int(),
        },
        MidiMessage::NoteOn { key, vel } if vel.as_int() == 0 => ChannelMessage::NoteOff {
            key: key.as_int(),
            velocity: 0,
        },
        MidiMessage::NoteOn { key, vel } => ChannelMessage::NoteOn {
            key: key.as_int(),
            velocity: vel.as_int(),
        },
        MidiMessage::Aftertouch { key, vel } => ChannelMessage::PolyPressure {
            key: key.as_int(),
            pressure: vel.as_int(),
        },
        MidiMessage::Controller { controller, value } => ChannelMessage::Control {
            controller: controller.as_int(),
            value: value.as_int(),
        },
        MidiMessage::ProgramChange { program } => ChannelMessage::Program {
            program: program.as_int(),
        },
        MidiMessage::ChannelAftertouch { vel } => ChannelMessage::ChannelPressure {
            pressure: vel.as_int(),
        },
        MidiMessage::PitchBend { bend } => {
            let raw = bend.0.as_int();
            ChannelMessage::PitchBend {
                lsb: (raw & 0x7f) as u8,
                msb: (raw >> 7) as u8,
            }
        }
    };
    Ok(Incoming::Channel {
        channel: channel.as_int(),
        message,
    })
}

impl ChannelMessage {
    fn status(&self) -> u8 {
        match self {
            ChannelMessage::NoteOff { .. } => 0x80,
            ChannelMessage::NoteOn { .. } => 0x90,
            ChannelMessage::PolyPressure { .. } => 0xa0,
            ChannelMessage::Control { .. } => 0xb0,
            ChannelMessage::Program { .. } => 0xc0,
            ChannelMessage::ChannelPressure { .. } => 0xd0,
            ChannelMessage::PitchBend { .. } => 0xe0,
        }
    }

    pub fn to_bytes(&self, channel: u8) -> Vec<u8> {
        let status = self.status() | (channel & 0x0f);
        match *self {
            ChannelMessage::NoteOff { key, velocity } | ChannelMessage::NoteOn { key, velocity } => {
                vec![status, key & 0x7f, velocity & 0x7f]
            }
            ChannelMessage::PolyPressure { key, pressure } => {
                vec![status, key & 0x7f, pressure & 0x7f]
            }
            ChannelMessage::Control { controller, value } => {
                vec![status, controller & 0x7f, value & 0x7f]
            }
            ChannelMessage::Program { program } => vec![status, program & 0x7f],
            ChannelMessage::ChannelPressure { pressure } => vec![status, pressure & 0x7f],
            ChannelMessage::PitchBend { lsb, msb } => vec![status, lsb & 0x7f, msb & 0x7f],
        }
    }
}

pub fn note_on(channel: u8, key: u8, velocity: u8) -> Vec<u8> {
    ChannelMessage::NoteOn { key, velocity }.to_bytes(channel)
}

pub fn note_off(channel: u8, key: u8) -> Vec<u8> {
    ChannelMessage::NoteOff { key, velocity: 0 }.to_bytes(channel)
}

pub fn control(channel: u8, controller: u8, value: u8) -> Vec<u8> {
    ChannelMessage::Control { controller, value }.to_bytes(channel)
}

/// All notes off on every channel.
pub fn all_notes_off() -> impl Iterator<Item = Vec<u8>> {
    (0..16).map(|channel| control(channel, CC_ALL_NOTES_OFF, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_note_on() {
        assert_eq!(
            decode(&[0x93, 60, 100]).unwrap(),
            Incoming::Channel {
                channel: 3,
                message: ChannelMessage::NoteOn {
                    key: 60,
                    velocity: 100
                }
            }
        );
    }

    #[test]
    fn zero_velocity_note_on_is_note_off() {
        assert_eq!(
            decode(&[0x90, 60, 0]).unwrap(),
            Incoming::Channel {
                channel: 0,
                message: ChannelMessage::NoteOff {
                    key: 60,
                    velocity: 0
                }
            }
        );
    }

    #[test]
    fn decode_pitch_bend_keeps_both_bytes() {
        let bytes = [0xe5, 0x12, 0x50];
        let Incoming::Channel { channel, message } = decode(&bytes).unwrap() else {
            panic!("expected a channel message");
        };
        assert_eq!(channel, 5);
        assert_eq!(message, ChannelMessage::PitchBend { lsb: 0x12, msb: 0x50 });
        assert_eq!(message.to_bytes(5), bytes.to_vec());
    }

    #[test]
    fn system_messages_pass_through() {
        let sysex = [0xf0, 0x7e, 0x7f, 0x06, 0x01, 0xf7];
        assert_eq!(decode(&sysex).unwrap(), Incoming::System(sysex.to_vec()));
        assert_eq!(decode(&[0xf8]).unwrap(), Incoming::System(vec![0xf8]));
    }

    #[test]
    fn malformed_messages_are_errors() {
        assert!(decode(&[]).is_err());
        assert!(matches!(decode(&[0x90, 60]), Err(Error::Decode(_))));
    }

    #[test]
    fn channel_is_rewritten_on_encode() {
        let message = ChannelMessage::Control {
            controller: CC_SUSTAIN,
            value: 127,
        };
        assert_eq!(message.to_bytes(9), vec![0xb9, 64, 127]);
        assert_eq!(all_notes_off().count(), 16);
    }
}
