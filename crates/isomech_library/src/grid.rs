//! Secondary 8x8 grid controller in programmer layout.
//!
//! Pads send note numbers `10 * row + col`, both counted from 1 at the bottom left. The round
//! buttons above the grid send CC 91 and up.

use crate::engine::Action;
use crate::error::{Error, Result};
use crate::message::{decode, ChannelMessage, Incoming};
use crate::pitch::Pad;

pub const GRID_SIZE: usize = 8;
/// First of the buttons above the pads.
pub const CC_TOP_ROW: u8 = 91;

/// Top row buttons, left to right.
const TOP_ROW: [Action; 4] = [
    Action::OctaveUp,
    Action::OctaveDown,
    Action::MoveLeft,
    Action::MoveRight,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridEvent {
    Press { pad: Pad, velocity: u8 },
    Release { pad: Pad },
    Button(Action),
}

/// Board cell of a grid note number; the grid covers the leftmost columns of the board.
pub fn pad_of(note: u8) -> Result<Pad> {
    let (row, col) = ((note / 10) as usize, (note % 10) as usize);
    if !(1..=GRID_SIZE).contains(&row) || !(1..=GRID_SIZE).contains(&col) {
        return Err(Error::OutOfRange {
            col,
            row,
            width: GRID_SIZE,
            height: GRID_SIZE,
        });
    }
    Ok(Pad::new(col - 1, GRID_SIZE - row))
}

/// What a raw grid message means, if anything. Button releases are ignored.
pub fn parse(bytes: &[u8]) -> Result<Option<GridEvent>> {
    let Incoming::Channel { message, .. } = decode(bytes)? else {
        return Ok(None);
    };
    let event = match message {
        ChannelMessage::NoteOn { key, velocity } => Some(GridEvent::Press {
            pad: pad_of(key)?,
            velocity,
        }),
        ChannelMessage::NoteOff { key, .. } => Some(GridEvent::Release { pad: pad_of(key)? }),
        ChannelMessage::Control { controller, value } if value > 0 => controller
            .checked_sub(CC_TOP_ROW)
            .and_then(|i| TOP_ROW.get(i as usize))
            .map(|action| GridEvent::Button(*action)),
        _ => None,
    };
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners() {
        assert_eq!(pad_of(11).unwrap(), Pad::new(0, 7));
        assert_eq!(pad_of(18).unwrap(), Pad::new(7, 7));
        assert_eq!(pad_of(81).unwrap(), Pad::new(0, 0));
        assert_eq!(pad_of(88).unwrap(), Pad::new(7, 0));
    }

    #[test]
    fn side_buttons_and_gaps_are_not_pads() {
        assert!(pad_of(19).is_err());
        assert!(pad_of(10).is_err());
        assert!(pad_of(91).is_err());
        assert!(pad_of(5).is_err());
    }

    #[test]
    fn messages() {
        assert_eq!(
            parse(&[0x90, 23, 64]).unwrap(),
            Some(GridEvent::Press {
                pad: Pad::new(2, 6),
                velocity: 64
            })
        );
        assert_eq!(
            parse(&[0x90, 23, 0]).unwrap(),
            Some(GridEvent::Release { pad: Pad::new(2, 6) })
        );
        assert_eq!(
            parse(&[0xb0, 93, 127]).unwrap(),
            Some(GridEvent::Button(Action::MoveLeft))
        );
        assert_eq!(parse(&[0xb0, 93, 0]).unwrap(), None);
        assert_eq!(parse(&[0xb0, 97, 127]).unwrap(), None);
        assert!(parse(&[0x90, 99, 100]).is_err());
    }
}
