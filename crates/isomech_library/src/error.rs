//! Error types for the mapping engine.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("MIDI decode error: {0}")]
    Decode(String),

    #[error("Pad {col},{row} is outside the {width}x{height} board")]
    OutOfRange {
        col: usize,
        row: usize,
        width: usize,
        height: usize,
    },

    #[error("Pitch {0} is outside the MIDI range")]
    PitchRange(i32),
}

impl From<midly::Error> for Error {
    fn from(e: midly::Error) -> Self {
        Error::Decode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
