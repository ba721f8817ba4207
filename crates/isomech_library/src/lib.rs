//! Whole tone isomorphic layout engine for pad grid MIDI controllers.
//!
//! Pads are mapped to pitches, optionally split diagonally between two outputs, and every
//! sounding note is mirrored on the board and on the controller lights.

pub mod board;
pub mod chords;
pub mod device;
pub mod engine;
pub mod error;
pub mod grid;
pub mod layout;
pub mod lights;
pub mod message;
pub mod options;
pub mod outbox;
pub mod pitch;
pub mod scales;
pub mod split;
pub mod tracker;

pub use engine::{Action, Engine, InputSource};
pub use error::{Error, Result};
pub use layout::{BoardSize, LayoutState};
pub use options::{ChannelMode, EngineOptions, SustainSplit, VelocityCurve};
pub use outbox::{Connected, Outgoing, Port};
pub use pitch::Pad;
pub use scales::{Scale, ScaleDb};
