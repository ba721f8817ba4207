//! Polyphony table: one slot per device channel, each holding the pad pressed on that channel.
//!
//! The output region is pinned at note-on so the matching note-off goes where the note-on went,
//! whatever happens to the split meanwhile.

use crate::error::{Error, Result};
use crate::layout::LayoutState;
use crate::pitch::{absolute_pitch, Pad};
use crate::split::{region, side, Region};
use std::collections::BTreeSet;
use tracing::trace;

pub const POLYPHONY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeldNote {
    pub pad: Pad,
    /// Pitch sent at note-on.
    pub pitch: u8,
    /// Where the note-on was routed.
    pub region: Region,
    /// Side of the diagonal, whether or not the split is on.
    pub side: Region,
    pub velocity: u8,
    pub pressure: u8,
    /// Cut off by a panic; the eventual note-off is not sent.
    pub silenced: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NoteTracker {
    slots: [Option<HeldNote>; POLYPHONY],
    /// Sounding pitches.
    chord: BTreeSet<u8>,
    /// Sounding pitches on the left side.
    left: BTreeSet<u8>,
    changed: bool,
}

impl NoteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a note on `channel`. Returns the new note and, if the channel was still holding
    /// one, the note it replaces.
    pub fn on(
        &mut self,
        channel: u8,
        pad: Pad,
        velocity: u8,
        layout: &LayoutState,
    ) -> Result<(HeldNote, Option<HeldNote>)> {
        let slot = channel as usize;
        if slot >= POLYPHONY {
            return Err(Error::Decode(format!("channel {channel} is out of range")));
        }
        let absolute = absolute_pitch(pad, layout);
        let pitch = u8::try_from(absolute)
            .ok()
            .filter(|p| *p < 128)
            .ok_or(Error::PitchRange(absolute))?;

        let replaced = self.off(channel);
        if let Some(stale) = &replaced {
            trace!("channel {channel} restarted while holding {:?}", stale.pad);
        }

        let note = HeldNote {
            pad,
            pitch,
            region: region(pad, layout),
            side: side(pad, layout),
            velocity,
            pressure: velocity,
            silenced: false,
        };
        self.slots[slot] = Some(note);
        self.chord.insert(pitch);
        if note.side == Region::Main {
            self.left.insert(pitch);
        }
        self.changed = true;
        Ok((note, replaced))
    }

    /// End the note on `channel`, if any.
    pub fn off(&mut self, channel: u8) -> Option<HeldNote> {
        let note = self.slots.get_mut(channel as usize)?.take()?;
        self.forget(note.pitch);
        self.changed = true;
        Some(note)
    }

    pub fn get(&self, channel: u8) -> Option<&HeldNote> {
        self.slots.get(channel as usize)?.as_ref()
    }

    pub fn set_pressure(&mut self, channel: u8, pressure: u8) -> Option<&HeldNote> {
        let note = self.slots.get_mut(channel as usize)?.as_mut()?;
        note.pressure = pressure;
        Some(note)
    }

    pub fn held(&self) -> impl Iterator<Item = (u8, &HeldNote)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(channel, slot)| slot.as_ref().map(|note| (channel as u8, note)))
    }

    pub fn held_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Whether any channel still holds `pitch`, silenced or not.
    pub fn holds_pitch(&self, pitch: u8) -> bool {
        self.slots.iter().flatten().any(|n| n.pitch == pitch)
    }

    fn sounding(&self, pitch: u8, side: Option<Region>) -> bool {
        self.slots
            .iter()
            .flatten()
            .any(|n| !n.silenced && n.pitch == pitch && side.is_none_or(|s| n.side == s))
    }

    fn forget(&mut self, pitch: u8) {
        if !self.sounding(pitch, None) {
            self.chord.remove(&pitch);
        }
        if !self.sounding(pitch, Some(Region::Main)) {
            self.left.remove(&pitch);
        }
    }

    /// Mark notes routed to `only` (or every note) as cut off by a panic. Returns how many
    /// notes were silenced.
    pub fn silence(&mut self, only: Option<Region>) -> usize {
        let mut pitches = Vec::new();
        for note in self.slots.iter_mut().flatten() {
            if !note.silenced && only.is_none_or(|r| note.region == r) {
                note.silenced = true;
                pitches.push(note.pitch);
            }
        }
        for pitch in &pitches {
            self.forget(*pitch);
        }
        if !pitches.is_empty() {
            self.changed = true;
        }
        pitches.len()
    }

    pub fn chord_notes(&self) -> &BTreeSet<u8> {
        &self.chord
    }

    pub fn left_notes(&self) -> &BTreeSet<u8> {
        &self.left
    }

    /// Whether the sounding set changed since the last call.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }
}
