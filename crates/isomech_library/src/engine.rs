//! The mapping engine: device events in, MIDI and light updates out.
//!
//! Everything runs on the caller's thread. Events are applied in the order they are handed in
//! and every outgoing message lands in an outbox that [`Engine::frame`] drains.

use crate::board::Board;
use crate::chords::{ChordDetector, TemplateDetector};
use crate::device;
use crate::error::{Error, Result};
use crate::grid::{self, GridEvent};
use crate::layout::{BoardSize, LayoutState};
use crate::message::{
    self, decode, ChannelMessage, Incoming, BEND_CENTER, CC_LEFT_EXPRESSION, CC_SOFT_PEDAL,
    CC_SUSTAIN, CC_VOLUME,
};
use crate::options::EngineOptions;
use crate::outbox::{Connected, Outgoing, Port};
use crate::pitch::{absolute_pitch, degree, midi_pitch, note_name, Pad};
use crate::scales::ScaleDb;
use crate::split::{region, Region};
use crate::tracker::{HeldNote, NoteTracker};
use tracing::{debug, info, trace, warn};

/// Tracker slot for notes played on the grid, which has one voice.
const GRID_CHANNEL: u8 = 0;

/// Where an incoming message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    /// The pad controller.
    Device,
    /// Notes to show on the board without playing them.
    Visualizer,
    Foot,
    /// Secondary 8x8 grid playing the leftmost columns of the board.
    Grid,
}

/// Layout and session commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    OctaveUp,
    OctaveDown,
    /// Move the board one column left: every pad sounds a column interval lower.
    MoveLeft,
    MoveRight,
    TonicUp,
    TonicDown,
    Rotate,
    Flip,
    Split,
    ChannelMode,
    NextScale,
    PrevScale,
    NextMode,
    PrevMode,
    ToggleSize,
    Panic,
}

/// Note held with the on-screen pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PointerNote {
    pad: Pad,
    pitch: u8,
    region: Region,
}

pub struct Engine {
    options: EngineOptions,
    scales: ScaleDb,
    connected: Connected,
    layout: LayoutState,
    board: Board,
    tracker: NoteTracker,
    detector: Box<dyn ChordDetector + Send>,
    chord: Option<String>,
    left_chord: Option<String>,
    pointer: Option<PointerNote>,
    outbox: Vec<Outgoing>,
    dirty: bool,
    dirty_lights: bool,
}

impl Engine {
    pub fn new(options: EngineOptions, scales: ScaleDb, connected: Connected) -> Self {
        let mut layout = LayoutState::new(options.size, options.hardware_split, scales.select(0, 0));
        layout.shift_octave(options.octave);
        if options.split && !connected.split {
            warn!("Split requested but no split output is connected, starting unsplit");
        }
        layout.set_split(options.split && connected.split);
        let board = Board::new(layout.width(), layout.height());

        Self {
            options,
            scales,
            connected,
            layout,
            board,
            tracker: NoteTracker::new(),
            detector: Box::new(TemplateDetector),
            chord: None,
            left_chord: None,
            pointer: None,
            outbox: Vec::new(),
            dirty: true,
            dirty_lights: true,
        }
    }

    pub fn with_detector(mut self, detector: Box<dyn ChordDetector + Send>) -> Self {
        self.detector = detector;
        self
    }

    pub fn layout(&self) -> &LayoutState {
        &self.layout
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn tracker(&self) -> &NoteTracker {
        &self.tracker
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn chord(&self) -> Option<&str> {
        self.chord.as_deref()
    }

    pub fn left_chord(&self) -> Option<&str> {
        self.left_chord.as_deref()
    }

    /// Something visible changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn split_active(&self) -> bool {
        self.layout.split_enabled()
    }

    fn out_channel(&self, channel: u8) -> u8 {
        self.options.channel_mode.channel(channel)
    }

    fn emit(&mut self, port: Port, bytes: Vec<u8>) {
        if self.connected.has(port) {
            self.outbox.push(Outgoing::Midi { port, bytes });
        } else {
            trace!("No {:?} output, dropping {:02x?}", port, bytes);
        }
    }

    fn emit_all(&mut self, messages: Vec<Outgoing>) {
        for message in messages {
            match message {
                Outgoing::Midi { port, bytes } => self.emit(port, bytes),
                Outgoing::Settle(_) if self.connected.device => self.outbox.push(message),
                Outgoing::Settle(_) => {}
            }
        }
    }

    /// Feed one raw message. Anything that cannot be used is logged and dropped.
    pub fn handle(&mut self, source: InputSource, bytes: &[u8]) {
        let result = match source {
            InputSource::Device => self.device_event(bytes),
            InputSource::Visualizer => self.visualizer_event(bytes),
            InputSource::Foot => self.foot_event(bytes),
            InputSource::Grid => self.grid_event(bytes),
        };
        if let Err(e) = result {
            warn!("Dropped {:?} input {:02x?}: {}", source, bytes, e);
        }
    }

    fn device_event(&mut self, bytes: &[u8]) -> Result<()> {
        let (channel, message) = match decode(bytes)? {
            Incoming::System(bytes) => {
                self.emit(Port::Main, bytes);
                return Ok(());
            }
            Incoming::Channel { channel, message } => (channel, message),
        };
        match message {
            ChannelMessage::NoteOn { key, velocity } => self.note_on_event(channel, key, velocity),
            ChannelMessage::NoteOff { key, .. } => self.note_off_event(channel, key),
            ChannelMessage::PolyPressure { pressure, .. } => {
                self.poly_pressure(channel, pressure);
                Ok(())
            }
            ChannelMessage::PitchBend { lsb, msb } => {
                self.pitch_bend(channel, lsb, msb);
                Ok(())
            }
            ChannelMessage::Control {
                controller: CC_SUSTAIN,
                value,
            } => {
                self.sustain(channel, value);
                Ok(())
            }
            other => {
                self.route(channel, other);
                Ok(())
            }
        }
    }

    /// A pad went down on `channel`.
    pub fn note_on_event(&mut self, channel: u8, key: u8, velocity: u8) -> Result<()> {
        let pad = self.layout.decode_pad(channel, key)?;
        self.play(channel, pad, velocity)
    }

    fn play(&mut self, channel: u8, pad: Pad, velocity: u8) -> Result<()> {
        let velocity = self.options.velocity.apply(velocity);
        let (note, replaced) = self.tracker.on(channel, pad, velocity, &self.layout)?;
        if let Some(stale) = replaced {
            self.finish(channel, stale);
        }

        self.board
            .mark(note.pitch.into(), true, Some(pad.row), &self.layout, None);
        let out = self.out_channel(channel);
        self.emit(note.region.port(), message::note_on(out, note.pitch, velocity));
        self.dirty = true;
        debug!(
            "on  ch{:<2} {:?} {}{} -> {:?}",
            channel,
            pad,
            note_name(note.pitch.into()),
            i32::from(note.pitch) / 12 - 1,
            note.region
        );
        Ok(())
    }

    /// A pad came up on `channel`. Channels with no tracked note are ignored.
    pub fn note_off_event(&mut self, channel: u8, key: u8) -> Result<()> {
        match self.tracker.off(channel) {
            Some(note) => {
                debug!("off ch{:<2} {:?} -> {:?}", channel, note.pad, note.region);
                self.finish(channel, note);
            }
            None => trace!("Note-off for idle channel {} (key {})", channel, key),
        }
        Ok(())
    }

    /// Unlight a released note and send its note-off where the note-on went.
    fn finish(&mut self, channel: u8, note: HeldNote) {
        if !self.tracker.holds_pitch(note.pitch) {
            self.board
                .mark(note.pitch.into(), false, Some(note.pad.row), &self.layout, None);
        }
        if note.silenced {
            trace!("{:?} was silenced by a panic, no note-off", note.pad);
        } else {
            let out = self.out_channel(channel);
            self.emit(note.region.port(), message::note_off(out, note.pitch));
        }
        self.dirty = true;
    }

    fn poly_pressure(&mut self, channel: u8, pressure: u8) {
        let out = self.out_channel(channel);
        let Some(note) = self.tracker.set_pressure(channel, pressure).copied() else {
            trace!("Pressure on idle channel {}", channel);
            return;
        };
        if note.silenced {
            return;
        }
        let bytes = ChannelMessage::PolyPressure {
            key: note.pitch,
            pressure,
        }
        .to_bytes(out);
        self.emit(note.region.port(), bytes);
    }

    fn pitch_bend(&mut self, channel: u8, lsb: u8, msb: u8) {
        let pinned = self.tracker.get(channel).map(|note| note.region);
        if let (true, Some(region)) = (self.split_active(), pinned) {
            let stable = match region {
                Region::Main => self.options.stable_left,
                Region::Split => self.options.stable_right,
            };
            if stable {
                let (lsb, msb) = BEND_CENTER;
                let bytes = ChannelMessage::PitchBend { lsb, msb }.to_bytes(self.out_channel(channel));
                self.emit(region.port(), bytes);
                return;
            }
        }
        self.route(channel, ChannelMessage::PitchBend { lsb, msb });
    }

    fn sustain(&mut self, channel: u8, value: u8) {
        let bytes = message::control(self.out_channel(channel), CC_SUSTAIN, value);
        if self.split_active() {
            for region in self.options.sustain_split.regions() {
                self.emit(region.port(), bytes.clone());
            }
        } else {
            self.emit(Port::Main, bytes);
        }
    }

    /// Everything else: the global channel goes to both sides, a channel holding a note to the
    /// side of that note, anything unknown to both.
    fn route(&mut self, channel: u8, message: ChannelMessage) {
        let bytes = message.to_bytes(self.out_channel(channel));
        if !self.split_active() {
            self.emit(Port::Main, bytes);
            return;
        }
        let pinned = self.tracker.get(channel).map(|note| note.region);
        match pinned {
            Some(region) if channel != 0 => self.emit(region.port(), bytes),
            _ => {
                self.emit(Port::Main, bytes.clone());
                self.emit(Port::Split, bytes);
            }
        }
    }

    fn visualizer_event(&mut self, bytes: &[u8]) -> Result<()> {
        let (key, on) = match decode(bytes)? {
            Incoming::Channel {
                message: ChannelMessage::NoteOn { key, .. },
                ..
            } => (key, true),
            Incoming::Channel {
                message: ChannelMessage::NoteOff { key, .. },
                ..
            } => (key, false),
            _ => return Ok(()),
        };
        let pitch = i32::from(key) + 12 * self.options.visualizer_octave;
        let held = u8::try_from(pitch).is_ok_and(|p| self.tracker.holds_pitch(p));
        if !on && held {
            trace!("Pitch {} still held, keeping its cells lit", pitch);
            return Ok(());
        }
        let lights = self.connected.device.then_some(&self.options.palette);
        self.board.mark(pitch, on, None, &self.layout, lights);
        self.dirty = true;
        Ok(())
    }

    fn foot_event(&mut self, bytes: &[u8]) -> Result<()> {
        let Incoming::Channel {
            channel,
            message: ChannelMessage::Control { controller, value },
        } = decode(bytes)?
        else {
            return Ok(());
        };
        match controller {
            CC_LEFT_EXPRESSION => {
                self.emit(Port::Main, message::control(channel, CC_LEFT_EXPRESSION, value));
                if self.split_active() {
                    self.emit(Port::Split, message::control(channel, CC_SOFT_PEDAL, value));
                }
            }
            CC_VOLUME => {
                self.options.velocity.follow_pedal(value);
                debug!("Velocity curve {:.2}", self.options.velocity.curve);
            }
            _ => trace!("Ignoring foot controller CC {}", controller),
        }
        Ok(())
    }

    fn grid_event(&mut self, bytes: &[u8]) -> Result<()> {
        match grid::parse(bytes)? {
            Some(GridEvent::Press { pad, velocity }) => self.play(GRID_CHANNEL, pad, velocity),
            Some(GridEvent::Release { pad }) => {
                // a later press on the grid replaces the held note
                if self.tracker.get(GRID_CHANNEL).is_some_and(|n| n.pad == pad) {
                    self.note_off_event(GRID_CHANNEL, 0)?;
                }
                Ok(())
            }
            Some(GridEvent::Button(action)) => {
                self.apply(action);
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Press a pad from the on-screen board. Only one pointer note sounds at a time.
    pub fn press_cell(&mut self, pad: Pad, velocity: u8) -> Result<()> {
        if !self.layout.contains(pad) {
            return Err(Error::OutOfRange {
                col: pad.col,
                row: pad.row,
                width: self.layout.width(),
                height: self.layout.height(),
            });
        }
        self.release_pointer();
        let pitch = midi_pitch(pad, &self.layout)
            .ok_or_else(|| Error::PitchRange(absolute_pitch(pad, &self.layout)))?;
        let region = region(pad, &self.layout);

        let lights = self.connected.device.then_some(&self.options.palette);
        self.board.mark_cell(pad, true, &self.layout, lights);
        let out = self.out_channel(0);
        self.emit(region.port(), message::note_on(out, pitch, velocity));
        self.pointer = Some(PointerNote { pad, pitch, region });
        self.dirty = true;
        Ok(())
    }

    pub fn release_pointer(&mut self) {
        let Some(pointer) = self.pointer.take() else {
            return;
        };
        let lights = self.connected.device.then_some(&self.options.palette);
        self.board.mark_cell(pointer.pad, false, &self.layout, lights);
        let out = self.out_channel(0);
        self.emit(pointer.region.port(), message::note_off(out, pointer.pitch));
        self.dirty = true;
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::OctaveUp => self.shift_octave(1),
            Action::OctaveDown => self.shift_octave(-1),
            Action::MoveLeft => self.shift_board(-1),
            Action::MoveRight => self.shift_board(1),
            Action::TonicUp => self.set_tonic(i32::from(self.layout.tonic()) + 1),
            Action::TonicDown => self.set_tonic(i32::from(self.layout.tonic()) - 1),
            Action::Rotate => self.toggle_rotate(),
            Action::Flip => self.toggle_flip(),
            Action::Split => self.toggle_split(),
            Action::ChannelMode => self.toggle_channel_mode(),
            Action::NextScale => self.step_scale(1),
            Action::PrevScale => self.step_scale(-1),
            Action::NextMode => self.step_mode(1),
            Action::PrevMode => self.step_mode(-1),
            Action::ToggleSize => self.set_board_size(self.layout.size().toggled()),
            Action::Panic => self.panic(None),
        }
    }

    /// Marks belong to the old layout; drop them and repaint.
    fn relayout(&mut self) {
        self.board.clear_marks(&self.layout, None);
        self.dirty = true;
        self.dirty_lights = true;
    }

    /// All notes off on the outputs of `only` (or both), forgetting what was sounding there.
    pub fn panic(&mut self, only: Option<Region>) {
        for region in [Region::Main, Region::Split] {
            if only.is_none_or(|r| r == region) {
                for bytes in message::all_notes_off() {
                    self.emit(region.port(), bytes);
                }
            }
        }
        let silenced = self.tracker.silence(only);
        let pointer = self.pointer.filter(|p| only.is_none_or(|r| r == p.region));
        if let Some(pointer) = pointer {
            self.pointer = None;
            let lights = self.connected.device.then_some(&self.options.palette);
            self.board.mark_cell(pointer.pad, false, &self.layout, lights);
        }
        info!("Panic ({:?}), {} held notes silenced", only, silenced);
    }

    pub fn shift_octave(&mut self, delta: i32) {
        self.relayout();
        self.layout.shift_octave(delta);
        info!("Octave {}", self.layout.octave());
    }

    /// Slide the board `delta` columns; positive raises every pad by `delta` column intervals.
    pub fn shift_board(&mut self, delta: i32) {
        self.panic(Some(Region::Main));
        self.board.shift(delta);
        self.layout.shift_position(delta);
        self.dirty = true;
        self.dirty_lights = true;
        info!("Board position {}", self.layout.position_x());
    }

    pub fn set_tonic(&mut self, tonic: i32) {
        self.panic(None);
        self.relayout();
        self.layout.set_tonic(tonic);
        info!("Tonic {}", note_name(self.layout.tonic().into()));
    }

    pub fn toggle_flip(&mut self) {
        self.relayout();
        self.layout.toggle_flip();
        info!("Flipped {}", self.layout.flipped());
    }

    pub fn toggle_rotate(&mut self) {
        self.relayout();
        self.layout.toggle_rotate();
        info!("Rotated {}", self.layout.rotated());
    }

    pub fn toggle_split(&mut self) {
        if !self.connected.split {
            warn!("No split output connected, the split stays off");
            return;
        }
        self.relayout();
        let enabled = !self.layout.split_enabled();
        self.layout.set_split(enabled);
        info!("Split {}", if enabled { "on" } else { "off" });
    }

    pub fn toggle_channel_mode(&mut self) {
        self.options.channel_mode = self.options.channel_mode.toggled();
        let session = device::midi_mode(true, self.options.channel_mode);
        self.emit_all(session);
        self.dirty = true;
        info!("Channel mode {:?}", self.options.channel_mode);
    }

    fn announce_scale(&self) {
        let scale = self.layout.scale();
        info!("Scale {} ({})", scale.scale_name, scale.mode_name);
    }

    pub fn step_scale(&mut self, offset: i32) {
        let next = self.scales.step_scale(self.layout.scale(), offset);
        self.layout.set_scale(next);
        self.dirty = true;
        self.dirty_lights = true;
        self.announce_scale();
    }

    pub fn step_mode(&mut self, offset: i32) {
        let next = self.scales.step_mode(self.layout.scale(), offset);
        self.layout.set_scale(next);
        self.dirty = true;
        self.dirty_lights = true;
        self.announce_scale();
    }

    pub fn set_board_size(&mut self, size: BoardSize) {
        self.panic(None);
        self.layout.set_size(size);
        self.board.resize(self.layout.width(), self.layout.height());
        let session = device::configure(
            true,
            self.options.channel_mode,
            self.layout.hardware_split(),
        );
        self.emit_all(session);
        self.dirty = true;
        self.dirty_lights = true;
        info!("Board size {} ({} columns)", size.pad_count(), size.width());
    }

    fn update_chords(&mut self) {
        if self.options.chord_analyzer {
            let notes: Vec<u8> = self.tracker.chord_notes().iter().copied().collect();
            let chord = self.detector.detect(&notes);
            if chord != self.chord {
                debug!("Chord {:?}", chord);
                self.chord = chord;
                self.dirty = true;
            }
        }
        if self.options.jazz {
            let notes: Vec<u8> = self.tracker.left_notes().iter().copied().collect();
            let chord = self.detector.detect(&notes);
            if chord != self.left_chord {
                debug!("Left hand chord {:?}", chord);
                self.left_chord = chord;
                self.dirty = true;
            }
        }
    }

    /// One frame: chords, light repaint and the drained outbox.
    pub fn frame(&mut self) -> Vec<Outgoing> {
        if self.tracker.take_changed() {
            self.update_chords();
        }
        if self.dirty_lights {
            self.board.setup_lights(&self.layout, &self.options.palette);
            self.dirty_lights = false;
        }
        let updates = self.board.take_pending();
        if self.connected.device {
            let height = self.layout.height();
            for update in updates {
                self.outbox.extend(device::light(update, height));
            }
        } else if !updates.is_empty() {
            trace!("No device output, dropping {} light updates", updates.len());
        }
        std::mem::take(&mut self.outbox)
    }

    /// Configure the device and paint the board.
    pub fn startup(&mut self) -> Vec<Outgoing> {
        let session = device::configure(
            true,
            self.options.channel_mode,
            self.layout.hardware_split(),
        );
        self.emit_all(session);
        self.dirty_lights = true;
        self.frame()
    }

    /// Silence everything and hand the device back in its default state.
    pub fn shutdown(&mut self) -> Vec<Outgoing> {
        self.release_pointer();
        self.panic(None);
        self.board.take_pending();
        self.emit_all(device::reset_lights(self.layout.width(), self.layout.height()));
        let session = device::configure(
            false,
            self.options.channel_mode,
            self.layout.hardware_split(),
        );
        self.emit_all(session);
        std::mem::take(&mut self.outbox)
    }

    /// Text picture of the board: lit pads as `##`, out of scale pads as `..`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for row in 0..self.board.height() {
            for col in 0..self.board.width() {
                let pad = Pad::new(col, row);
                let cell = if self.board.is_lit(pad) {
                    "##".to_string()
                } else if self.layout.scale().in_scale(degree(pad, &self.layout)) {
                    format!("{:<2}", note_name(absolute_pitch(pad, &self.layout)))
                } else {
                    "..".to_string()
                };
                if col > 0 {
                    out.push(' ');
                }
                out.push_str(&cell);
            }
            out.push('\n');
        }
        out
    }
}
