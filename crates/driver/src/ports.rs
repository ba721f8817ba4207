//! MIDI port discovery and the connections the frame loop writes to.

use crate::error::DriverError;
use crate::settings::Settings;
use crossbeam_channel::Sender;
use isomech_library::{Connected, InputSource, Outgoing, Port};
use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use std::thread;
use tracing::{info, trace, warn};

pub(crate) type InputEvent = (InputSource, Vec<u8>);

fn matches(name: &str, pattern: &str) -> bool {
    !pattern.is_empty() && name.to_lowercase().contains(&pattern.to_lowercase())
}

/// Which role an output port plays; the controller wins over the split output, which wins over
/// the main output.
fn output_role(name: &str, settings: &Settings) -> Option<Port> {
    if matches(name, &settings.device_name) {
        Some(Port::Device)
    } else if matches(name, &settings.split_out) {
        Some(Port::Split)
    } else if matches(name, &settings.midi_out) {
        Some(Port::Main)
    } else {
        None
    }
}

fn input_role(name: &str, settings: &Settings) -> Option<InputSource> {
    if matches(name, &settings.visualizer_in) {
        Some(InputSource::Visualizer)
    } else if matches(name, &settings.device_name) {
        Some(InputSource::Device)
    } else if matches(name, &settings.foot_in) {
        Some(InputSource::Foot)
    } else if matches(name, &settings.grid_in) {
        Some(InputSource::Grid)
    } else {
        None
    }
}

pub(crate) fn list_ports(client_name: &str) -> Result<(), DriverError> {
    let output = MidiOutput::new(client_name)?;
    println!("Outputs:");
    for port in output.ports() {
        if let Ok(name) = output.port_name(&port) {
            println!("  {name}");
        }
    }

    let input = MidiInput::new(client_name)?;
    println!("Inputs:");
    for port in input.ports() {
        if let Ok(name) = input.port_name(&port) {
            println!("  {name}");
        }
    }
    Ok(())
}

#[derive(Default)]
pub(crate) struct Outputs {
    main: Option<MidiOutputConnection>,
    split: Option<MidiOutputConnection>,
    device: Option<MidiOutputConnection>,
}

impl Outputs {
    pub(crate) fn open(settings: &Settings) -> Result<Self, DriverError> {
        let mut outputs = Outputs::default();
        let probe = MidiOutput::new(&settings.client_name)?;
        for port in probe.ports() {
            let Ok(name) = probe.port_name(&port) else {
                continue;
            };
            let Some(role) = output_role(&name, settings) else {
                continue;
            };
            let slot = match role {
                Port::Main => &mut outputs.main,
                Port::Split => &mut outputs.split,
                Port::Device => &mut outputs.device,
            };
            if slot.is_some() {
                trace!("{:?} output already open, skipping {}", role, name);
                continue;
            }

            let output = MidiOutput::new(&settings.client_name)?;
            let connection = output
                .connect(&port, &format!("{} {:?}", settings.client_name, role))
                .map_err(|e| DriverError::connect(&name, e))?;
            info!("{:?} (Out): {}", role, name);
            *slot = Some(connection);
        }

        if outputs.main.is_none() {
            return Err(DriverError::NoMainOutput(settings.midi_out.clone()));
        }
        if outputs.device.is_none() {
            warn!("No controller output detected, lights are off");
        }
        if outputs.split.is_none() {
            info!("No split output detected");
        }
        Ok(outputs)
    }

    pub(crate) fn connected(&self) -> Connected {
        Connected {
            main: self.main.is_some(),
            split: self.split.is_some(),
            device: self.device.is_some(),
        }
    }

    pub(crate) fn send(&mut self, message: &Outgoing) {
        match message {
            Outgoing::Settle(pause) => thread::sleep(*pause),
            Outgoing::Midi { port, bytes } => {
                let connection = match port {
                    Port::Main => &mut self.main,
                    Port::Split => &mut self.split,
                    Port::Device => &mut self.device,
                };
                match connection {
                    Some(connection) => {
                        if let Err(e) = connection.send(bytes) {
                            warn!("Failed to send {:02x?} to {:?}: {}", bytes, port, e);
                        }
                    }
                    None => trace!("No {:?} output for {:02x?}", port, bytes),
                }
            }
        }
    }

    pub(crate) fn send_all(&mut self, messages: &[Outgoing]) {
        for message in messages {
            self.send(message);
        }
    }

    pub(crate) fn close(self) {
        for connection in [self.main, self.split, self.device].into_iter().flatten() {
            connection.close();
        }
    }
}

/// Open connections stay alive as long as this does.
pub(crate) struct Inputs {
    connections: Vec<MidiInputConnection<()>>,
}

impl Inputs {
    /// Connect every matching input; each callback pushes its raw bytes into `events`.
    pub(crate) fn open(settings: &Settings, events: Sender<InputEvent>) -> Result<Self, DriverError> {
        let mut connections = Vec::new();
        let mut opened = Vec::new();
        let probe = MidiInput::new(&settings.client_name)?;
        for port in probe.ports() {
            let Ok(name) = probe.port_name(&port) else {
                continue;
            };
            let Some(source) = input_role(&name, settings) else {
                continue;
            };
            if opened.contains(&source) {
                trace!("{:?} input already open, skipping {}", source, name);
                continue;
            }

            let mut input = MidiInput::new(&settings.client_name)?;
            input.ignore(midir::Ignore::None);
            let events = events.clone();
            let connection = input
                .connect(
                    &port,
                    &format!("{} {:?}", settings.client_name, source),
                    move |_timestamp, message, _data| {
                        if events.send((source, message.to_vec())).is_err() {
                            trace!("Input queue closed, dropping {:02x?}", message);
                        }
                    },
                    (),
                )
                .map_err(|e| DriverError::connect(&name, e))?;
            info!("{:?} (In): {}", source, name);
            opened.push(source);
            connections.push(connection);
        }

        if !opened.contains(&InputSource::Device) {
            warn!("No controller input detected");
        }
        Ok(Self { connections })
    }

    pub(crate) fn close(self) {
        for connection in self.connections {
            connection.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_are_case_insensitive_substrings() {
        let settings = Settings::default();
        assert_eq!(
            output_role("LinnStrument MIDI 1", &settings),
            Some(Port::Device)
        );
        assert_eq!(output_role("isomech split", &settings), Some(Port::Split));
        assert_eq!(output_role("IsoMech Loopback", &settings), Some(Port::Main));
        assert_eq!(output_role("Midi Through", &settings), None);
    }

    #[test]
    fn empty_patterns_match_nothing() {
        let settings = Settings::default();
        assert!(settings.foot_in.is_empty());
        assert_eq!(input_role("Foot Controller", &settings), None);
        assert_eq!(
            input_role("Piano Visualizer", &settings),
            Some(InputSource::Visualizer)
        );
        assert_eq!(
            input_role("LinnStrument MIDI 1", &settings),
            Some(InputSource::Device)
        );
        assert_eq!(
            input_role("Launchpad X LPX MIDI", &settings),
            Some(InputSource::Grid)
        );
    }
}
