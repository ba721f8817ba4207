//! Messages the engine wants written to the outside world.

use std::time::Duration;

/// Output destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Port {
    Main,
    Split,
    /// The controller itself: lights and configuration parameters.
    Device,
}

/// Which outputs are connected. Messages for a missing output are dropped at the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connected {
    pub main: bool,
    pub split: bool,
    pub device: bool,
}

impl Connected {
    pub fn all() -> Self {
        Self {
            main: true,
            split: true,
            device: true,
        }
    }

    pub fn has(&self, port: Port) -> bool {
        match port {
            Port::Main => self.main,
            Port::Split => self.split,
            Port::Device => self.device,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Midi { port: Port, bytes: Vec<u8> },
    /// Pause before the next message; the device needs time after a parameter write.
    Settle(Duration),
}

impl Outgoing {
    pub fn midi(port: Port, bytes: impl Into<Vec<u8>>) -> Self {
        Outgoing::Midi {
            port,
            bytes: bytes.into(),
        }
    }

    pub fn port(&self) -> Option<Port> {
        match self {
            Outgoing::Midi { port, .. } => Some(*port),
            Outgoing::Settle(_) => None,
        }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Outgoing::Midi { bytes, .. } => Some(bytes),
            Outgoing::Settle(_) => None,
        }
    }
}
