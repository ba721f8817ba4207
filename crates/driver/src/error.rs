use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum DriverError {
    #[error("Config file error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Engine(#[from] isomech_library::Error),

    #[error("MIDI init error: {0}")]
    MidiInit(#[from] midir::InitError),

    #[error("Cannot connect to {port:?}: {reason}")]
    Connect { port: String, reason: String },

    #[error("No MIDI output matches {0:?} (try --list-ports)")]
    NoMainOutput(String),
}

impl DriverError {
    pub(crate) fn connect<T>(port: &str, err: midir::ConnectError<T>) -> Self {
        DriverError::Connect {
            port: port.to_string(),
            reason: err.to_string(),
        }
    }
}
