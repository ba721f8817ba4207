mod console;
mod error;
mod ports;
mod self_test;
mod settings;

use crate::console::Command;
use crate::error::DriverError;
use crate::ports::{Inputs, Outputs};
use crate::self_test::self_test;
use crate::settings::Settings;
use clap::Parser;
use config::Config;
use crossbeam_channel::{tick, unbounded};
use isomech_library::Engine;
use std::time::Duration;
use tracing::level_filters::LevelFilter;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[clap(
    name = "Isomorphic MIDI controller driver",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
)]
struct Args {
    #[clap(short, long, help = "Config file (TOML, every key optional)")]
    config: Option<String>,

    #[clap(short, long, help = "Log debug output, including the board after every change")]
    verbose: bool,

    #[clap(short, long, help = "Print the MIDI port names and exit")]
    list_ports: bool,
}

fn load_settings(path: Option<&str>) -> Result<Settings, DriverError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::with_name(path));
    }
    Ok(builder.build()?.try_deserialize::<Settings>()?)
}

fn main() -> Result<(), DriverError> {
    let args = Args::parse();
    let settings = load_settings(args.config.as_deref())?;

    let level = if args.verbose || settings.debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    if args.list_ports {
        return ports::list_ports(&settings.client_name);
    }

    let (options, scales) = settings.validate()?;
    let mut outputs = Outputs::open(&settings)?;
    let (input_tx, input_rx) = unbounded();
    let inputs = Inputs::open(&settings, input_tx)?;

    let mut engine = Engine::new(options, scales, outputs.connected());

    if settings.self_test && outputs.connected().device {
        info!("Running light self test");
        self_test(&mut outputs, engine.layout().size(), engine.layout().height());
    }
    outputs.send_all(&engine.startup());
    info!(
        "Started: {} pads, split {}",
        engine.layout().size().pad_count(),
        if engine.layout().split_enabled() { "on" } else { "off" }
    );

    let (command_tx, command_rx) = unbounded();
    if let Err(e) = console::spawn(command_tx) {
        warn!("No console commands: {}", e);
    }

    let ticker = tick(Duration::from_secs(1) / settings.fps);
    'frames: loop {
        for (source, bytes) in input_rx.try_iter() {
            engine.handle(source, &bytes);
        }

        for command in command_rx.try_iter() {
            match command {
                Command::Quit => break 'frames,
                Command::Action(action) => {
                    debug!("Action {:?}", action);
                    engine.apply(action);
                }
                Command::Press(pad) => {
                    if let Err(e) = engine.press_cell(pad, 127) {
                        warn!("Cannot press {:?}: {}", pad, e);
                    }
                }
                Command::Release => engine.release_pointer(),
                Command::Show => info!("\n{}", engine.render()),
            }
        }

        outputs.send_all(&engine.frame());
        if engine.take_dirty() {
            if let Some(chord) = engine.chord() {
                info!("Chord: {}", chord);
            }
            if let Some(chord) = engine.left_chord() {
                info!("Left hand: {}", chord);
            }
            debug!("\n{}", engine.render());
        }

        if ticker.recv().is_err() {
            break;
        }
    }

    info!("Shutting down");
    inputs.close();
    outputs.send_all(&engine.shutdown());
    outputs.close();
    Ok(())
}
