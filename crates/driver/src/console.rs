//! Console commands standing in for the on-screen buttons.

use crossbeam_channel::Sender;
use isomech_library::{Action, Pad};
use std::io::{self, BufRead};
use std::thread;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    Action(Action),
    /// Pointer press on a board cell.
    Press(Pad),
    Release,
    /// Log the board.
    Show,
    Quit,
}

const HELP: &str = "commands: octave+ octave- left right tonic+ tonic- rotate flip split channel \
                    scale+ scale- mode+ mode- size panic press <col> <row> release show quit";

fn action(word: &str) -> Option<Action> {
    let action = match word {
        "octave+" | "up" => Action::OctaveUp,
        "octave-" | "down" => Action::OctaveDown,
        "left" => Action::MoveLeft,
        "right" => Action::MoveRight,
        "tonic+" => Action::TonicUp,
        "tonic-" => Action::TonicDown,
        "rotate" => Action::Rotate,
        "flip" => Action::Flip,
        "split" => Action::Split,
        "channel" => Action::ChannelMode,
        "scale+" => Action::NextScale,
        "scale-" => Action::PrevScale,
        "mode+" => Action::NextMode,
        "mode-" => Action::PrevMode,
        "size" => Action::ToggleSize,
        "panic" => Action::Panic,
        _ => return None,
    };
    Some(action)
}

pub(crate) fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim().to_ascii_lowercase();
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return Ok(None);
    };

    let command = match word {
        "q" | "quit" | "exit" => Command::Quit,
        "show" => Command::Show,
        "release" => Command::Release,
        "press" => {
            let mut coord = || -> Result<usize, String> {
                words
                    .next()
                    .ok_or_else(|| "press needs a column and a row".to_string())?
                    .parse::<usize>()
                    .map_err(|e| e.to_string())
            };
            let col = coord()?;
            let row = coord()?;
            Command::Press(Pad::new(col, row))
        }
        other => Command::Action(action(other).ok_or_else(|| format!("unknown command {other:?}"))?),
    };
    Ok(Some(command))
}

/// Read stdin lines on their own thread. End of input quits.
pub(crate) fn spawn(commands: Sender<Command>) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("console".to_string())
        .spawn(move || {
            debug!("{}", HELP);
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("Console read failed: {}", e);
                        break;
                    }
                };
                match parse(&line) {
                    Ok(Some(command)) => {
                        let quit = command == Command::Quit;
                        if commands.send(command).is_err() || quit {
                            return;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!("{} ({})", e, HELP),
                }
            }
            let _ = commands.send(Command::Quit);
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_map_to_actions() {
        assert_eq!(
            parse("octave+").unwrap(),
            Some(Command::Action(Action::OctaveUp))
        );
        assert_eq!(parse("  Split ").unwrap(), Some(Command::Action(Action::Split)));
        assert_eq!(parse("q").unwrap(), Some(Command::Quit));
        assert_eq!(parse("").unwrap(), None);
    }

    #[test]
    fn press_takes_a_cell() {
        assert_eq!(
            parse("press 3 7").unwrap(),
            Some(Command::Press(Pad::new(3, 7)))
        );
        assert!(parse("press 3").is_err());
        assert!(parse("press x 1").is_err());
    }

    #[test]
    fn unknown_words_are_errors() {
        assert!(parse("louder").is_err());
    }
}
