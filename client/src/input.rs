//! Parsing of the commands a player types at the prompt

use shared::Move;
use thiserror::Error;

pub const HELP: &str = "\
Commands:
  move <uci>   play a move, e.g. 'move e2e4' or 'move e7e8q' (the word 'move' is optional)
  chat <text>  send a message to your opponent
  board        show the board again
  resign       give up the current game
  quit         leave (resigns a running game)
  help         show this text";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Move(Move),
    Chat(String),
    Board,
    Resign,
    Quit,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("nothing to do")]
    Empty,
    #[error("'{0}' is not a move, use long algebraic notation like e2e4 or e7e8q")]
    BadMove(String),
    #[error("chat needs some text")]
    MissingText,
    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),
}

/// Parses one line of user input
///
/// A bare move such as `e2e4` is accepted without the `move` keyword.
pub fn parse_command(line: &str) -> Result<Command, InputError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "" => Err(InputError::Empty),
        "move" | "m" => parse_move(rest),
        "chat" | "say" => {
            if rest.is_empty() {
                Err(InputError::MissingText)
            } else {
                Ok(Command::Chat(rest.to_string()))
            }
        }
        "board" | "b" => Ok(Command::Board),
        "resign" => Ok(Command::Resign),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        "help" | "?" => Ok(Command::Help),
        _ if rest.is_empty() => {
            parse_move(word).map_err(|_| InputError::Unknown(word.to_string()))
        }
        _ => Err(InputError::Unknown(word.to_string())),
    }
}

fn parse_move(text: &str) -> Result<Command, InputError> {
    Move::from_uci(&text.to_ascii_lowercase())
        .map(Command::Move)
        .ok_or_else(|| InputError::BadMove(text.to_string()))
}
