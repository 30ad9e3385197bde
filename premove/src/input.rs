//! Commands typed on stdin.

/// One line of player input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// The first move is played now, the rest are queued as premoves.
    Moves(Vec<String>),
    NewGame,
    Fen(String),
    Stop,
    Status,
    Help,
    Quit,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("not a move or command: {0} (try `help`)")]
    Unknown(String),
    #[error("`fen` needs a position")]
    MissingFen,
}

pub const HELP: &str = "\
commands:
  e2e4 [e7e5 ...]  play a move; extra moves are queued as premoves
  new              restart from the starting position
  fen <FEN>        start a new game from FEN
  stop             cancel the engine search and clear premoves
  status           print the engine session as JSON
  quit             leave";

pub fn parse_input(line: &str) -> Result<Input, InputError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "" => Ok(Input::Empty),
        "new" => Ok(Input::NewGame),
        "stop" => Ok(Input::Stop),
        "status" => Ok(Input::Status),
        "help" | "?" => Ok(Input::Help),
        "quit" | "exit" => Ok(Input::Quit),
        "fen" if rest.is_empty() => Err(InputError::MissingFen),
        "fen" => Ok(Input::Fen(rest.to_string())),
        _ => line
            .split_whitespace()
            .map(|token| {
                if looks_like_move(token) {
                    Ok(token.to_ascii_lowercase())
                } else {
                    Err(InputError::Unknown(token.to_string()))
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Input::Moves),
    }
}

/// Coordinate shape only (`e2e4`, `e7e8q`). Legality is the oracle's call.
fn looks_like_move(token: &str) -> bool {
    let bytes = token.to_ascii_lowercase().into_bytes();
    let square = |file: u8, rank: u8| (b'a'..=b'h').contains(&file) && (b'1'..=b'8').contains(&rank);

    match bytes.as_slice() {
        [f1, r1, f2, r2] => square(*f1, *r1) && square(*f2, *r2),
        [f1, r1, f2, r2, promo] => {
            square(*f1, *r1) && square(*f2, *r2) && matches!(promo, b'q' | b'r' | b'b' | b'n')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands() {
        assert_eq!(parse_input("new"), Ok(Input::NewGame));
        assert_eq!(parse_input("  STOP "), Ok(Input::Stop));
        assert_eq!(parse_input("status"), Ok(Input::Status));
        assert_eq!(parse_input("quit"), Ok(Input::Quit));
        assert_eq!(parse_input("?"), Ok(Input::Help));
        assert_eq!(parse_input(""), Ok(Input::Empty));
    }

    #[test]
    fn test_fen_keeps_the_whole_position() {
        assert_eq!(
            parse_input("fen 4k3/8/8/8/8/8/8/RNBQKBNR w - - 1 1"),
            Ok(Input::Fen("4k3/8/8/8/8/8/8/RNBQKBNR w - - 1 1".to_string()))
        );
        assert_eq!(parse_input("fen"), Err(InputError::MissingFen));
    }

    #[test]
    fn test_moves_and_premoves() {
        assert_eq!(parse_input("e2e4"), Ok(Input::Moves(vec!["e2e4".to_string()])));
        assert_eq!(
            parse_input("E2E4 g1f3  a7A8Q"),
            Ok(Input::Moves(vec![
                "e2e4".to_string(),
                "g1f3".to_string(),
                "a7a8q".to_string()
            ]))
        );
    }

    #[test]
    fn test_rejects_non_moves() {
        for line in ["e2e9", "e2", "Nf3", "e7e8k", "e2e4 hello"] {
            assert!(matches!(parse_input(line), Err(InputError::Unknown(_))), "{line}");
        }
    }
}
