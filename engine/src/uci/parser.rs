use super::ProtocolError;

/// Incoming message from UCI engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciMessage {
    Id { name: String, value: String },
    UciOk,
    ReadyOk,
    /// Search progress. Only the `depth` token is read.
    Info { depth: Option<u32> },
    /// Search result. An empty `mv` means the engine had no legal move
    /// (`bestmove (none)`).
    BestMove { mv: String, ponder: Option<String> },
    Unrecognized,
}

/// Parse a UCI message line
///
/// Pure and stateless. Unknown lines decode to `Unrecognized`; only a line
/// that claims to be a known message but cannot be read is an error.
pub fn parse_uci_message(line: &str) -> Result<UciMessage, ProtocolError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.first() {
        Some(&"uciok") => Ok(UciMessage::UciOk),
        Some(&"readyok") => Ok(UciMessage::ReadyOk),

        Some(&"id") => {
            if tokens.len() < 3 {
                return Err(ProtocolError::MalformedMessage(line.to_string()));
            }
            let name = tokens[1].to_string();
            let value = tokens[2..].join(" ");
            Ok(UciMessage::Id { name, value })
        }

        Some(&"bestmove") => {
            let mv = tokens
                .get(1)
                .map(|mv| normalize_move_token(mv))
                .ok_or_else(|| ProtocolError::MalformedMessage(line.to_string()))?;
            let ponder = match (tokens.get(2), tokens.get(3)) {
                (Some(&"ponder"), Some(p)) => Some(normalize_move_token(p)),
                _ => None,
            };
            Ok(UciMessage::BestMove { mv, ponder })
        }

        Some(&"info") => Ok(UciMessage::Info {
            depth: parse_depth(&tokens[1..]),
        }),

        _ => Ok(UciMessage::Unrecognized),
    }
}

fn normalize_move_token(token: &str) -> String {
    if token == "(none)" {
        String::new()
    } else {
        token.to_string()
    }
}

/// First `depth <digits>` pair of an info line. Free text after `string` is
/// never scanned.
fn parse_depth(tokens: &[&str]) -> Option<u32> {
    let end = tokens
        .iter()
        .position(|t| *t == "string")
        .unwrap_or(tokens.len());

    tokens[..end].windows(2).find_map(|pair| {
        let is_digits = !pair[1].is_empty() && pair[1].bytes().all(|b| b.is_ascii_digit());
        if pair[0] == "depth" && is_digits {
            pair[1].parse().ok()
        } else {
            None
        }
    })
}
