pub mod commands;
pub mod parser;

pub use commands::{EngineOption, UciCommand};
pub use parser::{parse_uci_message, UciMessage};

/// Engine output that could not be acted on. Logged and ignored, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("Malformed UCI message: {0}")]
    MalformedMessage(String),
    #[error("bestmove with no search in flight: {0}")]
    UnexpectedBestMove(String),
}
