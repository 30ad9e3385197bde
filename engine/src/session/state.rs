use std::time::{Duration, Instant};

use serde::Serialize;

use crate::TransportError;

/// Last accepted configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionConfig {
    pub fen: String,
    pub move_time_ms: u64,
}

impl SessionConfig {
    /// Sub-millisecond budgets round to the nearest millisecond, floored at 1.
    pub(crate) fn new(fen: &str, move_time: Duration) -> Self {
        let millis = (move_time.as_secs_f64() * 1000.0).round().max(1.0);
        Self {
            fen: fen.to_string(),
            move_time_ms: millis as u64,
        }
    }
}

/// A finished search. `mv` is empty when the engine had no legal move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BestMove {
    pub mv: String,
    pub depth: u32,
}

impl BestMove {
    pub fn is_resignation(&self) -> bool {
        self.mv.is_empty()
    }
}

/// Lifecycle of the current search. Exactly one state holds at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum SearchState {
    #[default]
    Idle,
    /// `go` sent, waiting for `bestmove`.
    Thinking { since: Instant },
    /// `stop` sent, the next `bestmove` is its acknowledgment.
    Stopping { since: Instant },
}

impl SearchState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            Self::Idle => None,
            Self::Thinking { since } | Self::Stopping { since } => Some(since.elapsed()),
        }
    }
}

/// Work deferred until a search may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct QueuedWork {
    pub search: bool,
    pub new_game: bool,
}

/// State of the connection to the engine process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Link {
    /// `uci` sent, waiting for `uciok` and then `readyok`.
    Handshaking,
    Ready,
    Disposed,
    Failed(TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_time_rounds_and_clamps() {
        let fen = "8/8/8/8/8/8/8/K6k w - - 0 1";
        assert_eq!(SessionConfig::new(fen, Duration::from_millis(200)).move_time_ms, 200);
        assert_eq!(SessionConfig::new(fen, Duration::from_micros(1_600)).move_time_ms, 2);
        assert_eq!(SessionConfig::new(fen, Duration::from_micros(1_400)).move_time_ms, 1);
        assert_eq!(SessionConfig::new(fen, Duration::ZERO).move_time_ms, 1);
    }

    #[test]
    fn test_search_state_elapsed() {
        assert_eq!(SearchState::Idle.elapsed(), None);
        let thinking = SearchState::Thinking {
            since: Instant::now(),
        };
        assert!(thinking.elapsed().is_some());
    }
}
