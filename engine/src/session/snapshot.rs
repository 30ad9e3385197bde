use serde::Serialize;

use super::state::{BestMove, SessionConfig};

/// Point-in-time view of a session for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub engine_name: Option<String>,
    pub ready: bool,
    pub armed: bool,
    pub thinking: bool,
    pub stopping: bool,
    /// Milliseconds since the in-flight `go` (or `stop`) was sent.
    pub search_elapsed_ms: Option<u64>,
    pub search_queued: bool,
    pub new_game_queued: bool,
    pub config: Option<SessionConfig>,
    pub move_history: Vec<String>,
    pub pending_best_move: Option<BestMove>,
    /// Why the session stopped accepting calls, if it has.
    pub closed: Option<String>,
}
