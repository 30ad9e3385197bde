//! Error types for the engine session.

/// Misuse of the session by its caller. These are programming errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("starting position must not be blank")]
    BlankFen,
    #[error("engine not configured, call configure() first")]
    NotConfigured,
}

/// Failure of the pipe to the engine process. Fatal to the session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("engine closed its output stream")]
    Closed,
    #[error("engine I/O error: {0}")]
    Io(String),
    #[error("failed to spawn engine: {0}")]
    Spawn(String),
    #[error("no engine executable found")]
    EngineNotFound,
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("engine not armed, call newgame() first")]
    NotArmed,
    #[error("engine session was disposed")]
    Disposed,
    #[error("engine unavailable: {0}")]
    Transport(#[from] TransportError),
}
