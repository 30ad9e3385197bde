//! The engine session: one long-lived UCI conversation.
//!
//! `EngineSession` owns every piece of mutable state about the engine and is
//! driven from a single owner. Caller operations (`configure`, `newgame`,
//! `play`, `stop`) and engine lines (`handle_line`) are each processed to
//! completion before the next one starts, and none of them block: results are
//! picked up later through `has_best_move` / `take_best_move`.

pub mod snapshot;
pub mod state;

use std::time::Duration;

use crate::uci::{parse_uci_message, EngineOption, ProtocolError, UciCommand, UciMessage};
use crate::{ConfigError, SessionError, TransportError};
pub use snapshot::SessionSnapshot;
pub use state::{BestMove, SessionConfig};
use state::{Link, QueuedWork, SearchState};

/// Where encoded command lines go. Writes must not block on the engine.
pub trait CommandSink {
    fn send(&mut self, line: &str) -> Result<(), TransportError>;
}

/// Records every line. Used for dry runs and tests.
impl CommandSink for Vec<String> {
    fn send(&mut self, line: &str) -> Result<(), TransportError> {
        self.push(line.to_string());
        Ok(())
    }
}

pub struct EngineSession<S: CommandSink> {
    sink: S,
    link: Link,
    boot_options: Vec<EngineOption>,
    engine_name: Option<String>,
    config: Option<SessionConfig>,
    armed: bool,
    search: SearchState,
    queued: QueuedWork,
    move_history: Vec<String>,
    pending_best_move: Option<BestMove>,
    last_depth: u32,
}

impl<S: CommandSink> EngineSession<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            link: Link::Handshaking,
            boot_options: Vec::new(),
            engine_name: None,
            config: None,
            armed: false,
            search: SearchState::Idle,
            queued: QueuedWork::default(),
            move_history: Vec::new(),
            pending_best_move: None,
            last_depth: 0,
        }
    }

    /// Options to send once the engine has answered `uci`.
    pub fn with_options(mut self, options: Vec<EngineOption>) -> Self {
        self.boot_options = options;
        self
    }

    /// Start the handshake by sending `uci`.
    pub fn boot(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        tracing::debug!("Booting engine session");
        self.emit(UciCommand::Uci)
    }

    /// Set the starting position and time budget, invalidating the current
    /// game. The session must be re-armed with `newgame()` afterwards.
    pub fn configure(&mut self, fen: &str, move_time: Duration) -> Result<(), SessionError> {
        self.ensure_open()?;
        let fen = fen.trim();
        if fen.is_empty() {
            return Err(ConfigError::BlankFen.into());
        }

        let config = SessionConfig::new(fen, move_time);
        tracing::info!(
            "Configured engine: fen={}, movetime={}ms",
            config.fen,
            config.move_time_ms
        );
        self.config = Some(config);
        self.armed = false;
        self.reset_for_new_game();
        self.stop_search_in_flight()
    }

    /// Begin a fresh game from the configured position and arm the session.
    pub fn newgame(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        if self.config.is_none() {
            return Err(ConfigError::NotConfigured.into());
        }

        tracing::info!("New game");
        self.reset_for_new_game();
        self.armed = true;
        self.stop_search_in_flight()
    }

    /// Submit a move and ask the engine for a reply.
    ///
    /// An empty move is a no-op. A move submitted while the engine is still
    /// thinking is dropped: callers must wait for the best move first.
    pub fn play(&mut self, mv: &str) -> Result<(), SessionError> {
        self.ensure_open()?;
        if self.config.is_none() {
            return Err(ConfigError::NotConfigured.into());
        }
        if !self.armed {
            return Err(SessionError::NotArmed);
        }

        let mv = mv.trim();
        if mv.is_empty() {
            return Ok(());
        }
        if matches!(self.search, SearchState::Thinking { .. }) {
            tracing::warn!("Dropping move {} submitted while the engine is thinking", mv);
            return Ok(());
        }

        tracing::debug!("Playing {}", mv);
        self.move_history.push(mv.to_string());
        self.queued.search = true;
        self.try_dispatch()
    }

    /// Hand out the pending best move, if any, and forget it.
    pub fn take_best_move(&mut self) -> Result<Option<BestMove>, SessionError> {
        self.ensure_open()?;
        Ok(self.pending_best_move.take())
    }

    /// Disarm the session and cancel any in-flight search.
    pub fn stop(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        if self.config.is_none() {
            tracing::debug!("Ignoring stop on an unconfigured session");
            return Ok(());
        }

        tracing::info!("Stopping engine session");
        self.armed = false;
        self.queued = QueuedWork::default();
        self.pending_best_move = None;
        self.last_depth = 0;
        self.stop_search_in_flight()
    }

    /// Feed one complete line of engine output.
    pub fn handle_line(&mut self, line: &str) -> Result<(), SessionError> {
        self.ensure_open()?;
        tracing::trace!("UCI << {}", line);

        match parse_uci_message(line) {
            Ok(msg) => self.handle_message(msg),
            Err(e) => {
                tracing::warn!("Ignoring engine output: {}", e);
                Ok(())
            }
        }
    }

    /// The transport died. Every later call fails with `err`.
    pub fn fail(&mut self, err: TransportError) {
        if matches!(self.link, Link::Disposed | Link::Failed(_)) {
            return;
        }
        tracing::error!("Engine session failed: {}", err);
        self.clear_game_state();
        self.link = Link::Failed(err);
    }

    /// Send `quit` and close the session.
    pub fn dispose(&mut self) {
        if matches!(self.link, Link::Disposed | Link::Failed(_)) {
            return;
        }
        let quit = UciCommand::Quit.to_string();
        tracing::trace!("UCI >> {}", quit);
        if let Err(e) = self.sink.send(&quit) {
            tracing::debug!("Failed to send quit while disposing: {}", e);
        }
        self.clear_game_state();
        self.link = Link::Disposed;
        tracing::info!("Engine session disposed");
    }

    pub fn is_ready(&self) -> bool {
        self.link == Link::Ready
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// A `go` is outstanding.
    pub fn is_thinking(&self) -> bool {
        matches!(self.search, SearchState::Thinking { .. })
    }

    /// A `stop` is outstanding.
    pub fn is_stopping(&self) -> bool {
        matches!(self.search, SearchState::Stopping { .. })
    }

    pub fn has_best_move(&self) -> bool {
        self.pending_best_move.is_some()
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.link, Link::Disposed | Link::Failed(_))
    }

    /// Time since the outstanding `go` or `stop` was sent, for caller-side
    /// timeouts.
    pub fn thinking_for(&self) -> Option<Duration> {
        self.search.elapsed()
    }

    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    /// Moves since the last `ucinewgame`, human and engine alike.
    pub fn move_history(&self) -> &[String] {
        &self.move_history
    }

    pub fn engine_name(&self) -> Option<&str> {
        self.engine_name.as_deref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            engine_name: self.engine_name.clone(),
            ready: self.is_ready(),
            armed: self.armed,
            thinking: self.is_thinking(),
            stopping: self.is_stopping(),
            search_elapsed_ms: self.thinking_for().map(|d| d.as_millis() as u64),
            search_queued: self.queued.search,
            new_game_queued: self.queued.new_game,
            config: self.config.clone(),
            move_history: self.move_history.clone(),
            pending_best_move: self.pending_best_move.clone(),
            closed: match &self.link {
                Link::Disposed => Some("disposed".to_string()),
                Link::Failed(e) => Some(e.to_string()),
                Link::Handshaking | Link::Ready => None,
            },
        }
    }

    fn handle_message(&mut self, msg: UciMessage) -> Result<(), SessionError> {
        match msg {
            UciMessage::UciOk => {
                tracing::debug!("Received uciok");
                for option in self.boot_options.clone() {
                    self.emit(option.to_command())?;
                }
                self.emit(UciCommand::IsReady)
            }
            UciMessage::ReadyOk => {
                tracing::debug!("Received readyok");
                self.link = Link::Ready;
                self.try_dispatch()
            }
            UciMessage::Id { name, value } => {
                if name == "name" {
                    tracing::info!("Engine identified as {}", value);
                    self.engine_name = Some(value);
                }
                Ok(())
            }
            UciMessage::Info { depth } => {
                if let (SearchState::Thinking { .. }, Some(depth)) = (self.search, depth) {
                    self.last_depth = depth;
                }
                Ok(())
            }
            UciMessage::BestMove { mv, ponder } => self.handle_best_move(mv, ponder),
            UciMessage::Unrecognized => Ok(()),
        }
    }

    fn handle_best_move(&mut self, mv: String, ponder: Option<String>) -> Result<(), SessionError> {
        match self.search {
            SearchState::Stopping { .. } => {
                // Whatever arrives while a stop is outstanding is its
                // acknowledgment, not an answer.
                tracing::debug!("Discarding bestmove {:?} acknowledging stop", mv);
                self.search = SearchState::Idle;
                self.last_depth = 0;
                self.try_dispatch()
            }
            SearchState::Thinking { since } => {
                tracing::info!(
                    "Received bestmove {:?} at depth {} after {:?} (ponder {:?})",
                    mv,
                    self.last_depth,
                    since.elapsed(),
                    ponder
                );
                self.search = SearchState::Idle;
                if !mv.is_empty() {
                    self.move_history.push(mv.clone());
                }
                self.pending_best_move = Some(BestMove {
                    mv,
                    depth: self.last_depth,
                });
                self.last_depth = 0;
                Ok(())
            }
            SearchState::Idle => {
                tracing::warn!("{}", ProtocolError::UnexpectedBestMove(mv));
                Ok(())
            }
        }
    }

    /// Start the queued search if nothing stands in the way.
    fn try_dispatch(&mut self) -> Result<(), SessionError> {
        if !self.is_ready() || !self.armed || !self.search.is_idle() || !self.queued.search {
            return Ok(());
        }
        let Some(config) = self.config.clone() else {
            return Ok(());
        };

        if self.queued.new_game {
            self.emit(UciCommand::NewGame)?;
            self.queued.new_game = false;
        }
        self.emit(UciCommand::Position {
            fen: config.fen,
            moves: self.move_history.clone(),
        })?;
        self.emit(UciCommand::Go {
            move_time_ms: config.move_time_ms,
        })?;

        // An untaken reply is already in the history and must not outlive
        // the search that follows it.
        if let Some(stale) = self.pending_best_move.take() {
            tracing::debug!("Discarding untaken best move {:?}", stale.mv);
        }
        self.search = SearchState::Thinking {
            since: std::time::Instant::now(),
        };
        self.queued.search = false;
        self.last_depth = 0;
        Ok(())
    }

    fn stop_search_in_flight(&mut self) -> Result<(), SessionError> {
        if let SearchState::Thinking { .. } = self.search {
            self.emit(UciCommand::Stop)?;
            self.search = SearchState::Stopping {
                since: std::time::Instant::now(),
            };
        }
        Ok(())
    }

    fn reset_for_new_game(&mut self) {
        self.move_history.clear();
        self.last_depth = 0;
        self.pending_best_move = None;
        self.queued.search = false;
        self.queued.new_game = true;
    }

    fn clear_game_state(&mut self) {
        self.armed = false;
        self.search = SearchState::Idle;
        self.queued = QueuedWork::default();
        self.pending_best_move = None;
        self.last_depth = 0;
    }

    pub(crate) fn ensure_open(&self) -> Result<(), SessionError> {
        match &self.link {
            Link::Disposed => Err(SessionError::Disposed),
            Link::Failed(e) => Err(SessionError::Transport(e.clone())),
            Link::Handshaking | Link::Ready => Ok(()),
        }
    }

    fn emit(&mut self, cmd: UciCommand) -> Result<(), SessionError> {
        let line = cmd.to_string();
        tracing::trace!("UCI >> {}", line);
        if let Err(e) = self.sink.send(&line) {
            self.fail(e.clone());
            return Err(e.into());
        }
        Ok(())
    }
}
