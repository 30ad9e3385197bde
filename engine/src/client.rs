use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::Child;
use tokio::sync::mpsc::error::TryRecvError;

use crate::session::{BestMove, EngineSession, SessionConfig, SessionSnapshot};
use crate::transport::{self, ChannelSink, LineReceiver};
use crate::uci::EngineOption;
use crate::{SessionError, TransportError};

/// A session wired to a live engine.
///
/// Engine output is buffered in a channel until the owner calls `pump()` (or
/// awaits `next_line()`), so every session transition still happens on the
/// owner's task.
pub struct EngineClient {
    session: EngineSession<ChannelSink>,
    lines: LineReceiver,
    process: Option<Child>,
}

impl EngineClient {
    /// Spawn the engine at `path` and start the handshake.
    #[tracing::instrument(level = "info", skip(options))]
    pub fn spawn(path: &Path, options: Vec<EngineOption>) -> Result<Self, SessionError> {
        let (process, sink, lines) = transport::spawn_engine(path)?;
        let mut client = Self::with_channels(sink, lines, options)?;
        client.process = Some(process);
        tracing::info!("Engine spawned, waiting for handshake");
        Ok(client)
    }

    /// Run the session over any byte pipe instead of a child process.
    pub fn from_io<R, W>(reader: R, writer: W, options: Vec<EngineOption>) -> Result<Self, SessionError>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (sink, lines) = transport::connect(reader, writer);
        Self::with_channels(sink, lines, options)
    }

    fn with_channels(
        sink: ChannelSink,
        lines: LineReceiver,
        options: Vec<EngineOption>,
    ) -> Result<Self, SessionError> {
        let mut session = EngineSession::new(sink).with_options(options);
        session.boot()?;
        Ok(Self {
            session,
            lines,
            process: None,
        })
    }

    /// Apply every engine line that has already arrived. Never waits.
    ///
    /// Returns how many lines were handled. A closed or broken pipe fails the
    /// session and is reported as an error from then on.
    pub fn pump(&mut self) -> Result<usize, SessionError> {
        self.session.ensure_open()?;

        let mut handled = 0;
        loop {
            match self.lines.try_recv() {
                Ok(Ok(line)) => {
                    self.session.handle_line(&line)?;
                    handled += 1;
                }
                Ok(Err(e)) => {
                    self.session.fail(e);
                    break;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.session.fail(TransportError::Closed);
                    break;
                }
            }
        }

        self.session.ensure_open()?;
        Ok(handled)
    }

    /// Wait for the next engine line and apply it.
    pub async fn next_line(&mut self) -> Result<(), SessionError> {
        self.session.ensure_open()?;

        match self.lines.recv().await {
            Some(Ok(line)) => self.session.handle_line(&line),
            Some(Err(e)) => {
                self.session.fail(e.clone());
                Err(e.into())
            }
            None => {
                self.session.fail(TransportError::Closed);
                Err(TransportError::Closed.into())
            }
        }
    }

    pub fn configure(&mut self, fen: &str, move_time: Duration) -> Result<(), SessionError> {
        self.session.configure(fen, move_time)
    }

    pub fn newgame(&mut self) -> Result<(), SessionError> {
        self.session.newgame()
    }

    pub fn play(&mut self, mv: &str) -> Result<(), SessionError> {
        self.session.play(mv)
    }

    pub fn take_best_move(&mut self) -> Result<Option<BestMove>, SessionError> {
        self.session.take_best_move()
    }

    pub fn stop(&mut self) -> Result<(), SessionError> {
        self.session.stop()
    }

    pub fn is_ready(&self) -> bool {
        self.session.is_ready()
    }

    pub fn is_armed(&self) -> bool {
        self.session.is_armed()
    }

    pub fn is_thinking(&self) -> bool {
        self.session.is_thinking()
    }

    pub fn is_stopping(&self) -> bool {
        self.session.is_stopping()
    }

    pub fn has_best_move(&self) -> bool {
        self.session.has_best_move()
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }

    pub fn thinking_for(&self) -> Option<Duration> {
        self.session.thinking_for()
    }

    pub fn config(&self) -> Option<&SessionConfig> {
        self.session.config()
    }

    pub fn move_history(&self) -> &[String] {
        self.session.move_history()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    pub fn session(&self) -> &EngineSession<ChannelSink> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut EngineSession<ChannelSink> {
        &mut self.session
    }

    /// Send `quit`, give the process a second to exit, then kill it.
    pub async fn shutdown(mut self) {
        self.session.dispose();
        if let Some(mut process) = self.process.take() {
            match tokio::time::timeout(Duration::from_secs(1), process.wait()).await {
                Ok(Ok(status)) => tracing::info!("Engine exited with {}", status),
                Ok(Err(e)) => tracing::warn!("Failed to wait for engine: {}", e),
                Err(_) => {
                    tracing::warn!("Engine did not exit after quit, killing it");
                    if let Err(e) = process.kill().await {
                        tracing::error!("Failed to kill engine: {}", e);
                    }
                }
            }
        }
    }
}
