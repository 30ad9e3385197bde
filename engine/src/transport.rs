//! Pipes between the session and an engine process.
//!
//! Two tasks per engine: a reader that frames stdout into lines and forwards
//! them over a channel, and a writer that drains queued command lines into
//! stdin. The write side of the channel is unbounded so the session can queue
//! a command without awaiting.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Child;
use tokio::sync::mpsc;

use crate::framer::LineFramer;
use crate::session::CommandSink;
use crate::TransportError;

/// Engine output as seen by the session: a line, or the error that ended the
/// stream. Nothing follows an `Err`.
pub type EngineLine = Result<String, TransportError>;

/// Receiving end of the engine output channel.
pub type LineReceiver = mpsc::UnboundedReceiver<EngineLine>;

/// Queues command lines for the writer task.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<String>,
}

impl CommandSink for ChannelSink {
    fn send(&mut self, line: &str) -> Result<(), TransportError> {
        self.tx
            .send(line.to_string())
            .map_err(|_| TransportError::Closed)
    }
}

/// Wire up reader and writer tasks over an arbitrary byte pipe.
///
/// Must be called from within a tokio runtime.
pub fn connect<R, W>(reader: R, writer: W) -> (ChannelSink, LineReceiver)
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (line_tx, line_rx) = mpsc::unbounded_channel::<EngineLine>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<String>();

    tracing::debug!("Spawning output reader task");
    spawn_reader(reader, line_tx.clone());
    tracing::debug!("Spawning stdin writer task");
    spawn_writer(writer, cmd_rx, line_tx);

    (ChannelSink { tx: cmd_tx }, line_rx)
}

/// Spawn the engine executable with piped stdin/stdout.
#[tracing::instrument(level = "info")]
pub fn spawn_engine(path: &Path) -> Result<(Child, ChannelSink, LineReceiver), TransportError> {
    tracing::info!("Spawning engine at {:?}", path);
    let mut process = tokio::process::Command::new(path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            tracing::error!("Failed to spawn engine: {}", e);
            TransportError::Spawn(e.to_string())
        })?;

    let stdin = process
        .stdin
        .take()
        .ok_or_else(|| TransportError::Spawn("engine has no stdin".to_string()))?;
    let stdout = process
        .stdout
        .take()
        .ok_or_else(|| TransportError::Spawn("engine has no stdout".to_string()))?;

    let (sink, lines) = connect(stdout, stdin);
    Ok((process, sink, lines))
}

fn spawn_reader<R>(mut reader: R, tx: mpsc::UnboundedSender<EngineLine>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut framer = LineFramer::new();
        let mut buf = vec![0u8; 4096];

        let err = loop {
            match reader.read(&mut buf).await {
                Ok(0) => {
                    framer.finish();
                    tracing::warn!("Engine stdout EOF - engine closed");
                    break TransportError::Closed;
                }
                Ok(n) => {
                    for line in framer.push(&buf[..n]) {
                        if tx.send(Ok(line)).is_err() {
                            tracing::debug!("Line receiver dropped, reader exiting");
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::error!("Error reading from engine stdout: {}", e);
                    break e.into();
                }
            }
        };

        let _ = tx.send(Err(err));
        tracing::info!("Output reader task exiting");
    });
}

fn spawn_writer<W>(
    mut writer: W,
    mut rx: mpsc::UnboundedReceiver<String>,
    failures: mpsc::UnboundedSender<EngineLine>,
) where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(cmd) = rx.recv().await {
            let mut bytes = cmd.into_bytes();
            bytes.push(b'\n');

            let written = match writer.write_all(&bytes).await {
                Ok(()) => writer.flush().await,
                Err(e) => Err(e),
            };
            if let Err(e) = written {
                tracing::error!("Failed to write to engine stdin: {}", e);
                let _ = failures.send(Err(e.into()));
                break;
            }
        }
        tracing::info!("Stdin writer task exiting");
    });
}

/// Find a Stockfish executable in common locations, then on `PATH`.
pub fn find_engine_path() -> Option<PathBuf> {
    const KNOWN_PATHS: [&str; 4] = [
        "/usr/local/bin/stockfish",
        "/usr/bin/stockfish",
        "/opt/homebrew/bin/stockfish",
        "/usr/games/stockfish",
    ];

    if let Some(path) = KNOWN_PATHS.iter().map(PathBuf::from).find(|p| p.is_file()) {
        return Some(path);
    }

    let search = std::env::var_os("PATH")?;
    std::env::split_paths(&search)
        .map(|dir| dir.join("stockfish"))
        .find(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, BufReader};

    #[tokio::test]
    async fn test_lines_arrive_framed_and_in_order() {
        let (engine_side, client_side) = tokio::io::duplex(64);
        let (client_read, client_write) = tokio::io::split(client_side);
        let (_engine_read, mut engine_write) = tokio::io::split(engine_side);

        let (_sink, mut lines) = connect(client_read, client_write);
        engine_write.write_all(b"id name Fake\nuci").await.unwrap();
        engine_write.write_all(b"ok\nreadyok\n").await.unwrap();

        assert_eq!(lines.recv().await.unwrap().unwrap(), "id name Fake");
        assert_eq!(lines.recv().await.unwrap().unwrap(), "uciok");
        assert_eq!(lines.recv().await.unwrap().unwrap(), "readyok");
    }

    #[tokio::test]
    async fn test_eof_reports_closed() {
        let (engine_side, client_side) = tokio::io::duplex(64);
        let (client_read, client_write) = tokio::io::split(client_side);

        let (sink, mut lines) = connect(client_read, client_write);
        drop(engine_side);

        assert_eq!(lines.recv().await.unwrap(), Err(TransportError::Closed));

        // the writer task holds the last sender until its queue closes
        drop(sink);
        assert!(lines.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_sink_writes_newline_terminated_commands() {
        let (engine_side, client_side) = tokio::io::duplex(256);
        let (client_read, client_write) = tokio::io::split(client_side);
        let (engine_read, _engine_write) = tokio::io::split(engine_side);

        let (mut sink, _lines) = connect(client_read, client_write);
        sink.send("uci").unwrap();
        sink.send("isready").unwrap();

        let mut reader = BufReader::new(engine_read).lines();
        assert_eq!(reader.next_line().await.unwrap().as_deref(), Some("uci"));
        assert_eq!(reader.next_line().await.unwrap().as_deref(), Some("isready"));
    }
}
