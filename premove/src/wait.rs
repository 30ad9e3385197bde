//! Waiting for the engine handshake.

use std::time::Duration;

use engine::{EngineClient, SessionError};

#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error("engine did not finish the UCI handshake within {0:?}")]
    Timeout(Duration),

    #[error("engine failed during the handshake: {0}")]
    Engine(#[from] SessionError),
}

/// Apply engine output until the session reports ready.
///
/// # Errors
///
/// Returns `WaitError::Timeout` if `uciok`/`readyok` do not arrive within
/// `timeout`, and `WaitError::Engine` if the engine goes away first.
pub async fn wait_for_ready(client: &mut EngineClient, timeout: Duration) -> Result<(), WaitError> {
    let handshake = async {
        while !client.is_ready() {
            client.next_line().await?;
        }
        Ok::<(), SessionError>(())
    };

    match tokio::time::timeout(timeout, handshake).await {
        Ok(result) => {
            result?;
            tracing::info!(
                "Engine ready: {}",
                client.session().engine_name().unwrap_or("unnamed engine")
            );
            Ok(())
        }
        Err(_) => {
            tracing::error!("Timeout waiting for engine handshake");
            Err(WaitError::Timeout(timeout))
        }
    }
}
