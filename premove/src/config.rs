//! Runtime tunables for the premove client.
//!
//! Every value has a compile-time default and can be overridden through a
//! dedicated environment variable. Command-line flags take precedence over
//! both.

use std::path::PathBuf;
use std::time::Duration;

/// Default engine thinking time per move (in milliseconds).
pub const DEFAULT_MOVETIME_MS: u64 = 500;

/// Default time allowed for the `uci`/`isready` handshake (in seconds).
pub const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 10;

/// Default frame interval of the play loop (in milliseconds).
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 33;

/// Default pause between an engine reply and the next premove (in milliseconds).
pub const DEFAULT_PREMOVE_COOLDOWN_MS: u64 = 150;

/// Extra time a search may run past its budget before it counts as stuck.
pub const STUCK_SEARCH_GRACE: Duration = Duration::from_secs(5);

pub const ENGINE_PATH_VAR: &str = "PREMOVE_ENGINE_PATH";
pub const MOVETIME_VAR: &str = "PREMOVE_MOVETIME_MS";
pub const HANDSHAKE_TIMEOUT_VAR: &str = "PREMOVE_HANDSHAKE_TIMEOUT_SECS";
pub const FRAME_INTERVAL_VAR: &str = "PREMOVE_FRAME_INTERVAL_MS";
pub const PREMOVE_COOLDOWN_VAR: &str = "PREMOVE_PREMOVE_COOLDOWN_MS";

/// Get the engine executable path.
///
/// Priority:
/// 1. `PREMOVE_ENGINE_PATH` env variable if set
/// 2. the first Stockfish found in the usual install locations or on `PATH`
pub fn get_engine_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(ENGINE_PATH_VAR) {
        return Some(PathBuf::from(path));
    }

    engine::find_engine_path()
}

/// Engine thinking time per move. Unparseable values fall back to the default.
pub fn get_movetime_ms() -> u64 {
    read_u64(MOVETIME_VAR, DEFAULT_MOVETIME_MS)
}

pub fn get_handshake_timeout_secs() -> u64 {
    read_u64(HANDSHAKE_TIMEOUT_VAR, DEFAULT_HANDSHAKE_TIMEOUT_SECS)
}

/// Frame interval, floored at one millisecond so the tick never spins.
pub fn get_frame_interval_ms() -> u64 {
    read_u64(FRAME_INTERVAL_VAR, DEFAULT_FRAME_INTERVAL_MS).max(1)
}

pub fn get_premove_cooldown_ms() -> u64 {
    read_u64(PREMOVE_COOLDOWN_VAR, DEFAULT_PREMOVE_COOLDOWN_MS)
}

fn read_u64(var: &str, default: u64) -> u64 {
    parse_or(std::env::var(var).ok().as_deref(), default)
}

fn parse_or(value: Option<&str>, default: u64) -> u64 {
    match value {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring unparseable setting {:?}, using {}", raw, default);
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or() {
        assert_eq!(parse_or(None, 7), 7);
        assert_eq!(parse_or(Some("250"), 7), 250);
        assert_eq!(parse_or(Some(" 42 "), 7), 42);
        assert_eq!(parse_or(Some("fast"), 7), 7);
        assert_eq!(parse_or(Some("-1"), 7), 7);
    }

    #[test]
    fn test_get_movetime_ms() {
        let movetime = get_movetime_ms();
        match std::env::var(MOVETIME_VAR).ok().and_then(|v| v.trim().parse::<u64>().ok()) {
            Some(val) => assert_eq!(movetime, val),
            None => assert_eq!(movetime, DEFAULT_MOVETIME_MS),
        }
    }

    #[test]
    fn test_get_engine_path_honours_env() {
        if let Ok(val) = std::env::var(ENGINE_PATH_VAR) {
            assert_eq!(get_engine_path(), Some(PathBuf::from(val)));
        }
    }

    #[test]
    fn test_get_frame_interval_is_positive() {
        assert!(get_frame_interval_ms() >= 1);
    }

    #[test]
    fn test_get_handshake_timeout_secs_default() {
        if std::env::var(HANDSHAKE_TIMEOUT_VAR).is_err() {
            assert_eq!(get_handshake_timeout_secs(), DEFAULT_HANDSHAKE_TIMEOUT_SECS);
        }
    }

    #[test]
    fn test_get_premove_cooldown_ms_default() {
        if std::env::var(PREMOVE_COOLDOWN_VAR).is_err() {
            assert_eq!(get_premove_cooldown_ms(), DEFAULT_PREMOVE_COOLDOWN_MS);
        }
    }
}
