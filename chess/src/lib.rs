//! Rules oracle for the premove client.
//!
//! Wraps `cozy-chess` so the rest of the workspace only ever deals with
//! standard UCI move strings and FEN text.

pub mod fen;
pub mod game;
pub mod reconcile;
pub mod uci;

pub use fen::{FenError, START_FEN};
pub use game::{Game, GameError, GameOutcome};
pub use reconcile::{apply, normalize};
pub use uci::{format_uci_move, parse_uci_move};

pub use cozy_chess::Color;
