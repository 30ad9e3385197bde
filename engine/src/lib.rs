//! A non-blocking UCI engine session.
//!
//! `session` holds the protocol state machine and never touches I/O;
//! `transport` moves bytes between it and a process; `client` puts the two
//! together behind a polling API.

pub mod client;
pub mod error;
pub mod framer;
pub mod session;
pub mod transport;
pub mod uci;

pub use client::EngineClient;
pub use error::{ConfigError, SessionError, TransportError};
pub use framer::LineFramer;
pub use session::{BestMove, CommandSink, EngineSession, SessionConfig, SessionSnapshot};
pub use transport::{find_engine_path, ChannelSink};
pub use uci::{EngineOption, ProtocolError, UciCommand, UciMessage};
