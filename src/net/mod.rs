//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, pauses while a session is live)
//!     → session (handshake, optional fallback, steady state)
//!     → connection.rs (session ids, session → acceptor events)
//!
//! Socket ownership on fallback:
//!     TcpStream ─moved into─▶ TLS 1.3 engine ─returned raw─▶ io.rs PrefixedIo ─▶ legacy engine
//! ```
//!
//! # Design Decisions
//! - A single session at a time; the listener simply is not polled while one runs
//! - Sessions talk back to the acceptor over a channel, never through a back-pointer
//! - Replayed bytes are served from a prefix buffer ahead of the live socket

pub mod connection;
pub mod io;
pub mod listener;
