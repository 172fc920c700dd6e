//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     ECH decrypter → TLS contexts → key-log sink → bind → accept loop
//!
//! Shutdown (shutdown.rs):
//!     Trigger → acceptor stops accepting → live session dropped → exit
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: nothing is bound until every file has been read
//! - Fail fast: any startup error is fatal
//! - Without `--loop` the process exits on its own after one session

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::StartupError;
