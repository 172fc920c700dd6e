//! TLS 1.3 demo server with legacy-TLS fallback.
//!
//! # Architecture Overview
//!
//! ```text
//!     client ──TCP──▶ net::listener (ConnectionAcceptor, one session at a time)
//!                          │
//!                          ▼
//!                     session (state machine)
//!                          │
//!            ┌─────────────┴──────────────┐
//!            ▼                            ▼
//!     tls (TLS 1.3 engine)  ──fallback──▶ tls (legacy engine)
//!            │ secrets                    │
//!            ▼                            ▼
//!     observability::keylog        session::http / echo
//! ```
//!
//! Cross-cutting: `config` (CLI + TOML + validation), `ech` (decrypter
//! setup), `lifecycle` (startup ordering, shutdown), `observability`
//! (tracing, key log, metrics).

pub mod config;
pub mod ech;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod session;
pub mod tls;

pub use config::schema::ServerConfig;
pub use lifecycle::Shutdown;
pub use net::listener::ConnectionAcceptor;
pub use session::Session;
