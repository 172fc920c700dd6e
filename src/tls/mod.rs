//! Handshake engines.
//!
//! # Data Flow
//! ```text
//! raw socket (BoxedIo)
//!     → Tls13Engine::accept(io, SecretCollector)
//!         → Established { stream, params, early_data }
//!         → Fallback { io, client_hello }   (client does not offer TLS 1.3)
//!             → LegacyEngine::accept(io, client_hello)
//!                 → LegacyEstablished { stream, params }
//! ```
//!
//! The session only sees these traits; `engine.rs` provides the rustls
//! implementations and `context.rs` builds their configuration.

use std::future::Future;

use bytes::Bytes;
use thiserror::Error;

use crate::net::io::BoxedIo;

pub mod client_hello;
pub mod context;
pub mod engine;
pub mod params;
pub mod secrets;
pub mod signing;

#[cfg(test)]
pub(crate) mod mock;

pub use client_hello::ClientHelloError;
pub use context::{build_server_context, ContextError, ServerContext};
pub use engine::{RustlsLegacyEngine, RustlsTls13Engine};
pub use params::{LegacyParams, Tls13Params};
pub use secrets::{SecretBundle, SecretCollector, SecretKind};

#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error(transparent)]
    ClientHello(#[from] ClientHelloError),

    #[error("{0}")]
    Protocol(#[source] std::io::Error),

    #[error("client requested a legacy handshake but fallback is disabled")]
    FallbackUnavailable,
}

/// A completed TLS 1.3 handshake.
pub struct Tls13Established {
    pub stream: BoxedIo,
    pub params: Tls13Params,
    /// 0-RTT application data accepted during the handshake.
    pub early_data: Bytes,
}

pub enum Tls13Handshake {
    Established(Tls13Established),
    /// The client cannot speak TLS 1.3. The socket is handed back untouched
    /// apart from the client hello, which has already been read off it.
    Fallback { io: BoxedIo, client_hello: Bytes },
}

pub struct LegacyEstablished {
    pub stream: BoxedIo,
    pub params: LegacyParams,
}

pub trait Tls13Engine {
    fn accept(
        &self,
        io: BoxedIo,
        secrets: SecretCollector,
    ) -> impl Future<Output = Result<Tls13Handshake, HandshakeError>>;
}

pub trait LegacyEngine {
    /// Run a legacy handshake over `io`, treating `pre_received` as bytes
    /// that already arrived on it.
    fn accept(
        &self,
        io: BoxedIo,
        pre_received: Bytes,
    ) -> impl Future<Output = Result<LegacyEstablished, HandshakeError>>;
}
