//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the ECH decrypter (if any), then the TLS server contexts
//! - Open the key-log file
//! - Bind the listener last, so no client is accepted before we are ready
//!
//! Configuration is loaded and validated by the caller.

use std::sync::Arc;

use thiserror::Error;

use crate::config::ServerConfig;
use crate::ech::{EchDecrypterConfigurator, EchError};
use crate::lifecycle::Shutdown;
use crate::net::listener::{
    bind_listener, AcceptorSettings, AcceptorStats, ConnectionAcceptor, ListenerError,
};
use crate::observability::keylog::{KeyLogError, KeyLogWriter};
use crate::session::{Console, SessionMode};
use crate::tls::context::{build_server_context, ContextError};
use crate::tls::engine::{RustlsLegacyEngine, RustlsTls13Engine};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("ECH setup failed: {0}")]
    Ech(#[from] EchError),

    #[error("TLS setup failed: {0}")]
    Context(#[from] ContextError),

    #[error(transparent)]
    KeyLog(#[from] KeyLogError),

    #[error(transparent)]
    Listener(#[from] ListenerError),
}

pub type ServerAcceptor = ConnectionAcceptor<RustlsTls13Engine, RustlsLegacyEngine>;

/// Build everything the acceptor needs and bind the listening socket.
pub async fn prepare(config: &ServerConfig, console: Console) -> Result<ServerAcceptor, StartupError> {
    let ech = EchDecrypterConfigurator::configure(&config.ech)?.map(Arc::new);
    if let Some(decrypter) = &ech {
        tracing::info!(configs = decrypter.configs().len(), "ECH decrypter configured");
    }

    let context = build_server_context(&config.tls)?;
    let legacy = RustlsLegacyEngine::new(context.clone());
    if legacy.is_some() {
        tracing::info!("Fallback to TLS 1.2 and earlier enabled");
    }
    let tls13 = RustlsTls13Engine::new(context, ech);

    let key_log = match &config.key_log.path {
        Some(path) => Some(KeyLogWriter::open(path).await?),
        None => None,
    };

    let listener = bind_listener(&config.listener)?;
    let settings = AcceptorSettings {
        loop_forever: config.listener.loop_forever,
        mode: if config.listener.http {
            SessionMode::Http
        } else {
            SessionMode::Echo
        },
    };

    let mut acceptor =
        ConnectionAcceptor::new(listener, settings, tls13, legacy).with_console(console);
    if let Some(writer) = key_log {
        acceptor = acceptor.with_key_log(writer);
    }
    Ok(acceptor)
}

/// Start the server on stdio and run until the listener is released.
pub async fn run(config: &ServerConfig, shutdown: &Shutdown) -> Result<AcceptorStats, StartupError> {
    let acceptor = prepare(config, Console::stdio()).await?;
    Ok(acceptor.run(shutdown.subscribe()).await)
}
