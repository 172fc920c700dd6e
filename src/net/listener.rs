//! TCP listener and connection acceptor.
//!
//! # Responsibilities
//! - Bind to the configured address with the configured backlog
//! - Accept one connection at a time and run exactly one Session on it
//! - Pause accepting while that session runs
//! - Relay the session's key-log records to the key-log sink
//! - Resume accepting (loop mode) or release the listener when it finishes

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tracing::Instrument;

use crate::config::ListenerConfig;
use crate::net::connection::SessionEvent;
use crate::observability::keylog::KeyLogWriter;
use crate::observability::metrics;
use crate::session::{Console, Session, SessionMode};
use crate::tls::{LegacyEngine, Tls13Engine};

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("invalid bind address {0:?}")]
    InvalidAddress(String),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Bind a listening socket for `config`.
pub fn bind_listener(config: &ListenerConfig) -> Result<TcpListener, ListenerError> {
    let ip: IpAddr = config
        .bind_address
        .parse()
        .map_err(|_| ListenerError::InvalidAddress(config.bind_address.clone()))?;
    let address = SocketAddr::new(ip, config.port);
    let bind_err = |source| ListenerError::Bind { address, source };

    let socket = match address {
        SocketAddr::V4(_) => TcpSocket::new_v4(),
        SocketAddr::V6(_) => TcpSocket::new_v6(),
    }
    .map_err(bind_err)?;
    socket.set_reuseaddr(true).map_err(bind_err)?;
    socket.bind(address).map_err(bind_err)?;
    let listener = socket.listen(config.backlog).map_err(bind_err)?;

    let local_addr = listener.local_addr().map_err(bind_err)?;
    tracing::info!(backlog = config.backlog, "Started listening on {local_addr}");
    Ok(listener)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptorSettings {
    /// Keep accepting after a session finishes.
    pub loop_forever: bool,
    pub mode: SessionMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcceptorStats {
    pub accept_cycles: u64,
    pub sessions_finished: u64,
    pub accept_errors: u64,
}

/// Owns the listening socket and at most one live session.
pub struct ConnectionAcceptor<E, L> {
    /// `None` once the listener has been released.
    listener: Option<TcpListener>,
    settings: AcceptorSettings,
    tls13: E,
    legacy: Option<L>,
    key_log: Option<KeyLogWriter>,
    console: Console,
    stats: AcceptorStats,
}

impl<E, L> ConnectionAcceptor<E, L>
where
    E: Tls13Engine,
    L: LegacyEngine,
{
    pub fn new(listener: TcpListener, settings: AcceptorSettings, tls13: E, legacy: Option<L>) -> Self {
        Self {
            listener: Some(listener),
            settings,
            tls13,
            legacy,
            key_log: None,
            console: Console::detached(),
            stats: AcceptorStats::default(),
        }
    }

    pub fn with_key_log(mut self, key_log: KeyLogWriter) -> Self {
        self.key_log = Some(key_log);
        self
    }

    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    /// Accept until the listener is released or `shutdown` fires.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> AcceptorStats {
        while let Some(listener) = &self.listener {
            let accepted = tokio::select! {
                accepted = listener.accept() => Some(accepted),
                _ = wait_for_shutdown(&mut shutdown) => None,
            };

            match accepted {
                Some(Ok((stream, peer))) => {
                    if !self.on_accept(stream, peer, &mut shutdown).await {
                        self.stop("Shutdown requested during session");
                    }
                }
                Some(Err(e)) => self.on_accept_error(e),
                None => self.stop("Shutdown requested"),
            }
        }

        tracing::info!(
            accept_cycles = self.stats.accept_cycles,
            sessions_finished = self.stats.sessions_finished,
            accept_errors = self.stats.accept_errors,
            "Acceptor stopped"
        );
        self.stats
    }

    /// Run one session to completion. Returns false if interrupted by shutdown.
    async fn on_accept(
        &mut self,
        stream: TcpStream,
        peer: SocketAddr,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> bool {
        self.stats.accept_cycles += 1;
        metrics::record_session_accepted();
        tracing::info!("Connection accepted from {peer}");
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(peer_addr = %peer, "Failed to set TCP_NODELAY: {e}");
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let key_log = &mut self.key_log;
        let session = Session::new(
            &self.tls13,
            self.legacy.as_ref(),
            self.settings.mode,
            &mut self.console,
            events_tx,
        );
        let span = tracing::info_span!("session", session_id = %session.id(), peer_addr = %peer);
        let work = async {
            tokio::join!(
                session.run(Box::new(stream)),
                relay_events(key_log, events_rx)
            )
        }
        .instrument(span);

        let outcome = tokio::select! {
            biased;
            (outcome, ()) = work => Some(outcome),
            _ = wait_for_shutdown(shutdown) => None,
        };

        match outcome {
            Some(outcome) => {
                tracing::debug!(peer_addr = %peer, ?outcome, "Session finished");
                self.on_session_finished();
                true
            }
            None => false,
        }
    }

    fn on_session_finished(&mut self) {
        self.stats.sessions_finished += 1;
        if self.settings.loop_forever {
            tracing::debug!("Resuming accepts");
        } else {
            self.stop("Session finished, releasing listener");
        }
    }

    fn on_accept_error(&mut self, error: std::io::Error) {
        self.stats.accept_errors += 1;
        tracing::error!("Failed to accept connection: {error}");
        if !self.settings.loop_forever {
            self.stop("Accept failed");
        }
    }

    fn stop(&mut self, reason: &str) {
        if self.listener.take().is_some() {
            tracing::info!("{reason}");
        }
    }
}

/// Forward key-log records until the session reports that it finished.
async fn relay_events(
    key_log: &mut Option<KeyLogWriter>,
    mut events: mpsc::UnboundedReceiver<SessionEvent>,
) {
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::KeyLog(record) => {
                let Some(writer) = key_log.as_mut() else {
                    continue;
                };
                match writer.write(&record).await {
                    Ok(()) => metrics::record_keylog_record(record.label),
                    Err(e) => tracing::warn!(label = %record.label, "{e}"),
                }
            }
            SessionEvent::Finished { id, outcome } => {
                tracing::trace!(%id, ?outcome, "Session reported finished");
                return;
            }
        }
    }
}

/// Resolves when shutdown is triggered. A dropped coordinator never fires.
async fn wait_for_shutdown(shutdown: &mut broadcast::Receiver<()>) {
    match shutdown.recv().await {
        Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {}
        Err(broadcast::error::RecvError::Closed) => std::future::pending().await,
    }
}
