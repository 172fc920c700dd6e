//! One connection, from first byte to close.
//!
//! # State Machine
//! ```text
//! Handshaking(Tls13) ──success──→ Connected(Tls13) ─┐
//!        │  └──error──→ (finish)                     │
//!        └─fallback─→ Handshaking(Legacy)            ├─EOF / error / close─→ Closed
//!                         ├──success──→ Connected(Legacy)
//!                         └──error──→ (finish)
//! ```
//!
//! The transport slot holds exactly one transport. On fallback the raw
//! socket moves out of the TLS 1.3 engine's result straight into the legacy
//! engine; the TLS 1.3 side never holds it again.
//!
//! Every terminal path goes through [`Session::finish`], which sends
//! [`SessionEvent::Finished`] exactly once.

use std::io;
use std::ops::ControlFlow;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::UnboundedSender;

use crate::net::connection::{SessionEvent, SessionId};
use crate::net::io::BoxedIo;
use crate::observability::metrics;
use crate::tls::params::{LegacyParams, Tls13Params};
use crate::tls::secrets::SecretCollector;
use crate::tls::{LegacyEngine, LegacyEstablished, Tls13Engine, Tls13Established, Tls13Handshake};

pub mod http;
pub mod summary;

use http::{HttpRequest, HttpResponder};

const READ_BUFFER_SIZE: usize = 8192;
const INPUT_BUFFER_SIZE: usize = 1024;

/// What a connected session does with inbound bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    /// Print to the console; relay console input back to the peer.
    #[default]
    Echo,
    /// Answer one `GET /` with the handshake summary.
    Http,
}

pub type ConsoleInput = Box<dyn AsyncRead + Unpin + Send>;
pub type ConsoleOutput = Box<dyn AsyncWrite + Unpin + Send>;

/// Operator terminal. Outlives sessions; the acceptor lends it to each one.
pub struct Console {
    input: Option<ConsoleInput>,
    output: ConsoleOutput,
}

impl Console {
    pub fn new(input: Option<ConsoleInput>, output: ConsoleOutput) -> Self {
        Self { input, output }
    }

    pub fn stdio() -> Self {
        Self::new(
            Some(Box::new(tokio::io::stdin())),
            Box::new(tokio::io::stdout()),
        )
    }

    /// No input, output discarded.
    pub fn detached() -> Self {
        Self::new(None, Box::new(tokio::io::sink()))
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("input", &self.input.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiatedProtocol {
    Tls13,
    Legacy,
}

impl NegotiatedProtocol {
    pub fn as_str(self) -> &'static str {
        match self {
            NegotiatedProtocol::Tls13 => "tls13",
            NegotiatedProtocol::Legacy => "legacy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStage {
    Tls13,
    Legacy,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Closed(NegotiatedProtocol),
    HandshakeFailed(HandshakeStage),
}

/// The connected transport. Exactly one exists per connected session.
pub enum Transport {
    Tls13 { stream: BoxedIo, params: Tls13Params },
    Legacy { stream: BoxedIo, params: LegacyParams },
}

impl Transport {
    pub fn protocol(&self) -> NegotiatedProtocol {
        match self {
            Transport::Tls13 { .. } => NegotiatedProtocol::Tls13,
            Transport::Legacy { .. } => NegotiatedProtocol::Legacy,
        }
    }

    fn stream_mut(&mut self) -> &mut BoxedIo {
        match self {
            Transport::Tls13 { stream, .. } | Transport::Legacy { stream, .. } => stream,
        }
    }
}

pub enum SessionState {
    Handshaking(HandshakeStage),
    Connected(Transport),
    Closed,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Handshaking(stage) => f.debug_tuple("Handshaking").field(stage).finish(),
            SessionState::Connected(transport) => {
                f.debug_tuple("Connected").field(&transport.protocol()).finish()
            }
            SessionState::Closed => f.write_str("Closed"),
        }
    }
}

enum Wake {
    Peer(io::Result<usize>),
    Input(io::Result<usize>),
}

pub struct Session<'a, E, L> {
    id: SessionId,
    tls13: &'a E,
    legacy: Option<&'a L>,
    mode: SessionMode,
    console: &'a mut Console,
    events: UnboundedSender<SessionEvent>,
    secrets: SecretCollector,
    state: SessionState,
    http: HttpResponder,
    finished: bool,
}

impl<'a, E, L> Session<'a, E, L>
where
    E: Tls13Engine,
    L: LegacyEngine,
{
    pub fn new(
        tls13: &'a E,
        legacy: Option<&'a L>,
        mode: SessionMode,
        console: &'a mut Console,
        events: UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            tls13,
            legacy,
            mode,
            console,
            secrets: SecretCollector::new(events.clone()),
            events,
            state: SessionState::Handshaking(HandshakeStage::Tls13),
            http: HttpResponder::new(),
            finished: false,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Drive the connection to completion.
    pub async fn run(mut self, io: BoxedIo) -> SessionOutcome {
        let outcome = match self.start_handshake(io).await {
            Ok(early_data) => self.serve(early_data).await,
            Err(stage) => SessionOutcome::HandshakeFailed(stage),
        };
        self.finish(outcome);
        outcome
    }

    /// Run the TLS 1.3 handshake, falling back to the legacy engine when the
    /// client asks for it. Returns accepted early data on success.
    pub async fn start_handshake(&mut self, io: BoxedIo) -> Result<Bytes, HandshakeStage> {
        self.state = SessionState::Handshaking(HandshakeStage::Tls13);
        match self.tls13.accept(io, self.secrets.clone()).await {
            Ok(Tls13Handshake::Established(established)) => {
                metrics::record_handshake(NegotiatedProtocol::Tls13, true);
                Ok(self.on_tls13_success(established))
            }
            Ok(Tls13Handshake::Fallback { io, client_hello }) => {
                self.reparent_to_legacy_tls(io, client_hello).await?;
                Ok(Bytes::new())
            }
            Err(e) => {
                tracing::error!("Handshake error: {e}");
                metrics::record_handshake(NegotiatedProtocol::Tls13, false);
                Err(HandshakeStage::Tls13)
            }
        }
    }

    /// Move the raw socket onto the legacy engine, replaying `client_hello`.
    pub async fn reparent_to_legacy_tls(
        &mut self,
        io: BoxedIo,
        client_hello: Bytes,
    ) -> Result<(), HandshakeStage> {
        tracing::info!("Fallback attempt");
        metrics::record_fallback();
        self.state = SessionState::Handshaking(HandshakeStage::Legacy);

        let result = match self.legacy {
            Some(engine) => engine.accept(io, client_hello).await,
            None => Err(crate::tls::HandshakeError::FallbackUnavailable),
        };
        match result {
            Ok(established) => {
                metrics::record_handshake(NegotiatedProtocol::Legacy, true);
                self.on_legacy_success(established);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Fallback handshake error: {e}");
                metrics::record_handshake(NegotiatedProtocol::Legacy, false);
                Err(HandshakeStage::Legacy)
            }
        }
    }

    fn on_tls13_success(&mut self, established: Tls13Established) -> Bytes {
        let Tls13Established {
            stream,
            params,
            early_data,
        } = established;

        tracing::info!("Handshake succeeded.");
        for line in summary::handshake_summary(&params, &self.secrets.bundle()) {
            tracing::info!("{line}");
        }
        if !early_data.is_empty() {
            tracing::debug!(bytes = early_data.len(), "Early data received");
        }

        self.state = SessionState::Connected(Transport::Tls13 { stream, params });
        early_data
    }

    fn on_legacy_success(&mut self, established: LegacyEstablished) {
        let LegacyEstablished { stream, params } = established;

        tracing::info!("Fallback handshake succeeded.");
        for line in summary::fallback_summary(&params) {
            tracing::info!("{line}");
        }

        self.state = SessionState::Connected(Transport::Legacy { stream, params });
    }

    /// Steady state: relay until the peer, the console or the responder ends it.
    async fn serve(&mut self, early_data: Bytes) -> SessionOutcome {
        let protocol = match &self.state {
            SessionState::Connected(transport) => transport.protocol(),
            _ => NegotiatedProtocol::Tls13,
        };
        if !early_data.is_empty() && self.on_data(&early_data).await.is_break() {
            return SessionOutcome::Closed(protocol);
        }

        let mut buf = vec![0u8; READ_BUFFER_SIZE];
        let mut input_buf = vec![0u8; INPUT_BUFFER_SIZE];
        loop {
            let SessionState::Connected(transport) = &mut self.state else {
                return SessionOutcome::Closed(protocol);
            };
            let stream = transport.stream_mut();
            let input = match self.mode {
                SessionMode::Echo => self.console.input.as_mut(),
                SessionMode::Http => None,
            };

            let wake = tokio::select! {
                read = stream.read(&mut buf) => Wake::Peer(read),
                read = read_input(input, &mut input_buf) => Wake::Input(read),
            };

            match wake {
                Wake::Peer(Ok(0)) => {
                    tracing::info!("EOF");
                    break;
                }
                Wake::Peer(Ok(n)) => {
                    if self.on_data(&buf[..n]).await.is_break() {
                        break;
                    }
                }
                Wake::Peer(Err(e)) => {
                    tracing::error!("Read error: {e}");
                    break;
                }
                Wake::Input(Ok(0)) => {
                    tracing::info!("Input closed");
                    self.close().await;
                    break;
                }
                Wake::Input(Ok(n)) => {
                    if let Err(e) = self.write(&input_buf[..n]).await {
                        tracing::error!("Write error: {e}");
                        break;
                    }
                }
                Wake::Input(Err(e)) => {
                    tracing::error!("Input error: {e}");
                    self.close().await;
                    break;
                }
            }
        }
        SessionOutcome::Closed(protocol)
    }

    /// Handle bytes from the peer. `Break` means the session is done.
    pub async fn on_data(&mut self, data: &[u8]) -> ControlFlow<()> {
        match self.mode {
            SessionMode::Echo => {
                if let Err(e) = write_console(&mut self.console.output, data).await {
                    tracing::warn!("Failed to write to console: {e}");
                }
                ControlFlow::Continue(())
            }
            SessionMode::Http => match self.http.push(data) {
                HttpRequest::Incomplete => ControlFlow::Continue(()),
                HttpRequest::Unsupported => {
                    tracing::warn!(
                        request = %String::from_utf8_lossy(self.http.buffered()),
                        "Got non-GET request"
                    );
                    ControlFlow::Continue(())
                }
                HttpRequest::Get => {
                    let response = http::build_response(&self.response_body());
                    if let Err(e) = self.write(&response).await {
                        tracing::error!("Write error: {e}");
                    }
                    self.close().await;
                    ControlFlow::Break(())
                }
            },
        }
    }

    fn response_body(&self) -> String {
        match &self.state {
            SessionState::Connected(Transport::Tls13 { params, .. }) => http::response_body(
                http::BANNER,
                &summary::handshake_summary(params, &self.secrets.bundle()),
            ),
            SessionState::Connected(Transport::Legacy { params, .. }) => http::response_body(
                http::FALLBACK_BANNER,
                &summary::fallback_summary(params),
            ),
            _ => String::new(),
        }
    }

    /// Write through whichever transport is active. Dropped when not connected.
    pub async fn write(&mut self, data: &[u8]) -> io::Result<()> {
        if let SessionState::Connected(transport) = &mut self.state {
            let stream = transport.stream_mut();
            stream.write_all(data).await?;
            stream.flush().await?;
        }
        Ok(())
    }

    /// Graceful close: shut the transport down (sending close_notify), then finish.
    pub async fn close(&mut self) {
        if let SessionState::Connected(transport) = &mut self.state {
            if let Err(e) = transport.stream_mut().shutdown().await {
                tracing::debug!("Shutdown error: {e}");
            }
            let protocol = transport.protocol();
            self.finish(SessionOutcome::Closed(protocol));
        }
    }

    /// Drop the transport and notify the acceptor. Idempotent.
    pub fn finish(&mut self, outcome: SessionOutcome) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.state = SessionState::Closed;
        let _ = self.events.send(SessionEvent::Finished {
            id: self.id,
            outcome,
        });
    }
}

async fn write_console(output: &mut ConsoleOutput, data: &[u8]) -> io::Result<()> {
    output.write_all(data).await?;
    output.flush().await
}

async fn read_input(input: Option<&mut ConsoleInput>, buf: &mut [u8]) -> io::Result<usize> {
    match input {
        Some(input) => input.read(buf).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::keylog::KeyLogLabel;
    use crate::tls::mock::{MockLegacyEngine, MockOutcome, MockTls13Engine, CLIENT_HELLO};
    use crate::tls::SecretKind;
    use tokio::io::duplex;
    use tokio::sync::mpsc;

    fn drain(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn finished_count(events: &[SessionEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, SessionEvent::Finished { .. }))
            .count()
    }

    #[tokio::test]
    async fn echo_session_prints_peer_bytes_until_eof() {
        let engine = MockTls13Engine::new(MockOutcome::Establish);
        let (out_tx, mut out_rx) = duplex(1024);
        let mut console = Console::new(None, Box::new(out_tx));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (mut client, server) = duplex(1024);

        let session =
            Session::<_, MockLegacyEngine>::new(&engine, None, SessionMode::Echo, &mut console, tx);
        let client_task = async {
            client.write_all(b"hello").await.unwrap();
            client.shutdown().await.unwrap();
            drop(client);
        };
        let (outcome, ()) = tokio::join!(session.run(Box::new(server)), client_task);

        assert_eq!(outcome, SessionOutcome::Closed(NegotiatedProtocol::Tls13));
        drop(console);
        let mut printed = Vec::new();
        out_rx.read_to_end(&mut printed).await.unwrap();
        assert_eq!(printed, b"hello");
        assert_eq!(finished_count(&drain(&mut rx)), 1);
    }

    #[tokio::test]
    async fn secrets_are_key_logged_once_with_their_labels() {
        let engine = MockTls13Engine::new(MockOutcome::Establish)
            .with_secret(SecretKind::ClientHandshakeTraffic, &[1; 32])
            .with_secret(SecretKind::ClientHandshakeTraffic, &[2; 32])
            .with_secret(SecretKind::ServerAppTraffic, &[3; 32])
            .with_secret(SecretKind::ResumptionMaster, &[4; 32]);
        let mut console = Console::detached();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (client, server) = duplex(1024);
        drop(client);

        let session =
            Session::<_, MockLegacyEngine>::new(&engine, None, SessionMode::Echo, &mut console, tx);
        session.run(Box::new(server)).await;

        let labels: Vec<KeyLogLabel> = drain(&mut rx)
            .into_iter()
            .filter_map(|event| match event {
                SessionEvent::KeyLog(record) => Some(record.label),
                _ => None,
            })
            .collect();
        assert_eq!(
            labels,
            vec![
                KeyLogLabel::ClientHandshakeTrafficSecret,
                KeyLogLabel::ServerTrafficSecret0
            ]
        );
    }

    #[tokio::test]
    async fn handshake_error_finishes_once() {
        let engine = MockTls13Engine::new(MockOutcome::Fail);
        let mut console = Console::detached();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (_client, server) = duplex(64);

        let session =
            Session::<_, MockLegacyEngine>::new(&engine, None, SessionMode::Echo, &mut console, tx);
        let outcome = session.run(Box::new(server)).await;

        assert_eq!(outcome, SessionOutcome::HandshakeFailed(HandshakeStage::Tls13));
        let events = drain(&mut rx);
        assert_eq!(finished_count(&events), 1);
    }

    #[tokio::test]
    async fn fallback_replays_client_hello_into_legacy_engine() {
        let engine = MockTls13Engine::new(MockOutcome::Fallback);
        let legacy = MockLegacyEngine::default();
        let mut console = Console::detached();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (client, server) = duplex(64);
        drop(client);

        let session =
            Session::new(&engine, Some(&legacy), SessionMode::Echo, &mut console, tx);
        let outcome = session.run(Box::new(server)).await;

        assert_eq!(outcome, SessionOutcome::Closed(NegotiatedProtocol::Legacy));
        assert_eq!(
            legacy.pre_received.lock().unwrap().as_deref(),
            Some(CLIENT_HELLO)
        );
        assert_eq!(finished_count(&drain(&mut rx)), 1);
    }

    #[tokio::test]
    async fn fallback_without_legacy_engine_fails() {
        let engine = MockTls13Engine::new(MockOutcome::Fallback);
        let mut console = Console::detached();
        let (tx, _rx) = mpsc::unbounded_channel();
        let (_client, server) = duplex(64);

        let session =
            Session::<_, MockLegacyEngine>::new(&engine, None, SessionMode::Echo, &mut console, tx);
        let outcome = session.run(Box::new(server)).await;
        assert_eq!(outcome, SessionOutcome::HandshakeFailed(HandshakeStage::Legacy));
    }

    #[tokio::test]
    async fn legacy_handshake_error_ends_session() {
        let engine = MockTls13Engine::new(MockOutcome::Fallback);
        let legacy = MockLegacyEngine {
            fail: true,
            ..MockLegacyEngine::default()
        };
        let mut console = Console::detached();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (_client, server) = duplex(64);

        let session =
            Session::new(&engine, Some(&legacy), SessionMode::Echo, &mut console, tx);
        let outcome = session.run(Box::new(server)).await;
        assert_eq!(outcome, SessionOutcome::HandshakeFailed(HandshakeStage::Legacy));
        assert_eq!(finished_count(&drain(&mut rx)), 1);
    }

    #[tokio::test]
    async fn finish_is_idempotent() {
        let engine = MockTls13Engine::new(MockOutcome::Establish);
        let mut console = Console::detached();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (_client, server) = duplex(64);

        let mut session =
            Session::<_, MockLegacyEngine>::new(&engine, None, SessionMode::Echo, &mut console, tx);
        session.start_handshake(Box::new(server)).await.unwrap();
        assert!(matches!(session.state(), SessionState::Connected(_)));

        session.close().await;
        session.close().await;
        session.finish(SessionOutcome::Closed(NegotiatedProtocol::Tls13));
        assert!(matches!(session.state(), SessionState::Closed));
        assert_eq!(finished_count(&drain(&mut rx)), 1);
    }

    #[tokio::test]
    async fn http_split_get_gets_one_response_then_close() {
        let engine = MockTls13Engine::new(MockOutcome::Establish);
        let mut console = Console::detached();
        let (tx, _rx) = mpsc::unbounded_channel();
        let (mut client, server) = duplex(16 * 1024);

        let session =
            Session::<_, MockLegacyEngine>::new(&engine, None, SessionMode::Http, &mut console, tx);
        let client_task = async {
            client.write_all(b"GE").await.unwrap();
            tokio::task::yield_now().await;
            client.write_all(b"T / HTTP/1.1\r\n\r\n").await.unwrap();
            let mut response = String::new();
            client.read_to_string(&mut response).await.unwrap();
            response
        };
        let (outcome, response) = tokio::join!(session.run(Box::new(server)), client_task);

        assert_eq!(outcome, SessionOutcome::Closed(NegotiatedProtocol::Tls13));
        let (head, body) = response.split_once("\r\n\r\n").unwrap();
        assert!(head.starts_with("HTTP/1.0 200 OK"));
        assert!(head.contains(&format!("Content-Length: {}", body.len())));
        assert!(body.starts_with("TLS 1.3 Demo Server\n\n  TLS Version: TLSv1.3"));
        assert_eq!(response.matches("HTTP/1.0").count(), 1);
    }

    #[tokio::test]
    async fn http_fallback_response_uses_fallback_banner() {
        let engine = MockTls13Engine::new(MockOutcome::Fallback);
        let legacy = MockLegacyEngine::default();
        let mut console = Console::detached();
        let (tx, _rx) = mpsc::unbounded_channel();
        let (mut client, server) = duplex(16 * 1024);

        let session = Session::new(&engine, Some(&legacy), SessionMode::Http, &mut console, tx);
        let client_task = async {
            client.write_all(b"GET / HTTP/1.0\r\n\r\n").await.unwrap();
            let mut response = String::new();
            client.read_to_string(&mut response).await.unwrap();
            response
        };
        let (_, response) = tokio::join!(session.run(Box::new(server)), client_task);
        assert!(response.contains("\r\n\r\nTLS 1.3 Demo Server (Fallback)\n\n"));
    }

    #[tokio::test]
    async fn http_post_gets_no_response_and_stays_open() {
        let engine = MockTls13Engine::new(MockOutcome::Establish);
        let mut console = Console::detached();
        let (tx, _rx) = mpsc::unbounded_channel();
        let (mut client, server) = duplex(1024);

        let mut session =
            Session::<_, MockLegacyEngine>::new(&engine, None, SessionMode::Http, &mut console, tx);
        session.start_handshake(Box::new(server)).await.unwrap();

        assert_eq!(
            session.on_data(b"POST / HTTP/1.1\r\n\r\n").await,
            ControlFlow::Continue(())
        );
        assert!(matches!(session.state(), SessionState::Connected(_)));

        let mut probe = [0u8; 1];
        let pending =
            tokio::time::timeout(std::time::Duration::from_millis(50), client.read(&mut probe)).await;
        assert!(pending.is_err(), "no bytes should be sent back");
    }

    #[tokio::test]
    async fn console_input_is_relayed_and_its_eof_closes() {
        let engine = MockTls13Engine::new(MockOutcome::Establish);
        let (mut input_tx, input_rx) = duplex(1024);
        let mut console = Console::new(Some(Box::new(input_rx)), Box::new(tokio::io::sink()));
        let (tx, _rx) = mpsc::unbounded_channel();
        let (mut client, server) = duplex(1024);

        let session =
            Session::<_, MockLegacyEngine>::new(&engine, None, SessionMode::Echo, &mut console, tx);
        let operator = async {
            input_tx.write_all(b"typed line\n").await.unwrap();
            let mut received = vec![0u8; 11];
            client.read_exact(&mut received).await.unwrap();
            drop(input_tx);
            received
        };
        let (outcome, received) = tokio::join!(session.run(Box::new(server)), operator);

        assert_eq!(received, b"typed line\n");
        assert_eq!(outcome, SessionOutcome::Closed(NegotiatedProtocol::Tls13));
    }

    #[tokio::test]
    async fn early_data_is_delivered_before_socket_reads() {
        let mut engine = MockTls13Engine::new(MockOutcome::Establish);
        engine.early_data = Bytes::from_static(b"0-rtt");
        let (out_tx, mut out_rx) = duplex(1024);
        let mut console = Console::new(None, Box::new(out_tx));
        let (tx, _rx) = mpsc::unbounded_channel();
        let (client, server) = duplex(64);
        drop(client);

        let session =
            Session::<_, MockLegacyEngine>::new(&engine, None, SessionMode::Echo, &mut console, tx);
        session.run(Box::new(server)).await;
        drop(console);

        let mut printed = Vec::new();
        out_rx.read_to_end(&mut printed).await.unwrap();
        assert_eq!(printed, b"0-rtt");
    }
}
