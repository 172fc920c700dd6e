//! rustls-backed handshake engines.

use std::io::Read;
use std::sync::Arc;

use bytes::Bytes;
use rustls::server::ServerConnection;
use rustls::HandshakeKind;
use tokio_rustls::TlsAcceptor;

use crate::ech::{EchDecrypter, EchStatus};
use crate::net::io::{BoxedIo, PrefixedIo};
use crate::tls::client_hello::{read_client_hello, ClientHello};
use crate::tls::context::{compression_name, ServerContext};
use crate::tls::params::{
    certificate_identity, cipher_suite_name, signature_scheme_name, version_name, EarlyDataType,
    KeyExchangeType, LegacyParams, PskMode, PskType, Tls13Params,
};
use crate::tls::secrets::SecretCollector;
use crate::tls::signing::{chosen_scheme, RecordingResolver, SchemeSlot};
use crate::tls::{
    HandshakeError, LegacyEngine, LegacyEstablished, Tls13Engine, Tls13Established,
    Tls13Handshake,
};

/// TLS 1.3 engine. Reads the client hello itself so that pre-1.3 clients
/// can be handed back for fallback before rustls sees them.
pub struct RustlsTls13Engine {
    context: ServerContext,
    ech: Option<Arc<EchDecrypter>>,
}

impl RustlsTls13Engine {
    pub fn new(context: ServerContext, ech: Option<Arc<EchDecrypter>>) -> Self {
        Self { context, ech }
    }

    fn fallback_enabled(&self) -> bool {
        self.context.legacy.is_some()
    }

    fn params(
        &self,
        conn: &ServerConnection,
        hello: &ClientHello,
        scheme: &SchemeSlot,
        early_accepted: bool,
    ) -> Tls13Params {
        let kind = conn.handshake_kind();
        let resumed = kind == Some(HandshakeKind::Resumed);
        let group = conn.negotiated_key_exchange_group().map(|g| g.name());

        let psk_type = if resumed {
            PskType::Resumption
        } else if hello.psk_offered {
            PskType::Rejected
        } else {
            PskType::NotAttempted
        };
        let psk_mode = resumed.then(|| match group {
            Some(_) => PskMode::PskDheKe,
            None => PskMode::PskKe,
        });
        let key_exchange = match (group, kind) {
            (None, _) => KeyExchangeType::None,
            (Some(_), Some(HandshakeKind::FullWithHelloRetryRequest)) => {
                KeyExchangeType::HelloRetryRequest
            }
            (Some(_), _) => KeyExchangeType::OneRtt,
        };
        let early_data = match (hello.early_data_offered, early_accepted) {
            (false, _) => EarlyDataType::NotAttempted,
            (true, true) => EarlyDataType::Accepted,
            (true, false) => EarlyDataType::Rejected,
        };

        // Certificates are only sent, and so only compressed, on full handshakes.
        let cert_compression = if resumed {
            None
        } else {
            self.context
                .compression
                .iter()
                .find(|algorithm| hello.compress_certificate.contains(&u16::from(**algorithm)))
                .map(|algorithm| compression_name(*algorithm))
        };

        let ech = match &self.ech {
            Some(decrypter) => decrypter.classify(hello.ech.as_ref()),
            None => EchStatus::NotConfigured,
        };

        Tls13Params {
            version: conn
                .protocol_version()
                .map(version_name)
                .unwrap_or_else(|| "(none)".to_string()),
            cipher_suite: conn
                .negotiated_cipher_suite()
                .map(|s| cipher_suite_name(s.suite()))
                .unwrap_or_else(|| "(none)".to_string()),
            named_group: group.map(|g| format!("{g:?}").to_ascii_lowercase()),
            signature_scheme: chosen_scheme(scheme).map(signature_scheme_name),
            psk_type,
            psk_mode,
            key_exchange,
            early_data,
            server_identity: (!resumed).then(|| self.context.server_identity.clone()),
            client_identity: peer_identity(conn),
            cert_compression,
            alpn: conn
                .alpn_protocol()
                .map(|p| String::from_utf8_lossy(p).into_owned()),
            client_random: hello.random,
            ech,
        }
    }
}

impl Tls13Engine for RustlsTls13Engine {
    async fn accept(
        &self,
        mut io: BoxedIo,
        secrets: SecretCollector,
    ) -> Result<Tls13Handshake, HandshakeError> {
        let (raw_hello, hello) = read_client_hello(&mut io).await?;
        if !hello.offers_tls13() && self.fallback_enabled() {
            return Ok(Tls13Handshake::Fallback {
                io,
                client_hello: raw_hello,
            });
        }

        let resolver = RecordingResolver::new(self.context.certified_key.clone());
        let scheme = resolver.slot();
        secrets.set_early_data_offered(hello.early_data_offered);
        let mut config = (*self.context.tls13).clone();
        config.key_log = Arc::new(secrets);
        config.cert_resolver = Arc::new(resolver);

        let acceptor = TlsAcceptor::from(Arc::new(config));
        let mut stream = acceptor
            .accept(PrefixedIo::new(raw_hello, io))
            .await
            .map_err(HandshakeError::Protocol)?;

        let (_, conn) = stream.get_mut();
        let (early_accepted, early_data) = drain_early_data(conn);
        let params = self.params(stream.get_ref().1, &hello, &scheme, early_accepted);

        Ok(Tls13Handshake::Established(Tls13Established {
            stream: Box::new(stream),
            params,
            early_data,
        }))
    }
}

fn drain_early_data(conn: &mut ServerConnection) -> (bool, Bytes) {
    let Some(mut reader) = conn.early_data() else {
        return (false, Bytes::new());
    };
    let mut data = Vec::new();
    if let Err(e) = reader.read_to_end(&mut data) {
        tracing::debug!(error = %e, "Early data unavailable after handshake");
    }
    (true, Bytes::from(data))
}

fn peer_identity(conn: &ServerConnection) -> Option<String> {
    conn.peer_certificates()
        .and_then(|certs| certs.first())
        .map(certificate_identity)
}

/// TLS 1.2 engine used for fallback.
pub struct RustlsLegacyEngine {
    context: ServerContext,
}

impl RustlsLegacyEngine {
    /// `None` when the context was built without fallback support.
    pub fn new(context: ServerContext) -> Option<Self> {
        context.legacy.as_ref()?;
        Some(Self { context })
    }
}

impl LegacyEngine for RustlsLegacyEngine {
    async fn accept(
        &self,
        io: BoxedIo,
        pre_received: Bytes,
    ) -> Result<LegacyEstablished, HandshakeError> {
        let base = self
            .context
            .legacy
            .as_ref()
            .ok_or(HandshakeError::FallbackUnavailable)?;

        let resolver = RecordingResolver::new(self.context.certified_key.clone());
        let scheme = resolver.slot();
        let mut config = (**base).clone();
        config.cert_resolver = Arc::new(resolver);

        let stream = TlsAcceptor::from(Arc::new(config))
            .accept(PrefixedIo::new(pre_received, io))
            .await
            .map_err(HandshakeError::Protocol)?;

        let conn = stream.get_ref().1;
        let params = LegacyParams {
            version: conn
                .protocol_version()
                .map(version_name)
                .unwrap_or_else(|| "(none)".to_string()),
            cipher: conn
                .negotiated_cipher_suite()
                .map(|s| cipher_suite_name(s.suite()))
                .unwrap_or_else(|| "(none)".to_string()),
            signature_algorithm: chosen_scheme(&scheme).map(signature_scheme_name),
            server_identity: Some(self.context.server_identity.clone()),
            client_identity: peer_identity(conn),
        };

        Ok(LegacyEstablished {
            stream: Box::new(stream),
            params,
        })
    }
}
