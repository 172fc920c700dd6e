//! In-memory engines for session and acceptor tests.
//!
//! "Established" streams are the raw transport itself, so the test peer
//! speaks plaintext on the other end of a `tokio::io::duplex`.

use std::io;
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use crate::ech::EchStatus;
use crate::net::io::BoxedIo;
use crate::tls::params::{EarlyDataType, KeyExchangeType, LegacyParams, PskType, Tls13Params};
use crate::tls::{
    HandshakeError, LegacyEngine, LegacyEstablished, SecretCollector, SecretKind, Tls13Engine,
    Tls13Established, Tls13Handshake,
};

pub const CLIENT_RANDOM: [u8; 32] = [0x5a; 32];
pub const CLIENT_HELLO: &[u8] = b"\x16\x03\x01legacy-hello";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOutcome {
    Establish,
    Fallback,
    Fail,
}

pub struct MockTls13Engine {
    pub outcome: MockOutcome,
    pub secrets: Vec<(SecretKind, Vec<u8>)>,
    pub early_data: Bytes,
}

impl MockTls13Engine {
    pub fn new(outcome: MockOutcome) -> Self {
        Self {
            outcome,
            secrets: Vec::new(),
            early_data: Bytes::new(),
        }
    }

    pub fn with_secret(mut self, kind: SecretKind, secret: &[u8]) -> Self {
        self.secrets.push((kind, secret.to_vec()));
        self
    }
}

pub fn tls13_params() -> Tls13Params {
    Tls13Params {
        version: "TLSv1.3".into(),
        cipher_suite: "TLS_AES_128_GCM_SHA256".into(),
        named_group: Some("x25519".into()),
        signature_scheme: Some("ecdsa_secp256r1_sha256".into()),
        psk_type: PskType::NotAttempted,
        psk_mode: None,
        key_exchange: KeyExchangeType::OneRtt,
        early_data: EarlyDataType::NotAttempted,
        server_identity: Some("sha256:00".into()),
        client_identity: None,
        cert_compression: None,
        alpn: None,
        client_random: CLIENT_RANDOM,
        ech: EchStatus::NotConfigured,
    }
}

pub fn legacy_params() -> LegacyParams {
    LegacyParams {
        version: "TLSv1.2".into(),
        cipher: "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256".into(),
        signature_algorithm: Some("ecdsa_secp256r1_sha256".into()),
        server_identity: Some("sha256:00".into()),
        client_identity: None,
    }
}

impl Tls13Engine for MockTls13Engine {
    async fn accept(
        &self,
        io: BoxedIo,
        secrets: SecretCollector,
    ) -> Result<Tls13Handshake, HandshakeError> {
        for (kind, secret) in &self.secrets {
            secrets.record(*kind, &CLIENT_RANDOM, secret);
        }
        match self.outcome {
            MockOutcome::Establish => Ok(Tls13Handshake::Established(Tls13Established {
                stream: io,
                params: tls13_params(),
                early_data: self.early_data.clone(),
            })),
            MockOutcome::Fallback => Ok(Tls13Handshake::Fallback {
                io,
                client_hello: Bytes::from_static(CLIENT_HELLO),
            }),
            MockOutcome::Fail => Err(HandshakeError::Protocol(io::Error::new(
                io::ErrorKind::InvalidData,
                "bad client hello",
            ))),
        }
    }
}

#[derive(Clone, Default)]
pub struct MockLegacyEngine {
    pub fail: bool,
    pub pre_received: Arc<Mutex<Option<Bytes>>>,
}

impl LegacyEngine for MockLegacyEngine {
    async fn accept(
        &self,
        io: BoxedIo,
        pre_received: Bytes,
    ) -> Result<LegacyEstablished, HandshakeError> {
        *self.pre_received.lock().unwrap() = Some(pre_received);
        if self.fail {
            return Err(HandshakeError::Protocol(io::Error::new(
                io::ErrorKind::InvalidData,
                "no shared cipher",
            )));
        }
        Ok(LegacyEstablished {
            stream: io,
            params: legacy_params(),
        })
    }
}
