//! Per-session secret capture.
//!
//! The TLS 1.3 engine hands every derived secret to a [`SecretCollector`]
//! as soon as it exists. The collector stores it in the session's
//! [`SecretBundle`] and, for secrets with an NSS label, forwards one
//! [`KeyLogRecord`] to the acceptor over the session's event channel.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc::UnboundedSender;

use crate::net::connection::SessionEvent;
use crate::observability::keylog::{KeyLogLabel, KeyLogRecord};

/// Every secret a TLS 1.3 handshake can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretKind {
    ExternalPskBinder,
    ResumptionPskBinder,
    EarlyExporter,
    ClientEarlyTraffic,
    ClientHandshakeTraffic,
    ServerHandshakeTraffic,
    ExporterMaster,
    ResumptionMaster,
    ClientAppTraffic,
    ServerAppTraffic,
}

impl SecretKind {
    /// Summary order.
    pub const ALL: [SecretKind; 10] = [
        SecretKind::ExternalPskBinder,
        SecretKind::ResumptionPskBinder,
        SecretKind::EarlyExporter,
        SecretKind::ClientEarlyTraffic,
        SecretKind::ClientHandshakeTraffic,
        SecretKind::ServerHandshakeTraffic,
        SecretKind::ExporterMaster,
        SecretKind::ResumptionMaster,
        SecretKind::ClientAppTraffic,
        SecretKind::ServerAppTraffic,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Secrets that only exist when the client attempts 0-RTT.
    pub fn is_early(self) -> bool {
        matches!(self, SecretKind::EarlyExporter | SecretKind::ClientEarlyTraffic)
    }

    /// Name shown in the handshake summary.
    pub fn display_name(self) -> &'static str {
        match self {
            SecretKind::ExternalPskBinder => "External PSK Binder",
            SecretKind::ResumptionPskBinder => "Resumption PSK Binder",
            SecretKind::EarlyExporter => "Early Exporter",
            SecretKind::ClientEarlyTraffic => "Early Client Data",
            SecretKind::ClientHandshakeTraffic => "Client Handshake",
            SecretKind::ServerHandshakeTraffic => "Server Handshake",
            SecretKind::ExporterMaster => "Exporter Master",
            SecretKind::ResumptionMaster => "Resumption Master",
            SecretKind::ClientAppTraffic => "Client Traffic",
            SecretKind::ServerAppTraffic => "Server Traffic",
        }
    }

    /// NSS key-log label, if the format defines one for this secret.
    pub fn key_log_label(self) -> Option<KeyLogLabel> {
        match self {
            SecretKind::EarlyExporter => Some(KeyLogLabel::EarlyExporterSecret),
            SecretKind::ClientEarlyTraffic => Some(KeyLogLabel::ClientEarlyTrafficSecret),
            SecretKind::ClientHandshakeTraffic => Some(KeyLogLabel::ClientHandshakeTrafficSecret),
            SecretKind::ServerHandshakeTraffic => Some(KeyLogLabel::ServerHandshakeTrafficSecret),
            SecretKind::ExporterMaster => Some(KeyLogLabel::ExporterSecret),
            SecretKind::ClientAppTraffic => Some(KeyLogLabel::ClientTrafficSecret0),
            SecretKind::ServerAppTraffic => Some(KeyLogLabel::ServerTrafficSecret0),
            SecretKind::ExternalPskBinder
            | SecretKind::ResumptionPskBinder
            | SecretKind::ResumptionMaster => None,
        }
    }
}

impl From<KeyLogLabel> for SecretKind {
    fn from(label: KeyLogLabel) -> Self {
        match label {
            KeyLogLabel::ClientEarlyTrafficSecret => SecretKind::ClientEarlyTraffic,
            KeyLogLabel::EarlyExporterSecret => SecretKind::EarlyExporter,
            KeyLogLabel::ClientHandshakeTrafficSecret => SecretKind::ClientHandshakeTraffic,
            KeyLogLabel::ServerHandshakeTrafficSecret => SecretKind::ServerHandshakeTraffic,
            KeyLogLabel::ClientTrafficSecret0 => SecretKind::ClientAppTraffic,
            KeyLogLabel::ServerTrafficSecret0 => SecretKind::ServerAppTraffic,
            KeyLogLabel::ExporterSecret => SecretKind::ExporterMaster,
        }
    }
}

/// Optional byte string per [`SecretKind`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SecretBundle {
    secrets: [Option<Vec<u8>>; 10],
}

impl SecretBundle {
    pub fn get(&self, kind: SecretKind) -> Option<&[u8]> {
        self.secrets[kind.index()].as_deref()
    }

    /// Store `secret` unless one is already present. Returns whether it was stored.
    pub fn insert(&mut self, kind: SecretKind, secret: &[u8]) -> bool {
        let slot = &mut self.secrets[kind.index()];
        if slot.is_some() {
            return false;
        }
        *slot = Some(secret.to_vec());
        true
    }

    pub fn len(&self) -> usize {
        self.secrets.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for SecretBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let present: Vec<SecretKind> = SecretKind::ALL
            .into_iter()
            .filter(|kind| self.get(*kind).is_some())
            .collect();
        f.debug_struct("SecretBundle").field("present", &present).finish()
    }
}

struct Collected {
    bundle: SecretBundle,
    client_random: Option<Vec<u8>>,
    /// Cleared when the client hello carries no early_data extension.
    early_data_offered: bool,
}

impl Default for Collected {
    fn default() -> Self {
        Self {
            bundle: SecretBundle::default(),
            client_random: None,
            early_data_offered: true,
        }
    }
}

/// Shared sink the TLS 1.3 engine writes secrets into.
///
/// Cloning yields another handle onto the same bundle.
#[derive(Clone)]
pub struct SecretCollector {
    collected: Arc<Mutex<Collected>>,
    events: UnboundedSender<SessionEvent>,
}

impl SecretCollector {
    pub fn new(events: UnboundedSender<SessionEvent>) -> Self {
        Self {
            collected: Arc::new(Mutex::new(Collected::default())),
            events,
        }
    }

    /// Tell the collector whether the client offered 0-RTT. Without an
    /// offer, early secrets are dropped: rustls derives the client early
    /// traffic secret on every resumption regardless.
    pub fn set_early_data_offered(&self, offered: bool) {
        self.collected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .early_data_offered = offered;
    }

    /// Record one secret. Only the first secret of each kind is kept and key-logged.
    pub fn record(&self, kind: SecretKind, client_random: &[u8], secret: &[u8]) {
        let inserted = {
            let mut collected = self
                .collected
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if kind.is_early() && !collected.early_data_offered {
                tracing::trace!(?kind, "Early secret without an early data offer ignored");
                return;
            }
            if collected.client_random.is_none() {
                collected.client_random = Some(client_random.to_vec());
            }
            collected.bundle.insert(kind, secret)
        };
        if !inserted {
            tracing::debug!(?kind, "Duplicate secret ignored");
            return;
        }

        if let Some(label) = kind.key_log_label() {
            let record = KeyLogRecord {
                client_random: client_random.to_vec(),
                label,
                secret: secret.to_vec(),
            };
            // The receiver is gone once the session has finished.
            let _ = self.events.send(SessionEvent::KeyLog(record));
        }
    }

    /// Snapshot of everything captured so far.
    pub fn bundle(&self) -> SecretBundle {
        self.collected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .bundle
            .clone()
    }

    /// Client random seen with the first secret.
    pub fn client_random(&self) -> Option<Vec<u8>> {
        self.collected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .client_random
            .clone()
    }
}

impl fmt::Debug for SecretCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretCollector")
            .field("bundle", &self.bundle())
            .finish_non_exhaustive()
    }
}

impl rustls::KeyLog for SecretCollector {
    fn log(&self, label: &str, client_random: &[u8], secret: &[u8]) {
        match KeyLogLabel::from_nss(label) {
            Some(label) => self.record(SecretKind::from(label), client_random, secret),
            None => tracing::trace!(label, "Ignoring secret without a TLS 1.3 label"),
        }
    }
}
