//! Certificate resolution that remembers which signature scheme was used.
//!
//! rustls does not expose the negotiated signature scheme, so the server's
//! signing key is wrapped and the scheme picked during the handshake is
//! written into a per-connection slot.

use std::sync::{Arc, Mutex, PoisonError};

use rustls::server::{ClientHello, ResolvesServerCert};
use rustls::sign::{CertifiedKey, Signer, SigningKey};
use rustls::{SignatureAlgorithm, SignatureScheme};

/// Where the chosen scheme lands.
pub type SchemeSlot = Arc<Mutex<Option<SignatureScheme>>>;

#[derive(Debug)]
pub struct RecordingResolver {
    certified: Arc<CertifiedKey>,
    chosen: SchemeSlot,
}

impl RecordingResolver {
    pub fn new(certified: Arc<CertifiedKey>) -> Self {
        Self {
            certified,
            chosen: SchemeSlot::default(),
        }
    }

    pub fn slot(&self) -> SchemeSlot {
        self.chosen.clone()
    }
}

/// Scheme recorded in `slot`, if the server signed anything.
pub fn chosen_scheme(slot: &SchemeSlot) -> Option<SignatureScheme> {
    *slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ResolvesServerCert for RecordingResolver {
    fn resolve(&self, _client_hello: ClientHello<'_>) -> Option<Arc<CertifiedKey>> {
        let key = RecordingSigningKey {
            inner: self.certified.key.clone(),
            chosen: self.chosen.clone(),
        };
        Some(Arc::new(CertifiedKey::new(
            self.certified.cert.clone(),
            Arc::new(key),
        )))
    }
}

#[derive(Debug)]
struct RecordingSigningKey {
    inner: Arc<dyn SigningKey>,
    chosen: SchemeSlot,
}

impl SigningKey for RecordingSigningKey {
    fn choose_scheme(&self, offered: &[SignatureScheme]) -> Option<Box<dyn Signer>> {
        let signer = self.inner.choose_scheme(offered)?;
        *self.chosen.lock().unwrap_or_else(PoisonError::into_inner) = Some(signer.scheme());
        Some(signer)
    }

    fn algorithm(&self) -> SignatureAlgorithm {
        self.inner.algorithm()
    }
}
