//! Negotiated-state snapshots reported after a handshake.

use std::fmt;

use rustls::pki_types::CertificateDer;
use rustls::{CipherSuite, ProtocolVersion, SignatureScheme};
use sha2::{Digest, Sha256};

use crate::ech::EchStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PskType {
    NotAttempted,
    Rejected,
    Resumption,
}

impl fmt::Display for PskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PskType::NotAttempted => "NotAttempted",
            PskType::Rejected => "Rejected",
            PskType::Resumption => "Resumption",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PskMode {
    PskKe,
    PskDheKe,
}

impl fmt::Display for PskMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PskMode::PskKe => "psk_ke",
            PskMode::PskDheKe => "psk_dhe_ke",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyExchangeType {
    None,
    OneRtt,
    HelloRetryRequest,
}

impl fmt::Display for KeyExchangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            KeyExchangeType::None => "None",
            KeyExchangeType::OneRtt => "OneRtt",
            KeyExchangeType::HelloRetryRequest => "HelloRetryRequest",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EarlyDataType {
    NotAttempted,
    Rejected,
    Accepted,
}

impl fmt::Display for EarlyDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EarlyDataType::NotAttempted => "NotAttempted",
            EarlyDataType::Rejected => "Rejected",
            EarlyDataType::Accepted => "Accepted",
        })
    }
}

/// State of an established TLS 1.3 connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tls13Params {
    pub version: String,
    pub cipher_suite: String,
    pub named_group: Option<String>,
    pub signature_scheme: Option<String>,
    pub psk_type: PskType,
    pub psk_mode: Option<PskMode>,
    pub key_exchange: KeyExchangeType,
    pub early_data: EarlyDataType,
    pub server_identity: Option<String>,
    pub client_identity: Option<String>,
    pub cert_compression: Option<String>,
    pub alpn: Option<String>,
    pub client_random: [u8; 32],
    pub ech: EchStatus,
}

/// State of an established legacy (TLS 1.2) connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyParams {
    pub version: String,
    pub cipher: String,
    pub signature_algorithm: Option<String>,
    pub server_identity: Option<String>,
    pub client_identity: Option<String>,
}

/// `sha256:<hex>` fingerprint of a DER certificate.
pub fn certificate_identity(cert: &CertificateDer<'_>) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(cert.as_ref())))
}

pub fn version_name(version: ProtocolVersion) -> String {
    match version {
        ProtocolVersion::TLSv1_3 => "TLSv1.3".to_string(),
        ProtocolVersion::TLSv1_2 => "TLSv1.2".to_string(),
        other => format!("{other:?}"),
    }
}

/// IANA-style name; rustls spells TLS 1.3 suites `TLS13_*`.
pub fn cipher_suite_name(suite: CipherSuite) -> String {
    let name = format!("{suite:?}");
    match name.strip_prefix("TLS13_") {
        Some(rest) => format!("TLS_{rest}"),
        None => name,
    }
}

pub fn signature_scheme_name(scheme: SignatureScheme) -> String {
    let name = match scheme {
        SignatureScheme::ECDSA_NISTP256_SHA256 => "ecdsa_secp256r1_sha256",
        SignatureScheme::ECDSA_NISTP384_SHA384 => "ecdsa_secp384r1_sha384",
        SignatureScheme::ECDSA_NISTP521_SHA512 => "ecdsa_secp521r1_sha512",
        SignatureScheme::RSA_PSS_SHA256 => "rsa_pss_rsae_sha256",
        SignatureScheme::RSA_PSS_SHA384 => "rsa_pss_rsae_sha384",
        SignatureScheme::RSA_PSS_SHA512 => "rsa_pss_rsae_sha512",
        SignatureScheme::RSA_PKCS1_SHA256 => "rsa_pkcs1_sha256",
        SignatureScheme::RSA_PKCS1_SHA384 => "rsa_pkcs1_sha384",
        SignatureScheme::RSA_PKCS1_SHA512 => "rsa_pkcs1_sha512",
        SignatureScheme::ED25519 => "ed25519",
        other => return format!("{other:?}"),
    };
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tls13_suites_use_iana_names() {
        assert_eq!(
            cipher_suite_name(CipherSuite::TLS13_AES_128_GCM_SHA256),
            "TLS_AES_128_GCM_SHA256"
        );
        assert_eq!(
            cipher_suite_name(CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256),
            "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256"
        );
    }

    #[test]
    fn versions_are_dotted() {
        assert_eq!(version_name(ProtocolVersion::TLSv1_3), "TLSv1.3");
        assert_eq!(version_name(ProtocolVersion::TLSv1_2), "TLSv1.2");
    }

    #[test]
    fn identity_is_sha256_fingerprint() {
        let cert = CertificateDer::from(vec![1u8, 2, 3]);
        assert_eq!(
            certificate_identity(&cert),
            "sha256:039058c6f2c0cb492c533b0a4d14ef77cc0f78abccced5287d84a1a2011cfb81"
        );
    }

    #[test]
    fn signature_schemes_use_iana_names() {
        assert_eq!(
            signature_scheme_name(SignatureScheme::ECDSA_NISTP256_SHA256),
            "ecdsa_secp256r1_sha256"
        );
    }
}
