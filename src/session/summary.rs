//! Human-readable handshake summaries, shared by the operator log and the
//! HTTP responder.

use crate::ech::EchStatus;
use crate::tls::params::{LegacyParams, Tls13Params};
use crate::tls::secrets::{SecretBundle, SecretKind};

const NONE: &str = "(none)";

fn or_none(value: Option<&str>) -> &str {
    value.unwrap_or(NONE)
}

pub fn handshake_summary(params: &Tls13Params, secrets: &SecretBundle) -> Vec<String> {
    let mut lines = vec![
        format!("  TLS Version: {}", params.version),
        format!("  Cipher Suite:  {}", params.cipher_suite),
        format!("  Named Group: {}", or_none(params.named_group.as_deref())),
        format!(
            "  Signature Scheme: {}",
            or_none(params.signature_scheme.as_deref())
        ),
        format!("  PSK: {}", params.psk_type),
        format!(
            "  PSK Mode: {}",
            params
                .psk_mode
                .map(|mode| mode.to_string())
                .unwrap_or_else(|| NONE.to_string())
        ),
        format!("  Key Exchange Type: {}", params.key_exchange),
        format!("  Early: {}", params.early_data),
        format!(
            "  Server identity: {}",
            or_none(params.server_identity.as_deref())
        ),
        format!(
            "  Client Identity: {}",
            or_none(params.client_identity.as_deref())
        ),
        format!(
            "  Server Certificate Compression: {}",
            or_none(params.cert_compression.as_deref())
        ),
        format!("  ALPN: {}", or_none(params.alpn.as_deref())),
        format!("  Client Random: {}", hex::encode(params.client_random)),
        "  Secrets:".to_string(),
    ];

    for kind in SecretKind::ALL {
        let value = secrets
            .get(kind)
            .map(hex::encode)
            .unwrap_or_else(|| NONE.to_string());
        lines.push(format!("    {}: {value}", kind.display_name()));
    }

    if params.ech != EchStatus::NotConfigured {
        lines.push(format!("  Encrypted Client Hello: {}", params.ech));
    }
    lines
}

pub fn fallback_summary(params: &LegacyParams) -> Vec<String> {
    vec![
        format!("  TLS Version: {}", params.version),
        format!("  Cipher:  {}", params.cipher),
        format!(
            "  Signature Algorithm: {}",
            or_none(params.signature_algorithm.as_deref())
        ),
        format!(
            "  Server identity: {}",
            or_none(params.server_identity.as_deref())
        ),
        format!(
            "  Client Identity: {}",
            or_none(params.client_identity.as_deref())
        ),
    ]
}
