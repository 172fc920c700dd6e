//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from a TOML file; the
//! command line then overrides individual fields (see `cli.rs`).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (address, backlog, loop, HTTP mode).
    pub listener: ListenerConfig,

    /// TLS server-context settings.
    pub tls: TlsSettings,

    /// Encrypted Client Hello settings.
    pub ech: EchSettings,

    /// Key-log sink.
    pub key_log: KeyLogConfig,

    /// Logging verbosity.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Address to bind (without port).
    pub bind_address: String,

    /// Port to accept connections on.
    pub port: u16,

    /// Listen backlog.
    pub backlog: u32,

    /// Keep accepting after a session ends.
    #[serde(rename = "loop")]
    pub loop_forever: bool,

    /// Serve one diagnostic HTTP response instead of echoing bytes.
    pub http: bool,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8443,
            backlog: 100,
            loop_forever: false,
            http: false,
        }
    }
}

/// Client certificate policy.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClientAuthMode {
    #[default]
    None,
    Optional,
    Required,
}

/// TLS server-context settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct TlsSettings {
    /// PEM certificate chain. Without one a self-signed certificate is generated.
    pub cert_path: Option<PathBuf>,

    /// PEM private key for `cert_path`.
    pub key_path: Option<PathBuf>,

    /// Cipher suites in preference order, grouped in tiers.
    pub ciphers: Vec<Vec<String>>,

    /// ALPN protocols offered to clients.
    pub alpn: Vec<String>,

    pub client_auth: ClientAuthMode,

    /// CA bundle used to verify client certificates.
    pub ca_file: Option<PathBuf>,

    /// Directory of PEM CA certificates used to verify client certificates.
    pub ca_path: Option<PathBuf>,

    /// Accept 0-RTT data on resumption.
    pub early_data: bool,

    /// Maximum early data size in bytes (defaults to `u32::MAX`).
    pub early_data_max: Option<u32>,

    /// Certificate compression algorithms (`zlib`, `brotli`, `zstd`).
    pub cert_compression: Vec<String>,

    /// Hand pre-1.3 clients to the legacy engine on the same socket.
    pub fallback: bool,
}

impl TlsSettings {
    pub fn early_data_limit(&self) -> u32 {
        self.early_data_max.unwrap_or(u32::MAX)
    }
}

/// Encrypted Client Hello settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct EchSettings {
    /// Use the built-in demonstration config and key pair.
    pub use_default: bool,

    /// JSON file holding `{"echconfigs": [...]}`.
    pub configs_file: Option<PathBuf>,

    /// Private key matching the first config's public key.
    pub private_key_file: Option<PathBuf>,
}

/// Key-log sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct KeyLogConfig {
    /// NSS key-log file; secrets are not logged when unset.
    pub path: Option<PathBuf>,
}

/// Logging verbosity.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Only log errors.
    pub quiet: bool,

    /// 0 = info, 1 = debug, 2+ = trace.
    pub verbosity: u8,

    /// Raw `EnvFilter` directive, overrides `quiet` and `verbosity`.
    pub filter: Option<String>,
}
