//! NSS key-log sink.
//!
//! Each record becomes one line `LABEL <client random hex> <secret hex>`,
//! appended and flushed immediately so external tools (e.g. Wireshark) can
//! decrypt a capture while the connection is still open.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Labels defined by the NSS key-log format for TLS 1.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyLogLabel {
    ClientEarlyTrafficSecret,
    EarlyExporterSecret,
    ClientHandshakeTrafficSecret,
    ServerHandshakeTrafficSecret,
    ClientTrafficSecret0,
    ServerTrafficSecret0,
    ExporterSecret,
}

impl KeyLogLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyLogLabel::ClientEarlyTrafficSecret => "CLIENT_EARLY_TRAFFIC_SECRET",
            KeyLogLabel::EarlyExporterSecret => "EARLY_EXPORTER_SECRET",
            KeyLogLabel::ClientHandshakeTrafficSecret => "CLIENT_HANDSHAKE_TRAFFIC_SECRET",
            KeyLogLabel::ServerHandshakeTrafficSecret => "SERVER_HANDSHAKE_TRAFFIC_SECRET",
            KeyLogLabel::ClientTrafficSecret0 => "CLIENT_TRAFFIC_SECRET_0",
            KeyLogLabel::ServerTrafficSecret0 => "SERVER_TRAFFIC_SECRET_0",
            KeyLogLabel::ExporterSecret => "EXPORTER_SECRET",
        }
    }

    pub fn from_nss(label: &str) -> Option<Self> {
        Some(match label {
            "CLIENT_EARLY_TRAFFIC_SECRET" => KeyLogLabel::ClientEarlyTrafficSecret,
            "EARLY_EXPORTER_SECRET" => KeyLogLabel::EarlyExporterSecret,
            "CLIENT_HANDSHAKE_TRAFFIC_SECRET" => KeyLogLabel::ClientHandshakeTrafficSecret,
            "SERVER_HANDSHAKE_TRAFFIC_SECRET" => KeyLogLabel::ServerHandshakeTrafficSecret,
            "CLIENT_TRAFFIC_SECRET_0" => KeyLogLabel::ClientTrafficSecret0,
            "SERVER_TRAFFIC_SECRET_0" => KeyLogLabel::ServerTrafficSecret0,
            "EXPORTER_SECRET" => KeyLogLabel::ExporterSecret,
            _ => return None,
        })
    }
}

impl fmt::Display for KeyLogLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One secret, ready to be written.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyLogRecord {
    pub client_random: Vec<u8>,
    pub label: KeyLogLabel,
    pub secret: Vec<u8>,
}

impl KeyLogRecord {
    /// NSS key-log line, newline included.
    pub fn to_line(&self) -> String {
        format!(
            "{} {} {}\n",
            self.label,
            hex::encode(&self.client_random),
            hex::encode(&self.secret)
        )
    }
}

// Secrets stay out of debug output.
impl fmt::Debug for KeyLogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyLogRecord")
            .field("client_random", &hex::encode(&self.client_random))
            .field("label", &self.label)
            .field("secret_len", &self.secret.len())
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum KeyLogError {
    #[error("failed to open key log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write key log record: {0}")]
    Write(#[from] std::io::Error),
}

/// Append-only key-log writer.
pub struct KeyLogWriter {
    sink: Box<dyn AsyncWrite + Unpin + Send>,
    records_written: u64,
}

impl KeyLogWriter {
    /// Wrap an arbitrary sink.
    pub fn new(sink: Box<dyn AsyncWrite + Unpin + Send>) -> Self {
        Self {
            sink,
            records_written: 0,
        }
    }

    /// Open (or create) `path` in append mode.
    pub async fn open(path: &Path) -> Result<Self, KeyLogError> {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|source| KeyLogError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::info!(path = %path.display(), "Writing TLS secrets to key log");
        Ok(Self::new(Box::new(file)))
    }

    pub async fn write(&mut self, record: &KeyLogRecord) -> Result<(), KeyLogError> {
        self.sink.write_all(record.to_line().as_bytes()).await?;
        self.sink.flush().await?;
        self.records_written += 1;
        Ok(())
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }
}

impl fmt::Debug for KeyLogWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyLogWriter")
            .field("records_written", &self.records_written)
            .finish_non_exhaustive()
    }
}
