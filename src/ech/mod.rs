//! Encrypted Client Hello decryption setup.
//!
//! # Data Flow
//! ```text
//! --ech                      → configurator.rs (built-in config + X25519 pair)
//! --ech-configs + --ech-private-key
//!     → config.rs (JSON → EchConfig, first entry only)
//!     → kex.rs (KEM id → key-exchange object holding the private key)
//!     → decrypter.rs (EchDecrypter, queried per client hello)
//! ```
//!
//! The decrypter answers which configuration would handle a client's ECH
//! offer; HPKE decryption of the inner hello is not performed.

use std::path::PathBuf;

use thiserror::Error;

pub mod config;
pub mod configurator;
pub mod decrypter;
pub mod kex;

pub use config::{EchConfig, HpkeAead, HpkeKdf, HpkeSymmetricSuite, KemId};
pub use configurator::EchDecrypterConfigurator;
pub use decrypter::{DecryptionConfig, EchDecrypter, EchStatus};
pub use kex::{EcKeyExchange, KeyExchange, X25519KeyPair};

#[derive(Debug, Error)]
pub enum EchError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse ECH configs JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid ECH config: {0}")]
    InvalidConfig(String),

    #[error("ECH configs file contains no configs")]
    NoConfigs,

    #[error("unsupported KEM {0:?}")]
    UnsupportedKem(String),

    #[error("unable to load ECH private key: {0}")]
    InvalidKey(String),

    #[error("must provide both an ECH configs file and an ECH private key or neither")]
    IncompleteInputs,
}
