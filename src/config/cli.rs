//! Command-line interface.
//!
//! Every flag overrides the matching field of the (optional) TOML file.

use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::{ClientAuthMode, ServerConfig};

#[derive(Debug, Parser)]
#[command(name = "tls13-server")]
#[command(about = "Demonstration TLS 1.3 server with legacy-TLS fallback", long_about = None)]
pub struct Cli {
    /// TOML configuration file; flags below override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Port to accept connections on [default: 8443]
    #[arg(long, value_name = "PORT")]
    pub accept: Option<u16>,

    /// Listen backlog [default: 100]
    #[arg(long, value_name = "N")]
    pub backlog: Option<u32>,

    /// Cipher suites in preference order: tiers separated by ':', suites within a tier by ','
    #[arg(long, value_name = "C1,C2:C3")]
    pub ciphers: Option<String>,

    /// PEM server certificate (default: generate a self-signed certificate)
    #[arg(long, value_name = "FILE")]
    pub cert: Option<PathBuf>,

    /// PEM private key for the server certificate
    #[arg(long, value_name = "FILE")]
    pub key: Option<PathBuf>,

    /// Request an optional client certificate
    #[arg(long)]
    pub request_cert: bool,

    /// Require a client certificate
    #[arg(long, conflicts_with = "request_cert")]
    pub require_cert: bool,

    /// Directory of PEM CA certificates used for client verification
    #[arg(long, value_name = "DIR")]
    pub capath: Option<PathBuf>,

    /// Bundle of PEM CA certificates used for client verification
    #[arg(long, value_name = "FILE")]
    pub cafile: Option<PathBuf>,

    /// Dump TLS secrets to an NSS key log file (debugging only)
    #[arg(long, value_name = "FILE")]
    pub keylog: Option<PathBuf>,

    /// Accept early data during resumption
    #[arg(long)]
    pub early: bool,

    /// Maximum amount of early data in bytes [default: u32::MAX]
    #[arg(long, value_name = "BYTES")]
    pub early_max: Option<u32>,

    /// ALPN protocols, separated by ':'
    #[arg(long, value_name = "A1:A2")]
    pub alpn: Option<String>,

    /// Certificate compression algorithms, separated by ':' or ','
    #[arg(long, value_name = "ALGO1:ALGO2")]
    pub cert_compression: Option<String>,

    /// Fall back to a legacy TLS handshake for pre-1.3 clients
    #[arg(long)]
    pub fallback: bool,

    /// Keep accepting connections after a client disconnects
    #[arg(long = "loop")]
    pub loop_forever: bool,

    /// Hide informational logging
    #[arg(long)]
    pub quiet: bool,

    /// Verbose log level (1 = debug, 2+ = trace)
    #[arg(short = 'v', value_name = "N")]
    pub verbosity: Option<u8>,

    /// Answer GET requests with handshake statistics instead of echoing
    #[arg(long)]
    pub http: bool,

    /// Decrypt encrypted client hellos with the built-in demonstration config
    #[arg(long)]
    pub ech: bool,

    /// JSON file of ECH configs ({"echconfigs": [...]}); only the first is used
    #[arg(long, value_name = "FILE")]
    pub ech_configs: Option<PathBuf>,

    /// Private key for the first ECH config (PEM, or two hex lines for x25519)
    #[arg(long, value_name = "FILE")]
    pub ech_private_key: Option<PathBuf>,
}

impl Cli {
    /// Load the config file (if any) and apply flag overrides.
    pub fn into_config(self) -> Result<ServerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ServerConfig::default(),
        };
        self.apply(&mut config);
        Ok(config)
    }

    /// Overlay the flags that were given onto `config`.
    pub fn apply(self, config: &mut ServerConfig) {
        let listener = &mut config.listener;
        if let Some(port) = self.accept {
            listener.port = port;
        }
        if let Some(backlog) = self.backlog {
            listener.backlog = backlog;
        }
        listener.loop_forever |= self.loop_forever;
        listener.http |= self.http;

        let tls = &mut config.tls;
        if let Some(ciphers) = self.ciphers {
            tls.ciphers = parse_cipher_tiers(&ciphers);
        }
        if self.cert.is_some() {
            tls.cert_path = self.cert;
        }
        if self.key.is_some() {
            tls.key_path = self.key;
        }
        if self.require_cert {
            tls.client_auth = ClientAuthMode::Required;
        } else if self.request_cert {
            tls.client_auth = ClientAuthMode::Optional;
        }
        if self.capath.is_some() {
            tls.ca_path = self.capath;
        }
        if self.cafile.is_some() {
            tls.ca_file = self.cafile;
        }
        tls.early_data |= self.early;
        if self.early_max.is_some() {
            tls.early_data_max = self.early_max;
        }
        if let Some(alpn) = self.alpn {
            tls.alpn = split_list(&alpn, &[':']);
        }
        if let Some(algos) = self.cert_compression {
            tls.cert_compression = split_list(&algos, &[':', ',']);
        }
        tls.fallback |= self.fallback;

        if self.keylog.is_some() {
            config.key_log.path = self.keylog;
        }

        let ech = &mut config.ech;
        ech.use_default |= self.ech;
        if self.ech_configs.is_some() {
            ech.configs_file = self.ech_configs;
        }
        if self.ech_private_key.is_some() {
            ech.private_key_file = self.ech_private_key;
        }

        let observability = &mut config.observability;
        observability.quiet |= self.quiet;
        if let Some(verbosity) = self.verbosity {
            observability.verbosity = verbosity;
        }
    }
}

fn split_list(arg: &str, separators: &[char]) -> Vec<String> {
    arg.split(separators)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// `a,b:c` → `[[a, b], [c]]`.
pub fn parse_cipher_tiers(arg: &str) -> Vec<Vec<String>> {
    arg.split(':')
        .map(|tier| split_list(tier, &[',']))
        .filter(|tier| !tier.is_empty())
        .collect()
}
