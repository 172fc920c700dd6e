//! Server-context setup: certificates, ciphers, client auth, tickets,
//! early data and certificate compression for both engines.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::compress::CertCompressor;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::server::danger::ClientCertVerifier;
use rustls::server::{ServerSessionMemoryCache, VerifierBuilderError, WebPkiClientVerifier};
use rustls::sign::CertifiedKey;
use rustls::{CertificateCompressionAlgorithm, RootCertStore, SupportedCipherSuite};
use thiserror::Error;

use crate::config::{ClientAuthMode, TlsSettings};
use crate::tls::params::{certificate_identity, cipher_suite_name};
use crate::tls::signing::RecordingResolver;

/// Resumable sessions kept when early data is enabled.
const SESSION_CACHE_SIZE: usize = 256;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no certificates found in {0}")]
    NoCertificates(PathBuf),

    #[error("no private key found in {0}")]
    NoPrivateKey(PathBuf),

    #[error("unknown cipher suite {0:?}")]
    UnknownCipher(String),

    #[error("no TLS 1.3 cipher suites configured")]
    NoTls13Ciphers,

    #[error("failed to generate self-signed certificate: {0}")]
    SelfSigned(#[from] rcgen::Error),

    #[error("failed to load CA certificates: {0}")]
    CaStore(String),

    #[error("failed to build client certificate verifier: {0}")]
    Verifier(#[from] VerifierBuilderError),

    #[error(transparent)]
    Rustls(#[from] rustls::Error),
}

/// Everything the engines need, built once at startup.
#[derive(Debug, Clone)]
pub struct ServerContext {
    /// TLS 1.3-only configuration.
    pub tls13: Arc<rustls::ServerConfig>,
    /// TLS 1.2-only configuration, present when fallback is enabled.
    pub legacy: Option<Arc<rustls::ServerConfig>>,
    pub certified_key: Arc<CertifiedKey>,
    pub server_identity: String,
    /// Compression algorithms in server preference order.
    pub compression: Vec<CertificateCompressionAlgorithm>,
}

pub fn build_server_context(settings: &TlsSettings) -> Result<ServerContext, ContextError> {
    let provider = Arc::new(select_cipher_suites(
        rustls::crypto::ring::default_provider(),
        &settings.ciphers,
    )?);

    let (chain, key) = match (&settings.cert_path, &settings.key_path) {
        (Some(cert), Some(key)) => (load_certs(cert)?, load_private_key(key)?),
        _ => self_signed()?,
    };
    let signing_key = provider.key_provider.load_private_key(key)?;
    let certified_key = Arc::new(CertifiedKey::new(chain, signing_key));
    let server_identity = certified_key
        .end_entity_cert()
        .map(certificate_identity)
        .unwrap_or_else(|_| "(none)".to_string());

    let verifier = client_verifier(settings, provider.clone())?;
    let alpn: Vec<Vec<u8>> = settings.alpn.iter().map(|p| p.as_bytes().to_vec()).collect();
    let (compressors, compression) = select_compressors(&settings.cert_compression);

    let mut tls13 = rustls::ServerConfig::builder_with_provider(provider.clone())
        .with_protocol_versions(&[&rustls::version::TLS13])?
        .with_client_cert_verifier(verifier.clone())
        .with_cert_resolver(Arc::new(RecordingResolver::new(certified_key.clone())));
    tls13.alpn_protocols = alpn.clone();
    tls13.cert_compressors = compressors;
    // rustls only grants 0-RTT on stateful resumption, so the ticketer and
    // early data are mutually exclusive.
    if settings.early_data {
        tls13.session_storage = ServerSessionMemoryCache::new(SESSION_CACHE_SIZE);
        tls13.max_early_data_size = settings.early_data_limit();
    } else {
        tls13.ticketer = rustls::crypto::ring::Ticketer::new()?;
    }

    let legacy = if settings.fallback {
        let mut legacy = rustls::ServerConfig::builder_with_provider(provider)
            .with_protocol_versions(&[&rustls::version::TLS12])?
            .with_client_cert_verifier(verifier)
            .with_cert_resolver(Arc::new(RecordingResolver::new(certified_key.clone())));
        legacy.alpn_protocols = alpn;
        Some(Arc::new(legacy))
    } else {
        None
    };

    tracing::info!(
        server_identity = %server_identity,
        fallback = settings.fallback,
        early_data = settings.early_data,
        "Server context ready"
    );

    Ok(ServerContext {
        tls13: Arc::new(tls13),
        legacy,
        certified_key,
        server_identity,
        compression,
    })
}

fn normalize_cipher_name(name: &str) -> String {
    let upper = name.trim().to_ascii_uppercase();
    match upper.strip_prefix("TLS13_") {
        Some(rest) => format!("TLS_{rest}"),
        None => upper,
    }
}

/// Reorder TLS 1.3 suites to follow `tiers`. TLS 1.2 suites are left as the
/// provider ships them for the fallback engine.
fn select_cipher_suites(
    mut provider: CryptoProvider,
    tiers: &[Vec<String>],
) -> Result<CryptoProvider, ContextError> {
    if tiers.is_empty() {
        return Ok(provider);
    }

    let available = provider.cipher_suites.clone();
    let mut selected: Vec<SupportedCipherSuite> = Vec::new();
    for name in tiers.iter().flatten() {
        let wanted = normalize_cipher_name(name);
        let suite = available
            .iter()
            .find(|s| s.tls13().is_some() && cipher_suite_name(s.suite()) == wanted)
            .ok_or_else(|| ContextError::UnknownCipher(name.clone()))?;
        if !selected.contains(suite) {
            selected.push(*suite);
        }
    }
    if selected.is_empty() {
        return Err(ContextError::NoTls13Ciphers);
    }
    selected.extend(available.into_iter().filter(|s| s.tls13().is_none()));
    provider.cipher_suites = selected;
    Ok(provider)
}

fn open(path: &Path) -> Result<BufReader<File>, ContextError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| ContextError::Read {
            path: path.to_path_buf(),
            source,
        })
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, ContextError> {
    let certs = rustls_pemfile::certs(&mut open(path)?)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| ContextError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    if certs.is_empty() {
        return Err(ContextError::NoCertificates(path.to_path_buf()));
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, ContextError> {
    rustls_pemfile::private_key(&mut open(path)?)
        .map_err(|source| ContextError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| ContextError::NoPrivateKey(path.to_path_buf()))
}

fn self_signed() -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>), ContextError> {
    let generated = rcgen::generate_simple_self_signed(vec!["localhost".to_string()])?;
    tracing::info!("No certificate supplied, using a self-signed certificate for localhost");
    let key = PrivatePkcs8KeyDer::from(generated.key_pair.serialize_der());
    Ok((vec![generated.cert.der().clone()], PrivateKeyDer::Pkcs8(key)))
}

fn client_verifier(
    settings: &TlsSettings,
    provider: Arc<CryptoProvider>,
) -> Result<Arc<dyn ClientCertVerifier>, ContextError> {
    if settings.client_auth == ClientAuthMode::None {
        return Ok(WebPkiClientVerifier::no_client_auth());
    }

    let mut roots = RootCertStore::empty();
    if let Some(file) = &settings.ca_file {
        add_roots(&mut roots, file)?;
    }
    if let Some(dir) = &settings.ca_path {
        let entries = std::fs::read_dir(dir).map_err(|source| ContextError::Read {
            path: dir.clone(),
            source,
        })?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() {
                add_roots(&mut roots, &path)?;
            }
        }
    }
    if roots.is_empty() {
        return Err(ContextError::CaStore("no CA certificates found".into()));
    }
    tracing::debug!(roots = roots.len(), "Loaded client CA certificates");

    let builder = WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider);
    let verifier = match settings.client_auth {
        ClientAuthMode::Optional => builder.allow_unauthenticated().build()?,
        _ => builder.build()?,
    };
    Ok(verifier)
}

fn add_roots(roots: &mut RootCertStore, path: &Path) -> Result<(), ContextError> {
    for cert in load_certs(path)? {
        roots
            .add(cert)
            .map_err(|e| ContextError::CaStore(format!("{}: {e}", path.display())))?;
    }
    Ok(())
}

fn parse_compression_algorithm(name: &str) -> Option<CertificateCompressionAlgorithm> {
    match name.to_ascii_lowercase().as_str() {
        "zlib" => Some(CertificateCompressionAlgorithm::Zlib),
        "brotli" => Some(CertificateCompressionAlgorithm::Brotli),
        "zstd" => Some(CertificateCompressionAlgorithm::Zstd),
        _ => None,
    }
}

/// Compressors for the requested algorithms that this build can provide.
fn select_compressors(
    names: &[String],
) -> (Vec<&'static dyn CertCompressor>, Vec<CertificateCompressionAlgorithm>) {
    let mut compressors = Vec::new();
    let mut algorithms = Vec::new();
    for name in names {
        let Some(algorithm) = parse_compression_algorithm(name) else {
            tracing::warn!(algorithm = %name, "Unknown certificate compression algorithm, ignoring");
            continue;
        };
        let found = rustls::compress::default_cert_compressors()
            .iter()
            .find(|c| c.algorithm() == algorithm);
        match found {
            Some(compressor) if !algorithms.contains(&algorithm) => {
                compressors.push(*compressor);
                algorithms.push(algorithm);
            }
            Some(_) => {}
            None => tracing::warn!(
                algorithm = %name,
                "Don't know what compressor to use for this algorithm, ignoring"
            ),
        }
    }
    (compressors, algorithms)
}

pub fn compression_name(algorithm: CertificateCompressionAlgorithm) -> String {
    format!("{algorithm:?}").to_ascii_lowercase()
}
