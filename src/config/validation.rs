//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check mutually-required options (cert/key, ECH configs/key)
//! - Check options that depend on others (fallback needs a real certificate)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before any file is read or socket is opened

use std::net::IpAddr;

use thiserror::Error;

use crate::config::schema::{ClientAuthMode, ServerConfig};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address {0:?}")]
    InvalidBindAddress(String),

    #[error("listen backlog must be greater than zero")]
    ZeroBacklog,

    #[error("--cert and --key are both required when specified")]
    IncompleteCertificate,

    #[error(
        "must provide both an ECH configs file (--ech-configs) and an ECH private key (--ech-private-key) or neither"
    )]
    IncompleteEchInputs,

    #[error("fallback mode requires explicit certificates")]
    FallbackRequiresCertificate,

    #[error("client certificate verification requires --cafile or --capath")]
    ClientAuthWithoutCa,
}

/// Validate a fully merged configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.listener.backlog == 0 {
        errors.push(ValidationError::ZeroBacklog);
    }

    let tls = &config.tls;
    if tls.cert_path.is_some() != tls.key_path.is_some() {
        errors.push(ValidationError::IncompleteCertificate);
    }
    if tls.fallback && tls.cert_path.is_none() {
        errors.push(ValidationError::FallbackRequiresCertificate);
    }
    if tls.client_auth != ClientAuthMode::None && tls.ca_file.is_none() && tls.ca_path.is_none() {
        errors.push(ValidationError::ClientAuthWithoutCa);
    }

    let ech = &config.ech;
    if ech.configs_file.is_some() != ech.private_key_file.is_some() {
        errors.push(ValidationError::IncompleteEchInputs);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
