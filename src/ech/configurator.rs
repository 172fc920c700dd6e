//! Builds the server's ECH decrypter from settings.

use std::path::Path;

use crate::config::EchSettings;
use crate::ech::config::{
    load_ech_configs, EchConfig, HpkeAead, HpkeKdf, HpkeSymmetricSuite, KemId, ECH_VERSION,
};
use crate::ech::decrypter::{DecryptionConfig, EchDecrypter};
use crate::ech::kex::{create_key_exchange, KeyExchange, X25519KeyPair};
use crate::ech::EchError;

const DEFAULT_PRIVATE_KEY: [u8; 32] = [
    0x8c, 0x49, 0x0e, 0x5b, 0x0c, 0x7d, 0xbe, 0x0c, 0x6d, 0x21, 0x92, 0x48, 0x4d, 0x2b, 0x7a, 0x04,
    0x23, 0xb3, 0xb4, 0x54, 0x4f, 0x24, 0x81, 0x09, 0x5a, 0x99, 0xdb, 0xf2, 0x38, 0xfb, 0x35, 0x0f,
];
const DEFAULT_PUBLIC_KEY: [u8; 32] = [
    0x8a, 0x07, 0x56, 0x39, 0x49, 0xfa, 0xc6, 0x23, 0x29, 0x36, 0xed, 0x6f, 0x36, 0xc4, 0xfa, 0x73,
    0x59, 0x30, 0xec, 0xde, 0xae, 0xf6, 0x73, 0x4e, 0x31, 0x4a, 0xea, 0xc3, 0x5a, 0x56, 0xfd, 0x0a,
];

pub struct EchDecrypterConfigurator;

impl EchDecrypterConfigurator {
    /// Config id 0 for `public.example.com`, X25519 with HKDF-SHA256/AES-128-GCM.
    pub fn default_config() -> EchConfig {
        EchConfig {
            version: ECH_VERSION,
            config_id: 0,
            kem_id: KemId::X25519,
            public_key: DEFAULT_PUBLIC_KEY.to_vec(),
            cipher_suites: vec![HpkeSymmetricSuite {
                kdf: HpkeKdf::Sha256,
                aead: HpkeAead::Aes128Gcm,
            }],
            maximum_name_length: 100,
            public_name: "public.example.com".to_string(),
            extensions: Vec::new(),
        }
    }

    pub fn default_decrypter() -> EchDecrypter {
        let kex = X25519KeyPair::from_bytes(DEFAULT_PRIVATE_KEY, DEFAULT_PUBLIC_KEY);
        let mut decrypter = EchDecrypter::new();
        decrypter.add_decryption_config(DecryptionConfig {
            config: Self::default_config(),
            kex: KeyExchange::X25519(kex),
        });
        decrypter
    }

    /// Decrypter for the first config in `configs_file`, keyed by `private_key_file`.
    pub fn from_files(configs_file: &Path, private_key_file: &Path) -> Result<EchDecrypter, EchError> {
        let configs = load_ech_configs(configs_file)?;
        if configs.len() > 1 {
            tracing::warn!(
                count = configs.len(),
                "Multiple ECH configs supplied, only the first is used"
            );
        }
        let config = configs.into_iter().next().ok_or(EchError::NoConfigs)?;

        let kex = create_key_exchange(config.kem_id, private_key_file)?;
        if let KeyExchange::X25519(pair) = &kex {
            if pair.public_key()[..] != config.public_key[..] {
                tracing::warn!(
                    config_id = config.config_id,
                    "ECH private key does not belong to the config's public key"
                );
            }
        }

        let mut decrypter = EchDecrypter::new();
        decrypter.add_decryption_config(DecryptionConfig { config, kex });
        Ok(decrypter)
    }

    /// Decrypter for the given settings, or `None` when ECH is off.
    pub fn configure(settings: &EchSettings) -> Result<Option<EchDecrypter>, EchError> {
        match (&settings.configs_file, &settings.private_key_file) {
            (Some(configs), Some(key)) => {
                if settings.use_default {
                    tracing::warn!("ECH configs file supplied, ignoring the built-in ECH config");
                }
                let decrypter = Self::from_files(configs, key)?;
                tracing::info!(configs = %configs.display(), "ECH decryption configured");
                Ok(Some(decrypter))
            }
            (None, None) if settings.use_default => {
                tracing::info!("ECH decryption configured with the built-in config");
                Ok(Some(Self::default_decrypter()))
            }
            (None, None) => Ok(None),
            _ => Err(EchError::IncompleteInputs),
        }
    }
}
