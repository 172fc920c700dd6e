//! ECH decrypter: the set of configs the server holds private keys for.

use std::fmt;

use crate::ech::config::{EchConfig, HpkeSymmetricSuite};
use crate::ech::kex::KeyExchange;
use crate::tls::client_hello::EchOffer;

/// An ECH config paired with the private half of its public key.
#[derive(Debug)]
pub struct DecryptionConfig {
    pub config: EchConfig,
    pub kex: KeyExchange,
}

/// How a client's ECH offer relates to the configured decrypter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchStatus {
    NotConfigured,
    NotOffered,
    /// The client sent the inner-hello marker in the clear.
    InnerMarker,
    Matched { config_id: u8 },
    UnknownConfig { config_id: u8 },
}

impl fmt::Display for EchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EchStatus::NotConfigured => f.write_str("not configured"),
            EchStatus::NotOffered => f.write_str("not offered"),
            EchStatus::InnerMarker => f.write_str("inner hello marker received"),
            EchStatus::Matched { config_id } => write!(f, "offered for config {config_id}"),
            EchStatus::UnknownConfig { config_id } => {
                write!(f, "offered for unknown config {config_id}")
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct EchDecrypter {
    configs: Vec<DecryptionConfig>,
}

impl EchDecrypter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_decryption_config(&mut self, config: DecryptionConfig) {
        self.configs.push(config);
    }

    pub fn configs(&self) -> &[DecryptionConfig] {
        &self.configs
    }

    /// Config able to decrypt a hello encrypted to `config_id` with `suite`.
    pub fn find(&self, config_id: u8, suite: HpkeSymmetricSuite) -> Option<&DecryptionConfig> {
        self.configs.iter().find(|candidate| {
            candidate.config.config_id == config_id
                && candidate.config.cipher_suites.contains(&suite)
        })
    }

    pub fn classify(&self, offer: Option<&EchOffer>) -> EchStatus {
        match offer {
            None => EchStatus::NotOffered,
            Some(EchOffer::Inner) => EchStatus::InnerMarker,
            Some(EchOffer::Outer {
                kdf_id,
                aead_id,
                config_id,
            }) => {
                let matched = HpkeSymmetricSuite::from_ids(*kdf_id, *aead_id)
                    .and_then(|suite| self.find(*config_id, suite));
                match matched {
                    Some(_) => EchStatus::Matched {
                        config_id: *config_id,
                    },
                    None => EchStatus::UnknownConfig {
                        config_id: *config_id,
                    },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ech::configurator::EchDecrypterConfigurator;

    #[test]
    fn default_config_matches_its_own_suite() {
        let decrypter = EchDecrypterConfigurator::default_decrypter();
        let offer = EchOffer::Outer {
            kdf_id: 1,
            aead_id: 1,
            config_id: 0,
        };
        assert_eq!(
            decrypter.classify(Some(&offer)),
            EchStatus::Matched { config_id: 0 }
        );
    }

    #[test]
    fn unknown_config_id_or_suite_does_not_match() {
        let decrypter = EchDecrypterConfigurator::default_decrypter();
        let wrong_id = EchOffer::Outer {
            kdf_id: 1,
            aead_id: 1,
            config_id: 5,
        };
        let wrong_suite = EchOffer::Outer {
            kdf_id: 1,
            aead_id: 3,
            config_id: 0,
        };
        assert_eq!(
            decrypter.classify(Some(&wrong_id)),
            EchStatus::UnknownConfig { config_id: 5 }
        );
        assert_eq!(
            decrypter.classify(Some(&wrong_suite)),
            EchStatus::UnknownConfig { config_id: 0 }
        );
    }

    #[test]
    fn missing_offer_is_not_offered() {
        let decrypter = EchDecrypterConfigurator::default_decrypter();
        assert_eq!(decrypter.classify(None), EchStatus::NotOffered);
        assert_eq!(decrypter.classify(Some(&EchOffer::Inner)), EchStatus::InnerMarker);
    }
}
