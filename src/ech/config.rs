//! ECH configuration records and their JSON form.
//!
//! ```json
//! {"echconfigs": [{
//!     "version": "Draft15",
//!     "config_id": 0,
//!     "kem_id": "x25519",
//!     "public_key": "<hex>",
//!     "cipher_suites": [{"kdf_id": "Sha256", "aead_id": "TLS_AES_128_GCM_SHA256"}],
//!     "maximum_name_length": 100,
//!     "public_name": "public.example.com",
//!     "extensions": ""
//! }]}
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::ech::EchError;

/// Wire version of the ECH extension these configs describe.
pub const ECH_VERSION: u16 = 0xfe0d;

/// HPKE KEM identifiers the server can hold private keys for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KemId {
    Secp256r1 = 0x0010,
    Secp384r1 = 0x0011,
    Secp521r1 = 0x0012,
    X25519 = 0x0020,
}

impl KemId {
    pub fn as_str(self) -> &'static str {
        match self {
            KemId::Secp256r1 => "secp256r1",
            KemId::Secp384r1 => "secp384r1",
            KemId::Secp521r1 => "secp521r1",
            KemId::X25519 => "x25519",
        }
    }
}

impl FromStr for KemId {
    type Err = EchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "secp256r1" => Ok(KemId::Secp256r1),
            "secp384r1" => Ok(KemId::Secp384r1),
            "secp521r1" => Ok(KemId::Secp521r1),
            "x25519" => Ok(KemId::X25519),
            _ => Err(EchError::UnsupportedKem(s.to_string())),
        }
    }
}

impl fmt::Display for KemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HpkeKdf {
    Sha256 = 0x0001,
    Sha384 = 0x0002,
    Sha512 = 0x0003,
}

impl HpkeKdf {
    pub fn from_u16(id: u16) -> Option<Self> {
        match id {
            0x0001 => Some(HpkeKdf::Sha256),
            0x0002 => Some(HpkeKdf::Sha384),
            0x0003 => Some(HpkeKdf::Sha512),
            _ => None,
        }
    }
}

impl FromStr for HpkeKdf {
    type Err = EchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "hkdf_sha256" => Ok(HpkeKdf::Sha256),
            "sha384" | "hkdf_sha384" => Ok(HpkeKdf::Sha384),
            "sha512" | "hkdf_sha512" => Ok(HpkeKdf::Sha512),
            _ => Err(EchError::InvalidConfig(format!("unknown KDF {s:?}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HpkeAead {
    Aes128Gcm = 0x0001,
    Aes256Gcm = 0x0002,
    ChaCha20Poly1305 = 0x0003,
}

impl HpkeAead {
    pub fn from_u16(id: u16) -> Option<Self> {
        match id {
            0x0001 => Some(HpkeAead::Aes128Gcm),
            0x0002 => Some(HpkeAead::Aes256Gcm),
            0x0003 => Some(HpkeAead::ChaCha20Poly1305),
            _ => None,
        }
    }
}

impl FromStr for HpkeAead {
    type Err = EchError;

    // TLS cipher suite names are accepted for the AEAD they carry.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TLS_AES_128_GCM_SHA256" | "AES_128_GCM" | "AES128GCM" => Ok(HpkeAead::Aes128Gcm),
            "TLS_AES_256_GCM_SHA384" | "AES_256_GCM" | "AES256GCM" => Ok(HpkeAead::Aes256Gcm),
            "TLS_CHACHA20_POLY1305_SHA256" | "CHACHA20_POLY1305" | "CHACHA20POLY1305" => {
                Ok(HpkeAead::ChaCha20Poly1305)
            }
            _ => Err(EchError::InvalidConfig(format!("unknown AEAD {s:?}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HpkeSymmetricSuite {
    pub kdf: HpkeKdf,
    pub aead: HpkeAead,
}

impl HpkeSymmetricSuite {
    /// Suite for raw wire identifiers, if both are known.
    pub fn from_ids(kdf_id: u16, aead_id: u16) -> Option<Self> {
        Some(Self {
            kdf: HpkeKdf::from_u16(kdf_id)?,
            aead: HpkeAead::from_u16(aead_id)?,
        })
    }
}

/// One parsed ECH configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchConfig {
    pub version: u16,
    pub config_id: u8,
    pub kem_id: KemId,
    pub public_key: Vec<u8>,
    pub cipher_suites: Vec<HpkeSymmetricSuite>,
    pub maximum_name_length: u8,
    pub public_name: String,
    pub extensions: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct EchConfigsJson {
    echconfigs: Vec<EchConfigJson>,
}

#[derive(Debug, Deserialize)]
struct EchConfigJson {
    version: String,
    config_id: u8,
    kem_id: String,
    public_key: String,
    cipher_suites: Vec<CipherSuiteJson>,
    maximum_name_length: u8,
    public_name: String,
    #[serde(default)]
    extensions: String,
}

#[derive(Debug, Deserialize)]
struct CipherSuiteJson {
    kdf_id: String,
    aead_id: String,
}

fn parse_version(s: &str) -> Result<u16, EchError> {
    match s.to_ascii_lowercase().as_str() {
        "draft13" | "draft15" | "draft18" | "v18" | "0xfe0d" => Ok(ECH_VERSION),
        _ => Err(EchError::InvalidConfig(format!("unsupported version {s:?}"))),
    }
}

fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>, EchError> {
    hex::decode(value.trim())
        .map_err(|e| EchError::InvalidConfig(format!("{field} is not valid hex: {e}")))
}

impl TryFrom<EchConfigJson> for EchConfig {
    type Error = EchError;

    fn try_from(raw: EchConfigJson) -> Result<Self, Self::Error> {
        let cipher_suites = raw
            .cipher_suites
            .iter()
            .map(|suite| {
                Ok(HpkeSymmetricSuite {
                    kdf: suite.kdf_id.parse()?,
                    aead: suite.aead_id.parse()?,
                })
            })
            .collect::<Result<Vec<_>, EchError>>()?;
        if cipher_suites.is_empty() {
            return Err(EchError::InvalidConfig("no cipher suites".into()));
        }

        Ok(EchConfig {
            version: parse_version(&raw.version)?,
            config_id: raw.config_id,
            kem_id: raw.kem_id.parse()?,
            public_key: decode_hex("public_key", &raw.public_key)?,
            cipher_suites,
            maximum_name_length: raw.maximum_name_length,
            public_name: raw.public_name,
            extensions: decode_hex("extensions", &raw.extensions)?,
        })
    }
}

/// Parse every config in a `{"echconfigs": [...]}` document.
pub fn parse_ech_configs(json: &str) -> Result<Vec<EchConfig>, EchError> {
    let raw: EchConfigsJson = serde_json::from_str(json)?;
    if raw.echconfigs.is_empty() {
        return Err(EchError::NoConfigs);
    }
    raw.echconfigs.into_iter().map(EchConfig::try_from).collect()
}

pub fn load_ech_configs(path: &Path) -> Result<Vec<EchConfig>, EchError> {
    let json = std::fs::read_to_string(path).map_err(|source| EchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_ech_configs(&json)
}
