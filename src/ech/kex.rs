//! Key-exchange material for ECH decryption configs.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rustls::pki_types::PrivateKeyDer;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::ech::config::KemId;
use crate::ech::EchError;

/// Private half of an ECH config's public key, bound to its KEM.
pub enum KeyExchange {
    X25519(X25519KeyPair),
    Ec(EcKeyExchange),
}

impl KeyExchange {
    pub fn kem_id(&self) -> KemId {
        match self {
            KeyExchange::X25519(_) => KemId::X25519,
            KeyExchange::Ec(ec) => ec.curve,
        }
    }
}

impl fmt::Debug for KeyExchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyExchange::X25519(pair) => f.debug_tuple("X25519").field(pair).finish(),
            KeyExchange::Ec(ec) => f.debug_tuple("Ec").field(ec).finish(),
        }
    }
}

/// X25519 static key pair.
pub struct X25519KeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl X25519KeyPair {
    /// Pair from raw bytes. A public key that does not match the private key
    /// is kept as given, with a warning.
    pub fn from_bytes(private: [u8; 32], public: [u8; 32]) -> Self {
        let secret = StaticSecret::from(private);
        let derived = PublicKey::from(&secret);
        if derived.as_bytes() != &public {
            tracing::warn!("X25519 public key does not match its private key");
        }
        Self {
            secret,
            public: PublicKey::from(public),
        }
    }

    pub fn from_hex(private: &str, public: &str) -> Result<Self, EchError> {
        Ok(Self::from_bytes(
            decode_key("private", private)?,
            decode_key("public", public)?,
        ))
    }

    /// Key file holding two whitespace-separated hex tokens: private, then public.
    pub fn read_hex_file(path: &Path) -> Result<Self, EchError> {
        let contents = std::fs::read_to_string(path).map_err(|source| EchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut tokens = contents.split_whitespace();
        match (tokens.next(), tokens.next()) {
            (Some(private), Some(public)) => Self::from_hex(private, public),
            _ => Err(EchError::InvalidKey(format!(
                "{} must contain a private and a public key in hex",
                path.display()
            ))),
        }
    }

    /// Inverse of [`X25519KeyPair::read_hex_file`].
    pub fn to_hex_file(&self) -> String {
        format!(
            "{}\n{}\n",
            hex::encode(self.secret.to_bytes()),
            hex::encode(self.public.as_bytes())
        )
    }

    pub fn public_key(&self) -> &[u8; 32] {
        self.public.as_bytes()
    }
}

impl fmt::Debug for X25519KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("X25519KeyPair")
            .field("public", &hex::encode(self.public.as_bytes()))
            .finish_non_exhaustive()
    }
}

fn decode_key(which: &str, value: &str) -> Result<[u8; 32], EchError> {
    let bytes = hex::decode(value)
        .map_err(|e| EchError::InvalidKey(format!("{which} key is not valid hex: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| EchError::InvalidKey(format!("{which} key must be 32 bytes")))
}

/// NIST-curve private key loaded from PEM.
pub struct EcKeyExchange {
    pub curve: KemId,
    key: PrivateKeyDer<'static>,
}

impl EcKeyExchange {
    pub fn from_pem_file(curve: KemId, path: &Path) -> Result<Self, EchError> {
        let file = File::open(path).map_err(|source| EchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let key = rustls_pemfile::private_key(&mut BufReader::new(file))
            .map_err(|e| EchError::InvalidKey(e.to_string()))?
            .ok_or_else(|| {
                EchError::InvalidKey(format!("no private key found in {}", path.display()))
            })?;
        let found = match &key {
            PrivateKeyDer::Sec1(_) | PrivateKeyDer::Pkcs8(_) => named_curve(key.secret_der()),
            _ => None,
        };
        match found {
            Some(found) if found == curve => Ok(Self { curve, key }),
            Some(found) => Err(EchError::InvalidKey(format!(
                "{} holds a {found} key but the config uses {curve}",
                path.display()
            ))),
            None => Err(EchError::InvalidKey(format!(
                "{} does not hold a NIST-curve EC private key",
                path.display()
            ))),
        }
    }

    pub fn private_key(&self) -> &PrivateKeyDer<'static> {
        &self.key
    }
}

/// DER-encoded named-curve OIDs, tag and length included.
const CURVE_OIDS: [(KemId, &[u8]); 3] = [
    (
        KemId::Secp256r1,
        &[0x06, 0x08, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07],
    ),
    (KemId::Secp384r1, &[0x06, 0x05, 0x2b, 0x81, 0x04, 0x00, 0x22]),
    (KemId::Secp521r1, &[0x06, 0x05, 0x2b, 0x81, 0x04, 0x00, 0x23]),
];

/// Curve named in the parameters of a SEC1 or PKCS#8 EC private key.
fn named_curve(der: &[u8]) -> Option<KemId> {
    CURVE_OIDS
        .iter()
        .find(|(_, oid)| der.windows(oid.len()).any(|window| window == *oid))
        .map(|(kem, _)| *kem)
}

impl fmt::Debug for EcKeyExchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcKeyExchange")
            .field("curve", &self.curve)
            .finish_non_exhaustive()
    }
}

/// Build the key exchange for `kem` with the private key stored in `key_file`.
pub fn create_key_exchange(kem: KemId, key_file: &Path) -> Result<KeyExchange, EchError> {
    match kem {
        KemId::X25519 => X25519KeyPair::read_hex_file(key_file).map(KeyExchange::X25519),
        KemId::Secp256r1 | KemId::Secp384r1 | KemId::Secp521r1 => {
            EcKeyExchange::from_pem_file(kem, key_file).map(KeyExchange::Ec)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIVATE: &str = "8c490e5b0c7dbe0c6d2192484d2b7a0423b3b4544f2481095a99dbf238fb350f";
    const PUBLIC: &str = "8a07563949fac6232936ed6f36c4fa735930ecdeaef6734e314aeac35a56fd0a";

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("{name}-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn x25519_file_round_trips() {
        let contents = format!("{PRIVATE}\n{PUBLIC}\n");
        let path = temp_path("ech-x25519");
        std::fs::write(&path, &contents).unwrap();

        let pair = X25519KeyPair::read_hex_file(&path).unwrap();
        assert_eq!(pair.to_hex_file(), contents);
        assert_eq!(hex::encode(pair.public_key()), PUBLIC);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn single_token_file_is_rejected() {
        let path = temp_path("ech-x25519");
        std::fs::write(&path, PRIVATE).unwrap();
        assert!(matches!(
            X25519KeyPair::read_hex_file(&path),
            Err(EchError::InvalidKey(_))
        ));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn short_key_is_rejected() {
        assert!(matches!(
            X25519KeyPair::from_hex("abcd", PUBLIC),
            Err(EchError::InvalidKey(_))
        ));
    }

    #[test]
    fn missing_key_file_is_io_error() {
        let err = create_key_exchange(KemId::Secp256r1, Path::new("/nonexistent/ech.pem")).unwrap_err();
        assert!(matches!(err, EchError::Io { .. }));
    }

    #[test]
    fn ec_key_loads_from_pem() {
        let key_pair = rcgen::KeyPair::generate().unwrap();
        let path = temp_path("ech-p256");
        std::fs::write(&path, key_pair.serialize_pem()).unwrap();

        let kex = create_key_exchange(KemId::Secp256r1, &path).unwrap();
        assert_eq!(kex.kem_id(), KemId::Secp256r1);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn ec_key_on_other_curve_is_rejected() {
        let key_pair = rcgen::KeyPair::generate_for(&rcgen::PKCS_ECDSA_P384_SHA384).unwrap();
        let path = temp_path("ech-p384");
        std::fs::write(&path, key_pair.serialize_pem()).unwrap();

        let err = create_key_exchange(KemId::Secp256r1, &path).unwrap_err();
        assert!(matches!(err, EchError::InvalidKey(_)));
        let kex = create_key_exchange(KemId::Secp384r1, &path).unwrap();
        assert_eq!(kex.kem_id(), KemId::Secp384r1);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn x25519_hex_file_is_not_an_ec_key() {
        let path = temp_path("ech-x25519");
        std::fs::write(&path, format!("{PRIVATE}\n{PUBLIC}\n")).unwrap();
        assert!(matches!(
            create_key_exchange(KemId::Secp256r1, &path),
            Err(EchError::InvalidKey(_))
        ));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn debug_output_hides_private_key() {
        let pair = X25519KeyPair::from_hex(PRIVATE, PUBLIC).unwrap();
        let debug = format!("{:?}", KeyExchange::X25519(pair));
        assert!(debug.contains(PUBLIC));
        assert!(!debug.contains(PRIVATE));
    }
}
