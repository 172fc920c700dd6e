//! ClientHello capture.
//!
//! Both engines need to see the client's first flight before committing to a
//! protocol: the bytes are kept verbatim so they can be replayed into either
//! engine, and the parsed fields drive fallback detection plus the parts of
//! the summary rustls does not report (client random, PSK and early-data
//! offers, ECH offer).

use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

const CONTENT_TYPE_HANDSHAKE: u8 = 22;
const HANDSHAKE_CLIENT_HELLO: u8 = 1;
const MAX_RECORD_LEN: usize = 16384;
const MAX_CLIENT_HELLO_LEN: usize = 65536;

pub const TLS13: u16 = 0x0304;

const EXT_SERVER_NAME: u16 = 0x0000;
const EXT_ALPN: u16 = 0x0010;
const EXT_COMPRESS_CERTIFICATE: u16 = 0x001b;
const EXT_PRE_SHARED_KEY: u16 = 0x0029;
const EXT_EARLY_DATA: u16 = 0x002a;
const EXT_SUPPORTED_VERSIONS: u16 = 0x002b;
const EXT_PSK_KEY_EXCHANGE_MODES: u16 = 0x002d;
pub const EXT_ENCRYPTED_CLIENT_HELLO: u16 = 0xfe0d;

#[derive(Debug, Error)]
pub enum ClientHelloError {
    #[error("I/O error while reading client hello: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed before a complete client hello")]
    UnexpectedEof,

    #[error("expected a handshake record, got content type {0}")]
    NotHandshake(u8),

    #[error("record length {0} exceeds the maximum")]
    RecordTooLarge(usize),

    #[error("expected a client hello, got handshake type {0}")]
    NotClientHello(u8),

    #[error("client hello of {0} bytes exceeds the maximum")]
    TooLarge(usize),

    #[error("malformed client hello: {0}")]
    Malformed(&'static str),
}

/// The client's ECH extension, as offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EchOffer {
    /// Outer hello carrying an encrypted inner hello.
    Outer {
        kdf_id: u16,
        aead_id: u16,
        config_id: u8,
    },
    /// Marker sent inside an already-decrypted inner hello.
    Inner,
}

/// Fields of a ClientHello the server reports on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientHello {
    pub legacy_version: u16,
    pub random: [u8; 32],
    pub cipher_suites: Vec<u16>,
    pub server_name: Option<String>,
    pub alpn: Vec<Vec<u8>>,
    pub supported_versions: Vec<u16>,
    pub psk_offered: bool,
    pub psk_modes: Vec<u8>,
    pub early_data_offered: bool,
    pub compress_certificate: Vec<u16>,
    pub ech: Option<EchOffer>,
}

impl ClientHello {
    /// Whether the client is willing to negotiate TLS 1.3.
    pub fn offers_tls13(&self) -> bool {
        self.supported_versions.contains(&TLS13)
    }
}

/// Read handshake records until one full ClientHello message has arrived.
///
/// Returns the raw records exactly as received alongside the parsed hello.
/// Nothing past the final record is read.
pub async fn read_client_hello<S>(io: &mut S) -> Result<(Bytes, ClientHello), ClientHelloError>
where
    S: AsyncRead + Unpin,
{
    let mut raw = BytesMut::new();
    let mut message = BytesMut::new();

    loop {
        let mut header = [0u8; 5];
        read_exact(io, &mut header).await?;
        if header[0] != CONTENT_TYPE_HANDSHAKE {
            return Err(ClientHelloError::NotHandshake(header[0]));
        }
        let len = u16::from_be_bytes([header[3], header[4]]) as usize;
        if len > MAX_RECORD_LEN {
            return Err(ClientHelloError::RecordTooLarge(len));
        }
        let mut fragment = vec![0u8; len];
        read_exact(io, &mut fragment).await?;
        raw.extend_from_slice(&header);
        raw.extend_from_slice(&fragment);
        message.extend_from_slice(&fragment);

        if message.len() >= 4 {
            if message[0] != HANDSHAKE_CLIENT_HELLO {
                return Err(ClientHelloError::NotClientHello(message[0]));
            }
            let body_len =
                u32::from_be_bytes([0, message[1], message[2], message[3]]) as usize;
            if body_len > MAX_CLIENT_HELLO_LEN {
                return Err(ClientHelloError::TooLarge(body_len));
            }
            if message.len() >= 4 + body_len {
                let hello = parse_client_hello(&message[4..4 + body_len])?;
                tracing::trace!(
                    bytes = raw.len(),
                    offers_tls13 = hello.offers_tls13(),
                    "Client hello received"
                );
                return Ok((raw.freeze(), hello));
            }
        }
    }
}

async fn read_exact<S>(io: &mut S, buf: &mut [u8]) -> Result<(), ClientHelloError>
where
    S: AsyncRead + Unpin,
{
    match io.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(ClientHelloError::UnexpectedEof)
        }
        Err(e) => Err(e.into()),
    }
}

/// Parse a ClientHello handshake body (without the 4-byte message header).
pub fn parse_client_hello(body: &[u8]) -> Result<ClientHello, ClientHelloError> {
    let mut r = Reader::new(body);
    let mut hello = ClientHello {
        legacy_version: r.u16()?,
        ..ClientHello::default()
    };
    hello.random.copy_from_slice(r.take(32)?);
    r.vec8()?; // legacy_session_id

    let mut suites = Reader::new(r.vec16()?);
    while !suites.is_empty() {
        hello.cipher_suites.push(suites.u16()?);
    }
    r.vec8()?; // legacy_compression_methods

    // Pre-1.2 clients may omit extensions entirely.
    if r.is_empty() {
        return Ok(hello);
    }

    let mut extensions = Reader::new(r.vec16()?);
    while !extensions.is_empty() {
        let ext_type = extensions.u16()?;
        let data = extensions.vec16()?;
        parse_extension(&mut hello, ext_type, data)?;
    }
    Ok(hello)
}

fn parse_extension(hello: &mut ClientHello, ext_type: u16, data: &[u8]) -> Result<(), ClientHelloError> {
    let mut r = Reader::new(data);
    match ext_type {
        EXT_SERVER_NAME => {
            let mut names = Reader::new(r.vec16()?);
            while !names.is_empty() {
                let name_type = names.u8()?;
                let name = names.vec16()?;
                if name_type == 0 && hello.server_name.is_none() {
                    hello.server_name = Some(String::from_utf8_lossy(name).into_owned());
                }
            }
        }
        EXT_ALPN => {
            let mut protocols = Reader::new(r.vec16()?);
            while !protocols.is_empty() {
                hello.alpn.push(protocols.vec8()?.to_vec());
            }
        }
        EXT_SUPPORTED_VERSIONS => {
            let mut versions = Reader::new(r.vec8()?);
            while !versions.is_empty() {
                hello.supported_versions.push(versions.u16()?);
            }
        }
        EXT_PRE_SHARED_KEY => hello.psk_offered = true,
        EXT_PSK_KEY_EXCHANGE_MODES => hello.psk_modes = r.vec8()?.to_vec(),
        EXT_EARLY_DATA => hello.early_data_offered = true,
        EXT_COMPRESS_CERTIFICATE => {
            let mut algorithms = Reader::new(r.vec8()?);
            while !algorithms.is_empty() {
                hello.compress_certificate.push(algorithms.u16()?);
            }
        }
        EXT_ENCRYPTED_CLIENT_HELLO => {
            hello.ech = Some(match r.u8()? {
                0 => EchOffer::Outer {
                    kdf_id: r.u16()?,
                    aead_id: r.u16()?,
                    config_id: r.u8()?,
                },
                1 => EchOffer::Inner,
                _ => return Err(ClientHelloError::Malformed("unknown ECH client hello type")),
            });
        }
        _ => {}
    }
    Ok(())
}

struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ClientHelloError> {
        if self.buf.len() < n {
            return Err(ClientHelloError::Malformed("truncated field"));
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn u8(&mut self) -> Result<u8, ClientHelloError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, ClientHelloError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn vec8(&mut self) -> Result<&'a [u8], ClientHelloError> {
        let len = self.u8()? as usize;
        self.take(len)
    }

    fn vec16(&mut self) -> Result<&'a [u8], ClientHelloError> {
        let len = self.u16()? as usize;
        self.take(len)
    }
}

/// Builds ClientHello records for tests.
#[cfg(test)]
pub(crate) mod testing {
    pub struct HelloBuilder {
        pub random: [u8; 32],
        pub extensions: Vec<(u16, Vec<u8>)>,
    }

    impl HelloBuilder {
        pub fn new() -> Self {
            Self {
                random: [0x42; 32],
                extensions: Vec::new(),
            }
        }

        pub fn extension(mut self, ext_type: u16, data: Vec<u8>) -> Self {
            self.extensions.push((ext_type, data));
            self
        }

        pub fn supported_versions(self, versions: &[u16]) -> Self {
            let mut data = vec![(versions.len() * 2) as u8];
            for v in versions {
                data.extend_from_slice(&v.to_be_bytes());
            }
            self.extension(super::EXT_SUPPORTED_VERSIONS, data)
        }

        pub fn body(&self) -> Vec<u8> {
            let mut body = vec![0x03, 0x03];
            body.extend_from_slice(&self.random);
            body.push(0); // session id
            body.extend_from_slice(&[0x00, 0x02, 0x13, 0x01]);
            body.extend_from_slice(&[0x01, 0x00]);
            let mut exts = Vec::new();
            for (ext_type, data) in &self.extensions {
                exts.extend_from_slice(&ext_type.to_be_bytes());
                exts.extend_from_slice(&(data.len() as u16).to_be_bytes());
                exts.extend_from_slice(data);
            }
            body.extend_from_slice(&(exts.len() as u16).to_be_bytes());
            body.extend_from_slice(&exts);
            body
        }

        /// Handshake message split across records of at most `fragment` bytes.
        pub fn records(&self, fragment: usize) -> Vec<u8> {
            let body = self.body();
            let mut message = vec![1];
            message.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
            message.extend_from_slice(&body);

            let mut out = Vec::new();
            for chunk in message.chunks(fragment) {
                out.extend_from_slice(&[22, 0x03, 0x01]);
                out.extend_from_slice(&(chunk.len() as u16).to_be_bytes());
                out.extend_from_slice(chunk);
            }
            out
        }
    }
}
