//! Single-request HTTP responder.
//!
//! Buffers inbound bytes until at least five have arrived, then answers a
//! `GET /` with one `HTTP/1.0` response describing the handshake. Anything
//! else is logged and ignored; the connection stays open.

use bytes::BytesMut;

pub const BANNER: &str = "TLS 1.3 Demo Server";
pub const FALLBACK_BANNER: &str = "TLS 1.3 Demo Server (Fallback)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpRequest {
    /// Fewer than five bytes so far.
    Incomplete,
    Get,
    Unsupported,
}

#[derive(Debug, Default)]
pub struct HttpResponder {
    request: BytesMut,
}

impl HttpResponder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `data` and classify everything buffered so far.
    ///
    /// Nothing is ever discarded: after a non-GET request the buffer keeps
    /// growing until the peer closes, and every later call reports
    /// `Unsupported` again.
    pub fn push(&mut self, data: &[u8]) -> HttpRequest {
        self.request.extend_from_slice(data);
        if self.request.len() < 5 {
            HttpRequest::Incomplete
        } else if self.request.starts_with(b"GET /") {
            HttpRequest::Get
        } else {
            HttpRequest::Unsupported
        }
    }

    pub fn buffered(&self) -> &[u8] {
        &self.request
    }
}

/// Banner, a blank line, then the summary lines joined with `\n`.
pub fn response_body(banner: &str, lines: &[String]) -> String {
    format!("{banner}\n\n{}", lines.join("\n"))
}

pub fn build_response(body: &str) -> Vec<u8> {
    format!(
        "HTTP/1.0 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    )
    .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_get_is_recognized_once_five_bytes_arrive() {
        let mut responder = HttpResponder::new();
        assert_eq!(responder.push(b"GE"), HttpRequest::Incomplete);
        assert_eq!(responder.push(b"T "), HttpRequest::Incomplete);
        assert_eq!(responder.push(b"/ HTTP/1.1\r\n\r\n"), HttpRequest::Get);
        assert_eq!(responder.buffered(), b"GET / HTTP/1.1\r\n\r\n");
    }

    #[test]
    fn post_is_unsupported() {
        let mut responder = HttpResponder::new();
        assert_eq!(responder.push(b"POST / HTTP/1.1\r\n"), HttpRequest::Unsupported);
        assert_eq!(responder.push(b"\r\n"), HttpRequest::Unsupported);
        assert_eq!(responder.buffered(), b"POST / HTTP/1.1\r\n\r\n");
    }

    #[test]
    fn get_without_root_path_is_unsupported() {
        let mut responder = HttpResponder::new();
        assert_eq!(responder.push(b"GET index"), HttpRequest::Unsupported);
    }

    #[test]
    fn response_has_matching_content_length() {
        let body = response_body(BANNER, &["  TLS Version: TLSv1.3".to_string()]);
        assert_eq!(body, "TLS 1.3 Demo Server\n\n  TLS Version: TLSv1.3");

        let response = String::from_utf8(build_response(&body)).unwrap();
        let (head, payload) = response.split_once("\r\n\r\n").unwrap();
        assert!(head.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(head.contains("Content-Type: text/plain"));
        assert!(head.contains(&format!("Content-Length: {}", body.len())));
        assert_eq!(payload, body);
    }
}
