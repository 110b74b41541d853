//! Client upgrade request.
//!
//! From [RFC-6455 Section 4.1](https://datatracker.ietf.org/doc/html/rfc6455#section-4.1):
//!
//! Once a connection to the server has been established (including a
//! connection via a proxy or over a TLS-encrypted tunnel), the client
//! MUST send an opening handshake to the server.  The handshake consists
//! of an HTTP Upgrade request, along with a list of required and
//! optional header fields.
//!
//! Example:
//!
//! ```text
//! GET /path HTTP/1.1
//! Connection: Upgrade
//! Upgrade: websocket
//! Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==
//! ```
//!

use super::static_headers::*;
use super::{HTTP_METHOD, MAX_ALLOW_HEADERS};

use crate::error::HandshakeError;

/// Http request presentation, borrows from the read buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request<'b> {
    pub path: &'b [u8],
    pub sec_key: &'b [u8],
}

#[inline]
fn has_header(headers: &[httparse::Header<'_>], name: &str, value: &[u8]) -> bool {
    headers.iter().any(|h| h.name == name && h.value == value)
}

impl<'b> Request<'b> {
    /// Parse from a provided buffer, returns the request and
    /// the number of bytes parsed.
    ///
    /// Checks, in order: the method is `GET` over `HTTP/1.1`,
    /// `Connection: Upgrade` and `Upgrade: websocket` are present,
    /// and `Sec-WebSocket-Key` has a non-empty value.
    /// Other headers are ignored.
    ///
    /// If the buffer does not contain a complete http request,
    /// a [`HandshakeError::NotEnoughData`] error will be returned.
    pub fn decode(buf: &'b [u8]) -> Result<(Self, usize), HandshakeError> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_ALLOW_HEADERS];
        let mut request = httparse::Request::new(&mut headers);

        // return value
        let decode_n = match request.parse(buf)? {
            httparse::Status::Complete(n) => n,
            httparse::Status::Partial => return Err(HandshakeError::NotEnoughData),
        };

        // method, path and version are always set once complete
        // ref: https://docs.rs/httparse/latest/httparse/struct.Request.html
        if request.method != Some(HTTP_METHOD) {
            return Err(HandshakeError::HttpMethod);
        }

        // should be HTTP/1.1
        if request.version != Some(1_u8) {
            return Err(HandshakeError::HttpVersion);
        }

        let headers = request.headers;

        if !has_header(headers, HEADER_CONNECTION_NAME, HEADER_CONNECTION_VALUE) {
            return Err(HandshakeError::Connection);
        }

        if !has_header(headers, HEADER_UPGRADE_NAME, HEADER_UPGRADE_VALUE) {
            return Err(HandshakeError::Upgrade);
        }

        let sec_key = headers
            .iter()
            .find(|h| h.name == HEADER_SEC_WEBSOCKET_KEY_NAME)
            .map(|h| h.value.trim_ascii())
            .filter(|v| !v.is_empty())
            .ok_or(HandshakeError::SecWebSocketKey)?;

        Ok((
            Request {
                path: request.path.unwrap_or("/").as_bytes(),
                sec_key,
            },
            decode_n,
        ))
    }
}
