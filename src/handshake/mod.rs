//! Websocket handshake.
//!
//! Only the server side of the opening handshake is supported, and only
//! the three headers needed for an upgrade are looked at. Header names and
//! values are matched as-is (case sensitive).

pub mod key;
pub mod request;
pub mod response;

pub use request::Request;
pub use response::Response;
pub use key::{new_sec_key, derive_accept_key};

use crate::error::HandshakeError;

/// 32
pub const MAX_ALLOW_HEADERS: usize = 32;

/// A request larger than this is rejected.
pub const MAX_REQUEST_SIZE: usize = 4096;

/// 258EAFA5-E914-47DA-95CA-C5AB0DC85B11
pub const GUID: &[u8] = b"258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// GET
pub const HTTP_METHOD: &str = "GET";

/// CRLF
pub const HTTP_LINE_BREAK: &[u8] = b"\r\n";

/// A colon + one SP is prefered
pub const HTTP_HEADER_SP: &[u8] = b": ";

/// HTTP/1.1 101 Switching Protocols
pub const HTTP_STATUS_LINE: &[u8] = b"HTTP/1.1 101 Switching Protocols";

/// Sent when the upgrade request is rejected.
pub const HTTP_BAD_REQUEST: &[u8] = b"HTTP/1.1 400 Bad Request\r\n\r\n";

/// Sent when there is no free slot.
pub const HTTP_SERVICE_UNAVAILABLE: &[u8] = b"HTTP/1.1 503 Service Unavailable\r\n\r\n";

/// Static http headers
pub mod static_headers {
    /// Connection: Upgrade
    pub const HEADER_CONNECTION_NAME: &str = "Connection";
    pub const HEADER_CONNECTION_VALUE: &[u8] = b"Upgrade";

    /// Upgrade: websocket
    pub const HEADER_UPGRADE_NAME: &str = "Upgrade";
    pub const HEADER_UPGRADE_VALUE: &[u8] = b"websocket";

    /// Sec-WebSocket-Key: {key}
    pub const HEADER_SEC_WEBSOCKET_KEY_NAME: &str = "Sec-WebSocket-Key";

    /// Sec-WebSocket-Accept: {accept}
    pub const HEADER_SEC_WEBSOCKET_ACCEPT_NAME: &str = "Sec-WebSocket-Accept";
}

/// Result of a successful negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiated {
    /// Number of bytes taken by the request,
    /// anything after that already belongs to the websocket stream.
    pub consumed: usize,
    pub sec_accept: [u8; 28],
}

impl Negotiated {
    #[inline]
    pub fn response(&self) -> Response<'_> { Response::new(&self.sec_accept) }
}

/// Validate an upgrade request and derive the accept key.
///
/// A [`HandshakeError::NotEnoughData`] error means the request is not
/// complete yet, any other error rejects the client.
pub fn negotiate(buf: &[u8]) -> Result<Negotiated, HandshakeError> {
    let (request, consumed) = match Request::decode(buf) {
        Err(HandshakeError::NotEnoughData) if buf.len() >= MAX_REQUEST_SIZE => {
            return Err(HandshakeError::TooLarge)
        }
        x => x?,
    };

    if consumed > MAX_REQUEST_SIZE {
        return Err(HandshakeError::TooLarge);
    }

    Ok(Negotiated {
        consumed,
        sec_accept: derive_accept_key(request.sec_key),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::prelude::*;

    pub const TEMPLATE_HEADERS: &str = "\
        Host: www.example.com\r\n\
        Upgrade: websocket\r\n\
        Connection: Upgrade\r\n\
        Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
        Sec-WebSocket-Version: 13";

    pub fn make_headers(count: usize, max_len: usize, headers: &str) -> String {
        fn rand_ascii() -> char {
            let x: u8 = thread_rng().gen_range(1..=4);
            let ch: u8 = match x {
                1 => thread_rng().gen_range(b'0'..=b'9'),
                2 => thread_rng().gen_range(b'A'..=b'Z'),
                3 => thread_rng().gen_range(b'a'..=b'z'),
                4 => b'-',
                _ => unreachable!(),
            };
            ch as char
        }

        fn rand_str(len: usize) -> String {
            let mut s = String::new();
            for _ in 0..len {
                s.push(rand_ascii());
            }
            s
        }

        fn make_header(max_len: usize) -> String {
            let mut s = String::with_capacity(256);
            let name_len: usize = thread_rng().gen_range(1..=max_len);
            let value_len: usize = thread_rng().gen_range(1..=max_len);
            s.push_str(&format!(
                "{}: {}\r\n",
                rand_str(name_len),
                rand_str(value_len)
            ));
            s
        }

        let mut s = Vec::<String>::with_capacity(256);
        for hdr in headers.split("\r\n") {
            s.push(format!("{}\r\n", hdr));
        }
        for _ in 0..count {
            s.push(make_header(max_len));
        }
        s.shuffle(&mut thread_rng());
        s.concat()
    }

    #[test]
    fn negotiate_rfc_key() {
        let request = format!("GET /chat HTTP/1.1\r\n{}\r\n\r\n", TEMPLATE_HEADERS);
        let negotiated = negotiate(request.as_bytes()).unwrap();

        assert_eq!(negotiated.consumed, request.len());
        assert_eq!(&negotiated.sec_accept, b"s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");

        let mut buf = Vec::new();
        negotiated.response().encode(&mut buf);
        assert_eq!(
            std::str::from_utf8(&buf).unwrap(),
            "HTTP/1.1 101 Switching Protocols\r\n\
            Connection: Upgrade\r\n\
            Upgrade: websocket\r\n\
            Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n\r\n"
        );
    }

    #[test]
    fn negotiate_partial() {
        let request = format!("GET /chat HTTP/1.1\r\n{}\r\n\r\n", TEMPLATE_HEADERS);
        for i in 0..request.len() {
            assert_eq!(
                negotiate(&request.as_bytes()[..i]),
                Err(HandshakeError::NotEnoughData)
            );
        }
    }

    #[test]
    fn negotiate_too_large() {
        let request = format!(
            "GET /chat HTTP/1.1\r\nX-Padding: {}\r\n",
            "a".repeat(MAX_REQUEST_SIZE)
        );
        assert_eq!(
            negotiate(request.as_bytes()),
            Err(HandshakeError::TooLarge)
        );
    }
}
