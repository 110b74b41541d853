//! Server response.
//!
//! From [RFC-6455 Section 4.2](https://datatracker.ietf.org/doc/html/rfc6455#section-4.2):
//!
//! If the server chooses to accept the incoming connection, it MUST
//! reply with a valid HTTP response.
//!
//! Example:
//!
//! ```text
//! HTTP/1.1 101 Switching Protocols
//! Connection: Upgrade
//! Upgrade: websocket
//! Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=
//! ```
//!

use bytes::BufMut;

use super::static_headers::*;
use super::{HTTP_HEADER_SP, HTTP_LINE_BREAK, HTTP_STATUS_LINE};

/// Http response presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response<'b> {
    pub sec_accept: &'b [u8],
}

#[inline]
fn write_header<B: BufMut>(buf: &mut B, name: &str, value: &[u8]) {
    buf.put_slice(name.as_bytes());
    buf.put_slice(HTTP_HEADER_SP);
    buf.put_slice(value);
    buf.put_slice(HTTP_LINE_BREAK);
}

impl<'b> Response<'b> {
    #[inline]
    pub const fn new(sec_accept: &'b [u8]) -> Self { Self { sec_accept } }

    /// Encode to a provided buffer, return the number of written bytes.
    pub fn encode<B: BufMut>(&self, buf: &mut B) -> usize {
        let before = buf.remaining_mut();

        // HTTP/1.1 101 Switching Protocols
        buf.put_slice(HTTP_STATUS_LINE);
        buf.put_slice(HTTP_LINE_BREAK);

        // Connection: Upgrade
        write_header(buf, HEADER_CONNECTION_NAME, HEADER_CONNECTION_VALUE);

        // Upgrade: websocket
        write_header(buf, HEADER_UPGRADE_NAME, HEADER_UPGRADE_VALUE);

        // Sec-WebSocket-Accept: {sec_accept}
        write_header(buf, HEADER_SEC_WEBSOCKET_ACCEPT_NAME, self.sec_accept);

        // finish with CRLF
        buf.put_slice(HTTP_LINE_BREAK);

        before - buf.remaining_mut()
    }
}
