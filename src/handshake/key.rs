//! Key exchange.

use super::GUID;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha1::{Digest, Sha1};

/// Generate a new `Sec-WebSocket-Key`, used by clients.
#[inline]
pub fn new_sec_key() -> String {
    let input: [u8; 16] = rand::random();
    STANDARD.encode(input)
}

/// Derive `Sec-WebSocket-Accept` from `Sec-WebSocket-Key`.
///
/// Surrounding whitespace of the key is ignored.
#[inline]
pub fn derive_accept_key(sec_key: &[u8]) -> [u8; 28] {
    let mut sha1 = Sha1::default();
    sha1.update(sec_key.trim_ascii());
    sha1.update(GUID);
    let input = sha1.finalize();
    let mut output = [0_u8; 28];
    // base64 of a 20-byte digest is always 28 bytes
    let _ = STANDARD.encode_slice(input, &mut output);
    output
}
