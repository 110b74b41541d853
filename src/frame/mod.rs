//! Websocket data frame.
//!
//! [RFC-6455 Section5](https://datatracker.ietf.org/doc/html/rfc6455#section-5)
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |F|R|R|R| opcode|M| Payload len |    Extended payload length    |
//! |I|S|S|S|  (4)  |A|     (7)     |             (16/64)           |
//! |N|V|V|V|       |S|             |   (if payload len==126/127)   |
//! | |1|2|3|       |K|             |                               |
//! +-+-+-+-+-------+-+-------------+ - - - - - - - - - - - - - - - +
//! |     Extended payload length continued, if payload len == 127  |
//! + - - - - - - - - - - - - - - - +-------------------------------+
//! |                               |Masking-key, if MASK set to 1  |
//! +-------------------------------+-------------------------------+
//! | Masking-key (continued)       |          Payload Data         |
//! +-------------------------------- - - - - - - - - - - - - - - - +
//! :                     Payload Data continued ...                :
//! + - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - +
//! |                     Payload Data continued ...                |
//! +---------------------------------------------------------------+
//! ```
//!

pub mod codec;
pub mod flag;
pub mod length;
pub mod mask;

pub use codec::{decode_client, encode, Decoded};
pub use flag::{Fin, OpCode, Rsv};
pub use length::PayloadLen;
pub use mask::Mask;

use bytes::BufMut;

use crate::error::FrameError;

/// Longest possible frame head: 2 + 8 + 4.
pub const MAX_HEAD_LEN: usize = 14;

/// Control frames carry at most 125 bytes.
pub const MAX_CONTROL_PAYLOAD: u64 = 125;

/// Websocket frame head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHead {
    pub fin: Fin,
    pub rsv: Rsv,
    pub opcode: OpCode,
    pub mask: Mask,
    pub length: PayloadLen,
}

impl FrameHead {
    /// Constructor, reserved bits are left clear.
    #[inline]
    pub const fn new(fin: Fin, opcode: OpCode, mask: Mask, length: PayloadLen) -> Self {
        Self {
            fin,
            rsv: Rsv::NONE,
            opcode,
            mask,
            length,
        }
    }

    /// Number of bytes this head takes on the wire.
    #[inline]
    pub const fn encoded_len(&self) -> usize {
        let key_len = if self.mask.is_masked() { 4 } else { 0 };
        2 + self.length.extended_len() + key_len
    }

    /// Encode to provided buffer, returns the count of written bytes.
    ///
    /// The buffer grows if needed, so this never fails.
    pub fn encode<B: BufMut>(&self, buf: &mut B) -> usize {
        // fin, rsv, opcode
        let b1 = self.fin as u8 | self.rsv.to_flag() | self.opcode as u8;

        // mask, payload length
        let b2 = self.mask.to_flag() | self.length.to_flag();

        buf.put_slice(&[b1, b2]);

        // extended payload length
        match &self.length {
            PayloadLen::Standard(_) => {}
            PayloadLen::Extended1(v) => buf.put_u16(*v),
            PayloadLen::Extended2(v) => buf.put_u64(*v),
        };

        // mask key
        if let Some(key) = self.mask.key() {
            buf.put_slice(&key);
        }

        self.encoded_len()
    }

    /// Parse from provided buffer, returns [`FrameHead`] and the count of read bytes
    /// if the parse succeeds.
    ///
    /// No field is validated here, see [`decode_client`] for that.
    /// If there is not enough data to parse, a [`FrameError::Truncated`] error
    /// will be returned.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize), FrameError> {
        if buf.len() < 2 {
            return Err(FrameError::Truncated);
        }

        // fin, rsv, opcode
        let b1 = buf[0];

        // mask, payload length
        let b2 = buf[1];

        let fin = Fin::from_flag(b1);
        let rsv = Rsv::from_flag(b1);
        let opcode = OpCode::from_flag(b1);

        let mut mask = Mask::from_flag(b2);
        let mut length = PayloadLen::from_flag(b2);

        let mut n: usize = 2;

        match length {
            PayloadLen::Standard(_) => {}
            PayloadLen::Extended1(_) => {
                let bytes = buf.get(2..4).ok_or(FrameError::Truncated)?;
                length = PayloadLen::from_byte2([bytes[0], bytes[1]]);
                n += 2;
            }
            PayloadLen::Extended2(_) => {
                let bytes: [u8; 8] = buf
                    .get(2..10)
                    .and_then(|b| b.try_into().ok())
                    .ok_or(FrameError::Truncated)?;
                length = PayloadLen::from_byte8(bytes);
                n += 8;
            }
        };

        if mask.is_masked() {
            let key: [u8; 4] = buf
                .get(n..n + 4)
                .and_then(|b| b.try_into().ok())
                .ok_or(FrameError::Truncated)?;
            mask = Mask::from_key(key);
            n += 4;
        }

        Ok((
            FrameHead {
                fin,
                rsv,
                opcode,
                mask,
                length,
            },
            n,
        ))
    }
}
