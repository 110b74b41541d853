//! Whole-frame decode and encode.
//!
//! A server only accepts a limited profile of the protocol:
//! client frames must be masked, reserved bits must be clear and
//! messages must not be fragmented.

use bytes::BufMut;

use super::{FrameHead, Fin, Mask, OpCode, PayloadLen};
use super::MAX_CONTROL_PAYLOAD;
use crate::error::FrameError;

/// A complete client frame located in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub head: FrameHead,
    /// offset of the first payload byte
    pub payload_offset: usize,
    pub payload_len: usize,
}

impl Decoded {
    /// Total number of bytes occupied by the frame.
    #[inline]
    pub const fn frame_len(&self) -> usize { self.payload_offset + self.payload_len }

    /// Masking key as received.
    #[inline]
    pub const fn masking_key(&self) -> Option<[u8; 4]> { self.head.mask.key() }

    /// Unmask payload data in place.
    ///
    /// `payload` must start at `payload_offset` of the decoded buffer.
    #[inline]
    pub fn unmask(&self, payload: &mut [u8]) { self.head.mask.apply(payload) }
}

/// Decode a frame sent by a client.
///
/// `buf` holds raw bytes read from the socket. Frames declaring more than
/// `max_payload` bytes are rejected before anything is indexed with the
/// declared length. If the frame is not complete yet, a
/// [`FrameError::Truncated`] error is returned and the caller should
/// retry with more data.
pub fn decode_client(buf: &[u8], max_payload: u64) -> Result<Decoded, FrameError> {
    if buf.len() < 2 {
        return Err(FrameError::Truncated);
    }

    // check what is known from the first 2 bytes
    let b1 = buf[0];
    let b2 = buf[1];

    if b1 & 0x70 != 0 {
        return Err(FrameError::ReservedBits);
    }

    if !Mask::from_flag(b2).is_masked() {
        return Err(FrameError::UnmaskedFrame);
    }

    if Fin::from_flag(b1) == Fin::N {
        return Err(FrameError::Fragmented);
    }

    let (head, head_len) = FrameHead::decode(buf)?;
    let length = head.length.to_num();

    if head.opcode.is_control() && length > MAX_CONTROL_PAYLOAD {
        return Err(FrameError::ControlTooLong);
    }

    if length > max_payload {
        return Err(FrameError::PayloadTooLarge(length));
    }

    let payload_len = usize::try_from(length).map_err(|_| FrameError::PayloadTooLarge(length))?;

    if buf.len() - head_len < payload_len {
        return Err(FrameError::Truncated);
    }

    Ok(Decoded {
        head,
        payload_offset: head_len,
        payload_len,
    })
}

/// Encode a complete, final frame, returns the count of written bytes.
///
/// Payload is masked on the fly if a key is provided, a server passes
/// [`Mask::None`].
pub fn encode<B: BufMut>(opcode: OpCode, payload: &[u8], mask: Mask, buf: &mut B) -> usize {
    let head = FrameHead::new(
        Fin::Y,
        opcode,
        mask,
        PayloadLen::from_num(payload.len() as u64),
    );
    let head_len = head.encode(buf);

    match mask {
        Mask::Key(_) => {
            let mut data = payload.to_vec();
            mask.apply(&mut data);
            buf.put_slice(&data);
        }
        _ => buf.put_slice(payload),
    }

    head_len + payload.len()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::frame::mask::new_mask_key;

    const MAX: u64 = 16 * 1024 * 1024;

    fn rand_data(len: usize) -> Vec<u8> { (0..len).map(|_| rand::random::<u8>()).collect() }

    #[test]
    fn length_tiers() {
        for len in [0, 1, 125, 126, 127, 65535, 65536, 1 << 20] {
            let data = rand_data(len);

            // server frame, unmasked
            let mut buf = Vec::new();
            let n = encode(OpCode::Binary, &data, Mask::None, &mut buf);
            assert_eq!(n, buf.len());

            let (head, head_n) = FrameHead::decode(&buf).unwrap();
            assert_eq!(head.length.to_num(), len as u64);
            assert_eq!(head.mask, Mask::None);
            assert_eq!(head.fin, Fin::Y);
            assert_eq!(&buf[head_n..], &data[..]);

            // client frame, masked
            let mut buf = Vec::new();
            encode(OpCode::Binary, &data, Mask::Key(new_mask_key()), &mut buf);

            let decoded = decode_client(&buf, MAX).unwrap();
            assert_eq!(decoded.payload_len, len);
            assert_eq!(decoded.frame_len(), buf.len());

            let payload = &mut buf[decoded.payload_offset..];
            decoded.unmask(payload);
            assert_eq!(payload, &data[..]);
        }
    }

    #[test]
    fn server_head_bytes() {
        let mut buf = Vec::new();
        encode(OpCode::Text, b"Hello", Mask::None, &mut buf);
        assert_eq!(&buf, &[0x81, 0x05, b'H', b'e', b'l', b'l', b'o']);

        let mut buf = Vec::new();
        encode(OpCode::Pong, &[0; 256], Mask::None, &mut buf);
        assert_eq!(&buf[..4], &[0x8a, 126, 0x01, 0x00]);

        let mut buf = Vec::new();
        encode(OpCode::Binary, &[0; 65536], Mask::None, &mut buf);
        assert_eq!(&buf[..10], &[0x82, 127, 0, 0, 0, 0, 0, 1, 0, 0]);
    }

    #[test]
    fn masked_hello() {
        // RFC-6455 Section 5.7
        let buf = [0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58];
        let decoded = decode_client(&buf, MAX).unwrap();

        assert_eq!(decoded.head.opcode, OpCode::Text);
        assert_eq!(decoded.masking_key(), Some([0x37, 0xfa, 0x21, 0x3d]));
        assert_eq!(decoded.payload_offset, 6);

        let mut payload = buf[6..].to_vec();
        decoded.unmask(&mut payload);
        assert_eq!(&payload, b"Hello");
    }

    #[test]
    fn reject_unmasked() {
        // a huge declared length must not matter
        for b2 in [0x00, 0x05, 125, 126, 127] {
            let mut buf = vec![0x81, b2];
            assert_eq!(decode_client(&buf, MAX), Err(FrameError::UnmaskedFrame));

            buf.extend_from_slice(&[0xff; 8]);
            assert_eq!(decode_client(&buf, MAX), Err(FrameError::UnmaskedFrame));
        }
    }

    #[test]
    fn reject_reserved_bits() {
        for b1 in [0xc1, 0xa1, 0x91, 0xf1] {
            let buf = [b1, 0x80, 1, 2, 3, 4];
            assert_eq!(decode_client(&buf, MAX), Err(FrameError::ReservedBits));
        }
    }

    #[test]
    fn reject_fragmented() {
        // text without fin
        let buf = [0x01, 0x80, 1, 2, 3, 4];
        assert_eq!(decode_client(&buf, MAX), Err(FrameError::Fragmented));

        // ping without fin
        let buf = [0x09, 0x80, 1, 2, 3, 4];
        assert_eq!(decode_client(&buf, MAX), Err(FrameError::Fragmented));
    }

    #[test]
    fn reject_long_control() {
        let mut buf = Vec::new();
        encode(OpCode::Ping, &[0; 126], Mask::Key([1, 2, 3, 4]), &mut buf);
        assert_eq!(decode_client(&buf, MAX), Err(FrameError::ControlTooLong));
    }

    #[test]
    fn reject_too_large() {
        let mut buf = vec![0x82, 0x80 | 127];
        buf.extend_from_slice(&u64::MAX.to_be_bytes());
        buf.extend_from_slice(&[1, 2, 3, 4]);
        assert_eq!(
            decode_client(&buf, MAX),
            Err(FrameError::PayloadTooLarge(u64::MAX))
        );

        let mut buf = vec![0x82, 0x80 | 127];
        buf.extend_from_slice(&(MAX + 1).to_be_bytes());
        buf.extend_from_slice(&[1, 2, 3, 4]);
        assert_eq!(
            decode_client(&buf, MAX),
            Err(FrameError::PayloadTooLarge(MAX + 1))
        );
    }

    #[test]
    fn truncated() {
        for len in [0, 5, 125, 126, 4096, 65536] {
            let data = rand_data(len);
            let mut buf = Vec::new();
            encode(OpCode::Binary, &data, Mask::Key(new_mask_key()), &mut buf);

            for i in 0..buf.len() {
                assert_eq!(decode_client(&buf[..i], MAX), Err(FrameError::Truncated));
            }
            assert!(decode_client(&buf, MAX).is_ok());
        }

        // declared as the max accepted size, only the head is present
        let mut buf = vec![0x82, 0x80 | 127];
        buf.extend_from_slice(&MAX.to_be_bytes());
        buf.extend_from_slice(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(decode_client(&buf, MAX), Err(FrameError::Truncated));
    }

    #[test]
    fn trailing_frames() {
        let mut buf = Vec::new();
        let n1 = encode(OpCode::Text, b"first", Mask::Key([9, 8, 7, 6]), &mut buf);
        encode(OpCode::Text, b"second", Mask::Key([5, 4, 3, 2]), &mut buf);

        let first = decode_client(&buf, MAX).unwrap();
        assert_eq!(first.frame_len(), n1);

        let second = decode_client(&buf[n1..], MAX).unwrap();
        let mut payload = buf[n1 + second.payload_offset..].to_vec();
        second.unmask(&mut payload);
        assert_eq!(&payload, b"second");
    }
}
