//!  Mask flag and key.

/// Payload mask with a 32-bit key.
///
/// `Mask::Skip` is used by server side to skip unmask
/// if mask key equals 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mask {
    Key([u8; 4]),
    Skip,
    None,
}

impl Mask {
    /// Read the flag which indicates whether mask is used.
    #[inline]
    pub const fn from_flag(b: u8) -> Self {
        match b & 0x80 {
            0x80 => Mask::Skip,
            _ => Mask::None,
        }
    }

    /// Build from a received key.
    #[inline]
    pub const fn from_key(key: [u8; 4]) -> Self {
        if u32::from_ne_bytes(key) == 0 {
            Mask::Skip
        } else {
            Mask::Key(key)
        }
    }

    /// Get the flag byte.
    #[inline]
    pub const fn to_flag(&self) -> u8 {
        use Mask::*;
        match self {
            Key(_) | Skip => 0x80,
            None => 0x00,
        }
    }

    /// Whether a 4-byte key follows the length field.
    #[inline]
    pub const fn is_masked(&self) -> bool { !matches!(self, Mask::None) }

    /// The key as it appears on the wire.
    #[inline]
    pub const fn key(&self) -> Option<[u8; 4]> {
        match self {
            Mask::Key(k) => Some(*k),
            Mask::Skip => Some([0; 4]),
            Mask::None => None,
        }
    }

    /// Mask or unmask the buffer in place. This is a no-op
    /// if there is no key or the key is zero.
    #[inline]
    pub fn apply(&self, buf: &mut [u8]) {
        if let Mask::Key(key) = self {
            apply_mask4(*key, buf);
        }
    }
}

/// Generate a new random key.
#[inline]
pub fn new_mask_key() -> [u8; 4] { rand::random::<[u8; 4]>() }

/// Mask the buffer, byte by byte.
#[inline]
pub fn apply_mask(key: [u8; 4], buf: &mut [u8]) {
    for (i, b) in buf.iter_mut().enumerate() {
        *b ^= key[i & 0x03];
    }
}

/// Mask the buffer, 4 bytes at a time.
#[inline]
pub fn apply_mask4(key: [u8; 4], buf: &mut [u8]) {
    let key4 = u32::from_ne_bytes(key);

    // u8 -> u32 has no invalid bit patterns
    let (prefix, middle, suffix) = unsafe { buf.align_to_mut::<u32>() };

    apply_mask(key, prefix);

    let head = prefix.len() & 3;
    let key4 = if head > 0 {
        if cfg!(target_endian = "big") {
            key4.rotate_left(8 * head as u32)
        } else {
            key4.rotate_right(8 * head as u32)
        }
    } else {
        key4
    };
    for b4 in middle.iter_mut() {
        *b4 ^= key4;
    }

    apply_mask(key4.to_ne_bytes(), suffix);
}
