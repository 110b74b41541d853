//! Fin flag, reserved bits and opcode.

use std::fmt::{Display, Formatter};

/// Fin flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fin {
    /// a byte with its leading bit set
    Y = 0x80,

    /// a byte with its leading bit clear
    N = 0x00,
}

/// Reserved bits, `RSV1 | RSV2 | RSV3`.
///
/// Kept in place (bit 6..4 of the first octet), so it could be or-ed
/// with other flags directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rsv(u8);

/// Frame opcode.
///
/// All 16 values are represented, reserved ones included,
/// so that parsing the low 4 bits never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    /// denotes a continuation frame, 0x00
    Continue = 0x00,
    /// denotes a text frame, 0x01
    Text = 0x01,
    /// denotes a binary frame, 0x02
    Binary = 0x02,

    /// reserved non-control frames, 0x03 - 0x07
    Reserved3 = 0x03,
    Reserved4 = 0x04,
    Reserved5 = 0x05,
    Reserved6 = 0x06,
    Reserved7 = 0x07,

    /// denotes a connection close, 0x08
    Close = 0x08,
    /// denotes a ping, 0x09
    Ping = 0x09,
    /// denotes a pong, 0x0a
    Pong = 0x0a,

    /// reserved control frames, 0x0b - 0x0f
    ReservedB = 0x0b,
    ReservedC = 0x0c,
    ReservedD = 0x0d,
    ReservedE = 0x0e,
    ReservedF = 0x0f,
}

impl Fin {
    /// Parse from byte.
    #[inline]
    pub const fn from_flag(b: u8) -> Self {
        match b & 0x80 {
            0x80 => Fin::Y,
            _ => Fin::N,
        }
    }
}

impl Rsv {
    /// No reserved bit is set.
    pub const NONE: Rsv = Rsv(0);

    /// Parse from byte.
    #[inline]
    pub const fn from_flag(b: u8) -> Self { Rsv(b & 0x70) }

    /// Get the flag bits.
    #[inline]
    pub const fn to_flag(self) -> u8 { self.0 }

    /// Check if any reserved bit is set.
    #[inline]
    pub const fn is_set(self) -> bool { self.0 != 0 }

    #[inline]
    pub const fn rsv1(self) -> bool { self.0 & 0x40 != 0 }

    #[inline]
    pub const fn rsv2(self) -> bool { self.0 & 0x20 != 0 }

    #[inline]
    pub const fn rsv3(self) -> bool { self.0 & 0x10 != 0 }
}

impl OpCode {
    /// Parse from byte, only the low 4 bits are used.
    #[inline]
    pub const fn from_flag(b: u8) -> Self {
        use OpCode::*;
        match b & 0x0f {
            0x00 => Continue,
            0x01 => Text,
            0x02 => Binary,
            0x03 => Reserved3,
            0x04 => Reserved4,
            0x05 => Reserved5,
            0x06 => Reserved6,
            0x07 => Reserved7,
            0x08 => Close,
            0x09 => Ping,
            0x0a => Pong,
            0x0b => ReservedB,
            0x0c => ReservedC,
            0x0d => ReservedD,
            0x0e => ReservedE,
            _ => ReservedF,
        }
    }

    /// Control frames have the highest opcode bit set.
    #[inline]
    pub const fn is_control(self) -> bool { self as u8 & 0x08 != 0 }

    /// Reserved for further non-control or control frames.
    #[inline]
    pub const fn is_reserved(self) -> bool {
        use OpCode::*;
        matches!(
            self,
            Reserved3
                | Reserved4
                | Reserved5
                | Reserved6
                | Reserved7
                | ReservedB
                | ReservedC
                | ReservedD
                | ReservedE
                | ReservedF
        )
    }

    /// Human readable label.
    pub const fn label(self) -> &'static str {
        use OpCode::*;
        match self {
            Continue => "continuation frame",
            Text => "text frame",
            Binary => "binary frame",
            Reserved3 | Reserved4 | Reserved5 | Reserved6 | Reserved7 => "non-control frame",
            Close => "connection close",
            Ping => "ping",
            Pong => "pong",
            ReservedB | ReservedC | ReservedD | ReservedE | ReservedF => "control frame",
        }
    }
}

impl Display for OpCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}: {}", *self as u8, self.label())
    }
}
