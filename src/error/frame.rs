use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    // protocol violation
    UnmaskedFrame,

    ReservedBits,

    Fragmented,

    ControlTooLong,

    PayloadTooLarge(u64),

    // need more data
    Truncated,
}

impl FrameError {
    /// Everything except [`FrameError::Truncated`] breaks the protocol,
    /// the connection should be closed.
    #[inline]
    pub const fn is_violation(&self) -> bool { !matches!(self, FrameError::Truncated) }
}

impl Display for FrameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use FrameError::*;
        match self {
            UnmaskedFrame => write!(f, "Protocol violation: unmasked client frame"),
            ReservedBits => write!(f, "Protocol violation: reserved bits are set"),
            Fragmented => write!(f, "Protocol violation: fragmented message is not supported"),
            ControlTooLong => write!(f, "Protocol violation: control frame payload over 125 bytes"),
            PayloadTooLarge(n) => {
                write!(f, "Protocol violation: payload length {} exceeds the limit", n)
            }
            Truncated => write!(f, "Not enough data to parse"),
        }
    }
}

// use default impl
impl std::error::Error for FrameError {}
