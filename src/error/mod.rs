#![allow(missing_docs)]
//! Errors

mod frame;
mod handshake;

pub use frame::FrameError;
pub use handshake::HandshakeError;

use std::fmt::{Display, Formatter};

use crate::frame::OpCode;

#[derive(Debug)]
pub enum Error {
    /// The listener could not start, this is the only fatal error.
    Bind(std::io::Error),

    Frame(FrameError),

    Handshake(HandshakeError),

    HandshakeTimeout,

    HeartbeatTimeout,

    CapacityExceeded,

    UnsupportedOpcode(OpCode),

    InvalidText,

    Io(std::io::Error),
}

impl Error {
    /// Errors caused by a misbehaving peer rather than the transport.
    #[inline]
    pub const fn is_violation(&self) -> bool {
        match self {
            Error::Frame(e) => e.is_violation(),
            Error::UnsupportedOpcode(_) | Error::InvalidText => true,
            _ => false,
        }
    }
}

impl From<FrameError> for Error {
    fn from(e: FrameError) -> Self { Error::Frame(e) }
}

impl From<HandshakeError> for Error {
    fn from(e: HandshakeError) -> Self { Error::Handshake(e) }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error { Error::Io(e) }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use Error::*;
        match self {
            Bind(e) => write!(f, "Bind error: {}", e),
            Frame(e) => write!(f, "Frame error: {}", e),
            Handshake(e) => write!(f, "Handshake error: {}", e),
            HandshakeTimeout => write!(f, "Handshake timeout"),
            HeartbeatTimeout => write!(f, "Heartbeat timeout"),
            CapacityExceeded => write!(f, "Max client connections reached"),
            UnsupportedOpcode(op) => write!(f, "Unsupported opcode {}", op),
            InvalidText => write!(f, "Text frame is not valid utf-8"),
            Io(e) => write!(f, "Io error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use Error::*;

        match self {
            Bind(e) | Io(e) => Some(e),
            Frame(e) => Some(e),
            Handshake(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn violation() {
        assert!(Error::from(FrameError::UnmaskedFrame).is_violation());
        assert!(!Error::from(FrameError::Truncated).is_violation());
        assert!(Error::UnsupportedOpcode(OpCode::Continue).is_violation());
        assert!(!Error::HeartbeatTimeout.is_violation());
        assert!(!Error::from(std::io::Error::from(std::io::ErrorKind::BrokenPipe)).is_violation());
    }

    #[test]
    fn display() {
        assert_eq!(
            Error::from(FrameError::PayloadTooLarge(42)).to_string(),
            "Frame error: Protocol violation: payload length 42 exceeds the limit"
        );
        assert_eq!(
            Error::UnsupportedOpcode(OpCode::Reserved3).to_string(),
            "Unsupported opcode 0x3: non-control frame"
        );
        assert_eq!(
            Error::from(HandshakeError::SecWebSocketKey).to_string(),
            "Handshake error: Missing sec-websocket-key header"
        );
    }
}
