use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU8, Ordering};

/// Connection state.
///
/// ```text
/// Handshaking -> Open <-> AwaitingPong
///      |          |            |
///      +----------+-> Closing -+-> Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Handshaking = 0,
    Open = 1,
    AwaitingPong = 2,
    Closing = 3,
    Closed = 4,
}

impl State {
    #[inline]
    const fn from_u8(v: u8) -> Self {
        match v {
            0 => State::Handshaking,
            1 => State::Open,
            2 => State::AwaitingPong,
            3 => State::Closing,
            _ => State::Closed,
        }
    }

    /// Frames are exchanged in these states.
    #[inline]
    pub const fn is_open(self) -> bool { matches!(self, State::Open | State::AwaitingPong) }

    #[inline]
    pub const fn is_closed(self) -> bool { matches!(self, State::Closed) }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            State::Handshaking => "handshaking",
            State::Open => "open",
            State::AwaitingPong => "awaiting-pong",
            State::Closing => "closing",
            State::Closed => "closed",
        };
        write!(f, "{}", s)
    }
}

/// State published by a connection, observed by the manager.
///
/// Only the owning connection writes to it. Once `Closed` is stored
/// it never changes again.
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl StateCell {
    #[inline]
    pub const fn new() -> Self { StateCell(AtomicU8::new(State::Handshaking as u8)) }

    #[inline]
    pub fn get(&self) -> State { State::from_u8(self.0.load(Ordering::Acquire)) }

    /// Store a new state, returns the previous one.
    ///
    /// A closed cell is left untouched.
    #[inline]
    pub fn set(&self, state: State) -> State {
        let prev = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| {
                if State::from_u8(v).is_closed() {
                    None
                } else {
                    Some(state as u8)
                }
            })
            .unwrap_or_else(|v| v);
        State::from_u8(prev)
    }
}

impl Default for StateCell {
    fn default() -> Self { Self::new() }
}
