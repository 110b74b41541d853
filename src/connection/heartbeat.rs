use std::time::Duration;
use tokio::time::Instant;

/// Payload of the pings sent by the server.
pub const HEARTBEAT_PAYLOAD: &[u8] = b"<:HEARTBEAT:>";

/// What to do when the heartbeat deadline is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Beat {
    /// No inbound traffic for a whole interval.
    Ping,
    /// The outstanding ping was not answered in time.
    Timeout,
}

/// Heartbeat timers.
///
/// Two independent timers: inactivity before a ping is sent, and
/// the wait for a pong once it is sent.
#[derive(Debug)]
pub(super) struct HeartBeat {
    interval: Duration,
    timeout: Duration,
    last_activity: Instant,
    ping_sent: Option<Instant>,
}

impl HeartBeat {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            timeout,
            last_activity: Instant::now(),
            ping_sent: None,
        }
    }

    /// Any inbound frame.
    #[inline]
    pub fn on_activity(&mut self) { self.last_activity = Instant::now(); }

    /// A ping has been sent.
    #[inline]
    pub fn on_ping(&mut self) { self.ping_sent = Some(Instant::now()); }

    /// A matching pong clears the pong-wait timer.
    #[inline]
    pub fn on_pong(&mut self) {
        self.ping_sent = None;
        self.on_activity();
    }

    #[inline]
    pub fn is_awaiting_pong(&self) -> bool { self.ping_sent.is_some() }

    /// Next point in time the timers need attention.
    #[inline]
    pub fn deadline(&self) -> (Instant, Beat) {
        match self.ping_sent {
            Some(sent) => (sent + self.timeout, Beat::Timeout),
            None => (self.last_activity + self.interval, Beat::Ping),
        }
    }
}
