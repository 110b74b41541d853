//! Websocket connection.
//!
//! A [`Connection`] owns one accepted socket and drives it through
//! `Handshaking -> Open <-> AwaitingPong -> Closing -> Closed`.
//! Frames are processed strictly in the order they are received.

pub mod handler;
mod heartbeat;
mod state;

pub use handler::{Echo, Handler, Reply};
pub use heartbeat::{Beat, HEARTBEAT_PAYLOAD};
pub use state::{State, StateCell};

use std::fmt::{Display, Formatter};
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use bytes::{Buf, BufMut, BytesMut};
use log::{debug, info, trace, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{sleep_until, timeout, Instant as TokioInstant};

use heartbeat::HeartBeat;

use crate::config::Config;
use crate::error::{Error, FrameError, HandshakeError};
use crate::frame::{self, Decoded, Mask, OpCode, MAX_HEAD_LEN};
use crate::handshake::{self, HTTP_BAD_REQUEST, MAX_REQUEST_SIZE};

/// Read at least this many bytes at a time.
const READ_BUF_SIZE: usize = 4096;

/// Opaque client id, unique within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u64);

impl Display for ClientId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

/// Identity of a connected client.
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub id: ClientId,
    pub addr: SocketAddr,
    pub connected_at: Instant,
}

impl ClientInfo {
    #[inline]
    pub fn new(id: ClientId, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            connected_at: Instant::now(),
        }
    }
}

/// Whether to keep reading after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Close,
}

/// Status code sent in the close frame when the peer is at fault.
///
/// [RFC-6455 Section 7.4.1](https://datatracker.ietf.org/doc/html/rfc6455#section-7.4.1)
fn close_code(e: &Error) -> Option<u16> {
    match e {
        Error::InvalidText => Some(1007),
        Error::Frame(FrameError::PayloadTooLarge(_)) => Some(1009),
        e if e.is_violation() => Some(1002),
        _ => None,
    }
}

/// One client connection.
pub struct Connection<IO, H = Echo> {
    io: IO,
    info: ClientInfo,
    state: Arc<StateCell>,
    config: Arc<Config>,
    handler: H,
    rbuf: BytesMut,
    wbuf: BytesMut,
    heartbeat: HeartBeat,
}

impl<IO, H> std::fmt::Debug for Connection<IO, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("info", &self.info)
            .field("state", &self.state.get())
            .field("heartbeat", &self.heartbeat)
            .finish()
    }
}

impl<IO, H> Connection<IO, H> {
    /// Create a connection in `Handshaking` state.
    pub fn new(io: IO, info: ClientInfo, config: Arc<Config>, handler: H) -> Self {
        let heartbeat = HeartBeat::new(config.heartbeat_interval, config.client_timeout);
        Self {
            io,
            info,
            state: Arc::new(StateCell::new()),
            config,
            handler,
            rbuf: BytesMut::with_capacity(READ_BUF_SIZE),
            wbuf: BytesMut::with_capacity(READ_BUF_SIZE),
            heartbeat,
        }
    }

    #[inline]
    pub fn info(&self) -> &ClientInfo { &self.info }

    #[inline]
    pub fn state(&self) -> State { self.state.get() }

    /// Shared view of the state, for whoever supervises this connection.
    #[inline]
    pub fn state_cell(&self) -> Arc<StateCell> { self.state.clone() }

    fn set_state(&self, state: State) {
        let prev = self.state.set(state);
        if prev != state {
            trace!("client state: id={}, {} -> {}", self.info.id, prev, state);
        }
    }
}

impl<IO, H> Connection<IO, H>
where
    IO: AsyncRead + AsyncWrite + Unpin,
    H: Handler,
{
    /// Run until the connection is closed, by either side.
    ///
    /// `Ok` means an orderly close (close frame or EOF from the peer).
    /// The state is `Closed` when this returns, whatever the result.
    pub async fn run(mut self) -> Result<(), Error> {
        let ret = self.serve().await;
        self.teardown(&ret).await;
        ret
    }

    async fn serve(&mut self) -> Result<(), Error> {
        match timeout(self.config.handshake_timeout, self.handshake()).await {
            Ok(ret) => ret?,
            Err(_) => return Err(Error::HandshakeTimeout),
        }

        self.heartbeat = HeartBeat::new(self.config.heartbeat_interval, self.config.client_timeout);
        self.set_state(State::Open);

        info!(
            "websocket opened: id={}, addr={}",
            self.info.id, self.info.addr
        );

        loop {
            // data may be left behind by the handshake, or by the last read
            loop {
                // timers go first, traffic must not hold off the pong wait
                self.check_heartbeat().await?;

                let Some((opcode, payload)) = self.next_frame()? else {
                    break;
                };
                if self.dispatch(opcode, payload).await? == Flow::Close {
                    return Ok(());
                }
            }

            let (deadline, beat) = self.heartbeat.deadline();
            self.rbuf.reserve(READ_BUF_SIZE);

            tokio::select! {
                biased;
                _ = sleep_until(deadline) => self.on_beat(beat).await?,
                ret = self.io.read_buf(&mut self.rbuf) => {
                    // EOF, peer is gone
                    if ret? == 0 {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Fire the heartbeat if its deadline has already passed.
    async fn check_heartbeat(&mut self) -> Result<(), Error> {
        let (deadline, beat) = self.heartbeat.deadline();
        if TokioInstant::now() >= deadline {
            self.on_beat(beat).await?;
        }
        Ok(())
    }

    async fn handshake(&mut self) -> Result<(), Error> {
        loop {
            match handshake::negotiate(&self.rbuf) {
                Ok(negotiated) => {
                    self.rbuf.advance(negotiated.consumed);
                    self.wbuf.clear();
                    negotiated.response().encode(&mut self.wbuf);
                    return self.flush().await;
                }
                Err(HandshakeError::NotEnoughData) => {}
                Err(e) => {
                    self.wbuf.clear();
                    self.wbuf.put_slice(HTTP_BAD_REQUEST);
                    let _ = self.flush().await;
                    return Err(e.into());
                }
            }

            self.rbuf.reserve(MAX_REQUEST_SIZE);
            if self.io.read_buf(&mut self.rbuf).await? == 0 {
                return Err(Error::Io(ErrorKind::UnexpectedEof.into()));
            }
        }
    }

    /// Take the next complete frame out of the read buffer.
    fn next_frame(&mut self) -> Result<Option<(OpCode, BytesMut)>, Error> {
        let Decoded {
            head,
            payload_offset,
            payload_len,
        } = match frame::decode_client(&self.rbuf, self.config.payload_limit()) {
            Ok(x) => x,
            Err(FrameError::Truncated) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut payload = self.rbuf.split_to(payload_offset + payload_len);
        payload.advance(payload_offset);
        head.mask.apply(&mut payload);

        Ok(Some((head.opcode, payload)))
    }

    async fn dispatch(&mut self, opcode: OpCode, payload: BytesMut) -> Result<Flow, Error> {
        trace!(
            "client frame: id={}, opcode={}, size={}",
            self.info.id,
            opcode,
            payload.len()
        );

        self.heartbeat.on_activity();

        match opcode {
            OpCode::Text => {
                let text = std::str::from_utf8(&payload).map_err(|_| Error::InvalidText)?;
                let reply = self.handler.on_text(&self.info, text);
                self.reply(reply).await?;
            }
            OpCode::Binary => {
                let reply = self.handler.on_binary(&self.info, &payload);
                self.reply(reply).await?;
            }
            OpCode::Ping => self.send(OpCode::Pong, &payload).await?,
            OpCode::Pong => {
                if self.heartbeat.is_awaiting_pong() && payload[..] == *HEARTBEAT_PAYLOAD {
                    debug!("client pong: id={}", self.info.id);
                    self.heartbeat.on_pong();
                    self.set_state(State::Open);
                }
            }
            OpCode::Close => {
                self.set_state(State::Closing);
                // echo the status code only, the peer may be gone already
                let code = payload.get(..2).unwrap_or_default();
                if let Err(e) = self.send(OpCode::Close, code).await {
                    debug!("close echo failed: id={}, err={}", self.info.id, e);
                }
                return Ok(Flow::Close);
            }
            op => {
                if op.is_reserved() {
                    debug!("client sent reserved opcode: id={}, opcode={}", self.info.id, op);
                } else {
                    debug!("client sent continuation frame: id={}", self.info.id);
                }
                return Err(Error::UnsupportedOpcode(op));
            }
        }

        Ok(Flow::Continue)
    }

    async fn reply(&mut self, reply: Reply) -> Result<(), Error> {
        match reply {
            Reply::None => Ok(()),
            Reply::Text(text) => self.send(OpCode::Text, text.as_bytes()).await,
            Reply::Binary(data) => self.send(OpCode::Binary, &data).await,
        }
    }

    async fn on_beat(&mut self, beat: Beat) -> Result<(), Error> {
        match beat {
            Beat::Ping => {
                debug!("client is idle, ping: id={}", self.info.id);
                self.send(OpCode::Ping, HEARTBEAT_PAYLOAD).await?;
                self.heartbeat.on_ping();
                self.set_state(State::AwaitingPong);
                Ok(())
            }
            Beat::Timeout => Err(Error::HeartbeatTimeout),
        }
    }

    async fn send(&mut self, opcode: OpCode, payload: &[u8]) -> Result<(), Error> {
        self.wbuf.clear();
        self.wbuf.reserve(MAX_HEAD_LEN + payload.len());
        frame::encode(opcode, payload, Mask::None, &mut self.wbuf);
        self.flush().await
    }

    /// Write out everything in the write buffer, bounded by the send timeout.
    async fn flush(&mut self) -> Result<(), Error> {
        let io = &mut self.io;
        let buf = &self.wbuf;
        let write = async move {
            io.write_all(buf).await?;
            io.flush().await
        };

        match timeout(self.config.send_timeout, write).await {
            Ok(ret) => Ok(ret?),
            Err(_) => Err(Error::Io(std::io::Error::new(
                ErrorKind::TimedOut,
                "send timeout",
            ))),
        }
    }

    async fn teardown(&mut self, ret: &Result<(), Error>) {
        let was_open = self.state().is_open();
        self.set_state(State::Closing);

        if let (true, Err(e)) = (was_open, ret) {
            if let Some(code) = close_code(e) {
                let _ = self.send(OpCode::Close, &code.to_be_bytes()).await;
            }
        }

        let _ = timeout(self.config.send_timeout, self.io.shutdown()).await;
        self.set_state(State::Closed);

        let (id, addr) = (self.info.id, self.info.addr);
        match ret {
            Ok(()) => info!("client disconnected: id={}, addr={}", id, addr),
            Err(Error::HeartbeatTimeout) => {
                warn!("client did not answer ping in time, dropped: id={}, addr={}", id, addr)
            }
            Err(e) if e.is_violation() => {
                warn!("client closed for protocol error: id={}, addr={}, err={}", id, addr, e)
            }
            Err(e) => info!("client closed: id={}, addr={}, err={}", id, addr, e),
        }
    }
}
