//! Connection manager.
//!
//! Accepts clients, bounds them by `max-clients`, and reclaims the
//! slots of finished connections.

mod slots;

pub use slots::{Slot, Slots};

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::{sleep, timeout};

use crate::config::Config;
use crate::connection::{ClientId, ClientInfo, Connection, Echo, Handler, State};
use crate::error::Error;
use crate::handshake::HTTP_SERVICE_UNAVAILABLE;

/// Pause after a failed accept, e.g. out of file descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Lower bound of the supervise interval.
const MIN_SUPERVISE_INTERVAL: Duration = Duration::from_millis(10);

/// Owns every live connection.
///
/// Each admitted client gets a task of its own. The manager only keeps
/// a handle and the published state of it.
pub struct ConnectionManager<H = Echo> {
    config: Arc<Config>,
    handler: H,
    slots: Mutex<Slots>,
    next_id: AtomicU64,
}

impl ConnectionManager<Echo> {
    pub fn new(config: Arc<Config>) -> Self { Self::with_handler(config, Echo) }
}

impl<H> ConnectionManager<H>
where
    H: Handler + Clone + Sync,
{
    /// Each connection gets a clone of `handler`.
    pub fn with_handler(config: Arc<Config>, handler: H) -> Self {
        let slots = Mutex::new(Slots::new(config.max_clients));
        Self {
            config,
            handler,
            slots,
            next_id: AtomicU64::new(1),
        }
    }

    #[inline]
    pub fn config(&self) -> &Config { &self.config }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener, Error> {
        let listener = TcpListener::bind((self.config.address.as_str(), self.config.port))
            .await
            .map_err(Error::Bind)?;

        if let Ok(addr) = listener.local_addr() {
            info!("websocket server listening: addr={}", addr);
        }

        Ok(listener)
    }

    /// Accept clients forever.
    ///
    /// A failing accept is logged and retried after a short pause.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) {
        loop {
            let (socket, addr) = match listener.accept().await {
                Ok(x) => x,
                Err(e) => {
                    error!("tcp accept failed: err={}", e);
                    sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };

            if let Err(e) = socket.set_nodelay(true) {
                debug!("set nodelay failed: addr={}, err={}", addr, e);
            }

            match self.admit(socket, addr) {
                Ok(id) => info!("client connected: id={}, addr={}", id, addr),
                Err(e) => warn!("client rejected: addr={}, err={}", addr, e),
            }
        }
    }

    /// Reclaim finished connections periodically.
    pub async fn supervise(self: Arc<Self>) {
        let period = self.config.supervise_interval.max(MIN_SUPERVISE_INTERVAL);
        let mut interval = tokio::time::interval(period);

        loop {
            interval.tick().await;

            let n = self.reclaim();
            if n > 0 {
                debug!("reclaimed closed connections: count={}, live={}", n, self.live());
            }
        }
    }

    /// Start serving a client if there is room for it.
    ///
    /// Slots of finished connections are reclaimed first when the table is
    /// full. A client turned away gets a `503` and is closed, the
    /// connection is not started.
    pub fn admit<IO>(&self, io: IO, addr: SocketAddr) -> Result<ClientId, Error>
    where
        IO: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let mut slots = self.slots.lock();
        if slots.is_full() {
            slots.reclaim();
        }

        if slots.is_full() {
            drop(slots);
            self.reject(io);
            return Err(Error::CapacityExceeded);
        }

        let id = ClientId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let info = ClientInfo::new(id, addr);
        let conn = Connection::new(io, info.clone(), self.config.clone(), self.handler.clone());

        slots.reserve(move || {
            let state = conn.state_cell();
            let handle = tokio::spawn(async move {
                let _ = conn.run().await;
            });

            Slot {
                info,
                state,
                handle,
            }
        });

        Ok(id)
    }

    fn reject<IO>(&self, mut io: IO)
    where
        IO: AsyncWrite + Unpin + Send + 'static,
    {
        let send_timeout = self.config.send_timeout;
        tokio::spawn(async move {
            let _ = timeout(send_timeout, async {
                io.write_all(HTTP_SERVICE_UNAVAILABLE).await?;
                io.shutdown().await
            })
            .await;
        });
    }

    /// Free the slots of finished connections, returns how many.
    pub fn reclaim(&self) -> usize { self.slots.lock().reclaim() }

    /// Connections not closed yet, including the ones still handshaking.
    pub fn live(&self) -> usize {
        self.slots
            .lock()
            .iter()
            .filter(|s| !s.state.get().is_closed())
            .count()
    }

    /// Connections past the handshake.
    pub fn open(&self) -> usize {
        self.slots
            .lock()
            .iter()
            .filter(|s| s.state.get().is_open())
            .count()
    }

    /// Snapshot of all held connections.
    pub fn clients(&self) -> Vec<(ClientInfo, State)> {
        self.slots
            .lock()
            .iter()
            .map(|s| (s.info.clone(), s.state.get()))
            .collect()
    }
}
