//! Small websocket server with heartbeat and bounded connections.
//!
//! ## Features
//! - Hand written RFC-6455 framing and opening handshake.
//! - Ping based liveness, idle clients are probed and dropped.
//! - A fixed number of connection slots.
//! - One task per connection, frames are processed in order.
//!
//! ## High-level API
//!
//! - [`manager`]
//! - [`connection`]
//!
//! ```ignore
//! {
//!     let manager = Arc::new(ConnectionManager::new(config));
//!     let listener = manager.bind().await?;
//!     tokio::spawn(manager.clone().supervise());
//!     manager.serve(listener).await;
//! }
//! ```
//!
//! ## Low-level API
//!
//! - [`frame`]
//! - [`handshake`]
//!
//! Frame:
//!
//! ```ignore
//! {
//!     // decode a client frame
//!     let decoded = decode_client(&buf, max_payload)?;
//!     decoded.unmask(&mut buf[decoded.payload_offset..decoded.frame_len()]);
//!
//!     // encode a server frame
//!     let n = encode(OpCode::Text, b"hello", Mask::None, &mut out);
//! }
//! ```
//!
//! Handshake:
//!
//! ```ignore
//! {
//!     // validate an upgrade request, then answer it
//!     let negotiated = negotiate(&buf)?;
//!     negotiated.response().encode(&mut out);
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod frame;
pub mod handshake;
pub mod manager;

use std::sync::Arc;

pub use config::Config;
pub use connection::{ClientId, ClientInfo, Connection, Echo, Handler, Reply, State};
pub use error::Error;
pub use manager::ConnectionManager;

/// Run the server with the echo handler.
///
/// Only fails if the listener cannot be bound.
pub async fn startup(config: Arc<Config>) -> Result<(), Error> {
    let manager = Arc::new(ConnectionManager::new(config));
    let listener = manager.bind().await?;

    tokio::spawn(manager.clone().supervise());
    manager.serve(listener).await;

    Ok(())
}
