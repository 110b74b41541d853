//! Application handlers for data frames.

use log::warn;

use super::ClientInfo;

/// Reaction to a data frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Send nothing back.
    None,
    Text(String),
    Binary(Vec<u8>),
}

/// Receives decoded data frames of one connection.
///
/// Control frames are handled by the connection itself.
pub trait Handler: Send + 'static {
    /// A complete text frame.
    fn on_text(&mut self, client: &ClientInfo, text: &str) -> Reply;

    /// A complete binary frame.
    ///
    /// Binary messages have no meaning yet, the default
    /// implementation reports and discards them.
    fn on_binary(&mut self, client: &ClientInfo, data: &[u8]) -> Reply {
        warn!(
            "binary frame is not implemented: id={}, size={}",
            client.id,
            data.len()
        );
        Reply::None
    }
}

/// Send text back as it is.
#[derive(Debug, Default, Clone, Copy)]
pub struct Echo;

impl Handler for Echo {
    fn on_text(&mut self, _: &ClientInfo, text: &str) -> Reply { Reply::Text(text.to_owned()) }
}
