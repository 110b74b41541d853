#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use beatws::frame::mask::new_mask_key;
use beatws::frame::{self, FrameHead, Mask, OpCode};
use beatws::handshake::{derive_accept_key, new_sec_key};
use beatws::{Config, ConnectionManager};

/// Serve on a random local port.
pub async fn start(config: Config) -> (Arc<ConnectionManager>, SocketAddr) {
    let _ = env_logger::try_init();

    let config = Arc::new(Config {
        address: "127.0.0.1".to_string(),
        port: 0,
        ..config
    });

    let manager = Arc::new(ConnectionManager::new(config));
    let listener = manager.bind().await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(manager.clone().serve(listener));
    tokio::spawn(manager.clone().supervise());

    (manager, addr)
}

/// Read an http head, or whatever arrives before EOF.
pub async fn read_http(tcp: &mut TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    while !buf.ends_with(b"\r\n\r\n") {
        match tcp.read_u8().await {
            Ok(b) => buf.push(b),
            Err(_) => break,
        }
    }
    buf
}

pub fn request(sec_key: &str) -> String {
    format!(
        "GET /ws HTTP/1.1\r\n\
        Host: www.example.com\r\n\
        Connection: Upgrade\r\n\
        Upgrade: websocket\r\n\
        Sec-WebSocket-Key: {}\r\n\
        Sec-WebSocket-Version: 13\r\n\r\n",
        sec_key
    )
}

pub struct Client {
    tcp: TcpStream,
    buf: Vec<u8>,
}

impl Client {
    pub async fn connect(addr: SocketAddr) -> Self {
        let mut tcp = TcpStream::connect(addr).await.unwrap();
        let sec_key = new_sec_key();
        tcp.write_all(request(&sec_key).as_bytes()).await.unwrap();

        let response = read_http(&mut tcp).await;
        let response = std::str::from_utf8(&response).unwrap();
        let accept = derive_accept_key(sec_key.as_bytes());

        assert!(response.starts_with("HTTP/1.1 101 Switching Protocols\r\n"));
        assert!(response.contains(&format!(
            "Sec-WebSocket-Accept: {}\r\n",
            std::str::from_utf8(&accept).unwrap()
        )));

        Self {
            tcp,
            buf: Vec::new(),
        }
    }

    pub async fn send(&mut self, opcode: OpCode, payload: &[u8]) {
        let mut buf = Vec::new();
        frame::encode(opcode, payload, Mask::Key(new_mask_key()), &mut buf);
        self.tcp.write_all(&buf).await.unwrap();
    }

    pub async fn send_raw(&mut self, data: &[u8]) { self.tcp.write_all(data).await.unwrap(); }

    /// Next server frame, `None` on EOF.
    pub async fn recv(&mut self) -> Option<(OpCode, Vec<u8>)> {
        loop {
            if let Ok((head, n)) = FrameHead::decode(&self.buf) {
                let len = head.length.to_num() as usize;
                if self.buf.len() >= n + len {
                    assert!(!head.mask.is_masked());
                    let payload = self.buf[n..n + len].to_vec();
                    self.buf.drain(..n + len);
                    return Some((head.opcode, payload));
                }
            }

            let mut chunk = [0_u8; 4096];
            match self.tcp.read(&mut chunk).await {
                Ok(0) | Err(_) => return None,
                Ok(n) => self.buf.extend_from_slice(&chunk[..n]),
            }
        }
    }

    pub async fn close(mut self) {
        self.send(OpCode::Close, &1000_u16.to_be_bytes()).await;
        assert_eq!(
            self.recv().await,
            Some((OpCode::Close, 1000_u16.to_be_bytes().to_vec()))
        );
        assert_eq!(self.recv().await, None);
    }
}
