mod common;

use std::time::Duration;

use tokio::net::TcpStream;

use beatws::handshake::HTTP_SERVICE_UNAVAILABLE;
use beatws::Config;

use common::*;

#[tokio::test]
async fn max_clients() {
    let (manager, addr) = start(Config {
        max_clients: 2,
        ..Default::default()
    })
    .await;

    let c1 = Client::connect(addr).await;
    let c2 = Client::connect(addr).await;
    assert_eq!(manager.open(), 2);

    for _ in 0..3 {
        let mut tcp = TcpStream::connect(addr).await.unwrap();
        assert_eq!(read_http(&mut tcp).await, HTTP_SERVICE_UNAVAILABLE);
    }
    assert_eq!(manager.clients().len(), 2);

    // room again once a client is gone
    c1.close().await;
    while manager.live() != 1 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let c3 = Client::connect(addr).await;
    assert_eq!(manager.open(), 2);
    assert!(manager.live() <= 2);

    c2.close().await;
    c3.close().await;
}
