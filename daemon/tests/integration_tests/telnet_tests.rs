//! Integration tests for the telnet line protocol.
//!
//! Tests cover:
//! - put lines landing in the sample queue without a reply
//! - Error replies for malformed puts on the same connection
//! - Shutdown tearing the listener down

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use super::common::TestDaemon;

async fn telnet_daemon() -> (TestDaemon, std::net::SocketAddr, watch::Sender<bool>) {
    let daemon = TestDaemon::start();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(daemon::telnet::run(
        listener,
        daemon.state.clone(),
        shutdown_rx,
    ));

    (daemon, addr, shutdown_tx)
}

/// Polls until the queue reaches `depth` or a timeout passes.
async fn wait_for_queue_depth(daemon: &TestDaemon, depth: usize) -> bool {
    for _ in 0..200 {
        if daemon.state.datastore().queue_depth() == depth {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn test_telnet_put_enqueues_sample() {
    let (daemon, addr, shutdown_tx) = telnet_daemon().await;

    let mut client = TcpStream::connect(addr).await.unwrap();
    client
        .write_all(b"put sys.cpu 1700000001 0.7 host=a\r\n")
        .await
        .unwrap();

    assert!(wait_for_queue_depth(&daemon, 1).await);

    let _ = shutdown_tx.send(true);
}

#[tokio::test]
async fn test_telnet_bad_put_answers_on_connection() {
    let (daemon, addr, shutdown_tx) = telnet_daemon().await;

    let mut client = TcpStream::connect(addr).await.unwrap();
    client.write_all(b"put sys.cpu 1700000001\n").await.unwrap();

    let mut buf = [0u8; 256];
    let n = client.read(&mut buf).await.unwrap();
    let reply = std::str::from_utf8(&buf[..n]).unwrap();

    assert!(reply.starts_with("put: invalid number of parameters"));
    assert_eq!(daemon.state.datastore().queue_depth(), 0);

    let _ = shutdown_tx.send(true);
}

#[tokio::test]
async fn test_telnet_shutdown_refuses_new_connections() {
    let (_daemon, addr, shutdown_tx) = telnet_daemon().await;

    let _ = shutdown_tx.send(true);
    // give the acceptor a moment to wind down
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Either the connection is refused outright, or it closes immediately
    // without accepting traffic.
    match TcpStream::connect(addr).await {
        Err(_) => {}
        Ok(mut client) => {
            let mut buf = [0u8; 16];
            let read = tokio::time::timeout(Duration::from_millis(200), client.read(&mut buf))
                .await;
            if let Ok(Ok(n)) = read {
                assert_eq!(n, 0);
            }
        }
    }
}
