//! End-to-end tests for the TCP stand-in over real loopback sockets.

use glove_monitor::link::socket::{TestServer, GREETING};
use glove_monitor::{FingerId, GloveError, ReadingStore, Supervisor};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

const STEP: Duration = Duration::from_secs(5);

async fn start_server() -> (Supervisor, TcpStream) {
    let server = TestServer::bind("127.0.0.1", 0)
        .await
        .expect("Failed to bind test server");
    let addr = server.local_addr();

    let mut supervisor = Supervisor::new(Arc::new(ReadingStore::new()));
    supervisor.spawn_test_server(server);

    let client = TcpStream::connect(addr)
        .await
        .expect("Failed to connect to test server");
    (supervisor, client)
}

#[tokio::test]
async fn test_right_thumb_full_scale() {
    let (supervisor, client) = start_server().await;
    let store = supervisor.store();
    let (read_half, mut write_half) = client.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let greeting = timeout(STEP, lines.next_line()).await.unwrap().unwrap();
    assert_eq!(greeting.as_deref(), Some(GREETING.trim_end()));

    write_half.write_all(b"r 0fff\n").await.unwrap();
    let reply = timeout(STEP, lines.next_line()).await.unwrap().unwrap();
    assert_eq!(reply.as_deref(), Some("Heard: 'r 0fff'"));

    // Lines are handled in order, so the next echo means the previous line is stored.
    write_half.write_all(b"l 4000\n").await.unwrap();
    let reply = timeout(STEP, lines.next_line()).await.unwrap().unwrap();
    assert_eq!(reply.as_deref(), Some("Heard: 'l 4000'"));

    write_half.write_all(b"r 1001\n").await.unwrap();
    timeout(STEP, lines.next_line()).await.unwrap().unwrap();
    write_half.write_all(b"r 1001\n").await.unwrap();
    timeout(STEP, lines.next_line()).await.unwrap().unwrap();

    assert_eq!(store.get(FingerId::RightThumb), 4095);
    assert_eq!(store.get(FingerId::LeftPinky), 0);
    assert_eq!(store.get(FingerId::RightIndex), 1);

    drop(write_half);
    timeout(STEP, supervisor.shutdown())
        .await
        .expect("Shutdown hung")
        .expect("Server ended with an error");
}

#[tokio::test]
async fn test_malformed_lines_keep_connection_open() {
    let (supervisor, client) = start_server().await;
    let store = supervisor.store();
    let (read_half, mut write_half) = client.into_split();
    let mut lines = BufReader::new(read_half).lines();
    timeout(STEP, lines.next_line()).await.unwrap().unwrap();

    for line in ["x 0fff", "r zz", "", "r 7123", "l 0x2abc", "r 0001"] {
        write_half
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .unwrap();
        let reply = timeout(STEP, lines.next_line()).await.unwrap().unwrap();
        assert_eq!(reply, Some(format!("Heard: '{}'", line)));
    }

    // One more round trip so "r 0001" has been decoded.
    write_half.write_all(b"r 0001\n").await.unwrap();
    timeout(STEP, lines.next_line()).await.unwrap().unwrap();

    assert_eq!(store.get(FingerId::LeftMiddle), 0x0abc);
    assert_eq!(store.get(FingerId::RightThumb), 1);
    assert_eq!(store.snapshot()[1..5], [0, 0, 0, 0]);

    drop(write_half);
    timeout(STEP, supervisor.shutdown()).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_shutdown_without_client() {
    let server = TestServer::bind("127.0.0.1", 0).await.unwrap();
    let mut supervisor = Supervisor::new(Arc::new(ReadingStore::new()));
    supervisor.spawn_test_server(server);

    timeout(STEP, supervisor.shutdown())
        .await
        .expect("Shutdown hung")
        .expect("Idle server should stop cleanly");
}

#[tokio::test]
async fn test_bind_failure_on_port_in_use() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = occupied.local_addr().unwrap().port();

    let err = TestServer::bind("127.0.0.1", port)
        .await
        .expect_err("Second bind should fail");
    assert!(matches!(err, GloveError::BindFailure { .. }));
    assert!(!err.is_recoverable());
}
