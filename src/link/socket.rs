//! TCP stand-in for the glove links.
//!
//! Before the gloves existed, readings were typed into a plain TCP session.
//! The server accepts a single client, greets it, and then handles one
//! newline-terminated command per line:
//!
//! ```text
//! client: r 0fff
//! server: Heard: 'r 0fff'
//! ```
//!
//! `<hand>` is `r` or `l`; the payload is a base-16 16-bit frame (optional
//! `0x` prefix). Every line is acknowledged before it is decoded. Lines that
//! do not parse, or whose finger index is out of range, are logged and
//! skipped without closing the connection; that includes lines that are not
//! valid UTF-8 and lines longer than [`MAX_LINE_LEN`].

use std::net::SocketAddr;
use std::sync::Arc;
use std::io;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::error::{GloveError, GloveResult};
use crate::hardware::finger::Hand;
use crate::hardware::frame::decode;
use crate::hardware::store::ReadingStore;
use crate::link::ShutdownRx;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8888;

/// Sent once when a client connects.
pub const GREETING: &str = "Welcome to the server. Enter a command.\n";

/// Longest command line accepted, newline included. Longer lines are
/// echoed truncated and discarded.
pub const MAX_LINE_LEN: usize = 1024;

/// Bound TCP listener waiting for its one client.
#[derive(Debug)]
pub struct TestServer {
    listener: TcpListener,
    addr: SocketAddr,
}

impl TestServer {
    /// Bind the listening socket.
    ///
    /// An empty host binds all interfaces. Failure here is fatal at startup.
    pub async fn bind(host: &str, port: u16) -> GloveResult<Self> {
        let host = if host.is_empty() { "0.0.0.0" } else { host };
        let addr = format!("{}:{}", host, port);

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| GloveError::BindFailure {
                addr: addr.clone(),
                source,
            })?;
        let addr = listener
            .local_addr()
            .map_err(|source| GloveError::BindFailure { addr, source })?;

        info!(%addr, "Socket bind complete, listening");
        Ok(Self { listener, addr })
    }

    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Accept one client and serve it until it disconnects or `shutdown_rx` fires.
    pub async fn run(
        self,
        store: Arc<ReadingStore>,
        mut shutdown_rx: ShutdownRx,
    ) -> GloveResult<()> {
        let (stream, peer) = tokio::select! {
            biased;
            _ = &mut shutdown_rx => {
                info!("test server stopped before a client connected");
                return Ok(());
            }
            accepted = self.listener.accept() => accepted?,
        };
        info!(%peer, "Connected with {}", peer);

        // One client only; stop listening.
        drop(self.listener);
        serve_connection(stream, &peer.to_string(), &store, &mut shutdown_rx).await
    }
}

/// Serve one text session over any byte stream.
///
/// Returns `Ok(())` when the peer closes the stream or the stop signal fires.
pub async fn serve_connection<S>(
    stream: S,
    peer: &str,
    store: &ReadingStore,
    shutdown_rx: &mut ShutdownRx,
) -> GloveResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let lost = |source| GloveError::ConnectionLost {
        link: format!("test client {}", peer),
        source,
    };

    let (read_half, mut write_half) = tokio::io::split(stream);
    write_half
        .write_all(GREETING.as_bytes())
        .await
        .map_err(lost)?;

    let mut reader = BufReader::new(read_half);
    let mut buf = Vec::with_capacity(MAX_LINE_LEN);
    loop {
        let read = tokio::select! {
            biased;
            _ = &mut *shutdown_rx => {
                debug!(%peer, "stop requested");
                break;
            }
            read = read_capped_line(&mut reader, &mut buf) => read.map_err(lost)?,
        };

        let Some(truncated) = read else {
            info!(%peer, "client closed the connection");
            break;
        };
        let text = String::from_utf8_lossy(&buf);
        let command = text.trim();

        write_half
            .write_all(format!("Heard: '{}'\n", command).as_bytes())
            .await
            .map_err(lost)?;

        let reading = if truncated {
            Err(GloveError::malformed(
                command,
                format!("line exceeds {} bytes", MAX_LINE_LEN),
            ))
        } else if std::str::from_utf8(&buf).is_err() {
            Err(GloveError::malformed(command, "line is not valid UTF-8"))
        } else {
            parse_command(command).and_then(|(hand, raw)| decode(hand, raw))
        };
        match reading {
            Ok(reading) => store.record(reading),
            Err(err) => warn!(line = command, error = %err, "discarding reading"),
        }
    }

    Ok(())
}

/// Read one line into `buf`, at most `MAX_LINE_LEN` bytes of it.
///
/// Returns `None` at end of stream and `Some(true)` when the line was cut at
/// the cap; the rest of an over-long line is read and dropped.
async fn read_capped_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<bool>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let n = (&mut *reader)
        .take(MAX_LINE_LEN as u64)
        .read_until(b'\n', buf)
        .await?;
    if n == 0 {
        return Ok(None);
    }
    if n < MAX_LINE_LEN || buf.last() == Some(&b'\n') {
        return Ok(Some(false));
    }

    let mut rest = Vec::new();
    loop {
        rest.clear();
        let n = (&mut *reader)
            .take(MAX_LINE_LEN as u64)
            .read_until(b'\n', &mut rest)
            .await?;
        if n == 0 || rest.last() == Some(&b'\n') {
            return Ok(Some(true));
        }
    }
}

/// Split `"<hand> <hex>"` into a hand and a raw frame.
pub fn parse_command(line: &str) -> GloveResult<(Hand, u16)> {
    let (hand, payload) = line
        .split_once(' ')
        .ok_or_else(|| GloveError::malformed(line, "expected '<hand> <hex frame>'"))?;

    let hand = match hand {
        "r" => Hand::Right,
        "l" => Hand::Left,
        other => {
            return Err(GloveError::malformed(
                line,
                format!("unknown hand '{}' (expected 'r' or 'l')", other),
            ))
        }
    };

    let payload = payload.trim();
    let digits = payload
        .strip_prefix("0x")
        .or_else(|| payload.strip_prefix("0X"))
        .unwrap_or(payload);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(GloveError::malformed(line, "bad hex frame: expected hex digits"));
    }
    let raw = u16::from_str_radix(digits, 16)
        .map_err(|err| GloveError::malformed(line, format!("bad hex frame: {}", err)))?;

    Ok((hand, raw))
}
