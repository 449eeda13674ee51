//! Bluetooth RFCOMM glove link.
//!
//! Each glove is a Bluetooth serial modem. The host polls it by writing a
//! single `'S'` byte; the glove answers with up to 16 bytes carrying eight
//! 16-bit frames (see [`PollFrameUnpacker`] for the byte order). The loop
//! repeats until the stop signal fires or the link fails.
//!
//! A link failure ends only this loop with `ConnectionLost`; there is no
//! reconnect. The stream is shut down on every exit path.
//!
//! The real transport needs the `bluetooth` feature (BlueZ via `bluer`).
//! [`run_link`] works over any byte stream, which is how tests and the
//! `simulate` command drive it.

use std::io;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, trace, warn};

use crate::config::GloveLinkConfig;
use crate::error::{GloveError, GloveResult};
use crate::hardware::finger::Hand;
use crate::hardware::frame::{decode, PollFrameUnpacker, POLL_FRAME_LEN, POLL_REQUEST};
use crate::hardware::store::ReadingStore;
use crate::link::ShutdownRx;

/// Connect to the glove described by `link` and poll it until stopped.
#[cfg(feature = "bluetooth")]
pub async fn run_glove_link(
    link: GloveLinkConfig,
    store: Arc<ReadingStore>,
    shutdown_rx: ShutdownRx,
) -> GloveResult<()> {
    let label = link.label();
    let stream = connect(&link).await?;
    info!(hand = %link.hand, "Connected with {}", label);
    run_link(stream, link.hand, &label, store, shutdown_rx).await
}

#[cfg(not(feature = "bluetooth"))]
pub async fn run_glove_link(
    link: GloveLinkConfig,
    _store: Arc<ReadingStore>,
    _shutdown_rx: ShutdownRx,
) -> GloveResult<()> {
    warn!(
        "{}: bluetooth feature disabled - glove links cannot run without RFCOMM support",
        link.label()
    );
    Err(GloveError::FeatureNotEnabled("bluetooth".to_string()))
}

#[cfg(feature = "bluetooth")]
async fn connect(link: &GloveLinkConfig) -> GloveResult<bluer::rfcomm::Stream> {
    let address: bluer::Address = link.address.parse().map_err(|_| {
        GloveError::Configuration(format!("Invalid device address '{}'", link.address))
    })?;
    let target = bluer::rfcomm::SocketAddr::new(address, link.channel);

    bluer::rfcomm::Stream::connect(target)
        .await
        .map_err(|source| GloveError::ConnectionLost {
            link: link.label(),
            source,
        })
}

/// Poll an already-connected glove stream, then shut the stream down.
pub async fn run_link<S>(
    mut stream: S,
    hand: Hand,
    label: &str,
    store: Arc<ReadingStore>,
    mut shutdown_rx: ShutdownRx,
) -> GloveResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let result = poll_loop(&mut stream, hand, label, &store, &mut shutdown_rx).await;

    if let Err(err) = stream.shutdown().await {
        debug!(link = label, error = %err, "shutdown after close");
    }
    info!(link = label, "Link closed");
    result
}

/// Request, receive and decode frames until stopped or the link fails.
pub async fn poll_loop<S>(
    stream: &mut S,
    hand: Hand,
    label: &str,
    store: &ReadingStore,
    shutdown_rx: &mut ShutdownRx,
) -> GloveResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let lost = |source| GloveError::ConnectionLost {
        link: label.to_string(),
        source,
    };

    let mut unpacker = PollFrameUnpacker::new();
    let mut buf = [0u8; POLL_FRAME_LEN];

    loop {
        let received = tokio::select! {
            biased;
            _ = &mut *shutdown_rx => {
                debug!(link = label, "stop requested");
                return Ok(());
            }
            received = request_frame(stream, &mut buf) => received.map_err(lost)?,
        };

        if received == 0 {
            return Err(lost(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "glove closed the link",
            )));
        }
        trace!(link = label, raw = ?&buf[..received], "poll response");

        for value in unpacker.push(&buf[..received]) {
            match decode(hand, value) {
                Ok(reading) => store.record(reading),
                Err(err) => warn!(link = label, raw = value, error = %err, "discarding reading"),
            }
        }
    }
}

async fn request_frame<S>(stream: &mut S, buf: &mut [u8]) -> io::Result<usize>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(&[POLL_REQUEST]).await?;
    stream.flush().await?;
    stream.read(buf).await
}
