//! Mock Glove
//!
//! Simulated glove speaking the Bluetooth poll protocol over an in-memory
//! duplex stream. All timing uses `tokio::time::sleep`, never `std::thread::sleep`.
//!
//! # Modes
//!
//! - `MockGlove::scripted` - replies to each poll with the next scripted
//!   16-byte response, then disconnects (or goes silent with `hold_when_done`)
//! - `MockGlove::sweep` - endless triangle-wave flex on all five fingers,
//!   used by the `simulate` command
//!
//! # Example
//!
//! ```rust,ignore
//! let (stream, glove) = MockGlove::scripted(vec![frame]).spawn();
//! // `stream` is the host side; hand it to the RFCOMM poll loop.
//! ```

use std::collections::VecDeque;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

use crate::hardware::finger::FINGERS_PER_HAND;
use crate::hardware::frame::{
    pack_poll_frame, RawFrame, MAX_MAGNITUDE, POLL_FRAME_LEN, POLL_REQUEST, READINGS_PER_POLL,
};

/// In-memory pipe capacity; comfortably above one response.
const PIPE_CAPACITY: usize = 256;

/// Phase advance per sweep response.
const SWEEP_STEP: u32 = 96;

/// Phase spacing between neighbouring fingers in sweep mode.
const SWEEP_FINGER_SPACING: u32 = 820;

enum Script {
    Frames(VecDeque<[u8; POLL_FRAME_LEN]>),
    Sweep { phase: u32 },
}

/// Simulated glove device
pub struct MockGlove {
    script: Script,
    frame_delay: Duration,
    chunk_size: usize,
    hold_when_done: bool,
}

impl MockGlove {
    /// Reply to successive polls with `frames`, then close the link.
    pub fn scripted(frames: Vec<[u8; POLL_FRAME_LEN]>) -> Self {
        Self {
            script: Script::Frames(frames.into()),
            frame_delay: Duration::ZERO,
            chunk_size: POLL_FRAME_LEN,
            hold_when_done: false,
        }
    }

    /// Endless flex sweep, one response every 20ms.
    pub fn sweep() -> Self {
        Self {
            script: Script::Sweep { phase: 0 },
            frame_delay: Duration::from_millis(20),
            chunk_size: POLL_FRAME_LEN,
            hold_when_done: false,
        }
    }

    /// Delay between receiving a poll and answering it.
    pub fn with_frame_delay(mut self, delay: Duration) -> Self {
        self.frame_delay = delay;
        self
    }

    /// Deliver each response in writes of at most `size` bytes.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.clamp(1, POLL_FRAME_LEN);
        self
    }

    /// Keep the link open but stop answering once the script runs out.
    pub fn hold_when_done(mut self) -> Self {
        self.hold_when_done = true;
        self
    }

    /// Start serving; returns the host end of the link.
    pub fn spawn(self) -> (DuplexStream, JoinHandle<()>) {
        let (host, device) = tokio::io::duplex(PIPE_CAPACITY);
        let task = tokio::spawn(self.serve(device));
        (host, task)
    }

    async fn serve(mut self, mut stream: DuplexStream) {
        let mut request = [0u8; 1];
        loop {
            match stream.read(&mut request).await {
                Ok(0) | Err(_) => {
                    debug!("MockGlove: host closed the link");
                    return;
                }
                Ok(_) if request[0] != POLL_REQUEST => {
                    warn!("MockGlove: ignoring unexpected byte {:#04x}", request[0]);
                    continue;
                }
                Ok(_) => {}
            }

            let Some(frame) = self.next_frame() else {
                if self.hold_when_done {
                    debug!("MockGlove: script finished, holding link open");
                    // Drain polls without answering until the host hangs up.
                    while matches!(stream.read(&mut request).await, Ok(n) if n > 0) {}
                } else {
                    debug!("MockGlove: script finished, disconnecting");
                }
                return;
            };

            if !self.frame_delay.is_zero() {
                sleep(self.frame_delay).await;
            }

            for chunk in frame.chunks(self.chunk_size) {
                if stream.write_all(chunk).await.is_err() {
                    return;
                }
                tokio::task::yield_now().await;
            }
        }
    }

    fn next_frame(&mut self) -> Option<[u8; POLL_FRAME_LEN]> {
        match &mut self.script {
            Script::Frames(frames) => frames.pop_front(),
            Script::Sweep { phase } => {
                let values: [u16; READINGS_PER_POLL] = std::array::from_fn(|k| {
                    let finger = (k % FINGERS_PER_HAND as usize) as u8;
                    let offset = u32::from(finger) * SWEEP_FINGER_SPACING;
                    RawFrame::new(finger, triangle(*phase + offset)).0
                });
                *phase = phase.wrapping_add(SWEEP_STEP);
                Some(pack_poll_frame(&values))
            }
        }
    }
}

/// Triangle wave over 0..=MAX_MAGNITUDE.
fn triangle(phase: u32) -> u16 {
    let span = u32::from(MAX_MAGNITUDE);
    let period = 2 * span;
    let t = phase % period;
    let value = if t <= span { t } else { period - t };
    value as u16
}
