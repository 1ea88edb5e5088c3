//! Frame data source
//!
//! Supplies the "next frame's pixel data" on a best-effort cadence. A
//! worker thread flips a single-slot latest-value cell between two
//! precomputed fixed-color frames on its own timer, independent of the
//! frame loop. Readers take a snapshot of whatever is current; they may
//! observe an update mid-cycle or miss one entirely. That inconsistency is
//! part of the contract, not a bug.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::graphics::FRAME_BYTES;

/// The two colors the generator alternates between (RGBA8).
const COLOR_A: [u8; 4] = [230, 90, 40, 255];
const COLOR_B: [u8; 4] = [40, 120, 230, 255];

/// Best-effort source of full-frame RGBA8 payloads.
///
/// `current()` never blocks the frame loop on payload generation; the
/// write lock is held only for a pointer swap.
pub struct FrameSource {
    slot: Arc<RwLock<Arc<[u8]>>>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl FrameSource {
    /// Spawn the generator thread, flipping frames every `period`.
    pub fn start(period: Duration) -> Self {
        let frames = [
            solid_frame(FRAME_BYTES, COLOR_A),
            solid_frame(FRAME_BYTES, COLOR_B),
        ];
        tracing::info!(
            "Frame source started: 2 x {} MB frames, period {:?}",
            FRAME_BYTES / (1024 * 1024),
            period
        );
        Self::with_frames(period, frames)
    }

    fn with_frames(period: Duration, frames: [Arc<[u8]>; 2]) -> Self {
        let slot = Arc::new(RwLock::new(frames[0].clone()));
        let stop = Arc::new(AtomicBool::new(false));

        let worker = {
            let slot = slot.clone();
            let stop = stop.clone();
            thread::Builder::new()
                .name("frame-source".into())
                .spawn(move || {
                    let mut index = 0usize;
                    loop {
                        // Park in slices rather than sleeping out the whole
                        // period so a stop request (which unparks us) is
                        // observed promptly even with a long flip period.
                        let deadline = Instant::now() + period;
                        loop {
                            if stop.load(Ordering::Relaxed) {
                                tracing::debug!("Frame source thread exiting");
                                return;
                            }
                            let now = Instant::now();
                            if now >= deadline {
                                break;
                            }
                            thread::park_timeout(deadline - now);
                        }
                        index ^= 1;
                        *slot.write().unwrap_or_else(PoisonError::into_inner) =
                            frames[index].clone();
                    }
                })
                .expect("failed to spawn frame source thread")
        };

        Self {
            slot,
            stop,
            worker: Some(worker),
        }
    }

    /// Snapshot of the current frame payload.
    ///
    /// Cheap (one lock + one refcount bump); the payload itself is shared,
    /// never copied here. The generator may swap the slot at any time, so
    /// two calls within one frame can disagree — callers take one snapshot
    /// per frame.
    pub fn current(&self) -> Arc<[u8]> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            // Wake the worker out of its park so join returns promptly
            // instead of waiting out the remainder of the flip period.
            worker.thread().unpark();
            let _ = worker.join();
        }
    }
}

/// Build one solid-color frame of `len` bytes (`len` divisible by 4).
fn solid_frame(len: usize, color: [u8; 4]) -> Arc<[u8]> {
    let mut data = vec![0u8; len];
    for px in data.chunks_exact_mut(4) {
        px.copy_from_slice(&color);
    }
    data.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_frame_fills_every_pixel() {
        let frame = solid_frame(4 * 8, [1, 2, 3, 4]);
        assert_eq!(frame.len(), 32);
        for px in frame.chunks_exact(4) {
            assert_eq!(px, [1, 2, 3, 4]);
        }
    }

    #[test]
    fn source_flips_between_frames() {
        let a = solid_frame(4, [10, 10, 10, 255]);
        let b = solid_frame(4, [20, 20, 20, 255]);
        let source = FrameSource::with_frames(Duration::from_millis(1), [a.clone(), b.clone()]);

        // Starts on frame A
        let first = source.current();
        assert_eq!(first[0], 10);

        // Wait for at least one flip; the exact frame observed afterwards is
        // timing-dependent, but it must always be one of the two payloads.
        thread::sleep(Duration::from_millis(10));
        let later = source.current();
        assert!(later[0] == 10 || later[0] == 20);

        drop(source); // joins the worker without hanging
    }

    #[test]
    fn snapshots_share_storage() {
        let a = solid_frame(4, [1, 1, 1, 1]);
        let b = solid_frame(4, [2, 2, 2, 2]);
        let source = FrameSource::with_frames(Duration::from_secs(2), [a.clone(), b]);
        let snap = source.current();
        assert!(Arc::ptr_eq(&snap, &a));
    }

    /// Dropping the source mid-sleep must not wait out the flip period.
    #[test]
    fn drop_returns_promptly_mid_sleep() {
        let a = solid_frame(4, [1, 1, 1, 255]);
        let b = solid_frame(4, [2, 2, 2, 255]);
        let source = FrameSource::with_frames(Duration::from_secs(5), [a, b]);

        // Give the worker time to enter its park before stopping it.
        thread::sleep(Duration::from_millis(100));

        let t0 = Instant::now();
        drop(source);
        assert!(
            t0.elapsed() < Duration::from_millis(500),
            "drop blocked for {:?}",
            t0.elapsed()
        );
    }
}
