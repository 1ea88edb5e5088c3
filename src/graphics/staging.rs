//! Staging buffer pool
//!
//! Host-to-device transfers go through a pool of fixed-size buffers created
//! with `MAP_WRITE | COPY_SRC` and `mapped_at_creation`. Every buffer walks
//! the same cycle:
//!
//! ```text
//! Mapped -> (host write) -> Unmapped/submitted -> GPU copy reads it
//!        -> remap requested -> remap resolves -> back on the free list
//! ```
//!
//! The free list holds only mapped, immediately-writable buffers. A buffer
//! re-enters it when its asynchronous remap *resolves*, never when
//! [`StagingBufferPool::recycle`] is called — reusing a buffer before the
//! remap completes would race a still-in-flight GPU read against a new host
//! write. Because the current frame's CPU work never waits on a previous
//! frame's GPU completion, several buffers may be in flight at once; the
//! pool grows lazily up to a configured cap and fails past it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

/// Errors surfaced by the staging pool. Both are fatal to the frame that
/// hit them; there is no retry policy.
#[derive(Debug, Error)]
pub enum StagingError {
    /// Payload length does not match the staging buffer capacity.
    #[error("payload is {actual} bytes, staging buffers hold exactly {expected}")]
    PayloadSize { expected: usize, actual: usize },

    /// Every permitted buffer is already in flight.
    #[error("staging pool exhausted: all {cap} buffers are in flight")]
    PoolExhausted { cap: usize },
}

/// LIFO free list shared between the pool and in-flight remap callbacks.
///
/// wgpu may invoke `map_async` callbacks outside the frame-loop thread
/// while the device makes progress, so pushes are mutex-guarded. `live`
/// counts buffers that exist at all (idle or in flight).
struct FreeList<T> {
    idle: Mutex<Vec<T>>,
    live: AtomicUsize,
}

impl<T> FreeList<T> {
    fn new() -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            live: AtomicUsize::new(0),
        }
    }

    fn guard(&self) -> MutexGuard<'_, Vec<T>> {
        // A poisoned lock only means a callback panicked mid-push; the Vec
        // itself is still coherent, so keep going rather than panicking on
        // wgpu's callback thread.
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pop the most-recently-returned item (LIFO).
    fn pop(&self) -> Option<T> {
        self.guard().pop()
    }

    fn push(&self, item: T) {
        self.guard().push(item);
    }

    fn idle_len(&self) -> usize {
        self.guard().len()
    }

    fn live(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    /// Claim capacity for a new item if fewer than `cap` are live.
    ///
    /// Only the frame-loop thread reserves; callbacks only decrement via
    /// [`note_discarded`](Self::note_discarded), so a stale load can only
    /// under-count and the cap is never overshot.
    fn try_reserve(&self, cap: usize) -> bool {
        if self.live.load(Ordering::Relaxed) >= cap {
            return false;
        }
        self.live.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Record that an in-flight item was dropped instead of returned.
    fn note_discarded(&self) {
        self.live.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Pool of reusable, asynchronously-remapped staging buffers.
///
/// Single-owner on the frame-loop side; the shared free list is the only
/// state touched from wgpu callback context.
pub struct StagingBufferPool {
    shared: Arc<FreeList<wgpu::Buffer>>,
    /// Capacity of every buffer in bytes (texture width x height x 4).
    buffer_size: u64,
    /// Hard cap on concurrently live buffers (bounded-pool policy: fail).
    max_buffers: usize,
}

impl StagingBufferPool {
    pub fn new(buffer_size: u64, max_buffers: usize) -> Self {
        Self {
            shared: Arc::new(FreeList::new()),
            buffer_size,
            max_buffers: max_buffers.max(1),
        }
    }

    /// Hand out a buffer guaranteed to be mapped and safe to write.
    ///
    /// Pops the most recently recycled buffer if one is idle, otherwise
    /// allocates a new one mapped at creation. Fails once `max_buffers`
    /// buffers are live and none are idle.
    pub fn acquire(&self, device: &wgpu::Device) -> Result<wgpu::Buffer, StagingError> {
        if let Some(buffer) = self.shared.pop() {
            return Ok(buffer);
        }

        if !self.shared.try_reserve(self.max_buffers) {
            return Err(StagingError::PoolExhausted {
                cap: self.max_buffers,
            });
        }

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Staging Buffer"),
            size: self.buffer_size,
            usage: wgpu::BufferUsages::MAP_WRITE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: true,
        });
        tracing::debug!(
            "Allocated staging buffer {}/{} ({} bytes)",
            self.shared.live(),
            self.max_buffers,
            self.buffer_size
        );
        Ok(buffer)
    }

    /// Copy one frame payload into a mapped staging buffer, then unmap it.
    ///
    /// The buffer must come from [`acquire`](Self::acquire) this frame (the
    /// pool only hands out mapped buffers). After this returns the buffer
    /// is submit-ready and must not be written again until it has been
    /// recycled and remapped.
    pub fn write_payload(
        &self,
        buffer: &wgpu::Buffer,
        payload: &[u8],
    ) -> Result<(), StagingError> {
        validate_payload_len(self.buffer_size, payload.len())?;

        {
            let mut mapped = buffer.slice(..).get_mapped_range_mut();
            mapped.copy_from_slice(payload);
        }
        buffer.unmap();
        Ok(())
    }

    /// Hand a submitted buffer back to the pool.
    ///
    /// Must be called after the GPU work reading the buffer has been
    /// submitted. Issues the remap request; the buffer re-enters the free
    /// list when the remap callback resolves. A failed remap discards the
    /// buffer instead of poisoning the free list. If the pool was dropped
    /// while the buffer was in flight, the callback lets the buffer die.
    pub fn recycle(&self, buffer: wgpu::Buffer) {
        let shared = Arc::downgrade(&self.shared);
        let returned = buffer.clone();
        buffer
            .slice(..)
            .map_async(wgpu::MapMode::Write, move |result| {
                let Some(list) = shared.upgrade() else {
                    return;
                };
                match result {
                    Ok(()) => list.push(returned),
                    Err(e) => {
                        tracing::error!("Staging buffer remap failed, discarding buffer: {e}");
                        list.note_discarded();
                    }
                }
            });
    }

    /// Drop a buffer without returning it to the pool.
    ///
    /// For buffers that failed between acquire and submit; releases the
    /// buffer's slot against the cap so the live count stays accurate.
    pub fn discard(&self, buffer: wgpu::Buffer) {
        drop(buffer);
        self.shared.note_discarded();
    }

    /// Capacity of each pooled buffer in bytes.
    pub fn buffer_size(&self) -> u64 {
        self.buffer_size
    }

    /// Buffers currently idle on the free list (mapped, ready to write).
    pub fn idle(&self) -> usize {
        self.shared.idle_len()
    }

    /// Total buffers currently alive, idle or in flight.
    pub fn allocated(&self) -> usize {
        self.shared.live()
    }

    /// Buffers handed out and not yet returned by a resolved remap.
    pub fn in_flight(&self) -> usize {
        self.allocated().saturating_sub(self.idle())
    }
}

fn validate_payload_len(expected: u64, actual: usize) -> Result<(), StagingError> {
    if actual as u64 != expected {
        return Err(StagingError::PayloadSize {
            expected: expected as usize,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_list_is_lifo() {
        let list = FreeList::new();
        list.push(1u32);
        list.push(2);
        list.push(3);
        assert_eq!(list.pop(), Some(3));
        assert_eq!(list.pop(), Some(2));
        list.push(4);
        assert_eq!(list.pop(), Some(4));
        assert_eq!(list.pop(), Some(1));
        assert_eq!(list.pop(), None);
    }

    #[test]
    fn cold_start_pops_nothing() {
        let list: FreeList<u32> = FreeList::new();
        assert_eq!(list.pop(), None);
        assert_eq!(list.live(), 0);
        assert_eq!(list.idle_len(), 0);
    }

    /// Two acquires before any remap resolves must account for two distinct
    /// live buffers with nothing idle.
    #[test]
    fn concurrent_acquires_are_distinct() {
        let list: FreeList<u32> = FreeList::new();

        // Frame 1: free list empty -> allocate
        assert_eq!(list.pop(), None);
        assert!(list.try_reserve(4));
        // Frame 2: still nothing recycled -> allocate again
        assert_eq!(list.pop(), None);
        assert!(list.try_reserve(4));

        assert_eq!(list.live(), 2);
        assert_eq!(list.idle_len(), 0);
    }

    /// With every permitted buffer in flight and nothing idle, a further
    /// reserve must be refused until a slot is given back.
    #[test]
    fn cap_refuses_reserve_when_all_buffers_in_flight() {
        let list: FreeList<u32> = FreeList::new();

        assert!(list.try_reserve(2));
        assert!(list.try_reserve(2));
        assert!(!list.try_reserve(2));
        assert_eq!(list.live(), 2);

        // Discarding an in-flight buffer frees its cap slot
        list.note_discarded();
        assert!(list.try_reserve(2));
        assert!(!list.try_reserve(2));
    }

    /// After a remap resolves the buffer is idle again and a subsequent
    /// acquire reuses it instead of growing the pool.
    #[test]
    fn steady_state_reuses_buffers() {
        let list = FreeList::new();

        assert_eq!(list.pop(), None);
        assert!(list.try_reserve(4));
        let buffer_a = 7u32;

        // write / unmap / submit happen here; remap completion returns it
        list.push(buffer_a);
        assert_eq!(list.live(), 1);
        assert_eq!(list.idle_len(), 1);

        // Next acquire returns A again; pool did not grow.
        assert_eq!(list.pop(), Some(buffer_a));
        assert_eq!(list.live(), 1);
        assert_eq!(list.idle_len(), 0);
    }

    #[test]
    fn failed_remap_discards_buffer() {
        let list: FreeList<u32> = FreeList::new();
        assert!(list.try_reserve(4));
        assert!(list.try_reserve(4));
        list.note_discarded();
        assert_eq!(list.live(), 1);
    }

    #[test]
    fn payload_length_is_exact() {
        assert!(validate_payload_len(16, 16).is_ok());

        let short = validate_payload_len(16, 15).unwrap_err();
        assert!(matches!(
            short,
            StagingError::PayloadSize {
                expected: 16,
                actual: 15
            }
        ));

        let long = validate_payload_len(16, 17).unwrap_err();
        assert!(matches!(long, StagingError::PayloadSize { .. }));
    }

    #[test]
    fn pool_counters_start_empty() {
        let pool = StagingBufferPool::new(64, 4);
        assert_eq!(pool.buffer_size(), 64);
        assert_eq!(pool.idle(), 0);
        assert_eq!(pool.allocated(), 0);
        assert_eq!(pool.in_flight(), 0);
    }

    #[test]
    fn pool_cap_has_floor_of_one() {
        let pool = StagingBufferPool::new(64, 0);
        assert_eq!(pool.max_buffers, 1);
    }

    #[test]
    fn exhausted_error_names_the_cap() {
        let e = StagingError::PoolExhausted { cap: 16 };
        assert_eq!(
            e.to_string(),
            "staging pool exhausted: all 16 buffers are in flight"
        );
    }
}
