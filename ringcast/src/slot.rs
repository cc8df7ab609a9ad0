//! Slot storage for the multicast ring.
//!
//! Each slot holds one batch payload plus a *pending set*: a bitmask
//! in which bit `i` set means subscriber `i` has not yet consumed the
//! slot's current content. The payload is stored once; the pending set
//! is the reference count that retires it.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU32, Ordering};

/// Maximum payload length of a single batch in bytes.
pub const MAX_BATCH_LEN: usize = 128;

/// Fixed-size batch payload plus its occupied length.
pub(crate) struct BatchBuf {
    pub data: [u8; MAX_BATCH_LEN],
    pub len: usize,
}

/// One ring slot: a payload buffer and the pending-subscriber bitmask.
///
/// Access protocol:
/// - The producer writes the payload only while the slot is outside
///   `[head, tail)` and its pending set is empty.
/// - A consumer reads the payload only while its own pending bit is
///   set, and clears exactly that bit when it is done.
/// - The producer replaces the pending set wholesale at publish time;
///   consumers only ever clear their own bit via `fetch_and`.
pub(crate) struct Slot {
    payload: UnsafeCell<BatchBuf>,
    pending: AtomicU32,
}

// The payload is protected by the pending mask plus the queue's cursor
// state: at any time either one producer writes it (pending == 0, slot
// not in [head, tail)) or consumers read it (own bit set). Consumer
// reads are ordered before producer reuse by the AcqRel fetch_and
// chain on `pending` followed by the head advance under the queue
// mutex.
unsafe impl Send for Slot {}
unsafe impl Sync for Slot {}

impl Slot {
    pub(crate) fn new() -> Self {
        Self {
            payload: UnsafeCell::new(BatchBuf {
                data: [0; MAX_BATCH_LEN],
                len: 0,
            }),
            pending: AtomicU32::new(0),
        }
    }

    /// Current pending set.
    pub(crate) fn pending_mask(&self) -> u32 {
        self.pending.load(Ordering::Acquire)
    }

    /// Replaces the pending set wholesale. Producer only, and only for
    /// a slot whose previous pending set has drained.
    pub(crate) fn publish_pending(&self, mask: u32) {
        self.pending.store(mask, Ordering::Release);
    }

    /// Clears one subscriber bit and returns the prior mask. The
    /// caller was the last outstanding consumer iff the prior mask
    /// equals exactly its own bit.
    pub(crate) fn clear_pending_bit(&self, bit: u32) -> u32 {
        self.pending.fetch_and(!bit, Ordering::AcqRel)
    }

    /// Read access to the payload.
    ///
    /// # Safety
    /// The caller's pending bit must be set in this slot's pending
    /// mask, which keeps the producer from reusing the slot.
    pub(crate) unsafe fn payload(&self) -> &BatchBuf {
        unsafe { &*self.payload.get() }
    }

    /// Write access to the payload.
    ///
    /// # Safety
    /// The caller must be the sole producer, the slot's pending mask
    /// must be empty, and the slot must not be inside `[head, tail)`.
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn payload_mut(&self) -> &mut BatchBuf {
        unsafe { &mut *self.payload.get() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_starts_empty() {
        let slot = Slot::new();
        assert_eq!(slot.pending_mask(), 0);
    }

    #[test]
    fn test_publish_and_clear_bits() {
        let slot = Slot::new();
        slot.publish_pending(0b111);

        assert_eq!(slot.clear_pending_bit(0b010), 0b111);
        assert_eq!(slot.pending_mask(), 0b101);

        assert_eq!(slot.clear_pending_bit(0b100), 0b101);
        assert_eq!(slot.clear_pending_bit(0b001), 0b001);
        assert_eq!(slot.pending_mask(), 0);
    }

    #[test]
    fn test_last_consumer_check_is_exact() {
        let slot = Slot::new();
        slot.publish_pending(0b11);

        // First clearer sees another bit outstanding.
        let prior = slot.clear_pending_bit(0b01);
        assert_ne!(prior, 0b01);

        // Second clearer sees exactly its own bit.
        let prior = slot.clear_pending_bit(0b10);
        assert_eq!(prior, 0b10);
    }

    #[test]
    fn test_payload_roundtrip() {
        let slot = Slot::new();
        unsafe {
            let buf = slot.payload_mut();
            buf.data[..5].copy_from_slice(b"hello");
            buf.len = 5;
        }
        let buf = unsafe { slot.payload() };
        assert_eq!(&buf.data[..buf.len], b"hello");
    }
}
