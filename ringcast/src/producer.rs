//! Producer-side batch writer.

use crate::error::{QueueError, Result};
use crate::queue::Shared;
use crate::slot::MAX_BATCH_LEN;

/// Exclusive write access to the slot the next batch occupies.
///
/// Obtained from [`MulticastQueue::start_batch`](crate::queue::MulticastQueue::start_batch).
/// The `&mut` borrow of the queue keeps at most one writer alive, so
/// the slot cannot be aliased while the payload is filled in.
/// [`submit`](Self::submit) publishes the batch; dropping the writer
/// instead abandons it without any queue state change.
pub struct BatchWriter<'a> {
    shared: &'a Shared,
    pos: u64,
}

impl<'a> BatchWriter<'a> {
    pub(crate) fn new(shared: &'a Shared, pos: u64) -> Self {
        Self { shared, pos }
    }

    /// Sequence number this batch will be published under.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.pos
    }

    /// Copies `bytes` into the slot as the batch payload.
    ///
    /// # Errors
    /// [`QueueError::BatchTooLarge`] past [`MAX_BATCH_LEN`].
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > MAX_BATCH_LEN {
            return Err(QueueError::BatchTooLarge {
                len: bytes.len(),
                max: MAX_BATCH_LEN,
            });
        }
        // Safety: sole producer, slot drained and outside [head, tail).
        let buf = unsafe { self.shared.slot_at(self.pos).payload_mut() };
        buf.data[..bytes.len()].copy_from_slice(bytes);
        buf.len = bytes.len();
        Ok(())
    }

    /// Direct access to the full slot buffer, for callers that fill
    /// the payload in place. Pair with [`set_len`](Self::set_len).
    pub fn payload_mut(&mut self) -> &mut [u8] {
        // Safety: sole producer, slot drained and outside [head, tail).
        let buf = unsafe { self.shared.slot_at(self.pos).payload_mut() };
        &mut buf.data
    }

    /// Sets the occupied length after filling the payload in place.
    ///
    /// # Errors
    /// [`QueueError::BatchTooLarge`] past [`MAX_BATCH_LEN`].
    pub fn set_len(&mut self, len: usize) -> Result<()> {
        if len > MAX_BATCH_LEN {
            return Err(QueueError::BatchTooLarge {
                len,
                max: MAX_BATCH_LEN,
            });
        }
        // Safety: sole producer, slot drained and outside [head, tail).
        unsafe { self.shared.slot_at(self.pos).payload_mut() }.len = len;
        Ok(())
    }

    /// Publishes the batch: stores the frozen membership as the slot's
    /// pending set, advances `tail` under the lock and wakes every
    /// blocked consumer. This is the only place `tail` moves.
    pub fn submit(self) {
        let slot = self.shared.slot_at(self.pos);
        let mut state = self.shared.state.lock();
        debug_assert_eq!(state.tail, self.pos);

        let mask = state.registry.live_mask();
        slot.publish_pending(mask);
        state.tail += 1;
        drop(state);

        tracing::trace!(seq = self.pos, mask, "batch submitted");
        self.shared.cond.notify_all();
    }
}
