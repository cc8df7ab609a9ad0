//! Consumer-side handle and the batch view guard.

use crate::error::{QueueError, Result};
use crate::queue::Shared;
use crate::registry::SubscriberId;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of a wait: either a batch or the cooperative pause signal.
pub enum Delivery<'a> {
    /// A batch, valid while the view is held.
    Batch(BatchView<'a>),
    /// Delivery is paused. Not an error and no side effects occurred:
    /// nothing was consumed and no cursor moved.
    Paused,
}

/// One subscriber's handle onto the queue.
///
/// Each handle owns a private cursor of the next position to read, so
/// subscribers lag independently (up to ring capacity) and observe
/// every batch exactly once, in submission order. Handles are `Send`
/// but deliberately not `Clone`: one registration, one consumer.
pub struct Subscriber {
    shared: Arc<Shared>,
    id: SubscriberId,
    pos: u64,
}

impl Subscriber {
    pub(crate) fn new(shared: Arc<Shared>, id: SubscriberId, pos: u64) -> Self {
        Self { shared, id, pos }
    }

    /// This subscriber's identity.
    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Blocks until a batch is available or delivery is paused.
    ///
    /// The pause check comes first: a paused queue yields
    /// [`Delivery::Paused`] immediately, even with batches pending.
    /// The wait loop re-checks its predicate on every wake, with the
    /// queue lock held across each check-and-wait.
    pub fn wait_for_batch(&mut self) -> Result<Delivery<'_>> {
        {
            let mut state = self.shared.state.lock();
            if state.paused {
                return Ok(Delivery::Paused);
            }
            while self.pos == state.tail {
                self.shared.cond.wait(&mut state);
                if state.paused {
                    return Ok(Delivery::Paused);
                }
            }
            debug_assert!(state.tail - self.pos <= self.shared.capacity());
        }
        Ok(self.take_next())
    }

    /// Like [`wait_for_batch`](Self::wait_for_batch) but gives up
    /// after `timeout`.
    ///
    /// # Errors
    /// [`QueueError::Timeout`] if nothing arrived in time.
    pub fn wait_for_batch_timeout(&mut self, timeout: Duration) -> Result<Delivery<'_>> {
        let deadline = Instant::now() + timeout;
        {
            let mut state = self.shared.state.lock();
            if state.paused {
                return Ok(Delivery::Paused);
            }
            while self.pos == state.tail {
                if self.shared.cond.wait_until(&mut state, deadline).timed_out() {
                    return Err(QueueError::Timeout);
                }
                if state.paused {
                    return Ok(Delivery::Paused);
                }
            }
        }
        Ok(self.take_next())
    }

    /// Non-blocking probe: `None` if no batch is available yet.
    pub fn try_next(&mut self) -> Option<Delivery<'_>> {
        {
            let state = self.shared.state.lock();
            if state.paused {
                return Some(Delivery::Paused);
            }
            if self.pos == state.tail {
                return None;
            }
        }
        Some(self.take_next())
    }

    fn take_next(&mut self) -> Delivery<'_> {
        let pos = self.pos;
        self.pos += 1;
        Delivery::Batch(BatchView { sub: self, pos })
    }
}

/// Read guard over one batch payload.
///
/// Holds the subscriber's pending bit on the slot for as long as it is
/// alive, which keeps the producer from reusing the storage under the
/// reader; the mutable borrow of the [`Subscriber`] keeps the view
/// from outliving the consumer's next call into the queue. Dropping
/// the view marks the batch consumed.
pub struct BatchView<'a> {
    sub: &'a Subscriber,
    pos: u64,
}

impl BatchView<'_> {
    /// Sequence number of this batch.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.pos
    }
}

impl Deref for BatchView<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        let slot = self.sub.shared.slot_at(self.pos);
        // Safety: our pending bit is set while the view is alive, so
        // the producer cannot reuse this slot.
        let buf = unsafe { slot.payload() };
        &buf.data[..buf.len]
    }
}

impl fmt::Debug for BatchView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchView")
            .field("sequence", &self.pos)
            .field("len", &self.len())
            .finish()
    }
}

impl Drop for BatchView<'_> {
    fn drop(&mut self) {
        let bit = self.sub.id.bit();
        let prior = self.sub.shared.slot_at(self.pos).clear_pending_bit(bit);
        debug_assert_ne!(prior & bit, 0);

        // Exactly our own bit left: we were the last outstanding
        // consumer, so the slot retires and head moves.
        if prior == bit {
            self.sub.shared.advance_head(self.pos);
        }
    }
}
