//! The multicast queue: slot store, cursor pair, pause flag and the
//! producer-side entry points.
//!
//! One mutex guards the cursor pair, the pause flag and the registry;
//! one condition variable covers both wake directions (consumers
//! waiting for data, a producer waiting for backpressure to release).
//! Per-slot pending masks are atomics and are mutated outside the
//! lock.

use crate::error::{QueueError, Result};
use crate::producer::BatchWriter;
use crate::registry::{MAX_SUBSCRIBERS, Registry};
use crate::slot::Slot;
use crate::subscriber::Subscriber;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

/// What the producer does when the ring is full of batches the slowest
/// subscriber has not drained.
///
/// Silent overwrite of unconsumed data is not an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverrunPolicy {
    /// `start_batch` returns [`QueueError::Overrun`] without writing;
    /// the caller decides whether to drop, retry or shed load.
    #[default]
    Reject,
    /// `start_batch` blocks until the slot drains (backpressure).
    Block,
}

/// Cursor and membership state, all guarded by the queue mutex.
pub(crate) struct CursorState {
    /// Next position the producer will write. Sole writer: `submit`.
    pub(crate) tail: u64,
    /// Oldest position not yet consumed by every subscriber. Advanced
    /// only by the consumer that cleared the last pending bit.
    pub(crate) head: u64,
    pub(crate) paused: bool,
    pub(crate) registry: Registry,
}

/// State shared between the queue and its subscriber handles.
pub(crate) struct Shared {
    pub(crate) slots: Box<[Slot]>,
    pub(crate) state: Mutex<CursorState>,
    pub(crate) cond: Condvar,
    policy: OverrunPolicy,
}

impl Shared {
    pub(crate) fn capacity(&self) -> u64 {
        self.slots.len() as u64
    }

    pub(crate) fn slot_at(&self, pos: u64) -> &Slot {
        &self.slots[(pos % self.capacity()) as usize]
    }

    /// Retires the slot at `pos`. Called by the consumer that cleared
    /// the last pending bit; wakes a producer blocked on backpressure.
    pub(crate) fn advance_head(&self, pos: u64) {
        let mut state = self.state.lock();
        debug_assert_eq!(state.head, pos);
        state.head += 1;
        drop(state);
        self.cond.notify_all();
    }
}

/// Builder for [`MulticastQueue`].
///
/// Defaults: capacity 8, at most 4 subscribers, [`OverrunPolicy::Reject`].
#[derive(Debug, Clone)]
pub struct QueueBuilder {
    capacity: usize,
    max_subscribers: usize,
    overrun_policy: OverrunPolicy,
}

impl QueueBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            capacity: 8,
            max_subscribers: 4,
            overrun_policy: OverrunPolicy::default(),
        }
    }

    /// Sets the number of ring slots. Fixed for the queue's lifetime.
    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the subscriber limit (at most [`MAX_SUBSCRIBERS`]).
    #[must_use]
    pub fn max_subscribers(mut self, max_subscribers: usize) -> Self {
        self.max_subscribers = max_subscribers;
        self
    }

    /// Sets the overrun policy.
    #[must_use]
    pub fn overrun_policy(mut self, policy: OverrunPolicy) -> Self {
        self.overrun_policy = policy;
        self
    }

    /// Builds the queue.
    ///
    /// # Errors
    /// Returns [`QueueError::Config`] if capacity is zero or the
    /// subscriber limit is zero or above [`MAX_SUBSCRIBERS`].
    pub fn build(self) -> Result<MulticastQueue> {
        if self.capacity == 0 {
            return Err(QueueError::Config {
                message: "capacity must be at least 1".into(),
            });
        }
        if self.max_subscribers == 0 || self.max_subscribers > MAX_SUBSCRIBERS {
            return Err(QueueError::Config {
                message: format!("max_subscribers must be in 1..={MAX_SUBSCRIBERS}"),
            });
        }

        let slots: Box<[Slot]> = (0..self.capacity).map(|_| Slot::new()).collect();
        Ok(MulticastQueue {
            shared: Arc::new(Shared {
                slots,
                state: Mutex::new(CursorState {
                    tail: 0,
                    head: 0,
                    paused: false,
                    registry: Registry::new(self.max_subscribers),
                }),
                cond: Condvar::new(),
                policy: self.overrun_policy,
            }),
        })
    }
}

impl Default for QueueBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-capacity multicast queue: one producer, N subscribers, every
/// batch delivered to every subscriber without payload copies.
///
/// The queue value is the producer side. Subscriber handles keep the
/// shared state alive independently, so the queue can be moved to a
/// producer thread after registration.
///
/// Teardown is deterministic: the shared state lives until the queue
/// and every subscriber handle have been dropped, so a consumer can
/// never be left blocked inside freed storage.
pub struct MulticastQueue {
    shared: Arc<Shared>,
}

impl MulticastQueue {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn builder() -> QueueBuilder {
        QueueBuilder::new()
    }

    /// Registers a new subscriber.
    ///
    /// Must happen before [`close_registration`](Self::close_registration);
    /// the membership a batch is delivered to is the membership at
    /// close time.
    ///
    /// # Errors
    /// [`QueueError::RegistryFull`] past the configured limit,
    /// [`QueueError::RegistrationClosed`] after the window closed.
    pub fn register(&self) -> Result<Subscriber> {
        let mut state = self.shared.state.lock();
        let id = state.registry.register()?;
        let pos = state.tail;
        drop(state);

        tracing::debug!(subscriber = id.index(), "subscriber registered");
        Ok(Subscriber::new(Arc::clone(&self.shared), id, pos))
    }

    /// Closes the registration window and freezes the membership.
    ///
    /// Production is rejected until this has been called; registration
    /// is rejected afterwards.
    pub fn close_registration(&self) {
        let mut state = self.shared.state.lock();
        state.registry.close();
        let (count, mask) = (state.registry.count(), state.registry.live_mask());
        drop(state);

        tracing::debug!(subscribers = count, mask, "registration closed");
    }

    /// Whether the registration window is still open.
    #[must_use]
    pub fn is_registration_open(&self) -> bool {
        self.shared.state.lock().registry.is_open()
    }

    /// Starts a batch in the slot at `tail`, returning a writer with
    /// exclusive access to it. Dropping the writer without submitting
    /// abandons the batch with no state change.
    ///
    /// With [`OverrunPolicy::Block`] this waits while the ring is full;
    /// with [`OverrunPolicy::Reject`] a full ring is an error.
    ///
    /// # Errors
    /// [`QueueError::RegistrationOpen`] before the window closed,
    /// [`QueueError::NoSubscribers`] if it closed empty,
    /// [`QueueError::Overrun`] under the Reject policy.
    pub fn start_batch(&mut self) -> Result<BatchWriter<'_>> {
        let capacity = self.shared.capacity();
        let mut state = self.shared.state.lock();

        if state.registry.is_open() {
            return Err(QueueError::RegistrationOpen);
        }
        if state.registry.live_mask() == 0 {
            return Err(QueueError::NoSubscribers);
        }

        match self.shared.policy {
            OverrunPolicy::Block => {
                while state.tail - state.head == capacity {
                    self.shared.cond.wait(&mut state);
                }
            }
            OverrunPolicy::Reject => {
                if state.tail - state.head == capacity {
                    let slot = (state.tail % capacity) as usize;
                    tracing::warn!(slot, "overrun: slowest subscriber has not drained");
                    return Err(QueueError::Overrun { slot });
                }
            }
        }

        let pos = state.tail;
        drop(state);

        // The previous pending set must have drained before the slot
        // is handed back to the producer.
        debug_assert_eq!(self.shared.slot_at(pos).pending_mask(), 0);
        Ok(BatchWriter::new(&self.shared, pos))
    }

    /// Pauses or resumes delivery.
    ///
    /// Pause governs delivery only: consumers get
    /// [`Delivery::Paused`](crate::subscriber::Delivery::Paused)
    /// instead of batches, while production stays available. In-flight
    /// slot state is preserved; after resume, consumers drain anything
    /// published before or during the pause.
    pub fn set_paused(&self, paused: bool) {
        let mut state = self.shared.state.lock();
        state.paused = paused;
        drop(state);

        tracing::debug!(paused, "pause state changed");
        self.shared.cond.notify_all();
    }

    /// Whether delivery is currently paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.shared.state.lock().paused
    }

    /// Number of ring slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.shared.slots.len()
    }

    /// Number of batches not yet consumed by every subscriber.
    #[must_use]
    pub fn len(&self) -> usize {
        let state = self.shared.state.lock();
        (state.tail - state.head) as usize
    }

    /// True if every published batch has been consumed by every
    /// subscriber.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.shared.state.lock().registry.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let queue = MulticastQueue::builder().build().unwrap();
        assert_eq!(queue.capacity(), 8);
        assert!(queue.is_registration_open());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_builder_rejects_zero_capacity() {
        let result = MulticastQueue::builder().capacity(0).build();
        assert!(matches!(result, Err(QueueError::Config { .. })));
    }

    #[test]
    fn test_builder_rejects_bad_subscriber_limit() {
        let result = MulticastQueue::builder().max_subscribers(0).build();
        assert!(matches!(result, Err(QueueError::Config { .. })));

        let result = MulticastQueue::builder().max_subscribers(33).build();
        assert!(matches!(result, Err(QueueError::Config { .. })));
    }

    #[test]
    fn test_produce_before_close_rejected() {
        let mut queue = MulticastQueue::builder().build().unwrap();
        let _sub = queue.register().unwrap();
        assert!(matches!(
            queue.start_batch(),
            Err(QueueError::RegistrationOpen)
        ));
    }

    #[test]
    fn test_produce_with_no_subscribers_rejected() {
        let mut queue = MulticastQueue::builder().build().unwrap();
        queue.close_registration();
        assert!(matches!(queue.start_batch(), Err(QueueError::NoSubscribers)));
    }

    #[test]
    fn test_register_after_close_rejected() {
        let queue = MulticastQueue::builder().build().unwrap();
        let _sub = queue.register().unwrap();
        queue.close_registration();
        assert!(matches!(
            queue.register(),
            Err(QueueError::RegistrationClosed)
        ));
    }

    #[test]
    fn test_registry_limit_enforced() {
        let queue = MulticastQueue::builder().max_subscribers(1).build().unwrap();
        let _sub = queue.register().unwrap();
        assert!(matches!(
            queue.register(),
            Err(QueueError::RegistryFull { max_subscribers: 1 })
        ));
    }

    #[test]
    fn test_pause_flag() {
        let queue = MulticastQueue::builder().build().unwrap();
        assert!(!queue.is_paused());
        queue.set_paused(true);
        assert!(queue.is_paused());
        queue.set_paused(false);
        assert!(!queue.is_paused());
    }
}
