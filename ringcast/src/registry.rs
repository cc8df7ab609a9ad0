//! Subscriber identity assignment and the registration window.
//!
//! Every subscriber gets a unique bit position in the per-slot pending
//! masks. Identities are assigned monotonically and never reused.
//! Registration happens in an explicit window: once [`Registry::close`]
//! runs, the membership is frozen and the initial pending mask for
//! every future batch is fixed. Late joins are rejected rather than
//! racing against batches already in flight.

use crate::error::{QueueError, Result};

/// Hard cap on subscribers, imposed by the `u32` pending mask width.
pub const MAX_SUBSCRIBERS: usize = 32;

/// Opaque subscriber identity: a bit position in the pending masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u8);

impl SubscriberId {
    /// Zero-based index of this subscriber.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// This subscriber's bit in a pending mask.
    pub(crate) fn bit(self) -> u32 {
        1 << self.0
    }
}

/// Tracks membership during the registration window and the frozen
/// mask afterwards.
pub(crate) struct Registry {
    limit: u32,
    count: u32,
    open: bool,
    live_mask: u32,
}

impl Registry {
    pub(crate) fn new(limit: usize) -> Self {
        debug_assert!(limit >= 1 && limit <= MAX_SUBSCRIBERS);
        Self {
            limit: limit as u32,
            count: 0,
            open: true,
            live_mask: 0,
        }
    }

    /// Assigns the next subscriber identity.
    pub(crate) fn register(&mut self) -> Result<SubscriberId> {
        if !self.open {
            return Err(QueueError::RegistrationClosed);
        }
        if self.count == self.limit {
            return Err(QueueError::RegistryFull {
                max_subscribers: self.limit as usize,
            });
        }
        let id = SubscriberId(self.count as u8);
        self.count += 1;
        Ok(id)
    }

    /// Closes the window and freezes the initial pending mask.
    pub(crate) fn close(&mut self) {
        self.open = false;
        self.live_mask = initial_mask(self.count);
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open
    }

    /// Initial pending mask for every batch published after close.
    pub(crate) fn live_mask(&self) -> u32 {
        self.live_mask
    }

    pub(crate) fn count(&self) -> usize {
        self.count as usize
    }
}

/// Closed-form pending mask for identities `[0, count)`.
///
/// The shift is done in 64-bit so `count == 32` stays in range.
fn initial_mask(count: u32) -> u32 {
    ((1u64 << count) - 1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_identities() {
        let mut registry = Registry::new(4);
        for i in 0..4 {
            let id = registry.register().unwrap();
            assert_eq!(id.index(), i);
            assert_eq!(id.bit(), 1 << i);
        }
    }

    #[test]
    fn test_registry_full() {
        let mut registry = Registry::new(2);
        registry.register().unwrap();
        registry.register().unwrap();
        assert_eq!(
            registry.register(),
            Err(QueueError::RegistryFull { max_subscribers: 2 })
        );
    }

    #[test]
    fn test_late_join_rejected() {
        let mut registry = Registry::new(4);
        registry.register().unwrap();
        registry.close();
        assert_eq!(registry.register(), Err(QueueError::RegistrationClosed));
    }

    #[test]
    fn test_mask_frozen_at_close() {
        let mut registry = Registry::new(8);
        registry.register().unwrap();
        registry.register().unwrap();
        registry.register().unwrap();
        assert_eq!(registry.live_mask(), 0);

        registry.close();
        assert_eq!(registry.live_mask(), 0b111);
    }

    #[test]
    fn test_initial_mask_closed_form() {
        assert_eq!(initial_mask(0), 0);
        assert_eq!(initial_mask(1), 0b1);
        assert_eq!(initial_mask(4), 0b1111);
        assert_eq!(initial_mask(32), u32::MAX);
    }
}
