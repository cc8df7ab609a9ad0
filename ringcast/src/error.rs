//! Error types for queue operations.

use thiserror::Error;

/// Error type for multicast queue operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Registration attempted beyond the configured subscriber limit.
    #[error("registry full: at most {max_subscribers} subscribers allowed")]
    RegistryFull {
        /// Configured subscriber limit.
        max_subscribers: usize,
    },

    /// Registration attempted after the registration window closed.
    #[error("registration closed: late subscribers cannot join")]
    RegistrationClosed,

    /// A batch was started while the registration window is still open.
    #[error("registration still open: close it before producing")]
    RegistrationOpen,

    /// Registration closed with no subscribers; batches would never drain.
    #[error("no subscribers registered")]
    NoSubscribers,

    /// The ring is full of batches not yet consumed by the slowest
    /// subscriber (Reject policy only).
    #[error("overrun: slot {slot} still has unconsumed data")]
    Overrun {
        /// Ring slot index that has not drained.
        slot: usize,
    },

    /// Batch payload exceeds the fixed maximum length.
    #[error("batch too large: {len} bytes, maximum {max}")]
    BatchTooLarge {
        /// Attempted payload length in bytes.
        len: usize,
        /// Maximum payload length in bytes.
        max: usize,
    },

    /// A timed wait elapsed before a batch became available.
    #[error("wait timed out")]
    Timeout,

    /// Invalid builder configuration.
    #[error("invalid configuration: {message}")]
    Config {
        /// What was wrong with the configuration.
        message: String,
    },
}

/// Result type alias for multicast queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;
