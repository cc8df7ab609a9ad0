//! # RingCast
//!
//! Fixed-capacity multicast ring queue for single-producer fan-out.
//!
//! A single producer publishes fixed-size batches that are delivered,
//! in order, to every registered subscriber without per-subscriber
//! payload copies. Each ring slot carries a pending-subscriber bitmask
//! that acts as a reference count: the payload is stored once and the
//! last subscriber to clear its bit retires the slot, so fan-out costs
//! O(1) space regardless of subscriber count.
//!
//! ## Features
//!
//! - **Zero-copy fan-out** - one stored payload, N readers
//! - **Exactly-once, in-order delivery** - per-subscriber cursors let
//!   fast subscribers run up to ring capacity ahead of slow ones
//! - **Explicit overrun policy** - reject or apply backpressure;
//!   unconsumed data is never silently overwritten
//! - **Closed registration window** - membership is frozen before
//!   production starts, so every batch has a well-defined audience
//! - **Pause/resume** - cooperative delivery control
//!
//! ## Quick Start
//!
//! ```
//! use ringcast::{Delivery, MulticastQueue};
//!
//! # fn main() -> ringcast::Result<()> {
//! let mut queue = MulticastQueue::builder().capacity(8).build()?;
//! let mut sub = queue.register()?;
//! queue.close_registration();
//!
//! let mut batch = queue.start_batch()?;
//! batch.write(b"hello")?;
//! batch.submit();
//!
//! match sub.wait_for_batch()? {
//!     Delivery::Batch(view) => assert_eq!(&*view, b"hello"),
//!     Delivery::Paused => unreachable!(),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`queue`] - the queue, its builder and the overrun policy
//! - [`producer`] - the batch writer handle
//! - [`subscriber`] - subscriber handles and batch views
//! - [`registry`] - subscriber identities and the registration window
//! - [`slot`] - slot storage constants
//! - [`error`] - error taxonomy

pub mod error;
pub mod producer;
pub mod queue;
pub mod registry;
pub mod slot;
pub mod subscriber;

pub use error::{QueueError, Result};
pub use producer::BatchWriter;
pub use queue::{MulticastQueue, OverrunPolicy, QueueBuilder};
pub use registry::{MAX_SUBSCRIBERS, SubscriberId};
pub use slot::MAX_BATCH_LEN;
pub use subscriber::{BatchView, Delivery, Subscriber};
