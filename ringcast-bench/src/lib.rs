//! # RingCast Bench
//!
//! Benchmarking utilities for RingCast performance testing.

use ringcast::{MulticastQueue, OverrunPolicy, Result, Subscriber};

/// Builds a closed queue with the given capacity and subscriber count,
/// using backpressure so benchmark loops never hit overrun errors.
pub fn closed_queue(capacity: usize, subscribers: usize) -> Result<(MulticastQueue, Vec<Subscriber>)> {
    let queue = MulticastQueue::builder()
        .capacity(capacity)
        .max_subscribers(subscribers)
        .overrun_policy(OverrunPolicy::Block)
        .build()?;
    let subs = (0..subscribers)
        .map(|_| queue.register())
        .collect::<Result<Vec<_>>>()?;
    queue.close_registration();
    Ok((queue, subs))
}
