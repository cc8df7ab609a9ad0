//! Multicast fan-out demo: one producer, four consumer threads.
//!
//! Run with: `cargo run --example fanout`

use ringcast::{Delivery, MulticastQueue, OverrunPolicy};
use std::thread;
use std::time::Duration;

const NUM_CONSUMERS: usize = 4;
const NUM_BATCHES: u64 = 128;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut queue = MulticastQueue::builder()
        .capacity(8)
        .max_subscribers(NUM_CONSUMERS)
        .overrun_policy(OverrunPolicy::Block)
        .build()?;

    let mut consumers = Vec::new();
    for n in 0..NUM_CONSUMERS {
        let mut sub = queue.register()?;
        consumers.push(thread::spawn(move || {
            println!("[consumer {n}] started");
            let mut received = 0u64;
            loop {
                match sub.wait_for_batch() {
                    Ok(Delivery::Batch(view)) => {
                        received += 1;
                        if view.sequence() % 32 == 0 {
                            println!(
                                "[consumer {n}] batch {} ({} bytes)",
                                view.sequence(),
                                view.len()
                            );
                        }
                    }
                    Ok(Delivery::Paused) => break,
                    Err(e) => {
                        eprintln!("[consumer {n}] error: {e}");
                        break;
                    }
                }
            }
            received
        }));
    }
    queue.close_registration();

    for i in 0..NUM_BATCHES {
        let mut batch = queue.start_batch()?;
        batch.write(&i.to_le_bytes())?;
        batch.submit();
    }

    // Let every consumer drain before signalling shutdown; pause is
    // the cooperative stop signal.
    while !queue.is_empty() {
        thread::sleep(Duration::from_millis(1));
    }
    queue.set_paused(true);

    for (n, consumer) in consumers.into_iter().enumerate() {
        let received = consumer.join().expect("consumer panicked");
        println!("consumer {n} received {received} batches");
    }

    println!("done: {NUM_BATCHES} batches fanned out to {NUM_CONSUMERS} consumers");
    Ok(())
}
