//! Fan-out throughput benchmarks.

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use ringcast::Delivery;
use ringcast_bench::closed_queue;
use std::hint::black_box;

fn benchmark_publish_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("multicast_ring");
    group.throughput(Throughput::Elements(1));

    group.bench_function("publish_drain_1_subscriber", |b| {
        let (mut queue, mut subs) = closed_queue(1024, 1).unwrap();
        let sub = &mut subs[0];
        let payload = [7u8; 64];

        b.iter(|| {
            let mut batch = queue.start_batch().unwrap();
            batch.write(black_box(&payload)).unwrap();
            batch.submit();
            match sub.wait_for_batch().unwrap() {
                Delivery::Batch(view) => black_box(view.len()),
                Delivery::Paused => unreachable!(),
            }
        })
    });

    group.bench_function("publish_drain_4_subscribers", |b| {
        let (mut queue, mut subs) = closed_queue(1024, 4).unwrap();
        let payload = [7u8; 64];

        b.iter(|| {
            let mut batch = queue.start_batch().unwrap();
            batch.write(black_box(&payload)).unwrap();
            batch.submit();
            for sub in subs.iter_mut() {
                match sub.wait_for_batch().unwrap() {
                    Delivery::Batch(view) => {
                        black_box(view.len());
                    }
                    Delivery::Paused => unreachable!(),
                }
            }
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_publish_drain);
criterion_main!(benches);
