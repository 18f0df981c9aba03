//! Per-packet dispatch latency benchmarks.
//!
//! Measures the admission and service hot path:
//! - enqueue + dequeue round trip on a wide-open band
//! - the full downgrade ladder when the classified band is exhausted
//! - strict-priority scan cost with all bands empty
//!
//! Run with: cargo bench --package cadence-core

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use cadence_core::clock::MonotonicClock;
use cadence_core::config::SchedulerConfigInput;
use cadence_core::dispatch::{AlwaysAvailable, PriorityDispatcher};
use cadence_core::packet::Packet;

fn dispatcher(
    mults: &[f64],
    downgrade: bool,
) -> PriorityDispatcher<MonotonicClock, AlwaysAvailable> {
    let config = SchedulerConfigInput {
        quantum_us: Some(100),
        byte_quantum: Some(128),
        rate_multipliers: mults.to_vec(),
        auto_downgrade: Some(downgrade),
        verbosity: None,
    }
    .resolve()
    .unwrap();
    PriorityDispatcher::new(&config, MonotonicClock::new(), AlwaysAvailable, 8).unwrap()
}

fn bench_enqueue_dequeue(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_hotpath");
    group.throughput(Throughput::Elements(1));

    let mut d = dispatcher(&[1e6; 8], false);
    let pkt = Packet::new(Bytes::from(vec![0u8; 1200]), 7);
    group.bench_function("enqueue_dequeue_1200B", |b| {
        b.iter(|| {
            let _ = d.enqueue(black_box(pkt.clone()));
            black_box(d.dequeue())
        })
    });

    group.finish();
}

fn bench_downgrade_ladder(c: &mut Criterion) {
    let mut group = c.benchmark_group("downgrade_ladder");
    group.throughput(Throughput::Elements(1));

    // Only the lowest band has room, so every enqueue walks the whole
    // ladder before landing.
    let mut mults = [0.0; 8];
    mults[7] = 1e6;
    let mut d = dispatcher(&mults, true);
    let pkt = Packet::new(Bytes::from(vec![0u8; 1200]), 7);
    group.bench_function("full_ladder_to_band_zero", |b| {
        b.iter(|| {
            let _ = d.enqueue(black_box(pkt.clone()));
            black_box(d.dequeue())
        })
    });

    group.finish();
}

fn bench_empty_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("empty_scan");

    let mut d = dispatcher(&[1e6; 8], false);
    group.bench_function("dequeue_all_empty", |b| b.iter(|| black_box(d.dequeue())));

    group.finish();
}

criterion_group!(
    benches,
    bench_enqueue_dequeue,
    bench_downgrade_ladder,
    bench_empty_scan
);
criterion_main!(benches);
