//! # Crosscore Runtime Benchmarks
//!
//! | Path | Expectation |
//! |------|-------------|
//! | Pending table register + clear | O(1) average at half load |
//! | Pending table find under collisions | bounded by chain length |
//! | Blocking Add round trip | dominated by thread wake-ups |
//! | Channel send + receive | uncontended mutex + condvar |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use std::time::Duration;

use shared_channel::BoundedChannel;
use shared_types::CorrelationMode;
use xc_core::{CoreClient, CoreConfig, CrossCore, PendingEntry, PendingTable};

// ============================================================================
// Pending table
// ============================================================================

fn bench_pending_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("pending-table");

    for load in [8usize, 16, 31] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("register_clear", load), &load, |b, &load| {
            let mut table = PendingTable::new(32);
            for sequence in 1..=load as u32 {
                table
                    .register(PendingEntry::new(sequence, CorrelationMode::Event, 0, 0))
                    .unwrap();
            }
            let mut sequence = 1_000u32;
            b.iter(|| {
                sequence = sequence.wrapping_add(1);
                table
                    .register(PendingEntry::new(sequence, CorrelationMode::Event, 0, 0))
                    .unwrap();
                black_box(table.clear(sequence));
            })
        });
    }

    // Every key lands in the same home slot.
    let mut colliding = PendingTable::new(32);
    let keys: Vec<u32> = (0..16).map(|i| 1 + i * 32).collect();
    for &sequence in &keys {
        colliding
            .register(PendingEntry::new(sequence, CorrelationMode::Event, 0, 0))
            .unwrap();
    }
    group.bench_function("find_colliding", |b| {
        let mut rng = rand::thread_rng();
        b.iter(|| {
            let key = keys[rng.gen_range(0..keys.len())];
            black_box(colliding.find(key).is_some())
        })
    });

    group.finish();
}

// ============================================================================
// Channel
// ============================================================================

fn bench_channel(c: &mut Criterion) {
    let mut group = c.benchmark_group("channel");
    let channel = BoundedChannel::new("bench", 16).unwrap();
    group.bench_function("send_receive", |b| {
        b.iter(|| {
            channel.try_send(black_box(42u64)).unwrap();
            black_box(channel.try_receive().unwrap())
        })
    });
    group.finish();
}

// ============================================================================
// Round trip
// ============================================================================

fn bench_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("round-trip");
    group.measurement_time(Duration::from_secs(10));

    let core = CrossCore::new(CoreConfig {
        worker_poll_interval_ms: 1,
        monitor_poll_interval_ms: 1,
        ..CoreConfig::default()
    });
    core.init().unwrap();
    let client = CoreClient::new(&core);

    group.bench_function("blocking_add", |b| {
        b.iter(|| black_box(client.add(black_box(20), black_box(22)).unwrap()))
    });
    group.bench_function("blocking_echo_full_payload", |b| {
        let data = [0xA5u8; 128];
        b.iter(|| black_box(client.echo(&data).unwrap()))
    });

    core.start_monitoring().unwrap();
    group.bench_function("event_add", |b| {
        b.iter(|| {
            let event = client.add_event(1, 2).unwrap();
            black_box(event.get_result(Duration::from_secs(1)).unwrap())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_pending_table, bench_channel, bench_round_trip);
criterion_main!(benches);
