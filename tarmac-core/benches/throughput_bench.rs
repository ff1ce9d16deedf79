use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

use std::time::Duration;

use tarmac_core::types::*;
use tarmac_core::{Broker, BrokerConfig};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_time()
        .build()
        .unwrap()
}

fn broker(rt: &tokio::runtime::Runtime, runways: usize, stands: usize) -> Broker {
    let config = BrokerConfig::default()
        .with_runways(runways)
        .with_parking_stands(stands)
        .with_operation_duration(Duration::from_secs(60))
        .with_lease_validity(Duration::from_secs(60));
    Broker::with_runtime(config, rt.handle().clone()).unwrap()
}

fn bench_request_perform_cycle(c: &mut Criterion) {
    let rt = runtime();

    c.bench_function("landing_request_perform_cycle", |b| {
        b.iter_batched(
            || broker(&rt, 1, 1),
            |broker| {
                let aircraft = AircraftId::from("bench");
                if let RequestResult::Proceed(lease) = broker.request_landing(&aircraft).unwrap() {
                    black_box(broker.perform_landing(lease).unwrap());
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_hold(c: &mut Criterion) {
    let rt = runtime();
    let broker = broker(&rt, 1, 1);
    let _held = broker.request_landing(&AircraftId::from("holder")).unwrap();
    let aircraft = AircraftId::from("waiting");

    c.bench_function("landing_request_hold", |b| {
        b.iter(|| black_box(broker.request_landing(&aircraft).unwrap().is_hold()))
    });
}

fn bench_throughput(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("grant_throughput");

    for pool_size in [10, 50, 100] {
        group.bench_with_input(
            BenchmarkId::new("runways", pool_size),
            &pool_size,
            |b, &size| {
                b.iter_batched(
                    || broker(&rt, size, size),
                    |broker| {
                        // Fill the pool, then commit every lease.
                        let leases: Vec<_> = (0..size)
                            .filter_map(|i| {
                                broker
                                    .request_landing(&AircraftId::from(format!("a{}", i)))
                                    .unwrap()
                                    .lease()
                            })
                            .collect();
                        for lease in leases {
                            black_box(broker.perform_landing(lease).unwrap());
                        }
                    },
                    BatchSize::SmallInput,
                )
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_request_perform_cycle, bench_hold, bench_throughput);
criterion_main!(benches);
