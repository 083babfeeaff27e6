use criterion::{black_box, criterion_group, criterion_main, Criterion};
use relay_status_feed::feed::{next_snapshot, RandomJitter};
use relay_status_feed::roster::{NodeDescriptor, Roster, Tier};
use uuid::Uuid;

fn bench_next_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("next_snapshot");

    let reference = Roster::reference();
    let large = Roster::new(
        (0..1000)
            .map(|i| NodeDescriptor::new(format!("n{i}"), format!("Node {i}"), "bench", 10, Tier::Good))
            .collect(),
    )
    .unwrap();

    for (name, roster) in [("reference", &reference), ("1000_nodes", &large)] {
        let mut jitter = RandomJitter::seeded(1);
        group.bench_function(name, |b| {
            b.iter(|| next_snapshot(Uuid::nil(), black_box(roster), 0, 2, &mut jitter))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_next_snapshot);
criterion_main!(benches);
