use bitgene_core::{Family, Genome, ParentRef};
use criterion::{criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn bench_crossover(c: &mut Criterion) {
    c.bench_function("create_default_layout", |b| {
        b.iter(|| Genome::new(3178))
    });

    let parent_b = Genome::new(5678).unwrap();
    let mut parent_a = Genome::new(1234).unwrap();
    c.bench_function("crossover_default_layout", |b| {
        b.iter(|| parent_a.crossover(&parent_b, 0))
    });

    c.bench_function("distance_default_layout", |b| {
        b.iter(|| parent_a.distance(&parent_b))
    });

    c.bench_function("bootstrap_8_founders_64_offspring", |b| {
        b.iter(|| {
            let mut family = Family::new();
            let mut rng = ChaCha8Rng::seed_from_u64(1);
            family.bootstrap(8, 64, &mut rng)
        })
    });

    let mut family = Family::new();
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    family.bootstrap(8, 64, &mut rng).unwrap();
    c.bench_function("pair_registered_members", |b| {
        b.iter(|| family.pair(ParentRef::Id(1), ParentRef::Id(2), 0))
    });
    c.bench_function("ancestry_deepest_member", |b| {
        b.iter(|| family.ancestry(72, 50))
    });
}

criterion_group!(benches, bench_crossover);
criterion_main!(benches);
