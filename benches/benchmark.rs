#[macro_use]
extern crate criterion;

extern crate rand;
extern crate recprep;

use criterion::Criterion;

use rand::{Rng, SeedableRng, XorShiftRng};
use recprep::data::{Interaction, Interactions};
use recprep::sampling::{self, NegativeSampler};

fn synthetic_interactions(
    num_users: usize,
    num_items: usize,
    num_interactions: usize,
) -> Interactions {
    let mut rng = XorShiftRng::from_seed([42; 16]);

    let mut interactions: Vec<Interaction> = (0..num_interactions)
        .map(|idx| {
            Interaction::new(
                rng.gen_range(0, num_users),
                rng.gen_range(0, num_items),
                1.0,
                idx,
            )
        })
        .collect();

    // Pin the index space.
    interactions.push(Interaction::new(num_users - 1, num_items - 1, 1.0, 0));

    Interactions::from(interactions)
}

fn bench_training_instances(c: &mut Criterion) {
    c.bench_function("training_instances", |b| {
        let interactions = synthetic_interactions(1000, 2000, 10_000);
        let sampler = NegativeSampler::new(&interactions);
        let mut rng = XorShiftRng::from_seed([42; 16]);

        b.iter(|| {
            sampling::training_instances(&interactions, &sampler, 4, &mut rng).unwrap();
        })
    });
}

fn bench_evaluation_instances(c: &mut Criterion) {
    c.bench_function("evaluation_instances", |b| {
        let interactions = synthetic_interactions(1000, 2000, 10_000);
        let sampler = NegativeSampler::new(&interactions);
        let mut rng = XorShiftRng::from_seed([42; 16]);

        b.iter(|| {
            sampling::evaluation_instances(&interactions, &sampler, 99, &mut rng).unwrap();
        })
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = bench_training_instances, bench_evaluation_instances
}
criterion_main!(benches);
