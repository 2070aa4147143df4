use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use fp::{
    matrix::{AnyMatrix, Encoding},
    prime::ValidPrime,
};
use rand::Rng;
use steenrod_linalg::{
    any::{lift_any, lift_cached_any, orthonormalize_any},
    OrthonormalizeOptions, Sampler,
};

fn random_matrix(encoding: Encoding, p: ValidPrime, rows: usize, columns: usize) -> AnyMatrix {
    let mut rng = rand::thread_rng();
    let rows: Vec<Vec<u32>> = (0..rows)
        .map(|_| (0..columns).map(|_| rng.gen::<u32>() % p.as_u32()).collect())
        .collect();
    AnyMatrix::from_rows(encoding, p, &rows, columns).unwrap()
}

fn orthonormalize(c: &mut Criterion) {
    for p in [2, 3, 7] {
        let p = ValidPrime::new(p);
        let mut group = c.benchmark_group(format!("orthonormalize_{p}"));
        for encoding in [Encoding::Generic, Encoding::preferred(p)] {
            for dimension in [20, 100, 420] {
                group.bench_function(format!("{encoding}_{dimension}"), move |b| {
                    b.iter_batched_ref(
                        // Twice as many rows as columns, so there is always a kernel.
                        || random_matrix(encoding, p, 2 * dimension, dimension),
                        |matrix| {
                            orthonormalize_any(
                                matrix,
                                OrthonormalizeOptions::KERNEL,
                                &mut Sampler::default(),
                            )
                            .unwrap()
                        },
                        BatchSize::SmallInput,
                    )
                });
            }
        }
        group.finish();
    }
}

fn lift(c: &mut Criterion) {
    let p = ValidPrime::new(3);
    let encoding = Encoding::preferred(p);
    let dimension = 200;
    let mut group = c.benchmark_group("lift_3");

    group.bench_function("recompute", |b| {
        b.iter_batched_ref(
            || {
                (
                    random_matrix(encoding, p, dimension, dimension),
                    random_matrix(encoding, p, dimension, dimension),
                )
            },
            |(a, l)| lift_any(a, l, &mut Sampler::default()).unwrap(),
            BatchSize::SmallInput,
        )
    });

    let mut a = random_matrix(encoding, p, dimension, dimension);
    let basis = orthonormalize_any(&mut a, OrthonormalizeOptions::ALL, &mut Sampler::default())
        .unwrap()
        .basis
        .unwrap();
    group.bench_function("cached", |b| {
        b.iter_batched_ref(
            || random_matrix(encoding, p, dimension, dimension),
            |l| lift_cached_any(&basis, l, &mut Sampler::default()).unwrap(),
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group! {
    name = engines;
    config = Criterion::default().sample_size(20);
    targets = orthonormalize, lift
}

criterion_main!(engines);
