use criterion::{black_box, criterion_group, criterion_main, Criterion};
use magicga::{
    fitness::FitnessMeasure,
    genome::{express, SiameseParams},
    rng::RandomNumberGenerator,
    square::{Schema, Square},
};

fn bench_fitness(c: &mut Criterion) {
    let mut rng = RandomNumberGenerator::from_seed(1);

    let mut group = c.benchmark_group("fitness");
    for order in [3, 5, 10, 25].iter() {
        let square = Square::random(*order, &mut rng);
        for measure in [FitnessMeasure::SoftGradient, FitnessMeasure::LineCount] {
            group.bench_function(&format!("{:?}_{}", measure, order), |b| {
                b.iter(|| measure.score(black_box(&square)))
            });
        }
    }
    group.finish();
}

fn bench_express(c: &mut Criterion) {
    let mut rng = RandomNumberGenerator::from_seed(2);

    let mut group = c.benchmark_group("siamese_express");
    for order in [3, 9, 27].iter() {
        let schema = Schema::free(*order);
        let classic = SiameseParams::classic(*order);
        let random = SiameseParams::random(*order, &mut rng);
        group.bench_function(&format!("classic_{}", order), |b| {
            b.iter(|| express(*order, black_box(&classic), &schema))
        });
        group.bench_function(&format!("random_{}", order), |b| {
            b.iter(|| express(*order, black_box(&random), &schema))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_fitness, bench_express);
criterion_main!(benches);
