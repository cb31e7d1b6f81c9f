use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use stress_lens::inference::predict;
use stress_lens::preprocessing::schema::feature_names;
use stress_lens::preprocessing::{EncodedRecord, EncodedTable};
use stress_lens::training::{ParamGrid, RandomForest, TrainingConfig, TrainingPipeline};

fn create_survey_table(n_rows: usize) -> EncodedTable {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut data = Vec::with_capacity(n_rows * 11);
    let mut labels = Vec::with_capacity(n_rows);

    for _ in 0..n_rows {
        let row: Vec<f64> = (0..11).map(|_| rng.gen::<f64>() * 10.0).collect();
        // Short sleep (col 4) and long screen time (col 3) push toward High
        let score = (10.0 - row[4]) * 0.6 + row[3] * 0.4 + rng.gen::<f64>();
        labels.push(if score >= 6.0 { 1 } else { 0 });
        data.extend(row);
    }

    EncodedTable::new(
        feature_names(),
        Array2::from_shape_vec((n_rows, 11), data).unwrap(),
        Array1::from_vec(labels),
    )
    .unwrap()
}

fn small_grid_config() -> TrainingConfig {
    TrainingConfig::new().with_param_grid(ParamGrid {
        n_estimators: vec![50],
        max_depth: vec![Some(10), None],
        min_samples_split: vec![2],
        min_samples_leaf: vec![1],
    })
}

fn bench_forest_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("forest");
    group.sample_size(10);

    for n_rows in [500, 2000].iter() {
        let table = create_survey_table(*n_rows);

        group.bench_with_input(BenchmarkId::new("fit", n_rows), &table, |b, table| {
            b.iter(|| {
                let mut forest = RandomForest::new(100);
                forest.fit(black_box(table.features()), table.labels()).unwrap();
            })
        });
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);

    let table = create_survey_table(1000);
    group.bench_function("train_small_grid", |b| {
        b.iter(|| {
            TrainingPipeline::new(small_grid_config())
                .train(black_box(&table))
                .unwrap()
        })
    });

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let table = create_survey_table(1000);
    let bundle = TrainingPipeline::new(small_grid_config()).train(&table).unwrap();
    let record = EncodedRecord::new(
        table.feature_names().to_vec(),
        table.features().row(0).to_vec(),
    )
    .unwrap();

    c.bench_function("predict_single", |b| {
        b.iter(|| predict(&bundle, black_box(&record)).unwrap())
    });
}

criterion_group!(benches, bench_forest_fit, bench_pipeline, bench_prediction);
criterion_main!(benches);
