use criterion::{black_box, criterion_group, criterion_main, Criterion};
use onoma_infer::registry::model_id_for_classes;
use onoma_infer::text::{encode_batches, normalize};

fn sample_names(count: usize) -> Vec<String> {
    let pool = [
        "Cixin Liú",
        "Peter Schmidt",
        "François Müller",
        "Anna-Lena O'Brien",
        "Δημήτρης Παπαδόπουλος",
        "jean-luc picard",
    ];
    (0..count).map(|i| pool[i % pool.len()].to_string()).collect()
}

fn benchmark_normalize(c: &mut Criterion) {
    c.bench_function("normalize_ascii", |b| {
        b.iter(|| normalize(black_box("peter schmidt")))
    });

    c.bench_function("normalize_diacritics", |b| {
        b.iter(|| normalize(black_box("Tê123#öäüµ François Müller")))
    });
}

fn benchmark_encode_batches(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_batches");

    for count in [10usize, 100, 1000] {
        let names = sample_names(count);
        group.bench_function(format!("names_{}", count), |b| {
            b.iter(|| encode_batches(black_box(&names), black_box(128)))
        });
    }

    group.finish();
}

fn benchmark_model_id(c: &mut Criterion) {
    let classes: Vec<String> = [
        "british", "chinese", "french", "german", "greek", "indian", "japanese", "spanish",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    c.bench_function("model_id_for_classes", |b| {
        b.iter(|| model_id_for_classes(black_box(&classes)))
    });
}

criterion_group!(
    benches,
    benchmark_normalize,
    benchmark_encode_batches,
    benchmark_model_id
);
criterion_main!(benches);
