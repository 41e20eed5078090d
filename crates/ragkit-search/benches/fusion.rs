use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use ragkit_core::{Corpus, Query};
use ragkit_search::fusion::{FusionMethod, HybridScorer};

const SIZES: &[usize] = &[10, 100, 1_000];
const WORDS: &[&str] = &[
    "python", "guido", "rossum", "language", "machine", "learning", "neural", "network",
    "readable", "syntax", "dataset", "training", "google", "dropbox", "creator",
];

/// Deterministic corpus: text and 8-dim vectors derived from the index.
fn corpus(n: usize) -> Corpus {
    Corpus::from_pairs((0..n).map(|i| {
        let text: Vec<&str> = (0..12).map(|j| WORDS[(i * 7 + j * 3) % WORDS.len()]).collect();
        let vector: Vec<f64> = (0..8)
            .map(|j| (((i * 31 + j * 17) % 97) as f64 + 1.0) / 97.0)
            .collect();
        (text.join(" "), vector)
    }))
}

fn bench_hybrid(c: &mut Criterion) {
    let query = Query::new("who created the python language")
        .with_vector(vec![0.8, 0.85, 0.15, 0.1, 0.3, 0.2, 0.6, 0.4]);

    for (name, method) in [
        ("weighted", FusionMethod::Weighted { alpha: 0.5 }),
        ("rrf", FusionMethod::default()),
    ] {
        let mut group = c.benchmark_group(format!("hybrid.{name}"));
        let scorer = HybridScorer::new().with_method(method);
        for &size in SIZES {
            let docs = corpus(size);
            group.throughput(Throughput::Elements(size as u64));
            group.bench_with_input(BenchmarkId::from_parameter(size), &docs, |b, docs| {
                b.iter(|| {
                    let result = scorer.score(&query, docs).unwrap();
                    black_box(result.hits.len())
                });
            });
        }
        group.finish();
    }
}

criterion_group!(benches, bench_hybrid);
criterion_main!(benches);
