use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;

use notemap::config::{ProcessSettings, Settings};
use notemap::note::{Note, NoteMetadata};
use notemap::processor::NoteProcessor;
use notemap::tfidf::TfidfVectorizer;

const WORDS: &[&str] = &[
    "neural", "network", "python", "javascript", "frontend", "backend", "database", "server",
    "statistics", "language", "learning", "website", "compiler", "garden", "recipe", "travel",
    "kernel", "graph", "cluster", "vector", "query", "index", "cache", "latency",
];

fn configure_criterion() -> Criterion {
    Criterion::default()
        .sample_size(10)
        .measurement_time(std::time::Duration::from_secs(20))
        .warm_up_time(std::time::Duration::from_secs(3))
        .configure_from_args()
}

fn synthetic_notes(count: usize) -> Vec<Note> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count)
        .map(|i| {
            let len = rng.gen_range(20..80);
            let content: Vec<&str> = (0..len)
                .map(|_| *WORDS.choose(&mut rng).unwrap())
                .collect();
            Note {
                path: format!("bench/{}.md", i),
                title: format!("Bench {}", i),
                content: content.join(" "),
                metadata: NoteMetadata::default(),
            }
        })
        .collect()
}

fn vectorize(c: &mut Criterion) {
    let mut group = c.benchmark_group("vectorize");
    for &count in &[50usize, 200] {
        let notes = synthetic_notes(count);
        let contents: Vec<&str> = notes.iter().map(|n| n.content.as_str()).collect();
        group.bench_with_input(BenchmarkId::from_parameter(count), &contents, |b, docs| {
            b.iter(|| TfidfVectorizer::default().fit_transform(docs).unwrap())
        });
    }
    group.finish();
}

fn process(c: &mut Criterion) {
    let processor = NoteProcessor::new(Settings::default());
    let mut group = c.benchmark_group("process");
    for &count in &[50usize, 200] {
        let notes = synthetic_notes(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &notes, |b, notes| {
            b.iter(|| {
                processor
                    .process(notes, &ProcessSettings::default())
                    .unwrap()
            })
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = configure_criterion();
    targets = vectorize, process
}
criterion_main!(benches);
