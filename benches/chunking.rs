use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use doc_qa::embeddings::chunking::{ChunkingConfig, chunk_text, normalize_text, prepare_chunks};
use std::hint::black_box;
use std::num::NonZeroUsize;

fn sample_document(paragraphs: usize) -> String {
    let english = "The quarterly report, published on 2024-03-01, shows revenue up 12% (see table 4).\n";
    let arabic = "أظهر التقرير الفصلي ارتفاع الإيرادات بنسبة ١٢٪ مقارنة بالعام الماضي.\n";
    let mut text = String::with_capacity(paragraphs * (english.len() + arabic.len()));
    for _ in 0..paragraphs {
        text.push_str(english);
        text.push_str(arabic);
    }
    text
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let document = sample_document(2_000);
    let normalized = normalize_text(&document);
    let config = ChunkingConfig::default();

    c.bench_function("normalize", |b| {
        b.iter(|| normalize_text(black_box(&document)))
    });

    let mut group = c.benchmark_group("chunk");
    for max_chars in [500, 4_000, 22_000] {
        let max_chars = NonZeroUsize::new(max_chars).expect("non-zero chunk size");
        group.bench_with_input(BenchmarkId::from_parameter(max_chars), &max_chars, |b, &n| {
            b.iter(|| chunk_text(black_box(&normalized), n).count())
        });
    }
    group.finish();

    c.bench_function("prepare_chunks", |b| {
        b.iter(|| prepare_chunks(black_box(&document), black_box(&config)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
