//! 🧪 How much does the importer itself cost, with the network taken out?
//!
//! Chunking, request assembly and result merging against an in-memory sink.
//! Anything this shows is overhead on top of the real round trips.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use fileup::backends::{InMemoryImportSink, SinkBackend};
use fileup::{ChunkedImporter, ImportConfig, IndexWriter};
use serde_json::{Value, json};

fn records(n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| json!({ "coordinates": [i as f64 * 0.001, 45.0], "name": format!("p{i}") }))
        .collect()
}

fn chunked_import(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("💀 no tokio runtime, no bench");
    let empty = json!({});
    let mut group = c.benchmark_group("chunked_import");

    for size in [1_000usize, 25_000] {
        let data = records(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.to_async(&runtime).iter(|| async {
                // -- fresh sink per iteration so recorded requests don't pile up
                let sink = InMemoryImportSink::new();
                let importer = ChunkedImporter::new(
                    IndexWriter::new(SinkBackend::InMemory(sink)),
                    ImportConfig::default(),
                );
                let result = importer
                    .import_all(Some("bench"), "bench", data, &empty, &empty)
                    .await;
                assert!(result.success);
            })
        });
    }
    group.finish();
}

criterion_group!(benches, chunked_import);
criterion_main!(benches);
