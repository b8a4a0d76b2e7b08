use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::sync::Arc;
use timeseries_ingest::app::services::aggregator::aggregate;
use timeseries_ingest::app::services::csv_parser::{CsvParser, parse_timestamp};
use timeseries_ingest::{IngestConfig, IngestionCoordinator, MemoryStore};
use tokio_util::sync::CancellationToken;

fn generate_upload(rows: usize) -> String {
    let mut content = String::from("Date;ExecutionTime;Value\n");
    for i in 0..rows {
        content.push_str(&format!(
            "2024-01-15T{:02}-{:02}-{:02}.{:04}Z;{}.{};{}.25\n",
            (i / 3600) % 24,
            (i / 60) % 60,
            i % 60,
            i % 10_000,
            i % 7,
            i % 10,
            100 + i % 500
        ));
    }
    content
}

fn benchmark_timestamps(c: &mut Criterion) {
    let mut group = c.benchmark_group("timestamps");
    for literal in [
        "2024-01-15T10-30-45.1234Z",
        "2024-01-15T10:30:45.1234Z",
        "2024-01-15T10:30:45+02:00",
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(literal), literal, |b, literal| {
            b.iter(|| parse_timestamp(black_box(literal)))
        });
    }
    group.finish();
}

fn benchmark_parsing(c: &mut Criterion) {
    let parser = CsvParser::new(&IngestConfig::default());
    let cancel = CancellationToken::new();

    let mut group = c.benchmark_group("parsing");
    for rows in [10, 1_000, 10_000] {
        let upload = generate_upload(rows);
        group.throughput(Throughput::Bytes(upload.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &upload, |b, upload| {
            b.iter(|| {
                parser
                    .parse_bytes(black_box(upload.as_bytes()), "bench.csv", &cancel)
                    .map(|result| result.rows.len())
            })
        });
    }
    group.finish();
}

fn benchmark_aggregation(c: &mut Criterion) {
    let parser = CsvParser::new(&IngestConfig::default());
    let cancel = CancellationToken::new();
    let rows = match parser.parse_bytes(generate_upload(10_000).as_bytes(), "bench.csv", &cancel) {
        Ok(result) => result.rows,
        Err(e) => panic!("benchmark upload should parse: {}", e),
    };
    let created_at = chrono::Utc::now();

    c.bench_function("aggregate_10000_rows", |b| {
        b.iter(|| aggregate(black_box(&rows), "bench.csv", created_at))
    });
}

fn benchmark_ingestion(c: &mut Criterion) {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => panic!("failed to create runtime: {}", e),
    };
    let upload = generate_upload(1_000);
    let coordinator = match IngestionCoordinator::new(
        Arc::new(MemoryStore::new()),
        IngestConfig::default(),
    ) {
        Ok(coordinator) => coordinator,
        Err(e) => panic!("default config should be valid: {}", e),
    };
    let cancel = CancellationToken::new();

    c.bench_function("ingest_1000_rows_replacing", |b| {
        b.iter(|| {
            runtime.block_on(coordinator.ingest(upload.as_bytes(), "bench.csv", &cancel))
        })
    });
}

criterion_group!(
    benches,
    benchmark_timestamps,
    benchmark_parsing,
    benchmark_aggregation,
    benchmark_ingestion
);
criterion_main!(benches);
