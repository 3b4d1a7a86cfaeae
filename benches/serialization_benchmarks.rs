use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use zabbix_reporter::Sample;
use zabbix_reporter::reporter::naming::{format_context_name, format_metric_name, sanitize};
use zabbix_reporter::sender::{decode_response, encode_request};

fn make_batch(size: usize) -> Vec<Sample> {
    (0..size)
        .map(|i| match i % 3 {
            0 => Sample::new("10.0.0.5", format!("Orders-requests.p{i}"), 0.25 * i as f64),
            1 => Sample::new("10.0.0.5", format!("Orders-hits.read{i}"), i as u64),
            _ => Sample::new("10.0.0.5", format!("HealthStatus.check{i}"), i % 2 == 0),
        })
        .collect()
}

fn benchmark_encode_request(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_request");

    for size in [10usize, 100, 1000] {
        let batch = make_batch(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &batch, |b, batch| {
            b.iter(|| encode_request(black_box(batch)));
        });
    }

    group.finish();
}

fn benchmark_decode_response(c: &mut Criterion) {
    let json = br#"{"response":"success","info":"processed: 100; failed: 0; total: 100; seconds spent: 0.000420"}"#;
    let mut framed = b"ZBXD\x01".to_vec();
    framed.extend_from_slice(&(json.len() as u64).to_le_bytes());
    framed.extend_from_slice(json);
    framed.resize(1024, 0);

    let mut group = c.benchmark_group("decode_response");
    group.bench_function("plain", |b| b.iter(|| decode_response(black_box(json))));
    group.bench_function("framed_padded", |b| {
        b.iter(|| decode_response(black_box(&framed)))
    });
    group.finish();
}

fn benchmark_key_naming(c: &mut Criterion) {
    let stack = vec![
        "Application".to_string(),
        "Orders".to_string(),
        "Db/primary".to_string(),
    ];

    let mut group = c.benchmark_group("key_naming");
    group.bench_function("sanitize_clean", |b| {
        b.iter(|| sanitize(black_box("Orders-Db-hits.read-per-")))
    });
    group.bench_function("sanitize_dirty", |b| {
        b.iter(|| sanitize(black_box("Orders/Db pool [primary]: acquired (per sec)")))
    });
    group.bench_function("context_and_metric", |b| {
        b.iter(|| {
            let context = format_context_name(black_box(&stack), black_box("Pool"));
            format_metric_name(&context, black_box("acquired connections"))
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_encode_request,
    benchmark_decode_response,
    benchmark_key_naming
);
criterion_main!(benches);
