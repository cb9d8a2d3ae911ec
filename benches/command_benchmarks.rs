//! Performance benchmarks for Redtape
//!
//! Measures argument parsing on its own and the full parse-execute-encode
//! pipeline through the registry.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use redtape::commands::coerce::TimeUnit;
use redtape::commands::{Expire, Set};
use redtape::{CommandRegistry, MemoryStore, ParsedCommand};
use uuid::Uuid;

fn tokens(line: &str) -> Vec<Bytes> {
    line.split_whitespace()
        .map(|t| Bytes::copy_from_slice(t.as_bytes()))
        .collect()
}

/// Benchmark argument parsing
fn bench_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");

    for line in [
        "name alice",
        "name alice NX GET EX 10",
        "name alice xx pxat 1577882096000",
    ] {
        let args = tokens(line);
        group.bench_with_input(BenchmarkId::new("set", line), &args, |b, args| {
            b.iter(|| Set::parse(black_box(args)).unwrap());
        });
    }

    let args = tokens("name 60000");
    group.bench_function("pexpire", |b| {
        b.iter(|| Expire::parse(black_box(&args), TimeUnit::Milliseconds).unwrap());
    });

    group.finish();
}

/// Benchmark the full command pipeline
fn bench_execution(c: &mut Criterion) {
    let registry = CommandRegistry::with_builtin_commands();
    let store = MemoryStore::new();
    let client_id = Uuid::new_v4();

    for i in 0..1000 {
        store.set(format!("bench_key_{i}"), format!("bench_value_{i}")).unwrap();
    }

    let mut group = c.benchmark_group("execution");
    group.throughput(Throughput::Elements(1));

    let mut counter = 0u64;
    group.bench_function("set_new_key", |b| {
        b.iter(|| {
            counter += 1;
            let cmd = ParsedCommand::new(
                "SET",
                vec![Bytes::from(format!("key_{counter}")), Bytes::from("value")],
                client_id,
            );
            registry.execute(black_box(&cmd), &store)
        });
    });

    let set_nx = ParsedCommand::parse("SET bench_key_1 other NX", client_id).unwrap();
    group.bench_function("set_nx_existing", |b| {
        b.iter(|| registry.execute(black_box(&set_nx), &store));
    });

    let get = ParsedCommand::parse("GET bench_key_500", client_id).unwrap();
    group.bench_function("get_existing", |b| {
        b.iter(|| registry.execute(black_box(&get), &store));
    });

    let pexpire = ParsedCommand::parse("PEXPIRE bench_key_2 600000", client_id).unwrap();
    group.bench_function("pexpire_existing", |b| {
        b.iter(|| registry.execute(black_box(&pexpire), &store));
    });

    let ttl = ParsedCommand::parse("PTTL bench_key_2", client_id).unwrap();
    group.bench_function("pttl", |b| {
        b.iter(|| registry.execute(black_box(&ttl), &store));
    });

    group.finish();
}

criterion_group!(benches, bench_parsing, bench_execution);
criterion_main!(benches);
