use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use itag_ingest::app::services::header_parser::parse_header;
use itag_ingest::app::services::record_parser::{parse_chunk, parse_detail};

const HEADER: &[u8] = b"ITAG001202501010830000000010000000025000000250000002500000025";

fn detail_lines(count: u64) -> Vec<(u64, Vec<u8>)> {
    (0..count)
        .map(|n| {
            let line = if n % 50 == 0 {
                format!("0X1{:013}7", n)
            } else {
                format!("001{:013}{}ACCT{}", n, n % 4 + 1, n)
            };
            (n + 2, line.into_bytes())
        })
        .collect()
}

fn bench_header(c: &mut Criterion) {
    c.bench_function("parse_header", |b| {
        b.iter(|| parse_header(black_box(HEADER)))
    });
}

fn bench_details(c: &mut Criterion) {
    let valid = b"00100000000000423".to_vec();
    c.bench_function("parse_detail_valid", |b| {
        b.iter(|| parse_detail(black_box(2), black_box(&valid)))
    });

    let invalid = b"A0B00000000000X19".to_vec();
    c.bench_function("parse_detail_invalid", |b| {
        b.iter(|| parse_detail(black_box(2), black_box(&invalid)))
    });

    let chunk = detail_lines(8_192);
    let mut group = c.benchmark_group("parse_chunk");
    group.throughput(Throughput::Elements(chunk.len() as u64));
    group.bench_function("8192_lines", |b| b.iter(|| parse_chunk(black_box(&chunk))));
    group.finish();
}

criterion_group!(benches, bench_header, bench_details);
criterion_main!(benches);
