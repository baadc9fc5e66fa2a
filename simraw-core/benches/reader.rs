use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use simraw_core::{
    scanner::{scan_bytes, scan_bytes_with_stats},
    DatagramReader, ReaderConfig,
};
use std::io::Cursor;

fn encode(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let size = (12 + payload.len()) as i32;
    let mut out = size.to_le_bytes().to_vec();
    out.extend_from_slice(tag);
    out.extend_from_slice(&[0u8; 8]);
    out.extend_from_slice(payload);
    out.extend_from_slice(&size.to_le_bytes());
    out
}

fn make_stream(num_pings: usize, samples: usize) -> Vec<u8> {
    let mut stream = Vec::new();
    for i in 0..num_pings {
        let mut ping = vec![0u8; 128];
        ping[..5].copy_from_slice(b"WBT 1");
        ping.extend(std::iter::repeat(0x7f).take(samples));
        stream.extend(encode(b"RAW3", &ping));
        stream.extend(encode(b"NME0", format!("$GPGLL,{:06}", i).as_bytes()));
        if i % 10 == 0 {
            // inject a bit of garbage periodically
            stream.extend_from_slice(b"GARBAGE");
        }
    }
    stream
}

fn bench_reader(c: &mut Criterion) {
    let mut group = c.benchmark_group("reader");

    for &samples in &[64usize, 1024, 16384] {
        let stream = make_stream(500, samples);
        group.throughput(Throughput::Bytes(stream.len() as u64));

        group.bench_with_input(BenchmarkId::new("read_next", samples), &stream, |b, data| {
            b.iter(|| {
                let mut reader =
                    DatagramReader::new(Cursor::new(data.as_slice()), ReaderConfig::default());
                let n = reader.iterate().count();
                criterion::black_box(n);
            });
        });

        group.bench_with_input(BenchmarkId::new("raw_mode", samples), &stream, |b, data| {
            b.iter(|| {
                let config = ReaderConfig::new().raw_mode(true);
                let mut reader = DatagramReader::new(Cursor::new(data.as_slice()), config);
                let n = reader.iterate().count();
                criterion::black_box(n);
            });
        });

        group.bench_with_input(BenchmarkId::new("total_count", samples), &stream, |b, data| {
            b.iter(|| {
                let mut reader =
                    DatagramReader::new(Cursor::new(data.as_slice()), ReaderConfig::default());
                criterion::black_box(reader.total_count().ok());
            });
        });
    }

    group.finish();
}

fn bench_scanner(c: &mut Criterion) {
    let mut group = c.benchmark_group("scanner");
    let stream = make_stream(500, 1024);
    group.throughput(Throughput::Bytes(stream.len() as u64));

    group.bench_function("scan_bytes", |b| {
        b.iter(|| {
            let res = scan_bytes(&stream);
            criterion::black_box(res);
        });
    });

    group.bench_function("scan_bytes_with_stats", |b| {
        b.iter(|| {
            let res = scan_bytes_with_stats(&stream);
            criterion::black_box(res);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_reader, bench_scanner);
criterion_main!(benches);
