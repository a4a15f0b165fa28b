//! Feature codec benchmarks.
//!
//! Covers the hot paths: coordinate interleaving, varint runs, Stage-1
//! serialization, and the staged reader.

#![allow(missing_docs)]
#![allow(clippy::expect_used)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use cartograph_core::coords;
use cartograph_core::types::PointD;
use cartograph_feature::{
    BuildBuffers, FeatureBuilder, FeatureReader, IndexedFeatureBuilder, MemoryStore, ScaleHeader,
};

// ============================================================================
// Helper: Simple RNG for reproducible benchmarks
// ============================================================================

struct Rng {
    state: u64,
}

impl Rng {
    const fn new(seed: u64) -> Self {
        Self { state: if seed == 0 { 0x853c_49e6_748f_ea9b } else { seed } }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn next_coord(&mut self) -> f64 {
        let unit = (self.next_u64() as f64) / (u64::MAX as f64);
        (unit - 0.5) * 2.0 * coords::PROJECTION_BOUND
    }

    fn next_point(&mut self) -> PointD {
        PointD::new(self.next_coord(), self.next_coord())
    }
}

fn random_line(rng: &mut Rng, len: usize) -> FeatureBuilder {
    let mut fb = FeatureBuilder::new();
    fb.add_type(42);
    let origin = rng.next_point();
    for i in 0..len {
        fb.add_point(PointD::new(origin.x + i as f64 * 1.0e-5, origin.y));
    }
    fb.set_linear();
    fb
}

fn bench_coords(c: &mut Criterion) {
    let mut rng = Rng::new(7);
    let points: Vec<PointD> = (0..1024).map(|_| rng.next_point()).collect();

    let mut group = c.benchmark_group("coords");
    group.throughput(Throughput::Elements(points.len() as u64));
    group.bench_function("point_to_u64", |b| {
        b.iter(|| {
            for &p in &points {
                black_box(coords::point_to_u64(black_box(p)));
            }
        });
    });
    group.bench_function("u64_roundtrip", |b| {
        let codes: Vec<u64> = points.iter().map(|&p| coords::point_to_u64(p)).collect();
        b.iter(|| {
            for &code in &codes {
                black_box(coords::u64_to_point(black_box(code)));
            }
        });
    });
    group.finish();
}

fn bench_stage1(c: &mut Criterion) {
    let mut group = c.benchmark_group("stage1");
    for len in [4usize, 64, 1024] {
        let mut rng = Rng::new(len as u64);
        let fb = random_line(&mut rng, len);
        let bytes = fb.serialize().expect("valid builder");

        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::new("serialize", len), &fb, |b, fb| {
            b.iter(|| black_box(fb.serialize().expect("valid builder")));
        });
        group.bench_with_input(BenchmarkId::new("deserialize", len), &bytes, |b, bytes| {
            b.iter(|| black_box(FeatureBuilder::deserialize(bytes).expect("valid bytes")));
        });
    }
    group.finish();
}

fn bench_reader(c: &mut Criterion) {
    let base = coords::point_to_u64(PointD::new(0.0, 0.0));
    let scales = ScaleHeader::new(vec![2, 5, 10, 17], base as i64);
    let store = MemoryStore::new();

    let mut rng = Rng::new(3);
    let fb = random_line(&mut rng, 12);
    let points = fb.geometry().to_vec();
    let indexed = IndexedFeatureBuilder::new(fb);
    let buffers = BuildBuffers {
        inner_pts: points,
        pts_simp_mask: 0b10_01_00_11_01_00_10_01_00_11,
        ..BuildBuffers::default()
    };
    let bytes = indexed.serialize(buffers, scales.base()).expect("valid buffers");

    let mut group = c.benchmark_group("reader");
    group.bench_function("parse_common", |b| {
        b.iter(|| {
            let mut reader = FeatureReader::new(bytes.clone(), &store, &scales);
            reader.parse_common().expect("valid bytes");
            black_box(reader.layer());
        });
    });
    group.bench_function("parse_all", |b| {
        b.iter(|| {
            let mut reader = FeatureReader::new(bytes.clone(), &store, &scales);
            reader.parse_all(10).expect("valid bytes");
            black_box(reader.points().len());
        });
    });
    group.finish();
}

criterion_group!(benches, bench_coords, bench_stage1, bench_reader);
criterion_main!(benches);
