#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use criterion::measurement::WallTime;
use criterion::{
    black_box, criterion_group, criterion_main, BenchmarkGroup, BenchmarkId, Criterion, Throughput,
};
use hyperminhash::combiner::{intersection_cardinality, similarity, similarity_uncorrected, union};
use hyperminhash::{BetaMinHash, HyperMinHash, IntersectionSketch, SketchSerde};
use pprof::criterion::{Output, PProfProfiler};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tabled::settings::{Settings, Style};
use tabled::{Table, Tabled};

/// Offer and cardinality operations are benchmarked against cardinalities ranging from 0 to
/// `DEFAULT_MAX_CARDINALITY` or environment variable `N` (if defined) with cardinality doubled
/// with every iteration as [0, 1, 2, ..., N].
const DEFAULT_MAX_CARDINALITY: usize = 65536;

criterion_group! {
    name = benches;
    config = Criterion::default().with_profiler(PProfProfiler::new(100, Output::Protobuf));
    targets = benchmark
}
criterion_main!(benches);

fn benchmark(c: &mut Criterion) {
    let bench_results_path = std::env::var("BENCH_RESULTS_PATH").unwrap_or_else(|_| {
        format!("{}/target", env!("CARGO_MANIFEST_DIR"))
    });
    let max_cardinality = std::env::var("N")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_CARDINALITY);

    let cardinalities: Vec<usize> = std::iter::once(0)
        .chain((0..).map(|c| 1 << c))
        .take_while(|&c| c <= max_cardinality)
        .collect();

    let narrow = Config::new("hyperminhash-14-10", || HyperMinHash::new(14, 10).unwrap());
    let wide = Config::new("hyperminhash-14-35", || HyperMinHash::new(14, 35).unwrap());
    let beta = Config::new("betaminhash", BetaMinHash::new);

    let mut group = c.benchmark_group("offer");
    for &cardinality in &cardinalities {
        group.throughput(Throughput::Elements(cardinality.max(1) as u64));
        bench_offer(&mut group, &narrow, cardinality);
        bench_offer(&mut group, &wide, cardinality);
        bench_offer(&mut group, &beta, cardinality);
    }
    group.finish();

    let mut group = c.benchmark_group("cardinality");
    group.throughput(Throughput::Elements(1));
    for &cardinality in &cardinalities {
        bench_cardinality(&mut group, &narrow, cardinality);
        bench_cardinality(&mut group, &wide, cardinality);
        bench_cardinality(&mut group, &beta, cardinality);
    }
    group.finish();

    let mut group = c.benchmark_group("combiner");
    group.sample_size(10);
    for &cardinality in cardinalities.iter().filter(|&&c| c >= 1024) {
        bench_combiner(&mut group, &narrow, cardinality);
        bench_combiner(&mut group, &wide, cardinality);
        bench_combiner(&mut group, &beta, cardinality);
    }
    group.finish();

    let results: Vec<StatRecord> = cardinalities
        .iter()
        .map(|&cardinality| StatRecord {
            cardinality,
            narrow: measure_allocations(&narrow, cardinality),
            wide: measure_allocations(&wide, cardinality),
            beta: measure_allocations(&beta, cardinality),
        })
        .collect();
    write_table(&bench_results_path, "memory_usage.md", results);

    let results: Vec<StatRecord> = cardinalities
        .iter()
        .map(|&cardinality| StatRecord {
            cardinality,
            narrow: measure_error(&narrow, cardinality),
            wide: measure_error(&wide, cardinality),
            beta: measure_error(&beta, cardinality),
        })
        .collect();
    write_table(&bench_results_path, "relative_error.md", results);
}

fn write_table(path: &str, name: &str, results: Vec<StatRecord>) {
    let table_config = Settings::default().with(Style::markdown());
    std::fs::write(
        format!("{}/{}", path, name),
        Table::new(results).with(table_config).to_string(),
    )
    .unwrap();
}

/// Sketch configuration under benchmark
struct Config<S> {
    name: &'static str,
    create: fn() -> S,
}

impl<S: IntersectionSketch + SketchSerde> Config<S> {
    fn new(name: &'static str, create: fn() -> S) -> Self {
        Self { name, create }
    }

    fn filled(&self, items: std::ops::Range<usize>) -> S {
        let mut sketch = (self.create)();
        for i in items {
            sketch.offer(&i.to_le_bytes());
        }
        sketch
    }
}

fn bench_offer<S: IntersectionSketch + SketchSerde>(
    group: &mut BenchmarkGroup<WallTime>,
    config: &Config<S>,
    cardinality: usize,
) {
    group.bench_with_input(
        BenchmarkId::new(config.name, cardinality),
        &cardinality,
        |b, &cardinality| {
            b.iter(|| {
                let mut sketch = (config.create)();
                for i in 0..black_box(cardinality) {
                    sketch.offer(black_box(&i.to_le_bytes()));
                }
            });
        },
    );
}

fn bench_cardinality<S: IntersectionSketch + SketchSerde>(
    group: &mut BenchmarkGroup<WallTime>,
    config: &Config<S>,
    cardinality: usize,
) {
    group.bench_with_input(
        BenchmarkId::new(config.name, cardinality),
        &cardinality,
        |b, &cardinality| {
            let sketch = config.filled(0..cardinality);
            b.iter(|| sketch.cardinality());
        },
    );
}

fn bench_combiner<S: IntersectionSketch + SketchSerde>(
    group: &mut BenchmarkGroup<WallTime>,
    config: &Config<S>,
    cardinality: usize,
) {
    let lhs = config.filled(0..cardinality);
    let rhs = config.filled(cardinality / 2..cardinality * 3 / 2);
    let sketches = [&lhs, &rhs];
    let name = config.name;

    group.bench_function(BenchmarkId::new(format!("union/{}", name), cardinality), |b| {
        b.iter(|| union(black_box(&sketches)).unwrap())
    });
    group.bench_function(BenchmarkId::new(format!("similarity/{}", name), cardinality), |b| {
        b.iter(|| similarity(black_box(&sketches)).unwrap())
    });
    group.bench_function(
        BenchmarkId::new(format!("similarity_uncorrected/{}", name), cardinality),
        |b| b.iter(|| similarity_uncorrected(black_box(&sketches)).unwrap()),
    );
    group.bench_function(
        BenchmarkId::new(format!("intersection/{}", name), cardinality),
        |b| b.iter(|| intersection_cardinality(black_box(&sketches)).unwrap()),
    );
    group.bench_function(BenchmarkId::new(format!("encode/{}", name), cardinality), |b| {
        b.iter(|| black_box(&lhs).to_bytes())
    });
}

fn measure_allocations<S: IntersectionSketch + SketchSerde>(
    config: &Config<S>,
    cardinality: usize,
) -> String {
    let _profiler = dhat::Profiler::builder().testing().build();
    let sketch = config.filled(0..cardinality);
    let stats = dhat::HeapStats::get();
    format!(
        "{} / {} / {} / {}",
        std::mem::size_of::<S>(),
        stats.total_bytes,
        stats.total_blocks,
        sketch.size_in_bytes(),
    )
}

fn measure_error<S: IntersectionSketch + SketchSerde>(
    config: &Config<S>,
    cardinality: usize,
) -> String {
    let n = 20;
    let mut total_relative_error: f64 = 0.0;
    let mut rng = StdRng::seed_from_u64(12345);
    for _ in 0..n {
        let mut sketch = (config.create)();
        for _ in 0..cardinality {
            sketch.offer(&rng.gen::<u64>().to_le_bytes());
        }
        let relative_error = if cardinality == 0 {
            0.0
        } else {
            (sketch.cardinality() as f64 - cardinality as f64).abs() / cardinality as f64
        };
        total_relative_error += relative_error;
    }
    let avg_relative_error = total_relative_error / f64::from(n);

    if avg_relative_error < 1.0 {
        format!("{:.4}", avg_relative_error)
    } else {
        format!("{:.2e}", avg_relative_error)
    }
}

#[derive(Tabled)]
struct StatRecord {
    cardinality: usize,
    narrow: String,
    wide: String,
    beta: String,
}
