#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use hyperminhash::combiner::union;
use hyperminhash::{BetaMinHash, HyperMinHash, IntersectionSketch, SketchSerde};
use tabled::{
    settings::{Settings, Style},
    Table, Tabled,
};

#[derive(Tabled)]
struct Record {
    cardinality: usize,
    hyperminhash_narrow: String,
    hyperminhash_wide: String,
    betaminhash: String,
}

fn measure_memory_usage<T: IntersectionSketch + SketchSerde>(
    cardinality: usize,
    create: impl Fn() -> T,
) -> String {
    let _profiler = dhat::Profiler::builder().testing().build();
    let mut sketch = create();
    for i in 0..cardinality {
        sketch.offer(&i.to_le_bytes());
    }
    let stats = dhat::HeapStats::get();
    format!(
        "{} / {} / {} / {}",
        std::mem::size_of::<T>(),
        stats.total_bytes,
        stats.total_blocks,
        sketch.size_in_bytes()
    )
}

#[test]
fn test_allocations() {
    let results: Vec<Record> = std::iter::once(0)
        .chain((0..).map(|c| 1 << c))
        .take_while(|&c| c <= 1 << 20)
        .map(|cardinality| Record {
            cardinality,
            hyperminhash_narrow: measure_memory_usage(cardinality, || {
                HyperMinHash::new(12, 10).unwrap()
            }),
            hyperminhash_wide: measure_memory_usage(cardinality, || {
                HyperMinHash::new(12, 35).unwrap()
            }),
            betaminhash: measure_memory_usage(cardinality, BetaMinHash::new),
        })
        .collect();

    let table_config = Settings::default().with(Style::markdown());
    let markdown = Table::new(results).with(table_config).to_string();
    println!("{}", markdown);

    // dhat supports a single running profiler, so the checks below run sequentially.
    check_offer_does_not_allocate();
    check_union_allocates_one_store();
}

fn check_offer_does_not_allocate() {
    let mut narrow = HyperMinHash::new(12, 10).unwrap();
    let mut wide = HyperMinHash::new(12, 35).unwrap();
    let mut beta = BetaMinHash::new();

    let _profiler = dhat::Profiler::builder().testing().build();
    for i in 0..100_000u64 {
        narrow.offer(&i.to_le_bytes());
        wide.offer(&i.to_le_bytes());
        beta.offer(&i.to_le_bytes());
    }
    let stats = dhat::HeapStats::get();
    dhat::assert_eq!(stats.total_blocks, 0);
}

fn check_union_allocates_one_store() {
    let mut lhs = HyperMinHash::new(12, 35).unwrap();
    let mut rhs = HyperMinHash::new(12, 35).unwrap();
    for i in 0..10_000u64 {
        lhs.offer(&i.to_le_bytes());
        rhs.offer(&(i + 5_000).to_le_bytes());
    }

    let _profiler = dhat::Profiler::builder().testing().build();
    let merged = union(&[&lhs, &rhs]).unwrap();
    let stats = dhat::HeapStats::get();
    dhat::assert_eq!(stats.total_blocks, 1);
    dhat::assert_eq!(stats.total_bytes, (1u64 << 12) * 8);
    drop(merged);
}
