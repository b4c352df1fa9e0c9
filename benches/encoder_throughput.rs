//! Encoder throughput benchmarks on a synthetic MovieLens-100k sized dataset.
//!
//! - **feature_sets**: `Encoder::encode` + formatting for increasingly wide
//!   feature sets.
//! - **emit**: a full split through `emit` into a sink, with and without the
//!   in-memory shuffle.
//!
//! # Running
//!
//! ```sh
//! cargo bench --bench encoder_throughput
//! ```

use std::fmt::Write as _;
use std::path::Path;

use criterion::{BenchmarkId, Criterion, Throughput};
use lensfm::common::{ItemId, RatingRecord, UserId};
use lensfm::emitter::{Order, emit};
use lensfm::encoder::{Encoder, FeatureSet};
use lensfm::tables::LookupTables;
use rand::Rng;

const NUM_USERS: u32 = 943;
const NUM_ITEMS: u32 = 1682;
const NUM_GENRES: usize = 19;
const OCCUPATIONS: [&str; 21] = [
    "administrator",
    "artist",
    "doctor",
    "educator",
    "engineer",
    "entertainment",
    "executive",
    "healthcare",
    "homemaker",
    "lawyer",
    "librarian",
    "marketing",
    "none",
    "other",
    "programmer",
    "retired",
    "salesman",
    "scientist",
    "student",
    "technician",
    "writer",
];

// ============================================================================
// Test data generators
// ============================================================================

fn generate_tables() -> LookupTables {
    let mut rng = rand::rng();

    let mut items = String::new();
    for item in 1..=NUM_ITEMS {
        write!(items, "{item}|Movie {item} (1995)|01-Jan-1995||http://x").unwrap();
        for _ in 0..NUM_GENRES {
            let bit = u8::from(rng.random_bool(0.15));
            write!(items, "|{bit}").unwrap();
        }
        items.push('\n');
    }

    let mut users = String::new();
    for user in 1..=NUM_USERS {
        let age = rng.random_range(7..74);
        let sex = if rng.random_bool(0.7) { "M" } else { "F" };
        let job = OCCUPATIONS[rng.random_range(0..OCCUPATIONS.len())];
        writeln!(users, "{user}|{age}|{sex}|{job}|00000").unwrap();
    }

    LookupTables::from_readers(
        items.as_bytes(),
        OCCUPATIONS.join("\n").as_bytes(),
        users.as_bytes(),
    )
    .unwrap()
}

fn generate_records(count: usize) -> Vec<RatingRecord> {
    let mut rng = rand::rng();
    (0..count)
        .map(|_| RatingRecord {
            user_id: UserId(rng.random_range(1..=NUM_USERS)),
            item_id: ItemId(rng.random_range(1..=NUM_ITEMS)),
            rating: rng.random_range(1..=5).to_string(),
            timestamp: rng.random_range(874_724_710..893_286_638),
        })
        .collect()
}

fn all_features() -> FeatureSet {
    FeatureSet {
        timestamp: true,
        genre: true,
        age: true,
        sex: true,
        job: true,
        field_aware: false,
    }
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_feature_sets(c: &mut Criterion) {
    let tables = generate_tables();
    let records = generate_records(20_000);

    let feature_sets = [
        ("ids", FeatureSet::default()),
        (
            "ids_genre",
            FeatureSet {
                genre: true,
                ..FeatureSet::default()
            },
        ),
        ("all", all_features()),
        (
            "all_field_aware",
            FeatureSet {
                field_aware: true,
                ..all_features()
            },
        ),
    ];

    let mut group = c.benchmark_group("feature_sets");
    group.throughput(Throughput::Elements(records.len() as u64));
    for (name, features) in feature_sets {
        let encoder = Encoder::new(&tables, features);
        group.bench_with_input(BenchmarkId::new("encode", name), &records, |b, records| {
            let mut line = String::with_capacity(128);
            b.iter(|| {
                for record in records {
                    line.clear();
                    write!(line, "{}", encoder.encode(record).unwrap()).unwrap();
                }
            });
        });
    }
    group.finish();
}

fn bench_emit(c: &mut Criterion) {
    let tables = generate_tables();
    let records = generate_records(80_000);
    let encoder = Encoder::new(&tables, all_features());

    let mut group = c.benchmark_group("emit");
    group.sample_size(20);
    group.throughput(Throughput::Elements(records.len() as u64));
    for (name, order) in [("preserved", Order::Preserved), ("shuffled", Order::Shuffled)] {
        group.bench_with_input(BenchmarkId::new("emit", name), &order, |b, &order| {
            let mut rng = rand::rng();
            b.iter(|| {
                emit(
                    records.clone(),
                    &encoder,
                    std::io::sink(),
                    order,
                    &mut rng,
                    Path::new("sink"),
                )
                .unwrap()
            });
        });
    }
    group.finish();
}

// ============================================================================
// Criterion main
// ============================================================================

fn main() {
    let mut criterion = Criterion::default()
        .warm_up_time(std::time::Duration::from_secs(2))
        .measurement_time(std::time::Duration::from_secs(10))
        .configure_from_args();

    bench_feature_sets(&mut criterion);
    bench_emit(&mut criterion);

    criterion.final_summary();
}
