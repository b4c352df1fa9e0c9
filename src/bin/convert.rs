//! Generates libFM / libffm train and test files from the MovieLens-100k dataset.
//!
//! ## Input
//!
//! A dataset directory containing:
//! - `u.item.utf8`  — item side table (`|` separated, genre bits from column 5)
//! - `u.occupation` — one occupation name per line
//! - `u.user`       — user side table (`id|age|sex|occupation|zip`)
//! - `u1.base` .. `u5.base`, `u1.test` .. `u5.test` — tab-separated ratings
//!
//! ## Output
//!
//! Ten files under the output directory, `<prefix-train>uN.txt` and
//! `<prefix-test>uN.txt`, one encoded line per rating.
//!
//! ## Usage
//!
//! ```sh
//! cargo run --release --bin convert -- --dataset ml-100k -o output -g -a -s -j
//! RUST_LOG=info cargo run --release --bin convert -- --unshuffled -f
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use lensfm::driver::{ConversionConfig, run};
use lensfm::encoder::FeatureSet;

#[derive(Parser, Debug)]
#[command(
    about = "Generate train/test datasets of MovieLens100k for libFM and libffm-regression"
)]
struct Args {
    #[arg(long, default_value = "train_")]
    prefix_train: String,

    #[arg(long, default_value = "test_")]
    prefix_test: String,

    /// Directory holding the MovieLens side files and rating splits.
    #[arg(long, value_name = "DATA", default_value = "dataset/")]
    dataset: PathBuf,

    /// Directory to write the encoded files to.
    #[arg(short, long, value_name = "DIR", default_value = "output")]
    output: PathBuf,

    /// Add the rating timestamp as a continuous feature.
    #[arg(short, long)]
    timestamp: bool,

    /// Add the item's genres as a multi-hot block.
    #[arg(short, long)]
    genre: bool,

    /// Add the user's age as a continuous feature.
    #[arg(short, long)]
    age: bool,

    /// Add the user's sex as a one-hot block.
    #[arg(short, long)]
    sex: bool,

    /// Add the user's occupation as a one-hot block.
    #[arg(short, long)]
    job: bool,

    /// Reserved; not implemented.
    #[arg(long)]
    other: bool,

    /// Keep input order instead of shuffling each file.
    #[arg(long)]
    unshuffled: bool,

    /// Write `field:index:value` tokens for field-aware learners.
    #[arg(short, long)]
    field_aware: bool,

    /// Seed the shuffle for reproducible output.
    #[arg(long)]
    seed: Option<u64>,
}

impl From<Args> for ConversionConfig {
    fn from(args: Args) -> Self {
        Self {
            dataset_dir: args.dataset,
            output_dir: args.output,
            prefix_train: args.prefix_train,
            prefix_test: args.prefix_test,
            features: FeatureSet {
                timestamp: args.timestamp,
                genre: args.genre,
                age: args.age,
                sex: args.sex,
                job: args.job,
                field_aware: args.field_aware,
            },
            shuffle: !args.unshuffled,
            other: args.other,
            seed: args.seed,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ConversionConfig::from(Args::parse());
    match run(&config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
