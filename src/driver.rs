//! Converts all five train/test split pairs of a dataset directory.
//!
//! For split `uN` the inputs are `<dataset>/uN.base` and `<dataset>/uN.test`,
//! and the outputs are `<output>/<prefix_train>uN.txt` and
//! `<output>/<prefix_test>uN.txt`. Lookup tables are built once and shared by
//! every split.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use indicatif::{HumanCount, HumanDuration, ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::{Level, info};

use crate::common::{ConvertError, OUTPUT_EXT, Result, SPLIT_NAMES, TEST_EXT, TRAIN_EXT};
use crate::emitter::{Order, emit_file};
use crate::encoder::{Encoder, FeatureSet};
use crate::tables::LookupTables;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Directory holding the side files and the `uN.base` / `uN.test` splits.
    pub dataset_dir: PathBuf,
    /// Directory the encoded files are written to. Created if absent.
    pub output_dir: PathBuf,
    pub prefix_train: String,
    pub prefix_test: String,
    pub features: FeatureSet,
    /// Shuffle every output file. When off, output order equals input order.
    pub shuffle: bool,
    /// Reserved feature toggle. Requesting it is an error.
    pub other: bool,
    /// Seed for the shuffle. `None` draws from the thread-local generator.
    pub seed: Option<u64>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dataset_dir: PathBuf::from("dataset"),
            output_dir: PathBuf::from("output"),
            prefix_train: "train_".to_string(),
            prefix_test: "test_".to_string(),
            features: FeatureSet::default(),
            shuffle: true,
            other: false,
            seed: None,
        }
    }
}

impl ConversionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.other {
            return Err(ConvertError::Unsupported("--other".to_string()));
        }
        Ok(())
    }

    pub fn order(&self) -> Order {
        if self.shuffle {
            Order::Shuffled
        } else {
            Order::Preserved
        }
    }
}

// ============================================================================
// Split Files
// ============================================================================

/// Input and output paths for one split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitFiles {
    pub name: &'static str,
    pub train_input: PathBuf,
    pub test_input: PathBuf,
    pub train_output: PathBuf,
    pub test_output: PathBuf,
}

impl SplitFiles {
    /// `(input, output)` pairs, train first.
    pub fn pairs(&self) -> [(&Path, &Path); 2] {
        [
            (self.train_input.as_path(), self.train_output.as_path()),
            (self.test_input.as_path(), self.test_output.as_path()),
        ]
    }
}

pub fn split_files(config: &ConversionConfig) -> Vec<SplitFiles> {
    SPLIT_NAMES
        .iter()
        .map(|&name| SplitFiles {
            name,
            train_input: config.dataset_dir.join(format!("{name}{TRAIN_EXT}")),
            test_input: config.dataset_dir.join(format!("{name}{TEST_EXT}")),
            train_output: config
                .output_dir
                .join(format!("{}{name}{OUTPUT_EXT}", config.prefix_train)),
            test_output: config
                .output_dir
                .join(format!("{}{name}{OUTPUT_EXT}", config.prefix_test)),
        })
        .collect()
}

// ============================================================================
// Run
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files_written: usize,
    pub lines_written: usize,
    /// Total index-space width of every emitted line.
    pub feature_width: u64,
}

pub fn run(config: &ConversionConfig) -> Result<RunSummary> {
    config.validate()?;
    let start = Instant::now();

    let splits = split_files(config);
    for split in &splits {
        for (input, _) in split.pairs() {
            if !input.is_file() {
                return Err(ConvertError::MissingInput {
                    path: input.to_path_buf(),
                });
            }
        }
    }

    fs::create_dir_all(&config.output_dir).map_err(|source| ConvertError::Io {
        path: config.output_dir.clone(),
        source,
    })?;

    info!("Step 1: Loading lookup tables from {}...", config.dataset_dir.display());
    let tables = LookupTables::load(&config.dataset_dir)?;
    let encoder = Encoder::new(&tables, config.features);
    let layout = encoder.layout();
    for block in &layout.blocks {
        info!(
            "  field {} {:<10} [{}, {})",
            block.field,
            block.group.name(),
            block.start,
            block.start + block.width
        );
    }
    let token_format = if encoder.features().field_aware {
        "field:index:value"
    } else {
        "index:value"
    };
    info!("  {} features per line, {token_format} tokens", layout.total_width);

    let mut rng: Box<dyn RngCore> = match config.seed {
        Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
        None => Box::new(rand::rng()),
    };
    let order = config.order();

    info!("Step 2: Encoding {} splits ({order:?})...", splits.len());
    let pb = progress_bar((splits.len() * 2) as u64);
    let mut summary = RunSummary {
        feature_width: layout.total_width,
        ..RunSummary::default()
    };
    for split in &splits {
        for (input, output) in split.pairs() {
            pb.set_message(split.name);
            let stats = emit_file(input, output, &encoder, order, rng.as_mut())?;
            info!(
                "  {} -> {} ({} lines)",
                input.display(),
                output.display(),
                HumanCount(stats.lines as u64)
            );
            summary.files_written += 1;
            summary.lines_written += stats.lines;
            pb.inc(1);
        }
    }
    pb.finish_and_clear();

    info!(
        "Conversion complete in {}: {} files, {} lines",
        HumanDuration(start.elapsed()),
        summary.files_written,
        HumanCount(summary.lines_written as u64)
    );
    Ok(summary)
}

/// A progress bar over the output files, drawn only when `info` logging is on.
fn progress_bar(len: u64) -> ProgressBar {
    if !tracing::enabled!(Level::INFO) {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::with_template(
            "  Encoding   {bar:40.cyan/blue} {pos}/{len} files {msg} [{elapsed_precise}]",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-"),
    );
    pb
}
