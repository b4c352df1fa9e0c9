//! Converts one rating split file into one encoded output file.
//!
//! The whole split is read into memory first so it can be shuffled as a unit;
//! the encoder then runs once per record in the resulting order.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::common::{ConvertError, ItemId, RatingRecord, Result, UserId, for_each_line, parse_field};
use crate::encoder::Encoder;

/// Output ordering for a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Lines come out in input order.
    Preserved,
    /// Uniform random permutation of the whole split.
    Shuffled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitStats {
    pub lines: usize,
}

/// Parse tab-separated `user, item, rating, timestamp` rows.
pub fn read_records(reader: impl BufRead, path: &Path) -> Result<Vec<RatingRecord>> {
    let mut records = Vec::new();
    for_each_line(reader, path, |line_no, line| {
        let fields: Vec<&str> = line.split('\t').collect();
        let [user, item, rating, timestamp] = fields.as_slice() else {
            return Err(ConvertError::malformed(
                path,
                line_no,
                format!("expected 4 tab-separated fields, found {}", fields.len()),
            ));
        };
        records.push(RatingRecord {
            user_id: UserId(parse_field(user, "user id", path, line_no)?),
            item_id: ItemId(parse_field(item, "item id", path, line_no)?),
            rating: rating.trim().to_string(),
            timestamp: parse_field(timestamp, "timestamp", path, line_no)?,
        });
        Ok(())
    })?;
    Ok(records)
}

/// Encode `records` into `writer`, one line each. `path` names the
/// destination in error messages. Returns the number of lines written.
///
/// Lines written before an encoding error are left in `writer`.
pub fn emit<R: Rng + ?Sized>(
    mut records: Vec<RatingRecord>,
    encoder: &Encoder<'_>,
    mut writer: impl Write,
    order: Order,
    rng: &mut R,
    path: &Path,
) -> Result<usize> {
    if order == Order::Shuffled {
        records.shuffle(rng);
    }
    for record in &records {
        let line = encoder.encode(record)?;
        writeln!(writer, "{line}").map_err(|e| ConvertError::io(path, e))?;
    }
    writer.flush().map_err(|e| ConvertError::io(path, e))?;
    Ok(records.len())
}

/// Read `input`, encode it and write the result to `output`.
pub fn emit_file<R: Rng + ?Sized>(
    input: &Path,
    output: &Path,
    encoder: &Encoder<'_>,
    order: Order,
    rng: &mut R,
) -> Result<EmitStats> {
    let reader = File::open(input)
        .map(BufReader::new)
        .map_err(|e| ConvertError::io(input, e))?;
    let records = read_records(reader, input)?;
    debug!("{}: {} records", input.display(), records.len());

    let writer = File::create(output)
        .map(BufWriter::new)
        .map_err(|source| ConvertError::Io {
            path: output.to_path_buf(),
            source,
        })?;
    let lines = emit(records, encoder, writer, order, rng, output)?;
    Ok(EmitStats { lines })
}

// ============================================================================
// Tests
// ============================================================================
