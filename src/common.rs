//! Common types and constants used throughout the project.

use std::fmt;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use thiserror::Error;

// ============================================================================
// Dataset Layout
// ============================================================================

/// Item side file: `id|title|release|video release|url|genre bits...`.
pub const ITEM_FILE: &str = "u.item.utf8";
/// Occupation side file: whitespace-separated occupation names.
pub const OCCUPATION_FILE: &str = "u.occupation";
/// User side file: `id|age|sex|occupation|zip`.
pub const USER_FILE: &str = "u.user";

/// The five predefined train/test partitions of the ratings dataset.
pub const SPLIT_NAMES: [&str; 5] = ["u1", "u2", "u3", "u4", "u5"];
pub const TRAIN_EXT: &str = ".base";
pub const TEST_EXT: &str = ".test";
pub const OUTPUT_EXT: &str = ".txt";

/// Column at which the genre indicator bits start in the item file.
pub const GENRE_START_COLUMN: usize = 5;

// ============================================================================
// Key NewTypes
// ============================================================================

/// User identifier. MovieLens ids are 1-based and used directly as offsets
/// within the user-id feature block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u32);

/// Item identifier, 1-based like [`UserId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u32);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Records
// ============================================================================

/// One row of a rating split file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingRecord {
    pub user_id: UserId,
    pub item_id: ItemId,
    /// The label token exactly as it appeared in the input. Labels are not
    /// validated, so this is written back verbatim.
    pub rating: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
    /// Anything other than `M` / `F`. Encodes to zero tokens.
    Unrecognized(String),
}

impl Sex {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "M" => Sex::Male,
            "F" => Sex::Female,
            other => Sex::Unrecognized(other.to_string()),
        }
    }
}

/// Demographics for a single user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub age: u32,
    pub sex: Sex,
    pub occupation_code: u32,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("{0} is not implemented")]
    Unsupported(String),

    #[error("required input file not found: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("{table} table has no entry for key '{key}'")]
    MissingKey { table: &'static str, key: String },

    #[error("{}:{line}: {reason}", path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            ConvertError::MissingInput { path }
        } else {
            ConvertError::Io { path, source }
        }
    }

    pub(crate) fn malformed(
        path: impl Into<PathBuf>,
        line: usize,
        reason: impl Into<String>,
    ) -> Self {
        ConvertError::Malformed {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;

/// Parse a numeric field, reporting the 1-based line number on failure.
pub(crate) fn parse_field<T: std::str::FromStr>(
    raw: &str,
    what: &str,
    path: &Path,
    line: usize,
) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| ConvertError::malformed(path, line, format!("invalid {what} '{raw}'")))
}

/// Calls `f(line_number, line)` for every non-blank line. Bytes are decoded
/// lossily so the Latin-1 item file of the raw dataset is accepted too.
pub(crate) fn for_each_line(
    mut reader: impl BufRead,
    path: &Path,
    mut f: impl FnMut(usize, &str) -> Result<()>,
) -> Result<()> {
    let mut buf = Vec::new();
    let mut line_no = 0;
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| ConvertError::io(path, e))?;
        if n == 0 {
            return Ok(());
        }
        line_no += 1;
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            continue;
        }
        f(line_no, line)?;
    }
}
