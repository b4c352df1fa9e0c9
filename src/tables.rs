//! Read-only lookup tables built once from the dataset's three side files.
//!
//! - `u.item.utf8` gives every item a fixed-length genre bit vector.
//! - `u.occupation` assigns each occupation name a dense code in file order.
//! - `u.user` gives every user an age, a sex and an occupation code.
//!
//! The tables are constructed before any split is converted and are then only
//! ever borrowed.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use indexmap::IndexSet;
use tracing::info;

use crate::common::{
    ConvertError, GENRE_START_COLUMN, ITEM_FILE, ItemId, OCCUPATION_FILE, Result, Sex, USER_FILE,
    UserId, UserInfo, for_each_line, parse_field,
};

#[derive(Debug, Clone)]
pub struct LookupTables {
    genres: HashMap<ItemId, Vec<bool>>,
    num_genres: usize,
    occupations: IndexSet<String>,
    users: HashMap<UserId, UserInfo>,
}

impl LookupTables {
    /// Load the three side files from `dataset_dir`.
    pub fn load(dataset_dir: &Path) -> Result<Self> {
        let item_path = dataset_dir.join(ITEM_FILE);
        let occupation_path = dataset_dir.join(OCCUPATION_FILE);
        let user_path = dataset_dir.join(USER_FILE);

        let (genres, num_genres) = parse_items(open(&item_path)?, &item_path)?;
        let occupations = parse_occupations(open(&occupation_path)?, &occupation_path)?;
        let users = parse_users(open(&user_path)?, &user_path, &occupations)?;

        let tables = Self {
            genres,
            num_genres,
            occupations,
            users,
        };
        info!(
            "  Loaded {} users, {} items ({} genres), {} occupations",
            tables.num_users(),
            tables.num_items(),
            tables.num_genres(),
            tables.num_occupations()
        );
        Ok(tables)
    }

    /// Build the tables from arbitrary readers. Errors are reported against
    /// the canonical side-file names.
    pub fn from_readers(
        items: impl BufRead,
        occupations: impl Read,
        users: impl BufRead,
    ) -> Result<Self> {
        let (genres, num_genres) = parse_items(items, Path::new(ITEM_FILE))?;
        let occupations = parse_occupations(occupations, Path::new(OCCUPATION_FILE))?;
        let users = parse_users(users, Path::new(USER_FILE), &occupations)?;
        Ok(Self {
            genres,
            num_genres,
            occupations,
            users,
        })
    }

    pub fn genre_vector(&self, item: ItemId) -> Result<&[bool]> {
        self.genres
            .get(&item)
            .map(Vec::as_slice)
            .ok_or_else(|| ConvertError::MissingKey {
                table: "item",
                key: item.to_string(),
            })
    }

    pub fn occupation_code(&self, name: &str) -> Result<u32> {
        occupation_code(&self.occupations, name)
    }

    pub fn user_info(&self, user: UserId) -> Result<&UserInfo> {
        self.users.get(&user).ok_or_else(|| ConvertError::MissingKey {
            table: "user",
            key: user.to_string(),
        })
    }

    pub fn num_users(&self) -> usize {
        self.users.len()
    }

    pub fn num_items(&self) -> usize {
        self.genres.len()
    }

    /// Length shared by every genre vector.
    pub fn num_genres(&self) -> usize {
        self.num_genres
    }

    pub fn num_occupations(&self) -> usize {
        self.occupations.len()
    }
}

// ============================================================================
// Parsers
// ============================================================================

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| ConvertError::io(path, e))
}

fn occupation_code(occupations: &IndexSet<String>, name: &str) -> Result<u32> {
    occupations
        .get_index_of(name)
        .map(|code| code as u32)
        .ok_or_else(|| ConvertError::MissingKey {
            table: "occupation",
            key: name.to_string(),
        })
}

fn parse_items(
    reader: impl BufRead,
    path: &Path,
) -> Result<(HashMap<ItemId, Vec<bool>>, usize)> {
    let mut genres = HashMap::new();
    let mut num_genres: Option<usize> = None;

    for_each_line(reader, path, |line_no, line| {
        let fields: Vec<&str> = line.split('|').collect();
        if fields.len() < GENRE_START_COLUMN {
            return Err(ConvertError::malformed(
                path,
                line_no,
                format!("expected at least {GENRE_START_COLUMN} '|' separated fields"),
            ));
        }
        let item = ItemId(parse_field(fields[0], "item id", path, line_no)?);
        let bits = fields[GENRE_START_COLUMN..]
            .iter()
            .map(|raw| parse_field::<i64>(raw, "genre flag", path, line_no).map(|v| v == 1))
            .collect::<Result<Vec<bool>>>()?;

        match num_genres {
            None => num_genres = Some(bits.len()),
            Some(expected) if expected != bits.len() => {
                return Err(ConvertError::malformed(
                    path,
                    line_no,
                    format!("item {item} has {} genre flags, expected {expected}", bits.len()),
                ));
            }
            Some(_) => {}
        }
        genres.insert(item, bits);
        Ok(())
    })?;

    Ok((genres, num_genres.unwrap_or(0)))
}

/// Whitespace-separated occupation names, coded by first appearance.
///
/// A repeated name keeps the code of its first occurrence rather than taking
/// the position of its last one, so for `a b a` the name `a` is code 0, not 2.
/// The table width is the number of distinct names and every code stays below
/// it.
fn parse_occupations(mut reader: impl Read, path: &Path) -> Result<IndexSet<String>> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| ConvertError::io(path, e))?;
    Ok(text.split_whitespace().map(str::to_string).collect())
}

fn parse_users(
    reader: impl BufRead,
    path: &Path,
    occupations: &IndexSet<String>,
) -> Result<HashMap<UserId, UserInfo>> {
    let mut users = HashMap::new();
    for_each_line(reader, path, |line_no, line| {
        let fields: Vec<&str> = line.split('|').collect();
        if fields.len() < 4 {
            return Err(ConvertError::malformed(
                path,
                line_no,
                "expected at least 4 '|' separated fields",
            ));
        }
        let user = UserId(parse_field(fields[0], "user id", path, line_no)?);
        let info = UserInfo {
            age: parse_field(fields[1], "age", path, line_no)?,
            sex: Sex::parse(fields[2]),
            occupation_code: occupation_code(occupations, fields[3])?,
        };
        users.insert(user, info);
        Ok(())
    })?;
    Ok(users)
}

// ============================================================================
// Tests
// ============================================================================
