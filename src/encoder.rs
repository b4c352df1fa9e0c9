//! Sparse one-hot encoding of rating records.
//!
//! Every record becomes one line: the label followed by `index:value` tokens
//! (or `field:index:value` in field-aware mode). The index space is the
//! concatenation of the active feature groups in a fixed order:
//!
//! ```text
//! user id | item id | [timestamp] | [genre] | [age] | [sex] | [occupation]
//! ```
//!
//! Each group owns a block whose width depends only on the lookup tables, never
//! on the record, so every line of a run spans the same total width.

use std::fmt;

use tracing::debug;

use crate::common::{RatingRecord, Result, Sex};
use crate::tables::LookupTables;

// ============================================================================
// Feature Groups
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureGroup {
    UserId,
    ItemId,
    Timestamp,
    Genre,
    Age,
    Sex,
    Occupation,
}

impl FeatureGroup {
    /// All groups, in the order their blocks are laid out.
    pub const ALL: [FeatureGroup; 7] = [
        FeatureGroup::UserId,
        FeatureGroup::ItemId,
        FeatureGroup::Timestamp,
        FeatureGroup::Genre,
        FeatureGroup::Age,
        FeatureGroup::Sex,
        FeatureGroup::Occupation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FeatureGroup::UserId => "user id",
            FeatureGroup::ItemId => "item id",
            FeatureGroup::Timestamp => "timestamp",
            FeatureGroup::Genre => "genre",
            FeatureGroup::Age => "age",
            FeatureGroup::Sex => "sex",
            FeatureGroup::Occupation => "occupation",
        }
    }
}

/// Which optional groups are emitted, and the output token format.
/// The user-id and item-id groups are always on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureSet {
    pub timestamp: bool,
    pub genre: bool,
    pub age: bool,
    pub sex: bool,
    pub job: bool,
    /// Prefix every token with its group's field ordinal (libffm format).
    pub field_aware: bool,
}

impl FeatureSet {
    pub fn is_enabled(&self, group: FeatureGroup) -> bool {
        match group {
            FeatureGroup::UserId | FeatureGroup::ItemId => true,
            FeatureGroup::Timestamp => self.timestamp,
            FeatureGroup::Genre => self.genre,
            FeatureGroup::Age => self.age,
            FeatureGroup::Sex => self.sex,
            FeatureGroup::Occupation => self.job,
        }
    }

    /// Active groups in layout order.
    pub fn groups(&self) -> impl Iterator<Item = FeatureGroup> + '_ {
        FeatureGroup::ALL
            .into_iter()
            .filter(|group| self.is_enabled(*group))
    }
}

// ============================================================================
// Tokens and Lines
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureValue {
    /// Indicator bit of a one-hot / multi-hot block.
    One,
    /// Continuous feature written as-is (timestamp, age).
    Raw(i64),
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::One => f.write_str("1"),
            FeatureValue::Raw(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub field: u32,
    pub index: u64,
    pub value: FeatureValue,
}

/// One encoded record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedLine {
    pub label: String,
    pub tokens: Vec<Token>,
    /// Offset reached after the last active group; equals the layout's total width.
    pub width: u64,
    field_aware: bool,
}

impl EncodedLine {
    /// The line as `label index:value ...`, or `label field:index:value ...`
    /// when `field_aware` is set, whatever format the encoder was built with.
    pub fn render(&self, field_aware: bool) -> String {
        let mut out = String::with_capacity(self.label.len() + 8 * self.tokens.len());
        // Writing into a String cannot fail.
        let _ = self.write_to(&mut out, field_aware);
        out
    }

    fn write_to(&self, out: &mut impl fmt::Write, field_aware: bool) -> fmt::Result {
        out.write_str(&self.label)?;
        for token in &self.tokens {
            if field_aware {
                write!(out, " {}:{}:{}", token.field, token.index, token.value)?;
            } else {
                write!(out, " {}:{}", token.index, token.value)?;
            }
        }
        Ok(())
    }
}

/// Renders in the format of the encoder that produced the line.
impl fmt::Display for EncodedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f, self.field_aware)
    }
}

/// Position within the line's index space: the start of the current group's
/// block and the group's field ordinal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Cursor {
    offset: u64,
    field: u32,
}

impl Cursor {
    fn token(self, local_index: u64, value: FeatureValue) -> Token {
        Token {
            field: self.field,
            index: self.offset + local_index,
            value,
        }
    }

    fn advance(self, width: u64) -> Self {
        Self {
            offset: self.offset + width,
            field: self.field + 1,
        }
    }
}

// ============================================================================
// Layout
// ============================================================================

/// The block a group occupies in the index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupBlock {
    pub group: FeatureGroup,
    pub field: u32,
    pub start: u64,
    pub width: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexLayout {
    pub blocks: Vec<GroupBlock>,
    pub total_width: u64,
}

impl IndexLayout {
    pub fn block(&self, group: FeatureGroup) -> Option<&GroupBlock> {
        self.blocks.iter().find(|b| b.group == group)
    }
}

// ============================================================================
// Encoder
// ============================================================================

pub struct Encoder<'a> {
    tables: &'a LookupTables,
    features: FeatureSet,
}

impl<'a> Encoder<'a> {
    pub fn new(tables: &'a LookupTables, features: FeatureSet) -> Self {
        Self { tables, features }
    }

    pub fn features(&self) -> FeatureSet {
        self.features
    }

    /// Number of indices reserved for `group`, independent of any record.
    pub fn width_of(&self, group: FeatureGroup) -> u64 {
        match group {
            FeatureGroup::UserId => self.tables.num_users() as u64,
            FeatureGroup::ItemId => self.tables.num_items() as u64,
            FeatureGroup::Timestamp | FeatureGroup::Age => 1,
            FeatureGroup::Genre => self.tables.num_genres() as u64,
            FeatureGroup::Sex => 2,
            FeatureGroup::Occupation => self.tables.num_occupations() as u64,
        }
    }

    pub fn layout(&self) -> IndexLayout {
        let mut cursor = Cursor::default();
        let mut blocks = Vec::new();
        for group in self.features.groups() {
            let width = self.width_of(group);
            blocks.push(GroupBlock {
                group,
                field: cursor.field,
                start: cursor.offset,
                width,
            });
            cursor = cursor.advance(width);
        }
        IndexLayout {
            blocks,
            total_width: cursor.offset,
        }
    }

    pub fn encode(&self, record: &RatingRecord) -> Result<EncodedLine> {
        let mut tokens = Vec::with_capacity(8);
        let mut cursor = Cursor::default();
        for group in self.features.groups() {
            self.encode_group(group, record, cursor, &mut tokens)?;
            cursor = cursor.advance(self.width_of(group));
        }
        Ok(EncodedLine {
            label: record.rating.clone(),
            tokens,
            width: cursor.offset,
            field_aware: self.features.field_aware,
        })
    }

    fn encode_group(
        &self,
        group: FeatureGroup,
        record: &RatingRecord,
        cursor: Cursor,
        tokens: &mut Vec<Token>,
    ) -> Result<()> {
        match group {
            FeatureGroup::UserId => {
                tokens.push(cursor.token(u64::from(record.user_id.0), FeatureValue::One));
            }
            FeatureGroup::ItemId => {
                tokens.push(cursor.token(u64::from(record.item_id.0), FeatureValue::One));
            }
            FeatureGroup::Timestamp => {
                tokens.push(cursor.token(0, FeatureValue::Raw(record.timestamp)));
            }
            FeatureGroup::Genre => {
                let bits = self.tables.genre_vector(record.item_id)?;
                tokens.extend(
                    bits.iter()
                        .enumerate()
                        .filter(|(_, set)| **set)
                        .map(|(i, _)| cursor.token(i as u64, FeatureValue::One)),
                );
            }
            FeatureGroup::Age => {
                let info = self.tables.user_info(record.user_id)?;
                tokens.push(cursor.token(0, FeatureValue::Raw(i64::from(info.age))));
            }
            FeatureGroup::Sex => match &self.tables.user_info(record.user_id)?.sex {
                Sex::Male => tokens.push(cursor.token(0, FeatureValue::One)),
                Sex::Female => tokens.push(cursor.token(1, FeatureValue::One)),
                // The block is still reserved, it just stays empty.
                Sex::Unrecognized(raw) => {
                    debug!("user {} has unrecognized sex '{raw}'", record.user_id);
                }
            },
            FeatureGroup::Occupation => {
                let info = self.tables.user_info(record.user_id)?;
                tokens.push(cursor.token(u64::from(info.occupation_code), FeatureValue::One));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
