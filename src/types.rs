//! Common types used throughout table-batcher
//!
//! Row operations, their identity, and the scalar values a row can carry.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// Column values of a row, keyed by column name
pub type FieldMap = BTreeMap<String, FieldValue>;

// ============================================================================
// Row Identity
// ============================================================================

/// The (partition key, row key) pair that addresses one row in a table
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowIdentity {
    pub partition_key: String,
    pub row_key: String,
}

impl RowIdentity {
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
        }
    }
}

impl fmt::Display for RowIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.partition_key, self.row_key)
    }
}

// ============================================================================
// Field Values
// ============================================================================

/// A scalar column value
///
/// Deserialization tries the variants in declaration order, so an RFC 3339
/// string with any offset becomes a UTC [`FieldValue::Timestamp`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    Timestamp(DateTime<Utc>),
    String(String),
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Double(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for FieldValue {
    fn from(value: DateTime<Tz>) -> Self {
        FieldValue::Timestamp(value.with_timezone(&Utc))
    }
}

// ============================================================================
// Upsert Mode
// ============================================================================

/// Conflict policy applied when the row identity already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertMode {
    /// Replace the whole existing row
    #[default]
    Replace,
}

// ============================================================================
// Row Operation
// ============================================================================

/// A single intended write against a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowOperation {
    pub partition_key: String,
    pub row_key: String,
    #[serde(default)]
    pub fields: FieldMap,
    #[serde(default)]
    pub mode: UpsertMode,
}

impl RowOperation {
    /// Create a replace-mode operation with no fields
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            fields: FieldMap::new(),
            mode: UpsertMode::Replace,
        }
    }

    /// Add a column value
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// The identity this operation writes to
    pub fn identity(&self) -> RowIdentity {
        RowIdentity::new(self.partition_key.clone(), self.row_key.clone())
    }
}

// ============================================================================
// Timestamp Row Keys
// ============================================================================

/// Seconds between 1601-01-01T00:00:00Z and the Unix epoch
const FILE_TIME_EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

/// 100ns ticks per second
const FILE_TIME_TICKS_PER_SEC: i64 = 10_000_000;

/// Convert a timestamp to UTC file-time ticks (100ns intervals since 1601)
pub fn file_time_ticks<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> i64 {
    let utc = timestamp.with_timezone(&Utc);
    (utc.timestamp() + FILE_TIME_EPOCH_OFFSET_SECS) * FILE_TIME_TICKS_PER_SEC
        + i64::from(utc.timestamp_subsec_nanos() / 100)
}

/// Row key for a timestamp index value; sorts in time order for post-1601 dates
pub fn timestamp_row_key<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> String {
    file_time_ticks(timestamp).to_string()
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.trim().is_empty())
    }
}
