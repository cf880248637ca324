//! Difference-list record model.
//!
//! One line of the difference list describes a single object (or object
//! version, or delete marker) present on the source store but missing or
//! inconsistent on the destination. Records pass through the pipeline
//! untouched: the outcome logs contain the original records verbatim, so a
//! failure log can be renamed and re-driven as the next run's input.
//!
//! The success/failure tag of an outcome is carried by which log the record
//! lands in, not by a field on the record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One copy task read from the difference list.
///
/// Field names mirror the on-disk JSON exactly. Every field may be absent on
/// input and decodes to its default; only `key` is mandatory (non-empty,
/// enforced by the feeder rather than the decoder). Unknown fields are
/// ignored so lists produced by newer tooling still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffRecord {
    /// Comparison status assigned by the diff producer.
    #[serde(default)]
    pub status: String,

    /// Entry type assigned by the diff producer (object, prefix, ...).
    #[serde(rename = "type", default)]
    pub file_type: String,

    /// Source-side modification time of the object version.
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,

    /// Object size in bytes as recorded by the diff producer.
    #[serde(default)]
    pub size: i64,

    /// Object key. The only mandatory field.
    #[serde(default)]
    pub key: String,

    /// ETag of the exact version to copy. Used as a fetch constraint.
    #[serde(default)]
    pub etag: String,

    /// Source URL, informational only.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,

    /// Version id scoping all store calls. Empty means unversioned.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version_id: String,

    /// 1-based position of this version in the object's version stack.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub version_ordinal: i32,

    /// Listing index of this version, informational only.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub version_index: i32,

    /// Whether this entry is a delete marker rather than object data.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_delete_marker: bool,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl DiffRecord {
    /// Version id for store calls, `None` when the record is unversioned.
    pub fn version(&self) -> Option<&str> {
        if self.version_id.is_empty() {
            None
        } else {
            Some(&self.version_id)
        }
    }
}

/// How a single record's copy attempt ended.
///
/// Decides which outcome log the verbatim record is appended to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Success,
    Failure,
}

impl OutcomeKind {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
