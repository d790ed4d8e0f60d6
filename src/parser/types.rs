//! Common types for parsed archive names

use chrono::NaiveDate;

/// Metadata encoded in an archive filename
/// (`software-v1-v2-YYYY-MM-DD-tag`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMetadata {
    /// Software name (e.g., "tool")
    pub software: String,
    /// Both version components joined with a space (e.g., "2 1")
    pub version: String,
    /// Build date
    pub date: NaiveDate,
    /// Free-form build tag (e.g., "rc1")
    pub tag: String,
}
