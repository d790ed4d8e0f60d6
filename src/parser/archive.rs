//! Archive filename parser
//!
//! Release archives are named `software-v1-v2-YYYY-MM-DD-tag`: seven
//! hyphen-delimited fields, nothing more and nothing less. This is the only
//! place that knows the convention.

use chrono::NaiveDate;

use crate::parser::types::ArchiveMetadata;

/// Number of hyphen-delimited fields in an archive name
const FIELD_COUNT: usize = 7;

/// Error type for archive name parsing
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    /// The name does not follow the archive naming convention
    #[error("Malformed archive name {name:?}: {reason}")]
    MalformedName { name: String, reason: String },
}

impl ParseError {
    fn malformed(name: &str, reason: impl Into<String>) -> Self {
        ParseError::MalformedName {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Parse an archive filename (or a path ending in one) into its metadata
pub fn parse_archive_name(path: &str) -> Result<ArchiveMetadata, ParseError> {
    let name = path.rsplit('/').next().unwrap_or(path);

    let fields: Vec<&str> = name.split('-').collect();
    if fields.len() != FIELD_COUNT {
        return Err(ParseError::malformed(
            name,
            format!("expected {} fields, found {}", FIELD_COUNT, fields.len()),
        ));
    }
    if fields.iter().any(|field| field.is_empty()) {
        return Err(ParseError::malformed(name, "empty field"));
    }

    let [software, major, minor, year, month, day, tag] = fields.as_slice() else {
        return Err(ParseError::malformed(name, "unexpected field layout"));
    };

    let date_str = format!("{}-{}-{}", year, month, day);
    let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
        .map_err(|e| ParseError::malformed(name, format!("invalid date {}: {}", date_str, e)))?;

    Ok(ArchiveMetadata {
        software: software.to_string(),
        version: format!("{} {}", major, minor),
        date,
        tag: tag.to_string(),
    })
}
