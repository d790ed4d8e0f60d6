//! Parser layer
//! - archive.rs: archive filename parser
//! - types.rs: ArchiveMetadata

pub mod archive;
pub mod types;

pub use archive::{ParseError, parse_archive_name};
pub use types::ArchiveMetadata;
