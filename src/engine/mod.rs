//! Resolution and caching engine
//!
//! Turns an (architecture, software, version alias, tag) reference into a
//! share link for one stored archive.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Catalog   │────▶│   Target    │────▶│   Listing   │
//! │  (context)  │     │ (resolve)   │     │  (backend)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                   │                   │
//!        ▼                   ▼                   ▼
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │    Link     │     │   Parser    │     │  TTL Cache  │
//! │ (share url) │     │ (archives)  │     │  (storage)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`]: TTL cache with lazy expiry and a background sweeper
//! - [`listing`]: Cached directory/file listings and share links
//! - [`target`]: Version alias and target resolution
//! - [`link`]: Share link resolution for a request
//! - [`catalog`]: Context object exposing the public operations
//! - [`error`]: Resolution error type

pub mod cache;
pub mod catalog;
pub mod error;
pub mod link;
pub mod listing;
pub mod target;

pub use catalog::Catalog;
pub use error::ResolveError;
pub use target::TargetSummary;
