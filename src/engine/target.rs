//! Version channel and target resolution
//!
//! A version alias maps to a subpath of the architecture directory:
//! - `nightly`: builds live flat under the architecture root
//! - any other alias: the most recently modified child directory whose path
//!   contains the alias (e.g. `beta` → `/ARMv7/beta-2023-05-01`)
//!
//! Within that subpath, archives are matched by their parsed software name and
//! tag, with `latest` picking the most recently modified archive.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use crate::engine::listing::ListingClient;
use crate::parser::archive::parse_archive_name;
use crate::parser::types::ArchiveMetadata;
use crate::storage::types::DirectoryEntry;

/// Version alias for builds stored directly under the architecture root
pub const NIGHTLY: &str = "nightly";

/// Tag selecting the most recently modified archive
pub const LATEST_TAG: &str = "latest";

/// Channels offered to clients
pub const VERSION_CHANNELS: [&str; 3] = [NIGHTLY, "beta", "stable"];

/// How a version alias is located under the architecture root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel<'a> {
    Nightly,
    Named(&'a str),
}

impl<'a> Channel<'a> {
    pub fn from_alias(alias: &'a str) -> Self {
        if alias == NIGHTLY {
            Channel::Nightly
        } else {
            Channel::Named(alias)
        }
    }
}

/// One entry of a target listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetSummary {
    pub tag: String,
    pub date: NaiveDate,
}

/// Storage path of an architecture's root directory
pub fn architecture_root(architecture: &str) -> String {
    format!("/{}", architecture.trim_matches('/'))
}

/// Most recently modified entry; equal timestamps go to the greatest path so
/// the result does not depend on backend listing order.
pub fn most_recent<'a>(
    entries: impl IntoIterator<Item = &'a DirectoryEntry>,
) -> Option<&'a DirectoryEntry> {
    entries
        .into_iter()
        .max_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)))
}

/// Resolve `(architecture, alias)` into the subpath holding its archives.
///
/// Returns an empty string when no channel directory matches.
pub async fn resolve_subpath(listing: &ListingClient, architecture: &str, alias: &str) -> String {
    let root = architecture_root(architecture);

    match Channel::from_alias(alias) {
        Channel::Nightly => root,
        Channel::Named(name) => {
            let directories = listing.list_directories(&root).await;
            match most_recent(directories.iter().filter(|dir| dir.path.contains(name))) {
                Some(dir) => {
                    debug!("Resolved {}/{} to {}", architecture, alias, dir.path);
                    dir.path.clone()
                }
                None => {
                    debug!("No channel directory for {}/{}", architecture, alias);
                    String::new()
                }
            }
        }
    }
}

/// Parse every archive name, skipping entries that break the convention
pub fn parse_entries(files: &[DirectoryEntry]) -> Vec<(&DirectoryEntry, ArchiveMetadata)> {
    files
        .iter()
        .filter_map(|file| match parse_archive_name(file.name()) {
            Ok(metadata) => Some((file, metadata)),
            Err(e) => {
                warn!("Skipping {}: {}", file.path, e);
                None
            }
        })
        .collect()
}

/// Pick the archive for `software` and `tag` among `files`
pub fn select_target(
    files: &[DirectoryEntry],
    software: &str,
    tag: &str,
) -> Option<DirectoryEntry> {
    let parsed = parse_entries(files);
    let mut candidates = parsed
        .iter()
        .filter(|(_, metadata)| metadata.software == software)
        .map(|(file, metadata)| (*file, metadata));

    if tag == LATEST_TAG {
        most_recent(candidates.map(|(file, _)| file)).cloned()
    } else {
        candidates
            .find(|(_, metadata)| metadata.tag == tag)
            .map(|(file, _)| file.clone())
    }
}

/// Resolve a single archive for `software` and `tag` within `subpath`
pub async fn resolve_target(
    listing: &ListingClient,
    subpath: &str,
    software: &str,
    tag: &str,
) -> Option<DirectoryEntry> {
    let files = listing.list_files(subpath).await;
    select_target(&files, software, tag)
}

/// Tags available for `software`, plus a synthetic `latest` carrying the
/// newest build date, ordered by date descending. `latest` is always present.
pub fn summarize_targets(files: &[DirectoryEntry], software: &str) -> Vec<TargetSummary> {
    let mut targets: Vec<TargetSummary> = parse_entries(files)
        .into_iter()
        .filter(|(_, metadata)| metadata.software == software)
        .map(|(_, metadata)| TargetSummary {
            tag: metadata.tag,
            date: metadata.date,
        })
        .collect();

    // With nothing matched, `latest` is still listed, dated 0001-01-01
    let latest_date = targets
        .iter()
        .map(|target| target.date)
        .max()
        .or_else(|| NaiveDate::from_ymd_opt(1, 1, 1));

    if let Some(date) = latest_date {
        targets.push(TargetSummary {
            tag: LATEST_TAG.to_string(),
            date,
        });
    }

    // Stable sort: equal dates keep listing order, with `latest` last
    targets.sort_by(|a, b| b.date.cmp(&a.date));
    targets
}

pub async fn list_targets(
    listing: &ListingClient,
    architecture: &str,
    software: &str,
    alias: &str,
) -> Vec<TargetSummary> {
    let subpath = resolve_subpath(listing, architecture, alias).await;
    let files = listing.list_files(&subpath).await;
    summarize_targets(&files, software)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::cache::TtlCache;
    use crate::storage::backend::MockStorageBackend;
    use chrono::{DateTime, TimeZone, Utc};
    use rstest::rstest;
    use std::sync::Arc;
    use std::time::Duration;

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn client(backend: MockStorageBackend) -> ListingClient {
        ListingClient::new(
            Arc::new(backend),
            Arc::new(TtlCache::new(Duration::from_secs(60))),
            vec![".txt".to_string()],
            Duration::from_secs(30),
        )
    }

    #[rstest]
    #[case("nightly", Channel::Nightly)]
    #[case("beta", Channel::Named("beta"))]
    #[case("stable", Channel::Named("stable"))]
    fn channel_from_alias(#[case] alias: &str, #[case] expected: Channel<'static>) {
        assert_eq!(Channel::from_alias(alias), expected);
    }

    #[rstest]
    #[case("ARMv7", "/ARMv7")]
    #[case("/ARMv7", "/ARMv7")]
    #[case("ARMv7/", "/ARMv7")]
    fn architecture_root_prefixes_slash(#[case] arch: &str, #[case] expected: &str) {
        assert_eq!(architecture_root(arch), expected);
    }

    #[test]
    fn most_recent_breaks_ties_by_greatest_path() {
        let entries = [
            DirectoryEntry::directory("/ARMv7/beta-2023-05-01", DateTime::<Utc>::UNIX_EPOCH),
            DirectoryEntry::directory("/ARMv7/beta-2023-06-01", DateTime::<Utc>::UNIX_EPOCH),
            DirectoryEntry::directory("/ARMv7/beta-2023-04-01", DateTime::<Utc>::UNIX_EPOCH),
        ];

        let result = most_recent(&entries).unwrap();

        assert_eq!(result.path, "/ARMv7/beta-2023-06-01");
    }

    #[tokio::test]
    async fn resolve_subpath_nightly_returns_root_without_listing() {
        let mut backend = MockStorageBackend::new();
        backend.expect_list().times(0);

        let client = client(backend);

        assert_eq!(resolve_subpath(&client, "ARMv7", "nightly").await, "/ARMv7");
    }

    #[tokio::test]
    async fn resolve_subpath_picks_most_recently_modified_matching_directory() {
        let mut backend = MockStorageBackend::new();
        backend
            .expect_list()
            .withf(|path| path == "/ARMv7")
            .times(1)
            .returning(|_| {
                Ok(vec![
                    DirectoryEntry::directory("/ARMv7/beta-2023-05-01", ts(2023, 5, 1)),
                    DirectoryEntry::directory("/ARMv7/beta-2023-04-01", ts(2023, 6, 1)),
                    DirectoryEntry::directory("/ARMv7/stable-2023-07-01", ts(2023, 7, 1)),
                    DirectoryEntry::file("/ARMv7/beta-notes", ts(2023, 8, 1)),
                ])
            });

        let client = client(backend);

        assert_eq!(
            resolve_subpath(&client, "ARMv7", "beta").await,
            "/ARMv7/beta-2023-04-01"
        );
    }

    #[tokio::test]
    async fn resolve_subpath_returns_empty_when_no_directory_matches() {
        let mut backend = MockStorageBackend::new();
        backend.expect_list().times(1).returning(|_| {
            Ok(vec![DirectoryEntry::directory(
                "/ARMv7/stable-2023-07-01",
                ts(2023, 7, 1),
            )])
        });

        let client = client(backend);

        assert_eq!(resolve_subpath(&client, "ARMv7", "beta").await, "");
    }

    fn release_files() -> Vec<DirectoryEntry> {
        vec![
            DirectoryEntry::file("/ARMv7/a-1-0-2020-01-01-r1", ts(2022, 1, 1)),
            DirectoryEntry::file("/ARMv7/a-1-0-2021-06-01-r2", ts(2020, 1, 1)),
            DirectoryEntry::file("/ARMv7/a-1-0-2020-12-31-r3", ts(2021, 1, 1)),
            DirectoryEntry::file("/ARMv7/b-1-0-2024-01-01-r9", ts(2024, 1, 1)),
            DirectoryEntry::file("/ARMv7/a-broken", ts(2025, 1, 1)),
        ]
    }

    #[test]
    fn select_target_latest_uses_modification_time_not_parsed_date() {
        let result = select_target(&release_files(), "a", "latest").unwrap();

        assert_eq!(result.path, "/ARMv7/a-1-0-2020-01-01-r1");
    }

    #[rstest]
    #[case("a", "r2", Some("/ARMv7/a-1-0-2021-06-01-r2"))]
    #[case("b", "r9", Some("/ARMv7/b-1-0-2024-01-01-r9"))]
    #[case("a", "r9", None)]
    #[case("c", "latest", None)]
    fn select_target_matches_software_and_tag(
        #[case] software: &str,
        #[case] tag: &str,
        #[case] expected: Option<&str>,
    ) {
        let result = select_target(&release_files(), software, tag);

        assert_eq!(result.as_ref().map(|e| e.path.as_str()), expected);
    }

    #[test]
    fn select_target_returns_first_match_for_duplicate_tags() {
        let files = vec![
            DirectoryEntry::file("/x/a-1-0-2020-01-01-r1", ts(2020, 1, 1)),
            DirectoryEntry::file("/x/a-2-0-2021-01-01-r1", ts(2021, 1, 1)),
        ];

        let result = select_target(&files, "a", "r1").unwrap();

        assert_eq!(result.path, "/x/a-1-0-2020-01-01-r1");
    }

    #[test]
    fn summarize_targets_sorts_by_date_descending_with_latest() {
        let result = summarize_targets(&release_files(), "a");

        assert_eq!(
            result,
            vec![
                TargetSummary {
                    tag: "r2".to_string(),
                    date: date(2021, 6, 1)
                },
                TargetSummary {
                    tag: "latest".to_string(),
                    date: date(2021, 6, 1)
                },
                TargetSummary {
                    tag: "r3".to_string(),
                    date: date(2020, 12, 31)
                },
                TargetSummary {
                    tag: "r1".to_string(),
                    date: date(2020, 1, 1)
                },
            ]
        );
    }

    #[test]
    fn summarize_targets_reports_only_latest_for_unknown_software() {
        assert_eq!(
            summarize_targets(&release_files(), "zzz"),
            vec![TargetSummary {
                tag: "latest".to_string(),
                date: date(1, 1, 1)
            }]
        );
    }

    #[tokio::test]
    async fn list_targets_for_unresolved_channel_reports_only_latest() {
        let mut backend = MockStorageBackend::new();
        backend.expect_list().times(1).returning(|_| Ok(vec![]));

        let client = client(backend);

        assert_eq!(
            list_targets(&client, "ARMv7", "a", "beta").await,
            vec![TargetSummary {
                tag: "latest".to_string(),
                date: date(1, 1, 1)
            }]
        );
    }
}
