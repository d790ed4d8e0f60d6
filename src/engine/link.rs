//! Share link resolution for a requested artifact

use tracing::{error, info};

use crate::engine::error::ResolveError;
use crate::engine::listing::ListingClient;
use crate::engine::target::{resolve_subpath, resolve_target};

/// Query tuple identifying one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    pub architecture: String,
    pub software: String,
    pub version_alias: String,
    /// Concrete build tag or `latest`
    pub tag: String,
}

impl ResolutionRequest {
    pub fn new(architecture: &str, software: &str, version_alias: &str, tag: &str) -> Self {
        Self {
            architecture: architecture.to_string(),
            software: software.to_string(),
            version_alias: version_alias.to_string(),
            tag: tag.to_string(),
        }
    }

    fn not_found(&self) -> ResolveError {
        ResolveError::NotFound {
            architecture: self.architecture.clone(),
            software: self.software.clone(),
            version: self.version_alias.clone(),
            tag: self.tag.clone(),
        }
    }
}

/// Resolve the request to an artifact and return its share link
///
/// Share links are cached per artifact path, so repeating a request within the
/// cache TTL never reaches the backend's sharing call again.
pub async fn resolve_link(
    listing: &ListingClient,
    request: &ResolutionRequest,
) -> Result<String, ResolveError> {
    let subpath = resolve_subpath(listing, &request.architecture, &request.version_alias).await;

    let Some(target) = resolve_target(listing, &subpath, &request.software, &request.tag).await
    else {
        info!("No artifact for {:?}", request);
        return Err(request.not_found());
    };

    listing.share_link(&target.path).await.map_err(|e| {
        error!("Failed to share {}: {}", target.path, e);
        ResolveError::Backend(e)
    })
}
