use anyhow::{Context, Result};
use async_trait::async_trait;
use octocrab::Octocrab;
use tracing::{debug, instrument, warn};

use crate::models::{ReleaseInfo, RepositoryId};

/// Lookup of the latest release of a repository.
///
/// Every failure is reported as `None` so that one repository never
/// affects the lookups of the others.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    async fn latest_release(&self, repo: &RepositoryId) -> Option<ReleaseInfo>;
}

/// GitHub REST client for release lookups
pub struct GitHubClient {
    client: Octocrab,
}

impl GitHubClient {
    /// Create a new GitHub client against `api_base` with the given token
    pub fn new(token: &str, api_base: &str) -> Result<Self> {
        let client = Octocrab::builder()
            .base_uri(api_base)
            .with_context(|| format!("Invalid GitHub API base URL: {}", api_base))?
            .personal_token(token.to_string())
            .build()
            .context("Failed to create GitHub client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ReleaseSource for GitHubClient {
    #[instrument(skip_all, fields(repo = %repo))]
    async fn latest_release(&self, repo: &RepositoryId) -> Option<ReleaseInfo> {
        let Some((owner, name)) = repo.owner_and_name() else {
            warn!("Repository is not in owner/name form, skipping lookup");
            return None;
        };

        let result = self
            .client
            .repos(owner, name)
            .releases()
            .get_latest()
            .await;

        match result {
            Ok(release) => {
                debug!(tag = %release.tag_name, "Fetched latest release");
                Some(ReleaseInfo {
                    repository: repo.clone(),
                    tag: release.tag_name,
                    body: release.body.unwrap_or_default(),
                    url: release.html_url.to_string(),
                })
            }
            Err(octocrab::Error::GitHub { source, .. })
                if source.status_code.as_u16() == 404 =>
            {
                warn!("No releases found or repository not found");
                None
            }
            Err(octocrab::Error::GitHub { source, .. }) => {
                warn!(
                    status = %source.status_code,
                    message = %source.message,
                    "GitHub returned an error for release lookup"
                );
                None
            }
            Err(e) => {
                warn!(error = %e, "Release lookup failed");
                None
            }
        }
    }
}
