pub mod json;

pub use json::JsonLedger;

use anyhow::Result;

use crate::models::RepositoryId;

/// Record of the last release tag announced for each repository
pub trait Ledger: Send + Sync {
    /// Tag most recently announced for a repository
    fn last_announced(&self, repo: &RepositoryId) -> Option<&str>;

    /// Record a delivered tag and persist it before returning
    fn record(&mut self, repo: &RepositoryId, tag: &str) -> Result<()>;

    /// All entries, ordered by repository
    fn entries(&self) -> Vec<(RepositoryId, String)>;
}
