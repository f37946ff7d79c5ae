use std::path::PathBuf;

use thiserror::Error;

/// Conditions that abort a run before any network activity
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("{0} environment variable is not set")]
    MissingCredential(&'static str),

    #[error("repository list not found: {}", .0.display())]
    RepoListMissing(PathBuf),

    #[error("repository list contains no repositories: {}", .0.display())]
    EmptyRepoList(PathBuf),
}
