use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::error::StartupError;
use crate::models::RepositoryId;

/// Ordered list of repositories to track, read from a CSV file.
///
/// Only the first field of each record is used. Blank lines and records
/// starting with `#` are ignored.
pub struct RepoList {
    path: PathBuf,
}

impl RepoList {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Read and normalize every repository, in file order.
    ///
    /// A missing file or one without any repository is a startup error.
    pub fn list(&self) -> Result<Vec<RepositoryId>> {
        if !self.path.exists() {
            return Err(StartupError::RepoListMissing(self.path.clone()).into());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read repository list: {}", self.path.display()))?;

        let repos = parse_repo_list(&content)
            .with_context(|| format!("Failed to parse repository list: {}", self.path.display()))?;
        if repos.is_empty() {
            return Err(StartupError::EmptyRepoList(self.path.clone()).into());
        }

        info!(path = %self.path.display(), count = repos.len(), "Loaded repository list");

        Ok(repos)
    }
}

/// Parse repository list content, dropping comments and duplicates
pub fn parse_repo_list(content: &str) -> Result<Vec<RepositoryId>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut seen = HashSet::new();
    let mut repos = Vec::new();

    for record in reader.records() {
        let record = record.context("Malformed repository list record")?;
        let field = record.get(0).unwrap_or_default();
        if field.is_empty() || field.starts_with('#') {
            continue;
        }

        let repo = RepositoryId::normalize(field);
        if repo.owner_and_name().is_none() {
            warn!(entry = field, "Repository entry is not in owner/name form");
        }

        if seen.insert(repo.clone()) {
            repos.push(repo);
        } else {
            debug!(repo = %repo, "Skipping duplicate repository entry");
        }
    }

    Ok(repos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_repo_list() {
        let content = "\
# tracked projects
https://github.com/acme/widget.git,nightly
tokio-rs/tokio

#serde-rs/serde
https://github.com/acme/widget
";
        let repos = parse_repo_list(content).unwrap();
        let names: Vec<&str> = repos.iter().map(RepositoryId::as_str).collect();
        assert_eq!(names, vec!["acme/widget", "tokio-rs/tokio"]);
    }

    #[test]
    fn test_parse_quoted_fields() {
        let content = "\"https://github.com/acme/widget.git\",nightly\n\"tokio-rs/tokio\"\n  # indented comment\n";
        let repos = parse_repo_list(content).unwrap();
        let names: Vec<&str> = repos.iter().map(RepositoryId::as_str).collect();
        assert_eq!(names, vec!["acme/widget", "tokio-rs/tokio"]);
    }

    #[test]
    fn test_list_missing_file() {
        let dir = tempdir().unwrap();
        let err = RepoList::new(dir.path().join("repos.csv")).list().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StartupError>(),
            Some(StartupError::RepoListMissing(_))
        ));
    }

    #[test]
    fn test_list_only_comments() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("repos.csv");
        fs::write(&path, "# nothing yet\n\n").unwrap();

        let err = RepoList::new(&path).list().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StartupError>(),
            Some(StartupError::EmptyRepoList(_))
        ));
    }

    #[test]
    fn test_list_preserves_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("repos.csv");
        fs::write(&path, "b/two\na/one\nc/three\n").unwrap();

        let repos = RepoList::new(&path).list().unwrap();
        let names: Vec<&str> = repos.iter().map(RepositoryId::as_str).collect();
        assert_eq!(names, vec!["b/two", "a/one", "c/three"]);
    }
}
