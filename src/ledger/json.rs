use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::Ledger;
use crate::models::RepositoryId;

/// JSON file ledger: one object mapping `owner/name` to the announced tag.
///
/// The whole document is rewritten through a temporary file on every
/// `record`, so a crash leaves either the old or the new version on disk.
pub struct JsonLedger {
    path: PathBuf,
    entries: BTreeMap<RepositoryId, String>,
}

impl JsonLedger {
    /// Open the ledger at `path`. A missing file is an empty ledger.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read ledger: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse ledger: {}", path.display()))?
        } else {
            BTreeMap::new()
        };

        info!(path = %path.display(), entries = entries.len(), "Opened JSON ledger");

        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create ledger directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(&self.entries)?;
        let tmp_path = self.path.with_extension("json.tmp");

        let mut file = File::create(&tmp_path)
            .with_context(|| format!("Failed to write ledger: {}", tmp_path.display()))?;
        file.write_all(content.as_bytes())?;
        file.sync_all()
            .with_context(|| format!("Failed to flush ledger: {}", tmp_path.display()))?;

        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace ledger: {}", self.path.display()))?;

        Ok(())
    }
}

impl Ledger for JsonLedger {
    fn last_announced(&self, repo: &RepositoryId) -> Option<&str> {
        self.entries.get(repo).map(String::as_str)
    }

    fn record(&mut self, repo: &RepositoryId, tag: &str) -> Result<()> {
        self.entries.insert(repo.clone(), tag.to_string());
        self.persist()?;

        debug!(repo = %repo, tag, "Recorded release in ledger");

        Ok(())
    }

    fn entries(&self) -> Vec<(RepositoryId, String)> {
        self.entries
            .iter()
            .map(|(repo, tag)| (repo.clone(), tag.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_missing_is_empty() {
        let dir = tempdir().unwrap();
        let ledger = JsonLedger::open(dir.path().join("known_releases.json")).unwrap();
        assert!(ledger.entries().is_empty());
    }

    #[test]
    fn test_record_persists_immediately() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("known_releases.json");
        let repo = RepositoryId::normalize("acme/widget");

        let mut ledger = JsonLedger::open(&path).unwrap();
        ledger.record(&repo, "v1.1.0").unwrap();

        let reopened = JsonLedger::open(&path).unwrap();
        assert_eq!(reopened.last_announced(&repo), Some("v1.1.0"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_reads_flat_object() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("known_releases.json");
        fs::write(&path, r#"{"acme/widget": "v1.0.0", "tokio-rs/tokio": "tokio-1.40.0"}"#).unwrap();

        let ledger = JsonLedger::open(&path).unwrap();
        assert_eq!(
            ledger.last_announced(&RepositoryId::normalize("acme/widget")),
            Some("v1.0.0")
        );
        assert_eq!(ledger.entries().len(), 2);
    }

    #[test]
    fn test_rewrite_keeps_other_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("known_releases.json");
        fs::write(&path, r#"{"gone/repo": "v0.1.0"}"#).unwrap();

        let mut ledger = JsonLedger::open(&path).unwrap();
        ledger
            .record(&RepositoryId::normalize("acme/widget"), "v2.0.0")
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let map: BTreeMap<String, String> = serde_json::from_str(&content).unwrap();
        assert_eq!(map["gone/repo"], "v0.1.0");
        assert_eq!(map["acme/widget"], "v2.0.0");
    }

    #[test]
    fn test_corrupt_ledger_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("known_releases.json");
        fs::write(&path, "not json").unwrap();
        assert!(JsonLedger::open(&path).is_err());
    }
}
