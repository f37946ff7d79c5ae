use std::fmt;

use serde::{Deserialize, Serialize};

/// URL prefixes stripped from repository locators, longest first
const GITHUB_PREFIXES: &[&str] = &["https://github.com/", "http://github.com/", "github.com/"];

/// Normalized `owner/name` identifier of a tracked repository
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepositoryId(String);

impl RepositoryId {
    /// Normalize a locator such as `https://github.com/acme/widget.git` into `acme/widget`
    pub fn normalize(locator: &str) -> Self {
        let mut id = locator.trim();
        id = id.strip_suffix('/').unwrap_or(id);
        id = id.strip_suffix(".git").unwrap_or(id);
        for prefix in GITHUB_PREFIXES {
            if let Some(rest) = id.strip_prefix(prefix) {
                id = rest;
                break;
            }
        }
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into owner and name, if the identifier has exactly that shape
    pub fn owner_and_name(&self) -> Option<(&str, &str)> {
        let (owner, name) = self.0.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some((owner, name))
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Latest release of a repository, as reported by the upstream API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub repository: RepositoryId,
    pub tag: String,
    /// Release notes; may be empty
    pub body: String,
    /// Link to the release page; may be empty
    pub url: String,
}

/// Severity classification of a release
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Breaking,
    Major,
    Minor,
    #[default]
    Bugfix,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Breaking,
        Priority::Major,
        Priority::Minor,
        Priority::Bugfix,
    ];

    /// Parse a marker token case-insensitively. Anything unrecognized is `Bugfix`.
    pub fn from_token(token: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(token.trim()))
            .unwrap_or(Priority::Bugfix)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Breaking => "breaking",
            Priority::Major => "major",
            Priority::Minor => "minor",
            Priority::Bugfix => "bugfix",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::Breaking => "Breaking",
            Priority::Major => "Major",
            Priority::Minor => "Minor",
            Priority::Bugfix => "Bugfix",
        };
        f.write_str(label)
    }
}

/// Summarized release, ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub repository: RepositoryId,
    pub tag: String,
    pub summary: String,
    pub priority: Priority,
}

impl Digest {
    /// Forum thread title
    pub fn title(&self) -> String {
        format!("{} {}", self.repository, self.tag)
    }
}

/// Counters for a single pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Digests delivered and recorded, in processing order
    pub announced: Vec<Digest>,
    /// Repositories whose latest tag was already announced
    pub unchanged: usize,
    /// Repositories with no usable release this run
    pub skipped: usize,
    /// Repositories that hit a delivery or persistence error
    pub failed: usize,
}

impl RunOutcome {
    pub fn has_announcements(&self) -> bool {
        !self.announced.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_variants() {
        let expected = RepositoryId::normalize("acme/widget");
        assert_eq!(expected.as_str(), "acme/widget");
        assert_eq!(RepositoryId::normalize("https://github.com/acme/widget.git"), expected);
        assert_eq!(RepositoryId::normalize("https://github.com/acme/widget"), expected);
        assert_eq!(RepositoryId::normalize("  acme/widget \n"), expected);
        assert_eq!(RepositoryId::normalize("github.com/acme/widget/"), expected);
    }

    #[test]
    fn test_owner_and_name() {
        let id = RepositoryId::normalize("octocat/hello-world");
        assert_eq!(id.owner_and_name(), Some(("octocat", "hello-world")));

        assert!(RepositoryId::normalize("invalid").owner_and_name().is_none());
        assert!(RepositoryId::normalize("too/many/parts").owner_and_name().is_none());
    }

    #[test]
    fn test_priority_from_token() {
        assert_eq!(Priority::from_token("Major"), Priority::Major);
        assert_eq!(Priority::from_token("BREAKING"), Priority::Breaking);
        assert_eq!(Priority::from_token(" minor "), Priority::Minor);
        assert_eq!(Priority::from_token("urgent"), Priority::Bugfix);
        assert_eq!(Priority::from_token(""), Priority::Bugfix);
    }

    #[test]
    fn test_digest_title() {
        let digest = Digest {
            repository: RepositoryId::normalize("acme/widget"),
            tag: "v1.1.0".to_string(),
            summary: String::new(),
            priority: Priority::Minor,
        };
        assert_eq!(digest.title(), "acme/widget v1.1.0");
    }
}
