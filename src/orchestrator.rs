use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::adapters::LanguageModel;
use crate::github::ReleaseSource;
use crate::ledger::Ledger;
use crate::models::{Digest, ReleaseInfo, RepositoryId, RunOutcome};
use crate::notifications::{Notifier, PriorityTags};
use crate::summarizer::Summarizer;

/// Separator between digests in the report
pub const REPORT_DELIMITER: &str = "\n---\n";

/// Where and under which title the run's digest report is written
#[derive(Debug, Clone)]
pub struct ReportTarget {
    pub path: PathBuf,
    pub title: String,
}

/// Result of handling one repository in the sequential phase
enum Step {
    Skipped,
    Unchanged,
    Announced(Digest),
    Failed,
}

/// Orchestrates the release check: lookup, summarize, deliver, record
pub struct Orchestrator<S, M, N, L>
where
    S: ReleaseSource,
    M: LanguageModel,
    N: Notifier,
    L: Ledger,
{
    source: S,
    summarizer: Summarizer<M>,
    notifier: N,
    tags: PriorityTags,
    ledger: L,
    max_concurrent_lookups: usize,
    report: Option<ReportTarget>,
    dry_run: bool,
}

impl<S, M, N, L> Orchestrator<S, M, N, L>
where
    S: ReleaseSource,
    M: LanguageModel,
    N: Notifier,
    L: Ledger,
{
    pub fn new(
        source: S,
        summarizer: Summarizer<M>,
        notifier: N,
        tags: PriorityTags,
        ledger: L,
    ) -> Self {
        Self {
            source,
            summarizer,
            notifier,
            tags,
            ledger,
            max_concurrent_lookups: 16,
            report: None,
            dry_run: false,
        }
    }

    pub fn with_concurrency(mut self, max_concurrent_lookups: usize) -> Self {
        self.max_concurrent_lookups = max_concurrent_lookups.max(1);
        self
    }

    pub fn with_report(mut self, report: ReportTarget) -> Self {
        self.report = Some(report);
        self
    }

    /// Summarize without delivering, recording, or writing a report
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run one pass over `repos`.
    ///
    /// All lookups finish before the first delivery. Deliveries and ledger
    /// writes then happen one repository at a time, in list order, and a
    /// tag is recorded only after its post succeeded.
    #[instrument(skip_all, fields(run_id = %Uuid::new_v4(), repos = repos.len()))]
    pub async fn run(&mut self, repos: &[RepositoryId]) -> RunOutcome {
        info!(dry_run = self.dry_run, "Checking repositories for new releases");

        let releases = self.fetch_all(repos).await;

        let mut outcome = RunOutcome::default();
        for (repo, release) in repos.iter().zip(releases) {
            match self.process(repo, release).await {
                Step::Skipped => outcome.skipped += 1,
                Step::Unchanged => outcome.unchanged += 1,
                Step::Announced(digest) => outcome.announced.push(digest),
                Step::Failed => outcome.failed += 1,
            }
        }

        if outcome.has_announcements() {
            if !self.dry_run {
                self.write_report(&outcome.announced);
            }
        } else {
            info!("No new releases detected");
        }

        info!(
            announced = outcome.announced.len(),
            unchanged = outcome.unchanged,
            skipped = outcome.skipped,
            failed = outcome.failed,
            "Release check complete"
        );

        outcome
    }

    /// Concurrent lookups, returned in the same order as `repos`
    async fn fetch_all(&self, repos: &[RepositoryId]) -> Vec<Option<ReleaseInfo>> {
        let source = &self.source;
        stream::iter(repos)
            .map(|repo| source.latest_release(repo))
            .buffered(self.max_concurrent_lookups)
            .collect()
            .await
    }

    async fn process(&mut self, repo: &RepositoryId, release: Option<ReleaseInfo>) -> Step {
        let Some(release) = release else {
            return Step::Skipped;
        };

        // Title, header, and ledger all carry the trimmed tag
        let release = ReleaseInfo {
            tag: release.tag.trim().to_string(),
            ..release
        };
        let tag = release.tag.as_str();
        if tag.is_empty() {
            warn!(repo = %repo, "Release has no usable tag, skipping");
            return Step::Skipped;
        }

        if self.ledger.last_announced(repo) == Some(tag) {
            debug!(repo = %repo, tag, "No new release");
            return Step::Unchanged;
        }

        info!(
            repo = %repo,
            tag,
            previous = self.ledger.last_announced(repo).unwrap_or("none"),
            "New release found"
        );

        let digest = self.summarizer.summarize(&release).await;

        if self.dry_run {
            return Step::Announced(digest);
        }

        let title = digest.title();
        let tags = self.tags.tags_for(digest.priority);

        if let Err(e) = self.notifier.deliver(&title, &digest.summary, &tags).await {
            error!(repo = %repo, tag = %digest.tag, error = %e, "Delivery failed, will retry next run");
            return Step::Failed;
        }

        info!(thread = %title, priority = %digest.priority, "Posted release digest");

        if let Err(e) = self.ledger.record(repo, tag) {
            error!(repo = %repo, tag = %digest.tag, error = %e, "Failed to persist ledger");
            return Step::Failed;
        }

        Step::Announced(digest)
    }

    fn write_report(&self, digests: &[Digest]) {
        let Some(target) = &self.report else {
            return;
        };

        let content = generate_report(&target.title, Utc::now(), digests);
        match save_report(&target.path, &content) {
            Ok(()) => info!(path = %target.path.display(), "Report saved"),
            Err(e) => error!(path = %target.path.display(), error = %e, "Failed to save report"),
        }
    }

    /// Get the ledger for direct access
    pub fn ledger(&self) -> &L {
        &self.ledger
    }
}

/// Generate the Markdown digest report for a run
pub fn generate_report(title: &str, generated_at: DateTime<Utc>, digests: &[Digest]) -> String {
    let mut md = String::new();

    md.push_str(&format!("# {}\n\n", title));
    md.push_str(&format!(
        "_Generated {}_\n\n",
        generated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    let entries: Vec<&str> = digests.iter().map(|d| d.summary.as_str()).collect();
    md.push_str(&entries.join(REPORT_DELIMITER));
    md.push('\n');

    md
}

/// Overwrite the report file, creating parent directories
pub fn save_report(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create report directory: {}", parent.display()))?;
    }
    fs::write(path, content)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    Ok(())
}
