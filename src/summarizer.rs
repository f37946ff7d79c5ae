//! Turns release notes into a bounded Markdown digest with a priority.
//!
//! The model is asked to end its answer with a `PRIORITY: [<level>]` line.
//! Only the text after the last occurrence of that marker is treated as the
//! priority, and everything from the marker on is dropped from the summary.

use tracing::{info, instrument, warn};

use crate::adapters::LanguageModel;
use crate::models::{Digest, Priority, ReleaseInfo};

/// Trailing line the model must emit, followed by the priority level
pub const PRIORITY_MARKER: &str = "PRIORITY:";

pub struct Summarizer<M: LanguageModel> {
    model: M,
    max_output_chars: usize,
}

impl<M: LanguageModel> Summarizer<M> {
    pub fn new(model: M, max_output_chars: usize) -> Self {
        Self {
            model,
            max_output_chars,
        }
    }

    /// Summarize a release. Never fails: backend errors become a visible note.
    #[instrument(skip(self, release), fields(repo = %release.repository, tag = %release.tag))]
    pub async fn summarize(&self, release: &ReleaseInfo) -> Digest {
        let header = release_header(release);

        if release.body.trim().is_empty() {
            info!("Release has no notes, skipping model call");
            return Digest {
                repository: release.repository.clone(),
                tag: release.tag.clone(),
                summary: format!("{}\n- No release notes provided.", header),
                priority: Priority::Bugfix,
            };
        }

        let prompt = build_prompt(release, self.max_output_chars);

        match self.model.complete(&prompt).await {
            Ok(response) => {
                let full = format!("{}\n\n{}\n", header, response.trim());
                let (summary, priority) = split_priority(&full);
                info!(priority = %priority, "Summarized release");
                Digest {
                    repository: release.repository.clone(),
                    tag: release.tag.clone(),
                    summary,
                    priority,
                }
            }
            Err(e) => {
                warn!(error = %e, "Summarization failed");
                Digest {
                    repository: release.repository.clone(),
                    tag: release.tag.clone(),
                    summary: format!("{}\n- Error generating summary: {:#}", header, e),
                    priority: Priority::Bugfix,
                }
            }
        }
    }
}

/// Bold header line, linked to the release page when a URL is known
pub fn release_header(release: &ReleaseInfo) -> String {
    if release.url.is_empty() {
        format!("**{}** {}", release.repository, release.tag)
    } else {
        format!(
            "**[{} {}]({})**",
            release.repository, release.tag, release.url
        )
    }
}

pub fn build_prompt(release: &ReleaseInfo, max_output_chars: usize) -> String {
    format!(
        r#"You are a senior developer advocate. Analyze the provided GitHub release notes.

Repository: {repo}
Tag: {tag}

Release Notes:
{body}

Extract:
Summary: A 2-sentence overview of the release.
Highlights: Top 3 most important features or fixes.
Breaking Changes: A clear warning if any are present.
Priority: One of [Breaking, Major, Minor, Bugfix] based on the semantic version and content.

Output must be clean Markdown.
CRITICAL: The total output MUST be under {max_output_chars} characters. Be concise.
At the very end of the response, on a new line, output: "{marker} [Priority]""#,
        repo = release.repository,
        tag = release.tag,
        body = release.body,
        marker = PRIORITY_MARKER,
    )
}

/// Split a model answer into the displayed summary and its priority.
///
/// Without a marker the text is returned untouched with `Bugfix`.
pub fn split_priority(text: &str) -> (String, Priority) {
    let Some(idx) = text.rfind(PRIORITY_MARKER) else {
        return (text.to_string(), Priority::Bugfix);
    };

    let summary = text[..idx].trim().to_string();
    let token = text[idx + PRIORITY_MARKER.len()..]
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .replace(['[', ']'], "");

    (summary, Priority::from_token(&token))
}
