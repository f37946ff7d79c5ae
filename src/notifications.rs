use std::collections::BTreeMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ForumConfig;
use crate::models::Priority;

/// Appended to content cut at the length limit
pub const TRUNCATION_MARKER: &str = "...";

/// Destination for release digests
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Post a new thread. Any error means nothing was delivered.
    async fn deliver(&self, title: &str, body: &str, tags: &[String]) -> Result<()>;
}

/// Fixed priority to forum tag id table
#[derive(Debug, Clone)]
pub struct PriorityTags {
    ids: BTreeMap<Priority, String>,
}

impl PriorityTags {
    pub fn new(ids: BTreeMap<Priority, String>) -> Self {
        Self { ids }
    }

    pub fn from_config(config: &ForumConfig) -> Self {
        Self::new(config.tags.clone())
    }

    /// Tag ids for a priority, falling back to the `Bugfix` id
    pub fn tags_for(&self, priority: Priority) -> Vec<String> {
        self.ids
            .get(&priority)
            .or_else(|| self.ids.get(&Priority::Bugfix))
            .cloned()
            .into_iter()
            .collect()
    }
}

/// Discord forum channel webhook notifier
pub struct DiscordNotifier {
    client: Client,
    webhook_url: String,
    max_content_chars: usize,
}

#[derive(Debug, Serialize)]
struct ForumPost<'a> {
    content: &'a str,
    thread_name: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    applied_tags: &'a [String],
}

impl DiscordNotifier {
    pub fn new(webhook_url: String, max_content_chars: usize) -> Self {
        Self {
            client: Client::new(),
            webhook_url,
            max_content_chars,
        }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn deliver(&self, title: &str, body: &str, tags: &[String]) -> Result<()> {
        debug!(thread = title, "Sending Discord forum post");

        let content = truncate_content(body, self.max_content_chars);
        let post = ForumPost {
            content: &content,
            thread_name: title,
            applied_tags: tags,
        };

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&post)
            .send()
            .await
            .context("Failed to send Discord webhook")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Discord webhook failed");
            anyhow::bail!("Discord webhook returned error: {} - {}", status, body);
        }

        info!(thread = title, "Discord forum post created");
        Ok(())
    }
}

/// Cut `body` to `limit` characters, appending the truncation marker when cut
pub fn truncate_content(body: &str, limit: usize) -> String {
    match body.char_indices().nth(limit) {
        Some((end, _)) => format!("{}{}", &body[..end], TRUNCATION_MARKER),
        None => body.to_string(),
    }
}
