pub mod adapters;
pub mod config;
pub mod error;
pub mod github;
pub mod ledger;
pub mod models;
pub mod notifications;
pub mod orchestrator;
pub mod sources;
pub mod summarizer;

pub use adapters::{ClaudeAdapter, GeminiAdapter, LanguageModel, ModelAdapter, ModelInfo};
pub use config::{Config, CredentialSources, Credentials, Provider};
pub use error::StartupError;
pub use github::{GitHubClient, ReleaseSource};
pub use ledger::{JsonLedger, Ledger};
pub use models::*;
pub use notifications::{DiscordNotifier, Notifier, PriorityTags};
pub use orchestrator::{generate_report, Orchestrator, ReportTarget};
pub use sources::RepoList;
pub use summarizer::Summarizer;
