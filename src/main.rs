use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use release_pulse::{
    Config, CredentialSources, Credentials, DiscordNotifier, GeminiAdapter, GitHubClient,
    JsonLedger, Ledger, ModelAdapter, Orchestrator, PriorityTags, Provider, RepoList,
    ReportTarget, StartupError, Summarizer,
};

#[derive(Parser)]
#[command(name = "release-pulse")]
#[command(about = "Announce new GitHub releases as LLM-written digests on a Discord forum")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(long, global = true, default_value = ".release-pulse/config.yml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every listed repository once and announce new releases
    Check {
        /// Print digests instead of posting them; the ledger is left untouched
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        credentials: CredentialArgs,
    },

    /// Show the last announced tag of each repository
    Ledger,

    /// List Gemini models available to the API key
    Models {
        /// Gemini API key
        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
        gemini_api_key: Option<String>,

        /// Include models that cannot generate content
        #[arg(long)]
        all: bool,
    },
}

#[derive(Args)]
struct CredentialArgs {
    /// GitHub API token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Gemini API key (provider: gemini)
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// Anthropic API key (provider: claude)
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    anthropic_api_key: Option<String>,

    /// Discord forum channel webhook URL
    #[arg(long, env = "DISCORD_WEBHOOK_URL", hide_env_values = true)]
    discord_webhook_url: Option<String>,
}

impl From<CredentialArgs> for CredentialSources {
    fn from(args: CredentialArgs) -> Self {
        Self {
            github_token: args.github_token,
            gemini_api_key: args.gemini_api_key,
            anthropic_api_key: args.anthropic_api_key,
            discord_webhook_url: args.discord_webhook_url,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Values from a local .env file; the real environment takes precedence
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("release_pulse=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Check {
            dry_run,
            credentials,
        } => {
            run_check(&config, credentials.into(), dry_run).await?;
        }
        Commands::Ledger => {
            show_ledger(&config)?;
        }
        Commands::Models {
            gemini_api_key,
            all,
        } => {
            list_models(&config, gemini_api_key, all).await?;
        }
    }

    Ok(())
}

async fn run_check(config: &Config, sources: CredentialSources, dry_run: bool) -> Result<()> {
    let credentials = Credentials::resolve(sources, config.models.provider, !dry_run)?;
    let repos = RepoList::new(&config.paths.repo_list).list()?;
    let ledger = JsonLedger::open(&config.paths.ledger)?;

    let github = GitHubClient::new(&credentials.github_token, &config.github.api_base)?;
    let model = ModelAdapter::from_config(&config.models, credentials.model_api_key.clone());
    let notifier = DiscordNotifier::new(
        credentials.discord_webhook_url.clone().unwrap_or_default(),
        config.forum.max_content_chars,
    );

    let mut orchestrator = Orchestrator::new(
        github,
        Summarizer::new(model, config.models.max_output_chars),
        notifier,
        PriorityTags::from_config(&config.forum),
        ledger,
    )
    .with_concurrency(config.github.max_concurrent_lookups)
    .with_report(ReportTarget {
        path: config.paths.report.clone(),
        title: config.report.title.clone(),
    })
    .dry_run(dry_run);

    let outcome = orchestrator.run(&repos).await;

    if dry_run {
        for digest in &outcome.announced {
            println!("## {} [{}]\n\n{}\n", digest.title(), digest.priority, digest.summary);
        }
    }

    info!(
        announced = outcome.announced.len(),
        failed = outcome.failed,
        "Done"
    );

    Ok(())
}

fn show_ledger(config: &Config) -> Result<()> {
    let ledger = JsonLedger::open(&config.paths.ledger)?;
    let entries = ledger.entries();

    if entries.is_empty() {
        println!("No releases announced yet.");
        return Ok(());
    }

    println!("Announced releases ({}):\n", ledger.path().display());
    for (repo, tag) in entries {
        println!("  {:<40} {}", repo, tag);
    }

    Ok(())
}

async fn list_models(config: &Config, api_key: Option<String>, all: bool) -> Result<()> {
    let api_key = api_key
        .filter(|key| !key.trim().is_empty())
        .ok_or(StartupError::MissingCredential("GEMINI_API_KEY"))?;

    let mut adapter = GeminiAdapter::new(api_key);
    if config.models.provider == Provider::Gemini {
        if let Some(base_url) = &config.models.base_url {
            adapter = adapter.with_base_url(base_url);
        }
    }

    let models = adapter.list_models().await?;
    let shown: Vec<_> = models
        .iter()
        .filter(|m| all || m.supports_generation())
        .collect();

    if shown.is_empty() {
        println!("No models available.");
        return Ok(());
    }

    for model in shown {
        println!(
            "  {:<40} {}",
            model.id(),
            model.supported_generation_methods.join(", ")
        );
    }

    Ok(())
}
