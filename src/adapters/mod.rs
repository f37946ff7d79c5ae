pub mod claude;
pub mod gemini;

pub use claude::ClaudeAdapter;
pub use gemini::{GeminiAdapter, ModelInfo};

use anyhow::Result;
use async_trait::async_trait;

use crate::config::{ModelsConfig, Provider};

/// Text-in, text-out summarization backend
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Backend chosen at startup from `models.provider`
pub enum ModelAdapter {
    Gemini(GeminiAdapter),
    Claude(ClaudeAdapter),
}

impl ModelAdapter {
    pub fn from_config(config: &ModelsConfig, api_key: String) -> Self {
        match config.provider {
            Provider::Gemini => {
                let mut adapter = GeminiAdapter::new(api_key);
                if let Some(model) = &config.model {
                    adapter = adapter.with_model(model);
                }
                if let Some(base_url) = &config.base_url {
                    adapter = adapter.with_base_url(base_url);
                }
                ModelAdapter::Gemini(adapter)
            }
            Provider::Claude => {
                let mut adapter = ClaudeAdapter::new(api_key);
                if let Some(model) = &config.model {
                    adapter = adapter.with_model(model);
                }
                if let Some(base_url) = &config.base_url {
                    adapter = adapter.with_base_url(base_url);
                }
                ModelAdapter::Claude(adapter)
            }
        }
    }
}

#[async_trait]
impl LanguageModel for ModelAdapter {
    async fn complete(&self, prompt: &str) -> Result<String> {
        match self {
            ModelAdapter::Gemini(adapter) => adapter.complete(prompt).await,
            ModelAdapter::Claude(adapter) => adapter.complete(prompt).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_selects_provider() {
        let config = ModelsConfig::default();
        assert!(matches!(
            ModelAdapter::from_config(&config, "key".to_string()),
            ModelAdapter::Gemini(_)
        ));

        let config = ModelsConfig {
            provider: Provider::Claude,
            ..Default::default()
        };
        assert!(matches!(
            ModelAdapter::from_config(&config, "key".to_string()),
            ModelAdapter::Claude(_)
        ));
    }
}
