use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::LanguageModel;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Adapter for Google Gemini text generation
pub struct GeminiAdapter {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    include_thoughts: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

/// Model advertised by the Gemini API
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Resource name, e.g. `models/gemini-flash-latest`
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    /// Model id usable in the `models.model` config key
    pub fn id(&self) -> &str {
        self.name.strip_prefix("models/").unwrap_or(&self.name)
    }

    pub fn supports_generation(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == "generateContent")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
    next_page_token: Option<String>,
}

impl GeminiAdapter {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: "gemini-flash-latest".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// List every model available to the configured API key, following pagination
    #[instrument(skip(self))]
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}/v1beta/models", self.base_url);
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(&url)
                .header("x-goog-api-key", &self.api_key);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let response = request
                .send()
                .await
                .context("Failed to send model list request to Gemini")?;

            let status = response.status();
            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();
                anyhow::bail!("Gemini API error ({}): {}", status, error_text);
            }

            let page: ListModelsResponse = response
                .json()
                .await
                .context("Failed to parse Gemini model list")?;
            models.extend(page.models);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(count = models.len(), "Listed Gemini models");

        Ok(models)
    }
}

#[async_trait]
impl LanguageModel for GeminiAdapter {
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.2,
                thinking_config: ThinkingConfig {
                    include_thoughts: false,
                },
            },
        };

        debug!("Sending request to Gemini API");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Gemini")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error ({}): {}", status, error_text);
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        let text = extract_text(generated);
        if text.trim().is_empty() {
            anyhow::bail!("Gemini returned an empty response");
        }

        info!(chars = text.len(), "Gemini generation complete");

        Ok(text)
    }
}

/// Concatenate the answer parts of the first candidate, skipping thoughts
fn extract_text(response: GenerateResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter(|p| !p.thought)
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_extract_text_skips_thoughts() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "thinking...", "thought": true},
                        {"text": "Summary line\n"},
                        {"text": "PRIORITY: [Minor]"}
                    ]
                }
            }]
        }))
        .unwrap();

        assert_eq!(extract_text(response), "Summary line\nPRIORITY: [Minor]");
    }

    #[test]
    fn test_extract_text_no_candidates() {
        let response: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(extract_text(response), "");
    }

    #[tokio::test]
    async fn test_complete() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-flash-latest:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "Overview.\nPRIORITY: [Major]"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = GeminiAdapter::new("test-key".to_string()).with_base_url(&server.uri());
        let text = adapter.complete("Summarize").await.unwrap();
        assert_eq!(text, "Overview.\nPRIORITY: [Major]");
    }

    #[tokio::test]
    async fn test_complete_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let adapter = GeminiAdapter::new("test-key".to_string()).with_base_url(&server.uri());
        let err = adapter.complete("Summarize").await.unwrap_err();
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn test_list_models_follows_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .and(header("x-goog-api-key", "test-key"))
            .and(query_param("pageToken", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [{
                    "name": "models/text-embedding-004",
                    "supportedGenerationMethods": ["embedContent"]
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [{
                    "name": "models/gemini-flash-latest",
                    "displayName": "Gemini Flash Latest",
                    "supportedGenerationMethods": ["generateContent", "countTokens"]
                }],
                "nextPageToken": "page-2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = GeminiAdapter::new("test-key".to_string()).with_base_url(&server.uri());
        let models = adapter.list_models().await.unwrap();

        let ids: Vec<&str> = models.iter().map(ModelInfo::id).collect();
        assert_eq!(ids, vec!["gemini-flash-latest", "text-embedding-004"]);
        assert!(models[0].supports_generation());
        assert!(!models[1].supports_generation());
        assert_eq!(models[0].display_name.as_deref(), Some("Gemini Flash Latest"));
    }

    #[tokio::test]
    async fn test_list_models_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let adapter = GeminiAdapter::new("bad-key".to_string()).with_base_url(&server.uri());
        let err = adapter.list_models().await.unwrap_err();
        assert!(err.to_string().contains("403"));
    }
}
