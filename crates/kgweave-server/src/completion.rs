//! Completion source: the language model that turns a prompt into tuple text.
//!
//! The model is treated as an opaque text producer. Whatever it returns goes
//! through the tuple extractor, so malformed output only shrinks the result.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// System prompt sent to the model. `$prompt` is replaced by the user's text.
pub const PROMPT_TEMPLATE: &str = "\
You are a knowledge graph builder. Read the text below and extract the facts it states \
as relationships between entities.

Reply with one relationship per line, using exactly this format and nothing else:
(subject, relation, object)

Use short entity names and camelCase relation names, for example:
(Paris, capitalOf, France)
(Eiffel Tower, locatedIn, Paris)

Text:
$prompt";

/// Fills the template with the user's prompt.
pub fn render_prompt(prompt: &str) -> String {
    PROMPT_TEMPLATE.replacen("$prompt", prompt, 1)
}

/// Produces free text for a prompt.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionSource: Send + Sync + std::fmt::Debug {
    async fn complete(&self, prompt: &str) -> ServerResult<String>;
}

/// Sampling parameters for chat completion requests.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionParams {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: f64,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
}

impl CompletionParams {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            model: config.completion_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    #[serde(flatten)]
    params: &'a CompletionParams,
    messages: Vec<ChatMessage<'a>>,
}

/// OpenRouter (OpenAI-compatible) chat completion client.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    api_url: String,
    api_key: Option<String>,
    params: CompletionParams,
    client: Client,
}

impl OpenRouterClient {
    pub fn new(config: &ServerConfig) -> ServerResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ServerError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_url: config.completion_api_url.clone(),
            api_key: config.completion_api_key.clone(),
            params: CompletionParams::from_config(config),
            client,
        })
    }

    /// Pulls a readable message out of a provider error body.
    fn provider_error(body: &str) -> String {
        serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
            .unwrap_or_else(|| body.to_string())
    }
}

#[async_trait]
impl CompletionSource for OpenRouterClient {
    async fn complete(&self, prompt: &str) -> ServerResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ServerError::ConfigError("OPENROUTER_API_KEY is not set".to_string()))?;

        let request = ChatRequest {
            params: &self.params,
            messages: vec![ChatMessage {
                role: "system",
                content: render_prompt(prompt),
            }],
        };

        debug!(model = %self.params.model, "Requesting completion");
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .header("X-Title", "KnowledgeGraph GPT")
            .json(&request)
            .send()
            .await
            .map_err(|e| ServerError::CompletionError(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = Self::provider_error(&body);
            error!(%status, "Completion request failed: {}", message);
            return Err(ServerError::CompletionError(format!("status {}: {}", status, message)));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| ServerError::CompletionError(format!("invalid response: {}", e)))?;
        Ok(data["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }
}
