use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4";
const DEFAULT_MAX_TOKENS: usize = 800;
const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("OPENAI_API_KEY is not configured")]
    MissingApiKey,

    #[error("OpenAI API error: {0}")]
    Api(String),

    #[error("OpenAI returned no completion choices")]
    EmptyCompletion,

    #[error("invalid OpenAI response: {0}")]
    InvalidResponse(String),
}

/// Configuration for the completion relay.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.is_empty()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: usize,
}

#[derive(Debug, Serialize, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// One failed send attempt. Transport failures (connection setup, client
/// configuration) are retriable via the fallback path; API-level failures
/// are not.
enum SendAttemptError {
    Transport(String),
    Api(LlmError),
}

impl SendAttemptError {
    fn describe(&self) -> String {
        match self {
            SendAttemptError::Transport(msg) => msg.clone(),
            SendAttemptError::Api(err) => err.to_string(),
        }
    }
}

/// Trait for chat-completion providers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Relay a system + user message pair and return the model's text answer.
    async fn complete(&self, user_message: &str, system_prompt: &str) -> Result<String, LlmError>;
}

/// OpenAI chat-completion provider with a one-shot fallback transport.
pub struct OpenAiProvider {
    config: LlmConfig,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(config: LlmConfig) -> Self {
        // No explicit timeout: the completion call runs on the transport
        // default.
        Self {
            config,
            client: Client::new(),
        }
    }

    fn api_key(&self) -> Result<&str, LlmError> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(LlmError::MissingApiKey)
    }

    /// Single source of truth for the request payload, shared by the primary
    /// and fallback transports.
    fn build_request(&self, user_message: &str, system_prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_message.to_string(),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }

    async fn send_via(
        &self,
        client: &Client,
        api_key: &str,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, SendAttemptError> {
        let response = client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| SendAttemptError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SendAttemptError::Api(LlmError::Api(format!(
                "HTTP {}: {}",
                status, error_text
            ))));
        }

        response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| SendAttemptError::Api(LlmError::InvalidResponse(e.to_string())))
    }

    fn extract_answer(response: ChatCompletionResponse) -> Result<String, LlmError> {
        let content = response
            .choices
            .first()
            .ok_or(LlmError::EmptyCompletion)?
            .message
            .content
            .clone();

        if let Some(usage) = response.usage {
            info!(
                "Completion generated. Tokens: {} prompt + {} completion = {} total",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        Ok(content)
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, user_message: &str, system_prompt: &str) -> Result<String, LlmError> {
        let api_key = self.api_key()?;
        let request = self.build_request(user_message, system_prompt);

        info!(
            "Sending completion request to OpenAI (model: {}, max_tokens: {})",
            self.config.model, self.config.max_tokens
        );

        let response = match self.send_via(&self.client, api_key, &request).await {
            Ok(response) => response,
            Err(SendAttemptError::Api(err)) => return Err(err),
            Err(SendAttemptError::Transport(primary_err)) => {
                // Transport trouble on the shared client: retry exactly once
                // with a freshly built minimal client, same payload, same
                // endpoint.
                warn!(
                    "Primary OpenAI transport failed: {}. Retrying via direct HTTP POST",
                    primary_err
                );
                match self.send_via(&Client::new(), api_key, &request).await {
                    Ok(response) => response,
                    Err(fallback_err) => {
                        // Both attempts down: degrade to an in-band answer
                        // instead of failing the request.
                        warn!(
                            "Fallback OpenAI transport failed as well: {}",
                            fallback_err.describe()
                        );
                        return Ok(format!(
                            "Fehler bei der Kommunikation mit OpenAI: {} / erneuter Versuch: {}",
                            primary_err,
                            fallback_err.describe()
                        ));
                    }
                }
            }
        };

        Self::extract_answer(response)
    }
}
