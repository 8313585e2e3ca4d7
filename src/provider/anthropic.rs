use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::domain::ProblemSpec;
use crate::provider::traits::{GenerationError, Provider};
use crate::provider::{build_prompt, extract_code, post_json};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

#[derive(Debug)]
pub struct AnthropicProvider {
    api_key: String,
    model: String,
    base_prompt: String,
    http_client: Client,
}

impl AnthropicProvider {
    pub fn new(api_key: String, model: String, base_prompt: String) -> Self {
        Self {
            api_key,
            model,
            base_prompt,
            http_client: Client::new(),
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    #[tracing::instrument(skip(self, problem), fields(title = %problem.title), level = "debug")]
    async fn generate(&self, problem: &ProblemSpec) -> Result<String, GenerationError> {
        let request_body = json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "messages": [
                { "role": "user", "content": build_prompt(&self.base_prompt, problem) },
            ],
        });

        let request = self
            .http_client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request_body);

        let response: Value = post_json(request, "Anthropic").await?;

        let completion = response
            .pointer("/content/0/text")
            .and_then(Value::as_str)
            .ok_or_else(|| GenerationError::MalformedResponse {
                msg: "no text content in Anthropic response".to_string(),
            })?;

        extract_code(completion).ok_or(GenerationError::EmptyCompletion)
    }
}
