use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::domain::ProblemSpec;
use crate::provider::traits::{GenerationError, Provider};
use crate::provider::{build_prompt, extract_code, post_json};

const CHAT_URL: &str = "https://api.mistral.ai/v1/chat/completions";

#[derive(Debug)]
pub struct MistralProvider {
    api_key: String,
    model: String,
    base_prompt: String,
    http_client: Client,
}

impl MistralProvider {
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
impl Provider for MistralProvider {
    #[tracing::instrument(skip(self, problem), fields(title = %problem.title), level = "debug")]
    async fn generate(&self, problem: &ProblemSpec) -> Result<String, GenerationError> {
        let request_body = json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": build_prompt(&self.base_prompt, problem) },
            ],
        });

        let request = self
            .http_client
            .post(CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&request_body);

        let response: Value = post_json(request, "Mistral").await?;

        let completion = response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| GenerationError::MalformedResponse {
                msg: "no message content in Mistral response".to_string(),
            })?;

        extract_code(completion).ok_or(GenerationError::EmptyCompletion)
    }
}
