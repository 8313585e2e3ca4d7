use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::domain::ProblemSpec;
use crate::provider::traits::{GenerationError, Provider};
use crate::provider::{build_prompt, extract_code, post_json};

const BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug)]
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    base_prompt: String,
    http_client: Client,
}

impl OpenAiProvider {
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
impl Provider for OpenAiProvider {
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
            .post(format!("{}/chat/completions", BASE_URL))
            .bearer_auth(&self.api_key)
            .json(&request_body);

        let response: Value = post_json(request, "OpenAI").await?;

        let completion = response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| GenerationError::MalformedResponse {
                msg: "no message content in OpenAI response".to_string(),
            })?;

        extract_code(completion).ok_or(GenerationError::EmptyCompletion)
    }
}
