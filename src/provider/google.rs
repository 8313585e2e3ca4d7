use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::domain::ProblemSpec;
use crate::provider::traits::{GenerationError, Provider};
use crate::provider::{build_prompt, extract_code, post_json};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug)]
pub struct GoogleProvider {
    api_key: String,
    model: String,
    base_prompt: String,
    http_client: Client,
}

impl GoogleProvider {
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
impl Provider for GoogleProvider {
    #[tracing::instrument(skip(self, problem), fields(title = %problem.title), level = "debug")]
    async fn generate(&self, problem: &ProblemSpec) -> Result<String, GenerationError> {
        let request_body = json!({
            "contents": [
                { "parts": [{ "text": build_prompt(&self.base_prompt, problem) }] },
            ],
        });

        let request = self
            .http_client
            .post(format!("{}/{}:generateContent", BASE_URL, self.model))
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body);

        let response: Value = post_json(request, "Google").await?;

        let completion = response
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .ok_or_else(|| GenerationError::MalformedResponse {
                msg: "no candidate text in Google response".to_string(),
            })?;

        extract_code(completion).ok_or(GenerationError::EmptyCompletion)
    }
}
