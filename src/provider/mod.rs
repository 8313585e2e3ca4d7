mod anthropic;
mod google;
mod mistral;
mod openai;
pub mod traits;

use std::sync::Arc;

use serde_json::Value;

use crate::config::Config;
use crate::domain::ProblemSpec;
use crate::error::RunError;
use crate::provider::anthropic::AnthropicProvider;
use crate::provider::google::GoogleProvider;
use crate::provider::mistral::MistralProvider;
use crate::provider::openai::OpenAiProvider;
use crate::provider::traits::{GenerationError, Provider};

/// Registry lookup keyed by the configured provider name. Unknown names are
/// fatal before any problem is processed.
pub fn provider_for(config: &Config) -> Result<Arc<dyn Provider>, RunError> {
    let provider: Arc<dyn Provider> = match config.provider.as_str() {
        "openai" => Arc::new(OpenAiProvider::new(
            config.api_key.clone(),
            config.model.clone(),
            config.base_prompt.clone(),
        )),
        "anthropic" => Arc::new(AnthropicProvider::new(
            config.api_key.clone(),
            config.model.clone(),
            config.base_prompt.clone(),
        )),
        "google" => Arc::new(GoogleProvider::new(
            config.api_key.clone(),
            config.model.clone(),
            config.base_prompt.clone(),
        )),
        "mistral" => Arc::new(MistralProvider::new(
            config.api_key.clone(),
            config.model.clone(),
            config.base_prompt.clone(),
        )),
        other => return Err(RunError::UnknownProvider(other.to_string())),
    };
    Ok(provider)
}

/// One prompt shape for every provider, so results stay comparable across
/// services.
pub(crate) fn build_prompt(base_prompt: &str, problem: &ProblemSpec) -> String {
    let mut prompt = format!("{}\n\nProblem: {}\n", base_prompt, problem.title);
    if let Some(description) = &problem.description {
        prompt.push('\n');
        prompt.push_str(description);
        prompt.push('\n');
    }
    prompt.push_str(&format!(
        "\nTime limit: {} s. Memory limit: {} MB.\n",
        problem.time_limit, problem.memory_limit
    ));
    prompt
}

/// Pulls the solution out of a completion: the first fenced code block if
/// there is one, the whole reply otherwise. `None` means the model produced
/// nothing usable.
pub(crate) fn extract_code(completion: &str) -> Option<String> {
    let trimmed = completion.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Some(fence) = trimmed.find("```") else {
        return Some(trimmed.to_string());
    };

    // Skip the fence line itself (it may carry a language tag).
    let after_fence = &trimmed[fence + 3..];
    let body = match after_fence.find('\n') {
        Some(newline) => &after_fence[newline + 1..],
        None => return None,
    };

    let code = match body.find("```") {
        Some(end) => &body[..end],
        None => body,
    };

    let code = code.trim_end();
    if code.is_empty() {
        None
    } else {
        Some(code.to_string())
    }
}

/// Shared POST-and-decode step for every HTTP provider.
pub(crate) async fn post_json(
    request: reqwest::RequestBuilder,
    provider: &str,
) -> Result<Value, GenerationError> {
    let response = request.send().await.map_err(|e| GenerationError::Http {
        msg: format!("{} request failed: {}", provider, e),
    })?;

    let status = response.status();
    if !status.is_success() {
        let msg = response.text().await.unwrap_or_default();
        return Err(GenerationError::Api {
            status: status.as_u16(),
            msg,
        });
    }

    response
        .json()
        .await
        .map_err(|e| GenerationError::MalformedResponse {
            msg: format!("{} response was not JSON: {}", provider, e),
        })
}
