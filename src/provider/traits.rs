use crate::domain::ProblemSpec;

#[derive(Clone, Debug)]
pub enum GenerationError {
    /// Transport-level failure before any response arrived.
    Http { msg: String },
    /// The service answered with a non-success status.
    Api { status: u16, msg: String },
    /// The response arrived but did not contain a completion where expected.
    MalformedResponse { msg: String },
    /// The model produced nothing usable.
    EmptyCompletion,
}

impl GenerationError {
    pub fn message(&self) -> String {
        match self {
            GenerationError::Http { msg } => format!("Request failed: {}", msg),
            GenerationError::Api { status, msg } => {
                format!("API error (status {}): {}", status, msg)
            }
            GenerationError::MalformedResponse { msg } => {
                format!("Malformed response: {}", msg)
            }
            GenerationError::EmptyCompletion => "Solution generation failed".to_string(),
        }
    }
}

/// A code-generation source. One implementation per third-party service,
/// selected once at startup.
#[mockall::automock]
#[async_trait::async_trait]
pub trait Provider: std::fmt::Debug + Send + Sync {
    async fn generate(&self, problem: &ProblemSpec) -> Result<String, GenerationError>;
}
