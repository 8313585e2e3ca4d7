use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RunError;

/// Run configuration, read once at startup from a JSON file.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub provider: String,
    pub model: String,
    #[serde(default, skip_serializing)]
    pub api_key: String,
    pub language: String,
    #[serde(default = "default_base_prompt")]
    pub base_prompt: String,
    #[serde(default = "default_shots")]
    pub shots: u32,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub ignore_time_limits: bool,
    #[serde(default)]
    pub continue_from_log: bool,
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,
}

fn default_base_prompt() -> String {
    "You are a competitive programmer. Solve the following problem. \
     Read input from stdin and write the answer to stdout. \
     Reply with a single code block containing the full solution."
        .to_string()
}

fn default_shots() -> u32 {
    1
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("problems.jsonl")
}

pub fn load_config(path: &Path) -> Result<Config, RunError> {
    let raw = std::fs::read_to_string(path).map_err(|source| RunError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    let config: Config = serde_json::from_str(&raw).map_err(|e| RunError::ConfigInvalid {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if config.shots == 0 {
        return Err(RunError::ConfigInvalid {
            path: path.to_path_buf(),
            message: "shots must be at least 1".to_string(),
        });
    }

    Ok(config)
}
