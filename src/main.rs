use std::panic;
use std::path::Path;

use tracing_subscriber::EnvFilter;

use crate::domain::Language;
use crate::error::RunError;
use crate::pipeline::EvaluationPipeline;
use crate::runlog::RunLog;
use crate::sanitize::sanitize_filename;

mod config;
mod dataset;
mod domain;
mod error;
mod judge;
mod pipeline;
mod provider;
mod runlog;
mod sanitize;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    set_panic_hook();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());
    let config = config::load_config(Path::new(&config_path))?;

    let language = Language::parse(&config.language)
        .ok_or_else(|| RunError::UnknownLanguage(config.language.clone()))?;
    let judge = judge::judge_for(language)?;
    let provider = provider::provider_for(&config)?;

    std::fs::create_dir_all("benchmark").map_err(RunError::Workspace)?;
    let log_path = Path::new("benchmark").join(format!(
        "{}_{}_{}_log.json",
        sanitize_filename(&config.provider),
        sanitize_filename(&config.model),
        sanitize_filename(&config.language)
    ));

    let log = if config.continue_from_log {
        RunLog::resume(&log_path, &config)?
    } else {
        RunLog::create(&log_path, &config)?
    };

    let problems = dataset::load_problems(&config.dataset_path)?;
    let problems = dataset::filter_by_category(problems, config.categories.as_deref());
    let pending = dataset::skip_processed(problems, &log.state().processed_titles);
    let total = pending.len();
    tracing::info!("{} problems to evaluate", total);

    let mut pipeline = EvaluationPipeline::new(
        judge,
        provider,
        log,
        config.shots,
        config.ignore_time_limits,
    );

    for (index, problem) in pending.iter().enumerate() {
        pipeline.evaluate(problem, index, total).await?;
    }

    tracing::info!(
        "Run complete: {} problems passed",
        pipeline.state().total_passed
    );

    Ok(())
}

fn set_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        tracing::error!(
            message = "panic occurred",
            panic = %panic_info
        );
    }));
}
