//! Engine wiring from configuration.

use crate::config::AppConfig;
use crate::error::{CliError, Result};
use attest_engine::DecisionEngine;
use attest_llm::OllamaProvider;
use attest_store::InMemoryFragmentStore;
use std::time::Duration;
use tracing::info;

/// The engine the CLI drives: in-memory corpus, local Ollama model.
pub type CliEngine = DecisionEngine<InMemoryFragmentStore, OllamaProvider>;

/// Load the configured corpus.
pub fn load_store(config: &AppConfig) -> Result<InMemoryFragmentStore> {
    let path = config.corpus.path.as_ref().ok_or_else(|| {
        CliError::Config("No corpus configured. Set [corpus] path or pass --corpus".into())
    })?;

    let store = InMemoryFragmentStore::from_json_file(path, config.corpus.dimension)?
        .with_ef_search(config.corpus.ef_search);
    info!("Loaded {} chunk(s) from {}", store.len(), path.display());
    Ok(store)
}

/// Build a decision engine for one session.
pub fn build_engine(config: &AppConfig) -> Result<CliEngine> {
    let store = load_store(config)?;

    let llm = OllamaProvider::with_timeout(
        &config.ollama.endpoint,
        &config.ollama.model,
        Duration::from_secs(config.ollama.timeout_secs),
    )?
    .with_max_retries(config.ollama.max_retries)
    .with_temperature(config.ollama.temperature);
    info!("Using model '{}' at {}", llm.model(), config.ollama.endpoint);

    Ok(DecisionEngine::new(store, llm, config.engine.clone())?)
}
