use anyhow::Result;
use reqwest::Client;
use tracing::debug;

use crate::config::{Config, ModelBackend};
use crate::providers;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    pub model: String,
    pub prompt: String,
}

impl ModelRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
        }
    }
}

/// Sends one prompt to the configured backend and returns the cleaned answer.
pub async fn query(client: &Client, cfg: &Config, request: &ModelRequest) -> Result<String> {
    debug!(
        backend = cfg.backend.as_str(),
        model = %request.model,
        prompt_len = request.prompt.len(),
        "dispatching model query"
    );

    match cfg.backend {
        ModelBackend::Cli => {
            providers::ollama_cli::run(&cfg.runner, &request.model, &request.prompt).await
        }
        ModelBackend::Http => {
            providers::openai_compat::chat(client, &cfg.service, &request.model, &request.prompt)
                .await
        }
    }
}
