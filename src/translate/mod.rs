// Text translation boundary
//
// - ollama: `TextTranslator` over an Ollama `/api/generate` endpoint
// - batch: chunked, delimiter-joined batch translation with per-batch fallback

pub mod batch;
pub mod ollama;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub use batch::*;
use crate::config::TranslateConfig;
use crate::error::{Result, SubburnError};

/// External text translation capability
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextTranslator: Send + Sync {
    /// Translate one block of text into the target language
    async fn translate(&self, text: &str, target_language: &str) -> Result<String>;
}

/// Factory for creating translator instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    pub fn create_translator(config: TranslateConfig) -> Result<Arc<dyn TextTranslator>> {
        Ok(Arc::new(ollama::OllamaTranslator::new(config)?))
    }

    /// Batch adapter over the configured translator
    pub fn create_batch_translator(config: TranslateConfig) -> Result<BatchTranslator> {
        let provider = Self::create_translator(config.clone())?;
        Ok(BatchTranslator::new(provider, &config))
    }
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
struct TagModel {
    name: String,
}

/// Check if Ollama is available and the model is pulled
pub async fn check_ollama_availability(endpoint: &str, model: &str) -> Result<()> {
    let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
    let url = format!("{}/api/tags", endpoint.trim_end_matches('/'));

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| SubburnError::Translation(format!("Ollama not reachable at {}: {}", endpoint, e)))?;
    if !response.status().is_success() {
        return Err(SubburnError::Translation(format!(
            "Ollama returned {} for {}",
            response.status(),
            url
        )));
    }

    let tags: TagsResponse = response.json().await?;
    if !tags.models.iter().any(|m| m.name == model || m.name.starts_with(&format!("{}:", model))) {
        return Err(SubburnError::Translation(format!("Model '{}' is not available in Ollama", model)));
    }

    info!("Ollama is available with model {}", model);
    Ok(())
}
