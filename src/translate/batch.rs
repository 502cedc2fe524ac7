use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::TranslateConfig;
use crate::error::{Result, SubburnError};
use super::TextTranslator;

/// Translates ordered lists of texts in fixed-size batches.
///
/// Each batch is joined with the delimiter into a single request and split
/// back afterwards. A failed batch (provider error or a reply that does not
/// split into the batch's item count) keeps its original texts; later batches
/// still run.
#[derive(Clone)]
pub struct BatchTranslator {
    provider: Arc<dyn TextTranslator>,
    batch_size: usize,
    delimiter: String,
    batch_delay: Duration,
}

impl BatchTranslator {
    pub fn new(provider: Arc<dyn TextTranslator>, config: &TranslateConfig) -> Self {
        Self::with_options(
            provider,
            config.batch_size,
            config.delimiter.clone(),
            Duration::from_millis(config.batch_delay_ms),
        )
    }

    pub fn with_options(
        provider: Arc<dyn TextTranslator>,
        batch_size: usize,
        delimiter: String,
        batch_delay: Duration,
    ) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
            delimiter,
            batch_delay,
        }
    }

    /// Translate `texts`, returning the same number of strings in the same order.
    pub async fn translate_batch(&self, texts: &[String], target_language: &str) -> Result<Vec<String>> {
        if target_language.trim().is_empty() {
            return Err(SubburnError::Translation("target language is required".to_string()));
        }
        if self.delimiter.trim().is_empty() {
            return Err(SubburnError::Translation("batch delimiter must not be blank".to_string()));
        }

        let total_batches = texts.len().div_ceil(self.batch_size);
        info!("Translating {} texts to {} in {} batches", texts.len(), target_language, total_batches);

        let mut translated = Vec::with_capacity(texts.len());
        for (index, batch) in texts.chunks(self.batch_size).enumerate() {
            if index > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }

            match self.translate_chunk(batch, target_language).await {
                Ok(texts) => {
                    debug!("Batch {}/{} translated", index + 1, total_batches);
                    translated.extend(texts);
                }
                Err(e) => {
                    warn!("Batch {}/{} failed, keeping original text: {}", index + 1, total_batches, e);
                    translated.extend(batch.iter().cloned());
                }
            }
        }

        Ok(translated)
    }

    async fn translate_chunk(&self, batch: &[String], target_language: &str) -> Result<Vec<String>> {
        let joined = batch.join(&format!("\n{}\n", self.delimiter.trim()));
        let reply = self.provider.translate(&joined, target_language).await?;

        let parts = split_on_delimiter(&reply, &self.delimiter);
        if parts.len() != batch.len() {
            return Err(SubburnError::Translation(format!(
                "expected {} segments in reply, got {}",
                batch.len(),
                parts.len()
            )));
        }
        Ok(parts)
    }
}

/// Split a reply on the delimiter token, ignoring whitespace around it.
pub fn split_on_delimiter(reply: &str, delimiter: &str) -> Vec<String> {
    reply
        .split(delimiter.trim())
        .map(|part| part.trim().to_string())
        .collect()
}
