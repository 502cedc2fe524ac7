// Speech-to-text boundary
//
// This module provides different speech engines through a factory pattern:
// - WhisperCpp: whisper.cpp command-line binary
// - WhisperHttp: OpenAI-compatible transcription server
//
// Engines only report raw chunks; `Transcriber` normalizes them into cues.

pub mod common;
pub mod whisper_cpp;
pub mod whisper_http;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub use common::*;
use crate::config::{TranscriberConfig, TranscriberEngine};
use crate::error::{Result, SubburnError};

/// External automatic-speech-recognition capability
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Recognize speech in mono f32 samples normalized to [-1.0, 1.0]
    async fn recognize(
        &self,
        samples: &[f32],
        sample_rate: u32,
        language: Option<String>,
        model: String,
    ) -> Result<EngineOutput>;
}

/// Transcription adapter: runs an engine and normalizes its output into cues
#[derive(Clone)]
pub struct Transcriber {
    engine: Arc<dyn SpeechEngine>,
}

impl Transcriber {
    pub fn new(engine: Arc<dyn SpeechEngine>) -> Self {
        Self { engine }
    }

    pub async fn transcribe(
        &self,
        samples: &[f32],
        sample_rate: u32,
        language_hint: Option<&str>,
        model: &str,
    ) -> Result<TranscriptionOutput> {
        if sample_rate == 0 {
            return Err(SubburnError::Transcription("sample rate must be positive".to_string()));
        }
        if samples.iter().any(|s| !s.is_finite()) {
            return Err(SubburnError::Transcription("audio contains non-finite samples".to_string()));
        }

        let language = normalize_language_hint(language_hint);
        let total_duration = samples.len() as f64 / sample_rate as f64;
        info!(
            "Transcribing {:.1}s of audio with model {} (language: {})",
            total_duration,
            model,
            language.as_deref().unwrap_or("auto")
        );

        let output = self
            .engine
            .recognize(samples, sample_rate, language.clone(), model.to_string())
            .await?;
        let cues = normalize_chunks(&output, total_duration);

        info!("Transcription produced {} cues", cues.len());
        Ok(TranscriptionOutput {
            cues,
            detected_language: output.language.or(language),
        })
    }
}

/// Factory for creating speech engine instances
pub struct SpeechEngineFactory;

impl SpeechEngineFactory {
    pub fn create_engine(config: TranscriberConfig) -> Result<Arc<dyn SpeechEngine>> {
        Ok(match config.engine {
            TranscriberEngine::WhisperCpp => Arc::new(whisper_cpp::WhisperCppEngine::new(config)),
            TranscriberEngine::WhisperHttp => Arc::new(whisper_http::WhisperHttpEngine::new(config)?),
        })
    }
}
