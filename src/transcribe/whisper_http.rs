use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::TranscriberConfig;
use crate::error::{Result, SubburnError};
use super::{encode_wav, EngineChunk, EngineOutput, SpeechEngine};

/// `verbose_json` response of an OpenAI-compatible transcription server
#[derive(Debug, Deserialize)]
pub struct VerboseTranscription {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub segments: Option<Vec<VerboseSegment>>,
}

#[derive(Debug, Deserialize)]
pub struct VerboseSegment {
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub text: String,
}

impl From<VerboseTranscription> for EngineOutput {
    fn from(response: VerboseTranscription) -> Self {
        EngineOutput {
            text: response.text,
            chunks: response.segments.map(|segments| {
                segments
                    .into_iter()
                    .map(|s| EngineChunk {
                        text: s.text,
                        start: s.start,
                        end: s.end,
                    })
                    .collect()
            }),
            language: response.language,
        }
    }
}

/// Engine backed by a whisper HTTP server (`/v1/audio/transcriptions`)
pub struct WhisperHttpEngine {
    client: Client,
    config: TranscriberConfig,
}

impl WhisperHttpEngine {
    pub fn new(config: TranscriberConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, config })
    }

    fn url(&self) -> String {
        format!("{}/v1/audio/transcriptions", self.config.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl SpeechEngine for WhisperHttpEngine {
    async fn recognize(
        &self,
        samples: &[f32],
        sample_rate: u32,
        language: Option<String>,
        model: String,
    ) -> Result<EngineOutput> {
        let url = self.url();
        info!("Sending {} samples to {}", samples.len(), url);

        let part = Part::bytes(encode_wav(samples, sample_rate)?)
            .file_name("audio.wav")
            .mime_str("audio/wav")?;
        let mut form = Form::new()
            .part("file", part)
            .text("model", model)
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment");
        if let Some(language) = language {
            form = form.text("language", language);
        }

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SubburnError::Transcription(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SubburnError::Transcription(format!(
                "Transcription server error {}: {}",
                status, error_text
            )));
        }

        let parsed: VerboseTranscription = response
            .json()
            .await
            .map_err(|e| SubburnError::Transcription(format!("Failed to parse response: {}", e)))?;
        debug!("Server returned {} segments", parsed.segments.as_ref().map_or(0, Vec::len));

        Ok(parsed.into())
    }
}
