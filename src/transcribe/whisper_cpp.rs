use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::TranscriberConfig;
use crate::error::{Result, SubburnError};
use super::{encode_wav, EngineChunk, EngineOutput, SpeechEngine};

/// whisper.cpp `-oj` JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppOutput {
    #[serde(default)]
    pub result: Option<WhisperCppResult>,
    #[serde(default)]
    pub transcription: Vec<WhisperCppSegment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppResult {
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppSegment {
    #[serde(default)]
    pub offsets: Option<WhisperCppOffsets>,
    pub text: String,
}

/// Segment bounds in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppOffsets {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl From<WhisperCppOutput> for EngineOutput {
    fn from(output: WhisperCppOutput) -> Self {
        let text = output
            .transcription
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let chunks = output
            .transcription
            .into_iter()
            .map(|seg| {
                let (from, to) = seg
                    .offsets
                    .map(|o| (o.from, o.to))
                    .unwrap_or((None, None));
                EngineChunk {
                    text: seg.text,
                    start: from.map(|ms| ms as f64 / 1000.0),
                    end: to.map(|ms| ms as f64 / 1000.0),
                }
            })
            .collect();

        EngineOutput {
            text,
            chunks: Some(chunks),
            language: output.result.map(|r| r.language),
        }
    }
}

/// whisper.cpp command-line engine
pub struct WhisperCppEngine {
    config: TranscriberConfig,
}

impl WhisperCppEngine {
    pub fn new(config: TranscriberConfig) -> Self {
        Self { config }
    }

    /// Resolve a model id to a ggml model file.
    ///
    /// Accepts a path to a `.bin` file, a bare size name (`small`), or a hub
    /// style id (`Xenova/whisper-small`).
    pub fn model_path(&self, model: &str) -> PathBuf {
        if model.ends_with(".bin") {
            return PathBuf::from(model);
        }
        let name = model.rsplit('/').next().unwrap_or(model);
        let name = name.strip_prefix("whisper-").unwrap_or(name);
        self.config.models_dir.join(format!("ggml-{}.bin", name))
    }

    async fn run(&self, audio_path: &Path, output_base: &Path, language: Option<&str>, model: &str) -> Result<()> {
        let model_path = self.model_path(model);
        if !model_path.exists() {
            return Err(SubburnError::Transcription(format!(
                "Model file not found: {}",
                model_path.display()
            )));
        }

        let mut cmd = Command::new(&self.config.binary_path);
        cmd.arg("-m").arg(&model_path)
            .arg("-f").arg(audio_path)
            .arg("-oj")
            .arg("-of").arg(output_base)
            .arg("-l").arg(language.unwrap_or("auto"))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!("Executing whisper.cpp command: {:?}", cmd);

        let output = cmd.output().await.map_err(|e| {
            SubburnError::Transcription(format!("Failed to execute {}: {}", self.config.binary_path, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SubburnError::Transcription(format!("whisper.cpp failed: {}", stderr.trim())));
        }
        Ok(())
    }
}

#[async_trait]
impl SpeechEngine for WhisperCppEngine {
    async fn recognize(
        &self,
        samples: &[f32],
        sample_rate: u32,
        language: Option<String>,
        model: String,
    ) -> Result<EngineOutput> {
        info!("Running whisper.cpp with model {}", model);

        let temp_dir = tempfile::tempdir()
            .map_err(|e| SubburnError::Transcription(format!("Failed to create temp directory: {}", e)))?;
        let audio_path = temp_dir.path().join("input.wav");
        let output_base = temp_dir.path().join("transcript");

        tokio::fs::write(&audio_path, encode_wav(samples, sample_rate)?).await?;
        self.run(&audio_path, &output_base, language.as_deref(), &model).await?;

        let json_path = output_base.with_extension("json");
        let content = tokio::fs::read_to_string(&json_path).await.map_err(|e| {
            SubburnError::Transcription(format!("Missing whisper.cpp output {}: {}", json_path.display(), e))
        })?;
        let parsed: WhisperCppOutput = serde_json::from_str(&content)
            .map_err(|e| SubburnError::Transcription(format!("Invalid whisper.cpp JSON: {}", e)))?;

        Ok(parsed.into())
    }
}
