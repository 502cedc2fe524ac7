use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::error::{Result, SubburnError};

fn default_batch_size() -> usize {
    50
}

fn default_delimiter() -> String {
    "[[[SEP]]]".to_string()
}

fn default_stale_upload_hours() -> u64 {
    24
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub media: MediaConfig,
    pub transcriber: TranscriberConfig,
    pub translate: TranslateConfig,
    pub jobs: JobsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Path to ffprobe binary
    pub probe_binary_path: String,
    /// Additional encoding options for subtitle burn-in
    /// Common options: ["-preset", "medium", "-crf", "23", "-pix_fmt", "yuv420p"]
    pub subtitle_options: Vec<String>,
    /// Upper bound for a single ffmpeg/ffprobe invocation
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriberEngine {
    /// whisper.cpp command-line binary
    WhisperCpp,
    /// OpenAI-compatible `/v1/audio/transcriptions` server
    WhisperHttp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriberConfig {
    pub engine: TranscriberEngine,
    /// Path to whisper.cpp binary (e.g., whisper-cli)
    pub binary_path: String,
    /// Directory holding ggml model files for whisper.cpp
    pub models_dir: PathBuf,
    /// Base URL of the transcription server
    pub endpoint: String,
    /// Model used when a job does not name one
    pub default_model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Ollama endpoint URL
    pub endpoint: String,
    /// LLM model to use for translation
    pub model: String,
    /// Number of texts joined into one request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Token placed between texts of a batch
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    /// Pause between consecutive batch requests
    pub batch_delay_ms: u64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Where uploaded source videos live
    pub upload_dir: PathBuf,
    /// Scratch space for extracted audio and intermediate ASS files
    pub work_dir: PathBuf,
    /// Destination of rendered videos
    pub output_dir: PathBuf,
    #[serde(default = "default_stale_upload_hours")]
    pub stale_upload_max_age_hours: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            media: MediaConfig {
                binary_path: "ffmpeg".to_string(),
                probe_binary_path: "ffprobe".to_string(),
                subtitle_options: vec![
                    "-preset".to_string(), "medium".to_string(),
                    "-crf".to_string(), "23".to_string(),
                ],
                timeout_secs: 3600,
            },
            transcriber: TranscriberConfig {
                engine: TranscriberEngine::WhisperCpp,
                binary_path: "whisper-cli".to_string(),
                models_dir: PathBuf::from(".subburn/models"),
                endpoint: "http://localhost:8000".to_string(),
                default_model: "small".to_string(),
                timeout_secs: 1800,
            },
            translate: TranslateConfig {
                endpoint: "http://localhost:11434".to_string(),
                model: "llama3.2:3b".to_string(),
                batch_size: default_batch_size(),
                delimiter: default_delimiter(),
                batch_delay_ms: 500,
                request_timeout_secs: 300,
            },
            jobs: JobsConfig {
                upload_dir: PathBuf::from(".subburn/uploads"),
                work_dir: PathBuf::from(".subburn/work"),
                output_dir: PathBuf::from(".subburn/rendered"),
                stale_upload_max_age_hours: default_stale_upload_hours(),
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubburnError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| SubburnError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubburnError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SubburnError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.translate.batch_size == 0 {
            return Err(SubburnError::Config("translate.batch_size must be at least 1".to_string()));
        }
        if self.translate.delimiter.trim().is_empty() {
            return Err(SubburnError::Config("translate.delimiter must not be blank".to_string()));
        }
        Ok(())
    }
}

impl MediaConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl TranscriberConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
