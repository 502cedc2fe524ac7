// Media processing boundary
//
// This module wraps the external transcoding tools behind a trait:
// - Processor: ffmpeg/ffprobe-backed implementation
// - Commands: argument builders and filter-path escaping

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use commands::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;

/// Video container extensions accepted as uploads.
pub const SUPPORTED_VIDEO_EXTENSIONS: [&str; 5] = ["mp4", "avi", "mov", "mkv", "webm"];

pub fn is_supported_video<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_VIDEO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Main trait for media processing operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Container duration in seconds
    async fn probe_duration(&self, video_path: &Path) -> Result<f64>;

    /// Extract mono 16 kHz 16-bit PCM WAV audio to `audio_path`
    async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> Result<PathBuf>;

    /// Re-encode video with the subtitle file burned into the frame
    async fn burn_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
    ) -> Result<PathBuf>;

    /// Check if media processor is available
    async fn check_availability(&self) -> Result<String>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Arc<dyn MediaProcessorTrait> {
        Arc::new(processor::MediaProcessorImpl::new(config))
    }
}
