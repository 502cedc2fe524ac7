use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::MediaConfig;
use crate::error::{Result, SubburnError};
use super::{MediaCommandBuilder, MediaProcessorTrait};

/// Concrete implementation of media processor (FFmpeg-based)
pub struct MediaProcessorImpl {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path, &config.probe_binary_path);

        Self {
            config,
            command_builder,
        }
    }
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    async fn probe_duration(&self, video_path: &Path) -> Result<f64> {
        debug!("Probing duration of {}", video_path.display());

        if !video_path.is_file() {
            return Err(SubburnError::MediaProbe(format!(
                "{} is not a readable file",
                video_path.display()
            )));
        }

        let stdout = self.command_builder.probe_duration(video_path).execute().await?;
        parse_duration(&stdout)
    }

    async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> Result<PathBuf> {
        info!("Extracting audio from {} to {}", video_path.display(), audio_path.display());

        self.command_builder
            .extract_audio(video_path, audio_path)
            .execute()
            .await?;

        info!("Audio extraction completed");
        Ok(audio_path.to_path_buf())
    }

    async fn burn_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
    ) -> Result<PathBuf> {
        info!("Burning subtitles from {} into {} -> {}",
              subtitle_path.display(), video_path.display(), output_path.display());

        self.command_builder
            .burn_subtitles(video_path, subtitle_path, output_path, &self.config.subtitle_options)
            .execute()
            .await?;

        info!("Subtitle burn-in completed successfully");
        Ok(output_path.to_path_buf())
    }

    async fn check_availability(&self) -> Result<String> {
        let stdout = self.command_builder.version_check().execute().await?;
        // The first line typically contains the version
        let version = stdout.lines().next().unwrap_or("Unknown version").to_string();
        info!("Media processor is available: {}", version);
        Ok(version)
    }
}

/// Parse ffprobe's bare `format=duration` output.
fn parse_duration(stdout: &str) -> Result<f64> {
    let value = stdout.trim();
    value
        .lines()
        .next()
        .and_then(|line| line.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| SubburnError::MediaProbe(format!("Unrecognized duration output '{}'", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn parses_ffprobe_duration() {
        assert_eq!(parse_duration("12.345000\n").unwrap(), 12.345);
        assert!(matches!(parse_duration("N/A\n"), Err(SubburnError::MediaProbe(_))));
        assert!(parse_duration("").is_err());
    }

    #[tokio::test]
    async fn probing_a_missing_file_fails_before_spawning() {
        let processor = MediaProcessorImpl::new(Config::default().media);
        let err = processor
            .probe_duration(Path::new("/no/such/video.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, SubburnError::MediaProbe(_)));
    }
}
