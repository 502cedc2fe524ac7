use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, SubburnError};

/// Which media operation a command belongs to; decides the error it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaStage {
    Probe,
    Extract,
    Render,
    Version,
}

impl MediaStage {
    pub fn error(self, message: String) -> SubburnError {
        match self {
            Self::Probe | Self::Version => SubburnError::MediaProbe(message),
            Self::Extract => SubburnError::MediaExtract(message),
            Self::Render => SubburnError::MediaRender(message),
        }
    }
}

/// Abstract media processing command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
    pub stage: MediaStage,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2, stage: MediaStage) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
            stage,
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    pub fn copy_audio(self) -> Self {
        self.audio_codec("copy")
    }

    pub fn no_video(self) -> Self {
        self.arg("-vn")
    }

    pub fn audio_sample_rate(self, rate: u32) -> Self {
        self.arg("-ar").arg(rate.to_string())
    }

    pub fn audio_channels(self, channels: u32) -> Self {
        self.arg("-ac").arg(channels.to_string())
    }

    pub fn video_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-vf").arg(filter)
    }

    /// Execute the command and return its stdout.
    ///
    /// The child is killed if the returned future is dropped, so callers can
    /// bound it with a timeout or race it against cancellation.
    pub async fn execute(&self) -> Result<String> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.stage.error(format!("Failed to execute {}: {}", self.binary_path, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.stage.error(format!(
                "{} failed: {}",
                self.description,
                last_lines(&stderr, 20)
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Builder for the media operations the pipeline needs
pub struct MediaCommandBuilder {
    binary_path: String,
    probe_binary_path: String,
}

impl MediaCommandBuilder {
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, probe_binary_path: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            probe_binary_path: probe_binary_path.into(),
        }
    }

    /// Build subtitle burn-in command
    pub fn burn_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
        additional_options: &[String],
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Subtitle burn-in", MediaStage::Render)
            .overwrite()
            .input(video_path)
            .video_filter(subtitle_filter(subtitle_path))
            .video_codec("libx264")
            .copy_audio()
            .args(additional_options.iter().cloned())
            .output(output_path)
    }

    /// Build audio extraction command: mono 16 kHz 16-bit PCM WAV
    pub fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Audio extraction", MediaStage::Extract)
            .input(video_path)
            .no_video()
            .audio_codec("pcm_s16le")
            .audio_sample_rate(16000)
            .audio_channels(1)
            .arg("-f").arg("wav")
            .overwrite()
            .output(audio_path)
    }

    /// Build container duration probe
    pub fn probe_duration(&self, video_path: &Path) -> MediaCommand {
        MediaCommand::new(&self.probe_binary_path, "Duration probe", MediaStage::Probe)
            .args(["-v", "error", "-show_entries", "format=duration"])
            .args(["-of", "default=noprint_wrappers=1:nokey=1"])
            .output(video_path)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Version check", MediaStage::Version)
            .arg("-version")
    }
}

/// Filter graph argument that burns `subtitle_path` into the frame.
///
/// `.ass` files go through the `ass` filter so their styles are honored;
/// anything else uses the generic `subtitles` filter.
pub fn subtitle_filter(subtitle_path: &Path) -> String {
    let escaped = escape_filter_path(subtitle_path);
    let is_ass = subtitle_path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ass"));

    if is_ass {
        format!("ass='{}'", escaped)
    } else {
        format!("subtitles='{}'", escaped)
    }
}

/// Escape a path for use inside a single-quoted filter option value.
///
/// Backslashes become forward slashes, colons are escaped, and a literal
/// single quote closes the quoting, emits `\'` and reopens it.
pub fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace(':', "\\:")
        .replace('\'', "'\\''")
}

fn last_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let skip = lines.len().saturating_sub(count);
    lines[skip..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn windows_paths_are_escaped_for_filters() {
        let path = PathBuf::from(r"C:\Users\me\subs.ass");
        assert_eq!(escape_filter_path(&path), r"C\:/Users/me/subs.ass");
        assert_eq!(subtitle_filter(&path), r"ass='C\:/Users/me/subs.ass'");
    }

    #[test]
    fn colons_and_quotes_in_unix_paths() {
        let path = PathBuf::from("/tmp/12:30 it's/subs.srt");
        assert_eq!(escape_filter_path(&path), r"/tmp/12\:30 it'\''s/subs.srt");
        assert!(subtitle_filter(&path).starts_with("subtitles='"));
    }

    #[test]
    fn extraction_targets_whisper_friendly_wav() {
        let builder = MediaCommandBuilder::new("ffmpeg", "ffprobe");
        let cmd = builder.extract_audio(Path::new("in.mp4"), Path::new("out.wav"));

        assert_eq!(cmd.stage, MediaStage::Extract);
        let joined = cmd.args.join(" ");
        assert!(joined.contains("-vn -c:a pcm_s16le -ar 16000 -ac 1 -f wav"));
        assert_eq!(cmd.args.last().map(String::as_str), Some("out.wav"));
    }

    #[test]
    fn burn_in_appends_user_options_before_output() {
        let builder = MediaCommandBuilder::new("ffmpeg", "ffprobe");
        let options = vec!["-crf".to_string(), "20".to_string()];
        let cmd = builder.burn_subtitles(
            Path::new("in.mp4"),
            Path::new("/work/a:b.ass"),
            Path::new("out.mp4"),
            &options,
        );

        assert_eq!(cmd.binary_path, "ffmpeg");
        let vf = cmd.args.iter().position(|a| a == "-vf").unwrap();
        assert_eq!(cmd.args[vf + 1], r"ass='/work/a\:b.ass'");
        assert_eq!(&cmd.args[cmd.args.len() - 3..], &["-crf", "20", "out.mp4"]);
    }

    #[test]
    fn probe_uses_ffprobe_binary() {
        let builder = MediaCommandBuilder::new("ffmpeg", "/opt/ffprobe");
        let cmd = builder.probe_duration(Path::new("clip.mkv"));
        assert_eq!(cmd.binary_path, "/opt/ffprobe");
        assert_eq!(cmd.stage.error("x".into()).to_string(), "Media probe error: x");
    }

    #[tokio::test]
    async fn missing_binary_maps_to_stage_error() {
        let cmd = MediaCommand::new("/definitely/not/ffmpeg", "Audio extraction", MediaStage::Extract);
        let err = cmd.execute().await.unwrap_err();
        assert!(matches!(err, SubburnError::MediaExtract(_)));
    }
}
