use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::SubburnError;
use crate::subtitle::SubtitleCue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = SubburnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| SubburnError::NotFound(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Uploaded,
    ExtractingAudio,
    Transcribing,
    Generated,
    Rendering,
    Completed,
    Error,
}

impl JobStatus {
    /// A background stage currently owns the job.
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::ExtractingAudio | Self::Transcribing | Self::Rendering)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::ExtractingAudio => "extracting_audio",
            Self::Transcribing => "transcribing",
            Self::Generated => "generated",
            Self::Rendering => "rendering",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One video travelling through the subtitle pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub video_path: PathBuf,
    pub video_name: String,
    pub duration: f64,
    pub subtitles: Option<Vec<SubtitleCue>>,
    pub status: JobStatus,
    pub rendered_path: Option<PathBuf>,
    pub error: Option<String>,
    pub detected_language: Option<String>,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(video_path: PathBuf, video_name: String, duration: f64) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            video_path,
            video_name,
            duration,
            subtitles: None,
            status: JobStatus::Uploaded,
            rendered_path: None,
            error: None,
            detected_language: None,
            progress: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_subtitles(&self) -> bool {
        self.subtitles.as_ref().is_some_and(|s| !s.is_empty())
    }

    /// Enter a stage, clearing the error left by a previous failed attempt.
    pub(crate) fn begin(&mut self, status: JobStatus) {
        self.status = status;
        self.error = None;
        self.progress = 0;
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.status = JobStatus::Error;
        self.error = Some(message);
    }

    pub fn view(&self) -> JobView {
        JobView {
            job_id: self.id,
            status: self.status,
            video_name: self.video_name.clone(),
            duration: self.duration,
            has_subtitles: self.has_subtitles(),
            subtitles: self.subtitles.clone(),
            rendered_path: self.rendered_path.clone(),
            download_name: self
                .rendered_path
                .as_ref()
                .map(|_| format!("rendered_{}", self.video_name)),
            error: self.error.clone(),
            detected_language: self.detected_language.clone(),
            progress: self.progress,
            updated_at: self.updated_at,
        }
    }
}

/// Read-only snapshot handed to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub job_id: JobId,
    pub status: JobStatus,
    pub video_name: String,
    pub duration: f64,
    pub has_subtitles: bool,
    pub subtitles: Option<Vec<SubtitleCue>>,
    pub rendered_path: Option<PathBuf>,
    pub download_name: Option<String>,
    pub error: Option<String>,
    pub detected_language: Option<String>,
    pub progress: u8,
    pub updated_at: DateTime<Utc>,
}
