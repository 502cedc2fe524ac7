// Subtitle data model and text codecs
//
// - srt: SubRip encode/decode
// - ass: Advanced SubStation Alpha encode (with style deduplication) and decode
// - color: hex to ASS color conversion
// - style: cue styling and tagged style edits

pub mod ass;
pub mod color;
pub mod srt;
pub mod style;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::info;

pub use ass::{decode_ass, encode_ass, format_ass_time, parse_ass_time};
pub use color::{hex_to_ass_color, AssColor};
pub use srt::{decode_srt, encode_srt, format_srt_time, parse_srt_time};
pub use style::{StyleChange, SubtitleStyle};

use crate::error::{Result, SubburnError};

/// One timed subtitle entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleCue {
    /// Seconds from the start of the video
    pub start: f64,
    pub end: f64,
    pub text: String,
    #[serde(default)]
    pub style: SubtitleStyle,
}

impl SubtitleCue {
    pub fn new<S: Into<String>>(start: f64, end: f64, text: S) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            style: SubtitleStyle::default(),
        }
    }

    /// Timing sanity: finite, non-negative start and an end after the start.
    pub fn validate(&self) -> Result<()> {
        if !self.start.is_finite() || !self.end.is_finite() || self.start < 0.0 {
            return Err(SubburnError::Validation(format!(
                "cue has invalid timing {} --> {}",
                self.start, self.end
            )));
        }
        if self.end <= self.start {
            return Err(SubburnError::Validation(format!(
                "cue end {} is not after start {}",
                self.end, self.start
            )));
        }
        Ok(())
    }
}

// Absorbs representation error such as 0.29 * 1000 = 289.99999999999997
// before flooring.
const FLOAT_SLACK: f64 = 1e-6;

/// Whole `units_per_second` units contained in `seconds`, floored.
pub(crate) fn floor_units(seconds: f64, units_per_second: f64) -> u64 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds * units_per_second + FLOAT_SLACK).floor() as u64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    Srt,
    Ass,
}

impl SubtitleFormat {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("srt") => Ok(Self::Srt),
            Some("ass") | Some("ssa") => Ok(Self::Ass),
            _ => Err(SubburnError::Validation(format!(
                "unsupported subtitle file: {}",
                path.display()
            ))),
        }
    }

    pub fn encode(self, cues: &[SubtitleCue]) -> String {
        match self {
            Self::Srt => encode_srt(cues),
            Self::Ass => encode_ass(cues),
        }
    }

    pub fn decode(self, text: &str) -> Result<Vec<SubtitleCue>> {
        match self {
            Self::Srt => decode_srt(text),
            Self::Ass => decode_ass(text),
        }
    }
}

/// Write cues to a subtitle file, picking the format from the extension.
pub async fn write_subtitles<P: AsRef<Path>>(path: P, cues: &[SubtitleCue]) -> Result<()> {
    let path = path.as_ref();
    let format = SubtitleFormat::from_path(path)?;
    info!("Writing {} cues to {}", cues.len(), path.display());

    fs::write(path, format.encode(cues)).await?;
    Ok(())
}

/// Read cues from a subtitle file, picking the format from the extension.
pub async fn read_subtitles<P: AsRef<Path>>(path: P) -> Result<Vec<SubtitleCue>> {
    let path = path.as_ref();
    let format = SubtitleFormat::from_path(path)?;

    let content = fs::read_to_string(path).await?;
    let cues = format.decode(&content)?;
    info!("Read {} cues from {}", cues.len(), path.display());
    Ok(cues)
}
