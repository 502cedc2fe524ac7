use std::io::Cursor;
use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SubburnError};
use crate::subtitle::{SubtitleCue, SubtitleStyle};

/// Duration given to a chunk whose end time the engine did not report.
pub const DEFAULT_CHUNK_SECONDS: f64 = 2.0;

/// Text used when the engine heard nothing at all.
pub const NO_SPEECH_TEXT: &str = "No speech detected";

/// One raw chunk as reported by a speech engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineChunk {
    pub text: String,
    pub start: Option<f64>,
    pub end: Option<f64>,
}

impl EngineChunk {
    pub fn new<S: Into<String>>(text: S, start: Option<f64>, end: Option<f64>) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }
}

/// Raw, engine-agnostic recognition result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineOutput {
    /// Full transcript text
    pub text: String,
    /// Timestamped chunks; `None` when the engine produced none
    pub chunks: Option<Vec<EngineChunk>>,
    pub language: Option<String>,
}

/// Normalized transcription ready to be stored on a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionOutput {
    pub cues: Vec<SubtitleCue>,
    pub detected_language: Option<String>,
}

/// Mono PCM samples normalized to [-1.0, 1.0].
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Turn raw engine chunks into cues.
///
/// Missing starts fall back to the previous cue's end (0 for the first),
/// missing or non-increasing ends to `start + DEFAULT_CHUNK_SECONDS`. Blank
/// chunks are dropped. Without any chunk data a single cue spans the whole
/// audio with the full text.
pub fn normalize_chunks(output: &EngineOutput, total_duration: f64) -> Vec<SubtitleCue> {
    let chunks = match &output.chunks {
        Some(chunks) if !chunks.is_empty() => chunks,
        _ => {
            let text = output.text.trim();
            let text = if text.is_empty() { NO_SPEECH_TEXT } else { text };
            let end = if total_duration.is_finite() && total_duration > 0.0 {
                total_duration
            } else {
                DEFAULT_CHUNK_SECONDS
            };
            return vec![SubtitleCue {
                start: 0.0,
                end,
                text: text.to_string(),
                style: SubtitleStyle::default(),
            }];
        }
    };

    let mut cues: Vec<SubtitleCue> = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let text = chunk.text.trim();
        if text.is_empty() {
            continue;
        }

        let start = chunk
            .start
            .unwrap_or_else(|| cues.last().map(|c| c.end).unwrap_or(0.0));
        let end = match chunk.end {
            Some(end) if end > start => end,
            _ => start + DEFAULT_CHUNK_SECONDS,
        };

        cues.push(SubtitleCue {
            start,
            end,
            text: text.to_string(),
            style: SubtitleStyle::default(),
        });
    }
    cues
}

/// Treat an empty or `auto` hint as "detect the language".
pub fn normalize_language_hint(hint: Option<&str>) -> Option<String> {
    hint.map(str::trim)
        .filter(|h| !h.is_empty() && !h.eq_ignore_ascii_case("auto"))
        .map(str::to_string)
}

/// Load a WAV file as normalized mono f32 samples (first channel if several).
pub fn load_wav<P: AsRef<Path>>(path: P) -> Result<AudioBuffer> {
    let path = path.as_ref();
    let mut reader = hound::WavReader::open(path)
        .map_err(|e| SubburnError::Transcription(format!("WAV read error for {}: {}", path.display(), e)))?;

    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: std::result::Result<Vec<f32>, hound::Error> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect(),
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|sample| sample as f32 / scale))
                .collect()
        }
    };
    let interleaved = interleaved
        .map_err(|e| SubburnError::Transcription(format!("WAV sample error: {}", e)))?;

    let samples = interleaved
        .into_iter()
        .step_by(channels)
        .map(|s| s.clamp(-1.0, 1.0))
        .collect();

    Ok(AudioBuffer {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Encode samples as an in-memory mono 16-bit PCM WAV file.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| SubburnError::Transcription(format!("WAV encode error: {}", e)))?;
        for &sample in samples {
            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(value)
                .map_err(|e| SubburnError::Transcription(format!("WAV encode error: {}", e)))?;
        }
        writer
            .finalize()
            .map_err(|e| SubburnError::Transcription(format!("WAV encode error: {}", e)))?;
    }
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(chunks: Option<Vec<EngineChunk>>, text: &str) -> EngineOutput {
        EngineOutput {
            text: text.to_string(),
            chunks,
            language: None,
        }
    }

    #[test]
    fn missing_timestamps_are_filled_in() {
        let raw = output(
            Some(vec![
                EngineChunk::new(" first ", None, Some(1.5)),
                EngineChunk::new("second", None, None),
                EngineChunk::new("third", Some(6.0), Some(5.0)),
            ]),
            "",
        );
        let cues = normalize_chunks(&raw, 30.0);

        assert_eq!(cues.len(), 3);
        assert_eq!((cues[0].start, cues[0].end), (0.0, 1.5));
        assert_eq!(cues[0].text, "first");
        assert_eq!((cues[1].start, cues[1].end), (1.5, 3.5));
        assert_eq!((cues[2].start, cues[2].end), (6.0, 8.0));
        assert!(cues.iter().all(|c| c.style == SubtitleStyle::default()));
    }

    #[test]
    fn blank_chunks_are_dropped() {
        let raw = output(
            Some(vec![
                EngineChunk::new("  ", Some(0.0), Some(1.0)),
                EngineChunk::new("kept", None, Some(4.0)),
            ]),
            "kept",
        );
        let cues = normalize_chunks(&raw, 10.0);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].start, 0.0);
    }

    #[test]
    fn no_chunks_yields_one_spanning_cue() {
        let cues = normalize_chunks(&output(None, " whole thing "), 42.0);
        assert_eq!(cues.len(), 1);
        assert_eq!((cues[0].start, cues[0].end), (0.0, 42.0));
        assert_eq!(cues[0].text, "whole thing");

        let cues = normalize_chunks(&output(Some(vec![]), ""), 5.0);
        assert_eq!(cues[0].text, NO_SPEECH_TEXT);
    }

    #[test]
    fn empty_audio_still_yields_a_valid_cue() {
        let cues = normalize_chunks(&output(None, ""), 0.0);
        assert_eq!((cues[0].start, cues[0].end), (0.0, DEFAULT_CHUNK_SECONDS));
        assert!(cues[0].validate().is_ok());
    }

    #[test]
    fn auto_hint_means_detect() {
        assert_eq!(normalize_language_hint(Some("auto")), None);
        assert_eq!(normalize_language_hint(Some(" ")), None);
        assert_eq!(normalize_language_hint(None), None);
        assert_eq!(normalize_language_hint(Some("ja")), Some("ja".to_string()));
    }

    #[test]
    fn wav_encode_then_load_keeps_rate_and_amplitude() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let samples: Vec<f32> = (0..1600).map(|i| ((i as f32) / 1600.0) - 0.5).collect();

        std::fs::write(&path, encode_wav(&samples, 16000).unwrap()).unwrap();
        let audio = load_wav(&path).unwrap();

        assert_eq!(audio.sample_rate, 16000);
        assert_eq!(audio.samples.len(), 1600);
        assert!((audio.duration_secs() - 0.1).abs() < 1e-9);
        assert!(audio.samples.iter().zip(&samples).all(|(a, b)| (a - b).abs() < 1e-3));
    }

    #[test]
    fn loading_garbage_is_a_transcription_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.wav");
        std::fs::write(&path, b"not a wav").unwrap();
        assert!(matches!(load_wav(&path), Err(SubburnError::Transcription(_))));
    }
}
