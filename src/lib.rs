//! Subburn - Subtitle Job Pipeline
//!
//! Takes uploaded videos through audio extraction, speech-to-text, optional
//! translation and subtitle editing, then burns the result into the video
//! using whisper, ollama, and ffmpeg.

pub mod cli;
pub mod config;
pub mod error;
pub mod jobs;
pub mod media;
pub mod subtitle;
pub mod transcribe;
pub mod translate;
