use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transcribe, optionally translate, and burn subtitles into a video
    Process {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output video file (defaults to rendered_<name> next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Spoken language hint ("auto" to detect)
        #[arg(short, long)]
        language: Option<String>,

        /// Translate subtitles to this language before rendering
        #[arg(short, long)]
        target_lang: Option<String>,

        /// Speech model (defaults to transcriber.default_model)
        #[arg(short, long)]
        model: Option<String>,

        /// Also write the final subtitles to this .srt/.ass file
        #[arg(long)]
        subtitles: Option<PathBuf>,
    },

    /// Transcribe a video into an SRT or ASS subtitle file
    Transcribe {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output subtitle file (.srt or .ass)
        #[arg(short, long)]
        output: PathBuf,

        /// Spoken language hint ("auto" to detect)
        #[arg(short, long)]
        language: Option<String>,

        /// Speech model (defaults to transcriber.default_model)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Translate a subtitle file using the configured LLM
    Translate {
        /// Input subtitle file (.srt or .ass)
        #[arg(short, long)]
        input: PathBuf,

        /// Output subtitle file (.srt or .ass)
        #[arg(short, long)]
        output: PathBuf,

        /// Target language code
        #[arg(short, long)]
        target_lang: String,
    },

    /// Convert a subtitle file between SRT and ASS
    Convert {
        /// Input subtitle file
        #[arg(short, long)]
        input: PathBuf,

        /// Output subtitle file; the extension picks the format
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Burn a subtitle file into a video
    Render {
        /// Input video file
        #[arg(short, long)]
        video: PathBuf,

        /// Subtitle file (.srt or .ass)
        #[arg(short, long)]
        subtitles: PathBuf,

        /// Output video file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Delete stale files from the upload directory
    Sweep {
        /// Directory to sweep (defaults to jobs.upload_dir)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Age threshold in hours (defaults to jobs.stale_upload_max_age_hours)
        #[arg(long)]
        max_age_hours: Option<u64>,
    },

    /// Check that ffmpeg and the translation service are reachable
    Check,
}
