//! Subburn - Subtitle Job Pipeline
//!
//! Command-line front end: every video command runs through the same job
//! orchestrator the library exposes, using a private copy of the input as the
//! job's upload.

use anyhow::{anyhow, bail, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use subburn::cli::{Args, Commands};
use subburn::config::Config;
use subburn::jobs::{cleanup, JobId, JobOrchestrator, JobStatus, JobView};
use subburn::media::{is_supported_video, MediaProcessorFactory};
use subburn::subtitle::{read_subtitles, write_subtitles, SubtitleCue};
use subburn::translate::{check_ollama_availability, TranslatorFactory};

const DEFAULT_CONFIG_FILE: &str = "subburn.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;
    info!("Starting Subburn - Subtitle Job Pipeline");

    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new(DEFAULT_CONFIG_FILE).exists() {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
                Config::from_file(DEFAULT_CONFIG_FILE)?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Process { input, output, language, target_lang, model, subtitles } => {
            info!("Processing video file: {}", input.display());
            let orchestrator = JobOrchestrator::from_config(&config)?;
            let job_id = upload(&orchestrator, &input).await?;

            let result = async {
                orchestrator
                    .start_transcription(job_id, language.as_deref(), model.as_deref())
                    .await?;
                let view = wait_with_spinner(&orchestrator, job_id, "Transcription").await?;
                if let Some(language) = &view.detected_language {
                    info!("Detected language: {}", language);
                }

                if let Some(target) = &target_lang {
                    let cues = orchestrator.translate_subtitles(job_id, target, None).await?;
                    info!("Translated {} cues to {}", cues.len(), target);
                }
                if let Some(path) = &subtitles {
                    let cues = orchestrator.get_job(job_id).await?.subtitles.unwrap_or_default();
                    write_subtitles(path, &cues).await?;
                    println!("Subtitles written to {}", path.display());
                }

                orchestrator.start_rendering(job_id).await?;
                let view = wait_with_spinner(&orchestrator, job_id, "Rendering").await?;
                let output = match &output {
                    Some(output) => output.clone(),
                    None => default_output_path(&input, &view)?,
                };
                deliver(&view, &output).await
            }
            .await;

            discard_job(&orchestrator, job_id).await;
            result?;
        }
        Commands::Transcribe { input, output, language, model } => {
            info!("Transcribing video: {}", input.display());
            let orchestrator = JobOrchestrator::from_config(&config)?;
            let job_id = upload(&orchestrator, &input).await?;

            let result = async {
                orchestrator
                    .start_transcription(job_id, language.as_deref(), model.as_deref())
                    .await?;
                let view = wait_with_spinner(&orchestrator, job_id, "Transcription").await?;
                let cues = view.subtitles.unwrap_or_default();
                write_subtitles(&output, &cues).await?;
                println!("Wrote {} cues to {}", cues.len(), output.display());
                Ok::<_, anyhow::Error>(())
            }
            .await;

            discard_job(&orchestrator, job_id).await;
            result?;
        }
        Commands::Translate { input, output, target_lang } => {
            info!("Translating subtitles: {}", input.display());
            let translator = TranslatorFactory::create_batch_translator(config.translate.clone())?;

            let cues = read_subtitles(&input).await?;
            if cues.is_empty() {
                bail!("{} contains no subtitles", input.display());
            }
            let texts: Vec<String> = cues.iter().map(|c| c.text.clone()).collect();
            let translated = translator.translate_batch(&texts, &target_lang).await?;
            let cues: Vec<SubtitleCue> = cues
                .into_iter()
                .zip(translated)
                .map(|(cue, text)| SubtitleCue { text, ..cue })
                .collect();

            write_subtitles(&output, &cues).await?;
            println!("Translated {} cues to {} -> {}", cues.len(), target_lang, output.display());
        }
        Commands::Convert { input, output } => {
            let cues = read_subtitles(&input).await?;
            write_subtitles(&output, &cues).await?;
            println!("Converted {} cues: {} -> {}", cues.len(), input.display(), output.display());
        }
        Commands::Render { video, subtitles, output } => {
            info!("Burning {} into {}", subtitles.display(), video.display());
            let cues = read_subtitles(&subtitles).await?;
            let orchestrator = JobOrchestrator::from_config(&config)?;
            let job_id = upload(&orchestrator, &video).await?;

            let result = async {
                orchestrator.update_subtitles(job_id, cues).await?;
                orchestrator.start_rendering(job_id).await?;
                let view = wait_with_spinner(&orchestrator, job_id, "Rendering").await?;
                deliver(&view, &output).await
            }
            .await;

            discard_job(&orchestrator, job_id).await;
            result?;
        }
        Commands::Sweep { dir, max_age_hours } => {
            let dir = dir.unwrap_or_else(|| config.jobs.upload_dir.clone());
            let hours = max_age_hours.unwrap_or(config.jobs.stale_upload_max_age_hours);
            let removed = cleanup::sweep_stale_uploads(&dir, Duration::from_secs(hours * 3600)).await?;
            println!("Removed {} files older than {}h from {}", removed, hours, dir.display());
        }
        Commands::Check => {
            let mut healthy = true;

            let media = MediaProcessorFactory::create_processor(config.media.clone());
            match media.check_availability().await {
                Ok(version) => println!("ffmpeg: {}", version),
                Err(e) => {
                    healthy = false;
                    println!("ffmpeg: unavailable ({})", e);
                }
            }

            match check_ollama_availability(&config.translate.endpoint, &config.translate.model).await {
                Ok(()) => println!("ollama: {} ready at {}", config.translate.model, config.translate.endpoint),
                Err(e) => {
                    healthy = false;
                    println!("ollama: unavailable ({})", e);
                }
            }

            if !healthy {
                bail!("Some external tools are not available");
            }
        }
    }

    info!("Subburn completed successfully");
    Ok(())
}

/// Copy `input` into the upload directory under a fresh name and register it.
async fn upload(orchestrator: &JobOrchestrator, input: &Path) -> Result<JobId> {
    if !input.is_file() {
        bail!("Input file not found: {}", input.display());
    }
    if !is_supported_video(input) {
        bail!("Unsupported video type: {}", input.display());
    }

    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("Cannot determine file name of {}", input.display()))?;
    let extension = input
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let upload_dir = &orchestrator.jobs_config().upload_dir;
    tokio::fs::create_dir_all(upload_dir).await?;
    let stored = upload_dir.join(format!("{}{}", Uuid::new_v4(), extension));
    tokio::fs::copy(input, &stored).await?;

    match orchestrator.create_job_from_upload(&stored, Some(&name)).await {
        Ok(job_id) => Ok(job_id),
        Err(e) => {
            if let Err(remove_err) = tokio::fs::remove_file(&stored).await {
                warn!("Failed to remove {}: {}", stored.display(), remove_err);
            }
            Err(e.into())
        }
    }
}

/// Poll the job behind a spinner until its stage finishes; Ctrl-C cancels it.
async fn wait_with_spinner(orchestrator: &JobOrchestrator, job_id: JobId, label: &str) -> Result<JobView> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));

    let view = loop {
        let view = orchestrator.get_job(job_id).await?;
        pb.set_message(format!("{}: {} ({}%)", label, view.status, view.progress));
        if !view.status.is_in_flight() {
            break view;
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                pb.set_message(format!("{}: cancelling", label));
                orchestrator.cancel_job(job_id).await?;
                orchestrator.wait_for_job(job_id).await?;
            }
            _ = tokio::time::sleep(Duration::from_millis(250)) => {}
        }
    };
    pb.finish_and_clear();

    if view.status == JobStatus::Error {
        bail!("{} failed: {}", label, view.error.as_deref().unwrap_or("unknown error"));
    }
    Ok(view)
}

fn default_output_path(input: &Path, view: &JobView) -> Result<PathBuf> {
    let name = view
        .download_name
        .clone()
        .ok_or_else(|| anyhow!("Rendering finished without an output file"))?;
    Ok(input.with_file_name(name))
}

/// Copy the rendered video out of the job's output directory.
async fn deliver(view: &JobView, output: &Path) -> Result<()> {
    let rendered = view
        .rendered_path
        .as_ref()
        .ok_or_else(|| anyhow!("Rendering finished without an output file"))?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::copy(rendered, output).await?;
    println!("Rendered video written to {}", output.display());
    Ok(())
}

async fn discard_job(orchestrator: &JobOrchestrator, job_id: JobId) {
    if let Err(e) = orchestrator.delete_job(job_id).await {
        warn!("Failed to clean up job {}: {}", job_id, e);
    }
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = std::env::current_dir()?.join(".subburn").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "subburn.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("subburn.log").display());

    Ok(())
}
