use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Result, SubburnError};
use crate::subtitle::{encode_ass, SubtitleCue};
use crate::transcribe::{load_wav, TranscriptionOutput};
use super::model::{JobId, JobStatus};
use super::{remove_owned_file, JobOrchestrator};

/// Bounds and defaults applied to background stages.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Limit for one ffmpeg/ffprobe call
    pub media_timeout: Duration,
    /// Limit for one speech engine call
    pub transcription_timeout: Duration,
    /// Model used when `start_transcription` is not given one
    pub default_model: String,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            media_timeout: config.media.timeout(),
            transcription_timeout: config.transcriber.timeout(),
            default_model: config.transcriber.default_model.clone(),
        }
    }
}

/// Handle to one running background stage of a job.
pub struct StageTask {
    run_id: Uuid,
    token: CancellationToken,
    done: watch::Receiver<()>,
    handle: JoinHandle<()>,
}

/// Owned by the running stage. Dropping it signals waiters that the stage
/// has finished writing to the job.
pub struct StageContext {
    run_id: Uuid,
    token: CancellationToken,
    _done: watch::Sender<()>,
}

impl StageTask {
    pub fn spawn<F, Fut>(stage: F) -> Self
    where
        F: FnOnce(StageContext) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let run_id = Uuid::new_v4();
        let token = CancellationToken::new();
        let (done_tx, done) = watch::channel(());
        let context = StageContext {
            run_id,
            token: token.clone(),
            _done: done_tx,
        };
        let handle = tokio::spawn(stage(context));

        Self {
            run_id,
            token,
            done,
            handle,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn subscribe(&self) -> watch::Receiver<()> {
        self.done.clone()
    }
}

/// Resolve once the stage owning the sender has dropped it.
pub(crate) async fn wait_done(mut done: watch::Receiver<()>) {
    while done.changed().await.is_ok() {}
}

/// Run one adapter call under a timeout, giving up early on cancellation.
pub(crate) async fn guarded<T, F>(
    token: &CancellationToken,
    stage: &str,
    limit: Duration,
    work: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(SubburnError::Cancelled(stage.to_string())),
        outcome = tokio::time::timeout(limit, work) => match outcome {
            Ok(result) => result,
            Err(_) => Err(SubburnError::Timeout {
                stage: stage.to_string(),
                seconds: limit.as_secs(),
            }),
        },
    }
}

impl JobOrchestrator {
    pub(super) async fn run_transcription(
        self,
        job_id: JobId,
        video_path: PathBuf,
        language_hint: Option<String>,
        model: String,
        context: StageContext,
    ) {
        let result = self
            .transcribe_video(job_id, &video_path, language_hint.as_deref(), &model, &context.token)
            .await;

        let recorded = self
            .store
            .update(job_id, |job| {
                match result {
                    Ok(output) => {
                        info!("[Job {}] Generated {} cues", job_id, output.cues.len());
                        job.subtitles = (!output.cues.is_empty()).then_some(output.cues);
                        job.detected_language = output.detected_language;
                        job.status = JobStatus::Generated;
                        job.progress = 100;
                    }
                    Err(e) => {
                        error!("[Job {}] Transcription failed: {}", job_id, e);
                        job.fail(e.to_string());
                    }
                }
                Ok(())
            })
            .await;
        if let Err(e) = recorded {
            warn!("[Job {}] Could not record transcription outcome: {}", job_id, e);
        }

        self.finish_stage(job_id, context).await;
    }

    async fn transcribe_video(
        &self,
        job_id: JobId,
        video_path: &Path,
        language_hint: Option<&str>,
        model: &str,
        token: &CancellationToken,
    ) -> Result<TranscriptionOutput> {
        tokio::fs::create_dir_all(&self.jobs.work_dir).await?;
        let audio_path = tempfile::Builder::new()
            .prefix("audio_")
            .suffix(".wav")
            .tempfile_in(&self.jobs.work_dir)?
            .into_temp_path();

        self.store
            .update(job_id, |job| {
                job.progress = 10;
                Ok(())
            })
            .await?;
        guarded(
            token,
            "audio extraction",
            self.settings.media_timeout,
            self.media.extract_audio(video_path, &audio_path),
        )
        .await?;

        self.store
            .update(job_id, |job| {
                job.status = JobStatus::Transcribing;
                job.progress = 40;
                Ok(())
            })
            .await?;

        let wav_path = audio_path.to_path_buf();
        let audio = tokio::task::spawn_blocking(move || load_wav(&wav_path))
            .await
            .map_err(|e| SubburnError::Transcription(format!("audio decoding task failed: {}", e)))??;

        let output = guarded(
            token,
            "transcription",
            self.settings.transcription_timeout,
            self.transcriber
                .transcribe(&audio.samples, audio.sample_rate, language_hint, model),
        )
        .await?;

        if let Err(e) = audio_path.close() {
            warn!("[Job {}] Failed to remove extracted audio: {}", job_id, e);
        }
        Ok(output)
    }

    pub(super) async fn run_rendering(
        self,
        job_id: JobId,
        video_path: PathBuf,
        cues: Vec<SubtitleCue>,
        context: StageContext,
    ) {
        let result = self.render_video(job_id, &video_path, &cues, &context.token).await;

        let recorded = self
            .store
            .update(job_id, |job| {
                match result {
                    Ok(rendered) => {
                        info!("[Job {}] Rendered {}", job_id, rendered.display());
                        let previous = job.rendered_path.replace(rendered);
                        job.status = JobStatus::Completed;
                        job.progress = 100;
                        Ok(previous)
                    }
                    Err(e) => {
                        error!("[Job {}] Rendering failed: {}", job_id, e);
                        job.fail(e.to_string());
                        Ok(None)
                    }
                }
            })
            .await;
        match recorded {
            Ok(Some(previous)) => remove_owned_file(job_id, &previous).await,
            Ok(None) => {}
            Err(e) => warn!("[Job {}] Could not record rendering outcome: {}", job_id, e),
        }

        self.finish_stage(job_id, context).await;
    }

    async fn render_video(
        &self,
        job_id: JobId,
        video_path: &Path,
        cues: &[SubtitleCue],
        token: &CancellationToken,
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.jobs.work_dir).await?;
        tokio::fs::create_dir_all(&self.jobs.output_dir).await?;

        let ass_path = tempfile::Builder::new()
            .prefix("subs_")
            .suffix(".ass")
            .tempfile_in(&self.jobs.work_dir)?
            .into_temp_path();
        tokio::fs::write(&ass_path, encode_ass(cues)).await?;

        let extension = video_path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let output_path = self
            .jobs
            .output_dir
            .join(format!("rendered_{}{}", Uuid::new_v4(), extension));

        self.store
            .update(job_id, |job| {
                job.progress = 10;
                Ok(())
            })
            .await?;
        let result = guarded(
            token,
            "rendering",
            self.settings.media_timeout,
            self.media.burn_subtitles(video_path, &ass_path, &output_path),
        )
        .await;

        if let Err(e) = ass_path.close() {
            warn!("[Job {}] Failed to remove subtitle file: {}", job_id, e);
        }
        if result.is_err() {
            remove_owned_file(job_id, &output_path).await;
        }
        result
    }

    async fn finish_stage(&self, job_id: JobId, context: StageContext) {
        let mut tasks = self.tasks.lock().await;
        if tasks.get(&job_id).is_some_and(|task| task.run_id == context.run_id) {
            tasks.remove(&job_id);
        }
    }
}
