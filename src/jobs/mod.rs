// Job lifecycle
//
// - model: Job record, status machine and the read-only view
// - store: in-memory job table with per-job locking
// - pipeline: supervised background stages (transcription, rendering)
// - cleanup: time-based reclamation of orphaned uploads

pub mod cleanup;
pub mod model;
pub mod pipeline;
pub mod store;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub use model::*;
pub use pipeline::{PipelineSettings, StageTask};
pub use store::JobStore;

use crate::config::{Config, JobsConfig};
use crate::error::{Result, SubburnError};
use crate::media::{is_supported_video, MediaProcessorFactory, MediaProcessorTrait};
use crate::subtitle::{StyleChange, SubtitleCue};
use crate::transcribe::{SpeechEngineFactory, Transcriber};
use crate::translate::{BatchTranslator, TranslatorFactory};

/// Drives jobs through upload, transcription, editing and rendering.
///
/// Cheap to clone; clones share the same job table and task registry.
#[derive(Clone)]
pub struct JobOrchestrator {
    store: Arc<JobStore>,
    media: Arc<dyn MediaProcessorTrait>,
    transcriber: Transcriber,
    translator: BatchTranslator,
    jobs: Arc<JobsConfig>,
    settings: PipelineSettings,
    tasks: Arc<Mutex<HashMap<JobId, StageTask>>>,
}

impl JobOrchestrator {
    pub fn new(
        media: Arc<dyn MediaProcessorTrait>,
        transcriber: Transcriber,
        translator: BatchTranslator,
        jobs: JobsConfig,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            store: Arc::new(JobStore::new()),
            media,
            transcriber,
            translator,
            jobs: Arc::new(jobs),
            settings,
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Wire the ffmpeg, speech engine and Ollama adapters named by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let media = MediaProcessorFactory::create_processor(config.media.clone());
        let engine = SpeechEngineFactory::create_engine(config.transcriber.clone())?;
        let translator = TranslatorFactory::create_batch_translator(config.translate.clone())?;

        Ok(Self::new(
            media,
            Transcriber::new(engine),
            translator,
            config.jobs.clone(),
            PipelineSettings::from_config(config),
        ))
    }

    pub fn jobs_config(&self) -> &JobsConfig {
        &self.jobs
    }

    /// Register an already-stored video as a new job in `uploaded`.
    pub async fn create_job(&self, video_path: PathBuf, video_name: &str, duration: f64) -> Result<JobId> {
        if video_name.trim().is_empty() {
            return Err(SubburnError::Validation("video name is required".to_string()));
        }
        if !duration.is_finite() || duration < 0.0 {
            return Err(SubburnError::Validation(format!("invalid duration {}", duration)));
        }

        let job = Job::new(video_path, video_name.to_string(), duration);
        Ok(self.store.insert(job).await)
    }

    /// Validate and probe an uploaded file, then create its job.
    ///
    /// `video_name` defaults to the file name of `video_path`.
    pub async fn create_job_from_upload(&self, video_path: &Path, video_name: Option<&str>) -> Result<JobId> {
        let name = match video_name {
            Some(name) => name.to_string(),
            None => video_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| SubburnError::Validation(format!("{} has no file name", video_path.display())))?,
        };
        if !is_supported_video(&name) {
            return Err(SubburnError::Validation(format!(
                "unsupported video type: {} (expected mp4, avi, mov, mkv or webm)",
                name
            )));
        }

        let limit = self.settings.media_timeout;
        let duration = tokio::time::timeout(limit, self.media.probe_duration(video_path))
            .await
            .map_err(|_| SubburnError::Timeout {
                stage: "media probe".to_string(),
                seconds: limit.as_secs(),
            })??;

        let id = self.create_job(video_path.to_path_buf(), &name, duration).await?;
        info!("Created job {} for {} ({:.1}s)", id, name, duration);
        Ok(id)
    }

    /// Start audio extraction and transcription in the background.
    ///
    /// Returns once the job is marked `extracting_audio`; the outcome is only
    /// visible through [`get_job`](Self::get_job).
    pub async fn start_transcription(
        &self,
        job_id: JobId,
        language_hint: Option<&str>,
        model_id: Option<&str>,
    ) -> Result<()> {
        let mut tasks = self.tasks.lock().await;
        let video_path = self
            .store
            .update(job_id, |job| {
                ensure_idle(job)?;
                job.begin(JobStatus::ExtractingAudio);
                Ok(job.video_path.clone())
            })
            .await?;

        let model = model_id
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(self.settings.default_model.as_str())
            .to_string();
        let hint = language_hint.map(str::to_string);

        let this = self.clone();
        let task = StageTask::spawn(move |context| async move {
            this.run_transcription(job_id, video_path, hint, model, context).await;
        });
        tasks.insert(job_id, task);
        Ok(())
    }

    /// Replace the stored subtitle list; status is unchanged.
    pub async fn update_subtitles(&self, job_id: JobId, cues: Vec<SubtitleCue>) -> Result<()> {
        validate_cues(&cues)?;

        let count = cues.len();
        self.store
            .update(job_id, |job| {
                job.subtitles = Some(cues);
                Ok(())
            })
            .await?;
        debug!("[Job {}] Stored {} edited cues", job_id, count);
        Ok(())
    }

    /// Translate `cues_override` (or the stored cues) and persist the result.
    ///
    /// Timing and style are kept; batches the translator could not handle
    /// keep their original text.
    pub async fn translate_subtitles(
        &self,
        job_id: JobId,
        target_language: &str,
        cues_override: Option<Vec<SubtitleCue>>,
    ) -> Result<Vec<SubtitleCue>> {
        let cues = match cues_override {
            Some(cues) => {
                if !self.store.contains(job_id).await {
                    return Err(SubburnError::NotFound(job_id.to_string()));
                }
                validate_cues(&cues)?;
                cues
            }
            None => self.store.snapshot(job_id).await?.subtitles.unwrap_or_default(),
        };
        if cues.is_empty() {
            return Err(SubburnError::Validation("no subtitles to translate".to_string()));
        }

        info!("[Job {}] Translating {} cues to {}", job_id, cues.len(), target_language);
        let texts: Vec<String> = cues.iter().map(|c| c.text.clone()).collect();
        let translated = self.translator.translate_batch(&texts, target_language).await?;

        let cues: Vec<SubtitleCue> = cues
            .into_iter()
            .zip(translated)
            .map(|(cue, text)| SubtitleCue { text, ..cue })
            .collect();

        let stored = cues.clone();
        self.store
            .update(job_id, |job| {
                job.subtitles = Some(stored);
                Ok(())
            })
            .await?;
        Ok(cues)
    }

    /// Change one style field of the cue at `cue_index`.
    pub async fn edit_cue_style(&self, job_id: JobId, cue_index: usize, change: StyleChange) -> Result<SubtitleCue> {
        self.store
            .update(job_id, |job| {
                let cue = job
                    .subtitles
                    .as_mut()
                    .and_then(|cues| cues.get_mut(cue_index))
                    .ok_or_else(|| SubburnError::Validation(format!("no cue at index {}", cue_index)))?;
                cue.style.apply(change)?;
                Ok(cue.clone())
            })
            .await
    }

    /// Burn the job's subtitles into its video in the background.
    ///
    /// Rejects a job without subtitles before any media work is scheduled.
    pub async fn start_rendering(&self, job_id: JobId) -> Result<()> {
        let mut tasks = self.tasks.lock().await;
        let (video_path, cues) = self
            .store
            .update(job_id, |job| {
                ensure_idle(job)?;
                let cues = match &job.subtitles {
                    Some(cues) if !cues.is_empty() => cues.clone(),
                    _ => return Err(SubburnError::Validation("job has no subtitles to render".to_string())),
                };
                job.begin(JobStatus::Rendering);
                Ok((job.video_path.clone(), cues))
            })
            .await?;

        let this = self.clone();
        let task = StageTask::spawn(move |context| async move {
            this.run_rendering(job_id, video_path, cues, context).await;
        });
        tasks.insert(job_id, task);
        Ok(())
    }

    pub async fn get_job(&self, job_id: JobId) -> Result<JobView> {
        self.store.view(job_id).await
    }

    pub async fn list_jobs(&self) -> Vec<JobView> {
        self.store.list().await
    }

    /// Cancel the job's in-flight stage. Returns whether one was running.
    ///
    /// The stage stops at its current adapter call and leaves the job in
    /// `error`.
    pub async fn cancel_job(&self, job_id: JobId) -> Result<bool> {
        if !self.store.contains(job_id).await {
            return Err(SubburnError::NotFound(job_id.to_string()));
        }
        let tasks = self.tasks.lock().await;
        match tasks.get(&job_id) {
            Some(task) if task.is_running() => {
                info!("[Job {}] Cancelling running stage", job_id);
                task.cancel();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Wait for the in-flight stage (if any) to finish, then return the job.
    pub async fn wait_for_job(&self, job_id: JobId) -> Result<JobView> {
        let done = self.tasks.lock().await.get(&job_id).map(StageTask::subscribe);
        if let Some(done) = done {
            pipeline::wait_done(done).await;
        }
        self.store.view(job_id).await
    }

    /// Cancel any running stage, drop the job and remove its files.
    ///
    /// File removal is best-effort: failures are logged and the record is
    /// removed regardless.
    pub async fn delete_job(&self, job_id: JobId) -> Result<()> {
        let job = loop {
            self.cancel_job(job_id).await?;
            let done = self.tasks.lock().await.get(&job_id).map(StageTask::subscribe);
            if let Some(done) = done {
                pipeline::wait_done(done).await;
            }

            // Stages only start under the tasks lock, so none can begin
            // between this check and the removal.
            let mut tasks = self.tasks.lock().await;
            if tasks.get(&job_id).is_some_and(StageTask::is_running) {
                debug!("[Job {}] New stage started while deleting, cancelling again", job_id);
                continue;
            }
            tasks.remove(&job_id);
            break self.store.remove(job_id).await?;
        };
        remove_owned_file(job_id, &job.video_path).await;
        if let Some(rendered) = &job.rendered_path {
            remove_owned_file(job_id, rendered).await;
        }

        info!("[Job {}] Deleted", job_id);
        Ok(())
    }

    /// Reclaim uploads older than the configured age in the upload directory.
    pub async fn sweep_stale_uploads(&self) -> Result<usize> {
        let max_age = Duration::from_secs(self.jobs.stale_upload_max_age_hours * 3600);
        cleanup::sweep_stale_uploads(&self.jobs.upload_dir, max_age).await
    }
}

fn validate_cues(cues: &[SubtitleCue]) -> Result<()> {
    for (index, cue) in cues.iter().enumerate() {
        cue.validate()
            .map_err(|e| SubburnError::Validation(format!("cue {}: {}", index, e)))?;
    }
    Ok(())
}

fn ensure_idle(job: &Job) -> Result<()> {
    if job.status.is_in_flight() {
        return Err(SubburnError::Conflict(format!(
            "job {} is busy ({})",
            job.id, job.status
        )));
    }
    Ok(())
}

pub(crate) async fn remove_owned_file(job_id: JobId, path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("[Job {}] Removed {}", job_id, path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("[Job {}] {} already gone", job_id, path.display())
        }
        Err(e) => warn!("[Job {}] Failed to remove {}: {}", job_id, path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MockMediaProcessorTrait;
    use crate::subtitle::SubtitleStyle;
    use crate::transcribe::{encode_wav, EngineChunk, EngineOutput, MockSpeechEngine};
    use crate::translate::MockTextTranslator;

    struct Harness {
        orchestrator: JobOrchestrator,
        dir: tempfile::TempDir,
    }

    fn harness(media: MockMediaProcessorTrait, engine: MockSpeechEngine, translator: MockTextTranslator) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let jobs = JobsConfig {
            upload_dir: dir.path().join("uploads"),
            work_dir: dir.path().join("work"),
            output_dir: dir.path().join("rendered"),
            stale_upload_max_age_hours: 24,
        };
        let settings = PipelineSettings {
            media_timeout: Duration::from_secs(30),
            transcription_timeout: Duration::from_secs(30),
            default_model: "small".to_string(),
        };
        let orchestrator = JobOrchestrator::new(
            Arc::new(media),
            Transcriber::new(Arc::new(engine)),
            BatchTranslator::with_options(Arc::new(translator), 2, "[[[SEP]]]".to_string(), Duration::ZERO),
            jobs,
            settings,
        );
        Harness { orchestrator, dir }
    }

    fn idle_harness() -> Harness {
        harness(MockMediaProcessorTrait::new(), MockSpeechEngine::new(), MockTextTranslator::new())
    }

    fn cues() -> Vec<SubtitleCue> {
        vec![SubtitleCue::new(0.5, 3.0, "Hello"), SubtitleCue::new(3.5, 6.0, "World")]
    }

    fn files_in(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn transcription_reaches_generated_and_cleans_audio() {
        let mut media = MockMediaProcessorTrait::new();
        media.expect_extract_audio().times(1).returning(|_, audio| {
            std::fs::write(audio, encode_wav(&[0.0; 16000], 16000).unwrap()).unwrap();
            Ok(audio.to_path_buf())
        });
        let mut engine = MockSpeechEngine::new();
        engine
            .expect_recognize()
            .withf(|samples, rate, language, model| {
                samples.len() == 16000 && *rate == 16000 && language.as_deref() == Some("en") && model == "small"
            })
            .times(1)
            .returning(|_, _, _, _| {
                Ok(EngineOutput {
                    text: "Hi there".to_string(),
                    chunks: Some(vec![EngineChunk::new("Hi there", Some(0.0), Some(0.8))]),
                    language: Some("en".to_string()),
                })
            });

        let h = harness(media, engine, MockTextTranslator::new());
        let id = h.orchestrator.create_job(h.dir.path().join("a.mp4"), "a.mp4", 1.0).await.unwrap();
        h.orchestrator.start_transcription(id, Some("en"), None).await.unwrap();

        let view = h.orchestrator.wait_for_job(id).await.unwrap();
        assert_eq!(view.status, JobStatus::Generated);
        assert_eq!(view.progress, 100);
        assert_eq!(view.detected_language.as_deref(), Some("en"));
        assert_eq!(view.subtitles.unwrap()[0].text, "Hi there");
        assert_eq!(files_in(&h.dir.path().join("work")), 0);
    }

    #[tokio::test]
    async fn extraction_failure_marks_job_errored() {
        let mut media = MockMediaProcessorTrait::new();
        media
            .expect_extract_audio()
            .returning(|_, _| Err(SubburnError::MediaExtract("no audio stream".to_string())));

        let h = harness(media, MockSpeechEngine::new(), MockTextTranslator::new());
        let id = h.orchestrator.create_job(PathBuf::from("/nowhere/a.mp4"), "a.mp4", 1.0).await.unwrap();
        h.orchestrator.start_transcription(id, None, Some("base")).await.unwrap();

        let view = h.orchestrator.wait_for_job(id).await.unwrap();
        assert_eq!(view.status, JobStatus::Error);
        assert!(view.error.unwrap().contains("no audio stream"));
        assert!(!view.has_subtitles);
    }

    #[tokio::test]
    async fn rendering_without_subtitles_never_touches_media() {
        let h = idle_harness();
        let id = h.orchestrator.create_job(PathBuf::from("/up/a.mp4"), "a.mp4", 1.0).await.unwrap();

        let err = h.orchestrator.start_rendering(id).await.unwrap_err();
        assert!(matches!(err, SubburnError::Validation(_)));

        h.orchestrator.update_subtitles(id, Vec::new()).await.unwrap();
        let err = h.orchestrator.start_rendering(id).await.unwrap_err();
        assert!(matches!(err, SubburnError::Validation(_)));
        assert_eq!(h.orchestrator.get_job(id).await.unwrap().status, JobStatus::Uploaded);
    }

    #[tokio::test]
    async fn rendering_writes_prefixed_output_and_drops_ass() {
        let mut media = MockMediaProcessorTrait::new();
        media
            .expect_burn_subtitles()
            .withf(|_, subtitle, _| subtitle.extension().is_some_and(|e| e == "ass") && subtitle.exists())
            .times(1)
            .returning(|_, _, output| {
                std::fs::write(output, b"video").unwrap();
                Ok(output.to_path_buf())
            });

        let h = harness(media, MockSpeechEngine::new(), MockTextTranslator::new());
        let id = h.orchestrator.create_job(PathBuf::from("/up/clip.mkv"), "clip.mkv", 6.0).await.unwrap();
        h.orchestrator.update_subtitles(id, cues()).await.unwrap();
        h.orchestrator.start_rendering(id).await.unwrap();

        let view = h.orchestrator.wait_for_job(id).await.unwrap();
        assert_eq!(view.status, JobStatus::Completed);
        let rendered = view.rendered_path.unwrap();
        let file_name = rendered.file_name().unwrap().to_string_lossy().into_owned();
        assert!(file_name.starts_with("rendered_") && file_name.ends_with(".mkv"));
        assert!(rendered.starts_with(h.dir.path().join("rendered")));
        assert_eq!(view.download_name.as_deref(), Some("rendered_clip.mkv"));
        assert_eq!(files_in(&h.dir.path().join("work")), 0);
    }

    #[tokio::test]
    async fn failed_render_leaves_no_partial_output() {
        let mut media = MockMediaProcessorTrait::new();
        media.expect_burn_subtitles().returning(|_, _, output| {
            std::fs::write(output, b"half a video").unwrap();
            Err(SubburnError::MediaRender("encoder crashed".to_string()))
        });

        let h = harness(media, MockSpeechEngine::new(), MockTextTranslator::new());
        let id = h.orchestrator.create_job(PathBuf::from("/up/clip.mp4"), "clip.mp4", 6.0).await.unwrap();
        h.orchestrator.update_subtitles(id, cues()).await.unwrap();
        h.orchestrator.start_rendering(id).await.unwrap();

        let view = h.orchestrator.wait_for_job(id).await.unwrap();
        assert_eq!(view.status, JobStatus::Error);
        assert!(view.rendered_path.is_none());
        assert_eq!(files_in(&h.dir.path().join("rendered")), 0);
    }

    #[tokio::test]
    async fn busy_jobs_reject_new_stages() {
        let h = idle_harness();
        let id = h.orchestrator.create_job(PathBuf::from("/up/a.mp4"), "a.mp4", 1.0).await.unwrap();
        h.orchestrator.update_subtitles(id, cues()).await.unwrap();
        h.orchestrator
            .store
            .update(id, |job| {
                job.status = JobStatus::Transcribing;
                Ok(())
            })
            .await
            .unwrap();

        let err = h.orchestrator.start_transcription(id, None, None).await.unwrap_err();
        assert!(matches!(err, SubburnError::Conflict(_)));
        let err = h.orchestrator.start_rendering(id).await.unwrap_err();
        assert!(matches!(err, SubburnError::Conflict(_)));
    }

    #[tokio::test]
    async fn invalid_cues_are_rejected() {
        let h = idle_harness();
        let id = h.orchestrator.create_job(PathBuf::from("/up/a.mp4"), "a.mp4", 1.0).await.unwrap();

        let err = h
            .orchestrator
            .update_subtitles(id, vec![SubtitleCue::new(2.0, 1.0, "backwards")])
            .await
            .unwrap_err();
        assert!(matches!(err, SubburnError::Validation(_)));

        let err = h.orchestrator.update_subtitles(JobId::new(), cues()).await.unwrap_err();
        assert!(matches!(err, SubburnError::NotFound(_)));
    }

    #[tokio::test]
    async fn translation_keeps_timing_and_style() {
        let mut translator = MockTextTranslator::new();
        translator
            .expect_translate()
            .returning(|_, _| Ok("Bonjour\n[[[SEP]]]\nMonde".to_string()));

        let h = harness(MockMediaProcessorTrait::new(), MockSpeechEngine::new(), translator);
        let id = h.orchestrator.create_job(PathBuf::from("/up/a.mp4"), "a.mp4", 1.0).await.unwrap();
        let mut styled = cues();
        styled[1].style.font_size = 30;
        h.orchestrator.update_subtitles(id, styled).await.unwrap();

        let translated = h.orchestrator.translate_subtitles(id, "fr", None).await.unwrap();
        assert_eq!(translated[0].text, "Bonjour");
        assert_eq!(translated[1].text, "Monde");
        assert_eq!(translated[1].start, 3.5);
        assert_eq!(translated[1].style.font_size, 30);

        let stored = h.orchestrator.get_job(id).await.unwrap().subtitles.unwrap();
        assert_eq!(stored, translated);
        assert_eq!(h.orchestrator.get_job(id).await.unwrap().status, JobStatus::Uploaded);
    }

    #[tokio::test]
    async fn translation_needs_cues_and_a_known_job() {
        let h = idle_harness();
        let id = h.orchestrator.create_job(PathBuf::from("/up/a.mp4"), "a.mp4", 1.0).await.unwrap();

        let err = h.orchestrator.translate_subtitles(id, "fr", None).await.unwrap_err();
        assert!(matches!(err, SubburnError::Validation(_)));

        let err = h
            .orchestrator
            .translate_subtitles(JobId::new(), "fr", Some(cues()))
            .await
            .unwrap_err();
        assert!(matches!(err, SubburnError::NotFound(_)));
    }

    #[tokio::test]
    async fn translation_rejects_invalid_override_cues() {
        let mut translator = MockTextTranslator::new();
        translator.expect_translate().never();

        let h = harness(MockMediaProcessorTrait::new(), MockSpeechEngine::new(), translator);
        let id = h.orchestrator.create_job(PathBuf::from("/up/a.mp4"), "a.mp4", 1.0).await.unwrap();

        let err = h
            .orchestrator
            .translate_subtitles(id, "fr", Some(vec![SubtitleCue::new(2.0, 1.0, "backwards")]))
            .await
            .unwrap_err();
        assert!(matches!(err, SubburnError::Validation(_)));
        assert!(h.orchestrator.get_job(id).await.unwrap().subtitles.is_none());
    }

    #[tokio::test]
    async fn delete_leaves_no_stage_behind() {
        let mut media = MockMediaProcessorTrait::new();
        media.expect_extract_audio().returning(|_, audio| {
            std::fs::write(audio, encode_wav(&[0.0; 1600], 16000).unwrap()).unwrap();
            Ok(audio.to_path_buf())
        });
        let mut engine = MockSpeechEngine::new();
        engine.expect_recognize().returning(|_, _, _, _| {
            Ok(EngineOutput {
                text: "hi".to_string(),
                chunks: None,
                language: None,
            })
        });

        let h = harness(media, engine, MockTextTranslator::new());
        let id = h.orchestrator.create_job(h.dir.path().join("a.mp4"), "a.mp4", 1.0).await.unwrap();
        h.orchestrator.start_transcription(id, None, None).await.unwrap();

        let restarter = {
            let orchestrator = h.orchestrator.clone();
            tokio::spawn(async move {
                for _ in 0..20 {
                    let _ = orchestrator.start_transcription(id, None, None).await;
                    tokio::task::yield_now().await;
                }
            })
        };
        h.orchestrator.delete_job(id).await.unwrap();
        restarter.await.unwrap();

        assert!(matches!(h.orchestrator.get_job(id).await, Err(SubburnError::NotFound(_))));
        assert!(h.orchestrator.tasks.lock().await.get(&id).is_none());
    }

    #[tokio::test]
    async fn cue_styles_are_edited_by_index() {
        let h = idle_harness();
        let id = h.orchestrator.create_job(PathBuf::from("/up/a.mp4"), "a.mp4", 1.0).await.unwrap();
        h.orchestrator.update_subtitles(id, cues()).await.unwrap();

        let cue = h
            .orchestrator
            .edit_cue_style(id, 1, StyleChange::TextColor("#ff0000".to_string()))
            .await
            .unwrap();
        assert_eq!(cue.style.text_color, "#ff0000");

        let stored = h.orchestrator.get_job(id).await.unwrap().subtitles.unwrap();
        assert_eq!(stored[0].style, SubtitleStyle::default());
        assert_eq!(stored[1].style.text_color, "#ff0000");

        let err = h.orchestrator.edit_cue_style(id, 5, StyleChange::FontSize(20)).await.unwrap_err();
        assert!(matches!(err, SubburnError::Validation(_)));
    }

    #[tokio::test]
    async fn uploads_are_probed_and_type_checked() {
        let mut media = MockMediaProcessorTrait::new();
        media.expect_probe_duration().times(1).returning(|_| Ok(42.5));

        let h = harness(media, MockSpeechEngine::new(), MockTextTranslator::new());
        let err = h
            .orchestrator
            .create_job_from_upload(Path::new("/up/notes.txt"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SubburnError::Validation(_)));

        let id = h
            .orchestrator
            .create_job_from_upload(Path::new("/up/5f2c.tmp"), Some("Holiday.MOV"))
            .await
            .unwrap();
        let view = h.orchestrator.get_job(id).await.unwrap();
        assert_eq!(view.duration, 42.5);
        assert_eq!(view.video_name, "Holiday.MOV");
        assert_eq!(h.orchestrator.list_jobs().await.len(), 1);
    }
}
