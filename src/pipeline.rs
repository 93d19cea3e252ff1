use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::StoryConfig;
use crate::error::{StoryError, StoryResult};
use crate::feed::{self, Article, FeedClient, UsedLinks};
use crate::render::{RenderBackend, RenderOutput};
use crate::script::{self, Script};
use crate::segmenter;
use crate::store::{ProjectStore, SavedArtifacts};
use crate::subtitle;
use crate::timeline::{self, AudioRef, Project};
use crate::tts::Narrator;
use crate::upload::GithubUploader;
use crate::utils::{clean_markup, preview, trim_for_narration};

/// Videos at or below this size are treated as broken renders and not uploaded.
const MIN_UPLOAD_BYTES: u64 = 1000;

/// What the CLI reports back for every run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub success: bool,
    pub message: String,
    pub project_id: Option<String>,
    pub title: Option<String>,
    pub files: Option<SavedArtifacts>,
    pub video: Option<RenderOutput>,
    pub url: Option<String>,
}

impl RunReport {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            project_id: None,
            title: None,
            files: None,
            video: None,
            url: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            ..Self::success(message)
        }
    }
}

/// Article body to narration script: cleanup, trim, segment, compose.
pub fn script_for(article: &Article, config: &StoryConfig) -> StoryResult<Script> {
    let text = trim_for_narration(&clean_markup(&article.description), config.script.max_chars);
    let segments = segmenter::segment(&text, config.script.segment_count)?;
    script::compose(&article.title, &segments, &config.script)
}

/// Builds the project and its subtitles; nothing touches the disk.
pub fn project_for(article: &Article, config: &StoryConfig) -> StoryResult<Project> {
    let script = script_for(article, config)?;
    info!("Script length: {} segments", script.segments.len());
    let subtitles = subtitle::encode(&script)?;
    Ok(timeline::build(article, &script, subtitles, None, &config.video))
}

pub struct Pipeline {
    pub config: StoryConfig,
    pub store: ProjectStore,
    pub narrator: Option<Box<dyn Narrator>>,
    pub renderer: Box<dyn RenderBackend>,
    pub uploader: Option<GithubUploader>,
    pub used_links_path: PathBuf,
}

impl Pipeline {
    /// Narrates every entry with text. A failed clip leaves its entry silent.
    pub async fn narrate(&self, project: &mut Project) {
        let Some(narrator) = &self.narrator else {
            info!("Narration disabled; project will be silent");
            return;
        };
        let mut refs = Vec::new();
        for (i, entry) in project.timeline.iter().enumerate() {
            if entry.text().trim().is_empty() {
                continue;
            }
            info!("TTS {}/{}: {}...", i + 1, project.timeline.len(), preview(entry.text(), 50));
            let out = self
                .store
                .dir()
                .join(format!("narration_{}_{}.wav", project.id, i));
            match narrator.narrate(entry.text(), &out).await {
                Ok(path) => refs.push(AudioRef {
                    entry: i,
                    path: path.to_string_lossy().to_string(),
                }),
                Err(e) => warn!("{} failed for entry {}: {}", narrator.name(), i, e),
            }
        }
        info!("Audio files: {}", refs.len());
        project.audio_refs = refs;
    }

    /// First candidate that yields a project. Bodies with no words after
    /// markup cleanup are passed over like a failing source.
    fn first_usable(&self, candidates: Vec<Article>) -> StoryResult<(Article, Project)> {
        for article in candidates {
            if clean_markup(&article.description).split_whitespace().next().is_none() {
                warn!("Skipping story with no text: {}", article.title);
                continue;
            }
            info!("Selected story: \"{}\" from {}", article.title, article.source);
            let project = project_for(&article, &self.config)?;
            return Ok((article, project));
        }
        Err(StoryError::NoContent)
    }

    /// The story's link is recorded as used only once its project is on disk.
    pub async fn generate(&self, client: &dyn FeedClient) -> StoryResult<(Project, SavedArtifacts)> {
        info!("STEP 1: Fetching story");
        let articles =
            feed::collect_articles(client, &self.config.sources, self.config.per_source_limit).await?;
        let mut used = UsedLinks::load(&self.used_links_path)?;

        info!("STEP 2: Composing script and subtitles");
        let (article, mut project) = self.first_usable(used.unused(articles))?;

        info!("STEP 3: Narrating");
        self.narrate(&mut project).await;

        info!("STEP 4: Saving project");
        let saved = self.store.save(&project)?;
        used.mark(&article.link)?;
        Ok((project, saved))
    }

    /// Renders a stored project and optionally uploads it. Render and upload
    /// failures leave `video`/`url` empty without failing the run.
    pub async fn render(&self, id: &str, upload: bool) -> StoryResult<RunReport> {
        let project = self.store.load(id)?;
        info!("RENDERING {} with {}", project.id, self.renderer.name());

        let video = match self.renderer.render(&project, &self.store) {
            Ok(output) => Some(output),
            Err(e) => {
                warn!("Render error: {}", e);
                None
            }
        };

        let mut url = None;
        match (&video, upload, &self.uploader) {
            (Some(output), true, Some(uploader)) if output.size_bytes > MIN_UPLOAD_BYTES => {
                url = uploader
                    .upload(&output.video_path, &format!("Add video: {}", project.title))
                    .await;
            }
            (Some(_), true, Some(_)) => warn!("Video too small, skipping upload"),
            (Some(_), true, None) => warn!("No GitHub repo or token configured, skipping upload"),
            _ => {}
        }

        let message = match (&video, &url) {
            (Some(_), Some(_)) => "Video rendered and uploaded",
            (Some(_), None) if upload => "Video rendered (upload failed or skipped)",
            (Some(_), None) => "Video rendered",
            (None, _) => "Project ready; rendering produced no video",
        };
        Ok(RunReport {
            project_id: Some(project.id.clone()),
            title: Some(project.title.clone()),
            video,
            url,
            ..RunReport::success(message)
        })
    }

    pub async fn generate_report(&self, client: &dyn FeedClient) -> StoryResult<RunReport> {
        let (project, saved) = self.generate(client).await?;
        Ok(RunReport {
            project_id: Some(project.id),
            title: Some(project.title),
            files: Some(saved),
            ..RunReport::success("Video project generated")
        })
    }

    /// Generate then render in one run.
    pub async fn auto(&self, client: &dyn FeedClient, upload: bool) -> StoryResult<RunReport> {
        let (project, saved) = self.generate(client).await?;
        let mut report = self.render(&project.id, upload).await?;
        report.files = Some(saved);
        Ok(report)
    }
}
