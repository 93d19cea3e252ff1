use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{StoryError, StoryResult};
use crate::timeline::{Project, TimelineEntry};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedArtifacts {
    pub project_path: PathBuf,
    pub subtitle_path: PathBuf,
    pub story_text_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactStatus {
    pub project: bool,
    pub subtitles: bool,
    pub story: bool,
    pub video: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: String,
    pub title: String,
    pub created_at: String,
    pub duration_seconds: f64,
}

/// Write-once store: three files per project id under one directory.
pub struct ProjectStore {
    dir: PathBuf,
}

impl ProjectStore {
    pub fn open(dir: impl Into<PathBuf>) -> StoryResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!("Project store at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn project_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("project-{}.json", id))
    }

    pub fn subtitle_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("subtitles-{}.srt", id))
    }

    pub fn story_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("story-{}.txt", id))
    }

    pub fn video_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("story_video_{}.mp4", id))
    }

    pub fn save(&self, project: &Project) -> StoryResult<SavedArtifacts> {
        let artifacts = SavedArtifacts {
            project_path: self.project_path(&project.id),
            subtitle_path: self.subtitle_path(&project.id),
            story_text_path: self.story_path(&project.id),
        };
        fs::write(&artifacts.project_path, serde_json::to_string_pretty(project)?)?;
        fs::write(&artifacts.subtitle_path, &project.subtitle_document)?;
        fs::write(&artifacts.story_text_path, transcript(project))?;

        info!("Project saved: {}", artifacts.project_path.display());
        info!("Subtitles saved: {}", artifacts.subtitle_path.display());
        info!("Story saved: {}", artifacts.story_text_path.display());
        Ok(artifacts)
    }

    pub fn load(&self, id: &str) -> StoryResult<Project> {
        let path = self.project_path(id);
        if !path.exists() {
            return Err(StoryError::NotFound(id.to_string()));
        }
        let data = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn status(&self, id: &str) -> ArtifactStatus {
        ArtifactStatus {
            project: self.project_path(id).exists(),
            subtitles: self.subtitle_path(id).exists(),
            story: self.story_path(id).exists(),
            video: self.video_path(id).exists(),
        }
    }

    /// Newest first by creation time. Files that do not parse are skipped.
    pub fn recent(&self, limit: usize) -> StoryResult<Vec<ProjectSummary>> {
        let mut projects = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let name = entry?.file_name().to_string_lossy().to_string();
            let Some(id) = name
                .strip_prefix("project-")
                .and_then(|rest| rest.strip_suffix(".json"))
            else {
                continue;
            };
            match self.load(id) {
                Ok(project) => projects.push(project),
                Err(e) => warn!("Skipping unreadable project {}: {}", name, e),
            }
        }
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(projects
            .into_iter()
            .take(limit)
            .map(|p| ProjectSummary {
                id: p.id,
                title: p.title,
                created_at: p.created_at.to_rfc3339(),
                duration_seconds: p.video_settings.total_duration_seconds,
            })
            .collect())
    }
}

/// Human-readable script: header lines, then intro, one bullet per segment, outro.
pub fn transcript(project: &Project) -> String {
    let mut lines = vec![
        format!("Title: {}", project.title),
        format!("Source: {}", project.source),
        format!("Link: {}", project.link),
        "---".to_string(),
        "Script:".to_string(),
    ];
    for entry in &project.timeline {
        match entry {
            TimelineEntry::Segment { narration, .. } => lines.push(format!("- {}", narration)),
            other => lines.push(other.text().to_string()),
        }
    }
    lines.join("\n")
}
