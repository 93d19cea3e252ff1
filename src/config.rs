use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{StoryError, StoryResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSource {
    pub name: String,
    pub url: String,
}

impl FeedSource {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

/// Frame geometry of the rendered video. The duration lives in [`ScriptConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoFormat {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for VideoFormat {
    fn default() -> Self {
        // 9:16 for reels and shorts
        Self {
            width: 1080,
            height: 1920,
            fps: 30,
        }
    }
}

/// Timing schedule for the narration script.
///
/// `total_seconds` is the single source for the video length: the subtitle
/// clamp, the outro entry and the render cut all read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScriptConfig {
    pub total_seconds: f64,
    pub intro_seconds: f64,
    /// Runway kept free for the outro when sizing segments.
    pub outro_seconds: f64,
    pub min_segment_seconds: f64,
    pub max_segment_seconds: f64,
    pub segment_count: usize,
    /// Characters of article text kept for narration.
    pub max_chars: usize,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            total_seconds: 60.0,
            intro_seconds: 3.0,
            outro_seconds: 7.0,
            min_segment_seconds: 6.0,
            max_segment_seconds: 8.0,
            segment_count: 5,
            max_chars: 800,
        }
    }
}

pub(crate) fn seconds_to_ms(seconds: f64) -> u64 {
    (seconds * 1000.0).round().max(0.0) as u64
}

impl ScriptConfig {
    pub fn total_ms(&self) -> u64 {
        seconds_to_ms(self.total_seconds)
    }

    pub fn intro_ms(&self) -> u64 {
        seconds_to_ms(self.intro_seconds)
    }

    pub fn outro_ms(&self) -> u64 {
        seconds_to_ms(self.outro_seconds)
    }

    pub fn validate(&self) -> StoryResult<()> {
        if self.segment_count == 0 {
            return Err(StoryError::input("segment count must be at least 1"));
        }
        if self.intro_seconds <= 0.0 || self.min_segment_seconds <= 0.0 {
            return Err(StoryError::input("intro and segment durations must be positive"));
        }
        if self.min_segment_seconds > self.max_segment_seconds {
            return Err(StoryError::input(format!(
                "minimum segment duration {}s exceeds maximum {}s",
                self.min_segment_seconds, self.max_segment_seconds
            )));
        }
        if self.intro_ms() + self.outro_ms() >= self.total_ms() {
            return Err(StoryError::input(format!(
                "total duration {}s leaves no room after intro {}s and outro {}s",
                self.total_seconds, self.intro_seconds, self.outro_seconds
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoryConfig {
    pub sources: Vec<FeedSource>,
    /// Items taken from the top of each feed.
    pub per_source_limit: usize,
    pub video: VideoFormat,
    pub script: ScriptConfig,
    /// `owner/name` of the repository receiving uploads.
    pub github_repo: String,
    /// Directory inside the repository for uploaded videos.
    pub github_dir: String,
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            sources: vec![
                FeedSource::new("Today I Found Out", "https://todayifoundout.com/feed/"),
                FeedSource::new("Listverse", "https://listverse.com/feed/"),
                FeedSource::new("Weird History", "https://weirdhistory.com/feed/"),
            ],
            per_source_limit: 20,
            video: VideoFormat::default(),
            script: ScriptConfig::default(),
            github_repo: String::new(),
            github_dir: "video".to_string(),
        }
    }
}

impl StoryConfig {
    /// Reads a JSON config; fields missing from the file keep their defaults.
    pub fn from_file(path: &Path) -> StoryResult<Self> {
        let data = fs::read_to_string(path)?;
        let config: StoryConfig = serde_json::from_str(&data)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> StoryResult<()> {
        if self.sources.is_empty() {
            return Err(StoryError::input("no feed sources configured"));
        }
        self.script.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = StoryConfig::default();
        config.validate().unwrap();
        assert_eq!(config.script.total_ms(), 60_000);
        assert_eq!(config.video.width, 1080);
        assert_eq!(config.video.height, 1920);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"script": {{"totalSeconds": 57}}, "sources": [{{"name": "Feed", "url": "https://example.com/rss"}}]}}"#
        )
        .unwrap();

        let config = StoryConfig::from_file(file.path()).unwrap();
        assert_eq!(config.script.total_ms(), 57_000);
        assert_eq!(config.script.intro_seconds, 3.0);
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.per_source_limit, 20);
    }

    #[test]
    fn rejects_total_shorter_than_intro_and_outro() {
        let script = ScriptConfig {
            total_seconds: 10.0,
            ..ScriptConfig::default()
        };
        assert!(matches!(script.validate(), Err(StoryError::Input(_))));
    }

    #[test]
    fn rejects_inverted_band() {
        let script = ScriptConfig {
            min_segment_seconds: 9.0,
            ..ScriptConfig::default()
        };
        assert!(script.validate().is_err());
    }
}
