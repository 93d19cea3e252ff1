use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

use crate::capabilities::Capabilities;
use crate::error::{StoryError, StoryResult};
use crate::timeline::{Media, MediaPlaceholder, TimelineEntry};

// 1x1 PNG used when nothing else can draw a slide
const MINIMAL_PNG: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+A8AAQUBAScY42YAAAAASUVORK5CYII=";

/// What a strategy needs to produce the still image for one timeline entry.
pub struct SlideRequest<'a> {
    pub media: &'a Media,
    pub out_path: &'a Path,
    pub width: u32,
    pub height: u32,
}

impl SlideRequest<'_> {
    fn placeholder(&self) -> Option<&MediaPlaceholder> {
        match self.media {
            Media::Placeholder(p) => Some(p),
            Media::File { .. } => None,
        }
    }
}

pub trait MediaStrategy {
    fn name(&self) -> &'static str;

    fn resolve(&self, request: &SlideRequest) -> StoryResult<PathBuf>;
}

/// Uses a generated image already referenced by the timeline entry.
pub struct ExistingFile;

impl MediaStrategy for ExistingFile {
    fn name(&self) -> &'static str {
        "existing-file"
    }

    fn resolve(&self, request: &SlideRequest) -> StoryResult<PathBuf> {
        match request.media {
            Media::File { path } if Path::new(path).is_file() => Ok(PathBuf::from(path)),
            Media::File { path } => Err(StoryError::tool(self.name(), format!("{} is missing", path))),
            Media::Placeholder(_) => Err(StoryError::tool(self.name(), "entry has no media file")),
        }
    }
}

/// Solid slide in the placeholder's category colour, drawn by ffmpeg.
pub struct FfmpegColorSlide;

impl MediaStrategy for FfmpegColorSlide {
    fn name(&self) -> &'static str {
        "ffmpeg-color"
    }

    fn resolve(&self, request: &SlideRequest) -> StoryResult<PathBuf> {
        let color = request
            .placeholder()
            .map(|p| p.color.clone())
            .unwrap_or_else(|| "#1a1a2e".to_string());
        let source = format!("color=c={}:s={}x{}", color, request.width, request.height);
        let output = Command::new("ffmpeg")
            .args(["-y", "-f", "lavfi", "-i", &source, "-frames:v", "1"])
            .arg(request.out_path)
            .output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StoryError::tool(self.name(), crate::utils::preview(stderr.trim(), 200)));
        }
        if !request.out_path.exists() {
            return Err(StoryError::tool(self.name(), "no image written"));
        }
        Ok(request.out_path.to_path_buf())
    }
}

pub struct MinimalPng;

impl MediaStrategy for MinimalPng {
    fn name(&self) -> &'static str {
        "minimal-png"
    }

    fn resolve(&self, request: &SlideRequest) -> StoryResult<PathBuf> {
        let bytes = BASE64
            .decode(MINIMAL_PNG)
            .map_err(|e| StoryError::tool(self.name(), e.to_string()))?;
        fs::write(request.out_path, bytes)?;
        Ok(request.out_path.to_path_buf())
    }
}

pub struct Resolved {
    pub path: PathBuf,
    pub strategy: &'static str,
}

/// Ranked strategies; the first that succeeds wins.
pub struct MediaResolver {
    strategies: Vec<Box<dyn MediaStrategy>>,
}

impl MediaResolver {
    pub fn new(strategies: Vec<Box<dyn MediaStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn for_capabilities(caps: &Capabilities) -> Self {
        let mut strategies: Vec<Box<dyn MediaStrategy>> = vec![Box::new(ExistingFile)];
        if caps.ffmpeg {
            strategies.push(Box::new(FfmpegColorSlide));
        }
        strategies.push(Box::new(MinimalPng));
        Self::new(strategies)
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn resolve(&self, request: &SlideRequest) -> StoryResult<Resolved> {
        for strategy in &self.strategies {
            match strategy.resolve(request) {
                Ok(path) => {
                    info!("Slide {} via {}", path.display(), strategy.name());
                    return Ok(Resolved {
                        path,
                        strategy: strategy.name(),
                    });
                }
                Err(e) => warn!("{} could not produce slide: {}", strategy.name(), e),
            }
        }
        Err(StoryError::tool(
            "media",
            format!("no strategy produced {}", request.out_path.display()),
        ))
    }

    pub fn resolve_entry(
        &self,
        entry: &TimelineEntry,
        out_path: &Path,
        width: u32,
        height: u32,
    ) -> StoryResult<Resolved> {
        self.resolve(&SlideRequest {
            media: entry.media(),
            out_path,
            width,
            height,
        })
    }
}
