use clap::ValueEnum;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, error, info, warn};

use crate::audio::clip_duration;
use crate::capabilities::Capabilities;
use crate::error::{StoryError, StoryResult};
use crate::media::MediaResolver;
use crate::store::ProjectStore;
use crate::timeline::{Project, VideoSettings};

const SAMPLE_RATE: &str = "44100";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOutput {
    pub video_path: PathBuf,
    pub size_bytes: u64,
    pub slides: usize,
    pub narrated_entries: usize,
}

/// Turns a stored project into a video file.
pub trait RenderBackend {
    fn name(&self) -> &'static str;

    fn render(&self, project: &Project, store: &ProjectStore) -> StoryResult<RenderOutput>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
pub enum RendererKind {
    Ffmpeg,
    None,
}

pub fn select_renderer(kind: RendererKind, caps: &Capabilities) -> Box<dyn RenderBackend> {
    match kind {
        RendererKind::Ffmpeg if caps.ffmpeg => Box::new(FfmpegRenderer::new(caps)),
        RendererKind::Ffmpeg => {
            warn!("ffmpeg is not installed; rendering disabled");
            Box::new(NoopRenderer)
        }
        RendererKind::None => Box::new(NoopRenderer),
    }
}

/// Logs the plan and produces nothing.
pub struct NoopRenderer;

impl RenderBackend for NoopRenderer {
    fn name(&self) -> &'static str {
        "none"
    }

    fn render(&self, project: &Project, _store: &ProjectStore) -> StoryResult<RenderOutput> {
        for (i, entry) in project.timeline.iter().enumerate() {
            debug!("{} {}: {:.3}s", i, entry.label(), entry.duration_seconds());
        }
        Err(StoryError::tool(self.name(), "rendering is disabled"))
    }
}

pub struct FfmpegRenderer {
    media: MediaResolver,
}

fn run_ffmpeg(dir: &Path, args: &[String]) -> StoryResult<()> {
    debug!("ffmpeg {}", args.join(" "));
    let output = Command::new("ffmpeg").current_dir(dir).args(args).output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: String = stderr.lines().rev().take(5).collect::<Vec<_>>().join(" | ");
        error!("ffmpeg failed: {}", tail);
        return Err(StoryError::tool("ffmpeg", tail));
    }
    Ok(())
}

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn absolute(path: &Path) -> StoryResult<String> {
    Ok(fs::canonicalize(path)?.to_string_lossy().replace('\'', "'\\''"))
}

/// Bare file name; every ffmpeg call runs inside the store directory.
fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default()
}

/// Concat demuxer list giving every still its slot length.
fn slide_list(slides: &[(String, f64)]) -> String {
    let mut list = String::new();
    for (path, seconds) in slides {
        list.push_str(&format!("file '{}'\nduration {:.3}\n", path, seconds));
    }
    // the demuxer ignores the final duration unless the last file repeats
    if let Some((path, _)) = slides.last() {
        list.push_str(&format!("file '{}'\n", path));
    }
    list
}

fn pad_args(clip: &str, seconds: f64, out: &str) -> Vec<String> {
    let slot = format!("{:.3}", seconds);
    args(&["-y", "-i", clip, "-af", "apad", "-t", &slot, "-ar", SAMPLE_RATE, "-ac", "1", out])
}

fn silence_args(seconds: f64, out: &str) -> Vec<String> {
    let slot = format!("{:.3}", seconds);
    let silence = format!("anullsrc=r={}:cl=mono", SAMPLE_RATE);
    args(&["-y", "-f", "lavfi", "-i", &silence, "-t", &slot, out])
}

/// Final mux: slides, optional narration, burned subtitles, cut at the total.
/// Paths are names inside the store directory.
fn mux_args(
    settings: &VideoSettings,
    slides: &str,
    subtitles: &str,
    narration: Option<&str>,
    output: &str,
) -> Vec<String> {
    let filters = format!(
        "scale={}:{},fps={},subtitles={}:force_style='Fontsize=28,OutlineColour=&H000000&,Outline=3,Shadow=0'",
        settings.width, settings.height, settings.fps, subtitles,
    );
    let total = format!("{:.3}", settings.total_duration_seconds);

    let mut ff_args = args(&["-y", "-f", "concat", "-safe", "0", "-i", slides]);
    if let Some(audio) = narration {
        ff_args.extend(args(&["-i", audio]));
    }
    ff_args.extend(args(&["-vf", &filters, "-map", "0:v:0"]));
    if narration.is_some() {
        ff_args.extend(args(&["-map", "1:a:0", "-c:a", "aac"]));
    }
    ff_args.extend(args(&[
        "-c:v", "libx264", "-preset", "ultrafast", "-crf", "23", "-pix_fmt", "yuv420p", "-t", &total, output,
    ]));
    ff_args
}

impl FfmpegRenderer {
    pub fn new(caps: &Capabilities) -> Self {
        Self {
            media: MediaResolver::for_capabilities(caps),
        }
    }

    /// One still per timeline entry, listed for the concat demuxer with its slot length.
    fn write_slides(&self, project: &Project, store: &ProjectStore) -> StoryResult<PathBuf> {
        let settings = &project.video_settings;
        let list_path = store.dir().join(format!("slides_{}.txt", project.id));
        let mut slides = Vec::with_capacity(project.timeline.len());

        for (i, entry) in project.timeline.iter().enumerate() {
            let out = store.dir().join(format!("slide_{}_{}.png", project.id, i));
            let resolved = self
                .media
                .resolve_entry(entry, &out, settings.width, settings.height)?;
            slides.push((absolute(&resolved.path)?, entry.duration_seconds()));
        }
        fs::write(&list_path, slide_list(&slides))?;
        info!("Slides listed in {}", list_path.display());
        Ok(list_path)
    }

    /// Pads or cuts every clip to its entry's slot, fills silent entries, and
    /// concatenates the result so narration lines up with the slides.
    fn write_narration(&self, project: &Project, store: &ProjectStore) -> StoryResult<Option<(PathBuf, usize)>> {
        if project.audio_refs.is_empty() {
            return Ok(None);
        }
        let dir = store.dir();
        let list_name = format!("narration_{}.txt", project.id);
        let mut list = File::create(dir.join(&list_name))?;
        let mut narrated = 0;

        for (i, entry) in project.timeline.iter().enumerate() {
            let slot = entry.duration_seconds();
            let padded = format!("padded_{}_{}.wav", project.id, i);
            let clip = project
                .audio_refs
                .iter()
                .find(|a| a.entry == i)
                .map(|a| PathBuf::from(&a.path))
                .filter(|p| p.exists());

            match clip {
                Some(clip) => {
                    if let Ok(length) = clip_duration(&clip) {
                        let seconds = length.as_secs_f64();
                        if seconds > slot {
                            warn!(
                                "Narration for {} {} runs {:.2}s, slot is {:.2}s; cutting",
                                entry.label(),
                                i,
                                seconds,
                                slot
                            );
                        }
                    }
                    run_ffmpeg(dir, &pad_args(&absolute(&clip)?, slot, &padded))?;
                    narrated += 1;
                }
                None => run_ffmpeg(dir, &silence_args(slot, &padded))?,
            }
            writeln!(list, "file '{}'", padded)?;
        }

        let combined = format!("narration_{}.wav", project.id);
        let copy = args(&["-y", "-f", "concat", "-safe", "0", "-i", &list_name, "-c", "copy", &combined]);
        if run_ffmpeg(dir, &copy).is_err() {
            warn!("ffmpeg concat with copy failed; retrying with re-encode");
            let reencode = args(&[
                "-y", "-f", "concat", "-safe", "0", "-i", &list_name, "-c:a", "pcm_s16le", &combined,
            ]);
            run_ffmpeg(dir, &reencode)?;
        }
        info!("Combined narration written to {}", combined);
        Ok(Some((dir.join(combined), narrated)))
    }
}

impl RenderBackend for FfmpegRenderer {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn render(&self, project: &Project, store: &ProjectStore) -> StoryResult<RenderOutput> {
        let subtitle_path = store.subtitle_path(&project.id);
        if !subtitle_path.exists() {
            return Err(StoryError::NotFound(format!("subtitles for {}", project.id)));
        }

        let slides = self.write_slides(project, store)?;
        let narration = match self.write_narration(project, store) {
            Ok(narration) => narration,
            Err(e) => {
                warn!("Narration track failed, rendering silent video: {}", e);
                None
            }
        };

        let video_path = store.video_path(&project.id);
        let audio = narration.as_ref().map(|(path, _)| file_name(path));
        let ff_args = mux_args(
            &project.video_settings,
            &file_name(&slides),
            &file_name(&subtitle_path),
            audio.as_deref(),
            &file_name(&video_path),
        );

        info!("Rendering {} into {}", project.id, video_path.display());
        run_ffmpeg(store.dir(), &ff_args)?;

        let size_bytes = fs::metadata(&video_path)?.len();
        info!(
            "Video created: {} ({:.2} MB)",
            video_path.display(),
            size_bytes as f64 / 1024.0 / 1024.0
        );
        Ok(RenderOutput {
            video_path,
            size_bytes,
            slides: project.timeline.len(),
            narrated_entries: narration.map(|(_, n)| n).unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> VideoSettings {
        VideoSettings {
            width: 1080,
            height: 1920,
            fps: 30,
            total_duration_seconds: 57.0,
        }
    }

    #[test]
    fn missing_ffmpeg_selects_noop() {
        let renderer = select_renderer(RendererKind::Ffmpeg, &Capabilities::none());
        assert_eq!(renderer.name(), "none");

        let caps = Capabilities {
            ffmpeg: true,
            ..Capabilities::none()
        };
        assert_eq!(select_renderer(RendererKind::Ffmpeg, &caps).name(), "ffmpeg");
        assert_eq!(select_renderer(RendererKind::None, &caps).name(), "none");
    }

    #[test]
    fn slide_list_gives_each_still_its_slot_and_repeats_the_last() {
        let slides = vec![
            ("/out/slide_0.png".to_string(), 3.0),
            ("/out/slide_1.png".to_string(), 8.0),
            ("/out/slide_2.png".to_string(), 6.25),
        ];
        assert_eq!(
            slide_list(&slides),
            "file '/out/slide_0.png'\nduration 3.000\n\
             file '/out/slide_1.png'\nduration 8.000\n\
             file '/out/slide_2.png'\nduration 6.250\n\
             file '/out/slide_2.png'\n"
        );
        assert_eq!(slide_list(&[]), "");
    }

    #[test]
    fn narration_is_padded_to_the_slot() {
        let padded = pad_args("/clips/intro.wav", 3.0, "padded_x_0.wav");
        assert_eq!(padded[padded.len() - 1], "padded_x_0.wav");
        let t = padded.iter().position(|a| a == "-t").unwrap();
        assert_eq!(padded[t + 1], "3.000");
        assert!(padded.windows(2).any(|w| w[0] == "-af" && w[1] == "apad"));

        let silent = silence_args(8.0, "padded_x_1.wav");
        assert!(silent.contains(&"anullsrc=r=44100:cl=mono".to_string()));
        assert!(silent.windows(2).any(|w| w[0] == "-t" && w[1] == "8.000"));
    }

    #[test]
    fn mux_inputs_are_names_inside_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::open(dir.path().join("output")).unwrap();
        let narration = store.dir().join("narration_abc.wav");
        let audio = file_name(&narration);

        let ff_args = mux_args(
            &settings(),
            &file_name(&store.dir().join("slides_abc.txt")),
            &file_name(&store.subtitle_path("abc")),
            Some(audio.as_str()),
            &file_name(&store.video_path("abc")),
        );

        let inputs: Vec<&String> = ff_args
            .windows(2)
            .filter(|w| w[0] == "-i")
            .map(|w| &w[1])
            .collect();
        assert_eq!(inputs, vec!["slides_abc.txt", "narration_abc.wav"]);
        // ffmpeg runs with the store as its working directory
        assert!(ff_args.iter().all(|a| !a.contains(&*store.dir().to_string_lossy())));
        assert!(ff_args.contains(&"1:a:0".to_string()));
        assert_eq!(ff_args[ff_args.len() - 1], "story_video_abc.mp4");
        assert_eq!(ff_args[ff_args.len() - 2], "57.000");
        assert!(ff_args.iter().any(|a| a.starts_with("scale=1080:1920,fps=30,subtitles=subtitles-abc.srt:")));
    }

    #[test]
    fn silent_mux_maps_no_audio() {
        let ff_args = mux_args(&settings(), "slides.txt", "subs.srt", None, "out.mp4");
        assert_eq!(ff_args.iter().filter(|a| *a == "-i").count(), 1);
        assert!(!ff_args.contains(&"-c:a".to_string()));
    }
}
