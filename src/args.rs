use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::render::RendererKind;
use crate::tts::NarratorKind;

#[derive(Parser, Debug)]
#[command(name = "storyreels", about = "Narrated vertical story videos from RSS feeds")]
pub struct Args {
    #[command(subcommand)]
    pub command: Cmd,

    #[clap(long, global = true, default_value = "./output")]
    pub output_dir: PathBuf,

    /// JSON file with feed sources and timing overrides
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(long, global = true)]
    pub segments: Option<usize>,

    /// Video length; drives the final subtitle cue and the outro
    #[clap(long, global = true)]
    pub total_seconds: Option<f64>,

    #[clap(long, global = true, value_enum, default_value_t = NarratorKind::Espeak)]
    pub narrator: NarratorKind,

    #[clap(long, global = true, value_enum, default_value_t = RendererKind::Ffmpeg)]
    pub renderer: RendererKind,

    #[clap(long, global = true, default_value = "./tts/en_US-amy-medium.onnx")]
    pub piper_model: String,

    #[clap(long, global = true, default_value = "alloy")]
    pub openai_voice: String,

    #[clap(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// `owner/name` receiving uploads
    #[clap(long, global = true)]
    pub github_repo: Option<String>,

    #[clap(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Fetch a story and persist its project, subtitles and transcript
    Generate,
    /// Render a stored project to MP4
    Render {
        id: String,
        #[clap(long)]
        upload: bool,
    },
    /// Generate and render in one run
    Auto {
        #[clap(long)]
        upload: bool,
    },
    /// Show which artifacts exist for a project
    Status { id: String },
    /// List recent projects
    List {
        #[clap(long, default_value_t = 10)]
        limit: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "storyreels",
            "render",
            "abc",
            "--upload",
            "--narrator",
            "none",
            "--total-seconds",
            "57",
        ])
        .unwrap();
        assert!(matches!(args.command, Cmd::Render { ref id, upload: true } if id == "abc"));
        assert_eq!(args.narrator, NarratorKind::None);
        assert_eq!(args.total_seconds, Some(57.0));
        assert_eq!(args.output_dir, PathBuf::from("./output"));
    }
}
