use serde::Serialize;
use std::process::{Command, Stdio};
use tracing::{info, warn};

/// External binaries available to the narration and render backends.
/// Probed once by the caller and handed down explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub ffmpeg: bool,
    pub espeak: bool,
    pub piper: bool,
    pub python3: bool,
}

fn tool_runs(program: &str, flag: &str) -> bool {
    let found = Command::new(program)
        .arg(flag)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false);
    if !found {
        warn!("{} not found", program);
    }
    found
}

impl Capabilities {
    pub fn probe() -> Self {
        let caps = Self {
            ffmpeg: tool_runs("ffmpeg", "-version"),
            espeak: tool_runs("espeak-ng", "--version"),
            piper: tool_runs("piper", "--help"),
            python3: tool_runs("python3", "--version"),
        };
        info!(
            "Tools: ffmpeg={} espeak-ng={} piper={} python3={}",
            caps.ffmpeg, caps.espeak, caps.piper, caps.python3
        );
        caps
    }

    pub fn none() -> Self {
        Self::default()
    }
}
