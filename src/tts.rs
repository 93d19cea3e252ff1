use async_trait::async_trait;
use clap::ValueEnum;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{error, info};

use crate::capabilities::Capabilities;
use crate::error::{StoryError, StoryResult};
use crate::utils::preview;

/// Text-to-speech backend writing one WAV per call.
#[async_trait]
pub trait Narrator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn narrate(&self, text: &str, out_path: &Path) -> StoryResult<PathBuf>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
pub enum NarratorKind {
    None,
    Espeak,
    Piper,
    Openai,
}

#[derive(Debug, Clone, Default)]
pub struct NarratorSettings {
    pub piper_model: String,
    pub openai_api_key: Option<String>,
    pub openai_voice: String,
}

/// `None` when narration is switched off or the backend's tool is missing.
pub fn select_narrator(
    kind: NarratorKind,
    caps: &Capabilities,
    settings: &NarratorSettings,
) -> Option<Box<dyn Narrator>> {
    match kind {
        NarratorKind::None => None,
        NarratorKind::Espeak if caps.espeak => Some(Box::new(EspeakNarrator)),
        NarratorKind::Piper if caps.piper => Some(Box::new(PiperNarrator {
            model: settings.piper_model.clone(),
        })),
        NarratorKind::Openai => match &settings.openai_api_key {
            Some(key) => Some(Box::new(OpenAiNarrator::new(key.clone(), settings.openai_voice.clone()))),
            None => {
                error!("OpenAI narration selected but no API key is set");
                None
            }
        },
        other => {
            error!("Narrator {:?} selected but its binary is not installed", other);
            None
        }
    }
}

fn wrote_file(tool: &str, out_path: &Path) -> StoryResult<PathBuf> {
    match fs::metadata(out_path) {
        Ok(meta) if meta.len() > 0 => {
            info!("Audio: {} ({} bytes)", out_path.display(), meta.len());
            Ok(out_path.to_path_buf())
        }
        _ => Err(StoryError::tool(tool, format!("no audio written to {}", out_path.display()))),
    }
}

pub struct EspeakNarrator;

#[async_trait]
impl Narrator for EspeakNarrator {
    fn name(&self) -> &'static str {
        "espeak-ng"
    }

    async fn narrate(&self, text: &str, out_path: &Path) -> StoryResult<PathBuf> {
        let output = Command::new("espeak-ng")
            .args(["-p", "60", "-s", "150", "-w"])
            .arg(out_path)
            .arg(preview(text, 300))
            .output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StoryError::tool(self.name(), stderr.trim().to_string()));
        }
        wrote_file(self.name(), out_path)
    }
}

pub struct PiperNarrator {
    pub model: String,
}

#[async_trait]
impl Narrator for PiperNarrator {
    fn name(&self) -> &'static str {
        "piper"
    }

    async fn narrate(&self, text: &str, out_path: &Path) -> StoryResult<PathBuf> {
        info!("Calling Piper TTS for output file {}", out_path.display());
        let mut child = Command::new("piper")
            .args(["--model", &self.model, "--output_file"])
            .arg(out_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| StoryError::tool(self.name(), format!("failed to spawn: {}", e)))?;

        {
            let stdin = child
                .stdin
                .as_mut()
                .ok_or_else(|| StoryError::tool(self.name(), "failed to open stdin"))?;
            stdin.write_all(text.as_bytes())?;
        }

        let status = child.wait()?;
        if !status.success() {
            error!("Piper TTS command failed for {}", out_path.display());
            return Err(StoryError::tool(self.name(), "command returned non-zero"));
        }
        wrote_file(self.name(), out_path)
    }
}

pub struct OpenAiNarrator {
    client: reqwest::Client,
    api_key: String,
    voice: String,
}

impl OpenAiNarrator {
    const ENDPOINT: &'static str = "https://api.openai.com/v1/audio/speech";

    pub fn new(api_key: String, voice: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            voice,
        }
    }
}

#[async_trait]
impl Narrator for OpenAiNarrator {
    fn name(&self) -> &'static str {
        "openai-tts"
    }

    async fn narrate(&self, text: &str, out_path: &Path) -> StoryResult<PathBuf> {
        let body = serde_json::json!({
            "model": "tts-1",
            "voice": self.voice,
            "input": text,
            "speed": 1.0,
            "response_format": "wav",
        });
        let response = self
            .client
            .post(Self::ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoryError::tool(self.name(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoryError::tool(self.name(), format!("{}: {}", status, message)));
        }
        let audio = response
            .bytes()
            .await
            .map_err(|e| StoryError::tool(self.name(), e.to_string()))?;
        fs::write(out_path, &audio)?;
        wrote_file(self.name(), out_path)
    }
}
