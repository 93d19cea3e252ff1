use hound::WavReader;
use std::path::Path;
use std::time::Duration;

use crate::error::{StoryError, StoryResult};

/// Playback length of a WAV clip from its header and sample count.
pub fn clip_duration(path: &Path) -> StoryResult<Duration> {
    let reader = WavReader::open(path)
        .map_err(|e| StoryError::tool("hound", format!("{}: {}", path.display(), e)))?;
    let spec = reader.spec();
    if spec.channels == 0 || spec.sample_rate == 0 {
        return Err(StoryError::tool("hound", format!("{} has an empty format", path.display())));
    }
    let frames = reader.len() as f64 / spec.channels as f64;
    Ok(Duration::from_secs_f64(frames / spec.sample_rate as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measures_written_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        // 1.5 s of stereo silence
        for _ in 0..(8_000 * 3 / 2 * 2) {
            writer.write_sample(0_i16).unwrap();
        }
        writer.finalize().unwrap();

        assert_eq!(clip_duration(&path).unwrap(), Duration::from_millis(1500));
    }

    #[test]
    fn non_wav_is_a_tool_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        std::fs::write(&path, b"not audio").unwrap();
        assert!(matches!(clip_duration(&path), Err(StoryError::ExternalTool { .. })));
    }
}
