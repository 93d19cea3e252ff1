use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ScriptConfig;
use crate::error::{StoryError, StoryResult};

pub const OUTRO_TEXT: &str = "What do you think about this story? Leave a comment below! Don't forget to subscribe for more amazing stories!";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub text: String,
    pub duration_ms: u64,
}

impl Segment {
    pub fn duration_seconds(&self) -> f64 {
        self.duration_ms as f64 / 1000.0
    }
}

/// Narration plan: intro, segments in playback order, outro.
///
/// The outro runs from the end of the last segment up to `total_ms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    pub intro: String,
    pub intro_ms: u64,
    pub segments: Vec<Segment>,
    pub outro: String,
    pub total_ms: u64,
}

impl Script {
    pub fn outro_start_ms(&self) -> u64 {
        self.intro_ms + self.segments.iter().map(|s| s.duration_ms).sum::<u64>()
    }

    /// Zero when the segments already run past the total.
    pub fn outro_ms(&self) -> u64 {
        self.total_ms.saturating_sub(self.outro_start_ms())
    }
}

pub fn intro_for(title: &str) -> String {
    let title = title.trim().trim_end_matches(['.', '!', '?']);
    format!("Today, we're going to explore an incredible story: {}.", title)
}

/// Schedule-driven segment length: the runway left after intro and outro,
/// split evenly and clamped to the configured band. The lower bound yields
/// when the runway cannot fit `count` minimum-length segments.
pub fn segment_duration_ms(config: &ScriptConfig, count: usize) -> StoryResult<u64> {
    if count == 0 {
        return Err(StoryError::input("cannot schedule zero segments"));
    }
    config.validate()?;
    let runway = config.total_ms() - config.intro_ms() - config.outro_ms();
    let even = runway / count as u64;
    if even == 0 {
        return Err(StoryError::input(format!(
            "{} segments do not fit in a {} ms runway",
            count, runway
        )));
    }
    let min = crate::config::seconds_to_ms(config.min_segment_seconds);
    let max = crate::config::seconds_to_ms(config.max_segment_seconds);
    Ok(if even < min { even } else { even.min(max) })
}

pub fn compose(title: &str, segments: &[String], config: &ScriptConfig) -> StoryResult<Script> {
    if segments.is_empty() {
        return Err(StoryError::input("script needs at least one segment"));
    }
    let duration_ms = segment_duration_ms(config, segments.len())?;
    debug!(
        "Scheduling {} segments at {} ms each",
        segments.len(),
        duration_ms
    );

    let script = Script {
        intro: intro_for(title),
        intro_ms: config.intro_ms(),
        segments: segments
            .iter()
            .map(|text| Segment {
                text: text.clone(),
                duration_ms,
            })
            .collect(),
        outro: OUTRO_TEXT.to_string(),
        total_ms: config.total_ms(),
    };
    info!(
        "Composed script: {} segments, outro at {} ms",
        script.segments.len(),
        script.outro_start_ms()
    );
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("segment {}", i)).collect()
    }

    #[test]
    fn intro_embeds_title() {
        let script = compose("The Lost City", &chunks(3), &ScriptConfig::default()).unwrap();
        assert_eq!(
            script.intro,
            "Today, we're going to explore an incredible story: The Lost City."
        );
        assert_eq!(script.outro, OUTRO_TEXT);
        assert_eq!(intro_for("Why?"), "Today, we're going to explore an incredible story: Why.");
    }

    #[test]
    fn durations_clamp_to_band() {
        // 50 s runway / 3 = 16.6 s, clamped to 8 s
        let script = compose("t", &chunks(3), &ScriptConfig::default()).unwrap();
        assert!(script.segments.iter().all(|s| s.duration_ms == 8_000));
        assert_eq!(script.outro_start_ms(), 27_000);
        assert_eq!(script.outro_ms(), 33_000);

        // 50 s / 8 = 6.25 s stays inside the band
        let script = compose("t", &chunks(8), &ScriptConfig::default()).unwrap();
        assert!(script.segments.iter().all(|s| s.duration_ms == 6_250));
    }

    #[test]
    fn lower_bound_yields_to_runway() {
        let script = compose("t", &chunks(10), &ScriptConfig::default()).unwrap();
        assert!(script.segments.iter().all(|s| s.duration_ms == 5_000));
        assert_eq!(script.outro_start_ms(), 53_000);
        assert!(script.outro_start_ms() < script.total_ms);
    }

    #[test]
    fn duration_ignores_word_count() {
        let segments = vec!["short".to_string(), "a much longer segment of words".to_string()];
        let script = compose("t", &segments, &ScriptConfig::default()).unwrap();
        assert_eq!(script.segments[0].duration_ms, script.segments[1].duration_ms);
    }

    #[test]
    fn empty_segments_fail() {
        assert!(matches!(
            compose("t", &[], &ScriptConfig::default()),
            Err(StoryError::Input(_))
        ));
    }

    #[test]
    fn tolerates_empty_segment_text() {
        let segments = vec!["words".to_string(), String::new()];
        let script = compose("t", &segments, &ScriptConfig::default()).unwrap();
        assert_eq!(script.segments[1].text, "");
    }
}
