use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{StoryError, StoryResult};
use crate::script::Script;

static TIMECODE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}):(\d{2}):(\d{2}),(\d{3}) --> (\d{2}):(\d{2}):(\d{2}),(\d{3})$").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleCue {
    pub index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

/// Lays the script out back to back: intro, each segment, then the outro
/// stretched or truncated so it ends exactly at the script total.
pub fn cues(script: &Script) -> StoryResult<Vec<SubtitleCue>> {
    if script.segments.is_empty() {
        return Err(StoryError::input("script has no segments"));
    }

    let mut cues = Vec::with_capacity(script.segments.len() + 2);
    let mut cursor = 0_u64;
    if script.intro_ms == 0 {
        return Err(StoryError::input("intro duration must be positive"));
    }
    push_cue(&mut cues, cursor, script.intro_ms, &script.intro);
    cursor = script.intro_ms;

    for (i, segment) in script.segments.iter().enumerate() {
        if segment.duration_ms == 0 {
            return Err(StoryError::input(format!("segment {} has no duration", i + 1)));
        }
        let end = cursor + segment.duration_ms;
        push_cue(&mut cues, cursor, end, &segment.text);
        cursor = end;
    }

    if cursor >= script.total_ms {
        return Err(StoryError::input(format!(
            "outro would start at {} ms, past the {} ms total",
            cursor, script.total_ms
        )));
    }
    push_cue(&mut cues, cursor, script.total_ms, &script.outro);

    Ok(cues)
}

fn push_cue(cues: &mut Vec<SubtitleCue>, start_ms: u64, end_ms: u64, text: &str) {
    cues.push(SubtitleCue {
        index: cues.len() + 1,
        start_ms,
        end_ms,
        text: text.to_string(),
    });
}

/// SRT document for a script.
pub fn encode(script: &Script) -> StoryResult<String> {
    Ok(render_srt(&cues(script)?))
}

pub fn render_srt(cues: &[SubtitleCue]) -> String {
    let mut out = String::new();
    for cue in cues {
        out.push_str(&format!("{}\n", cue.index));
        out.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(cue.start_ms),
            format_srt_time(cue.end_ms)
        ));
        out.push_str(&format!("{}\n\n", cue.text));
    }
    out
}

pub fn write_srt(path: &Path, cues: &[SubtitleCue]) -> StoryResult<()> {
    fs::write(path, render_srt(cues))?;
    Ok(())
}

pub fn format_srt_time(ms: u64) -> String {
    let millis = ms % 1000;
    let total_sec = ms / 1000;
    let s = total_sec % 60;
    let total_min = total_sec / 60;
    let m = total_min % 60;
    let h = total_min / 60;
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, millis)
}

fn timecode_ms(caps: &regex::Captures, first: usize) -> u64 {
    let part = |i: usize| caps[first + i].parse::<u64>().unwrap_or(0);
    part(0) * 3_600_000 + part(1) * 60_000 + part(2) * 1_000 + part(3)
}

/// Reads an SRT document back into cues. Blank lines end a cue, so a cue
/// whose text is empty is followed by two of them.
pub fn parse_srt(content: &str) -> StoryResult<Vec<SubtitleCue>> {
    let mut cues = Vec::new();
    let mut lines = content.lines().map(|l| l.trim_end_matches('\r'));

    while let Some(line) = lines.next() {
        if line.trim().is_empty() {
            continue;
        }
        let index: usize = line
            .trim()
            .parse()
            .map_err(|_| StoryError::input(format!("expected cue index, found {:?}", line)))?;

        let timing = lines
            .next()
            .ok_or_else(|| StoryError::input(format!("cue {} has no timecode", index)))?;
        let caps = TIMECODE_REGEX
            .captures(timing.trim())
            .ok_or_else(|| StoryError::input(format!("bad timecode {:?}", timing)))?;

        let mut text_lines = Vec::new();
        for text in lines.by_ref() {
            if text.is_empty() {
                break;
            }
            text_lines.push(text);
        }

        cues.push(SubtitleCue {
            index,
            start_ms: timecode_ms(&caps, 1),
            end_ms: timecode_ms(&caps, 5),
            text: text_lines.join("\n"),
        });
    }
    Ok(cues)
}
