use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::VideoFormat;
use crate::feed::Article;
use crate::script::Script;
use crate::utils::preview;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Person,
    History,
    Money,
    Food,
    Animal,
    War,
    Crime,
    Science,
    Love,
    Death,
    Lego,
    Default,
}

/// Evaluated top to bottom; the first category with a matching keyword wins.
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (Category::Person, &["man", "woman", "people", "king"]),
    (Category::History, &["year", "century", "war", "ancient"]),
    (Category::Money, &["money", "gold", "rich", "dollar"]),
    (Category::Food, &["food", "eat", "cook"]),
    (Category::Animal, &["animal", "dog", "cat", "bird"]),
    (Category::War, &["war", "soldier", "army", "battle"]),
    (Category::Crime, &["crime", "police", "prison"]),
    (Category::Science, &["science", "invent", "discovery"]),
    (Category::Love, &["love", "marriage", "romance"]),
    (Category::Death, &["death", "die", "kill"]),
    (Category::Lego, &["lego", "toy", "brick"]),
];

impl Category {
    pub fn color(self) -> &'static str {
        match self {
            Category::Person => "#2C3E50",
            Category::History => "#3D2817",
            Category::Money => "#0D3D0D",
            Category::Food => "#4A1C1C",
            Category::Animal => "#0D3320",
            Category::War => "#3D0D0D",
            Category::Crime => "#1a1a1a",
            Category::Science => "#0D1F3C",
            Category::Love => "#3D1C2C",
            Category::Death => "#1a1a1a",
            Category::Lego => "#FFE66D",
            Category::Default => "#1a1a2e",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Category::Person => "👤",
            Category::History => "📜",
            Category::Money => "💰",
            Category::Food => "🍽️",
            Category::Animal => "🐾",
            Category::War => "⚔️",
            Category::Crime => "🔍",
            Category::Science => "🔬",
            Category::Love => "❤️",
            Category::Death => "💀",
            Category::Lego => "🧱",
            Category::Default => "⭐",
        }
    }
}

/// Case-insensitive substring match against [`CATEGORY_KEYWORDS`].
pub fn classify(text: &str) -> Category {
    let lower = text.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Default)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaPlaceholder {
    pub category: Category,
    pub color: String,
    pub icon: String,
    pub text: String,
}

impl MediaPlaceholder {
    pub fn for_text(text: &str) -> Self {
        let category = classify(text);
        Self {
            category,
            color: category.color().to_string(),
            icon: category.icon().to_string(),
            text: preview(text, 30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Media {
    File { path: String },
    Placeholder(MediaPlaceholder),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TimelineEntry {
    #[serde(rename_all = "camelCase")]
    Intro {
        duration_seconds: f64,
        text: String,
        media: Media,
    },
    #[serde(rename_all = "camelCase")]
    Segment {
        duration_seconds: f64,
        narration: String,
        media: Media,
    },
    #[serde(rename_all = "camelCase")]
    Outro {
        duration_seconds: f64,
        text: String,
        media: Media,
    },
}

impl TimelineEntry {
    pub fn duration_seconds(&self) -> f64 {
        match self {
            TimelineEntry::Intro { duration_seconds, .. }
            | TimelineEntry::Segment { duration_seconds, .. }
            | TimelineEntry::Outro { duration_seconds, .. } => *duration_seconds,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            TimelineEntry::Intro { text, .. } | TimelineEntry::Outro { text, .. } => text,
            TimelineEntry::Segment { narration, .. } => narration,
        }
    }

    pub fn media(&self) -> &Media {
        match self {
            TimelineEntry::Intro { media, .. }
            | TimelineEntry::Segment { media, .. }
            | TimelineEntry::Outro { media, .. } => media,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimelineEntry::Intro { .. } => "intro",
            TimelineEntry::Segment { .. } => "segment",
            TimelineEntry::Outro { .. } => "outro",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub total_duration_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub source: String,
    pub link: String,
    pub created_at: DateTime<Utc>,
    pub video_settings: VideoSettings,
    pub timeline: Vec<TimelineEntry>,
    pub subtitle_document: String,
    #[serde(default)]
    pub audio_refs: Vec<AudioRef>,
}

/// Narration clip for one timeline entry, by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioRef {
    pub entry: usize,
    pub path: String,
}

impl Project {
    pub fn segments(&self) -> impl Iterator<Item = &TimelineEntry> {
        self.timeline
            .iter()
            .filter(|e| matches!(e, TimelineEntry::Segment { .. }))
    }
}

fn media_for(refs: Option<&[String]>, position: usize, fallback_text: &str) -> Media {
    match refs.and_then(|r| r.get(position)) {
        Some(path) => Media::File { path: path.clone() },
        None => Media::Placeholder(MediaPlaceholder::for_text(fallback_text)),
    }
}

/// Lays out Intro, one entry per script segment, and Outro under a fresh id.
///
/// `media_refs` is positional with the intro at index 0; entries beyond the
/// end of the list get a placeholder classified from their text.
pub fn build(
    article: &Article,
    script: &Script,
    subtitle_document: String,
    media_refs: Option<&[String]>,
    format: &VideoFormat,
) -> Project {
    let ms_to_seconds = |ms: u64| ms as f64 / 1000.0;
    let mut timeline = Vec::with_capacity(script.segments.len() + 2);

    timeline.push(TimelineEntry::Intro {
        duration_seconds: ms_to_seconds(script.intro_ms),
        text: script.intro.clone(),
        media: media_for(media_refs, 0, &article.title),
    });
    for (i, segment) in script.segments.iter().enumerate() {
        timeline.push(TimelineEntry::Segment {
            duration_seconds: segment.duration_seconds(),
            narration: segment.text.clone(),
            media: media_for(media_refs, i + 1, &segment.text),
        });
    }
    timeline.push(TimelineEntry::Outro {
        duration_seconds: ms_to_seconds(script.outro_ms()),
        text: script.outro.clone(),
        media: media_for(media_refs, script.segments.len() + 1, &script.outro),
    });

    let project = Project {
        id: Uuid::new_v4().to_string(),
        title: article.title.clone(),
        source: article.source.clone(),
        link: article.link.clone(),
        created_at: Utc::now(),
        video_settings: VideoSettings {
            width: format.width,
            height: format.height,
            fps: format.fps,
            total_duration_seconds: ms_to_seconds(script.total_ms),
        },
        timeline,
        subtitle_document,
        audio_refs: Vec::new(),
    };
    for entry in &project.timeline {
        debug!("{} entry: {:.3}s", entry.label(), entry.duration_seconds());
    }
    info!(
        "Built project {} with {} timeline entries",
        project.id,
        project.timeline.len()
    );
    project
}
