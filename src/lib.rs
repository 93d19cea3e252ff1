//! Narrated vertical story videos from RSS feeds.
//!
//! Article text is cleaned, cut into timed segments, encoded as SRT and laid
//! out as a project timeline. Narration, slides, rendering and upload are
//! external tools behind the `tts`, `media`, `render` and `upload` modules.

pub mod args;
pub mod audio;
pub mod capabilities;
pub mod config;
pub mod error;
pub mod feed;
pub mod media;
pub mod pipeline;
pub mod render;
pub mod script;
pub mod segmenter;
pub mod store;
pub mod subtitle;
pub mod timeline;
pub mod tts;
pub mod upload;
pub mod utils;

pub use config::StoryConfig;
pub use error::{StoryError, StoryResult};
pub use pipeline::{Pipeline, RunReport};
pub use script::{Script, Segment};
pub use store::ProjectStore;
pub use subtitle::SubtitleCue;
pub use timeline::{Project, TimelineEntry};
