use thiserror::Error;

pub type StoryResult<T> = Result<T, StoryError>;

/// Failures surfaced by the story pipeline.
#[derive(Error, Debug)]
pub enum StoryError {
    /// Every feed source failed or returned nothing usable
    #[error("no stories found from any source")]
    NoContent,

    /// Empty or invalid text handed to segmentation, composition or encoding
    #[error("invalid input: {0}")]
    Input(String),

    /// No project persisted under this id
    #[error("project not found: {0}")]
    NotFound(String),

    /// An external binary or API failed
    #[error("{tool} failed: {message}")]
    ExternalTool { tool: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoryError {
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }

    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            message: message.into(),
        }
    }
}
