use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static SPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Strips markup tags and collapses whitespace runs into single spaces.
pub fn clean_markup(text: &str) -> String {
    let stripped = TAG_REGEX.replace_all(text, " ");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&#8217;", "'")
        .replace("&#8220;", "\"")
        .replace("&#8221;", "\"")
        .replace("&quot;", "\"")
        .replace("&amp;", "&");
    SPACE_REGEX.replace_all(&decoded, " ").trim().to_string()
}

/// Keeps the first `max_chars` characters, cut back to the last sentence
/// end when that end lies past the first quarter of the budget.
pub fn trim_for_narration(text: &str, max_chars: usize) -> String {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };
    let head = &text[..cut];
    match head.rfind(". ") {
        Some(end) if head[..end].chars().count() > max_chars / 4 => head[..=end].to_string(),
        _ => {
            warn!("No sentence break in the first {} characters; cutting mid-sentence", max_chars);
            head.trim_end().to_string()
        }
    }
}

/// Short preview of a text for log lines and placeholder slides.
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
