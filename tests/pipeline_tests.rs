use async_trait::async_trait;
use std::fs;
use std::path::Path;

use storyreels::capabilities::Capabilities;
use storyreels::config::FeedSource;
use storyreels::feed::{Article, FeedClient};
use storyreels::render::{RendererKind, select_renderer};
use storyreels::tts::Narrator;
use storyreels::{Pipeline, ProjectStore, StoryConfig, StoryError, StoryResult, subtitle};

struct StaticFeed {
    articles: Vec<Article>,
}

#[async_trait]
impl FeedClient for StaticFeed {
    async fn fetch(&self, source: &FeedSource, _limit: usize) -> anyhow::Result<Vec<Article>> {
        if source.name == "down" {
            anyhow::bail!("503 Service Unavailable");
        }
        Ok(self.articles.clone())
    }
}

/// Writes a marker file per call; fails on the outro.
struct FakeNarrator;

#[async_trait]
impl Narrator for FakeNarrator {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn narrate(&self, text: &str, out_path: &Path) -> StoryResult<std::path::PathBuf> {
        if text.starts_with("What do you think") {
            return Err(StoryError::tool("fake", "voice unavailable"));
        }
        fs::write(out_path, text)?;
        Ok(out_path.to_path_buf())
    }
}

fn lost_city() -> Article {
    Article {
        title: "The Lost City".to_string(),
        description: "<p>Long ago... a city vanished. It was never found. Historians still wonder.</p>"
            .to_string(),
        link: "https://example.com/lost-city".to_string(),
        source: "Weird History".to_string(),
        pub_date: Some("Mon, 01 Jan 2024 00:00:00 GMT".to_string()),
    }
}

fn pipeline(dir: &Path, narrator: Option<Box<dyn Narrator>>) -> Pipeline {
    let mut config = StoryConfig::default();
    config.sources = vec![
        FeedSource::new("down", "https://down.example/feed"),
        FeedSource::new("up", "https://up.example/feed"),
    ];
    config.script.segment_count = 3;
    Pipeline {
        config,
        store: ProjectStore::open(dir.join("output")).unwrap(),
        narrator,
        renderer: select_renderer(RendererKind::None, &Capabilities::none()),
        uploader: None,
        used_links_path: dir.join("used_links.json"),
    }
}

#[tokio::test]
async fn generate_persists_three_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(dir.path(), None);
    let feed = StaticFeed { articles: vec![lost_city()] };

    let (project, saved) = pipeline.generate(&feed).await.unwrap();
    assert!(saved.project_path.exists());
    assert!(saved.subtitle_path.exists());
    assert!(saved.story_text_path.exists());
    assert!(project.audio_refs.is_empty());

    let srt = fs::read_to_string(&saved.subtitle_path).unwrap();
    let cues = subtitle::parse_srt(&srt).unwrap();
    assert_eq!(cues.len(), 5);
    assert_eq!(cues[0].end_ms, 3_000);
    assert_eq!(cues[4].end_ms, 60_000);

    let story = fs::read_to_string(&saved.story_text_path).unwrap();
    assert!(story.starts_with("Title: The Lost City\nSource: Weird History\n"));
    assert!(story.contains("\n- vanished. It was never\n"));

    assert_eq!(pipeline.store.load(&project.id).unwrap(), project);
}

#[tokio::test]
async fn narration_fills_audio_refs_before_saving() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(dir.path(), Some(Box::new(FakeNarrator)));
    let feed = StaticFeed { articles: vec![lost_city()] };

    let (project, _) = pipeline.generate(&feed).await.unwrap();
    let entries: Vec<usize> = project.audio_refs.iter().map(|a| a.entry).collect();
    // intro and three segments; the outro clip failed
    assert_eq!(entries, vec![0, 1, 2, 3]);

    let stored = pipeline.store.load(&project.id).unwrap();
    assert_eq!(stored.audio_refs, project.audio_refs);
}

#[tokio::test]
async fn no_articles_is_no_content_and_nothing_saved() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(dir.path(), None);
    let feed = StaticFeed { articles: vec![] };

    let result = pipeline.generate(&feed).await;
    assert!(matches!(result, Err(StoryError::NoContent)));
    assert!(pipeline.store.recent(10).unwrap().is_empty());
}

#[tokio::test]
async fn render_failure_is_reported_as_success_without_video() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(dir.path(), None);
    let feed = StaticFeed { articles: vec![lost_city()] };

    let report = pipeline.auto(&feed, true).await.unwrap();
    assert!(report.success);
    assert!(report.video.is_none());
    assert!(report.url.is_none());
    assert!(report.files.is_some());

    let id = report.project_id.unwrap();
    let status = pipeline.store.status(&id);
    assert!(status.project && status.subtitles && status.story);
    assert!(!status.video);
}

#[tokio::test]
async fn render_of_unknown_project_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(dir.path(), None);
    assert!(matches!(
        pipeline.render("missing", false).await,
        Err(StoryError::NotFound(_))
    ));
}

fn article(link: &str, body: &str) -> Article {
    Article {
        title: format!("Story {}", link),
        description: body.to_string(),
        link: link.to_string(),
        source: "Weird History".to_string(),
        pub_date: None,
    }
}

fn used_links(dir: &Path) -> Vec<String> {
    let path = dir.join("used_links.json");
    if !path.exists() {
        return Vec::new();
    }
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn wordless_story_is_passed_over() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(dir.path(), None);
    let feed = StaticFeed {
        articles: vec![
            article("bad", "<p> </p><img src=\"x.png\"/>"),
            article("good", "A real story body here."),
        ],
    };

    let (project, _) = pipeline.generate(&feed).await.unwrap();
    assert_eq!(project.link, "good");
    assert_eq!(used_links(dir.path()), vec!["good"]);
}

#[tokio::test]
async fn failed_run_records_no_used_link() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(dir.path(), None);
    let feed = StaticFeed {
        articles: vec![article("bad", "<p> </p>"), article("blank", "&nbsp;")],
    };

    assert!(matches!(pipeline.generate(&feed).await, Err(StoryError::NoContent)));
    assert!(used_links(dir.path()).is_empty());
    assert!(pipeline.store.recent(10).unwrap().is_empty());

    // a later run with a usable story still finds the earlier links unused
    let feed = StaticFeed {
        articles: vec![article("bad", "Now the body has words.")],
    };
    let (project, _) = pipeline.generate(&feed).await.unwrap();
    assert_eq!(project.link, "bad");
}
