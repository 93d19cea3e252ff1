use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::FeedSource;
use crate::error::{StoryError, StoryResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    /// Raw feed body, possibly with markup.
    pub description: String,
    pub link: String,
    pub source: String,
    pub pub_date: Option<String>,
}

#[async_trait]
pub trait FeedClient: Send + Sync {
    async fn fetch(&self, source: &FeedSource, limit: usize) -> anyhow::Result<Vec<Article>>;
}

pub struct RssFeedClient {
    client: reqwest::Client,
}

impl RssFeedClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for RssFeedClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedClient for RssFeedClient {
    async fn fetch(&self, source: &FeedSource, limit: usize) -> anyhow::Result<Vec<Article>> {
        let body = self
            .client
            .get(&source.url)
            .header(USER_AGENT, "storyreels/0.1")
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let channel = rss::Channel::read_from(&body[..])
            .with_context(|| format!("Invalid RSS from {}", source.url))?;
        info!("Got {} stories from {}", channel.items().len(), source.name);

        let articles = channel
            .items()
            .iter()
            .take(limit)
            .filter_map(|item| {
                let title = item.title()?.trim().to_string();
                let description = item
                    .description()
                    .or_else(|| item.content())
                    .unwrap_or_default()
                    .to_string();
                Some(Article {
                    title,
                    description,
                    link: item.link().unwrap_or_default().to_string(),
                    source: source.name.clone(),
                    pub_date: item.pub_date().map(str::to_string),
                })
            })
            .collect();
        Ok(articles)
    }
}

/// Fetches every source in order. A failing source is logged and skipped;
/// only an empty result across all of them is an error.
pub async fn collect_articles(
    client: &dyn FeedClient,
    sources: &[FeedSource],
    limit: usize,
) -> StoryResult<Vec<Article>> {
    let mut articles = Vec::new();
    for source in sources {
        info!("Fetching from {}", source.name);
        match client.fetch(source, limit).await {
            Ok(found) => articles.extend(found),
            Err(e) => warn!("Failed to fetch from {}: {:#}", source.name, e),
        }
    }
    if articles.is_empty() {
        return Err(StoryError::NoContent);
    }
    Ok(articles)
}

/// Links already turned into projects, persisted as a sorted JSON list.
pub struct UsedLinks {
    path: PathBuf,
    links: HashSet<String>,
}

impl UsedLinks {
    pub fn load(path: &Path) -> StoryResult<Self> {
        let links = if path.exists() {
            let data = fs::read_to_string(path)?;
            serde_json::from_str::<Vec<String>>(&data)?.into_iter().collect()
        } else {
            HashSet::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            links,
        })
    }

    pub fn contains(&self, link: &str) -> bool {
        self.links.contains(link)
    }

    /// Candidates in feed order: titled and not used before. Nothing is recorded.
    pub fn unused(&self, articles: Vec<Article>) -> Vec<Article> {
        articles
            .into_iter()
            .filter(|article| {
                if self.contains(&article.link) {
                    debug!("Skipping story (already used): {}", article.title);
                    return false;
                }
                !article.title.is_empty()
            })
            .collect()
    }

    pub fn mark(&mut self, link: &str) -> StoryResult<()> {
        self.links.insert(link.to_string());
        let mut sorted: Vec<&String> = self.links.iter().collect();
        sorted.sort();
        fs::write(&self.path, serde_json::to_string_pretty(&sorted)?)?;
        Ok(())
    }
}
