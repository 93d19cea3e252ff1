use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct ExistingContent {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Debug, Deserialize)]
struct PutContent {
    download_url: Option<String>,
}

/// Commits finished videos into a GitHub repository through the Contents API.
pub struct GithubUploader {
    client: reqwest::Client,
    api_base: String,
    repo: String,
    dir: String,
    token: String,
}

impl GithubUploader {
    pub fn new(repo: &str, dir: &str, token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: "https://api.github.com".to_string(),
            repo: repo.to_string(),
            dir: dir.trim_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn contents_url(&self, file_name: &str) -> String {
        if self.dir.is_empty() {
            format!("{}/repos/{}/contents/{}", self.api_base, self.repo, file_name)
        } else {
            format!("{}/repos/{}/contents/{}/{}", self.api_base, self.repo, self.dir, file_name)
        }
    }

    /// Download URL of the committed file, or `None` on any failure.
    pub async fn upload(&self, path: &Path, message: &str) -> Option<String> {
        match self.try_upload(path, message).await {
            Ok(url) => {
                info!("Uploaded: {}", url);
                Some(url)
            }
            Err(e) => {
                warn!("Upload failed: {:#}", e);
                None
            }
        }
    }

    async fn try_upload(&self, path: &Path, message: &str) -> anyhow::Result<String> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid filename"))?;
        let content = BASE64.encode(fs::read(path)?);
        let url = self.contents_url(file_name);
        let auth = format!("token {}", self.token);
        info!("Uploading {} to {}", file_name, self.repo);

        // an existing file must be replaced by naming its blob sha
        let existing = self
            .client
            .get(&url)
            .header(AUTHORIZATION, &auth)
            .header(USER_AGENT, "storyreels/0.1")
            .send()
            .await?;
        let sha = if existing.status().is_success() {
            let found: ExistingContent = existing.json().await?;
            info!("Existing file SHA: {}", found.sha);
            Some(found.sha)
        } else {
            None
        };

        let mut body = serde_json::json!({ "message": message, "content": content });
        if let Some(sha) = sha {
            body["sha"] = serde_json::Value::String(sha);
        }

        let response = self
            .client
            .put(&url)
            .header(AUTHORIZATION, &auth)
            .header(USER_AGENT, "storyreels/0.1")
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let parsed: PutResponse = response.json().await?;
        parsed
            .content
            .download_url
            .ok_or_else(|| anyhow::anyhow!("response carried no download URL"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_contents_url() {
        let uploader = GithubUploader::new("owner/videos", "/video/", "t");
        assert_eq!(
            uploader.contents_url("a.mp4"),
            "https://api.github.com/repos/owner/videos/contents/video/a.mp4"
        );
        let uploader = GithubUploader::new("owner/videos", "", "t").with_api_base("http://localhost:9/");
        assert_eq!(uploader.contents_url("a.mp4"), "http://localhost:9/repos/owner/videos/contents/a.mp4");
    }

    #[tokio::test]
    async fn unreadable_file_fails_before_any_request() {
        let uploader = GithubUploader::new("owner/videos", "video", "t").with_api_base("http://127.0.0.1:9");
        let err = uploader
            .try_upload(Path::new("/definitely/missing.mp4"), "Add video")
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<std::io::Error>().is_some());
        assert!(uploader.upload(Path::new("/definitely/missing.mp4"), "Add video").await.is_none());
    }
}
