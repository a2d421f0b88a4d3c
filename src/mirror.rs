use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Request timeout for mirror calls; a hung push must not linger forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const API_BASE: &str = "https://api.github.com";

#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("mirror request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("mirror rejected {path}: {status}")]
    Status {
        path: String,
        status: reqwest::StatusCode,
    },
}

pub type PublishFuture = Pin<Box<dyn Future<Output = Result<(), MirrorError>> + Send>>;

/// Best-effort publisher of record files to a remote store
///
/// Request handlers depend on this capability only, never on the concrete
/// hosting client. Publishing is fire-and-forget: callers log failures and
/// move on.
pub trait Publisher: Send + Sync {
    /// Create or replace `file_name` on the remote with `content`
    fn publish(&self, file_name: &str, content: Vec<u8>) -> PublishFuture;
}

/// Mirrors record files into a GitHub repository via the contents API
///
/// Create-or-update semantics: an existing file's blob SHA is looked up
/// first and included in the upload so a prior version is replaced.
#[derive(Debug, Clone)]
pub struct GithubMirror {
    client: reqwest::Client,
    token: String,
    repo: String,
    branch: String,
}

#[derive(Deserialize)]
struct ContentsMeta {
    sha: String,
}

impl GithubMirror {
    /// Build a mirror client for `owner/name` on the given branch
    pub fn new(token: &str, repo: &str, branch: &str) -> Result<GithubMirror, MirrorError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("vaxsurvey/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(GithubMirror {
            client,
            token: token.to_string(),
            repo: repo.to_string(),
            branch: branch.to_string(),
        })
    }

    fn contents_url(&self, file_name: &str) -> String {
        format!("{}/repos/{}/contents/{}", API_BASE, self.repo, file_name)
    }

    /// Look up the blob SHA of a previously pushed file, if any
    async fn existing_sha(&self, file_name: &str) -> Result<Option<String>, MirrorError> {
        let response = self
            .client
            .get(self.contents_url(file_name))
            .query(&[("ref", self.branch.as_str())])
            .bearer_auth(&self.token)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(MirrorError::Status {
                path: file_name.to_string(),
                status: response.status(),
            });
        }
        let meta: ContentsMeta = response.json().await?;
        Ok(Some(meta.sha))
    }

    async fn push_file(&self, file_name: &str, content: Vec<u8>) -> Result<(), MirrorError> {
        let sha = self.existing_sha(file_name).await?;

        let mut body = serde_json::json!({
            "message": format!("Update {}", file_name),
            "content": BASE64.encode(&content),
            "branch": self.branch,
        });
        if let Some(sha) = sha {
            body["sha"] = serde_json::Value::String(sha);
        }

        let response = self
            .client
            .put(self.contents_url(file_name))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MirrorError::Status {
                path: file_name.to_string(),
                status: response.status(),
            });
        }
        Ok(())
    }
}

impl Publisher for GithubMirror {
    fn publish(&self, file_name: &str, content: Vec<u8>) -> PublishFuture {
        let mirror = self.clone();
        let file_name = file_name.to_string();
        Box::pin(async move { mirror.push_file(&file_name, content).await })
    }
}
