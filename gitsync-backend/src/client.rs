//! HTTP client for the workspace backend's git endpoints.

use crate::error::{BackendError, Result};
use crate::types::{CommitRequest, ErrorBody, StashRequest, StatusResponse};
use gitsync_core::{BackendConfig, BackendStatus, Credential, RemoteAction, StashOp};
use reqwest::{Client, Response};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Client for the backend that owns a workspace's checkout.
///
/// Every call may wait on the backend booting the workspace VM, so the
/// request timeout is generous.
pub struct BackendClient {
    http: Client,
    base_url: Url,
}

impl BackendClient {
    /// Create a new client with the given configuration.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(BackendError::InvalidUrl("URL cannot be empty".into()));
        }
        if !config.url.starts_with("http://") && !config.url.starts_with("https://") {
            return Err(BackendError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        let base_url = Url::parse(config.url.trim_end_matches('/'))
            .map_err(|e| BackendError::InvalidUrl(format!("{}: {}", config.url, e)))?;

        let http = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("gitsync/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, base_url })
    }

    /// Get the backend base URL.
    pub fn url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Build `{base}/{endpoint}/{workspace}` with the workspace id escaped.
    fn endpoint(&self, endpoint: &str, workspace_id: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .push(endpoint)
            .push(workspace_id);
        Ok(url)
    }

    /// Fetch the repository status of a workspace.
    pub async fn status(&self, workspace_id: &str) -> Result<BackendStatus> {
        let url = self.endpoint("status", workspace_id)?;
        debug!(url = %url, "Fetching backend status");

        let response = self.http.get(url).send().await.map_err(classify)?;
        let response = check(response).await?;

        let status: StatusResponse = response
            .json()
            .await
            .map_err(|e| BackendError::ParseError(format!("Failed to parse status: {}", e)))?;

        Ok(status.into())
    }

    /// Run fetch, pull or push.
    pub async fn remote_action(
        &self,
        workspace_id: &str,
        action: RemoteAction,
        credential: &Credential,
    ) -> Result<()> {
        let url = self.endpoint(action.as_str(), workspace_id)?;
        self.post(url, credential, None::<&()>).await?;
        info!(workspace = workspace_id, action = action.as_str(), "Backend action completed");
        Ok(())
    }

    /// Commit the given paths.
    pub async fn commit_paths(
        &self,
        workspace_id: &str,
        paths: &[String],
        message: &str,
        credential: &Credential,
    ) -> Result<()> {
        let url = self.endpoint("commit", workspace_id)?;
        let body = CommitRequest {
            files: paths,
            message,
        };
        self.post(url, credential, Some(&body)).await?;
        info!(workspace = workspace_id, files = paths.len(), "Backend commit completed");
        Ok(())
    }

    /// Push or pop the stash.
    pub async fn stash_op(
        &self,
        workspace_id: &str,
        op: StashOp,
        credential: &Credential,
        message: Option<&str>,
    ) -> Result<()> {
        let url = self.endpoint("stash", workspace_id)?;
        let body = StashRequest {
            action: op,
            message,
        };
        self.post(url, credential, Some(&body)).await?;
        debug!(workspace = workspace_id, op = ?op, "Backend stash completed");
        Ok(())
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        url: Url,
        credential: &Credential,
        body: Option<&B>,
    ) -> Result<Response> {
        debug!(url = %url, "Posting to backend");

        let mut request = self.http.post(url).bearer_auth(credential.token());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(classify)?;
        check(response).await
    }
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

fn classify(e: reqwest::Error) -> BackendError {
    if e.is_connect() || e.is_timeout() {
        BackendError::Unreachable(e.to_string())
    } else {
        BackendError::Request(e)
    }
}

/// Pass 2xx responses through; turn anything else into a rejection.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    Err(BackendError::Rejected {
        status: status.as_u16(),
        message: rejection_message(&text, &status.to_string()),
    })
}

/// Backend message from a JSON `error` or `message` field, else the raw
/// body, else the status line.
fn rejection_message(body: &str, status_line: &str) -> String {
    let parsed = serde_json::from_str::<ErrorBody>(body).unwrap_or_default();
    parsed
        .error
        .or(parsed.message)
        .filter(|m| !m.trim().is_empty())
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| status_line.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> BackendConfig {
        BackendConfig {
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_non_http_urls() {
        assert!(matches!(
            BackendClient::new(&config("")),
            Err(BackendError::InvalidUrl(_))
        ));
        assert!(matches!(
            BackendClient::new(&config("ftp://host/api")),
            Err(BackendError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_endpoint_escapes_workspace_id() {
        let client = BackendClient::new(&config("http://localhost:8080/api/git/")).unwrap();
        let url = client.endpoint("status", "team a/ws#1").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/git/status/team%20a%2Fws%231");
    }

    #[test]
    fn test_rejection_message_sources() {
        assert_eq!(rejection_message(r#"{"error":"not a repo"}"#, "400 Bad Request"), "not a repo");
        assert_eq!(rejection_message(r#"{"message":"locked"}"#, "409 Conflict"), "locked");
        assert_eq!(rejection_message("merge conflict\n", "409 Conflict"), "merge conflict");
        assert_eq!(rejection_message("", "502 Bad Gateway"), "502 Bad Gateway");
    }
}
