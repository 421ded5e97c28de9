//! GitHub pull requests over the REST API

use dbtea_core::{DbteaError, Result};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::provider::{CreatedPullRequest, PullRequest, PullRequestProvider};

pub const GITHUB_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("dbtea/", env!("CARGO_PKG_VERSION"));

/// Opens pull requests with a personal access token
pub struct GitHubProvider {
    api_url: String,
    token: String,
}

impl GitHubProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_url: GITHUB_API_URL.to_string(),
            token: token.into(),
        }
    }

    /// Point at a GitHub Enterprise API root
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Read the token from an environment variable
    pub fn from_env(token_env: &str) -> Result<Self> {
        let token = std::env::var(token_env).map_err(|_| {
            DbteaError::missing_resource(
                "missing-git-token",
                "No git token available",
                format!("Set the {} environment variable to a GitHub access token", token_env),
            )
        })?;
        Ok(Self::new(token))
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn pulls_url(&self, request: &PullRequest) -> String {
        format!(
            "{}/repos/{}/{}/pulls",
            self.api_url, request.organization, request.repository
        )
    }
}

impl std::fmt::Debug for GitHubProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubProvider")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// JSON payload for `POST /repos/{owner}/{repo}/pulls`
pub fn request_body(request: &PullRequest) -> Value {
    json!({
        "title": request.title,
        "body": request.body,
        "head": request.head,
        "base": request.base,
    })
}

#[derive(Debug, Default, Deserialize)]
struct PullResponse {
    #[serde(default)]
    number: Option<u64>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Option<Value>,
}

fn create_failed(detail: String) -> DbteaError {
    DbteaError::external_call_failed(
        "pull-request-create-fail",
        "Error Creating GitHub Pull Request via API",
        detail,
    )
}

/// Interpret the API's answer; any status of 400 or above is a failure
pub fn parse_response(status: u16, body: &str, request: &PullRequest) -> Result<CreatedPullRequest> {
    let parsed: PullResponse = serde_json::from_str(body).unwrap_or_default();

    if status >= 400 {
        let reason = match (parsed.errors, parsed.message) {
            (Some(errors), _) => errors.to_string(),
            (None, Some(message)) => message,
            (None, None) => body.trim().to_string(),
        };
        return Err(create_failed(format!("{} (HTTP {}): {}", request, status, reason)));
    }

    tracing::info!(
        "Created pull request for branch {} at URL: {}",
        request.head,
        parsed.html_url.as_deref().unwrap_or("<unknown>")
    );
    Ok(CreatedPullRequest {
        number: parsed.number,
        html_url: parsed.html_url,
    })
}

impl PullRequestProvider for GitHubProvider {
    fn name(&self) -> &'static str {
        "github"
    }

    fn create(&self, request: &PullRequest) -> Result<CreatedPullRequest> {
        let url = self.pulls_url(request);
        tracing::debug!("POST {}", url);

        let response = ureq::post(&url)
            .config()
            .http_status_as_error(false)
            .build()
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github.v3+json")
            .header("Authorization", format!("token {}", self.token))
            .send_json(request_body(request))
            .map_err(|e| create_failed(format!("{}: HTTP request failed: {}", request, e)))?;

        let status = response.status().as_u16();
        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| create_failed(format!("{}: failed to read response body: {}", request, e)))?;

        parse_response(status, &body, request)
    }
}
