//! Pull request provider trait

use dbtea_core::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_BASE_BRANCH: &str = "main";
pub const DEFAULT_TITLE: &str = "dbtea updates";
pub const DEFAULT_BODY: &str = "dbtea metadata refresh";

/// A pull request to open from `head` into `base`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub organization: String,
    pub repository: String,
    pub head: String,
    pub base: String,
    pub title: String,
    pub body: String,
}

impl PullRequest {
    /// A pull request with the default base branch, title and body
    pub fn new(
        organization: impl Into<String>,
        repository: impl Into<String>,
        head: impl Into<String>,
    ) -> Self {
        Self {
            organization: organization.into(),
            repository: repository.into(),
            head: head.into(),
            base: DEFAULT_BASE_BRANCH.to_string(),
            title: DEFAULT_TITLE.to_string(),
            body: DEFAULT_BODY.to_string(),
        }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// `organization/repository`
    pub fn slug(&self) -> String {
        format!("{}/{}", self.organization, self.repository)
    }
}

impl fmt::Display for PullRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {}", self.slug(), self.head, self.base)
    }
}

/// A pull request the provider accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedPullRequest {
    pub number: Option<u64>,
    pub html_url: Option<String>,
}

/// A git hosting service able to open pull requests
pub trait PullRequestProvider: Send + Sync {
    /// Provider name (e.g., "github")
    fn name(&self) -> &'static str;

    /// Open `request`
    fn create(&self, request: &PullRequest) -> Result<CreatedPullRequest>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let pr = PullRequest::new("acme", "looker", "dbtea/refresh");
        assert_eq!(pr.base, "main");
        assert_eq!(pr.title, "dbtea updates");
        assert_eq!(pr.body, "dbtea metadata refresh");
        assert_eq!(pr.to_string(), "acme/looker dbtea/refresh -> main");
    }

    #[test]
    fn overrides() {
        let pr = PullRequest::new("acme", "looker", "feature")
            .with_base("develop")
            .with_title("Refresh views")
            .with_body("Regenerated from dbt");
        assert_eq!(pr.base, "develop");
        assert_eq!(pr.title, "Refresh views");
        assert_eq!(pr.body, "Regenerated from dbt");
    }
}
