//! Mock pull request provider for testing
//!
//! Records every request it receives and answers with sequential pull
//! request numbers, or with a configured failure.

use crate::provider::{CreatedPullRequest, PullRequest, PullRequestProvider};
use dbtea_core::{DbteaError, Result};
use std::sync::Mutex;

/// In-memory provider; never touches the network
pub struct MockProvider {
    requests: Mutex<Vec<PullRequest>>,
    failure: Option<DbteaError>,
    provider_name: &'static str,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            failure: None,
            provider_name: "mock",
        }
    }

    /// Fail every `create` call with `error`
    pub fn with_failure(mut self, error: DbteaError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Set a custom provider name
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.provider_name = name;
        self
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<PullRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PullRequestProvider for MockProvider {
    fn name(&self) -> &'static str {
        self.provider_name
    }

    fn create(&self, request: &PullRequest) -> Result<CreatedPullRequest> {
        let number = {
            let mut requests = self.requests.lock().map_err(|_| {
                DbteaError::external_call_failed(
                    "pull-request-create-fail",
                    "Mock provider unavailable",
                    "request log lock poisoned",
                )
            })?;
            requests.push(request.clone());
            requests.len() as u64
        };

        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }

        Ok(CreatedPullRequest {
            number: Some(number),
            html_url: Some(format!(
                "https://git.example.com/{}/pull/{}",
                request.slug(),
                number
            )),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbtea_core::ErrorKind;

    #[test]
    fn records_requests() {
        let provider = MockProvider::new();
        let first = provider.create(&PullRequest::new("acme", "looker", "a")).unwrap();
        let second = provider.create(&PullRequest::new("acme", "looker", "b")).unwrap();

        assert_eq!(first.number, Some(1));
        assert_eq!(second.html_url.as_deref(), Some("https://git.example.com/acme/looker/pull/2"));

        let heads: Vec<String> = provider.requests().into_iter().map(|r| r.head).collect();
        assert_eq!(heads, vec!["a", "b"]);
    }

    #[test]
    fn configured_failure() {
        let provider = MockProvider::new().with_failure(DbteaError::external_call_failed(
            "pull-request-create-fail",
            "Error Creating GitHub Pull Request via API",
            "422",
        ));

        let err = provider.create(&PullRequest::new("acme", "looker", "a")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExternalCallFailed);
        assert_eq!(provider.requests().len(), 1);
    }

    #[test]
    fn usable_as_trait_object() {
        let provider: Box<dyn PullRequestProvider> = Box::new(MockProvider::new().with_name("github"));
        assert_eq!(provider.name(), "github");
    }
}
