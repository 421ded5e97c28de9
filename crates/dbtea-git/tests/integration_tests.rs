//! Integration tests for pull request providers
//!
//! The live GitHub test is marked `#[ignore]` and needs a token and a
//! throwaway repository:
//!
//! ```bash
//! GITHUB_TOKEN=... \
//! DBTEA_TEST_GITHUB_ORG=my-org \
//! DBTEA_TEST_GITHUB_REPO=sandbox \
//! DBTEA_TEST_GITHUB_HEAD=dbtea/test-branch \
//! cargo test -p dbtea-git --test integration_tests -- --ignored
//! ```

use dbtea_core::ErrorKind;
use dbtea_git::{GitHubProvider, MockProvider, PullRequest, PullRequestProvider};

fn open_all(provider: &dyn PullRequestProvider, heads: &[&str]) -> Vec<Option<String>> {
    heads
        .iter()
        .map(|head| {
            provider
                .create(&PullRequest::new("acme", "looker", *head).with_base("develop"))
                .ok()
                .and_then(|created| created.html_url)
        })
        .collect()
}

#[test]
fn mock_provider_behind_trait_object() {
    let mock = MockProvider::new();
    let urls = open_all(&mock, &["views", "models"]);

    assert_eq!(urls.len(), 2);
    assert!(urls.iter().all(Option::is_some));
    assert!(mock.requests().iter().all(|r| r.base == "develop"));
}

#[test]
fn unreachable_api_is_external_call_failure() {
    let provider = GitHubProvider::new("token").with_api_url("http://127.0.0.1:9");
    let err = provider
        .create(&PullRequest::new("acme", "looker", "views"))
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::ExternalCallFailed);
    assert_eq!(err.name, "pull-request-create-fail");
}

#[test]
#[ignore]
fn live_github_pull_request() {
    let org = std::env::var("DBTEA_TEST_GITHUB_ORG").expect("DBTEA_TEST_GITHUB_ORG");
    let repo = std::env::var("DBTEA_TEST_GITHUB_REPO").expect("DBTEA_TEST_GITHUB_REPO");
    let head = std::env::var("DBTEA_TEST_GITHUB_HEAD").expect("DBTEA_TEST_GITHUB_HEAD");

    let provider = GitHubProvider::from_env("GITHUB_TOKEN").unwrap();
    let created = provider.create(&PullRequest::new(org, repo, head)).unwrap();
    assert!(created.html_url.is_some());
}
