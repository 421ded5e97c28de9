//! Git hosting integration
//!
//! Opens pull requests for regenerated LookML through a provider trait.
//! [`GitHubProvider`] talks to the GitHub REST API; [`MockProvider`] records
//! requests for tests.

pub mod github;
pub mod mock;
pub mod provider;

pub use github::{GitHubProvider, GITHUB_API_URL};
pub use mock::MockProvider;
pub use provider::{CreatedPullRequest, PullRequest, PullRequestProvider};
