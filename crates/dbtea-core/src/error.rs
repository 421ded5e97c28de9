//! Error taxonomy shared by every dbtea crate
//!
//! Every failure carries a machine-readable name (e.g. `missing-dbt-project`),
//! a short title and a human-readable detail. The kind decides the process
//! exit code.

use serde::{Deserialize, Serialize};

/// Broad category of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input supplied by the user or read from disk is malformed
    InvalidInput,

    /// A file, directory or configuration entry does not exist
    MissingResource,

    /// A subprocess or remote API call failed
    ExternalCallFailed,
}

impl ErrorKind {
    /// Process exit code for this kind
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidInput => 100,
            Self::MissingResource => 101,
            Self::ExternalCallFailed => 102,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::MissingResource => "missing_resource",
            Self::ExternalCallFailed => "external_call_failed",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A domain-tagged dbtea error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{title}: {detail}")]
pub struct DbteaError {
    /// Failure category
    pub kind: ErrorKind,

    /// Stable machine-readable identifier
    pub name: String,

    /// Short summary
    pub title: String,

    /// Human-readable explanation
    pub detail: String,
}

impl DbteaError {
    pub fn new(
        kind: ErrorKind,
        name: impl Into<String>,
        title: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            title: title.into(),
            detail: detail.into(),
        }
    }

    pub fn invalid_input(
        name: impl Into<String>,
        title: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(ErrorKind::InvalidInput, name, title, detail)
    }

    pub fn missing_resource(
        name: impl Into<String>,
        title: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(ErrorKind::MissingResource, name, title, detail)
    }

    pub fn external_call_failed(
        name: impl Into<String>,
        title: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(ErrorKind::ExternalCallFailed, name, title, detail)
    }

    /// IO failure while touching `path`
    pub fn io(path: &std::path::Path, err: std::io::Error) -> Self {
        let kind = if err.kind() == std::io::ErrorKind::NotFound {
            ErrorKind::MissingResource
        } else {
            ErrorKind::InvalidInput
        };
        Self::new(
            kind,
            "io-error",
            "File operation failed",
            format!("{}: {}", path.display(), err),
        )
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }

    /// Error type path, e.g. `/errors/missing-dbt-project`
    pub fn type_path(&self) -> String {
        format!("/errors/{}", self.name)
    }
}

/// Result alias used across dbtea crates
pub type Result<T> = std::result::Result<T, DbteaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_per_kind() {
        assert_eq!(ErrorKind::InvalidInput.exit_code(), 100);
        assert_eq!(ErrorKind::MissingResource.exit_code(), 101);
        assert_eq!(ErrorKind::ExternalCallFailed.exit_code(), 102);
    }

    #[test]
    fn display_combines_title_and_detail() {
        let err = DbteaError::missing_resource(
            "missing-dbt-project",
            "No dbt project found",
            "No dbt_project.yml file found",
        );
        assert_eq!(err.to_string(), "No dbt project found: No dbt_project.yml file found");
        assert_eq!(err.type_path(), "/errors/missing-dbt-project");
        assert_eq!(err.exit_code(), 101);
    }

    #[test]
    fn io_not_found_is_missing_resource() {
        let err = DbteaError::io(
            std::path::Path::new("nope.yml"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.kind, ErrorKind::MissingResource);
        assert!(err.detail.contains("nope.yml"));
    }
}
