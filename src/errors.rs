//! Error taxonomy for a review run.
//!
//! Every fatal failure is tagged with the [`Stage`] that produced it so the
//! CI log says which step broke. Missing policy files are not errors at all;
//! see `core::context`.

use std::fmt;

use thiserror::Error;

/// Pipeline step a fatal error is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configuration,
    Retrieval,
    Review,
    Publish,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Configuration => "configuration",
            Stage::Retrieval => "retrieval",
            Stage::Review => "review",
            Stage::Publish => "publish",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root error for one run. Any variant aborts the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("retrieval failed: {0}")]
    Retrieval(#[source] HostingError),

    #[error("review failed: {0}")]
    Review(#[source] anyhow::Error),

    #[error("publish failed: {0}")]
    Publish(#[source] HostingError),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Configuration(_) => Stage::Configuration,
            PipelineError::Retrieval(_) => Stage::Retrieval,
            PipelineError::Review(_) => Stage::Review,
            PipelineError::Publish(_) => Stage::Publish,
        }
    }
}

/// Problems with the run configuration, raised before any network call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("no hosting credential: set GITLAB_TOKEN or run inside a CI job that provides CI_JOB_TOKEN")]
    MissingHostingCredential,

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Failures reported by the hosting API (GitLab REST v4).
#[derive(Debug, Error)]
pub enum HostingError {
    /// HTTP 401.
    #[error("unauthorized")]
    Unauthorized,

    /// HTTP 403.
    #[error("forbidden")]
    Forbidden,

    /// HTTP 404: project or merge request does not exist.
    #[error("not found")]
    NotFound,

    /// HTTP 429.
    #[error("rate limited")]
    RateLimited,

    #[error("server error: status {0}")]
    Server(u16),

    #[error("http status error: {0}")]
    HttpStatus(u16),

    #[error("timeout")]
    Timeout,

    /// Transport failure without a status (DNS, connect, reset).
    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for HostingError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return HostingError::Timeout;
        }
        if let Some(status) = e.status() {
            return HostingError::from_status(status.as_u16());
        }
        if e.is_decode() {
            return HostingError::InvalidResponse(e.to_string());
        }
        HostingError::Network(e.to_string())
    }
}

impl HostingError {
    pub fn from_status(code: u16) -> Self {
        match code {
            401 => HostingError::Unauthorized,
            403 => HostingError::Forbidden,
            404 => HostingError::NotFound,
            429 => HostingError::RateLimited,
            500..=599 => HostingError::Server(code),
            _ => HostingError::HttpStatus(code),
        }
    }
}
