use std::fmt;
use std::path::PathBuf;

use crate::errors::ConfigError;

pub const SERVER_URL_VAR: &str = "CI_SERVER_URL";
pub const PROJECT_ID_VAR: &str = "CI_PROJECT_ID";
pub const MR_IID_VAR: &str = "CI_MERGE_REQUEST_IID";
pub const SOURCE_BRANCH_VAR: &str = "CI_MERGE_REQUEST_SOURCE_BRANCH_NAME";
pub const PRIMARY_TOKEN_VAR: &str = "GITLAB_TOKEN";
pub const FALLBACK_TOKEN_VAR: &str = "CI_JOB_TOKEN";
pub const MODEL_API_KEY_VAR: &str = "ANTHROPIC_API_KEY";
pub const MODEL_VAR: &str = "CLAUDE_MODEL";
pub const MAX_DIFF_CHARS_VAR: &str = "MAX_DIFF_CHARS";
pub const MAX_TOKENS_VAR: &str = "CLAUDE_MAX_TOKENS";
pub const MODEL_BASE_URL_VAR: &str = "ANTHROPIC_BASE_URL";
pub const PROJECT_DIR_VAR: &str = "CI_PROJECT_DIR";
/// How an absent hosting credential is named in a missing-variables report.
pub const HOSTING_CREDENTIAL_VARS: &str = "GITLAB_TOKEN or CI_JOB_TOKEN";

/// A credential value whose `Debug` output never shows the value itself.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Where the hosting credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Dedicated token (`GITLAB_TOKEN`).
    Primary,
    /// Pipeline-issued job token (`CI_JOB_TOKEN`).
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostingCredential {
    pub token: Secret,
    pub source: CredentialSource,
}

/// Picks the primary credential when present, otherwise the fallback.
///
/// Both sources are used identically afterwards; only `source` records the
/// difference.
pub fn resolve_hosting_credential(
    primary: Option<String>,
    fallback: Option<String>,
) -> Option<HostingCredential> {
    if let Some(token) = primary.filter(|t| !t.trim().is_empty()) {
        return Some(HostingCredential {
            token: Secret::new(token),
            source: CredentialSource::Primary,
        });
    }
    fallback
        .filter(|t| !t.trim().is_empty())
        .map(|token| HostingCredential {
            token: Secret::new(token),
            source: CredentialSource::Fallback,
        })
}

/// Immutable snapshot of everything one run needs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub server_url: String,
    pub project_id: String,
    pub merge_request_iid: u64,
    pub source_branch: String,
    pub hosting_credential: HostingCredential,
    pub model_api_key: Secret,
    pub model: String,
    pub max_diff_chars: usize,
    pub max_tokens: usize,
    pub model_base_url: Option<String>,
    pub project_dir: PathBuf,
}

impl RunConfig {
    /// Reads the process environment. This is the only place the crate does so.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut missing = Vec::new();
        let mut required = |key: &'static str| {
            let value = get(key);
            if value.is_none() {
                missing.push(key);
            }
            value.unwrap_or_default()
        };

        let server_url = required(SERVER_URL_VAR);
        let project_id = required(PROJECT_ID_VAR);
        let raw_iid = required(MR_IID_VAR);
        let source_branch = required(SOURCE_BRANCH_VAR);
        let model_api_key = required(MODEL_API_KEY_VAR);

        let hosting_credential =
            resolve_hosting_credential(get(PRIMARY_TOKEN_VAR), get(FALLBACK_TOKEN_VAR));

        if !missing.is_empty() {
            if hosting_credential.is_none() {
                missing.push(HOSTING_CREDENTIAL_VARS);
            }
            return Err(ConfigError::Missing(missing));
        }
        let hosting_credential = hosting_credential.ok_or(ConfigError::MissingHostingCredential)?;

        let merge_request_iid = parse_positive(MR_IID_VAR, &raw_iid)?;
        let max_diff_chars = match get(MAX_DIFF_CHARS_VAR) {
            Some(raw) => parse_positive(MAX_DIFF_CHARS_VAR, &raw)?,
            None => default_max_diff_chars(),
        };
        let max_tokens = match get(MAX_TOKENS_VAR) {
            Some(raw) => parse_positive(MAX_TOKENS_VAR, &raw)?,
            None => default_max_tokens(),
        };

        Ok(Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            project_id,
            merge_request_iid,
            source_branch,
            hosting_credential,
            model_api_key: Secret::new(model_api_key),
            model: get(MODEL_VAR).unwrap_or_else(default_model),
            max_diff_chars,
            max_tokens,
            model_base_url: get(MODEL_BASE_URL_VAR),
            project_dir: get(PROJECT_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
        })
    }

    /// REST root of the hosting API.
    pub fn api_base(&self) -> String {
        format!("{}/api/v4", self.server_url)
    }
}

fn parse_positive<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + Default + PartialEq,
{
    match raw.parse::<T>() {
        Ok(value) if value != T::default() => Ok(value),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
        }),
    }
}

fn default_model() -> String {
    "claude-sonnet-4-5-20250929".to_string()
}

fn default_max_diff_chars() -> usize {
    100_000
}

fn default_max_tokens() -> usize {
    4096
}
