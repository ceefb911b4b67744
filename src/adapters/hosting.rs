use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::HostingError;

#[derive(Debug, Clone, Deserialize)]
pub struct MergeRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub author: Author,
    #[serde(default)]
    pub source_branch: Option<String>,
    #[serde(default)]
    pub target_branch: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// One file entry of a merge request's changes, as returned by the host.
#[derive(Debug, Clone, Deserialize)]
pub struct FileChange {
    pub old_path: String,
    pub new_path: String,
    #[serde(default)]
    pub diff: String,
    #[serde(default)]
    pub new_file: bool,
    #[serde(default)]
    pub deleted_file: bool,
    #[serde(default)]
    pub renamed_file: bool,
}

/// A comment ("note") on a merge request.
#[derive(Debug, Clone, Deserialize)]
pub struct Note {
    pub id: u64,
}

/// Operations the pipeline consumes from the source-control host.
#[async_trait]
pub trait HostingClient: Send + Sync {
    async fn get_merge_request(&self, project: &str, iid: u64) -> Result<MergeRequest, HostingError>;

    /// Per-file changes in the order the host returns them.
    async fn list_merge_request_changes(
        &self,
        project: &str,
        iid: u64,
    ) -> Result<Vec<FileChange>, HostingError>;

    async fn create_merge_request_note(
        &self,
        project: &str,
        iid: u64,
        body: &str,
    ) -> Result<Note, HostingError>;
}
