//! GitLab REST v4 client for merge request metadata, changes and notes.
//!
//! Endpoints used:
//! - GET  /projects/:id/merge_requests/:iid
//! - GET  /projects/:id/merge_requests/:iid/diffs   (paginated)
//! - POST /projects/:id/merge_requests/:iid/notes

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::adapters::hosting::{FileChange, HostingClient, MergeRequest, Note};
use crate::config::{HostingCredential, Secret};
use crate::errors::HostingError;

const PER_PAGE: u32 = 100;
const NEXT_PAGE_HEADER: &str = "x-next-page";

pub struct GitLabClient {
    client: Client,
    base_api: String,
    token: Secret,
}

#[derive(Serialize)]
struct NewNote<'a> {
    body: &'a str,
}

impl GitLabClient {
    /// `base_api` is the REST root, e.g. `https://gitlab.com/api/v4`.
    pub fn new(base_api: impl Into<String>, credential: &HostingCredential) -> Result<Self> {
        let base_api: String = base_api.into();
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            base_api: base_api.trim_end_matches('/').to_string(),
            token: credential.token.clone(),
        })
    }

    fn merge_request_url(&self, project: &str, iid: u64) -> String {
        format!(
            "{}/projects/{}/merge_requests/{}",
            self.base_api,
            urlencoding::encode(project),
            iid
        )
    }
}

#[async_trait]
impl HostingClient for GitLabClient {
    async fn get_merge_request(&self, project: &str, iid: u64) -> Result<MergeRequest, HostingError> {
        let url = self.merge_request_url(project, iid);
        debug!("GET {}", url);

        let mr = self
            .client
            .get(&url)
            .header("PRIVATE-TOKEN", self.token.expose())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(mr)
    }

    async fn list_merge_request_changes(
        &self,
        project: &str,
        iid: u64,
    ) -> Result<Vec<FileChange>, HostingError> {
        let url = format!("{}/diffs", self.merge_request_url(project, iid));
        let mut changes = Vec::new();
        let mut page = 1u32;

        loop {
            debug!("GET {} page={}", url, page);
            let response = self
                .client
                .get(&url)
                .query(&[("page", page), ("per_page", PER_PAGE)])
                .header("PRIVATE-TOKEN", self.token.expose())
                .send()
                .await?
                .error_for_status()?;

            let next_page = response
                .headers()
                .get(NEXT_PAGE_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u32>().ok());

            let batch: Vec<FileChange> = response.json().await?;
            changes.extend(batch);

            match next_page {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }

        Ok(changes)
    }

    async fn create_merge_request_note(
        &self,
        project: &str,
        iid: u64,
        body: &str,
    ) -> Result<Note, HostingError> {
        let url = format!("{}/notes", self.merge_request_url(project, iid));
        debug!("POST {}", url);

        let note = self
            .client
            .post(&url)
            .header("PRIVATE-TOKEN", self.token.expose())
            .json(&NewNote { body })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(note)
    }
}
