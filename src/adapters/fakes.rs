//! In-memory collaborators for pipeline tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::adapters::hosting::{Author, FileChange, HostingClient, MergeRequest, Note};
use crate::adapters::llm::{LLMAdapter, LLMRequest, LLMResponse};
use crate::errors::HostingError;

pub(crate) fn merge_request(title: &str) -> MergeRequest {
    MergeRequest {
        title: title.to_string(),
        description: Some("Adds a login form".to_string()),
        author: Author {
            username: "dev".to_string(),
            name: Some("Dev One".to_string()),
        },
        source_branch: Some("feature/login".to_string()),
        target_branch: Some("main".to_string()),
        web_url: None,
    }
}

pub(crate) fn change(path: &str, diff: &str) -> FileChange {
    FileChange {
        old_path: path.to_string(),
        new_path: path.to_string(),
        diff: diff.to_string(),
        new_file: false,
        deleted_file: false,
        renamed_file: false,
    }
}

#[derive(Default)]
pub(crate) struct FakeHosting {
    /// `None` makes every fetch answer 404.
    pub merge_request: Option<MergeRequest>,
    pub changes: Vec<FileChange>,
    pub reject_notes: bool,
    pub metadata_calls: AtomicUsize,
    pub change_calls: AtomicUsize,
    pub notes: Mutex<Vec<String>>,
}

impl FakeHosting {
    pub(crate) fn with_changes(changes: Vec<FileChange>) -> Self {
        Self {
            merge_request: Some(merge_request("Add login")),
            changes,
            ..Self::default()
        }
    }

    pub(crate) fn missing() -> Self {
        Self::default()
    }

    pub(crate) fn posted(&self) -> Vec<String> {
        self.notes.lock().unwrap().clone()
    }
}

#[async_trait]
impl HostingClient for FakeHosting {
    async fn get_merge_request(&self, _project: &str, _iid: u64) -> Result<MergeRequest, HostingError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.merge_request.clone().ok_or(HostingError::NotFound)
    }

    async fn list_merge_request_changes(
        &self,
        _project: &str,
        _iid: u64,
    ) -> Result<Vec<FileChange>, HostingError> {
        self.change_calls.fetch_add(1, Ordering::SeqCst);
        if self.merge_request.is_none() {
            return Err(HostingError::NotFound);
        }
        Ok(self.changes.clone())
    }

    async fn create_merge_request_note(
        &self,
        _project: &str,
        _iid: u64,
        body: &str,
    ) -> Result<Note, HostingError> {
        if self.reject_notes {
            return Err(HostingError::Forbidden);
        }
        let mut notes = self.notes.lock().unwrap();
        notes.push(body.to_string());
        Ok(Note {
            id: notes.len() as u64,
        })
    }
}

pub(crate) struct FakeModel {
    /// `None` makes every completion fail.
    pub reply: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeModel {
    pub(crate) fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub(crate) fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LLMAdapter for FakeModel {
    async fn complete(&self, request: LLMRequest) -> Result<LLMResponse> {
        self.prompts.lock().unwrap().push(request.user_prompt);
        match &self.reply {
            Some(reply) => Ok(LLMResponse {
                content: reply.clone(),
                model: "fake-model".to_string(),
                usage: None,
            }),
            None => anyhow::bail!("Anthropic API error (401 Unauthorized): invalid x-api-key"),
        }
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}
