use tracing::info;

use crate::adapters::hosting::HostingClient;
use crate::errors::PipelineError;

/// Visible header that marks a comment as automated.
pub const REVIEW_HEADER: &str = "🤖 **Claude Code Review**";

/// Hidden marker so tooling can find bot comments without parsing the header.
pub const REVIEW_MARKER: &str = "<!-- mrscope:review -->";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedComment {
    pub note_id: u64,
    pub body: String,
}

pub struct Publisher;

impl Publisher {
    pub fn render(text: &str) -> String {
        format!("{}\n\n{}\n\n{}", REVIEW_HEADER, text.trim_end(), REVIEW_MARKER)
    }

    pub async fn publish(
        hosting: &dyn HostingClient,
        project_id: &str,
        mr_iid: u64,
        text: &str,
    ) -> Result<PublishedComment, PipelineError> {
        let body = Self::render(text);
        let note = hosting
            .create_merge_request_note(project_id, mr_iid, &body)
            .await
            .map_err(PipelineError::Publish)?;
        info!("Posted review as note {} on !{}", note.id, mr_iid);

        Ok(PublishedComment {
            note_id: note.id,
            body,
        })
    }
}
