use tracing::{info, warn};

use crate::adapters::hosting::{FileChange, HostingClient, MergeRequest};
use crate::errors::PipelineError;

/// Merge request metadata used in the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequestMeta {
    pub title: String,
    pub description: Option<String>,
    pub author: String,
    pub source_branch: Option<String>,
    pub target_branch: Option<String>,
    pub web_url: Option<String>,
}

impl From<MergeRequest> for MergeRequestMeta {
    fn from(mr: MergeRequest) -> Self {
        let author = match mr.author.name {
            Some(name) if !name.is_empty() => format!("{} (@{})", name, mr.author.username),
            _ => format!("@{}", mr.author.username),
        };
        Self {
            title: mr.title,
            description: mr.description.filter(|d| !d.trim().is_empty()),
            author,
            source_branch: mr.source_branch,
            target_branch: mr.target_branch,
            web_url: mr.web_url,
        }
    }
}

/// The merge request's changes as one text blob, capped at a character budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequestDiff {
    pub meta: MergeRequestMeta,
    pub text: String,
    pub file_count: usize,
    /// Character count before truncation.
    pub original_chars: usize,
    pub truncated: bool,
}

impl MergeRequestDiff {
    pub fn has_changes(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

pub struct DiffFetcher;

impl DiffFetcher {
    pub async fn fetch(
        hosting: &dyn HostingClient,
        project_id: &str,
        mr_iid: u64,
        max_chars: usize,
    ) -> Result<MergeRequestDiff, PipelineError> {
        let mr = hosting
            .get_merge_request(project_id, mr_iid)
            .await
            .map_err(PipelineError::Retrieval)?;
        let changes = hosting
            .list_merge_request_changes(project_id, mr_iid)
            .await
            .map_err(PipelineError::Retrieval)?;
        info!("Fetched {} changed files for !{}", changes.len(), mr_iid);

        let blob = render_changes(&changes);
        let original_chars = blob.chars().count();
        let (text, truncated) = truncate_chars(blob, max_chars);
        if truncated {
            warn!(
                "Diff truncated from {} to {} characters",
                original_chars, max_chars
            );
        }

        Ok(MergeRequestDiff {
            meta: MergeRequestMeta::from(mr),
            text,
            file_count: changes.len(),
            original_chars,
            truncated,
        })
    }
}

/// Labels each file fragment with its paths and joins them in host order.
pub fn render_changes(changes: &[FileChange]) -> String {
    changes
        .iter()
        .map(render_change)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Added and deleted files use `/dev/null` on the missing side, as in a
/// unified diff; renames get git-style `rename from`/`rename to` lines.
fn render_change(change: &FileChange) -> String {
    let old = if change.new_file {
        "/dev/null"
    } else {
        change.old_path.as_str()
    };
    let new = if change.deleted_file {
        "/dev/null"
    } else {
        change.new_path.as_str()
    };

    let mut out = String::new();
    if change.renamed_file {
        out.push_str(&format!(
            "rename from {}\nrename to {}\n",
            change.old_path, change.new_path
        ));
    }
    out.push_str(&format!("--- {}\n+++ {}\n{}", old, new, change.diff));
    out
}

/// Cuts `text` to at most `max_chars` characters. The cut lands on a char
/// boundary, not on a line or file boundary.
pub fn truncate_chars(mut text: String, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            text.truncate(byte_idx);
            (text, true)
        }
        None => (text, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fakes::{change, FakeHosting};
    use crate::errors::{HostingError, Stage};

    #[test]
    fn fragments_are_labelled_in_host_order() {
        let mut renamed = change("old.rs", "@@ -1 +1 @@\n-x\n+y\n");
        renamed.new_path = "new.rs".to_string();
        let blob = render_changes(&[change("a.rs", "@@ -1 +1 @@\n-a\n+b\n"), renamed]);
        assert_eq!(
            blob,
            "--- a.rs\n+++ a.rs\n@@ -1 +1 @@\n-a\n+b\n\n--- old.rs\n+++ new.rs\n@@ -1 +1 @@\n-x\n+y\n"
        );
    }

    #[test]
    fn added_deleted_and_renamed_files_are_marked() {
        let mut added = change("new.rs", "+fn a() {}\n");
        added.new_file = true;
        let mut removed = change("gone.rs", "-fn b() {}\n");
        removed.deleted_file = true;
        let mut moved = change("src/old.rs", "");
        moved.new_path = "src/new.rs".to_string();
        moved.renamed_file = true;

        let blob = render_changes(&[added, removed, moved]);
        assert_eq!(
            blob,
            "--- /dev/null\n+++ new.rs\n+fn a() {}\n\n\
             --- gone.rs\n+++ /dev/null\n-fn b() {}\n\n\
             rename from src/old.rs\nrename to src/new.rs\n--- src/old.rs\n+++ src/new.rs\n"
        );
    }

    #[test]
    fn short_text_is_untouched() {
        let (text, truncated) = truncate_chars("abc".to_string(), 3);
        assert_eq!(text, "abc");
        assert!(!truncated);
    }

    #[test]
    fn long_text_is_cut_to_exact_length() {
        let (text, truncated) = truncate_chars("abcdef".to_string(), 4);
        assert_eq!(text, "abcd");
        assert!(truncated);
    }

    #[test]
    fn truncation_respects_multibyte_characters() {
        let (text, truncated) = truncate_chars("héllo wörld".to_string(), 8);
        assert_eq!(text, "héllo wö");
        assert_eq!(text.chars().count(), 8);
        assert!(truncated);
    }

    #[tokio::test]
    async fn fetch_within_budget_keeps_blob() {
        let hosting = FakeHosting::with_changes(vec![change("a.rs", "+one\n")]);
        let diff = DiffFetcher::fetch(&hosting, "42", 7, 1000).await.unwrap();

        assert!(!diff.truncated);
        assert_eq!(diff.text, "--- a.rs\n+++ a.rs\n+one\n");
        assert_eq!(diff.original_chars, diff.text.chars().count());
        assert_eq!(diff.meta.title, "Add login");
        assert_eq!(diff.meta.author, "Dev One (@dev)");
        assert_eq!(diff.file_count, 1);
    }

    #[tokio::test]
    async fn fetch_over_budget_truncates() {
        let hosting = FakeHosting::with_changes(vec![
            change("a.rs", &"+".repeat(80)),
            change("b.rs", &"-".repeat(80)),
        ]);
        let diff = DiffFetcher::fetch(&hosting, "42", 7, 100).await.unwrap();

        assert!(diff.truncated);
        assert_eq!(diff.text.chars().count(), 100);
        assert!(diff.original_chars > 100);
    }

    #[tokio::test]
    async fn missing_merge_request_is_a_retrieval_error() {
        let hosting = FakeHosting::missing();
        let err = DiffFetcher::fetch(&hosting, "42", 7, 100).await.unwrap_err();

        assert_eq!(err.stage(), Stage::Retrieval);
        assert!(matches!(err, PipelineError::Retrieval(HostingError::NotFound)));
    }

    #[test]
    fn blank_description_becomes_none() {
        let mut mr = crate::adapters::fakes::merge_request("Fix");
        mr.description = Some("   ".to_string());
        mr.author.name = None;
        let meta = MergeRequestMeta::from(mr);
        assert_eq!(meta.description, None);
        assert_eq!(meta.author, "@dev");
    }
}
