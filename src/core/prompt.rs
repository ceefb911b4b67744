use crate::config::RunConfig;
use crate::core::context::ReviewContext;
use crate::core::diff::MergeRequestDiff;

const PREAMBLE: &str = "You are a senior code reviewer. You review merge requests for correctness, \
security, performance and maintainability, and you only raise issues that are actionable.";

const POLICY_INTRO: &str = "The following files are the project's CLAUDE.md and .claude/ configuration.\n\
They contain rules, conventions and instructions you MUST follow when reviewing.";

const TASK_WITH_POLICY: &str =
    "Review this merge request diff. Follow ALL rules and conventions defined in <project_rules>.";
const TASK_WITHOUT_POLICY: &str = "Review this merge request diff.";

const OUTPUT_EXPECTATIONS: &str = "Be concise. Reference specific files and line numbers.\n\
If the code looks good, say so briefly.\n\
Write the review as Markdown; it is posted verbatim as a merge request comment.";

pub const TRUNCATION_TAG: &str = "<truncation_notice>";

/// The single document sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPrompt {
    pub text: String,
}

pub struct PromptBuilder;

impl PromptBuilder {
    /// Pure text assembly; identical inputs give byte-identical output.
    pub fn build(context: &ReviewContext, diff: &MergeRequestDiff, config: &RunConfig) -> ReviewPrompt {
        let mut out = String::new();
        out.push_str(PREAMBLE);
        out.push_str("\n\n");

        if !context.is_empty() {
            out.push_str(&format_policy(context));
            out.push_str("\n\n");
        }

        out.push_str("<task>\n");
        out.push_str(if context.is_empty() {
            TASK_WITHOUT_POLICY
        } else {
            TASK_WITH_POLICY
        });
        out.push('\n');
        out.push_str(OUTPUT_EXPECTATIONS);
        out.push_str("\n</task>\n\n");

        out.push_str(&format_metadata(diff, config));
        out.push_str("\n\n");

        out.push_str("<diff>\n");
        out.push_str(&diff.text);
        if !diff.text.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("</diff>\n");

        if diff.truncated {
            out.push('\n');
            out.push_str(TRUNCATION_TAG);
            out.push('\n');
            out.push_str(&format!(
                "The diff above was cut to the first {} of {} characters, possibly in the middle \
                 of a line or file. Changes past the cut are not shown. Do not report the missing \
                 part as an error and do not assume it is absent from the merge request.\n",
                diff.text.chars().count(),
                diff.original_chars
            ));
            out.push_str("</truncation_notice>\n");
        }

        ReviewPrompt { text: out }
    }
}

fn format_policy(context: &ReviewContext) -> String {
    let mut out = String::from("<project_rules>\n");
    out.push_str(POLICY_INTRO);
    out.push('\n');
    for file in context.files() {
        out.push_str(&format!("\n--- {} ---\n", file.path));
        out.push_str(&file.content);
        if !file.content.ends_with('\n') {
            out.push('\n');
        }
    }
    out.push_str("</project_rules>");
    out
}

fn format_metadata(diff: &MergeRequestDiff, config: &RunConfig) -> String {
    let meta = &diff.meta;
    let source = meta
        .source_branch
        .as_deref()
        .unwrap_or(config.source_branch.as_str());
    let target = meta.target_branch.as_deref().unwrap_or("N/A");

    let mut lines = vec![
        format!(
            "Reference: !{} in project {}",
            config.merge_request_iid, config.project_id
        ),
        format!("Title: {}", meta.title),
        format!("Description: {}", meta.description.as_deref().unwrap_or("N/A")),
        format!("Author: {}", meta.author),
        format!("Branches: {} -> {}", source, target),
        format!("Files changed: {}", diff.file_count),
    ];
    if let Some(url) = &meta.web_url {
        lines.push(format!("URL: {}", url));
    }

    format!("<merge_request>\n{}\n</merge_request>", lines.join("\n"))
}
