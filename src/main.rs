mod adapters;
mod config;
mod core;
mod errors;

use anyhow::{Context, Result};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use crate::adapters::llm::ModelConfig;
use crate::adapters::{AnthropicAdapter, GitLabClient};
use crate::config::{CredentialSource, RunConfig};
use crate::core::{Orchestrator, RunOutcome};
use crate::errors::PipelineError;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match RunConfig::from_env() {
        Ok(config) => config,
        Err(err) => return Err(fail(PipelineError::from(err))),
    };

    info!(
        "Reviewing !{} in project {} (branch {}) with model {}",
        config.merge_request_iid, config.project_id, config.source_branch, config.model
    );
    if config.hosting_credential.source == CredentialSource::Fallback {
        info!("GITLAB_TOKEN not set, using CI_JOB_TOKEN");
    }

    let hosting = GitLabClient::new(config.api_base(), &config.hosting_credential)
        .context("Failed to build GitLab client")?;
    let model = AnthropicAdapter::new(ModelConfig::from_run_config(&config))
        .context("Failed to build Anthropic client")?;

    let mut orchestrator = Orchestrator::new(&config, &hosting, &model);
    let result = orchestrator.run().await;
    debug!("Pipeline finished in state {:?}", orchestrator.state());
    let report = match result {
        Ok(report) => report,
        Err(err) => return Err(fail(err)),
    };

    match report.outcome {
        RunOutcome::Published(comment) => {
            info!(
                "Review posted successfully (note {}, {} policy files, diff truncated: {})",
                comment.note_id, report.context_files, report.truncated
            );
        }
        RunOutcome::NoChanges => info!("Nothing to review"),
    }

    Ok(())
}

fn fail(err: PipelineError) -> anyhow::Error {
    error!("Review run failed at {} stage: {}", err.stage(), err);
    anyhow::Error::new(err)
}
