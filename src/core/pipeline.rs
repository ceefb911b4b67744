//! Linear review run:
//! `Start -> ContextLoaded -> DiffFetched -> PromptBuilt -> ReviewObtained -> Published -> Done`.
//!
//! Any failing step moves straight to `Failed(stage)`; later steps never run,
//! so nothing is posted unless a review was produced.

use tracing::{debug, info};

use crate::adapters::hosting::HostingClient;
use crate::adapters::llm::LLMAdapter;
use crate::config::RunConfig;
use crate::core::context::{ContextLoader, ContextOutcome};
use crate::core::diff::DiffFetcher;
use crate::core::prompt::PromptBuilder;
use crate::core::publish::{PublishedComment, Publisher};
use crate::core::review::ReviewClient;
use crate::errors::{PipelineError, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    ContextLoaded,
    DiffFetched,
    PromptBuilt,
    ReviewObtained,
    Published,
    Done,
    Failed(Stage),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Published(PublishedComment),
    /// The merge request had no textual changes; nothing was reviewed.
    NoChanges,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub context_files: usize,
    pub diff_chars: usize,
    pub truncated: bool,
    pub outcome: RunOutcome,
}

pub struct Orchestrator<'a> {
    config: &'a RunConfig,
    hosting: &'a dyn HostingClient,
    model: &'a dyn LLMAdapter,
    state: PipelineState,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a RunConfig,
        hosting: &'a dyn HostingClient,
        model: &'a dyn LLMAdapter,
    ) -> Self {
        Self {
            config,
            hosting,
            model,
            state: PipelineState::Start,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub async fn run(&mut self) -> Result<RunReport, PipelineError> {
        match self.execute().await {
            Ok(report) => {
                self.transition(PipelineState::Done);
                Ok(report)
            }
            Err(err) => {
                self.transition(PipelineState::Failed(err.stage()));
                Err(err)
            }
        }
    }

    async fn execute(&mut self) -> Result<RunReport, PipelineError> {
        let config = self.config;

        let context = match ContextLoader::new(&config.project_dir).load() {
            ContextOutcome::Found { context, skipped } => {
                info!(
                    "Loaded project policy: {} files ({} chars, {} skipped)",
                    context.len(),
                    context.total_chars(),
                    skipped.len()
                );
                context
            }
            outcome @ ContextOutcome::NotFound { .. } => {
                info!("No .claude/ config found, reviewing without project rules");
                outcome.into_context()
            }
        };
        self.transition(PipelineState::ContextLoaded);

        let diff = DiffFetcher::fetch(
            self.hosting,
            &config.project_id,
            config.merge_request_iid,
            config.max_diff_chars,
        )
        .await?;
        self.transition(PipelineState::DiffFetched);

        let diff_chars = diff.text.chars().count();
        if !diff.has_changes() {
            info!("No changes to review on !{}", config.merge_request_iid);
            return Ok(RunReport {
                context_files: context.len(),
                diff_chars,
                truncated: diff.truncated,
                outcome: RunOutcome::NoChanges,
            });
        }

        let prompt = PromptBuilder::build(&context, &diff, config);
        self.transition(PipelineState::PromptBuilt);

        let review = ReviewClient::new(self.model).review(&prompt).await?;
        info!("Received {} chars of review from {}", review.text.chars().count(), review.model);
        self.transition(PipelineState::ReviewObtained);

        let comment = Publisher::publish(
            self.hosting,
            &config.project_id,
            config.merge_request_iid,
            &review.text,
        )
        .await?;
        self.transition(PipelineState::Published);

        Ok(RunReport {
            context_files: context.len(),
            diff_chars,
            truncated: diff.truncated,
            outcome: RunOutcome::Published(comment),
        })
    }

    fn transition(&mut self, next: PipelineState) {
        debug!("pipeline: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
