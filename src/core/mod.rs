pub mod context;
pub mod diff;
pub mod pipeline;
pub mod prompt;
pub mod publish;
pub mod review;

pub use pipeline::{Orchestrator, RunOutcome};
