//! Publish orchestration
//!
//! A publish run is an ordered list of phases, each an ordered list of
//! idempotent ensure-steps. Steps exchange resource identifiers through a
//! shared context and record their outcomes into a run report; one step
//! failing never aborts the run.

mod context;
mod orchestrator;
mod report;
mod step;

pub use context::PublishContext;
pub use orchestrator::{Orchestrator, Phase};
pub use report::{RunReport, StepStatus};
pub use step::PublishStep;
