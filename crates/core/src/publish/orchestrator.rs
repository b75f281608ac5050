use tracing::{error, info, warn};

use super::context::PublishContext;
use super::report::{RunReport, StepStatus};
use super::step::PublishStep;

/// A named group of steps run in declared order.
pub struct Phase {
    name: String,
    steps: Vec<Box<dyn PublishStep>>,
}

impl Phase {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), steps: Vec::new() }
    }

    #[must_use]
    pub fn step(mut self, step: Box<dyn PublishStep>) -> Self {
        self.steps.push(step);
        self
    }
}

/// Drives a publish run: phases in declared order, steps in declared order,
/// one step's failure isolated from the rest of the run.
pub struct Orchestrator {
    phases: Vec<Phase>,
}

impl Orchestrator {
    #[must_use]
    pub fn new() -> Self {
        Self { phases: Vec::new() }
    }

    #[must_use]
    pub fn phase(mut self, phase: Phase) -> Self {
        self.phases.push(phase);
        self
    }

    /// Run every step and return the sealed report.
    ///
    /// A step with an unmet prerequisite records a fatal entry and is
    /// skipped before any network call. A step returning an error records a
    /// fatal entry; execution continues with the next step either way.
    pub async fn run(self, mut ctx: PublishContext) -> RunReport {
        for phase in &self.phases {
            info!(phase = %phase.name, steps = phase.steps.len(), "starting phase");
            for step in &phase.steps {
                Self::run_step(step.as_ref(), &mut ctx).await;
            }
        }
        ctx.into_report()
    }

    async fn run_step(step: &dyn PublishStep, ctx: &mut PublishContext) {
        if let Some(missing) =
            step.prerequisites().iter().find(|key| !ctx.has_id(key)).copied()
        {
            warn!(step = step.name(), missing, "prerequisite unmet, skipping step");
            ctx.report_mut()
                .record_fatal(format!("{}: missing prerequisite `{missing}`", step.name()));
            return;
        }

        match step.ensure(ctx).await {
            Ok(status) => {
                info!(step = step.name(), status = status.as_str(), "step finished");
                ctx.report_mut().record_step(step.name(), status);
            }
            Err(err) => {
                error!(step = step.name(), %err, "step failed");
                ctx.report_mut().record_fatal(format!("{}: {err}", step.name()));
            }
        }
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}
