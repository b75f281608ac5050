use async_trait::async_trait;
use storeship_domain::Result;

use super::context::PublishContext;
use super::report::StepStatus;

/// One idempotent unit of publish work.
///
/// `ensure` converges remote state toward the configured state: it finds the
/// resource and creates or updates it only when needed, so re-running a step
/// against already-published state is a no-op reported as `Skipped` or
/// `Completed`.
#[async_trait]
pub trait PublishStep: Send + Sync {
    /// Stable step name used in report entries and logs.
    fn name(&self) -> &str;

    /// Context keys that must be populated before this step may run.
    ///
    /// The orchestrator checks these before calling `ensure`; a missing key
    /// records a fatal entry and the step is skipped without any network
    /// traffic.
    fn prerequisites(&self) -> &[&str] {
        &[]
    }

    /// Converge the remote resource and report how the step concluded.
    ///
    /// # Errors
    /// A terminal API or credential failure. The orchestrator catches it at
    /// the step boundary and continues with the remaining steps.
    async fn ensure(&self, ctx: &mut PublishContext) -> Result<StepStatus>;
}
