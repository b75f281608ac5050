use std::time::{Duration, Instant};

/// How a single executed step concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Remote state was created or updated to match the configuration.
    Completed,
    /// The step finished but something was off (stale version state,
    /// unmatched price point). The run is still publishable.
    Warning,
    /// Remote state already matched; nothing was sent.
    Skipped,
    /// The capability exists in configuration but has no working remote
    /// endpoint yet. Recorded explicitly, never silently dropped.
    NotYetSupported,
    /// The step raised a terminal error, recorded by the orchestrator.
    Failed,
}

impl StepStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Warning => "warning",
            Self::Skipped => "skipped",
            Self::NotYetSupported => "not yet supported",
            Self::Failed => "failed",
        }
    }
}

/// Accumulated outcome of one publish run.
///
/// Entries keep their insertion order so the summary reads in execution
/// order. Sealing fixes the elapsed duration; a sealed report is immutable.
#[derive(Debug)]
pub struct RunReport {
    successes: Vec<String>,
    warnings: Vec<String>,
    fatals: Vec<String>,
    started_at: Instant,
    elapsed: Option<Duration>,
}

impl RunReport {
    #[must_use]
    pub fn start() -> Self {
        Self {
            successes: Vec::new(),
            warnings: Vec::new(),
            fatals: Vec::new(),
            started_at: Instant::now(),
            elapsed: None,
        }
    }

    /// Record a step outcome under the right severity.
    ///
    /// `Completed` and `Skipped` are successes: a re-run over
    /// already-published state must produce a success-only report.
    pub fn record_step(&mut self, step: &str, status: StepStatus) {
        let entry = format!("{step}: {}", status.as_str());
        match status {
            StepStatus::Completed | StepStatus::Skipped => self.successes.push(entry),
            StepStatus::Warning | StepStatus::NotYetSupported => self.warnings.push(entry),
            StepStatus::Failed => self.fatals.push(entry),
        }
    }

    pub fn record_warning(&mut self, entry: impl Into<String>) {
        self.warnings.push(entry.into());
    }

    pub fn record_fatal(&mut self, entry: impl Into<String>) {
        self.fatals.push(entry.into());
    }

    /// Fix the elapsed duration. Further recording is a logic error; the
    /// orchestrator seals exactly once, after the last step.
    #[must_use]
    pub fn seal(mut self) -> Self {
        if self.elapsed.is_none() {
            self.elapsed = Some(self.started_at.elapsed());
        }
        self
    }

    #[must_use]
    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    #[must_use]
    pub fn fatals(&self) -> &[String] {
        &self.fatals
    }

    /// Elapsed wall-clock time; zero until sealed.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed.unwrap_or(Duration::ZERO)
    }

    /// A run is clean when nothing fatal was recorded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.fatals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skipped_counts_as_success() {
        let mut report = RunReport::start();
        report.record_step("identify", StepStatus::Completed);
        report.record_step("categorize", StepStatus::Skipped);
        report.record_step("monetize", StepStatus::NotYetSupported);

        assert_eq!(report.successes().len(), 2);
        assert_eq!(report.warnings().len(), 1);
        assert!(report.is_clean());
    }

    #[test]
    fn entries_keep_execution_order() {
        let mut report = RunReport::start();
        report.record_step("identify", StepStatus::Completed);
        report.record_step("localize", StepStatus::Completed);

        assert_eq!(report.successes()[0], "identify: completed");
        assert_eq!(report.successes()[1], "localize: completed");
    }

    #[test]
    fn sealing_fixes_elapsed() {
        let report = RunReport::start().seal();
        let elapsed = report.elapsed();

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(report.elapsed(), elapsed);
    }
}
