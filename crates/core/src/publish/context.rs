use std::collections::HashMap;

use storeship_domain::{PublishError, Result};

use super::report::RunReport;

/// Shared state threaded through a publish run.
///
/// Carries the resource identifiers produced by earlier steps (app id,
/// version id, edit id, ...) and the run report that every step records
/// into. Keys are plain strings owned by the flow that defines the steps.
pub struct PublishContext {
    ids: HashMap<String, String>,
    report: RunReport,
}

impl PublishContext {
    #[must_use]
    pub fn new() -> Self {
        Self { ids: HashMap::new(), report: RunReport::start() }
    }

    /// Record an identifier produced by a step.
    pub fn record_id(&mut self, key: impl Into<String>, id: impl Into<String>) {
        self.ids.insert(key.into(), id.into());
    }

    #[must_use]
    pub fn id(&self, key: &str) -> Option<&str> {
        self.ids.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn has_id(&self, key: &str) -> bool {
        self.ids.contains_key(key)
    }

    /// Fetch an identifier a step depends on.
    ///
    /// # Errors
    /// `PublishError::MissingPrerequisite` naming the absent key.
    pub fn require(&self, key: &str) -> Result<&str> {
        self.id(key).ok_or_else(|| PublishError::MissingPrerequisite(key.to_string()))
    }

    /// Record a non-fatal problem discovered inside a step that still
    /// completed (a skipped locale, an unmatched price point).
    pub fn note_warning(&mut self, entry: impl Into<String>) {
        self.report.record_warning(entry);
    }

    /// Record a fatal problem inside a step that deliberately continues
    /// with its remaining work (one locale of many failing).
    pub fn note_fatal(&mut self, entry: impl Into<String>) {
        self.report.record_fatal(entry);
    }

    pub(super) fn report_mut(&mut self) -> &mut RunReport {
        &mut self.report
    }

    /// Seal and hand back the accumulated report.
    #[must_use]
    pub fn into_report(self) -> RunReport {
        self.report.seal()
    }
}

impl Default for PublishContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_names_the_missing_key() {
        let ctx = PublishContext::new();

        let err = ctx.require("app_id").unwrap_err();
        assert!(matches!(err, PublishError::MissingPrerequisite(key) if key == "app_id"));
    }

    #[test]
    fn recorded_ids_are_retrievable() {
        let mut ctx = PublishContext::new();
        ctx.record_id("app_id", "6448311069");

        assert_eq!(ctx.require("app_id").unwrap(), "6448311069");
        assert!(ctx.has_id("app_id"));
        assert!(!ctx.has_id("version_id"));
    }
}
