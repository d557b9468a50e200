// ── Batch results ──

use indexmap::IndexMap;
use serde::Serialize;

use crate::actions::ActionType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "UPPERCASE")]
pub enum BatchStatus {
    Success,
    Failure(String),
}

impl BatchStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Per-key outcome of one batch action, in selection order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub action: ActionType,
    pub results: IndexMap<String, BatchStatus>,
}

impl BatchReport {
    pub fn new(action: ActionType) -> Self {
        Self {
            action,
            results: IndexMap::new(),
        }
    }

    pub fn record(&mut self, key: impl Into<String>, status: BatchStatus) {
        self.results.insert(key.into(), status);
    }

    pub fn succeeded(&self) -> usize {
        self.results.values().filter(|s| s.is_success()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &str)> {
        self.results.iter().filter_map(|(key, status)| match status {
            BatchStatus::Failure(message) => Some((key.as_str(), message.as_str())),
            BatchStatus::Success => None,
        })
    }

    pub fn all_succeeded(&self) -> bool {
        self.results.values().all(BatchStatus::is_success)
    }

    /// One-line summary for notifications.
    pub fn summary(&self) -> String {
        let failed = self.results.len() - self.succeeded();
        if failed == 0 {
            format!("{}: {} succeeded", self.action.label(), self.results.len())
        } else {
            format!(
                "{}: {} succeeded, {failed} failed",
                self.action.label(),
                self.succeeded()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_failures() {
        let mut report = BatchReport::new(ActionType::Suspend);
        report.record("a", BatchStatus::Success);
        report.record("b", BatchStatus::Failure("412".into()));
        report.record("c", BatchStatus::Success);
        assert_eq!(report.summary(), "Suspend: 2 succeeded, 1 failed");
        assert_eq!(report.failed().collect::<Vec<_>>(), vec![("b", "412")]);
        assert!(!report.all_succeeded());
        let keys: Vec<_> = report.results.keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }
}
