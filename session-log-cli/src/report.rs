//! Batch run report
//!
//! Every recovered failure (a file that could not be converted, a group file
//! with too few columns, a base name that could not be paired) is recorded
//! once as a skip with its reason, logged as it happens and summarised at
//! the end of the run.

use std::fmt;

/// One thing that was skipped, and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skip {
    /// File name or base name
    pub subject: String,
    pub reason: String,
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.reason)
    }
}

/// Outcome of a whole batch run
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Records decoded and written
    pub processed: Vec<String>,
    /// Base names bridged
    pub bridged: Vec<String>,
    /// Recovered warnings that did not skip anything (e.g. channel-cap truncation)
    pub warnings: Vec<String>,
    pub skipped: Vec<Skip>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a skip and log it
    pub fn skip(&mut self, subject: impl Into<String>, reason: impl Into<String>) {
        let skip = Skip {
            subject: subject.into(),
            reason: reason.into(),
        };
        log::warn!("Skipping {}", skip);
        self.skipped.push(skip);
    }

    /// Record a warning about a subject that was still processed
    pub fn warn(&mut self, subject: &str, warning: &str) {
        let warning = format!("{}: {}", subject, warning);
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Skips recorded for one subject
    #[cfg(test)]
    pub fn skips_for(&self, subject: &str) -> Vec<&Skip> {
        self.skipped.iter().filter(|s| s.subject == subject).collect()
    }

    /// Log the end-of-run summary
    pub fn log_summary(&self) {
        log::info!(
            "Processed {} record(s), bridged {} session(s), {} warning(s), {} skipped",
            self.processed.len(),
            self.bridged.len(),
            self.warnings.len(),
            self.skipped.len()
        );
        for skip in &self.skipped {
            log::info!("  skipped {}", skip);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_are_recorded_per_subject() {
        let mut report = BatchReport::new();
        report.skip("rat1", "expected exactly 2 matching files, found 3");
        report.skip("rat2.xlsx", "unsupported");

        assert_eq!(report.skips_for("rat1").len(), 1);
        assert_eq!(
            report.skips_for("rat1")[0].to_string(),
            "rat1: expected exactly 2 matching files, found 3"
        );
        assert!(report.skips_for("rat3").is_empty());
    }
}
