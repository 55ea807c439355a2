//! Concurrent reconstruction of several issues

use super::{Outcome, Reconstructor};
use crate::catalog::Issue;
use crate::error::Error;
use crate::types::IssueNumber;
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use tracing::{error, info};

/// An issue that could not be reconstructed
#[derive(Debug)]
pub struct IssueFailure {
    /// Issue number
    pub number: IssueNumber,
    /// Issue title
    pub title: String,
    /// Why it failed
    pub error: Error,
}

/// Result of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Newly written files
    pub written: Vec<PathBuf>,
    /// Files that already existed
    pub skipped: Vec<PathBuf>,
    /// Issues that failed
    pub failed: Vec<IssueFailure>,
}

impl BatchReport {
    /// Whether every issue was written or skipped
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Whether any issue stopped because the run was cancelled
    pub fn was_cancelled(&self) -> bool {
        self.failed
            .iter()
            .any(|f| matches!(f.error, Error::Cancelled))
    }

    fn record(&mut self, issue: &Issue, result: crate::Result<Outcome>) {
        match result {
            Ok(Outcome::Written { path, .. }) => self.written.push(path),
            Ok(Outcome::Skipped { path }) => self.skipped.push(path),
            Err(e) => {
                if !matches!(e, Error::Cancelled) {
                    error!(
                        issue = %issue.number,
                        title = %issue.title,
                        error = %e,
                        code = e.error_code(),
                        "issue failed"
                    );
                }
                self.failed.push(IssueFailure {
                    number: issue.number,
                    title: issue.title.clone(),
                    error: e,
                });
            }
        }
    }
}

impl Reconstructor {
    /// Reconstruct `issues`, at most `output.max_concurrent_issues` at a time
    ///
    /// A failing issue is logged and recorded; it never stops the others. The
    /// report lists issues in the order given, whatever order they finish in.
    pub async fn reconstruct_all(&self, issues: &[&Issue]) -> BatchReport {
        let results: Vec<(&Issue, crate::Result<Outcome>)> = stream::iter(issues.iter().copied())
            .map(|issue| async move { (issue, self.reconstruct_with_retry(issue).await) })
            .buffered(self.max_concurrent_issues)
            .collect()
            .await;

        let mut report = BatchReport::default();
        for (issue, result) in results {
            report.record(issue, result);
        }

        info!(
            written = report.written.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "batch finished"
        );
        report
    }
}
