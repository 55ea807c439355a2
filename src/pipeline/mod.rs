//! Issue reconstruction pipeline
//!
//! Turns a resolved [`Issue`] into one decrypted, merged document on disk:
//!
//! 1. **Fetch** - download the issue archive into memory ([`fetch`])
//! 2. **Extract** - read `page-<n>.pdf` members and require pages `0..count` ([`pages`])
//! 3. **Decrypt** - unlock every page with the shared passphrase ([`merge`])
//! 4. **Persist** - merge all units into `<name>.part`, then rename ([`persist`])
//!
//! Each issue is independent; [`Reconstructor::reconstruct_all`] runs several at
//! once and keeps going when one fails.

mod batch;
pub mod fetch;
pub mod merge;
pub mod pages;
pub mod persist;

pub use batch::{BatchReport, IssueFailure};

use crate::catalog::Issue;
use crate::config::{Config, RetryConfig};
use crate::document::DocumentEngine;
use crate::error::{Error, Result};
use crate::magazines::Magazine;
use crate::retry::with_retry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// What reconstructing one issue did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The output file already existed; nothing was downloaded
    Skipped {
        /// Existing output file
        path: PathBuf,
    },
    /// The issue was downloaded, decrypted and written
    Written {
        /// New output file
        path: PathBuf,
        /// Pages found in the archive
        pages: usize,
        /// Content units in the merged document
        units: usize,
    },
}

impl Outcome {
    /// Output file of the issue
    pub fn path(&self) -> &Path {
        match self {
            Outcome::Skipped { path } | Outcome::Written { path, .. } => path,
        }
    }
}

/// Rebuilds issues of one magazine into an output directory
pub struct Reconstructor {
    client: reqwest::Client,
    engine: Arc<dyn DocumentEngine>,
    magazine: String,
    output_dir: PathBuf,
    passphrase: String,
    max_concurrent_issues: usize,
    issue_retry: RetryConfig,
    cancel: CancellationToken,
}

impl std::fmt::Debug for Reconstructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconstructor")
            .field("engine", &self.engine.name())
            .field("magazine", &self.magazine)
            .field("output_dir", &self.output_dir)
            .field("max_concurrent_issues", &self.max_concurrent_issues)
            .finish_non_exhaustive()
    }
}

impl Reconstructor {
    /// Create a reconstructor from the output settings in `config`
    pub fn new(
        engine: Arc<dyn DocumentEngine>,
        magazine: &Magazine,
        config: &Config,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.api.request_timeout)
            .timeout(config.output.download_timeout)
            .build()?;

        Ok(Self {
            client,
            engine,
            magazine: magazine.name.to_string(),
            output_dir: config.output.dir.clone(),
            passphrase: config.output.passphrase.clone(),
            max_concurrent_issues: config.output.max_concurrent_issues.max(1),
            issue_retry: RetryConfig {
                max_attempts: config.output.issue_attempts.saturating_sub(1),
                ..RetryConfig::default()
            },
            cancel,
        })
    }

    /// Replace the HTTP client used for archive downloads
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Where `issue` is written
    pub fn output_path(&self, issue: &Issue) -> PathBuf {
        self.output_dir
            .join(persist::output_file_name(&self.magazine, issue))
    }

    /// Reconstruct one issue
    ///
    /// An issue whose output file already exists is skipped without any network
    /// traffic. Nothing is left at the output path unless every step succeeded.
    pub async fn reconstruct(&self, issue: &Issue) -> Result<Outcome> {
        let path = self.output_path(issue);
        if tokio::fs::try_exists(&path).await? {
            info!(issue = %issue.number, path = %path.display(), "issue already downloaded, skipping");
            return Ok(Outcome::Skipped { path });
        }

        info!(issue = %issue.number, title = %issue.title, "reconstructing issue");

        let archive = fetch::fetch_archive(&self.client, &issue.remote_url, &self.cancel).await?;
        let pages = pages::extract(archive).await?;
        debug!(issue = %issue.number, pages = pages.len(), "archive pages validated");

        let scratch = tempfile::Builder::new().prefix(".folio-dl-").tempdir()?;
        let units = merge::decrypt_pages(
            self.engine.as_ref(),
            &pages,
            &self.passphrase,
            scratch.path(),
            &self.cancel,
        )
        .await?;

        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        tokio::fs::create_dir_all(&self.output_dir).await?;
        persist::write_atomically(self.engine.as_ref(), &units, &path).await?;

        info!(
            issue = %issue.number,
            pages = pages.len(),
            units = units.len(),
            path = %path.display(),
            "issue written"
        );

        Ok(Outcome::Written {
            path,
            pages: pages.len(),
            units: units.len(),
        })
    }

    /// Reconstruct one issue, retrying the whole issue on transient failures
    ///
    /// Runs a single attempt unless `output.issue_attempts` asks for more.
    pub async fn reconstruct_with_retry(&self, issue: &Issue) -> Result<Outcome> {
        with_retry(&self.issue_retry, &self.cancel, || self.reconstruct(issue)).await
    }
}
