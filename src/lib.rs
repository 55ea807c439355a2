//! # folio-dl
//!
//! Downloader for digital magazine issues sold through the Folio storefront API.
//!
//! ## Design Philosophy
//!
//! folio-dl is designed to be:
//! - **Library-first** - The `folio-dl` binary is a thin driver over this crate
//! - **Cancellable** - Every network call, poll and retry delay observes one token
//! - **Atomic** - An issue is either fully written or absent, never half-written
//! - **Sensible defaults** - Works out of the box with zero configuration
//!
//! ## Quick Start
//!
//! ```no_run
//! use folio_dl::{
//!     AccountSession, Config, Credentials, FolioApi, HttpTransport, IssueFilter, QpdfEngine,
//!     Reconstructor, magazines,
//! };
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let cancel = CancellationToken::new();
//!     let magazine = *magazines::lookup(&config.magazine)?;
//!
//!     let transport = Arc::new(HttpTransport::new(&config.api)?);
//!     let api = FolioApi::new(transport, cancel.clone());
//!     let session = AccountSession::establish(api, magazine, &config).await?;
//!     session
//!         .login(&Credentials::resolve(None, None)?, &config.login)
//!         .await?;
//!
//!     let issues = session.issues().await?;
//!     let engine = Arc::new(QpdfEngine::from_config(&config.output)?);
//!     let reconstructor = Reconstructor::new(engine, &magazine, &config, cancel)?;
//!     let report = reconstructor
//!         .reconstruct_all(&IssueFilter::From(300).select(&issues)?)
//!         .await;
//!     println!("{} written", report.written.len());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Typed vendor endpoints
pub mod api;
/// Purchased products, issues and issue selection
pub mod catalog;
/// Configuration types
pub mod config;
/// Page decryption and document assembly
pub mod document;
/// Error types
pub mod error;
/// Registry of supported publications
pub mod magazines;
/// Issue reconstruction pipeline
pub mod pipeline;
/// Retry logic with exponential backoff
pub mod retry;
/// Account session establishment and login
pub mod session;
/// HTTP transport and response envelope handling
pub mod transport;
/// Core identifier types
pub mod types;

#[cfg(test)]
mod test_support;
/// Text document engine for tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export commonly used types
pub use api::FolioApi;
pub use catalog::{Entitlement, Issue, IssueFilter};
pub use config::{Config, Credentials};
pub use document::{DocumentEngine, QpdfEngine, UnitRef};
pub use error::{ArchiveError, Error, Result};
pub use magazines::Magazine;
pub use pipeline::{BatchReport, IssueFailure, Outcome, Reconstructor};
pub use session::AccountSession;
pub use transport::{ApiTransport, HttpTransport};
pub use types::{AccountId, IssueNumber, ProductId};

use tokio_util::sync::CancellationToken;

/// Cancel `cancel` when the process receives a termination signal
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// Returns early without cancelling if `cancel` fires for another reason.
///
/// # Example
///
/// ```no_run
/// use folio_dl::cancel_on_shutdown;
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() {
///     let cancel = CancellationToken::new();
///     tokio::spawn(cancel_on_shutdown(cancel.clone()));
///     // every API call made with `cancel` now stops on Ctrl+C
/// }
/// ```
pub async fn cancel_on_shutdown(cancel: CancellationToken) {
    tokio::select! {
        _ = cancel.cancelled() => {}
        _ = wait_for_signal() => {
            tracing::info!("cancelling in-flight work");
            cancel.cancel();
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("received SIGTERM signal");
            } else {
                tracing::error!("could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to listen for Ctrl+C signal");
        }
    }
}
