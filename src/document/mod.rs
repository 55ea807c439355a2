//! Page decryption and document assembly
//!
//! Pages arrive as individually encrypted PDF files. This module defines the
//! capability the pipeline needs from a PDF toolkit: detect encryption, decrypt
//! with the shared passphrase, count the content units (PDF pages) inside a file,
//! and assemble an ordered list of units from several files into one document.
//!
//! ## Architecture
//!
//! The core abstraction is the [`DocumentEngine`] trait. [`QpdfEngine`] implements
//! it by driving the external `qpdf` binary; tests plug in lightweight fakes.
//!
//! ```no_run
//! use folio_dl::document::{DocumentEngine, QpdfEngine, UnitRef};
//! use std::path::{Path, PathBuf};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = QpdfEngine::from_path().expect("qpdf binary not found");
//!
//!     let page = Path::new("page-0.pdf");
//!     if engine.is_encrypted(page).await? {
//!         engine.decrypt(page, "secret", Path::new("plain-0.pdf")).await?;
//!     }
//!     let units = engine.unit_count(Path::new("plain-0.pdf")).await?;
//!     let refs: Vec<UnitRef> = (0..units)
//!         .map(|index| UnitRef::new(PathBuf::from("plain-0.pdf"), index))
//!         .collect();
//!     engine.merge(&refs, Path::new("issue.pdf")).await?;
//!     Ok(())
//! }
//! ```

mod qpdf;

pub use qpdf::QpdfEngine;

use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// One content unit (a PDF page) inside a source file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitRef {
    /// File holding the unit
    pub source: PathBuf,
    /// Zero-based position of the unit within `source`
    pub index: u32,
}

impl UnitRef {
    /// Reference unit `index` of `source`
    pub fn new(source: PathBuf, index: u32) -> Self {
        Self { source, index }
    }
}

/// PDF toolkit operations used to rebuild an issue from its pages
///
/// Implementations must be safe to share between concurrently reconstructed
/// issues; every operation works on caller-owned paths only.
#[async_trait]
pub trait DocumentEngine: Send + Sync {
    /// Whether `page` is encrypted
    async fn is_encrypted(&self, page: &Path) -> Result<bool>;

    /// Decrypt `page` with `passphrase`, writing the plain document to `dest`
    ///
    /// # Returns
    ///
    /// `Ok(false)` if the passphrase was rejected. Other failures (unreadable
    /// input, tool crash) are errors.
    async fn decrypt(&self, page: &Path, passphrase: &str, dest: &Path) -> Result<bool>;

    /// Number of content units in an unencrypted document
    async fn unit_count(&self, document: &Path) -> Result<u32>;

    /// Write a new document to `dest` containing `units` in the given order
    async fn merge(&self, units: &[UnitRef], dest: &Path) -> Result<()>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
