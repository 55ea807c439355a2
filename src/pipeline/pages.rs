//! Page extraction, numbering and completeness validation

use crate::error::{ArchiveError, Error, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::sync::LazyLock;
use tokio::task::spawn_blocking;
use tracing::{debug, warn};

const PAGE_EXTENSION: &str = ".pdf";

// Literal pattern, compilation cannot fail
#[allow(clippy::expect_used)]
static PAGE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^page-([+-]?\d+)\.pdf$").expect("page name pattern is valid")
});

/// One page of an issue archive
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    /// Zero-based page index parsed from the member name
    pub index: u32,
    /// Encrypted page document
    pub data: Vec<u8>,
}

/// Extract and order pages without blocking the async runtime
pub async fn extract(archive: Vec<u8>) -> Result<Vec<Page>> {
    spawn_blocking(move || extract_pages(&archive))
        .await
        .map_err(|e| {
            Error::Archive(ArchiveError::Corrupt {
                reason: format!("page extraction task panicked: {}", e),
            })
        })?
}

/// Read page members out of an in-memory ZIP archive, validated and ordered by index
///
/// Directories, hidden members and members without the page extension are
/// ignored. A member with the page extension whose name is not `page-<n>.pdf`,
/// or whose number is negative, fails the whole archive.
pub fn extract_pages(archive: &[u8]) -> Result<Vec<Page>> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive)).map_err(corrupt)?;
    let mut pages = BTreeMap::new();

    for i in 0..zip.len() {
        let mut member = zip.by_index(i).map_err(corrupt)?;
        if member.is_dir() {
            continue;
        }

        let name = member.name().to_string();
        let Some(index) = page_index(&name)? else {
            debug!(member = %name, "ignoring archive member");
            continue;
        };

        if pages.contains_key(&index) {
            warn!(member = %name, page = index, "duplicate page, keeping the first");
            continue;
        }

        let mut data = Vec::new();
        member.read_to_end(&mut data).map_err(corrupt)?;
        pages.insert(index, data);
    }

    order_pages(pages)
}

/// Page index of an archive member, or `None` if the member is not a page
fn page_index(member: &str) -> Result<Option<u32>> {
    let base = member.rsplit(['/', '\\']).next().unwrap_or(member);

    if base.starts_with('.') || !base.to_ascii_lowercase().ends_with(PAGE_EXTENSION) {
        return Ok(None);
    }

    let invalid_number = || {
        Error::Archive(ArchiveError::InvalidPageNumber {
            name: member.to_string(),
        })
    };

    let digits = PAGE_NAME
        .captures(base)
        .and_then(|c| c.get(1))
        .ok_or_else(|| {
            Error::Archive(ArchiveError::InvalidPageName {
                name: member.to_string(),
            })
        })?
        .as_str();

    let n: i64 = digits.parse().map_err(|_| invalid_number())?;
    u32::try_from(n).map(Some).map_err(|_| invalid_number())
}

/// Require indices `0..count` with no gaps and return pages in ascending order
fn order_pages(pages: BTreeMap<u32, Vec<u8>>) -> Result<Vec<Page>> {
    if pages.is_empty() {
        return Err(ArchiveError::NoPages.into());
    }

    let mut ordered = Vec::with_capacity(pages.len());
    for (expected, (index, data)) in (0u32..).zip(pages) {
        if index != expected {
            return Err(ArchiveError::PageMissing { index: expected }.into());
        }
        ordered.push(Page { index, data });
    }

    Ok(ordered)
}

fn corrupt(e: impl std::fmt::Display) -> Error {
    Error::Archive(ArchiveError::Corrupt {
        reason: e.to_string(),
    })
}
