//! Output naming and atomic persistence

use crate::catalog::Issue;
use crate::document::{DocumentEngine, UnitRef};
use crate::error::{ArchiveError, Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::warn;

const PART_SUFFIX: &str = ".part";

/// `"<magazine> <number> (<title>).pdf"`, safe to use as a single path component
pub fn output_file_name(magazine: &str, issue: &Issue) -> String {
    sanitize(&format!("{} {} ({}).pdf", magazine, issue.number, issue.title))
}

/// Replace path separators and control characters, trim leading dots and spaces
fn sanitize(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' => '-',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect();

    replaced.trim_start_matches(['.', ' ']).to_string()
}

/// Temporary sibling of `final_path` that receives the document before the rename
pub fn part_path(final_path: &Path) -> PathBuf {
    let mut name: OsString = final_path
        .file_name()
        .map(|n| n.to_owned())
        .unwrap_or_default();
    name.push(PART_SUFFIX);
    final_path.with_file_name(name)
}

/// Merge `units` into `final_path` through its `.part` sibling
///
/// The final path only ever appears complete: a failed merge or rename removes
/// the partial file and leaves the final path untouched.
pub async fn write_atomically(
    engine: &dyn DocumentEngine,
    units: &[UnitRef],
    final_path: &Path,
) -> Result<()> {
    let part = part_path(final_path);

    let result = async {
        engine.merge(units, &part).await?;
        tokio::fs::rename(&part, final_path).await.map_err(|e| {
            Error::Archive(ArchiveError::WriteFailed {
                path: final_path.to_path_buf(),
                reason: e.to_string(),
            })
        })
    }
    .await;

    if result.is_err() {
        remove_part(&part).await;
    }
    result
}

async fn remove_part(part: &Path) {
    match tokio::fs::remove_file(part).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %part.display(), error = %e, "failed to remove partial file"),
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TextEngine;
    use crate::types::{IssueNumber, ProductId};

    fn issue(number: u32, title: &str) -> Issue {
        Issue {
            product_id: ProductId(format!("com.futurenet.edgemagazine.{number}")),
            title: title.to_string(),
            number: IssueNumber::new(number).unwrap(),
            remote_url: String::new(),
        }
    }

    #[test]
    fn file_name_combines_magazine_number_and_title() {
        assert_eq!(
            output_file_name("Edge", &issue(300, "The Big One")),
            "Edge 300 (The Big One).pdf"
        );
    }

    #[test]
    fn file_name_cannot_escape_the_output_directory() {
        let name = output_file_name("Edge", &issue(12, "Then/Now\\Later\n"));
        assert_eq!(name, "Edge 12 (Then-Now-Later ).pdf");
        assert!(!name.contains('/'));

        assert_eq!(sanitize("../x.pdf"), "-x.pdf");
    }

    #[test]
    fn part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("/out/Edge 1 (A).pdf")),
            PathBuf::from("/out/Edge 1 (A).pdf.part")
        );
    }

    #[tokio::test]
    async fn successful_write_leaves_no_part_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src.txt");
        std::fs::write(&source, "one\ntwo").unwrap();
        let final_path = dir.path().join("Edge 1 (A).pdf");

        write_atomically(
            &TextEngine,
            &[UnitRef::new(source.clone(), 1), UnitRef::new(source, 0)],
            &final_path,
        )
        .await
        .unwrap();

        assert_eq!(std::fs::read_to_string(&final_path).unwrap(), "two\none");
        assert!(!part_path(&final_path).exists());
    }

    #[tokio::test]
    async fn failed_merge_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("Edge 1 (A).pdf");

        let err = write_atomically(
            &TextEngine,
            &[UnitRef::new(dir.path().join("missing.txt"), 0)],
            &final_path,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Io(_)));
        assert!(!final_path.exists());
        assert!(!part_path(&final_path).exists());
    }

    #[tokio::test]
    async fn failed_rename_keeps_existing_final_path_intact() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src.txt");
        std::fs::write(&source, "one").unwrap();
        // A non-empty directory at the final path makes the rename fail
        let final_path = dir.path().join("Edge 1 (A).pdf");
        std::fs::create_dir(&final_path).unwrap();
        std::fs::write(final_path.join("keep"), "x").unwrap();

        let err = write_atomically(&TextEngine, &[UnitRef::new(source, 0)], &final_path)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Archive(ArchiveError::WriteFailed { .. })
        ));
        assert!(final_path.join("keep").exists());
        assert!(!part_path(&final_path).exists());
    }
}
