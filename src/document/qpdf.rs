//! Document engine backed by the external qpdf binary

use super::{DocumentEngine, UnitRef};
use crate::config::OutputConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;

// qpdf exit statuses
const EXIT_OK: i32 = 0;
const EXIT_ERROR: i32 = 2;
const EXIT_WARNINGS: i32 = 3;

/// Document engine that executes `qpdf`
///
/// # Examples
///
/// ```no_run
/// use folio_dl::document::{DocumentEngine, QpdfEngine};
/// use std::path::{Path, PathBuf};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // Create with explicit path
/// let engine = QpdfEngine::new(PathBuf::from("/usr/bin/qpdf"));
///
/// // Or auto-discover from PATH
/// let engine = QpdfEngine::from_path().expect("qpdf not found in PATH");
///
/// let pages = engine.unit_count(Path::new("issue.pdf")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct QpdfEngine {
    binary_path: PathBuf,
}

impl QpdfEngine {
    /// Create an engine with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find qpdf in PATH
    pub fn from_path() -> Option<Self> {
        which::which("qpdf").ok().map(Self::new)
    }

    /// Engine for the configured binary, falling back to PATH discovery
    pub fn from_config(output: &OutputConfig) -> Result<Self> {
        match &output.qpdf_path {
            Some(path) => Ok(Self::new(path.clone())),
            None => Self::from_path().ok_or_else(|| {
                Error::NotSupported("qpdf binary not found in PATH".to_string())
            }),
        }
    }

    /// Path of the executable this engine runs
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    async fn run(&self, args: &[OsString]) -> Result<Output> {
        Command::new(&self.binary_path)
            .args(args)
            .output()
            .await
            .map_err(|e| Error::ExternalTool(format!("failed to execute qpdf: {}", e)))
    }
}

fn tool_failure(operation: &str, output: &Output) -> Error {
    let stderr = String::from_utf8_lossy(&output.stderr);
    Error::ExternalTool(format!(
        "qpdf {} failed ({}): {}",
        operation,
        output.status,
        stderr.trim()
    ))
}

fn succeeded(output: &Output) -> bool {
    matches!(output.status.code(), Some(EXIT_OK | EXIT_WARNINGS))
}

fn is_password_rejection(stderr: &[u8]) -> bool {
    String::from_utf8_lossy(stderr)
        .to_ascii_lowercase()
        .contains("invalid password")
}

/// Build `--pages` arguments, collapsing consecutive units of one file into a range
///
/// qpdf numbers pages from 1, so unit `i` becomes page `i + 1`.
fn page_selection(units: &[UnitRef]) -> Vec<OsString> {
    let mut args = Vec::new();
    let mut i = 0;

    while i < units.len() {
        let source = &units[i].source;
        let start = units[i].index;
        let mut end = start;
        let mut j = i + 1;
        while j < units.len() && units[j].source == *source && units[j].index == end + 1 {
            end += 1;
            j += 1;
        }

        args.push(source.as_os_str().to_owned());
        args.push(if start == end {
            OsString::from((start + 1).to_string())
        } else {
            OsString::from(format!("{}-{}", start + 1, end + 1))
        });
        i = j;
    }

    args
}

#[async_trait]
impl DocumentEngine for QpdfEngine {
    async fn is_encrypted(&self, page: &Path) -> Result<bool> {
        let output = self
            .run(&["--is-encrypted".into(), page.as_os_str().to_owned()])
            .await?;

        match output.status.code() {
            Some(EXIT_OK) => Ok(true),
            Some(EXIT_ERROR) => Ok(false),
            _ => Err(tool_failure("--is-encrypted", &output)),
        }
    }

    async fn decrypt(&self, page: &Path, passphrase: &str, dest: &Path) -> Result<bool> {
        let output = self
            .run(&[
                format!("--password={}", passphrase).into(),
                "--decrypt".into(),
                page.as_os_str().to_owned(),
                dest.as_os_str().to_owned(),
            ])
            .await?;

        if succeeded(&output) {
            Ok(true)
        } else if is_password_rejection(&output.stderr) {
            Ok(false)
        } else {
            Err(tool_failure("--decrypt", &output))
        }
    }

    async fn unit_count(&self, document: &Path) -> Result<u32> {
        let output = self
            .run(&["--show-npages".into(), document.as_os_str().to_owned()])
            .await?;

        if !succeeded(&output) {
            return Err(tool_failure("--show-npages", &output));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout.trim().parse().map_err(|_| {
            Error::ExternalTool(format!(
                "qpdf --show-npages printed an invalid count: {:?}",
                stdout.trim()
            ))
        })
    }

    async fn merge(&self, units: &[UnitRef], dest: &Path) -> Result<()> {
        let mut args: Vec<OsString> = vec!["--empty".into(), "--pages".into()];
        args.extend(page_selection(units));
        args.push("--".into());
        args.push(dest.as_os_str().to_owned());

        let output = self.run(&args).await?;
        if succeeded(&output) {
            Ok(())
        } else {
            Err(tool_failure("--pages", &output))
        }
    }

    fn name(&self) -> &'static str {
        "qpdf"
    }
}
