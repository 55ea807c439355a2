//! Text document engine for exercising the pipeline without qpdf
//!
//! A page file holds one content unit per line. An encrypted page starts with a
//! `locked:<passphrase>` line that decryption strips. Bytes that are not UTF-8
//! stand for a damaged page: they read as unencrypted but cannot be opened.
//!
//! Enabled in unit tests and with the `test-utils` feature.

use crate::document::{DocumentEngine, UnitRef};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::Path;

const LOCK_PREFIX: &str = "locked:";

/// Engine operating on line-per-unit text files
#[derive(Clone, Copy, Debug, Default)]
pub struct TextEngine;

/// Content of a text page holding `units`, optionally locked with `passphrase`
pub fn text_page(units: &[&str], passphrase: Option<&str>) -> Vec<u8> {
    let mut lines = Vec::new();
    if let Some(pw) = passphrase {
        lines.push(format!("{LOCK_PREFIX}{pw}"));
    }
    lines.extend(units.iter().map(|u| u.to_string()));
    lines.join("\n").into_bytes()
}

/// Content of a page that [`TextEngine`] cannot open
pub fn damaged_page() -> Vec<u8> {
    vec![0xff, 0xfe, 0x00, 0x9f]
}

async fn read_text(document: &Path) -> Result<String> {
    let bytes = tokio::fs::read(document).await?;
    String::from_utf8(bytes).map_err(|_| {
        Error::ExternalTool(format!("{} is not a text document", document.display()))
    })
}

#[async_trait]
impl DocumentEngine for TextEngine {
    async fn is_encrypted(&self, page: &Path) -> Result<bool> {
        let bytes = tokio::fs::read(page).await?;
        Ok(bytes.starts_with(LOCK_PREFIX.as_bytes()))
    }

    async fn decrypt(&self, page: &Path, passphrase: &str, dest: &Path) -> Result<bool> {
        let text = read_text(page).await?;
        let (first, rest) = text.split_once('\n').unwrap_or((text.as_str(), ""));
        match first.strip_prefix(LOCK_PREFIX) {
            Some(pw) if pw == passphrase => {
                tokio::fs::write(dest, rest).await?;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => {
                tokio::fs::write(dest, &text).await?;
                Ok(true)
            }
        }
    }

    async fn unit_count(&self, document: &Path) -> Result<u32> {
        let text = read_text(document).await?;
        if text.starts_with(LOCK_PREFIX) {
            return Err(Error::ExternalTool("document is encrypted".to_string()));
        }
        Ok(text.lines().count() as u32)
    }

    async fn merge(&self, units: &[UnitRef], dest: &Path) -> Result<()> {
        let mut merged = Vec::with_capacity(units.len());
        for unit in units {
            let text = read_text(&unit.source).await?;
            let line = text.lines().nth(unit.index as usize).ok_or_else(|| {
                Error::ExternalTool(format!("no unit {} in {}", unit.index, unit.source.display()))
            })?;
            merged.push(line.to_string());
        }
        tokio::fs::write(dest, merged.join("\n")).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "text"
    }
}
