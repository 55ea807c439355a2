//! Page decryption and unit collection

use super::pages::Page;
use crate::document::{DocumentEngine, UnitRef};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Write `pages` into `scratch`, decrypt them in order and list their units
///
/// The returned units are in page order, and within a page in the page's own
/// order. A page the engine rejects or cannot open fails the issue with
/// [`Error::Decryption`] naming that page.
pub async fn decrypt_pages(
    engine: &dyn DocumentEngine,
    pages: &[Page],
    passphrase: &str,
    scratch: &Path,
    cancel: &CancellationToken,
) -> Result<Vec<UnitRef>> {
    let mut units = Vec::new();

    for page in pages {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let raw = scratch.join(format!("page-{}.pdf", page.index));
        let plain = scratch.join(format!("plain-{}.pdf", page.index));
        tokio::fs::write(&raw, &page.data).await?;

        let (source, count) = open_page(engine, &raw, passphrase, &plain)
            .await
            .map_err(|reason| {
                warn!(page = page.index, %reason, "page decryption failed");
                Error::Decryption {
                    page: page.index,
                    reason,
                }
            })?;

        debug!(page = page.index, units = count, "page decrypted");
        units.extend((0..count).map(|index| UnitRef::new(source.clone(), index)));
    }

    Ok(units)
}

/// Decrypt one page file if it is encrypted and count its units
async fn open_page(
    engine: &dyn DocumentEngine,
    raw: &Path,
    passphrase: &str,
    plain: &Path,
) -> std::result::Result<(PathBuf, u32), String> {
    let source = if engine.is_encrypted(raw).await.map_err(|e| e.to_string())? {
        if !engine
            .decrypt(raw, passphrase, plain)
            .await
            .map_err(|e| e.to_string())?
        {
            return Err("passphrase rejected".to_string());
        }
        plain.to_path_buf()
    } else {
        raw.to_path_buf()
    };

    let count = engine.unit_count(&source).await.map_err(|e| e.to_string())?;
    Ok((source, count))
}
