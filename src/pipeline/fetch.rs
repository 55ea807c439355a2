//! Archive download

use crate::error::{Error, Result};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Download the archive at `url` fully into memory
///
/// The body must be complete before the archive can be opened, since the ZIP
/// central directory sits at its end.
pub async fn fetch_archive(
    client: &reqwest::Client,
    url: &str,
    cancel: &CancellationToken,
) -> Result<Vec<u8>> {
    let download = async {
        let response = client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                url: display_url(url),
            });
        }

        let body = response.bytes().await?;
        debug!(bytes = body.len(), url = %display_url(url), "archive downloaded");
        Ok(body.to_vec())
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = download => result,
    }
}

/// Archive URLs are signed; drop the query before the URL shows up in logs or errors
fn display_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.to_string()
        }
        Err(_) => "<invalid url>".to_string(),
    }
}
