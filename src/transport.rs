//! HTTP transport for the vendor API
//!
//! Every endpoint is a form POST to `<base_url>/<endpoint>/` answering with a JSON
//! envelope of the shape `{"data": ..., "errors": {...}}`. A non-empty `errors`
//! mapping turns into [`Error::Api`]; otherwise the `data` value is handed back.

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// Transport used by the API layer to reach the vendor
///
/// Implementations return the unwrapped `data` value of the envelope.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// POST `form` to `endpoint` and unwrap the response envelope
    async fn post_form(&self, endpoint: &str, form: &[(&str, &str)]) -> Result<Value>;
}

/// reqwest-backed transport
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: url::Url,
}

impl HttpTransport {
    /// Create a transport from API settings
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Self::with_client(client, &config.base_url)
    }

    /// Create a transport around an existing client
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self> {
        // Url::join drops the last path segment unless it ends with a slash
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = url::Url::parse(&normalized)
            .map_err(|e| Error::config(format!("invalid base URL: {}", e), "api.base_url"))?;
        Ok(Self { client, base_url })
    }

    /// The underlying HTTP client, shared with archive downloads
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<url::Url> {
        self.base_url
            .join(&format!("{}/", endpoint))
            .map_err(|e| Error::config(format!("invalid endpoint {}: {}", endpoint, e), "api.base_url"))
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn post_form(&self, endpoint: &str, form: &[(&str, &str)]) -> Result<Value> {
        let url = self.endpoint_url(endpoint)?;
        let response = self.client.post(url.clone()).form(form).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        debug!(endpoint, status = status.as_u16(), bytes = body.len(), "api response");

        let value: Value = match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(_) if !status.is_success() => {
                return Err(Error::Http {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }
            Err(e) => return Err(Error::Serialization(e)),
        };

        unwrap_envelope(endpoint, value)
    }
}

/// Unwrap a `{data, errors}` envelope
///
/// If `errors` is a non-empty mapping, its first entry becomes `Error::Api` with
/// `"<key>: <value>"` as the display form. Otherwise `data` is returned, or `null`
/// if absent.
pub fn unwrap_envelope(endpoint: &str, value: Value) -> Result<Value> {
    let Value::Object(mut envelope) = value else {
        return Err(Error::Protocol {
            endpoint: endpoint.to_string(),
            reason: "response is not a JSON object".to_string(),
        });
    };

    if let Some(Value::Object(errors)) = envelope.get("errors")
        && let Some((code, message)) = errors.iter().next()
    {
        let message = match message {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(Error::Api {
            code: code.clone(),
            message,
        });
    }

    Ok(envelope.remove("data").unwrap_or(Value::Null))
}
