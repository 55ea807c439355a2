//! Typed vendor endpoints
//!
//! [`FolioApi`] wraps an [`ApiTransport`] and a cancellation token. Each method
//! builds the endpoint's form, races the request against cancellation and decodes
//! the unwrapped `data` value into a typed response.

use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::magazines::Magazine;
use crate::transport::ApiTransport;
use crate::types::{AccountId, ProductId};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Status value reported once a login ticket is fully authorized
pub const AUTHORIZED_STATUS: i64 = 1;

/// Detail record of one purchased product
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct EntitledProduct {
    /// Product identifier echoed by the server
    #[serde(rename = "sku")]
    pub product_id: String,
    /// Human-readable issue title
    #[serde(rename = "product_title", default)]
    pub title: String,
    /// Signed URL of the issue archive
    #[serde(rename = "secure_download_url")]
    pub download_url: String,
}

#[derive(Deserialize)]
struct AnonymousUser {
    #[serde(default)]
    uid: String,
}

#[derive(Deserialize)]
struct Sku {
    sku: String,
}

#[derive(Deserialize)]
struct ProductList {
    #[serde(default)]
    product_list: Option<Vec<Sku>>,
}

#[derive(Deserialize)]
struct PurchasedProductList {
    #[serde(default)]
    purchased_product_list: Option<Vec<Sku>>,
}

#[derive(Deserialize)]
struct LoginTicket {
    #[serde(rename = "download_ticket_no")]
    ticket: TicketValue,
}

#[derive(Deserialize)]
struct DownloadStatus {
    status: StatusValue,
}

// The server is loose about scalar types; accept numbers and strings alike
#[derive(Deserialize)]
#[serde(untagged)]
enum TicketValue {
    Text(String),
    Number(i64),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StatusValue {
    Number(i64),
    Text(String),
}

impl StatusValue {
    fn as_i64(&self) -> Option<i64> {
        match self {
            StatusValue::Number(n) => Some(*n),
            StatusValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Vendor API bound to a transport and a cancellation token
#[derive(Clone)]
pub struct FolioApi {
    transport: Arc<dyn ApiTransport>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for FolioApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolioApi")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl FolioApi {
    /// Create an API handle
    pub fn new(transport: Arc<dyn ApiTransport>, cancel: CancellationToken) -> Self {
        Self { transport, cancel }
    }

    /// Token observed by every call made through this handle
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    async fn call<T: DeserializeOwned>(&self, endpoint: &str, form: &[(&str, &str)]) -> Result<T> {
        debug!(endpoint, "api request");

        let data = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(Error::Cancelled),
            result = self.transport.post_form(endpoint, form) => result?,
        };

        serde_json::from_value(data).map_err(|e| Error::Protocol {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }

    /// `createAnonymousUser`: obtain a fresh candidate account identifier
    pub async fn create_anonymous_user(
        &self,
        magazine: &Magazine,
        platform: &str,
    ) -> Result<AccountId> {
        let response: AnonymousUser = self
            .call(
                "createAnonymousUser",
                &[
                    ("appKey", magazine.app_key),
                    ("secretKey", magazine.secret_key),
                    ("platform", platform),
                ],
            )
            .await?;

        AccountId::new(response.uid).ok_or_else(|| Error::Protocol {
            endpoint: "createAnonymousUser".to_string(),
            reason: "empty uid".to_string(),
        })
    }

    /// `getProductList`: the publication's storefront, used as an authentication probe
    pub async fn product_list(&self, uid: &AccountId) -> Result<Vec<ProductId>> {
        let response: ProductList = self
            .call("getProductList", &[("uid", uid.as_str())])
            .await?;
        Ok(skus(response.product_list))
    }

    /// `login`: submit credentials and obtain a one-time authorization ticket
    pub async fn login(&self, uid: &AccountId, credentials: &Credentials) -> Result<String> {
        let params = serde_json::json!({
            "password": credentials.password,
            "identifier": credentials.email,
        })
        .to_string();

        let response: LoginTicket = self
            .call("login", &[("uid", uid.as_str()), ("api_params", params.as_str())])
            .await?;

        Ok(match response.ticket {
            TicketValue::Text(t) => t,
            TicketValue::Number(n) => n.to_string(),
        })
    }

    /// `getDownloadUrl`: authorization status of a login ticket
    pub async fn download_status(&self, uid: &AccountId, ticket: &str) -> Result<i64> {
        let response: DownloadStatus = self
            .call("getDownloadUrl", &[("uid", uid.as_str()), ("ticket", ticket)])
            .await?;

        response.status.as_i64().ok_or_else(|| Error::Protocol {
            endpoint: "getDownloadUrl".to_string(),
            reason: "non-numeric status".to_string(),
        })
    }

    /// `getPurchasedProductList`: product identifiers owned by the account, in server order
    pub async fn purchased_product_list(&self, uid: &AccountId) -> Result<Vec<ProductId>> {
        let response: PurchasedProductList = self
            .call("getPurchasedProductList", &[("uid", uid.as_str())])
            .await?;
        Ok(skus(response.purchased_product_list))
    }

    /// `getEntitledProduct`: title and archive URL of one purchased product
    pub async fn entitled_product(
        &self,
        uid: &AccountId,
        product_id: &ProductId,
    ) -> Result<EntitledProduct> {
        self.call(
            "getEntitledProduct",
            &[("uid", uid.as_str()), ("sku", product_id.as_str())],
        )
        .await
    }
}

fn skus(list: Option<Vec<Sku>>) -> Vec<ProductId> {
    list.unwrap_or_default()
        .into_iter()
        .map(|p| ProductId(p.sku))
        .collect()
}
