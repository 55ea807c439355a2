//! Entitlement catalog: purchased products and the issues they resolve to

use crate::error::{Error, Result};
use crate::session::AccountSession;
use crate::types::{IssueNumber, ProductId};
use serde::Serialize;
use tracing::{debug, warn};

/// A purchased product resolved to its downloadable archive
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Entitlement {
    /// Product identifier as reported by the detail endpoint
    pub product_id: ProductId,
    /// Issue title
    pub title: String,
    /// Archive URL
    pub remote_url: String,
}

/// A purchased issue with its number
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// Product identifier
    pub product_id: ProductId,
    /// Issue title
    pub title: String,
    /// Issue number parsed from the product identifier
    pub number: IssueNumber,
    /// Archive URL
    pub remote_url: String,
}

impl Issue {
    /// Attach the issue number parsed from `entitlement`'s product identifier
    pub fn from_entitlement(entitlement: Entitlement, namespace: &str) -> Result<Self> {
        let number = parse_issue_number(namespace, entitlement.product_id.as_str())?;
        Ok(Self {
            product_id: entitlement.product_id,
            title: entitlement.title,
            number,
            remote_url: entitlement.remote_url,
        })
    }
}

/// Parse the issue number out of `<namespace>.<integer>`
///
/// Fails with [`Error::InvalidIssueNumber`] if the identifier is outside the
/// namespace, the suffix is not an integer, or the integer is not positive.
///
/// ```
/// use folio_dl::catalog::parse_issue_number;
///
/// assert_eq!(parse_issue_number("com.vendor.acme", "com.vendor.acme.7").unwrap().get(), 7);
/// assert!(parse_issue_number("com.vendor.acme", "com.vendor.acme.0").is_err());
/// assert!(parse_issue_number("com.vendor.acme", "com.vendor.other.7").is_err());
/// ```
pub fn parse_issue_number(namespace: &str, product_id: &str) -> Result<IssueNumber> {
    let invalid = || Error::InvalidIssueNumber {
        product_id: product_id.to_string(),
    };

    let suffix = product_id
        .strip_prefix(namespace)
        .and_then(|rest| rest.strip_prefix('.'))
        .ok_or_else(invalid)?;

    let n: i64 = suffix.parse().map_err(|_| invalid())?;
    u32::try_from(n)
        .ok()
        .and_then(IssueNumber::new)
        .ok_or_else(invalid)
}

impl AccountSession {
    /// Product identifiers purchased by this account, ascending by string order
    ///
    /// The order is lexicographic, not numeric: `x.10` sorts before `x.9`.
    pub async fn purchased_products(&self) -> Result<Vec<ProductId>> {
        let mut ids = self.api.purchased_product_list(self.account_id()).await?;
        ids.sort();
        debug!(count = ids.len(), "purchased products listed");
        Ok(ids)
    }

    /// Resolve one purchased product to its title and archive URL
    pub async fn resolve(&self, product_id: &ProductId) -> Result<Entitlement> {
        let product = self
            .api
            .entitled_product(self.account_id(), product_id)
            .await?;

        let resolved_id = if product.product_id.is_empty() {
            product_id.clone()
        } else {
            ProductId(product.product_id)
        };

        Ok(Entitlement {
            product_id: resolved_id,
            title: product.title,
            remote_url: product.download_url,
        })
    }

    /// Resolve one purchased product to a numbered issue
    pub async fn resolve_issue(&self, product_id: &ProductId) -> Result<Issue> {
        let entitlement = self.resolve(product_id).await?;
        Issue::from_entitlement(entitlement, &self.product_namespace())
    }

    /// All purchased issues, in catalog order
    ///
    /// Products whose identifier carries no valid issue number are skipped with a
    /// warning; any API error aborts the listing.
    pub async fn issues(&self) -> Result<Vec<Issue>> {
        let namespace = self.product_namespace();
        let mut issues = Vec::new();

        for product_id in self.purchased_products().await? {
            let entitlement = self.resolve(&product_id).await?;
            match Issue::from_entitlement(entitlement, &namespace) {
                Ok(issue) => issues.push(issue),
                Err(e @ Error::InvalidIssueNumber { .. }) => {
                    warn!(product_id = %product_id, error = %e, "skipping product");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(issues)
    }
}

/// Which issues of the library to reconstruct
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IssueFilter {
    /// Every issue
    All,
    /// Issues numbered at or above the given number
    From(u32),
    /// Exactly one issue
    Single(u32),
}

impl IssueFilter {
    /// Whether `issue` is selected
    pub fn matches(&self, issue: &Issue) -> bool {
        match *self {
            IssueFilter::All => true,
            IssueFilter::From(n) => issue.number.get() >= n,
            IssueFilter::Single(n) => issue.number.get() == n,
        }
    }

    /// Select matching issues, preserving order
    ///
    /// A [`IssueFilter::Single`] selection that matches nothing is an error.
    pub fn select<'a>(&self, issues: &'a [Issue]) -> Result<Vec<&'a Issue>> {
        let selected: Vec<&Issue> = issues.iter().filter(|i| self.matches(i)).collect();
        if let IssueFilter::Single(number) = *self
            && selected.is_empty()
        {
            return Err(Error::IssueNotFound { number });
        }
        Ok(selected)
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FolioApi;
    use crate::config::Config;
    use crate::test_support::ScriptedTransport;
    use serde_json::json;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn issue(number: u32) -> Issue {
        Issue {
            product_id: ProductId(format!("com.futurenet.edgemagazine.{number}")),
            title: format!("Issue {number}"),
            number: IssueNumber::new(number).unwrap(),
            remote_url: format!("https://cdn/{number}.zip"),
        }
    }

    async fn session(transport: ScriptedTransport) -> (AccountSession, Arc<ScriptedTransport>) {
        let transport = Arc::new(
            transport.respond("getProductList", Ok(json!({"product_list": []}))),
        );
        let api = FolioApi::new(transport.clone(), CancellationToken::new());
        let edge = *crate::magazines::lookup("Edge").unwrap();
        let session = AccountSession::restore(api, edge, "u1", &Config::default())
            .await
            .unwrap();
        (session, transport)
    }

    fn entitled(sku: &str, title: &str) -> serde_json::Value {
        json!({"sku": sku, "product_title": title, "secure_download_url": format!("https://cdn/{sku}.zip")})
    }

    #[test]
    fn parses_number_inside_namespace() {
        assert_eq!(
            parse_issue_number("com.vendor.acme", "com.vendor.acme.7").unwrap().get(),
            7
        );
    }

    #[test]
    fn rejects_zero_and_negative_numbers() {
        assert!(matches!(
            parse_issue_number("com.vendor.acme", "com.vendor.acme.0"),
            Err(Error::InvalidIssueNumber { .. })
        ));
        assert!(parse_issue_number("com.vendor.acme", "com.vendor.acme.-3").is_err());
    }

    #[test]
    fn rejects_foreign_namespace_and_garbage() {
        assert!(parse_issue_number("com.vendor.acme", "com.vendor.other.7").is_err());
        assert!(parse_issue_number("com.vendor.acme", "com.vendor.acme7").is_err());
        assert!(parse_issue_number("com.vendor.acme", "com.vendor.acme.7b").is_err());
        assert!(parse_issue_number("com.vendor.acme", "com.vendor.acme.").is_err());
    }

    #[tokio::test]
    async fn purchased_products_are_sorted_lexicographically() {
        let (session, _) = session(ScriptedTransport::new().respond(
            "getPurchasedProductList",
            Ok(json!({"purchased_product_list": [
                {"sku": "com.futurenet.edgemagazine.9"},
                {"sku": "com.futurenet.edgemagazine.10"},
                {"sku": "com.futurenet.edgemagazine.1"}
            ]})),
        ))
        .await;

        let ids = session.purchased_products().await.unwrap();
        let raw: Vec<&str> = ids.iter().map(ProductId::as_str).collect();
        assert_eq!(
            raw,
            vec![
                "com.futurenet.edgemagazine.1",
                "com.futurenet.edgemagazine.10",
                "com.futurenet.edgemagazine.9"
            ]
        );
    }

    #[tokio::test]
    async fn resolve_sends_sku_and_maps_fields() {
        let (session, transport) = session(ScriptedTransport::new().respond(
            "getEntitledProduct",
            Ok(entitled("com.futurenet.edgemagazine.300", "The Big One")),
        ))
        .await;

        let issue = session
            .resolve_issue(&"com.futurenet.edgemagazine.300".into())
            .await
            .unwrap();

        assert_eq!(issue.number.get(), 300);
        assert_eq!(issue.title, "The Big One");
        assert_eq!(issue.remote_url, "https://cdn/com.futurenet.edgemagazine.300.zip");
        let call = transport
            .calls()
            .into_iter()
            .find(|c| c.endpoint == "getEntitledProduct")
            .unwrap();
        assert_eq!(call.field("sku"), Some("com.futurenet.edgemagazine.300"));
        assert_eq!(call.field("uid"), Some("u1"));
    }

    #[tokio::test]
    async fn issues_skip_products_without_issue_numbers() {
        let (session, _) = session(
            ScriptedTransport::new()
                .respond(
                    "getPurchasedProductList",
                    Ok(json!({"purchased_product_list": [
                        {"sku": "com.futurenet.edgemagazine.2"},
                        {"sku": "com.futurenet.edgemagazine.special"},
                        {"sku": "com.futurenet.edgemagazine.1"}
                    ]})),
                )
                .respond("getEntitledProduct", Ok(entitled("com.futurenet.edgemagazine.1", "One")))
                .respond("getEntitledProduct", Ok(entitled("com.futurenet.edgemagazine.2", "Two")))
                .respond(
                    "getEntitledProduct",
                    Ok(entitled("com.futurenet.edgemagazine.special", "Special")),
                ),
        )
        .await;

        let issues = session.issues().await.unwrap();
        let numbers: Vec<u32> = issues.iter().map(|i| i.number.get()).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn filters_select_by_number() {
        let issues = vec![issue(1), issue(5), issue(9)];

        assert_eq!(IssueFilter::All.select(&issues).unwrap().len(), 3);
        let from: Vec<u32> = IssueFilter::From(5)
            .select(&issues)
            .unwrap()
            .iter()
            .map(|i| i.number.get())
            .collect();
        assert_eq!(from, vec![5, 9]);
        assert_eq!(IssueFilter::Single(9).select(&issues).unwrap().len(), 1);
    }

    #[test]
    fn single_filter_without_match_is_issue_not_found() {
        let issues = vec![issue(1)];
        assert!(matches!(
            IssueFilter::Single(2).select(&issues),
            Err(Error::IssueNotFound { number: 2 })
        ));
        assert!(IssueFilter::From(2).select(&issues).unwrap().is_empty());
    }
}
