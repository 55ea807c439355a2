//! Core identifier types for folio-dl

use serde::{Deserialize, Serialize};

/// Account identifier issued by the vendor (`uid`)
///
/// Never empty once a session is established.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Wrap a raw identifier, rejecting empty or blank values
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque product identifier (SKU) from the purchase catalog
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Positive issue number derived from a product identifier
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct IssueNumber(u32);

impl IssueNumber {
    /// Create an issue number; zero is not a valid issue
    pub fn new(n: u32) -> Option<Self> {
        (n > 0).then_some(Self(n))
    }

    /// Get the inner value
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for IssueNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_account_ids_are_rejected() {
        assert!(AccountId::new("").is_none());
        assert!(AccountId::new("   ").is_none());
        assert_eq!(AccountId::new("abc").map(|id| id.to_string()), Some("abc".into()));
    }

    #[test]
    fn issue_number_zero_is_rejected() {
        assert!(IssueNumber::new(0).is_none());
        assert_eq!(IssueNumber::new(7).map(|n| n.get()), Some(7));
    }

    #[test]
    fn product_ids_order_lexicographically() {
        let mut ids: Vec<ProductId> = vec!["a.10".into(), "a.9".into(), "a.1".into()];
        ids.sort();
        let raw: Vec<&str> = ids.iter().map(ProductId::as_str).collect();
        assert_eq!(raw, vec!["a.1", "a.10", "a.9"]);
    }
}
