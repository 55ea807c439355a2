//! Error types for folio-dl
//!
//! This module provides the error taxonomy for the library:
//! - Configuration errors (missing credentials, unknown magazine)
//! - Server-reported application errors from the API envelope
//! - Data-integrity errors for issue numbers and archive pages
//! - Decryption, I/O, network and cancellation errors
//!
//! Every variant maps to a stable machine-readable code via [`Error::error_code`]
//! and to a process exit status via [`Error::exit_code`].

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for folio-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Vendor error code returned when an account identifier cannot be authenticated
pub const INVALID_IDENTIFIER_CODE: &str = "AUT002";

/// Message the vendor pairs with [`INVALID_IDENTIFIER_CODE`]
const INVALID_IDENTIFIER_MESSAGE: &str = "could not authenticate uid";

/// Main error type for folio-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "magazine")
        key: Option<String>,
    },

    /// Email address or password was not supplied
    #[error("missing email address or password")]
    MissingCredentials,

    /// Application error reported in the `errors` field of the API envelope
    #[error("{code}: {message}")]
    Api {
        /// Key of the first entry in the `errors` mapping (e.g., "AUT002")
        code: String,
        /// Value of that entry
        message: String,
    },

    /// Response did not have the shape the endpoint promises
    #[error("unexpected response from {endpoint}: {reason}")]
    Protocol {
        /// Endpoint that produced the response
        endpoint: String,
        /// What was wrong with it
        reason: String,
    },

    /// Product identifier does not carry a valid issue number
    #[error("invalid issue number in product {product_id}")]
    InvalidIssueNumber {
        /// The offending product identifier
        product_id: String,
    },

    /// Requested issue is not part of the account's library
    #[error("issue {number} does not exist in your library")]
    IssueNotFound {
        /// The requested issue number
        number: u32,
    },

    /// Issue archive is malformed or incomplete
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// A page was rejected by the passphrase or could not be read as a document
    #[error("failed to decrypt page {page}: {reason}")]
    Decryption {
        /// Zero-based page index
        page: u32,
        /// What the document engine reported
        reason: String,
    },

    /// External tool execution failed (qpdf)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Operation not supported (missing binary, etc.)
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success HTTP status without a usable body
    #[error("HTTP {status} from {url}")]
    Http {
        /// Response status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation was cancelled by the caller
    #[error("operation cancelled")]
    Cancelled,

    /// Operation did not complete within its time budget
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Name of the operation that timed out
        operation: &'static str,
        /// Budget that was exceeded
        after: Duration,
    },
}

/// Archive validation errors
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Archive contains no page members
    #[error("no pages found in archive")]
    NoPages,

    /// A page index in `[0, count)` has no member
    #[error("page {index} is missing")]
    PageMissing {
        /// Lowest missing page index
        index: u32,
    },

    /// Member has the page extension but not the page name pattern
    #[error("invalid page name {name}")]
    InvalidPageName {
        /// Full member name inside the archive
        name: String,
    },

    /// Member name carries a negative or out-of-range page number
    #[error("invalid page number in {name}")]
    InvalidPageNumber {
        /// Full member name inside the archive
        name: String,
    },

    /// Archive container could not be read
    #[error("corrupt archive: {reason}")]
    Corrupt {
        /// The reason the container could not be read
        reason: String,
    },

    /// Reconstructed document could not be written
    #[error("failed to write {path}: {reason}")]
    WriteFailed {
        /// Destination path
        path: PathBuf,
        /// The reason the write failed
        reason: String,
    },
}

impl Error {
    /// Create a configuration error for a specific key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Whether this is the vendor's "could not authenticate uid" rejection
    ///
    /// Anonymous identifiers handed out by the server are sometimes unusable;
    /// the first authenticated call then fails with this error.
    pub fn is_invalid_identifier(&self) -> bool {
        match self {
            Error::Api { code, message } => {
                code == INVALID_IDENTIFIER_CODE
                    || message
                        .to_ascii_lowercase()
                        .contains(INVALID_IDENTIFIER_MESSAGE)
            }
            _ => false,
        }
    }

    /// Machine-readable error code
    pub fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::MissingCredentials => "missing_credentials",
            Error::Api { .. } if self.is_invalid_identifier() => "invalid_identifier",
            Error::Api { .. } => "api_error",
            Error::Protocol { .. } => "protocol_error",
            Error::InvalidIssueNumber { .. } => "invalid_issue_number",
            Error::IssueNotFound { .. } => "issue_not_found",
            Error::Archive(e) => match e {
                ArchiveError::NoPages => "no_pages",
                ArchiveError::PageMissing { .. } => "page_missing",
                ArchiveError::InvalidPageName { .. } => "invalid_page_name",
                ArchiveError::InvalidPageNumber { .. } => "invalid_page_number",
                ArchiveError::Corrupt { .. } => "corrupt_archive",
                ArchiveError::WriteFailed { .. } => "write_failed",
            },
            Error::Decryption { .. } => "decryption_failed",
            Error::ExternalTool(_) => "external_tool_error",
            Error::NotSupported(_) => "not_supported",
            Error::Network(_) => "network_error",
            Error::Http { .. } => "http_error",
            Error::Serialization(_) => "serialization_error",
            Error::Io(_) => "io_error",
            Error::Cancelled => "cancelled",
            Error::Timeout { .. } => "timeout",
        }
    }

    /// Process exit status for a command that failed with this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config { .. } | Error::MissingCredentials => 2,
            Error::Cancelled => 130,
            _ => 1,
        }
    }
}
