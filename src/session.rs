//! Account sessions
//!
//! A session pairs an account identifier (`uid`) with the publication it was
//! issued for. Sessions come from one of two places:
//! - [`AccountSession::establish`] asks the server for a fresh anonymous identifier
//! - [`AccountSession::restore`] reuses an identifier obtained earlier
//!
//! Either way the identifier is probed with an authenticated call before the
//! session is handed out. The server occasionally issues anonymous identifiers that
//! it then refuses to authenticate (`AUT002: could not authenticate uid`);
//! establishment retries those with capped, jittered backoff.
//!
//! [`AccountSession::login`] upgrades the account with credentials. The server
//! authorizes logins asynchronously, so the returned ticket is polled until it
//! reports [`AUTHORIZED_STATUS`].
//!
//! A session is immutable once built and can be shared across concurrent issue
//! reconstructions.

use crate::api::{AUTHORIZED_STATUS, FolioApi};
use crate::config::{Config, Credentials, LoginPollConfig};
use crate::error::{Error, Result};
use crate::magazines::Magazine;
use crate::retry::{next_delay, retry_if, sleep_or_cancel};
use crate::types::AccountId;
use tracing::{debug, info};

/// Authenticated (or anonymous) account for one publication
#[derive(Clone, Debug)]
pub struct AccountSession {
    account_id: AccountId,
    magazine: Magazine,
    product_prefix: String,
    pub(crate) api: FolioApi,
}

impl AccountSession {
    /// Create an anonymous account and verify that the server accepts it
    ///
    /// Candidates rejected with the invalid-identifier error are discarded and a new
    /// one is requested, up to `config.bootstrap.max_attempts` retries. Any other
    /// error ends the attempt immediately.
    pub async fn establish(api: FolioApi, magazine: Magazine, config: &Config) -> Result<Self> {
        let cancel = api.cancel_token().clone();
        let api_ref = &api;
        let magazine_ref = &magazine;
        let platform = config.api.platform.as_str();

        let account_id = retry_if(
            &config.bootstrap,
            &cancel,
            Error::is_invalid_identifier,
            || async move {
                let candidate = api_ref
                    .create_anonymous_user(magazine_ref, platform)
                    .await?;
                api_ref.product_list(&candidate).await?;
                Ok(candidate)
            },
        )
        .await?;

        info!(magazine = magazine.name, "anonymous session established");

        Ok(Self {
            account_id,
            magazine,
            product_prefix: config.api.product_prefix.clone(),
            api,
        })
    }

    /// Restore a session from an identifier obtained earlier
    ///
    /// The identifier is probed once; a rejection is final.
    pub async fn restore(
        api: FolioApi,
        magazine: Magazine,
        account_id: &str,
        config: &Config,
    ) -> Result<Self> {
        let account_id = AccountId::new(account_id)
            .ok_or_else(|| Error::config("account identifier is empty", "uid"))?;

        api.product_list(&account_id).await?;

        info!(magazine = magazine.name, "session restored");

        Ok(Self {
            account_id,
            magazine,
            product_prefix: config.api.product_prefix.clone(),
            api,
        })
    }

    /// Upgrade the session with account credentials
    ///
    /// Submits the credentials, then polls the ticket's authorization status until
    /// it equals [`AUTHORIZED_STATUS`]. Any other status keeps polling with growing
    /// delays; a transport error aborts. The whole wait is bounded by `poll.timeout`.
    pub async fn login(&self, credentials: &Credentials, poll: &LoginPollConfig) -> Result<()> {
        debug!(
            magazine = self.magazine.name,
            password_length = credentials.password.len(),
            "submitting credentials"
        );

        let ticket = self.api.login(&self.account_id, credentials).await?;

        match tokio::time::timeout(poll.timeout, self.await_authorization(&ticket, poll)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                operation: "login authorization",
                after: poll.timeout,
            }),
        }
    }

    async fn await_authorization(&self, ticket: &str, poll: &LoginPollConfig) -> Result<()> {
        let mut interval = poll.initial_interval;
        let mut polls = 0u32;

        loop {
            let status = self.api.download_status(&self.account_id, ticket).await?;
            polls += 1;

            if status == AUTHORIZED_STATUS {
                info!(magazine = self.magazine.name, polls, "login authorized");
                return Ok(());
            }

            debug!(status, polls, "login not yet authorized");
            sleep_or_cancel(self.api.cancel_token(), interval).await?;
            interval = next_delay(interval, poll.backoff_multiplier, poll.max_interval);
        }
    }

    /// Account identifier, reusable with [`AccountSession::restore`]
    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Publication this session belongs to
    pub fn magazine(&self) -> &Magazine {
        &self.magazine
    }

    /// Product namespace of this session's publication, e.g. `com.futurenet.edgemagazine`
    pub fn product_namespace(&self) -> String {
        self.magazine.product_namespace(&self.product_prefix)
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use crate::test_support::{ScriptedTransport, invalid_uid};
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn edge() -> Magazine {
        *crate::magazines::lookup("Edge").unwrap()
    }

    fn config() -> Config {
        Config {
            bootstrap: RetryConfig {
                max_attempts: 20,
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(5),
                backoff_multiplier: 2.0,
                jitter: false,
            },
            login: LoginPollConfig {
                initial_interval: Duration::from_millis(1),
                max_interval: Duration::from_millis(5),
                backoff_multiplier: 2.0,
                timeout: Duration::from_secs(5),
            },
            ..Config::default()
        }
    }

    fn creds() -> Credentials {
        Credentials {
            email: "me@example.com".into(),
            password: "pw".into(),
        }
    }

    fn numbered_uids(transport: ScriptedTransport) -> ScriptedTransport {
        let counter = Arc::new(AtomicU32::new(0));
        transport.fallback("createAnonymousUser", move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Ok(json!({ "uid": format!("uid-{n}") }))
        })
    }

    async fn established(transport: ScriptedTransport) -> (AccountSession, Arc<ScriptedTransport>) {
        let transport = Arc::new(numbered_uids(
            transport.respond("getProductList", Ok(json!({"product_list": []}))),
        ));
        let api = FolioApi::new(transport.clone(), CancellationToken::new());
        let session = AccountSession::establish(api, edge(), &config()).await.unwrap();
        (session, transport)
    }

    #[tokio::test]
    async fn establish_retries_rejected_identifiers_until_probe_succeeds() {
        let transport = Arc::new(numbered_uids(
            ScriptedTransport::new()
                .respond("getProductList", Err(invalid_uid()))
                .respond("getProductList", Err(invalid_uid()))
                .respond("getProductList", Err(invalid_uid()))
                .respond("getProductList", Ok(json!({"product_list": [{"sku": "x"}]}))),
        ));
        let api = FolioApi::new(transport.clone(), CancellationToken::new());

        let session = AccountSession::establish(api, edge(), &config()).await.unwrap();

        assert_eq!(session.account_id().as_str(), "uid-3");
        assert_eq!(transport.count("createAnonymousUser"), 4);
        assert_eq!(transport.count("getProductList"), 4);
        let probed: Vec<_> = transport
            .calls()
            .into_iter()
            .filter(|c| c.endpoint == "getProductList")
            .filter_map(|c| c.field("uid").map(str::to_string))
            .collect();
        assert_eq!(probed, vec!["uid-0", "uid-1", "uid-2", "uid-3"]);
    }

    #[tokio::test]
    async fn establish_fails_fast_on_other_errors() {
        let transport = Arc::new(numbered_uids(ScriptedTransport::new().respond(
            "getProductList",
            Err(Error::Api {
                code: "APP001".into(),
                message: "application disabled".into(),
            }),
        )));
        let api = FolioApi::new(transport.clone(), CancellationToken::new());

        let err = AccountSession::establish(api, edge(), &config())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Api { ref code, .. } if code == "APP001"));
        assert_eq!(transport.count("createAnonymousUser"), 1);
    }

    #[tokio::test]
    async fn establish_gives_up_after_retry_cap() {
        let transport = Arc::new(numbered_uids(
            ScriptedTransport::new().fallback("getProductList", || Err(invalid_uid())),
        ));
        let api = FolioApi::new(transport.clone(), CancellationToken::new());
        let mut config = config();
        config.bootstrap.max_attempts = 3;

        let err = AccountSession::establish(api, edge(), &config)
            .await
            .unwrap_err();

        assert!(err.is_invalid_identifier());
        assert_eq!(transport.count("createAnonymousUser"), 4);
    }

    #[tokio::test]
    async fn establish_stops_when_cancelled() {
        let transport = Arc::new(numbered_uids(
            ScriptedTransport::new().fallback("getProductList", || Err(invalid_uid())),
        ));
        let cancel = CancellationToken::new();
        let api = FolioApi::new(transport, cancel.clone());
        let mut config = config();
        config.bootstrap.max_attempts = u32::MAX;
        config.bootstrap.initial_delay = Duration::from_millis(20);
        config.bootstrap.max_delay = Duration::from_millis(20);

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = AccountSession::establish(api, edge(), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[tokio::test]
    async fn restore_probes_without_creating_a_user() {
        let transport = Arc::new(
            ScriptedTransport::new().respond("getProductList", Ok(json!({"product_list": []}))),
        );
        let api = FolioApi::new(transport.clone(), CancellationToken::new());

        let session = AccountSession::restore(api, edge(), "saved-uid", &config())
            .await
            .unwrap();

        assert_eq!(session.account_id().as_str(), "saved-uid");
        assert_eq!(transport.count("createAnonymousUser"), 0);
    }

    #[tokio::test]
    async fn restore_does_not_retry_rejected_identifier() {
        let transport = Arc::new(ScriptedTransport::new().fallback("getProductList", || Err(invalid_uid())));
        let api = FolioApi::new(transport.clone(), CancellationToken::new());

        let err = AccountSession::restore(api, edge(), "stale", &config())
            .await
            .unwrap_err();

        assert!(err.is_invalid_identifier());
        assert_eq!(transport.count("getProductList"), 1);
    }

    #[tokio::test]
    async fn restore_rejects_empty_identifier_before_network() {
        let transport = Arc::new(ScriptedTransport::new());
        let api = FolioApi::new(transport.clone(), CancellationToken::new());

        let err = AccountSession::restore(api, edge(), "", &config())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Config { .. }));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn login_polls_until_status_is_one() {
        let (session, transport) = established(
            ScriptedTransport::new()
                .respond("login", Ok(json!({"download_ticket_no": "T-1"})))
                .respond("getDownloadUrl", Ok(json!({"status": 0})))
                .respond("getDownloadUrl", Ok(json!({"status": 2})))
                .respond("getDownloadUrl", Ok(json!({"status": -1})))
                .respond("getDownloadUrl", Ok(json!({"status": 1}))),
        )
        .await;

        session.login(&creds(), &config().login).await.unwrap();

        assert_eq!(transport.count("getDownloadUrl"), 4);
        let polls = transport.calls();
        let last = polls.iter().rev().find(|c| c.endpoint == "getDownloadUrl").unwrap();
        assert_eq!(last.field("ticket"), Some("T-1"));
        assert_eq!(last.field("uid"), Some(session.account_id().as_str()));
    }

    #[tokio::test]
    async fn login_aborts_on_poll_error() {
        let (session, transport) = established(
            ScriptedTransport::new()
                .respond("login", Ok(json!({"download_ticket_no": "T-1"})))
                .respond("getDownloadUrl", Ok(json!({"status": 0})))
                .respond(
                    "getDownloadUrl",
                    Err(Error::Api {
                        code: "TCK001".into(),
                        message: "ticket expired".into(),
                    }),
                ),
        )
        .await;

        let err = session.login(&creds(), &config().login).await.unwrap_err();

        assert!(matches!(err, Error::Api { ref code, .. } if code == "TCK001"));
        assert_eq!(transport.count("getDownloadUrl"), 2);
    }

    #[tokio::test]
    async fn login_rejected_credentials_skip_polling() {
        let (session, transport) = established(ScriptedTransport::new().respond(
            "login",
            Err(Error::Api {
                code: "LOG001".into(),
                message: "invalid credentials".into(),
            }),
        ))
        .await;

        assert!(session.login(&creds(), &config().login).await.is_err());
        assert_eq!(transport.count("getDownloadUrl"), 0);
    }

    #[tokio::test]
    async fn login_times_out_when_never_authorized() {
        let (session, _) = established(
            ScriptedTransport::new()
                .respond("login", Ok(json!({"download_ticket_no": "T-1"})))
                .fallback("getDownloadUrl", || Ok(json!({"status": 0}))),
        )
        .await;
        let mut poll = config().login;
        poll.timeout = Duration::from_millis(50);

        let err = session.login(&creds(), &poll).await.unwrap_err();

        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[test]
    fn product_namespace_uses_configured_prefix() {
        let api = FolioApi::new(Arc::new(ScriptedTransport::new()), CancellationToken::new());
        let session = AccountSession {
            account_id: AccountId::new("u").unwrap(),
            magazine: edge(),
            product_prefix: "com.vendor".into(),
            api,
        };
        assert_eq!(session.product_namespace(), "com.vendor.edgemagazine");
    }
}
