// # NO-IP DNS Updater
//
// Pushes a WAN IP to the NO-IP `nic/update` API.
//
// One authenticated GET per call:
//
// ```http
// GET /nic/update?hostname=<host>&myip=<ip>
// Authorization: Basic <username:password>
// ```
//
// The response body is plaintext: a status token and, for acknowledged
// updates, the IP the provider now has on record, e.g. `good 203.0.113.7`.
// `good` and `nochg` acknowledge the update; every other token (`badauth`,
// `nohost`, `abuse`, ...) is a rejection.
//
// ## Boundaries
//
// Single-shot per call: no retry, no backoff, no change detection - the
// orchestrator owns all of that and calls this at most once per cycle.
//
// ## Security
//
// The account password never appears in logs; the Debug implementation
// redacts it.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use hubsync_core::traits::{DnsUpdater, UpdateAck, WanIp};
use hubsync_core::{Error, Result};

/// Public NO-IP update endpoint
const DEFAULT_ENDPOINT: &str = "http://dynupdate.no-ip.com";

/// Status tokens that acknowledge the update and carry a confirmed IP
const ACK_STATUSES: &[&str] = &["good", "nochg"];

/// NO-IP dynamic-DNS updater
pub struct NoIpUpdater {
    /// Update endpoint base URL
    endpoint: String,

    /// Provider account username
    username: String,

    /// Provider account password; never logged
    password: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl std::fmt::Debug for NoIpUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoIpUpdater")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

impl NoIpUpdater {
    /// Create an updater against the public NO-IP endpoint
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT, username, password, timeout)
    }

    /// Create an updater against a different endpoint
    ///
    /// For tests and self-hosted `nic/update`-compatible services.
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let username = username.into();
        let password = password.into();
        if username.is_empty() {
            return Err(Error::config("DNS provider username cannot be empty"));
        }
        if password.is_empty() {
            return Err(Error::config("DNS provider password cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            username,
            password,
            client,
        })
    }
}

#[async_trait]
impl DnsUpdater for NoIpUpdater {
    async fn update(&self, hostname: &str, ip: &WanIp) -> Result<UpdateAck> {
        let url = format!("{}/nic/update", self.endpoint);
        debug!(hostname, ip = %ip, "calling DNS update endpoint");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .query(&[("hostname", hostname), ("myip", ip.as_str())])
            .send()
            .await
            .map_err(|e| Error::api(format!("update request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::api(format!(
                "update endpoint returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::api(format!("failed to read update response: {e}")))?;

        let ack = parse_ack(&body)?;
        info!(status = %ack.status, confirmed_ip = %ack.confirmed_ip, "provider acknowledged update");
        Ok(ack)
    }

    fn provider_name(&self) -> &'static str {
        "no-ip"
    }
}

/// Parse the plaintext acknowledgement body.
///
/// `good <ip>` and `nochg <ip>` acknowledge; anything else rejects. A body
/// without the confirmed-IP token is malformed and rejected as well.
fn parse_ack(body: &str) -> Result<UpdateAck> {
    let mut tokens = body.split_whitespace();

    let status = tokens
        .next()
        .ok_or_else(|| Error::api("empty update response"))?;

    if !ACK_STATUSES.contains(&status) {
        return Err(Error::api(format!("update rejected: {}", body.trim())));
    }

    let confirmed = tokens.next().ok_or_else(|| {
        Error::api(format!(
            "acknowledgement without confirmed IP: {}",
            body.trim()
        ))
    })?;

    Ok(UpdateAck {
        status: status.to_string(),
        confirmed_ip: WanIp::new(confirmed),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn good_response_carries_the_confirmed_ip() {
        let ack = parse_ack("good 203.0.113.7").unwrap();
        assert_eq!(ack.status, "good");
        assert_eq!(ack.confirmed_ip.as_str(), "203.0.113.7");
    }

    #[test]
    fn nochg_is_an_acknowledgement_too() {
        let ack = parse_ack("nochg 203.0.113.7").unwrap();
        assert_eq!(ack.status, "nochg");
        assert_eq!(ack.confirmed_ip.as_str(), "203.0.113.7");
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        let ack = parse_ack("\n good   203.0.113.7 \r\n").unwrap();
        assert_eq!(ack.confirmed_ip.as_str(), "203.0.113.7");
    }

    #[test]
    fn rejection_tokens_are_api_errors() {
        for body in ["badauth", "nohost", "abuse", "911"] {
            let err = parse_ack(body).unwrap_err();
            assert!(matches!(err, Error::Api(_)), "{body}: got {err:?}");
        }
    }

    #[test]
    fn empty_body_is_an_api_error() {
        assert!(matches!(parse_ack(""), Err(Error::Api(_))));
        assert!(matches!(parse_ack("   \n"), Err(Error::Api(_))));
    }

    #[test]
    fn acknowledgement_without_ip_is_an_api_error() {
        let err = parse_ack("good").unwrap_err();
        assert!(matches!(err, Error::Api(_)), "got {err:?}");
    }

    #[test]
    fn missing_credentials_are_rejected_at_construction() {
        let timeout = Duration::from_secs(30);
        assert!(matches!(
            NoIpUpdater::new("", "pw", timeout),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            NoIpUpdater::new("me@mail.com", "", timeout),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn endpoint_trailing_slash_is_normalized() {
        let updater = NoIpUpdater::with_endpoint(
            "http://dynupdate.example.net/",
            "me@mail.com",
            "pw",
            Duration::from_secs(30),
        )
        .expect("updater builds");
        assert_eq!(updater.endpoint, "http://dynupdate.example.net");
    }

    #[test]
    fn password_not_exposed_in_debug() {
        let updater = NoIpUpdater::new("me@mail.com", "super-secret-pw", Duration::from_secs(30))
            .expect("updater builds");

        let debug_str = format!("{updater:?}");
        assert!(!debug_str.contains("super-secret-pw"));
        assert!(debug_str.contains("NoIpUpdater"));
    }

    #[test]
    fn provider_name_is_stable() {
        let updater = NoIpUpdater::new("me@mail.com", "pw", Duration::from_secs(30))
            .expect("updater builds");
        assert_eq!(updater.provider_name(), "no-ip");
    }
}
