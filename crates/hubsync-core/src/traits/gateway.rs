// # Gateway Trait
//
// Defines the gateway-facing half of the pipeline: establishing a login
// session, fetching the status page, and extracting the WAN IP from it.
//
// ## Implementations
//
// - Virgin SuperHub: `hubsync-gateway-superhub` crate
// - Future: other gateways without a native dynamic-DNS client
//
// ## Boundaries
//
// Gateway implementations execute exactly one network round-trip per method
// call and report failures as typed errors. They must NOT:
//
// - retry or back off (owned by `PollOrchestrator`)
// - cache sessions or WAN IPs across cycles (a cycle always re-authenticates)
// - decide whether a DNS update is needed (owned by `PollOrchestrator`)
//
// If an implementation retries internally, the orchestrator's retry budget
// stops meaning anything and the single-active-cycle timing guarantees break.

use async_trait::async_trait;
use std::fmt;

/// Proof that a login round-trip succeeded within the current cycle.
///
/// The session carries no credentials itself: gateways keep the actual
/// cookie or token on their HTTP client, and this artifact only gates the
/// status-page fetch so it cannot run before authentication. It is discarded
/// when the cycle ends and never reused - the next cycle logs in again.
#[derive(Debug)]
#[non_exhaustive]
pub struct Session {}

impl Session {
    /// Construct the session artifact.
    ///
    /// Public for `Gateway` implementations and test doubles; pipeline code
    /// only ever receives one from [`Gateway::authenticate`].
    pub fn established() -> Self {
        Self {}
    }
}

/// A fetched copy of the gateway's device/connection status page.
#[derive(Debug, Clone)]
pub struct StatusPage {
    html: String,
}

impl StatusPage {
    /// Wrap a fetched HTML document
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    /// The raw HTML text
    pub fn html(&self) -> &str {
        &self.html
    }
}

/// A WAN IP as reported by the gateway's status page.
///
/// The gateway reports text and the provider echoes text back, so the value
/// stays a string end to end; comparison happens on the trimmed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WanIp(String);

impl WanIp {
    /// Build from reported text, trimming surrounding whitespace
    pub fn new(text: impl AsRef<str>) -> Self {
        Self(text.as_ref().trim().to_string())
    }

    /// The trimmed IP text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WanIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trait for gateway implementations
///
/// The three methods are the three gateway-facing pipeline stages, called in
/// this order within a cycle. Each consumes the previous stage's output, so
/// a failed stage structurally prevents the later ones from running.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Establish an authenticated session with the gateway.
    ///
    /// # Errors
    ///
    /// - `Error::Network`: login page unreachable or non-success status
    /// - `Error::Parse`: the login form's password input cannot be located
    /// - `Error::Auth`: the gateway rejected the submitted credentials
    async fn authenticate(&self) -> Result<Session, crate::Error>;

    /// Fetch the device/connection status page.
    ///
    /// A single GET; `Error::Network` on transport failure or non-success
    /// status. No retries at this layer.
    async fn fetch_status_page(&self, session: &Session) -> Result<StatusPage, crate::Error>;

    /// Extract the WAN IP from a fetched status page.
    ///
    /// Pure transform: no side effects, no network access, testable against
    /// static HTML fixtures. `Error::Parse` when the expected location
    /// yields no content.
    fn extract_wan_ip(&self, page: &StatusPage) -> Result<WanIp, crate::Error>;

    /// Gateway name for logging/debugging
    fn gateway_name(&self) -> &'static str;
}
