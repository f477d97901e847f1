// # SuperHub Gateway
//
// Scrapes the WAN IP out of a Virgin SuperHub's web management interface.
//
// The SuperHub exposes no API, so the daemon logs in the way a browser
// does and reads the WAN IP off the device connection status page.
//
// ## Login flow
//
// The login form's password field has no stable `name` attribute - the
// firmware generates it - so every cycle fetches `/VmLogin.html`, locates
// the input carrying the `password` identifier, and posts the admin password
// under whatever name that input currently declares to `/cgi-bin/VmLoginCgi`.
// The session cookie set by the login response lives on this client's cookie
// store and is carried implicitly by the status page request in the same
// cycle. Sessions are never reused across cycles.
//
// ## Boundaries
//
// No retries here: a failed step is reported as its typed error
// (`Network` / `Parse` / `Auth`) and the orchestrator decides whether the
// whole pipeline re-runs.

mod parse;

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use hubsync_core::traits::{Gateway, Session, StatusPage, WanIp};
use hubsync_core::{Error, Result};

/// Login page carrying the password form field
const LOGIN_PAGE_PATH: &str = "VmLogin.html";

/// CGI endpoint the login form posts to
const LOGIN_SUBMIT_PATH: &str = "cgi-bin/VmLoginCgi";

/// Post-login status page carrying the WAN IP
const STATUS_PAGE_PATH: &str = "device_connection_status.html";

/// Virgin SuperHub gateway
///
/// # Security
///
/// The Debug implementation intentionally does not expose the admin
/// password.
pub struct SuperHubGateway {
    /// `http://{address}` base for every request
    base_url: String,

    /// Gateway admin password; never logged
    password: String,

    /// HTTP client; cookie store enabled so the login session carries over
    /// to the status page request within a cycle
    client: reqwest::Client,
}

impl std::fmt::Debug for SuperHubGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuperHubGateway")
            .field("base_url", &self.base_url)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

impl SuperHubGateway {
    /// Create a new SuperHub gateway
    ///
    /// # Parameters
    ///
    /// - `address`: address of the gateway's web interface (e.g. `192.168.0.1`)
    /// - `password`: admin password for the web interface
    /// - `timeout`: per-request HTTP timeout; a hung gateway surfaces as a
    ///   `Network` error instead of stalling the cycle forever
    pub fn new(
        address: &str,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let password = password.into();
        if password.is_empty() {
            return Err(Error::config("gateway admin password cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: format!("http://{address}"),
            password,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn fetch_login_page(&self) -> Result<String> {
        let response = self
            .client
            .get(self.url(LOGIN_PAGE_PATH))
            .send()
            .await
            .map_err(|e| Error::network(format!("login page request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::network(format!(
                "login page returned {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| Error::network(format!("failed to read login page: {e}")))
    }

    async fn submit_login(&self, field_name: &str) -> Result<()> {
        let form = [(field_name, self.password.as_str())];

        let response = self
            .client
            .post(self.url(LOGIN_SUBMIT_PATH))
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::auth(format!("login submission failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::auth(format!(
                "gateway rejected login with {}",
                response.status()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl Gateway for SuperHubGateway {
    async fn authenticate(&self) -> Result<Session> {
        let page = self.fetch_login_page().await?;
        let field_name = parse::password_field_name(&page)?;
        debug!(field = %field_name, "discovered password form field");

        self.submit_login(&field_name).await?;
        debug!("gateway accepted login");

        Ok(Session::established())
    }

    async fn fetch_status_page(&self, _session: &Session) -> Result<StatusPage> {
        let response = self
            .client
            .get(self.url(STATUS_PAGE_PATH))
            .send()
            .await
            .map_err(|e| Error::network(format!("status page request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::network(format!(
                "status page returned {}",
                response.status()
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| Error::network(format!("failed to read status page: {e}")))?;

        Ok(StatusPage::new(html))
    }

    fn extract_wan_ip(&self, page: &StatusPage) -> Result<WanIp> {
        parse::wan_ip(page.html())
    }

    fn gateway_name(&self) -> &'static str {
        "superhub"
    }
}
