//! Test doubles and common utilities for orchestrator contract tests
//!
//! The doubles verify orchestration constraints without any real network:
//! a scripted gateway that reports a fixed WAN IP and can fail a chosen
//! pipeline step, a blocking gateway for concurrency tests, and a counting
//! updater with a failure budget.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use hubsync_core::config::{RetryPolicy, SyncConfig};
use hubsync_core::error::Result;
use hubsync_core::traits::{DnsUpdater, Gateway, Session, StatusPage, UpdateAck, WanIp};
use hubsync_core::Error;

/// Which pipeline step a scripted failure lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailStep {
    None,
    Authenticate,
    FetchStatus,
    Extract,
}

/// A gateway double that reports a controllable WAN IP and can fail a
/// chosen step, counting every call
pub struct ScriptedGateway {
    wan_ip: Arc<Mutex<String>>,
    fail_step: Arc<Mutex<FailStep>>,
    auth_calls: Arc<AtomicUsize>,
    fetch_calls: Arc<AtomicUsize>,
    extract_calls: Arc<AtomicUsize>,
}

impl ScriptedGateway {
    pub fn new(wan_ip: &str) -> Self {
        Self {
            wan_ip: Arc::new(Mutex::new(wan_ip.to_string())),
            fail_step: Arc::new(Mutex::new(FailStep::None)),
            auth_calls: Arc::new(AtomicUsize::new(0)),
            fetch_calls: Arc::new(AtomicUsize::new(0)),
            extract_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a handle that shares state with an existing double
    ///
    /// The orchestrator takes the double by value, so tests keep one of
    /// these to steer it and read the counters afterwards.
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            wan_ip: Arc::clone(&other.wan_ip),
            fail_step: Arc::clone(&other.fail_step),
            auth_calls: Arc::clone(&other.auth_calls),
            fetch_calls: Arc::clone(&other.fetch_calls),
            extract_calls: Arc::clone(&other.extract_calls),
        }
    }

    /// Change the WAN IP the gateway reports from now on
    pub fn set_wan_ip(&self, ip: &str) {
        *self.wan_ip.lock().unwrap() = ip.to_string();
    }

    /// Make the given step fail from now on (`FailStep::None` to recover)
    pub fn fail_at(&self, step: FailStep) {
        *self.fail_step.lock().unwrap() = step;
    }

    pub fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn extract_calls(&self) -> usize {
        self.extract_calls.load(Ordering::SeqCst)
    }

    fn failing_at(&self, step: FailStep) -> bool {
        *self.fail_step.lock().unwrap() == step
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn authenticate(&self) -> Result<Session> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_at(FailStep::Authenticate) {
            return Err(Error::network("gateway unreachable"));
        }
        Ok(Session::established())
    }

    async fn fetch_status_page(&self, _session: &Session) -> Result<StatusPage> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_at(FailStep::FetchStatus) {
            return Err(Error::network("status page unreachable"));
        }
        let ip = self.wan_ip.lock().unwrap().clone();
        Ok(StatusPage::new(format!(
            "<div id=\"superHubVersion\"><div><span>{ip}</span></div></div>"
        )))
    }

    fn extract_wan_ip(&self, _page: &StatusPage) -> Result<WanIp> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_at(FailStep::Extract) {
            return Err(Error::parse("WAN IP element missing"));
        }
        Ok(WanIp::new(self.wan_ip.lock().unwrap().as_str()))
    }

    fn gateway_name(&self) -> &'static str {
        "scripted"
    }
}

/// A gateway double whose authenticate parks until released, for the
/// mutual-exclusion contract
pub struct BlockingGateway {
    wan_ip: String,
    release: Arc<Notify>,
    auth_calls: Arc<AtomicUsize>,
}

impl BlockingGateway {
    /// Returns the double plus the release handle and the authenticate
    /// call counter
    pub fn new(wan_ip: &str) -> (Self, Arc<Notify>, Arc<AtomicUsize>) {
        let release = Arc::new(Notify::new());
        let auth_calls = Arc::new(AtomicUsize::new(0));

        let gateway = Self {
            wan_ip: wan_ip.to_string(),
            release: Arc::clone(&release),
            auth_calls: Arc::clone(&auth_calls),
        };

        (gateway, release, auth_calls)
    }
}

#[async_trait]
impl Gateway for BlockingGateway {
    async fn authenticate(&self) -> Result<Session> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        // Parks the cycle mid-stage; notify_one releases one login
        self.release.notified().await;
        Ok(Session::established())
    }

    async fn fetch_status_page(&self, _session: &Session) -> Result<StatusPage> {
        Ok(StatusPage::new(format!(
            "<div id=\"superHubVersion\"><div><span>{}</span></div></div>",
            self.wan_ip
        )))
    }

    fn extract_wan_ip(&self, _page: &StatusPage) -> Result<WanIp> {
        Ok(WanIp::new(&self.wan_ip))
    }

    fn gateway_name(&self) -> &'static str {
        "blocking"
    }
}

/// An updater double that acknowledges with the submitted IP, optionally
/// failing the first N calls or acknowledging a fixed IP instead
pub struct MockUpdater {
    update_calls: Arc<AtomicUsize>,
    fail_remaining: Arc<AtomicUsize>,
    ack_ip: Arc<Mutex<Option<String>>>,
    hostnames: Arc<Mutex<Vec<String>>>,
}

impl MockUpdater {
    pub fn new() -> Self {
        Self {
            update_calls: Arc::new(AtomicUsize::new(0)),
            fail_remaining: Arc::new(AtomicUsize::new(0)),
            ack_ip: Arc::new(Mutex::new(None)),
            hostnames: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fail the first `n` update calls with an API error
    pub fn failing_first(n: usize) -> Self {
        let updater = Self::new();
        updater.fail_remaining.store(n, Ordering::SeqCst);
        updater
    }

    /// Create a handle that shares counters with an existing double
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            update_calls: Arc::clone(&other.update_calls),
            fail_remaining: Arc::clone(&other.fail_remaining),
            ack_ip: Arc::clone(&other.ack_ip),
            hostnames: Arc::clone(&other.hostnames),
        }
    }

    /// Acknowledge with this IP instead of echoing the submitted one
    pub fn ack_with(&self, ip: &str) {
        *self.ack_ip.lock().unwrap() = Some(ip.to_string());
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Hostnames submitted so far
    pub fn hostnames(&self) -> Vec<String> {
        self.hostnames.lock().unwrap().clone()
    }
}

#[async_trait]
impl DnsUpdater for MockUpdater {
    async fn update(&self, hostname: &str, ip: &WanIp) -> Result<UpdateAck> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_remaining.load(Ordering::SeqCst) > 0 {
            self.fail_remaining.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::api("provider unavailable"));
        }

        self.hostnames.lock().unwrap().push(hostname.to_string());

        let confirmed = match self.ack_ip.lock().unwrap().as_deref() {
            Some(fixed) => WanIp::new(fixed),
            None => ip.clone(),
        };

        Ok(UpdateAck {
            status: "good".to_string(),
            confirmed_ip: confirmed,
        })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to create a minimal SyncConfig for testing
///
/// Retries enabled with a zero delay so retry tests run fast; individual
/// tests override the policy as needed.
pub fn minimal_config(hostname: &str) -> SyncConfig {
    let mut config = SyncConfig::default();
    config.gateway.password = "hub-admin".to_string();
    config.provider.hostname = hostname.to_string();
    config.provider.username = "me@mail.com".to_string();
    config.provider.password = "secret".to_string();
    config.retry = RetryPolicy {
        enabled: true,
        max_retries: 3,
        retry_delay_secs: 0,
    };
    config
}
