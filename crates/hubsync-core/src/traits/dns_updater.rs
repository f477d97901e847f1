// # DNS Updater Trait
//
// Defines the interface for pushing a new IP to a dynamic-DNS provider.
//
// ## Implementations
//
// - NO-IP: `hubsync-provider-noip` crate
// - Future: DuckDNS, Dynu, other `nic/update`-style APIs
//
// ## Boundaries
//
// Updaters are single-shot: one authenticated API call per invocation,
// success or a typed error back. Retry, change detection and the recording
// of the confirmed IP are all owned by `PollOrchestrator` - an updater that
// retried internally would skew the orchestrator's attempt accounting, and
// one that cached "last pushed IP" would fight the orchestrator's
// observation record.

use async_trait::async_trait;

use super::gateway::WanIp;

/// A parsed provider acknowledgement.
///
/// The provider answers in plaintext, a status token followed by the IP it
/// now has on record (e.g. `good 203.0.113.7`). The confirmed IP - not the
/// candidate that was submitted - is what the orchestrator records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateAck {
    /// Provider status token (e.g. `good`, `nochg`)
    pub status: String,

    /// The IP the provider confirmed it holds for the hostname
    pub confirmed_ip: WanIp,
}

/// Trait for dynamic-DNS updater implementations
#[async_trait]
pub trait DnsUpdater: Send + Sync {
    /// Push `ip` as the new address for `hostname`.
    ///
    /// Performs one authenticated HTTP call against the provider's update
    /// endpoint and parses the plaintext acknowledgement.
    ///
    /// # Errors
    ///
    /// `Error::Api` on transport failure, non-success status, a rejection
    /// token in the body, or a body the acknowledgement cannot be parsed
    /// from.
    async fn update(&self, hostname: &str, ip: &WanIp) -> Result<UpdateAck, crate::Error>;

    /// Provider name for logging/debugging
    fn provider_name(&self) -> &'static str;
}
