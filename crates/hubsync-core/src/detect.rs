//! Change detection against the last confirmed WAN IP
//!
//! The observation is the only value that survives from one cycle to the
//! next. It is written exclusively by the orchestrator, and only after the
//! provider has acknowledged an update - never speculatively from a scraped
//! candidate.

use chrono::{DateTime, Utc};

use crate::traits::WanIp;

/// The last WAN IP the DNS provider confirmed, with the moment it was
/// confirmed. Lives for the process lifetime only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WanIpObservation {
    /// The confirmed IP, taken from the provider acknowledgement
    pub ip: WanIp,

    /// When the acknowledgement arrived
    pub confirmed_at: DateTime<Utc>,
}

impl WanIpObservation {
    /// Record a freshly acknowledged IP
    pub fn confirmed_now(ip: WanIp) -> Self {
        Self {
            ip,
            confirmed_at: Utc::now(),
        }
    }
}

/// Whether `candidate` differs from the last confirmed observation.
///
/// Equality is on the trimmed string value (`WanIp` trims on construction).
/// No observation yet means every candidate counts as changed.
pub fn has_changed(candidate: &WanIp, last: Option<&WanIpObservation>) -> bool {
    match last {
        Some(observation) => observation.ip != *candidate,
        None => true,
    }
}
