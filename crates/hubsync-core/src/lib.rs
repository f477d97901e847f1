// # hubsync-core
//
// Core library for the hubsync gateway-to-DNS synchronizer.
//
// ## Architecture Overview
//
// The pipeline keeps a dynamic-DNS host record pointed at the WAN IP a home
// gateway reports on its web management interface:
//
// - **Gateway**: trait for authenticating against the gateway and scraping
//   the WAN IP off its status page
// - **DnsUpdater**: trait for pushing a confirmed IP to the provider's
//   update API
// - **PollOrchestrator**: drives authenticate → scrape → detect → update as
//   an explicit state machine, owns retry state and the last confirmed IP,
//   and runs the fixed-interval scheduler
//
// ## Design Principles
//
// 1. **Orchestrator-owned coordination**: collaborators are single-shot;
//    retry, scheduling and change detection live in one place
// 2. **One cycle at a time**: triggers are dropped while a cycle is active,
//    never queued behind it
// 3. **Confirm before recording**: the last-known IP is only ever
//    overwritten with a value the provider acknowledged
// 4. **Library-first**: the daemon is a thin shell over this crate

pub mod config;
pub mod detect;
pub mod error;
pub mod orchestrator;
pub mod traits;

// Re-export core types for convenience
pub use config::{EngineConfig, GatewayConfig, ProviderConfig, RetryPolicy, SyncConfig};
pub use detect::WanIpObservation;
pub use error::{Error, Result};
pub use orchestrator::{CycleEvent, CycleOutcome, CycleStage, PollOrchestrator};
pub use traits::{DnsUpdater, Gateway, Session, StatusPage, UpdateAck, WanIp};
