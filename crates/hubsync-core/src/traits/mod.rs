//! Core traits for the hubsync pipeline
//!
//! This module defines the abstract interfaces the orchestrator drives:
//!
//! - [`Gateway`]: authenticate against the router and scrape the WAN IP
//! - [`DnsUpdater`]: push a confirmed IP to the dynamic-DNS provider

pub mod dns_updater;
pub mod gateway;

pub use dns_updater::{DnsUpdater, UpdateAck};
pub use gateway::{Gateway, Session, StatusPage, WanIp};
