//! Poll orchestrator
//!
//! The PollOrchestrator sequences one pipeline run (a "cycle"):
//!
//! ```text
//! Idle → Authenticating → Scraping → Detecting → Updating → Idle
//!                                        │
//!                                        └→ Idle (no change, update skipped)
//!
//! any stage ── failure ──→ Retrying ──→ Authenticating (budget left)
//!                                  └──→ Idle            (budget spent)
//! ```
//!
//! `Retrying` restarts the cycle from `Authenticating` - the whole pipeline
//! re-runs, not just the failed stage, because the gateway session is not
//! assumed to survive a failure. The attempt counter lives in a per-run
//! [`CycleState`] that is dropped when the cycle returns to idle, so an
//! exhausted budget never bleeds into the next scheduled cycle.
//!
//! ## Single active cycle
//!
//! At most one cycle runs at a time. The observation record doubles as the
//! cycle guard: [`PollOrchestrator::poll`] takes it with `try_lock`, and a
//! trigger that finds it held returns [`CycleOutcome::Skipped`] without
//! touching any pipeline step. The scheduler loop additionally skips missed
//! interval ticks instead of queueing them.

use std::time::Duration;

use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::{RetryPolicy, SyncConfig};
use crate::detect::{self, WanIpObservation};
use crate::error::Result;
use crate::traits::{DnsUpdater, Gateway, UpdateAck, WanIp};

/// Pipeline stage the active cycle is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
    /// No cycle active; the only state a trigger is accepted in
    Idle,
    /// Logging into the gateway
    Authenticating,
    /// Fetching the status page and extracting the WAN IP
    Scraping,
    /// Comparing the candidate against the last confirmed IP
    Detecting,
    /// Pushing the new IP to the DNS provider
    Updating,
    /// A stage failed; deciding whether the cycle re-runs
    Retrying,
}

/// Per-run bookkeeping: current stage plus the attempt counter.
///
/// Created fresh for every cycle and dropped at cycle completion, success or
/// not.
#[derive(Debug)]
struct CycleState {
    stage: CycleStage,
    attempt: u32,
}

impl CycleState {
    fn new() -> Self {
        Self {
            stage: CycleStage::Idle,
            attempt: 0,
        }
    }
}

/// What a single pipeline run produced, before retry accounting
enum PipelineOutcome {
    /// Candidate matches the last confirmed IP; nothing to push
    NoChange(WanIp),
    /// The provider acknowledged the update
    Confirmed(UpdateAck),
}

/// Result of one cycle
#[derive(Debug)]
pub enum CycleOutcome {
    /// The provider acknowledged a new IP
    Updated {
        new_ip: WanIp,
        previous_ip: Option<WanIp>,
    },

    /// The WAN IP matches the last confirmed value; update suppressed
    NoChange { ip: WanIp },

    /// The retry budget is spent (or retries are disabled); the orchestrator
    /// waits for the next scheduled trigger
    Failed {
        error: crate::Error,
        /// Pipeline attempts made, including the initial one
        attempts: u32,
    },

    /// A cycle was already active; this trigger was dropped
    Skipped,
}

/// Events emitted by the orchestrator for external monitoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleEvent {
    /// Scheduler started
    Started { poll_interval_secs: u64 },

    /// A pipeline attempt began (attempt 0 is the initial run)
    CycleStarted { attempt: u32 },

    /// Cycle ended without an update; the WAN IP is unchanged
    NoChange { ip: String },

    /// The provider acknowledged the new IP
    UpdateSucceeded {
        new_ip: String,
        previous_ip: Option<String>,
    },

    /// A stage failed and the cycle will re-run after the delay
    RetryScheduled {
        attempt: u32,
        max_retries: u32,
        delay_secs: u64,
    },

    /// Cycle terminated unsuccessfully
    CycleFailed {
        kind: String,
        message: String,
        attempts: u32,
    },

    /// A trigger arrived while a cycle was active and was dropped
    TriggerSkipped,

    /// Scheduler stopped
    Stopped { reason: String },
}

/// Poll orchestrator
///
/// Owns the two pieces of state that outlive a cycle - the confirmed-IP
/// observation and the event channel - and drives the gateway and updater
/// collaborators through the pipeline. Collaborators carry no retry or
/// scheduling logic of their own.
pub struct PollOrchestrator {
    /// Gateway half of the pipeline
    gateway: Box<dyn Gateway>,

    /// Provider half of the pipeline
    updater: Box<dyn DnsUpdater>,

    /// Hostname whose record gets updated
    hostname: String,

    /// Retry behavior for failed cycles
    retry: RetryPolicy,

    /// Interval between scheduled triggers
    poll_interval: Duration,

    /// Last confirmed WAN IP. Doubles as the cycle guard: held for the whole
    /// of a cycle, `try_lock` failure is how a trigger observes that a cycle
    /// is active.
    observation: Mutex<Option<WanIpObservation>>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<CycleEvent>,
}

impl PollOrchestrator {
    /// Create a new orchestrator
    ///
    /// Validates the configuration and returns the orchestrator together
    /// with the receiving end of its event channel.
    pub fn new(
        gateway: Box<dyn Gateway>,
        updater: Box<dyn DnsUpdater>,
        config: SyncConfig,
    ) -> Result<(Self, mpsc::Receiver<CycleEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);
        let poll_interval = config.poll_interval();

        let orchestrator = Self {
            gateway,
            updater,
            hostname: config.provider.hostname,
            retry: config.retry,
            poll_interval,
            observation: Mutex::new(None),
            event_tx: tx,
        };

        Ok((orchestrator, rx))
    }

    /// Run one cycle now, unless a cycle is already active.
    ///
    /// This is what the scheduler calls on every tick; it is also the entry
    /// point for embedding the orchestrator without the built-in scheduler.
    pub async fn poll(&self) -> CycleOutcome {
        let Ok(mut observation) = self.observation.try_lock() else {
            debug!("cycle already active, dropping trigger");
            self.emit(CycleEvent::TriggerSkipped);
            return CycleOutcome::Skipped;
        };

        self.run_cycle(&mut observation).await
    }

    /// The last observation the provider confirmed, if any.
    ///
    /// Monitoring/test accessor; waits if a cycle is currently active.
    pub async fn last_confirmed(&self) -> Option<WanIpObservation> {
        self.observation.lock().await.clone()
    }

    /// Run the scheduler until a shutdown signal arrives
    ///
    /// Triggers a cycle immediately, then once per poll interval. Shuts down
    /// on SIGINT (ctrl-c).
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run the scheduler with a controlled shutdown signal
    ///
    /// **TESTING ONLY**: contract tests need deterministic shutdown.
    /// Production code should use [`PollOrchestrator::run`], which shuts
    /// down on OS signals.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(&self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        self.emit(CycleEvent::Started {
            poll_interval_secs: self.poll_interval.as_secs(),
        });
        info!(
            interval_secs = self.poll_interval.as_secs(),
            hostname = %self.hostname,
            "starting poll scheduler"
        );

        // The first tick completes immediately, so one cycle runs at startup.
        // A tick that would fire while a cycle is still running is skipped,
        // not queued - together with the cycle guard this keeps cycles
        // strictly non-overlapping.
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        if let Some(mut rx) = shutdown_rx {
            // Test mode: wait for the provided shutdown signal
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let _ = self.poll().await;
                    }
                    _ = &mut rx => {
                        info!("shutdown signal received");
                        self.emit(CycleEvent::Stopped {
                            reason: "shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        } else {
            // Production mode: wait for SIGINT
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let _ = self.poll().await;
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("shutdown signal received");
                        self.emit(CycleEvent::Stopped {
                            reason: "shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Drive one cycle to completion, including its retry loop
    async fn run_cycle(&self, observation: &mut Option<WanIpObservation>) -> CycleOutcome {
        let mut cycle = CycleState::new();

        loop {
            self.emit(CycleEvent::CycleStarted {
                attempt: cycle.attempt,
            });

            match self.run_pipeline(observation.as_ref(), &mut cycle).await {
                Ok(PipelineOutcome::NoChange(ip)) => {
                    debug!(%ip, "WAN IP unchanged, nothing to update");
                    self.emit(CycleEvent::NoChange { ip: ip.to_string() });
                    return CycleOutcome::NoChange { ip };
                }

                Ok(PipelineOutcome::Confirmed(ack)) => {
                    let previous_ip = observation.take().map(|o| o.ip);
                    info!(
                        new_ip = %ack.confirmed_ip,
                        previous_ip = ?previous_ip.as_ref().map(WanIp::as_str),
                        status = %ack.status,
                        "provider acknowledged update"
                    );
                    // Recorded only now, from the acknowledgement - never
                    // speculatively from the scraped candidate.
                    *observation = Some(WanIpObservation::confirmed_now(ack.confirmed_ip.clone()));
                    self.emit(CycleEvent::UpdateSucceeded {
                        new_ip: ack.confirmed_ip.to_string(),
                        previous_ip: previous_ip.as_ref().map(ToString::to_string),
                    });
                    return CycleOutcome::Updated {
                        new_ip: ack.confirmed_ip,
                        previous_ip,
                    };
                }

                Err(err) => {
                    let failed_stage = cycle.stage;
                    cycle.stage = CycleStage::Retrying;

                    if self.retry.enabled && cycle.attempt < self.retry.max_retries {
                        cycle.attempt += 1;
                        warn!(
                            error = %err,
                            kind = err.kind(),
                            stage = ?failed_stage,
                            attempt = cycle.attempt,
                            remaining = self.retry.max_retries - cycle.attempt,
                            "cycle failed, retrying after delay"
                        );
                        self.emit(CycleEvent::RetryScheduled {
                            attempt: cycle.attempt,
                            max_retries: self.retry.max_retries,
                            delay_secs: self.retry.retry_delay_secs,
                        });
                        tokio::time::sleep(self.retry.delay()).await;
                        continue;
                    }

                    let attempts = cycle.attempt + 1;
                    error!(
                        error = %err,
                        kind = err.kind(),
                        stage = ?failed_stage,
                        attempts,
                        "cycle failed, waiting for next scheduled trigger"
                    );
                    self.emit(CycleEvent::CycleFailed {
                        kind: err.kind().to_string(),
                        message: err.to_string(),
                        attempts,
                    });
                    return CycleOutcome::Failed {
                        error: err,
                        attempts,
                    };
                }
            }
        }
    }

    /// One pass through the pipeline stages, in fixed order.
    ///
    /// Each stage consumes the previous stage's output; the first failure
    /// propagates out and short-circuits the rest.
    async fn run_pipeline(
        &self,
        last: Option<&WanIpObservation>,
        cycle: &mut CycleState,
    ) -> Result<PipelineOutcome> {
        cycle.stage = CycleStage::Authenticating;
        let session = self.gateway.authenticate().await?;
        debug!(gateway = self.gateway.gateway_name(), "session established");

        cycle.stage = CycleStage::Scraping;
        let page = self.gateway.fetch_status_page(&session).await?;
        let candidate = self.gateway.extract_wan_ip(&page)?;
        debug!(%candidate, "WAN IP extracted from status page");

        cycle.stage = CycleStage::Detecting;
        if !detect::has_changed(&candidate, last) {
            return Ok(PipelineOutcome::NoChange(candidate));
        }

        cycle.stage = CycleStage::Updating;
        let ack = self.updater.update(&self.hostname, &candidate).await?;
        Ok(PipelineOutcome::Confirmed(ack))
    }

    /// Emit a cycle event
    fn emit(&self, event: CycleEvent) {
        // Dropping beats blocking the pipeline when the consumer lags.
        if self.event_tx.try_send(event).is_err() {
            warn!("event channel full, dropping cycle event");
        }
    }
}
