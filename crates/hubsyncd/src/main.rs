// # hubsyncd - Hubsync Daemon
//
// Thin integration layer over hubsync-core:
//
// 1. Resolve configuration (flags > environment > config file > defaults)
// 2. Fail fast on missing credentials, before the scheduler starts
// 3. Initialize tracing and the runtime
// 4. Build the gateway and provider and run the poll orchestrator
//
// ## Configuration
//
// Command-line flags mirror the config file keys:
//
// - `--router-address`   Gateway web interface address (default: 192.168.0.1)
// - `--router-password`  Gateway admin password (required)
// - `--hostname`         Hostname registered with the DNS provider (required)
// - `--username`         DNS provider account username (required)
// - `--password`         DNS provider account password (required)
// - `-r, --retry`        Retry failed cycles (default: off)
// - `--max-retries`      Extra attempts per cycle (default: 5)
// - `--retry-delay`      Seconds between attempts (default: 5)
// - `--poll-interval`    Minutes between WAN IP checks (default: 5)
// - `--http-timeout`     Seconds before a request counts as failed (default: 30)
// - `--config`           Explicit configuration file (JSON or TOML)
// - `--log-level`        trace, debug, info, warn, error (default: info)
//
// Secrets may come from the environment instead of flags:
// `HUBSYNC_ROUTER_PASSWORD`, `HUBSYNC_DNS_USERNAME`, `HUBSYNC_DNS_PASSWORD`
// (and `HUBSYNC_LOG_LEVEL`).
//
// Without `--config`, `hubsync.json` and then `hubsync.toml` are probed in
// the working directory. Example `hubsync.toml`:
//
// ```toml
// router-password = "MyPa$$435"
// hostname = "myhost.ddns.net"
// username = "me@mail.com"
// password = "secret"
// retry = true
// poll-interval = 1
// ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use hubsync_core::{PollOrchestrator, SyncConfig};
use hubsync_gateway_superhub::SuperHubGateway;
use hubsync_provider_noip::NoIpUpdater;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DaemonExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Keep a dynamic-DNS host record pointed at the WAN IP a home gateway
/// reports on its web management interface.
#[derive(Debug, Parser)]
#[command(name = "hubsyncd", version)]
struct Cli {
    /// Address of the gateway's web interface
    #[arg(long)]
    router_address: Option<String>,

    /// Admin password for the gateway's web interface
    #[arg(long)]
    router_password: Option<String>,

    /// Hostname registered with the DNS provider
    #[arg(long)]
    hostname: Option<String>,

    /// DNS provider account username
    #[arg(long)]
    username: Option<String>,

    /// DNS provider account password
    #[arg(long)]
    password: Option<String>,

    /// Retry failed cycles
    #[arg(short = 'r', long)]
    retry: bool,

    /// Extra pipeline attempts per cycle after the initial one
    #[arg(long)]
    max_retries: Option<u32>,

    /// Seconds to wait between attempts
    #[arg(long)]
    retry_delay: Option<u64>,

    /// Minutes between WAN IP checks
    #[arg(long)]
    poll_interval: Option<u64>,

    /// Seconds before a gateway/provider request counts as failed
    #[arg(long)]
    http_timeout: Option<u64>,

    /// Configuration file (JSON or TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(long)]
    log_level: Option<String>,
}

/// Keys a configuration file may set. Flags and environment beat these.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct FileConfig {
    router_address: Option<String>,
    router_password: Option<String>,
    hostname: Option<String>,
    username: Option<String>,
    password: Option<String>,
    retry: Option<bool>,
    max_retries: Option<u32>,
    retry_delay: Option<u64>,
    poll_interval: Option<u64>,
    http_timeout: Option<u64>,
    log_level: Option<String>,
}

/// Config files probed, in order, when `--config` is not given
const CONFIG_CANDIDATES: &[&str] = &["hubsync.json", "hubsync.toml"];

/// Load the config file, if there is one.
///
/// An explicit `--config` path must exist; without one, the first probe hit
/// wins and no file at all is fine.
fn load_file_config(explicit: Option<&Path>) -> Result<FileConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("config file not found: {}", path.display());
            }
            path.to_path_buf()
        }
        None => {
            match CONFIG_CANDIDATES
                .iter()
                .map(Path::new)
                .find(|candidate| candidate.exists())
            {
                Some(found) => found.to_path_buf(),
                None => return Ok(FileConfig::default()),
            }
        }
    };

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&raw)
            .with_context(|| format!("invalid JSON in {}", path.display())),
        Some("toml") => {
            toml::from_str(&raw).with_context(|| format!("invalid TOML in {}", path.display()))
        }
        _ => bail!(
            "unsupported config file extension: {} (expected .json or .toml)",
            path.display()
        ),
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

/// Merge flags, environment and file config onto the defaults.
///
/// Precedence: CLI > environment (secrets only) > config file > default.
fn resolve_config(cli: &Cli, file: FileConfig) -> SyncConfig {
    let mut config = SyncConfig::default();

    if let Some(address) = cli.router_address.clone().or(file.router_address) {
        config.gateway.address = address;
    }
    if let Some(password) = cli
        .router_password
        .clone()
        .or_else(|| env_var("HUBSYNC_ROUTER_PASSWORD"))
        .or(file.router_password)
    {
        config.gateway.password = password;
    }

    if let Some(hostname) = cli.hostname.clone().or(file.hostname) {
        config.provider.hostname = hostname;
    }
    if let Some(username) = cli
        .username
        .clone()
        .or_else(|| env_var("HUBSYNC_DNS_USERNAME"))
        .or(file.username)
    {
        config.provider.username = username;
    }
    if let Some(password) = cli
        .password
        .clone()
        .or_else(|| env_var("HUBSYNC_DNS_PASSWORD"))
        .or(file.password)
    {
        config.provider.password = password;
    }

    config.retry.enabled = cli.retry || file.retry.unwrap_or(false);
    if let Some(max_retries) = cli.max_retries.or(file.max_retries) {
        config.retry.max_retries = max_retries;
    }
    if let Some(delay) = cli.retry_delay.or(file.retry_delay) {
        config.retry.retry_delay_secs = delay;
    }

    if let Some(interval) = cli.poll_interval.or(file.poll_interval) {
        config.poll_interval_mins = interval;
    }
    if let Some(timeout) = cli.http_timeout.or(file.http_timeout) {
        config.http_timeout_secs = timeout;
    }

    config
}

fn parse_level(level: &str) -> Option<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let file = match load_file_config(cli.config.as_deref()) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Configuration error: {e:#}");
            return DaemonExitCode::ConfigError.into();
        }
    };

    let log_level = cli
        .log_level
        .clone()
        .or_else(|| env_var("HUBSYNC_LOG_LEVEL"))
        .or_else(|| file.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    let Some(level) = parse_level(&log_level) else {
        eprintln!(
            "Configuration error: '{log_level}' is not a valid log level. \
            Valid levels: trace, debug, info, warn, error"
        );
        return DaemonExitCode::ConfigError.into();
    };

    let config = resolve_config(&cli, file);

    // Fail fast: a missing credential is reported once, here, and the
    // scheduler never starts.
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {e}");
        eprintln!(
            "Required: --router-password, --hostname, --username, --password \
            (or their config-file/environment equivalents)"
        );
        return DaemonExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
        return DaemonExitCode::ConfigError.into();
    }

    info!("starting hubsyncd");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to create tokio runtime: {e}");
            return DaemonExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("daemon error: {e:#}");
            DaemonExitCode::RuntimeError
        } else {
            DaemonExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Build the collaborators and run the orchestrator until shutdown
async fn run_daemon(config: SyncConfig) -> Result<()> {
    let timeout = config.http_timeout();

    let gateway = SuperHubGateway::new(
        &config.gateway.address,
        config.gateway.password.clone(),
        timeout,
    )?;

    let updater = match &config.provider.endpoint {
        Some(endpoint) => NoIpUpdater::with_endpoint(
            endpoint.as_str(),
            config.provider.username.clone(),
            config.provider.password.clone(),
            timeout,
        )?,
        None => NoIpUpdater::new(
            config.provider.username.clone(),
            config.provider.password.clone(),
            timeout,
        )?,
    };

    info!(
        gateway = %config.gateway.address,
        hostname = %config.provider.hostname,
        poll_interval_mins = config.poll_interval_mins,
        retry = config.retry.enabled,
        "managing dynamic DNS record"
    );

    let (orchestrator, mut events) =
        PollOrchestrator::new(Box::new(gateway), Box::new(updater), config)?;

    // Drain monitoring events into the log so the bounded channel never
    // fills up and starts dropping.
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            tracing::debug!(?event, "cycle event");
        }
    });

    orchestrator.run().await?;

    info!("hubsyncd stopped");
    Ok(())
}
