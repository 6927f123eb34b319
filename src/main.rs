//! pulsebridge main entry point.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                     │
//! │                                                               │
//! │  SimDeviceLink   FileMailbox     LogEventSink   JsonFileConfig│
//! │  (DeviceLink)    (CommandSource) (EventSink)    (ConfigPort)  │
//! │                                                               │
//! │  ──────────────── Port Trait Boundary ───────────────────     │
//! │                                                               │
//! │  ┌─────────────────────────────────────────────────────────┐  │
//! │  │  Discovery ─▶ Session { Mixer ∥ CommandLoop ∥ Watch }   │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! │                                                               │
//! │  DeviceEventHub (pub/sub) · edge-executor + async-io-mini     │
//! └───────────────────────────────────────────────────────────────┘
//! ```

use anyhow::{Context, Result, bail};
use log::{info, warn};

use pulsebridge::adapters::json_config::JsonFileConfig;
use pulsebridge::adapters::log_sink::LogEventSink;
use pulsebridge::adapters::mailbox::FileMailbox;
use pulsebridge::adapters::sim_link::SimDeviceLink;
use pulsebridge::app::ports::ConfigPort;
use pulsebridge::channels::DeviceEventHub;
use pulsebridge::config::BridgeConfig;
use pulsebridge::discovery::{Discovery, announce_devices};

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("pulsebridge v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Config (or defaults) ───────────────────────────────
    let config_port = JsonFileConfig::from_env();
    let config = match config_port.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(
                "Config {} not used ({}), running with defaults",
                config_port.path().display(),
                e
            );
            BridgeConfig::default()
        }
    };

    // ── 3. Adapters ───────────────────────────────────────────
    let hub = DeviceEventHub::new();
    let link = SimDeviceLink::new(&hub);
    let mailbox = FileMailbox::new(config.resolved_mailbox_path());
    let sink = LogEventSink::new();
    let discovery = Discovery::new(&link, &mailbox, &sink, &hub, &config);

    // ── 4. Tasks ──────────────────────────────────────────────
    let executor: edge_executor::LocalExecutor<'_, 8> = edge_executor::LocalExecutor::new();
    let announcements = hub
        .subscribe()
        .context("no event hub slot for the device announcer")?;
    executor.spawn(announce_devices(announcements, &sink)).detach();

    match futures_lite::future::block_on(executor.run(discovery.run())) {
        Ok(never) => match never {},
        Err(e) => bail!("bridge stopped: {e}"),
    }
}
