//! # Crosscore Node
//!
//! Demonstration entry point for the cross-core runtime.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (from env)
//! 2. Initialize logging
//! 3. Initialize the runtime and start the monitor
//! 4. Run one request per correlation mode
//! 5. Pump deferred callbacks until every async request resolved
//! 6. Shut down and report

use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use shared_types::{CoreError, Payload};
use xc_core::{
    CallbackRegistry, CoreClient, CoreConfig, CrossCore, ShutdownOutcome, DEFAULT_SHUTDOWN_TIMEOUT,
};
use xc_telemetry::{core_span, init_telemetry, TelemetryConfig};

/// How long to pump deferred callbacks before giving up.
const CALLBACK_DEADLINE: Duration = Duration::from_secs(5);
const CALLBACK_PUMP_INTERVAL: Duration = Duration::from_millis(10);

fn load_config() -> Result<CoreConfig> {
    let config = CoreConfig::from_env();
    config.validate().context("invalid runtime configuration")?;
    Ok(config)
}

fn run_blocking(core: &CrossCore) -> Result<()> {
    let _span = core_span!("blocking").entered();
    let client = CoreClient::new(core);

    let echoed = client.echo(b"ping").context("echo failed")?;
    info!(payload = %hex::encode(&echoed.as_bytes()[..4]), "Echo returned");

    let sum = client.add(40, 2).context("add failed")?;
    info!(sum, "Add returned");

    match client.with_timeout(50).delay(500) {
        Err(err) if err.is_timeout() => info!("Long delay timed out as expected"),
        Err(err) => return Err(err).context("delay failed"),
        Ok(()) => warn!("Long delay unexpectedly completed"),
    }

    let status = CoreClient::new(core).status().context("status failed")?;
    info!(
        processed = status.commands_processed,
        failed = status.commands_failed,
        uptime_ms = status.uptime.as_millis() as u64,
        "Worker status"
    );
    Ok(())
}

fn run_callbacks(core: &CrossCore) -> Result<()> {
    let _span = core_span!("callback").entered();
    let client = CoreClient::new(core);
    let mut registry = CallbackRegistry::new();
    let (tx, rx) = mpsc::channel::<(i32, Result<Payload, CoreError>)>();

    for i in 0..4 {
        let tx = tx.clone();
        let handle = registry.register(move |result| {
            let _ = tx.send((i, result));
        });
        if let Err(err) = client.add_async(i, i * 10, handle) {
            registry.remove(handle);
            return Err(err).context("async submission failed");
        }
    }
    drop(tx);

    let started = Instant::now();
    while !registry.is_empty() {
        if started.elapsed() > CALLBACK_DEADLINE {
            bail!("{} callbacks still outstanding", registry.len());
        }
        core.drain_into(&mut registry);
        std::thread::sleep(CALLBACK_PUMP_INTERVAL);
    }

    for (i, result) in rx.try_iter() {
        let value = result.context("async add failed")?.read_i32(0);
        info!(input = i, value, "Callback resolved");
    }
    Ok(())
}

fn run_event(core: &CrossCore) -> Result<()> {
    let _span = core_span!("event").entered();
    let event = CoreClient::new(core).add_event(-7, 10).context("event submission failed")?;
    let payload = event
        .get_result(Duration::from_secs(2))
        .context("event did not resolve")?;
    info!(sequence = event.sequence(), value = payload.read_i32(0), "Event resolved");
    Ok(())
}

fn main() -> Result<()> {
    let config = load_config()?;
    let logs = init_telemetry(TelemetryConfig::from_env()).context("logging setup failed")?;

    info!("===========================================");
    info!("  Crosscore Node v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");
    info!(
        config = %serde_json::to_string(&config).context("config serialization failed")?,
        "Effective configuration"
    );

    let core = CrossCore::new(config);
    core.init().context("runtime init failed")?;
    core.start_monitoring().context("monitor start failed")?;

    let result = run_blocking(&core)
        .and_then(|()| run_callbacks(&core))
        .and_then(|()| run_event(&core));

    // Quieten the drain chatter during teardown.
    if let Err(err) = logs.set_level("warn") {
        warn!(error = %err, "Could not change log level");
    }

    let metrics = core.metrics();
    match core.shutdown(DEFAULT_SHUTDOWN_TIMEOUT, false) {
        ShutdownOutcome::Completed(report) => {
            println!(
                "shutdown in {:?}: {} submitted, {} resolved, {} timeouts, {} orphans",
                report.elapsed,
                metrics.commands_submitted,
                metrics.responses_resolved,
                metrics.timeouts,
                metrics.orphans_discarded
            );
        }
        other => warn!(outcome = ?other, "Unexpected shutdown outcome"),
    }

    result
}
