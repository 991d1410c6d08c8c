//! # Crosscore Test Suite
//!
//! Threaded scenarios that run the real worker and monitor threads.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── round_trip.rs    # one request per correlation mode
//!     ├── timeouts.rs      # clamped delays, expiry, late responses
//!     ├── lifecycle.rs     # init / shutdown / re-init, draining
//!     ├── backpressure.rs  # full table, full queue, collisions
//!     └── concurrency.rs   # many callers at once
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p xc-tests
//! cargo test -p xc-tests integration::timeouts::
//!
//! # Benchmarks
//! cargo bench -p xc-tests
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;

use std::time::{Duration, Instant};

use xc_core::{CallbackRegistry, CoreConfig, CrossCore};

/// Config with short poll intervals so tests do not wait on idle loops.
pub fn fast_config() -> CoreConfig {
    CoreConfig {
        worker_poll_interval_ms: 5,
        monitor_poll_interval_ms: 2,
        ..CoreConfig::default()
    }
}

/// Initialized runtime with the monitor running.
pub fn running_core(config: CoreConfig) -> CrossCore {
    let core = CrossCore::new(config);
    core.init().expect("init");
    core.start_monitoring().expect("monitor");
    core
}

/// Drain deferred callbacks until `registry` is empty or `deadline` passes.
/// Returns true if every callback ran.
pub fn pump_until_empty(
    core: &CrossCore,
    registry: &mut CallbackRegistry,
    deadline: Duration,
) -> bool {
    let started = Instant::now();
    while !registry.is_empty() {
        if started.elapsed() > deadline {
            return false;
        }
        core.drain_into(registry);
        std::thread::sleep(Duration::from_millis(2));
    }
    true
}

/// Poll `condition` until it holds or `deadline` passes.
pub fn wait_until(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let started = Instant::now();
    while started.elapsed() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}
