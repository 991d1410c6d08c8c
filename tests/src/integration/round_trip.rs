//! # Round Trips
//!
//! One request per correlation mode against the live worker and monitor.
//!
//! | Mode | Submitted with | Observed through |
//! |------|----------------|------------------|
//! | Blocking | `submit_blocking` | return value |
//! | Callback | `submit_async` | `drain_deferred_callbacks` |
//! | Event | `submit_event` | `ResponseEvent::get_result` |

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use shared_types::{CallbackHandle, CoreError, Opcode, Payload, Status};
    use xc_core::{CallbackRegistry, CoreClient, CrossCoreApi, Resolution};

    use crate::{fast_config, pump_until_empty, running_core};

    // =============================================================================
    // BLOCKING
    // =============================================================================

    #[test]
    fn test_blocking_echo_returns_full_payload() {
        let core = running_core(fast_config());
        let mut bytes = [0u8; 128];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }
        let payload = Payload::from_slice(&bytes).unwrap();

        let echoed = core
            .submit_blocking(Opcode::Echo.code(), payload, 1_000)
            .unwrap();
        assert_eq!(echoed, payload);
    }

    #[test]
    fn test_blocking_add_wraps_on_overflow() {
        let core = running_core(fast_config());
        let client = CoreClient::new(&core);
        assert_eq!(client.add(10, 20), Ok(30));
        assert_eq!(client.add(-3, -4), Ok(-7));
        assert_eq!(client.add(i32::MAX, 1), Ok(i32::MIN));
    }

    #[test]
    fn test_blocking_unknown_opcode_is_invalid_command() {
        let core = running_core(fast_config());
        let err = core
            .submit_blocking(0x0BAD, Payload::zeroed(), 1_000)
            .unwrap_err();
        assert_eq!(err, CoreError::Worker(Status::InvalidCommand));
        assert_eq!(CoreClient::new(&core).status().unwrap().commands_failed, 1);
    }

    #[test]
    fn test_blocking_works_without_monitor() {
        let core = xc_core::CrossCore::new(fast_config());
        core.init().unwrap();
        assert!(!core.is_monitoring());
        assert_eq!(CoreClient::new(&core).add(2, 3), Ok(5));
    }

    // =============================================================================
    // CALLBACK
    // =============================================================================

    #[test]
    fn test_async_add_runs_callback_on_drain() {
        let core = running_core(fast_config());
        let mut registry = CallbackRegistry::new();
        let (tx, rx) = mpsc::channel();
        let handle = registry.register(move |result| tx.send(result).unwrap());

        let sequence = CoreClient::new(&core).add_async(7, 8, handle).unwrap();
        assert!(sequence >= 1);
        assert!(pump_until_empty(&core, &mut registry, Duration::from_secs(2)));

        let payload = rx.try_recv().unwrap().unwrap();
        assert_eq!(payload.read_i32(0), 15);
    }

    #[test]
    fn test_async_resolution_carries_handle_and_sequence() {
        let core = running_core(fast_config());
        let sequence = core
            .submit_async(
                Opcode::Echo.code(),
                Payload::from_u32(0xFEED),
                1_000,
                CallbackHandle(77),
            )
            .unwrap();

        let mut seen: Vec<(CallbackHandle, Resolution)> = Vec::new();
        assert!(crate::wait_until(Duration::from_secs(2), || {
            core.drain_deferred_callbacks(&mut |handle, resolution| {
                seen.push((handle, resolution))
            });
            !seen.is_empty()
        }));

        let (handle, resolution) = seen[0];
        assert_eq!(handle, CallbackHandle(77));
        assert_eq!(resolution.sequence(), sequence);
        assert_eq!(resolution.into_result().unwrap().read_u32(0), 0xFEED);
    }

    #[test]
    fn test_async_error_status_reaches_callback() {
        let core = running_core(fast_config());
        let mut registry = CallbackRegistry::new();
        let (tx, rx) = mpsc::channel();
        let handle = registry.register(move |result| tx.send(result).unwrap());

        core.submit_async(0x7777, Payload::zeroed(), 1_000, handle)
            .unwrap();
        assert!(pump_until_empty(&core, &mut registry, Duration::from_secs(2)));
        assert_eq!(
            rx.try_recv().unwrap(),
            Err(CoreError::Worker(Status::InvalidCommand))
        );
    }

    // =============================================================================
    // EVENT
    // =============================================================================

    #[test]
    fn test_event_get_result() {
        let core = running_core(fast_config());
        let event = CoreClient::new(&core).add_event(100, -1).unwrap();
        assert_eq!(
            event.get_result(Duration::from_secs(2)).unwrap().read_i32(0),
            99
        );
        assert!(event.is_ready());
        // Reading twice returns the same result.
        assert_eq!(
            event.get_result(Duration::ZERO).unwrap().read_i32(0),
            99
        );
    }

    #[test]
    fn test_event_poll_before_ready() {
        let core = running_core(fast_config());
        let event = CoreClient::new(&core).delay_event(200).unwrap();
        assert_eq!(event.get_result(Duration::ZERO), Err(CoreError::NotReady));
        assert!(event.get_result(Duration::from_secs(2)).is_ok());
    }

    #[test]
    fn test_event_clones_share_result() {
        let core = running_core(fast_config());
        let event = CoreClient::new(&core).add_event(1, 1).unwrap();
        let observer = event.clone();
        let waiter = std::thread::spawn(move || observer.get_result(Duration::from_secs(2)));
        assert_eq!(event.get_result(Duration::from_secs(2)).unwrap().read_i32(0), 2);
        assert_eq!(waiter.join().unwrap().unwrap().read_i32(0), 2);
    }
}
