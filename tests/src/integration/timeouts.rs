//! # Timeouts
//!
//! Deadlines on every path: the worker clamps long delays, the monitor
//! expires callback and event requests, and blocking callers enforce their
//! own. A response arriving after its request resolved is an orphan.

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::{Duration, Instant};

    use shared_types::{CallbackHandle, CoreError, Opcode, Payload, Status};
    use xc_core::{CoreClient, CrossCore, CrossCoreApi, Resolution};

    use crate::{fast_config, running_core, wait_until};

    /// Keep the worker busy for `ms` from a scoped thread.
    fn occupy_worker<'scope>(
        scope: &'scope thread::Scope<'scope, '_>,
        core: &'scope CrossCore,
        ms: u32,
    ) -> thread::ScopedJoinHandle<'scope, Result<(), CoreError>> {
        let submitted = core.metrics().commands_submitted + 1;
        let handle = scope.spawn(move || CoreClient::new(core).with_timeout(5_000).delay(ms));
        // Let the delay reach the worker before anything else is queued.
        assert!(wait_until(Duration::from_secs(1), || {
            core.metrics().commands_submitted == submitted && core.queued().0 == 0
        }));
        handle
    }

    // =============================================================================
    // WORKER-SIDE CLAMPING
    // =============================================================================

    #[test]
    fn test_clamped_delay_fails_fast() {
        let core = running_core(fast_config());
        let started = Instant::now();
        let err = CoreClient::new(&core).with_timeout(50).delay(2_000).unwrap_err();
        assert!(err.is_timeout(), "unexpected error {err:?}");
        assert!(started.elapsed() < Duration::from_millis(1_000));
    }

    #[test]
    fn test_delay_within_timeout_succeeds() {
        let core = running_core(fast_config());
        let started = Instant::now();
        CoreClient::new(&core).with_timeout(1_000).delay(30).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_clamped_event_delay_reports_timeout() {
        let core = running_core(fast_config());
        let event = core
            .submit_event(Opcode::Delay.code(), Payload::from_u32(1_000), 30)
            .unwrap();
        let err = event.get_result(Duration::from_secs(2)).unwrap_err();
        assert!(err.is_timeout(), "unexpected error {err:?}");
    }

    // =============================================================================
    // MONITOR EXPIRY AND LATE RESPONSES
    // =============================================================================

    #[test]
    fn test_callback_expires_then_late_response_is_orphaned() {
        let core = running_core(fast_config());
        thread::scope(|scope| {
            let busy = occupy_worker(scope, &core, 200);

            let sequence = core
                .submit_async(Opcode::Echo.code(), Payload::zeroed(), 30, CallbackHandle(1))
                .unwrap();

            let mut resolutions = Vec::new();
            assert!(wait_until(Duration::from_secs(1), || {
                core.drain_deferred_callbacks(&mut |_, resolution| resolutions.push(resolution));
                !resolutions.is_empty()
            }));
            assert_eq!(resolutions, vec![Resolution::TimedOut { sequence }]);

            assert_eq!(busy.join().unwrap(), Ok(()));
        });

        assert!(wait_until(Duration::from_secs(1), || {
            core.metrics().orphans_discarded == 1
        }));
        // The late response never reaches the callback ring.
        let mut late = 0;
        core.drain_deferred_callbacks(&mut |_, _| late += 1);
        assert_eq!(late, 0);
        assert!(core.metrics().timeouts >= 1);
    }

    #[test]
    fn test_event_expires_while_worker_busy() {
        let core = running_core(fast_config());
        thread::scope(|scope| {
            let busy = occupy_worker(scope, &core, 200);
            let event = CoreClient::new(&core).with_timeout(30).add_event(1, 2).unwrap();
            assert_eq!(
                event.get_result(Duration::from_secs(1)),
                Err(CoreError::Timeout)
            );
            assert_eq!(busy.join().unwrap(), Ok(()));
        });
    }

    #[test]
    fn test_blocking_caller_times_out_while_worker_busy() {
        let core = running_core(fast_config());
        thread::scope(|scope| {
            let busy = occupy_worker(scope, &core, 300);
            let started = Instant::now();
            let err = CoreClient::new(&core).with_timeout(50).add(1, 1).unwrap_err();
            assert_eq!(err, CoreError::Timeout);
            assert!(started.elapsed() < Duration::from_millis(300));
            assert_eq!(busy.join().unwrap(), Ok(()));
        });

        // The abandoned add still runs and its response is discarded.
        assert!(wait_until(Duration::from_secs(1), || {
            core.metrics().orphans_discarded >= 1
        }));
        assert_eq!(core.pending_count(), 0);
    }

    #[test]
    fn test_zero_timeout_never_expires() {
        let core = running_core(fast_config());
        let event = core
            .submit_event(Opcode::Delay.code(), Payload::from_u32(50), 0)
            .unwrap();
        assert!(event.get_result(Duration::from_secs(2)).is_ok());
        assert_eq!(core.metrics().timeouts, 0);
    }

    #[test]
    fn test_worker_timeout_status_is_distinct_from_caller_timeout() {
        let core = running_core(fast_config());
        let event = core
            .submit_event(Opcode::Delay.code(), Payload::from_u32(500), 20)
            .unwrap();
        match event.get_result(Duration::from_secs(2)) {
            Err(CoreError::Worker(Status::Timeout)) | Err(CoreError::Timeout) => {}
            other => panic!("unexpected result {other:?}"),
        }
    }
}
