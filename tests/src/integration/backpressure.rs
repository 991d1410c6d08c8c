//! # Backpressure
//!
//! Every bounded resource rejects cleanly when full: the pending table, the
//! command queue and the deferred callback ring.

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use shared_types::{CallbackHandle, CoreError, CorrelationMode, Opcode, Payload};
    use xc_core::{
        CoreClient, CoreConfig, CrossCore, CrossCoreApi, PendingEntry, PendingTable,
    };

    use crate::{fast_config, wait_until};

    fn echo_async(core: &CrossCore, handle: u32) -> Result<u32, CoreError> {
        core.submit_async(
            Opcode::Echo.code(),
            Payload::zeroed(),
            0,
            CallbackHandle(handle),
        )
    }

    // =============================================================================
    // PENDING TABLE
    // =============================================================================

    #[test]
    fn test_full_table_rejects_until_monitor_resolves() {
        let core = CrossCore::new(CoreConfig {
            max_pending: 4,
            ..fast_config()
        });
        core.init().unwrap();

        for handle in 1..=4 {
            echo_async(&core, handle).unwrap();
        }
        assert_eq!(
            echo_async(&core, 5),
            Err(CoreError::TableFull { capacity: 4 })
        );
        assert_eq!(core.metrics().submissions_rejected, 1);

        core.start_monitoring().unwrap();
        assert!(wait_until(Duration::from_secs(2), || core.deferred_count() == 4));
        assert_eq!(core.pending_count(), 0);
        echo_async(&core, 6).unwrap();
    }

    #[test]
    fn test_colliding_sequences_survive_removal() {
        // 1, 5 and 9 share home slot 1 in a four-slot table.
        let mut table = PendingTable::new(4);
        for sequence in [1, 5, 9] {
            table
                .register(PendingEntry::new(sequence, CorrelationMode::Event, 0, 0))
                .unwrap();
        }
        assert_eq!(table.slot_of(1), Some(1));
        assert_eq!(table.slot_of(5), Some(2));
        assert_eq!(table.slot_of(9), Some(3));

        assert!(table.clear(5).is_some());
        assert!(table.find(9).is_some());
        assert!(table.find(5).is_none());

        // The freed capacity is usable again and lookups stay exact.
        table
            .register(PendingEntry::new(13, CorrelationMode::Event, 0, 0))
            .unwrap();
        table
            .register(PendingEntry::new(4, CorrelationMode::Event, 0, 0))
            .unwrap();
        for sequence in [1, 9, 13, 4] {
            assert_eq!(table.find(sequence).map(|e| e.sequence), Some(sequence));
        }
        assert!(table.is_full());
    }

    // =============================================================================
    // COMMAND QUEUE
    // =============================================================================

    #[test]
    fn test_full_queue_rolls_back_registration() {
        let core = CrossCore::new(CoreConfig {
            command_queue_capacity: 2,
            send_timeout_ms: 20,
            ..fast_config()
        });
        core.init().unwrap();

        thread::scope(|scope| {
            let busy = scope.spawn(|| CoreClient::new(&core).with_timeout(2_000).delay(200));
            assert!(wait_until(Duration::from_secs(1), || {
                core.metrics().commands_submitted == 1 && core.queued().0 == 0
            }));

            echo_async(&core, 1).unwrap();
            echo_async(&core, 2).unwrap();
            let before = core.pending_count();
            let err = echo_async(&core, 3).unwrap_err();
            assert_eq!(err, CoreError::QueueFull);
            assert!(err.is_backpressure());
            assert_eq!(core.pending_count(), before);

            assert_eq!(busy.join().unwrap(), Ok(()));
        });
    }

    // =============================================================================
    // CALLBACK RING
    // =============================================================================

    #[test]
    fn test_full_callback_ring_drops_and_counts() {
        let core = CrossCore::new(CoreConfig {
            callback_queue_capacity: 2,
            ..fast_config()
        });
        core.init().unwrap();
        core.start_monitoring().unwrap();

        for handle in 1..=4 {
            echo_async(&core, handle).unwrap();
        }
        assert!(wait_until(Duration::from_secs(2), || {
            core.metrics().callbacks_dropped == 2
        }));

        let metrics = core.metrics();
        assert_eq!(metrics.callbacks_dropped, 2);
        assert_eq!(metrics.responses_resolved, 2);

        let mut handles = Vec::new();
        core.drain_deferred_callbacks(&mut |handle, _| handles.push(handle));
        assert_eq!(handles, vec![CallbackHandle(1), CallbackHandle(2)]);
    }
}
