//! # Concurrency
//!
//! Many callers share one worker. Each caller must get its own response,
//! and every callback or event must resolve exactly once.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::thread;
    use std::time::Duration;

    use rand::Rng;
    use shared_types::{CallbackHandle, Opcode, Payload};
    use xc_core::{CallbackRegistry, CoreClient, CoreConfig, CrossCoreApi};

    use crate::{fast_config, pump_until_empty, running_core, wait_until};

    const CALLERS: i32 = 8;
    const CALLS_PER_CALLER: i32 = 25;

    #[test]
    fn test_parallel_blocking_callers_get_their_own_results() {
        let core = running_core(CoreConfig {
            max_pending: 64,
            ..fast_config()
        });

        thread::scope(|scope| {
            let callers: Vec<_> = (0..CALLERS)
                .map(|caller| {
                    let core = &core;
                    scope.spawn(move || {
                        let client = CoreClient::new(core).with_timeout(5_000);
                        for i in 0..CALLS_PER_CALLER {
                            let a = caller * 1_000;
                            assert_eq!(client.add(a, i), Ok(a + i));
                        }
                    })
                })
                .collect();
            for caller in callers {
                caller.join().unwrap();
            }
        });

        let metrics = core.metrics();
        assert_eq!(metrics.commands_submitted, (CALLERS * CALLS_PER_CALLER) as u64);
        assert_eq!(metrics.timeouts, 0);
        assert_eq!(metrics.orphans_discarded, 0);
        assert_eq!(core.pending_count(), 0);
    }

    #[test]
    fn test_blocking_callers_without_monitor() {
        let core = xc_core::CrossCore::new(fast_config());
        core.init().unwrap();

        thread::scope(|scope| {
            for caller in 0..4 {
                let core = &core;
                scope.spawn(move || {
                    let client = CoreClient::new(core);
                    for i in 0..10 {
                        assert_eq!(client.add(caller, i), Ok(caller + i));
                    }
                });
            }
        });
        assert_eq!(core.pending_count(), 0);
    }

    #[test]
    fn test_single_slot_response_queue_loses_nothing() {
        let core = running_core(CoreConfig {
            response_queue_capacity: 1,
            max_pending: 64,
            callback_queue_capacity: 128,
            send_timeout_ms: 2_000,
            ..fast_config()
        });
        let total = 100u32;
        let mut fired: HashMap<CallbackHandle, u32> = HashMap::new();

        thread::scope(|scope| {
            for caller in 0..4 {
                let core = &core;
                scope.spawn(move || {
                    let client = CoreClient::new(core).with_timeout(2_000);
                    for i in 0..25 {
                        assert_eq!(client.add(caller, i), Ok(caller + i));
                    }
                });
            }

            // Callback traffic competing for the single response slot.
            let mut next = 1u32;
            while next <= total {
                if core.pending_count() >= 32 {
                    thread::sleep(Duration::from_millis(1));
                    continue;
                }
                match core.submit_async(
                    Opcode::Echo.code(),
                    Payload::from_u32(next),
                    2_000,
                    CallbackHandle(next),
                ) {
                    Ok(_) => next += 1,
                    Err(err) if err.is_backpressure() => thread::sleep(Duration::from_millis(1)),
                    Err(err) => panic!("unexpected submit error {err:?}"),
                }
            }
        });

        assert!(wait_until(Duration::from_secs(3), || {
            core.drain_deferred_callbacks(&mut |handle, resolution| {
                assert_eq!(resolution.into_result().unwrap().read_u32(0), handle.0);
                *fired.entry(handle).or_default() += 1;
            });
            fired.len() == total as usize
        }));
        assert!(fired.values().all(|count| *count == 1));

        let metrics = core.metrics();
        assert_eq!(metrics.responses_lost, 0);
        assert_eq!(metrics.timeouts, 0);
        assert_eq!(core.pending_count(), 0);
    }

    #[test]
    fn test_each_callback_fires_exactly_once() {
        let core = running_core(CoreConfig {
            callback_queue_capacity: 64,
            ..fast_config()
        });
        let total = 40u32;

        // Keep fewer than `max_pending` requests in flight at a time.
        let mut fired: HashMap<CallbackHandle, u32> = HashMap::new();
        let mut next = 1u32;
        while next <= total {
            if core.pending_count() < 16 {
                core.submit_async(
                    Opcode::Echo.code(),
                    Payload::from_u32(next),
                    2_000,
                    CallbackHandle(next),
                )
                .unwrap();
                next += 1;
            } else {
                thread::sleep(Duration::from_millis(1));
            }
            core.drain_deferred_callbacks(&mut |handle, resolution| {
                assert_eq!(resolution.into_result().unwrap().read_u32(0), handle.0);
                *fired.entry(handle).or_default() += 1;
            });
        }
        assert!(wait_until(Duration::from_secs(2), || {
            core.drain_deferred_callbacks(&mut |handle, _| {
                *fired.entry(handle).or_default() += 1;
            });
            fired.len() == total as usize
        }));
        assert!(fired.values().all(|count| *count == 1));
    }

    #[test]
    fn test_mixed_modes_under_load() {
        let core = running_core(CoreConfig {
            max_pending: 64,
            ..fast_config()
        });
        let mut registry = CallbackRegistry::new();
        let (tx, rx) = std::sync::mpsc::channel();

        thread::scope(|scope| {
            // Blocking traffic from other threads.
            for caller in 0..3 {
                let core = &core;
                scope.spawn(move || {
                    let client = CoreClient::new(core);
                    let mut rng = rand::thread_rng();
                    for _ in 0..10 {
                        let a: i32 = rng.gen_range(-1_000..1_000);
                        let b: i32 = rng.gen_range(-1_000..1_000);
                        assert_eq!(client.add(a, b), Ok(a + b));
                    }
                });
            }

            // Callbacks and events from this thread.
            let client = CoreClient::new(&core);
            let mut events = Vec::new();
            for i in 0..10 {
                let tx = tx.clone();
                let handle = registry.register(move |result| {
                    tx.send((i, result)).unwrap();
                });
                client.add_async(i, 1, handle).unwrap();
                events.push((i, client.add_event(i, 2).unwrap()));
            }
            for (i, event) in events {
                assert_eq!(
                    event.get_result(Duration::from_secs(2)).unwrap().read_i32(0),
                    i + 2
                );
            }
        });

        assert!(pump_until_empty(&core, &mut registry, Duration::from_secs(2)));
        drop(tx);
        let mut results: Vec<_> = rx.iter().collect();
        results.sort_by_key(|(i, _)| *i);
        assert_eq!(results.len(), 10);
        for (i, result) in results {
            assert_eq!(result.unwrap().read_i32(0), i + 1);
        }
        assert_eq!(core.metrics().orphans_discarded, 0);
    }
}
