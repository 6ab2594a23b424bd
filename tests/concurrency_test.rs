/*!
 * Concurrency Tests
 * Guarded multi-threaded use and same-thread reentry
 */

#![cfg(feature = "thread-safety")]

use parking_lot::Mutex;
use sigslot::{
    slot, BusConfig, HeapBackend, SignalBus, SignalEmitter, SignalRegistry, SlotConnections,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn test_guard_toggle() {
    let bus = SignalBus::<HeapBackend>::new();
    assert!(!bus.is_thread_safe());

    bus.set_thread_safe(true);
    assert!(bus.is_thread_safe());
    bus.set_thread_safe(false);
    assert!(!bus.is_thread_safe());

    let threaded = SignalBus::<HeapBackend>::with_config(BusConfig::threaded());
    assert!(threaded.is_thread_safe());
}

#[test]
fn test_nested_emit_under_guard() {
    let bus = Arc::new(SignalBus::<HeapBackend>::with_config(BusConfig::threaded()));
    bus.init().unwrap();
    bus.register("outer").unwrap();
    bus.register("inner").unwrap();

    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    bus.connect("inner", slot(move |_, _| { counter.fetch_add(1, Ordering::SeqCst); }), None)
        .unwrap();

    let nested = bus.clone();
    bus.connect(
        "outer",
        slot(move |_, _| {
            nested.emit_void("inner").unwrap();
            nested.connect("inner", slot(|_, _| {}), None).unwrap();
        }),
        None,
    )
    .unwrap();

    bus.emit_void("outer").unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(bus.list().iter().find(|s| s.name == "inner").unwrap().slot_count, 2);
}

#[test]
fn test_guard_serializes_emissions() {
    let bus = Arc::new(SignalBus::<HeapBackend>::with_config(BusConfig::threaded()));
    bus.init().unwrap();
    bus.register("work").unwrap();

    let inside = Arc::new(AtomicUsize::new(0));
    let max_inside = Arc::new(AtomicUsize::new(0));
    let (now, max) = (inside.clone(), max_inside.clone());
    bus.connect(
        "work",
        slot(move |_, _| {
            let current = now.fetch_add(1, Ordering::SeqCst) + 1;
            max.fetch_max(current, Ordering::SeqCst);
            thread::sleep(Duration::from_micros(100));
            now.fetch_sub(1, Ordering::SeqCst);
        }),
        None,
    )
    .unwrap();

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let bus = bus.clone();
            thread::spawn(move || {
                for _ in 0..20 {
                    bus.emit_void("work").unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(max_inside.load(Ordering::SeqCst), 1);
}

#[test]
fn test_churn_without_guard_is_memory_safe() {
    let bus = Arc::new(SignalBus::<HeapBackend>::new());
    bus.init().unwrap();
    bus.register("churn").unwrap();
    let calls = Arc::new(Mutex::new(0usize));

    let emitters: Vec<_> = (0..2)
        .map(|_| {
            let bus = bus.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    bus.emit_void("churn").unwrap();
                }
            })
        })
        .collect();

    let connectors: Vec<_> = (0..2)
        .map(|_| {
            let (bus, calls) = (bus.clone(), calls.clone());
            thread::spawn(move || {
                for _ in 0..50 {
                    let calls = calls.clone();
                    let handle = bus
                        .connect("churn", slot(move |_, _| *calls.lock() += 1), None)
                        .unwrap();
                    thread::yield_now();
                    bus.disconnect_by_handle(handle).unwrap();
                }
            })
        })
        .collect();

    for worker in emitters.into_iter().chain(connectors) {
        worker.join().unwrap();
    }

    assert_eq!(bus.list()[0].slot_count, 0);
    assert_eq!(bus.memory_stats().unwrap().slots_used, 0);
}
