/*!
 * Signal Bus Tests
 * Registration, ordering and mutation-during-emission behavior
 */

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use sigslot::{
    slot, BusError, ErrorKind, Handle, HeapBackend, Priority, SignalBus, SignalEmitter,
    SignalRegistry, SlotConnections, SlotFn,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

type Trace = Arc<Mutex<Vec<&'static str>>>;

fn bus() -> Arc<SignalBus<HeapBackend>> {
    let bus = Arc::new(SignalBus::new());
    bus.init().unwrap();
    bus
}

fn recorder(trace: &Trace, label: &'static str) -> SlotFn {
    let trace = trace.clone();
    slot(move |_, _| trace.lock().push(label))
}

fn drain(trace: &Trace) -> Vec<&'static str> {
    std::mem::take(&mut *trace.lock())
}

#[test]
fn test_duplicate_register_leaves_registry_unchanged() {
    let bus = bus();
    bus.register_with("evt", Some("first"), Priority::HIGH).unwrap();

    let err = bus.register_with("evt", Some("second"), Priority::LOW).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);

    let list = bus.list();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].description.as_deref(), Some("first"));
    assert_eq!(list[0].priority, Priority::HIGH);
}

#[test]
fn test_priority_ordering() {
    let bus = bus();
    let trace = Trace::default();
    bus.register("evt").unwrap();

    for (label, priority) in [("p5", 5), ("p15", 15), ("p0", 0), ("p10", 10)] {
        bus.connect_with_priority("evt", recorder(&trace, label), None, Priority(priority))
            .unwrap();
    }

    bus.emit_void("evt").unwrap();
    assert_eq!(drain(&trace), vec!["p15", "p10", "p5", "p0"]);
}

#[test]
fn test_stable_tie_break() {
    let bus = bus();
    let trace = Trace::default();
    bus.register("evt").unwrap();

    bus.connect("evt", recorder(&trace, "A"), None).unwrap();
    bus.connect("evt", recorder(&trace, "B"), None).unwrap();

    bus.emit_void("evt").unwrap();
    assert_eq!(drain(&trace), vec!["A", "B"]);
}

#[test]
fn test_self_disconnect() {
    let bus = bus();
    let trace = Trace::default();
    bus.register("evt").unwrap();

    let own: Arc<Mutex<Option<Handle>>> = Arc::default();
    let (inner, handle_cell, sink) = (bus.clone(), own.clone(), trace.clone());
    let handle = bus
        .connect(
            "evt",
            slot(move |_, _| {
                sink.lock().push("once");
                if let Some(handle) = *handle_cell.lock() {
                    inner.disconnect_by_handle(handle).unwrap();
                }
            }),
            None,
        )
        .unwrap();
    *own.lock() = Some(handle);
    bus.connect("evt", recorder(&trace, "always"), None).unwrap();

    bus.emit_void("evt").unwrap();
    assert_eq!(drain(&trace), vec!["once", "always"]);

    bus.emit_void("evt").unwrap();
    assert_eq!(drain(&trace), vec!["always"]);
    assert_eq!(bus.list()[0].slot_count, 1);
}

#[test]
fn test_disconnect_of_later_slot() {
    let bus = bus();
    let trace = Trace::default();
    bus.register("evt").unwrap();

    let victim = recorder(&trace, "B");
    let (inner, target, sink) = (bus.clone(), victim.clone(), trace.clone());
    bus.connect(
        "evt",
        slot(move |_, _| {
            sink.lock().push("A");
            let _ = inner.disconnect("evt", &target);
        }),
        None,
    )
    .unwrap();
    bus.connect("evt", victim, None).unwrap();

    bus.emit_void("evt").unwrap();
    assert_eq!(drain(&trace), vec!["A"]);

    bus.emit_void("evt").unwrap();
    assert_eq!(drain(&trace), vec!["A"]);
}

#[test]
fn test_connect_during_emit_runs_later_slot() {
    let bus = bus();
    let trace = Trace::default();
    bus.register("evt").unwrap();

    let (inner, sink) = (bus.clone(), trace.clone());
    let added = Arc::new(Mutex::new(false));
    bus.connect_with_priority(
        "evt",
        slot(move |_, _| {
            sink.lock().push("first");
            let mut added = added.lock();
            if !*added {
                *added = true;
                inner
                    .connect_with_priority("evt", recorder(&sink, "late"), None, Priority::LOW)
                    .unwrap();
            }
        }),
        None,
        Priority::HIGH,
    )
    .unwrap();
    bus.connect("evt", recorder(&trace, "middle"), None).unwrap();

    bus.emit_void("evt").unwrap();
    assert_eq!(drain(&trace), vec!["first", "middle", "late"]);
}

#[test]
fn test_nested_emit_same_signal() {
    let bus = bus();
    bus.register("evt").unwrap();
    let depth_seen = Arc::new(Mutex::new(Vec::new()));

    let (inner, sink) = (bus.clone(), depth_seen.clone());
    let cb = slot(move |payload, _| {
        let level = payload.int_or(0);
        sink.lock().push(level);
        if level < 3 {
            inner.emit_int("evt", level + 1).unwrap();
        }
    });
    bus.connect("evt", cb.clone(), None).unwrap();

    bus.emit_int("evt", 0).unwrap();
    assert_eq!(*depth_seen.lock(), vec![0, 1, 2, 3]);

    // All nesting unwound; removal takes effect immediately
    bus.disconnect("evt", &cb).unwrap();
    assert_eq!(bus.memory_stats().unwrap().slots_used, 0);
}

#[test]
fn test_disconnect_all_mid_emit() {
    let bus = bus();
    let trace = Trace::default();
    bus.register("evt").unwrap();

    let (inner, sink) = (bus.clone(), trace.clone());
    bus.connect_with_priority(
        "evt",
        slot(move |_, _| {
            sink.lock().push("first");
            inner.disconnect_all("evt").unwrap();
        }),
        None,
        Priority::HIGH,
    )
    .unwrap();
    bus.connect("evt", recorder(&trace, "second"), None).unwrap();

    bus.emit_void("evt").unwrap();
    assert_eq!(drain(&trace), vec!["first"]);
    assert!(bus.exists("evt"));
    assert_eq!(bus.list()[0].slot_count, 0);
    assert_eq!(bus.memory_stats().unwrap().slots_used, 0);
}

#[test]
fn test_unregister_mid_emit() {
    let bus = bus();
    let trace = Trace::default();
    bus.register("evt").unwrap();

    let (inner, sink) = (bus.clone(), trace.clone());
    bus.connect_with_priority(
        "evt",
        slot(move |_, _| {
            sink.lock().push("first");
            inner.unregister("evt").unwrap();
        }),
        None,
        Priority::HIGH,
    )
    .unwrap();
    bus.connect("evt", recorder(&trace, "second"), None).unwrap();

    bus.emit_void("evt").unwrap();
    assert_eq!(drain(&trace), vec!["first"]);
    assert!(!bus.exists("evt"));
}

#[test]
fn test_init_and_cleanup_idempotent() {
    let bus = SignalBus::<HeapBackend>::new();
    bus.cleanup();
    assert!(!bus.is_initialized());

    bus.init().unwrap();
    bus.register("evt").unwrap();
    bus.init().unwrap();
    assert_eq!(bus.count(), 1);

    bus.cleanup();
    bus.cleanup();
    assert!(!bus.is_initialized());
    assert_eq!(
        bus.register("evt").unwrap_err(),
        BusError::InvalidArgument("bus not initialized".into())
    );
}

#[test]
fn test_handle_disconnect() {
    let bus = bus();
    bus.register("evt").unwrap();
    let keep = bus.connect("evt", slot(|_, _| {}), None).unwrap();
    let drop_me = bus.connect("evt", slot(|_, _| {}), None).unwrap();
    assert_ne!(keep, drop_me);

    bus.disconnect_by_handle(drop_me).unwrap();
    assert_eq!(bus.list()[0].slot_count, 1);
    assert_eq!(
        bus.disconnect_by_handle(drop_me).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn test_concrete_scenario() {
    let bus = bus();
    let trace = Trace::default();
    bus.register("evt").unwrap();

    let x = bus
        .connect_with_priority("evt", recorder(&trace, "X"), None, Priority::NORMAL)
        .unwrap();
    let y = bus
        .connect_with_priority("evt", recorder(&trace, "Y"), None, Priority::HIGH)
        .unwrap();
    assert_eq!((x.raw(), y.raw()), (1, 2));

    bus.emit_void("evt").unwrap();
    assert_eq!(drain(&trace), vec!["Y", "X"]);

    bus.disconnect_by_handle(y).unwrap();
    bus.emit_void("evt").unwrap();
    assert_eq!(drain(&trace), vec!["X"]);
}

#[test]
fn test_typed_emitters() {
    let bus = bus();
    bus.register("evt").unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    bus.connect(
        "evt",
        slot(move |payload, _| sink.lock().push(format!("{:?}", payload))),
        None,
    )
    .unwrap();

    bus.emit_void("evt").unwrap();
    bus.emit_float("evt", 1.5).unwrap();
    bus.emit_double("evt", 2.25).unwrap();
    bus.emit_string("evt", Some("hi")).unwrap();
    bus.emit_string("evt", None).unwrap();
    bus.emit_custom("evt", &[1, 2]).unwrap();

    assert_eq!(
        *seen.lock(),
        vec![
            "Void",
            "Float(1.5)",
            "Double(2.25)",
            "Str(Some(\"hi\"))",
            "Str(None)",
            "Custom { size: 2 }",
        ]
    );
}

#[test]
fn test_error_hook_after_lock_release() {
    let bus = bus();
    let kinds = Arc::new(Mutex::new(Vec::new()));

    // The hook queries the bus; it would deadlock if called under the state lock
    let (inner, sink) = (bus.clone(), kinds.clone());
    bus.set_error_handler(Some(Arc::new(move |kind: ErrorKind, message: &str| {
        sink.lock().push((kind, message.to_string(), inner.count()));
    })));

    let _ = bus.emit_void("ghost");
    let seen = kinds.lock().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, ErrorKind::NotFound);
    assert!(seen[0].1.contains("ghost"));
}

/// Slot context that queries the bus when it is dropped
struct Notifier {
    bus: Weak<SignalBus<HeapBackend>>,
    drops: Arc<AtomicUsize>,
}

impl Drop for Notifier {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.count();
        }
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

fn notifying_slot(bus: &Arc<SignalBus<HeapBackend>>, drops: &Arc<AtomicUsize>) -> SlotFn {
    let notifier = Notifier {
        bus: Arc::downgrade(bus),
        drops: drops.clone(),
    };
    slot(move |_, _| {
        let _ = &notifier;
    })
}

#[test]
fn test_slot_drop_may_reenter_bus() {
    let bus = bus();
    let drops = Arc::new(AtomicUsize::new(0));
    bus.register("evt").unwrap();
    bus.register("other").unwrap();

    let handle = bus.connect("evt", notifying_slot(&bus, &drops), None).unwrap();
    bus.disconnect_by_handle(handle).unwrap();
    assert_eq!(drops.load(Ordering::SeqCst), 1);

    let callback = notifying_slot(&bus, &drops);
    bus.connect("evt", callback.clone(), None).unwrap();
    bus.disconnect("evt", &callback).unwrap();
    drop(callback);
    assert_eq!(drops.load(Ordering::SeqCst), 2);

    bus.connect("evt", notifying_slot(&bus, &drops), None).unwrap();
    bus.disconnect_all("evt").unwrap();
    assert_eq!(drops.load(Ordering::SeqCst), 3);

    bus.connect("other", notifying_slot(&bus, &drops), None).unwrap();
    bus.unregister("other").unwrap();
    assert_eq!(drops.load(Ordering::SeqCst), 4);

    // Rejected before it was ever linked
    assert!(bus.connect("missing", notifying_slot(&bus, &drops), None).is_err());
    assert_eq!(drops.load(Ordering::SeqCst), 5);
}

#[test]
fn test_swept_slot_drop_may_reenter_bus() {
    let bus = bus();
    let drops = Arc::new(AtomicUsize::new(0));
    bus.register("evt").unwrap();

    let own: Arc<Mutex<Option<Handle>>> = Arc::default();
    let notifier = Notifier {
        bus: Arc::downgrade(&bus),
        drops: drops.clone(),
    };
    let (inner, handle_cell) = (Arc::downgrade(&bus), own.clone());
    let handle = bus
        .connect(
            "evt",
            slot(move |_, _| {
                let _ = &notifier;
                let handle = *handle_cell.lock();
                if let (Some(bus), Some(handle)) = (inner.upgrade(), handle) {
                    bus.disconnect_by_handle(handle).unwrap();
                }
            }),
            None,
        )
        .unwrap();
    *own.lock() = Some(handle);

    // Tombstoned mid-walk, swept when the emission ends
    bus.emit_void("evt").unwrap();
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    assert_eq!(bus.memory_stats().unwrap().slots_used, 0);
}
