/*!
 * Process-Wide Bus Tests
 */

use serial_test::serial;
use sigslot::{global, slot, SignalEmitter, SignalRegistry, SlotConnections};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

#[test]
#[serial]
fn test_global_is_single_instance() {
    assert!(std::ptr::eq(global(), global()));
}

#[test]
#[serial]
fn test_global_lifecycle() {
    let bus = global();
    bus.init().unwrap();
    bus.register("global.evt").unwrap();

    let last = Arc::new(AtomicI32::new(0));
    let sink = last.clone();
    bus.connect("global.evt", slot(move |p, _| sink.store(p.int_or(0), Ordering::SeqCst)), None)
        .unwrap();
    bus.emit_int("global.evt", 11).unwrap();
    assert_eq!(last.load(Ordering::SeqCst), 11);

    bus.cleanup();
    assert!(!bus.exists("global.evt"));
    assert!(bus.emit_int("global.evt", 12).is_err());
}

#[test]
#[serial]
fn test_global_namespaced_emit() {
    let bus = global();
    bus.init().unwrap();
    bus.register("ui.click").unwrap();

    let hits = Arc::new(AtomicI32::new(0));
    let sink = hits.clone();
    bus.connect("ui.click", slot(move |_, _| { sink.fetch_add(1, Ordering::SeqCst); }), None)
        .unwrap();

    bus.emit_namespaced(Some("ui"), "click", &Default::default()).unwrap();
    bus.set_namespace(Some("ui"));
    bus.emit_namespaced(None, "click", &Default::default()).unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    bus.cleanup();
    assert_eq!(bus.namespace(), None);
}
