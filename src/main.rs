/*!
 * Sigslot Demo - Main Entry Point
 *
 * Walks through the bus on the process-wide instance:
 * - Priority-ordered delivery
 * - Handle-based disconnection
 * - Interrupt queue drained from the main loop
 */

use log::info;
use miette::Result;
use sigslot::{
    global, slot, Batch, Payload, Priority, SignalEmitter, SignalRegistry, SlotConnections,
};
use std::sync::Arc;
use std::thread;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let bus = global();
    bus.init()?;
    bus.set_thread_safe(true);

    info!("Sigslot demo starting...");
    info!("================================================");

    bus.register_with("sensor.temp", Some("temperature in tenths of a degree"), Priority::NORMAL)?;
    bus.connect_with_priority(
        "sensor.temp",
        slot(|payload, _| info!("[critical] safety check: {}", payload.int_or(0))),
        None,
        Priority::CRITICAL,
    )?;
    let logger = bus.connect(
        "sensor.temp",
        slot(|payload, _| info!("[normal] logged: {}", payload.int_or(0))),
        None,
    )?;
    bus.connect_with_priority(
        "sensor.temp",
        slot(|payload, data| {
            let unit = data
                .and_then(|d| d.downcast_ref::<&'static str>())
                .copied()
                .unwrap_or("?");
            info!("[low] display: {} {}", payload.int_or(0), unit);
        }),
        Some(Arc::new("dC")),
        Priority::LOW,
    )?;

    bus.emit_int("sensor.temp", 215)?;

    bus.disconnect_by_handle(logger)?;
    info!("Disconnected slot {}", logger);
    bus.emit_int("sensor.temp", 220)?;

    // Interrupt-style producer; the main loop owns draining
    let producer = thread::spawn(move || {
        for reading in [230, 235, 240] {
            if let Err(e) = bus.emit_from_isr("sensor.temp", reading) {
                eprintln!("interrupt queue rejected {}: {}", reading, e);
            }
        }
    });
    producer
        .join()
        .map_err(|_| miette::miette!("producer thread panicked"))?;
    info!("Drained {} interrupt emissions", bus.drain_isr());

    let mut batch = Batch::new();
    batch
        .add("sensor.temp", Payload::Int(250))
        .add("sensor.temp", Payload::Int(255));
    batch.emit(bus)?;

    for signal in bus.list() {
        info!(
            "Signal '{}': {} slots (priority {})",
            signal.name, signal.slot_count, signal.priority
        );
    }
    let stats = bus.memory_stats()?;
    info!(
        "Memory: {} signals, {} slots (peak {}), {} string bytes",
        stats.signals_used, stats.slots_used, stats.peak_slots_used, stats.string_bytes
    );

    bus.cleanup();
    info!("Sigslot demo finished");
    Ok(())
}
