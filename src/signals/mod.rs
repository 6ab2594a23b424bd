/*!
 * Signals Module
 * Named signals, priority-ordered slots and synchronous emission
 */

pub mod backend;
mod batch;
mod deferred;
mod delivery;
mod global;
mod internal_types;
pub mod isr;
mod manager;
pub mod payload;
pub mod traits;
pub mod types;

// Re-export public API
pub use backend::{Backend, DefaultBackend, HeapBackend, PoolBackend};
pub use batch::Batch;
pub use global::global;
pub use isr::IsrQueue;
pub use manager::SignalBus;
pub use payload::{Opaque, Payload, PayloadType};
pub use traits::*;
pub use types::{
    slot, BackendKind, Handle, MemoryStats, PerfStats, Priority, SignalInfo, SlotFn, UserData,
};
