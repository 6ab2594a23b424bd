/*!
 * Signal Traits
 * Registry, connection and emission abstractions
 */

use super::payload::{Opaque, Payload};
use super::types::{Handle, Priority, SignalInfo, SlotFn, UserData};
use crate::core::errors::BusResult;

/// Signal registration
pub trait SignalRegistry: Send + Sync {
    /// Register a signal with the default priority and no description
    fn register(&self, name: &str) -> BusResult<()> {
        self.register_with(name, None, Priority::default())
    }

    /// Register a signal with metadata
    ///
    /// `priority` becomes the default for slots connected without one.
    fn register_with(&self, name: &str, description: Option<&str>, priority: Priority)
        -> BusResult<()>;

    /// Remove a signal and every slot connected to it
    fn unregister(&self, name: &str) -> BusResult<()>;

    fn exists(&self, name: &str) -> bool;

    /// Number of registered signals
    fn count(&self) -> usize;

    /// Snapshot of every registered signal
    fn list(&self) -> Vec<SignalInfo>;
}

/// Slot connection management
pub trait SlotConnections: Send + Sync {
    /// Connect at the signal's declared priority
    fn connect(&self, name: &str, callback: SlotFn, user_data: Option<UserData>)
        -> BusResult<Handle>;

    fn connect_with_priority(
        &self,
        name: &str,
        callback: SlotFn,
        user_data: Option<UserData>,
        priority: Priority,
    ) -> BusResult<Handle>;

    /// Remove the first live slot of `name` whose callback is `callback`
    fn disconnect(&self, name: &str, callback: &SlotFn) -> BusResult<()>;

    fn disconnect_by_handle(&self, handle: Handle) -> BusResult<()>;

    /// Remove every slot of `name`, keeping the signal registered
    fn disconnect_all(&self, name: &str) -> BusResult<()>;
}

/// Synchronous emission
pub trait SignalEmitter: Send + Sync {
    /// Run every live slot of `name` in priority order, on the caller's thread
    fn emit(&self, name: &str, payload: &Payload<'_>) -> BusResult<()>;

    fn emit_void(&self, name: &str) -> BusResult<()> {
        self.emit(name, &Payload::Void)
    }

    fn emit_int(&self, name: &str, value: i32) -> BusResult<()> {
        self.emit(name, &Payload::Int(value))
    }

    fn emit_float(&self, name: &str, value: f32) -> BusResult<()> {
        self.emit(name, &Payload::Float(value))
    }

    fn emit_double(&self, name: &str, value: f64) -> BusResult<()> {
        self.emit(name, &Payload::Double(value))
    }

    /// Emit a string; `None` delivers a null string
    fn emit_string(&self, name: &str, value: Option<&str>) -> BusResult<()> {
        self.emit(name, &Payload::Str(value.map(Into::into)))
    }

    fn emit_pointer(&self, name: &str, value: Option<Opaque>) -> BusResult<()> {
        self.emit(name, &Payload::Pointer(value))
    }

    /// Emit an opaque blob; slots see it only for the duration of the call
    fn emit_custom(&self, name: &str, bytes: &[u8]) -> BusResult<()> {
        self.emit(name, &Payload::custom(bytes))
    }
}
