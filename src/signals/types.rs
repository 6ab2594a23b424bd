/*!
 * Signal Types
 * Public value types shared by the registry, connection and emission APIs
 */

use super::payload::{Opaque, Payload};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Opaque user context stored with a slot and handed back on every call
pub type UserData = Opaque;

/// Slot callback
///
/// Slots have no error channel; whatever a callback does with a failure is
/// its own business.
pub type SlotFn = Arc<dyn Fn(&Payload<'_>, Option<&UserData>) + Send + Sync>;

/// Wrap a closure as a [`SlotFn`]
///
/// Keep the returned `Arc` to disconnect by callback later.
pub fn slot<F>(f: F) -> SlotFn
where
    F: Fn(&Payload<'_>, Option<&UserData>) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Callback identity: same allocation, regardless of vtable
#[inline]
pub(crate) fn same_slot(a: &SlotFn, b: &SlotFn) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Slot priority; higher runs first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(pub i32);

impl Priority {
    pub const LOW: Priority = Priority(0);
    pub const NORMAL: Priority = Priority(5);
    pub const HIGH: Priority = Priority(10);
    pub const CRITICAL: Priority = Priority(15);
}

impl Default for Priority {
    fn default() -> Self {
        Priority::NORMAL
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Priority(value)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connection handle
///
/// Issued from a monotonic counter starting at 1 and never reused.
/// `Handle::INVALID` (0) is never issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(u64);

impl Handle {
    pub const INVALID: Handle = Handle(0);

    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Handle(raw)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Snapshot of one registered signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalInfo {
    pub name: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub slot_count: usize,
}

/// Per-signal emission timing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerfStats {
    pub total_emissions: u64,
    pub total_time_ns: u64,
    pub avg_time_ns: u64,
    pub min_time_ns: u64,
    pub max_time_ns: u64,
}

impl PerfStats {
    pub(crate) fn record(&mut self, elapsed_ns: u64) {
        self.total_emissions += 1;
        self.total_time_ns = self.total_time_ns.saturating_add(elapsed_ns);
        self.avg_time_ns = self.total_time_ns / self.total_emissions;
        self.max_time_ns = self.max_time_ns.max(elapsed_ns);
        if self.total_emissions == 1 || elapsed_ns < self.min_time_ns {
            self.min_time_ns = elapsed_ns;
        }
    }
}

/// Storage strategy behind a bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Heap,
    Pool,
}

/// Memory usage snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub backend: BackendKind,
    /// Signal entries reserved (pool capacity, or arena length on the heap)
    pub signals_allocated: usize,
    pub signals_used: usize,
    /// Slot entries reserved (pool capacity, or arena length on the heap)
    pub slots_allocated: usize,
    /// Slot entries occupied, including tombstones awaiting sweep
    pub slots_used: usize,
    pub peak_slots_used: usize,
    /// Bytes of signal names and descriptions
    pub string_bytes: usize,
}
