/*!
 * Memory Backend Selection
 *
 * Binds signal and slot records to a storage strategy. A bus is generic over
 * its backend, so the choice is made at compile time and never branches on
 * the hot path.
 */

use super::internal_types::{SignalEntry, SlotEntry};
use super::types::BackendKind;
use crate::core::data_structures::{FixedName, InlineString, SignalName};
use crate::core::limits::{POOL_MAX_NAME_LEN, POOL_MAX_SIGNALS, POOL_MAX_SLOTS};
use crate::core::memory::{HeapArena, PoolArena, Storage};

/// Storage strategy for a signal bus
pub trait Backend: Send + 'static {
    /// Signal name representation
    type Name: SignalName;
    type Signals: Storage<SignalEntry<Self::Name>> + Send;
    type Slots: Storage<SlotEntry> + Send;

    const KIND: BackendKind;
}

/// Unbounded heap storage
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapBackend;

impl Backend for HeapBackend {
    type Name = InlineString;
    type Signals = HeapArena<SignalEntry<InlineString>>;
    type Slots = HeapArena<SlotEntry>;

    const KIND: BackendKind = BackendKind::Heap;
}

/// Fixed-capacity pools: `SIGNALS` signal entries and `SLOTS` slot entries
/// shared by all signals, names limited to the pooled buffer width
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolBackend<const SIGNALS: usize = POOL_MAX_SIGNALS, const SLOTS: usize = POOL_MAX_SLOTS>;

impl<const SIGNALS: usize, const SLOTS: usize> Backend for PoolBackend<SIGNALS, SLOTS> {
    type Name = FixedName<POOL_MAX_NAME_LEN>;
    type Signals = PoolArena<SignalEntry<FixedName<POOL_MAX_NAME_LEN>>, SIGNALS>;
    type Slots = PoolArena<SlotEntry, SLOTS>;

    const KIND: BackendKind = BackendKind::Pool;
}

/// Backend selected by the `static-memory` feature
#[cfg(feature = "static-memory")]
pub type DefaultBackend = PoolBackend;

/// Backend selected by the `static-memory` feature
#[cfg(not(feature = "static-memory"))]
pub type DefaultBackend = HeapBackend;
