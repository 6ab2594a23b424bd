/*!
 * Registry Internals
 *
 * Signal and slot records plus the slot-table operations. A signal's slot
 * table is a singly linked list threaded through the slot storage by index,
 * ordered by non-increasing priority with ties in connection order.
 *
 * While a signal is emitting, removal only sets a tombstone; the table is
 * physically changed by `sweep` once the emitting depth is back to zero.
 *
 * Unlinked slots are parked in `released` rather than dropped. Their
 * callbacks and contexts may run arbitrary code on drop, so the bus takes
 * them with `take_released` and drops them after releasing the state lock.
 */

use super::backend::Backend;
use super::types::{
    BackendKind, Handle, MemoryStats, PerfStats, Priority, SignalInfo, SlotFn, UserData,
};
use crate::core::data_structures::{InlineString, SignalName};
use crate::core::errors::{BusError, BusResult, Resource};
use crate::core::memory::{Storage, StorageError};
use log::debug;

/// One connection
pub struct SlotEntry {
    pub(crate) handle: Handle,
    pub(crate) callback: SlotFn,
    pub(crate) user_data: Option<UserData>,
    pub(crate) priority: Priority,
    pub(crate) removed: bool,
    pub(crate) next: Option<usize>,
}

impl SlotEntry {
    pub(crate) fn new(
        handle: Handle,
        callback: SlotFn,
        user_data: Option<UserData>,
        priority: Priority,
    ) -> Self {
        Self {
            handle,
            callback,
            user_data,
            priority,
            removed: false,
            next: None,
        }
    }
}

/// One registered signal
pub struct SignalEntry<N> {
    pub(crate) name: N,
    pub(crate) description: Option<InlineString>,
    pub(crate) priority: Priority,
    pub(crate) head: Option<usize>,
    /// Live (non-tombstoned) slots
    pub(crate) slot_count: usize,
    pub(crate) tombstones: usize,
    /// Nesting depth of in-progress emissions
    pub(crate) emitting: u32,
    /// Bus-unique identity; storage indices are reused, serials are not
    pub(crate) serial: u64,
    pub(crate) perf: PerfStats,
}

/// Identifies a signal across lock releases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SignalRef {
    pub index: usize,
    pub serial: u64,
}

/// Callback waiting to be linked
///
/// Stays with the caller when the connect is rejected.
pub(crate) struct PendingSlot {
    pub callback: SlotFn,
    pub user_data: Option<UserData>,
    /// `None` takes the signal's declared priority
    pub priority: Option<Priority>,
}

/// One step of an emission walk
pub(crate) struct Step {
    pub next: Option<usize>,
    /// Callback to run, or `None` for a tombstone
    pub target: Option<(SlotFn, Option<UserData>)>,
}

/// Signal and slot storage for one bus
pub(crate) struct Registry<B: Backend> {
    signals: B::Signals,
    slots: B::Slots,
    peak_slots: usize,
    released: Vec<SlotEntry>,
}

impl<B: Backend> Registry<B> {
    pub fn new() -> Self {
        Self {
            signals: B::Signals::default(),
            slots: B::Slots::default(),
            peak_slots: 0,
            released: Vec::new(),
        }
    }

    /// Slots unlinked since the last call, for dropping outside the lock
    pub fn take_released(&mut self) -> Vec<SlotEntry> {
        std::mem::take(&mut self.released)
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.signals
            .iter()
            .find(|(_, signal)| signal.name.as_str() == name)
            .map(|(index, _)| index)
    }

    pub fn lookup(&self, name: &str) -> BusResult<usize> {
        self.find(name).ok_or_else(|| BusError::signal_not_found(name))
    }

    pub fn count(&self) -> usize {
        self.signals.len()
    }

    pub fn register(
        &mut self,
        name: &str,
        description: Option<&str>,
        priority: Priority,
        serial: u64,
    ) -> BusResult<()> {
        let name = validate_name::<B::Name>(name)?;
        if self.find(name.as_str()).is_some() {
            return Err(BusError::AlreadyExists(InlineString::from(name.as_str())));
        }

        let entry = SignalEntry {
            name,
            description: description.map(InlineString::from),
            priority,
            head: None,
            slot_count: 0,
            tombstones: 0,
            emitting: 0,
            serial,
            perf: PerfStats::default(),
        };

        self.signals.insert(entry).map_err(|err| match err {
            StorageError::Full { capacity } => {
                BusError::ResourceExhausted(Resource::SignalPool { capacity })
            }
            StorageError::OutOfMemory => {
                BusError::AllocationFailure(InlineString::from("signal storage"))
            }
        })?;
        Ok(())
    }

    /// Remove a signal and every slot it owns, tombstoned or not
    pub fn unregister(&mut self, name: &str) -> BusResult<usize> {
        let index = self.lookup(name)?;
        let released = self.free_chain(index);
        self.signals.remove(index);
        Ok(released)
    }

    /// Link the pending slot into the table
    ///
    /// `pending` is taken and `next_handle` drawn only once the per-signal cap
    /// and slot storage both have room; on failure the slot is left in place.
    pub fn connect(
        &mut self,
        index: usize,
        max_slots: usize,
        pending: &mut Option<PendingSlot>,
        next_handle: impl FnOnce() -> Handle,
    ) -> BusResult<Handle> {
        let signal = self
            .signals
            .get(index)
            .ok_or_else(|| BusError::NotFound(InlineString::from("signal")))?;
        if signal.slot_count >= max_slots {
            return Err(BusError::ResourceExhausted(Resource::SlotsPerSignal {
                limit: max_slots,
            }));
        }
        let declared = signal.priority;
        self.slots.reserve().map_err(slot_storage_error)?;

        let Some(PendingSlot {
            callback,
            user_data,
            priority,
        }) = pending.take()
        else {
            return Err(BusError::InvalidArgument(InlineString::from(
                "no slot to connect",
            )));
        };
        let handle = next_handle();
        let slot = SlotEntry::new(handle, callback, user_data, priority.unwrap_or(declared));
        let slot_index = self.slots.insert(slot).map_err(slot_storage_error)?;

        self.link_ordered(index, slot_index);
        if let Some(signal) = self.signals.get_mut(index) {
            signal.slot_count += 1;
        }
        self.peak_slots = self.peak_slots.max(self.slots.len());
        Ok(handle)
    }

    /// Insert after the last slot whose priority is >= the new one
    fn link_ordered(&mut self, index: usize, slot_index: usize) {
        let Some(priority) = self.slots.get(slot_index).map(|slot| slot.priority) else {
            return;
        };
        let Some(head) = self.signals.get(index).map(|signal| signal.head) else {
            return;
        };

        let mut prev = None;
        let mut cursor = head;
        while let Some(at) = cursor {
            let Some(slot) = self.slots.get(at) else { break };
            if slot.priority < priority {
                break;
            }
            prev = Some(at);
            cursor = slot.next;
        }

        if let Some(slot) = self.slots.get_mut(slot_index) {
            slot.next = cursor;
        }
        match prev {
            Some(at) => {
                if let Some(slot) = self.slots.get_mut(at) {
                    slot.next = Some(slot_index);
                }
            }
            None => {
                if let Some(signal) = self.signals.get_mut(index) {
                    signal.head = Some(slot_index);
                }
            }
        }
    }

    /// Retire the first live slot matching `pred`
    pub fn remove_first(&mut self, index: usize, pred: impl Fn(&SlotEntry) -> bool) -> bool {
        let mut prev = None;
        let mut cursor = self.signals.get(index).and_then(|signal| signal.head);
        while let Some(at) = cursor {
            let Some(slot) = self.slots.get(at) else { break };
            if !slot.removed && pred(slot) {
                self.retire(index, prev, at);
                return true;
            }
            prev = Some(at);
            cursor = slot.next;
        }
        false
    }

    /// Locate the signal owning a live slot with `handle`
    pub fn find_handle(&self, handle: Handle) -> Option<usize> {
        self.signals.iter().find_map(|(index, signal)| {
            let mut cursor = signal.head;
            while let Some(at) = cursor {
                let slot = self.slots.get(at)?;
                if !slot.removed && slot.handle == handle {
                    return Some(index);
                }
                cursor = slot.next;
            }
            None
        })
    }

    /// Retire every live slot of a signal, returning how many were retired
    pub fn retire_all(&mut self, index: usize) -> usize {
        let Some(signal) = self.signals.get(index) else {
            return 0;
        };
        let retired = signal.slot_count;

        if signal.emitting == 0 {
            self.free_chain(index);
            return retired;
        }

        let mut cursor = signal.head;
        while let Some(at) = cursor {
            let Some(slot) = self.slots.get_mut(at) else { break };
            if !slot.removed {
                slot.removed = true;
            }
            cursor = slot.next;
        }
        if let Some(signal) = self.signals.get_mut(index) {
            signal.tombstones += signal.slot_count;
            signal.slot_count = 0;
        }
        retired
    }

    /// Remove a slot from its table, or tombstone it while the signal is emitting
    fn retire(&mut self, index: usize, prev: Option<usize>, at: usize) {
        let Some(signal) = self.signals.get_mut(index) else {
            return;
        };
        signal.slot_count -= 1;

        if signal.emitting > 0 {
            signal.tombstones += 1;
            if let Some(slot) = self.slots.get_mut(at) {
                slot.removed = true;
            }
            return;
        }

        self.unlink(index, prev, at);
    }

    fn unlink(&mut self, index: usize, prev: Option<usize>, at: usize) {
        let Some(slot) = self.slots.remove(at) else {
            return;
        };
        match prev {
            Some(p) => {
                if let Some(prev_slot) = self.slots.get_mut(p) {
                    prev_slot.next = slot.next;
                }
            }
            None => {
                if let Some(signal) = self.signals.get_mut(index) {
                    signal.head = slot.next;
                }
            }
        }
        self.released.push(slot);
    }

    /// Physically reclaim every tombstoned slot of an idle signal
    pub fn sweep(&mut self, index: usize) -> usize {
        match self.signals.get(index) {
            Some(signal) if signal.emitting == 0 && signal.tombstones > 0 => {}
            _ => return 0,
        }

        let mut swept = 0;
        let mut prev = None;
        let mut cursor = self.signals.get(index).and_then(|signal| signal.head);
        while let Some(at) = cursor {
            let Some(slot) = self.slots.get(at) else { break };
            let (removed, next) = (slot.removed, slot.next);
            if removed {
                self.unlink(index, prev, at);
                swept += 1;
            } else {
                prev = Some(at);
            }
            cursor = next;
        }

        if let Some(signal) = self.signals.get_mut(index) {
            signal.tombstones = 0;
        }
        if swept > 0 {
            debug!("Swept {} removed slots", swept);
        }
        swept
    }

    /// Free a signal's whole chain without deferral
    fn free_chain(&mut self, index: usize) -> usize {
        let Some(signal) = self.signals.get_mut(index) else {
            return 0;
        };
        let mut cursor = signal.head.take();
        signal.slot_count = 0;
        signal.tombstones = 0;

        let mut released = 0;
        while let Some(slot) = cursor.and_then(|at| self.slots.remove(at)) {
            cursor = slot.next;
            self.released.push(slot);
            released += 1;
        }
        released
    }

    /// Enter emission of `name`: bump its depth and return the walk start
    pub fn begin_emit(&mut self, name: &str) -> BusResult<(SignalRef, Option<usize>)> {
        let index = self.lookup(name)?;
        let signal = self
            .signals
            .get_mut(index)
            .ok_or_else(|| BusError::signal_not_found(name))?;
        signal.emitting += 1;
        Ok((
            SignalRef {
                index,
                serial: signal.serial,
            },
            signal.head,
        ))
    }

    /// Read the slot at `cursor` if the signal is still the one being walked
    pub fn step(&self, at: SignalRef, cursor: usize) -> Option<Step> {
        let signal = self.signals.get(at.index)?;
        if signal.serial != at.serial {
            return None;
        }
        let slot = self.slots.get(cursor)?;
        Some(Step {
            next: slot.next,
            target: (!slot.removed).then(|| (slot.callback.clone(), slot.user_data.clone())),
        })
    }

    /// Leave emission: drop the depth, record timing, sweep once idle
    pub fn end_emit(&mut self, at: SignalRef, elapsed_ns: Option<u64>) -> usize {
        let Some(signal) = self.signals.get_mut(at.index) else {
            return 0;
        };
        if signal.serial != at.serial {
            return 0;
        }

        signal.emitting = signal.emitting.saturating_sub(1);
        if let Some(elapsed) = elapsed_ns {
            signal.perf.record(elapsed);
        }
        if signal.emitting == 0 {
            self.sweep(at.index)
        } else {
            0
        }
    }

    pub fn list(&self) -> Vec<SignalInfo> {
        self.signals
            .iter()
            .map(|(_, signal)| SignalInfo {
                name: signal.name.as_str().to_string(),
                description: signal.description.as_ref().map(|d| d.as_str().to_string()),
                priority: signal.priority,
                slot_count: signal.slot_count,
            })
            .collect()
    }

    pub fn perf_stats(&self, name: &str) -> BusResult<PerfStats> {
        let index = self.lookup(name)?;
        self.signals
            .get(index)
            .map(|signal| signal.perf)
            .ok_or_else(|| BusError::signal_not_found(name))
    }

    pub fn reset_perf_stats(&mut self) {
        let indices: Vec<usize> = self.signals.iter().map(|(index, _)| index).collect();
        for index in indices {
            if let Some(signal) = self.signals.get_mut(index) {
                signal.perf = PerfStats::default();
            }
        }
    }

    pub fn memory_stats(&self, backend: BackendKind) -> MemoryStats {
        let string_bytes = self
            .signals
            .iter()
            .map(|(_, signal)| {
                signal.name.as_str().len() + signal.description.as_ref().map_or(0, |d| d.len())
            })
            .sum();

        MemoryStats {
            backend,
            signals_allocated: self.signals.reserved(),
            signals_used: self.signals.len(),
            slots_allocated: self.slots.reserved(),
            slots_used: self.slots.len(),
            peak_slots_used: self.peak_slots,
            string_bytes,
        }
    }

    pub fn reset_peak(&mut self) {
        self.peak_slots = self.slots.len();
    }
}

fn slot_storage_error(err: StorageError) -> BusError {
    match err {
        StorageError::Full { capacity } => {
            BusError::ResourceExhausted(Resource::SlotPool { capacity })
        }
        StorageError::OutOfMemory => {
            BusError::AllocationFailure(InlineString::from("slot storage"))
        }
    }
}

fn validate_name<N: SignalName>(name: &str) -> BusResult<N> {
    if name.is_empty() {
        return Err(BusError::InvalidArgument(InlineString::from(
            "signal name is empty",
        )));
    }
    N::from_name(name).ok_or_else(|| {
        BusError::InvalidArgument(InlineString::from(format!(
            "signal name exceeds {} bytes",
            N::MAX_LEN
        )))
    })
}
