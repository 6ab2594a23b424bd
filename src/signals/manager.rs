/*!
 * Signal Bus
 * Central registry for named signals, their slots and bus-wide knobs
 */

use super::backend::{Backend, DefaultBackend};
use super::deferred::DeferredQueue;
use super::internal_types::{PendingSlot, Registry};
use super::isr::IsrQueue;
use super::traits::{SignalRegistry, SlotConnections};
use super::types::{
    same_slot, Handle, MemoryStats, PerfStats, Priority, SignalInfo, SlotFn, UserData,
};
use crate::core::config::BusConfig;
use crate::core::data_structures::InlineString;
use crate::core::errors::{BusError, BusResult, ErrorHook};
use crate::core::sync::ConcurrencyGuard;
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Signal bus
///
/// Starts uninitialized: every registry, connection and emission call fails
/// with `InvalidArgument` until [`SignalBus::init`] runs.
///
/// # Locking
///
/// Registry state sits behind a short internal mutex that is never held while
/// a slot runs. The optional [`ConcurrencyGuard`] wraps whole calls,
/// including the slot walk of an emission.
pub struct SignalBus<B: Backend = DefaultBackend> {
    pub(crate) state: Mutex<Option<Registry<B>>>,
    pub(crate) guard: ConcurrencyGuard,
    next_handle: AtomicU64,
    next_serial: AtomicU64,
    max_slots: AtomicUsize,
    pub(crate) profiling: AtomicBool,
    error_hook: RwLock<Option<ErrorHook>>,
    pub(crate) namespace: RwLock<Option<InlineString>>,
    pub(crate) deferred: DeferredQueue,
    pub(crate) isr: IsrQueue,
}

impl<B: Backend> SignalBus<B> {
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    pub fn with_config(config: BusConfig) -> Self {
        Self {
            state: Mutex::new(None),
            guard: ConcurrencyGuard::new(config.thread_safe),
            next_handle: AtomicU64::new(1),
            next_serial: AtomicU64::new(1),
            max_slots: AtomicUsize::new(config.max_slots_per_signal),
            profiling: AtomicBool::new(config.profiling),
            error_hook: RwLock::new(None),
            namespace: RwLock::new(None),
            deferred: DeferredQueue::new(config.deferred_capacity),
            isr: IsrQueue::new(),
        }
    }

    /// Create the registry; a no-op if already initialized
    pub fn init(&self) -> BusResult<()> {
        let _token = self.guard.enter();
        let mut state = self.state.lock();
        if state.is_some() {
            debug!("Signal bus already initialized");
            return Ok(());
        }
        *state = Some(Registry::new());
        info!("Signal bus initialized ({:?} backend)", B::KIND);
        Ok(())
    }

    /// Release every signal, slot and buffered payload; a no-op if uninitialized
    ///
    /// Handles keep counting from where they were.
    pub fn cleanup(&self) {
        let _token = self.guard.enter();
        let registry = self.state.lock().take();
        let Some(registry) = registry else {
            return;
        };

        let buffered = self.deferred.clear();
        let interrupts = self.isr.drain(|_, _| {});
        *self.namespace.write() = None;

        let signals = registry.count();
        // Slot contexts drop here, outside the state lock
        drop(registry);
        info!(
            "Signal bus cleaned up ({} signals, {} deferred and {} interrupt emissions dropped)",
            signals, buffered, interrupts
        );
    }

    pub fn is_initialized(&self) -> bool {
        self.state.lock().is_some()
    }

    pub fn set_max_slots_per_signal(&self, max: usize) -> BusResult<()> {
        if max == 0 {
            return self.report(Err(BusError::InvalidArgument(InlineString::from(
                "slot limit must be at least 1",
            ))));
        }
        self.max_slots.store(max, Ordering::Relaxed);
        debug!("Slot limit set to {}", max);
        Ok(())
    }

    pub fn max_slots_per_signal(&self) -> usize {
        self.max_slots.load(Ordering::Relaxed)
    }

    /// Toggle the concurrency guard
    pub fn set_thread_safe(&self, enabled: bool) {
        self.guard.set_enabled(enabled);
    }

    pub fn is_thread_safe(&self) -> bool {
        self.guard.is_enabled()
    }

    pub fn set_profiling(&self, enabled: bool) {
        self.profiling.store(enabled, Ordering::Relaxed);
    }

    pub fn is_profiling(&self) -> bool {
        self.profiling.load(Ordering::Relaxed)
    }

    /// Install or remove the error hook
    pub fn set_error_handler(&self, hook: Option<ErrorHook>) {
        *self.error_hook.write() = hook;
    }

    /// Emission timing for one signal
    pub fn perf_stats(&self, name: &str) -> BusResult<PerfStats> {
        self.guarded(|| self.with_state(|registry| registry.perf_stats(name)))
    }

    pub fn reset_perf_stats(&self) {
        let _token = self.guard.enter();
        if let Some(registry) = self.state.lock().as_mut() {
            registry.reset_perf_stats();
        }
    }

    pub fn memory_stats(&self) -> BusResult<MemoryStats> {
        self.guarded(|| self.with_state(|registry| Ok(registry.memory_stats(B::KIND))))
    }

    /// Restart peak tracking from current usage
    pub fn reset_memory_stats(&self) {
        let _token = self.guard.enter();
        if let Some(registry) = self.state.lock().as_mut() {
            registry.reset_peak();
        }
    }

    /// Run `op` under the concurrency guard and report its failure
    pub(crate) fn guarded<T>(&self, op: impl FnOnce() -> BusResult<T>) -> BusResult<T> {
        let result = {
            let _token = self.guard.enter();
            op()
        };
        self.report(result)
    }

    /// Run `f` against the registry under the state lock
    ///
    /// Slots `f` removes are dropped after the lock is released, so their
    /// contexts may call back into the bus from `Drop`.
    pub(crate) fn with_state<T>(
        &self,
        f: impl FnOnce(&mut Registry<B>) -> BusResult<T>,
    ) -> BusResult<T> {
        let (result, released) = {
            let mut state = self.state.lock();
            let registry = state.as_mut().ok_or_else(BusError::not_initialized)?;
            let result = f(registry);
            (result, registry.take_released())
        };
        drop(released);
        result
    }

    pub(crate) fn report<T>(&self, result: BusResult<T>) -> BusResult<T> {
        if let Err(err) = &result {
            self.notify(err);
        }
        result
    }

    /// Log a failure and hand it to the error hook
    pub(crate) fn notify(&self, err: &BusError) {
        warn!("{}", err);
        let hook = self.error_hook.read().clone();
        if let Some(hook) = hook {
            hook(err.kind(), &err.to_string());
        }
    }

    fn connect_inner(
        &self,
        name: &str,
        callback: SlotFn,
        user_data: Option<UserData>,
        priority: Option<Priority>,
    ) -> BusResult<Handle> {
        let max_slots = self.max_slots_per_signal();
        let mut pending = Some(PendingSlot {
            callback,
            user_data,
            priority,
        });
        let result = self.with_state(|registry| {
            let index = registry.lookup(name)?;
            registry.connect(index, max_slots, &mut pending, || {
                Handle::from_raw(self.next_handle.fetch_add(1, Ordering::Relaxed))
            })
        });
        // A rejected callback drops here, outside the state lock
        drop(pending);
        let handle = result?;
        debug!("Connected slot {} to '{}'", handle, name);
        Ok(handle)
    }
}

impl<B: Backend> Default for SignalBus<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> std::fmt::Debug for SignalBus<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalBus")
            .field("backend", &B::KIND)
            .field("initialized", &self.is_initialized())
            .field("guard", &self.guard)
            .field("max_slots_per_signal", &self.max_slots_per_signal())
            .finish_non_exhaustive()
    }
}

impl<B: Backend> SignalRegistry for SignalBus<B> {
    fn register_with(
        &self,
        name: &str,
        description: Option<&str>,
        priority: Priority,
    ) -> BusResult<()> {
        self.guarded(|| {
            self.with_state(|registry| {
                let serial = self.next_serial.fetch_add(1, Ordering::Relaxed);
                registry.register(name, description, priority, serial)
            })?;
            info!("Registered signal '{}' (priority {})", name, priority);
            Ok(())
        })
    }

    fn unregister(&self, name: &str) -> BusResult<()> {
        self.guarded(|| {
            let released = self.with_state(|registry| registry.unregister(name))?;
            info!("Unregistered signal '{}' ({} slots released)", name, released);
            Ok(())
        })
    }

    fn exists(&self, name: &str) -> bool {
        let _token = self.guard.enter();
        self.state
            .lock()
            .as_ref()
            .is_some_and(|registry| registry.find(name).is_some())
    }

    fn count(&self) -> usize {
        let _token = self.guard.enter();
        self.state.lock().as_ref().map_or(0, |registry| registry.count())
    }

    fn list(&self) -> Vec<SignalInfo> {
        let _token = self.guard.enter();
        self.state
            .lock()
            .as_ref()
            .map(|registry| registry.list())
            .unwrap_or_default()
    }
}

impl<B: Backend> SlotConnections for SignalBus<B> {
    fn connect(
        &self,
        name: &str,
        callback: SlotFn,
        user_data: Option<UserData>,
    ) -> BusResult<Handle> {
        self.guarded(|| self.connect_inner(name, callback, user_data, None))
    }

    fn connect_with_priority(
        &self,
        name: &str,
        callback: SlotFn,
        user_data: Option<UserData>,
        priority: Priority,
    ) -> BusResult<Handle> {
        self.guarded(|| self.connect_inner(name, callback, user_data, Some(priority)))
    }

    fn disconnect(&self, name: &str, callback: &SlotFn) -> BusResult<()> {
        self.guarded(|| {
            self.with_state(|registry| {
                let index = registry.lookup(name)?;
                if registry.remove_first(index, |slot| same_slot(&slot.callback, callback)) {
                    Ok(())
                } else {
                    Err(BusError::NotFound(InlineString::from(format!(
                        "no matching slot on '{}'",
                        name
                    ))))
                }
            })?;
            debug!("Disconnected slot from '{}'", name);
            Ok(())
        })
    }

    fn disconnect_by_handle(&self, handle: Handle) -> BusResult<()> {
        self.guarded(|| {
            if !handle.is_valid() {
                return Err(BusError::InvalidArgument(InlineString::from(
                    "handle 0 is never issued",
                )));
            }
            self.with_state(|registry| {
                let removed = registry
                    .find_handle(handle)
                    .is_some_and(|index| registry.remove_first(index, |slot| slot.handle == handle));
                if removed {
                    Ok(())
                } else {
                    Err(BusError::NotFound(InlineString::from(format!(
                        "slot {}",
                        handle
                    ))))
                }
            })?;
            debug!("Disconnected slot {}", handle);
            Ok(())
        })
    }

    fn disconnect_all(&self, name: &str) -> BusResult<()> {
        self.guarded(|| {
            let retired = self.with_state(|registry| {
                let index = registry.lookup(name)?;
                Ok(registry.retire_all(index))
            })?;
            debug!("Disconnected {} slots from '{}'", retired, name);
            Ok(())
        })
    }
}
