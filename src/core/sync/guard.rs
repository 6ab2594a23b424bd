/*!
 * Concurrency Guard
 *
 * Optional process-wide lock serializing bus operations
 */

#[cfg(feature = "thread-safety")]
use log::debug;
#[cfg(not(feature = "thread-safety"))]
use log::warn;
use parking_lot::lock_api::ArcReentrantMutexGuard;
use parking_lot::{RawMutex, RawThreadId, ReentrantMutex, RwLock};
use std::sync::Arc;

/// Proof that the guard is held; releases on drop
pub type GuardToken = ArcReentrantMutexGuard<RawMutex, RawThreadId, ()>;

/// Coarse lock wrapping every mutating and emitting bus call
///
/// Disabled by default. Enabling allocates the underlying mutex, disabling
/// releases it; callers already inside keep their own reference until they
/// leave. The mutex is reentrant, so a callback running under the guard may
/// call back into the bus on the same thread without deadlocking.
pub struct ConcurrencyGuard {
    lock: RwLock<Option<Arc<ReentrantMutex<()>>>>,
}

impl ConcurrencyGuard {
    pub fn new(enabled: bool) -> Self {
        let guard = Self {
            lock: RwLock::new(None),
        };
        guard.set_enabled(enabled);
        guard
    }

    /// Toggle the guard, allocating or releasing the mutex on each transition
    pub fn set_enabled(&self, enabled: bool) {
        #[cfg(feature = "thread-safety")]
        {
            let mut slot = self.lock.write();
            match (enabled, slot.is_some()) {
                (true, false) => {
                    *slot = Some(Arc::new(ReentrantMutex::new(())));
                    debug!("Concurrency guard enabled");
                }
                (false, true) => {
                    *slot = None;
                    debug!("Concurrency guard disabled");
                }
                _ => {}
            }
        }

        #[cfg(not(feature = "thread-safety"))]
        if enabled {
            warn!("Concurrency guard requested but thread-safety support is compiled out");
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.lock.read().is_some()
    }

    /// Acquire the guard if enabled
    ///
    /// Returns `None` when disabled; the caller proceeds unserialized.
    #[inline]
    pub fn enter(&self) -> Option<GuardToken> {
        let lock = self.lock.read().clone()?;
        Some(lock.lock_arc())
    }
}

impl Default for ConcurrencyGuard {
    fn default() -> Self {
        Self::new(false)
    }
}

impl std::fmt::Debug for ConcurrencyGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrencyGuard")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
