/*!
 * Signal Delivery
 *
 * Synchronous emission: walk a signal's slot table on the caller's thread.
 *
 * The state lock is taken once to enter the signal, then once per slot to
 * read its link and callback, and released before each callback runs. A
 * slot may therefore connect, disconnect or emit on the same bus. Removal
 * during the walk only tombstones; the scope guard leaving the outermost
 * emission sweeps.
 */

use super::backend::Backend;
use super::internal_types::SignalRef;
use super::manager::SignalBus;
use super::payload::Payload;
use super::traits::SignalEmitter;
use crate::core::errors::{BusError, BusResult};
use log::debug;
use std::sync::atomic::Ordering;
use std::time::Instant;

/// Emitting depth held for one emission
///
/// Leaves the signal on drop, unwinding included, so a panicking slot never
/// leaves the signal stuck in the emitting state.
struct EmitScope<'a, B: Backend> {
    bus: &'a SignalBus<B>,
    at: SignalRef,
    started: Option<Instant>,
}

impl<B: Backend> Drop for EmitScope<'_, B> {
    fn drop(&mut self) {
        let elapsed = self
            .started
            .map(|started| u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX));
        let released = self.bus.state.lock().as_mut().map(|registry| {
            registry.end_emit(self.at, elapsed);
            registry.take_released()
        });
        // Swept slots drop outside the state lock
        drop(released);
    }
}

impl<B: Backend> SignalBus<B> {
    /// Emission without the concurrency guard or error reporting
    pub(crate) fn emit_unguarded(&self, name: &str, payload: &Payload<'_>) -> BusResult<()> {
        let (scope, mut cursor) = {
            let mut state = self.state.lock();
            let registry = state.as_mut().ok_or_else(BusError::not_initialized)?;
            let (at, head) = registry.begin_emit(name)?;
            let started = self.profiling.load(Ordering::Relaxed).then(Instant::now);
            (
                EmitScope {
                    bus: self,
                    at,
                    started,
                },
                head,
            )
        };

        let mut invoked = 0usize;
        while let Some(at) = cursor {
            let step = {
                let state = self.state.lock();
                state.as_ref().and_then(|registry| registry.step(scope.at, at))
            };
            // Signal unregistered or bus cleaned up mid-walk
            let Some(step) = step else { break };

            cursor = step.next;
            if let Some((callback, user_data)) = step.target {
                callback(payload, user_data.as_ref());
                invoked += 1;
            }
        }

        drop(scope);
        debug!("Emitted '{}' to {} slots", name, invoked);
        Ok(())
    }
}

impl<B: Backend> SignalEmitter for SignalBus<B> {
    fn emit(&self, name: &str, payload: &Payload<'_>) -> BusResult<()> {
        self.guarded(|| self.emit_unguarded(name, payload))
    }
}
