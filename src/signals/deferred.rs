/*!
 * Deferred Emission
 *
 * Bounded FIFO of owned (name, payload) pairs replayed through `emit` on
 * flush, plus the namespace prefix applied by `emit_namespaced`.
 */

use super::backend::Backend;
use super::manager::SignalBus;
use super::payload::Payload;
use super::traits::SignalEmitter;
use crate::core::data_structures::InlineString;
use crate::core::errors::{BusError, BusResult, Resource};
use crate::core::limits::NAMESPACE_SEPARATOR;
use crossbeam_queue::ArrayQueue;
use log::debug;

type Deferred = (InlineString, Payload<'static>);

/// Bounded lock-free queue of pending emissions
pub(crate) struct DeferredQueue {
    queue: ArrayQueue<Deferred>,
}

impl DeferredQueue {
    /// `capacity` is raised to 1 if zero
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: ArrayQueue::new(capacity.max(1)),
        }
    }

    pub fn push(&self, name: &str, payload: Payload<'_>) -> BusResult<()> {
        self.queue
            .push((InlineString::from(name), payload.into_owned()))
            .map_err(|_| {
                BusError::ResourceExhausted(Resource::DeferredQueue {
                    capacity: self.queue.capacity(),
                })
            })
    }

    pub fn pop(&self) -> Option<Deferred> {
        self.queue.pop()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Drop every buffered entry, returning how many were dropped
    pub fn clear(&self) -> usize {
        let mut dropped = 0;
        while self.queue.pop().is_some() {
            dropped += 1;
        }
        dropped
    }
}

impl<B: Backend> SignalBus<B> {
    /// Buffer an emission for the next [`flush_deferred`](Self::flush_deferred)
    ///
    /// String and blob payloads are copied so the caller's data may go away.
    pub fn emit_deferred(&self, name: &str, payload: Payload<'_>) -> BusResult<()> {
        self.guarded(|| {
            if !self.is_initialized() {
                return Err(BusError::not_initialized());
            }
            self.deferred.push(name, payload)?;
            debug!("Deferred emission of '{}'", name);
            Ok(())
        })
    }

    /// Replay buffered emissions in FIFO order
    ///
    /// Entries failing to emit are reported and dropped. Returns the number
    /// delivered. Only entries queued before the flush started are replayed;
    /// anything slots defer during the flush waits for the next one.
    pub fn flush_deferred(&self) -> BusResult<usize> {
        let _token = self.guard.enter();
        if !self.is_initialized() {
            return self.report(Err(BusError::not_initialized()));
        }

        let mut delivered = 0;
        let queued = self.deferred.len();
        for _ in 0..queued {
            let Some((name, payload)) = self.deferred.pop() else {
                break;
            };
            match self.emit_unguarded(&name, &payload) {
                Ok(()) => delivered += 1,
                Err(err) => self.notify(&err),
            }
        }
        debug!("Flushed {} deferred emissions", delivered);
        Ok(delivered)
    }

    /// Emissions waiting for a flush
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    /// Set or clear the default namespace
    pub fn set_namespace(&self, namespace: Option<&str>) {
        *self.namespace.write() = namespace.map(InlineString::from);
    }

    pub fn namespace(&self) -> Option<String> {
        self.namespace
            .read()
            .as_ref()
            .map(|ns| ns.as_str().to_string())
    }

    /// Emit `namespace.name`
    ///
    /// `None` falls back to the current default namespace; with neither, the
    /// bare name is emitted.
    pub fn emit_namespaced(
        &self,
        namespace: Option<&str>,
        name: &str,
        payload: &Payload<'_>,
    ) -> BusResult<()> {
        let full = self.qualify(namespace, name);
        self.emit(&full, payload)
    }

    pub(crate) fn qualify(&self, namespace: Option<&str>, name: &str) -> InlineString {
        let current = self.namespace.read();
        match namespace.or(current.as_ref().map(|ns| ns.as_str())) {
            Some(ns) => InlineString::from(format!("{}{}{}", ns, NAMESPACE_SEPARATOR, name)),
            None => InlineString::from(name),
        }
    }
}
