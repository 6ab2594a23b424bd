/*!
 * Interrupt-Safe Emission Queue
 *
 * Fixed ring of `{name, value}` entries with one atomic state word each.
 * Producers never lock, allocate or log; they can run in interrupt or
 * signal-handler context. Draining is an explicit caller action.
 *
 * # Memory ordering
 *
 * A producer claims a free entry with a CAS, writes name and value, then
 * publishes it with a `Release` store of `PENDING`. The consumer claims with
 * an `Acquire` CAS, so it observes the complete name and value.
 */

use super::backend::Backend;
use super::manager::SignalBus;
use super::traits::SignalEmitter;
use crate::core::data_structures::InlineString;
use crate::core::errors::{BusError, BusResult, Resource};
use crate::core::limits::{ISR_NAME_LEN, ISR_QUEUE_DEPTH};
use log::debug;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU8, Ordering};

const FREE: u8 = 0;
const WRITING: u8 = 1;
const PENDING: u8 = 2;
const READING: u8 = 3;

const _: () = assert!(ISR_NAME_LEN <= u8::MAX as usize);

struct Entry {
    state: AtomicU8,
    len: UnsafeCell<u8>,
    name: UnsafeCell<[u8; ISR_NAME_LEN]>,
    value: UnsafeCell<i32>,
}

impl Entry {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(FREE),
            len: UnsafeCell::new(0),
            name: UnsafeCell::new([0; ISR_NAME_LEN]),
            value: UnsafeCell::new(0),
        }
    }
}

/// Lock-free multi-producer queue of integer emissions
///
/// Names longer than `ISR_NAME_LEN` bytes are cut at the last char boundary
/// that fits. Entries drain in slot order, which matches push order only
/// while the queue has not wrapped.
pub struct IsrQueue<const N: usize = ISR_QUEUE_DEPTH> {
    entries: [Entry; N],
}

// Entry contents are only touched by the thread that won the state CAS.
unsafe impl<const N: usize> Sync for IsrQueue<N> {}

impl<const N: usize> IsrQueue<N> {
    pub fn new() -> Self {
        Self {
            entries: std::array::from_fn(|_| Entry::new()),
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Enqueue `(name, value)` without blocking or allocating
    pub fn push(&self, name: &str, value: i32) -> BusResult<()> {
        if name.is_empty() {
            return Err(BusError::InvalidArgument(InlineString::from(
                "signal name is empty",
            )));
        }

        for entry in &self.entries {
            if entry
                .state
                .compare_exchange(FREE, WRITING, Ordering::Acquire, Ordering::Relaxed)
                .is_err()
            {
                continue;
            }

            let len = truncated_len(name, ISR_NAME_LEN);
            // SAFETY: WRITING gives this thread exclusive access to the entry,
            // so the `&mut` to its name buffer is the only reference to it
            unsafe {
                (&mut *entry.name.get())[..len].copy_from_slice(&name.as_bytes()[..len]);
                *entry.len.get() = len as u8;
                *entry.value.get() = value;
            }
            entry.state.store(PENDING, Ordering::Release);
            return Ok(());
        }

        Err(BusError::ResourceExhausted(Resource::IsrQueue { capacity: N }))
    }

    /// Hand every pending entry to `f` and free it; returns the count
    pub fn drain(&self, mut f: impl FnMut(&str, i32)) -> usize {
        let mut drained = 0;
        for entry in &self.entries {
            if entry
                .state
                .compare_exchange(PENDING, READING, Ordering::Acquire, Ordering::Relaxed)
                .is_err()
            {
                continue;
            }

            let mut name = [0u8; ISR_NAME_LEN];
            // SAFETY: READING gives this thread exclusive access to the entry,
            // so no writer aliases the shared borrow of its name buffer
            let (len, value) = unsafe {
                let len = usize::from(*entry.len.get());
                name[..len].copy_from_slice(&(&*entry.name.get())[..len]);
                (len, *entry.value.get())
            };
            entry.state.store(FREE, Ordering::Release);

            let decoded = std::str::from_utf8(&name[..len]);
            debug_assert!(decoded.is_ok(), "queued names are cut on char boundaries");
            f(decoded.unwrap_or_default(), value);
            drained += 1;
        }
        drained
    }

    /// Entries waiting to be drained
    pub fn pending(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.state.load(Ordering::Acquire) == PENDING)
            .count()
    }
}

impl<const N: usize> Default for IsrQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Longest prefix of `name` within `max` bytes ending on a char boundary
fn truncated_len(name: &str, max: usize) -> usize {
    if name.len() <= max {
        return name.len();
    }
    let mut end = max;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    end
}

impl<B: Backend> SignalBus<B> {
    /// Queue an integer emission from interrupt context
    ///
    /// Touches neither the registry nor the concurrency guard, and never
    /// invokes the error hook.
    pub fn emit_from_isr(&self, name: &str, value: i32) -> BusResult<()> {
        self.isr.push(name, value)
    }

    /// Replay queued interrupt emissions through `emit_int`
    ///
    /// Failed entries are reported and dropped. Returns the number delivered.
    pub fn drain_isr(&self) -> usize {
        let mut delivered = 0;
        self.isr.drain(|name, value| {
            if self.emit_int(name, value).is_ok() {
                delivered += 1;
            }
        });
        if delivered > 0 {
            debug!("Drained {} interrupt emissions", delivered);
        }
        delivered
    }

    /// Interrupt emissions waiting for [`drain_isr`](Self::drain_isr)
    pub fn isr_pending(&self) -> usize {
        self.isr.pending()
    }
}
