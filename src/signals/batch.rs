/*!
 * Batch Emission
 * Owned list of emissions replayed in insertion order
 */

use super::payload::Payload;
use super::traits::SignalEmitter;
use crate::core::data_structures::InlineString;
use crate::core::errors::BusResult;

/// Emissions collected up front and fired together
///
/// Payloads are detached from borrowed data on [`add`](Batch::add), so the
/// batch may outlive whatever built it.
#[derive(Debug, Default, Clone)]
pub struct Batch {
    entries: Vec<(InlineString, Payload<'static>)>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, name: &str, payload: Payload<'_>) -> &mut Self {
        self.entries
            .push((InlineString::from(name), payload.into_owned()));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Emit every entry in order
    ///
    /// Every entry is attempted even after a failure; the first error is
    /// returned. The batch is left intact for reuse.
    pub fn emit<E: SignalEmitter + ?Sized>(&self, emitter: &E) -> BusResult<()> {
        let mut first_error = None;
        for (name, payload) in &self.entries {
            if let Err(err) = emitter.emit(name, payload) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
