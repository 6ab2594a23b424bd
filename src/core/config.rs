/*!
 * Bus Configuration
 *
 * Runtime knobs consumed by the signal bus
 */

use super::limits::{DEFAULT_DEFERRED_CAPACITY, DEFAULT_MAX_SLOTS_PER_SIGNAL};
use serde::{Deserialize, Serialize};

/// Signal bus configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Maximum live slots per signal
    pub max_slots_per_signal: usize,
    /// Start with the concurrency guard enabled
    pub thread_safe: bool,
    /// Record per-signal emission timing
    pub profiling: bool,
    /// Capacity of the deferred emission queue
    pub deferred_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            max_slots_per_signal: DEFAULT_MAX_SLOTS_PER_SIGNAL,
            thread_safe: false,
            profiling: false,
            deferred_capacity: DEFAULT_DEFERRED_CAPACITY,
        }
    }
}

impl BusConfig {
    /// Configuration for small single-threaded targets
    pub const fn embedded() -> Self {
        Self {
            max_slots_per_signal: 10,
            thread_safe: false,
            profiling: false,
            deferred_capacity: 8,
        }
    }

    /// Configuration for multi-threaded hosts (guard enabled from the start)
    pub fn threaded() -> Self {
        Self {
            thread_safe: true,
            ..Self::default()
        }
    }
}
