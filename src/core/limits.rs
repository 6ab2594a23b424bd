/*!
 * System Limits and Constants
 *
 * Centralized location for bus-wide limits and build-time sizing.
 * Organized by domain for maintainability and discoverability.
 *
 * - Performance-critical constants are marked with [PERF]
 * - Values that size fixed memory are marked with [STATIC]
 */

// =============================================================================
// CONNECTION LIMITS
// =============================================================================

/// Default cap on live slots per signal
#[cfg(not(feature = "embedded"))]
pub const DEFAULT_MAX_SLOTS_PER_SIGNAL: usize = 100;

/// Default cap on live slots per signal for embedded builds
#[cfg(feature = "embedded")]
pub const DEFAULT_MAX_SLOTS_PER_SIGNAL: usize = 10;

// =============================================================================
// NAME LIMITS
// =============================================================================

/// Longest signal name accepted by the heap backend (bytes)
pub const HEAP_MAX_NAME_LEN: usize = 255;

/// Longest signal name accepted by the pool backend (bytes)
/// [STATIC] Width of each pooled name buffer
pub const POOL_MAX_NAME_LEN: usize = 31;

// =============================================================================
// POOL SIZING
// =============================================================================

/// Signal entries in the default bounded pool
/// [STATIC]
pub const POOL_MAX_SIGNALS: usize = 32;

/// Slot entries in the default bounded pool, shared by all signals
/// [STATIC]
pub const POOL_MAX_SLOTS: usize = 128;

// =============================================================================
// INTERRUPT PATH
// =============================================================================

/// Entries in the interrupt-safe queue
/// [STATIC] [PERF] Scanned linearly on every push
pub const ISR_QUEUE_DEPTH: usize = 16;

/// Name buffer width of each interrupt queue entry (bytes)
/// Longer names are truncated on a char boundary
/// [STATIC]
pub const ISR_NAME_LEN: usize = 32;

// =============================================================================
// BUFFERED EMISSION
// =============================================================================

/// Default capacity of the deferred emission queue
pub const DEFAULT_DEFERRED_CAPACITY: usize = 64;

/// Joins a namespace and a signal name
pub const NAMESPACE_SEPARATOR: char = '.';

const _: () = assert!(POOL_MAX_NAME_LEN <= u8::MAX as usize);
const _: () = assert!(POOL_MAX_NAME_LEN <= HEAP_MAX_NAME_LEN);
const _: () = assert!(ISR_NAME_LEN >= 4);
