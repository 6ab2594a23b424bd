/*!
 * Core Module
 * Errors, limits, configuration, storage and synchronization shared by the bus
 */

pub mod config;
pub mod data_structures;
pub mod errors;
pub mod limits;
pub mod memory;
pub mod sync;

// Re-export for convenience
pub use config::BusConfig;
pub use data_structures::{FixedName, InlineString, SignalName};
pub use errors::*;
pub use memory::{HeapArena, PoolArena, Storage, StorageError};
pub use sync::{ConcurrencyGuard, GuardToken};
