/*!
 * Sigslot Library
 * Priority-ordered signal/slot dispatch with heap and fixed-pool backends
 */

pub mod core;
pub mod signals;

// Re-exports
pub use crate::core::{BusConfig, BusError, BusResult, ErrorHook, ErrorKind, Resource};
pub use signals::*;
