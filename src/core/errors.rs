/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use crate::core::data_structures::InlineString;
use crate::signals::payload::PayloadType;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result alias used by every bus operation
pub type BusResult<T> = Result<T, BusError>;

/// Callback invoked with every reported failure
///
/// Purely observational: it runs after the failing call released its locks
/// and cannot change the returned error.
pub type ErrorHook = Arc<dyn Fn(ErrorKind, &str) + Send + Sync>;

/// Bounded resource that ran out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "resource", rename_all = "snake_case")]
pub enum Resource {
    /// Per-signal slot cap reached
    SlotsPerSignal { limit: usize },
    /// Bounded signal pool full
    SignalPool { capacity: usize },
    /// Bounded slot pool full
    SlotPool { capacity: usize },
    /// Every interrupt queue entry is pending
    IsrQueue { capacity: usize },
    /// Deferred emission queue full
    DeferredQueue { capacity: usize },
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::SlotsPerSignal { limit } => write!(f, "slot limit of {} per signal", limit),
            Resource::SignalPool { capacity } => write!(f, "signal pool ({} entries)", capacity),
            Resource::SlotPool { capacity } => write!(f, "slot pool ({} entries)", capacity),
            Resource::IsrQueue { capacity } => write!(f, "interrupt queue ({} entries)", capacity),
            Resource::DeferredQueue { capacity } => {
                write!(f, "deferred queue ({} entries)", capacity)
            }
        }
    }
}

/// Signal bus errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum BusError {
    #[error("Invalid argument: {0}")]
    #[diagnostic(
        code(sigslot::invalid_argument),
        help("Names must be non-empty and within the backend's length limit; handles start at 1.")
    )]
    InvalidArgument(InlineString),

    #[error("Not found: {0}")]
    #[diagnostic(
        code(sigslot::not_found),
        help("The signal may never have been registered, or the slot was already disconnected.")
    )]
    NotFound(InlineString),

    #[error("Signal already exists: {0}")]
    #[diagnostic(
        code(sigslot::already_exists),
        help("Signal names are unique. Unregister the existing signal first.")
    )]
    AlreadyExists(InlineString),

    #[error("Resource exhausted: {0}")]
    #[diagnostic(
        code(sigslot::resource_exhausted),
        help("Raise the configured limit or release existing entries.")
    )]
    ResourceExhausted(Resource),

    #[error("Memory allocation failed: {0}")]
    #[diagnostic(
        code(sigslot::allocation_failure),
        help("The heap backend could not grow its storage. System may be low on memory.")
    )]
    AllocationFailure(InlineString),

    #[error("Invalid payload type: expected {expected:?}, found {found:?}")]
    #[diagnostic(
        code(sigslot::invalid_payload_type),
        help("Use the accessor matching the payload tag, or the defaulting variant.")
    )]
    InvalidPayloadType {
        expected: PayloadType,
        found: PayloadType,
    },
}

/// Flat error discriminant handed to the error hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    AlreadyExists,
    ResourceExhausted,
    AllocationFailure,
    InvalidPayloadType,
}

impl BusError {
    /// Discriminant of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            BusError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            BusError::NotFound(_) => ErrorKind::NotFound,
            BusError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            BusError::ResourceExhausted(_) => ErrorKind::ResourceExhausted,
            BusError::AllocationFailure(_) => ErrorKind::AllocationFailure,
            BusError::InvalidPayloadType { .. } => ErrorKind::InvalidPayloadType,
        }
    }

    pub(crate) fn not_initialized() -> Self {
        BusError::InvalidArgument(InlineString::from("bus not initialized"))
    }

    pub(crate) fn signal_not_found(name: &str) -> Self {
        BusError::NotFound(InlineString::from(name))
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::NotFound => "not found",
            ErrorKind::AlreadyExists => "already exists",
            ErrorKind::ResourceExhausted => "resource exhausted",
            ErrorKind::AllocationFailure => "allocation failure",
            ErrorKind::InvalidPayloadType => "invalid payload type",
        };
        f.write_str(text)
    }
}
