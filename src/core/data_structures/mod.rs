/*!
 * Data Structures
 *
 * Name storage for the two memory backends:
 * - Inline strings for heap-backed registries (short names avoid allocation)
 * - Fixed-width buffers for pooled registries (never allocate)
 */

mod fixed_name;
mod inline_string;

pub use fixed_name::FixedName;
pub use inline_string::InlineString;

/// Storage for a signal name
///
/// Each memory backend picks its own representation; `MAX_LEN` is the
/// longest name (in bytes) it can hold.
pub trait SignalName: Send + Sized + 'static {
    const MAX_LEN: usize;

    /// Store `name`, or `None` if it exceeds `MAX_LEN`
    fn from_name(name: &str) -> Option<Self>;

    fn as_str(&self) -> &str;
}
