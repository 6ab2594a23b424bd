/*!
 * Process-Wide Bus
 * Lazily constructed single instance for code without a bus of its own
 */

use super::backend::DefaultBackend;
use super::manager::SignalBus;
use std::sync::OnceLock;

static GLOBAL: OnceLock<SignalBus<DefaultBackend>> = OnceLock::new();

/// The process-wide bus
///
/// Constructed on first access with the default configuration and left
/// uninitialized; call [`SignalBus::init`] before use. `cleanup` resets it
/// to uninitialized, it is never deallocated.
pub fn global() -> &'static SignalBus<DefaultBackend> {
    GLOBAL.get_or_init(SignalBus::new)
}
