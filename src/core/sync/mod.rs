/*!
 * Synchronization Primitives
 *
 * The bus has exactly one lock visible to callers: the coarse, optional
 * concurrency guard. Registry bookkeeping uses a private short-lived mutex
 * that is never held across a callback.
 */

mod guard;

pub use guard::{ConcurrencyGuard, GuardToken};
