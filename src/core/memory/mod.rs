/*!
 * Memory Backends
 *
 * Index-addressed storage used for signal and slot records:
 * - Heap arena: grows on demand, fails with `OutOfMemory` when the allocator refuses
 * - Fixed pool: `N` entries reserved up front, fails with `Full` when every entry is in use
 *
 * # Performance
 *
 * - Lookups by index are O(1) in both strategies
 * - Pool allocation is a linear scan for the first free entry
 * - Heap allocation reuses freed indices before growing
 *
 * Indices stay valid until the entry is removed; nothing is ever moved.
 */

mod heap;
mod pool;

pub use heap::HeapArena;
pub use pool::PoolArena;

/// Why an insert was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Fixed-capacity storage has no free entry
    Full { capacity: usize },
    /// Growable storage could not reserve memory
    OutOfMemory,
}

/// Index-addressed storage strategy
pub trait Storage<T>: Default {
    /// Store `value`, returning its index
    fn insert(&mut self, value: T) -> Result<usize, StorageError>;

    /// Release the entry at `index`
    fn remove(&mut self, index: usize) -> Option<T>;

    fn get(&self, index: usize) -> Option<&T>;

    fn get_mut(&mut self, index: usize) -> Option<&mut T>;

    /// Occupied entries in index order
    fn iter<'a>(&'a self) -> impl Iterator<Item = (usize, &'a T)> + 'a
    where
        T: 'a;

    /// Number of occupied entries
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make sure the next `insert` succeeds without touching its value
    fn reserve(&mut self) -> Result<(), StorageError>;

    /// Entries currently reserved (occupied or not)
    fn reserved(&self) -> usize;
}
