/*!
 * Fixed-Capacity Pool
 * Zero-allocation storage for bounded builds
 */

use super::{Storage, StorageError};

/// Pool of `N` entries reserved at construction
///
/// # Performance
///
/// - **Allocation**: linear scan for the first free entry, O(N)
/// - **Release**: O(1), clears the entry's in-use marker
/// - **No allocator calls** after construction
///
/// Exhaustion never blocks and never evicts other entries.
pub struct PoolArena<T, const N: usize> {
    // `Some` doubles as the in-use marker
    entries: [Option<T>; N],
    used: usize,
}

impl<T, const N: usize> Default for PoolArena<T, N> {
    fn default() -> Self {
        Self {
            entries: std::array::from_fn(|_| None),
            used: 0,
        }
    }
}

impl<T, const N: usize> Storage<T> for PoolArena<T, N> {
    fn insert(&mut self, value: T) -> Result<usize, StorageError> {
        let index = self
            .entries
            .iter()
            .position(Option::is_none)
            .ok_or(StorageError::Full { capacity: N })?;

        self.entries[index] = Some(value);
        self.used += 1;
        Ok(index)
    }

    fn remove(&mut self, index: usize) -> Option<T> {
        let value = self.entries.get_mut(index)?.take()?;
        self.used -= 1;
        Some(value)
    }

    #[inline]
    fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index)?.as_ref()
    }

    #[inline]
    fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.entries.get_mut(index)?.as_mut()
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = (usize, &'a T)> + 'a
    where
        T: 'a,
    {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| entry.as_ref().map(|value| (index, value)))
    }

    #[inline]
    fn len(&self) -> usize {
        self.used
    }

    #[inline]
    fn reserve(&mut self) -> Result<(), StorageError> {
        if self.used < N {
            Ok(())
        } else {
            Err(StorageError::Full { capacity: N })
        }
    }

    #[inline]
    fn reserved(&self) -> usize {
        N
    }
}
