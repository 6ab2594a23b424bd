/*!
 * Heap Arena
 * Growable index arena with free-list reuse
 */

use super::{Storage, StorageError};

/// Growable arena backed by a `Vec`
///
/// Growth goes through `try_reserve`, so allocator failure surfaces as
/// `StorageError::OutOfMemory` instead of aborting.
#[derive(Debug)]
pub struct HeapArena<T> {
    entries: Vec<Option<T>>,
    free: Vec<usize>,
    len: usize,
}

impl<T> Default for HeapArena<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }
}

impl<T> Storage<T> for HeapArena<T> {
    fn insert(&mut self, value: T) -> Result<usize, StorageError> {
        self.reserve()?;
        if let Some(index) = self.free.pop() {
            self.entries[index] = Some(value);
            self.len += 1;
            return Ok(index);
        }

        self.entries.push(Some(value));
        self.len += 1;
        Ok(self.entries.len() - 1)
    }

    fn remove(&mut self, index: usize) -> Option<T> {
        let value = self.entries.get_mut(index)?.take()?;
        self.free.push(index);
        self.len -= 1;
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
        self.len
    }

    fn reserve(&mut self) -> Result<(), StorageError> {
        if !self.free.is_empty() {
            return Ok(());
        }
        self.entries
            .try_reserve(1)
            .map_err(|_| StorageError::OutOfMemory)?;
        // Keep room for every index on the free list so `remove` never allocates
        let needed = self.entries.len() + 1 - self.free.len();
        self.free
            .try_reserve(needed)
            .map_err(|_| StorageError::OutOfMemory)
    }

    #[inline]
    fn reserved(&self) -> usize {
        self.entries.len()
    }
}
