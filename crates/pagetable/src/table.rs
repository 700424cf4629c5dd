//! Page-table views over a single arena frame.
//!
//! A table frame is exactly [`ENTRY_COUNT`] 32-bit entries. The views borrow the frame's
//! bytes from the arena, so a table can only be read or written through the arena that owns it.

use crate::arena::{ENTRY_COUNT, ENTRY_SIZE, read_u32, write_u32};
use crate::{PageEntry, PageFlags};

/// A read-only page table.
pub(crate) struct PageTable<'a> {
    bytes: &'a [u8],
}

impl<'a> PageTable<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        debug_assert_eq!(bytes.len(), ENTRY_COUNT * ENTRY_SIZE);
        Self { bytes }
    }

    /// Returns the entry at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= ENTRY_COUNT`.
    pub fn entry(&self, index: usize) -> PageEntry {
        assert!(index < ENTRY_COUNT, "page table index out of bounds");
        PageEntry::from_u32(read_u32(&self.bytes[..], index * ENTRY_SIZE))
    }

    /// Iterates over every entry with its index.
    pub fn entries(&self) -> impl Iterator<Item = (usize, PageEntry)> + '_ {
        (0..ENTRY_COUNT).map(move |index| (index, self.entry(index)))
    }

    /// Iterates over the entries whose VALID bit is set.
    pub fn valid_entries(&self) -> impl Iterator<Item = (usize, PageEntry)> + '_ {
        self.entries().filter(move |(_, entry)| entry.is_valid())
    }

    /// Returns true if no entry is valid.
    pub fn is_empty(&self) -> bool {
        self.valid_entries().next().is_none()
    }
}

/// A mutable page table.
pub(crate) struct PageTableMut<'a> {
    bytes: &'a mut [u8],
}

impl<'a> PageTableMut<'a> {
    pub fn new(bytes: &'a mut [u8]) -> Self {
        debug_assert_eq!(bytes.len(), ENTRY_COUNT * ENTRY_SIZE);
        Self { bytes }
    }

    /// Returns the entry at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= ENTRY_COUNT`.
    pub fn entry(&self, index: usize) -> PageEntry {
        assert!(index < ENTRY_COUNT, "page table index out of bounds");
        PageEntry::from_u32(read_u32(&self.bytes[..], index * ENTRY_SIZE))
    }

    /// Overwrites the entry at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= ENTRY_COUNT`.
    pub fn set_entry(&mut self, index: usize, entry: PageEntry) {
        assert!(index < ENTRY_COUNT, "page table index out of bounds");
        write_u32(self.bytes, index * ENTRY_SIZE, entry.as_u32());
    }

    /// Sets flag bits on the entry at `index` if they are not all set already.
    ///
    /// Returns true if the entry changed.
    pub fn set_flags(&mut self, index: usize, flags: PageFlags) -> bool {
        let mut entry = self.entry(index);
        if entry.contains(flags) {
            return false;
        }
        entry.set(flags);
        self.set_entry(index, entry);
        true
    }

    /// Clears flag bits on the entry at `index`.
    pub fn clear_flags(&mut self, index: usize, flags: PageFlags) {
        let mut entry = self.entry(index);
        entry.clear(flags);
        self.set_entry(index, entry);
    }
}
