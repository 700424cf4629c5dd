//! The accessed-bit sweep used by clock-style page replacement.
//!
//! Translation sets ACCESSED on both levels of the path it takes. A sweep clears every one of
//! them in an address space, after which the pages still unmarked at the next sweep are the
//! eviction candidates.

use alloc::vec::Vec;

use crate::walker::{self, Walk};
use crate::{
    ENTRY_COUNT, FrameRole, PageFlags, PhysicalAddress, VirtualAddress, VirtualMemory, VmError,
    VmResult,
};

impl<S> VirtualMemory<'_, S> {
    /// Clears ACCESSED on every valid entry reachable from `root`.
    ///
    /// Level-1 entries are cleared in place, then each second-level table they link. An
    /// invalid root is ignored.
    pub fn reset_accessed(&mut self, root: PhysicalAddress) {
        let Some(root_frame) = walker::root_frame(&self.frames, root) else {
            log::debug!("reset accessed under {}: not a live root", root);
            return;
        };

        let mut cleared = 0usize;
        for pt1 in 0..ENTRY_COUNT {
            let entry = self.frames.arena().table(root_frame).entry(pt1);
            if !entry.is_valid() {
                continue;
            }
            if entry.is_accessed() {
                self.frames
                    .arena_mut()
                    .table_mut(root_frame)
                    .clear_flags(pt1, PageFlags::ACCESSED);
                cleared += 1;
            }

            let table = entry.frame();
            if !self.frames.is(table, FrameRole::Table) {
                continue;
            }
            let arena = self.frames.arena_mut();
            let mut second = arena.table_mut(table);
            for pt2 in 0..ENTRY_COUNT {
                let leaf = second.entry(pt2);
                if leaf.is_valid() && leaf.is_accessed() {
                    second.clear_flags(pt2, PageFlags::ACCESSED);
                    cleared += 1;
                }
            }
        }

        log::debug!("reset accessed under {}: {} entries cleared", root, cleared);
    }

    /// Returns true if the page containing `vaddr` has been translated since the last sweep.
    ///
    /// # Errors
    ///
    /// [`VmError::BadAddress`] if the page is not mapped under `root`.
    pub fn is_accessed(&self, root: PhysicalAddress, vaddr: VirtualAddress) -> VmResult<bool> {
        match walker::walk(&self.frames, root, vaddr) {
            Walk::Mapped(resolved) => Ok(resolved.l2_entry.is_accessed()),
            _ => Err(VmError::BadAddress),
        }
    }

    /// Lists the base addresses of mapped pages under `root` whose leaf is not marked
    /// ACCESSED, in ascending order. An invalid root has no pages.
    pub fn unaccessed_pages(&self, root: PhysicalAddress) -> Vec<VirtualAddress> {
        let Some(root_frame) = walker::root_frame(&self.frames, root) else {
            return Vec::new();
        };

        let arena = self.frames.arena();
        let mut pages = Vec::new();
        for (pt1, entry) in arena.table(root_frame).valid_entries() {
            let table = entry.frame();
            if !self.frames.is(table, FrameRole::Table) {
                continue;
            }
            pages.extend(
                arena
                    .table(table)
                    .valid_entries()
                    .filter(|(_, leaf)| {
                        !leaf.is_accessed() && self.frames.is(leaf.frame(), FrameRole::Data)
                    })
                    .map(|(pt2, _)| VirtualAddress::from_parts(pt1, pt2, 0)),
            );
        }
        pages
    }
}
