//! Creating and removing page mappings.
//!
//! Frames are reserved before any entry is written, so a refused request leaves the tables
//! and the free list exactly as they were.
//!
//! Reclamation on unmap is eager for second-level tables: clearing the last valid entry of a
//! table frees that table and clears the level-1 entry that linked it. Root tables are never
//! reclaimed by unmap; they live until [`VirtualMemory::destroy_address_space`].

use alloc::vec::Vec;

use crate::walker::{self, Slot, Walk};
use crate::{
    ENTRY_COUNT, FrameNumber, FrameRole, PageEntry, PageFlags, Permissions, PhysicalAddress,
    VirtualAddress, VirtualMemory, VmError, VmResult,
};

/// Frames consumed by mapping the first page of a new address space: root, table and page.
pub const NEW_PROCESS_FRAMES: usize = 3;

impl<S> VirtualMemory<'_, S> {
    /// Maps the page containing `vaddr` to a fresh, zeroed frame.
    ///
    /// With `new_process` set, a new address space is created: the root, a second-level table
    /// and the data frame are allocated together and the new root is returned; `root` is only
    /// consulted for the duplicate check. Otherwise `root` must be a live root, and only the
    /// missing parts of the chain are allocated. On success the root of the address space is
    /// returned.
    ///
    /// # Errors
    ///
    /// - [`VmError::Duplicate`] if the page is already mapped under `root`.
    /// - [`VmError::OutOfMemory`] if the free list cannot supply every frame needed.
    /// - [`VmError::BadAddress`] if `new_process` is clear and `root` is not a live root.
    pub fn map_page(
        &mut self,
        new_process: bool,
        root: PhysicalAddress,
        vaddr: VirtualAddress,
        permissions: Permissions,
    ) -> VmResult<PhysicalAddress> {
        let walk = walker::walk(&self.frames, root, vaddr);
        if let Walk::Mapped(resolved) = walk {
            log::debug!(
                "map {} under {}: already mapped to frame {}",
                vaddr,
                root,
                resolved.frame
            );
            return Err(VmError::Duplicate);
        }

        let leaf = PageFlags::leaf(permissions);

        if new_process {
            let [new_root, table, page] =
                self.frames
                    .allocate([FrameRole::Root, FrameRole::Table, FrameRole::Data])?;
            self.link(
                Slot {
                    table: new_root,
                    index: vaddr.pt1_index(),
                },
                table,
                PageFlags::TABLE,
            );
            self.link(
                Slot {
                    table,
                    index: vaddr.pt2_index(),
                },
                page,
                leaf,
            );
            self.set_active_processes(self.active_processes() + 1);
            log::debug!(
                "map {}: new address space {}, table {}, page {}",
                vaddr,
                new_root.start(),
                table,
                page
            );
            return Ok(new_root.start());
        }

        match walk {
            Walk::InvalidRoot => {
                log::debug!("map {} under {}: root is not a live table", vaddr, root);
                Err(VmError::BadAddress)
            }
            Walk::MissingTable { l1 } => {
                let [table, page] = self.frames.allocate([FrameRole::Table, FrameRole::Data])?;
                self.link(l1, table, PageFlags::TABLE);
                self.link(
                    Slot {
                        table,
                        index: vaddr.pt2_index(),
                    },
                    page,
                    leaf,
                );
                log::debug!(
                    "map {} under {}: new table {}, page {}",
                    vaddr,
                    root,
                    table,
                    page
                );
                Ok(root)
            }
            Walk::MissingPage { l2, .. } => {
                let [page] = self.frames.allocate([FrameRole::Data])?;
                self.link(l2, page, leaf);
                log::debug!("map {} under {}: page {}", vaddr, root, page);
                Ok(root)
            }
            Walk::Mapped(_) => Err(VmError::Duplicate),
        }
    }

    /// Removes the mapping of the page containing `vaddr` and frees its data frame.
    ///
    /// If that leaves the second-level table without a valid entry, the table is freed too
    /// and its level-1 entry cleared. The root is kept.
    ///
    /// # Errors
    ///
    /// [`VmError::BadAddress`] if the page is not mapped under `root`.
    pub fn unmap_page(&mut self, root: PhysicalAddress, vaddr: VirtualAddress) -> VmResult<()> {
        let Walk::Mapped(resolved) = walker::walk(&self.frames, root, vaddr) else {
            log::debug!("unmap {} under {}: not mapped", vaddr, root);
            return Err(VmError::BadAddress);
        };

        self.link_entry(resolved.l2, PageEntry::empty());
        self.frames.free(resolved.frame);

        let table = resolved.l2.table;
        let reclaimed = self.frames.arena().table(table).is_empty();
        if reclaimed {
            self.link_entry(resolved.l1, PageEntry::empty());
            self.frames.free(table);
        }

        log::debug!(
            "unmap {} under {}: freed page {}{}",
            vaddr,
            root,
            resolved.frame,
            if reclaimed { " and its table" } else { "" }
        );
        Ok(())
    }

    /// Frees every frame of the address space rooted at `root`: its data pages, its
    /// second-level tables and the root itself.
    ///
    /// # Errors
    ///
    /// [`VmError::BadAddress`] if `root` is not a live root.
    pub fn destroy_address_space(&mut self, root: PhysicalAddress) -> VmResult<()> {
        let Some(root_frame) = walker::root_frame(&self.frames, root) else {
            return Err(VmError::BadAddress);
        };

        let tables: Vec<FrameNumber> = self
            .frames
            .arena()
            .table(root_frame)
            .valid_entries()
            .map(|(_, entry)| entry.frame())
            .filter(|&frame| self.frames.is(frame, FrameRole::Table))
            .collect();

        let mut pages = 0;
        for table in tables {
            let data: Vec<FrameNumber> = self
                .frames
                .arena()
                .table(table)
                .valid_entries()
                .map(|(_, entry)| entry.frame())
                .filter(|&frame| self.frames.is(frame, FrameRole::Data))
                .collect();
            pages += data.len();
            for frame in data {
                self.frames.free(frame);
            }
            self.frames.free(table);
        }
        self.frames.free(root_frame);
        self.set_active_processes(self.active_processes().saturating_sub(1));

        log::debug!(
            "destroyed address space {} ({} pages), {} frames free",
            root,
            pages,
            self.free_count()
        );
        Ok(())
    }

    fn link(&mut self, slot: Slot, target: FrameNumber, flags: PageFlags) {
        self.link_entry(slot, PageEntry::new(target, flags));
    }

    fn link_entry(&mut self, slot: Slot, entry: PageEntry) {
        debug_assert!(slot.index < ENTRY_COUNT);
        self.frames
            .arena_mut()
            .table_mut(slot.table)
            .set_entry(slot.index, entry);
    }
}
