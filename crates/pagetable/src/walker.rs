//! Staged traversal of a two-level page table.
//!
//! The walk stops at the first stage that does not resolve and reports how far it got, so
//! the same traversal serves the duplicate check in mapping, the partial-chain decisions in
//! mapping, and the front half of translation.
//!
//! An entry only counts as a link if its VALID bit is set *and* the frame it names currently
//! holds the expected kind of content: a second-level table for a level-1 entry, a data page
//! for a level-2 entry. Anything else is treated as absent.

use crate::free_list::FrameAllocator;
use crate::frame::FrameRole;
use crate::{FrameNumber, PageEntry, PhysicalAddress, VirtualAddress};

/// Position of an entry: the table frame holding it and its index within that table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Slot {
    pub table: FrameNumber,
    pub index: usize,
}

/// A fully resolved walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Resolved {
    pub l1: Slot,
    pub l1_entry: PageEntry,
    pub l2: Slot,
    pub l2_entry: PageEntry,
    /// The data frame the leaf entry maps.
    pub frame: FrameNumber,
}

/// How far a walk got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Walk {
    /// The root is not a live root table.
    InvalidRoot,
    /// The level-1 entry does not link to a second-level table.
    MissingTable { l1: Slot },
    /// The second-level table exists, but its entry does not map a page.
    MissingPage { l1: Slot, l2: Slot },
    /// Every stage resolved.
    Mapped(Resolved),
}

/// Returns the frame of `root` if it names a live root table.
pub(crate) fn root_frame(frames: &FrameAllocator<'_>, root: PhysicalAddress) -> Option<FrameNumber> {
    let frame = root.aligned_frame()?;
    frames.is(frame, FrameRole::Root).then_some(frame)
}

/// Walks the table rooted at `root` for `vaddr`.
pub(crate) fn walk(frames: &FrameAllocator<'_>, root: PhysicalAddress, vaddr: VirtualAddress) -> Walk {
    let Some(root) = root_frame(frames, root) else {
        #[cfg(feature = "detailed-logging")]
        log::trace!("walk {}: root {} is not a live root table", vaddr, root);
        return Walk::InvalidRoot;
    };

    let arena = frames.arena();

    let l1 = Slot {
        table: root,
        index: vaddr.pt1_index(),
    };
    let l1_entry = arena.table(l1.table).entry(l1.index);
    if !l1_entry.is_valid() || !frames.is(l1_entry.frame(), FrameRole::Table) {
        #[cfg(feature = "detailed-logging")]
        log::trace!("walk {}: no table at level 1 ({:?})", vaddr, l1_entry);
        return Walk::MissingTable { l1 };
    }

    let l2 = Slot {
        table: l1_entry.frame(),
        index: vaddr.pt2_index(),
    };
    let l2_entry = arena.table(l2.table).entry(l2.index);
    if !l2_entry.is_valid() || !frames.is(l2_entry.frame(), FrameRole::Data) {
        #[cfg(feature = "detailed-logging")]
        log::trace!("walk {}: no page at level 2 ({:?})", vaddr, l2_entry);
        return Walk::MissingPage { l1, l2 };
    }

    #[cfg(feature = "detailed-logging")]
    log::trace!("walk {}: mapped to frame {}", vaddr, l2_entry.frame());

    Walk::Mapped(Resolved {
        l1,
        l1_entry,
        l2,
        l2_entry,
        frame: l2_entry.frame(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::FrameArena;
    use crate::{PAGE_SIZE, PageFlags};

    const VADDR: VirtualAddress = VirtualAddress::new(0x0040_2123);

    fn with_tables<R>(f: impl FnOnce(&mut FrameAllocator<'_>, FrameNumber) -> R) -> R {
        let mut memory = vec![0u8; 8 * PAGE_SIZE];
        let mut frames = FrameAllocator::new(FrameArena::new(&mut memory, 8));
        let [root] = frames.allocate([FrameRole::Root]).unwrap();
        f(&mut frames, root)
    }

    fn link(frames: &mut FrameAllocator<'_>, table: FrameNumber, index: usize, target: FrameNumber) {
        frames
            .arena_mut()
            .table_mut(table)
            .set_entry(index, PageEntry::new(target, PageFlags::TABLE));
    }

    #[test]
    fn rejects_free_root() {
        with_tables(|frames, _| {
            assert_eq!(walk(frames, FrameNumber::new(5).start(), VADDR), Walk::InvalidRoot);
        });
    }

    #[test]
    fn rejects_metadata_and_unaligned_roots() {
        with_tables(|frames, root| {
            assert_eq!(walk(frames, PhysicalAddress::new(0), VADDR), Walk::InvalidRoot);
            assert_eq!(walk(frames, root.start() + 4, VADDR), Walk::InvalidRoot);
            assert_eq!(walk(frames, FrameNumber::new(99).start(), VADDR), Walk::InvalidRoot);
        });
    }

    #[test]
    fn stops_at_missing_table() {
        with_tables(|frames, root| {
            let l1 = Slot { table: root, index: 1 };
            assert_eq!(walk(frames, root.start(), VADDR), Walk::MissingTable { l1 });
        });
    }

    #[test]
    fn valid_entry_to_a_free_frame_is_not_a_table() {
        with_tables(|frames, root| {
            link(frames, root, 1, FrameNumber::new(6));
            let l1 = Slot { table: root, index: 1 };
            assert_eq!(walk(frames, root.start(), VADDR), Walk::MissingTable { l1 });
        });
    }

    #[test]
    fn stops_at_missing_page() {
        with_tables(|frames, root| {
            let [table] = frames.allocate([FrameRole::Table]).unwrap();
            link(frames, root, 1, table);
            assert_eq!(
                walk(frames, root.start(), VADDR),
                Walk::MissingPage {
                    l1: Slot { table: root, index: 1 },
                    l2: Slot { table, index: 2 },
                }
            );
        });
    }

    #[test]
    fn resolves_full_chain() {
        with_tables(|frames, root| {
            let [table, page] = frames.allocate([FrameRole::Table, FrameRole::Data]).unwrap();
            link(frames, root, 1, table);
            link(frames, table, 2, page);

            let Walk::Mapped(resolved) = walk(frames, root.start(), VADDR) else {
                panic!("expected a full walk");
            };
            assert_eq!(resolved.frame, page);
            assert_eq!(resolved.l1, Slot { table: root, index: 1 });
            assert_eq!(resolved.l2, Slot { table, index: 2 });
            assert_eq!(resolved.l1_entry.frame(), table);
        });
    }

    #[test]
    fn leaf_pointing_at_a_table_is_not_a_page() {
        with_tables(|frames, root| {
            let [table] = frames.allocate([FrameRole::Table]).unwrap();
            link(frames, root, 1, table);
            link(frames, table, 2, root);
            assert!(matches!(
                walk(frames, root.start(), VADDR),
                Walk::MissingPage { .. }
            ));
        });
    }
}
