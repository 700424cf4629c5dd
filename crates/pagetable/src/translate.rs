//! Virtual-to-physical translation with permission checks.

use crate::walker::{self, Walk};
use crate::{PageEntry, PageFlags, PhysicalAddress, VirtualAddress, VirtualMemory, VmError, VmResult};

/// The kind of access being translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    Read,
    Write,
    Exec,
}

impl AccessKind {
    /// Returns the leaf permission bit this access needs.
    pub const fn required(self) -> PageFlags {
        match self {
            Self::Read => PageFlags::READABLE,
            Self::Write => PageFlags::WRITABLE,
            Self::Exec => PageFlags::EXECUTABLE,
        }
    }
}

impl<S> VirtualMemory<'_, S> {
    /// Translates `vaddr` under `root` for an access of the given kind.
    ///
    /// A user-mode access additionally needs the leaf's USER bit. Once every check passes the
    /// ACCESSED bit is set on both the level-1 and the level-2 entry. A refused translation
    /// leaves the tables unchanged.
    ///
    /// # Errors
    ///
    /// - [`VmError::BadAddress`] if `root` is not a live root, or either entry on the path
    ///   lacks VALID or PRESENT.
    /// - [`VmError::BadPermission`] if the leaf forbids the access.
    pub fn translate(
        &mut self,
        root: PhysicalAddress,
        vaddr: VirtualAddress,
        access: AccessKind,
        user: bool,
    ) -> VmResult<PhysicalAddress> {
        let Walk::Mapped(resolved) = walker::walk(&self.frames, root, vaddr) else {
            #[cfg(feature = "detailed-logging")]
            log::trace!("translate {} under {}: not mapped", vaddr, root);
            return Err(VmError::BadAddress);
        };

        if !resolved.l1_entry.is_present() || !resolved.l2_entry.is_present() {
            #[cfg(feature = "detailed-logging")]
            log::trace!("translate {} under {}: page not present", vaddr, root);
            return Err(VmError::BadAddress);
        }

        let mut required = access.required();
        if user {
            required |= PageFlags::USER;
        }
        if !resolved.l2_entry.contains(required) {
            log::debug!(
                "translate {} under {}: {:?} access by {} denied ({:?})",
                vaddr,
                root,
                access,
                if user { "user" } else { "kernel" },
                resolved.l2_entry.flags()
            );
            return Err(VmError::BadPermission);
        }

        let arena = self.frames.arena_mut();
        arena
            .table_mut(resolved.l1.table)
            .set_flags(resolved.l1.index, PageFlags::ACCESSED);
        arena
            .table_mut(resolved.l2.table)
            .set_flags(resolved.l2.index, PageFlags::ACCESSED);

        Ok(resolved.frame.start() + vaddr.page_offset())
    }

    /// Returns the level-1 and level-2 entries that map `vaddr` under `root`.
    ///
    /// # Errors
    ///
    /// [`VmError::BadAddress`] if the walk does not reach a mapped page.
    pub fn entries(
        &self,
        root: PhysicalAddress,
        vaddr: VirtualAddress,
    ) -> VmResult<(PageEntry, PageEntry)> {
        match walker::walk(&self.frames, root, vaddr) {
            Walk::Mapped(resolved) => Ok((resolved.l1_entry, resolved.l2_entry)),
            _ => Err(VmError::BadAddress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FrameNumber, PAGE_SIZE, Permissions};

    const KERNEL_RW: Permissions = Permissions::new(false, false, true, true);
    const USER_RX: Permissions = Permissions::new(true, true, false, true);

    fn mapped<R>(
        permissions: Permissions,
        f: impl FnOnce(&mut VirtualMemory<'_>, PhysicalAddress) -> R,
    ) -> R {
        let mut memory = vec![0u8; 10 * PAGE_SIZE];
        let mut vm = VirtualMemory::init(&mut memory, 10, (), 0).unwrap();
        let root = vm
            .map_page(true, PhysicalAddress::new(0), VirtualAddress::new(0x0040_0000), permissions)
            .unwrap();
        f(&mut vm, root)
    }

    #[test]
    fn adds_page_offset_to_frame() {
        mapped(USER_RX, |vm, root| {
            assert_eq!(
                vm.translate(root, VirtualAddress::new(0x0040_0ABC), AccessKind::Read, true),
                Ok(PhysicalAddress::new(0x3ABC))
            );
            assert_eq!(
                vm.translate(root, VirtualAddress::new(0x0040_0000), AccessKind::Exec, true),
                Ok(PhysicalAddress::new(0x3000))
            );
        });
    }

    #[test]
    fn sets_accessed_on_both_levels() {
        mapped(USER_RX, |vm, root| {
            let vaddr = VirtualAddress::new(0x0040_0010);
            let (l1, l2) = vm.entries(root, vaddr).unwrap();
            assert!(!l1.is_accessed() && !l2.is_accessed());

            vm.translate(root, vaddr, AccessKind::Read, false).unwrap();

            let (l1, l2) = vm.entries(root, vaddr).unwrap();
            assert!(l1.is_accessed());
            assert!(l2.is_accessed());
            assert_eq!(l1.frame(), FrameNumber::new(2));
            assert_eq!(l2.frame(), FrameNumber::new(3));
        });
    }

    #[test]
    fn denies_missing_permission_without_marking() {
        mapped(USER_RX, |vm, root| {
            let vaddr = VirtualAddress::new(0x0040_0000);
            assert_eq!(
                vm.translate(root, vaddr, AccessKind::Write, true),
                Err(VmError::BadPermission)
            );
            let (l1, l2) = vm.entries(root, vaddr).unwrap();
            assert!(!l1.is_accessed());
            assert!(!l2.is_accessed());
        });
    }

    #[test]
    fn user_access_needs_user_bit() {
        mapped(KERNEL_RW, |vm, root| {
            let vaddr = VirtualAddress::new(0x0040_0000);
            assert_eq!(
                vm.translate(root, vaddr, AccessKind::Read, true),
                Err(VmError::BadPermission)
            );
            assert_eq!(
                vm.translate(root, vaddr, AccessKind::Write, false),
                Ok(PhysicalAddress::new(0x3000))
            );
            assert_eq!(
                vm.translate(root, vaddr, AccessKind::Exec, false),
                Err(VmError::BadPermission)
            );
        });
    }

    #[test]
    fn unmapped_and_bad_roots() {
        mapped(USER_RX, |vm, root| {
            assert_eq!(
                vm.translate(root, VirtualAddress::new(0x0040_1000), AccessKind::Read, true),
                Err(VmError::BadAddress)
            );
            assert_eq!(
                vm.translate(root, VirtualAddress::new(0x0080_0000), AccessKind::Read, true),
                Err(VmError::BadAddress)
            );
            assert_eq!(
                vm.translate(
                    FrameNumber::new(3).start(),
                    VirtualAddress::new(0x0040_0000),
                    AccessKind::Read,
                    true
                ),
                Err(VmError::BadAddress)
            );
            assert_eq!(
                vm.entries(root, VirtualAddress::new(0x0040_1000)),
                Err(VmError::BadAddress)
            );
        });
    }

    #[test]
    fn not_present_is_bad_address() {
        mapped(USER_RX, |vm, root| {
            let vaddr = VirtualAddress::new(0x0040_0000);
            let table = FrameNumber::new(2);
            vm.frames
                .arena_mut()
                .table_mut(table)
                .clear_flags(vaddr.pt2_index(), PageFlags::PRESENT);

            assert_eq!(
                vm.translate(root, vaddr, AccessKind::Read, true),
                Err(VmError::BadAddress)
            );
            let (_, l2) = vm.entries(root, vaddr).unwrap();
            assert!(!l2.is_accessed());
        });
    }

    #[test]
    fn table_link_not_present_is_bad_address() {
        mapped(USER_RX, |vm, root| {
            let vaddr = VirtualAddress::new(0x0040_0000);
            vm.frames
                .arena_mut()
                .table_mut(root.frame_number())
                .clear_flags(vaddr.pt1_index(), PageFlags::PRESENT);

            assert_eq!(
                vm.translate(root, vaddr, AccessKind::Read, true),
                Err(VmError::BadAddress)
            );
            let (l1, l2) = vm.entries(root, vaddr).unwrap();
            assert!(!l1.is_present());
            assert!(!l1.is_accessed());
            assert!(!l2.is_accessed());
        });
    }

    #[test]
    fn required_bits() {
        assert_eq!(AccessKind::Read.required(), PageFlags::READABLE);
        assert_eq!(AccessKind::Write.required(), PageFlags::WRITABLE);
        assert_eq!(AccessKind::Exec.required(), PageFlags::EXECUTABLE);
    }
}
