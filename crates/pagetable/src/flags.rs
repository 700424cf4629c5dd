//! Permission and status bits of a page-table entry.

use bitflags::bitflags;

bitflags! {
    /// Flag bits held in the low seven bits of a page-table entry.
    ///
    /// The bit positions are part of the in-memory layout and must not change.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct PageFlags: u32 {
        /// The entry holds a meaningful frame number.
        const VALID = 1 << 0;
        /// The referenced frame is resident in the arena.
        const PRESENT = 1 << 1;
        /// Loads are permitted.
        const READABLE = 1 << 2;
        /// Stores are permitted.
        const WRITABLE = 1 << 3;
        /// Instruction fetches are permitted.
        const EXECUTABLE = 1 << 4;
        /// User-mode accesses are permitted.
        const USER = 1 << 5;
        /// Set by translation; cleared by the accessed-bit sweep.
        const ACCESSED = 1 << 6;
    }
}

impl PageFlags {
    /// Flags of a level-1 entry linking to a second-level table.
    pub const TABLE: Self = Self::VALID.union(Self::PRESENT);

    /// Returns the flags of a freshly linked leaf entry with the given permissions.
    pub const fn leaf(permissions: Permissions) -> Self {
        Self::TABLE.union(permissions.flags())
    }
}

/// Access rights requested for a newly mapped page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permissions {
    /// Accessible from user mode.
    pub user: bool,
    /// Executable.
    pub exec: bool,
    /// Writable.
    pub write: bool,
    /// Readable.
    pub read: bool,
}

impl Permissions {
    /// Creates a permission set. Arguments follow the order of the mapping interface.
    pub const fn new(user: bool, exec: bool, write: bool, read: bool) -> Self {
        Self {
            user,
            exec,
            write,
            read,
        }
    }

    /// Returns the entry bits corresponding to these permissions.
    pub const fn flags(self) -> PageFlags {
        let mut flags = PageFlags::empty();
        if self.user {
            flags = flags.union(PageFlags::USER);
        }
        if self.exec {
            flags = flags.union(PageFlags::EXECUTABLE);
        }
        if self.write {
            flags = flags.union(PageFlags::WRITABLE);
        }
        if self.read {
            flags = flags.union(PageFlags::READABLE);
        }
        flags
    }
}
