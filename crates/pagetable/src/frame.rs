use alloc::boxed::Box;
use alloc::vec;

use crate::FrameNumber;

/// The role a frame currently plays.
///
/// Every frame has exactly one role at a time. The free list inside the arena remains the
/// authority on allocation order; roles let validity checks run in constant time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameRole {
    /// Frame 0, holding the manager's state record.
    Metadata,
    /// On the free list.
    Free,
    /// The root (level-1) table of an address space.
    Root,
    /// A second-level table.
    Table,
    /// A mapped data page.
    Data,
}

impl FrameRole {
    /// Returns true for frames handed out by the allocator.
    pub const fn is_allocated(self) -> bool {
        matches!(self, Self::Root | Self::Table | Self::Data)
    }
}

/// Role tags for every frame of the arena.
pub(crate) struct FrameMap {
    roles: Box<[FrameRole]>,
}

impl FrameMap {
    /// Creates a map with frame 0 tagged as metadata and every other frame free.
    pub fn new(frames: usize) -> Self {
        let mut roles = vec![FrameRole::Free; frames].into_boxed_slice();
        if let Some(first) = roles.first_mut() {
            *first = FrameRole::Metadata;
        }
        Self { roles }
    }

    /// Returns the role of `frame`, or `None` if it lies outside the arena.
    pub fn role(&self, frame: FrameNumber) -> Option<FrameRole> {
        self.roles.get(frame.as_usize()).copied()
    }

    /// Returns true if `frame` exists and has the given role.
    pub fn is(&self, frame: FrameNumber, role: FrameRole) -> bool {
        self.role(frame) == Some(role)
    }

    /// Retags `frame`.
    ///
    /// # Panics
    ///
    /// Panics if the frame lies outside the arena.
    pub fn set(&mut self, frame: FrameNumber, role: FrameRole) {
        self.roles[frame.as_usize()] = role;
    }

    /// Counts the frames with the given role.
    pub fn count(&self, role: FrameRole) -> usize {
        self.roles.iter().filter(|&&r| r == role).count()
    }
}
