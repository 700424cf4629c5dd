//! Free-frame allocator with an intrusive free list.
//!
//! The list is threaded through the free frames themselves: the first word of each free frame
//! holds the number of the next free frame. The head and the count live in the state record in
//! frame 0, so the allocator's metadata is stored inside the memory it manages. The value
//! `total_frames` marks the end of the list.

use crate::arena::{FrameArena, StateWord};
use crate::frame::{FrameMap, FrameRole};
use crate::{FrameNumber, VmError, VmResult};

/// Allocates and frees whole frames of the arena.
pub(crate) struct FrameAllocator<'m> {
    arena: FrameArena<'m>,
    frames: FrameMap,
}

impl<'m> FrameAllocator<'m> {
    /// Takes over the arena, writing a fresh state record and linking frames `1..N` into the
    /// free list in ascending order.
    pub fn new(mut arena: FrameArena<'m>) -> Self {
        let total = arena.frame_count() as u32;

        for frame in 1..total {
            arena.write_word(FrameNumber::new(frame), 0, frame + 1);
        }

        arena.set_state(StateWord::TotalFrames, total);
        arena.set_state(StateWord::FreeCount, total.saturating_sub(1));
        arena.set_state(StateWord::FreeHead, if total > 1 { 1 } else { total });
        arena.set_state(StateWord::ActiveProcesses, 0);

        let frames = FrameMap::new(total as usize);
        Self { arena, frames }
    }

    pub fn arena(&self) -> &FrameArena<'m> {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut FrameArena<'m> {
        &mut self.arena
    }

    /// Returns the number of frames in the arena, including frame 0.
    pub fn total_frames(&self) -> usize {
        self.arena.state(StateWord::TotalFrames) as usize
    }

    /// Returns the number of frames on the free list.
    pub fn free_count(&self) -> usize {
        self.arena.state(StateWord::FreeCount) as usize
    }

    /// Returns the role of a frame, or `None` if it lies outside the arena.
    pub fn role(&self, frame: FrameNumber) -> Option<FrameRole> {
        self.frames.role(frame)
    }

    /// Returns true if `frame` exists and has the given role.
    pub fn is(&self, frame: FrameNumber, role: FrameRole) -> bool {
        self.frames.is(frame, role)
    }

    /// Counts the frames with the given role.
    pub fn count(&self, role: FrameRole) -> usize {
        self.frames.count(role)
    }

    /// Iterates over the free list in allocation order.
    pub fn iter(&self) -> FreeFrames<'_, 'm> {
        FreeFrames {
            arena: &self.arena,
            next: self.arena.state(StateWord::FreeHead),
            remaining: self.free_count(),
        }
    }

    /// Takes `N` frames off the free list, tagging them with the given roles and zeroing them.
    ///
    /// Fails with [`VmError::OutOfMemory`] before touching anything if fewer than `N` frames
    /// are free. If the chain turns out to be shorter than its count, the frames already
    /// taken are pushed back in reverse order, restoring the list as it was.
    pub fn allocate<const N: usize>(
        &mut self,
        roles: [FrameRole; N],
    ) -> VmResult<[FrameNumber; N]> {
        if self.free_count() < N {
            log::warn!(
                "cannot allocate {} frame(s), only {} free",
                N,
                self.free_count()
            );
            return Err(VmError::OutOfMemory);
        }

        let mut allocated = [FrameNumber::METADATA; N];
        for (taken, role) in roles.into_iter().enumerate() {
            match self.pop(role) {
                Some(frame) => allocated[taken] = frame,
                None => {
                    for &frame in allocated[..taken].iter().rev() {
                        self.free(frame);
                    }
                    return Err(VmError::OutOfMemory);
                }
            }
        }

        for frame in allocated {
            self.arena.zero(frame);
        }

        Ok(allocated)
    }

    /// Returns a frame to the head of the free list.
    ///
    /// Nothing may still reference the frame. Frames that are already free, and frame 0, are
    /// left alone so the list can never gain a cycle.
    pub fn free(&mut self, frame: FrameNumber) {
        match self.frames.role(frame) {
            Some(role) if role.is_allocated() => {}
            role => {
                log::warn!("ignoring free of frame {} with role {:?}", frame, role);
                return;
            }
        }

        let head = self.arena.state(StateWord::FreeHead);
        self.arena.write_word(frame, 0, head);
        self.arena.set_state(StateWord::FreeHead, frame.as_u32());
        self.arena
            .set_state(StateWord::FreeCount, self.free_count() as u32 + 1);
        self.frames.set(frame, FrameRole::Free);
    }

    /// Pops the head of the free list.
    fn pop(&mut self, role: FrameRole) -> Option<FrameNumber> {
        let count = self.free_count();
        if count == 0 {
            return None;
        }

        let head = FrameNumber::new(self.arena.state(StateWord::FreeHead));
        if !self.frames.is(head, FrameRole::Free) {
            log::warn!("free list head {} is not a free frame", head);
            return None;
        }

        let next = self.arena.read_word(head, 0);
        self.arena.set_state(StateWord::FreeHead, next);
        self.arena.set_state(StateWord::FreeCount, count as u32 - 1);
        self.frames.set(head, role);
        Some(head)
    }
}

/// Iterator over the free list, following the links stored in the free frames.
pub struct FreeFrames<'a, 'm> {
    arena: &'a FrameArena<'m>,
    next: u32,
    remaining: usize,
}

impl Iterator for FreeFrames<'_, '_> {
    type Item = FrameNumber;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let frame = FrameNumber::new(self.next);
        if !self.arena.contains(frame) {
            self.remaining = 0;
            return None;
        }
        self.remaining -= 1;
        self.next = self.arena.read_word(frame, 0);
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}
