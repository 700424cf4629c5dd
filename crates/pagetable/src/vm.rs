//! The virtual memory manager handle.
//!
//! [`VirtualMemory`] owns the arena for its lifetime and exposes the operations a trap or
//! fault handler needs: mapping, unmapping, translation and the accessed-bit sweep. It is
//! strictly single-threaded; callers that share one across threads must serialize access.

use crate::arena::{FrameArena, StateWord};
use crate::free_list::{FrameAllocator, FreeFrames};
use crate::{FrameNumber, FrameRole, InitError, MAX_FRAMES, PAGE_SIZE, PhysicalAddress};

/// The swap device handed to [`VirtualMemory::init`].
///
/// The manager never reads or writes swap itself. It holds the handle so the fault-handling
/// layer that performs eviction can reach it through the manager, and returns it untouched
/// from [`VirtualMemory::deinit`].
#[derive(Debug)]
pub struct SwapSpace<S> {
    handle: S,
    frames: usize,
}

impl<S> SwapSpace<S> {
    /// Returns the swap handle.
    pub fn handle(&self) -> &S {
        &self.handle
    }

    /// Returns the swap handle mutably.
    pub fn handle_mut(&mut self) -> &mut S {
        &mut self.handle
    }

    /// Returns the number of frames the swap device can hold.
    pub fn frames(&self) -> usize {
        self.frames
    }
}

/// A software-emulated two-level paged virtual memory manager.
pub struct VirtualMemory<'m, S = ()> {
    pub(crate) frames: FrameAllocator<'m>,
    swap: SwapSpace<S>,
}

impl<'m, S> VirtualMemory<'m, S> {
    /// Takes over `memory` as an arena of `total_frames` frames.
    ///
    /// Frame 0 becomes the state record and frames `1..total_frames` are linked into the free
    /// list in ascending order. Bytes beyond the last frame are never touched.
    pub fn init(
        memory: &'m mut [u8],
        total_frames: usize,
        swap: S,
        swap_frames: usize,
    ) -> Result<Self, InitError> {
        if total_frames == 0 {
            return Err(InitError::ZeroFrames);
        }
        if total_frames > MAX_FRAMES {
            return Err(InitError::TooManyFrames(total_frames));
        }
        let Some(required) = total_frames.checked_mul(PAGE_SIZE) else {
            return Err(InitError::TooManyFrames(total_frames));
        };
        if memory.len() < required {
            return Err(InitError::RegionTooSmall {
                required,
                actual: memory.len(),
            });
        }

        let frames = FrameAllocator::new(FrameArena::new(memory, total_frames));

        log::info!(
            "paging arena ready: {} frames ({} bytes), {} free, {} swap frames",
            total_frames,
            required,
            frames.free_count(),
            swap_frames
        );

        Ok(Self {
            frames,
            swap: SwapSpace {
                handle: swap,
                frames: swap_frames,
            },
        })
    }

    /// Releases the manager, handing the swap handle back to the caller unchanged.
    ///
    /// The arena's contents are left as they are, so the region can still be inspected.
    pub fn deinit(self) -> S {
        log::info!(
            "paging arena released with {} of {} frames free",
            self.free_count(),
            self.total_frames()
        );
        self.swap.handle
    }

    /// Returns the number of frames in the arena, including the state record.
    pub fn total_frames(&self) -> usize {
        self.frames.total_frames()
    }

    /// Returns the number of free frames.
    pub fn free_count(&self) -> usize {
        self.frames.free_count()
    }

    /// Returns the number of address spaces created and not yet destroyed.
    pub fn active_processes(&self) -> usize {
        self.frames.arena().state(StateWord::ActiveProcesses) as usize
    }

    pub(crate) fn set_active_processes(&mut self, count: usize) {
        self.frames
            .arena_mut()
            .set_state(StateWord::ActiveProcesses, count as u32);
    }

    /// Iterates over the free list in allocation order.
    pub fn free_list(&self) -> FreeFrames<'_, 'm> {
        self.frames.iter()
    }

    /// Returns the role of a frame, or `None` if it lies outside the arena.
    pub fn frame_role(&self, frame: FrameNumber) -> Option<FrameRole> {
        self.frames.role(frame)
    }

    /// Counts the frames currently holding the given role.
    pub fn frames_with_role(&self, role: FrameRole) -> usize {
        self.frames.count(role)
    }

    /// Reads the 32-bit word at a physical address, for inspection.
    pub fn read_physical(&self, addr: PhysicalAddress) -> Option<u32> {
        self.frames.arena().read_physical(addr)
    }

    /// Returns the raw arena.
    pub fn memory(&self) -> &[u8] {
        self.frames.arena().bytes()
    }

    /// Returns the swap device passed to [`init`](Self::init).
    pub fn swap(&self) -> &SwapSpace<S> {
        &self.swap
    }

    /// Returns the swap device mutably.
    pub fn swap_mut(&mut self) -> &mut SwapSpace<S> {
        &mut self.swap
    }
}
