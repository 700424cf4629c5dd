//! Physical frame numbers.
//!
//! A frame number doubles as the physical page number (PPN) stored in page-table entries.

use core::fmt;
use core::ops::Add;

use crate::{PAGE_SIZE, PhysicalAddress};

/// A physical frame number.
///
/// Frame numbers are zero-indexed positions in the frame arena. Frame 0 holds the manager's
/// own bookkeeping and is never handed out.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct FrameNumber(u32);

impl FrameNumber {
    /// The frame holding the manager's state record.
    pub const METADATA: Self = Self(0);

    /// Creates a new frame number.
    #[inline]
    pub const fn new(number: u32) -> Self {
        Self(number)
    }

    /// Returns the raw frame number.
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the raw frame number widened to `usize`.
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Returns the physical address of the first byte of this frame.
    #[inline]
    pub const fn start(self) -> PhysicalAddress {
        PhysicalAddress::new(self.0 * PAGE_SIZE as u32)
    }
}

impl fmt::Debug for FrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameNumber({})", self.0)
    }
}

impl fmt::Display for FrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<u32> for FrameNumber {
    type Output = Self;

    #[inline]
    fn add(self, rhs: u32) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl From<PhysicalAddress> for FrameNumber {
    #[inline]
    fn from(addr: PhysicalAddress) -> Self {
        addr.frame_number()
    }
}
