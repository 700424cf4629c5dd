//! Page-table entry encoding.
//!
//! An entry is a 32-bit word:
//! - Bits 0-6: flags (see [`PageFlags`])
//! - Bits 7-11: reserved, always zero
//! - Bits 12-31: physical page number of the referenced frame

use core::fmt;

use crate::{FrameNumber, PageFlags};

/// Start bit of the physical page number field.
const PPN_SHIFT: u32 = 12;
/// Width of the physical page number field.
const PPN_BITS: u32 = 20;
/// Width of the flags field.
const FLAG_BITS: u32 = 7;

/// Returns a mask covering the low `width` bits.
const fn low_mask(width: u32) -> u32 {
    if width >= u32::BITS {
        u32::MAX
    } else {
        (1 << width) - 1
    }
}

/// Extracts the `width`-bit field starting at bit `start` of `word`.
#[inline]
pub const fn extract_bits(word: u32, start: u32, width: u32) -> u32 {
    (word >> start) & low_mask(width)
}

/// Returns `word` with the `width`-bit field at `start` replaced by `value`.
///
/// Bits of `value` above `width` are discarded.
#[inline]
pub const fn insert_bits(word: u32, start: u32, width: u32, value: u32) -> u32 {
    let mask = low_mask(width) << start;
    (word & !mask) | ((value << start) & mask)
}

/// A single 32-bit page-table entry.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct PageEntry(u32);

impl PageEntry {
    /// Creates an entry with every bit clear.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Encodes an entry referencing `frame` with the given flags.
    pub const fn new(frame: FrameNumber, flags: PageFlags) -> Self {
        debug_assert!(
            frame.as_u32() <= low_mask(PPN_BITS),
            "frame number exceeds the PPN field"
        );
        let word = insert_bits(0, PPN_SHIFT, PPN_BITS, frame.as_u32());
        Self(insert_bits(word, 0, FLAG_BITS, flags.bits()))
    }

    /// Creates an entry from its raw in-memory representation.
    pub const fn from_u32(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw in-memory representation.
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the flag bits.
    pub const fn flags(self) -> PageFlags {
        PageFlags::from_bits_truncate(extract_bits(self.0, 0, FLAG_BITS))
    }

    /// Returns the frame this entry references.
    pub const fn frame(self) -> FrameNumber {
        FrameNumber::new(extract_bits(self.0, PPN_SHIFT, PPN_BITS))
    }

    /// Returns true if every bit in `flags` is set.
    pub const fn contains(self, flags: PageFlags) -> bool {
        self.flags().contains(flags)
    }

    pub const fn is_valid(self) -> bool {
        self.contains(PageFlags::VALID)
    }

    pub const fn is_present(self) -> bool {
        self.contains(PageFlags::PRESENT)
    }

    pub const fn is_accessed(self) -> bool {
        self.contains(PageFlags::ACCESSED)
    }

    /// Sets the given flag bits, leaving the frame number alone.
    pub fn set(&mut self, flags: PageFlags) {
        self.0 |= flags.bits();
    }

    /// Clears the given flag bits, leaving the frame number alone.
    pub fn clear(&mut self, flags: PageFlags) {
        self.0 &= !flags.bits();
    }
}

impl fmt::Debug for PageEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageEntry")
            .field("frame", &self.frame())
            .field("flags", &self.flags())
            .finish()
    }
}
