//! Address types for the emulated physical arena and the 32-bit virtual space.
//!
//! Physical addresses are byte offsets into the frame arena. Virtual addresses are
//! 32-bit values that decompose into two 10-bit table indices and a 12-bit page offset.

use core::fmt;
use core::ops::{Add, Sub};

use crate::entry::extract_bits;
use crate::{FrameNumber, PAGE_SIZE};

/// Start bit of the level-1 (root) table index in a virtual address.
const PT1_INDEX_SHIFT: u32 = 22;
/// Start bit of the level-2 table index in a virtual address.
const PT2_INDEX_SHIFT: u32 = 12;
/// Width of each table index field.
const INDEX_BITS: u32 = 10;
/// Width of the page offset field.
const OFFSET_BITS: u32 = 12;

/// Generates the structure and methods shared by both address types.
macro_rules! impl_address_common {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Creates a new address.
            #[inline]
            pub const fn new(addr: u32) -> Self {
                Self(addr)
            }

            /// Returns the raw address value.
            #[inline]
            pub const fn as_u32(self) -> u32 {
                self.0
            }

            /// Returns the raw address value widened to `usize`.
            #[inline]
            pub const fn as_usize(self) -> usize {
                self.0 as usize
            }

            /// Returns the byte offset of this address within its page or frame.
            #[inline]
            pub const fn page_offset(self) -> u32 {
                extract_bits(self.0, 0, OFFSET_BITS)
            }

            /// Checks if the address is aligned to the given alignment.
            ///
            /// # Panics
            ///
            /// Panics if `align` is not a power of two.
            #[inline]
            pub const fn is_aligned(self, align: u32) -> bool {
                assert!(align.is_power_of_two(), "alignment must be a power of two");
                self.0 & (align - 1) == 0
            }

            /// Aligns the address down to the given alignment.
            ///
            /// # Panics
            ///
            /// Panics if `align` is not a power of two.
            #[inline]
            pub const fn align_down(self, align: u32) -> Self {
                assert!(align.is_power_of_two(), "alignment must be a power of two");
                Self(self.0 & !(align - 1))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:#010x})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:#x}", self.0)
            }
        }

        impl From<u32> for $name {
            #[inline]
            fn from(addr: u32) -> Self {
                Self(addr)
            }
        }

        impl From<$name> for u32 {
            #[inline]
            fn from(addr: $name) -> Self {
                addr.0
            }
        }

        impl Add<u32> for $name {
            type Output = Self;

            #[inline]
            fn add(self, rhs: u32) -> Self::Output {
                Self(self.0 + rhs)
            }
        }

        impl Sub<$name> for $name {
            type Output = u32;

            #[inline]
            fn sub(self, rhs: $name) -> Self::Output {
                self.0 - rhs.0
            }
        }
    };
}

impl_address_common!(
    PhysicalAddress,
    "A byte offset into the emulated physical frame arena.\n\n\
     Addresses that name a page table or a data frame are frame-aligned."
);

impl PhysicalAddress {
    /// Returns the frame containing this address.
    #[inline]
    pub const fn frame_number(self) -> FrameNumber {
        FrameNumber::new(self.0 / PAGE_SIZE as u32)
    }

    /// Returns the frame this address names, or `None` if it is not frame-aligned.
    #[inline]
    pub const fn aligned_frame(self) -> Option<FrameNumber> {
        if self.is_aligned(PAGE_SIZE as u32) {
            Some(self.frame_number())
        } else {
            None
        }
    }
}

impl_address_common!(
    VirtualAddress,
    "A 32-bit virtual address.\n\n\
     Bits 22-31 index the root table, bits 12-21 index the second-level table and\n\
     bits 0-11 are the offset within the page."
);

impl VirtualAddress {
    /// Builds a virtual address from its table indices and page offset.
    ///
    /// Each component is truncated to its field width.
    #[inline]
    pub const fn from_parts(pt1_index: usize, pt2_index: usize, offset: u32) -> Self {
        let pt1 = (pt1_index as u32) & ((1 << INDEX_BITS) - 1);
        let pt2 = (pt2_index as u32) & ((1 << INDEX_BITS) - 1);
        let offset = offset & ((1 << OFFSET_BITS) - 1);
        Self((pt1 << PT1_INDEX_SHIFT) | (pt2 << PT2_INDEX_SHIFT) | offset)
    }

    /// Returns the index into the root (level-1) table.
    #[inline]
    pub const fn pt1_index(self) -> usize {
        extract_bits(self.0, PT1_INDEX_SHIFT, INDEX_BITS) as usize
    }

    /// Returns the index into the second-level table.
    #[inline]
    pub const fn pt2_index(self) -> usize {
        extract_bits(self.0, PT2_INDEX_SHIFT, INDEX_BITS) as usize
    }

    /// Returns the address of the first byte of the page containing this address.
    #[inline]
    pub const fn page_base(self) -> Self {
        self.align_down(PAGE_SIZE as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod physical_address {
        use super::*;

        #[test]
        fn frame_number_truncates_offset() {
            let addr = PhysicalAddress::new(3 * PAGE_SIZE as u32 + 10);
            assert_eq!(addr.frame_number(), FrameNumber::new(3));
            assert_eq!(addr.page_offset(), 10);
        }

        #[test]
        fn aligned_frame_rejects_unaligned() {
            assert_eq!(
                PhysicalAddress::new(0x2000).aligned_frame(),
                Some(FrameNumber::new(2))
            );
            assert_eq!(PhysicalAddress::new(0x2004).aligned_frame(), None);
        }

        #[test]
        fn add_and_sub() {
            let base = PhysicalAddress::new(0x3000);
            assert_eq!((base + 0x24).as_u32(), 0x3024);
            assert_eq!(PhysicalAddress::new(0x3024) - base, 0x24);
        }

        #[test]
        fn debug_format() {
            let debug_str = format!("{:?}", PhysicalAddress::new(0x3000));
            assert_eq!(debug_str, "PhysicalAddress(0x00003000)");
        }

        #[test]
        fn display_format() {
            assert_eq!(format!("{}", PhysicalAddress::new(0x3000)), "0x3000");
        }
    }

    mod virtual_address {
        use super::*;

        #[test]
        fn decomposes_into_indices() {
            // 0x00400000 is the first page of the second 4 MiB region.
            let addr = VirtualAddress::new(0x0040_0000);
            assert_eq!(addr.pt1_index(), 1);
            assert_eq!(addr.pt2_index(), 0);
            assert_eq!(addr.page_offset(), 0);
        }

        #[test]
        fn decomposes_all_fields() {
            let addr = VirtualAddress::new(0xFFC0_3ABC);
            assert_eq!(addr.pt1_index(), 0x3FF);
            assert_eq!(addr.pt2_index(), 0x003);
            assert_eq!(addr.page_offset(), 0xABC);
        }

        #[test]
        fn highest_address() {
            let addr = VirtualAddress::new(u32::MAX);
            assert_eq!(addr.pt1_index(), 1023);
            assert_eq!(addr.pt2_index(), 1023);
            assert_eq!(addr.page_offset(), 0xFFF);
        }

        #[test]
        fn from_parts_inverts_decomposition() {
            let addr = VirtualAddress::from_parts(5, 17, 0x123);
            assert_eq!(addr.pt1_index(), 5);
            assert_eq!(addr.pt2_index(), 17);
            assert_eq!(addr.page_offset(), 0x123);
        }

        #[test]
        fn from_parts_truncates_fields() {
            let addr = VirtualAddress::from_parts(1024 + 2, 1024 + 3, 0x1004);
            assert_eq!(addr, VirtualAddress::from_parts(2, 3, 4));
        }

        #[test]
        fn page_base_clears_offset() {
            let addr = VirtualAddress::new(0x0040_1ABC);
            assert_eq!(addr.page_base(), VirtualAddress::new(0x0040_1000));
        }

        #[test]
        #[should_panic(expected = "alignment must be a power of two")]
        fn align_rejects_non_power_of_two() {
            VirtualAddress::new(0x1000).is_aligned(3);
        }
    }
}
