//! The emulated physical memory the manager runs on.
//!
//! The arena is a caller-owned byte region carved into fixed-size frames. Everything is
//! addressed by frame number and word index; the manager never does raw pointer arithmetic.
//!
//! Frame 0 holds the manager's state record as 32-bit words (see [`StateWord`]). Free frames
//! hold the number of the next free frame in their first word.

use crate::table::{PageTable, PageTableMut};
use crate::{FrameNumber, PhysicalAddress};

/// Size of a frame in bytes.
pub const PAGE_SIZE: usize = 4096;

/// Size of a page-table entry in bytes.
pub const ENTRY_SIZE: usize = 4;

/// Number of entries in a page-table frame.
pub const ENTRY_COUNT: usize = PAGE_SIZE / ENTRY_SIZE;

/// Largest frame count the 20-bit PPN field can address.
pub const MAX_FRAMES: usize = 1 << 20;

/// Words of the state record kept in frame 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub(crate) enum StateWord {
    TotalFrames = 0,
    FreeCount = 1,
    FreeHead = 2,
    ActiveProcesses = 3,
}

/// Reads a native-endian word at `offset`.
#[inline]
pub(crate) fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_ne_bytes(word)
}

/// Writes a native-endian word at `offset`.
#[inline]
pub(crate) fn write_u32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_ne_bytes());
}

/// A fixed-size array of frames over caller-owned memory.
pub(crate) struct FrameArena<'m> {
    bytes: &'m mut [u8],
    frames: usize,
}

impl<'m> FrameArena<'m> {
    /// Wraps `memory` as `frames` frames.
    ///
    /// The caller has checked that the region holds at least `frames` whole frames; any
    /// trailing bytes are left alone.
    pub fn new(memory: &'m mut [u8], frames: usize) -> Self {
        debug_assert!(memory.len() >= frames * PAGE_SIZE);
        Self {
            bytes: &mut memory[..frames * PAGE_SIZE],
            frames,
        }
    }

    /// Returns the number of frames in the arena.
    pub fn frame_count(&self) -> usize {
        self.frames
    }

    /// Returns true if `frame` lies inside the arena.
    pub fn contains(&self, frame: FrameNumber) -> bool {
        frame.as_usize() < self.frames
    }

    /// Returns the bytes of a frame.
    ///
    /// # Panics
    ///
    /// Panics if the frame lies outside the arena.
    pub fn frame(&self, frame: FrameNumber) -> &[u8] {
        let start = frame.as_usize() * PAGE_SIZE;
        &self.bytes[start..start + PAGE_SIZE]
    }

    /// Returns the bytes of a frame mutably.
    ///
    /// # Panics
    ///
    /// Panics if the frame lies outside the arena.
    pub fn frame_mut(&mut self, frame: FrameNumber) -> &mut [u8] {
        let start = frame.as_usize() * PAGE_SIZE;
        &mut self.bytes[start..start + PAGE_SIZE]
    }

    /// Reads word `index` of a frame.
    pub fn read_word(&self, frame: FrameNumber, index: usize) -> u32 {
        read_u32(self.frame(frame), index * ENTRY_SIZE)
    }

    /// Writes word `index` of a frame.
    pub fn write_word(&mut self, frame: FrameNumber, index: usize, value: u32) {
        write_u32(self.frame_mut(frame), index * ENTRY_SIZE, value);
    }

    /// Fills a frame with zeroes.
    pub fn zero(&mut self, frame: FrameNumber) {
        self.frame_mut(frame).fill(0);
    }

    /// Reads a word of the state record.
    pub fn state(&self, word: StateWord) -> u32 {
        self.read_word(FrameNumber::METADATA, word as usize)
    }

    /// Writes a word of the state record.
    pub fn set_state(&mut self, word: StateWord, value: u32) {
        self.write_word(FrameNumber::METADATA, word as usize, value);
    }

    /// Returns a read-only view of the page table stored in `frame`.
    pub fn table(&self, frame: FrameNumber) -> PageTable<'_> {
        PageTable::new(self.frame(frame))
    }

    /// Returns a mutable view of the page table stored in `frame`.
    pub fn table_mut(&mut self, frame: FrameNumber) -> PageTableMut<'_> {
        PageTableMut::new(self.frame_mut(frame))
    }

    /// Reads the 32-bit word at a physical address.
    ///
    /// Returns `None` if the word does not lie entirely inside the arena.
    pub fn read_physical(&self, addr: PhysicalAddress) -> Option<u32> {
        let offset = addr.as_usize();
        if offset.checked_add(4)? > self.bytes.len() {
            return None;
        }
        Some(read_u32(&self.bytes[..], offset))
    }

    /// Returns the whole arena.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_constants() {
        assert_eq!(ENTRY_COUNT, 1024);
        assert_eq!(MAX_FRAMES * PAGE_SIZE, 1 << 32);
    }

    #[test]
    fn words_are_frame_relative() {
        let mut memory = vec![0u8; 3 * PAGE_SIZE];
        let mut arena = FrameArena::new(&mut memory, 3);
        arena.write_word(FrameNumber::new(2), 1, 0xDEAD_BEEF);

        assert_eq!(arena.read_word(FrameNumber::new(2), 1), 0xDEAD_BEEF);
        assert_eq!(
            arena.read_physical(PhysicalAddress::new(2 * PAGE_SIZE as u32 + 4)),
            Some(0xDEAD_BEEF)
        );
        drop(arena);
        assert_eq!(
            &memory[2 * PAGE_SIZE + 4..2 * PAGE_SIZE + 8],
            &0xDEAD_BEEFu32.to_ne_bytes()
        );
    }

    #[test]
    fn state_lives_in_frame_zero() {
        let mut memory = vec![0u8; 2 * PAGE_SIZE];
        let mut arena = FrameArena::new(&mut memory, 2);
        arena.set_state(StateWord::FreeHead, 1);
        arena.set_state(StateWord::ActiveProcesses, 4);

        assert_eq!(arena.read_word(FrameNumber::METADATA, 2), 1);
        assert_eq!(arena.state(StateWord::ActiveProcesses), 4);
    }

    #[test]
    fn zero_clears_only_that_frame() {
        let mut memory = vec![0xAAu8; 3 * PAGE_SIZE];
        let mut arena = FrameArena::new(&mut memory, 3);
        arena.zero(FrameNumber::new(1));

        assert!(arena.frame(FrameNumber::new(1)).iter().all(|&b| b == 0));
        assert!(arena.frame(FrameNumber::new(2)).iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn ignores_trailing_bytes() {
        let mut memory = vec![0u8; 2 * PAGE_SIZE + 100];
        let arena = FrameArena::new(&mut memory, 2);
        assert_eq!(arena.bytes().len(), 2 * PAGE_SIZE);
        assert_eq!(
            arena.read_physical(PhysicalAddress::new(2 * PAGE_SIZE as u32)),
            None
        );
    }
}
