#![cfg_attr(not(test), no_std)]

//! # Pagetable
//!
//! A software-emulated two-level paged virtual memory manager. It runs entirely inside a
//! caller-supplied byte region treated as physical memory, and provides:
//!
//! - A free-frame allocator whose metadata lives inside the memory it manages.
//! - 32-bit page-table entries with permission, presence and accessed bits.
//! - Mapping and unmapping of 4 KiB pages in per-process address spaces.
//! - Address translation with permission checks on behalf of a fault handler.
//! - An accessed-bit sweep feeding an external page-replacement policy.
//!
//! ```
//! use pagetable::{AccessKind, Permissions, PhysicalAddress, VirtualAddress, VirtualMemory};
//!
//! let mut memory = vec![0u8; 10 * pagetable::PAGE_SIZE];
//! let mut vm = VirtualMemory::init(&mut memory, 10, (), 0).unwrap();
//!
//! let vaddr = VirtualAddress::new(0x0040_0000);
//! let read_only = Permissions::new(true, false, false, true);
//! let root = vm.map_page(true, PhysicalAddress::new(0), vaddr, read_only).unwrap();
//!
//! let paddr = vm.translate(root, vaddr + 0x10, AccessKind::Read, true).unwrap();
//! assert_eq!(paddr, PhysicalAddress::new(0x3010));
//! ```

extern crate alloc;

mod accessed;
mod address;
mod arena;
mod entry;
mod error;
mod flags;
mod frame;
mod free_list;
mod mapping;
mod numbers;
mod table;
mod translate;
mod vm;
mod walker;

pub use address::{PhysicalAddress, VirtualAddress};
pub use entry::{PageEntry, extract_bits, insert_bits};
pub use error::{InitError, Status, VmError, VmResult};
pub use flags::{PageFlags, Permissions};
pub use frame::FrameRole;
pub use free_list::FreeFrames;
pub use mapping::NEW_PROCESS_FRAMES;
pub use numbers::FrameNumber;
pub use translate::AccessKind;
pub use vm::{SwapSpace, VirtualMemory};

pub use arena::{ENTRY_COUNT, ENTRY_SIZE, MAX_FRAMES, PAGE_SIZE};
