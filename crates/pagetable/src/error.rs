//! Result codes reported to the fault handler.

use thiserror::Error;

use crate::MAX_FRAMES;

/// A recoverable failure of a paging operation.
///
/// None of these are fatal; the caller decides whether to evict, retry or signal the
/// faulting process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum VmError {
    /// The root is not a live table, or the address has no complete mapping.
    #[error("address is not mapped")]
    BadAddress,
    /// The mapping exists but forbids the requested access.
    #[error("access not permitted by page permissions")]
    BadPermission,
    /// The page is already mapped.
    #[error("page is already mapped")]
    Duplicate,
    /// Not enough free frames to complete the request.
    #[error("out of physical frames")]
    OutOfMemory,
}

/// Result of a paging operation.
pub type VmResult<T> = Result<T, VmError>;

/// Flat status vocabulary for callers that exchange plain result codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Status {
    Ok = 0,
    BadAddress = 1,
    BadPermission = 2,
    Duplicate = 3,
    OutOfMemory = 4,
}

impl Status {
    /// Returns the numeric code of this status.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Returns true for [`Status::Ok`].
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl From<VmError> for Status {
    fn from(error: VmError) -> Self {
        match error {
            VmError::BadAddress => Self::BadAddress,
            VmError::BadPermission => Self::BadPermission,
            VmError::Duplicate => Self::Duplicate,
            VmError::OutOfMemory => Self::OutOfMemory,
        }
    }
}

impl<T> From<&VmResult<T>> for Status {
    fn from(result: &VmResult<T>) -> Self {
        match result {
            Ok(_) => Self::Ok,
            Err(error) => Self::from(*error),
        }
    }
}

/// Reasons [`init`](crate::VirtualMemory::init) can reject its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InitError {
    /// At least one frame is needed for the state record.
    #[error("at least one frame is required")]
    ZeroFrames,
    /// More frames than a 20-bit physical page number can name.
    #[error("{0} frames exceed the addressable maximum of {max}", max = MAX_FRAMES)]
    TooManyFrames(usize),
    /// The memory region is smaller than the requested frame count.
    #[error("memory region of {actual} bytes cannot hold {required} bytes of frames")]
    RegionTooSmall { required: usize, actual: usize },
}
