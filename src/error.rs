/// Reasons an operation was refused.
///
/// A refused operation leaves every list, queue and cursor it touched unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// An allocate or release function is missing from the registry.
    #[error("allocation is refused until both an allocate and a release function are registered")]
    Unregistered,

    /// The release function is missing from the registry.
    #[error("no release function is registered")]
    ReleaseUnregistered,

    /// The registered allocator could not provide memory.
    #[error("allocator refused a request for {size} bytes")]
    OutOfMemory {
        /// Size of the refused request.
        size: usize,
    },

    /// An index was outside the valid range.
    #[error("index {index} is out of range for length {len}")]
    OutOfRange {
        /// The requested index.
        index: usize,
        /// Length of the list at the time of the request.
        len: usize,
    },

    /// The list or queue has no elements.
    #[error("container is empty")]
    Empty,

    /// The cursor is already on the last node.
    #[error("cursor is on the last node")]
    End,

    /// The cursor was created from a different list.
    #[error("cursor belongs to a different list")]
    Foreign,

    /// The list was modified after the cursor was created.
    #[error("list was modified after the cursor was created")]
    Stale,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
