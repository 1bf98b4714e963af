//! A singly-linked list and a FIFO queue whose memory comes from allocators the caller registers.
//!
//! Nothing is allocated until both an allocate and a release strategy are registered in a
//! [`Registry`]. Lists, queues and cursors keep a handle to the registry they were created from
//! and consult it on every allocation and release.
//!
//! ```
//! use pluggable_lists::{Queue, Registry};
//!
//! let registry = Registry::heap();
//! let mut queue = Queue::create(&registry).unwrap();
//! queue.push(10).unwrap();
//! queue.push(20).unwrap();
//! assert_eq!(queue.pop(), Ok(10));
//! assert_eq!(queue.size(), 1);
//! ```
#![warn(clippy::pedantic)]

mod error;
pub use error::*;

mod registry;
pub use registry::*;

mod heap;
pub use heap::*;

mod slab;
pub use slab::*;

mod linked_list;
pub use linked_list::*;

mod cursor;
pub use cursor::*;

mod queue;
pub use queue::*;

#[cfg(test)]
mod testing;
