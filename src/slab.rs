use std::alloc::Layout;
use std::cell::{Cell, UnsafeCell};
use std::fmt;
use std::mem::{align_of, size_of, MaybeUninit};
use std::ptr::NonNull;

use super::{Allocate, Release};

/// Largest request a [`Slab`] block can hold.
pub const BLOCK_SIZE: usize = 64;

#[derive(Clone, Copy)]
#[repr(C, align(16))]
union Block {
    empty: Option<usize>,
    // Only ever written through the pointers handed out.
    #[allow(dead_code)]
    full: [MaybeUninit<u8>; BLOCK_SIZE],
}

/// Hands out fixed-size blocks from an array of `N` blocks held inline.
///
/// Free blocks form a list linked by index and kept in index order, so the lowest free block is
/// always handed out first. Requests that do not fit a block are refused.
///
/// Allocations point into the slab itself, so it must not move while any are outstanding. Share
/// it through an [`Rc`](std::rc::Rc) to register it in both slots of a
/// [`Registry`](super::Registry).
pub struct Slab<const N: usize> {
    head: Cell<Option<usize>>,
    available: Cell<usize>,
    data: UnsafeCell<[Block; N]>,
}

impl<const N: usize> Slab<N> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            head: Cell::new((N > 0).then_some(0)),
            available: Cell::new(N),
            data: UnsafeCell::new(std::array::from_fn(|i| Block {
                empty: (i + 1 < N).then_some(i + 1),
            })),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        N
    }

    /// Number of free blocks.
    #[must_use]
    pub fn available(&self) -> usize {
        self.available.get()
    }

    fn block(&self, index: usize) -> *mut Block {
        debug_assert!(index < N);
        unsafe { self.data.get().cast::<Block>().add(index) }
    }

    fn index_of(&self, ptr: NonNull<u8>) -> Option<usize> {
        let offset = (ptr.as_ptr() as usize).checked_sub(self.data.get() as usize)?;
        let index = offset / size_of::<Block>();
        (offset % size_of::<Block>() == 0 && index < N).then_some(index)
    }
}

impl<const N: usize> Default for Slab<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for Slab<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slab")
            .field("capacity", &N)
            .field("available", &self.available.get())
            .finish()
    }
}

impl<const N: usize> Allocate for Slab<N> {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        #[cfg(feature = "log")]
        log::trace!("Slab::allocate");

        if layout.size() > size_of::<Block>() || layout.align() > align_of::<Block>() {
            return None;
        }
        let index = self.head.get()?;
        let block = self.block(index);
        self.head.set(unsafe { (*block).empty });
        self.available.set(self.available.get() - 1);
        NonNull::new(block.cast())
    }
}

impl<const N: usize> Release for Slab<N> {
    unsafe fn release(&self, ptr: NonNull<u8>, _layout: Layout) {
        #[cfg(feature = "log")]
        log::trace!("Slab::release");

        let Some(index) = self.index_of(ptr) else {
            #[cfg(feature = "log")]
            log::warn!("ignoring release of {ptr:?}, which this slab never handed out");
            return;
        };

        match self.head.get() {
            // Somewhere after the head, walk to the last free block before `index`.
            Some(head) if head < index => {
                let mut current = head;
                loop {
                    let next = (*self.block(current)).empty;
                    debug_assert_ne!(next, Some(index));
                    match next {
                        Some(next) if next < index => current = next,
                        _ => {
                            (*self.block(index)).empty = next;
                            (*self.block(current)).empty = Some(index);
                            break;
                        }
                    }
                }
            }
            // Before the head, or no free blocks at all.
            head => {
                debug_assert_ne!(head, Some(index));
                (*self.block(index)).empty = head;
                self.head.set(Some(index));
            }
        }
        self.available.set(self.available.get() + 1);
    }
}
