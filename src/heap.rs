use std::alloc::Layout;
use std::ptr::NonNull;

use super::{Allocate, Release};

/// Allocates from the global heap.
#[derive(Debug, Default, Clone, Copy)]
pub struct Heap;

impl Allocate for Heap {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        #[cfg(feature = "log")]
        log::trace!("Heap::allocate");

        if layout.size() == 0 {
            return None;
        }
        NonNull::new(unsafe { std::alloc::alloc(layout) })
    }
}

impl Release for Heap {
    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        #[cfg(feature = "log")]
        log::trace!("Heap::release");

        std::alloc::dealloc(ptr.as_ptr(), layout);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::pedantic)]

    use super::*;

    #[test]
    fn heap_zero_sized() {
        assert!(Heap.allocate(Layout::new::<()>()).is_none());
    }

    #[test]
    fn heap_aligned() {
        let layout = Layout::from_size_align(24, 16).unwrap();
        let ptr = Heap.allocate(layout).unwrap();
        assert_eq!(ptr.as_ptr().align_offset(16), 0);
        unsafe { Heap.release(ptr, layout) };
    }
}
