use std::alloc::Layout;
use std::cell::{Cell, RefCell};
use std::ptr::NonNull;
use std::rc::Rc;

use crate::{Allocate, Heap, Registry, Release};

/// Heap allocator that counts live blocks and can run out of memory on demand.
#[derive(Debug, Default)]
pub struct Tracking {
    budget: Cell<Option<usize>>,
    allocations: Cell<usize>,
    live: Cell<usize>,
    allocated: RefCell<Vec<usize>>,
    released: RefCell<Vec<usize>>,
}

impl Tracking {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Refuses every request after `budget` successful allocations.
    pub fn with_budget(budget: usize) -> Rc<Self> {
        let tracking = Self::new();
        tracking.set_budget(Some(budget));
        tracking
    }

    pub fn set_budget(&self, budget: Option<usize>) {
        self.budget.set(budget);
    }

    pub fn allocations(&self) -> usize {
        self.allocations.get()
    }

    pub fn live(&self) -> usize {
        self.live.get()
    }

    /// Addresses handed out, in order.
    pub fn allocated(&self) -> Vec<usize> {
        self.allocated.borrow().clone()
    }

    /// Addresses taken back, in order.
    pub fn released(&self) -> Vec<usize> {
        self.released.borrow().clone()
    }

    /// A ready registry with `self` in both slots.
    pub fn registry(self: &Rc<Self>) -> Rc<Registry> {
        let registry = Registry::new();
        unsafe {
            registry.register_allocate(Rc::clone(self));
            registry.register_release(Rc::clone(self));
        }
        Rc::new(registry)
    }
}

impl Allocate for Tracking {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        match self.budget.get() {
            Some(0) => return None,
            Some(budget) => self.budget.set(Some(budget - 1)),
            None => {}
        }
        let ptr = Heap.allocate(layout)?;
        self.allocations.set(self.allocations.get() + 1);
        self.live.set(self.live.get() + 1);
        self.allocated.borrow_mut().push(ptr.as_ptr() as usize);
        Some(ptr)
    }
}

impl Release for Tracking {
    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        self.live.set(self.live.get() - 1);
        self.released.borrow_mut().push(ptr.as_ptr() as usize);
        Heap.release(ptr, layout);
    }
}
