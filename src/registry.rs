use std::alloc::Layout;
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut, Drop};
use std::ptr::NonNull;
use std::rc::Rc;

use super::{Error, Heap, Result};

pub type AllocateFn = fn(Layout) -> Option<NonNull<u8>>;
pub type ReleaseFn = unsafe fn(NonNull<u8>, Layout);

/// Provides memory for lists, queues and cursors.
pub trait Allocate {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>>;
}

/// Takes back memory handed out by an [`Allocate`] strategy.
pub trait Release {
    /// # Safety
    ///
    /// `ptr` must have been returned by the paired allocator for `layout` and must not have been
    /// released already.
    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout);
}

impl Allocate for AllocateFn {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        (*self)(layout)
    }
}

impl Release for ReleaseFn {
    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        (*self)(ptr, layout);
    }
}

impl<A: Allocate + ?Sized> Allocate for Rc<A> {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        (**self).allocate(layout)
    }
}

impl<R: Release + ?Sized> Release for Rc<R> {
    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        (**self).release(ptr, layout);
    }
}

/// Allocate and release slots, read again on every call. Nothing is allocated until both are set.
#[derive(Default)]
pub struct Registry {
    allocate: RefCell<Option<Rc<dyn Allocate>>>,
    release: RefCell<Option<Rc<dyn Release>>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn heap() -> Rc<Self> {
        let registry = Self::new();
        unsafe {
            registry.register_allocate(Heap);
            registry.register_release(Heap);
        }
        Rc::new(registry)
    }

    /// # Safety
    ///
    /// Memory handed out by a previously registered strategy that is still owned by a live list,
    /// queue or cursor must remain valid until it is released.
    pub unsafe fn register_allocate<A: Allocate + 'static>(&self, allocate: A) {
        #[cfg(feature = "log")]
        log::trace!("Registry::register_allocate");

        *self.allocate.borrow_mut() = Some(Rc::new(allocate));
    }

    /// # Safety
    ///
    /// Every block still owned by a live list, queue or cursor must be releasable by `release`.
    pub unsafe fn register_release<R: Release + 'static>(&self, release: R) {
        #[cfg(feature = "log")]
        log::trace!("Registry::register_release");

        *self.release.borrow_mut() = Some(Rc::new(release));
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.allocate.borrow().is_some() && self.release.borrow().is_some()
    }

    pub(crate) fn releaser(&self) -> Result<Rc<dyn Release>> {
        self.release
            .borrow()
            .clone()
            .ok_or(Error::ReleaseUnregistered)
    }

    fn allocate_block<T>(&self) -> Result<NonNull<T>> {
        let allocate = self.allocate.borrow().clone();
        let release = self.release.borrow().clone();
        let (Some(allocate), Some(release)) = (allocate, release) else {
            return Err(Error::Unregistered);
        };

        let layout = Layout::new::<T>();
        let ptr = allocate
            .allocate(layout)
            .ok_or(Error::OutOfMemory {
                size: layout.size(),
            })?;
        if ptr.as_ptr().align_offset(layout.align()) != 0 {
            #[cfg(feature = "log")]
            log::warn!("allocator returned a block misaligned for {layout:?}");

            unsafe { release.release(ptr, layout) };
            return Err(Error::OutOfMemory {
                size: layout.size(),
            });
        }
        Ok(ptr.cast())
    }

    // `value` is dropped when allocation is refused.
    pub(crate) fn allocate_value<T>(&self, value: T) -> Result<NonNull<T>> {
        let ptr = self.allocate_block::<T>()?;
        unsafe { ptr.as_ptr().write(value) };
        Ok(ptr)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("allocate", &self.allocate.borrow().is_some())
            .field("release", &self.release.borrow().is_some())
            .finish()
    }
}

/// # Safety
///
/// `ptr` must come from [`Registry::allocate_value`] on a registry whose release strategy is
/// `release`, and must not be used again.
pub(crate) unsafe fn take<T>(release: &dyn Release, ptr: NonNull<T>) -> T {
    let value = ptr.as_ptr().read();
    release.release(ptr.cast(), Layout::new::<T>());
    value
}

/// A value in memory from a [`Registry`], released on drop (or leaked if release is unset).
pub struct Allocated<T> {
    ptr: NonNull<T>,
    registry: Rc<Registry>,
    __marker: PhantomData<T>,
}

impl<T> Allocated<T> {
    /// # Errors
    ///
    /// When `registry` is not ready or its allocator has no memory left.
    pub fn new(registry: &Rc<Registry>, value: T) -> Result<Self> {
        let ptr = registry.allocate_value(value)?;
        Ok(Self {
            ptr,
            registry: Rc::clone(registry),
            __marker: PhantomData,
        })
    }

    /// Allocates the block first and only then builds the value that goes in it.
    ///
    /// # Errors
    ///
    /// When `registry` is not ready, has no memory left, or `init` fails. The block is released
    /// again if `init` fails.
    pub fn new_with(registry: &Rc<Registry>, init: impl FnOnce() -> Result<T>) -> Result<Self> {
        let ptr = registry.allocate_block::<T>()?;
        match init() {
            Ok(value) => {
                unsafe { ptr.as_ptr().write(value) };
                Ok(Self {
                    ptr,
                    registry: Rc::clone(registry),
                    __marker: PhantomData,
                })
            }
            Err(error) => {
                if let Ok(release) = registry.releaser() {
                    unsafe { release.release(ptr.cast(), Layout::new::<T>()) };
                }
                Err(error)
            }
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Rc<Registry> {
        &self.registry
    }

    /// # Errors
    ///
    /// Hands `self` back untouched when no release function is registered.
    pub fn into_inner(self) -> Result<T, Self> {
        let Ok(release) = self.registry.releaser() else {
            return Err(self);
        };
        let this = ManuallyDrop::new(self);
        let value = unsafe { take(&*release, this.ptr) };
        drop(unsafe { std::ptr::read(&this.registry) });
        Ok(value)
    }

    #[cfg(test)]
    pub(crate) fn rebind(&mut self, registry: &Rc<Registry>) {
        self.registry = Rc::clone(registry);
    }
}

impl<T> Deref for Allocated<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        unsafe { self.ptr.as_ref() }
    }
}
impl<T> DerefMut for Allocated<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { self.ptr.as_mut() }
    }
}

impl<T> Drop for Allocated<T> {
    fn drop(&mut self) {
        #[cfg(feature = "log")]
        log::trace!("Allocated::drop");

        if let Ok(release) = self.registry.releaser() {
            // The value goes first so anything it owns is released before its own block.
            unsafe {
                std::ptr::drop_in_place(self.ptr.as_ptr());
                release.release(self.ptr.cast(), Layout::new::<T>());
            }
        } else {
            #[cfg(feature = "log")]
            log::warn!(
                "leaking {} bytes: no release function is registered",
                std::mem::size_of::<T>()
            );
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Allocated<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}
