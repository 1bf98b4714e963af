use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ops::Drop;
use std::ptr::NonNull;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::registry::take;
use super::{Allocated, Cursor, Error, Registry, Result};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

pub(crate) struct Node {
    pub(crate) data: u32,
    pub(crate) next: Option<NonNull<Node>>,
}

struct Chain {
    head: Option<NonNull<Node>>,
    // Aliases the last node reachable from `head`.
    tail: Option<NonNull<Node>>,
    size: usize,
    // Bumped by every insert and remove.
    generation: u64,
    id: u64,
}

/// A singly-linked list of `u32` whose nodes live in memory from a [`Registry`].
pub struct LinkedList(Allocated<Chain>);

impl LinkedList {
    /// # Errors
    ///
    /// When `registry` is not ready or out of memory.
    pub fn create(registry: &Rc<Registry>) -> Result<Self> {
        #[cfg(feature = "log")]
        log::trace!("LinkedList::create");

        let chain = Chain {
            head: None,
            tail: None,
            size: 0,
            generation: 0,
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
        };
        Allocated::new(registry, chain).map(Self)
    }

    /// # Errors
    ///
    /// Hands the list back untouched when no release function is registered.
    pub fn destroy(self) -> Result<(), Self> {
        #[cfg(feature = "log")]
        log::trace!("LinkedList::destroy");

        if self.registry().releaser().is_err() {
            return Err(self);
        }
        drop(self);
        Ok(())
    }

    #[must_use]
    pub fn registry(&self) -> &Rc<Registry> {
        self.0.registry()
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.0.size
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.head.is_none()
    }

    pub(crate) fn id(&self) -> u64 {
        self.0.id
    }

    pub(crate) fn generation(&self) -> u64 {
        self.0.generation
    }

    fn node(&self, index: usize) -> Option<NonNull<Node>> {
        let mut current = self.0.head;
        for _ in 0..index {
            current = unsafe { current?.as_ref() }.next;
        }
        current
    }

    fn grown(&mut self) {
        self.0.size += 1;
        self.0.generation = self.0.generation.wrapping_add(1);
    }

    /// # Errors
    ///
    /// When no node can be allocated.
    pub fn insert_at_end(&mut self, value: u32) -> Result<()> {
        #[cfg(feature = "log")]
        log::trace!("LinkedList::insert_at_end");

        let node = self.registry().allocate_value(Node {
            data: value,
            next: None,
        })?;
        match self.0.tail {
            Some(tail) => unsafe { (*tail.as_ptr()).next = Some(node) },
            None => self.0.head = Some(node),
        }
        self.0.tail = Some(node);
        self.grown();
        Ok(())
    }

    /// # Errors
    ///
    /// When no node can be allocated.
    pub fn insert_at_front(&mut self, value: u32) -> Result<()> {
        #[cfg(feature = "log")]
        log::trace!("LinkedList::insert_at_front");

        let node = self.registry().allocate_value(Node {
            data: value,
            next: self.0.head,
        })?;
        self.0.head = Some(node);
        if self.0.tail.is_none() {
            self.0.tail = Some(node);
        }
        self.grown();
        Ok(())
    }

    /// `index == size()` appends.
    ///
    /// # Errors
    ///
    /// When `index > size()` or no node can be allocated.
    pub fn insert_at(&mut self, index: usize, value: u32) -> Result<()> {
        #[cfg(feature = "log")]
        log::trace!("LinkedList::insert_at");

        let len = self.0.size;
        if index > len {
            return Err(Error::OutOfRange { index, len });
        }
        if index == 0 {
            return self.insert_at_front(value);
        }
        if index == len {
            return self.insert_at_end(value);
        }

        let prev = self
            .node(index - 1)
            .ok_or(Error::OutOfRange { index, len })?;
        let node = self.registry().allocate_value(Node {
            data: value,
            next: unsafe { prev.as_ref() }.next,
        })?;
        unsafe { (*prev.as_ptr()).next = Some(node) };
        self.grown();
        Ok(())
    }

    #[must_use]
    pub fn find(&self, value: u32) -> Option<usize> {
        self.values().position(|data| data == value)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<u32> {
        self.values().nth(index)
    }

    /// # Errors
    ///
    /// When the list is empty, `index >= size()`, or no release function is registered. The list
    /// is left unchanged.
    pub fn remove_at(&mut self, index: usize) -> Result<u32> {
        #[cfg(feature = "log")]
        log::trace!("LinkedList::remove_at");

        let len = self.0.size;
        let Some(head) = self.0.head else {
            return Err(Error::Empty);
        };
        if index >= len {
            return Err(Error::OutOfRange { index, len });
        }
        let release = self.registry().releaser()?;

        let removed = if index == 0 {
            self.0.head = unsafe { head.as_ref() }.next;
            if self.0.head.is_none() {
                self.0.tail = None;
            }
            head
        } else {
            let prev = self
                .node(index - 1)
                .ok_or(Error::OutOfRange { index, len })?;
            let removed = unsafe { prev.as_ref() }
                .next
                .ok_or(Error::OutOfRange { index, len })?;
            let next = unsafe { removed.as_ref() }.next;
            unsafe { (*prev.as_ptr()).next = next };
            if next.is_none() {
                self.0.tail = Some(prev);
            }
            removed
        };
        self.0.size -= 1;
        self.0.generation = self.0.generation.wrapping_add(1);

        Ok(unsafe { take(&*release, removed) }.data)
    }

    /// # Errors
    ///
    /// When `index >= size()` or the cursor cannot be allocated.
    pub fn create_iterator(&self, index: usize) -> Result<Cursor> {
        #[cfg(feature = "log")]
        log::trace!("LinkedList::create_iterator");

        let len = self.0.size;
        let node = self
            .node(index)
            .filter(|_| index < len)
            .ok_or(Error::OutOfRange { index, len })?;
        Cursor::new(self, node, index)
    }

    #[must_use]
    pub fn values(&self) -> Values<'_> {
        Values {
            next: self.0.head,
            remaining: self.0.size,
            __marker: PhantomData,
        }
    }
}

impl Drop for LinkedList {
    fn drop(&mut self) {
        #[cfg(feature = "log")]
        log::trace!("LinkedList::drop");

        let Ok(release) = self.registry().releaser() else {
            #[cfg(feature = "log")]
            log::warn!(
                "leaking {} nodes: no release function is registered",
                self.0.size
            );
            return;
        };
        let mut current = self.0.head.take();
        self.0.tail = None;
        self.0.size = 0;
        while let Some(node) = current {
            current = unsafe { take(&*release, node) }.next;
        }
    }
}

impl fmt::Debug for LinkedList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.values()).finish()
    }
}

impl<'a> IntoIterator for &'a LinkedList {
    type Item = u32;
    type IntoIter = Values<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.values()
    }
}

/// Payloads of a [`LinkedList`], head to tail.
pub struct Values<'a> {
    next: Option<NonNull<Node>>,
    remaining: usize,
    __marker: PhantomData<&'a LinkedList>,
}

impl Iterator for Values<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        let node = unsafe { self.next?.as_ref() };
        self.next = node.next;
        self.remaining -= 1;
        Some(node.data)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Values<'_> {}
impl FusedIterator for Values<'_> {}
