use std::fmt;
use std::rc::Rc;

use super::{Allocated, LinkedList, Registry, Result, Values};

/// A first-in-first-out queue of `u32` backed by a [`LinkedList`].
///
/// The front of the queue is the head of the list and the back is its tail, so both `push` and
/// `pop` are O(1).
pub struct Queue(Allocated<LinkedList>);

impl Queue {
    /// Creates an empty queue.
    ///
    /// # Errors
    ///
    /// When `registry` is not ready or out of memory. The queue block is released again if the
    /// backing list cannot be created.
    pub fn create(registry: &Rc<Registry>) -> Result<Self> {
        #[cfg(feature = "log")]
        log::trace!("Queue::create");

        Allocated::new_with(registry, || LinkedList::create(registry)).map(Self)
    }

    /// Destroys the backing list and then releases the queue.
    ///
    /// # Errors
    ///
    /// Hands the queue back untouched when no release function is registered.
    pub fn destroy(self) -> Result<(), Self> {
        #[cfg(feature = "log")]
        log::trace!("Queue::destroy");

        if self.0.registry().releaser().is_err() {
            return Err(self);
        }
        drop(self);
        Ok(())
    }

    /// Adds `value` at the back.
    ///
    /// # Errors
    ///
    /// When no node can be allocated.
    pub fn push(&mut self, value: u32) -> Result<()> {
        self.0.insert_at_end(value)
    }

    /// Removes and returns the value at the front.
    ///
    /// # Errors
    ///
    /// When the queue is empty or no release function is registered.
    pub fn pop(&mut self) -> Result<u32> {
        self.0.remove_at(0)
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.0.size()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether a value is waiting at the front.
    #[must_use]
    pub fn has_next(&self) -> bool {
        !self.is_empty()
    }

    /// The value at the front, without removing it.
    #[must_use]
    pub fn peek_next(&self) -> Option<u32> {
        self.0.get(0)
    }

    /// Iterates from front to back.
    #[must_use]
    pub fn values(&self) -> Values<'_> {
        self.0.values()
    }
}

impl fmt::Debug for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.values()).finish()
    }
}
