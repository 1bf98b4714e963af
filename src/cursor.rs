use std::ptr::NonNull;

use super::linked_list::Node;
use super::{Allocated, Error, LinkedList, Result};

#[derive(Debug)]
struct Position {
    list: u64,
    generation: u64,
    node: NonNull<Node>,
    index: usize,
    data: u32,
}

/// A forward-only position within a [`LinkedList`].
///
/// A cursor owns nothing it points at. It remembers which list it came from and how that list
/// looked when the cursor was created, and refuses to move once the list has been modified.
#[derive(Debug)]
pub struct Cursor(Allocated<Position>);

impl Cursor {
    pub(crate) fn new(list: &LinkedList, node: NonNull<Node>, index: usize) -> Result<Self> {
        let position = Position {
            list: list.id(),
            generation: list.generation(),
            node,
            index,
            data: unsafe { node.as_ref() }.data,
        };
        Allocated::new(list.registry(), position).map(Self)
    }

    /// Zero-based position of the current node.
    #[must_use]
    pub fn index(&self) -> usize {
        self.0.index
    }

    /// Payload of the current node, as of the last move.
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0.data
    }

    /// Moves to the next node of `list`.
    ///
    /// # Errors
    ///
    /// When the cursor came from another list, `list` changed since the cursor was created, or
    /// the cursor is on the last node. The cursor does not move.
    pub fn advance(&mut self, list: &LinkedList) -> Result<()> {
        if self.0.list != list.id() {
            return Err(Error::Foreign);
        }
        if self.0.generation != list.generation() {
            return Err(Error::Stale);
        }
        // `list` is unchanged since the cursor was created, so the node is still in its chain.
        let next = unsafe { self.0.node.as_ref() }.next.ok_or(Error::End)?;
        self.0.node = next;
        self.0.data = unsafe { next.as_ref() }.data;
        self.0.index += 1;
        Ok(())
    }

    /// Releases the cursor. The list is not touched.
    ///
    /// # Errors
    ///
    /// Hands the cursor back when no release function is registered.
    pub fn delete(self) -> Result<(), Self> {
        #[cfg(feature = "log")]
        log::trace!("Cursor::delete");

        self.0.into_inner().map(drop).map_err(Self)
    }
}
