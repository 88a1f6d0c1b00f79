//! Slot arena shared by the copse containers.
//!
//! Both the red-black tree and the linked list embed their structural
//! relations next to the caller's record. Instead of raw addresses and
//! offset arithmetic, records live in stable arena slots addressed by
//! [`NodeId`]; containers thread parent/child/neighbor ids through them,
//! so relinking reassigns indices rather than aliasing memory.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

use alloc::vec::Vec;
use core::num::NonZeroU32;
use core::ops::{Index, IndexMut};

use static_assertions::assert_eq_size;

/// Stable handle to an occupied arena slot.
///
/// A handle stays valid until the slot is vacated with [`Arena::remove`].
/// Vacated slots are recycled, so a stale handle may later refer to a
/// different record; holding on to one past removal is a caller error,
/// the same contract as reusing freed node memory.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(NonZeroU32);

// The containers pack three or more Option<NodeId> relations per record;
// the NonZeroU32 niche keeps each one at four bytes.
assert_eq_size!(NodeId, u32);
assert_eq_size!(Option<NodeId>, u32);

impl NodeId {
    fn from_index(index: usize) -> Self {
        match u32::try_from(index)
            .ok()
            .and_then(|raw| raw.checked_add(1))
            .and_then(NonZeroU32::new)
        {
            Some(raw) => NodeId(raw),
            None => panic!("arena slot count exceeds u32 range"),
        }
    }

    fn index(self) -> usize {
        self.0.get() as usize - 1
    }
}

#[derive(Debug)]
enum Slot<T> {
    Occupied(T),
    /// Vacant slot holding the next link of the free list.
    Vacant(Option<NodeId>),
}

/// Growable slot storage with free-list reuse.
///
/// Insertion is amortized O(1): a vacant slot is recycled when one
/// exists, otherwise the backing vector grows. Removal is O(1) and
/// never shifts other slots, which is what keeps [`NodeId`] stable.
#[derive(Debug)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Option<NodeId>,
    len: usize,
}

impl<T> Arena<T> {
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: None,
            len: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: None,
            len: 0,
        }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `id` currently addresses an occupied slot.
    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.slots.get(id.index()), Some(Slot::Occupied(_)))
    }

    /// Store `value`, reusing a vacant slot when one exists.
    pub fn insert(&mut self, value: T) -> NodeId {
        self.insert_with(|_| value)
    }

    /// Store the record produced by `fill`, which receives the id the
    /// record will occupy. Lets self-referential records (a list link in
    /// a singleton ring points at itself) be built in one step.
    pub fn insert_with<F>(&mut self, fill: F) -> NodeId
    where
        F: FnOnce(NodeId) -> T,
    {
        let id = match self.free {
            Some(id) => {
                self.free = match self.slots[id.index()] {
                    Slot::Vacant(next) => next,
                    Slot::Occupied(_) => panic!("occupied slot on the arena free list"),
                };
                self.slots[id.index()] = Slot::Occupied(fill(id));
                id
            }
            None => {
                let id = NodeId::from_index(self.slots.len());
                let value = fill(id);
                self.slots.push(Slot::Occupied(value));
                id
            }
        };
        self.len += 1;
        id
    }

    /// Vacate the slot and hand the record back. The id becomes stale
    /// and the slot is queued for reuse.
    pub fn remove(&mut self, id: NodeId) -> T {
        match core::mem::replace(&mut self.slots[id.index()], Slot::Vacant(self.free)) {
            Slot::Occupied(value) => {
                self.free = Some(id);
                self.len -= 1;
                value
            }
            Slot::Vacant(next) => {
                self.slots[id.index()] = Slot::Vacant(next);
                panic!("remove of a vacant arena slot")
            }
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        match self.slots.get(id.index()) {
            Some(Slot::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        match self.slots.get_mut(id.index()) {
            Some(Slot::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    /// Drop every record and forget the free list.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free = None;
        self.len = 0;
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<NodeId> for Arena<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        match self.get(id) {
            Some(value) => value,
            None => panic!("vacant arena slot"),
        }
    }
}

impl<T> IndexMut<NodeId> for Arena<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        match self.get_mut(id) {
            Some(value) => value,
            None => panic!("vacant arena slot"),
        }
    }
}
