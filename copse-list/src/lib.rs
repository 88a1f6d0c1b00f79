//! Circular doubly-linked list over arena-resident records.
//!
//! The minimal collaborator to the red-black tree: same slot-arena
//! embedding, no ordering and no balancing. Linked records form a ring,
//! so `next` of the back record wraps to the front and `prev` of the
//! front record wraps to the back. FIFO order under `push_back`.

#![cfg_attr(not(test), no_std)]

use copse_arena::Arena;
pub use copse_arena::NodeId;
use static_assertions::assert_eq_size;

#[derive(Debug)]
struct Link<T> {
    item: T,
    next: NodeId,
    prev: NodeId,
}

// Two bare ids per record; a linked record always has both neighbors
// (itself, in a singleton ring).
assert_eq_size!(Link<()>, [u32; 2]);

/// Unordered ring of records with stable handles.
///
/// All operations are O(1) except iteration. Single-threaded by
/// contract, like the tree.
#[derive(Debug)]
pub struct List<T> {
    arena: Arena<Link<T>>,
    head: Option<NodeId>,
}

impl<T> List<T> {
    pub const fn new() -> Self {
        Self {
            arena: Arena::new(),
            head: None,
        }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Front record, `None` on an empty list.
    pub fn front(&self) -> Option<NodeId> {
        self.head
    }

    /// Back record, `None` on an empty list.
    pub fn back(&self) -> Option<NodeId> {
        self.head.map(|head| self.arena[head].prev)
    }

    /// Successor in ring order; wraps from back to front.
    pub fn next(&self, id: NodeId) -> NodeId {
        debug_assert!(self.arena.contains(id));
        self.arena[id].next
    }

    /// Predecessor in ring order; wraps from front to back.
    pub fn prev(&self, id: NodeId) -> NodeId {
        debug_assert!(self.arena.contains(id));
        self.arena[id].prev
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.arena.get(id).map(|link| &link.item)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.arena.get_mut(id).map(|link| &mut link.item)
    }

    /// Link `item` at the front of the ring.
    pub fn push_front(&mut self, item: T) -> NodeId {
        let id = self.push_back(item);
        self.head = Some(id);
        id
    }

    /// Link `item` at the back of the ring.
    pub fn push_back(&mut self, item: T) -> NodeId {
        match self.head {
            Some(head) => {
                let tail = self.arena[head].prev;
                let id = self.arena.insert(Link {
                    item,
                    prev: tail,
                    next: head,
                });
                self.arena[tail].next = id;
                self.arena[head].prev = id;
                id
            }
            None => {
                let id = self.arena.insert_with(|id| Link {
                    item,
                    prev: id,
                    next: id,
                });
                self.head = Some(id);
                id
            }
        }
    }

    /// Unlink the record at `id` and hand it back. `id` becomes stale.
    pub fn remove(&mut self, id: NodeId) -> T {
        debug_assert!(self.arena.contains(id));

        let next = self.arena[id].next;
        if next == id {
            // Sole record in the ring.
            self.head = None;
        } else {
            let prev = self.arena[id].prev;
            self.arena[prev].next = next;
            self.arena[next].prev = prev;
            if self.head == Some(id) {
                self.head = Some(next);
            }
        }

        self.arena.remove(id).item
    }

    /// Swap the record stored at `id` for `item`; the new record takes
    /// over the old one's position in the ring.
    pub fn replace(&mut self, id: NodeId, item: T) -> T {
        debug_assert!(self.arena.contains(id));
        core::mem::replace(&mut self.arena[id].item, item)
    }

    pub fn pop_front(&mut self) -> Option<T> {
        self.head.map(|head| self.remove(head))
    }

    pub fn pop_back(&mut self) -> Option<T> {
        self.back().map(|back| self.remove(back))
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.head = None;
    }

    /// Front-to-back iteration over `(id, record)` pairs.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
            remaining: self.len(),
        }
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// One full lap of the ring, front to back.
pub struct Iter<'a, T> {
    list: &'a List<T>,
    cursor: Option<NodeId>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (NodeId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.cursor?;
        self.remaining -= 1;
        self.cursor = Some(self.list.arena[id].next);
        Some((id, &self.list.arena[id].item))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items<T: Copy>(list: &List<T>) -> Vec<T> {
        list.iter().map(|(_, item)| *item).collect()
    }

    #[test]
    fn test_empty() {
        let list: List<u32> = List::new();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert_eq!(list.front(), None);
        assert_eq!(list.back(), None);
    }

    #[test]
    fn test_push_back_is_fifo() {
        let mut list = List::new();
        for value in 1u32..=4 {
            list.push_back(value);
        }

        assert_eq!(items(&list), vec![1, 2, 3, 4]);
        assert_eq!(list.len(), 4);
        assert_eq!(*list.get(list.front().unwrap()).unwrap(), 1);
        assert_eq!(*list.get(list.back().unwrap()).unwrap(), 4);
    }

    #[test]
    fn test_push_front() {
        let mut list = List::new();
        for value in 1u32..=3 {
            list.push_front(value);
        }

        assert_eq!(items(&list), vec![3, 2, 1]);
    }

    #[test]
    fn test_ring_wraps() {
        let mut list = List::new();
        let a = list.push_back("a");
        let b = list.push_back("b");
        let c = list.push_back("c");

        assert_eq!(list.next(a), b);
        assert_eq!(list.next(c), a);
        assert_eq!(list.prev(a), c);
        assert_eq!(list.prev(b), a);
    }

    #[test]
    fn test_singleton_ring_points_at_itself() {
        let mut list = List::new();
        let a = list.push_back(7u32);
        assert_eq!(list.next(a), a);
        assert_eq!(list.prev(a), a);
        assert_eq!(list.front(), Some(a));
        assert_eq!(list.back(), Some(a));
    }

    #[test]
    fn test_remove_middle_front_sole() {
        let mut list = List::new();
        let a = list.push_back(1u32);
        let b = list.push_back(2);
        let c = list.push_back(3);

        assert_eq!(list.remove(b), 2);
        assert_eq!(items(&list), vec![1, 3]);

        assert_eq!(list.remove(a), 1);
        assert_eq!(list.front(), Some(c));
        assert_eq!(items(&list), vec![3]);

        assert_eq!(list.remove(c), 3);
        assert!(list.is_empty());
        assert_eq!(list.front(), None);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut list = List::new();
        list.push_back("a");
        let b = list.push_back("b");
        list.push_back("c");

        assert_eq!(list.replace(b, "B"), "b");
        assert_eq!(items(&list), vec!["a", "B", "c"]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_pop_front_back() {
        let mut list = List::new();
        for value in 1u32..=3 {
            list.push_back(value);
        }

        assert_eq!(list.pop_front(), Some(1));
        assert_eq!(list.pop_back(), Some(3));
        assert_eq!(list.pop_front(), Some(2));
        assert_eq!(list.pop_front(), None);
        assert_eq!(list.pop_back(), None);
    }

    #[test]
    fn test_reuse_after_clear() {
        let mut list = List::new();
        list.push_back(1u32);
        list.push_back(2);
        list.clear();

        assert!(list.is_empty());
        list.push_back(9);
        assert_eq!(items(&list), vec![9]);
    }

    #[test]
    fn test_get_mut() {
        let mut list = List::new();
        let a = list.push_back(1u32);
        *list.get_mut(a).unwrap() += 10;
        assert_eq!(*list.get(a).unwrap(), 11);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;
        use std::collections::VecDeque;

        #[derive(Debug, Clone)]
        enum Op {
            PushFront(u16),
            PushBack(u16),
            PopFront,
            PopBack,
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                any::<u16>().prop_map(Op::PushFront),
                any::<u16>().prop_map(Op::PushBack),
                Just(Op::PopFront),
                Just(Op::PopBack),
            ]
        }

        proptest! {
            /// The ring agrees with a deque model after every step.
            #[test]
            fn random_ops_match_deque(ops in proptest::collection::vec(op(), 0..200)) {
                let mut list = List::new();
                let mut model: VecDeque<u16> = VecDeque::new();

                for op in ops {
                    match op {
                        Op::PushFront(v) => {
                            list.push_front(v);
                            model.push_front(v);
                        }
                        Op::PushBack(v) => {
                            list.push_back(v);
                            model.push_back(v);
                        }
                        Op::PopFront => {
                            prop_assert_eq!(list.pop_front(), model.pop_front());
                        }
                        Op::PopBack => {
                            prop_assert_eq!(list.pop_back(), model.pop_back());
                        }
                    }

                    prop_assert_eq!(list.len(), model.len());
                    let got: Vec<u16> = list.iter().map(|(_, v)| *v).collect();
                    let expected: Vec<u16> = model.iter().copied().collect();
                    prop_assert_eq!(got, expected);
                }
            }
        }
    }
}
